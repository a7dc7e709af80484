//! Legacy VTK (`.vtk`) ASCII reader for unstructured grids.
//!
//! Covers the subset simulation exporters emit: `UNSTRUCTURED_GRID`
//! geometry plus `POINT_DATA`/`CELL_DATA` sections with `SCALARS`,
//! `VECTORS`, and `FIELD` arrays. Binary files are rejected. The file
//! carries no time metadata, so the reader yields one instant at t = 0
//! with a single region block.

use std::path::Path;
use std::sync::Arc;

use crate::dataset::{Association, Cell, CellType, DataArray, DataObject, DataSet, MultiBlock};
use crate::instant::Instant;
use crate::io::InstantReader;
use crate::post_error::PostError;

/// Region name used for formats without region metadata.
pub(crate) const DEFAULT_REGION: &str = "default";

/// Reader for legacy ASCII VTK datasets.
#[derive(Debug, Default, Clone)]
pub struct LegacyVtkReader;

impl InstantReader for LegacyVtkReader {
    fn read(&self, path: &Path) -> Result<Vec<Instant>, PostError> {
        let text = std::fs::read_to_string(path)?;
        let dataset = parse_legacy(&text, &path.display().to_string())?;
        Ok(vec![single_instant(dataset)])
    }
}

/// Wrap one dataset into the t = 0 instant used by non-time-series
/// formats.
pub(crate) fn single_instant(dataset: DataSet) -> Instant {
    let mut regions = MultiBlock::new();
    regions.push(DEFAULT_REGION, DataObject::handle(dataset));
    let mut instant = Instant::new(0.0);
    instant.set_regions(Arc::new(regions));
    instant
}

fn parse_err(file: &str, reason: impl Into<String>) -> PostError {
    PostError::MalformedFile {
        file: file.to_owned(),
        reason: reason.into(),
    }
}

/// Parse legacy ASCII VTK text into a dataset.
pub(crate) fn parse_legacy(text: &str, file: &str) -> Result<DataSet, PostError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .ok_or_else(|| parse_err(file, "empty file"))?;
    if !header.starts_with("# vtk DataFile") {
        return Err(parse_err(file, "missing legacy VTK header"));
    }
    let _title = lines.next();
    let format = lines
        .next()
        .map(str::trim)
        .ok_or_else(|| parse_err(file, "missing format line"))?;
    if !format.eq_ignore_ascii_case("ASCII") {
        return Err(parse_err(file, format!("unsupported format `{format}`")));
    }

    let mut tokens = lines
        .flat_map(|l| l.split_whitespace())
        .map(str::to_owned)
        .peekable();

    let dataset_kw = tokens
        .next()
        .ok_or_else(|| parse_err(file, "missing DATASET section"))?;
    let dataset_type = tokens
        .next()
        .ok_or_else(|| parse_err(file, "missing dataset type"))?;
    if dataset_kw != "DATASET" || dataset_type != "UNSTRUCTURED_GRID" {
        return Err(parse_err(
            file,
            format!("unsupported dataset type `{dataset_type}`"),
        ));
    }

    let mut points: Vec<[f64; 3]> = Vec::new();
    let mut connectivity: Vec<Vec<usize>> = Vec::new();
    let mut cell_types: Vec<CellType> = Vec::new();
    let mut dataset: Option<DataSet> = None;
    let mut data_section: Option<(Association, usize)> = None;

    while let Some(keyword) = tokens.next() {
        match keyword.as_str() {
            "POINTS" => {
                let count = parse_usize(&mut tokens, file, "point count")?;
                let _data_type = tokens.next();
                points = (0..count)
                    .map(|_| -> Result<[f64; 3], PostError> {
                        Ok([
                            parse_f64(&mut tokens, file, "point coordinate")?,
                            parse_f64(&mut tokens, file, "point coordinate")?,
                            parse_f64(&mut tokens, file, "point coordinate")?,
                        ])
                    })
                    .collect::<Result<_, _>>()?;
            }
            "CELLS" => {
                let count = parse_usize(&mut tokens, file, "cell count")?;
                let _total = parse_usize(&mut tokens, file, "cell list size")?;
                connectivity = (0..count)
                    .map(|_| -> Result<Vec<usize>, PostError> {
                        let n = parse_usize(&mut tokens, file, "cell vertex count")?;
                        (0..n)
                            .map(|_| parse_usize(&mut tokens, file, "cell vertex index"))
                            .collect()
                    })
                    .collect::<Result<_, _>>()?;
            }
            "CELL_TYPES" => {
                let count = parse_usize(&mut tokens, file, "cell type count")?;
                cell_types = (0..count)
                    .map(|_| -> Result<CellType, PostError> {
                        let id = parse_usize(&mut tokens, file, "cell type id")? as i32;
                        CellType::from_vtk_id(id).ok_or_else(|| {
                            parse_err(file, format!("unsupported VTK cell type {id}"))
                        })
                    })
                    .collect::<Result<_, _>>()?;
            }
            "POINT_DATA" | "CELL_DATA" => {
                let count = parse_usize(&mut tokens, file, "data tuple count")?;
                let assoc = if keyword == "POINT_DATA" {
                    Association::Point
                } else {
                    Association::Cell
                };
                data_section = Some((assoc, count));
                if dataset.is_none() {
                    dataset = Some(build_geometry(file, &points, &connectivity, &cell_types)?);
                }
            }
            "SCALARS" | "VECTORS" | "FIELD" => {
                let (assoc, tuples) = data_section
                    .ok_or_else(|| parse_err(file, format!("{keyword} outside data section")))?;
                let ds = dataset.as_mut().expect("dataset built with data section");
                match keyword.as_str() {
                    "SCALARS" => {
                        let array = parse_scalars(&mut tokens, file, tuples)?;
                        ds.add_array(assoc, array)?;
                    }
                    "VECTORS" => {
                        let name = parse_word(&mut tokens, file, "VECTORS name")?;
                        let _data_type = tokens.next();
                        let values = parse_values(&mut tokens, file, tuples * 3)?;
                        ds.add_array(assoc, DataArray::new(name, 3, values)?)?;
                    }
                    _ => {
                        let _field_name = tokens.next();
                        let arrays = parse_usize(&mut tokens, file, "field array count")?;
                        for _ in 0..arrays {
                            let name = parse_word(&mut tokens, file, "field array name")?;
                            let components =
                                parse_usize(&mut tokens, file, "field array components")?;
                            let tuples = parse_usize(&mut tokens, file, "field array tuples")?;
                            let _data_type = tokens.next();
                            let values =
                                parse_values(&mut tokens, file, tuples * components)?;
                            ds.add_array(assoc, DataArray::new(name, components, values)?)?;
                        }
                    }
                }
            }
            "LOOKUP_TABLE" => {
                // table name following a SCALARS block, already consumed
                // there in the common case; skip a stray one.
                let _name = tokens.next();
            }
            other => {
                return Err(parse_err(file, format!("unexpected keyword `{other}`")));
            }
        }
    }

    match dataset {
        Some(ds) => Ok(ds),
        None => build_geometry(file, &points, &connectivity, &cell_types),
    }
}

fn build_geometry(
    file: &str,
    points: &[[f64; 3]],
    connectivity: &[Vec<usize>],
    cell_types: &[CellType],
) -> Result<DataSet, PostError> {
    if connectivity.len() != cell_types.len() {
        return Err(parse_err(
            file,
            format!(
                "CELLS lists {} cells but CELL_TYPES lists {}",
                connectivity.len(),
                cell_types.len()
            ),
        ));
    }
    let cells = connectivity
        .iter()
        .zip(cell_types)
        .map(|(pts, &ty)| Cell::new(ty, pts.clone()))
        .collect();
    DataSet::from_geometry(points.to_vec(), cells)
}

fn parse_scalars(
    tokens: &mut std::iter::Peekable<impl Iterator<Item = String>>,
    file: &str,
    tuples: usize,
) -> Result<DataArray, PostError> {
    let name = parse_word(tokens, file, "SCALARS name")?;
    let _data_type = tokens.next();
    // optional component count, then the LOOKUP_TABLE line
    let mut components = 1usize;
    if let Some(next) = tokens.peek()
        && let Ok(n) = next.parse::<usize>()
    {
        components = n;
        tokens.next();
    }
    if tokens.peek().is_some_and(|t| t == "LOOKUP_TABLE") {
        tokens.next();
        tokens.next();
    }
    let values = parse_values(tokens, file, tuples * components)?;
    DataArray::new(name, components, values)
}

fn parse_word(
    tokens: &mut impl Iterator<Item = String>,
    file: &str,
    what: &str,
) -> Result<String, PostError> {
    tokens
        .next()
        .ok_or_else(|| parse_err(file, format!("missing {what}")))
}

fn parse_usize(
    tokens: &mut impl Iterator<Item = String>,
    file: &str,
    what: &str,
) -> Result<usize, PostError> {
    let token = parse_word(tokens, file, what)?;
    token
        .parse()
        .map_err(|_| parse_err(file, format!("invalid {what} `{token}`")))
}

fn parse_f64(
    tokens: &mut impl Iterator<Item = String>,
    file: &str,
    what: &str,
) -> Result<f64, PostError> {
    let token = parse_word(tokens, file, what)?;
    token
        .parse()
        .map_err(|_| parse_err(file, format!("invalid {what} `{token}`")))
}

fn parse_values(
    tokens: &mut impl Iterator<Item = String>,
    file: &str,
    count: usize,
) -> Result<Vec<f64>, PostError> {
    (0..count)
        .map(|_| parse_f64(tokens, file, "data value"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# vtk DataFile Version 3.0
two segments
ASCII
DATASET UNSTRUCTURED_GRID
POINTS 3 double
0 0 0
1 0 0
2 0 0
CELLS 2 6
2 0 1
2 1 2
CELL_TYPES 2
3
3
POINT_DATA 3
SCALARS p double
LOOKUP_TABLE default
1.0 2.0 3.0
VECTORS U double
1 0 0
0 1 0
0 0 1
";

    #[test]
    fn parses_geometry_and_arrays() {
        let ds = parse_legacy(SAMPLE, "sample.vtk").unwrap();
        assert_eq!(ds.num_points(), 3);
        assert_eq!(ds.num_cells(), 2);
        assert_eq!(ds.cells()[1].cell_type, CellType::Segment);
        assert_eq!(
            ds.array(Association::Point, "p").unwrap().values(),
            &[1.0, 2.0, 3.0]
        );
        assert_eq!(ds.array(Association::Point, "U").unwrap().components(), 3);
    }

    #[test]
    fn binary_files_are_rejected() {
        let text = "# vtk DataFile Version 3.0\nt\nBINARY\n";
        assert!(matches!(
            parse_legacy(text, "b.vtk"),
            Err(PostError::MalformedFile { .. })
        ));
    }

    #[test]
    fn single_instant_has_default_region_at_time_zero() {
        let inst = single_instant(DataSet::new());
        assert_eq!(inst.time_value(), 0.0);
        assert_eq!(inst.region_names(), vec![DEFAULT_REGION.to_owned()]);
    }
}
