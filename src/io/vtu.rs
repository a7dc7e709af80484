//! XML VTK (`.vtu`) unstructured-grid reader with a legacy fallback.
//!
//! A deliberately small parser for the ASCII flavor of the format: it
//! pulls the `<Piece>` geometry (`Points`, `Cells` connectivity /
//! offsets / types) plus the `<PointData>`/`<CellData>` arrays. Binary
//! and appended encodings are not handled here. When the XML scan finds
//! no `<Piece>`, the file is handed to the legacy parser — some tools
//! write legacy content under the `.vtu` extension.

use std::path::Path;

use crate::dataset::{Association, Cell, CellType, DataArray, DataSet};
use crate::instant::Instant;
use crate::io::InstantReader;
use crate::io::vtk;
use crate::post_error::PostError;

/// Reader for XML `.vtu` files.
#[derive(Debug, Default, Clone)]
pub struct XmlVtuReader;

impl InstantReader for XmlVtuReader {
    fn read(&self, path: &Path) -> Result<Vec<Instant>, PostError> {
        let text = std::fs::read_to_string(path)?;
        let file = path.display().to_string();
        let dataset = match parse_vtu(&text, &file) {
            Ok(ds) => ds,
            Err(primary) => {
                log::warn!("XML parse of {file} failed ({primary}), trying legacy format");
                vtk::parse_legacy(&text, &file)?
            }
        };
        Ok(vec![vtk::single_instant(dataset)])
    }
}

fn parse_err(file: &str, reason: impl Into<String>) -> PostError {
    PostError::MalformedFile {
        file: file.to_owned(),
        reason: reason.into(),
    }
}

/// One `<DataArray>` element: attributes plus whitespace-separated body.
struct RawArray {
    name: String,
    components: usize,
    values: Vec<f64>,
}

fn parse_vtu(text: &str, file: &str) -> Result<DataSet, PostError> {
    let piece = section(text, "Piece")
        .ok_or_else(|| parse_err(file, "no <Piece> element"))?;

    let points_block = section(piece, "Points")
        .ok_or_else(|| parse_err(file, "no <Points> element"))?;
    let cells_block = section(piece, "Cells")
        .ok_or_else(|| parse_err(file, "no <Cells> element"))?;

    let coords = arrays_in(points_block, file)?
        .into_iter()
        .next()
        .ok_or_else(|| parse_err(file, "no coordinate DataArray"))?;
    if coords.values.len() % 3 != 0 {
        return Err(parse_err(file, "coordinate array not divisible by 3"));
    }
    let points: Vec<[f64; 3]> = coords
        .values
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    let cell_arrays = arrays_in(cells_block, file)?;
    let find = |name: &str| {
        cell_arrays
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| parse_err(file, format!("missing cells array `{name}`")))
    };
    let connectivity = find("connectivity")?;
    let offsets = find("offsets")?;
    let types = find("types")?;

    let mut cells = Vec::with_capacity(offsets.values.len());
    let mut start = 0usize;
    for (type_value, offset_value) in types.values.iter().zip(&offsets.values) {
        let end = *offset_value as usize;
        if end < start || end > connectivity.values.len() {
            return Err(parse_err(file, "cell offsets out of range"));
        }
        let ty = CellType::from_vtk_id(*type_value as i32)
            .ok_or_else(|| parse_err(file, format!("unsupported cell type {type_value}")))?;
        let indices = connectivity.values[start..end]
            .iter()
            .map(|&v| v as usize)
            .collect();
        cells.push(Cell::new(ty, indices));
        start = end;
    }

    let mut dataset = DataSet::from_geometry(points, cells)?;
    for (tag, assoc) in [
        ("PointData", Association::Point),
        ("CellData", Association::Cell),
    ] {
        if let Some(block) = section(piece, tag) {
            for raw in arrays_in(block, file)? {
                dataset.add_array(assoc, DataArray::new(raw.name, raw.components, raw.values)?)?;
            }
        }
    }
    Ok(dataset)
}

/// Slice out `<tag ...> ... </tag>`, `None` when absent.
fn section<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let start = text.find(&open)?;
    let body_start = start + text[start..].find('>')? + 1;
    let end = text[body_start..].find(&close)? + body_start;
    Some(&text[body_start..end])
}

/// All `<DataArray>` elements inside `block`, in document order.
fn arrays_in(block: &str, file: &str) -> Result<Vec<RawArray>, PostError> {
    let mut arrays = Vec::new();
    let mut rest = block;
    while let Some(start) = rest.find("<DataArray") {
        let after = &rest[start..];
        let header_end = after
            .find('>')
            .ok_or_else(|| parse_err(file, "unterminated <DataArray>"))?;
        let header = &after[..header_end];
        let body_end = after
            .find("</DataArray>")
            .ok_or_else(|| parse_err(file, "missing </DataArray>"))?;
        let body = &after[header_end + 1..body_end];

        if let Some(format) = attribute(header, "format")
            && format != "ascii"
        {
            return Err(parse_err(file, format!("unsupported encoding `{format}`")));
        }
        let name = attribute(header, "Name").unwrap_or_default();
        let components = attribute(header, "NumberOfComponents")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let values = body
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| parse_err(file, format!("invalid value `{t}`")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        arrays.push(RawArray {
            name,
            components,
            values,
        });
        rest = &after[body_end + "</DataArray>".len()..];
    }
    Ok(arrays)
}

/// Value of `key="..."` inside an element header.
fn attribute(header: &str, key: &str) -> Option<String> {
    let pattern = format!("{key}=\"");
    let start = header.find(&pattern)? + pattern.len();
    let end = header[start..].find('"')? + start;
    Some(header[start..end].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<VTKFile type="UnstructuredGrid" version="0.1">
  <UnstructuredGrid>
    <Piece NumberOfPoints="3" NumberOfCells="1">
      <Points>
        <DataArray type="Float64" NumberOfComponents="3" format="ascii">
          0 0 0  1 0 0  0 1 0
        </DataArray>
      </Points>
      <Cells>
        <DataArray type="Int64" Name="connectivity" format="ascii">0 1 2</DataArray>
        <DataArray type="Int64" Name="offsets" format="ascii">3</DataArray>
        <DataArray type="UInt8" Name="types" format="ascii">5</DataArray>
      </Cells>
      <PointData>
        <DataArray type="Float64" Name="p" format="ascii">1 2 3</DataArray>
      </PointData>
    </Piece>
  </UnstructuredGrid>
</VTKFile>
"#;

    #[test]
    fn parses_piece_geometry_and_point_data() {
        let ds = parse_vtu(SAMPLE, "sample.vtu").unwrap();
        assert_eq!(ds.num_points(), 3);
        assert_eq!(ds.num_cells(), 1);
        assert_eq!(ds.cells()[0].cell_type, CellType::Triangle);
        assert_eq!(
            ds.array(Association::Point, "p").unwrap().values(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn attribute_extraction() {
        let header = r#"<DataArray type="Float64" Name="p" NumberOfComponents="3""#;
        assert_eq!(attribute(header, "Name").as_deref(), Some("p"));
        assert_eq!(attribute(header, "NumberOfComponents").as_deref(), Some("3"));
        assert_eq!(attribute(header, "format"), None);
    }

    #[test]
    fn missing_piece_is_an_error() {
        assert!(parse_vtu("<VTKFile></VTKFile>", "x.vtu").is_err());
    }
}
