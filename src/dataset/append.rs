//! Append-merge of datasets.
//!
//! Used by the parallel pipeline mode (fan-in of filter outputs) and by
//! `Instant::all_regions` (merge of all region blocks). Points and cells
//! are concatenated with indices shifted; an array survives the merge
//! only when every input carries it under the same name, association,
//! and component count. Inputs share no geometry, so no point welding is
//! performed.

use itertools::Itertools;

use super::{Association, Cell, DataArray, DataObject, DataSet};

/// Merge `inputs` into one combined dataset.
///
/// Composite inputs are flattened block by block. Returns an empty
/// dataset for an empty input list.
pub fn append_all<'a>(inputs: impl IntoIterator<Item = &'a DataObject>) -> DataSet {
    let mut sets: Vec<&DataSet> = Vec::new();
    for input in inputs {
        collect_sets(input, &mut sets);
    }
    merge_sets(&sets)
}

fn collect_sets<'a>(obj: &'a DataObject, out: &mut Vec<&'a DataSet>) {
    match obj {
        DataObject::Set(ds) => out.push(ds),
        DataObject::MultiBlock(mb) => {
            for (_, block) in mb.iter() {
                collect_sets(block, out);
            }
        }
    }
}

fn merge_sets(sets: &[&DataSet]) -> DataSet {
    let mut points = Vec::new();
    let mut cells = Vec::new();
    for set in sets {
        let offset = points.len();
        points.extend_from_slice(set.points());
        for cell in set.cells() {
            cells.push(Cell {
                cell_type: cell.cell_type,
                points: cell.points.iter().map(|&i| i + offset).collect(),
            });
        }
    }
    // from_geometry cannot fail here: all indices were valid pre-offset.
    let mut merged = DataSet::from_geometry(points, cells).expect("offset indices stay in range");

    for assoc in [Association::Point, Association::Cell] {
        for name in common_array_names(sets, assoc) {
            let components = sets[0]
                .array(assoc, &name)
                .map(DataArray::components)
                .unwrap_or(1);
            let mut values = Vec::new();
            for set in sets {
                // Presence and arity were checked by common_array_names.
                values.extend_from_slice(set.array(assoc, &name).unwrap().values());
            }
            let array = DataArray::new(name, components, values).expect("uniform arity");
            merged.add_array(assoc, array).expect("lengths add up");
        }
    }
    merged
}

/// Names carried by every input with a consistent component count, in
/// first-input order.
fn common_array_names(sets: &[&DataSet], assoc: Association) -> Vec<String> {
    let Some((first, rest)) = sets.split_first() else {
        return Vec::new();
    };
    first
        .arrays(assoc)
        .iter()
        .filter(|array| {
            rest.iter().all(|set| {
                set.array(assoc, array.name())
                    .is_some_and(|other| other.components() == array.components())
            })
        })
        .map(|array| array.name().to_owned())
        .unique()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CellType;

    fn block(p0: f64, field: &str) -> DataSet {
        let mut ds = DataSet::from_geometry(
            vec![[p0, 0.0, 0.0], [p0 + 1.0, 0.0, 0.0]],
            vec![Cell::new(CellType::Segment, vec![0, 1])],
        )
        .unwrap();
        ds.add_array(Association::Point, DataArray::scalars(field, vec![p0, p0]))
            .unwrap();
        ds
    }

    #[test]
    fn counts_are_summed_and_indices_shifted() {
        let a = DataObject::Set(block(0.0, "p"));
        let b = DataObject::Set(block(10.0, "p"));
        let merged = append_all([&a, &b]);
        assert_eq!(merged.num_points(), 4);
        assert_eq!(merged.num_cells(), 2);
        assert_eq!(merged.cells()[1].points, vec![2, 3]);
        assert_eq!(
            merged.array(Association::Point, "p").unwrap().values(),
            &[0.0, 0.0, 10.0, 10.0]
        );
    }

    #[test]
    fn arrays_missing_from_one_input_are_dropped() {
        let a = DataObject::Set(block(0.0, "p"));
        let b = DataObject::Set(block(10.0, "T"));
        let merged = append_all([&a, &b]);
        assert!(merged.array(Association::Point, "p").is_none());
        assert!(merged.array(Association::Point, "T").is_none());
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let empty: [&DataObject; 0] = [];
        let merged = append_all(empty);
        assert_eq!(merged.num_points(), 0);
        assert_eq!(merged.num_cells(), 0);
    }
}
