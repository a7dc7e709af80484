//! Shared helpers for the integration tests.

use std::path::PathBuf;

/// Legacy VTK sample: three points on the X axis forming two segments,
/// a scalar `p` spanning [0, 10] and a vector `U`.
pub const SAMPLE_VTK: &str = "\
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
0.0 5.0 10.0
VECTORS U double
3 4 0
0 0 1
1 0 0
";

/// Write `contents` to a unique file under the system temp directory
/// and return its path.
pub fn write_temp_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("cfd-post-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).expect("temp file is writable");
    path
}
