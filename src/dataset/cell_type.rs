//! Cell type metadata for result datasets.

/// Cell types appearing in unstructured simulation results.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum CellType {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 1D chain of segments (streamline output).
    PolyLine,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
}

impl Default for CellType {
    fn default() -> Self {
        CellType::Vertex
    }
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment | CellType::PolyLine => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => 3,
        }
    }

    /// Expected vertex count, or `None` for variable-size cells.
    pub fn vertex_count(self) -> Option<usize> {
        match self {
            CellType::Vertex => Some(1),
            CellType::Segment => Some(2),
            CellType::PolyLine => None,
            CellType::Triangle => Some(3),
            CellType::Quadrilateral => Some(4),
            CellType::Tetrahedron => Some(4),
            CellType::Hexahedron => Some(8),
            CellType::Prism => Some(6),
            CellType::Pyramid => Some(5),
        }
    }

    /// Map a legacy/XML VTK cell type id to a `CellType`.
    pub fn from_vtk_id(id: i32) -> Option<CellType> {
        match id {
            1 => Some(CellType::Vertex),
            3 => Some(CellType::Segment),
            4 => Some(CellType::PolyLine),
            5 => Some(CellType::Triangle),
            9 => Some(CellType::Quadrilateral),
            10 => Some(CellType::Tetrahedron),
            12 => Some(CellType::Hexahedron),
            13 => Some(CellType::Prism),
            14 => Some(CellType::Pyramid),
            _ => None,
        }
    }
}
