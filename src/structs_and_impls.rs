//! In-memory mesh: points, fixed-arity cells and named per-point / per-cell arrays.

use std::fmt;

use vtkio::model::CellType as VtkCellType;

use crate::error::{MeshError, MeshResult};

/// Cell shapes a mesh can be made of. The vertex count is fixed per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Line,        // 2 vertices
    Triangle,    // 3 vertices
    Tetrahedron, // 4 vertices
}

impl CellType {
    /// Number of point indices per cell.
    pub const fn arity(&self) -> usize {
        match self {
            CellType::Line => 2,
            CellType::Triangle => 3,
            CellType::Tetrahedron => 4,
        }
    }

    /// Infer the cell type from a column count.
    pub fn from_arity(arity: usize) -> MeshResult<Self> {
        match arity {
            2 => Ok(CellType::Line),
            3 => Ok(CellType::Triangle),
            4 => Ok(CellType::Tetrahedron),
            _ => Err(MeshError::UnsupportedArity { arity }),
        }
    }

    /// Gmsh element type code (1 = 2-node line, 2 = 3-node triangle, 4 = 4-node tetrahedron).
    pub const fn gmsh_code(&self) -> u32 {
        match self {
            CellType::Line => 1,
            CellType::Triangle => 2,
            CellType::Tetrahedron => 4,
        }
    }

    pub fn eltype_vtk(&self) -> VtkCellType {
        match self {
            CellType::Line => VtkCellType::Line,
            CellType::Triangle => VtkCellType::Triangle,
            CellType::Tetrahedron => VtkCellType::Tetra,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            CellType::Line => "line",
            CellType::Triangle => "triangle",
            CellType::Tetrahedron => "tetrahedron",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named scalar attribute with one value per point or per cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub values: Vec<f64>,
}

impl DataArray {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Points, cells and attached data of one mesh.
///
/// Cells are stored as a flat connectivity list with a single [`CellType`],
/// so every cell has the same number of vertices. Points are always 3D;
/// 2D input is promoted with `z = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshModel {
    pub(crate) points: Vec<[f64; 3]>,
    pub(crate) cell_type: CellType,
    pub(crate) connectivity: Vec<usize>,
    pub(crate) point_data: Vec<DataArray>,
    pub(crate) cell_data: Vec<DataArray>,
}

impl MeshModel {
    /// Empty mesh that will hold cells of the given type.
    pub fn new(cell_type: CellType) -> Self {
        Self {
            points: Vec::new(),
            cell_type,
            connectivity: Vec::new(),
            point_data: Vec::new(),
            cell_data: Vec::new(),
        }
    }

    /// Build a mesh from row-major point and cell tables.
    ///
    /// Point rows may have 2 or 3 columns. The cell type is taken from the
    /// column count of the first cell row; every other row must match it.
    pub fn from_arrays(points: &[Vec<f64>], cells: &[Vec<usize>]) -> MeshResult<Self> {
        let first = cells
            .first()
            .ok_or_else(|| MeshError::invalid_content("mesh has no cells"))?;
        let cell_type = CellType::from_arity(first.len())?;

        let mut mesh = Self::new(cell_type);
        mesh.points.reserve(points.len());
        for (i, row) in points.iter().enumerate() {
            let p = match row.as_slice() {
                [x, y] => [*x, *y, 0.0],
                [x, y, z] => [*x, *y, *z],
                _ => {
                    return Err(MeshError::invalid_content(format!(
                        "point {} has {} coordinates, expected 2 or 3",
                        i,
                        row.len()
                    )))
                }
            };
            mesh.points.push(p);
        }

        mesh.connectivity.reserve(cells.len() * cell_type.arity());
        for cell in cells {
            mesh.add_cell(cell)?;
        }
        Ok(mesh)
    }

    /// Build a mesh from already flattened storage, validating it.
    pub fn from_parts(
        points: Vec<[f64; 3]>,
        cell_type: CellType,
        connectivity: Vec<usize>,
    ) -> MeshResult<Self> {
        let mesh = Self {
            points,
            cell_type,
            connectivity,
            point_data: Vec::new(),
            cell_data: Vec::new(),
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Append a point and return its index.
    ///
    /// Fails once point data is attached, since the arrays would fall one
    /// value short.
    pub fn add_point(&mut self, point: [f64; 3]) -> MeshResult<usize> {
        grow_check(&self.point_data, self.points.len() + 1)?;
        self.points.push(point);
        Ok(self.points.len() - 1)
    }

    /// Append a cell and return its index. Like [`Self::add_point`], this is
    /// refused once cell data is attached.
    pub fn add_cell(&mut self, cell: &[usize]) -> MeshResult<usize> {
        let cell_index = self.num_cells();
        grow_check(&self.cell_data, cell_index + 1)?;
        if cell.len() != self.cell_type.arity() {
            return Err(MeshError::HeterogeneousCellArity {
                expected: self.cell_type.arity(),
                got: cell.len(),
                cell: cell_index,
            });
        }
        if let Some(&index) = cell.iter().find(|&&i| i >= self.points.len()) {
            return Err(MeshError::IndexOutOfRange {
                cell: cell_index,
                index,
                num_points: self.points.len(),
            });
        }
        self.connectivity.extend_from_slice(cell);
        Ok(cell_index)
    }

    /// Attach a per-point array. Its length must equal the point count.
    pub fn add_point_data(&mut self, name: impl Into<String>, values: Vec<f64>) -> MeshResult<()> {
        let array = DataArray::new(name, values);
        check_length(&array, self.num_points())?;
        self.point_data.push(array);
        Ok(())
    }

    /// Attach a per-cell array. Its length must equal the cell count.
    pub fn add_cell_data(&mut self, name: impl Into<String>, values: Vec<f64>) -> MeshResult<()> {
        let array = DataArray::new(name, values);
        check_length(&array, self.num_cells())?;
        self.cell_data.push(array);
        Ok(())
    }

    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len() / self.cell_type.arity()
    }

    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<[f64; 3]> {
        self.points.get(index).copied()
    }

    /// Flat connectivity, `arity` indices per cell.
    pub fn connectivity(&self) -> &[usize] {
        &self.connectivity
    }

    /// Point indices of one cell.
    pub fn cell(&self, index: usize) -> Option<&[usize]> {
        let arity = self.cell_type.arity();
        let start = index.checked_mul(arity)?;
        self.connectivity.get(start..start.checked_add(arity)?)
    }

    /// Iterate over the cells in order.
    pub fn cells(&self) -> std::slice::ChunksExact<'_, usize> {
        self.connectivity.chunks_exact(self.cell_type.arity())
    }

    pub fn point_data(&self) -> &[DataArray] {
        &self.point_data
    }

    pub fn cell_data(&self) -> &[DataArray] {
        &self.cell_data
    }

    pub fn point_data_by_index(&self, index: usize) -> Option<&DataArray> {
        self.point_data.get(index)
    }

    pub fn cell_data_by_index(&self, index: usize) -> Option<&DataArray> {
        self.cell_data.get(index)
    }

    pub fn point_data_by_name(&self, name: &str) -> Option<&DataArray> {
        self.point_data.iter().find(|a| a.name == name)
    }

    pub fn cell_data_by_name(&self, name: &str) -> Option<&DataArray> {
        self.cell_data.iter().find(|a| a.name == name)
    }

    /// Check every structural invariant: uniform arity, indices in range and
    /// array lengths matching the point/cell counts.
    pub fn validate(&self) -> MeshResult<()> {
        let arity = self.cell_type.arity();
        let remainder = self.connectivity.len() % arity;
        if remainder != 0 {
            return Err(MeshError::HeterogeneousCellArity {
                expected: arity,
                got: remainder,
                cell: self.connectivity.len() / arity,
            });
        }

        self.check_indices()?;

        for array in &self.point_data {
            check_length(array, self.num_points())?;
        }
        for array in &self.cell_data {
            check_length(array, self.num_cells())?;
        }
        Ok(())
    }

    /// Every cell index must address an existing point.
    pub fn check_indices(&self) -> MeshResult<()> {
        let num_points = self.points.len();
        for (cell, vertices) in self.cells().enumerate() {
            if let Some(&index) = vertices.iter().find(|&&i| i >= num_points) {
                return Err(MeshError::IndexOutOfRange {
                    cell,
                    index,
                    num_points,
                });
            }
        }
        Ok(())
    }
}

/// Growing the mesh to `new_len` would leave the first attached array short.
fn grow_check(arrays: &[DataArray], new_len: usize) -> MeshResult<()> {
    match arrays.first() {
        Some(array) => Err(MeshError::ArrayLengthMismatch {
            name: array.name.clone(),
            expected: new_len,
            got: array.len(),
        }),
        None => Ok(()),
    }
}

fn check_length(array: &DataArray, expected: usize) -> MeshResult<()> {
    if array.len() != expected {
        return Err(MeshError::ArrayLengthMismatch {
            name: array.name.clone(),
            expected,
            got: array.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tetra() -> MeshModel {
        MeshModel::from_arrays(
            &[
                vec![0.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
            &[vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_cell_type_from_column_count() {
        assert_eq!(CellType::from_arity(2).unwrap(), CellType::Line);
        assert_eq!(CellType::from_arity(3).unwrap(), CellType::Triangle);
        assert_eq!(CellType::from_arity(4).unwrap(), CellType::Tetrahedron);
        assert!(matches!(
            CellType::from_arity(5),
            Err(MeshError::UnsupportedArity { arity: 5 })
        ));
    }

    #[test]
    fn test_two_dimensional_points_are_promoted() {
        let mesh = MeshModel::from_arrays(
            &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            &[vec![0, 1, 2]],
        )
        .unwrap();
        assert_eq!(mesh.cell_type(), CellType::Triangle);
        assert_eq!(mesh.points()[1], [3.0, 4.0, 0.0]);
    }

    #[test]
    fn test_mixed_arity_is_rejected() {
        let result = MeshModel::from_arrays(
            &[vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]],
            &[vec![0, 1], vec![0, 1, 2]],
        );
        assert!(matches!(
            result,
            Err(MeshError::HeterogeneousCellArity {
                expected: 2,
                got: 3,
                cell: 1
            })
        ));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let result = MeshModel::from_arrays(&[vec![0.0, 0.0], vec![1.0, 0.0]], &[vec![0, 2]]);
        assert!(matches!(
            result,
            Err(MeshError::IndexOutOfRange {
                cell: 0,
                index: 2,
                num_points: 2
            })
        ));
    }

    #[test]
    fn test_data_array_lengths_are_checked() {
        let mut mesh = unit_tetra();
        mesh.add_point_data("pressure", vec![1.0; 4]).unwrap();
        mesh.add_cell_data("order", vec![0.0]).unwrap();

        let err = mesh.add_cell_data("radius", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            MeshError::ArrayLengthMismatch { expected: 1, got: 2, .. }
        ));
        assert_eq!(mesh.cell_data().len(), 1);
    }

    #[test]
    fn test_growing_after_data_is_attached_is_refused() {
        let mut mesh = unit_tetra();
        mesh.add_cell_data("tag", vec![1.0]).unwrap();
        assert!(matches!(
            mesh.add_cell(&[3, 2, 1, 0]),
            Err(MeshError::ArrayLengthMismatch { expected: 2, got: 1, .. })
        ));
        assert_eq!(mesh.num_cells(), 1);

        mesh.add_point_data("pressure", vec![0.0; 4]).unwrap();
        assert!(matches!(
            mesh.add_point([2.0, 2.0, 2.0]),
            Err(MeshError::ArrayLengthMismatch { expected: 5, got: 4, .. })
        ));
        assert_eq!(mesh.num_points(), 4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_points_and_cells_can_be_added_before_data() {
        let mut mesh = MeshModel::new(CellType::Line);
        let a = mesh.add_point([0.0, 0.0, 0.0]).unwrap();
        let b = mesh.add_point([0.0, 0.0, -1.0]).unwrap();
        assert_eq!(mesh.add_cell(&[a, b]).unwrap(), 0);
        mesh.add_cell_data("radius", vec![0.1]).unwrap();
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_accessors() {
        let mut mesh = unit_tetra();
        mesh.add_point_data("a", vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert_eq!(mesh.num_points(), 4);
        assert_eq!(mesh.num_cells(), 1);
        assert_eq!(mesh.cell(0), Some(&[0, 1, 2, 3][..]));
        assert_eq!(mesh.cell(1), None);
        assert_eq!(mesh.cell(usize::MAX), None);
        assert_eq!(mesh.cells().count(), 1);
        assert_eq!(mesh.point_data_by_name("a").map(|a| a.values[2]), Some(2.0));
        assert!(mesh.point_data_by_index(1).is_none());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_from_parts_validates_connectivity_length() {
        let result = MeshModel::from_parts(vec![[0.0; 3]; 3], CellType::Triangle, vec![0, 1, 2, 0]);
        assert!(matches!(result, Err(MeshError::HeterogeneousCellArity { .. })));
    }

    #[test]
    fn test_empty_cell_table_is_rejected() {
        assert!(matches!(
            MeshModel::from_arrays(&[vec![0.0, 0.0]], &[]),
            Err(MeshError::InvalidContent { .. })
        ));
    }
}
