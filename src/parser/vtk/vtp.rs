//! Reading VTK XML files (.vtp poly data, .vtu unstructured grids) into a
//! [`MeshModel`] through `vtkio`.

use std::path::Path;

use tracing::{debug, warn};
use vtkio::model::{
    Attribute, Attributes, DataSet, IOBuffer, Piece, PolyDataPiece, UnstructuredGridPiece,
    VertexNumbers, Vtk,
};

use crate::error::{MeshError, MeshResult};
use crate::structs_and_impls::{CellType, MeshModel};   // target model of every reader

pub struct VtpParser; // Namespace for the VTK XML readers

impl VtpParser {
    /// Read a `.vtp` or `.vtu` file from disk.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> MeshResult<MeshModel> {
        let path = path.as_ref();
        let vtk = Vtk::import(path)?; // format chosen from the extension
        let mesh = Self::from_vtk(vtk)?;
        debug!(
            path = %path.display(),
            points = mesh.num_points(),
            cells = mesh.num_cells(),
            cell_type = %mesh.cell_type(),
            "read mesh"
        );
        Ok(mesh)
    }

    /// Convert an imported VTK model. Only the first inline piece is used.
    pub fn from_vtk(vtk: Vtk) -> MeshResult<MeshModel> {
        match vtk.data {
            DataSet::PolyData { pieces, .. } => Self::from_poly_piece(first_inline(pieces)?),
            DataSet::UnstructuredGrid { pieces, .. } => {
                Self::from_unstructured_piece(first_inline(pieces)?)
            }
            _ => Err(MeshError::invalid_content(
                "expected PolyData or UnstructuredGrid data set",
            )),
        }
    }

    /// Cells come from the `Lines` and `Polys` blocks; vertices and strips are ignored.
    pub fn from_poly_piece(piece: PolyDataPiece) -> MeshResult<MeshModel> {
        let PolyDataPiece {
            points,
            verts,
            lines,
            polys,
            strips,
            data,
        } = piece;

        if verts.as_ref().map_or(false, |v| v.num_cells() > 0)
            || strips.as_ref().map_or(false, |s| s.num_cells() > 0)
        {
            warn!("ignoring vertex and triangle strip cells");
        }

        let mut cells: Vec<Vec<usize>> = Vec::new();
        for block in [lines, polys].into_iter().flatten() {
            cells.extend(split_cells(block)?);
        }
        Self::assemble(points, cells, data)
    }

    /// Every cell must be a line, triangle or tetrahedron.
    pub fn from_unstructured_piece(piece: UnstructuredGridPiece) -> MeshResult<MeshModel> {
        let cells = split_cells(piece.cells.cell_verts)?;
        if let Some(bad) = piece
            .cells
            .types
            .iter()
            .find(|t| !is_supported(t))
        {
            return Err(MeshError::invalid_content(format!(
                "unsupported VTK cell type {bad:?}"
            )));
        }
        Self::assemble(piece.points, cells, piece.data)
    }

    fn assemble(points: IOBuffer, cells: Vec<Vec<usize>>, data: Attributes) -> MeshResult<MeshModel> {
        let coords = to_f64(points)
            .ok_or_else(|| MeshError::invalid_content("point coordinates are not numeric"))?;
        if coords.len() % 3 != 0 {
            return Err(MeshError::invalid_content(format!(
                "{} point coordinates is not a multiple of 3",
                coords.len()
            )));
        }
        let points: Vec<[f64; 3]> = coords.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        let first = cells
            .first()
            .ok_or_else(|| MeshError::invalid_content("mesh has no cells"))?;
        let cell_type = CellType::from_arity(first.len())?;
        let mut mesh = MeshModel::new(cell_type);
        mesh.points = points;
        for cell in &cells {
            mesh.add_cell(cell)?;
        }

        let Attributes { point, cell } = data;
        for (name, values) in point.into_iter().flat_map(named_buffers) {
            let values = first_component(&name, values, mesh.num_points())?;
            mesh.add_point_data(name, values)?;
        }
        for (name, values) in cell.into_iter().flat_map(named_buffers) {
            let values = first_component(&name, values, mesh.num_cells())?;
            mesh.add_cell_data(name, values)?;
        }
        Ok(mesh)
    }
}

fn is_supported(t: &vtkio::model::CellType) -> bool {
    use vtkio::model::CellType as VtkCellType;
    matches!(t, VtkCellType::Line | VtkCellType::Triangle | VtkCellType::Tetra)
}

fn first_inline<P>(pieces: Vec<Piece<P>>) -> MeshResult<P> {
    let count = pieces.len();
    match pieces.into_iter().next() {
        Some(Piece::Inline(p)) => {
            if count > 1 {
                warn!(pieces = count, "only the first piece is read");
            }
            Ok(*p)
        }
        Some(_) => Err(MeshError::invalid_content(
            "pieces stored in external files are not supported",
        )),
        None => Err(MeshError::invalid_content("data set has no pieces")),
    }
}

/// Split a VTK cell block into one index list per cell.
fn split_cells(block: VertexNumbers) -> MeshResult<Vec<Vec<usize>>> {
    let (connectivity, offsets) = block.into_xml();
    let mut cells = Vec::with_capacity(offsets.len());
    let mut start = 0usize;
    for end in offsets {
        let end = end as usize;
        let ids = connectivity.get(start..end).ok_or_else(|| {
            MeshError::invalid_content(format!(
                "cell offset {end} does not fit connectivity of length {}",
                connectivity.len()
            ))
        })?;
        cells.push(ids.iter().map(|&i| i as usize).collect());
        start = end;
    }
    Ok(cells)
}

/// Flatten an attribute into `(name, values)` pairs; field data may hold several arrays.
fn named_buffers(attribute: Attribute) -> Vec<(String, IOBuffer)> {
    match attribute {
        Attribute::DataArray(array) => vec![(array.name, array.data)],
        Attribute::Field { data_array, .. } => data_array
            .into_iter()
            .map(|array| (array.name, array.data))
            .collect(),
    }
}

/// Keep the first component of every tuple.
fn first_component(name: &str, data: IOBuffer, count: usize) -> MeshResult<Vec<f64>> {
    let values = to_f64(data)
        .ok_or_else(|| MeshError::invalid_content(format!("data array '{name}' is not numeric")))?;
    let got = values.len();
    let mismatch = || MeshError::ArrayLengthMismatch {
        name: name.to_string(),
        expected: count,
        got,
    };
    if count == 0 {
        return if values.is_empty() { Ok(values) } else { Err(mismatch()) };
    }
    let components = got / count;
    if components == 0 || components * count != got {
        return Err(mismatch());
    }
    Ok(values.iter().step_by(components).copied().collect())
}

fn to_f64(buffer: IOBuffer) -> Option<Vec<f64>> {
    let values = match buffer {
        IOBuffer::F64(v) => v,
        IOBuffer::F32(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::I8(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::U8(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::I16(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::U16(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::I32(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::U32(v) => v.into_iter().map(f64::from).collect(),
        IOBuffer::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        IOBuffer::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        _ => return None, // bit arrays
    };
    Some(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::xml_writer::{VTPWriter, VTUWriter};
    use vtkio::model::DataArray as VtkDataArray;
    use vtkio::model::ElementType;

    fn tetra_mesh() -> MeshModel {
        let mut mesh = MeshModel::from_arrays(
            &[
                vec![0.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![1.0, 1.0, 1.0],
            ],
            &[vec![0, 1, 2, 3], vec![1, 2, 3, 4]],
        )
        .unwrap();
        mesh.add_point_data("pressure", vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        mesh.add_cell_data("material", vec![7.0, 8.0]).unwrap();
        mesh.add_cell_data("radius", vec![0.5, 0.25]).unwrap();
        mesh
    }

    #[test]
    fn test_vtp_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.vtp");
        let mesh = tetra_mesh();
        VTPWriter::write_vtp(&mesh, &path).unwrap();
        let back = VtpParser::parse_file(&path).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn test_vtu_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.vtu");
        let mesh = tetra_mesh();
        VTUWriter::write_vtu(&mesh, &path).unwrap();
        let back = VtpParser::parse_file(&path).unwrap();
        assert_eq!(back, mesh);
    }

    #[test]
    fn test_line_piece_with_vector_data() {
        let piece = PolyDataPiece {
            points: IOBuffer::F32(vec![0.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, -2.0]),
            verts: None,
            lines: Some(VertexNumbers::Legacy {
                num_cells: 2,
                vertices: vec![2, 0, 1, 2, 1, 2],
            }),
            polys: None,
            strips: None,
            data: Attributes {
                point: vec![Attribute::DataArray(VtkDataArray {
                    name: "velocity".to_string(),
                    elem: ElementType::Vectors,
                    data: IOBuffer::F64(vec![1.0, 9.0, 9.0, 2.0, 9.0, 9.0, 3.0, 9.0, 9.0]),
                })],
                cell: vec![Attribute::DataArray(VtkDataArray {
                    name: "order".to_string(),
                    elem: ElementType::Scalars {
                        num_comp: 1,
                        lookup_table: None,
                    },
                    data: IOBuffer::I32(vec![1, 2]),
                })],
            },
        };
        let mesh = VtpParser::from_poly_piece(piece).unwrap();
        assert_eq!(mesh.cell_type(), CellType::Line);
        assert_eq!(mesh.connectivity(), &[0, 1, 1, 2]);
        assert_eq!(mesh.point_data()[0].values, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.cell_data()[0].values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_mixed_blocks_are_heterogeneous() {
        let piece = PolyDataPiece {
            points: IOBuffer::F64(vec![0.0; 9]),
            verts: None,
            lines: Some(VertexNumbers::XML {
                connectivity: vec![0, 1],
                offsets: vec![2],
            }),
            polys: Some(VertexNumbers::XML {
                connectivity: vec![0, 1, 2],
                offsets: vec![3],
            }),
            strips: None,
            data: Attributes::default(),
        };
        assert!(matches!(
            VtpParser::from_poly_piece(piece),
            Err(MeshError::HeterogeneousCellArity { expected: 2, got: 3, cell: 1 })
        ));
    }

    #[test]
    fn test_piece_without_cells_is_rejected() {
        let piece = PolyDataPiece {
            points: IOBuffer::F64(vec![0.0; 3]),
            verts: None,
            lines: None,
            polys: None,
            strips: None,
            data: Attributes::default(),
        };
        assert!(matches!(
            VtpParser::from_poly_piece(piece),
            Err(MeshError::InvalidContent { .. })
        ));
    }

    #[test]
    fn test_first_component_rejects_ragged_arrays() {
        let err = first_component("x", IOBuffer::F64(vec![1.0; 5]), 2).unwrap_err();
        assert!(matches!(err, MeshError::ArrayLengthMismatch { expected: 2, got: 5, .. }));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(VtpParser::parse_file("/no/such/file.vtp").is_err());
    }
}
