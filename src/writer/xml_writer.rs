use std::path::Path;

use tracing::debug;
use vtkio::model::*; // import model definition of a VTK file

use crate::error::MeshResult;
use crate::structs_and_impls::{CellType as MeshCellType, DataArray, MeshModel};
use crate::writer::write_atomic;

/// Writer for the VTK XML unstructured grid (.vtu) format.
pub struct VTUWriter;

/// Writer for the VTK XML poly data (.vtp) format.
pub struct VTPWriter;

impl VTUWriter {
    pub fn write_vtu<P: AsRef<Path>>(mesh: &MeshModel, output_path: P) -> MeshResult<()> {
        let output_path = output_path.as_ref();
        mesh.validate()?;

        let num_cells = mesh.num_cells();
        let (connectivity, offsets) = xml_cell_verts(mesh);

        let piece = UnstructuredGridPiece {
            points: IOBuffer::F64(flat_points(mesh)),
            cells: Cells {
                cell_verts: VertexNumbers::XML {
                    connectivity,
                    offsets,
                },
                types: vec![mesh.cell_type().eltype_vtk(); num_cells],
            },
            data: attributes(mesh),
        };

        let vtk = new_vtk(DataSet::inline(piece));
        write_atomic(output_path, |f| Ok(vtk.write_xml(f)?))?;
        debug!(path = %output_path.display(), cells = num_cells, "wrote vtu file");
        Ok(())
    }
}

impl VTPWriter {
    /// Lines go to the `Lines` block, triangles and tetrahedra to `Polys`.
    pub fn write_vtp<P: AsRef<Path>>(mesh: &MeshModel, output_path: P) -> MeshResult<()> {
        let output_path = output_path.as_ref();
        mesh.validate()?;

        let (connectivity, offsets) = xml_cell_verts(mesh);
        let cell_verts = Some(VertexNumbers::XML {
            connectivity,
            offsets,
        });
        let (lines, polys) = match mesh.cell_type() {
            MeshCellType::Line => (cell_verts, None),
            MeshCellType::Triangle | MeshCellType::Tetrahedron => (None, cell_verts),
        };

        let piece = PolyDataPiece {
            points: IOBuffer::F64(flat_points(mesh)),
            verts: None,
            lines,
            polys,
            strips: None,
            data: attributes(mesh),
        };

        let vtk = new_vtk(DataSet::PolyData {
            meta: None,
            pieces: vec![Piece::Inline(Box::new(piece))],
        });
        write_atomic(output_path, |f| Ok(vtk.write_xml(f)?))?;
        debug!(path = %output_path.display(), cells = mesh.num_cells(), "wrote vtp file");
        Ok(())
    }
}

fn new_vtk(data: DataSet) -> Vtk {
    Vtk {
        version: Version { major: 1, minor: 0 },
        title: String::new(),
        byte_order: ByteOrder::LittleEndian,
        file_path: None,
        data,
    }
}

fn flat_points(mesh: &MeshModel) -> Vec<f64> {
    mesh.points().iter().flat_map(|p| p.iter().copied()).collect()
}

fn xml_cell_verts(mesh: &MeshModel) -> (Vec<u64>, Vec<u64>) {
    let arity = mesh.cell_type().arity() as u64;
    let connectivity = mesh.connectivity().iter().map(|&id| id as u64).collect();
    let offsets = (1..=mesh.num_cells() as u64).map(|i| i * arity).collect();
    (connectivity, offsets)
}

fn attributes(mesh: &MeshModel) -> Attributes {
    Attributes {
        point: mesh.point_data().iter().map(scalar_attribute).collect(),
        cell: mesh.cell_data().iter().map(scalar_attribute).collect(),
    }
}

fn scalar_attribute(array: &DataArray) -> Attribute {
    Attribute::scalars(array.name.as_str(), 1).with_data(IOBuffer::F64(array.values.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetra_mesh() -> MeshModel {
        let mut mesh = MeshModel::from_arrays(
            &[
                vec![0.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
            &[vec![0, 1, 2, 3]],
        )
        .unwrap();
        mesh.add_point_data("pressure", vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        mesh.add_cell_data("material", vec![7.0]).unwrap();
        mesh
    }

    #[test]
    fn test_offsets_follow_arity() {
        let mesh = MeshModel::from_arrays(
            &[vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]],
            &[vec![0, 1], vec![1, 2]],
        )
        .unwrap();
        let (connectivity, offsets) = xml_cell_verts(&mesh);
        assert_eq!(connectivity, vec![0, 1, 1, 2]);
        assert_eq!(offsets, vec![2, 4]);
    }

    #[test]
    fn test_vtu_contains_arrays_and_cell_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.vtu");
        VTUWriter::write_vtu(&tetra_mesh(), &path).unwrap();

        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("UnstructuredGrid"));
        assert!(xml.contains("pressure"));
        assert!(xml.contains("material"));
    }

    #[test]
    fn test_vtp_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.vtp");
        VTPWriter::write_vtp(&tetra_mesh(), &path).unwrap();

        let xml = std::fs::read_to_string(&path).unwrap();
        assert!(xml.contains("PolyData"));
        assert!(xml.contains("Polys"));
    }
}
