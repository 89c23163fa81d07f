use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::structs_and_impls::{CellType, MeshModel};
use crate::writer::{format_g, write_atomic};           // %g tags, temp-file-then-rename output

/// Number of single-node point elements written ahead of the tetrahedra.
/// Downstream tooling anchors its boundary markers to them.
pub const ANCHOR_ELEMENTS: usize = 8;

/// Gmsh element type of a 1-node point.
const GMSH_POINT: u32 = 15;

/// Writer for tetrahedral meshes in Gmsh ASCII format 2.2.
pub struct MshWriter;

impl MshWriter {
    /// Write a tetrahedral mesh, with every cell data array as an element tag.
    ///
    /// Layout of an element line: `id 4 ntags tag... n1 n2 n3 n4`, where the
    /// tags are the cell's values from each cell array in order and node ids
    /// are 1-based. Element ids start after the 8 anchor points.
    pub fn write_msh<P: AsRef<Path>>(mesh: &MeshModel, output_path: P) -> MeshResult<()> {
        let output_path = output_path.as_ref();
        Self::check(mesh)?; // fail before the file is created

        write_atomic(output_path, |f| Self::write_msh_to(mesh, f))?;
        debug!(
            path = %output_path.display(),
            nodes = mesh.num_points(),
            elements = mesh.num_cells() + ANCHOR_ELEMENTS,
            "wrote msh file"
        );
        Ok(())
    }

    /// Serialize into any writer. Nothing is written unless the mesh is a
    /// valid tetrahedral mesh.
    pub fn write_msh_to<W: Write>(mesh: &MeshModel, f: &mut W) -> MeshResult<()> {
        Self::check(mesh)?;

        // Header: version, file-type (ascii = 0), data-size
        writeln!(f, "$MeshFormat")?;
        writeln!(f, "2.2 0 8")?;
        writeln!(f, "$EndMeshFormat")?;

        writeln!(f, "$Nodes")?;
        writeln!(f, "{}", mesh.num_points())?;
        for (i, p) in mesh.points().iter().enumerate() {
            writeln!(f, "{} {:08.6} {:08.6} {:08.6}", i + 1, p[0], p[1], p[2])?;
        }
        writeln!(f, "$EndNodes")?;

        let cell_data = mesh.cell_data();
        writeln!(f, "$Elements")?;
        writeln!(f, "{}", mesh.num_cells() + ANCHOR_ELEMENTS)?;
        for i in 1..=ANCHOR_ELEMENTS {
            // physical group = elementary group = own id
            writeln!(f, "{} {} 1 1 {}", i, GMSH_POINT, i)?;
        }
        for (i, cell) in mesh.cells().enumerate() {
            write!(
                f,
                "{} {} {} ",
                i + 1 + ANCHOR_ELEMENTS,
                CellType::Tetrahedron.gmsh_code(),
                cell_data.len()
            )?;
            for array in cell_data {
                write!(f, "{} ", format_g(array.values[i]))?;
            }
            writeln!(f, "{} {} {} {}", cell[0] + 1, cell[1] + 1, cell[2] + 1, cell[3] + 1)?;
        }
        writeln!(f, "$EndElements")?;
        Ok(())
    }

    fn check(mesh: &MeshModel) -> MeshResult<()> {
        if mesh.cell_type() != CellType::Tetrahedron {
            return Err(MeshError::UnsupportedCellType {
                operation: "Gmsh export",
                cell_type: mesh.cell_type().to_string(),
            });
        }
        mesh.validate()
    }
}
