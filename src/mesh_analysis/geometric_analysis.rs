use rayon::prelude::*;                                 // par_chunks_exact over the connectivity

use crate::error::{MeshError, MeshResult};
use crate::structs_and_impls::{CellType, MeshModel};

/// Summary over all per-element scores.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualityStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshQualityReport {
    pub total_elements: usize,       // number of tetrahedra scored
    pub element_qualities: Vec<f64>, // one score per cell, in cell order
    pub statistics: QualityStatistics,
}

/// Geometry routines (tetrahedron quality)
pub struct GeometricAnalysis;

impl GeometricAnalysis {
    /// Score every tetrahedron of the mesh with [`Self::tetra_quality`].
    ///
    /// The score is half the absolute determinant of the edge matrix, i.e.
    /// proportional to the volume. It does not measure shape (a large, badly
    /// shaped element outscores a small regular one). Nothing is printed; the
    /// caller decides what to do with the report.
    pub fn analyse_mesh_quality(mesh: &MeshModel) -> MeshResult<MeshQualityReport> {
        if mesh.cell_type() != CellType::Tetrahedron {
            return Err(MeshError::UnsupportedCellType {
                operation: "quality evaluation",
                cell_type: mesh.cell_type().to_string(),
            });
        }
        mesh.check_indices()?;

        let points = mesh.points();
        let element_qualities: Vec<f64> = mesh
            .connectivity()
            .par_chunks_exact(4)
            .map(|t| Self::tetra_quality([points[t[0]], points[t[1]], points[t[2]], points[t[3]]]))
            .collect();

        let statistics = Self::statistics(&element_qualities);
        Ok(MeshQualityReport {
            total_elements: element_qualities.len(),
            element_qualities,
            statistics,
        })
    }

    /// `|det(v0 - v3, v1 - v3, v2 - v3)| / 2` for vertices `v0..v3`.
    pub fn tetra_quality(v: [[f64; 3]; 4]) -> f64 {
        let mut d = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                d[i][j] = v[i][j] - v[3][j];
            }
        }
        (Self::determinant3(&d) / 2.0).abs()
    }

    fn determinant3(m: &[[f64; 3]; 3]) -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// min / max / mean, all zero for an empty slice.
    pub fn statistics(scores: &[f64]) -> QualityStatistics {
        if scores.is_empty() {
            return QualityStatistics::default();
        }
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;
        QualityStatistics { min, max, mean }
    }
}
