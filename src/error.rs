//! Error types shared by the mesh model, cleanup passes and writers.

use std::io;

use thiserror::Error;

/// Result type used throughout the crate.
pub type MeshResult<T> = Result<T, MeshError>;

/// Everything that can go wrong while validating, cleaning or writing a mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    /// A cell references a point that does not exist.
    #[error("cell {cell} references point {index}, but the mesh only has {num_points} points")]
    IndexOutOfRange {
        cell: usize,
        index: usize,
        num_points: usize,
    },

    /// A data array does not cover exactly the points or cells it is attached to.
    #[error("data array '{name}' has {got} values, expected {expected}")]
    ArrayLengthMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    /// Cells with different vertex counts in one mesh.
    #[error("cell {cell} has {got} vertices, but the mesh uses {expected}-vertex cells")]
    HeterogeneousCellArity {
        expected: usize,
        got: usize,
        cell: usize,
    },

    /// Vertex count that maps to none of line, triangle or tetrahedron.
    #[error("unsupported cell arity {arity} (expected 2, 3 or 4)")]
    UnsupportedArity { arity: usize },

    /// Operation that only makes sense for one cell type.
    #[error("{operation} does not support {cell_type} cells")]
    UnsupportedCellType {
        operation: &'static str,
        cell_type: String,
    },

    /// Input data that could be read but is not a usable mesh.
    #[error("invalid mesh content: {message}")]
    InvalidContent { message: String },

    /// Output extension that no writer handles.
    #[error("unknown output format: .{extension}")]
    UnknownFormat { extension: String },

    /// File could not be opened, written or renamed into place.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure inside the VTK reader/writer.
    #[error("VTK error: {0}")]
    Vtk(#[from] vtkio::Error),
}

impl MeshError {
    /// Create an `InvalidContent` error with the given message.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        MeshError::InvalidContent {
            message: message.into(),
        }
    }
}
