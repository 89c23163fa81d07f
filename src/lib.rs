// src/lib.rs

//! Mesh cleanup and conversion for simulation input files.
//!
//! A [`MeshModel`] is read from a VTK XML file (or built in memory), can be
//! cleaned with [`GridCleaner`] and [`BoundingBoxSnapper`], scored with
//! [`GeometricAnalysis`], and written as Gmsh `.msh`, DUNE `.dgf`, `.vtp`,
//! `.vtu` or RSML.

pub mod error;
pub mod structs_and_impls;
pub mod parser;
pub mod writer;
pub mod mesh_analysis;

pub use error::{MeshError, MeshResult};
pub use mesh_analysis::geometric_analysis::{GeometricAnalysis, MeshQualityReport, QualityStatistics};
pub use mesh_analysis::grid_cleanup::{
    BoundingBox, BoundingBoxSnapper, GridCleaner, RebuildReport, DEFAULT_SNAP_EPS,
};
pub use parser::vtk::vtp::VtpParser;
pub use structs_and_impls::{CellType, DataArray, MeshModel};
pub use writer::dgf_writer::DgfWriter;
pub use writer::msh_writer::MshWriter;
pub use writer::rsml_adapter::RsmlAdapter;
pub use writer::rsml_writer::{RsmlMetadata, RsmlRequest, RsmlSink, RsmlWriter};
pub use writer::xml_writer::{VTPWriter, VTUWriter};
pub use writer::{save_mesh, save_mesh_auto, OutputFormat};
