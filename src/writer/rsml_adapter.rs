use std::path::Path;

use tracing::warn;

use crate::error::MeshResult;
use crate::structs_and_impls::MeshModel;
use crate::writer::rsml_writer::{RsmlMetadata, RsmlRequest, RsmlSink};

/// Maps a mesh onto the inputs of a root system markup writer.
pub struct RsmlAdapter;

impl RsmlAdapter {
    /// Collect nodes, segments and data arrays from `mesh` without renumbering.
    ///
    /// All point arrays become node attributes. Only the first cell array is
    /// passed on, as the per-segment scalar; further cell arrays are dropped.
    pub fn extract(mesh: &MeshModel, metadata: &RsmlMetadata) -> RsmlRequest {
        let node_data: Vec<Vec<f64>> = mesh.point_data().iter().map(|a| a.values.clone()).collect();
        let node_data_names = mesh.point_data().iter().map(|a| a.name.clone()).collect();
        let seg_data: Vec<&[f64]> = mesh.cell_data().iter().map(|a| a.values.as_slice()).collect();

        if seg_data.len() > 1 {
            warn!(
                dropped = seg_data.len() - 1,
                "RSML export keeps only the first cell data array"
            );
        }

        RsmlRequest {
            segment_ids: vec![0],
            segments: mesh.cells().map(<[usize]>::to_vec).collect(),
            segment_scalar: seg_data.first().map(|s| s.to_vec()).unwrap_or_default(),
            nodes: mesh.points().to_vec(),
            node_data,
            node_data_names,
            metadata: metadata.clone(),
            renumber: false,
        }
    }

    /// Validate `mesh` and hand its data to `sink`. No file I/O happens here.
    pub fn to_rsml<S, P>(mesh: &MeshModel, metadata: &RsmlMetadata, sink: &mut S, path: P) -> MeshResult<()>
    where
        S: RsmlSink + ?Sized,
        P: AsRef<Path>,
    {
        mesh.validate()?;
        sink.write_rsml(path.as_ref(), Self::extract(mesh, metadata))
    }
}
