//! Root system markup (RSML) output.
//!
//! [`RsmlSink`] is the seam the mesh adapter talks to; [`RsmlWriter`] is the
//! file-based implementation. Segments are chained into polylines, each of
//! which becomes one `<root>` of a single plant.

use std::io::{self, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;                                 // event writer with indentation
use tracing::debug;

use crate::error::{MeshError, MeshResult};
use crate::writer::{format_g, write_atomic};

/// Free-form metadata written to the `<metadata>` block.
#[derive(Debug, Clone, PartialEq)]
pub struct RsmlMetadata {
    pub unit: String,
    pub resolution: f64,
    pub software: String,
    /// Extra `<property name="key">value</property>` entries, written in order.
    pub properties: Vec<(String, String)>,
}

impl Default for RsmlMetadata {
    fn default() -> Self {
        Self {
            unit: "cm".to_string(),
            resolution: 1.0,
            software: env!("CARGO_PKG_NAME").to_string(),
            properties: Vec::new(),
        }
    }
}

/// Everything a root system markup writer needs from a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct RsmlRequest {
    pub segment_ids: Vec<usize>,
    /// Point index tuples, one per segment.
    pub segments: Vec<Vec<usize>>,
    /// One scalar per segment (may be empty).
    pub segment_scalar: Vec<f64>,
    pub nodes: Vec<[f64; 3]>,
    /// Node attribute arrays, array index outer.
    pub node_data: Vec<Vec<f64>>,
    pub node_data_names: Vec<String>,
    pub metadata: RsmlMetadata,
    /// Whether the writer may renumber nodes.
    pub renumber: bool,
}

/// Something that turns an [`RsmlRequest`] into a markup file.
pub trait RsmlSink {
    fn write_rsml(&mut self, path: &Path, request: RsmlRequest) -> MeshResult<()>;
}

/// Writes RSML files with `quick-xml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RsmlWriter;

impl RsmlSink for RsmlWriter {
    fn write_rsml(&mut self, path: &Path, request: RsmlRequest) -> MeshResult<()> {
        let polylines = Self::polylines(&request)?;
        write_atomic(path, |f| Self::write_document(f, &request, &polylines))?;
        debug!(path = %path.display(), roots = polylines.len(), "wrote rsml file");
        Ok(())
    }
}

/// A chain of consecutive segments: its node indices and the segment index
/// that ends at each node after the first.
#[derive(Debug, Clone, PartialEq)]
struct Polyline {
    nodes: Vec<usize>,
    segments: Vec<usize>,
}

impl RsmlWriter {
    /// Group segments into polylines. A segment continues the current polyline
    /// when its first node is the polyline's last node; otherwise it starts a
    /// new one.
    fn polylines(request: &RsmlRequest) -> MeshResult<Vec<Polyline>> {
        let num_nodes = request.nodes.len();
        let mut polylines: Vec<Polyline> = Vec::new();
        for (s, seg) in request.segments.iter().enumerate() {
            let [a, b] = match seg.as_slice() {
                [a, b] => [*a, *b],
                _ => {
                    return Err(MeshError::UnsupportedCellType {
                        operation: "RSML export",
                        cell_type: format!("{}-vertex", seg.len()),
                    })
                }
            };
            if let Some(&index) = [a, b].iter().find(|&&i| i >= num_nodes) {
                return Err(MeshError::IndexOutOfRange {
                    cell: s,
                    index,
                    num_points: num_nodes,
                });
            }
            match polylines.last_mut() {
                Some(line) if line.nodes.last() == Some(&a) => {
                    line.nodes.push(b);
                    line.segments.push(s);
                }
                _ => polylines.push(Polyline {
                    nodes: vec![a, b],
                    segments: vec![s],
                }),
            }
        }
        Ok(polylines)
    }

    fn write_document<W: Write>(
        out: &mut W,
        request: &RsmlRequest,
        polylines: &[Polyline],
    ) -> MeshResult<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);
        let w = &mut writer;

        event(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut rsml = BytesStart::new("rsml");
        rsml.push_attribute(("xmlns:po", "http://www.plantontology.org/xml-dtd/po.dtd"));
        event(w, Event::Start(rsml))?;

        Self::write_metadata(w, request)?;

        event(w, Event::Start(BytesStart::new("scene")))?;
        event(w, Event::Start(BytesStart::new("plant")))?;
        for (r, line) in polylines.iter().enumerate() {
            Self::write_root(w, request, r, line)?;
        }
        event(w, Event::End(BytesEnd::new("plant")))?;
        event(w, Event::End(BytesEnd::new("scene")))?;
        event(w, Event::End(BytesEnd::new("rsml")))?;
        Ok(())
    }

    fn write_metadata<W: Write>(w: &mut Writer<W>, request: &RsmlRequest) -> MeshResult<()> {
        let meta = &request.metadata;
        event(w, Event::Start(BytesStart::new("metadata")))?;
        text_element(w, "version", "1")?;
        text_element(w, "unit", &meta.unit)?;
        text_element(w, "resolution", &format_g(meta.resolution))?;
        text_element(w, "software", &meta.software)?;
        for (key, value) in &meta.properties {
            let mut property = BytesStart::new("property");
            property.push_attribute(("name", key.as_str())); // escaped, any key is safe
            event(w, Event::Start(property))?;
            event(w, Event::Text(BytesText::new(value)))?;
            event(w, Event::End(BytesEnd::new("property")))?;
        }

        event(w, Event::Start(BytesStart::new("property-definitions")))?;
        let mut names: Vec<&str> = request.node_data_names.iter().map(String::as_str).collect();
        if !request.segment_scalar.is_empty() {
            names.push(SEGMENT_FUNCTION);
        }
        for name in names {
            event(w, Event::Start(BytesStart::new("property-definition")))?;
            text_element(w, "label", name)?;
            text_element(w, "type", "real")?;
            text_element(w, "unit", "none")?;
            event(w, Event::End(BytesEnd::new("property-definition")))?;
        }
        event(w, Event::End(BytesEnd::new("property-definitions")))?;
        event(w, Event::End(BytesEnd::new("metadata")))?;
        Ok(())
    }

    fn write_root<W: Write>(
        w: &mut Writer<W>,
        request: &RsmlRequest,
        index: usize,
        line: &Polyline,
    ) -> MeshResult<()> {
        let id = request.segment_ids.get(index).copied().unwrap_or(index);
        let mut root = BytesStart::new("root");
        root.push_attribute(("ID", id.to_string().as_str()));
        root.push_attribute(("label", "root"));
        event(w, Event::Start(root))?;

        event(w, Event::Start(BytesStart::new("geometry")))?;
        event(w, Event::Start(BytesStart::new("polyline")))?;
        for &n in &line.nodes {
            let p = request.nodes[n];
            let mut point = BytesStart::new("point");
            point.push_attribute(("x", format_g(p[0]).as_str()));
            point.push_attribute(("y", format_g(p[1]).as_str()));
            point.push_attribute(("z", format_g(p[2]).as_str()));
            event(w, Event::Empty(point))?;
        }
        event(w, Event::End(BytesEnd::new("polyline")))?;
        event(w, Event::End(BytesEnd::new("geometry")))?;

        event(w, Event::Start(BytesStart::new("functions")))?;
        for (name, values) in request.node_data_names.iter().zip(&request.node_data) {
            let samples = line.nodes.iter().map(|&n| values.get(n).copied().unwrap_or(0.0));
            function(w, name, samples)?;
        }
        if !request.segment_scalar.is_empty() {
            // one sample per polyline node: the first node takes its outgoing segment's value
            let first = line.segments.first().copied().unwrap_or(0);
            let samples = std::iter::once(first)
                .chain(line.segments.iter().copied())
                .map(|s| request.segment_scalar.get(s).copied().unwrap_or(0.0));
            function(w, SEGMENT_FUNCTION, samples)?;
        }
        event(w, Event::End(BytesEnd::new("functions")))?;

        event(w, Event::End(BytesEnd::new("root")))?;
        Ok(())
    }
}

/// Function name used for the per-segment scalar.
pub const SEGMENT_FUNCTION: &str = "segment_data";

fn function<W: Write>(
    w: &mut Writer<W>,
    name: &str,
    samples: impl Iterator<Item = f64>,
) -> MeshResult<()> {
    let mut f = BytesStart::new("function");
    f.push_attribute(("name", name));
    f.push_attribute(("domain", "polyline"));
    event(w, Event::Start(f))?;
    for v in samples {
        text_element(w, "sample", &format_g(v))?;
    }
    event(w, Event::End(BytesEnd::new("function")))?;
    Ok(())
}

fn text_element<W: Write>(w: &mut Writer<W>, tag: &str, text: &str) -> MeshResult<()> {
    event(w, Event::Start(BytesStart::new(tag)))?;
    event(w, Event::Text(BytesText::new(text)))?;
    event(w, Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn event<W: Write>(w: &mut Writer<W>, e: Event<'_>) -> MeshResult<()> {
    w.write_event(e).map_err(|e| match e {
        quick_xml::Error::Io(source) => {
            MeshError::Io(io::Error::new(source.kind(), source.to_string()))
        }
        other => MeshError::invalid_content(format!("failed to write RSML: {other}")),
    })
}
