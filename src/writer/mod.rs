//! Output writers and extension-based format selection.

pub mod dgf_writer;
pub mod msh_writer;
pub mod rsml_adapter;
pub mod rsml_writer;
pub mod xml_writer;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::Builder;

use crate::error::{MeshError, MeshResult};
use crate::structs_and_impls::MeshModel;

use dgf_writer::DgfWriter;
use msh_writer::MshWriter;
use rsml_adapter::RsmlAdapter;
use rsml_writer::{RsmlMetadata, RsmlWriter};
use xml_writer::{VTPWriter, VTUWriter};

/// File formats a mesh can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Gmsh ASCII 2.2
    Msh,
    /// DUNE grid format
    Dgf,
    /// VTK XML PolyData
    Vtp,
    /// VTK XML UnstructuredGrid
    Vtu,
    /// Root system markup language
    Rsml,
}

impl OutputFormat {
    /// Detect format from a file extension (case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        Self::from_extension(&ext)
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "msh" => Some(Self::Msh),
            "dgf" => Some(Self::Dgf),
            "vtp" => Some(Self::Vtp),
            "vtu" => Some(Self::Vtu),
            "rsml" => Some(Self::Rsml),
            _ => None,
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Msh => "msh",
            Self::Dgf => "dgf",
            Self::Vtp => "vtp",
            Self::Vtu => "vtu",
            Self::Rsml => "rsml",
        }
    }
}

/// Write `mesh` to `path` in the given format.
pub fn save_mesh<P: AsRef<Path>>(mesh: &MeshModel, path: P, format: OutputFormat) -> MeshResult<()> {
    let path = path.as_ref();
    match format {
        OutputFormat::Msh => MshWriter::write_msh(mesh, path),
        OutputFormat::Dgf => DgfWriter::write_dgf(mesh, path),
        OutputFormat::Vtp => VTPWriter::write_vtp(mesh, path),
        OutputFormat::Vtu => VTUWriter::write_vtu(mesh, path),
        OutputFormat::Rsml => {
            RsmlAdapter::to_rsml(mesh, &RsmlMetadata::default(), &mut RsmlWriter, path)
        }
    }
}

/// Like [`save_mesh`], with the format taken from the extension of `path`.
pub fn save_mesh_auto<P: AsRef<Path>>(mesh: &MeshModel, path: P) -> MeshResult<()> {
    let path = path.as_ref();
    let format = OutputFormat::from_path(path).ok_or_else(|| MeshError::UnknownFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;
    save_mesh(mesh, path, format)
}

/// Stream output into a temporary file next to `path` and rename it over
/// `path` once `write` has succeeded. On error the temporary file is dropped
/// and deleted, so `path` is either the complete new file or untouched.
///
/// The result gets the permissions `File::create` would give: those of the
/// file being replaced, or the umask default for a new file.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> MeshResult<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> MeshResult<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666)); // umask applies, as for File::create
    }
    let mut tmp = builder.tempfile_in(dir)?;
    if let Ok(existing) = fs::metadata(path) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out)?;
        out.flush()?;
    }
    tmp.persist(path).map_err(|e| MeshError::Io(e.error))?;
    Ok(())
}

/// Format a number like C's `%g`: 6 significant digits, trailing zeros
/// removed, exponent notation below 1e-4 and from 1e6 on.
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;

    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // The exponent has to come from the rounded value: 999999.5 prints as 1e+06.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
