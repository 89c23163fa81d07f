//! `vtp2msh`: convert a VTK mesh into a simulation input file.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;                 // plain log lines, level from --log-level

use simmesh::{
    save_mesh, BoundingBox, GeometricAnalysis, MeshError, MeshResult, OutputFormat, VtpParser,
    DEFAULT_SNAP_EPS,
};

#[derive(Parser, Debug)]
#[command(name = "vtp2msh")]
#[command(version, about = "Convert a .vtp/.vtu mesh to Gmsh, DUNE grid, VTK or RSML")]
struct Cli {
    /// Input mesh (.vtp or .vtu)
    input: PathBuf,

    /// Output file. Defaults to the input path with the target format's extension.
    output: Option<PathBuf>,

    /// Output format. Detected from the output extension when omitted (msh if there is no output path).
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Remove points no cell references and renumber the cells
    #[arg(long)]
    clean: bool,

    /// Snap points onto a box given as xmin,ymin,zmin,xmax,ymax,zmax
    #[arg(long, value_name = "BOX", value_parser = parse_box, allow_hyphen_values = true)]
    snap: Option<BoundingBox>,

    /// Snapping tolerance
    #[arg(long, default_value_t = DEFAULT_SNAP_EPS)]
    eps: f64,

    /// Log tetrahedron quality statistics
    #[arg(long)]
    quality: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Msh,
    Dgf,
    Vtp,
    Vtu,
    Rsml,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Msh => OutputFormat::Msh,
            FormatArg::Dgf => OutputFormat::Dgf,
            FormatArg::Vtp => OutputFormat::Vtp,
            FormatArg::Vtu => OutputFormat::Vtu,
            FormatArg::Rsml => OutputFormat::Rsml,
        }
    }
}

fn parse_box(s: &str) -> Result<BoundingBox, String> {
    s.parse::<BoundingBox>().map_err(|e| e.to_string())
}

/// Pick the output path and format from the command line.
fn resolve_output(
    input: &Path,
    output: Option<&Path>,
    format: Option<OutputFormat>,
) -> MeshResult<(PathBuf, OutputFormat)> {
    match (output, format) {
        (Some(path), Some(format)) => Ok((path.to_path_buf(), format)),
        (Some(path), None) => {
            let format = OutputFormat::from_path(path).ok_or_else(|| MeshError::UnknownFormat {
                extension: path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("(none)")
                    .to_string(),
            })?;
            Ok((path.to_path_buf(), format))
        }
        (None, format) => {
            let format = format.unwrap_or(OutputFormat::Msh);
            Ok((input.with_extension(format.extension()), format))
        }
    }
}

fn run(cli: &Cli) -> MeshResult<()> {
    let (output, format) = resolve_output(
        &cli.input,
        cli.output.as_deref(),
        cli.format.map(OutputFormat::from),
    )?;
    info!("Converting {} to {}", cli.input.display(), output.display());

    let mut mesh = VtpParser::parse_file(&cli.input)?;

    if cli.clean {
        let report = mesh.rebuild()?;
        info!("Removed {} unused points", report.removed.len());
    }
    if let Some(bbox) = &cli.snap {
        let moved = mesh.snap_to_box(bbox, cli.eps);
        info!("Snapped {} coordinates to the bounding box", moved);
    }
    if cli.quality {
        let report = GeometricAnalysis::analyse_mesh_quality(&mesh)?;
        let s = report.statistics;
        info!("Grid quality: min: {} max: {} mean: {}", s.min, s.max, s.mean);
    }

    save_mesh(&mesh, &output, format)?;
    info!("done.");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: could not install logger: {e}");
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
