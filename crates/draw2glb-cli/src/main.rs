use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use draw2glb_core::model::{ModelSpec, Units};
use draw2glb_core::spec::BuildSpec;
use draw2glb_import::DrawingParser;
use draw2glb_server::{AllowedOrigins, ServerConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "draw2glb")]
#[command(about = "Read overall dimensions off 2D drawings and build simple GLB models.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Guess dimensions from a drawing and print the parse JSON.
    Parse {
        input: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
        #[arg(long, env = "TESSDATA_PREFIX")]
        tessdata: Option<PathBuf>,
    },
    /// Build a GLB from a spec file, a drawing, or explicit dimensions.
    Build {
        #[arg(long, conflicts_with_all = ["drawing", "width", "depth", "height"])]
        spec: Option<PathBuf>,
        /// Parse this drawing and build from the guessed dims and features.
        #[arg(long, conflicts_with_all = ["width", "depth", "height"])]
        drawing: Option<PathBuf>,
        #[arg(long, requires_all = ["depth", "height"])]
        width: Option<f64>,
        #[arg(long)]
        depth: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        #[arg(long, default_value = "mm")]
        units: String,
        #[arg(long, short, default_value = "model.glb")]
        out: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ServeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,
    #[arg(long, env = "STORAGE_DIR", default_value = "/tmp/draw2glb")]
    storage_dir: PathBuf,
    /// `*` for any origin, or a comma-separated list.
    #[arg(long, env = "FRONTEND_ORIGIN", default_value = "*")]
    frontend_origin: String,
    #[arg(long, env = "PARSE_TIME_LIMIT_S", default_value_t = 20)]
    parse_time_limit_s: u64,
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "MAX_UPLOAD_MB", default_value_t = 50)]
    max_upload_mb: usize,
    #[arg(long, env = "TESSDATA_PREFIX")]
    tessdata: Option<PathBuf>,
}

impl ServeArgs {
    fn to_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            storage_dir: self.storage_dir.clone(),
            allowed_origins: AllowedOrigins::parse(&self.frontend_origin),
            parse_time_limit: Duration::from_secs(self.parse_time_limit_s.max(1)),
            api_key: self.api_key.clone().filter(|k| !k.is_empty()),
            max_upload_bytes: self.max_upload_mb.saturating_mul(1024 * 1024),
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => serve(args),
        Command::Parse {
            input,
            report,
            tessdata,
        } => parse(&input, report.as_deref(), tessdata.as_deref()),
        Command::Build {
            spec,
            drawing,
            width,
            depth,
            height,
            units,
            out,
        } => {
            let input = match (spec, drawing) {
                (Some(path), _) => BuildInput::SpecFile(path),
                (None, Some(path)) => BuildInput::Drawing(path),
                (None, None) => BuildInput::Dims {
                    width,
                    depth,
                    height,
                    units,
                },
            };
            build(input, &out)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("draw2glb=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn serve(args: ServeArgs) -> Result<()> {
    let parser = drawing_parser(args.tessdata.as_deref())?;
    let config = args.to_config();
    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    runtime.block_on(draw2glb_server::serve(config, parser))
}

fn parse(input: &Path, report: Option<&Path>, tessdata: Option<&Path>) -> Result<()> {
    ensure_input_file(input)?;
    let parser = drawing_parser(tessdata)?;
    let resp = parser.parse_file(input)?;
    let json = serde_json::to_string_pretty(&resp).context("serialize parse result")?;

    if let Some(path) = report {
        write_output(path, json.as_bytes()).with_context(|| format!("write report: {path:?}"))?;
    } else {
        println!("{json}");
    }
    Ok(())
}

enum BuildInput {
    SpecFile(PathBuf),
    Drawing(PathBuf),
    Dims {
        width: Option<f64>,
        depth: Option<f64>,
        height: Option<f64>,
        units: String,
    },
}

fn build(input: BuildInput, out: &Path) -> Result<()> {
    let glb = match input {
        BuildInput::SpecFile(path) => {
            ensure_input_file(&path)?;
            let raw = std::fs::read(&path).with_context(|| format!("read spec: {path:?}"))?;
            let spec: serde_json::Value =
                serde_json::from_slice(&raw).with_context(|| format!("parse spec JSON: {path:?}"))?;
            draw2glb_core::build_glb_from_spec(&spec).context("build failed")?
        }
        BuildInput::Drawing(path) => {
            ensure_input_file(&path)?;
            let resp = drawing_parser(None)?.parse_file(&path)?;
            for w in &resp.warnings {
                tracing::warn!(code = %w.code, message = %w.message, "parse warning");
            }
            let model_spec = ModelSpec {
                units: Units::Millimeters,
                bbox: resp.dims,
                features: resp.features_proposed,
            };
            let spec = BuildSpec::from_model_spec(&model_spec).context("build failed")?;
            draw2glb_core::build_glb(&spec).context("build failed")?
        }
        BuildInput::Dims {
            width: Some(width),
            depth: Some(depth),
            height: Some(height),
            units,
        } => {
            let spec = serde_json::json!({
                "units": units,
                "bbox": { "width": width, "depth": depth, "height": height },
            });
            draw2glb_core::build_glb_from_spec(&spec).context("build failed")?
        }
        BuildInput::Dims { .. } => {
            bail!("pass --spec <file>, --drawing <file>, or all of --width, --depth and --height")
        }
    };

    write_output(out, &glb).with_context(|| format!("write glb: {out:?}"))?;
    tracing::info!(path = %out.display(), bytes = glb.len(), "wrote model");
    Ok(())
}

#[cfg(feature = "ocr")]
fn drawing_parser(tessdata: Option<&Path>) -> Result<DrawingParser> {
    let engine = draw2glb_import::TesseractOcr::new(tessdata)?;
    Ok(DrawingParser::default().with_ocr(std::sync::Arc::new(engine)))
}

#[cfg(not(feature = "ocr"))]
fn drawing_parser(tessdata: Option<&Path>) -> Result<DrawingParser> {
    if tessdata.is_some() {
        tracing::warn!("built without the `ocr` feature; raster drawings will use default dimensions");
    }
    Ok(DrawingParser::default())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create dir: {parent:?}"))?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

fn ensure_input_file(input: &Path) -> Result<()> {
    let meta = std::fs::metadata(input).with_context(|| format!("input not found: {input:?}"))?;
    if !meta.is_file() {
        bail!("input is not a file: {input:?}");
    }
    Ok(())
}
