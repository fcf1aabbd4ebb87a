//! Coronaview - false-color rendering of coronagraph image stacks.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use coronaview::colormap::{ColorLookupTable, Palette};
use coronaview::config::{validate_gamma, ViewParams, DEFAULT_CEILING, DEFAULT_TABLE_SIZE};
use coronaview::data::{list_variables, read_stack};
use coronaview::export::{write_indexed_json, write_png_frames, IndexedPayload};
use coronaview::normalize::{downsample_stack, Ceiling, GammaStrategy};
use coronaview::render::{PlaybackDirection, SaturationWindow};
use coronaview::session::ViewerSession;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "coronaview")]
#[command(about = "False-color rendering of coronagraph image stacks", long_about = None)]
struct Cli {
    /// Enable logging to specified file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available palettes
    Palettes,
    /// Print a palette's colorscale as JSON
    Colorscale {
        /// Palette name
        #[arg(long, default_value_t = Palette::default())]
        palette: Palette,
        /// Number of table entries
        #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
        size: usize,
        /// Gamma folded into the table
        #[arg(long, default_value_t = 1.0)]
        gamma: f64,
        /// Largest normalized index the gamma remap spans [default: size - 1, at most 255]
        #[arg(long)]
        ceiling: Option<u8>,
    },
    /// List the variables of a NetCDF file
    Inspect {
        /// Path to the NetCDF file
        file: PathBuf,
    },
    /// Render an image stack to PNG frames or an indexed JSON payload
    Render(RenderArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One PNG per frame
    Png,
    /// Colorscale plus index stack
    Json,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Path to the NetCDF file
    file: PathBuf,
    /// Variable holding the image stack
    #[arg(long = "var")]
    variable: String,
    /// Palette name
    #[arg(long, default_value_t = Palette::default())]
    palette: Palette,
    /// Number of table entries
    #[arg(long, default_value_t = DEFAULT_TABLE_SIZE)]
    size: usize,
    /// Gamma exponent on normalized intensity
    #[arg(long, default_value_t = 1.0)]
    gamma: f64,
    /// Apply gamma to pixel values or to the color table
    #[arg(long = "gamma-mode", default_value_t = GammaStrategy::default())]
    gamma_mode: GammaStrategy,
    /// Largest normalized index
    #[arg(long, default_value_t = DEFAULT_CEILING)]
    ceiling: u8,
    /// Saturation window over indices, as LOW,HIGH
    #[arg(long, value_parser = parse_window)]
    window: Option<(u8, u8)>,
    /// Stretch the window over the whole table instead of clamping
    #[arg(long, requires = "window")]
    stretch: bool,
    /// Median-downsample frames by this block size
    #[arg(long)]
    downsample: Option<usize>,
    /// Write frames last to first
    #[arg(long)]
    reverse: bool,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,
    /// Output directory
    #[arg(long)]
    out: PathBuf,
}

fn parse_window(s: &str) -> std::result::Result<(u8, u8), String> {
    let (low, high) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LOW,HIGH, got '{}'", s))?;
    let low = low.trim().parse::<u8>().map_err(|e| format!("bad LOW: {}", e))?;
    let high = high.trim().parse::<u8>().map_err(|e| format!("bad HIGH: {}", e))?;
    Ok((low, high))
}

fn init_logging(log_path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    tracing::info!("Starting Coronaview");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        init_logging(log_path)?;
    }

    match cli.command {
        Command::Palettes => {
            for palette in Palette::all() {
                println!("{:<12} {}", palette.name(), palette.label());
            }
        }
        Command::Colorscale {
            palette,
            size,
            gamma,
            ceiling,
        } => {
            validate_gamma(gamma)?;
            let ceiling = match ceiling {
                Some(k) => k,
                None => u8::try_from(size.saturating_sub(1)).unwrap_or(u8::MAX),
            };
            let table = ColorLookupTable::build(&palette.gradient(), size)?
                .with_index_gamma(1.0 / gamma, Ceiling::new(ceiling)?)?;
            println!("{}", serde_json::to_string_pretty(&table.descriptor())?);
        }
        Command::Inspect { file } => {
            for var in list_variables(&file)? {
                let dims = var.dim_names.join(", ");
                let marker = if var.is_image() { "*" } else { " " };
                println!("{} {:<24} {:<6} {:?} ({})", marker, var.name, var.dtype, var.shape, dims);
            }
        }
        Command::Render(args) => render(args)?,
    }

    if cli.log.is_some() {
        tracing::info!("Coronaview exited");
    }

    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let window = match args.window {
        Some((low, high)) if args.stretch => Some(SaturationWindow::stretch(low, high)?),
        Some((low, high)) => Some(SaturationWindow::clamp(low, high)?),
        None => None,
    };
    let direction = if args.reverse {
        PlaybackDirection::Reverse
    } else {
        PlaybackDirection::Forward
    };

    let mut stack = read_stack(&args.file, &args.variable)?;
    if let Some(block) = args.downsample {
        stack = downsample_stack(&stack, block)?;
    }

    let params = ViewParams {
        palette: args.palette,
        table_size: args.size,
        ceiling: Ceiling::new(args.ceiling)?,
        gamma: args.gamma,
        gamma_strategy: args.gamma_mode,
        window,
        frame: 0,
        direction,
    };
    let session = ViewerSession::new(stack, params)?;
    let snapshot = session.snapshot();

    match args.format {
        OutputFormat::Png => {
            let paths = write_png_frames(snapshot.rgb(), &args.out, direction)?;
            println!("Wrote {} frames to {}", paths.len(), args.out.display());
        }
        OutputFormat::Json => {
            std::fs::create_dir_all(&args.out)?;
            let name = args.variable.trim_start_matches('/').replace('/', "_");
            let path = args.out.join(format!("{}.json", name));
            let payload = IndexedPayload::from_snapshot(&snapshot)?;
            write_indexed_json(&payload, &path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
