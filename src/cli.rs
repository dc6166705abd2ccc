// ============================================================================
// Elevator CLI — headless batch tile colorization
// ============================================================================
//
// Usage examples:
//   elevator --input tile.png --output colored.png
//   elevator -i tiles/*.png --output-dir colored/ --alpha 200
//   elevator -i tile.png -o out.png --stops my-stops.json
//   elevator -i tile.png -o out.png --store /path/to/store.json
//
// Inputs are terrarium-encoded terrain tiles. Each pixel is decoded to an
// elevation and pushed through the stop table, producing an RGBA overlay
// PNG of the same size. Stops and alpha come from the persisted session
// store unless overridden on the command line.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::ImageError;

use crate::colorize::colorize_tile;
use crate::session::{DEFAULT_ALPHA, Session};
use crate::stops::StopTable;
use crate::store::Store;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Elevator headless tile colorizer.
///
/// Colorize terrarium terrain tiles with an elevation stop table — no GUI
/// required.
#[derive(Parser, Debug)]
#[command(
    name = "elevator",
    about = "Elevator headless terrain-tile colorizer",
    long_about = "Decode terrarium-encoded terrain tiles and colorize them\n\
                  pixel-by-pixel through an elevation stop table, writing RGBA\n\
                  overlay PNGs.\n\n\
                  Example:\n  \
                  elevator --input tile.png --output colored.png\n  \
                  elevator -i tiles/*.png --output-dir colored/ --alpha 200"
)]
pub struct CliArgs {
    /// Input tile(s). Glob patterns accepted (e.g. "*.png", "tiles/*.png").
    #[arg(short, long, required = true, num_args = 1..)]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here as `<stem>_colored.png`.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON stop table file (an array of stops). Overrides the stops saved
    /// in the session store.
    #[arg(short, long, value_name = "STOPS.json")]
    pub stops: Option<PathBuf>,

    /// Overlay opacity 0–255. Overrides the alpha saved in the session store.
    #[arg(short, long, value_name = "0-255")]
    pub alpha: Option<u8>,

    /// Session store file to read stops/alpha from.
    /// Defaults to the per-user store in the platform data directory.
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug)]
pub enum CliError {
    Io(std::io::Error),
    Image(ImageError),
    Stops(String),
    Usage(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Image(e) => write!(f, "Image error: {}", e),
            CliError::Stops(e) => write!(f, "Stop table error: {}", e),
            CliError::Usage(e) => write!(f, "{}", e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<ImageError> for CliError {
    fn from(e: ImageError) -> Self {
        CliError::Image(e)
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments, colorize every input, report a process exit code.
pub fn run() -> ExitCode {
    let args = CliArgs::parse();
    match run_with(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("elevator: {}", e);
            crate::log_err!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_with(args: &CliArgs) -> Result<(), CliError> {
    let inputs = expand_inputs(&args.input);
    if inputs.is_empty() {
        return Err(CliError::Usage("no input files matched".into()));
    }
    if args.output.is_some() && inputs.len() > 1 {
        return Err(CliError::Usage(
            "--output is for single-file input; use --output-dir for batches".into(),
        ));
    }

    let (stops, alpha) = resolve_settings(args)?;
    if stops.is_empty() {
        crate::log_warn!("Stop table is empty; output tiles will be fully transparent");
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)?;
    }

    for input in &inputs {
        let started = Instant::now();
        let output = output_path(args, input);
        colorize_one(input, &output, &stops, alpha)?;
        if args.verbose {
            println!(
                "{} -> {} ({} ms)",
                input.display(),
                output.display(),
                started.elapsed().as_millis()
            );
        }
        crate::log_info!("Colorized {} -> {}", input.display(), output.display());
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns; plain paths pass through untouched.
fn expand_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        match glob::glob(pattern) {
            Ok(paths) => {
                let before = inputs.len();
                for path in paths.flatten() {
                    inputs.push(path);
                }
                // A pattern with no matches may simply be a literal path the
                // shell didn't expand
                if inputs.len() == before && Path::new(pattern).exists() {
                    inputs.push(PathBuf::from(pattern));
                }
            }
            Err(_) => inputs.push(PathBuf::from(pattern)),
        }
    }
    inputs
}

/// Stop table and alpha for this run: explicit files/flags first, then the
/// persisted session, then built-in defaults.
fn resolve_settings(args: &CliArgs) -> Result<(StopTable, u8), CliError> {
    let stops: Option<StopTable> = match &args.stops {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Some(
                serde_json::from_str(&text)
                    .map_err(|e| CliError::Stops(format!("{}: {}", path.display(), e)))?,
            )
        }
        None => None,
    };

    // Only touch the session store for settings the command line leaves open
    let (stops, alpha) = if stops.is_some() && args.alpha.is_some() {
        (stops, args.alpha)
    } else {
        let session = match &args.store {
            Some(path) => Session::open(Store::open(path.clone())),
            None => Session::open_default(),
        };
        (
            stops.or_else(|| session.stops.get()),
            args.alpha.or_else(|| session.alpha.get()),
        )
    };

    Ok((
        stops.unwrap_or_else(StopTable::default_stops),
        alpha.unwrap_or(DEFAULT_ALPHA),
    ))
}

fn output_path(args: &CliArgs, input: &Path) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "tile".to_string());
    let name = format!("{}_colored.png", stem);
    match &args.output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn colorize_one(input: &Path, output: &Path, stops: &StopTable, alpha: u8) -> Result<(), CliError> {
    let tile = image::open(input)?.to_rgba8();
    let colored = colorize_tile(&tile, stops, alpha);
    colored.save(output)?;
    Ok(())
}
