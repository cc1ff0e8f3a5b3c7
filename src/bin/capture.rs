//! Screenshot capture CLI.
//!
//! Grabs the puzzle window by default; monitors, all-monitor sweeps, and
//! adb-connected devices are available behind flags. Saved files are
//! timestamped `screen_*` images that `sudoku-solve` picks up.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

use sudoku_snap::capture::{self, device, screen, window, Frame, ImageFormat};
use sudoku_snap::{config, log, paths};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpg,
    Jpeg,
}

impl From<FormatArg> for ImageFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpg | FormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sudoku-capture", version, about = "Capture a screenshot of the puzzle window, a monitor, or a connected device")]
struct Args {
    /// Output directory (default: screenshots/ next to the executable)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Capture every monitor, one file each
    #[arg(long, group = "target")]
    all: bool,

    /// Capture a single monitor (1 = primary/first)
    #[arg(long, group = "target")]
    monitor: Option<usize>,

    /// Capture the window whose title contains this string
    #[arg(long, group = "target")]
    window: Option<String>,

    /// Capture from a connected device over adb
    #[arg(long, group = "target")]
    device: bool,

    /// Device serial (default: first authorized device)
    #[arg(long)]
    serial: Option<String>,

    /// Path to the adb executable (default: resolve from PATH)
    #[arg(long)]
    adb: Option<PathBuf>,

    /// Seconds to wait before capturing, to switch windows
    #[arg(long, default_value_t = 0.0)]
    delay: f64,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create output directories: {}", e);
        std::process::exit(1);
    }
    config::init_config();

    match run(&args) {
        Ok(saved) => {
            println!("Screenshot saved:");
            for path in saved {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Capture failed:");
            for cause in e.chain() {
                eprintln!("- {}", cause);
            }
            std::process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Vec<PathBuf>> {
    if args.delay > 0.0 {
        std::thread::sleep(Duration::from_secs_f64(args.delay));
    }

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(paths::get_screenshots_dir);
    capture::ensure_dir(&output_dir)?;

    let format = ImageFormat::from(args.format);
    let quality = args.quality.clamp(1, 100);

    if args.device {
        let adb = device::resolve_adb(args.adb.as_deref())?;
        let frame = device::capture_device(&adb, args.serial.as_deref())?;
        return save_one(&frame, &output_dir, format, quality, None);
    }

    if let Some(index) = args.monitor {
        let frame = screen::capture_monitor(index)?;
        return save_one(&frame, &output_dir, format, quality, Some(index));
    }

    if args.all {
        let frames = screen::capture_all()?;
        let mut saved = Vec::with_capacity(frames.len());
        for (i, frame) in frames.iter().enumerate() {
            saved.extend(save_one(frame, &output_dir, format, quality, Some(i + 1))?);
        }
        return Ok(saved);
    }

    // Window capture, either the explicit title or the configured default.
    let title = args
        .window
        .clone()
        .unwrap_or_else(|| config::get_config().window_title.clone());
    log(&format!("Capturing window with title containing {:?}", title));
    let win = window::find_window(&title)?;
    let frame = window::capture_window(&win)
        .with_context(|| format!("Failed to capture window {:?}", title))?;
    save_one(&frame, &output_dir, format, quality, None)
}

fn save_one(
    frame: &Frame,
    dir: &PathBuf,
    format: ImageFormat,
    quality: u8,
    monitor_index: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let path = capture::output_path(dir, format, monitor_index);
    capture::save_image(frame, &path, format, quality)?;
    log(&format!("Saved {}", path.display()));
    Ok(vec![path])
}
