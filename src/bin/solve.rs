//! Board extraction CLI.
//!
//! Takes the newest screenshot (or an explicit input), finds the board
//! rectangle automatically or from a manual override, and writes the crop as
//! `board_*.png`. With `--recognize`, the crop is also rectified, tiled 9x9,
//! and run through digit OCR.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;

use sudoku_snap::board::{self, rect::ManualRect};
use sudoku_snap::{capture, config, log, ocr, paths};

#[derive(Parser, Debug)]
#[command(name = "sudoku-solve", version, about = "Crop the puzzle board out of a screenshot and optionally recognize the 9x9 grid")]
struct Args {
    /// Input screenshot (default: newest screen_* file in the output directory)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Directory holding screenshots and receiving the board crop
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Manual board rectangle x,y,w,h, used when auto-detection fails
    #[arg(long)]
    board: Option<String>,

    /// Run digit recognition on the cropped board and print the grid
    #[arg(long)]
    recognize: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = paths::ensure_directories() {
        eprintln!("Failed to create output directories: {}", e);
        std::process::exit(1);
    }
    config::init_config();

    if let Err(e) = run(&args) {
        eprintln!("Board extraction failed:");
        for cause in e.chain() {
            eprintln!("- {}", cause);
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(paths::get_screenshots_dir);
    capture::ensure_dir(&output_dir)?;

    let input = match &args.input {
        Some(path) => path.clone(),
        None => capture::latest_screenshot(&output_dir)?.ok_or_else(|| {
            anyhow!(
                "No screenshots found (screen_*.png/jpg) in {}. Run sudoku-capture first.",
                output_dir.display()
            )
        })?,
    };
    log(&format!("Input screenshot: {}", input.display()));

    let img = image::open(&input)
        .with_context(|| format!("Failed to read image {}", input.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    let snap = config::get_config();
    let rect = match &args.board {
        Some(raw) => {
            // Unparseable input is a hard error; out-of-range values clamp.
            let manual: ManualRect = raw.parse()?;
            manual.clamped(width, height)
        }
        None => board::detect(&img, &snap.detection).ok_or_else(|| {
            anyhow!("Automatic board detection failed. Pass --board x,y,w,h to crop manually.")
        })?,
    };
    log(&format!("Board rectangle: {}", rect));

    let crop = board::crop(&img, &rect);
    let out_path = output_dir.join(board::board_file_name(&input));
    crop.save(&out_path)
        .with_context(|| format!("Failed to save board crop {}", out_path.display()))?;

    println!("Board crop saved:");
    println!("{}", out_path.display());

    if args.recognize {
        ocr::ensure_tesseract()?;
        let grid = ocr::recognize_grid(&crop, &snap.detection, &snap.ocr)?;
        println!("Recognized grid:");
        println!("{}", grid);
    }

    Ok(())
}
