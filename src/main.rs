//! One-shot pipeline driver.
//!
//! Runs the full flow as two child processes, waited on synchronously:
//! `sudoku-capture` grabs the puzzle window, then `sudoku-solve --recognize`
//! crops the board and prints the recognized grid.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::Command;

use sudoku_snap::paths;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Jpg,
    Jpeg,
}

impl FormatArg {
    fn as_str(&self) -> &'static str {
        match self {
            FormatArg::Png => "png",
            FormatArg::Jpg => "jpg",
            FormatArg::Jpeg => "jpeg",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sudoku-snap", version, about = "Capture the puzzle window, crop the board, and recognize the grid in one go")]
struct Args {
    /// Directory for screenshots and board crops
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Seconds to wait before capturing, to switch windows
    #[arg(long, default_value_t = 0.0)]
    delay: f64,

    /// Screenshot format
    #[arg(long, short, value_enum, default_value_t = FormatArg::Png)]
    format: FormatArg,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
}

fn main() {
    let args = Args::parse();

    println!("==================================================");
    println!("Running the capture / crop / recognize pipeline...");
    println!("==================================================");

    if let Err(e) = run(&args) {
        eprintln!("Pipeline failed:");
        for cause in e.chain() {
            eprintln!("- {}", cause);
        }
        std::process::exit(1);
    }

    println!("==================================================");
    println!("Pipeline complete.");
    println!("==================================================");
}

fn run(args: &Args) -> Result<()> {
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(paths::get_screenshots_dir);

    println!("\n[step 1/2] Capturing the puzzle window...");
    let mut capture = Command::new(sibling_binary("sudoku-capture")?);
    capture
        .arg("--output")
        .arg(&output_dir)
        .arg("--format")
        .arg(args.format.as_str())
        .arg("--quality")
        .arg(args.quality.to_string());
    if args.delay > 0.0 {
        capture.arg("--delay").arg(args.delay.to_string());
    }
    run_step(capture, "sudoku-capture")?;

    println!("\n[step 2/2] Cropping the board and recognizing the grid...");
    let mut solve = Command::new(sibling_binary("sudoku-solve")?);
    solve.arg("--output").arg(&output_dir).arg("--recognize");
    run_step(solve, "sudoku-solve")?;

    Ok(())
}

/// Resolves a pipeline binary installed next to this executable, falling back
/// to PATH lookup for `cargo run`-style layouts.
fn sibling_binary(name: &str) -> Result<PathBuf> {
    let file = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
    let candidate = paths::get_exe_dir().join(&file);
    if candidate.exists() {
        Ok(candidate)
    } else {
        Ok(PathBuf::from(file))
    }
}

/// Runs a child process to completion, forwarding its output, and fails when
/// the child exits nonzero.
fn run_step(mut cmd: Command, name: &str) -> Result<()> {
    let output = cmd
        .output()
        .with_context(|| format!("Failed to launch {}", name))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        print!("{}", stdout);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        eprint!("{}", stderr);
    }

    if !output.status.success() {
        bail!(
            "{} exited with {}",
            name,
            output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string())
        );
    }
    Ok(())
}
