//! Sudoku Snap
//!
//! Captures a screenshot of the puzzle window, crops the square board
//! region out of it, and recognizes the 9x9 digit grid via Tesseract.

pub mod board;
pub mod capture;
pub mod config;
pub mod ocr;
pub mod paths;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("sudoku_snap.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
