//! Window discovery and capture.
//!
//! Windows are matched by case-insensitive title substring, the same contract
//! the capture CLI exposes. Direct window capture is preferred since it works
//! for occluded windows; when the backend refuses, the window's rectangle is
//! cropped out of a grab of the monitor underneath it.

use anyhow::{anyhow, bail, Context, Result};
use xcap::{Monitor, Window};

use super::Frame;

/// Finds the first visible, non-minimized window whose title contains the
/// given string (case-insensitive).
pub fn find_window(title: &str) -> Result<Window> {
    let needle = title.to_lowercase();
    let windows = Window::all().context("Failed to enumerate windows")?;

    for window in windows {
        if window.is_minimized().unwrap_or(true) {
            continue;
        }
        let Ok(window_title) = window.title() else {
            continue;
        };
        // Untitled windows are usually not application main windows
        if window_title.is_empty() {
            continue;
        }
        if window_title.to_lowercase().contains(&needle) {
            crate::log(&format!("Found window: \"{}\"", window_title));
            return Ok(window);
        }
    }

    Err(anyhow!(
        "Could not find a visible window with title containing {:?}. Is the app running?",
        title
    ))
}

/// Captures a window's content, falling back to a monitor-region crop when the
/// direct capture path fails.
pub fn capture_window(window: &Window) -> Result<Frame> {
    match window.capture_image() {
        Ok(frame) if frame.width() > 0 && frame.height() > 0 => Ok(frame),
        Ok(_) => {
            crate::log("Window capture returned an empty frame, trying monitor crop");
            capture_window_region(window).context("Window capture returned an empty frame")
        }
        Err(e) => {
            crate::log(&format!(
                "Window capture failed ({}), trying monitor crop",
                e
            ));
            capture_window_region(window)
                .with_context(|| format!("Direct window capture failed: {}", e))
        }
    }
}

/// Grabs the monitor under the window's origin and crops the window rectangle
/// out of it. Only sees what is actually on screen, so the window should be
/// unobstructed for this path.
fn capture_window_region(window: &Window) -> Result<Frame> {
    let win_x = window.x().map_err(|e| anyhow!("window position: {}", e))?;
    let win_y = window.y().map_err(|e| anyhow!("window position: {}", e))?;
    let win_w = window.width().map_err(|e| anyhow!("window size: {}", e))?;
    let win_h = window.height().map_err(|e| anyhow!("window size: {}", e))?;

    let monitor = Monitor::from_point(win_x, win_y)
        .map_err(|e| anyhow!("No monitor under window origin: {}", e))?;
    let shot = monitor
        .capture_image()
        .map_err(|e| anyhow!("Monitor capture failed: {}", e))?;

    let mon_x = monitor.x().map_err(|e| anyhow!("monitor position: {}", e))?;
    let mon_y = monitor.y().map_err(|e| anyhow!("monitor position: {}", e))?;

    // Window coordinates are global; shift into the monitor's frame and clamp.
    let x = (win_x - mon_x).max(0) as u32;
    let y = (win_y - mon_y).max(0) as u32;
    if x >= shot.width() || y >= shot.height() {
        bail!("Window rectangle lies outside the captured monitor");
    }
    let width = win_w.min(shot.width() - x);
    let height = win_h.min(shot.height() - y);
    if width == 0 || height == 0 {
        bail!("Window rectangle has no visible area on the captured monitor");
    }

    Ok(image::imageops::crop_imm(&shot, x, y, width, height).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires a graphical session with at least one titled window"]
    fn test_find_window_missing_title_errors() {
        let result = find_window("window-title-that-does-not-exist-anywhere");
        assert!(result.is_err());
    }
}
