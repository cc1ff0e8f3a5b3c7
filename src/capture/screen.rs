//! Monitor capture via the cross-platform xcap backend.

use anyhow::{anyhow, bail, Context, Result};
use xcap::Monitor;

use super::Frame;

/// Captures the primary monitor, or the first enumerated one when no monitor
/// reports itself as primary.
pub fn capture_primary() -> Result<Frame> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;
    if monitors.is_empty() {
        bail!("No monitors detected");
    }
    let monitor = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(&monitors[0]);
    grab(monitor)
}

/// Captures a single monitor by 1-based index (1 = first enumerated monitor).
pub fn capture_monitor(index: usize) -> Result<Frame> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;
    if index < 1 || index > monitors.len() {
        bail!(
            "Monitor index out of range: valid range is 1..{}",
            monitors.len()
        );
    }
    grab(&monitors[index - 1])
}

/// Captures every monitor, one frame each, in enumeration order.
pub fn capture_all() -> Result<Vec<Frame>> {
    let monitors = Monitor::all().context("Failed to enumerate monitors")?;
    if monitors.is_empty() {
        bail!("No monitors detected");
    }
    monitors.iter().map(grab).collect()
}

fn grab(monitor: &Monitor) -> Result<Frame> {
    let frame = monitor
        .capture_image()
        .map_err(|e| anyhow!("Monitor capture failed: {}", e))?;
    if frame.width() == 0 || frame.height() == 0 {
        bail!("Captured an empty frame, possible permission issue or no display");
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "requires a graphical session and screen recording permission"]
    fn test_capture_primary_dimensions() {
        let frame = capture_primary().expect("capture failed");
        assert!(frame.width() > 0 && frame.height() > 0);
    }
}
