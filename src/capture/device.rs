//! Device-bridge capture: pulls a screenshot straight from a connected
//! Android device over adb (`exec-out screencap -p`).

use anyhow::{anyhow, bail, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use super::Frame;

/// Timeout for `adb devices`; enumeration should be quick.
const DEVICES_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for pulling the screenshot bytes off the device.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolves the adb executable: an explicitly given path must exist, otherwise
/// probe for `adb` on the PATH.
pub fn resolve_adb(user_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = user_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        bail!("adb not found at given path: {}", path.display());
    }

    let mut probe = Command::new("adb");
    probe.arg("version");
    match run_with_timeout(probe, DEVICES_TIMEOUT) {
        Ok(output) if output.status.success() => Ok(PathBuf::from("adb")),
        _ => Err(anyhow!(
            "adb not found. Install Android platform tools or pass --adb <path>"
        )),
    }
}

/// Lists serials of connected, authorized devices.
pub fn list_devices(adb: &Path) -> Result<Vec<String>> {
    let mut cmd = Command::new(adb);
    cmd.arg("devices");
    let output = run_with_timeout(cmd, DEVICES_TIMEOUT).context("adb devices failed")?;
    if !output.status.success() {
        bail!(
            "adb devices exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `adb devices` output. Only lines ending in the `device` state count;
/// `offline` and `unauthorized` devices are skipped.
fn parse_devices(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| {
            let (serial, state) = line.split_once('\t')?;
            (state.trim() == "device").then(|| serial.trim().to_string())
        })
        .collect()
}

/// Captures a screenshot from the device with the given serial, or from the
/// first authorized device when no serial is given.
pub fn capture_device(adb: &Path, serial: Option<&str>) -> Result<Frame> {
    let serial = match serial {
        Some(s) => s.to_string(),
        None => {
            let devices = list_devices(adb)?;
            devices.into_iter().next().ok_or_else(|| {
                anyhow!(
                    "No authorized device found. Connect one, allow USB debugging, or pass --serial"
                )
            })?
        }
    };

    crate::log(&format!("Capturing from device {}", serial));

    let mut cmd = Command::new(adb);
    cmd.args(["-s", &serial, "exec-out", "screencap", "-p"]);
    let output = run_with_timeout(cmd, CAPTURE_TIMEOUT).context("adb screencap failed")?;
    if !output.status.success() || output.stdout.is_empty() {
        bail!(
            "Device screenshot failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let img = image::load_from_memory(&output.stdout)
        .context("Failed to decode screencap PNG data")?;
    Ok(img.to_rgba8())
}

/// Runs a command with a hard deadline. Output pipes are drained on separate
/// threads so a large screenshot can't fill the pipe and stall the child;
/// the child is killed if the deadline passes.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().context("Failed to spawn command")?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("child stdout not piped"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("child stderr not piped"))?;
    let stdout_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf);
        buf
    });
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf);
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            bail!("Command timed out after {:?}", timeout);
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let stdout = stdout_reader.join().unwrap_or_default();
    let stderr = stderr_reader.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices_filters_states() {
        let out = "List of devices attached\n\
                   ABC123\tdevice\n\
                   XYZ789\toffline\n\
                   QRS456\tunauthorized\n\
                   DEF000\tdevice\n\n";
        assert_eq!(parse_devices(out), vec!["ABC123", "DEF000"]);
    }

    #[test]
    fn test_parse_devices_empty() {
        assert_eq!(parse_devices("List of devices attached\n\n"), Vec::<String>::new());
    }

    #[test]
    fn test_resolve_adb_missing_explicit_path() {
        let result = resolve_adb(Some(Path::new("/nonexistent/adb-binary")));
        assert!(result.is_err());
    }

    #[test]
    #[cfg(unix)]
    fn test_run_with_timeout_kills_hung_command() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let start = Instant::now();
        let result = run_with_timeout(cmd, Duration::from_millis(300));
        assert!(result.is_err());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_with_timeout_collects_output() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let output = run_with_timeout(cmd, Duration::from_secs(5)).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }
}
