//! Background reader for FFmpeg's stderr stream.
//!
//! FFmpeg writes everything of interest to stderr: startup banners, device
//! errors and the rolling `frame= ... time= ... bitrate=` progress line. The
//! reader buffers the full text for failure classification and logs progress
//! at a throttled interval so a long recording does not flood the log.

use std::io::{BufRead, BufReader};
use std::process::ChildStderr;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::constants::PROGRESS_LOG_INTERVAL_SECS;

/// Shared buffer the reader thread appends to. Single writer (the reader
/// thread), single reader (the supervisor, after exit).
pub type DiagnosticBuffer = Arc<Mutex<String>>;

pub struct StderrMonitor;

impl StderrMonitor {
    /// Spawns the reader thread for one FFmpeg process. The thread runs
    /// until the stream reaches EOF, i.e. until the process exits.
    pub fn spawn(stderr: ChildStderr) -> (DiagnosticBuffer, JoinHandle<()>) {
        let buffer: DiagnosticBuffer = Arc::new(Mutex::new(String::new()));
        let writer = Arc::clone(&buffer);

        let handle = std::thread::spawn(move || {
            let reader = BufReader::new(stderr);
            let mut last_log = Instant::now();
            let mut first_log = true;

            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(_) => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                if let Ok(mut buf) = writer.lock() {
                    buf.push_str(&line);
                    buf.push('\n');
                }

                if is_progress_line(&line) {
                    let throttle = Duration::from_secs(PROGRESS_LOG_INTERVAL_SECS);
                    if first_log || last_log.elapsed() >= throttle {
                        let time = extract_value(&line, "time=");
                        let bitrate = extract_value(&line, "bitrate=");
                        let fps = extract_value(&line, "fps=");

                        let mut msg = format!(
                            "REC | Time: {} | Bitrate: {}",
                            time.unwrap_or_else(|| "??".to_string()),
                            bitrate.unwrap_or_else(|| "N/A".to_string())
                        );
                        if let Some(fps) = fps {
                            msg.push_str(&format!(" | FPS: {}", fps));
                        }

                        log::info!("{}", msg);
                        last_log = Instant::now();
                        first_log = false;
                    }
                } else {
                    log::debug!("FFmpeg: {}", line.trim());
                }
            }
        });

        (buffer, handle)
    }
}

// Progress lines carry "time=" and "bitrate=" whether or not video frames
// are involved; banner and error lines carry neither.
fn is_progress_line(line: &str) -> bool {
    line.contains("time=") && line.contains("bitrate=")
}

fn extract_value(line: &str, key: &str) -> Option<String> {
    let start = line.find(key)? + key.len();
    let after_key = &line[start..];
    let value_start = after_key.find(|c: char| !c.is_whitespace()).unwrap_or(0);
    let value_part = &after_key[value_start..];

    let end = value_part
        .find(|c: char| c.is_whitespace())
        .unwrap_or(value_part.len());
    if end == 0 {
        return None;
    }
    Some(value_part[..end].to_string())
}
