//! FFmpeg Process Supervisor
//!
//! Owns exactly one FFmpeg child process. It handles:
//! 1. Spawning with piped stdio and a background stderr reader.
//! 2. Early-exit detection during a fixed grace window after launch,
//!    with failure classification from the captured diagnostics.
//! 3. Graceful shutdown (`q` on stdin) with bounded kill escalation.

use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::constants::{
    DIAG_IO_ERROR, DIAG_OPEN_INPUT, KILL_WAIT_MS, LAUNCH_GRACE_MS, LAUNCH_POLL_MS,
};
use crate::error::{RecorderError, Result};
use crate::ffmpeg::monitor::{DiagnosticBuffer, StderrMonitor};

#[derive(Debug)]
pub struct FfmpegProcess {
    child: Child,
    diagnostics: DiagnosticBuffer,
    reader: Option<JoinHandle<()>>,
    // Kill-on-close job object; closing it (on drop) takes the child down
    // even when this process dies without running destructors.
    #[cfg(windows)]
    job: Option<crate::job_object::JobObject>,
}

impl FfmpegProcess {
    pub fn launch(ffmpeg_path: &Path, args: &[String]) -> Result<Self> {
        Self::launch_with_grace(ffmpeg_path, args, Duration::from_millis(LAUNCH_GRACE_MS))
    }

    /// Spawns FFmpeg and watches it for `grace` before declaring the launch
    /// healthy. Capture devices that cannot be opened make FFmpeg exit
    /// within moments of spawning, so an early exit inside the window is
    /// classified from the diagnostic output instead of surfacing later as
    /// a mysteriously empty recording.
    pub fn launch_with_grace(ffmpeg_path: &Path, args: &[String], grace: Duration) -> Result<Self> {
        if !ffmpeg_path.exists() {
            return Err(RecorderError::EncoderMissing(ffmpeg_path.to_path_buf()));
        }

        info!("Spawning FFmpeg with args: {:?}", args);

        let mut command = Command::new(ffmpeg_path);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(crate::constants::CREATE_NO_WINDOW);
        }

        let mut child = command.spawn().map_err(|e| {
            RecorderError::LaunchFailed(format!(
                "failed to spawn {}: {}",
                ffmpeg_path.display(),
                e
            ))
        })?;

        let stderr = match child.stderr.take() {
            Some(stderr) => stderr,
            None => {
                let _ = child.kill();
                return Err(RecorderError::LaunchFailed(
                    "stderr pipe unavailable".to_string(),
                ));
            }
        };
        let (diagnostics, reader) = StderrMonitor::spawn(stderr);

        #[cfg(windows)]
        let job = match crate::job_object::JobObject::new() {
            Ok(job) => {
                if let Err(e) = job.add_process(&child) {
                    warn!("Failed to assign FFmpeg to job object: {}", e);
                }
                Some(job)
            }
            Err(e) => {
                warn!("Failed to create job object: {}", e);
                None
            }
        };

        let mut process = Self {
            child,
            diagnostics,
            reader: Some(reader),
            #[cfg(windows)]
            job,
        };

        let deadline = Instant::now() + grace;
        loop {
            match process.child.try_wait() {
                Ok(Some(status)) => {
                    process.join_reader();
                    let diagnostics = process.diagnostics_text();
                    return Err(classify_early_exit(status.code(), diagnostics));
                }
                Ok(None) => {}
                Err(e) => return Err(RecorderError::Io(e)),
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(LAUNCH_POLL_MS));
        }

        info!("FFmpeg running (pid {})", process.child.id());
        Ok(process)
    }

    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Everything FFmpeg has written to stderr so far.
    pub fn diagnostics_text(&self) -> String {
        self.diagnostics
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default()
    }

    /// Asks FFmpeg to finalize the output container and exit, escalating to
    /// a kill when it does not comply within `timeout`. Returns whether the
    /// process ended on its own.
    pub fn request_graceful_stop(mut self, timeout: Duration) -> bool {
        if let Some(mut stdin) = self.child.stdin.take() {
            info!("Sending 'q' to FFmpeg...");
            if let Err(e) = stdin.write_all(b"q\n").and_then(|_| stdin.flush()) {
                warn!("Failed to send stop command: {}", e);
            }
            // Dropping the handle closes the pipe; EOF doubles as a stop
            // signal for FFmpeg builds that ignore interactive input.
        }

        let graceful = self.wait_with_deadline(timeout);
        if graceful {
            info!("FFmpeg exited cleanly");
        } else {
            warn!("FFmpeg did not exit within {:?}, killing", timeout);
            if let Err(e) = self.child.kill() {
                warn!("Failed to kill FFmpeg: {}", e);
            }
            if !self.wait_with_deadline(Duration::from_millis(KILL_WAIT_MS)) {
                warn!("FFmpeg still alive after kill; abandoning process");
            }
        }

        self.join_reader();
        graceful
    }

    fn wait_with_deadline(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(_) => return false,
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(LAUNCH_POLL_MS));
        }
    }

    fn join_reader(&mut self) {
        if let Some(handle) = self.reader.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for FfmpegProcess {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            warn!("FFmpeg process dropped while running; killing");
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
        self.join_reader();
    }
}

fn classify_early_exit(exit_code: Option<i32>, diagnostics: String) -> RecorderError {
    if diagnostics.contains(DIAG_OPEN_INPUT) || diagnostics.contains(DIAG_IO_ERROR) {
        RecorderError::DeviceBusyOrIo(diagnostics)
    } else {
        let code = exit_code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        RecorderError::LaunchFailed(format!(
            "FFmpeg exited with code {} during startup:\n{}",
            code, diagnostics
        ))
    }
}
