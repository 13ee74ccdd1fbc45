//! Segment Tracking & Finalization
//!
//! Every pause/resume cycle produces one more segment file in the session's
//! working directory. On stop the segments are merged into the requested
//! output: a single segment is renamed into place, multiple segments go
//! through FFmpeg's concat demuxer with stream copy so nothing is
//! re-encoded.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{info, warn};

use crate::constants::{CONCAT_MANIFEST, SEGMENT_EXTENSION, SEGMENT_PREFIX, SESSION_DIR_PREFIX};
use crate::error::{RecorderError, Result};
use crate::ffmpeg::utils::{escape_concat_path, file_is_empty};

pub struct SegmentManager {
    work_dir: PathBuf,
    segments: Vec<PathBuf>,
}

impl SegmentManager {
    /// Creates a fresh session-scoped working directory under `base`.
    pub fn create(base: &Path) -> Result<Self> {
        let work_dir = base.join(format!("{}{}", SESSION_DIR_PREFIX, uuid::Uuid::new_v4()));
        fs::create_dir_all(&work_dir)?;
        info!("Session work dir: {:?}", work_dir);

        Ok(Self {
            work_dir,
            segments: Vec::new(),
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn segments(&self) -> &[PathBuf] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Allocates the next segment path and tracks it. FFmpeg creates the
    /// file itself once the encoder for the segment starts.
    pub fn begin_segment(&mut self) -> PathBuf {
        let path = self.work_dir.join(format!(
            "{}{}.{}",
            SEGMENT_PREFIX,
            self.segments.len(),
            SEGMENT_EXTENSION
        ));
        self.segments.push(path.clone());
        path
    }

    /// Drops the most recently allocated segment from the list. Used when
    /// the encoder for that segment never came up.
    pub fn discard_last(&mut self) -> Option<PathBuf> {
        self.segments.pop()
    }

    /// Merges the recorded segments into `output_path`. The working
    /// directory is removed afterwards no matter how the merge went.
    pub fn finalize(&mut self, ffmpeg_path: &Path, output_path: &Path) -> Result<PathBuf> {
        let result = self.finalize_inner(ffmpeg_path, output_path);
        self.cleanup();
        result
    }

    fn finalize_inner(&mut self, ffmpeg_path: &Path, output_path: &Path) -> Result<PathBuf> {
        if self.segments.is_empty() {
            return Err(RecorderError::NothingRecorded);
        }

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if self.segments.len() == 1 {
            let segment = &self.segments[0];
            if !segment.exists() {
                warn!("Sole segment missing on disk: {:?}", segment);
                return Err(RecorderError::NothingRecorded);
            }
            move_into_place(segment, output_path)?;
        } else {
            info!(
                "Merging {} segments into {:?}",
                self.segments.len(),
                output_path
            );
            let manifest = self.write_manifest()?;
            run_concat(ffmpeg_path, &manifest, output_path)?;
        }

        // Stopping before the first frame was written leaves a zero-byte
        // container behind.
        if file_is_empty(output_path) {
            warn!("Output file {:?} is empty; discarding", output_path);
            let _ = fs::remove_file(output_path);
            return Err(RecorderError::NothingRecorded);
        }

        info!("Recording saved: {:?}", output_path);
        Ok(output_path.to_path_buf())
    }

    /// Writes the concat demuxer manifest. Segments that have vanished from
    /// disk are skipped so one damaged segment does not lose the session.
    fn write_manifest(&self) -> Result<PathBuf> {
        let manifest_path = self.work_dir.join(CONCAT_MANIFEST);
        let mut content = String::new();

        for segment in &self.segments {
            if !segment.exists() {
                warn!("Segment missing on disk, skipping: {:?}", segment);
                continue;
            }
            content.push_str(&format!("file '{}'\n", escape_concat_path(segment)));
        }

        if content.is_empty() {
            return Err(RecorderError::NothingRecorded);
        }

        fs::write(&manifest_path, &content)?;
        Ok(manifest_path)
    }

    /// Best-effort removal of the working directory.
    pub fn cleanup(&self) {
        if self.work_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&self.work_dir) {
                warn!("Failed to remove work dir {:?}: {}", self.work_dir, e);
            }
        }
    }
}

fn move_into_place(segment: &Path, output_path: &Path) -> Result<()> {
    if output_path.exists() {
        fs::remove_file(output_path)?;
    }
    match fs::rename(segment, output_path) {
        Ok(()) => Ok(()),
        // The temp directory and the destination may sit on different
        // volumes, where a rename cannot work.
        Err(_) => {
            fs::copy(segment, output_path)?;
            let _ = fs::remove_file(segment);
            Ok(())
        }
    }
}

fn run_concat(ffmpeg_path: &Path, manifest: &Path, output_path: &Path) -> Result<()> {
    let mut command = Command::new(ffmpeg_path);
    command
        .arg("-f")
        .arg("concat")
        .arg("-safe")
        .arg("0")
        .arg("-i")
        .arg(manifest)
        .arg("-c")
        .arg("copy")
        .arg("-y")
        .arg(output_path)
        .stdin(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(crate::constants::CREATE_NO_WINDOW);
    }

    let output = command
        .output()
        .map_err(|e| RecorderError::SegmentMergeFailed(format!("failed to run FFmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecorderError::SegmentMergeFailed(stderr.to_string()));
    }

    Ok(())
}
