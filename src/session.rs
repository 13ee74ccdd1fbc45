//! Recording Session Orchestrator
//!
//! This module ties the FFmpeg layers together into the start/pause/resume/
//! stop surface the GUI layer drives. It handles:
//! 1. The Idle -> Recording -> Paused state machine and its legality rules.
//! 2. Snapshotting the capture source so pause/resume keeps recording the
//!    same thing even if the GUI mutates its source list.
//! 3. Launching one encoder per segment via [crate::ffmpeg::process] and
//!    merging the segments on stop via [crate::ffmpeg::segments].
//! 4. State-change notifications for the GUI layer.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::RecordingSettings;
use crate::constants::{
    FFMPEG_BINARY, LAUNCH_GRACE_MS, PAUSE_TIMEOUT_MS, SESSION_DIR_PREFIX, SESSION_METADATA,
    STOP_TIMEOUT_MS,
};
use crate::error::{RecorderError, Result};
use crate::ffmpeg::commands::FfmpegCommandBuilder;
use crate::ffmpeg::process::FfmpegProcess;
use crate::ffmpeg::segments::SegmentManager;
use crate::source::{CaptureProbe, CaptureSource, NullProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
}

/// How a stopped session ended up.
#[derive(Debug, Clone)]
pub enum FinalizeOutcome {
    Saved { path: PathBuf, duration: Duration },
    /// Nothing usable was recorded; no output file exists.
    Empty,
    Failed { error: String },
}

/// Notification sent to the GUI layer on every observable transition.
/// `finalize` is populated only for the transition back to `Idle`.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub state: RecorderState,
    pub finalize: Option<FinalizeOutcome>,
}

#[derive(Debug, Clone)]
pub struct RecorderOptions {
    /// Location of the FFmpeg binary. Defaults to the application directory.
    pub ffmpeg_path: PathBuf,
    /// Parent directory for session-scoped working directories.
    pub temp_base: PathBuf,
    /// How long a freshly launched encoder is watched for an early exit.
    pub launch_grace: Duration,
}

impl Default for RecorderOptions {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            temp_base: std::env::temp_dir().join("deskrec"),
            launch_grace: Duration::from_millis(LAUNCH_GRACE_MS),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(FFMPEG_BINARY)))
        .unwrap_or_else(|| PathBuf::from(FFMPEG_BINARY))
}

#[derive(serde::Serialize)]
struct SessionMetadata {
    session_id: String,
    started_at: String,
    segments: Vec<String>,
}

struct Session {
    settings: RecordingSettings,
    options: RecorderOptions,
    probe: Box<dyn CaptureProbe + Send>,
    state: RecorderState,
    active_source: Option<CaptureSource>,
    segments: Option<SegmentManager>,
    encoder: Option<FfmpegProcess>,
    output_path: Option<PathBuf>,
    last_recording_path: Option<PathBuf>,
    started_at: Option<chrono::DateTime<chrono::Local>>,
    recorded: Duration,
    segment_started: Option<Instant>,
}

impl Session {
    fn start(&mut self, output_path: &Path, source: &CaptureSource) -> Result<()> {
        match self.state {
            RecorderState::Recording => return Err(RecorderError::AlreadyRecording),
            RecorderState::Paused => {
                // One public entry point: starting a paused session resumes
                // it, and the passed arguments are ignored in favor of the
                // session-remembered ones.
                debug!("start() while paused; resuming the active session");
                return self.resume();
            }
            RecorderState::Idle => {}
        }

        if !self.options.ffmpeg_path.exists() {
            return Err(RecorderError::EncoderMissing(self.options.ffmpeg_path.clone()));
        }

        info!("Starting recording of {} into {:?}", source, output_path);

        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut segments = SegmentManager::create(&self.options.temp_base)?;
        let segment_path = segments.begin_segment();

        match self.launch_segment(&segment_path, source) {
            Ok(process) => {
                self.active_source = Some(source.clone());
                self.encoder = Some(process);
                self.output_path = Some(output_path.to_path_buf());
                self.started_at = Some(chrono::Local::now());
                self.recorded = Duration::ZERO;
                self.segment_started = Some(Instant::now());
                self.segments = Some(segments);
                self.write_metadata();
                self.state = RecorderState::Recording;
                Ok(())
            }
            Err(e) => {
                // A failed start leaves no trace behind.
                segments.cleanup();
                Err(e)
            }
        }
    }

    /// Seals the current segment and parks the session. Silently ignored
    /// unless a recording is running; returns whether a transition happened.
    fn pause(&mut self) -> bool {
        if self.state != RecorderState::Recording {
            debug!("pause() ignored in state {:?}", self.state);
            return false;
        }

        info!("Pausing recording...");
        if let Some(encoder) = self.encoder.take() {
            encoder.request_graceful_stop(Duration::from_millis(PAUSE_TIMEOUT_MS));
        }
        if let Some(started) = self.segment_started.take() {
            self.recorded += started.elapsed();
        }

        self.state = RecorderState::Paused;
        true
    }

    fn resume(&mut self) -> Result<()> {
        if self.state != RecorderState::Paused {
            debug!("resume() ignored in state {:?}", self.state);
            return Ok(());
        }

        // Both are always set when the session reached Paused through
        // pause(); the checks guard against state corruption only.
        let source = match self.active_source.clone() {
            Some(source) => source,
            None => return Err(RecorderError::NoActiveSource),
        };
        let segment_path = match self.segments.as_mut() {
            Some(segments) => segments.begin_segment(),
            None => return Err(RecorderError::NoActiveSource),
        };

        info!("Resuming recording of {}", source);

        match self.launch_segment(&segment_path, &source) {
            Ok(process) => {
                self.encoder = Some(process);
                self.segment_started = Some(Instant::now());
                self.state = RecorderState::Recording;
                self.write_metadata();
                Ok(())
            }
            Err(e) => {
                if let Some(segments) = self.segments.as_mut() {
                    segments.discard_last();
                }
                Err(e)
            }
        }
    }

    /// Stops any running encoder and finalizes the session. The session
    /// always ends up Idle, even when the merge fails. Returns `None` when
    /// there was nothing to stop.
    fn stop(&mut self) -> Option<FinalizeOutcome> {
        if self.state == RecorderState::Idle {
            debug!("stop() ignored while idle");
            return None;
        }

        info!("Stopping recording...");
        if let Some(encoder) = self.encoder.take() {
            encoder.request_graceful_stop(Duration::from_millis(STOP_TIMEOUT_MS));
        }
        if let Some(started) = self.segment_started.take() {
            self.recorded += started.elapsed();
        }

        let outcome = self.finalize();

        self.state = RecorderState::Idle;
        self.active_source = None;
        self.output_path = None;
        self.started_at = None;

        Some(outcome)
    }

    fn finalize(&mut self) -> FinalizeOutcome {
        let mut segments = match self.segments.take() {
            Some(segments) => segments,
            None => return FinalizeOutcome::Empty,
        };
        let output_path = match self.output_path.clone() {
            Some(path) => path,
            None => {
                segments.cleanup();
                return FinalizeOutcome::Empty;
            }
        };

        match segments.finalize(&self.options.ffmpeg_path, &output_path) {
            Ok(path) => {
                self.last_recording_path = Some(path.clone());
                FinalizeOutcome::Saved {
                    path,
                    duration: self.recorded,
                }
            }
            Err(RecorderError::NothingRecorded) => FinalizeOutcome::Empty,
            Err(e) => FinalizeOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    fn launch_segment(&self, segment_path: &Path, source: &CaptureSource) -> Result<FfmpegProcess> {
        let builder =
            FfmpegCommandBuilder::from_settings(&self.settings, segment_path.to_string_lossy());
        let args = builder.build(source, self.probe.as_ref())?;
        FfmpegProcess::launch_with_grace(
            &self.options.ffmpeg_path,
            &args,
            self.options.launch_grace,
        )
    }

    /// Best-effort session manifest inside the work dir, for post-mortem
    /// inspection of crashed sessions.
    fn write_metadata(&self) {
        let (segments, started_at) = match (&self.segments, &self.started_at) {
            (Some(segments), Some(started_at)) => (segments, started_at),
            _ => return,
        };

        let metadata = SessionMetadata {
            session_id: segments
                .work_dir()
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            started_at: started_at.to_rfc3339(),
            segments: segments
                .segments()
                .iter()
                .map(|path| path.to_string_lossy().to_string())
                .collect(),
        };

        match serde_json::to_string_pretty(&metadata) {
            Ok(json) => {
                let path = segments.work_dir().join(SESSION_METADATA);
                if let Err(e) = std::fs::write(&path, json) {
                    warn!("Failed to write session metadata: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize session metadata: {}", e),
        }
    }
}

/// The public handle the GUI layer talks to. All operations serialize on an
/// internal lock and block until the transition is complete, so callers are
/// expected to dispatch them from a worker thread the way a GUI command
/// layer does anyway. Transitions are reported on the channel returned at
/// construction.
pub struct Recorder {
    session: Mutex<Session>,
    events: Sender<StateChange>,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> (Self, Receiver<StateChange>) {
        Self::with_options(settings, RecorderOptions::default(), Box::new(NullProbe))
    }

    pub fn with_options(
        settings: RecordingSettings,
        options: RecorderOptions,
        probe: Box<dyn CaptureProbe + Send>,
    ) -> (Self, Receiver<StateChange>) {
        let (events, receiver) = mpsc::channel();
        let session = Session {
            settings,
            options,
            probe,
            state: RecorderState::Idle,
            active_source: None,
            segments: None,
            encoder: None,
            output_path: None,
            last_recording_path: None,
            started_at: None,
            recorded: Duration::ZERO,
            segment_started: None,
        };

        (
            Self {
                session: Mutex::new(session),
                events,
            },
            receiver,
        )
    }

    /// Starts recording `source` into `output_path`. Rejected while already
    /// recording; equivalent to [Recorder::resume] while paused.
    pub fn start(&self, output_path: impl AsRef<Path>, source: &CaptureSource) -> Result<()> {
        let mut session = self.lock()?;
        let before = session.state;
        session.start(output_path.as_ref(), source)?;
        let after = session.state;
        drop(session);

        if before != after {
            self.emit(after, None);
        }
        Ok(())
    }

    pub fn pause(&self) -> Result<()> {
        let mut session = self.lock()?;
        let changed = session.pause();
        drop(session);

        if changed {
            self.emit(RecorderState::Paused, None);
        }
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        let mut session = self.lock()?;
        let before = session.state;
        session.resume()?;
        let after = session.state;
        drop(session);

        if before != after {
            self.emit(after, None);
        }
        Ok(())
    }

    /// Stops the session and merges its segments. Returns `None` when the
    /// recorder was already idle.
    pub fn stop(&self) -> Result<Option<FinalizeOutcome>> {
        let mut session = self.lock()?;
        let outcome = session.stop();
        drop(session);

        if let Some(outcome) = &outcome {
            self.emit(RecorderState::Idle, Some(outcome.clone()));
        }
        Ok(outcome)
    }

    pub fn state(&self) -> RecorderState {
        self.lock()
            .map(|session| session.state)
            .unwrap_or(RecorderState::Idle)
    }

    /// Destination of the most recently finalized recording, if any.
    pub fn last_recording_path(&self) -> Option<PathBuf> {
        self.lock()
            .ok()
            .and_then(|session| session.last_recording_path.clone())
    }

    /// Runs `ffmpeg -version` and returns the version banner line. Intended
    /// for a startup health check so a missing binary is reported before the
    /// user hits record.
    pub fn verify_ffmpeg(&self) -> Result<String> {
        let path = self.lock()?.options.ffmpeg_path.clone();
        verify_ffmpeg_binary(&path)
    }

    /// Removes work directories left behind by crashed runs. Intended to run
    /// at application startup. Returns how many directories were removed.
    pub fn clean_stale_sessions(&self) -> usize {
        let (base, active) = match self.lock() {
            Ok(session) => (
                session.options.temp_base.clone(),
                session
                    .segments
                    .as_ref()
                    .map(|segments| segments.work_dir().to_path_buf()),
            ),
            Err(_) => return 0,
        };

        let entries = match std::fs::read_dir(&base) {
            Ok(entries) => entries,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            if !entry
                .file_name()
                .to_string_lossy()
                .starts_with(SESSION_DIR_PREFIX)
            {
                continue;
            }
            if Some(&path) == active.as_ref() {
                continue;
            }

            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    info!("Removed stale session dir: {:?}", path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove stale session dir {:?}: {}", path, e),
            }
        }
        removed
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|e| RecorderError::State(e.to_string()))
    }

    fn emit(&self, state: RecorderState, finalize: Option<FinalizeOutcome>) {
        let _ = self.events.send(StateChange { state, finalize });
    }
}

fn verify_ffmpeg_binary(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(RecorderError::EncoderMissing(path.to_path_buf()));
    }

    let mut command = std::process::Command::new(path);
    command.arg("-version");

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(crate::constants::CREATE_NO_WINDOW);
    }

    let output = command.output().map_err(|e| {
        RecorderError::LaunchFailed(format!("failed to run {}: {}", path.display(), e))
    })?;

    if !output.status.success() {
        return Err(RecorderError::LaunchFailed(
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or("").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn recorder_with(
        ffmpeg_path: PathBuf,
        temp_base: PathBuf,
    ) -> (Recorder, Receiver<StateChange>) {
        let options = RecorderOptions {
            ffmpeg_path,
            temp_base,
            launch_grace: Duration::from_millis(200),
        };
        let mut settings = RecordingSettings::default();
        settings.record_audio = false;
        Recorder::with_options(settings, options, Box::new(NullProbe))
    }

    fn drain_states(receiver: &Receiver<StateChange>) -> Vec<RecorderState> {
        receiver.try_iter().map(|change| change.state).collect()
    }

    #[test]
    fn test_idle_transitions_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, events) =
            recorder_with(dir.path().join("ffmpeg"), dir.path().join("work"));

        recorder.pause().unwrap();
        recorder.resume().unwrap();
        assert!(recorder.stop().unwrap().is_none());

        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(drain_states(&events).is_empty());
        assert!(recorder.last_recording_path().is_none());
    }

    #[test]
    fn test_start_requires_ffmpeg_binary() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, events) =
            recorder_with(dir.path().join("missing-ffmpeg"), dir.path().join("work"));

        let err = recorder
            .start(dir.path().join("out.mp4"), &CaptureSource::FullScreen)
            .unwrap_err();

        assert!(matches!(err, RecorderError::EncoderMissing(_)));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(drain_states(&events).is_empty());
    }

    #[test]
    fn test_verify_ffmpeg_reports_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, _events) =
            recorder_with(dir.path().join("missing-ffmpeg"), dir.path().join("work"));

        let err = recorder.verify_ffmpeg().unwrap_err();
        assert!(matches!(err, RecorderError::EncoderMissing(_)));
    }

    #[test]
    fn test_clean_stale_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("work");
        fs::create_dir_all(base.join("session_dead-beef")).unwrap();
        fs::create_dir_all(base.join("unrelated")).unwrap();

        let (recorder, _events) = recorder_with(dir.path().join("ffmpeg"), base.clone());

        assert_eq!(recorder.clean_stale_sessions(), 1);
        assert!(!base.join("session_dead-beef").exists());
        assert!(base.join("unrelated").exists());
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        // Stand-in encoder: logs each invocation next to itself, writes
        // data into its output file (the final argument) and then behaves
        // like FFmpeg's interactive mode, exiting on 'q' or EOF.
        const WELL_BEHAVED: &str = r#"dir=$(dirname "$0")
echo "$@" >> "$dir/invocations.log"
for last; do :; done
case "$last" in
  -version) echo "ffmpeg version 6.0-fake"; exit 0 ;;
esac
printf 'frames' > "$last"
while read -r line; do
  [ "$line" = "q" ] && exit 0
done
exit 0
"#;

        const DEVICE_BUSY: &str = "echo 'desktop: I/O error' >&2\nexit 1\n";

        const EMPTY_OUTPUT: &str = r#"for last; do :; done
: > "$last"
while read -r line; do
  [ "$line" = "q" ] && exit 0
done
exit 0
"#;

        fn install_fake_ffmpeg(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("ffmpeg");
            fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
            path
        }

        fn invocations(ffmpeg: &Path) -> Vec<String> {
            fs::read_to_string(ffmpeg.parent().unwrap().join("invocations.log"))
                .map(|content| content.lines().map(str::to_string).collect())
                .unwrap_or_default()
        }

        fn segment_count(recorder: &Recorder) -> usize {
            recorder
                .session
                .lock()
                .unwrap()
                .segments
                .as_ref()
                .map(|segments| segments.segment_count())
                .unwrap_or(0)
        }

        #[test]
        fn test_start_stop_renames_single_segment() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, events) = recorder_with(ffmpeg.clone(), dir.path().join("work"));

            let output = dir.path().join("out.mp4");
            recorder.start(&output, &CaptureSource::FullScreen).unwrap();
            assert_eq!(recorder.state(), RecorderState::Recording);
            assert_eq!(segment_count(&recorder), 1);

            let outcome = recorder.stop().unwrap().unwrap();
            match outcome {
                FinalizeOutcome::Saved { path, .. } => assert_eq!(path, output),
                other => panic!("unexpected outcome: {:?}", other),
            }

            assert_eq!(recorder.state(), RecorderState::Idle);
            assert_eq!(fs::read(&output).unwrap(), b"frames");
            assert_eq!(recorder.last_recording_path(), Some(output));

            // One encoder run, no concat invocation.
            let log = invocations(&ffmpeg);
            assert_eq!(log.len(), 1);
            assert!(!log[0].contains("concat"));

            assert_eq!(
                drain_states(&events),
                vec![RecorderState::Recording, RecorderState::Idle]
            );
        }

        #[test]
        fn test_pause_resume_concatenates_two_segments() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, events) = recorder_with(ffmpeg.clone(), dir.path().join("work"));

            let output = dir.path().join("out.mp4");
            recorder.start(&output, &CaptureSource::FullScreen).unwrap();
            recorder.pause().unwrap();
            assert_eq!(recorder.state(), RecorderState::Paused);
            recorder.resume().unwrap();
            assert_eq!(recorder.state(), RecorderState::Recording);
            assert_eq!(segment_count(&recorder), 2);

            let outcome = recorder.stop().unwrap().unwrap();
            assert!(matches!(outcome, FinalizeOutcome::Saved { .. }));
            assert!(output.exists());

            // Two encoder runs plus the concat invocation.
            let log = invocations(&ffmpeg);
            assert_eq!(log.len(), 3);
            assert!(log[2].contains("concat"));

            assert_eq!(
                drain_states(&events),
                vec![
                    RecorderState::Recording,
                    RecorderState::Paused,
                    RecorderState::Recording,
                    RecorderState::Idle
                ]
            );
        }

        #[test]
        fn test_start_while_recording_is_rejected() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, _events) = recorder_with(ffmpeg, dir.path().join("work"));

            let output = dir.path().join("out.mp4");
            recorder.start(&output, &CaptureSource::FullScreen).unwrap();

            let err = recorder
                .start(dir.path().join("other.mp4"), &CaptureSource::FullScreen)
                .unwrap_err();
            assert!(matches!(err, RecorderError::AlreadyRecording));
            assert_eq!(recorder.state(), RecorderState::Recording);
            assert_eq!(segment_count(&recorder), 1);

            recorder.stop().unwrap();
        }

        #[test]
        fn test_start_while_paused_acts_as_resume() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, _events) = recorder_with(ffmpeg, dir.path().join("work"));

            let output = dir.path().join("out.mp4");
            recorder.start(&output, &CaptureSource::FullScreen).unwrap();
            recorder.pause().unwrap();

            // Both arguments must be ignored in favor of the session's.
            recorder
                .start(
                    dir.path().join("ignored.mp4"),
                    &CaptureSource::Window { handle: 0xdead },
                )
                .unwrap();
            assert_eq!(recorder.state(), RecorderState::Recording);

            let outcome = recorder.stop().unwrap().unwrap();
            match outcome {
                FinalizeOutcome::Saved { path, .. } => assert_eq!(path, output),
                other => panic!("unexpected outcome: {:?}", other),
            }
            assert!(!dir.path().join("ignored.mp4").exists());
        }

        #[test]
        fn test_device_busy_start_leaves_idle() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), DEVICE_BUSY);
            let work = dir.path().join("work");
            let (recorder, events) = recorder_with(ffmpeg, work.clone());

            let err = recorder
                .start(dir.path().join("out.mp4"), &CaptureSource::FullScreen)
                .unwrap_err();

            match err {
                RecorderError::DeviceBusyOrIo(diag) => assert!(diag.contains("I/O error")),
                other => panic!("unexpected error: {:?}", other),
            }
            assert_eq!(recorder.state(), RecorderState::Idle);
            assert!(drain_states(&events).is_empty());

            // The aborted session cleaned its work dir up again.
            let leftovers: Vec<_> = fs::read_dir(&work)
                .map(|entries| entries.flatten().collect())
                .unwrap_or_default();
            assert!(leftovers.is_empty());
        }

        #[test]
        fn test_failed_resume_stays_paused() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, _events) = recorder_with(ffmpeg.clone(), dir.path().join("work"));

            recorder
                .start(dir.path().join("out.mp4"), &CaptureSource::FullScreen)
                .unwrap();
            recorder.pause().unwrap();

            // The device vanishes while paused.
            install_fake_ffmpeg(dir.path(), DEVICE_BUSY);
            let err = recorder.resume().unwrap_err();
            assert!(matches!(err, RecorderError::DeviceBusyOrIo(_)));
            assert_eq!(recorder.state(), RecorderState::Paused);
            assert_eq!(segment_count(&recorder), 1);

            // The session is still stoppable and keeps its one segment.
            install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let outcome = recorder.stop().unwrap().unwrap();
            assert!(matches!(outcome, FinalizeOutcome::Saved { .. }));
        }

        #[test]
        fn test_missing_segment_is_skipped_at_finalize() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, _events) = recorder_with(ffmpeg.clone(), dir.path().join("work"));

            recorder
                .start(dir.path().join("out.mp4"), &CaptureSource::FullScreen)
                .unwrap();
            recorder.pause().unwrap();
            recorder.resume().unwrap();
            recorder.pause().unwrap();

            let second_segment = recorder
                .session
                .lock()
                .unwrap()
                .segments
                .as_ref()
                .unwrap()
                .segments()[1]
                .clone();
            fs::remove_file(&second_segment).unwrap();

            let outcome = recorder.stop().unwrap().unwrap();
            assert!(matches!(outcome, FinalizeOutcome::Saved { .. }));
        }

        #[test]
        fn test_zero_byte_output_reports_empty() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), EMPTY_OUTPUT);
            let (recorder, _events) = recorder_with(ffmpeg, dir.path().join("work"));

            let output = dir.path().join("out.mp4");
            recorder.start(&output, &CaptureSource::FullScreen).unwrap();
            let outcome = recorder.stop().unwrap().unwrap();

            assert!(matches!(outcome, FinalizeOutcome::Empty));
            assert!(!output.exists());
            assert!(recorder.last_recording_path().is_none());
        }

        #[test]
        fn test_verify_ffmpeg_returns_version_banner() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = install_fake_ffmpeg(dir.path(), WELL_BEHAVED);
            let (recorder, _events) = recorder_with(ffmpeg, dir.path().join("work"));

            let banner = recorder.verify_ffmpeg().unwrap();
            assert!(banner.starts_with("ffmpeg version"));
        }
    }
}
