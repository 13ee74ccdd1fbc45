//! deskrec — recording session core for a desktop screen recorder.
//!
//! The crate turns a capture source (full screen, window, region, webcam)
//! and a set of recording settings into supervised FFmpeg invocations:
//! one encoder process per recording segment, with pause/resume producing
//! additional segments that are stream-copy merged on stop. The GUI shell,
//! pixel capture for previews and device enumeration all live elsewhere;
//! this crate only talks to them through [source::CaptureProbe].

pub mod config;
pub mod constants;
pub mod error;
pub mod ffmpeg;
#[cfg(windows)]
pub mod job_object;
pub mod session;
pub mod source;

pub use config::{RecordingSettings, VideoFormat};
pub use error::{RecorderError, Result};
pub use session::{FinalizeOutcome, Recorder, RecorderOptions, RecorderState, StateChange};
pub use source::{CaptureProbe, CaptureRegion, CaptureSource, NullProbe, WindowId};
