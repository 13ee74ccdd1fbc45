use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, RecorderError>;

#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    #[error("FFmpeg not found at {}", .0.display())]
    EncoderMissing(PathBuf),

    #[error("Recording is already in progress")]
    AlreadyRecording,

    #[error("Capture region has invalid dimensions: {width}x{height}")]
    InvalidSourceGeometry { width: u32, height: u32 },

    #[error("Webcam with index {0} was not found")]
    WebcamNotFound(u32),

    #[error("FFmpeg failed to start: {0}")]
    LaunchFailed(String),

    #[error("Capture device is busy or unreadable: {0}")]
    DeviceBusyOrIo(String),

    #[error("No capture source retained for resume")]
    NoActiveSource,

    #[error("Segment merge failed: {0}")]
    SegmentMergeFailed(String),

    #[error("Nothing was recorded")]
    NothingRecorded,

    #[error("Config Error: {0}")]
    Config(String),

    #[error("State Error: {0}")]
    State(String),
}

impl RecorderError {
    /// Raw FFmpeg diagnostic text attached to the error, if any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            RecorderError::LaunchFailed(d)
            | RecorderError::DeviceBusyOrIo(d)
            | RecorderError::SegmentMergeFailed(d) => Some(d),
            _ => None,
        }
    }
}
