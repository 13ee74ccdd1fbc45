
// FFmpeg Binary
#[cfg(windows)]
pub const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
pub const FFMPEG_BINARY: &str = "ffmpeg";

// Process Control
pub const LAUNCH_GRACE_MS: u64 = 3000;
pub const LAUNCH_POLL_MS: u64 = 100;
pub const STOP_TIMEOUT_MS: u64 = 5000;
pub const PAUSE_TIMEOUT_MS: u64 = 3000;
pub const KILL_WAIT_MS: u64 = 1000;

// Video Defaults
pub const VIDEO_CODEC: &str = "libx264";
pub const VIDEO_PRESET: &str = "veryfast";
pub const VIDEO_TUNE: &str = "zerolatency";
pub const VIDEO_PIXEL_FORMAT: &str = "yuv420p";
pub const VIDEO_CRF: &str = "23";
pub const VIDEO_MAXRATE: &str = "6M";
pub const VIDEO_BUFSIZE: &str = "12M";
pub const VIDEO_GOP: &str = "60";
pub const VIDEO_PROFILE: &str = "high";
pub const VIDEO_LEVEL: &str = "4.2";
pub const MIN_FPS: u32 = 10;
pub const MAX_FPS: u32 = 165;

// Audio Defaults
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_SAMPLE_RATE: &str = "48000";
pub const AUDIO_CHANNELS: &str = "2";
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 128;

// Device identifier the settings layer stores when no device is chosen, plus
// the marker left behind when the device list leaks a debug representation
// instead of a name.
pub const DEVICE_NOT_SELECTED: &str = "Not selected";
pub const DEVICE_PLACEHOLDER_MARKER: &str = "AudioDeviceInfo";

// Diagnostic substrings FFmpeg emits when a capture device cannot be opened.
pub const DIAG_OPEN_INPUT: &str = "Error opening input";
pub const DIAG_IO_ERROR: &str = "I/O error";

// Segment / Output
pub const SEGMENT_PREFIX: &str = "segment_";
pub const SEGMENT_EXTENSION: &str = "mp4";
pub const CONCAT_MANIFEST: &str = "filelist.txt";
pub const SESSION_METADATA: &str = "session.json";
pub const SESSION_DIR_PREFIX: &str = "session_";

// Monitor
pub const PROGRESS_LOG_INTERVAL_SECS: u64 = 5;

#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x08000000;
