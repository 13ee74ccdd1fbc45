use crate::constants::{DEVICE_NOT_SELECTED, DEVICE_PLACEHOLDER_MARKER};

/// Opaque platform window identifier (an HWND value on Windows).
pub type WindowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// What to record. One variant per capture kind, with the kind-specific
/// parameters carried in the variant payload so mixed-up combinations
/// cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    FullScreen,
    Window { handle: WindowId },
    Region { region: CaptureRegion },
    Webcam { index: u32 },
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureSource::FullScreen => write!(f, "full screen"),
            CaptureSource::Window { handle } => write!(f, "window {:#x}", handle),
            CaptureSource::Region { region } => write!(
                f,
                "region {}x{} at ({}, {})",
                region.width, region.height, region.x, region.y
            ),
            CaptureSource::Webcam { index } => write!(f, "webcam {}", index),
        }
    }
}

/// Read-only lookups against the desktop environment. The enumeration
/// services live in the GUI layer; the recording core only ever asks these
/// three questions.
pub trait CaptureProbe {
    /// Current title of a window, or `None` if the handle no longer resolves.
    fn window_title(&self, handle: WindowId) -> Option<String>;

    /// DirectShow device name of an enumerated webcam.
    fn webcam_name(&self, index: u32) -> Option<String>;

    /// Whether an audio device with this name is currently enumerable.
    fn audio_device_exists(&self, name: &str) -> bool {
        let _ = name;
        true
    }
}

/// Probe that resolves nothing. Window sources fall back to the "Unknown"
/// title and webcam sources fail to build, which is the correct behavior
/// when no enumeration services are wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProbe;

impl CaptureProbe for NullProbe {
    fn window_title(&self, _handle: WindowId) -> Option<String> {
        None
    }

    fn webcam_name(&self, _index: u32) -> Option<String> {
        None
    }
}

/// A device identifier counts as usable only if it is a real name: non-empty,
/// not the "nothing selected" sentinel, and not a leaked debug representation.
pub fn is_valid_device_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed != DEVICE_NOT_SELECTED
        && !trimmed.contains(DEVICE_PLACEHOLDER_MARKER)
}
