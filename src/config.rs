use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::constants::{DEFAULT_AUDIO_BITRATE_KBPS, MAX_FPS, MIN_FPS};
use crate::error::{RecorderError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Mkv,
    Avi,
    Mov,
    Wmv,
    WebM,
}

impl VideoFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "mp4",
            VideoFormat::Mkv => "mkv",
            VideoFormat::Avi => "avi",
            VideoFormat::Mov => "mov",
            VideoFormat::Wmv => "wmv",
            VideoFormat::WebM => "webm",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Directory recordings are saved into when the GUI does not prompt for
    /// a path. Empty means "prompt every time".
    #[serde(default)]
    pub recording_path: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default)]
    pub format: VideoFormat,
    #[serde(default)]
    pub ask_for_path_each_time: bool,
    #[serde(default = "default_record_audio")]
    pub record_audio: bool,
    /// DirectShow microphone device name. Empty disables the input.
    #[serde(default)]
    pub microphone_device: String,
    /// DirectShow loopback/system audio device name. Empty disables the input.
    #[serde(default)]
    pub system_audio_device: String,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,
}

fn default_fps() -> u32 {
    60
}

fn default_record_audio() -> bool {
    true
}

fn default_audio_bitrate() -> u32 {
    DEFAULT_AUDIO_BITRATE_KBPS
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            recording_path: default_recording_path(),
            fps: default_fps(),
            format: VideoFormat::default(),
            ask_for_path_each_time: false,
            record_audio: default_record_audio(),
            microphone_device: String::new(),
            system_audio_device: String::new(),
            audio_bitrate_kbps: default_audio_bitrate(),
        }
    }
}

fn default_recording_path() -> String {
    dirs::video_dir()
        .map(|p| p.join("deskrec"))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl RecordingSettings {
    /// Frame rate with the encoder's supported bounds applied.
    pub fn clamped_fps(&self) -> u32 {
        self.fps.clamp(MIN_FPS, MAX_FPS)
    }

    /// Timestamped default file name, e.g. `recording_20250805_143000.mp4`.
    pub fn default_file_name(&self) -> String {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("recording_{}.{}", stamp, self.format.extension())
    }

    pub fn load() -> Self {
        let config_path = settings_path();

        if let Some(path) = &config_path {
            if path.exists() {
                match fs::read_to_string(path) {
                    Ok(content) => match toml::from_str(&content) {
                        Ok(settings) => return settings,
                        Err(e) => log::error!("Failed to parse settings file: {}", e),
                    },
                    Err(e) => log::error!("Failed to read settings file: {}", e),
                }
            }
        }

        // Fall back to defaults and try to leave a file for the user to edit.
        let defaults = Self::default();
        if let Some(path) = &config_path {
            let _ = defaults.save_to_path(path);
        }
        defaults
    }

    pub fn save(&self) -> Result<()> {
        let path = settings_path()
            .ok_or_else(|| RecorderError::Config("Could not resolve settings path".into()))?;
        self.save_to_path(&path)
    }

    fn save_to_path(&self, path: &PathBuf) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| RecorderError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("deskrec").join("settings.toml"))
}
