use crate::constants::{
    AUDIO_CHANNELS, AUDIO_CODEC, AUDIO_SAMPLE_RATE, DEFAULT_AUDIO_BITRATE_KBPS, VIDEO_BUFSIZE,
    VIDEO_CODEC, VIDEO_CRF, VIDEO_GOP, VIDEO_LEVEL, VIDEO_MAXRATE, VIDEO_PIXEL_FORMAT,
    VIDEO_PRESET, VIDEO_PROFILE, VIDEO_TUNE,
};
use crate::config::RecordingSettings;
use crate::error::{RecorderError, Result};
use crate::ffmpeg::utils::round_to_even;
use crate::source::{is_valid_device_name, CaptureProbe, CaptureSource};

/// Builds the argument list for one recording segment.
///
/// The same builder configuration is used for every segment of a session, so
/// identical inputs must always produce an identical argument vector; the
/// concat step relies on all segments sharing codec parameters.
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    framerate: u32,
    record_audio: bool,
    system_audio_device: String,
    microphone_device: String,
    audio_bitrate_kbps: u32,
    output_path: String,
}

impl FfmpegCommandBuilder {
    pub fn new(output_path: impl Into<String>) -> Self {
        Self {
            framerate: 60,
            record_audio: false,
            system_audio_device: String::new(),
            microphone_device: String::new(),
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            output_path: output_path.into(),
        }
    }

    pub fn from_settings(settings: &RecordingSettings, output_path: impl Into<String>) -> Self {
        Self {
            framerate: settings.clamped_fps(),
            record_audio: settings.record_audio,
            system_audio_device: settings.system_audio_device.clone(),
            microphone_device: settings.microphone_device.clone(),
            audio_bitrate_kbps: settings.audio_bitrate_kbps,
            output_path: output_path.into(),
        }
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_record_audio(mut self, record_audio: bool) -> Self {
        self.record_audio = record_audio;
        self
    }

    pub fn with_system_audio_device(mut self, device: impl Into<String>) -> Self {
        self.system_audio_device = device.into();
        self
    }

    pub fn with_microphone_device(mut self, device: impl Into<String>) -> Self {
        self.microphone_device = device.into();
        self
    }

    pub fn with_audio_bitrate(mut self, kbps: u32) -> Self {
        self.audio_bitrate_kbps = kbps;
        self
    }

    pub fn build(&self, source: &CaptureSource, probe: &dyn CaptureProbe) -> Result<Vec<String>> {
        let mut args = self.video_input_args(source, probe)?;

        let has_system = is_valid_device_name(&self.system_audio_device)
            && probe.audio_device_exists(&self.system_audio_device);
        let has_microphone = is_valid_device_name(&self.microphone_device)
            && probe.audio_device_exists(&self.microphone_device);
        let audio_enabled = self.record_audio && (has_system || has_microphone);

        // Audio inputs: system audio first, microphone second. Input index 0
        // is always the video source.
        if audio_enabled {
            if has_system {
                args.extend(audio_input_args(&self.system_audio_device));
            }
            if has_microphone {
                args.extend(audio_input_args(&self.microphone_device));
            }
        }

        // Stream mapping
        args.push("-map".to_string());
        args.push("0:v".to_string());

        if audio_enabled {
            if has_system && has_microphone {
                args.push("-filter_complex".to_string());
                args.push("[1:a][2:a]amix=inputs=2:duration=first[aout]".to_string());
                args.push("-map".to_string());
                args.push("[aout]".to_string());
            } else {
                args.push("-map".to_string());
                args.push("1:a".to_string());
            }
        }

        // Video encoding parameters
        args.extend(
            [
                "-c:v",
                VIDEO_CODEC,
                "-preset",
                VIDEO_PRESET,
                "-tune",
                VIDEO_TUNE,
            ]
            .map(str::to_string),
        );
        args.push("-r".to_string());
        args.push(self.framerate.to_string());
        args.extend(
            [
                "-pix_fmt",
                VIDEO_PIXEL_FORMAT,
                "-crf",
                VIDEO_CRF,
                "-maxrate",
                VIDEO_MAXRATE,
                "-bufsize",
                VIDEO_BUFSIZE,
                "-g",
                VIDEO_GOP,
                "-profile:v",
                VIDEO_PROFILE,
                "-level",
                VIDEO_LEVEL,
                "-threads",
                "0",
                "-movflags",
                "+faststart",
            ]
            .map(str::to_string),
        );

        if audio_enabled {
            args.extend(["-c:a", AUDIO_CODEC].map(str::to_string));
            args.push("-b:a".to_string());
            args.push(format!("{}k", self.audio_bitrate_kbps));
            args.extend(["-ar", AUDIO_SAMPLE_RATE, "-ac", AUDIO_CHANNELS].map(str::to_string));
        }

        args.push(self.output_path.clone());

        Ok(args)
    }

    fn video_input_args(
        &self,
        source: &CaptureSource,
        probe: &dyn CaptureProbe,
    ) -> Result<Vec<String>> {
        let fps = self.framerate.to_string();

        match source {
            CaptureSource::Webcam { index } => {
                let name = probe
                    .webcam_name(*index)
                    .ok_or(RecorderError::WebcamNotFound(*index))?;
                Ok(vec![
                    "-f".to_string(),
                    "dshow".to_string(),
                    "-framerate".to_string(),
                    fps,
                    "-i".to_string(),
                    format!("video={}", name),
                ])
            }
            CaptureSource::Window { handle } => {
                // Recording proceeds against a best-effort identifier when
                // the window has vanished between selection and start.
                let title = probe
                    .window_title(*handle)
                    .unwrap_or_else(|| "Unknown".to_string());
                Ok(vec![
                    "-f".to_string(),
                    "gdigrab".to_string(),
                    "-framerate".to_string(),
                    fps,
                    "-draw_mouse".to_string(),
                    "1".to_string(),
                    "-i".to_string(),
                    format!("title={}", title),
                ])
            }
            CaptureSource::Region { region } => {
                if region.is_empty() {
                    return Err(RecorderError::InvalidSourceGeometry {
                        width: region.width,
                        height: region.height,
                    });
                }

                let even_width = round_to_even(region.width);
                let even_height = round_to_even(region.height);
                if even_width == 0 || even_height == 0 {
                    return Err(RecorderError::InvalidSourceGeometry {
                        width: region.width,
                        height: region.height,
                    });
                }
                log::debug!(
                    "Region capture: {}x{} -> {}x{}",
                    region.width,
                    region.height,
                    even_width,
                    even_height
                );

                Ok(vec![
                    "-f".to_string(),
                    "gdigrab".to_string(),
                    "-framerate".to_string(),
                    fps,
                    "-draw_mouse".to_string(),
                    "1".to_string(),
                    "-offset_x".to_string(),
                    region.x.to_string(),
                    "-offset_y".to_string(),
                    region.y.to_string(),
                    "-video_size".to_string(),
                    format!("{}x{}", even_width, even_height),
                    "-i".to_string(),
                    "desktop".to_string(),
                ])
            }
            CaptureSource::FullScreen => Ok(vec![
                "-f".to_string(),
                "gdigrab".to_string(),
                "-framerate".to_string(),
                fps,
                "-draw_mouse".to_string(),
                "1".to_string(),
                "-i".to_string(),
                "desktop".to_string(),
            ]),
        }
    }
}

fn audio_input_args(device: &str) -> Vec<String> {
    vec![
        "-f".to_string(),
        "dshow".to_string(),
        "-i".to_string(),
        format!("audio={}", device),
    ]
}
