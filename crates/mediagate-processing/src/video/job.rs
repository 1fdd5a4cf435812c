//! Transcode job description
//!
//! The external transcoder takes a declarative job: one input, four output
//! groups (progressive MP4 per height, CMAF renditions per height and audio
//! bitrate, poster thumbnails per height and a small preview strip).

use super::profile::{max_video_bitrate, EncodingProfile, FrameRate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Height of the preview frame captures
pub const PREVIEW_HEIGHT: u32 = 100;

const AUDIO_SAMPLE_RATE: u32 = 48_000;
const CMAF_SEGMENT_SECS: u32 = 6;
const PREVIEW_CAPTURE_EVERY_SECS: u32 = 1;
const PREVIEW_MAX_CAPTURES: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeJob {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub user_metadata: BTreeMap<String, String>,
    pub output_groups: Vec<OutputGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputGroupKind {
    FileGroup,
    Cmaf,
    FrameCapture,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputGroup {
    pub name: String,
    pub kind: OutputGroupKind,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_length_secs: Option<u32>,
    pub outputs: Vec<Output>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Container {
    Mp4,
    Cmfc,
    Jpg,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub name_modifier: String,
    pub container: Container,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture: Option<FrameCaptureSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOutput {
    pub codec: String,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<FrameRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioOutput {
    pub codec: String,
    pub bitrate: u32,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameCaptureSettings {
    pub every_secs: u32,
    pub max_captures: u32,
}

/// Immutable builder for [`TranscodeJob`].
///
/// `destination_prefix` is `s3://{bucket}/{resourceId}`; each output group
/// appends its own folder and the upload stamp.
#[derive(Debug, Clone)]
pub struct TranscodeJobBuilder {
    input: String,
    destination_prefix: String,
    stamp: String,
    queue: Option<String>,
    role: Option<String>,
    user_metadata: BTreeMap<String, String>,
}

impl TranscodeJobBuilder {
    pub fn new(
        input: impl Into<String>,
        destination_prefix: impl Into<String>,
        stamp: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            destination_prefix: destination_prefix.into(),
            stamp: stamp.into(),
            queue: None,
            role: None,
            user_metadata: BTreeMap::new(),
        }
    }

    pub fn queue(self, queue: Option<String>) -> Self {
        Self { queue, ..self }
    }

    pub fn role(self, role: Option<String>) -> Self {
        Self { role, ..self }
    }

    pub fn metadata(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut user_metadata = self.user_metadata;
        user_metadata.insert(key.into(), value.into());
        Self {
            user_metadata,
            ..self
        }
    }

    fn destination(&self, folder: &str) -> String {
        format!(
            "{}/{}/{}",
            self.destination_prefix.trim_end_matches('/'),
            folder,
            self.stamp
        )
    }

    fn h264(height: u32, frame_rate: FrameRate) -> VideoOutput {
        VideoOutput {
            codec: "H_264".to_string(),
            height,
            max_bitrate: Some(max_video_bitrate(height)),
            frame_rate: Some(frame_rate),
        }
    }

    fn aac(bitrate: u32) -> AudioOutput {
        AudioOutput {
            codec: "AAC".to_string(),
            bitrate,
            sample_rate: AUDIO_SAMPLE_RATE,
        }
    }

    fn frame_capture(name_modifier: String, height: u32, capture: FrameCaptureSettings) -> Output {
        Output {
            name_modifier,
            container: Container::Jpg,
            video: Some(VideoOutput {
                codec: "FRAME_CAPTURE".to_string(),
                height,
                max_bitrate: None,
                frame_rate: None,
            }),
            audio: None,
            capture: Some(capture),
        }
    }

    /// Compose the four output groups from `profile`.
    pub fn build(self, profile: &EncodingProfile) -> TranscodeJob {
        // Progressive downloads carry the best audio rendition
        let mp4_audio = profile.audio_bitrates.iter().copied().max();

        let mp4 = OutputGroup {
            name: "File Group".to_string(),
            kind: OutputGroupKind::FileGroup,
            destination: self.destination("mp4"),
            segment_length_secs: None,
            outputs: profile
                .video_sizes
                .iter()
                .map(|&height| Output {
                    name_modifier: format!("_{}", height),
                    container: Container::Mp4,
                    video: Some(Self::h264(height, profile.frame_rate)),
                    audio: mp4_audio.map(Self::aac),
                    capture: None,
                })
                .collect(),
        };

        let cmaf_video = profile.video_sizes.iter().map(|&height| Output {
            name_modifier: format!("_{}", height),
            container: Container::Cmfc,
            video: Some(Self::h264(height, profile.frame_rate)),
            audio: None,
            capture: None,
        });
        let cmaf_audio = profile.audio_bitrates.iter().map(|&bitrate| Output {
            name_modifier: format!("_audio_{}k", bitrate / 1000),
            container: Container::Cmfc,
            video: None,
            audio: Some(Self::aac(bitrate)),
            capture: None,
        });

        let cmaf = OutputGroup {
            name: "CMAF".to_string(),
            kind: OutputGroupKind::Cmaf,
            destination: self.destination("cmaf"),
            segment_length_secs: Some(CMAF_SEGMENT_SECS),
            outputs: cmaf_video.chain(cmaf_audio).collect(),
        };

        let thumbnails = OutputGroup {
            name: "Thumbnails".to_string(),
            kind: OutputGroupKind::FrameCapture,
            destination: self.destination("thumbnails"),
            segment_length_secs: None,
            outputs: profile
                .video_sizes
                .iter()
                .map(|&height| {
                    Self::frame_capture(
                        format!("_{}", height),
                        height,
                        FrameCaptureSettings {
                            every_secs: 1,
                            max_captures: 1,
                        },
                    )
                })
                .collect(),
        };

        let previews = OutputGroup {
            name: "Previews".to_string(),
            kind: OutputGroupKind::FrameCapture,
            destination: self.destination("previews"),
            segment_length_secs: None,
            outputs: vec![Self::frame_capture(
                format!("_{}", PREVIEW_HEIGHT),
                PREVIEW_HEIGHT,
                FrameCaptureSettings {
                    every_secs: PREVIEW_CAPTURE_EVERY_SECS,
                    max_captures: PREVIEW_MAX_CAPTURES,
                },
            )],
        };

        TranscodeJob {
            input: self.input,
            queue: self.queue,
            role: self.role,
            user_metadata: self.user_metadata,
            output_groups: vec![mp4, cmaf, thumbnails, previews],
        }
    }
}
