//! Probed media metadata types

use serde::{Deserialize, Serialize};

/// What a media probe reported about a source file.
///
/// Either track may be missing: audio-only uploads have no video track and
/// silent clips have no audio track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbedMedia {
    pub video: Option<VideoTrack>,
    pub audio: Option<AudioTrack>,
}

/// First video track of a probed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoTrack {
    pub width: Option<u32>,
    pub height: u32,
    /// Decimal frame rate, e.g. 23.976
    pub frame_rate: Option<f64>,
}

/// First audio track of a probed file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Bits per second
    pub bit_rate: Option<u64>,
}

impl ProbedMedia {
    pub fn video_height(&self) -> Option<u32> {
        self.video.as_ref().map(|v| v.height)
    }

    pub fn frame_rate(&self) -> Option<f64> {
        self.video.as_ref().and_then(|v| v.frame_rate)
    }

    pub fn audio_bit_rate(&self) -> Option<u64> {
        self.audio.as_ref().and_then(|a| a.bit_rate)
    }
}
