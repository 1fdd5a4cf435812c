//! Adaptive encoding profile
//!
//! The renditions requested from the transcoder never exceed the source:
//! resolutions above the source height and audio bitrates above the source
//! bitrate are dropped, and the output frame rate follows the source.

use crate::metadata::ProbedMedia;
use serde::{Deserialize, Serialize};

/// Baseline rendition heights
pub const VIDEO_SIZES: [u32; 5] = [144, 240, 480, 720, 1080];

/// Baseline audio bitrates in bits per second
pub const AUDIO_BITRATES: [u32; 5] = [64_000, 96_000, 128_000, 160_000, 192_000];

/// NTSC 29.97 fps
pub const DEFAULT_FRAME_RATE: FrameRate = FrameRate {
    numerator: 30_000,
    denominator: 1_001,
};

/// Output frame rate as an integer ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    /// Rationalize a decimal frame rate.
    ///
    /// Rounds to the nearest integer rate N, then expresses the source as
    /// `1000·N / d` so that 23.976 becomes 24000/1001 and 25 becomes
    /// 25000/1000. Non-finite or non-positive rates yield `None`.
    pub fn from_decimal(rate: f64) -> Option<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return None;
        }

        let nearest = rate.round();
        let millis = (rate * 1000.0).round();
        if nearest < 1.0 || millis < 1.0 {
            return None;
        }

        let numerator = 1000.0 * nearest;
        let denominator = ((numerator / millis) * 1000.0).round();
        if numerator > u32::MAX as f64 || denominator < 1.0 {
            return None;
        }

        Some(FrameRate {
            numerator: numerator as u32,
            denominator: denominator as u32,
        })
    }
}

/// Renditions to request from the transcoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodingProfile {
    pub video_sizes: Vec<u32>,
    pub audio_bitrates: Vec<u32>,
    pub frame_rate: FrameRate,
}

impl Default for EncodingProfile {
    fn default() -> Self {
        Self {
            video_sizes: VIDEO_SIZES.to_vec(),
            audio_bitrates: AUDIO_BITRATES.to_vec(),
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

/// Keep the ladder entries not above `limit`; the smallest entry survives
/// even when the source is below every rung.
fn cap_ladder(ladder: &[u32], limit: u64) -> Vec<u32> {
    let capped: Vec<u32> = ladder
        .iter()
        .copied()
        .filter(|&value| u64::from(value) <= limit)
        .collect();

    if capped.is_empty() {
        ladder.iter().copied().min().into_iter().collect()
    } else {
        capped
    }
}

/// Derive the encoding profile for a probed source.
///
/// Missing probe data, or a missing track, leaves the matching baseline
/// untouched.
pub fn derive_profile(media: Option<&ProbedMedia>) -> EncodingProfile {
    let mut profile = EncodingProfile::default();
    let Some(media) = media else {
        return profile;
    };

    if let Some(height) = media.video_height() {
        profile.video_sizes = cap_ladder(&VIDEO_SIZES, u64::from(height));
    }

    if let Some(bit_rate) = media.audio_bit_rate() {
        profile.audio_bitrates = cap_ladder(&AUDIO_BITRATES, bit_rate);
    }

    if let Some(rate) = media.frame_rate().and_then(FrameRate::from_decimal) {
        profile.frame_rate = rate;
    }

    profile
}

/// Maximum video bitrate for a rendition height
pub fn max_video_bitrate(height: u32) -> u32 {
    match height {
        0..=144 => 300_000,
        145..=240 => 600_000,
        241..=480 => 1_500_000,
        481..=720 => 3_000_000,
        _ => 5_400_000,
    }
}
