//! Media probing through ffprobe

use crate::metadata::{AudioTrack, ProbedMedia, VideoTrack};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;

/// Reports the tracks of a media file reachable at a URL
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// `Ok(None)` when the tool ran but found no usable track
    async fn probe(&self, url: &str) -> Result<Option<ProbedMedia>>;
}

/// Validate that a path doesn't contain shell metacharacters
fn validate_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Path contains dangerous characters: {}", path));
    }
    Ok(())
}

pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: String) -> Result<Self> {
        validate_path(&ffprobe_path)
            .context("Invalid ffprobe_path: contains dangerous characters")?;
        Ok(Self { ffprobe_path })
    }
}

/// Parse an ffprobe rational such as `24000/1001` into a decimal rate
fn parse_rational(raw: &str) -> Option<f64> {
    let (num, den) = raw.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 || num == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Turn `ffprobe -show_streams` JSON into probed tracks
pub(crate) fn parse_probe_output(probe_data: &Value) -> Option<ProbedMedia> {
    let streams = probe_data["streams"].as_array()?;

    let video = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .and_then(|stream| {
            let height = as_u64(&stream["height"])? as u32;
            let frame_rate = stream["avg_frame_rate"]
                .as_str()
                .and_then(parse_rational)
                .or_else(|| stream["r_frame_rate"].as_str().and_then(parse_rational));

            Some(VideoTrack {
                width: as_u64(&stream["width"]).map(|w| w as u32),
                height,
                frame_rate,
            })
        });

    let audio = streams
        .iter()
        .find(|s| s["codec_type"] == "audio")
        .map(|stream| AudioTrack {
            bit_rate: as_u64(&stream["bit_rate"]),
        });

    if video.is_none() && audio.is_none() {
        return None;
    }

    Some(ProbedMedia { video, audio })
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    #[tracing::instrument(skip(self, url), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, url: &str) -> Result<Option<ProbedMedia>> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
            ])
            .arg(url)
            .output()
            .await
            .context("Failed to execute ffprobe")?;

        if !output.status.success() {
            return Err(anyhow!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let probe_data: Value =
            serde_json::from_slice(&output.stdout).context("Failed to parse ffprobe output")?;

        let media = parse_probe_output(&probe_data);

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            height = media.as_ref().and_then(|m| m.video_height()),
            frame_rate = media.as_ref().and_then(|m| m.frame_rate()),
            audio_bit_rate = media.as_ref().and_then(|m| m.audio_bit_rate()),
            "Media probe completed"
        );

        Ok(media)
    }
}
