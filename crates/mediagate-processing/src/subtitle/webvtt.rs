//! WebVTT serialization

use super::Caption;
use std::fmt::Write;

/// Format milliseconds as `HH:MM:SS.mmm`.
pub fn format_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}

/// Render captions as a WebVTT document with numbered cues.
pub fn render(captions: &[Caption]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for (index, caption) in captions.iter().enumerate() {
        // Writing to a String cannot fail
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(caption.start_ms),
            format_timestamp(caption.end_ms),
            caption.text
        );
    }
    out
}
