//! Caption conversion to WebVTT
//!
//! Uploaded timed text tracks arrive in one of several caption formats and
//! are always published as WebVTT. Subtitles and closed captions keep their
//! text verbatim; transcripts are HTML-escaped because players inject them
//! into the page.

mod parser;
mod webvtt;

pub use parser::{detect_format, parse_captions};
pub use webvtt::{format_timestamp, render};

use std::fmt;
use thiserror::Error;

/// A single timed caption, times in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: String,
}

/// Caption formats recognized on upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtitleFormat {
    Vtt,
    Srt,
    Sbv,
    Ssa,
    Ass,
}

impl SubtitleFormat {
    /// Short name, also used as the reported extension
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleFormat::Vtt => "vtt",
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Sbv => "sbv",
            SubtitleFormat::Ssa => "ssa",
            SubtitleFormat::Ass => "ass",
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubtitleError {
    #[error("Timed text file is not valid UTF-8")]
    InvalidEncoding,

    #[error("Unable to detect the timed text format")]
    UnknownFormat,

    #[error("No captions found in {0} file")]
    NoCaptions(SubtitleFormat),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Result of a conversion: the detected source format and the WebVTT body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedTrack {
    pub format: SubtitleFormat,
    pub vtt: String,
}

fn decode(data: &[u8]) -> Result<&str, SubtitleError> {
    let text = std::str::from_utf8(data).map_err(|_| SubtitleError::InvalidEncoding)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

fn parse(data: &[u8]) -> Result<(SubtitleFormat, Vec<Caption>), SubtitleError> {
    let text = decode(data)?;
    let format = detect_format(text).ok_or(SubtitleError::UnknownFormat)?;
    let captions = parse_captions(text, format)?;
    if captions.is_empty() {
        return Err(SubtitleError::NoCaptions(format));
    }
    Ok((format, captions))
}

/// Convert a subtitle or closed caption file to WebVTT, text untouched.
pub fn convert_to_webvtt(data: &[u8]) -> Result<ConvertedTrack, SubtitleError> {
    let (format, captions) = parse(data)?;
    Ok(ConvertedTrack {
        format,
        vtt: render(&captions),
    })
}

/// Convert a transcript to WebVTT with every caption's text HTML-escaped.
///
/// Entities already present are decoded first so the output is escaped
/// exactly once.
pub fn encode_transcript(data: &[u8]) -> Result<ConvertedTrack, SubtitleError> {
    let (format, captions) = parse(data)?;
    let escaped: Vec<Caption> = captions
        .into_iter()
        .map(|caption| Caption {
            text: escape_text(&caption.text),
            ..caption
        })
        .collect();

    Ok(ConvertedTrack {
        format,
        vtt: render(&escaped),
    })
}

fn escape_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text);
    html_escape::encode_quoted_attribute(&decoded).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:00,000 --> 00:00:01,500\n<script>alert(\"foo\")</script>\n\n2\n00:00:02,000 --> 00:00:03,000\nSecond line\n";

    #[test]
    fn transcripts_are_escaped_once() {
        let track = encode_transcript(SRT.as_bytes()).unwrap();
        assert_eq!(track.format, SubtitleFormat::Srt);
        assert!(track
            .vtt
            .contains("&lt;script&gt;alert(&quot;foo&quot;)&lt;/script&gt;"));

        let pre_escaped = SRT.replace("<script>", "&lt;script&gt;");
        let track = encode_transcript(pre_escaped.as_bytes()).unwrap();
        assert!(track
            .vtt
            .contains("&lt;script&gt;alert(&quot;foo&quot;)&lt;/script&gt;"));
        assert!(!track.vtt.contains("&amp;lt;"));
    }

    #[test]
    fn subtitles_keep_raw_text() {
        let track = convert_to_webvtt(SRT.as_bytes()).unwrap();
        assert_eq!(
            track.vtt,
            "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.500\n<script>alert(\"foo\")</script>\n\n2\n00:00:02.000 --> 00:00:03.000\nSecond line\n\n"
        );
    }

    #[test]
    fn byte_order_mark_is_ignored() {
        let data = format!("\u{feff}{}", SRT);
        assert!(convert_to_webvtt(data.as_bytes()).is_ok());
    }

    #[test]
    fn rejects_unknown_content() {
        assert_eq!(
            convert_to_webvtt(b"this is not a caption file"),
            Err(SubtitleError::UnknownFormat)
        );
        assert_eq!(
            convert_to_webvtt(&[0xff, 0xfe, 0x00]),
            Err(SubtitleError::InvalidEncoding)
        );
    }

    #[test]
    fn rejects_files_without_captions() {
        assert_eq!(
            convert_to_webvtt(b"WEBVTT\n\nNOTE nothing here\n"),
            Err(SubtitleError::NoCaptions(SubtitleFormat::Vtt))
        );
    }
}
