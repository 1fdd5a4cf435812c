//! Caption format detection and parsing

use super::{Caption, SubtitleError, SubtitleFormat};
use regex::Regex;
use std::sync::LazyLock;

static SRT_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d{1,2}:\d{2}:\d{2},\d{1,3}\s*-->\s*\d{1,2}:\d{2}:\d{2},\d{1,3}")
        .expect("valid SRT timing regex")
});

static SBV_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*\d{1,2}:\d{2}:\d{2}\.\d{1,3},\d{1,2}:\d{2}:\d{2}\.\d{1,3}\s*$")
        .expect("valid SBV timing regex")
});

static ASS_SCRIPT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*ScriptType:\s*v4\.00\+").expect("valid script type regex")
});

/// Columns of an `[Events]` section when no `Format:` line precedes the dialogue
const DEFAULT_EVENT_FORMAT: [&str; 10] = [
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

/// Guess the caption format from the file content.
pub fn detect_format(text: &str) -> Option<SubtitleFormat> {
    if text.trim_start().starts_with("WEBVTT") {
        return Some(SubtitleFormat::Vtt);
    }

    if text.to_ascii_lowercase().contains("[script info]") {
        return if ASS_SCRIPT_TYPE.is_match(text) {
            Some(SubtitleFormat::Ass)
        } else {
            Some(SubtitleFormat::Ssa)
        };
    }

    if SRT_TIMING.is_match(text) {
        return Some(SubtitleFormat::Srt);
    }

    if SBV_TIMING.is_match(text) {
        return Some(SubtitleFormat::Sbv);
    }

    None
}

/// Parse every caption of a file already identified as `format`.
pub fn parse_captions(text: &str, format: SubtitleFormat) -> Result<Vec<Caption>, SubtitleError> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    match format {
        SubtitleFormat::Vtt => parse_arrow_blocks(&blocks(&text), true),
        SubtitleFormat::Srt => parse_arrow_blocks(&blocks(&text), false),
        SubtitleFormat::Sbv => parse_sbv(&blocks(&text)),
        SubtitleFormat::Ssa | SubtitleFormat::Ass => parse_events(&text),
    }
}

/// Parse `HH:MM:SS.mmm`, `MM:SS.mmm` or `H:MM:SS.cc` (either `.` or `,`
/// before the fraction) into milliseconds.
pub(crate) fn parse_timestamp(raw: &str) -> Result<u64, SubtitleError> {
    let invalid = || SubtitleError::InvalidTimestamp(raw.trim().to_string());
    let trimmed = raw.trim();

    let (clock, fraction) = match trimmed.rfind(['.', ',']) {
        Some(pos) => (&trimmed[..pos], &trimmed[pos + 1..]),
        None => (trimmed, ""),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => ("0", *m, *s),
        _ => return Err(invalid()),
    };

    let number = |s: &str| -> Result<u64, SubtitleError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        s.parse::<u64>().map_err(|_| invalid())
    };

    let millis = if fraction.is_empty() {
        0
    } else {
        let digits: String = fraction.chars().take(3).collect();
        let value = number(&digits)?;
        match digits.len() {
            1 => value * 100,
            2 => value * 10,
            _ => value,
        }
    };

    let (hours, minutes, seconds) = (number(hours)?, number(minutes)?, number(seconds)?);

    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .and_then(|ms| ms.checked_add(millis))
        .ok_or_else(invalid)
}

/// Group lines into blank-line separated blocks.
fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// SRT and WebVTT cues: optional identifier, `start --> end [settings]`, text.
fn parse_arrow_blocks(blocks: &[Vec<&str>], webvtt: bool) -> Result<Vec<Caption>, SubtitleError> {
    let mut captions = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        if webvtt {
            let first = block[0];
            if index == 0 && first.starts_with("WEBVTT") {
                continue;
            }
            if ["NOTE", "STYLE", "REGION"]
                .iter()
                .any(|kw| first.starts_with(kw))
            {
                continue;
            }
        }

        let Some(timing_pos) = block.iter().position(|line| line.contains("-->")) else {
            continue;
        };

        let (start, end) = block[timing_pos]
            .split_once("-->")
            .ok_or_else(|| SubtitleError::InvalidTimestamp(block[timing_pos].to_string()))?;
        // Cue settings may follow the end time
        let end = end.split_whitespace().next().unwrap_or_default();

        captions.push(Caption {
            start_ms: parse_timestamp(start)?,
            end_ms: parse_timestamp(end)?,
            text: block[timing_pos + 1..].join("\n"),
        });
    }

    Ok(captions)
}

/// SBV cues: `start,end` line followed by text.
fn parse_sbv(blocks: &[Vec<&str>]) -> Result<Vec<Caption>, SubtitleError> {
    let mut captions = Vec::new();

    for block in blocks {
        let timing = block[0];
        if !SBV_TIMING.is_match(timing) {
            continue;
        }
        let (start, end) = timing
            .split_once(',')
            .ok_or_else(|| SubtitleError::InvalidTimestamp(timing.to_string()))?;

        captions.push(Caption {
            start_ms: parse_timestamp(start)?,
            end_ms: parse_timestamp(end)?,
            text: block[1..].join("\n"),
        });
    }

    Ok(captions)
}

/// SSA/ASS `Dialogue:` lines of the `[Events]` section.
fn parse_events(text: &str) -> Result<Vec<Caption>, SubtitleError> {
    let mut captions = Vec::new();
    let mut in_events = false;
    let mut columns: Vec<String> = DEFAULT_EVENT_FORMAT.iter().map(|c| c.to_string()).collect();

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_events = line.eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(format) = line.strip_prefix("Format:") {
            columns = format
                .split(',')
                .map(|c| c.trim().to_ascii_lowercase())
                .collect();
            continue;
        }

        let Some(dialogue) = line.strip_prefix("Dialogue:") else {
            continue;
        };

        // Text is always the last column and may itself contain commas
        let fields: Vec<&str> = dialogue.splitn(columns.len(), ',').collect();
        let field = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .and_then(|i| fields.get(i))
                .copied()
        };

        let (Some(start), Some(end), Some(body)) = (field("start"), field("end"), field("text"))
        else {
            continue;
        };

        captions.push(Caption {
            start_ms: parse_timestamp(start)?,
            end_ms: parse_timestamp(end)?,
            text: body
                .replace("\\N", "\n")
                .replace("\\n", "\n")
                .replace("\\h", " "),
        });
    }

    Ok(captions)
}
