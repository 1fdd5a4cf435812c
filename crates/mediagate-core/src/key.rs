//! Object key grammar
//!
//! Every uploaded object lands under a key of the form
//! `{resource_id}/{kind}/{record_id}/{stamp}`. The kind segment selects the
//! processing pipeline; the remaining segments identify the resource and name
//! its derived artifacts. Keys are parsed once into an immutable
//! [`ResourceKey`] so pipelines never re-derive optional fields.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};

const SEGMENT_COUNT: usize = 4;

static TIMED_TEXT_STAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{10})_([a-z-]{2,10})(?:_(st|ts|cc))?$").expect("valid timed text regex")
});

/// Resource-type discriminator carried in the second key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "classroomdocument")]
    ClassroomDocument,
    #[serde(rename = "depositedfile")]
    DepositedFile,
    #[serde(rename = "document")]
    Document,
    #[serde(rename = "markdown-images")]
    MarkdownImage,
    #[serde(rename = "sharedlivemedia")]
    SharedLiveMedia,
    #[serde(rename = "thumbnail")]
    Thumbnail,
    #[serde(rename = "timedtexttrack")]
    TimedTextTrack,
    #[serde(rename = "video")]
    Video,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::ClassroomDocument,
        ResourceKind::DepositedFile,
        ResourceKind::Document,
        ResourceKind::MarkdownImage,
        ResourceKind::SharedLiveMedia,
        ResourceKind::Thumbnail,
        ResourceKind::TimedTextTrack,
        ResourceKind::Video,
    ];

    /// Token used for this kind in object keys.
    pub fn token(&self) -> &'static str {
        match self {
            ResourceKind::ClassroomDocument => "classroomdocument",
            ResourceKind::DepositedFile => "depositedfile",
            ResourceKind::Document => "document",
            ResourceKind::MarkdownImage => "markdown-images",
            ResourceKind::SharedLiveMedia => "sharedlivemedia",
            ResourceKind::Thumbnail => "thumbnail",
            ResourceKind::TimedTextTrack => "timedtexttrack",
            ResourceKind::Video => "video",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }

    /// User-facing description of the key shape this kind expects.
    pub fn expected_format(&self) -> &'static str {
        match self {
            ResourceKind::ClassroomDocument => {
                "Source classroom documents should be uploaded in a folder of the form \
                 \"{classroom_id}/classroomdocument/{id}/{stamp}\"."
            }
            ResourceKind::DepositedFile => {
                "Source deposited files should be uploaded in a folder of the form \
                 \"{file-deposit_id}/depositedfile/{id}/{stamp}\"."
            }
            ResourceKind::Document => {
                "Source documents should be uploaded in a folder of the form \
                 \"{document_id}/document/{document_id}/{stamp}\"."
            }
            ResourceKind::MarkdownImage => {
                "Source markdown images should be uploaded in a folder of the form \
                 \"{doc_id}/markdown-images/{image_id}/{stamp}.{ext}\"."
            }
            ResourceKind::SharedLiveMedia => {
                "Source shared live media should be uploaded in a folder of the form \
                 \"{video_id}/sharedlivemedia/{id}/{stamp}.{ext}\"."
            }
            ResourceKind::Thumbnail => {
                "Source thumbnails should be uploaded in a folder of the form \
                 \"{playlist_id}/thumbnail/{id}/{stamp}\"."
            }
            ResourceKind::TimedTextTrack => {
                "Source timed text files should be uploaded to a folder of the form \
                 \"{playlist_id}/timedtexttrack/{id}/{stamp}_{language}[_{st|ts|cc}]\"."
            }
            ResourceKind::Video => {
                "Source videos should be uploaded in a folder of the form \
                 \"{video_id}/video/{video_id}/{stamp}\"."
            }
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.token())
    }
}

/// Caption mode encoded in a timed text stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimedTextMode {
    /// `st`: subtitles
    #[serde(rename = "st")]
    Subtitle,
    /// `ts`: transcript
    #[serde(rename = "ts")]
    Transcript,
    /// `cc`: closed captions
    #[serde(rename = "cc")]
    ClosedCaption,
}

impl TimedTextMode {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "st" => Some(TimedTextMode::Subtitle),
            "ts" => Some(TimedTextMode::Transcript),
            "cc" => Some(TimedTextMode::ClosedCaption),
            _ => None,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            TimedTextMode::Subtitle => "st",
            TimedTextMode::Transcript => "ts",
            TimedTextMode::ClosedCaption => "cc",
        }
    }
}

/// A validated object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceKey {
    object_key: String,
    resource_id: String,
    kind: ResourceKind,
    record_id: String,
    stamp: String,
    extension: Option<String>,
    language: Option<String>,
    mode: Option<TimedTextMode>,
}

impl ResourceKey {
    /// Parse and validate an object key.
    ///
    /// Malformed keys yield [`IngestError::Validation`] carrying the expected
    /// key shape for the kind, or a generic message when the kind token is
    /// missing or unknown.
    pub fn parse(object_key: &str) -> IngestResult<Self> {
        let segments: Vec<&str> = object_key.split('/').collect();

        let kind_token = segments.get(1).copied().unwrap_or_default();
        if kind_token.is_empty() {
            return Err(IngestError::Validation(format!(
                "Unrecognized key format \"{}\"",
                object_key
            )));
        }

        let kind = ResourceKind::from_token(kind_token).ok_or_else(|| {
            IngestError::Validation(format!(
                "Unrecognized kind {} in key \"{}\"",
                kind_token, object_key
            ))
        })?;

        if segments.len() != SEGMENT_COUNT || segments.iter().any(|s| s.is_empty()) {
            return Err(IngestError::Validation(kind.expected_format().to_string()));
        }

        let last = segments[3];
        let mut key = ResourceKey {
            object_key: object_key.to_string(),
            resource_id: segments[0].to_string(),
            kind,
            record_id: segments[2].to_string(),
            stamp: last.to_string(),
            extension: None,
            language: None,
            mode: None,
        };

        match kind {
            ResourceKind::MarkdownImage | ResourceKind::SharedLiveMedia => {
                if let Some((stamp, extension)) = last.rsplit_once('.') {
                    key.stamp = stamp.to_string();
                    key.extension = Some(extension.to_string());
                }
            }
            ResourceKind::DepositedFile => {
                key.extension = last
                    .rsplit_once('.')
                    .map(|(_, extension)| extension.to_string());
            }
            ResourceKind::TimedTextTrack => {
                if let Some(captures) = TIMED_TEXT_STAMP.captures(last) {
                    key.language = captures.get(2).map(|m| m.as_str().to_string());
                    key.mode = captures
                        .get(3)
                        .and_then(|m| TimedTextMode::from_token(m.as_str()));
                }
            }
            _ => {}
        }

        Ok(key)
    }

    /// The raw object key this value was parsed from.
    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Upload stamp used as the base name of derived artifacts.
    ///
    /// For markdown images and shared live media the extension is split off;
    /// for other kinds this is the full last key segment.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn mode(&self) -> Option<TimedTextMode> {
        self.mode
    }
}

impl FromStr for ResourceKey {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKey::parse(s)
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.object_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(key: &str) -> String {
        match ResourceKey::parse(key) {
            Err(IngestError::Validation(msg)) => msg,
            other => panic!("expected validation error for {key}, got {other:?}"),
        }
    }

    #[test]
    fn parses_video_key() {
        let key = ResourceKey::parse("a1/video/b2/1542967735").unwrap();
        assert_eq!(key.resource_id(), "a1");
        assert_eq!(key.kind(), ResourceKind::Video);
        assert_eq!(key.record_id(), "b2");
        assert_eq!(key.stamp(), "1542967735");
        assert_eq!(key.extension(), None);
        assert_eq!(key.mode(), None);
        assert_eq!(key.to_string(), "a1/video/b2/1542967735");
    }

    #[test]
    fn splits_extension_for_shared_live_media_and_markdown_images() {
        let key = ResourceKey::parse("v1/sharedlivemedia/s1/1638403200.pdf").unwrap();
        assert_eq!(key.stamp(), "1638403200");
        assert_eq!(key.extension(), Some("pdf"));

        let key = ResourceKey::parse("d1/markdown-images/i1/1638403200.tar.png").unwrap();
        assert_eq!(key.kind(), ResourceKind::MarkdownImage);
        assert_eq!(key.stamp(), "1638403200.tar");
        assert_eq!(key.extension(), Some("png"));
    }

    #[test]
    fn deposited_file_keeps_full_stamp_and_derives_extension() {
        let key = ResourceKey::parse("f1/depositedfile/x1/1638403200.docx").unwrap();
        assert_eq!(key.stamp(), "1638403200.docx");
        assert_eq!(key.extension(), Some("docx"));

        let key = ResourceKey::parse("f1/depositedfile/x1/1638403200").unwrap();
        assert_eq!(key.extension(), None);
    }

    #[test]
    fn extracts_timed_text_language_and_mode() {
        let key = ResourceKey::parse("p1/timedtexttrack/t1/1542967735_fr_cc").unwrap();
        assert_eq!(key.stamp(), "1542967735_fr_cc");
        assert_eq!(key.language(), Some("fr"));
        assert_eq!(key.mode(), Some(TimedTextMode::ClosedCaption));

        let key = ResourceKey::parse("p1/timedtexttrack/t1/1542967735_pt-br_ts").unwrap();
        assert_eq!(key.language(), Some("pt-br"));
        assert_eq!(key.mode(), Some(TimedTextMode::Transcript));
    }

    #[test]
    fn unmatched_timed_text_stamp_is_opaque() {
        let key = ResourceKey::parse("p1/timedtexttrack/t1/upload_FR").unwrap();
        assert_eq!(key.stamp(), "upload_FR");
        assert_eq!(key.language(), None);
        assert_eq!(key.mode(), None);

        let key = ResourceKey::parse("p1/timedtexttrack/t1/1542967735_fr").unwrap();
        assert_eq!(key.language(), Some("fr"));
        assert_eq!(key.mode(), None);
    }

    #[test]
    fn wrong_segment_count_reports_kind_format() {
        for key in [
            "a1/video/b2",
            "a1/video/b2/123/extra",
            "a1/video/b2/",
            "/video/b2/123",
        ] {
            assert_eq!(
                validation_message(key),
                ResourceKind::Video.expected_format()
            );
        }
        assert_eq!(
            validation_message("p1/timedtexttrack/1542967735_fr"),
            ResourceKind::TimedTextTrack.expected_format()
        );
    }

    #[test]
    fn unknown_kind_reports_kind_and_key() {
        assert_eq!(
            validation_message("a1/podcast/b2/123"),
            "Unrecognized kind podcast in key \"a1/podcast/b2/123\""
        );
    }

    #[test]
    fn missing_kind_reports_key_format() {
        assert_eq!(validation_message("orphan"), "Unrecognized key format \"orphan\"");
        assert_eq!(validation_message(""), "Unrecognized key format \"\"");
        assert_eq!(
            validation_message("a1//b2/123"),
            "Unrecognized key format \"a1//b2/123\""
        );
    }

    #[test]
    fn every_kind_round_trips_its_token() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_token(kind.token()), Some(kind));
        }
        assert_eq!(ResourceKind::from_token("markdown-image"), None);
    }

    #[test]
    fn serialized_kinds_and_modes_match_key_tokens() {
        for kind in ResourceKind::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.token());
            let parsed: ResourceKind =
                serde_json::from_value(serde_json::Value::from(kind.token())).unwrap();
            assert_eq!(parsed, kind);
        }

        let key = ResourceKey::parse("p1/timedtexttrack/t1/1542967735_fr_cc").unwrap();
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["kind"], "timedtexttrack");
        assert_eq!(value["mode"], "cc");

        let key = ResourceKey::parse("d1/markdown-images/i1/1638403200.png").unwrap();
        assert_eq!(serde_json::to_value(&key).unwrap()["kind"], "markdown-images");
    }
}
