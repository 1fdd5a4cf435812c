//! Mediagate Media Processing Library
//!
//! This crate provides the media transformations used by the ingest
//! pipelines: caption conversion to WebVTT, thumbnail resizing, PDF page
//! rasterization, media probing and the adaptive encoding profile used to
//! describe transcode jobs.

pub mod metadata;

#[cfg(feature = "image")]
pub mod image;

#[cfg(feature = "video")]
pub mod video;

#[cfg(feature = "document")]
pub mod document;

#[cfg(feature = "subtitle")]
pub mod subtitle;

// Re-export commonly used types
pub use metadata::{AudioTrack, ProbedMedia, VideoTrack};

#[cfg(feature = "image")]
pub use self::image::{render_thumbnails, resize_to_height, THUMBNAIL_SIZES};

#[cfg(feature = "video")]
pub use video::{
    derive_profile, EncodingProfile, FfprobeProbe, FrameRate, MediaProbe, TranscodeJob,
    TranscodeJobBuilder,
};

#[cfg(feature = "document")]
pub use document::{PdfRasterizer, PopplerRasterizer};

#[cfg(feature = "subtitle")]
pub use subtitle::{
    convert_to_webvtt, encode_transcript, Caption, ConvertedTrack, SubtitleError, SubtitleFormat,
};
