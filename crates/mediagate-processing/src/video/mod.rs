//! Video processing module
//!
//! Videos are never encoded here: the source is probed through a signed URL,
//! an encoding profile is derived from what the probe reports, and a job
//! description is handed to the external transcoding service.

pub mod job;
pub mod probe;
pub mod profile;

pub use job::{TranscodeJob, TranscodeJobBuilder};
pub use probe::{FfprobeProbe, MediaProbe};
pub use profile::{derive_profile, EncodingProfile, FrameRate};
