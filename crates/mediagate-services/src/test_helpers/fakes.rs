//! Recording fakes for the pipeline collaborators

use crate::clients::{ScanVerdict, StateTracker, TranscodeEngine, VirusScanner};
use anyhow::anyhow;
use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceState, StateMetadata};
use mediagate_processing::{MediaProbe, PdfRasterizer, ProbedMedia, TranscodeJob};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One recorded tracker call
#[derive(Debug, Clone, PartialEq)]
pub struct StateUpdate {
    pub key: String,
    pub state: ResourceState,
    pub metadata: Option<StateMetadata>,
}

/// State tracker remembering every update in order
#[derive(Default)]
pub struct RecordingStateTracker {
    updates: Mutex<Vec<StateUpdate>>,
}

impl RecordingStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<StateUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn states(&self) -> Vec<ResourceState> {
        self.updates().into_iter().map(|u| u.state).collect()
    }

    pub fn last(&self) -> Option<StateUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StateTracker for RecordingStateTracker {
    async fn update_state(
        &self,
        key: &str,
        state: ResourceState,
        metadata: Option<StateMetadata>,
    ) -> IngestResult<()> {
        self.updates.lock().unwrap().push(StateUpdate {
            key: key.to_string(),
            state,
            metadata,
        });
        Ok(())
    }
}

enum ScanBehavior {
    Clean,
    Infected(Vec<String>),
    Fail(String),
}

/// Scanner returning a fixed verdict; records whether the scanned file
/// existed during the scan and where it lived
pub struct FakeScanner {
    behavior: ScanBehavior,
    scanned: Mutex<Vec<(std::path::PathBuf, Vec<u8>)>>,
}

impl FakeScanner {
    fn with(behavior: ScanBehavior) -> Self {
        Self {
            behavior,
            scanned: Mutex::new(Vec::new()),
        }
    }

    pub fn clean() -> Self {
        Self::with(ScanBehavior::Clean)
    }

    pub fn infected(signatures: &[&str]) -> Self {
        Self::with(ScanBehavior::Infected(
            signatures.iter().map(|s| s.to_string()).collect(),
        ))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(ScanBehavior::Fail(message.to_string()))
    }

    /// Paths and contents seen by the scanner
    pub fn scanned(&self) -> Vec<(std::path::PathBuf, Vec<u8>)> {
        self.scanned.lock().unwrap().clone()
    }
}

#[async_trait]
impl VirusScanner for FakeScanner {
    async fn scan_file(&self, path: &Path) -> IngestResult<ScanVerdict> {
        let contents = tokio::fs::read(path).await?;
        self.scanned
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents));

        match &self.behavior {
            ScanBehavior::Clean => Ok(ScanVerdict::Clean),
            ScanBehavior::Infected(signatures) => Ok(ScanVerdict::Infected(signatures.clone())),
            ScanBehavior::Fail(message) => Err(IngestError::Scan(message.clone())),
        }
    }
}

/// Rasterizer producing a tiny SVG naming the page
///
/// Tracks how many renders overlap so tests can check the fan-out bound.
pub struct FakeRasterizer {
    pages: u32,
    failing_page: Option<u32>,
    render_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeRasterizer {
    pub fn with_pages(pages: u32) -> Self {
        Self {
            pages,
            failing_page: None,
            render_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(pages: u32, page: u32) -> Self {
        Self {
            failing_page: Some(page),
            ..Self::with_pages(pages)
        }
    }

    /// Hold every render for `delay` before returning.
    pub fn with_render_delay(mut self, delay: Duration) -> Self {
        self.render_delay = delay;
        self
    }

    /// Highest number of renders observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfRasterizer for FakeRasterizer {
    async fn page_count(&self, _pdf: &[u8]) -> anyhow::Result<u32> {
        Ok(self.pages)
    }

    async fn render_page_svg(&self, _pdf: &[u8], page: u32) -> anyhow::Result<Vec<u8>> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);

        tokio::time::sleep(self.render_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_page == Some(page) {
            return Err(anyhow!("cannot render page {}", page));
        }
        Ok(format!("<svg><!-- page {} --></svg>", page).into_bytes())
    }
}

/// Probe returning fixed media info and remembering the probed URLs
pub struct FakeProbe {
    media: Option<ProbedMedia>,
    fail: bool,
    urls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn new(media: Option<ProbedMedia>) -> Self {
        Self {
            media,
            fail: false,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            media: None,
            fail: true,
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaProbe for FakeProbe {
    async fn probe(&self, url: &str) -> anyhow::Result<Option<ProbedMedia>> {
        self.urls.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(anyhow!("ffprobe exited with status 1"));
        }
        Ok(self.media.clone())
    }
}

/// Transcoder accepting every job under a fixed id
pub struct FakeTranscoder {
    job_id: String,
    jobs: Mutex<Vec<TranscodeJob>>,
}

impl FakeTranscoder {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn jobs(&self) -> Vec<TranscodeJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscodeEngine for FakeTranscoder {
    async fn submit(&self, job: &TranscodeJob) -> IngestResult<String> {
        self.jobs.lock().unwrap().push(job.clone());
        Ok(self.job_id.clone())
    }
}
