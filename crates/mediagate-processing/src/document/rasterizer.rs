//! PDF page rasterization
//!
//! Shared live media documents are presented page by page, so each page is
//! rendered to its own SVG. Rendering shells out to the poppler utilities.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Page counting and per-page rendering of a PDF held in memory
#[async_trait]
pub trait PdfRasterizer: Send + Sync {
    /// Number of pages in the document
    async fn page_count(&self, pdf: &[u8]) -> Result<u32>;

    /// Render one page (1-based) as an SVG document
    async fn render_page_svg(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>>;
}

/// Rasterizer backed by the `pdfinfo` and `pdftocairo` binaries
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    pdfinfo_path: String,
    pdftocairo_path: String,
}

impl PopplerRasterizer {
    pub fn new(pdfinfo_path: impl Into<String>, pdftocairo_path: impl Into<String>) -> Self {
        Self {
            pdfinfo_path: pdfinfo_path.into(),
            pdftocairo_path: pdftocairo_path.into(),
        }
    }

    async fn write_temp(pdf: &[u8]) -> Result<tempfile::NamedTempFile> {
        let temp_file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .context("Failed to create temporary PDF file")?;
        tokio::fs::write(temp_file.path(), pdf)
            .await
            .context("Failed to write temporary PDF file")?;
        Ok(temp_file)
    }
}

/// Extract the `Pages:` value from `pdfinfo` output
fn parse_page_count(output: &str) -> Result<u32> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Pages:"))
        .ok_or_else(|| anyhow!("pdfinfo output has no page count"))?
        .trim()
        .parse::<u32>()
        .context("Could not parse page count")
}

#[async_trait]
impl PdfRasterizer for PopplerRasterizer {
    #[tracing::instrument(skip(self, pdf), fields(
        process.executable.name = "pdfinfo",
        size_bytes = pdf.len()
    ))]
    async fn page_count(&self, pdf: &[u8]) -> Result<u32> {
        let temp_file = Self::write_temp(pdf).await?;

        let output = Command::new(&self.pdfinfo_path)
            .arg(temp_file.path())
            .output()
            .await
            .context("Failed to execute pdfinfo")?;

        if !output.status.success() {
            return Err(anyhow!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let pages = parse_page_count(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(pages = pages, "PDF page count read");
        Ok(pages)
    }

    #[tracing::instrument(skip(self, pdf), fields(
        process.executable.name = "pdftocairo",
        page = page
    ))]
    async fn render_page_svg(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>> {
        let start = std::time::Instant::now();
        let temp_file = Self::write_temp(pdf).await?;
        let out_dir = tempfile::tempdir().context("Failed to create output directory")?;
        let out_path = out_dir.path().join(format!("page_{}.svg", page));

        let output = Command::new(&self.pdftocairo_path)
            .arg("-svg")
            .args(["-f", &page.to_string(), "-l", &page.to_string()])
            .arg(temp_file.path())
            .arg(&out_path)
            .output()
            .await
            .context("Failed to execute pdftocairo")?;

        if !output.status.success() {
            return Err(anyhow!(
                "pdftocairo failed on page {}: {}",
                page,
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        let svg = read_output(&out_path).await?;

        tracing::info!(
            page = page,
            size_bytes = svg.len(),
            duration_ms = start.elapsed().as_millis(),
            "PDF page rendered"
        );

        Ok(svg)
    }
}

async fn read_output(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("pdftocairo produced no output at {}", path.display()))
}
