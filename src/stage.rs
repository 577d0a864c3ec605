//! Page processor: turns flagged page regions into positioned text cells.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::client::{BaiduOcrClient, RecognizeWords};
use crate::config::{BaiduOcrOptions, Credentials};
use crate::error::OcrError;
use crate::token::TokenCache;
use crate::types::{BoundingBox, RecognizedWord, TextCell};

/// Global switch for debug visualization of OCR regions and cells.
static VISUALIZE_OCR: AtomicBool = AtomicBool::new(false);

/// Enable or disable debug visualization for all stage instances.
pub fn set_visualize_ocr(enabled: bool) {
    VISUALIZE_OCR.store(enabled, Ordering::Relaxed);
}

fn visualize_ocr_enabled() -> bool {
    VISUALIZE_OCR.load(Ordering::Relaxed)
}

/// A page as seen by the OCR stage. The surrounding pipeline supplies
/// region enumeration, rendering, post-processing, and visualization;
/// the stage only orchestrates them.
pub trait OcrPage {
    /// Whether the page backend is usable. Invalid pages pass through
    /// the stage untouched.
    fn is_valid(&self) -> bool;

    /// Rectangular areas of this page flagged for recognition.
    fn ocr_regions(&self) -> Vec<BoundingBox>;

    /// Render the given region at `scale` times the page's native
    /// resolution.
    fn render_region(&self, region: &BoundingBox, scale: u32) -> Result<DynamicImage>;

    /// Receive the accumulated cells for post-processing. The page
    /// owns the cells afterwards.
    fn post_process_cells(&mut self, cells: Vec<TextCell>);

    /// Draw regions and cells for debugging. No-op by default.
    fn visualize_ocr(&self, _regions: &[BoundingBox], _cells: &[TextCell]) {}
}

/// OCR stage backed by the Baidu Cloud recognition service.
///
/// A disabled stage carries no client, resolves no credentials, and
/// passes every page through untouched.
pub struct BaiduOcrStage {
    client: Option<Box<dyn RecognizeWords>>,
    /// Render upscale factor: 3x turns a 72 dpi page into 216 dpi.
    scale: u32,
}

impl std::fmt::Debug for BaiduOcrStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaiduOcrStage")
            .field("enabled", &self.client.is_some())
            .field("scale", &self.scale)
            .finish()
    }
}

impl BaiduOcrStage {
    /// Build a stage using the process-wide token cache.
    ///
    /// When enabled, credentials are resolved synchronously here and a
    /// misconfiguration fails fast; no network traffic happens until
    /// the first region is recognized.
    pub fn new(enabled: bool, options: &BaiduOcrOptions) -> Result<Self, OcrError> {
        Self::with_token_cache(enabled, options, Arc::clone(TokenCache::global()))
    }

    /// Build a stage with an explicit token cache. Separate caches
    /// mean separate token lifecycles; production callers share the
    /// global one.
    pub fn with_token_cache(
        enabled: bool,
        options: &BaiduOcrOptions,
        token_cache: Arc<TokenCache>,
    ) -> Result<Self, OcrError> {
        let client = if enabled {
            let credentials = Credentials::resolve(options)?;
            Some(Box::new(BaiduOcrClient::new(credentials, options, token_cache)?)
                as Box<dyn RecognizeWords>)
        } else {
            None
        };

        Ok(Self { client, scale: 3 })
    }

    /// Build an enabled stage around a custom recognition backend.
    pub fn with_recognizer(recognizer: Box<dyn RecognizeWords>) -> Self {
        Self {
            client: Some(recognizer),
            scale: 3,
        }
    }

    /// Whether this stage performs recognition at all.
    pub fn enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Process one page: recognize every flagged region and hand the
    /// accumulated cells to the page for post-processing.
    ///
    /// A failed region logs a warning and contributes zero cells;
    /// remaining regions and pages are unaffected.
    pub fn process_page<P: OcrPage>(&self, page: &mut P) {
        let Some(client) = self.client.as_deref() else {
            return;
        };
        if !page.is_valid() {
            return;
        }

        let regions = page.ocr_regions();
        let mut all_cells: Vec<TextCell> = Vec::new();

        for region in &regions {
            // Degenerate regions are skipped before any rendering or
            // network traffic.
            if region.area() == 0.0 {
                debug!("skipping zero-area OCR region");
                continue;
            }

            match self.recognize_region(client, page, region) {
                Ok(cells) => all_cells.extend(cells),
                Err(e) => {
                    warn!("Baidu OCR call failed for region: {e:#}");
                }
            }
        }

        if visualize_ocr_enabled() {
            page.visualize_ocr(&regions, &all_cells);
        }

        page.post_process_cells(all_cells);
    }

    /// Process a batch of pages in order.
    pub fn process_batch<P: OcrPage>(&self, pages: &mut [P]) {
        for page in pages {
            self.process_page(page);
        }
    }

    fn recognize_region<P: OcrPage>(
        &self,
        client: &dyn RecognizeWords,
        page: &P,
        region: &BoundingBox,
    ) -> Result<Vec<TextCell>> {
        let rendered = page
            .render_region(region, self.scale)
            .context("failed to render OCR region")?;

        let mut png = Vec::new();
        rendered
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(OcrError::from)?;

        let words = client.recognize(&png)?;
        Ok(cells_from_words(&words, region))
    }
}

/// Map a region's word list to text cells.
///
/// The basic API tiers return no per-word geometry, so every cell
/// carries the full region rectangle, and no per-word confidence, so
/// confidence is fixed at 1.0. `index` is the word's position within
/// this region's result list; indices restart for every region.
fn cells_from_words(words: &[RecognizedWord], region: &BoundingBox) -> Vec<TextCell> {
    words
        .iter()
        .enumerate()
        .filter(|(_, word)| !word.words.trim().is_empty())
        .map(|(ix, word)| TextCell {
            index: ix,
            text: word.words.clone(),
            orig: word.words.clone(),
            from_ocr: true,
            confidence: 1.0,
            rect: *region,
        })
        .collect()
}
