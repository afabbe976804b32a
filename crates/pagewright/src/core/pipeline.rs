//! Page pipeline orchestration.
//!
//! One page flows through these stages:
//!
//! 1. Layout detection, region filtering and reading order
//! 2. Per-region crop, OCR, line ordering, script classification and plan (parallel)
//! 3. One handwriting-recognition batch for the whole page
//! 4. Per-region plan execution, validity check and vision fallback (parallel)
//! 5. Table reconstruction for `Table` regions
//! 6. Key-value extraction over the finished transcript, when enabled
//!
//! Model failures degrade the affected region only. The single terminal error is a
//! page image that cannot be read or decoded.

use crate::core::config::PipelineConfig;
use crate::core::progress::{PageProgress, ProgressObserver};
use crate::layout::{ClassThresholds, assemble_reading_order, filter_regions};
use crate::ocr::{
    CellReader, RecognitionPlan, Validated, cell_grid, join_lines, join_words, order_lines, patch_spans,
    recognize_batched, reconstruct_table, select_words, validate_or_fallback,
};
use crate::plugins::{Capabilities, VisionFallback};
use crate::text::HandwritingClassifier;
use crate::types::{
    FieldMap, LayoutClass, OrderedRegion, PageResult, PageTranscript, RegionTranscript, Script, TableGrid, TextSource,
    TextSpan,
};
use crate::utils::{crop_exact, crop_padded, decode_page, open_page};
use crate::{PagewrightError, Result};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;

/// Region state between analysis and plan execution.
struct PreparedRegion {
    region: OrderedRegion,
    crop: Option<DynamicImage>,
    spans: Vec<TextSpan>,
    script: Script,
    plan: RecognitionPlan,
    requests: Vec<DynamicImage>,
}

/// Document page pipeline bound to a configuration and a set of capabilities.
///
/// # Example
///
/// ```rust,no_run
/// # use pagewright::{Capabilities, PagePipeline, PipelineConfig};
/// # fn capabilities() -> Capabilities { unimplemented!() }
/// # fn main() -> pagewright::Result<()> {
/// let pipeline = PagePipeline::new(PipelineConfig::default(), capabilities())?;
/// let page = pipeline.process_file("scan-001.png")?;
/// println!("{}", page.transcript.text());
/// # Ok(())
/// # }
/// ```
pub struct PagePipeline {
    config: PipelineConfig,
    capabilities: Capabilities,
    classifier: HandwritingClassifier,
    thresholds: ClassThresholds,
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for PagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagePipeline")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl PagePipeline {
    /// Validate `config` and build the region worker pool.
    pub fn new(config: PipelineConfig, capabilities: Capabilities) -> Result<Self> {
        config.validate()?;
        let thresholds = config.layout.class_thresholds()?;
        let classifier = config.classifier.classifier();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers)
            .thread_name(|i| format!("pagewright-region-{}", i))
            .build()
            .map_err(|e| PagewrightError::Other(format!("Failed to build region worker pool: {}", e)))?;

        if capabilities.vision.is_some() && config.vision.is_none() {
            tracing::debug!("vision fallback supplied but disabled in configuration");
        }
        if capabilities.key_values.is_some() && config.key_values.is_none() {
            tracing::debug!("key-value extractor supplied but disabled in configuration");
        }
        tracing::debug!(max_workers = config.max_workers, ?capabilities, "created page pipeline");
        Ok(Self {
            config,
            capabilities,
            classifier,
            thresholds,
            pool,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Decode and process an encoded page image.
    pub fn process_page(&self, bytes: &[u8]) -> Result<PageResult> {
        let image = decode_page(bytes)?;
        Ok(self.process_image(&image))
    }

    /// Read, decode and process a page image file.
    pub fn process_file(&self, path: impl AsRef<Path>) -> Result<PageResult> {
        let image = open_page(path)?;
        Ok(self.process_image(&image))
    }

    /// Process pages one at a time, in order.
    ///
    /// Each page yields its own result; a failed page does not stop the batch. The
    /// observer is called exactly once per page after it completes.
    pub fn process_files<P, O>(&self, paths: &[P], observer: &mut O) -> Vec<Result<PageResult>>
    where
        P: AsRef<Path>,
        O: ProgressObserver + ?Sized,
    {
        let total_pages = paths.len();
        let mut failed = 0usize;
        let results = paths
            .iter()
            .enumerate()
            .map(|(page_index, path)| {
                let result = self.process_file(path);
                if let Err(e) = &result {
                    failed += 1;
                    tracing::warn!(page_index, path = %path.as_ref().display(), error = %e, "page failed");
                }
                observer.on_page(PageProgress::new(page_index, total_pages));
                result
            })
            .collect();

        tracing::info!(total_pages, failed, "processed batch");
        results
    }

    /// Run the full pipeline on a decoded page. Never fails: model errors degrade to
    /// the best text available, and a failed layout detection yields an empty page.
    #[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn process_image(&self, image: &DynamicImage) -> PageResult {
        let layout = &self.config.layout;
        let detections = match self
            .capabilities
            .layout
            .detect(image, layout.detection_confidence, layout.detection_iou)
        {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!(model = self.capabilities.layout.name(), error = %e, "layout detection failed");
                return PageResult::default();
            }
        };

        let filtered = filter_regions(detections, &self.thresholds, layout.overlap_threshold);
        let ordered = assemble_reading_order(filtered, self.config.reading_order.region_grouping());
        if ordered.is_empty() {
            tracing::info!("no regions detected");
            return PageResult::default();
        }

        let mut prepared: Vec<PreparedRegion> = self
            .pool
            .install(|| ordered.into_par_iter().map(|region| self.prepare_region(image, region)).collect());

        let table_crops: Vec<DynamicImage> = if self.config.table.enabled && self.capabilities.structure.is_some() {
            prepared
                .iter()
                .filter(|p| p.region.detection.class == LayoutClass::Table)
                .filter_map(|p| p.crop.clone())
                .collect()
        } else {
            Vec::new()
        };

        let groups: Vec<Vec<DynamicImage>> = prepared.iter_mut().map(|p| std::mem::take(&mut p.requests)).collect();
        let recognized = recognize_batched(self.capabilities.handwriting.as_ref(), &groups);

        let regions: Vec<RegionTranscript> = self.pool.install(|| {
            prepared
                .into_par_iter()
                .zip(recognized.into_par_iter())
                .map(|(region, texts)| self.finalize_region(region, texts))
                .collect()
        });

        let tables: Vec<TableGrid> = self.pool.install(|| {
            table_crops
                .par_iter()
                .filter_map(|crop| self.reconstruct_table_region(crop))
                .collect()
        });

        let transcript = PageTranscript::from_regions(regions);
        let key_values = self.extract_key_values(&transcript);
        tracing::info!(
            regions = transcript.len(),
            tables = tables.len(),
            fields = key_values.as_ref().map_or(0, |f| f.len()),
            "processed page"
        );
        PageResult {
            transcript,
            tables,
            key_values,
        }
    }

    /// The vision fallback, when both configured and supplied.
    fn vision(&self) -> Option<&dyn VisionFallback> {
        self.config.vision.as_ref().and(self.capabilities.vision.as_deref())
    }

    fn extract_key_values(&self, transcript: &PageTranscript) -> Option<FieldMap> {
        self.config.key_values.as_ref()?;
        let extractor = self.capabilities.key_values.as_ref()?;
        if transcript.is_empty() {
            return None;
        }
        extractor.extract_fields(&transcript.text())
    }

    fn prepare_region(&self, page: &DynamicImage, region: OrderedRegion) -> PreparedRegion {
        let region_id = region.sequence_index;
        let Some((_, crop)) = crop_padded(page, &region.detection.bbox, self.config.layout.padding) else {
            tracing::warn!(region_id, "region lies outside the page, skipping");
            return PreparedRegion {
                region,
                crop: None,
                spans: Vec::new(),
                script: Script::Printed,
                plan: RecognitionPlan::AcceptAsIs,
                requests: Vec::new(),
            };
        };

        let spans = match self.capabilities.ocr.recognize(&crop) {
            Ok(spans) => order_lines(spans, self.config.reading_order.line_grouping()),
            Err(e) => {
                tracing::warn!(region_id, model = self.capabilities.ocr.name(), error = %e, "OCR failed");
                Vec::new()
            }
        };

        let texts: Vec<&str> = spans.iter().map(|s| s.text.as_str()).collect();
        let script = match self.classifier.classify(&texts, self.capabilities.tokenizer.as_ref()) {
            Ok(script) => script,
            Err(e) => {
                tracing::warn!(region_id, error = %e, "script classification failed, assuming printed");
                Script::Printed
            }
        };

        let plan = RecognitionPlan::decide(&spans, script, &self.config.reconciler);
        let requests = self.recognition_requests(region_id, &crop, &spans, &plan);
        tracing::debug!(
            region_id,
            class = %region.detection.class,
            spans = spans.len(),
            ?script,
            plan = plan.name(),
            requests = requests.len(),
            "prepared region"
        );

        PreparedRegion {
            region,
            crop: Some(crop),
            spans,
            script,
            plan,
            requests,
        }
    }

    /// Crops to send to the handwriting recognizer for this region.
    fn recognition_requests(
        &self,
        region_id: usize,
        crop: &DynamicImage,
        spans: &[TextSpan],
        plan: &RecognitionPlan,
    ) -> Vec<DynamicImage> {
        match plan {
            RecognitionPlan::AcceptAsIs => Vec::new(),
            RecognitionPlan::PatchSpans { low } => {
                low.iter().filter_map(|&i| crop_exact(crop, &spans[i].bbox)).collect()
            }
            RecognitionPlan::RecognizeRegion => {
                let Some(detector) = &self.capabilities.words else {
                    return vec![crop.clone()];
                };
                match detector.detect_words(crop) {
                    Ok(words) => {
                        let words = select_words(words, &self.config.reconciler, self.config.reading_order.region_grouping());
                        words.iter().filter_map(|w| crop_exact(crop, &w.bbox)).collect()
                    }
                    Err(e) => {
                        tracing::warn!(region_id, model = detector.name(), error = %e, "word detection failed");
                        Vec::new()
                    }
                }
            }
        }
    }

    fn finalize_region(&self, prepared: PreparedRegion, recognized: Option<Vec<String>>) -> RegionTranscript {
        let PreparedRegion {
            region,
            crop,
            spans,
            script,
            plan,
            ..
        } = prepared;
        let region_id = region.sequence_index;
        let ocr_text = join_lines(&spans);

        let (candidate, mut source) = match (&plan, recognized) {
            (RecognitionPlan::AcceptAsIs, _) => (ocr_text, TextSource::Ocr),
            (RecognitionPlan::PatchSpans { low }, Some(candidates)) if !candidates.is_empty() => (
                patch_spans(&spans, low, &candidates, self.config.reconciler.similarity_cutoff),
                TextSource::HandwritingPatch,
            ),
            (RecognitionPlan::RecognizeRegion, Some(words)) => {
                let text = join_words(&words);
                if text.is_empty() {
                    (ocr_text, TextSource::Ocr)
                } else {
                    (text, TextSource::RegionRecognition)
                }
            }
            (_, None) => {
                tracing::warn!(region_id, "handwriting recognition unavailable, keeping OCR text");
                (ocr_text, TextSource::Ocr)
            }
            (_, Some(_)) => (ocr_text, TextSource::Ocr),
        };

        let text = match &crop {
            Some(crop) => match validate_or_fallback(
                candidate,
                &self.capabilities.dictionary,
                self.config.reconciler.validity_threshold,
                self.vision(),
                crop,
            ) {
                Validated::Kept(text) => text,
                Validated::Replaced(text) => {
                    source = TextSource::VisionFallback;
                    text
                }
            },
            None => candidate,
        };
        if text.is_empty() {
            source = TextSource::Empty;
        }

        RegionTranscript {
            region_id,
            class: region.detection.class,
            bbox: region.detection.bbox,
            text,
            is_handwritten: script.is_handwritten(),
            source,
        }
    }

    fn reconstruct_table_region(&self, crop: &DynamicImage) -> Option<TableGrid> {
        let structure = self.capabilities.structure.as_ref()?;
        let detections = match structure.detect_structure(crop) {
            Ok(detections) => detections,
            Err(e) => {
                tracing::warn!(model = structure.name(), error = %e, "table structure detection failed");
                return None;
            }
        };

        let rows = cell_grid(
            &detections,
            self.config.table.structure_confidence,
            self.config.reading_order.region_grouping(),
        );
        if rows.is_empty() {
            tracing::debug!("table region has no cells");
            return None;
        }

        let reader = CellReader {
            ocr: self.capabilities.ocr.as_ref(),
            handwriting: self.capabilities.handwriting.as_ref(),
            tokenizer: self.capabilities.tokenizer.as_ref(),
            classifier: &self.classifier,
            line_grouping: self.config.reading_order.line_grouping(),
        };
        Some(reconstruct_table(crop, &rows, |cell| reader.read(cell)))
    }
}
