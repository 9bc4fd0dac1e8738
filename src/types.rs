//! Core types for matte extraction results

use crate::{
    config::OutputFormat,
    error::Result,
    matte::{Stage, StageOutcome},
    services::{Base64Codec, ImageIOService, OutputFormatHandler},
};
use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Result of a matte extraction
#[derive(Debug, Clone)]
pub struct MatteResult {
    /// The matted image (RGBA8)
    pub image: DynamicImage,

    /// Original image dimensions
    pub original_dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: MatteMetadata,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl MatteResult {
    /// Create a new matte result
    #[must_use]
    pub fn new(image: DynamicImage, original_dimensions: (u32, u32), metadata: MatteMetadata) -> Self {
        Self {
            image,
            original_dimensions,
            metadata,
            input_path: None,
        }
    }

    /// Save the result as PNG with alpha channel
    pub fn save_png<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.save(path, OutputFormat::Png)
    }

    /// Save in the specified format, creating parent directories as needed.
    ///
    /// Records the encode time in the result timings.
    pub fn save<P: AsRef<Path>>(&mut self, path: P, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        let encode_start = std::time::Instant::now();
        ImageIOService::save_image(&self.image, path, format)?;
        let encode_ms = encode_start.elapsed().as_millis() as u64;
        self.metadata.timings.image_encode_ms = Some(encode_ms);

        info!(
            input = self.input_path.as_deref().unwrap_or("input"),
            output = %path.display(),
            encode_ms,
            total_ms = self.metadata.timings.total_ms + encode_ms,
            "Matte saved"
        );
        Ok(())
    }

    /// Get the image as raw RGBA bytes
    #[must_use]
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.image.to_rgba8().into_raw()
    }

    /// Get the image as encoded bytes in the specified format
    pub fn to_bytes(&self, format: OutputFormat) -> Result<Vec<u8>> {
        ImageIOService::encode(&self.image, format)
    }

    /// Encode as PNG and return standard base64
    pub fn to_base64(&self) -> Result<String> {
        Ok(Base64Codec::encode(&self.to_bytes(OutputFormat::Png)?))
    }

    /// Encode in `format` and wrap it in a `data:` URL
    pub fn to_data_url(&self, format: OutputFormat) -> Result<String> {
        let bytes = self.to_bytes(format)?;
        Ok(Base64Codec::to_data_url(
            &bytes,
            OutputFormatHandler::mime_type(format),
        ))
    }

    /// Get image dimensions
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Per-stage pixel statistics
    #[must_use]
    pub fn statistics(&self) -> &MatteStatistics {
        &self.metadata.statistics
    }

    /// Get detailed timing breakdown
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }

    /// Get timing summary for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        let t = &self.metadata.timings;
        let breakdown = t.breakdown_percentages();

        let mut summary = format!(
            "Total: {}ms | Decode: {}ms ({:.1}%) | Matte: {}ms ({:.1}%)",
            t.total_ms, t.image_decode_ms, breakdown.decode_pct, t.matte_ms, breakdown.matte_pct,
        );

        if let Some(encode_ms) = t.image_encode_ms {
            summary.push_str(&format!(
                " | Encode: {}ms ({:.1}%)",
                encode_ms, breakdown.encode_pct
            ));
        }

        let other_ms = t.other_overhead_ms();
        if other_ms > 5 || breakdown.other_pct > 1.0 {
            summary.push_str(&format!(
                " | Other: {}ms ({:.1}%)",
                other_ms, breakdown.other_pct
            ));
        }

        summary
    }
}

/// Pixels removed by each stage of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatteStatistics {
    /// Cleared by the tight key match
    pub tight: usize,
    /// Cleared by the loose green match
    pub loose: usize,
    /// Cleared by the border flood fill
    pub flood: usize,
    /// Edge pixels dropped as severe spill
    pub despill_removed: usize,
    /// Edge pixels whose green was pulled down
    pub despill_desaturated: usize,
    /// Stray pixels dropped by the isolation cleanup
    pub cleanup: usize,
    pub total_pixels: usize,
    /// Fully transparent pixels after the run, including ones transparent on input
    pub transparent_pixels: usize,
}

impl MatteStatistics {
    #[must_use]
    pub fn new(total_pixels: usize) -> Self {
        Self {
            total_pixels,
            ..Self::default()
        }
    }

    /// Add a stage outcome to the matching counter
    pub fn record(&mut self, outcome: StageOutcome) {
        match outcome.stage {
            Stage::TightMatch => self.tight += outcome.cleared,
            Stage::LooseMatch => self.loose += outcome.cleared,
            Stage::FloodFill => self.flood += outcome.cleared,
            Stage::Despill => {
                self.despill_removed += outcome.cleared;
                self.despill_desaturated += outcome.desaturated;
            },
            Stage::IsolatedCleanup => self.cleanup += outcome.cleared,
        }
    }

    /// Pixels cleared by the pipeline itself
    #[must_use]
    pub fn removed_total(&self) -> usize {
        self.tight + self.loose + self.flood + self.despill_removed + self.cleanup
    }

    /// Share of the image that ended up transparent, 0.0 for an empty image
    #[must_use]
    pub fn transparency_ratio(&self) -> f64 {
        if self.total_pixels == 0 {
            0.0
        } else {
            self.transparent_pixels as f64 / self.total_pixels as f64
        }
    }
}

/// Detailed timing breakdown for matte extraction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Image decoding (bytes, file or base64)
    pub image_decode_ms: u64,

    /// All five pipeline stages
    pub matte_ms: u64,

    /// Final image encoding (if saved or encoded)
    pub image_encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn measured_ms(&self) -> u64 {
        self.image_decode_ms + self.matte_ms + self.image_encode_ms.unwrap_or(0)
    }

    /// Get breakdown percentages
    #[must_use]
    pub fn breakdown_percentages(&self) -> TimingBreakdown {
        if self.total_ms == 0 {
            return TimingBreakdown::default();
        }

        let total = self.total_ms as f64;
        TimingBreakdown {
            decode_pct: (self.image_decode_ms as f64 / total) * 100.0,
            matte_pct: (self.matte_ms as f64 / total) * 100.0,
            encode_pct: (self.image_encode_ms.unwrap_or(0) as f64 / total) * 100.0,
            other_pct: (self.other_overhead_ms() as f64 / total) * 100.0,
        }
    }

    /// Get the "other" overhead time (unaccounted time)
    #[must_use]
    pub fn other_overhead_ms(&self) -> u64 {
        self.total_ms.saturating_sub(self.measured_ms())
    }
}

/// Percentage breakdown of timing phases
#[derive(Debug, Clone, Default)]
pub struct TimingBreakdown {
    pub decode_pct: f64,
    pub matte_pct: f64,
    pub encode_pct: f64,
    pub other_pct: f64,
}

/// Metadata about the processing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatteMetadata {
    /// Per-stage pixel statistics
    pub statistics: MatteStatistics,

    /// Detailed timing breakdown
    pub timings: ProcessingTimings,

    /// Key color as `#RRGGBB`
    pub key_color: String,

    /// Input image format
    pub input_format: String,

    /// When the matte was produced
    pub processed_at: DateTime<Utc>,
}

impl MatteMetadata {
    #[must_use]
    pub fn new(key_color: String) -> Self {
        Self {
            statistics: MatteStatistics::default(),
            timings: ProcessingTimings::new(),
            key_color,
            input_format: "unknown".to_string(),
            processed_at: Utc::now(),
        }
    }
}
