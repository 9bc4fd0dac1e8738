//! Matte processor
//!
//! `MatteProcessor` wraps the pipeline with decoding, timing and metadata so
//! the library functions and the CLI share one code path.

use crate::{
    config::MatteConfig,
    error::{MatteError, Result},
    matte::{buffer::RasterBuffer, extract_matte},
    services::{Base64Codec, ImageIOService},
    types::{MatteMetadata, MatteResult, ProcessingTimings},
};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, span, Level};

/// Runs the matte pipeline against decoded or encoded input
#[derive(Debug, Clone, Default)]
pub struct MatteProcessor {
    config: MatteConfig,
}

impl MatteProcessor {
    /// Create a processor for a configuration
    ///
    /// # Errors
    /// Returns `MatteError::InvalidConfig` when the configuration fails validation.
    pub fn new(config: MatteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &MatteConfig {
        &self.config
    }

    /// Matte an already decoded image
    ///
    /// The input is converted to RGBA8; the result has the same dimensions
    /// and differs only in alpha and despilled green.
    #[instrument(
        skip(self, image),
        fields(
            key = %self.config.key_color,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn process_image(&self, image: &DynamicImage) -> Result<MatteResult> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::new();
        self.run_pipeline(image, "unknown", &mut timings, total_start)
    }

    /// Decode and matte an encoded image held in memory
    ///
    /// # Errors
    /// Returns `MatteError` when the bytes cannot be decoded.
    #[instrument(skip(self, image_bytes), fields(size_bytes = image_bytes.len()))]
    pub fn process_bytes(&self, image_bytes: &[u8]) -> Result<MatteResult> {
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::new();

        let decode_start = Instant::now();
        let image = ImageIOService::load_from_memory(image_bytes)?;
        timings.image_decode_ms = decode_start.elapsed().as_millis() as u64;

        let input_format = ImageIOService::detect_format(image_bytes).unwrap_or("unknown");
        self.run_pipeline(&image, input_format, &mut timings, total_start)
    }

    /// Load and matte an image file
    ///
    /// # Errors
    /// Returns `MatteError` for missing files or undecodable content.
    #[instrument(skip(self, input_path), fields(path = %input_path.as_ref().display()))]
    pub fn process_file<P: AsRef<Path>>(&self, input_path: P) -> Result<MatteResult> {
        let input_path = input_path.as_ref();
        let total_start = Instant::now();
        let mut timings = ProcessingTimings::new();

        let decode_start = Instant::now();
        let image = ImageIOService::load_image(input_path)?;
        timings.image_decode_ms = decode_start.elapsed().as_millis() as u64;

        let input_format = input_path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or_else(|| "unknown".to_string(), str::to_lowercase);

        let mut result = self.run_pipeline(&image, &input_format, &mut timings, total_start)?;
        result.input_path = Some(input_path.display().to_string());
        Ok(result)
    }

    /// Decode a base64 payload or `data:` URL and matte it
    ///
    /// # Errors
    /// Returns `MatteError::Decode` for malformed base64, or a decoding error
    /// when the payload is not an image.
    pub fn process_base64(&self, data: &str) -> Result<MatteResult> {
        let bytes = Base64Codec::decode(data)?;
        self.process_bytes(&bytes)
    }

    /// Read an async stream to the end, then matte it
    ///
    /// # Errors
    /// Returns `MatteError` for read failures or undecodable content.
    pub async fn process_reader<R: tokio::io::AsyncRead + Unpin>(
        &self,
        mut reader: R,
    ) -> Result<MatteResult> {
        use tokio::io::AsyncReadExt;

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| MatteError::processing(format!("Failed to read from stream: {}", e)))?;
        self.process_bytes(&bytes)
    }

    fn run_pipeline(
        &self,
        image: &DynamicImage,
        input_format: &str,
        timings: &mut ProcessingTimings,
        total_start: Instant,
    ) -> Result<MatteResult> {
        let original_dimensions = image.dimensions();
        let mut buffer = RasterBuffer::from_dynamic(image);

        let matte_start = Instant::now();
        let statistics = {
            let _span = span!(
                Level::DEBUG,
                "matte",
                width = original_dimensions.0,
                height = original_dimensions.1
            )
            .entered();
            extract_matte(&mut buffer, &self.config)
        };
        timings.matte_ms = matte_start.elapsed().as_millis() as u64;
        timings.total_ms = total_start.elapsed().as_millis() as u64;

        debug!(
            tight = statistics.tight,
            loose = statistics.loose,
            flood = statistics.flood,
            despill_removed = statistics.despill_removed,
            despill_desaturated = statistics.despill_desaturated,
            cleanup = statistics.cleanup,
            "Stage breakdown"
        );
        info!(
            removed = statistics.removed_total(),
            transparency = %format!("{:.1}%", statistics.transparency_ratio() * 100.0),
            total_ms = timings.total_ms,
            "Matte complete"
        );

        let mut metadata = MatteMetadata::new(self.config.key_color.to_hex());
        metadata.statistics = statistics;
        metadata.timings = timings.clone();
        metadata.input_format = input_format.to_string();

        Ok(MatteResult::new(
            DynamicImage::ImageRgba8(buffer.into_image()),
            original_dimensions,
            metadata,
        ))
    }
}
