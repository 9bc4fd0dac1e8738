#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # PixelForge Matte
//!
//! Chroma-key background extraction for generated pixel-art sprites.
//!
//! Image generators are asked to paint sprites on a flat `#00FF00` backdrop. Their
//! output is never perfectly flat: the backdrop drifts in tone, edges pick up green
//! halos, and a few stray pixels survive. This crate turns such an image into an
//! RGBA sprite with a clean transparent background by running five passes in order:
//!
//! 1. **Tight match**: clears pixels within a small distance of the key color
//! 2. **Loose match**: clears strongly green-dominant pixels
//! 3. **Flood fill**: clears the green region connected to the image border
//! 4. **Despill**: removes or desaturates green fringes next to transparency
//! 5. **Cleanup**: clears isolated greenish pixels surrounded by transparency
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pixelforge_matte::{MatteConfig, MatteProcessor, OutputFormat};
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = MatteConfig::builder()
//!     .seed_stride(1)
//!     .output_format(OutputFormat::Png)
//!     .build()?;
//! let processor = MatteProcessor::new(config)?;
//!
//! let mut result = processor.process_file("knight.png")?;
//! result.save_png("knight_matte.png")?;
//! println!("{}", result.timing_summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Library vs CLI Usage
//!
//! - **Library Usage**: the pipeline, processor, and I/O services are always available
//! - **CLI Usage**: the `cli` feature adds the `pixelforge-matte` binary and tracing setup
//!
//! ### Feature Flags
//!
//! - `cli` (default): Command-line interface, progress bar, and subscriber setup
//! - `webp-support` (default): lossless WebP output
//! - `tracing-json`: JSON log output for the CLI
//! - `tracing-files`: log file output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! pixelforge-matte = { version = "0.1", default-features = false }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod matte;
pub mod processor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Internal imports for lib functions
use tokio::io::AsyncRead;

// Public API exports
pub use config::{MatteConfig, MatteConfigBuilder, OutputFormat};
pub use error::{MatteError, Result};
pub use matte::{
    apply_stage,
    buffer::RasterBuffer,
    color::{KeyColor, CHROMA_GREEN_HEX},
    extract_matte, Stage, StageOutcome,
};
pub use processor::MatteProcessor;
pub use services::{Base64Codec, ImageIOService, OutputFormatHandler};
pub use types::{MatteMetadata, MatteResult, MatteStatistics, ProcessingTimings, TimingBreakdown};

#[cfg(feature = "cli")]
pub use tracing_config::{
    events, init_cli_tracing, spans, TracingConfig, TracingFormat, TracingGuard, TracingOutput,
};

/// Extract the matte from a `DynamicImage` directly
///
/// The input is converted to RGBA8; its own alpha channel is kept, so already
/// transparent pixels count as background for the later passes.
///
/// # Examples
///
/// ```rust
/// use image::{DynamicImage, Rgba, RgbaImage};
/// use pixelforge_matte::{extract_matte_from_image, MatteConfig};
///
/// let img = RgbaImage::from_pixel(8, 8, Rgba([0, 255, 0, 255]));
/// let result = extract_matte_from_image(&DynamicImage::ImageRgba8(img), &MatteConfig::default()).unwrap();
/// assert_eq!(result.statistics().transparent_pixels, 64);
/// ```
pub fn extract_matte_from_image(
    image: &image::DynamicImage,
    config: &MatteConfig,
) -> Result<MatteResult> {
    MatteProcessor::new(config.clone())?.process_image(image)
}

/// Extract the matte from encoded image bytes (PNG, JPEG, WebP, TIFF)
///
/// # Examples
///
/// ```rust,no_run
/// use pixelforge_matte::{extract_matte_from_bytes, MatteConfig, OutputFormat};
///
/// # fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let result = extract_matte_from_bytes(&upload, &MatteConfig::default())?;
/// let png = result.to_bytes(OutputFormat::Png)?;
/// # Ok(())
/// # }
/// ```
pub fn extract_matte_from_bytes(image_bytes: &[u8], config: &MatteConfig) -> Result<MatteResult> {
    MatteProcessor::new(config.clone())?.process_bytes(image_bytes)
}

/// Extract the matte from an async reader stream
///
/// The whole stream is buffered before decoding.
///
/// ```rust,no_run
/// use pixelforge_matte::{extract_matte_from_reader, MatteConfig};
/// use tokio::fs::File;
///
/// # async fn example() -> anyhow::Result<()> {
/// let file = File::open("sheet.png").await?;
/// let mut result = extract_matte_from_reader(file, &MatteConfig::default()).await?;
/// result.save_png("sheet_matte.png")?;
/// # Ok(())
/// # }
/// ```
pub async fn extract_matte_from_reader<R: AsyncRead + Unpin>(
    reader: R,
    config: &MatteConfig,
) -> Result<MatteResult> {
    MatteProcessor::new(config.clone())?
        .process_reader(reader)
        .await
}

/// Base64 PNG in, base64 PNG out, keyed on `#00FF00`
///
/// Accepts raw base64 or a `data:image/...;base64,` URL. The output is plain
/// base64 without a data URL prefix.
pub fn remove_green_background_base64(data: &str) -> Result<String> {
    let processor = MatteProcessor::new(MatteConfig::default())?;
    processor.process_base64(data)?.to_base64()
}
