//! Output format handling service
//!
//! Maps `OutputFormat` to file extensions and MIME types so the CLI and the
//! result types agree on naming.

use crate::{
    config::OutputFormat,
    error::{MatteError, Result},
};

/// Service for handling output format naming
pub struct OutputFormatHandler;

impl OutputFormatHandler {
    /// Get the appropriate file extension for a given output format
    ///
    /// # Arguments
    /// * `format` - Output format
    ///
    /// # Returns
    /// String containing the file extension (without the dot)
    ///
    /// # Examples
    /// ```rust
    /// use pixelforge_matte::{services::OutputFormatHandler, OutputFormat};
    ///
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Png), "png");
    /// assert_eq!(OutputFormatHandler::get_extension(OutputFormat::Rgba8), "rgba");
    /// ```
    #[must_use]
    pub fn get_extension(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Rgba8 => "rgba",
        }
    }

    /// MIME type used for `data:` URLs
    #[must_use]
    pub fn mime_type(format: OutputFormat) -> &'static str {
        match format {
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
            OutputFormat::Tiff => "image/tiff",
            OutputFormat::Rgba8 => "application/octet-stream",
        }
    }

    /// Check if a format supports transparency (alpha channel)
    ///
    /// Every output format carries alpha; a matte without it is useless.
    #[must_use]
    pub fn supports_transparency(format: OutputFormat) -> bool {
        match format {
            OutputFormat::Png | OutputFormat::WebP | OutputFormat::Tiff | OutputFormat::Rgba8 => {
                true
            },
        }
    }

    /// Resolve an output format from a file extension or format name
    ///
    /// # Errors
    /// `UnsupportedFormat` for anything without alpha support (e.g. `jpg`)
    /// or unknown names.
    pub fn from_extension(extension: &str) -> Result<OutputFormat> {
        let ext = extension.trim_start_matches('.').to_lowercase();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "rgba" | "rgba8" | "raw" => Ok(OutputFormat::Rgba8),
            "jpg" | "jpeg" => Err(MatteError::unsupported_format(
                "JPEG has no alpha channel; use png, webp, tiff or rgba8",
            )),
            other => Err(MatteError::unsupported_format(format!(
                "Unknown output format '{}'",
                other
            ))),
        }
    }
}
