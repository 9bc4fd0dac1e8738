//! Configuration types for matte extraction

use crate::error::{MatteError, Result};
use crate::matte::color::{KeyColor, MAX_RGB_DISTANCE};
use crate::matte::flood_fill::DEFAULT_SEED_STRIDE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output image format options. All of them keep the alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG with alpha channel transparency
    #[default]
    Png,
    /// Lossless WebP with alpha (needs the `webp-support` feature)
    WebP,
    /// TIFF with alpha channel transparency
    Tiff,
    /// Raw RGBA8 pixel data (4 bytes per pixel)
    Rgba8,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "png"),
            Self::WebP => write!(f, "webp"),
            Self::Tiff => write!(f, "tiff"),
            Self::Rgba8 => write!(f, "rgba8"),
        }
    }
}

/// Configuration for matte extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatteConfig {
    /// Backdrop color the generator was asked to paint
    pub key_color: KeyColor,

    /// Distance to the key below which the tight pass clears a pixel
    pub tight_tolerance: f32,

    /// Distance to the key below which the flood fill clears a pixel
    pub flood_tolerance: f32,

    /// Spacing of flood-fill seeds along the border (1 = every border pixel)
    pub seed_stride: u32,

    /// Output format
    pub output_format: OutputFormat,

    /// Enable debug mode (per-stage logging)
    pub debug: bool,
}

impl Default for MatteConfig {
    fn default() -> Self {
        Self {
            key_color: KeyColor::CHROMA_GREEN,
            tight_tolerance: 50.0,
            flood_tolerance: 100.0,
            seed_stride: DEFAULT_SEED_STRIDE,
            output_format: OutputFormat::default(),
            debug: false,
        }
    }
}

impl MatteConfig {
    /// Create a new configuration builder
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pixelforge_matte::{KeyColor, MatteConfig, OutputFormat};
    ///
    /// let config = MatteConfig::builder()
    ///     .key_color(KeyColor::new(255, 0, 255))
    ///     .seed_stride(1)
    ///     .output_format(OutputFormat::Tiff)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.seed_stride, 1);
    /// ```
    #[must_use]
    pub fn builder() -> MatteConfigBuilder {
        MatteConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    /// - File cannot be read
    /// - JSON is malformed or the key color is not `#RRGGBB`
    /// - Values fail [`MatteConfig::validate`]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MatteError::file_io_error("read config file", path, &e))?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON string
    ///
    /// # Errors
    /// Malformed JSON or invalid values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MatteError::invalid_config(format!("Malformed config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Validation Rules
    ///
    /// - Tolerances: finite, 0 to 441.7 (the largest RGB distance)
    /// - Seed stride: at least 1
    ///
    /// # Errors
    /// Returns `MatteError::InvalidConfig` naming the offending parameter.
    pub fn validate(&self) -> Result<()> {
        Self::validate_tolerance("tight tolerance", self.tight_tolerance, 50.0)?;
        Self::validate_tolerance("flood tolerance", self.flood_tolerance, 100.0)?;

        if self.seed_stride == 0 {
            return Err(MatteError::config_value_error(
                "seed stride",
                self.seed_stride,
                ">= 1",
                Some(DEFAULT_SEED_STRIDE),
            ));
        }

        Ok(())
    }

    fn validate_tolerance(name: &str, value: f32, recommended: f32) -> Result<()> {
        if !value.is_finite() || !(0.0..=MAX_RGB_DISTANCE).contains(&value) {
            return Err(MatteError::config_value_error(
                name,
                value,
                "0-441.7",
                Some(recommended),
            ));
        }
        Ok(())
    }
}

/// Builder for `MatteConfig`
#[derive(Debug, Default)]
pub struct MatteConfigBuilder {
    config: MatteConfig,
}

impl MatteConfigBuilder {
    #[must_use]
    pub fn key_color(mut self, key_color: KeyColor) -> Self {
        self.config.key_color = key_color;
        self
    }

    #[must_use]
    pub fn tight_tolerance(mut self, tolerance: f32) -> Self {
        self.config.tight_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn flood_tolerance(mut self, tolerance: f32) -> Self {
        self.config.flood_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn seed_stride(mut self, stride: u32) -> Self {
        self.config.seed_stride = stride;
        self
    }

    #[must_use]
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Tolerance outside 0-441.7 or not finite
    /// - Seed stride of zero
    pub fn build(self) -> Result<MatteConfig> {
        let config = self.config;
        config.validate()?;
        Ok(config)
    }
}
