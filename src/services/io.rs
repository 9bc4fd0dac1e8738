//! Image I/O operations service
//!
//! Decoding and encoding live here so the matte pipeline only ever sees an
//! owned RGBA buffer.

use crate::{
    config::OutputFormat,
    error::{MatteError, Result},
};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Service for handling image file input/output operations
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path
    ///
    /// Extension-based detection is tried first; when that fails the file
    /// content is sniffed instead, so a PNG saved as `.jpg` still loads.
    ///
    /// # Arguments
    /// * `path` - Path to the image file
    ///
    /// # Returns
    /// * `Ok(DynamicImage)` - Successfully loaded image
    /// * `Err(MatteError)` - Missing file or undecodable content
    ///
    /// # Examples
    /// ```rust,no_run
    /// use pixelforge_matte::services::ImageIOService;
    ///
    /// let image = ImageIOService::load_image("sprite.png")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(MatteError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                debug!(
                    path = %path_ref.display(),
                    error = %e,
                    "Extension-based loading failed, attempting content-based detection"
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    MatteError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    let extension = path_ref
                        .extension()
                        .and_then(|s| s.to_str())
                        .unwrap_or("unknown");

                    MatteError::processing_stage_error(
                        "image loading",
                        &format!(
                            "Failed to load image with both extension-based ({}) and content-based detection. Extension error: {}. Content error: {}",
                            extension, e, content_err
                        ),
                        Some(&format!("path: {}, size: {} bytes", path_ref.display(), data.len())),
                    )
                })
            },
        }
    }

    /// Decode an image held in memory
    ///
    /// # Arguments
    /// * `bytes` - Encoded image data (PNG, JPEG, WebP, TIFF)
    ///
    /// # Returns
    /// * `Ok(DynamicImage)` - Successfully decoded image
    /// * `Err(MatteError)` - Empty input or undecodable content
    pub fn load_from_memory(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(MatteError::decode("Image data is empty"));
        }

        image::load_from_memory(bytes).map_err(|e| {
            MatteError::processing_stage_error(
                "image decoding",
                &e.to_string(),
                Some(&format!(
                    "{} bytes, detected format: {}",
                    bytes.len(),
                    Self::detect_format(bytes).unwrap_or("unknown")
                )),
            )
        })
    }

    /// Encode an image in the given output format.
    ///
    /// Every format keeps the alpha channel. `Rgba8` yields the raw pixel
    /// bytes without any header.
    pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let image_format = match format {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::WebP => Self::webp_format()?,
            OutputFormat::Rgba8 => return Ok(image.to_rgba8().into_raw()),
        };

        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        let mut buffer = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut buffer), image_format)
            .map_err(|e| {
                MatteError::processing_stage_error(
                    "image encoding",
                    &format!("Failed to encode as {}: {}", format, e),
                    None,
                )
            })?;
        Ok(buffer)
    }

    #[cfg(feature = "webp-support")]
    fn webp_format() -> Result<ImageFormat> {
        Ok(ImageFormat::WebP)
    }

    #[cfg(not(feature = "webp-support"))]
    fn webp_format() -> Result<ImageFormat> {
        Err(MatteError::unsupported_format(
            "WebP output requires the `webp-support` feature",
        ))
    }

    /// Save an image to a file in the specified format
    ///
    /// Parent directories are created as needed.
    ///
    /// # Arguments
    /// * `image` - The image to save
    /// * `path` - Output file path
    /// * `format` - Output format specification
    ///
    /// # Examples
    /// ```rust,no_run
    /// use pixelforge_matte::{services::ImageIOService, OutputFormat};
    /// use image::DynamicImage;
    ///
    /// # let image = DynamicImage::new_rgba8(16, 16);
    /// ImageIOService::save_image(&image, "out/sprite.png", OutputFormat::Png)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn save_image<P: AsRef<Path>>(
        image: &DynamicImage,
        path: P,
        format: OutputFormat,
    ) -> Result<()> {
        let path_ref = path.as_ref();

        if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| MatteError::file_io_error("create output directory", parent, &e))?;
        }

        let bytes = Self::encode(image, format)?;
        std::fs::write(path_ref, bytes)
            .map_err(|e| MatteError::file_io_error("write image", path_ref, &e))?;

        debug!(path = %path_ref.display(), %format, "Image saved");
        Ok(())
    }

    /// Check if a file path has a supported input extension
    pub fn is_supported_format<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "jpg" | "jpeg" | "png" | "webp" | "tiff" | "tif"
                )
            })
    }

    /// Identify an encoded image from its magic bytes
    ///
    /// Returns the conventional file extension, or `None` when unrecognized.
    #[must_use]
    pub fn detect_format(data: &[u8]) -> Option<&'static str> {
        const PNG: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

        if data.starts_with(&PNG) {
            return Some("png");
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("jpg");
        }
        if data.len() >= 12 && data.starts_with(b"RIFF") && data.get(8..12) == Some(&b"WEBP"[..]) {
            return Some("webp");
        }
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00]) || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("tiff");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn sample_image() -> DynamicImage {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([200, 30, 30, 255]));
        image.put_pixel(0, 0, Rgba([0, 255, 0, 0]));
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn test_is_supported_format() {
        assert!(ImageIOService::is_supported_format("test.jpg"));
        assert!(ImageIOService::is_supported_format("test.PNG"));
        assert!(ImageIOService::is_supported_format("test.webp"));
        assert!(ImageIOService::is_supported_format("test.tif"));

        assert!(!ImageIOService::is_supported_format("test.txt"));
        assert!(!ImageIOService::is_supported_format("test"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ImageIOService::load_image("nonexistent.png");
        assert!(result.is_err());

        if let Err(e) = result {
            assert!(e.to_string().contains("does not exist"));
        }
    }

    #[test]
    fn test_load_with_wrong_extension_falls_back_to_content() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("actually_png.jpg");
        let png = ImageIOService::encode(&sample_image(), OutputFormat::Png).unwrap();
        std::fs::write(&path, png).unwrap();

        let loaded = ImageIOService::load_image(&path).unwrap();
        assert_eq!(loaded.to_rgba8().dimensions(), (3, 2));
    }

    #[test]
    fn test_save_image_creates_directory() {
        let temp_dir = tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dir").join("test.png");

        let result = ImageIOService::save_image(&sample_image(), &nested_path, OutputFormat::Png);

        assert!(result.is_ok());
        assert!(nested_path.exists());
    }

    #[test]
    fn test_png_round_trip_keeps_alpha() {
        let bytes = ImageIOService::encode(&sample_image(), OutputFormat::Png).unwrap();
        let decoded = ImageIOService::load_from_memory(&bytes).unwrap().to_rgba8();

        assert_eq!(decoded.get_pixel(0, 0), &Rgba([0, 255, 0, 0]));
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([200, 30, 30, 255]));
    }

    #[test]
    fn test_save_image_rgba8_format() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("test.rgba");

        ImageIOService::save_image(&sample_image(), &path, OutputFormat::Rgba8).unwrap();

        // 3x2 pixels * 4 bytes per pixel
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 24);
        assert_eq!(&data[..4], &[0, 255, 0, 0]);
    }

    #[test]
    fn test_tiff_encoding() {
        let bytes = ImageIOService::encode(&sample_image(), OutputFormat::Tiff).unwrap();
        assert_eq!(ImageIOService::detect_format(&bytes), Some("tiff"));
    }

    #[cfg(feature = "webp-support")]
    #[test]
    fn test_webp_encoding_is_lossless() {
        let bytes = ImageIOService::encode(&sample_image(), OutputFormat::WebP).unwrap();
        assert_eq!(ImageIOService::detect_format(&bytes), Some("webp"));

        let decoded = ImageIOService::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([200, 30, 30, 255]));
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ImageIOService::detect_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Some("png")
        );
        assert_eq!(ImageIOService::detect_format(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("jpg"));
        assert_eq!(ImageIOService::detect_format(b"RIFF\0\0\0\0WEBPVP8L"), Some("webp"));
        assert_eq!(ImageIOService::detect_format(b"GIF89a"), None);
        assert_eq!(ImageIOService::detect_format(&[]), None);
    }

    #[test]
    fn test_load_from_memory_rejects_garbage() {
        assert!(matches!(
            ImageIOService::load_from_memory(&[]),
            Err(MatteError::Decode(_))
        ));
        assert!(matches!(
            ImageIOService::load_from_memory(b"definitely not an image"),
            Err(MatteError::Processing(_))
        ));
    }
}
