//! Integration tests for complete matte workflows
//!
//! These tests drive the public API end to end: encoded input in, encoded
//! output out, through files, memory, base64 and async readers.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use pixelforge_matte::{
    config::{MatteConfig, OutputFormat},
    error::Result,
    extract_matte_from_bytes, extract_matte_from_reader, remove_green_background_base64,
    Base64Codec, ImageIOService, MatteProcessor,
};
use std::path::PathBuf;
use tempfile::TempDir;

const SUBJECT: [u8; 4] = [180, 60, 40, 255];

/// A 16x16 sprite on a slightly drifting green backdrop
fn create_sprite() -> DynamicImage {
    let image = RgbaImage::from_fn(16, 16, |x, y| {
        if (5..11).contains(&x) && (4..12).contains(&y) {
            Rgba(SUBJECT)
        } else {
            let drift = ((x + y) % 8) as u8;
            Rgba([drift, 255 - drift * 3, drift, 255])
        }
    });
    DynamicImage::ImageRgba8(image)
}

fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}

fn write_fixture(dir: &TempDir, name: &str, format: ImageFormat) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, encode(&create_sprite(), format)).unwrap();
    path
}

fn assert_sprite_matte(image: &DynamicImage) {
    let rgba = image.to_rgba8();
    assert_eq!(rgba.dimensions(), (16, 16));
    assert_eq!(rgba.get_pixel(0, 0)[3], 0);
    assert_eq!(rgba.get_pixel(15, 15)[3], 0);
    assert_eq!(rgba.get_pixel(7, 7).0, SUBJECT);
}

#[test]
fn test_file_to_file_workflow() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir, "hero.png", ImageFormat::Png);
    let output = temp_dir.path().join("out").join("hero_matte.png");

    let processor = MatteProcessor::new(MatteConfig::default())?;
    let mut result = processor.process_file(&input)?;
    result.save_png(&output)?;

    assert_eq!(result.input_path.as_deref(), Some(input.to_str().unwrap()));
    assert_eq!(result.metadata.input_format, "png");
    assert_eq!(result.metadata.key_color, "#00FF00");

    let reloaded = ImageIOService::load_image(&output)?;
    assert_sprite_matte(&reloaded);
    Ok(())
}

#[test]
fn test_rgb_input_gains_alpha() -> Result<()> {
    let rgb = DynamicImage::ImageRgb8(create_sprite().to_rgb8());
    let result = extract_matte_from_bytes(&encode(&rgb, ImageFormat::Png), &MatteConfig::default())?;

    assert!(result.image.color().has_alpha());
    assert_sprite_matte(&result.image);
    Ok(())
}

#[test]
fn test_output_formats_preserve_alpha() -> Result<()> {
    let result = extract_matte_from_bytes(
        &encode(&create_sprite(), ImageFormat::Png),
        &MatteConfig::default(),
    )?;

    let tiff = result.to_bytes(OutputFormat::Tiff)?;
    assert_eq!(ImageIOService::detect_format(&tiff), Some("tiff"));
    assert_sprite_matte(&ImageIOService::load_from_memory(&tiff)?);

    let raw = result.to_bytes(OutputFormat::Rgba8)?;
    assert_eq!(raw.len(), 16 * 16 * 4);
    assert_eq!(raw[3], 0);

    Ok(())
}

#[cfg(feature = "webp-support")]
#[test]
fn test_webp_output_is_lossless() -> Result<()> {
    let result = extract_matte_from_bytes(
        &encode(&create_sprite(), ImageFormat::Png),
        &MatteConfig::default(),
    )?;

    let webp = result.to_bytes(OutputFormat::WebP)?;
    assert_eq!(ImageIOService::detect_format(&webp), Some("webp"));
    let decoded = ImageIOService::load_from_memory(&webp)?;
    assert_eq!(decoded.to_rgba8().get_pixel(7, 7).0, SUBJECT);
    Ok(())
}

#[test]
fn test_base64_workflow() -> Result<()> {
    let png = encode(&create_sprite(), ImageFormat::Png);

    // plain base64 in, plain base64 out
    let output = remove_green_background_base64(&Base64Codec::encode(&png))?;
    assert!(!output.starts_with("data:"));
    assert_sprite_matte(&ImageIOService::load_from_memory(&Base64Codec::decode(&output)?)?);

    // data URLs are accepted too
    let data_url = Base64Codec::to_data_url(&png, "image/png");
    let result = MatteProcessor::default().process_base64(&data_url)?;
    assert_sprite_matte(&result.image);

    let out_url = result.to_data_url(OutputFormat::Png)?;
    assert!(out_url.starts_with("data:image/png;base64,"));
    Ok(())
}

#[test]
fn test_statistics_and_timings_are_consistent() -> Result<()> {
    let result = extract_matte_from_bytes(
        &encode(&create_sprite(), ImageFormat::Png),
        &MatteConfig::default(),
    )?;

    let stats = result.statistics();
    assert_eq!(stats.total_pixels, 256);
    assert_eq!(stats.transparent_pixels, 256 - 48);
    assert_eq!(stats.removed_total(), stats.transparent_pixels);

    let timings = result.timings();
    assert!(timings.total_ms >= timings.matte_ms);
    assert!(timings.image_encode_ms.is_none());
    assert!(result.timing_summary().contains("Matte"));
    Ok(())
}

#[test]
fn test_dimensions_are_preserved() -> Result<()> {
    let wide = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 3, Rgba([0, 255, 0, 255])));
    let result = MatteProcessor::default().process_image(&wide)?;

    assert_eq!(result.dimensions(), (40, 3));
    assert_eq!(result.original_dimensions, (40, 3));
    assert_eq!(result.image.dimensions(), (40, 3));
    Ok(())
}

#[tokio::test]
async fn test_async_reader_workflow() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir, "sheet.png", ImageFormat::Png);

    let file = tokio::fs::File::open(&input).await?;
    let result = extract_matte_from_reader(file, &MatteConfig::default()).await?;

    assert_sprite_matte(&result.image);
    assert_eq!(result.metadata.input_format, "png");
    Ok(())
}

#[test]
fn test_processor_is_reusable_across_inputs() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();
    let processor = MatteProcessor::new(MatteConfig::builder().seed_stride(1).build()?)?;

    for name in ["a.png", "b.tiff"] {
        let format = if name.ends_with("png") {
            ImageFormat::Png
        } else {
            ImageFormat::Tiff
        };
        let input = write_fixture(&temp_dir, name, format);
        let result = processor.process_file(&input)?;
        assert_sprite_matte(&result.image);
    }
    Ok(())
}
