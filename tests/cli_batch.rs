//! CLI integration tests for batch processing
//!
//! Runs the compiled binary against temporary directories to verify output
//! naming, processing order, failure accounting and stdin/stdout handling.

#![cfg(feature = "cli")]

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use pixelforge_matte::{Base64Codec, ImageIOService};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn sprite_png() -> Vec<u8> {
    let image = RgbaImage::from_fn(12, 12, |x, y| {
        if (4..8).contains(&x) && (4..8).contains(&y) {
            Rgba([30, 30, 200, 255])
        } else {
            Rgba([0, 255, 0, 255])
        }
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode fixture");
    bytes
}

fn matte_command() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pixelforge-matte"));
    command.env_remove("RUST_LOG");
    command
}

fn run(args: &[&str]) -> Output {
    matte_command()
        .args(args)
        .output()
        .expect("Failed to run pixelforge-matte")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("Temp path is not UTF-8")
}

fn assert_is_matte(path: &Path) {
    let image = ImageIOService::load_image(path)
        .expect("Failed to load output")
        .to_rgba8();
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(image.get_pixel(5, 5).0, [30, 30, 200, 255]);
}

/// Test that a batch keeps going past a corrupt file and reports the failure
#[test]
fn test_cli_batch_continues_after_failure() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input_dir = temp_dir.path().join("sprites");
    std::fs::create_dir(&input_dir).unwrap();

    for name in ["c_slime.png", "a_knight.png", "b_potion.png"] {
        std::fs::write(input_dir.join(name), sprite_png()).unwrap();
    }
    std::fs::write(input_dir.join("broken.png"), b"not an image").unwrap();
    std::fs::write(input_dir.join("notes.txt"), b"ignored").unwrap();

    let output_dir = temp_dir.path().join("out");
    let output = run(&[path_arg(&input_dir), "-o", path_arg(&output_dir)]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "stderr: {}", stderr);
    assert!(stderr.contains("1 of 4 file(s) failed"), "stderr: {}", stderr);

    for stem in ["a_knight", "b_potion", "c_slime"] {
        assert_is_matte(&output_dir.join(format!("{}_matte.png", stem)));
    }
    assert!(!output_dir.join("broken_matte.png").exists());
    assert!(!output_dir.join("notes_matte.png").exists());
}

/// Test that the CLI processes files in alphanumerical order
#[test]
fn test_cli_batch_alphanumerical_order() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let names = ["img10.png", "img2.png", "z_last.png", "a_first.png", "img1.png"];
    for name in &names {
        std::fs::write(temp_dir.path().join(name), sprite_png()).unwrap();
    }

    let output = run(&[path_arg(temp_dir.path())]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr: {}", stderr);

    let expected = ["a_first.png", "img1.png", "img10.png", "img2.png", "z_last.png"];
    let positions: Vec<usize> = expected
        .iter()
        .map(|name| {
            stderr
                .find(&format!("{}: ", name))
                .unwrap_or_else(|| panic!("{} not reported in: {}", name, stderr))
        })
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "stderr: {}", stderr);

    // outputs land next to the inputs, and a second run skips them as inputs
    for name in &names {
        let stem = name.trim_end_matches(".png");
        assert!(temp_dir.path().join(format!("{}_matte.png", stem)).exists());
    }
    let rerun = run(&[path_arg(temp_dir.path())]);
    let rerun_stderr = String::from_utf8_lossy(&rerun.stderr);
    assert!(rerun.status.success());
    assert!(!rerun_stderr.contains("_matte_matte"));
}

#[test]
fn test_cli_single_file_with_options() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = temp_dir.path().join("hero.png");
    std::fs::write(&input, sprite_png()).unwrap();
    let target = temp_dir.path().join("nested").join("hero_cut.tiff");

    let output = run(&[
        path_arg(&input),
        "-o",
        path_arg(&target),
        "--format",
        "tiff",
        "--key-color",
        "#00FF00",
        "--seed-stride",
        "1",
    ]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_is_matte(&target);
}

#[test]
fn test_cli_stdin_base64_data_url() {
    let data_url = Base64Codec::to_data_url(&sprite_png(), "image/png");

    let mut child = matte_command()
        .args(["-", "--base64"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn pixelforge-matte");
    child
        .stdin
        .take()
        .expect("stdin not piped")
        .write_all(data_url.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("data:image/png;base64,"));

    let png = Base64Codec::decode(&stdout).unwrap();
    let image = ImageIOService::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(image.get_pixel(0, 0)[3], 0);
    assert_eq!(image.get_pixel(5, 5).0, [30, 30, 200, 255]);
}

#[test]
fn test_cli_rejects_invalid_arguments() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let input = temp_dir.path().join("hero.png");
    std::fs::write(&input, sprite_png()).unwrap();

    assert!(!run(&[path_arg(&input), "--base64"]).status.success());
    assert!(!run(&[path_arg(&input), "--key-color", "green"]).status.success());
    assert!(!run(&[path_arg(&input), "--seed-stride", "0"]).status.success());
    assert!(!run(&[path_arg(&input), "--format", "jpeg"]).status.success());
    assert!(!run(&[path_arg(&temp_dir.path().join("missing.png"))]).status.success());
}
