use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{Rgba, RgbaImage};
use pixelforge_matte::{extract_matte, MatteConfig, RasterBuffer};

/// Sprite sheet sized input: drifting green backdrop with a grid of subjects
fn create_sheet(width: u32, height: u32) -> RasterBuffer {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let in_subject = (x % 64) > 16 && (x % 64) < 48 && (y % 64) > 16 && (y % 64) < 48;
        if in_subject {
            Rgba([170, 80 + (x % 40) as u8, 60, 255])
        } else {
            let drift = ((x / 7 + y / 5) % 24) as u8;
            Rgba([drift, 230 - drift, drift / 2, 255])
        }
    });
    RasterBuffer::new(image)
}

fn benchmark_seed_strides(c: &mut Criterion) {
    let mut group = c.benchmark_group("seed_stride");
    group.sample_size(10); // Reduce sample size for faster benchmarks

    for (label, size) in [("small_256x256", 256), ("large_1024x1024", 1024)] {
        let sheet = create_sheet(size, size);

        for stride in [1_u32, 10, 50] {
            let config = MatteConfig::builder()
                .seed_stride(stride)
                .build()
                .expect("Valid benchmark config");

            group.bench_with_input(
                BenchmarkId::new(format!("stride_{}", stride), label),
                &sheet,
                |b, sheet| {
                    b.iter(|| {
                        let mut buffer = sheet.clone();
                        black_box(extract_matte(&mut buffer, black_box(&config)))
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(seed_stride_benches, benchmark_seed_strides);
criterion_main!(seed_stride_benches);
