use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use encimg::{image, pipeline, BufferManager};

fn no_progress(_: u8, _: encimg::Phase) {}

fn bench_encrypt_decrypt(c: &mut Criterion) {
    let buffer = BufferManager::default();
    let password = "correct horse battery staple";

    let mut group = c.benchmark_group("envelope");
    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let text = "a".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", size), &text, |b, text| {
            b.iter(|| {
                let envelope =
                    pipeline::encrypt_text(&buffer, black_box(text), black_box(password), 0, no_progress).unwrap();
                black_box(envelope);
            });
        });

        let envelope = pipeline::encrypt_text(&buffer, &text, password, 0, no_progress).unwrap();
        group.bench_with_input(BenchmarkId::new("decrypt", size), &envelope, |b, envelope| {
            b.iter(|| {
                let result = pipeline::decrypt_envelope(black_box(envelope), black_box(password), no_progress).unwrap();
                black_box(result);
            });
        });
    }
    group.finish();
}

fn bench_base64_png_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("image_codec");
    for size in [1024usize, 64 * 1024] {
        let base64_str = "A".repeat(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode_to_png", size), &base64_str, |b, s| {
            b.iter(|| {
                let png = image::encode_to_png(black_box(s)).unwrap();
                black_box(png);
            });
        });

        let png = image::encode_to_png(&base64_str).unwrap();
        group.bench_with_input(BenchmarkId::new("decode_from_png", size), &png, |b, png| {
            b.iter(|| {
                let decoded = image::decode_from_png(black_box(png)).unwrap();
                black_box(decoded);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encrypt_decrypt, bench_base64_png_codec);
criterion_main!(benches);
