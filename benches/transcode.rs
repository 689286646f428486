use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use utf_d::{
    Base64Options, Codec, Endianness, LastChunkHandling, available_implementations,
    implementation_by_name,
};

const SIZES: [usize; 5] = [64, 256, 1024, 4096, 16384];

fn backends() -> Vec<&'static dyn Codec> {
    available_implementations()
        .filter_map(|d| implementation_by_name(d.name))
        .collect()
}

/// Mixed-script text of roughly `size` bytes.
fn sample_text(size: usize) -> Vec<u8> {
    let pattern = "The quick brown fox, der schnelle Fuchs, 素早い狐 🦊. ";
    let mut text: String = pattern.chars().cycle().take(size).collect();
    while text.len() > size {
        text.pop();
    }
    text.into_bytes()
}

fn bench_validate_utf8(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_utf8");

    for size in SIZES {
        let data = sample_text(size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        for codec in backends() {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &data, |b, data| {
                b.iter(|| codec.validate_utf8(black_box(data)));
            });
        }
    }
    group.finish();
}

fn bench_utf8_to_utf16(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf8_to_utf16");

    for size in SIZES {
        let data = sample_text(size);
        let mut output = vec![0u16; data.len()];
        group.throughput(Throughput::Bytes(data.len() as u64));
        for codec in backends() {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &data, |b, data| {
                b.iter(|| codec.convert_utf8_to_utf16(black_box(data), &mut output, Endianness::Little));
            });
        }
    }
    group.finish();
}

fn bench_utf16_to_utf8(c: &mut Criterion) {
    let mut group = c.benchmark_group("utf16_to_utf8");

    for size in SIZES {
        let text = String::from_utf8(sample_text(size)).unwrap_or_default();
        let data: Vec<u16> = text.encode_utf16().collect();
        let mut output = vec![0u8; data.len() * 3];
        group.throughput(Throughput::Bytes((data.len() * 2) as u64));
        for codec in backends() {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &data, |b, data| {
                b.iter(|| codec.convert_utf16_to_utf8(black_box(data), &mut output, Endianness::NATIVE));
            });
        }
    }
    group.finish();
}

fn bench_encode_base64(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_base64");

    for size in SIZES {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        let mut output = vec![0u8; utf_d::base64_length_from_binary(size, Base64Options::Default)];
        group.throughput(Throughput::Bytes(size as u64));
        for codec in backends() {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &data, |b, data| {
                b.iter(|| codec.binary_to_base64(black_box(data), &mut output, Base64Options::Default));
            });
        }
    }
    group.finish();
}

fn bench_decode_base64(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_base64");

    for size in SIZES {
        let data: Vec<u8> = (0..size).map(|i| (i % 256) as u8).collect();
        let mut encoded = vec![0u8; utf_d::base64_length_from_binary(size, Base64Options::Default)];
        utf_d::binary_to_base64(&data, &mut encoded, Base64Options::Default);
        let mut output = vec![0u8; utf_d::maximal_binary_length_from_base64(&encoded)];

        group.throughput(Throughput::Bytes(size as u64));
        for codec in backends() {
            group.bench_with_input(BenchmarkId::new(codec.name(), size), &encoded, |b, encoded| {
                b.iter(|| {
                    codec.base64_to_binary(
                        black_box(encoded),
                        &mut output,
                        Base64Options::Default,
                        LastChunkHandling::Loose,
                    )
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_validate_utf8,
    bench_utf8_to_utf16,
    bench_utf16_to_utf8,
    bench_encode_base64,
    bench_decode_base64
);
criterion_main!(benches);
