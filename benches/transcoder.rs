//! Transcoder benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use display_area::ansi::transcode;
use display_area::text::render_console_text;

fn bench_transcode_plain_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcoder");

    // Plain ASCII text
    let plain_text = "Hello, World! ".repeat(1000);
    group.throughput(Throughput::Bytes(plain_text.len() as u64));

    group.bench_function("plain_text", |b| b.iter(|| transcode(black_box(&plain_text))));

    group.finish();
}

fn bench_transcode_sgr(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcoder");

    // Base, 256-color and truecolor sequences
    let sgr_heavy =
        "\x1b[1;31mRed\x1b[0m \x1b[38;5;208mOrange\x1b[0m \x1b[48;2;10;20;30mBg\x1b[0m ".repeat(100);
    group.throughput(Throughput::Bytes(sgr_heavy.len() as u64));

    group.bench_function("sgr_sequences", |b| b.iter(|| transcode(black_box(&sgr_heavy))));

    group.finish();
}

fn bench_console_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("transcoder");

    // Progress bars and tracebacks with links
    let mixed = "\r 10%\r 50%\r100%\nLine: \x1b[32mOK\x1b[0m see https://example.org\n".repeat(200);
    group.throughput(Throughput::Bytes(mixed.len() as u64));

    group.bench_function("console_pipeline", |b| {
        b.iter(|| render_console_text(black_box(&mixed), true))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_transcode_plain_text,
    bench_transcode_sgr,
    bench_console_pipeline
);
criterion_main!(benches);
