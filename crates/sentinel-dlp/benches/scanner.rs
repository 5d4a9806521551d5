//! Payload scanning benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sentinel_common::PolicyStore;
use sentinel_dlp::SensitiveDataScanner;

fn scanner() -> SensitiveDataScanner {
    let policy = PolicyStore::builtin().expect("builtin policy");
    SensitiveDataScanner::from_policy(&policy).expect("builtin patterns")
}

fn scan_benchmark(c: &mut Criterion) {
    let scanner = scanner();
    let mut group = c.benchmark_group("scan");

    group.bench_function("clean", |b| {
        b.iter(|| scanner.scan(black_box("Summarize the quarterly roadmap for the team")))
    });

    group.bench_function("sensitive", |b| {
        b.iter(|| {
            scanner.scan(black_box(
                "Wire €1,250,000.00 to NL91ABNA0417164300, confirm with ops@bank.example",
            ))
        })
    });

    group.finish();
}

fn scan_scaling_benchmark(c: &mut Criterion) {
    let scanner = scanner();
    let mut group = c.benchmark_group("scan_scaling");

    for size in [1_024usize, 16_384, 131_072].iter() {
        let payload = "lorem ipsum dolor sit amet ".repeat(size / 27 + 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| scanner.scan(black_box(payload)))
        });
    }

    group.finish();
}

criterion_group!(benches, scan_benchmark, scan_scaling_benchmark);
criterion_main!(benches);
