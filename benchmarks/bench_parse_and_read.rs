use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use loyalty::generator::{generate_log_files, GeneratorConfig};
use loyalty::{
    identify_loyal_users, CancelContext, EntryParser, FastEntryParser, JsonEntryParser,
    ParallelReader, ReaderConfig,
};

const LINE: &[u8] =
    br#"{"userId":4821,"pageName":"dashboard","timestamp":"2024-10-01T13:45:12Z"}"#;

fn bench_fast_parser(c: &mut Criterion) {
    let parser = FastEntryParser::new();
    c.bench_function("parse_fast", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(LINE)).ok());
        });
    });
}

fn bench_json_parser(c: &mut Criterion) {
    let parser = JsonEntryParser::new();
    c.bench_function("parse_json", |b| {
        b.iter(|| {
            black_box(parser.parse(black_box(LINE)).ok());
        });
    });
}

fn bench_parallel_read(c: &mut Criterion) {
    let dir = TempDir::new().expect("temp dir");
    let logs = generate_log_files(
        dir.path(),
        &GeneratorConfig {
            seed: Some(1),
            ..GeneratorConfig::default()
        },
    )
    .expect("generate logs");

    let mut group = c.benchmark_group("read_file");
    for workers in [1usize, 4, 8] {
        let reader = ParallelReader::new(ReaderConfig {
            workers,
            ..ReaderConfig::default()
        });
        group.bench_function(format!("workers_{}", workers), |b| {
            b.iter(|| {
                let read = reader
                    .read_file(&logs.day1, &CancelContext::new())
                    .expect("read");
                black_box(read.entries.len());
            });
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let dir = TempDir::new().expect("temp dir");
    let logs = generate_log_files(
        dir.path(),
        &GeneratorConfig {
            seed: Some(2),
            ..GeneratorConfig::default()
        },
    )
    .expect("generate logs");
    let reader = ParallelReader::new(ReaderConfig::default());
    let ctx = CancelContext::new();
    let day1 = reader.read_file(&logs.day1, &ctx).expect("read day 1").entries;
    let day2 = reader.read_file(&logs.day2, &ctx).expect("read day 2").entries;

    c.bench_function("identify_loyal_users", |b| {
        b.iter(|| {
            black_box(identify_loyal_users(&day1, &day2, 4, &ctx).ok());
        });
    });
}

criterion_group!(
    benches,
    bench_fast_parser,
    bench_json_parser,
    bench_parallel_read,
    bench_aggregate
);
criterion_main!(benches);
