//! Storage backend and record codec benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use segdb_bench::random_segments;
use segdb_codec::{decode_record, encode_record, SegmentRecord};
use segdb_storage::{DirBackend, InMemoryBackend, SegmentBackend};
use tempfile::TempDir;

fn records(count: usize) -> Vec<SegmentRecord> {
    let mut rng = StdRng::seed_from_u64(5);
    random_segments(&mut rng, count, 8)
        .into_iter()
        .map(SegmentRecord::from)
        .collect()
}

/// Benchmark the CBOR record envelope.
fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_codec");
    let record = records(1).remove(0);
    let bytes = encode_record(&record).unwrap();

    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("encode", |b| {
        b.iter(|| encode_record(black_box(&record)).unwrap());
    });
    group.bench_function("decode", |b| {
        b.iter(|| decode_record(black_box(&bytes)).unwrap());
    });
    group.finish();
}

/// Benchmark saving one record per backend.
fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("backend_save");
    let record = records(1).remove(0);

    group.bench_function("memory", |b| {
        let mut backend = InMemoryBackend::new();
        b.iter(|| backend.save(black_box(&record)).unwrap());
    });

    group.bench_function("dir", |b| {
        let dir = TempDir::new().unwrap();
        let mut backend = DirBackend::open_with_create_dirs(dir.path()).unwrap();
        b.iter(|| backend.save(black_box(&record)).unwrap());
    });
    group.finish();
}

/// Benchmark loading a whole directory.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("dir_load");
    group.sample_size(20);

    for count in [100, 1_000].iter() {
        let dir = TempDir::new().unwrap();
        let mut backend = DirBackend::open_with_create_dirs(dir.path()).unwrap();
        for record in records(*count) {
            backend.save(&record).unwrap();
        }

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(backend.load().unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec, bench_save, bench_load);
criterion_main!(benches);
