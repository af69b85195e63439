/// Hot-path benchmarks: shard selection, reference generation and content
/// digests
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use std::time::Duration;
use tempfile::TempDir;
use tokio::runtime::Runtime;

use blob_gateway::domain::value_objects::{ContentDigest, RefGenerator, Sharder};
use blob_gateway::infrastructure::storage::ContentHasher;

fn shard_benchmarks(c: &mut Criterion) {
    let sharder = Sharder::new();
    let generator = RefGenerator::seeded(1);
    let keys: Vec<String> = (0..1024)
        .map(|_| generator.new_ref("photo.jpg").to_string())
        .collect();

    let mut group = c.benchmark_group("sharding");
    group.throughput(Throughput::Elements(keys.len() as u64));
    group.bench_function("shard_1024_refs", |b| {
        b.iter(|| {
            for key in &keys {
                std::hint::black_box(sharder.shard(key).ok());
            }
        })
    });
    group.finish();
}

fn ref_benchmarks(c: &mut Criterion) {
    let generator = RefGenerator::seeded(2);
    let mut group = c.benchmark_group("refs");

    for name in ["photo.JPG", "archive.tar.gz", "README"] {
        group.bench_with_input(BenchmarkId::new("new_ref", name), name, |b, name| {
            b.iter(|| std::hint::black_box(generator.new_ref(name)))
        });
    }

    let encoded = generator.new_ref("a.txt").encode_json();
    group.bench_function("decode_json", |b| {
        b.iter(|| std::hint::black_box(blob_gateway::value_objects::Ref::decode_json(encoded.as_bytes())))
    });
    group.finish();
}

fn digest_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("content_digest");
    group.measurement_time(Duration::from_secs(10));

    for size in [1024, 64 * 1024, 1024 * 1024].iter() {
        let size = *size;
        let data = vec![0xabu8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("of_bytes", size), &data, |b, data| {
            b.iter(|| std::hint::black_box(ContentDigest::of_bytes(data)))
        });

        // Streaming digest while writing, as uploads do
        group.bench_with_input(BenchmarkId::new("write_and_digest", size), &size, |b, &s| {
            let temp_dir = TempDir::new().unwrap();
            b.to_async(&rt).iter_custom(|iters| {
                let temp_dir = temp_dir.path().to_path_buf();
                async move {
                    let mut total = Duration::default();
                    for i in 0..iters {
                        let path = temp_dir.join(format!("digest_{}.tmp", i));
                        let reader = Cursor::new(vec![0xcdu8; s]);

                        let start = std::time::Instant::now();
                        ContentHasher::write_and_digest_with_durability(&path, reader, false)
                            .await
                            .unwrap();
                        total += start.elapsed();

                        tokio::fs::remove_file(&path).await.ok();
                    }
                    total
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, shard_benchmarks, ref_benchmarks, digest_benchmarks);
criterion_main!(benches);
