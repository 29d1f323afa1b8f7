use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use finsearch_core::collaborators::doc_store::{DocumentStore, SegmentedDocumentStore};
use finsearch_core::collaborators::tokenizer::StandardTokenizer;
use finsearch_core::core::config::Config;
use finsearch_core::index::builder::Builder;
use finsearch_core::storage::layout::StorageLayout;
use tempfile::tempdir;

fn corpus_text(id: u64) -> String {
    let words = ["quarterly", "earnings", "beat", "estimates", "revenue", "falls", "short", "markets", "stocks", "rally"];
    (0..40).map(|i| words[((id as usize) + i) % words.len()]).collect::<Vec<_>>().join(" ")
}

/// End-to-end build throughput: document store scan -> tokenize -> shard
/// flush, for a fixed corpus and a varying per-shard memory cap.
fn bench_build_with_mem_cap(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_with_mem_cap");

    for mem_cap in [50u32, 200, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(mem_cap), mem_cap, |b, &mem_cap| {
            b.iter(|| {
                let dir = tempdir().unwrap();
                let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
                let mut store = SegmentedDocumentStore::open(&storage).unwrap();
                for i in 0..500 {
                    store.append(&format!("http://doc/{i}"), "", &corpus_text(i)).unwrap();
                }

                let mut config = Config::default();
                config.num_shards = 8;
                config.mem_cap_per_shard = mem_cap;

                let tokenizer = Box::new(StandardTokenizer::default());
                let shard_set = Builder::new(storage, config, tokenizer, &store).build().unwrap();
                black_box(shard_set.stats.total_docs);
            });
        });
    }

    group.finish();
}

/// Shard routing throughput: how fast terms hash to shard ids, which gates
/// both build and query paths.
fn bench_shard_routing(c: &mut Criterion) {
    use finsearch_core::index::hash::shard_id;

    let terms: Vec<String> = (0..10_000).map(|i| format!("term-{i}")).collect();

    c.bench_function("shard_id_routing_10k_terms", |b| {
        b.iter(|| {
            for term in &terms {
                black_box(shard_id(term, 16));
            }
        });
    });
}

criterion_group!(benches, bench_build_with_mem_cap, bench_shard_routing);
criterion_main!(benches);
