use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use finsearch_core::collaborators::doc_store::{DocumentStore, SegmentedDocumentStore};
use finsearch_core::collaborators::tokenizer::StandardTokenizer;
use finsearch_core::core::config::Config;
use finsearch_core::index::builder::Builder;
use finsearch_core::query::evaluator::QueryEvaluator;
use finsearch_core::scoring::scorer::BM25Scorer;
use finsearch_core::storage::layout::StorageLayout;
use tempfile::tempdir;

fn corpus_text(id: u64) -> String {
    let words = ["quarterly", "earnings", "beat", "estimates", "revenue", "falls", "short", "markets", "stocks", "rally", "inflation", "rates"];
    (0..60).map(|i| words[((id as usize) + i) % words.len()]).collect::<Vec<_>>().join(" ")
}

/// Conjunctive query latency at varying top-K, over a fixed 2000-doc corpus.
fn bench_search_top_k(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
    let mut store = SegmentedDocumentStore::open(&storage).unwrap();
    for i in 0..2000 {
        store.append(&format!("http://doc/{i}"), "", &corpus_text(i)).unwrap();
    }

    let mut config = Config::default();
    config.num_shards = 16;
    let tokenizer = Box::new(StandardTokenizer::default());
    let shard_set = Builder::new(storage.clone(), config, tokenizer, &store).build().unwrap();

    let query_store = SegmentedDocumentStore::open(&storage).unwrap();
    let query_tokenizer = StandardTokenizer::default();
    let evaluator = QueryEvaluator::new(&shard_set, &query_tokenizer, &query_store, BM25Scorer::default());

    let mut group = c.benchmark_group("search_top_k");
    for k in [10u32, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(k), k, |b, &k| {
            b.iter(|| {
                let results = evaluator.search("quarterly earnings rates", k).unwrap();
                black_box(results.len());
            });
        });
    }
    group.finish();
}

/// Postings intersection cost as the number of distinct query terms grows.
fn bench_search_term_count(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let storage = StorageLayout::new(dir.path().to_path_buf()).unwrap();
    let mut store = SegmentedDocumentStore::open(&storage).unwrap();
    for i in 0..2000 {
        store.append(&format!("http://doc/{i}"), "", &corpus_text(i)).unwrap();
    }

    let mut config = Config::default();
    config.num_shards = 16;
    let tokenizer = Box::new(StandardTokenizer::default());
    let shard_set = Builder::new(storage.clone(), config, tokenizer, &store).build().unwrap();

    let query_store = SegmentedDocumentStore::open(&storage).unwrap();
    let query_tokenizer = StandardTokenizer::default();
    let evaluator = QueryEvaluator::new(&shard_set, &query_tokenizer, &query_store, BM25Scorer::default());

    let queries = [
        "quarterly",
        "quarterly earnings",
        "quarterly earnings rates",
        "quarterly earnings rates inflation",
    ];

    let mut group = c.benchmark_group("search_term_count");
    for (i, query) in queries.iter().enumerate() {
        group.bench_with_input(BenchmarkId::from_parameter(i + 1), query, |b, &query| {
            b.iter(|| {
                let results = evaluator.search(query, 10).unwrap();
                black_box(results.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_search_top_k, bench_search_term_count);
criterion_main!(benches);
