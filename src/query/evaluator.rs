use crate::collaborators::doc_store::DocumentStore;
use crate::collaborators::tokenizer::Tokenizer;
use crate::core::error::Result;
use crate::core::types::DocId;
use crate::index::builder::ShardSet;
use crate::index::posting::Posting;
use crate::query::results::{ScoredDoc, TopKCollector};
use crate::scoring::scorer::BM25Scorer;
use std::collections::HashMap;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// A ranked, hydrated search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub doc_id: DocId,
    pub score: f64,
    pub title: String,
    pub url: String,
    pub summary: String,
}

/// Tokenizes a query, fetches per-term postings from the builder's
/// shards, intersects by document id, scores with BM25, and hydrates the
/// top-K with title/url/summary from the document store.
pub struct QueryEvaluator<'a> {
    shard_set: &'a ShardSet,
    tokenizer: &'a dyn Tokenizer,
    doc_store: &'a dyn DocumentStore,
    scorer: BM25Scorer,
}

impl<'a> QueryEvaluator<'a> {
    pub fn new(shard_set: &'a ShardSet, tokenizer: &'a dyn Tokenizer, doc_store: &'a dyn DocumentStore, scorer: BM25Scorer) -> Self {
        QueryEvaluator { shard_set, tokenizer, doc_store, scorer }
    }

    /// Conjunctive (AND) search: returns empty if any query term has no
    /// matches or the intersection across terms is empty.
    pub fn search(&self, query: &str, k: u32) -> Result<Vec<QueryResult>> {
        self.search_with_deadline(query, k, None)
    }

    pub fn search_with_deadline(&self, query: &str, k: u32, deadline: Option<Duration>) -> Result<Vec<QueryResult>> {
        let started = Instant::now();
        let postings_by_term = self.fetch_postings(query)?;
        if postings_by_term.is_empty() {
            return Ok(Vec::new());
        }

        let candidates = intersect(&postings_by_term);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let scored = self.score_candidates(&candidates, &postings_by_term, k, started, deadline);
        self.hydrate(scored)
    }

    /// Disjunctive (OR) fallback: scores the union of every term's
    /// postings rather than only documents matching every term. Never
    /// triggered implicitly by `search` — callers opt in explicitly.
    pub fn search_disjunctive(&self, query: &str, k: u32) -> Result<Vec<QueryResult>> {
        let started = Instant::now();
        let postings_by_term = self.fetch_postings(query)?;
        if postings_by_term.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for postings in postings_by_term.values() {
            for p in postings {
                if seen.insert(p.doc_id) {
                    candidates.push(p.doc_id);
                }
            }
        }

        let scored = self.score_candidates(&candidates, &postings_by_term, k, started, None);
        self.hydrate(scored)
    }

    fn fetch_postings(&self, query: &str) -> Result<HashMap<String, Vec<Posting>>> {
        let terms = self.tokenizer.tokenize(query);
        let mut unique_terms: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for t in terms {
            if seen.insert(t.clone()) {
                unique_terms.push(t);
            }
        }

        let mut postings_by_term = HashMap::new();
        for term in unique_terms {
            let postings = self.shard_set.get_postings(&term)?;
            if !postings.is_empty() {
                postings_by_term.insert(term, postings);
            }
        }
        Ok(postings_by_term)
    }

    fn score_candidates(
        &self,
        candidates: &[DocId],
        postings_by_term: &HashMap<String, Vec<Posting>>,
        k: u32,
        started: Instant,
        deadline: Option<Duration>,
    ) -> Vec<ScoredDoc> {
        let total_docs = self.shard_set.stats.total_docs;
        let avg_doc_length = self.shard_set.stats.avg_doc_length;

        let idfs: HashMap<&String, f64> = postings_by_term
            .iter()
            .map(|(term, postings)| (term, self.scorer.idf(postings.len() as u64, total_docs)))
            .collect();

        let mut collector = TopKCollector::new(k as usize);

        for (i, &doc_id) in candidates.iter().enumerate() {
            if i % 256 == 0 {
                if let Some(deadline) = deadline {
                    if started.elapsed() > deadline {
                        log::warn!("query evaluation deadline exceeded, returning partial results");
                        break;
                    }
                }
            }

            let mut score = 0.0;
            for (term, postings) in postings_by_term {
                if let Ok(idx) = postings.binary_search_by_key(&doc_id.value(), |p| p.doc_id.value()) {
                    let posting = &postings[idx];
                    score += self.scorer.score(idfs[term], posting.tf, posting.doc_length, avg_doc_length);
                }
            }

            collector.collect(ScoredDoc { doc_id, score });
        }

        collector.get_results()
    }

    fn hydrate(&self, scored: Vec<ScoredDoc>) -> Result<Vec<QueryResult>> {
        let mut out = Vec::with_capacity(scored.len());
        for s in scored {
            match self.doc_store.get(s.doc_id)? {
                Some(doc) => out.push(QueryResult {
                    doc_id: s.doc_id,
                    score: s.score,
                    title: doc.title,
                    url: doc.url,
                    summary: summarize(&doc.body),
                }),
                None => {
                    log::warn!("doc_id {} scored but missing from document store", s.doc_id.value());
                }
            }
        }
        Ok(out)
    }
}

/// Intersects postings lists by ascending `doc_id`. Starts from the
/// shortest list and confirms membership in every other list via binary
/// search, which is cheapest when one term is far rarer than the rest.
fn intersect(postings_by_term: &HashMap<String, Vec<Posting>>) -> Vec<DocId> {
    let mut lists: Vec<&Vec<Posting>> = postings_by_term.values().collect();
    if lists.is_empty() {
        return Vec::new();
    }
    lists.sort_by_key(|l| l.len());

    let (shortest, rest) = lists.split_first().unwrap();
    let mut result = Vec::new();

    'candidate: for posting in shortest.iter() {
        for other in rest {
            if other.binary_search_by_key(&posting.doc_id.value(), |p| p.doc_id.value()).is_err() {
                continue 'candidate;
            }
        }
        result.push(posting.doc_id);
    }

    result
}

fn summarize(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.len() <= MAX_LEN {
        return body.to_string();
    }

    let slice = &body[..MAX_LEN];
    match slice.rfind(' ') {
        Some(boundary) if boundary > (MAX_LEN * 4 / 5) => slice[..boundary].to_string(),
        _ => slice.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::doc_store::SegmentedDocumentStore;
    use crate::collaborators::tokenizer::StandardTokenizer;
    use crate::core::config::Config;
    use crate::index::builder::Builder;
    use crate::storage::layout::StorageLayout;
    use tempfile::tempdir;

    fn build(dir: &std::path::Path, docs: &[(&str, &str, &str)]) -> (StorageLayout, ShardSet) {
        let storage = StorageLayout::new(dir.to_path_buf()).unwrap();
        let mut store = SegmentedDocumentStore::open(&storage).unwrap();
        for (url, title, body) in docs {
            store.append(url, title, body).unwrap();
        }

        let mut config = Config::default();
        config.num_shards = 4;
        let tokenizer = Box::new(StandardTokenizer { lowercase: true, min_term_length: 1, max_term_length: 64, stop_words: None });
        let shard_set = Builder::new(storage.clone(), config, tokenizer, &store).build().unwrap();
        (storage, shard_set)
    }

    #[test]
    fn conjunctive_query_ranks_and_scores() {
        let dir = tempdir().unwrap();
        let (storage, shard_set) = build(
            dir.path(),
            &[
                ("http://1", "", "a b"),
                ("http://2", "", "a c"),
                ("http://3", "", "a b c"),
            ],
        );

        let store = SegmentedDocumentStore::open(&storage).unwrap();
        let tokenizer = StandardTokenizer { lowercase: true, min_term_length: 1, max_term_length: 64, stop_words: None };
        let evaluator = QueryEvaluator::new(&shard_set, &tokenizer, &store, BM25Scorer::default());

        let results = evaluator.search("a b", 10).unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.doc_id.value()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn unmatched_query_returns_empty() {
        let dir = tempdir().unwrap();
        let (storage, shard_set) = build(dir.path(), &[("http://1", "", "alpha beta")]);
        let store = SegmentedDocumentStore::open(&storage).unwrap();
        let tokenizer = StandardTokenizer { lowercase: true, min_term_length: 1, max_term_length: 64, stop_words: None };
        let evaluator = QueryEvaluator::new(&shard_set, &tokenizer, &store, BM25Scorer::default());

        assert!(evaluator.search("gamma", 10).unwrap().is_empty());
    }

    #[test]
    fn disjunctive_fallback_returns_union_when_intersection_is_empty() {
        let dir = tempdir().unwrap();
        let (storage, shard_set) = build(
            dir.path(),
            &[("http://1", "", "termA only"), ("http://2", "", "termB only")],
        );
        let store = SegmentedDocumentStore::open(&storage).unwrap();
        let tokenizer = StandardTokenizer { lowercase: true, min_term_length: 1, max_term_length: 64, stop_words: None };
        let evaluator = QueryEvaluator::new(&shard_set, &tokenizer, &store, BM25Scorer::default());

        assert!(evaluator.search("terma termb", 10).unwrap().is_empty());

        let fallback = evaluator.search_disjunctive("terma termb", 10).unwrap();
        let mut ids: Vec<u64> = fallback.iter().map(|r| r.doc_id.value()).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
