use crate::core::types::DocId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scored document before hydration with title/url/summary.
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reversed so the BinaryHeap (a max-heap) acts as a min-heap on
        // score: the lowest-scoring candidate sits at the top and is the
        // one evicted when the heap grows past `k`.
        other.score.partial_cmp(&self.score)
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Bounded min-heap that keeps the top `k` scored documents seen so far.
pub struct TopKCollector {
    heap: BinaryHeap<ScoredDoc>,
    k: usize,
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector { heap: BinaryHeap::with_capacity(k + 1), k }
    }

    pub fn collect(&mut self, doc: ScoredDoc) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(doc);
            return;
        }
        if let Some(worst) = self.heap.peek() {
            if doc.score > worst.score {
                self.heap.pop();
                self.heap.push(doc);
            }
        }
    }

    /// Drains the heap, sorted by descending score, ties broken by
    /// ascending `doc_id`.
    pub fn get_results(self) -> Vec<ScoredDoc> {
        let mut results: Vec<_> = self.heap.into_iter().collect();
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.doc_id.cmp(&b.doc_id))
        });
        results
    }
}
