use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

/// A crawled, fetched document as it enters the index builder.
///
/// `doc_id` is assigned by the document store on insert and is dense and
/// monotonically increasing; nothing downstream ever mutates a document
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: DocId,
    pub url: String,
    pub title: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    pub fn new(doc_id: DocId, url: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Document {
            doc_id,
            url: url.into(),
            title: title.into(),
            body: body.into(),
            fetched_at: Utc::now(),
        }
    }
}
