use crate::compression::compress::{EncodedIntegerBlock, IntegerEncodingType};
use crate::core::error::Result;
use crate::core::types::DocId;
use serde::{Deserialize, Serialize};

/// One term's occurrence in one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf: u32,
    pub positions: Vec<u32>,
    pub doc_length: u32,
}

/// Postings for a single term, sorted ascending by `doc_id` with no
/// duplicates. `doc_ids` uses delta encoding (postings are built from an
/// already-sorted source so this is a pure win); each posting's positions
/// use VByte encoding since token offsets are small.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostingList {
    pub doc_ids: EncodedIntegerBlock,
    pub tfs: Vec<u32>,
    pub doc_lengths: Vec<u32>,
    pub positions: Vec<EncodedIntegerBlock>,
}

impl PostingList {
    pub fn new(postings: Vec<Posting>) -> Result<Self> {
        let doc_ids: Vec<u64> = postings.iter().map(|p| p.doc_id.0).collect();
        let encoded_ids = EncodedIntegerBlock::encode(&doc_ids, IntegerEncodingType::Delta)?;

        let mut positions = Vec::with_capacity(postings.len());
        for posting in &postings {
            let widened: Vec<u64> = posting.positions.iter().map(|&p| p as u64).collect();
            positions.push(EncodedIntegerBlock::encode(&widened, IntegerEncodingType::VByte)?);
        }

        Ok(PostingList {
            doc_ids: encoded_ids,
            tfs: postings.iter().map(|p| p.tf).collect(),
            doc_lengths: postings.iter().map(|p| p.doc_length).collect(),
            positions,
        })
    }

    pub fn decode_doc_ids(&self) -> Result<Vec<u64>> {
        self.doc_ids.decode()
    }

    fn decode_positions(&self, index: usize) -> Result<Vec<u32>> {
        Ok(self.positions[index].decode()?.into_iter().map(|p| p as u32).collect())
    }

    pub fn get_posting(&self, index: usize) -> Result<Posting> {
        let doc_ids = self.doc_ids.decode()?;
        let positions = self.decode_positions(index)?;

        Ok(Posting {
            doc_id: DocId(doc_ids[index]),
            tf: self.tfs[index],
            positions,
            doc_length: self.doc_lengths[index],
        })
    }

    /// Document frequency: number of documents containing this term.
    pub fn doc_freq(&self) -> u32 {
        self.tfs.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.tfs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tfs.len()
    }

    /// Decodes every posting. Expensive — used only by the builder's
    /// flush-merge path and by tests, never on the query hot path.
    pub fn iter(&self) -> Result<Vec<Posting>> {
        let doc_ids = self.doc_ids.decode()?;
        let mut postings = Vec::with_capacity(self.len());

        for i in 0..self.len() {
            let positions = self.decode_positions(i)?;
            postings.push(Posting {
                doc_id: DocId(doc_ids[i]),
                tf: self.tfs[i],
                positions,
                doc_length: self.doc_lengths[i],
            });
        }

        Ok(postings)
    }

    pub fn get_doc_id(&self, index: usize) -> Result<DocId> {
        let doc_ids = self.doc_ids.decode()?;
        Ok(DocId(doc_ids[index]))
    }

    /// Binary search for a document id. Requires a full decode of the
    /// delta-encoded block; callers on the query hot path should decode
    /// once and binary-search the plain `Vec<u64>` themselves instead of
    /// calling this per candidate.
    pub fn find_doc(&self, target: DocId) -> Result<Option<usize>> {
        let doc_ids = self.doc_ids.decode()?;
        Ok(doc_ids.binary_search(&target.0).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting(doc_id: u64, tf: u32, positions: Vec<u32>, doc_length: u32) -> Posting {
        Posting { doc_id: DocId(doc_id), tf, positions, doc_length }
    }

    #[test]
    fn roundtrips_through_encoding() {
        let postings = vec![
            posting(1, 2, vec![0, 5], 10),
            posting(3, 1, vec![2], 8),
            posting(9, 3, vec![0, 1, 4], 12),
        ];
        let list = PostingList::new(postings.clone()).unwrap();

        assert_eq!(list.doc_freq(), 3);
        for (i, expected) in postings.iter().enumerate() {
            let decoded = list.get_posting(i).unwrap();
            assert_eq!(decoded, *expected);
        }
    }

    #[test]
    fn find_doc_locates_present_and_absent() {
        let postings = vec![posting(1, 1, vec![0], 5), posting(4, 1, vec![1], 5), posting(7, 1, vec![2], 5)];
        let list = PostingList::new(postings).unwrap();

        assert_eq!(list.find_doc(DocId(4)).unwrap(), Some(1));
        assert_eq!(list.find_doc(DocId(5)).unwrap(), None);
    }

    #[test]
    fn doc_ids_beyond_u32_max_survive_roundtrip() {
        let big = u32::MAX as u64 + 1000;
        let postings = vec![posting(big - 1, 1, vec![0], 5), posting(big, 2, vec![0, 1], 5)];
        let list = PostingList::new(postings.clone()).unwrap();

        assert_eq!(list.get_posting(1).unwrap().doc_id, DocId(big));
        assert_eq!(list.find_doc(DocId(big)).unwrap(), Some(1));
    }
}
