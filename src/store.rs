// src/store.rs
//! In-memory aggregation store: the bulk corpus followed by every OSDR page
//! appended so far, in arrival order. No dedup.

use crate::record::NormalizedRecord;

#[derive(Debug, Default, Clone)]
pub struct AggregationStore {
    records: Vec<NormalizedRecord>,
    remote_count: usize,
}

impl AggregationStore {
    pub fn new(corpus: Vec<NormalizedRecord>) -> Self {
        let remote_count = corpus.iter().filter(|r| r.is_remote()).count();
        Self {
            records: corpus,
            remote_count,
        }
    }

    pub fn append_all(&mut self, batch: Vec<NormalizedRecord>) {
        self.remote_count += batch.iter().filter(|r| r.is_remote()).count();
        self.records.extend(batch);
    }

    pub fn all(&self) -> &[NormalizedRecord] {
        &self.records
    }

    /// Count of OSDR records held; doubles as the next remote page offset.
    pub fn remote_count(&self) -> usize {
        self.remote_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
