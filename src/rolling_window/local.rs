// Worker-owned sample buffer. A producer records into its own accumulator without
// touching shared state, then hands it to RollingWindowAggregator::merge_pending_local_state.

use std::collections::HashMap;

use super::series::WindowBucket;

#[derive(Debug)]
pub struct LocalAccumulator {
    window_size_ms: u64,
    pending: HashMap<String, Vec<WindowBucket>>,
}

impl LocalAccumulator {
    pub(crate) fn new(window_size_ms: u64) -> Self {
        Self {
            window_size_ms,
            pending: HashMap::new(),
        }
    }

    pub fn window_size_ms(&self) -> u64 {
        self.window_size_ms
    }

    pub fn add(&mut self, key: &str, value: f64, timestamp_ms: u64) {
        let slice = timestamp_ms / self.window_size_ms;
        if let Some(buckets) = self.pending.get_mut(key) {
            fold_into(buckets, slice, value);
        } else {
            let mut buckets = Vec::new();
            fold_into(&mut buckets, slice, value);
            self.pending.insert(key.to_owned(), buckets);
        }
    }

    /// Number of buffered samples not yet merged.
    pub fn pending_samples(&self) -> u64 {
        self.pending.values().flatten().map(|b| b.count).sum()
    }

    pub fn pending_peers(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empties the buffer, yielding every pending bucket with its key.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = (String, WindowBucket)> + '_ {
        self.pending
            .drain()
            .flat_map(|(key, buckets)| buckets.into_iter().map(move |b| (key.clone(), b)))
    }
}

fn fold_into(buckets: &mut Vec<WindowBucket>, slice: u64, value: f64) {
    // Samples from one producer are almost always in time order.
    match buckets.iter_mut().rev().find(|b| b.slice == slice) {
        Some(bucket) => {
            bucket.sum += value;
            bucket.count += 1;
        }
        None => {
            let mut bucket = WindowBucket::empty(slice);
            bucket.sum = value;
            bucket.count = 1;
            buckets.push(bucket);
        }
    }
}
