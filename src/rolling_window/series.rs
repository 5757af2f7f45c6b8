// Per-peer ring of time-sliced buckets. Slot index = slice % num_windows;
// moving the ring forward overwrites (evicts) whatever the slot held before.

/// Sum and count of the samples that fell into one time slice.
/// `slice` is `timestamp_ms / window_size_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowBucket {
    pub slice: u64,
    pub sum: f64,
    pub count: u64,
}

impl WindowBucket {
    pub fn empty(slice: u64) -> Self {
        Self {
            slice,
            sum: 0.0,
            count: 0,
        }
    }

    /// A bucket is live while it is one of the `num_windows` newest slices as of `now_slice`.
    fn is_live(&self, now_slice: u64, num_windows: u64) -> bool {
        now_slice < self.slice || now_slice - self.slice < num_windows
    }
}

#[derive(Debug, Clone)]
pub struct RollingSeries {
    slots: Box<[Option<WindowBucket>]>,
    newest: Option<u64>,
}

impl RollingSeries {
    pub fn new(num_windows: usize) -> Self {
        Self {
            slots: vec![None; num_windows.max(1)].into_boxed_slice(),
            newest: None,
        }
    }

    fn num_windows(&self) -> u64 {
        self.slots.len() as u64
    }

    /// Newest slice this series has advanced to, if any sample was ever recorded.
    pub fn newest_slice(&self) -> Option<u64> {
        self.newest
    }

    /// Folds `sum`/`count` into the bucket for `slice`, advancing the ring when the
    /// slice is newer than anything seen. Returns false (nothing recorded) when the
    /// slice is already older than the retained span; the ring never rewinds.
    pub fn record(&mut self, slice: u64, sum: f64, count: u64) -> bool {
        let n = self.num_windows();
        match self.newest {
            Some(newest) if slice <= newest => {
                if newest - slice >= n {
                    return false;
                }
            }
            _ => self.advance_to(slice),
        }

        let slot = &mut self.slots[(slice % n) as usize];
        let bucket = slot.get_or_insert(WindowBucket::empty(slice));
        if bucket.slice != slice {
            // Slot still holds a slice from a previous lap of the ring.
            *bucket = WindowBucket::empty(slice);
        }
        bucket.sum += sum;
        bucket.count += count;
        true
    }

    /// Opens empty buckets for every slice between the old newest slice and `slice`,
    /// at most one full lap. Each write replaces the slice `num_windows` older.
    fn advance_to(&mut self, slice: u64) {
        let n = self.num_windows();
        let first = match self.newest {
            Some(newest) => (newest + 1).max(slice.saturating_sub(n - 1)),
            None => slice,
        };
        for s in first..=slice {
            self.slots[(s % n) as usize] = Some(WindowBucket::empty(s));
        }
        self.newest = Some(slice);
    }

    /// Buckets still inside the retained span as of `now_slice`, oldest first.
    pub fn live_buckets(&self, now_slice: u64) -> Vec<WindowBucket> {
        let n = self.num_windows();
        let mut live: Vec<WindowBucket> = self
            .slots
            .iter()
            .flatten()
            .filter(|b| b.is_live(now_slice, n))
            .copied()
            .collect();
        live.sort_by_key(|b| b.slice);
        live
    }

    /// (sum, count) over the live buckets as of `now_slice`.
    pub fn totals(&self, now_slice: u64) -> (f64, u64) {
        let n = self.num_windows();
        self.slots
            .iter()
            .flatten()
            .filter(|b| b.is_live(now_slice, n))
            .fold((0.0, 0), |(sum, count), b| (sum + b.sum, count + b.count))
    }

    /// True when no live bucket holds a sample.
    pub fn is_idle(&self, now_slice: u64) -> bool {
        self.totals(now_slice).1 == 0
    }
}
