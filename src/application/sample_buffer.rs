// Time-ordered, age-bounded store of ingested samples
use crate::domain::sample::Sample;
use std::collections::VecDeque;

#[derive(Debug, Default, Clone)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping ascending timestamp order. Equal timestamps are kept
    /// in arrival order.
    pub fn append(&mut self, sample: Sample) {
        match self.samples.back() {
            Some(last) if last.timestamp > sample.timestamp => {
                let idx = self
                    .samples
                    .partition_point(|s| s.timestamp <= sample.timestamp);
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push_back(sample),
        }
    }

    /// Drop the prefix of samples older than `cutoff_ms`. Returns how many went.
    pub fn prune_older_than(&mut self, cutoff_ms: i64) -> usize {
        let stale = self.samples.partition_point(|s| s.timestamp < cutoff_ms);
        self.samples.drain(..stale);
        stale
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Samples with `start_ms <= timestamp <= end_ms`. When that range is empty
    /// but the buffer is not, everything at or before `end_ms` is returned so
    /// the last known reading still renders.
    pub fn filter_window(&self, start_ms: i64, end_ms: i64) -> Vec<Sample> {
        let lower = self.samples.partition_point(|s| s.timestamp < start_ms);
        let upper = self.samples.partition_point(|s| s.timestamp <= end_ms);

        if lower < upper {
            self.samples.range(lower..upper).copied().collect()
        } else {
            self.samples.range(..upper).copied().collect()
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
