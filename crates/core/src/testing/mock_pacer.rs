//! Pacer that counts calls instead of waiting.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::pacing::Pacer;

/// Records how often the resolver asked to be paced. Never sleeps.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    calls: AtomicUsize,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `pace` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pace(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
