pub mod albums;
pub mod cover;
pub mod database;
pub mod export;
pub mod materializer;
pub mod paths;
pub mod processor;
pub mod progress;
pub mod tagger;

#[cfg(test)]
pub mod fixtures;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Stop flag shared between a running export and whoever started it.
/// Checked between tracks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
