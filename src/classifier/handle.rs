//! Published tree snapshots
//!
//! A [`TreeHandle`] is shared by everything that classifies. Readers take a
//! clone of the current `Arc<Snapshot>` without locking and keep using it for
//! as long as they like; publishing a rebuilt tree swaps the pointer and never
//! touches the snapshot a reader already holds.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::learning::DecisionTree;

/// One immutable training result
#[derive(Debug)]
pub struct Snapshot<L, V: Eq + Hash> {
    pub tree: DecisionTree<L, V>,
    /// When the training pass that produced this tree finished
    pub trained_at: DateTime<Utc>,
    /// Number of examples the tree was learned from
    pub example_count: usize,
    /// Publish sequence number, starting at 1
    pub generation: u64,
}

/// Shareable, atomically swappable reference to the current snapshot
pub struct TreeHandle<L, V: Eq + Hash> {
    slot: Arc<ArcSwapOption<Snapshot<L, V>>>,
    /// Serializes publishers so generation order matches store order
    publishing: Arc<Mutex<()>>,
    generation: Arc<AtomicU64>,
}

impl<L, V: Eq + Hash> Clone for TreeHandle<L, V> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            publishing: Arc::clone(&self.publishing),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<L, V: Eq + Hash> Default for TreeHandle<L, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L, V: Eq + Hash> TreeHandle<L, V> {
    /// Create an unbuilt handle
    pub fn new() -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::empty()),
            publishing: Arc::new(Mutex::new(())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current snapshot, or `None` while no tree has been published
    pub fn load(&self) -> Option<Arc<Snapshot<L, V>>> {
        self.slot.load_full()
    }

    pub fn is_built(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Replace the published tree. Last writer wins.
    pub fn publish(&self, tree: DecisionTree<L, V>, example_count: usize, trained_at: DateTime<Utc>) -> Arc<Snapshot<L, V>> {
        // Publishing is a single store, so a poisoned guard protects nothing torn.
        let guard = self.publishing.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            tree,
            trained_at,
            example_count,
            generation,
        });
        self.slot.store(Some(Arc::clone(&snapshot)));
        drop(guard);

        debug!("Published tree generation {} ({} examples)", generation, example_count);
        snapshot
    }
}
