//! Classifier façade
//!
//! Ties the training source, the feature extractor and the published tree
//! together. Training is always a full pass over the complete history;
//! classification only ever reads the snapshot current at call time.

pub mod handle;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::features::Zone;
use crate::learning::{learn, Example, ExampleSet};
use crate::types::{AttributeValue, AttributeVector, Observation};

pub use handle::{Snapshot, TreeHandle};

/// Snapshot type the façade publishes
pub type ActivitySnapshot<L> = Snapshot<L, AttributeValue>;

/// Source of the complete observation history
pub trait TrainingSource<L>: Send + Sync {
    /// Every observation, in the order they should be learned from
    fn observations(&self) -> Result<Vec<Observation<L>>>;
}

impl<L: Clone + Send + Sync> TrainingSource<L> for Vec<Observation<L>> {
    fn observations(&self) -> Result<Vec<Observation<L>>> {
        Ok(self.clone())
    }
}

/// Source of the current time
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Predicts the most likely activity for a moment in time
pub struct Classifier<L> {
    source: Arc<dyn TrainingSource<L>>,
    clock: Arc<dyn Clock>,
    zone: Zone,
    handle: TreeHandle<L, AttributeValue>,
}

impl<L> Classifier<L>
where
    L: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub fn new(source: Arc<dyn TrainingSource<L>>, clock: Arc<dyn Clock>, zone: Zone) -> Self {
        Self::with_handle(source, clock, zone, TreeHandle::new())
    }

    /// Build a classifier publishing into an existing, possibly shared, handle
    pub fn with_handle(
        source: Arc<dyn TrainingSource<L>>,
        clock: Arc<dyn Clock>,
        zone: Zone,
        handle: TreeHandle<L, AttributeValue>,
    ) -> Self {
        Self { source, clock, zone, handle }
    }

    /// Handle readers can classify against without going through the façade
    pub fn handle(&self) -> TreeHandle<L, AttributeValue> {
        self.handle.clone()
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Current snapshot, if a tree has been built
    pub fn snapshot(&self) -> Option<Arc<ActivitySnapshot<L>>> {
        self.handle.load()
    }

    /// Attribute vector of a UTC instant in this classifier's zone
    pub fn attributes_at(&self, instant: &DateTime<Utc>) -> AttributeVector<AttributeValue> {
        self.zone.attributes(instant)
    }

    /// Read the full history and turn it into training examples
    pub fn examples(&self) -> Result<ExampleSet<L, AttributeValue>> {
        let observations = self
            .source
            .observations()
            .context("Failed to read training history")?;
        Ok(observations
            .into_iter()
            .map(|o| Example::new(o.label, self.zone.attributes(&o.observed_at)))
            .collect())
    }

    /// Run a full training pass and publish the result
    pub fn retrain(&self) -> Result<Arc<ActivitySnapshot<L>>> {
        let examples = self.examples()?;
        debug!("Training on {} examples", examples.len());

        let tree = learn(&examples);
        let snapshot = self.handle.publish(tree, examples.len(), self.clock.now());

        info!(
            "Retrained activity tree: {} examples, depth {}, {} leaves (generation {})",
            snapshot.example_count,
            snapshot.tree.depth(),
            snapshot.tree.leaf_count(),
            snapshot.generation
        );
        Ok(snapshot)
    }

    /// Current snapshot, training first if nothing has been published yet
    pub fn ensure_trained(&self) -> Result<Arc<ActivitySnapshot<L>>> {
        match self.handle.load() {
            Some(snapshot) => Ok(snapshot),
            None => self.retrain(),
        }
    }

    /// Whether the published tree is missing or older than `max_age`
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        match self.handle.load() {
            Some(snapshot) => self.clock.now() - snapshot.trained_at >= max_age,
            None => true,
        }
    }

    /// Retrain if the tree is stale; returns whether a pass ran
    pub fn refresh_if_stale(&self, max_age: chrono::Duration) -> Result<bool> {
        if !self.is_stale(max_age) {
            return Ok(false);
        }
        self.retrain()?;
        Ok(true)
    }

    /// Classify an attribute vector against the current snapshot.
    ///
    /// Returns `None` while no tree is built or when the tree has no answer.
    pub fn classify(&self, attributes: &AttributeVector<AttributeValue>) -> Option<L> {
        let snapshot = self.handle.load()?;
        snapshot.tree.classify(attributes).cloned()
    }

    /// Classify a UTC instant against the current snapshot
    pub fn classify_at(&self, instant: &DateTime<Utc>) -> Option<L> {
        self.classify(&self.attributes_at(instant))
    }

    /// Classify the clock's current time against the current snapshot
    pub fn classify_now(&self) -> Option<L> {
        self.classify_at(&self.clock.now())
    }

    /// Classify now, building the first tree lazily if needed
    pub fn predict_now(&self) -> Result<Option<L>> {
        let snapshot = self.ensure_trained()?;
        let attributes = self.attributes_at(&self.clock.now());
        Ok(snapshot.tree.classify(&attributes).cloned())
    }
}

/// Retrain on the blocking pool; classification keeps using the old tree
/// until the new one is published.
pub fn retrain_in_background<L>(classifier: Arc<Classifier<L>>) -> JoinHandle<Result<Arc<ActivitySnapshot<L>>>>
where
    L: Clone + Eq + Hash + Send + Sync + 'static,
{
    tokio::task::spawn_blocking(move || classifier.retrain())
}

/// Periodically retrain in the background.
///
/// The first tick fires immediately, so the tree is built on start.
pub fn spawn_refresher<L>(classifier: Arc<Classifier<L>>, every: Duration) -> JoinHandle<()>
where
    L: Clone + Eq + Hash + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match retrain_in_background(Arc::clone(&classifier)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => warn!("Scheduled retrain failed: {:#}", e),
                Err(e) => warn!("Scheduled retrain task panicked: {}", e),
            }
        }
    })
}
