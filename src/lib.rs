//! Routine Predictor - activity prediction library
//!
//! Learns, from a history of (activity, timestamp) observations, which
//! recurring activity is most likely at a given moment:
//! - Feature extraction of time-of-day bucket and weekday
//! - ID3 decision-tree learning over those attributes
//! - A classifier façade publishing immutable tree snapshots
//! - SQLite-backed observation history
//!
//! # Example
//!
//! ```ignore
//! use routine_predictor::{Classifier, HistoryStore, SystemClock, Zone};
//! use std::sync::Arc;
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(HistoryStore::open("history.db")?);
//!     store.record("morning run")?;
//!
//!     let classifier = Classifier::new(store, Arc::new(SystemClock), Zone::Local);
//!     println!("{:?}", classifier.predict_now()?);
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod features;
pub mod learning;
pub mod classifier;
pub mod history;
pub mod inspect;
pub mod config;
pub mod cli;

// Re-export commonly used types for convenience
pub use types::{AttributeId, AttributeValue, AttributeVector, Observation, TimeBucket};

pub use features::{attributes_of, Zone};

pub use learning::{learn, DecisionTree, Example, ExampleSet};

pub use classifier::{
    Classifier,
    Clock,
    FixedClock,
    SystemClock,
    TrainingSource,
    TreeHandle,
    Snapshot,
};

pub use history::{HistoryStore, HistoryError};

pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get the library info
pub fn info() -> String {
    format!("{} v{} - Activity prediction library", NAME, VERSION)
}
