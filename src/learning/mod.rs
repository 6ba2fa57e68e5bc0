//! Decision-tree learning
//!
//! Example sets, the ID3 learner and the tree it produces.

pub mod example;
pub mod id3;
pub mod tree;

pub use example::{Example, ExampleSet};
pub use id3::{information_gain, learn};
pub use tree::DecisionTree;
