//! ID3 induction
//!
//! Greedy top-down learner: at each node pick the attribute with the highest
//! information gain, split on it, recurse on each partition.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::trace;

use super::example::ExampleSet;
use super::tree::DecisionTree;

/// Gains closer than this are treated as equal, so the lower index wins
const GAIN_EPSILON: f64 = 1e-12;

/// Learn a decision tree from an ordered example set.
///
/// Rules, in order: empty set gives `Leaf(None)`; a single label gives a
/// leaf of that label; exhausted attributes give a leaf of the majority
/// label; otherwise split on the best attribute.
pub fn learn<L, V>(examples: &ExampleSet<L, V>) -> DecisionTree<L, V>
where
    L: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    if examples.is_empty() {
        return DecisionTree::Leaf(None);
    }

    if examples.is_pure() {
        return DecisionTree::Leaf(examples.first().map(|e| e.label.clone()));
    }

    let default = match examples.majority_label() {
        Some(label) => label,
        None => return DecisionTree::Leaf(None),
    };

    if examples.attribute_count() == 0 {
        return DecisionTree::Leaf(Some(default));
    }

    let index = best_attribute(examples);
    let attribute = match examples.attribute_id(index) {
        Some(id) => id,
        None => unreachable!("best attribute {} within vector width", index),
    };
    trace!(%attribute, index, examples = examples.len(), "splitting");

    let children: HashMap<V, DecisionTree<L, V>> = examples
        .split_by_attribute(index)
        .into_iter()
        .map(|(value, subset)| (value, learn(&subset)))
        .collect();

    DecisionTree::Node { index, attribute, children, default }
}

/// Entropy reduction from partitioning `examples` on `index`
pub fn information_gain<L, V>(examples: &ExampleSet<L, V>, index: usize) -> f64
where
    L: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let total = examples.len() as f64;
    let remainder: f64 = examples
        .group_by_attribute(index)
        .iter()
        .map(|(_, subset)| subset.len() as f64 / total * subset.entropy())
        .sum();
    examples.entropy() - remainder
}

/// Index with the strictly greatest gain, lowest index on ties.
///
/// A later attribute only replaces the current best when its gain is larger
/// by more than [`GAIN_EPSILON`]. Gains within that margin count as a tie,
/// so a mathematically equal gain that differs only in floating-point
/// rounding keeps the lower index. Real gain differences between categorical
/// partitions of a small history are many orders of magnitude above it.
fn best_attribute<L, V>(examples: &ExampleSet<L, V>) -> usize
where
    L: Clone + Eq + Hash,
    V: Clone + Eq + Hash,
{
    let mut best_index = 0;
    let mut best_gain = f64::NEG_INFINITY;
    for index in 0..examples.attribute_count() {
        let gain = information_gain(examples, index);
        if gain > best_gain + GAIN_EPSILON {
            best_index = index;
            best_gain = gain;
        }
    }
    best_index
}
