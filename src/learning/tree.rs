//! Decision tree
//!
//! Immutable once built. A node's `index` is relative to the vector it sees,
//! which has already lost every attribute consumed above it.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{AttributeId, AttributeVector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionTree<L, V: Eq + Hash> {
    /// Terminal prediction; `None` only when learned from no examples
    Leaf(Option<L>),
    Node {
        /// Position in the current, already-shrunk vector
        index: usize,
        /// Attribute expected at `index`
        attribute: AttributeId,
        children: HashMap<V, DecisionTree<L, V>>,
        /// Prediction for values not seen during training
        default: L,
    },
}

impl<L, V: Eq + Hash + Clone> DecisionTree<L, V> {
    /// Predict a label for an attribute vector.
    ///
    /// Panics if the vector does not line up with the tree, which means the
    /// feature pipeline and the tree disagree on attribute layout.
    pub fn classify(&self, attributes: &AttributeVector<V>) -> Option<&L> {
        match self {
            DecisionTree::Leaf(label) => label.as_ref(),
            DecisionTree::Node { index, attribute, children, default } => {
                let found = attributes.id_at(*index);
                assert!(
                    found == Some(*attribute),
                    "attribute vector misaligned: node expects {} at position {}, found {:?}",
                    attribute,
                    index,
                    found
                );
                let value = match attributes.value_at(*index) {
                    Some(value) => value,
                    None => unreachable!("position {} checked above", index),
                };
                match children.get(value) {
                    Some(child) => child.classify(&attributes.without(*index)),
                    None => Some(default),
                }
            }
        }
    }
}

impl<L, V: Eq + Hash> DecisionTree<L, V> {
    pub fn is_leaf(&self) -> bool {
        matches!(self, DecisionTree::Leaf(_))
    }

    /// Number of edges on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 0,
            DecisionTree::Node { children, .. } => {
                1 + children.values().map(|c| c.depth()).max().unwrap_or(0)
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 1,
            DecisionTree::Node { children, .. } => children.values().map(|c| c.leaf_count()).sum(),
        }
    }

    pub fn node_count(&self) -> usize {
        match self {
            DecisionTree::Leaf(_) => 0,
            DecisionTree::Node { children, .. } => {
                1 + children.values().map(|c| c.node_count()).sum::<usize>()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> DecisionTree<&'static str, u8> {
        // Split on attribute 0, then attribute 1 under value 1
        let inner = DecisionTree::Node {
            index: 0,
            attribute: AttributeId(1),
            children: HashMap::from([(5, DecisionTree::Leaf(Some("c")))]),
            default: "b",
        };
        DecisionTree::Node {
            index: 0,
            attribute: AttributeId(0),
            children: HashMap::from([(0, DecisionTree::Leaf(Some("a"))), (1, inner)]),
            default: "a",
        }
    }

    #[test]
    fn test_leaf_classifies_to_stored_value() {
        let tree: DecisionTree<&str, u8> = DecisionTree::Leaf(Some("x"));
        assert_eq!(tree.classify(&AttributeVector::from_values(vec![1, 2])), Some(&"x"));

        let empty: DecisionTree<&str, u8> = DecisionTree::Leaf(None);
        assert_eq!(empty.classify(&AttributeVector::from_values(vec![1, 2])), None);
    }

    #[test]
    fn test_classify_descends_with_shrunk_vector() {
        let tree = sample_tree();
        assert_eq!(tree.classify(&AttributeVector::from_values(vec![1, 5])), Some(&"c"));
        assert_eq!(tree.classify(&AttributeVector::from_values(vec![0, 5])), Some(&"a"));
    }

    #[test]
    fn test_unseen_value_falls_back_to_default() {
        let tree = sample_tree();
        assert_eq!(tree.classify(&AttributeVector::from_values(vec![9, 5])), Some(&"a"));
        assert_eq!(tree.classify(&AttributeVector::from_values(vec![1, 9])), Some(&"b"));
    }

    #[test]
    #[should_panic(expected = "misaligned")]
    fn test_short_vector_fails_loudly() {
        let tree = sample_tree();
        tree.classify(&AttributeVector::from_values(vec![1]));
    }

    #[test]
    #[should_panic(expected = "misaligned")]
    fn test_wrong_attribute_order_fails_loudly() {
        let tree = sample_tree();
        tree.classify(&AttributeVector::new(vec![(AttributeId(1), 1), (AttributeId(0), 5)]));
    }

    #[test]
    fn test_shape() {
        let tree = sample_tree();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.node_count(), 2);
        assert!(!tree.is_leaf());
    }
}
