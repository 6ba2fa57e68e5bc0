//! Training examples
//!
//! An [`ExampleSet`] is the ordered input of one training pass. Grouping and
//! splitting keep the relative order of examples, which is what makes the
//! learner's tie-breaks deterministic.

use std::collections::HashMap;
use std::hash::Hash;

use crate::types::{AttributeId, AttributeVector};

/// A labelled attribute vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example<L, V> {
    pub label: L,
    pub attributes: AttributeVector<V>,
}

impl<L, V> Example<L, V> {
    pub fn new(label: L, attributes: AttributeVector<V>) -> Self {
        Self { label, attributes }
    }
}

/// Ordered collection of examples sharing one vector width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSet<L, V> {
    examples: Vec<Example<L, V>>,
}

impl<L, V> Default for ExampleSet<L, V> {
    fn default() -> Self {
        Self { examples: Vec::new() }
    }
}

impl<L, V> ExampleSet<L, V> {
    /// Build a set, checking that every vector carries the same attribute
    /// ids in the same order
    pub fn new(examples: Vec<Example<L, V>>) -> Self {
        if let Some(first) = examples.first() {
            let width = first.attributes.len();
            assert!(
                examples.iter().all(|e| e.attributes.len() == width),
                "example set mixes attribute vectors of different widths"
            );
            for (position, example) in examples.iter().enumerate().skip(1) {
                let aligned = example
                    .attributes
                    .iter()
                    .zip(first.attributes.iter())
                    .all(|((id, _), (expected, _))| id == expected);
                assert!(
                    aligned,
                    "example {} is misaligned: its attribute ids differ from the first example's",
                    position
                );
            }
        }
        Self { examples }
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn first(&self) -> Option<&Example<L, V>> {
        self.examples.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Example<L, V>> {
        self.examples.iter()
    }

    /// Width of the attribute vectors, 0 for an empty set
    pub fn attribute_count(&self) -> usize {
        self.first().map(|e| e.attributes.len()).unwrap_or(0)
    }

    /// Attribute id at `index` of the current vectors
    pub fn attribute_id(&self, index: usize) -> Option<AttributeId> {
        self.first().and_then(|e| e.attributes.id_at(index))
    }
}

impl<L: Clone + Eq + Hash, V> ExampleSet<L, V> {
    /// Shannon entropy (bits) of the label distribution
    pub fn entropy(&self) -> f64 {
        debug_assert!(!self.is_empty(), "entropy of an empty example set");
        let total = self.len() as f64;
        self.label_counts()
            .into_iter()
            .map(|(_, count)| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }

    /// Count of each label, in first-seen order
    pub fn label_counts(&self) -> Vec<(&L, usize)> {
        let mut positions: HashMap<&L, usize> = HashMap::new();
        let mut counts: Vec<(&L, usize)> = Vec::new();
        for example in &self.examples {
            match positions.get(&example.label) {
                Some(&slot) => counts[slot].1 += 1,
                None => {
                    positions.insert(&example.label, counts.len());
                    counts.push((&example.label, 1));
                }
            }
        }
        counts
    }

    /// True when every example carries the same label
    pub fn is_pure(&self) -> bool {
        match self.first() {
            Some(first) => self.examples.iter().all(|e| e.label == first.label),
            None => true,
        }
    }

    /// Most common label.
    ///
    /// Ties go to the label that reached the winning count first when
    /// scanning examples in order.
    pub fn majority_label(&self) -> Option<L> {
        let mut counts: HashMap<&L, usize> = HashMap::new();
        let mut best: Option<(&L, usize)> = None;
        for example in &self.examples {
            let count = counts.entry(&example.label).or_default();
            *count += 1;
            if best.map_or(true, |(_, best_count)| *count > best_count) {
                best = Some((&example.label, *count));
            }
        }
        best.map(|(label, _)| label.clone())
    }
}

impl<L: Clone, V: Clone + Eq + Hash> ExampleSet<L, V> {
    /// Partition by the value at `index`, groups in first-seen order
    pub fn group_by_attribute(&self, index: usize) -> Vec<(V, ExampleSet<L, V>)> {
        self.partition(index, |example| example.clone())
    }

    /// Like [`group_by_attribute`](Self::group_by_attribute), with `index`
    /// removed from every resulting vector
    pub fn split_by_attribute(&self, index: usize) -> Vec<(V, ExampleSet<L, V>)> {
        self.partition(index, |example| {
            Example::new(example.label.clone(), example.attributes.without(index))
        })
    }

    fn partition<F>(&self, index: usize, project: F) -> Vec<(V, ExampleSet<L, V>)>
    where
        F: Fn(&Example<L, V>) -> Example<L, V>,
    {
        let mut positions: HashMap<V, usize> = HashMap::new();
        let mut groups: Vec<(V, Vec<Example<L, V>>)> = Vec::new();

        for example in &self.examples {
            let value = match example.attributes.value_at(index) {
                Some(value) => value,
                None => panic!(
                    "attribute index {} out of range for vector of width {}",
                    index,
                    example.attributes.len()
                ),
            };
            let slot = *positions.entry(value.clone()).or_insert_with(|| {
                groups.push((value.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(project(example));
        }

        groups
            .into_iter()
            .map(|(value, examples)| (value, ExampleSet { examples }))
            .collect()
    }
}

impl<L, V> FromIterator<Example<L, V>> for ExampleSet<L, V> {
    fn from_iter<I: IntoIterator<Item = Example<L, V>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
