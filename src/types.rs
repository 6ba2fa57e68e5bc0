//! Shared types used across modules
//!
//! Observations, attribute identifiers and the attribute vector carried
//! through learning and classification.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A single historical observation: which activity happened, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation<L> {
    pub label: L,
    pub observed_at: DateTime<Utc>,
}

impl<L> Observation<L> {
    pub fn new(label: L, observed_at: DateTime<Utc>) -> Self {
        Self { label, observed_at }
    }
}

/// Identifies which attribute a vector position holds.
///
/// Positions shift as attributes are consumed during learning; the id does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeId(pub usize);

impl AttributeId {
    pub const TIME_OF_DAY: AttributeId = AttributeId(0);
    pub const WEEKDAY: AttributeId = AttributeId(1);

    /// Human-readable attribute name
    pub fn name(&self) -> String {
        match *self {
            AttributeId::TIME_OF_DAY => "time_of_day".to_string(),
            AttributeId::WEEKDAY => "weekday".to_string(),
            AttributeId(other) => format!("attribute_{}", other),
        }
    }
}

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One of the six 4-hour buckets of the day, bucket 0 starting at 02:00
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeBucket(u8);

impl TimeBucket {
    pub const COUNT: u8 = 6;

    /// Build a bucket from its index, wrapping out-of-range values
    pub fn new(index: u8) -> Self {
        Self(index % Self::COUNT)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// Local hour at which this bucket starts
    pub fn start_hour(&self) -> u32 {
        (2 + 4 * self.0 as u32) % 24
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = self.start_hour();
        write!(f, "{:02}:00-{:02}:00", start, (start + 4) % 24)
    }
}

/// Categorical value of a timestamp-derived attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    TimeOfDay(TimeBucket),
    Weekday(Weekday),
}

impl AttributeValue {
    /// Attribute kind first, then chronological position within the day or week
    fn sort_key(&self) -> (u8, u32) {
        match self {
            AttributeValue::TimeOfDay(bucket) => (0, bucket.index() as u32),
            AttributeValue::Weekday(day) => (1, day.num_days_from_monday()),
        }
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::TimeOfDay(bucket) => write!(f, "{}", bucket),
            AttributeValue::Weekday(day) => write!(f, "{}", day),
        }
    }
}

/// Ordered attribute values, each tagged with the attribute it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeVector<V> {
    entries: Vec<(AttributeId, V)>,
}

impl<V> AttributeVector<V> {
    /// Build a vector from explicit (id, value) pairs
    pub fn new(entries: Vec<(AttributeId, V)>) -> Self {
        Self { entries }
    }

    /// Build a vector whose ids are the positions of `values`
    pub fn from_values(values: Vec<V>) -> Self {
        Self {
            entries: values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (AttributeId(i), v))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at a position of the current (possibly shrunk) vector
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Attribute id at a position of the current vector
    pub fn id_at(&self, index: usize) -> Option<AttributeId> {
        self.entries.get(index).map(|(id, _)| *id)
    }

    /// Value of an attribute by id, wherever it currently sits
    pub fn get(&self, id: AttributeId) -> Option<&V> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(AttributeId, V)> {
        self.entries.iter()
    }
}

impl<V: Clone> AttributeVector<V> {
    /// Copy of this vector with the position `index` removed
    pub fn without(&self, index: usize) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(index);
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_keeps_ids() {
        let v = AttributeVector::from_values(vec!['a', 'b', 'c']);
        let shrunk = v.without(0);
        assert_eq!(shrunk.len(), 2);
        assert_eq!(shrunk.id_at(0), Some(AttributeId(1)));
        assert_eq!(shrunk.value_at(0), Some(&'b'));
        assert_eq!(shrunk.get(AttributeId(2)), Some(&'c'));
        assert_eq!(shrunk.get(AttributeId(0)), None);
    }

    #[test]
    fn test_time_bucket_display() {
        assert_eq!(TimeBucket::new(0).to_string(), "02:00-06:00");
        assert_eq!(TimeBucket::new(5).to_string(), "22:00-02:00");
        assert_eq!(TimeBucket::new(7).index(), 1);
    }

    #[test]
    fn test_attribute_values_sort_chronologically() {
        let mut days = vec![
            AttributeValue::Weekday(Weekday::Sun),
            AttributeValue::Weekday(Weekday::Fri),
            AttributeValue::Weekday(Weekday::Mon),
            AttributeValue::Weekday(Weekday::Wed),
        ];
        days.sort();
        let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
        assert_eq!(names, vec!["Mon", "Wed", "Fri", "Sun"]);

        assert!(AttributeValue::TimeOfDay(TimeBucket::new(5)) > AttributeValue::TimeOfDay(TimeBucket::new(0)));
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(AttributeId::TIME_OF_DAY.name(), "time_of_day");
        assert_eq!(AttributeId::WEEKDAY.to_string(), "weekday");
        assert_eq!(AttributeId(4).name(), "attribute_4");
    }
}
