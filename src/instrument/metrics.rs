//! Free-form metric accumulator for one report cycle.

use serde::Serialize;
use std::collections::BTreeMap;

/// Metric name → stringified value.
///
/// Keys are unique and last write wins. Enumeration is in key order so
/// serialized reports are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MetricSet {
    values: BTreeMap<String, String>,
}

impl MetricSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    /// Current value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing has been set this cycle.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every metric; the next cycle starts clean.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Hand the current contents to a report and leave an empty set behind.
    pub fn take(&mut self) -> MetricSet {
        std::mem::take(self)
    }
}
