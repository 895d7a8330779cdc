use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named argument map used for both deployment flags and benchmark extras.
///
/// Backed by a [`BTreeMap`] so iteration (and therefore rendering) is sorted by name.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(pub BTreeMap<String, String>);

impl Arguments {
    /// Create an empty argument map.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns `true` if no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Insert or overwrite an argument.
    ///
    /// Returns `self` for chaining.
    pub fn insert<K, V>(&mut self, key: K, val: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.0.insert(key.into(), val.into());
        self
    }

    /// Get the value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    /// Returns `true` if the key is present (even with an empty value).
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate through all arguments as `(&str, &str)` pairs, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Layer `self` (the specific map) over `defaults`.
    ///
    /// Keys present in `self` always win; keys only present in `defaults` are inherited.
    /// The specific map is consumed: its identity becomes the merged result.
    pub fn merge_onto(mut self, defaults: &Arguments) -> Arguments {
        for (key, val) in defaults.0.iter() {
            self.0
                .entry(key.clone())
                .or_insert_with(|| val.clone());
        }
        self
    }
}

impl<K, V> FromIterator<(K, V)> for Arguments
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
