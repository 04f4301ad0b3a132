//! Variant selections: the product options a shopper picked.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chosen value per variant axis (e.g. `color = "red"`, `size = "M"`).
///
/// Backed by a sorted map, so two selections built in different key orders
/// compare equal and serialize identically.
///
/// ```
/// use shopfront_core::VariantSelection;
///
/// let a = VariantSelection::from_pairs([("color", "red"), ("size", "M")]);
/// let b = VariantSelection::from_pairs([("size", "M"), ("color", "red")]);
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantSelection(BTreeMap<String, String>);

impl VariantSelection {
    /// An empty selection, for products without options.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a selection from `(axis, value)` pairs. Later pairs win on
    /// duplicate axes.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Set the value for an axis, returning the previous one.
    pub fn insert(&mut self, axis: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(axis.into(), value.into())
    }

    /// Chosen value for an axis.
    #[must_use]
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.0.get(axis).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate `(axis, value)` pairs in axis order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Human-readable label such as `"red / M"`, or `None` when empty.
    #[must_use]
    pub fn label(&self) -> Option<String> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.values().map(String::as_str).collect::<Vec<_>>().join(" / "))
    }
}

impl fmt::Display for VariantSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (axis, value) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{axis}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariantSelection {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}
