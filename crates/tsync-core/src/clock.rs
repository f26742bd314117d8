//! Vector clocks for tracking causal history.
//!
//! Each clock maps an originator (node id) to the number of mutations that
//! originator has performed, as far as the holder of the clock knows. Counters
//! only move forward: the sole mutations are [`VectorClock::increment`] and
//! [`VectorClock::merge`] (component-wise max). Absent originators read as 0.

use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Causal relationship between two clocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CausalOrder {
    /// This clock happened before the other.
    Before,
    /// This clock happened after the other.
    After,
    /// The clocks are identical.
    Equal,
    /// Neither clock precedes the other.
    Concurrent,
}

impl CausalOrder {
    /// True when one side strictly dominates the other.
    pub fn is_causal(self) -> bool {
        matches!(self, CausalOrder::Before | CausalOrder::After)
    }

    /// True when no causal order exists (`Equal` or `Concurrent`).
    pub fn needs_tie_break(self) -> bool {
        !self.is_causal()
    }

    /// The ordering seen from the other side.
    pub fn reverse(self) -> Self {
        match self {
            CausalOrder::Before => CausalOrder::After,
            CausalOrder::After => CausalOrder::Before,
            other => other,
        }
    }
}

/// Per-originator logical counters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VectorClock {
    clocks: BTreeMap<String, u64>,
}

impl VectorClock {
    /// Create an empty clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock from `(originator, counter)` pairs.
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, u64)>) -> Self {
        Self {
            clocks: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Counter for an originator (0 if never seen).
    pub fn get(&self, originator: &str) -> u64 {
        self.clocks.get(originator).copied().unwrap_or(0)
    }

    /// Increment the counter for `originator`, returning the new value.
    pub fn increment(&mut self, originator: &str) -> u64 {
        let counter = self.clocks.entry(originator.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Merge with another clock (component-wise max).
    pub fn merge(&mut self, other: &VectorClock) {
        for (originator, &counter) in &other.clocks {
            let current = self.clocks.entry(originator.clone()).or_insert(0);
            *current = (*current).max(counter);
        }
    }

    /// Create a merged clock without modifying self.
    pub fn merged_with(&self, other: &VectorClock) -> VectorClock {
        self.join(other)
    }

    /// Compare with another clock over the union of both keyspaces.
    pub fn compare(&self, other: &VectorClock) -> CausalOrder {
        let originators: BTreeSet<&String> =
            self.clocks.keys().chain(other.clocks.keys()).collect();

        let mut this_le = true;
        let mut other_le = true;

        for originator in originators {
            let mine = self.get(originator);
            let theirs = other.get(originator);
            if mine > theirs {
                this_le = false;
            }
            if theirs > mine {
                other_le = false;
            }
        }

        match (this_le, other_le) {
            (true, true) => CausalOrder::Equal,
            (true, false) => CausalOrder::Before,
            (false, true) => CausalOrder::After,
            (false, false) => CausalOrder::Concurrent,
        }
    }

    /// True if every component of self is ≥ the matching component of other.
    pub fn dominates(&self, other: &VectorClock) -> bool {
        other.leq(self)
    }

    /// Iterate over `(originator, counter)` pairs in originator order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.clocks.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of originators tracked.
    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }
}

impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == CausalOrder::Equal
    }
}

impl Eq for VectorClock {}

impl Lattice for VectorClock {
    fn bottom() -> Self {
        Self::new()
    }

    fn join_assign(&mut self, other: &Self) {
        self.merge(other);
    }

    fn leq(&self, other: &Self) -> bool {
        matches!(self.compare(other), CausalOrder::Before | CausalOrder::Equal)
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let items: Vec<String> = self
            .clocks
            .iter()
            .map(|(originator, counter)| format!("{}:{}", originator, counter))
            .collect();
        write!(f, "{{{}}}", items.join(", "))
    }
}
