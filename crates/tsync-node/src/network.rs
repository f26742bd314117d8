//! Connectivity gate between node pairs.
//!
//! Simulates field connectivity: a pair of nodes is either connected or
//! disconnected, symmetrically. Sync between a disconnected pair is refused
//! without touching either node.

use crate::error::Result;
use crate::node::{Node, SyncResult};
use parking_lot::RwLock;
use std::collections::HashSet;
use tracing::{debug, info};

/// Unordered pair of node ids.
type Link = (String, String);

fn link(a: &str, b: &str) -> Link {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Tracks which node pairs are currently cut off from each other.
///
/// Every pair is connected until [`disconnect`](Self::disconnect) is called.
#[derive(Debug, Default)]
pub struct NetworkController {
    disconnected: RwLock<HashSet<Link>>,
}

impl NetworkController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cut the link between `a` and `b` in both directions.
    pub fn disconnect(&self, a: &str, b: &str) {
        if self.disconnected.write().insert(link(a, b)) {
            info!(a, b, "link down");
        }
    }

    /// Restore the link between `a` and `b`.
    pub fn connect(&self, a: &str, b: &str) {
        if self.disconnected.write().remove(&link(a, b)) {
            info!(a, b, "link up");
        }
    }

    /// Is the pair currently connected? Symmetric.
    pub fn can_communicate(&self, a: &str, b: &str) -> bool {
        !self.disconnected.read().contains(&link(a, b))
    }

    /// Disconnect every pair among `nodes`.
    pub fn partition_all(&self, nodes: &[&Node]) {
        let mut disconnected = self.disconnected.write();
        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                disconnected.insert(link(a.id(), b.id()));
            }
        }
        info!(nodes = nodes.len(), "network partitioned");
    }

    /// Reconnect every pair.
    pub fn heal_all(&self) {
        let mut disconnected = self.disconnected.write();
        let restored = disconnected.len();
        disconnected.clear();
        info!(restored, "network healed");
    }

    /// Number of pairs currently cut off.
    pub fn disconnected_count(&self) -> usize {
        self.disconnected.read().len()
    }

    /// Sync `a` with `b` in both directions if the pair is connected.
    ///
    /// Returns `Ok(None)` when the link is down; neither node is touched.
    /// Otherwise `a` pulls from `b`, then `b` pulls from `a`, and the two
    /// results are summed.
    pub fn try_sync(&self, a: &Node, b: &Node) -> Result<Option<SyncResult>> {
        if !self.can_communicate(a.id(), b.id()) {
            debug!(a = %a.id(), b = %b.id(), "sync blocked, link down");
            return Ok(None);
        }

        let mut result = a.sync_with(b)?;
        result += b.sync_with(a)?;
        Ok(Some(result))
    }
}
