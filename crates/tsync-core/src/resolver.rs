//! Conflict resolution between two versions of the same report.
//!
//! Resolution is hybrid:
//! 1. Causal dominance: if one version's clock strictly follows the other,
//!    it wins outright.
//! 2. Otherwise (equal or concurrent clocks) a deterministic last-writer-wins
//!    rule picks the winner: later `last_modified`, then the greater
//!    `last_modified_by`.
//! 3. On that path the winner's LWW fields are kept as a unit, equipment from
//!    both sides is unioned and both clocks are merged, so the result
//!    causally dominates both inputs.
//!
//! The dominant branch does not re-union equipment. That is only sound
//! because every equipment mutation is accompanied by a clock increment on
//! the node that made it.

use crate::clock::CausalOrder;
use crate::error::{CoreError, Result};
use crate::lattice::Lattice;
use crate::record::IntelligenceReport;

/// Outcome of resolving a pair of versions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The resolved version.
    pub report: IntelligenceReport,
    /// Causal order of local relative to remote, before resolution.
    pub order: CausalOrder,
}

impl Resolution {
    /// True when the resolver had to fall back to the tie-break rule.
    pub fn was_conflict(&self) -> bool {
        self.order.needs_tie_break()
    }
}

/// Stateless resolver.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Resolve two optional versions of one report.
    ///
    /// Absent inputs are not errors: both absent yields `None`, one absent
    /// yields a copy of the other.
    pub fn resolve(
        local: Option<&IntelligenceReport>,
        remote: Option<&IntelligenceReport>,
    ) -> Result<Option<IntelligenceReport>> {
        match (local, remote) {
            (None, None) => Ok(None),
            (Some(only), None) | (None, Some(only)) => Ok(Some(only.clone())),
            (Some(local), Some(remote)) => Ok(Some(Self::resolve_pair(local, remote)?.report)),
        }
    }

    /// Resolve two present versions, also reporting their causal order.
    pub fn resolve_pair(
        local: &IntelligenceReport,
        remote: &IntelligenceReport,
    ) -> Result<Resolution> {
        if local.id != remote.id {
            return Err(CoreError::MismatchedIdentifiers {
                local: local.id.clone(),
                remote: remote.id.clone(),
            });
        }

        let order = local.clock.compare(&remote.clock);
        let report = match order {
            CausalOrder::After => local.clone(),
            CausalOrder::Before => remote.clone(),
            CausalOrder::Equal | CausalOrder::Concurrent => {
                if Self::remote_wins_tie_break(local, remote) {
                    Self::merge_into(remote, local)
                } else {
                    Self::merge_into(local, remote)
                }
            }
        };

        Ok(Resolution { report, order })
    }

    /// Resolve `local` against `remote`, then fold in `common`'s clock.
    ///
    /// The common ancestor only contributes causal history; it never changes
    /// LWW fields or equipment.
    pub fn three_way_merge(
        local: Option<&IntelligenceReport>,
        remote: Option<&IntelligenceReport>,
        common: Option<&IntelligenceReport>,
    ) -> Result<Option<IntelligenceReport>> {
        let mut resolved = Self::resolve(local, remote)?;
        if let (Some(report), Some(common)) = (resolved.as_mut(), common) {
            report.clock.merge(&common.clock);
        }
        Ok(resolved)
    }

    /// Later wall clock wins; ties go to the greater node id.
    fn remote_wins_tie_break(local: &IntelligenceReport, remote: &IntelligenceReport) -> bool {
        match remote.last_modified.cmp(&local.last_modified) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => {
                remote.last_modified_by.as_bytes() > local.last_modified_by.as_bytes()
            }
        }
    }

    fn merge_into(winner: &IntelligenceReport, loser: &IntelligenceReport) -> IntelligenceReport {
        let mut merged = winner.clone();
        merged.equipment.join_assign(&loser.equipment);
        merged.clock.join_assign(&loser.clock);
        merged
    }
}
