//! Merge order shared by the replicated parts of a report.
//!
//! Vector clocks and the equipment set are join-semilattices: merging is
//! commutative, associative and idempotent, and never loses information.
//! The record as a whole is not a lattice; it converges because its
//! mergeable parts do and its LWW fields follow a total tie-break order.

/// State that merges by least upper bound.
pub trait Lattice: Clone {
    /// The state every replica starts from; joining it changes nothing.
    fn bottom() -> Self;

    /// Merge `other` into self in place.
    fn join_assign(&mut self, other: &Self);

    /// True if self carries nothing that `other` lacks.
    ///
    /// Must agree with join: `a.leq(&b)` iff `a.join(&b) == b`.
    fn leq(&self, other: &Self) -> bool;

    /// Least upper bound, leaving both inputs untouched.
    fn join(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        joined.join_assign(other);
        joined
    }
}
