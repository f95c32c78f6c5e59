//! The stream a goal produces: a pull-based lazy sequence of contexts
//! (`spec.md` §5 "Scheduling model" — "a pull-based lazy sequence (a
//! generator-equivalent): each pull drives the deepest unfinished disjunct
//! to the next yielded context"). Rust's `Iterator` already has exactly
//! this shape, so no custom generator machinery is needed: `And`'s `mbind`
//! is `Iterator::flat_map`, and [`super::or::FairInterleave`] is a small
//! hand-written `Iterator` for `Or`'s round-robin `mconcat`.

use pyata_ir::Context;

/// A goal's lazily-produced solutions. Dropping a `GoalStream` mid-iteration
/// releases whatever it was holding (e.g. a fact-table snapshot) — ordinary
/// Rust drop semantics already give `spec.md` §5's "Cancellation" guarantee
/// for free.
pub type GoalStream = Box<dyn Iterator<Item = Context>>;
