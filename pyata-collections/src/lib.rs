//! Structural-sharing collections used throughout the `pyata` workspace:
//! a HAMT-style [`persistent_map`] and a [`cons`] list.
//!
//! Neither type is specific to the relational engine above it; both are
//! general-purpose immutable collections, kept in their own crate the way
//! the teacher keeps `chalk-ir` free of solver policy.

pub mod cons;
pub mod persistent_map;

pub use cons::Cons;
pub use persistent_map::PersistentMap;
