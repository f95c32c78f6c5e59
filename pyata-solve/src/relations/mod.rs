//! Fact-table relations and the `FreshRel` scope barrier (`spec.md` §4.8).

mod facts;
mod fresh_rel;

pub use facts::{FactsGoal, FactsOrderHook, Relation};
pub use fresh_rel::FreshRelGoal;
