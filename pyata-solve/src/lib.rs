//! `pyata-solve`: constraints, goals/connectives, fact-table relations and
//! conjunction heuristics (`spec.md` §4.6-§4.9).
//!
//! Layered above `pyata-ir` the way the teacher's `chalk-solve` sits above
//! `chalk-ir`: this crate knows what a goal, a constraint and a relation
//! are, but nothing about how a caller assembles them into a query (that's
//! `pyata-integration`).

pub mod constraints;
pub mod goals;
pub mod heuristics;
pub mod relations;

#[cfg(test)]
mod scenarios;
