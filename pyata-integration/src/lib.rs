//! Configuration and the top-level `Solver` (`spec.md` §4.10, §6).
//!
//! Plays the role the teacher's `chalk-integration` crate plays relative to
//! `chalk-solve`: the outermost crate that wires the lower layers
//! (`pyata-ir`'s context/unification, `pyata-solve`'s goals/constraints/
//! heuristics) into something a caller constructs directly.

#[macro_use]
extern crate lazy_static;

mod config;
mod solver;

pub use config::{settings, Settings};
pub use solver::Solver;
