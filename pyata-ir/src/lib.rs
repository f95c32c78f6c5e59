//! `pyata-ir`: the immutable context, facets, hook registries, variables,
//! substitutions and unification at the base of the `pyata` workspace
//! (`spec.md` §3, §4.1-§4.6, §4.11).
//!
//! Layered below `pyata-solve` (constraints, goals, relations, heuristics)
//! and `pyata-integration` (the solver), the way the teacher layers
//! `chalk-ir` below `chalk-solve`: this crate knows nothing about goals,
//! relations or the search heuristics built on top of it.

pub mod context;
pub mod error;
pub mod facet;
pub mod hooks;
pub mod hypotheticals;
pub mod installations;
pub mod metrics;
pub mod subst;
pub mod unify;
pub mod vars;

pub use context::Context;
pub use error::{Error, ErrorKind, Result};
pub use subst::{sub, walk, walk_condensing, walk_reify, Term};
pub use unify::unify;
pub use vars::{fresh, Reifier, Var, VarAssumptions};
