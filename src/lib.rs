//! A relational (miniKanren-family) programming engine.
//!
//! This crate is a thin facade: the actual engine lives across
//! `pyata-collections` (persistent data structures), `pyata-ir`
//! (context/facets, hooks, variables, substitution, unification),
//! `pyata-solve` (goals, relations, constraints, search heuristics) and
//! `pyata-integration` (the `Solver` and runtime configuration), with
//! `pyata-macros` underneath providing the debug logging both `pyata-ir`
//! and downstream crates call into. Grounded on the root `chalk` crate's
//! own `lib.rs`, which re-exports `chalk_solve`/`chalk_ir`/`chalk_engine`
//! rather than defining anything itself — a caller depends on `pyata` and
//! gets the whole engine's public surface without naming every member
//! crate.
//!
//! A minimal query looks like:
//!
//! ```
//! use pyata::{Goal, Solver, Term};
//!
//! let solver = Solver::fresh(None, 1, None, |vars| {
//!     Goal::Eq(Term::Var(vars[0]), Term::Int(42))
//! });
//! let solutions: Vec<Vec<Term>> = solver.collect();
//! assert_eq!(solutions, vec![vec![Term::Int(42)]]);
//! ```

pub use pyata_collections::{Cons, PersistentMap};

pub use pyata_ir::context::Context;
pub use pyata_ir::error::{Error, ErrorKind, Result};
pub use pyata_ir::facet::{NamedFacet, Slot};
pub use pyata_ir::hooks::{
    BroadcastHooks, BroadcastKey, Effect, EventHooks, FacetOp, HookKey, HooksFacet, Outcome,
    PipelineHooks,
};
pub use pyata_ir::installations::{install as install_heuristic, Installable};
pub use pyata_ir::metrics::{counters, MetricsFacet};
pub use pyata_ir::subst::{sub, walk, walk_condensing, walk_reify, Term};
pub use pyata_ir::unify::unify;
pub use pyata_ir::vars::{fresh, contextualize, Reifier, Var, VarAssumptions};

pub use pyata_solve::constraints::{
    install as install_constraint, install_machinery as install_constraint_machinery,
    CardinalityProduct, Constraint, Distinct, Neq, Notin, NotinSubject,
};
pub use pyata_solve::goals::{
    AndGoal, AndHeuristicData, AndHeuristicHook, Distribution, Goal, GoalStream, OrGoal,
    OrHeuristicData, OrHeuristicHook,
};
pub use pyata_solve::heuristics::{
    install_default_and_heuristics, HeurConjCardinality, HeurConjChainVars, HeurConjRelevance,
    HeurFactsOrdRnd,
};
pub use pyata_solve::relations::{FactsGoal, FactsOrderHook, FreshRelGoal, Relation};

pub use pyata_integration::{settings, Settings, Solver};
