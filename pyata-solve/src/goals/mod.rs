//! Goals & connectives (`spec.md` §4.7).
//!
//! The original keys goal introspection ("is this goal `CtxSized`? is it
//! `Vared`?") by duck-typing: a goal either has a `ctx_size` method or it
//! doesn't. A systems-language translation of "maybe has this capability"
//! is an explicit sum type with the capability methods matching on kind
//! (per the DESIGN NOTES), rather than a `dyn Goal` trait object that
//! heuristics would need to downcast out of — so [`Goal`] is a closed enum,
//! not a trait object, and `free_vars`/`ctx_size`/`distribution` each
//! return `Option` to model "this kind doesn't expose that capability".

mod and;
mod or;
mod stream;

pub use and::{AndGoal, AndHeuristicData, AndHeuristicHook};
pub use or::{OrGoal, OrHeuristicData, OrHeuristicHook};
pub use stream::GoalStream;

use std::rc::Rc;

use rustc_hash::FxHashMap;

use pyata_ir::subst::{unify, Term};
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::relations::{FactsGoal, FreshRelGoal};

/// A value→row-count map for one variable, as exposed by `CtxSizedVared`
/// goals (`spec.md` §4.7, §4.8 "per-variable distribution").
pub type Distribution = FxHashMap<Var, FxHashMap<Term, u64>>;

/// A goal: `ctx -> lazy stream of contexts` (`spec.md` §4.7). Cloning a
/// `Goal` is cheap (each variant wraps an `Rc` or a small value), since
/// `And`/`Or` need to hand goals to closures captured inside their result
/// streams.
#[derive(Clone, Debug)]
pub enum Goal {
    Succeed,
    Fail,
    Eq(Term, Term),
    And(Rc<AndGoal>),
    Or(Rc<OrGoal>),
    Facts(Rc<FactsGoal>),
    Fresh(Rc<FreshRelGoal>),
}

impl Goal {
    /// Builds an `And` goal, collapsing the degenerate 0- and 1-goal cases
    /// per `spec.md` §4.7 (an empty conjunction trivially succeeds; a
    /// single-goal conjunction is that goal, not a wrapper around it).
    pub fn and(goals: Vec<Goal>) -> Goal {
        match goals.len() {
            0 => Goal::Succeed,
            1 => goals.into_iter().next().expect("len checked above"),
            _ => Goal::And(Rc::new(AndGoal::new(goals))),
        }
    }

    /// Builds an `Or` goal, collapsing the degenerate 0- and 1-goal cases
    /// (an empty disjunction never succeeds; a single-branch disjunction is
    /// that branch).
    pub fn or(goals: Vec<Goal>) -> Goal {
        match goals.len() {
            0 => Goal::Fail,
            1 => goals.into_iter().next().expect("len checked above"),
            _ => Goal::Or(Rc::new(OrGoal::new(goals))),
        }
    }

    /// `goal(ctx) -> stream` (`spec.md` §4.7).
    pub fn call(&self, ctx: Context) -> GoalStream {
        let ctx = bump_goal_invocations(ctx);
        match self {
            Goal::Succeed => Box::new(std::iter::once(ctx)),
            Goal::Fail => Box::new(std::iter::empty()),
            Goal::Eq(a, b) => {
                let result = unify(&ctx, a, b);
                if result.is_failed() {
                    Box::new(std::iter::empty())
                } else {
                    Box::new(std::iter::once(result))
                }
            }
            Goal::And(goal) => goal.call(ctx),
            Goal::Or(goal) => goal.call(ctx),
            Goal::Facts(goal) => goal.call(ctx),
            Goal::Fresh(goal) => goal.call(ctx),
        }
    }

    /// Every free (non-wildcard) variable this goal's shape names
    /// (`spec.md` §4.7 "union of subgoal free variables"). `None` for
    /// `Fresh`: its inner goal structure doesn't exist until invocation, so
    /// there is nothing to report ahead of time (the scope-barrier
    /// property `spec.md` §4.8 calls out).
    pub fn free_vars(&self) -> Option<Vec<Var>> {
        match self {
            Goal::Succeed | Goal::Fail => Some(Vec::new()),
            Goal::Eq(a, b) => Some(term_vars(a).into_iter().chain(term_vars(b)).collect()),
            Goal::And(goal) => Some(goal.free_vars()),
            Goal::Or(goal) => Some(goal.free_vars()),
            Goal::Facts(goal) => Some(goal.free_vars()),
            Goal::Fresh(_) => None,
        }
    }

    /// This goal's contextual size, if it is meaningfully sizeable
    /// (`spec.md` §4.7/§4.8 `CtxSized`). `Eq` and `Fresh` are not sized:
    /// unification's outcome (0 or 1) isn't a useful search-order signal,
    /// and a `Fresh` goal's size depends on an inner goal that doesn't
    /// exist yet.
    pub fn ctx_size(&self, ctx: &Context) -> Option<u64> {
        match self {
            Goal::Succeed => Some(1),
            Goal::Fail => Some(0),
            Goal::Eq(_, _) => None,
            Goal::And(goal) => goal.ctx_size(ctx),
            Goal::Or(goal) => goal.ctx_size(ctx),
            Goal::Facts(goal) => Some(goal.ctx_size(ctx)),
            Goal::Fresh(_) => None,
        }
    }

    /// Per-variable value distributions, if this goal exposes them
    /// (`spec.md` §4.8's `CtxSizedVared` capability). Only fact-table goals
    /// (and the synthetic relevance goals `HeurConjRelevance` builds on top
    /// of them) provide this directly; connectives don't aggregate their
    /// subgoals' distributions since heuristics only ever need it per
    /// individual conjunct.
    pub fn distribution(&self, ctx: &Context) -> Option<Distribution> {
        match self {
            Goal::Facts(goal) => Some(goal.distribution(ctx)),
            _ => None,
        }
    }

    /// True for goal kinds both `CtxSized` and `Vared` at once — the
    /// category `HeurConjChainVars` (`spec.md` §4.9) sorts on.
    pub fn is_ctx_sized_vared(&self, ctx: &Context) -> bool {
        self.ctx_size(ctx).is_some() && self.free_vars().is_some()
    }
}

fn bump_goal_invocations(ctx: Context) -> Context {
    let metrics = ctx
        .get_facet::<pyata_ir::metrics::MetricsFacet>()
        .increment(pyata_ir::metrics::counters::GOAL_INVOCATIONS);
    ctx.set_facet(metrics)
}

/// Every `Var` occurrence in `term`, recursing through `List`s. The
/// wildcard never counts as a free variable (it is never bound, so
/// nothing downstream cares that it was mentioned).
pub fn term_vars(term: &Term) -> Vec<Var> {
    match term {
        Term::Var(v) if !v.is_wildcard() => vec![*v],
        Term::Var(_) => Vec::new(),
        Term::List(items) => items.iter().flat_map(term_vars).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::vars::fresh;

    #[test]
    fn succeed_yields_ctx_unchanged() {
        let ctx = Context::new();
        let mut stream = Goal::Succeed.call(ctx.clone());
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
    }

    #[test]
    fn fail_yields_nothing() {
        let ctx = Context::new();
        let mut stream = Goal::Fail.call(ctx);
        assert!(stream.next().is_none());
    }

    #[test]
    fn eq_unifies_and_yields_once() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let goal = Goal::Eq(Term::Var(vars[0]), Term::Int(7));
        let mut stream = goal.call(ctx);
        let solved = stream.next().expect("unification should succeed");
        assert_eq!(pyata_ir::subst::walk(&solved, vars[0]), Term::Int(7));
        assert!(stream.next().is_none());
    }

    #[test]
    fn eq_mismatch_yields_nothing() {
        let ctx = Context::new();
        let goal = Goal::Eq(Term::Int(1), Term::Int(2));
        let mut stream = goal.call(ctx);
        assert!(stream.next().is_none());
    }

    #[test]
    fn and_of_one_goal_collapses_to_that_goal() {
        let goal = Goal::and(vec![Goal::Succeed]);
        assert!(matches!(goal, Goal::Succeed));
    }

    #[test]
    fn or_of_zero_goals_is_fail() {
        let goal = Goal::or(vec![]);
        assert!(matches!(goal, Goal::Fail));
    }

    #[test]
    fn term_vars_recurses_into_lists() {
        let (ctx, vars) = fresh(&Context::new(), None, 2);
        let _ = ctx;
        let term = Term::List(Rc::new(vec![Term::Var(vars[0]), Term::Int(1), Term::Var(vars[1])]));
        let found = term_vars(&term);
        assert_eq!(found, vec![vars[0], vars[1]]);
    }
}
