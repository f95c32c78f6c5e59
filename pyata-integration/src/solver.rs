//! The top-level `Solver` (`spec.md` §4.10, §6 "Solver").
//!
//! Grounded on the shape `chalk-solve::Solver` presents to a caller (own the
//! search state, hand back solutions one at a time) rather than its
//! fixed-point SLG tabling algorithm, which has no counterpart here: this
//! engine's goals already reduce to a lazy pull-based `Iterator`
//! (`pyata_solve::goals::GoalStream`), so the solver's own job is just to
//! own that stream plus the query's variables, wire up the constraint
//! machinery and substitution metrics once at construction, and reify each
//! solution as it is pulled.

use std::rc::Rc;

use pyata_ir::installations::Installable;
use pyata_ir::subst::Term;
use pyata_ir::vars::{fresh, walk_and_reify_all, Reifier, Var};
use pyata_ir::Context;
use pyata_solve::goals::{Goal, GoalStream};

/// Marker [`pyata_ir::installations::install`] uses to guard the
/// substitutions-counter hook so a `Solver` built from a context another
/// `Solver` already instrumented doesn't double-count.
struct SubstitutionCounter;

impl Installable for SubstitutionCounter {
    const NAME: &'static str = "pyata_integration::substitution_counter";

    fn install(&self, ctx: &Context) -> Context {
        let hook = ctx.get_facet::<pyata_ir::subst::SubstitutionHook>();
        let hook = pyata_ir::subst::SubstitutionHook(hook.0.register(
            pyata_ir::hooks::Effect::Effectful,
            |ctx, pair: (Var, Term)| {
                let metrics = ctx
                    .get_facet::<pyata_ir::metrics::MetricsFacet>()
                    .increment(pyata_ir::metrics::counters::SUBSTITUTIONS);
                let ctx = ctx.set_facet(metrics);
                pyata_ir::hooks::Outcome::Continue(ctx, pair)
            },
        ));
        ctx.set_facet(hook)
    }
}

/// Drives a goal to its solutions, one at a time (`spec.md` §4.10). A
/// `Solver` owns the query's free variables and the `GoalStream` pulling
/// from them; each [`Iterator::next`] call pulls one more context off the
/// stream and reifies the query variables against it.
pub struct Solver {
    query_vars: Vec<Var>,
    stream: GoalStream,
    latest: Option<Context>,
}

impl Solver {
    /// Builds a solver over `goal` starting from `ctx`, reporting `vars` as
    /// the query's output tuple on every solution. Installs the constraint
    /// substitution-hook machinery and the substitutions counter
    /// (`spec.md` §4.10 steps 3-4) before invoking `goal`, so both are in
    /// place no matter what the goal itself installs.
    pub fn new(ctx: Context, vars: Vec<Var>, goal: Goal) -> Self {
        let ctx = pyata_solve::constraints::install_machinery(&ctx);
        let ctx = pyata_ir::installations::install(&ctx, &SubstitutionCounter);
        let stream = goal.call(ctx);
        Solver {
            query_vars: vars,
            stream,
            latest: None,
        }
    }

    /// `spec.md` §6's `Solver.Fresh(goal, reifier, num, ctx?)`: allocates
    /// `num` fresh query variables (all sharing `reifier`, or the identity
    /// reifier if `None`) against `ctx` (or a new one), then asks `build`
    /// for the root goal over those variables.
    pub fn fresh<F>(
        reifier: Option<Rc<dyn Reifier>>,
        num: usize,
        ctx: Option<Context>,
        build: F,
    ) -> Self
    where
        F: FnOnce(&[Var]) -> Goal,
    {
        let ctx = ctx.unwrap_or_default();
        let (ctx, vars) = fresh(&ctx, reifier, num);
        let goal = build(&vars);
        Solver::new(ctx, vars, goal)
    }

    /// The query's output variables, in allocation/reporting order.
    pub fn query_vars(&self) -> &[Var] {
        &self.query_vars
    }

    /// The most recently solved context, if `next` has yielded at least
    /// once (`spec.md` §4.10's `latest_solution`). Lets a caller inspect
    /// facets (metrics, bound variables outside the query tuple) beyond
    /// just the reified output.
    pub fn latest_solution(&self) -> Option<&Context> {
        self.latest.as_ref()
    }

    /// Reifies an arbitrary variable tuple against the last solved
    /// context, independent of the solver's own query-variable
    /// projection — lets a caller inspect a variable that wasn't part of
    /// the original query tuple.
    pub fn reify(&self, vars: &[Var]) -> Option<Vec<Term>> {
        self.latest.as_ref().map(|ctx| walk_and_reify_all(ctx, vars))
    }
}

impl Iterator for Solver {
    type Item = Vec<Term>;

    fn next(&mut self) -> Option<Self::Item> {
        let ctx = self.stream.next()?;
        let reified = walk_and_reify_all(&ctx, &self.query_vars);
        self.latest = Some(ctx);
        Some(reified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::Term;
    use pyata_solve::relations::Relation;

    #[test]
    fn yields_reified_solutions_in_stream_order() {
        let solver = Solver::fresh(None, 1, None, |vars| {
            Goal::Eq(Term::Var(vars[0]), Term::Int(42))
        });
        let solutions: Vec<Vec<Term>> = solver.collect();
        assert_eq!(solutions, vec![vec![Term::Int(42)]]);
    }

    #[test]
    fn latest_solution_tracks_the_last_pulled_context() {
        let mut solver = Solver::fresh(None, 1, None, |vars| {
            Goal::Eq(Term::Var(vars[0]), Term::Int(7))
        });
        assert!(solver.latest_solution().is_none());
        let _ = solver.next();
        assert!(solver.latest_solution().is_some());
        assert_eq!(
            pyata_ir::subst::walk(solver.latest_solution().unwrap(), solver.query_vars()[0]),
            Term::Int(7)
        );
    }

    #[test]
    fn constraint_machinery_is_installed_without_any_goal_installing_one() {
        let rel = Relation::new("digits", vec![vec![Term::Int(1)], vec![Term::Int(2)]]).unwrap();
        let solver = Solver::fresh(None, 1, None, |vars| {
            rel.call(vec![Term::Var(vars[0])]).unwrap()
        });
        let solutions: Vec<Vec<Term>> = solver.collect();
        assert_eq!(solutions.len(), 2);
    }

    #[test]
    fn empty_stream_yields_no_solutions() {
        let solver = Solver::fresh(None, 1, None, |_vars| Goal::Fail);
        let solutions: Vec<Vec<Term>> = solver.collect();
        assert!(solutions.is_empty());
    }
}
