//! `And(goals…)` (`spec.md` §4.7).

use std::fmt;
use std::rc::Rc;

use pyata_ir::hooks::PipelineHooks;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::constraints::Constraint;

use super::stream::GoalStream;
use super::Goal;

/// The payload threaded through `And.hook_heuristic`: the goal tuple and
/// the constraint set accumulated so far (`spec.md` §4.9: "(ctx, (connective,
/// constraints, goals)) -> (ctx, (connective, constraints', goals'))"). The
/// `connective` tag the original payload carries is dropped here — `And`
/// and `Or` each get their own hook/payload type (this one, and
/// [`super::or::OrHeuristicData`]), so there is nothing left for a
/// connective discriminant to distinguish (see `DESIGN.md`).
#[derive(Clone)]
pub struct AndHeuristicData {
    pub goals: Vec<Goal>,
    pub constraints: Vec<Rc<dyn Constraint>>,
}

/// `And.hook_heuristic`: conjunction heuristics (`HeurConjCardinality`,
/// `HeurConjChainVars`, `HeurConjRelevance`, `spec.md` §4.9) register here.
#[derive(Clone, Default)]
pub struct AndHeuristicHook(pub PipelineHooks<AndHeuristicData>);

pub struct AndGoal {
    goals: Vec<Goal>,
}

impl fmt::Debug for AndGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndGoal").field("arity", &self.goals.len()).finish()
    }
}

impl AndGoal {
    pub fn new(goals: Vec<Goal>) -> Self {
        AndGoal { goals }
    }

    /// Runs the configured conjunction heuristics, installs the resulting
    /// constraints, then builds the `mbind` stream over the (possibly
    /// reordered) goals — all three steps `spec.md` §4.7 requires to happen
    /// before the stream is built, run fresh on every `call` so each
    /// invocation sees the context it is actually called with.
    pub fn call(&self, ctx: Context) -> GoalStream {
        let hook = ctx.get_facet::<AndHeuristicHook>();
        let data = AndHeuristicData {
            goals: self.goals.clone(),
            constraints: Vec::new(),
        };
        let (ctx, data) = hook.0.run(ctx, data);

        let mut ctx = ctx;
        for constraint in data.constraints {
            ctx = crate::constraints::install(&ctx, constraint);
            if ctx.is_failed() {
                return Box::new(std::iter::once(ctx));
            }
        }

        build_chain(ctx, data.goals)
    }

    pub fn free_vars(&self) -> Vec<Var> {
        use itertools::Itertools;
        self.goals
            .iter()
            .filter_map(Goal::free_vars)
            .flatten()
            .sorted_by_key(Var::id)
            .dedup()
            .collect()
    }

    /// Product of every subgoal's contextual size, only if every subgoal is
    /// itself `CtxSized` (`spec.md` §4.7).
    pub fn ctx_size(&self, ctx: &Context) -> Option<u64> {
        self.goals
            .iter()
            .try_fold(1u64, |acc, goal| goal.ctx_size(ctx).map(|size| acc * size))
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }
}

fn build_chain(ctx: Context, goals: Vec<Goal>) -> GoalStream {
    let mut goals = goals.into_iter();
    let first = match goals.next() {
        Some(goal) => goal,
        None => return Box::new(std::iter::once(ctx)),
    };
    let mut stream: GoalStream = first.call(ctx);
    for goal in goals {
        stream = Box::new(stream.flat_map(move |next_ctx| goal.call(next_ctx)));
    }
    stream
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{walk, Term};
    use pyata_ir::vars::fresh;

    #[test]
    fn conjoins_two_eq_goals() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let goal = Goal::and(vec![
            Goal::Eq(Term::Var(vars[0]), Term::Int(1)),
            Goal::Eq(Term::Var(vars[1]), Term::Int(2)),
        ]);
        let mut stream = goal.call(ctx);
        let solved = stream.next().expect("both equalities should unify");
        assert_eq!(walk(&solved, vars[0]), Term::Int(1));
        assert_eq!(walk(&solved, vars[1]), Term::Int(2));
        assert!(stream.next().is_none());
    }

    #[test]
    fn fails_when_any_conjunct_fails() {
        let ctx = Context::new();
        let goal = Goal::and(vec![
            Goal::Eq(Term::Int(1), Term::Int(1)),
            Goal::Eq(Term::Int(1), Term::Int(2)),
        ]);
        let mut stream = goal.call(ctx);
        assert!(stream.next().is_none());
    }

    #[test]
    fn ctx_size_is_product_when_all_sized() {
        let ctx = Context::new();
        let and = AndGoal::new(vec![Goal::Succeed, Goal::Succeed]);
        assert_eq!(and.ctx_size(&ctx), Some(1));
    }
}
