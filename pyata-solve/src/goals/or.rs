//! `Or(goals…)`: fair interleaving (`mconcat`), `spec.md` §4.7.

use std::fmt;
use std::rc::Rc;

use pyata_ir::hooks::PipelineHooks;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::constraints::Constraint;

use super::stream::GoalStream;
use super::Goal;

/// `Or.hook_heuristic`'s payload, mirroring [`super::and::AndHeuristicData`].
/// No built-in heuristic registers here (`spec.md` §4.9 names none for
/// `Or`); the hook is still surfaced rather than dropped, so a caller that
/// wants disjunction-level reordering or constraint injection has
/// somewhere to put it, consistent with `And` (see `DESIGN.md`).
#[derive(Clone)]
pub struct OrHeuristicData {
    pub goals: Vec<Goal>,
    pub constraints: Vec<Rc<dyn Constraint>>,
}

#[derive(Clone, Default)]
pub struct OrHeuristicHook(pub PipelineHooks<OrHeuristicData>);

pub struct OrGoal {
    goals: Vec<Goal>,
}

impl fmt::Debug for OrGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrGoal").field("arity", &self.goals.len()).finish()
    }
}

impl OrGoal {
    pub fn new(goals: Vec<Goal>) -> Self {
        OrGoal { goals }
    }

    pub fn call(&self, ctx: Context) -> GoalStream {
        let hook = ctx.get_facet::<OrHeuristicHook>();
        let data = OrHeuristicData {
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

        let streams: Vec<GoalStream> = data
            .goals
            .into_iter()
            .map(|goal| goal.call(ctx.clone()))
            .collect();
        Box::new(FairInterleave { streams, idx: 0 })
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

    /// Sum of every subgoal's contextual size, only if every subgoal is
    /// itself `CtxSized` (`spec.md` §4.7 "Size: sum of CtxSized subgoal
    /// sizes").
    pub fn ctx_size(&self, ctx: &Context) -> Option<u64> {
        self.goals
            .iter()
            .try_fold(0u64, |acc, goal| goal.ctx_size(ctx).map(|size| acc + size))
    }
}

/// Draws from each live sub-stream round-robin, one element at a time,
/// dropping a sub-stream once it is exhausted (`spec.md` §4.7, §5: "no
/// finite sub-stream is starved by an infinite peer").
struct FairInterleave {
    streams: Vec<GoalStream>,
    idx: usize,
}

impl Iterator for FairInterleave {
    type Item = Context;

    fn next(&mut self) -> Option<Context> {
        loop {
            if self.streams.is_empty() {
                return None;
            }
            let i = self.idx % self.streams.len();
            match self.streams[i].next() {
                Some(ctx) => {
                    self.idx = i + 1;
                    return Some(ctx);
                }
                None => {
                    self.streams.remove(i);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{walk, Term};
    use pyata_ir::vars::fresh;

    #[test]
    fn or_yields_a_solution_per_branch() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let goal = Goal::or(vec![
            Goal::Eq(Term::Var(vars[0]), Term::Int(1)),
            Goal::Eq(Term::Var(vars[0]), Term::Int(2)),
        ]);
        let solutions: Vec<Term> = goal
            .call(ctx)
            .map(|solved| walk(&solved, vars[0]))
            .collect();
        assert_eq!(solutions.len(), 2);
        assert!(solutions.contains(&Term::Int(1)));
        assert!(solutions.contains(&Term::Int(2)));
    }

    #[test]
    fn fair_interleave_draws_round_robin() {
        let a: GoalStream = Box::new(vec![Context::new(), Context::new()].into_iter());
        let b: GoalStream = Box::new(vec![Context::new()].into_iter());
        let mut interleaved = FairInterleave {
            streams: vec![a, b],
            idx: 0,
        };
        assert!(interleaved.next().is_some());
        assert!(interleaved.next().is_some());
        assert!(interleaved.next().is_some());
        assert!(interleaved.next().is_none());
    }

    #[test]
    fn ctx_size_is_sum_when_all_sized() {
        let ctx = Context::new();
        let or = OrGoal::new(vec![Goal::Succeed, Goal::Fail]);
        assert_eq!(or.ctx_size(&ctx), Some(1));
    }
}
