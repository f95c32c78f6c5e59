//! `HeurFactsOrdRnd` (`spec.md` §4.9).

use rand::seq::SliceRandom;

use pyata_ir::hooks::{Effect, Outcome};
use pyata_ir::installations::Installable;
use pyata_ir::Context;

use crate::relations::FactsOrderHook;

/// Randomizes the row order every `FactsGoal` sees (`spec.md` §4.8's
/// `hook_facts` pipeline) so a pathological fact-table ordering cannot bias
/// which rows a search explores first — e.g. a table sorted by the value
/// that happens to fail fastest would otherwise make every run pay for that
/// same worst case.
pub struct HeurFactsOrdRnd;

impl Installable for HeurFactsOrdRnd {
    const NAME: &'static str = "pyata_solve::heuristics::facts_ord_rnd";

    fn install(&self, ctx: &Context) -> Context {
        let hook = ctx.get_facet::<FactsOrderHook>();
        let hook = FactsOrderHook(hook.0.register(Effect::Pure, |ctx, mut rows| {
            let mut rng = rand::thread_rng();
            rows.shuffle(&mut rng);
            Outcome::Continue(ctx, rows)
        }));
        ctx.set_facet(hook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{walk, Term};
    use pyata_ir::vars::fresh;

    use crate::relations::Relation;

    #[test]
    fn shuffling_does_not_change_the_solution_set() {
        let ctx = Context::new();
        let ctx = pyata_ir::installations::install(&ctx, &HeurFactsOrdRnd);
        let (ctx, vars) = fresh(&ctx, None, 1);
        let rel = Relation::new(
            "digits",
            vec![vec![Term::Int(0)], vec![Term::Int(1)], vec![Term::Int(2)], vec![Term::Int(3)]],
        )
        .unwrap();
        let goal = rel.call(vec![Term::Var(vars[0])]).unwrap();
        let mut solutions: Vec<i64> = goal
            .call(ctx)
            .map(|solved| match walk(&solved, vars[0]) {
                Term::Int(n) => n,
                _ => unreachable!(),
            })
            .collect();
        solutions.sort_unstable();
        assert_eq!(solutions, vec![0, 1, 2, 3]);
    }
}
