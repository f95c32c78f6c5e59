//! `HeurConjCardinality` (`spec.md` §4.9).

use std::rc::Rc;

use rustc_hash::FxHashMap;

use pyata_ir::hooks::Effect;
use pyata_ir::installations::Installable;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::constraints::CardinalityProduct;
use crate::goals::{AndHeuristicData, AndHeuristicHook, Goal};

/// Adds, per shared variable (one mentioned by more than one conjunct), a
/// [`CardinalityProduct`] constraint over the `CtxSized` goals that mention
/// it — so the conjunction fails fast when any shared variable's joint
/// cardinality across that cluster hits zero, before a single row is
/// actually scanned.
pub struct HeurConjCardinality;

impl Installable for HeurConjCardinality {
    const NAME: &'static str = "pyata_solve::heuristics::conj_cardinality";

    fn install(&self, ctx: &Context) -> Context {
        let hook = ctx.get_facet::<AndHeuristicHook>();
        let hook = AndHeuristicHook(hook.0.register(Effect::Pure, |ctx, data: AndHeuristicData| {
            let data = add_cardinality_constraints(&ctx, data);
            pyata_ir::hooks::Outcome::Continue(ctx, data)
        }));
        ctx.set_facet(hook)
    }
}

fn add_cardinality_constraints(ctx: &Context, data: AndHeuristicData) -> AndHeuristicData {
    let mut var_to_idxs: FxHashMap<Var, Vec<usize>> = FxHashMap::default();
    for (i, goal) in data.goals.iter().enumerate() {
        if let Some(vars) = goal.free_vars() {
            for v in vars {
                var_to_idxs.entry(v).or_default().push(i);
            }
        }
    }

    let mut constraints = data.constraints.clone();
    let mut shared_vars: Vec<Var> = var_to_idxs
        .iter()
        .filter(|(_, idxs)| idxs.len() > 1)
        .map(|(v, _)| *v)
        .collect();
    shared_vars.sort_by_key(Var::id);

    for var in shared_vars {
        let idxs = &var_to_idxs[&var];
        let sized_idxs: Vec<usize> = idxs
            .iter()
            .copied()
            .filter(|&i| data.goals[i].ctx_size(ctx).is_some())
            .collect();
        if sized_idxs.len() < 2 {
            continue;
        }
        let sizes: Vec<Rc<dyn Fn(&Context) -> u64>> = sized_idxs
            .iter()
            .map(|&i| {
                let goal: Goal = data.goals[i].clone();
                Rc::new(move |ctx: &Context| goal.ctx_size(ctx).unwrap_or(0)) as Rc<dyn Fn(&Context) -> u64>
            })
            .collect();
        constraints.push(Rc::new(CardinalityProduct::new(vec![var], sizes)));
    }

    AndHeuristicData {
        goals: data.goals,
        constraints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::Term;
    use pyata_ir::vars::fresh;

    use crate::relations::Relation;

    #[test]
    fn recheck_fails_once_a_later_binding_empties_a_sized_goal() {
        // `rel` is shared between two conjuncts over the same variable; once
        // an earlier `Eq` binds that variable to a value absent from `rel`'s
        // table, the installed cardinality-product constraint should catch
        // it on the very next substitution rather than waiting for `rel`'s
        // own row scan to come up empty.
        let ctx = Context::new();
        let ctx = pyata_ir::installations::install(&ctx, &HeurConjCardinality);
        let (ctx, vars) = fresh(&ctx, None, 1);

        let rel = Relation::new("r", vec![vec![Term::Int(1)], vec![Term::Int(2)]]).unwrap();
        let g1 = rel.call(vec![Term::Var(vars[0])]).unwrap();
        let g2 = rel.call(vec![Term::Var(vars[0])]).unwrap();

        let conj = Goal::and(vec![Goal::Eq(Term::Var(vars[0]), Term::Int(5)), g1, g2]);
        let mut stream = conj.call(ctx);
        assert!(stream.next().is_none());
    }

    #[test]
    fn does_not_disturb_a_satisfiable_conjunction() {
        let ctx = Context::new();
        let ctx = pyata_ir::installations::install(&ctx, &HeurConjCardinality);
        let (ctx, vars) = fresh(&ctx, None, 1);

        let rel = Relation::new("r", vec![vec![Term::Int(1)], vec![Term::Int(2)]]).unwrap();
        let g1 = rel.call(vec![Term::Var(vars[0])]).unwrap();
        let g2 = rel.call(vec![Term::Var(vars[0])]).unwrap();

        let conj = Goal::and(vec![g1, g2]);
        let mut stream = conj.call(ctx);
        assert!(stream.next().is_some());
    }

    #[test]
    fn no_shared_vars_means_no_constraints_added() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let data = AndHeuristicData {
            goals: vec![
                Goal::Eq(Term::Var(vars[0]), Term::Int(1)),
                Goal::Eq(Term::Var(vars[1]), Term::Int(2)),
            ],
            constraints: Vec::new(),
        };
        let data = add_cardinality_constraints(&ctx, data);
        assert!(data.constraints.is_empty());
    }
}
