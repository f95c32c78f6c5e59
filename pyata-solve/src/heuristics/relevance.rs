//! `HeurConjRelevance` (`spec.md` §4.9).

use rustc_hash::{FxHashMap, FxHashSet};

use pyata_ir::hooks::{Effect, Outcome};
use pyata_ir::installations::Installable;
use pyata_ir::subst::{walk, Term};
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::goals::{AndHeuristicData, AndHeuristicHook, Goal};
use crate::relations::Relation;

/// Prunes the shared-variable space of a conjunction's most entangled goal
/// ahead of time: pick the `CtxSizedVared` goal whose variables shared with
/// the rest of the conjunction are a strict subset of its own (so it also
/// has variables private to itself, meaning the projection below is a real
/// narrowing and not just a copy of the goal), run it hypothetically,
/// project each hypothetical solution onto just the shared variables, and
/// build a synthetic fact table over those variables. The resulting
/// "relevance" goal is injected at the head of the goal list, so later
/// conjuncts over the same shared variables see the pruned domain before
/// the original (more expensive) goal runs for real.
///
/// `spec.md` §4.9 does not define "heavily-entangled" precisely; this
/// resolves the Open Question (see `DESIGN.md`) by picking the single
/// candidate goal with the highest entanglement score among those eligible,
/// rather than every eligible goal — one relevance goal per conjunction
/// keeps the heuristic's own cost bounded to one extra hypothetical
/// traversal.
pub struct HeurConjRelevance;

impl Installable for HeurConjRelevance {
    const NAME: &'static str = "pyata_solve::heuristics::conj_relevance";

    fn install(&self, ctx: &Context) -> Context {
        let hook = ctx.get_facet::<AndHeuristicHook>();
        let hook = AndHeuristicHook(hook.0.register(Effect::Pure, |ctx, data: AndHeuristicData| {
            let data = inject_relevance_goal(&ctx, data);
            Outcome::Continue(ctx, data)
        }));
        ctx.set_facet(hook)
    }
}

fn inject_relevance_goal(ctx: &Context, data: AndHeuristicData) -> AndHeuristicData {
    let var_sets: Vec<Option<Vec<Var>>> = data.goals.iter().map(Goal::free_vars).collect();
    let mut var_to_goal_count: FxHashMap<Var, usize> = FxHashMap::default();
    for vars in var_sets.iter().flatten() {
        for v in vars {
            *var_to_goal_count.entry(*v).or_insert(0) += 1;
        }
    }

    let mut best: Option<(usize, u64, Vec<Var>)> = None;
    for (i, goal) in data.goals.iter().enumerate() {
        if goal.ctx_size(ctx).is_none() {
            continue;
        }
        let vars = match &var_sets[i] {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };
        let shared: Vec<Var> = vars
            .iter()
            .copied()
            .filter(|v| *var_to_goal_count.get(v).unwrap_or(&0) > 1)
            .collect();
        if shared.is_empty() || shared.len() >= vars.len() {
            // No shared variables to prune on, or every variable is shared
            // (the projection would just reproduce the goal itself).
            continue;
        }
        let entanglement: u64 = vars
            .iter()
            .map(|v| *var_to_goal_count.get(v).unwrap_or(&1) as u64)
            .product::<u64>()
            .saturating_sub(1);
        if entanglement == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(_, e, _)| entanglement > *e) {
            best = Some((i, entanglement, shared));
        }
    }

    let (idx, _entanglement, shared) = match best {
        Some(b) => b,
        None => return data,
    };

    let hypothetical = ctx.into_hypothetical();
    let mut rows = Vec::new();
    let mut seen: FxHashSet<Vec<Term>> = FxHashSet::default();
    for solved in data.goals[idx].call(hypothetical) {
        let row: Vec<Term> = shared.iter().map(|v| walk(&solved, *v)).collect();
        if row.iter().all(Term::is_ground) && seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        // The chosen goal has no hypothetical solutions at all; the real
        // conjunction will discover that on its own when it runs. Building
        // an (rejected) empty relation here would only duplicate that
        // failure, so leave the goal list untouched.
        return data;
    }

    let relation = match Relation::new(format!("relevance#{}", idx), rows) {
        Ok(r) => r,
        Err(_) => return data,
    };
    let args: Vec<Term> = shared.into_iter().map(Term::Var).collect();
    let relevance_goal = match relation.call(args) {
        Ok(g) => g,
        Err(_) => return data,
    };

    let mut goals = data.goals;
    goals.insert(0, relevance_goal);
    AndHeuristicData {
        goals,
        constraints: data.constraints,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::walk;
    use pyata_ir::vars::fresh;

    #[test]
    fn injects_a_relevance_goal_ahead_of_the_entangled_goal() {
        let ctx = Context::new();
        let ctx = pyata_ir::installations::install(&ctx, &HeurConjRelevance);
        let (ctx, vars) = fresh(&ctx, None, 2);
        // `joint` entangles v0 (private) with v1 (shared with `only_two`).
        let joint = Relation::new(
            "joint",
            vec![
                vec![Term::Int(1), Term::Int(10)],
                vec![Term::Int(2), Term::Int(20)],
                vec![Term::Int(3), Term::Int(10)],
            ],
        )
        .unwrap();
        let only_two = Relation::new("only_two", vec![vec![Term::Int(10)], vec![Term::Int(99)]]).unwrap();

        let goal = Goal::and(vec![
            joint.call(vec![Term::Var(vars[0]), Term::Var(vars[1])]).unwrap(),
            only_two.call(vec![Term::Var(vars[1])]).unwrap(),
        ]);
        let solutions: Vec<(i64, i64)> = goal
            .call(ctx)
            .map(|solved| match (walk(&solved, vars[0]), walk(&solved, vars[1])) {
                (Term::Int(a), Term::Int(b)) => (a, b),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(solutions.len(), 2);
        assert!(solutions.contains(&(1, 10)));
        assert!(solutions.contains(&(3, 10)));
    }

    #[test]
    fn no_eligible_goal_leaves_conjunction_untouched() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let data = AndHeuristicData {
            goals: vec![Goal::Eq(Term::Var(vars[0]), Term::Int(1))],
            constraints: Vec::new(),
        };
        let result = inject_relevance_goal(&ctx, data.clone());
        assert_eq!(result.goals.len(), data.goals.len());
    }
}
