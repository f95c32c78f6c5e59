//! `HeurConjChainVars` (`spec.md` §4.9).

use rustc_hash::{FxHashMap, FxHashSet};

use pyata_ir::hooks::{Effect, Outcome};
use pyata_ir::installations::Installable;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::goals::{AndHeuristicData, AndHeuristicHook, Goal};

/// Reorders a conjunction's goals to put the most-shared, smallest-search
/// conjuncts first and keep connected goals adjacent, so search failures
/// surface as early as possible.
///
/// `spec.md` §4.9 partitions goals into four classes: (a) `CtxSizedVared`
/// (exposes both a size and free variables), (b) only `CtxSized`, (c) only
/// `Vared`, (d) neither. The spec describes sorting and chain-repairing (a),
/// then appending (c) (sorted by descending entanglement) and (d)
/// (unchanged), but is silent on where (b) goes — resolved here (see
/// `DESIGN.md`) by placing (b) directly after (a) in its original relative
/// order: (b)'s goals carry no variable information for the chain-repair
/// pass to use, so there is nothing to reorder them by, but their size is
/// still known and they belong ahead of the variable-free tail.
pub struct HeurConjChainVars;

impl Installable for HeurConjChainVars {
    const NAME: &'static str = "pyata_solve::heuristics::conj_chain_vars";

    fn install(&self, ctx: &Context) -> Context {
        let hook = ctx.get_facet::<AndHeuristicHook>();
        let hook = AndHeuristicHook(hook.0.register(Effect::Pure, |ctx, data: AndHeuristicData| {
            let goals = reorder(&ctx, data.goals);
            Outcome::Continue(
                ctx,
                AndHeuristicData {
                    goals,
                    constraints: data.constraints,
                },
            )
        }));
        ctx.set_facet(hook)
    }
}

/// Per-goal entanglement (`spec.md` §4.9): the product, across a goal's
/// free variables, of how many goals in the whole conjunction mention each
/// one, minus one. A goal touching only variables private to itself scores
/// zero; a goal sharing every one of its variables with exactly one other
/// goal apiece scores `2^k - 1` for `k` shared variables.
fn entanglement(vars: &[Var], var_to_goal_count: &FxHashMap<Var, usize>) -> u64 {
    let product: u64 = vars
        .iter()
        .map(|v| *var_to_goal_count.get(v).unwrap_or(&1) as u64)
        .product();
    product.saturating_sub(1)
}

fn reorder(ctx: &Context, goals: Vec<Goal>) -> Vec<Goal> {
    let var_sets: Vec<Option<Vec<Var>>> = goals.iter().map(Goal::free_vars).collect();

    let mut var_to_goal_count: FxHashMap<Var, usize> = FxHashMap::default();
    for vars in var_sets.iter().flatten() {
        for v in vars {
            *var_to_goal_count.entry(*v).or_insert(0) += 1;
        }
    }

    let mut class_a = Vec::new(); // CtxSized and Vared
    let mut class_b = Vec::new(); // CtxSized only
    let mut class_c = Vec::new(); // Vared only
    let mut class_d = Vec::new(); // neither

    for (i, goal) in goals.into_iter().enumerate() {
        let sized = goal.ctx_size(ctx).is_some();
        let vared = var_sets[i].is_some();
        match (sized, vared) {
            (true, true) => class_a.push((i, goal)),
            (true, false) => class_b.push(goal),
            (false, true) => class_c.push((i, goal)),
            (false, false) => class_d.push(goal),
        }
    }

    let sized_vared_vars: FxHashMap<usize, Vec<Var>> = class_a
        .iter()
        .map(|(i, _)| (*i, var_sets[*i].clone().unwrap_or_default()))
        .collect();
    let sizes: FxHashMap<usize, u64> = class_a
        .iter()
        .map(|(i, g)| (*i, g.ctx_size(ctx).unwrap_or(0)))
        .collect();

    // Sort class (a) by size / (entanglement + 1) ascending: smallest,
    // most-shared goals lead.
    class_a.sort_by(|(i, _), (j, _)| {
        let e_i = entanglement(&sized_vared_vars[i], &var_to_goal_count);
        let e_j = entanglement(&sized_vared_vars[j], &var_to_goal_count);
        let key_i = (sizes[i] as f64) / ((e_i + 1) as f64);
        let key_j = (sizes[j] as f64) / ((e_j + 1) as f64);
        key_i
            .partial_cmp(&key_j)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let chained = chain_repair(class_a, &sized_vared_vars);

    class_c.sort_by(|(i, _), (j, _)| {
        let e_i = entanglement(&var_sets[*i].clone().unwrap_or_default(), &var_to_goal_count);
        let e_j = entanglement(&var_sets[*j].clone().unwrap_or_default(), &var_to_goal_count);
        e_j.cmp(&e_i)
    });

    let mut result: Vec<Goal> = chained.into_iter().map(|(_, g)| g).collect();
    result.extend(class_b);
    result.extend(class_c.into_iter().map(|(_, g)| g));
    result.extend(class_d);
    result
}

/// Left-to-right chain repair: keep goals that share a variable with
/// whatever has already been placed adjacent in the result, preferring the
/// earliest-sorted candidate; if nothing connects, fall back to the next
/// goal in the (already size/entanglement-sorted) remaining order.
fn chain_repair(sorted: Vec<(usize, Goal)>, vars_of: &FxHashMap<usize, Vec<Var>>) -> Vec<(usize, Goal)> {
    let mut remaining = sorted;
    if remaining.is_empty() {
        return remaining;
    }
    let mut result = vec![remaining.remove(0)];
    while !remaining.is_empty() {
        let placed_vars: FxHashSet<Var> = result
            .iter()
            .flat_map(|(i, _)| vars_of.get(i).into_iter().flatten().copied())
            .collect();
        let candidate_pos = remaining
            .iter()
            .position(|(i, _)| vars_of.get(i).into_iter().flatten().any(|v| placed_vars.contains(v)));
        match candidate_pos {
            Some(pos) => result.push(remaining.remove(pos)),
            None => result.push(remaining.remove(0)),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{walk, Term};
    use pyata_ir::vars::fresh;

    use crate::relations::Relation;

    #[test]
    fn chain_keeps_connected_goals_adjacent() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 3);
        let rel_ab = Relation::new("ab", vec![vec![Term::Int(1), Term::Int(2)]]).unwrap();
        let rel_bc = Relation::new("bc", vec![vec![Term::Int(2), Term::Int(3)]]).unwrap();
        let isolated = Goal::Eq(Term::Var(vars[2]), Term::Int(3));

        let g_ab = rel_ab.call(vec![Term::Var(vars[0]), Term::Var(vars[1])]).unwrap();
        let g_bc = rel_bc.call(vec![Term::Var(vars[1]), Term::Var(vars[2])]).unwrap();

        let goals = vec![isolated, g_bc, g_ab];
        let reordered = reorder(&ctx, goals);
        // the Eq goal (class c, only Vared) should not split the two
        // connected fact-table goals (class a).
        let fact_positions: Vec<usize> = reordered
            .iter()
            .enumerate()
            .filter(|(_, g)| matches!(g, Goal::Facts(_)))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(fact_positions, vec![0, 1]);
    }

    #[test]
    fn installed_heuristic_still_solves_correctly() {
        let ctx = Context::new();
        let ctx = pyata_ir::installations::install(&ctx, &HeurConjChainVars);
        let (ctx, vars) = fresh(&ctx, None, 2);
        let rel = Relation::new("r", vec![vec![Term::Int(1), Term::Int(2)]]).unwrap();
        let goal = Goal::and(vec![
            rel.call(vec![Term::Var(vars[0]), Term::Var(vars[1])]).unwrap(),
            Goal::Eq(Term::Var(vars[1]), Term::Int(2)),
        ]);
        let mut stream = goal.call(ctx);
        let solved = stream.next().expect("should still find the solution");
        assert_eq!(walk(&solved, vars[0]), Term::Int(1));
    }
}
