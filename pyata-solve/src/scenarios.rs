//! End-to-end scenario tests exercising `Goal::and`/`Goal::or` together with
//! a `Constraint`, the way `spec.md` §8's worked examples describe a whole
//! query rather than one connective in isolation.

use std::collections::HashSet;
use std::rc::Rc;

use pyata_ir::subst::{walk, Term};
use pyata_ir::vars::fresh;
use pyata_ir::Context;

use crate::constraints::{self, Distinct};
use crate::goals::Goal;

/// `spec.md` §8 scenario 1 (Permutations): four variables, each constrained
/// to one of 1..=4 by a disjunction of equalities, conjoined with a single
/// `Distinct` over all four. Exactly the 4! = 24 permutations of `1..=4`
/// should come out, never an assignment with a repeated value.
#[test]
fn permutations_of_four_values_yields_24_solutions() {
    let ctx = Context::new();
    let (ctx, vars) = fresh(&ctx, None, 4);

    let distinct: Rc<dyn constraints::Constraint> = Rc::new(Distinct::new(vars.clone()));
    let ctx = constraints::install(&ctx, distinct);
    assert!(!ctx.is_failed());

    let per_var_choices: Vec<Goal> = vars
        .iter()
        .map(|&v| Goal::or((1..=4).map(|i| Goal::Eq(Term::Var(v), Term::Int(i))).collect()))
        .collect();
    let goal = Goal::and(per_var_choices);

    let solutions: Vec<Vec<Term>> = goal
        .call(ctx)
        .map(|solved| vars.iter().map(|&v| walk(&solved, v)).collect())
        .collect();

    assert_eq!(solutions.len(), 24);
    let distinct_solutions: HashSet<Vec<Term>> = solutions.iter().cloned().collect();
    assert_eq!(distinct_solutions.len(), 24);
    for solution in &solutions {
        let values: HashSet<&Term> = solution.iter().collect();
        assert_eq!(values.len(), 4, "every permutation must use four distinct values");
    }
}
