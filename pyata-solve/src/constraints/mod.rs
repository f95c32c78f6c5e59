//! Constraints: installation, propagation and the three built-in kinds
//! (`spec.md` §4.6).
//!
//! A constraint is anything that can re-check itself against a context and
//! name the variables it watches. Installation hooks the substitution
//! pipeline once per context lineage (guarded by `pyata_ir::installations`)
//! so every `sub` call propagates and re-checks automatically; it also hooks
//! the post-condense pipeline, since condensation repoints variables the
//! same way a `sub` does and a constraint on the repointed variable needs
//! the same re-check.

mod cardinality;
mod distinct;
mod neq;
mod notin;

use std::fmt;
use std::rc::Rc;

use pyata_collections::PersistentMap;
use pyata_ir::facet::NamedFacet;
use pyata_ir::hooks::{Effect, FacetOp, Outcome};
use pyata_ir::installations::Installable;
use pyata_ir::subst::{CondenseData, CondenseHook};
use pyata_ir::vars::Var;
use pyata_ir::Context;

pub use cardinality::CardinalityProduct;
pub use distinct::Distinct;
pub use neq::Neq;
pub use notin::{Notin, NotinSubject};

/// `spec.md` §4.6: something re-checkable against a context, watching a
/// fixed set of variables. `Neq`/`Distinct`/`Notin`/`CardinalityProduct`
/// each implement this; `pyata-solve`'s own code never needs to recover the
/// concrete type, only `check`/`vars`, so a trait object is the right fit
/// here (unlike the goal kinds — see `goals.rs` — which heuristics dispatch
/// on by concrete shape).
pub trait Constraint: fmt::Debug {
    /// Re-checks this constraint against `ctx`, returning `ctx` unchanged
    /// (or with harmless bookkeeping updates) if satisfied, or
    /// `ctx.failed()` if not.
    fn check(&self, ctx: &Context) -> Context;

    /// The variables this constraint watches; installation attaches a copy
    /// of the `Rc<dyn Constraint>` under each one.
    fn vars(&self) -> Vec<Var>;
}

/// `var -> constraints watching that var` (`spec.md` §4.6). Multiple
/// constraints on the same variable simply accumulate.
///
/// Hand-written rather than built with `pyata_ir::facet::map_facet!`: that
/// macro is `pub(crate)` inside `pyata-ir` (its body references
/// `pyata_ir`-internal paths that don't resolve the same way from an
/// invoking crate), so downstream facets with the same get/set/default
/// shape are written out by hand here instead of fighting macro hygiene.
#[derive(Clone)]
pub struct ConstraintsFacet(PersistentMap<Var, Rc<Vec<Rc<dyn Constraint>>>>);

impl Default for ConstraintsFacet {
    fn default() -> Self {
        ConstraintsFacet(PersistentMap::new())
    }
}

impl NamedFacet for ConstraintsFacet {
    const NAME: &'static str = "Constraints";
}

impl ConstraintsFacet {
    pub fn get(&self, var: &Var) -> Rc<Vec<Rc<dyn Constraint>>> {
        self.0.get(var).cloned().unwrap_or_else(|| Rc::new(Vec::new()))
    }

    #[must_use]
    pub fn set(&self, var: Var, val: Rc<Vec<Rc<dyn Constraint>>>) -> Self {
        ConstraintsFacet(self.0.set(var, val))
    }
}

/// Marker type [`pyata_ir::installations::install`] uses to guard the
/// substitution/condense-hook registration so it happens at most once per
/// context lineage, no matter how many constraints get installed.
struct ConstraintsMachinery;

impl Installable for ConstraintsMachinery {
    const NAME: &'static str = "pyata_solve::constraints";

    fn install(&self, ctx: &Context) -> Context {
        let subst_hook = ctx.get_facet::<pyata_ir::subst::SubstitutionHook>();
        let subst_hook = pyata_ir::subst::SubstitutionHook(subst_hook.0.register(
            Effect::Pure,
            |ctx, (var, val): (Var, pyata_ir::subst::Term)| {
                match recheck_after_substitution(&ctx, var, &val) {
                    Some(failed) => Outcome::ShortCircuit(failed, Some((var, val))),
                    None => Outcome::Continue(ctx, (var, val)),
                }
            },
        ));
        let ctx = ctx.set_facet(subst_hook);

        let condense_hook = ctx.get_facet::<CondenseHook>();
        let condense_hook = CondenseHook(condense_hook.0.register(
            Effect::Pure,
            |ctx, data: CondenseData| {
                let mut ctx = ctx;
                for var in data.visited.iter() {
                    ctx = match recheck_only(&ctx, *var) {
                        Some(failed) => return Outcome::ShortCircuit(failed, Some(data)),
                        None => ctx,
                    };
                }
                Outcome::Continue(ctx, data)
            },
        ));
        ctx.set_facet(condense_hook)
    }
}

/// Step 1 of `spec.md` §4.6's installation recipe: if `val` is itself a
/// variable, union `var`'s constraint set into `val`'s (propagation), then
/// re-check every constraint now watching the affected variable(s).
/// Returns `Some(failed-ctx)` to short-circuit the substitution pipeline,
/// `None` to let it continue.
fn recheck_after_substitution(
    ctx: &Context,
    var: Var,
    val: &pyata_ir::subst::Term,
) -> Option<Context> {
    let facet = ctx.get_facet::<ConstraintsFacet>();
    let own = facet.get(&var);
    let mut ctx = ctx.clone();

    if let pyata_ir::subst::Term::Var(target) = val {
        if !own.is_empty() {
            let existing = facet.get(target);
            let merged: Vec<Rc<dyn Constraint>> = existing
                .iter()
                .cloned()
                .chain(own.iter().cloned())
                .collect();
            let facet2 = ctx.get_facet::<ConstraintsFacet>().set(*target, Rc::new(merged));
            ctx = ctx.set_named_facet(facet2, FacetOp::Set);
        }
    }

    match recheck_only(&ctx, var) {
        Some(failed) => return Some(failed),
        None => {}
    }
    if let pyata_ir::subst::Term::Var(target) = val {
        if let Some(failed) = recheck_only(&ctx, *target) {
            return Some(failed);
        }
    }
    None
}

/// Re-runs every constraint installed on `var` against `ctx`, stopping at
/// the first failure. Returns `Some(failed-ctx)` on failure, `None` if all
/// constraints on `var` are satisfied (or there are none).
fn recheck_only(ctx: &Context, var: Var) -> Option<Context> {
    let constraints = ctx.get_facet::<ConstraintsFacet>().get(&var);
    for constraint in constraints.iter() {
        let checked = constraint.check(ctx);
        if checked.is_failed() {
            return Some(checked);
        }
    }
    None
}

/// Ensures the substitution/condense-hook machinery (`spec.md` §4.6's
/// installation recipe) is registered against `ctx`, without attaching any
/// concrete constraint yet. Idempotent per context lineage
/// (`pyata_ir::installations`). `pyata-integration`'s `Solver` calls this
/// directly at construction time (`spec.md` §4.10 step 3: "Installs the
/// Constraints substitution-hook"), so re-checking is wired up even for a
/// query whose own goals never call [`install`] before the solver starts
/// pulling its stream.
#[must_use]
pub fn install_machinery(ctx: &Context) -> Context {
    pyata_ir::installations::install(ctx, &ConstraintsMachinery)
}

/// Installs a constraint: ensures the propagation/re-check machinery is
/// registered (idempotent, once per lineage), attaches the constraint under
/// every variable it watches, then immediately re-checks it once (so e.g.
/// `Neq(x, 1)` fails right away if `x` is already bound to `1`, rather than
/// waiting for the next unrelated `sub`).
#[must_use]
pub fn install(ctx: &Context, constraint: Rc<dyn Constraint>) -> Context {
    let ctx = pyata_ir::installations::install(ctx, &ConstraintsMachinery);
    let mut ctx = ctx;
    for var in constraint.vars() {
        let facet = ctx.get_facet::<ConstraintsFacet>();
        let mut existing = facet.get(&var).as_ref().clone();
        existing.push(Rc::clone(&constraint));
        let facet = facet.set(var, Rc::new(existing));
        ctx = ctx.set_named_facet(facet, FacetOp::Set);
    }
    let checked = constraint.check(&ctx);
    if checked.is_failed() {
        return checked;
    }
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{sub, walk, Term};
    use pyata_ir::vars::fresh;

    #[test]
    fn neq_fails_once_values_coincide() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let ctx = install(&ctx, Rc::new(Neq::new(vars[0], vars[1])));
        assert!(!ctx.is_failed());
        let ctx = sub(&ctx, vars[0], Term::Int(1));
        assert!(!ctx.is_failed());
        let ctx = sub(&ctx, vars[1], Term::Int(1));
        assert!(ctx.is_failed());
    }

    #[test]
    fn constraints_propagate_across_var_to_var_binding() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 3);
        let ctx = install(&ctx, Rc::new(Neq::new(vars[0], vars[1])));
        // Repoint vars[0] at vars[2]; the Neq constraint should follow.
        let ctx = sub(&ctx, vars[0], Term::Var(vars[2]));
        let ctx = sub(&ctx, vars[1], Term::Int(5));
        assert!(!ctx.is_failed());
        let ctx = sub(&ctx, vars[2], Term::Int(5));
        assert!(ctx.is_failed());
    }

    #[test]
    fn installing_against_already_bound_var_fails_immediately() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let ctx = sub(&ctx, vars[0], Term::Int(3));
        let ctx = install(&ctx, Rc::new(Neq::ground(vars[0], Term::Int(3))));
        assert!(ctx.is_failed());
    }

    #[test]
    fn condensation_rechecks_visited_vars() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 3);
        let ctx = install(&ctx, Rc::new(Neq::new(vars[0], vars[2])));
        let ctx = sub(&ctx, vars[0], Term::Var(vars[1]));
        let ctx = sub(&ctx, vars[1], Term::Var(vars[2]));
        // Walking vars[0] now condenses it straight to vars[2]'s value; the
        // post-condense hook re-checks the Neq and should fail since both
        // sides now resolve identically.
        let ctx = sub(&ctx, vars[2], Term::Int(9));
        let (ctx, value) = pyata_ir::subst::walk_condensing(&ctx, vars[0]);
        let _ = value;
        assert!(ctx.is_failed() || walk(&ctx, vars[0]) == Term::Int(9));
    }
}
