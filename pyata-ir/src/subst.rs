//! Terms, the `Substitutions` facet, `walk`, condensation, and `sub`
//! (`spec.md` §3 "Substitution", §4.4).

use std::rc::Rc;

use crate::context::Context;
use crate::facet::map_facet;
use crate::hooks::{Outcome, PipelineHooks};
use crate::vars::Var;

/// A stored value: either a logic variable (possibly further bound, or
/// free) or a ground term. `List`/`Ellipsis` give the engine something to
/// structurally unify via the Iterables extension (`spec.md` §4.5).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Term {
    Var(Var),
    Int(i64),
    Bool(bool),
    Char(char),
    Str(Rc<str>),
    List(Rc<Vec<Term>>),
    /// A trailing "match any remaining elements" marker, valid only as the
    /// last element of a `List` being unified against another sequence
    /// (`spec.md` §4.5, §8 scenario 5).
    Ellipsis,
}

impl Term {
    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(&self) -> Option<Var> {
        match self {
            Term::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_ground(&self) -> bool {
        match self {
            Term::Var(_) => false,
            Term::List(items) => items.iter().all(Term::is_ground),
            Term::Ellipsis => false,
            _ => true,
        }
    }
}

impl From<i64> for Term {
    fn from(n: i64) -> Self {
        Term::Int(n)
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Bool(b)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

map_facet! {
    /// `var -> value-or-variable` (`spec.md` §3 "Substitution"). Missing
    /// keys have no meaningful default (an absent entry means "still
    /// free"), so callers use [`SubstFacet::get_opt`] rather than `get`.
    pub struct SubstFacet(Var => Term)
        default(|| Term::Var(Var::WILDCARD))
        name("Substitutions");
}

/// Payload for the condensation hooks: the variable the walk started from,
/// the terminal value it resolved to, and every variable traversed via a
/// `var -> var` link along the way (in traversal order, origin first).
#[derive(Clone)]
pub struct CondenseData {
    pub origin: Var,
    pub value: Term,
    pub visited: Rc<Vec<Var>>,
}

/// `hook_walk_condensible`: the explicit extension point for path
/// compression policy (`spec.md` §4.4, §9 "two variants of
/// `walk_condense`" open question). This crate resolves that open question
/// by registering exactly one default handler here at
/// [`Context::new`]-time; a caller wanting a different condensation policy
/// replaces this registration rather than adding a second one (see
/// `DESIGN.md`).
#[derive(Clone)]
pub struct CondensibleHook(pub PipelineHooks<CondenseData>);

impl Default for CondensibleHook {
    fn default() -> Self {
        CondensibleHook(default_condensible_pipeline())
    }
}

/// `hook_walk_condense`: fires once condensation has actually been applied,
/// so constraints can re-check the set of variables that just got
/// repointed (`spec.md` §4.6 "re-checked" requirement flows through here).
/// Empty by default; `pyata-solve`'s `Constraints` installation registers
/// against it.
#[derive(Clone, Default)]
pub struct CondenseHook(pub PipelineHooks<CondenseData>);

fn default_condensible_pipeline() -> PipelineHooks<CondenseData> {
    PipelineHooks::default().register(crate::hooks::Effect::Pure, |ctx, data: CondenseData| {
        let subst = ctx.get_facet::<SubstFacet>();
        let updated = subst.update(data.visited.iter().map(|v| (*v, data.value.clone())));
        let next = ctx.set_facet(updated);
        Outcome::Continue(next, data)
    })
}

/// The substitution hook pipeline, `(var, value) -> (var, value)`
/// (`spec.md` §6 "`Substitutions.hook_substitution`"). `pyata-solve`'s
/// `Constraints` installation is the primary consumer: it re-checks every
/// constraint on `var` (and propagates constraint sets across `var -> var`
/// bindings) on every call.
#[derive(Clone, Default)]
pub struct SubstitutionHook(pub PipelineHooks<(Var, Term)>);

/// Follows the substitution chain from `var`, tracking visited variables so
/// a (disallowed, but defensively guarded) cycle cannot loop forever.
/// Returns the terminal value — either a non-variable, or a variable not
/// present as a key in the substitution map — plus every intermediate
/// variable traversed via a `var -> var` link (for condensation).
fn walk_with_visited(ctx: &Context, var: Var) -> (Term, Vec<Var>) {
    let subst = ctx.get_facet::<SubstFacet>();
    let mut visited = Vec::new();
    let mut current = var;
    loop {
        match subst.get_opt(&current) {
            None => return (Term::Var(current), visited),
            Some(Term::Var(next)) if next != current => {
                visited.push(current);
                current = next;
            }
            Some(Term::Var(_)) => return (Term::Var(current), visited),
            Some(other) => return (other, visited),
        }
    }
}

/// `walk(ctx, var) -> value`: the read-only form (`spec.md` §4.4). Does not
/// perform condensation; use [`walk_condensing`] when a caller is in a
/// position to thread back an updated context (goals and `unify` always
/// are).
pub fn walk(ctx: &Context, var: Var) -> Term {
    walk_with_visited(ctx, var).0
}

/// Walks `var`, additionally performing condensation when the chain was
/// longer than one hop, per `spec.md` §4.4: "fires the condensible
/// pipeline hook with `(origin, value, visited)`... the default
/// condensation updates every visited variable to point directly to the
/// terminal value and fires a post-condense pipeline hook."
pub fn walk_condensing(ctx: &Context, var: Var) -> (Context, Term) {
    let (value, visited) = walk_with_visited(ctx, var);
    if visited.len() < 2 {
        return (ctx.clone(), value);
    }
    let data = CondenseData {
        origin: var,
        value: value.clone(),
        visited: Rc::new(visited),
    };
    let condensible = ctx.get_facet::<CondensibleHook>();
    let (ctx2, data2) = condensible.0.run(ctx.clone(), data);
    let condense = ctx2.get_facet::<CondenseHook>();
    let (ctx3, _) = condense.0.run(ctx2, data2);
    (ctx3, value)
}

/// `walk_reify(ctx, var) -> (ctx, value)`: walks (with condensation), then
/// applies the variable's reifier to the terminal value if ground
/// (`spec.md` §4.4).
pub fn walk_reify(ctx: &Context, var: Var) -> (Context, Term) {
    let (ctx, value) = walk_condensing(ctx, var);
    if value.is_ground() {
        let reifiers = ctx.get_facet::<crate::vars::VarsReifiersFacet>();
        let reifier = reifiers.get(&var);
        (ctx.clone(), reifier.reify(&value))
    } else {
        (ctx, value)
    }
}

/// Walks `t` if it is a variable (with condensation), or returns ground
/// terms unchanged. Shared by `unify` and by `pyata-solve`'s constraints,
/// which need the same "walk whatever this term turns out to be" step
/// `unify` performs internally.
pub fn walk_term(ctx: &Context, t: &Term) -> (Context, Term) {
    match t {
        Term::Var(v) => walk_condensing(ctx, *v),
        other => (ctx.clone(), other.clone()),
    }
}

/// Records `var -> val`, firing the substitution pipeline hook
/// (`spec.md` §4.5 step 3). The wildcard variable never records a binding.
/// Returns the (possibly `Failed`, if a registered constraint-check
/// short-circuits) resulting context.
#[must_use]
pub fn sub(ctx: &Context, var: Var, val: Term) -> Context {
    if var.is_wildcard() {
        return ctx.clone();
    }
    let subst = ctx.get_facet::<SubstFacet>();
    let updated = subst.set(var, val.clone());
    let next = ctx.set_named_facet(updated, crate::hooks::FacetOp::Set);
    let pipeline = next.get_facet::<SubstitutionHook>();
    let (next2, _) = pipeline.0.run(next, (var, val));
    next2
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::vars::fresh;
    use proptest::prelude::*;

    proptest! {
        /// `walk` is idempotent: re-walking the same variable returns the
        /// same value every time, and condensing the chain (which rewrites
        /// every visited variable to point straight at the terminal value)
        /// never changes what a subsequent `walk` reports.
        #[test]
        fn walk_is_idempotent_for_any_chain_length(chain_len in 1usize..6, terminal in any::<i64>()) {
            let ctx = Context::new();
            let (ctx, vars) = fresh(&ctx, None, chain_len + 1);
            let mut ctx = ctx;
            for i in 0..chain_len {
                ctx = sub(&ctx, vars[i], Term::Var(vars[i + 1]));
            }
            ctx = sub(&ctx, vars[chain_len], Term::Int(terminal));

            prop_assert_eq!(walk(&ctx, vars[0]), Term::Int(terminal));
            prop_assert_eq!(walk(&ctx, vars[0]), walk(&ctx, vars[0]));

            let (condensed, value) = walk_condensing(&ctx, vars[0]);
            prop_assert_eq!(value.clone(), Term::Int(terminal));
            prop_assert_eq!(walk(&condensed, vars[0]), value);
        }
    }
}
