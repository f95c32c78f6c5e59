//! Logic variables, reifiers and the `VarsReifiers`/`VarCounter` facets
//! (`spec.md` §3 "Variable", §4.4, §6 "Variable allocation").

use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::facet::map_facet;
use crate::hooks::{Effect, HookKey, Outcome};
use crate::subst::Term;

/// A first-class logic variable, compared by identity (its `id`). `Var` is
/// `Copy`; cloning/copying a variable never duplicates its reifier — that
/// lives in the `VarsReifiers` facet, keyed by this id.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var {
    id: u64,
}

impl Var {
    /// The designated wildcard: unifies with anything without recording a
    /// binding (`spec.md` §3). Reserved id `u64::MAX` so it can never be
    /// produced by [`VarCounter`]'s monotonic allocation.
    pub const WILDCARD: Var = Var { id: u64::MAX };

    pub fn id(self) -> u64 {
        self.id
    }

    pub fn is_wildcard(self) -> bool {
        self.id == Var::WILDCARD.id
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wildcard() {
            write!(f, "_")
        } else {
            write!(f, "_{}", self.id)
        }
    }
}

/// A pure function applied to a variable's terminal walked value at
/// solution time, converting the stored primitive into the user-facing
/// value (`spec.md` §3: "e.g., `int→chr`"). Grounded on the original's
/// `Vars.py` `VarTypes` facet: a variable's declared type is applied via
/// its constructor once the walked value is ground.
pub trait Reifier: fmt::Debug {
    fn reify(&self, value: &Term) -> Term;
}

/// The identity reifier: returns the walked value unchanged. The default
/// for variables allocated without an explicit reifier.
#[derive(Debug, Default)]
pub struct IdentityReifier;

impl Reifier for IdentityReifier {
    fn reify(&self, value: &Term) -> Term {
        value.clone()
    }
}

/// `int -> char` reifier named directly in `spec.md` §3's example.
#[derive(Debug, Default)]
pub struct IntToCharReifier;

impl Reifier for IntToCharReifier {
    fn reify(&self, value: &Term) -> Term {
        match value {
            Term::Int(n) if *n >= 0 => {
                char::from_u32(*n as u32).map(Term::Char).unwrap_or_else(|| value.clone())
            }
            other => other.clone(),
        }
    }
}

/// A fixed bag of boolean algebraic assumptions a variable may carry
/// (`spec.md` §6: "a fixed bag of boolean algebraic tags: integer, finite,
/// positive, etc."), grounded on the original's `sympy`-backed
/// `TypeAssumps` (`Vars.py`) minus the symbolic-algebra dependency itself
/// (out of scope: `spec.md` excludes NLTK/metrics collaborators, and the
/// original only used `sympy.Symbol` for its assumption bookkeeping side
/// effect, not for symbolic algebra — see `DESIGN.md`).
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct VarAssumptions {
    bits: u16,
}

impl VarAssumptions {
    pub const INTEGER: VarAssumptions = VarAssumptions { bits: 1 << 0 };
    pub const FINITE: VarAssumptions = VarAssumptions { bits: 1 << 1 };
    pub const POSITIVE: VarAssumptions = VarAssumptions { bits: 1 << 2 };
    pub const NEGATIVE: VarAssumptions = VarAssumptions { bits: 1 << 3 };
    pub const NONZERO: VarAssumptions = VarAssumptions { bits: 1 << 4 };

    pub const fn none() -> Self {
        VarAssumptions { bits: 0 }
    }

    #[must_use]
    pub const fn with(self, other: VarAssumptions) -> VarAssumptions {
        VarAssumptions {
            bits: self.bits | other.bits,
        }
    }

    pub const fn has(self, flag: VarAssumptions) -> bool {
        self.bits & flag.bits == flag.bits
    }
}

map_facet! {
    /// `var -> reifier` (`spec.md` §4.4: "Fresh variable allocation records
    /// the variable's reifier(s) in a `VarsReifiers` facet").
    pub struct VarsReifiersFacet(Var => Rc<dyn Reifier>)
        default(|| Rc::new(IdentityReifier) as Rc<dyn Reifier>)
        name("VarsReifiers");
}

map_facet! {
    /// `var -> assumptions`, defaulting to none.
    pub struct VarAssumptionsFacet(Var => VarAssumptions)
        default(VarAssumptions::none)
        name("VarAssumptions");
}

/// Monotonic variable-id allocator. Kept as its own facet (rather than a
/// global atomic) so that variable identity is a pure function of how many
/// variables a given context lineage has allocated — two independent
/// solver runs starting from `Context::new()` allocate the same ids for
/// the same sequence of `fresh` calls, which keeps the engine free of
/// global mutable state per the DESIGN NOTES.
#[derive(Clone, Copy, Debug)]
pub struct VarCounter {
    next: u64,
}

impl Default for VarCounter {
    fn default() -> Self {
        VarCounter { next: 0 }
    }
}

/// Allocates `count` fresh variables, recording each one's reifier (or the
/// identity reifier if `reifier` is `None`) and firing the "fresh" event
/// broadcast (`spec.md` §4.4). Returns the updated context and the new
/// variables in allocation order.
pub fn fresh(
    ctx: &Context,
    reifier: Option<Rc<dyn Reifier>>,
    count: usize,
) -> (Context, Vec<Var>) {
    let counter = ctx.get_facet::<VarCounter>();
    let mut next = counter.next;
    let mut vars = Vec::with_capacity(count);
    let mut reifiers = ctx.get_facet::<VarsReifiersFacet>().as_ref().clone();
    for _ in 0..count {
        let var = Var { id: next };
        next += 1;
        if let Some(r) = &reifier {
            reifiers = reifiers.set(var, Rc::clone(r));
        }
        vars.push(var);
    }
    let mut next_ctx = ctx.set_facet(VarCounter { next });
    next_ctx = next_ctx.set_named_facet(reifiers, crate::hooks::FacetOp::Set);
    let broadcast_key: crate::hooks::BroadcastKey = vec![HookKey::VarFresh];
    for var in &vars {
        next_ctx = next_ctx
            .hooks()
            .broadcasts
            .run(next_ctx.clone(), &broadcast_key, var as &dyn std::any::Any);
    }
    (next_ctx, vars)
}

/// Registers an event callback that fires once per freshly-allocated
/// variable (the "fresh" broadcast `spec.md` §4.4 names). Exposed for
/// collaborators (heuristics, relations) that want to react to new
/// variables without threading extra plumbing through every call site.
pub fn on_fresh<F>(ctx: &Context, effect: Effect, callback: F) -> Context
where
    F: Fn(Context, &dyn std::any::Any) -> Outcome<()> + 'static,
{
    let hooks = ctx.hooks().as_ref().clone();
    let broadcasts = hooks
        .broadcasts
        .register(vec![HookKey::VarFresh], effect, move |c, _k, d| callback(c, d));
    ctx.with_hooks(crate::hooks::HooksFacet {
        broadcasts,
        ..hooks
    })
}

/// Installs a reifier on a variable that was allocated without one,
/// matching the original's `contextualize` step for variables whose type
/// is only known after allocation (`Vars.py`). Reassigning a *different*
/// reifier on a variable that already has a non-identity one installed is
/// rejected as [`crate::error::ErrorKind::ReifierConflict`] rather than
/// silently overwritten — the allocation-time binding of identity and
/// reifier `fresh` performs is meant to be stable thereafter.
pub fn contextualize(
    ctx: &Context,
    var: Var,
    reifier: Rc<dyn Reifier>,
) -> crate::error::Result<Context> {
    let reifiers = ctx.get_facet::<VarsReifiersFacet>();
    if let Some(existing) = reifiers.get_opt(&var) {
        if !Rc::ptr_eq(&existing, &reifier) && format!("{:?}", existing) != format!("{:?}", reifier)
        {
            return Err(crate::error::ErrorKind::ReifierConflict(format!("{:?}", var)).into());
        }
    }
    let reifiers = reifiers.set(var, reifier);
    Ok(ctx.set_named_facet(reifiers, crate::hooks::FacetOp::Set))
}

/// Batch-walks and reifies a tuple of variables in one pass (`spec.md`'s
/// "reifier" concept applied to a whole query at once), used by the
/// solver's iterator step. Grounded on the original's
/// `Vars.walk_and_type_vars` (`Vars.py`).
pub fn walk_and_reify_all(ctx: &Context, vars: &[Var]) -> Vec<Term> {
    vars.iter()
        .map(|v| crate::subst::walk_reify(ctx, *v).1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_allocates_distinct_ids() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 3);
        assert_eq!(vars.len(), 3);
        assert_ne!(vars[0], vars[1]);
        assert_ne!(vars[1], vars[2]);
        let (_, more) = fresh(&ctx, None, 1);
        assert_ne!(more[0], vars[0]);
        assert_ne!(more[0], vars[1]);
        assert_ne!(more[0], vars[2]);
    }

    #[test]
    fn wildcard_is_reserved_and_never_allocated() {
        let ctx = Context::new();
        let (_, vars) = fresh(&ctx, None, 1000);
        assert!(vars.iter().all(|v| !v.is_wildcard()));
    }

    #[test]
    fn contextualize_installs_reifier_once() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let ctx = contextualize(&ctx, vars[0], Rc::new(IntToCharReifier)).unwrap();
        let ctx = crate::subst::sub(&ctx, vars[0], Term::Int(65));
        assert_eq!(crate::subst::walk_reify(&ctx, vars[0]).1, Term::Char('A'));
    }

    #[test]
    fn contextualize_rejects_conflicting_reifier() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, Some(Rc::new(IntToCharReifier)), 1);
        let result = contextualize(&ctx, vars[0], Rc::new(IdentityReifier));
        assert!(result.is_err());
    }

    #[test]
    fn assumptions_combine() {
        let a = VarAssumptions::INTEGER.with(VarAssumptions::POSITIVE);
        assert!(a.has(VarAssumptions::INTEGER));
        assert!(a.has(VarAssumptions::POSITIVE));
        assert!(!a.has(VarAssumptions::NEGATIVE));
    }
}
