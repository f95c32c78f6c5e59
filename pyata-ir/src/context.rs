//! The immutable [`Context`] (`spec.md` §3, §4.2): a persistent mapping
//! from facet identifier to facet instance, threaded through every
//! operation in the engine. All updates return a new `Context` sharing
//! structure with the old — cloning a `Context` is an `Rc` bump, and every
//! facet value is independently shared between versions.

use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

use pyata_collections::PersistentMap;

use crate::facet::{NamedFacet, Slot};
use crate::hooks::{facet_mutation_key, FacetOp, HooksFacet};

struct ContextInner {
    facets: PersistentMap<TypeId, Rc<dyn Any>>,
    failed: bool,
    hypothetical: bool,
}

/// The context threaded through every goal, constraint and hook in the
/// engine. Cheap to clone (`Rc` bump); every mutating method returns a new
/// `Context` rather than mutating in place.
#[derive(Clone)]
pub struct Context(Rc<ContextInner>);

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Context(Rc::new(ContextInner {
            facets: PersistentMap::new(),
            failed: false,
            hypothetical: false,
        }))
    }

    /// Returns the distinguished failed context. Per `spec.md` §7.1/§7.2,
    /// this is what unification failure and constraint violation return;
    /// goals and constraints check [`Context::is_failed`] and stop
    /// processing rather than continuing to thread a failed context through
    /// further work.
    #[must_use]
    pub fn failed(&self) -> Context {
        Context(Rc::new(ContextInner {
            facets: self.0.facets.clone(),
            failed: true,
            hypothetical: self.0.hypothetical,
        }))
    }

    pub fn is_failed(&self) -> bool {
        self.0.failed
    }

    pub fn is_hypothetical(&self) -> bool {
        self.0.hypothetical
    }

    /// Marks this context as hypothetical (`spec.md` §4.11): hook registries
    /// skip `Effectful`-tagged callbacks for the lifetime of contexts
    /// derived from the result. Used by [fact-goal lookahead](
    /// https://docs.rs/pyata-solve) so speculative unification does not
    /// fire substitution side effects.
    #[must_use]
    pub fn into_hypothetical(&self) -> Context {
        Context(Rc::new(ContextInner {
            facets: self.0.facets.clone(),
            failed: self.0.failed,
            hypothetical: true,
        }))
    }

    /// Reads a facet instance, or its `Default` if never written. Any
    /// `Clone + Default + 'static` type is a valid facet
    /// ([`crate::facet::Slot`]'s blanket impl); the facet is keyed by its
    /// own `TypeId`, so no central facet-id registry is needed.
    pub fn get_facet<T: Slot>(&self) -> Rc<T> {
        match self.0.facets.get(&TypeId::of::<T>()) {
            Some(any) => Rc::clone(any)
                .downcast::<T>()
                .expect("facet TypeId collided with a different type"),
            None => Rc::new(T::default()),
        }
    }

    /// Replaces a facet instance, returning a new context. No debug-mode
    /// broadcast fires; use [`Context::set_named_facet`] for facets that
    /// should participate in `spec.md` §4.2's debug instrumentation.
    #[must_use]
    pub fn set_facet<T: Slot>(&self, value: T) -> Context {
        let facets = self
            .0
            .facets
            .set(TypeId::of::<T>(), Rc::new(value) as Rc<dyn Any>);
        Context(Rc::new(ContextInner {
            facets,
            failed: self.0.failed,
            hypothetical: self.0.hypothetical,
        }))
    }

    /// Like [`Context::set_facet`], but additionally fires the debug-mode
    /// hierarchical mutation broadcast (`spec.md` §4.2) when
    /// `PYATA_DEBUG`/[`pyata_macros::debug_enabled`] is on. Release builds
    /// pay only the `debug_enabled()` check.
    #[must_use]
    pub fn set_named_facet<T: NamedFacet>(&self, value: T, op: FacetOp) -> Context {
        let next = self.set_facet(value);
        if pyata_macros::debug_enabled() {
            let key = facet_mutation_key(T::NAME, op);
            next.hooks().broadcasts.run(next.clone(), &key, &())
        } else {
            next
        }
    }

    pub fn hooks(&self) -> Rc<HooksFacet> {
        self.get_facet::<HooksFacet>()
    }

    #[must_use]
    pub fn with_hooks(&self, hooks: HooksFacet) -> Context {
        self.set_facet(hooks)
    }

    /// Number of facets ever explicitly written against this context (and
    /// its ancestors) — facets still at their default are never inserted
    /// into the map, so this doubles as "how many facets are not at
    /// default", the filter the original's `CtxRichRepr` applies.
    pub fn installed_facet_count(&self) -> usize {
        self.0.facets.len()
    }

    /// A pointer identifying this context's underlying `Rc` allocation.
    /// Two `Context`s compare equal here only if one was cloned from the
    /// other (an `Rc` bump) — any mutating method (`set_facet`, `failed`,
    /// `into_hypothetical`, ...) allocates a new `ContextInner` and so
    /// yields a different identity. Used to key per-context-identity caches
    /// (e.g. `pyata-solve`'s `FactsGoal::ctx_size`) rather than recomputing
    /// on every call.
    pub fn identity(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Context {
    /// A plain `Debug` rendering, grounded on the original's `CtxRichRepr`
    /// (`Facets.py`): report failure/hypothetical status and how many
    /// facets are installed, skipping the ones still at default (which,
    /// per [`Context::set_facet`], are simply never inserted).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("failed", &self.0.failed)
            .field("hypothetical", &self.0.hypothetical)
            .field("facets_installed", &self.0.facets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, PartialEq, Debug)]
    struct Counter(i32);

    #[test]
    fn default_facet_is_default_value() {
        let ctx = Context::new();
        assert_eq!(*ctx.get_facet::<Counter>(), Counter(0));
    }

    #[test]
    fn set_facet_is_persistent() {
        let ctx0 = Context::new();
        let ctx1 = ctx0.set_facet(Counter(1));
        let ctx2 = ctx1.set_facet(Counter(2));
        assert_eq!(*ctx0.get_facet::<Counter>(), Counter(0));
        assert_eq!(*ctx1.get_facet::<Counter>(), Counter(1));
        assert_eq!(*ctx2.get_facet::<Counter>(), Counter(2));
    }

    #[test]
    fn failed_context_is_distinguishable() {
        let ctx = Context::new();
        let failed = ctx.failed();
        assert!(!ctx.is_failed());
        assert!(failed.is_failed());
    }

    #[test]
    fn hypothetical_marking_does_not_affect_parent() {
        let ctx = Context::new();
        let hyp = ctx.into_hypothetical();
        assert!(!ctx.is_hypothetical());
        assert!(hyp.is_hypothetical());
    }

    #[test]
    fn identity_is_stable_under_clone_and_changes_on_mutation() {
        let ctx = Context::new();
        let cloned = ctx.clone();
        assert_eq!(ctx.identity(), cloned.identity());
        let mutated = ctx.set_facet(Counter(1));
        assert_ne!(ctx.identity(), mutated.identity());
    }
}
