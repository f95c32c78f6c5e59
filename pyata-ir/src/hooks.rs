//! Event, pipeline and broadcast hook registries (`spec.md` §4.3).
//!
//! The original Python keys hooks by arbitrary hashable objects (often
//! function or class objects themselves). Per the REDESIGN FLAGS / DESIGN
//! NOTES ("Hook-key identity"), this is translated into [`HookKey`]: an enum
//! of the well-known hooks this crate and `pyata-solve` actually register,
//! plus a `Custom(u64)` escape hatch for extensions. Callback payloads are
//! likewise heterogeneous across hook kinds (a `(Var, Term)` pair for
//! substitution, a row array for fact tables, a connective tuple for
//! heuristics defined two crates up in `pyata-solve`), so callbacks are
//! stored type-erased behind [`std::any::Any`] and each registrant downcasts
//! its own payload — the same pattern the teacher's `RustIrDatabase` trait
//! object dispatch uses for "ask the collaborator, I don't know its concrete
//! type" boundaries.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use pyata_collections::Cons;

use crate::context::Context;

/// Identifies a hook. `Custom` is the escape hatch extensions outside this
/// workspace use to register their own hook points.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum HookKey {
    Substitution,
    WalkCondensible,
    WalkCondense,
    Unify,
    Propagate,
    ConstraintUnsatisfied,
    AndHeuristic,
    OrHeuristic,
    FacetMutation,
    FactsRows(u64),
    FactCheckPassed(u64),
    FactCheckFailed(u64),
    /// Fires once per variable allocated by [`crate::vars::fresh`].
    VarFresh,
    /// One part of a debug-mode facet-mutation broadcast key: which
    /// operation ran (`set`, `update`, `mutate`, ...). Combined with
    /// [`HookKey::FacetName`] as `vec![FacetOp(op), FacetName(name)]` so that
    /// the 2-element prefix (op + specific facet) fires before the
    /// 1-element prefix (op, any facet) — "deeper keys fire first" per
    /// `spec.md` §4.3, with "deeper" here meaning "names the specific
    /// facet" rather than just "longer".
    FacetOp(FacetOp),
    /// The other half of a facet-mutation broadcast key: see
    /// [`HookKey::FacetOp`].
    FacetName(&'static str),
    Custom(u64),
}

/// The operation performed on a facet, used to build debug-mode mutation
/// broadcast keys (`spec.md` §4.2: "fires hierarchical broadcasts on every
/// facet mutation, keyed by `(Facet, operation)` and `(specific-facet,
/// operation)`").
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FacetOp {
    Get,
    Set,
    SetWhole,
    Update,
    Mutate,
    Delete,
}

/// Builds the two-part broadcast key for a facet mutation: firing `run`
/// with this key hits the specific-facet listener (full key) before the
/// any-facet listener (the `[FacetOp(op)]` prefix).
pub fn facet_mutation_key(name: &'static str, op: FacetOp) -> BroadcastKey {
    vec![HookKey::FacetOp(op), HookKey::FacetName(name)]
}

impl fmt::Display for HookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A key for a [`BroadcastHooks`] registration: a non-empty sequence of
/// [`HookKey`] parts, most-specific first. `run` fires every *prefix* of a
/// lookup key from longest to shortest, so registering under a short prefix
/// (e.g. just `[HookKey::FacetMutation]`) catches every more-specific
/// broadcast under it.
pub type BroadcastKey = Vec<HookKey>;

/// Whether a callback must be skipped while the context is hypothetical
/// (`spec.md` §4.11): callbacks registered as `Effectful` are skipped in a
/// speculative fork; callbacks registered as `Pure` always run. This is
/// recorded at registration time, per the DESIGN NOTES guidance to avoid a
/// side-channel set.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    Pure,
    Effectful,
}

/// The result of a single callback invocation: either the (possibly
/// updated) context for subsequent callbacks to keep processing, or a
/// short-circuit that aborts the remainder of this `run` for this key.
pub enum Outcome<T> {
    Continue(Context, T),
    ShortCircuit(Context, Option<T>),
}

fn is_hypothetical_and_pure_only(ctx: &Context, effect: Effect) -> bool {
    ctx.is_hypothetical() && effect == Effect::Effectful
}

// ---------------------------------------------------------------------
// Event hooks: (ctx, data) -> ctx
// ---------------------------------------------------------------------

type EventCallback = dyn Fn(Context, &dyn Any) -> Outcome<()>;

#[derive(Clone)]
struct EventEntry {
    effect: Effect,
    callback: Rc<EventCallback>,
}

#[derive(Clone, Default)]
pub struct EventHooks {
    table: pyata_collections::PersistentMap<HookKey, Cons<EventEntry>>,
}

impl EventHooks {
    #[must_use]
    pub fn register<F>(&self, key: HookKey, effect: Effect, callback: F) -> Self
    where
        F: Fn(Context, &dyn Any) -> Outcome<()> + 'static,
    {
        let chain = self.table.get(&key).cloned().unwrap_or_default();
        let chain = chain.prepend(EventEntry {
            effect,
            callback: Rc::new(callback),
        });
        EventHooks {
            table: self.table.set(key, chain),
        }
    }

    /// Folds every registered callback, newest-first, over `ctx`.
    pub fn run(&self, mut ctx: Context, key: &HookKey, data: &dyn Any) -> Context {
        let chain = match self.table.get(key) {
            Some(chain) => chain,
            None => return ctx,
        };
        for entry in chain.iter() {
            if is_hypothetical_and_pure_only(&ctx, entry.effect) {
                continue;
            }
            match (entry.callback)(ctx, data) {
                Outcome::Continue(next, ()) => ctx = next,
                Outcome::ShortCircuit(next, _) => return next,
            }
        }
        ctx
    }
}

// ---------------------------------------------------------------------
// Pipeline hooks: (ctx, data) -> (ctx, data)
// ---------------------------------------------------------------------

type PipelineCallback<T> = dyn Fn(Context, T) -> Outcome<T>;

struct PipelineEntry<T> {
    effect: Effect,
    callback: Rc<PipelineCallback<T>>,
}

impl<T> Clone for PipelineEntry<T> {
    fn clone(&self) -> Self {
        PipelineEntry {
            effect: self.effect,
            callback: Rc::clone(&self.callback),
        }
    }
}

/// A pipeline registry threading a single concrete payload type `T` through
/// its callbacks. Distinct hook kinds with distinct payloads (substitution
/// pairs, connective-reordering tuples, row arrays) each get their own
/// `PipelineHooks<T>` instance rather than sharing one `Any`-erased table,
/// since the payload is *transformed* (not just observed) at every step and
/// a typed pipeline keeps that transformation checked at compile time.
pub struct PipelineHooks<T> {
    chain: Cons<PipelineEntry<T>>,
}

impl<T> Clone for PipelineHooks<T> {
    fn clone(&self) -> Self {
        PipelineHooks {
            chain: self.chain.clone(),
        }
    }
}

impl<T> Default for PipelineHooks<T> {
    fn default() -> Self {
        PipelineHooks {
            chain: Cons::nil(),
        }
    }
}

impl<T> PipelineHooks<T> {
    #[must_use]
    pub fn register<F>(&self, effect: Effect, callback: F) -> Self
    where
        F: Fn(Context, T) -> Outcome<T> + 'static,
    {
        PipelineHooks {
            chain: self.chain.prepend(PipelineEntry {
                effect,
                callback: Rc::new(callback),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Threads `data` through every registered callback, newest-first.
    pub fn run(&self, mut ctx: Context, mut data: T) -> (Context, T) {
        for entry in self.chain.iter() {
            if is_hypothetical_and_pure_only(&ctx, entry.effect) {
                continue;
            }
            match (entry.callback)(ctx, data) {
                Outcome::Continue(next_ctx, next_data) => {
                    ctx = next_ctx;
                    data = next_data;
                }
                Outcome::ShortCircuit(next_ctx, replacement) => {
                    // A short-circuited pipeline must still produce a value
                    // of type T for the caller; `spec.md` §7.4 requires a
                    // type-incompatible replacement to be fatal, which in a
                    // statically-typed translation is enforced by the type
                    // system itself (`replacement: Option<T>` cannot carry
                    // the wrong type). A `None` replacement simply keeps the
                    // last value seen before the short-circuit.
                    return (next_ctx, replacement.unwrap_or(data));
                }
            }
        }
        (ctx, data)
    }
}

// ---------------------------------------------------------------------
// Broadcast hooks: tuple key, every prefix fires, deepest first
// ---------------------------------------------------------------------

type BroadcastCallback = dyn Fn(Context, &BroadcastKey, &dyn Any) -> Outcome<()>;

#[derive(Clone)]
struct BroadcastEntry {
    effect: Effect,
    callback: Rc<BroadcastCallback>,
}

#[derive(Clone, Default)]
pub struct BroadcastHooks {
    table: pyata_collections::PersistentMap<BroadcastKey, Cons<BroadcastEntry>>,
}

impl BroadcastHooks {
    #[must_use]
    pub fn register<F>(&self, key: BroadcastKey, effect: Effect, callback: F) -> Self
    where
        F: Fn(Context, &BroadcastKey, &dyn Any) -> Outcome<()> + 'static,
    {
        assert!(!key.is_empty(), "broadcast keys must be non-empty");
        let chain = self.table.get(&key).cloned().unwrap_or_default();
        let chain = chain.prepend(BroadcastEntry {
            effect,
            callback: Rc::new(callback),
        });
        BroadcastHooks {
            table: self.table.set(key, chain),
        }
    }

    /// Runs every prefix of `key`, longest (most specific) first, each
    /// prefix's callbacks newest-first, matching §4.3's "deeper keys fire
    /// first" ordering guarantee.
    pub fn run(&self, mut ctx: Context, key: &BroadcastKey, data: &dyn Any) -> Context {
        for len in (1..=key.len()).rev() {
            let prefix = &key[..len];
            let chain = match self.table.get(&prefix.to_vec()) {
                Some(chain) => chain,
                None => continue,
            };
            for entry in chain.iter() {
                if is_hypothetical_and_pure_only(&ctx, entry.effect) {
                    continue;
                }
                match (entry.callback)(ctx, key, data) {
                    Outcome::Continue(next, ()) => ctx = next,
                    Outcome::ShortCircuit(next, _) => return next,
                }
            }
        }
        ctx
    }
}

/// The `Hooks` facet: one instance of each registry kind used by the
/// core (`Substitutions.hook_substitution`, `Unification.hook_unify`,
/// `Constraints.hook_propagate`, the `And`/`Or` heuristic pipelines, the
/// fact-table row/broadcast hooks). `pyata-solve` reaches in and registers
/// against the fields it needs; this struct only owns storage, not policy.
#[derive(Clone, Default)]
pub struct HooksFacet {
    pub events: EventHooks,
    pub broadcasts: BroadcastHooks,
}
