//! `Relation`/`FactsGoal` (`spec.md` §4.8).

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use pyata_ir::error::{ErrorKind, Result};
use pyata_ir::hooks::{Effect, HookKey, PipelineHooks};
use pyata_ir::subst::Term;
use pyata_ir::unify::unify;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use crate::goals::{Distribution, Goal, GoalStream};

/// The row-order pipeline every `FactsGoal` consults before building its
/// stream (`spec.md` §4.8 "fire the `hook_facts` pipeline, which the
/// random-order heuristic uses to permute rows"). One shared per-context
/// hook rather than one per relation instance: `HeurFactsOrdRnd`
/// (`crate::heuristics`) registers against it once and every fact-table
/// goal's row list passes through it uniformly.
#[derive(Clone, Default)]
pub struct FactsOrderHook(pub PipelineHooks<Vec<Vec<Term>>>);

/// A named fact table: an immutable row snapshot plus its declared arity.
/// `assert`/`retract` return a new `Relation` sharing the old row `Rc` where
/// possible rather than mutating in place, matching `spec.md` §4.8's
/// "versioned copy-on-mutation" array.
#[derive(Clone, Debug)]
pub struct Relation {
    name: Rc<str>,
    arity: usize,
    rows: Rc<Vec<Vec<Term>>>,
}

impl Relation {
    /// Constructs a relation from its full row set. Rejects an empty table
    /// (`spec.md` §8: "Empty fact table construction is rejected") and any
    /// row whose column count disagrees with the first row's.
    pub fn new(name: impl Into<Rc<str>>, rows: Vec<Vec<Term>>) -> Result<Relation> {
        let name = name.into();
        if rows.is_empty() {
            return Err(ErrorKind::EmptyFactTable(name.to_string()).into());
        }
        let arity = rows[0].len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != arity {
                return Err(ErrorKind::RaggedFactTable(name.to_string(), i, arity, row.len()).into());
            }
        }
        Ok(Relation {
            name,
            arity,
            rows: Rc::new(rows),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    #[must_use]
    pub fn assert(&self, row: Vec<Term>) -> Result<Relation> {
        if row.len() != self.arity {
            return Err(ErrorKind::RaggedFactTable(self.name.to_string(), self.rows.len(), self.arity, row.len()).into());
        }
        let mut rows = (*self.rows).clone();
        rows.push(row);
        Ok(Relation {
            name: Rc::clone(&self.name),
            arity: self.arity,
            rows: Rc::new(rows),
        })
    }

    #[must_use]
    pub fn retract(&self, row: &[Term]) -> Relation {
        let rows: Vec<Vec<Term>> = self
            .rows
            .iter()
            .filter(|existing| existing.as_slice() != row)
            .cloned()
            .collect();
        Relation {
            name: Rc::clone(&self.name),
            arity: self.arity,
            rows: Rc::new(rows),
        }
    }

    /// Builds a `FactsGoal` bound to the current row snapshot
    /// (`spec.md` §4.8).
    pub fn call(&self, args: Vec<Term>) -> Result<Goal> {
        if args.len() != self.arity {
            return Err(ErrorKind::ArityMismatch(self.name.to_string(), self.arity, args.len()).into());
        }
        Ok(Goal::Facts(Rc::new(FactsGoal::new(
            Rc::clone(&self.name),
            Rc::clone(&self.rows),
            args,
        ))))
    }
}

/// A relation call bound to a row snapshot, with its free/bound columns
/// precomputed at construction time (`spec.md` §4.8).
pub struct FactsGoal {
    name: Rc<str>,
    hook_id: u64,
    rows: Rc<Vec<Vec<Term>>>,
    args: Vec<Term>,
    free_ixs: Vec<usize>,
    bound_ixs: Vec<usize>,
    /// Set when some ground argument never occurs in its column at all —
    /// the "short-circuit-failure flag" `spec.md` §4.8 names, letting the
    /// goal skip scanning rows entirely.
    impossible: bool,
    /// `spec.md` §4.8's "Contextual size ... cached per context identity
    /// once computed": the last `(Context::identity(), row count)` pair
    /// this goal computed, reused as long as the context identity matches.
    size_cache: Cell<Option<(*const (), u64)>>,
}

impl std::fmt::Debug for FactsGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactsGoal")
            .field("name", &self.name)
            .field("rows", &self.rows.len())
            .field("impossible", &self.impossible)
            .finish()
    }
}

impl FactsGoal {
    fn new(name: Rc<str>, rows: Rc<Vec<Vec<Term>>>, args: Vec<Term>) -> Self {
        let mut free_ixs = Vec::new();
        let mut bound_ixs = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            if arg.is_var() {
                free_ixs.push(i);
            } else {
                bound_ixs.push(i);
            }
        }
        let impossible = bound_ixs
            .iter()
            .any(|&i| !rows.iter().any(|row| row[i] == args[i]));
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        let hook_id = hasher.finish();
        FactsGoal {
            name,
            hook_id,
            rows,
            args,
            free_ixs,
            bound_ixs,
            impossible,
            size_cache: Cell::new(None),
        }
    }

    pub fn free_vars(&self) -> Vec<Var> {
        self.free_ixs
            .iter()
            .filter_map(|&i| self.args[i].as_var())
            .filter(|v| !v.is_wildcard())
            .collect()
    }

    /// `spec.md` §4.8's "Contextual filter": rows consistent with the
    /// columns that were already ground at construction time, further
    /// narrowed by a hypothetical-unification lookahead against every free
    /// column (consolidating the original's separate Notin-precheck,
    /// already-walked and lookahead stages into one pass — see
    /// `DESIGN.md`). Constraint re-checks registered as `Effect::Pure`
    /// (`crate::constraints`) still fire inside the hypothetical probe, so
    /// a `Neq`/`Distinct`/`Notin` violation still prunes a row here. Bumps
    /// `counters::FACT_ROW_SCANS` by the full row count once per call
    /// (skipped when `impossible` already ruled every row out, since none
    /// are actually examined).
    fn filtered_rows(&self, ctx: &Context) -> (Context, Vec<Vec<Term>>) {
        if self.impossible {
            return (ctx.clone(), Vec::new());
        }
        let metrics = ctx
            .get_facet::<pyata_ir::metrics::MetricsFacet>()
            .increment_by(pyata_ir::metrics::counters::FACT_ROW_SCANS, self.rows.len() as u64);
        let ctx = ctx.set_facet(metrics);
        let rows = self
            .rows
            .iter()
            .filter(|row| self.row_survives(&ctx, row))
            .cloned()
            .collect();
        (ctx, rows)
    }

    fn row_survives(&self, ctx: &Context, row: &[Term]) -> bool {
        for &i in &self.bound_ixs {
            if row[i] != self.args[i] {
                return false;
            }
        }
        if self.free_ixs.is_empty() {
            return true;
        }
        let mut probe = ctx.into_hypothetical();
        for &i in &self.free_ixs {
            probe = unify(&probe, &self.args[i], &row[i]);
            if probe.is_failed() {
                return false;
            }
        }
        true
    }

    /// Row count after the contextual filter — `spec.md` §4.8's
    /// "Contextual size (the filtered row count, cached per context
    /// identity once computed)".
    pub fn ctx_size(&self, ctx: &Context) -> u64 {
        let identity = ctx.identity();
        if let Some((cached_identity, cached_size)) = self.size_cache.get() {
            if cached_identity == identity {
                return cached_size;
            }
        }
        let (_, rows) = self.filtered_rows(ctx);
        let size = rows.len() as u64;
        self.size_cache.set(Some((identity, size)));
        size
    }

    pub fn distribution(&self, ctx: &Context) -> Distribution {
        let (_, rows) = self.filtered_rows(ctx);
        let mut dist = Distribution::default();
        for &i in &self.free_ixs {
            let var = match self.args[i].as_var() {
                Some(v) => v,
                None => continue,
            };
            let mut counts: rustc_hash::FxHashMap<Term, u64> = rustc_hash::FxHashMap::default();
            for row in &rows {
                *counts.entry(row[i].clone()).or_insert(0u64) += 1;
            }
            dist.insert(var, counts);
        }
        dist
    }

    pub fn call(&self, ctx: Context) -> GoalStream {
        let (ctx, rows) = self.filtered_rows(&ctx);
        let order_hook = ctx.get_facet::<FactsOrderHook>();
        let (ctx, rows) = order_hook.0.run(ctx, rows);

        let free_ixs = self.free_ixs.clone();
        let args = self.args.clone();
        let passed_key: pyata_ir::hooks::BroadcastKey = vec![HookKey::FactCheckPassed(self.hook_id)];
        let failed_key: pyata_ir::hooks::BroadcastKey = vec![HookKey::FactCheckFailed(self.hook_id)];

        Box::new(rows.into_iter().filter_map(move |row| {
            let mut probe = ctx.clone();
            for &i in &free_ixs {
                probe = unify(&probe, &args[i], &row[i]);
                if probe.is_failed() {
                    break;
                }
            }
            if probe.is_failed() {
                let ctx = probe.hooks().broadcasts.run(probe.clone(), &failed_key, &());
                let _ = ctx;
                None
            } else {
                let next = probe.hooks().broadcasts.run(probe.clone(), &passed_key, &());
                Some(next)
            }
        }))
    }
}
