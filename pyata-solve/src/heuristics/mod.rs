//! Conjunction/disjunction heuristics (`spec.md` §4.9): installable
//! extensions on `And.hook_heuristic`/`Or.hook_heuristic`
//! ([`crate::goals::AndHeuristicHook`]) and on the fact-table row-order
//! pipeline ([`crate::relations::FactsOrderHook`]).

mod cardinality;
mod chain_vars;
mod facts_order;
mod relevance;

pub use cardinality::HeurConjCardinality;
pub use chain_vars::HeurConjChainVars;
pub use facts_order::HeurFactsOrdRnd;
pub use relevance::HeurConjRelevance;

use pyata_ir::Context;

/// Installs `HeurConjCardinality`, `HeurConjChainVars` and
/// `HeurConjRelevance` in the order that makes each one see the output of
/// the one before it.
///
/// `And.hook_heuristic` runs newest-registration-first
/// (`pyata_ir::hooks::PipelineHooks`'s ordering), so to get "cardinality
/// computed over the original goal list, then chain-vars reorders it, then
/// relevance consumes the reordered list" the registration order is the
/// reverse of that execution order: `Relevance` first, `ChainVars` second,
/// `Cardinality` last (see `DESIGN.md`).
#[must_use]
pub fn install_default_and_heuristics(ctx: &Context) -> Context {
    let ctx = pyata_ir::installations::install(ctx, &HeurConjRelevance);
    let ctx = pyata_ir::installations::install(&ctx, &HeurConjChainVars);
    pyata_ir::installations::install(&ctx, &HeurConjCardinality)
}
