//! Hypothetical (speculative) contexts (`spec.md` §4.11).
//!
//! The original marks a context hypothetical via a `Hypotheticals` facet and
//! rebinds every hook registry's `run` to a `run_pure` variant through an
//! `Indirections` facet, so `Effectful`-tagged callbacks are skipped for the
//! lifetime of the speculative fork. This crate resolves that indirection
//! at the source: [`crate::context::Context::is_hypothetical`] is checked
//! directly inside [`crate::hooks::EventHooks::run`],
//! [`crate::hooks::PipelineHooks::run`] and
//! [`crate::hooks::BroadcastHooks::run`] (see
//! `is_hypothetical_and_pure_only` there) rather than swapping out a second
//! indirection layer — same observable behavior (effectful callbacks never
//! run against a hypothetical context or anything derived from it), one
//! fewer moving part. See `DESIGN.md` for this Open Question resolution.

use crate::context::Context;

/// Returns a hypothetical fork of `ctx`: unification, substitution and
/// constraint-check hooks all still run (they are what fact-table lookahead
/// wants to observe), but any hook registered as
/// [`crate::hooks::Effect::Effectful`] — recording a metrics counter,
/// firing an observability broadcast, anything with a side effect outside
/// the returned context itself — is skipped.
#[must_use]
pub fn get_hypothetical(ctx: &Context) -> Context {
    ctx.into_hypothetical()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hypothetical_fork_does_not_mutate_parent() {
        let ctx = Context::new();
        let hyp = get_hypothetical(&ctx);
        assert!(!ctx.is_hypothetical());
        assert!(hyp.is_hypothetical());
    }
}
