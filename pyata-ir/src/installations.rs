//! `Installations`: tracks which named extensions (heuristics, chiefly)
//! have already been installed on a context lineage, so installing the
//! same one twice is a no-op (`spec.md` §8 "Installing a heuristic twice
//! has no effect beyond installing once (enforced by the Installations
//! facet)").

use crate::context::Context;
use crate::facet::map_facet;

map_facet! {
    pub struct InstallationsFacet(&'static str => ())
        default(|| ())
        name("Installations");
}

/// Something installable onto a [`Context`] exactly once, identified by a
/// stable name. `pyata-solve`'s conjunction/disjunction heuristics
/// implement this; `install` calls `Installable::install` (the source's
/// `__ctx_install__`) only the first time a given `NAME` is installed
/// against a context lineage.
pub trait Installable {
    const NAME: &'static str;

    /// Performs the actual registration (e.g. adding a callback to
    /// `And.hook_heuristic`). Only invoked by [`install`] the first time.
    fn install(&self, ctx: &Context) -> Context;
}

#[must_use]
pub fn install<H: Installable>(ctx: &Context, heuristic: &H) -> Context {
    let installations = ctx.get_facet::<InstallationsFacet>();
    if installations.get_opt(&H::NAME).is_some() {
        return ctx.clone();
    }
    let next = heuristic.install(ctx);
    let installations = next.get_facet::<InstallationsFacet>().set(H::NAME, ());
    next.set_named_facet(installations, crate::hooks::FacetOp::Set)
}

pub fn is_installed(ctx: &Context, name: &'static str) -> bool {
    ctx.get_facet::<InstallationsFacet>().get_opt(&name).is_some()
}
