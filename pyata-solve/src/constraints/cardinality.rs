//! Cardinality-product constraint: `spec.md` §4.6's helper used by
//! `HeurConjCardinality` (§4.9).

use std::fmt;
use std::rc::Rc;

use pyata_ir::vars::Var;
use pyata_ir::Context;

use super::Constraint;

type SizeFn = dyn Fn(&Context) -> u64;

/// Fails the moment the product of its sized goals' contextual sizes hits
/// zero. Built from plain closures rather than a reference to the `Goal`
/// enum (`crate::goals`) so this module has no dependency in that
/// direction; `crate::heuristics` is what actually constructs these,
/// capturing each conjunct's `ctx_size` behind a thunk.
pub struct CardinalityProduct {
    watch: Vec<Var>,
    sizes: Rc<Vec<Rc<SizeFn>>>,
}

impl fmt::Debug for CardinalityProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardinalityProduct")
            .field("watch", &self.watch)
            .field("goal_count", &self.sizes.len())
            .finish()
    }
}

impl CardinalityProduct {
    pub fn new(watch: Vec<Var>, sizes: Vec<Rc<SizeFn>>) -> Self {
        CardinalityProduct {
            watch,
            sizes: Rc::new(sizes),
        }
    }
}

impl Constraint for CardinalityProduct {
    fn check(&self, ctx: &Context) -> Context {
        let product: u64 = self.sizes.iter().map(|size| size(ctx)).product();
        if product == 0 {
            ctx.failed()
        } else {
            ctx.clone()
        }
    }

    fn vars(&self) -> Vec<Var> {
        self.watch.clone()
    }
}
