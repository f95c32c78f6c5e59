//! `Neq(x, y)`: `spec.md` §4.6.

use pyata_ir::subst::{walk_term, Term};
use pyata_ir::vars::Var;
use pyata_ir::Context;

use super::Constraint;

/// Fails once both sides walk to the same value; otherwise leaves `ctx`
/// untouched. Either side may be a bare ground value (`Neq::ground`) rather
/// than a second variable.
#[derive(Debug, Clone)]
pub struct Neq {
    x: Term,
    y: Term,
}

impl Neq {
    pub fn new(x: Var, y: Var) -> Self {
        Neq {
            x: Term::Var(x),
            y: Term::Var(y),
        }
    }

    pub fn ground(x: Var, y: Term) -> Self {
        Neq {
            x: Term::Var(x),
            y,
        }
    }
}

impl Constraint for Neq {
    fn check(&self, ctx: &Context) -> Context {
        let (ctx, xw) = walk_term(ctx, &self.x);
        let (ctx, yw) = walk_term(&ctx, &self.y);
        if xw == yw {
            ctx.failed()
        } else {
            ctx
        }
    }

    fn vars(&self) -> Vec<Var> {
        [&self.x, &self.y].iter().filter_map(|t| t.as_var()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::vars::fresh;

    #[test]
    fn satisfied_while_distinct() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let neq = Neq::new(vars[0], vars[1]);
        assert!(!neq.check(&ctx).is_failed());
    }

    #[test]
    fn ground_variant_checks_against_a_literal() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let ctx = pyata_ir::subst::sub(&ctx, vars[0], Term::Int(4));
        let neq = Neq::ground(vars[0], Term::Int(4));
        assert!(neq.check(&ctx).is_failed());
    }
}
