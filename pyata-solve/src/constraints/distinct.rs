//! `Distinct(v₁…vₙ)`: `spec.md` §4.6.

use pyata_ir::subst::walk_condensing;
use pyata_ir::vars::Var;
use pyata_ir::Context;

use super::Constraint;

/// Fails if any two of its variables walk to the same value.
#[derive(Debug, Clone)]
pub struct Distinct {
    vars: Vec<Var>,
}

impl Distinct {
    pub fn new(vars: Vec<Var>) -> Self {
        Distinct { vars }
    }
}

impl Constraint for Distinct {
    fn check(&self, ctx: &Context) -> Context {
        let mut ctx = ctx.clone();
        let mut seen = Vec::with_capacity(self.vars.len());
        for var in &self.vars {
            let (next, value) = walk_condensing(&ctx, *var);
            ctx = next;
            if seen.contains(&value) {
                return ctx.failed();
            }
            seen.push(value);
        }
        ctx
    }

    fn vars(&self) -> Vec<Var> {
        self.vars.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::{sub, Term};
    use pyata_ir::vars::fresh;

    #[test]
    fn fails_when_two_vars_coincide() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 3);
        let distinct = Distinct::new(vars.clone());
        let ctx = sub(&ctx, vars[0], Term::Int(1));
        let ctx = sub(&ctx, vars[1], Term::Int(2));
        assert!(!distinct.check(&ctx).is_failed());
        let ctx = sub(&ctx, vars[2], Term::Int(1));
        assert!(distinct.check(&ctx).is_failed());
    }

    #[test]
    fn unbound_vars_are_pairwise_distinct_by_identity() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let distinct = Distinct::new(vars);
        assert!(!distinct.check(&ctx).is_failed());
    }
}
