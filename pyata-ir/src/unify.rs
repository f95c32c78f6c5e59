//! Structural unification (`spec.md` §4.5) plus the Iterables extension
//! (§4.5, "optional collaborator").

use std::rc::Rc;

use pyata_collections::Cons;

use crate::context::Context;
use crate::subst::{sub, walk_term, Term};
use crate::vars::Var;

type UnifyCallback = dyn Fn(&Context, &Term, &Term) -> Option<Context>;

/// `hook_unify`: a chain of extensions consulted, newest-first, when
/// neither side of a `unify` call is a variable and the two walked values
/// are not already equal. The first extension to return `Some` wins — even
/// if the context it returns is `Failed`, since that extension *recognized*
/// the shape (e.g. two lists) and definitively decided the outcome; `None`
/// means "not my shape, ask the next extension". If nothing claims the
/// pair, unification fails.
#[derive(Clone)]
pub struct UnifyHook {
    chain: Cons<Rc<UnifyCallback>>,
}

impl Default for UnifyHook {
    fn default() -> Self {
        UnifyHook { chain: Cons::nil() }.register(iterables_unify)
    }
}

impl UnifyHook {
    #[must_use]
    pub fn register<F>(&self, callback: F) -> Self
    where
        F: Fn(&Context, &Term, &Term) -> Option<Context> + 'static,
    {
        UnifyHook {
            chain: self.chain.prepend(Rc::new(callback)),
        }
    }

    fn run(&self, ctx: &Context, x: &Term, y: &Term) -> Option<Context> {
        for callback in self.chain.iter() {
            if let Some(result) = callback(ctx, x, y) {
                return Some(result);
            }
        }
        None
    }
}

/// `unify(ctx, x, y) -> ctx-or-Failed` (`spec.md` §4.5).
pub fn unify(ctx: &Context, x: &Term, y: &Term) -> Context {
    let (ctx, xw) = walk_term(ctx, x);
    let (ctx, yw) = walk_term(&ctx, y);

    if xw == yw {
        return ctx;
    }
    if is_wildcard(&xw) || is_wildcard(&yw) {
        return ctx;
    }
    match (&xw, &yw) {
        (Term::Var(v), _) => sub(&ctx, *v, yw),
        (_, Term::Var(v)) => sub(&ctx, *v, xw),
        _ => {
            let hook = ctx.get_facet::<UnifyHook>();
            match hook.run(&ctx, &xw, &yw) {
                Some(result) => result,
                None => ctx.failed(),
            }
        }
    }
}

fn is_wildcard(t: &Term) -> bool {
    matches!(t, Term::Var(v) if v.is_wildcard())
}

/// The default `hook_unify` extension: unifies two `Term::List`s
/// element-wise, with a trailing [`Term::Ellipsis`] on either side matching
/// "any remaining" rather than requiring exact length equality. Nested
/// lists recurse through the ordinary [`unify`] entry point.
fn iterables_unify(ctx: &Context, x: &Term, y: &Term) -> Option<Context> {
    match (x, y) {
        (Term::List(xs), Term::List(ys)) => Some(unify_lists(ctx, xs, ys)),
        _ => None,
    }
}

fn split_ellipsis(items: &[Term]) -> (&[Term], bool) {
    match items.last() {
        Some(Term::Ellipsis) => (&items[..items.len() - 1], true),
        _ => (items, false),
    }
}

fn unify_lists(ctx: &Context, xs: &[Term], ys: &[Term]) -> Context {
    let (xs_fixed, x_ellipsis) = split_ellipsis(xs);
    let (ys_fixed, y_ellipsis) = split_ellipsis(ys);

    if !x_ellipsis && !y_ellipsis && xs_fixed.len() != ys_fixed.len() {
        return ctx.failed();
    }
    if x_ellipsis && !y_ellipsis && xs_fixed.len() > ys_fixed.len() {
        return ctx.failed();
    }
    if y_ellipsis && !x_ellipsis && ys_fixed.len() > xs_fixed.len() {
        return ctx.failed();
    }

    let min_len = xs_fixed.len().min(ys_fixed.len());
    let mut ctx = ctx.clone();
    for i in 0..min_len {
        ctx = unify(&ctx, &xs_fixed[i], &ys_fixed[i]);
        if ctx.is_failed() {
            return ctx;
        }
    }
    ctx
}

/// Registers an additional `hook_unify` extension (e.g. a collaborator
/// adding a struct-like term shape), newest-first like every other hook.
#[must_use]
pub fn install_unify_extension<F>(ctx: &Context, callback: F) -> Context
where
    F: Fn(&Context, &Term, &Term) -> Option<Context> + 'static,
{
    let hook = ctx.get_facet::<UnifyHook>().register(callback);
    ctx.set_facet(hook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::fresh;

    fn var_term(v: Var) -> Term {
        Term::Var(v)
    }

    #[test]
    fn unify_same_value_is_noop() {
        let ctx = Context::new();
        let a = Term::Int(5);
        let ctx2 = unify(&ctx, &a, &a);
        assert!(!ctx2.is_failed());
    }

    #[test]
    fn unify_is_symmetric() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let a = var_term(vars[0]);
        let b = Term::Int(9);
        let ctx_ab = unify(&ctx, &a, &b);
        let ctx_ba = unify(&ctx, &b, &a);
        assert_eq!(
            crate::subst::walk(&ctx_ab, vars[0]),
            crate::subst::walk(&ctx_ba, vars[0])
        );
    }

    #[test]
    fn unify_mismatched_ground_values_fails() {
        let ctx = Context::new();
        let ctx2 = unify(&ctx, &Term::Int(1), &Term::Int(2));
        assert!(ctx2.is_failed());
    }

    #[test]
    fn unify_var_binds_to_value() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let ctx2 = unify(&ctx, &var_term(vars[0]), &Term::Int(42));
        assert_eq!(crate::subst::walk(&ctx2, vars[0]), Term::Int(42));
    }

    #[test]
    fn unify_wildcard_matches_anything_without_binding() {
        let ctx = Context::new();
        let ctx2 = unify(&ctx, &var_term(Var::WILDCARD), &Term::Int(1));
        assert!(!ctx2.is_failed());
        assert_eq!(
            ctx2.get_facet::<crate::subst::SubstFacet>().len(),
            ctx.get_facet::<crate::subst::SubstFacet>().len()
        );
    }

    #[test]
    fn iterables_unify_with_trailing_ellipsis() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let xs = Term::List(Rc::new(vec![Term::Int(1), Term::Int(2), Term::Int(3)]));
        let ys = Term::List(Rc::new(vec![
            Term::Int(1),
            var_term(vars[0]),
            Term::Ellipsis,
        ]));
        let ctx2 = unify(&ctx, &xs, &ys);
        assert!(!ctx2.is_failed());
        assert_eq!(crate::subst::walk(&ctx2, vars[0]), Term::Int(2));
    }

    #[test]
    fn iterables_unify_fails_on_length_mismatch_without_ellipsis() {
        let ctx = Context::new();
        let xs = Term::List(Rc::new(vec![Term::Int(1), Term::Int(2)]));
        let ys = Term::List(Rc::new(vec![Term::Int(1)]));
        let ctx2 = unify(&ctx, &xs, &ys);
        assert!(ctx2.is_failed());
    }

    #[test]
    fn nested_lists_recurse() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let xs = Term::List(Rc::new(vec![Term::List(Rc::new(vec![
            Term::Int(1),
            Term::Int(2),
        ]))]));
        let ys = Term::List(Rc::new(vec![Term::List(Rc::new(vec![
            Term::Int(1),
            var_term(vars[0]),
        ]))]));
        let ctx2 = unify(&ctx, &xs, &ys);
        assert!(!ctx2.is_failed());
        assert_eq!(crate::subst::walk(&ctx2, vars[0]), Term::Int(2));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::vars::fresh;
    use proptest::prelude::*;

    proptest! {
        /// `unify(ctx, a, b)` and `unify(ctx, b, a)` agree on success/failure
        /// and, when they succeed, bind a variable operand to the same value
        /// regardless of argument order (`spec.md` §4.5 is symmetric in `a`
        /// and `b`).
        #[test]
        fn unify_var_and_ground_is_symmetric(value in any::<i64>()) {
            let ctx = Context::new();
            let (ctx, vars) = fresh(&ctx, None, 1);
            let var = Term::Var(vars[0]);
            let ground = Term::Int(value);

            let ctx_var_ground = unify(&ctx, &var, &ground);
            let ctx_ground_var = unify(&ctx, &ground, &var);
            prop_assert_eq!(ctx_var_ground.is_failed(), ctx_ground_var.is_failed());
            prop_assert_eq!(
                crate::subst::walk(&ctx_var_ground, vars[0]),
                crate::subst::walk(&ctx_ground_var, vars[0])
            );
        }

        #[test]
        fn unify_two_ground_values_is_symmetric(a in any::<i64>(), b in any::<i64>()) {
            let ctx = Context::new();
            let ctx_ab = unify(&ctx, &Term::Int(a), &Term::Int(b));
            let ctx_ba = unify(&ctx, &Term::Int(b), &Term::Int(a));
            prop_assert_eq!(ctx_ab.is_failed(), ctx_ba.is_failed());
            prop_assert_eq!(ctx_ab.is_failed(), a != b);
        }
    }
}
