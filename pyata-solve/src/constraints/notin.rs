//! `Notin(subject, forbidden-set)`: `spec.md` §4.6.

use std::collections::HashSet;
use std::rc::Rc;

use pyata_ir::subst::{walk_condensing, Term};
use pyata_ir::vars::Var;
use pyata_ir::Context;

use super::Constraint;

/// The subject of a `Notin`: a single variable, or a tuple checked
/// independently against the same forbidden set.
#[derive(Debug, Clone)]
pub enum NotinSubject {
    Single(Var),
    Tuple(Vec<Var>),
}

/// Forbidden values split, at construction time, into ground literals
/// (hashable, tested with a set lookup) and variable references (re-walked
/// on every check, since their value can change).
#[derive(Debug, Clone)]
pub struct Notin {
    subject: NotinSubject,
    literals: Rc<HashSet<Term>>,
    var_refs: Rc<Vec<Var>>,
}

impl Notin {
    pub fn new(subject: NotinSubject, forbidden: impl IntoIterator<Item = Term>) -> Self {
        let (literals, var_refs) = split(forbidden);
        Notin {
            subject,
            literals: Rc::new(literals),
            var_refs: Rc::new(var_refs),
        }
    }

    /// Returns a `Notin` with `more` added to the forbidden set. Returns a
    /// clone of `self` with no further allocation when `more` contributes
    /// nothing new (`spec.md` §4.6 "identity-preserved if no change").
    #[must_use]
    pub fn expand(&self, more: impl IntoIterator<Item = Term>) -> Self {
        let mut literals = (*self.literals).clone();
        let mut var_refs = (*self.var_refs).clone();
        let mut changed = false;
        for term in more {
            changed |= add(&mut literals, &mut var_refs, term);
        }
        if !changed {
            return self.clone();
        }
        Notin {
            subject: self.subject.clone(),
            literals: Rc::new(literals),
            var_refs: Rc::new(var_refs),
        }
    }

    /// Returns a `Notin` with `fewer` removed from the forbidden set.
    /// Identity-preserved (a clone, no new `Rc` allocation needed beyond the
    /// cheap struct copy) when nothing in `fewer` was actually present.
    #[must_use]
    pub fn contract(&self, fewer: impl IntoIterator<Item = Term>) -> Self {
        let mut literals = (*self.literals).clone();
        let mut var_refs = (*self.var_refs).clone();
        let mut changed = false;
        for term in fewer {
            match term {
                Term::Var(v) => {
                    if let Some(pos) = var_refs.iter().position(|existing| *existing == v) {
                        var_refs.remove(pos);
                        changed = true;
                    }
                }
                other => {
                    if literals.remove(&other) {
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            return self.clone();
        }
        Notin {
            subject: self.subject.clone(),
            literals: Rc::new(literals),
            var_refs: Rc::new(var_refs),
        }
    }

    fn check_one(&self, ctx: &Context, var: Var) -> Context {
        let (ctx, walked) = walk_condensing(ctx, var);
        if let Term::Var(identity) = walked {
            for forbidden in self.var_refs.iter() {
                let (_, forbidden_walked) = walk_condensing(&ctx, *forbidden);
                if let Term::Var(forbidden_identity) = forbidden_walked {
                    if forbidden_identity == identity {
                        return ctx.failed();
                    }
                }
            }
            ctx
        } else {
            if self.literals.contains(&walked) {
                return ctx.failed();
            }
            for forbidden in self.var_refs.iter() {
                let (_, forbidden_walked) = walk_condensing(&ctx, *forbidden);
                if forbidden_walked == walked {
                    return ctx.failed();
                }
            }
            ctx
        }
    }
}

fn split(forbidden: impl IntoIterator<Item = Term>) -> (HashSet<Term>, Vec<Var>) {
    let mut literals = HashSet::new();
    let mut var_refs = Vec::new();
    for term in forbidden {
        add(&mut literals, &mut var_refs, term);
    }
    (literals, var_refs)
}

fn add(literals: &mut HashSet<Term>, var_refs: &mut Vec<Var>, term: Term) -> bool {
    match term {
        Term::Var(v) => {
            if var_refs.contains(&v) {
                false
            } else {
                var_refs.push(v);
                true
            }
        }
        other => literals.insert(other),
    }
}

impl Constraint for Notin {
    fn check(&self, ctx: &Context) -> Context {
        match &self.subject {
            NotinSubject::Single(var) => self.check_one(ctx, *var),
            NotinSubject::Tuple(vars) => {
                let mut ctx = ctx.clone();
                for var in vars {
                    ctx = self.check_one(&ctx, *var);
                    if ctx.is_failed() {
                        return ctx;
                    }
                }
                ctx
            }
        }
    }

    fn vars(&self) -> Vec<Var> {
        match &self.subject {
            NotinSubject::Single(var) => vec![*var],
            NotinSubject::Tuple(vars) => vars.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyata_ir::subst::sub;
    use pyata_ir::vars::fresh;

    #[test]
    fn fails_when_walked_value_is_forbidden() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 1);
        let notin = Notin::new(NotinSubject::Single(vars[0]), vec![Term::Int(1), Term::Int(2)]);
        let ctx2 = sub(&ctx, vars[0], Term::Int(3));
        assert!(!notin.check(&ctx2).is_failed());
        let ctx3 = sub(&ctx, vars[0], Term::Int(2));
        assert!(notin.check(&ctx3).is_failed());
    }

    #[test]
    fn fails_when_unbound_identity_matches_forbidden_var() {
        let ctx = Context::new();
        let (ctx, vars) = fresh(&ctx, None, 2);
        let notin = Notin::new(NotinSubject::Single(vars[0]), vec![Term::Var(vars[1])]);
        assert!(notin.check(&ctx).is_failed());
    }

    #[test]
    fn expand_is_identity_preserved_on_noop() {
        let notin = Notin::new(NotinSubject::Single(Var::WILDCARD), vec![Term::Int(1)]);
        let same = notin.expand(vec![Term::Int(1)]);
        assert_eq!(same.literals.len(), notin.literals.len());
    }

    #[test]
    fn contract_removes_a_forbidden_literal() {
        let notin = Notin::new(NotinSubject::Single(Var::WILDCARD), vec![Term::Int(1), Term::Int(2)]);
        let smaller = notin.contract(vec![Term::Int(1)]);
        assert!(!smaller.literals.contains(&Term::Int(1)));
        assert!(smaller.literals.contains(&Term::Int(2)));
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn int_terms(values: &std::collections::HashSet<i64>) -> Vec<Term> {
        values.iter().map(|&v| Term::Int(v)).collect()
    }

    proptest! {
        /// `expand` with only terms already in the forbidden set must return
        /// the exact same `Rc` allocations — no reallocation on a no-op
        /// merge (`spec.md` §4.6 "identity-preserved if no change").
        #[test]
        fn expand_with_already_present_terms_is_identity_preserved(
            values in proptest::collection::hash_set(any::<i64>(), 1..8)
        ) {
            let terms = int_terms(&values);
            let notin = Notin::new(NotinSubject::Single(Var::WILDCARD), terms.clone());
            let expanded = notin.expand(terms);
            prop_assert!(Rc::ptr_eq(&expanded.literals, &notin.literals));
            prop_assert!(Rc::ptr_eq(&expanded.var_refs, &notin.var_refs));
        }

        /// `contract` with terms that were never in the forbidden set is
        /// likewise identity-preserved.
        #[test]
        fn contract_with_absent_terms_is_identity_preserved(
            present in proptest::collection::hash_set(any::<i64>(), 1..8),
            absent in any::<i64>(),
        ) {
            prop_assume!(!present.contains(&absent));
            let notin = Notin::new(NotinSubject::Single(Var::WILDCARD), int_terms(&present));
            let contracted = notin.contract(vec![Term::Int(absent)]);
            prop_assert!(Rc::ptr_eq(&contracted.literals, &notin.literals));
            prop_assert!(Rc::ptr_eq(&contracted.var_refs, &notin.var_refs));
        }

        /// Expanding with a genuinely new term always reallocates (breaks
        /// identity) and is exactly undone by contracting the same term.
        #[test]
        fn expand_then_contract_a_new_term_restores_the_original_contents(
            present in proptest::collection::hash_set(any::<i64>(), 1..8),
            new_value in any::<i64>(),
        ) {
            prop_assume!(!present.contains(&new_value));
            let notin = Notin::new(NotinSubject::Single(Var::WILDCARD), int_terms(&present));

            let expanded = notin.expand(vec![Term::Int(new_value)]);
            prop_assert!(!Rc::ptr_eq(&expanded.literals, &notin.literals));
            prop_assert!(expanded.literals.contains(&Term::Int(new_value)));

            let restored = expanded.contract(vec![Term::Int(new_value)]);
            prop_assert_eq!(restored.literals.len(), notin.literals.len());
            prop_assert!(!restored.literals.contains(&Term::Int(new_value)));
        }
    }
}
