//! Fatal errors: the second of `spec.md` §7's two error channels.
//!
//! Unification/constraint failure is *recoverable* and travels as the
//! `Failed` sentinel context (see [`crate::context::Context::is_failed`]);
//! everything else `spec.md` §7 lists (reifier conflicts, hook short-circuit
//! type mismatches, relation arity mismatches, empty fact-table
//! construction) is *fatal* and propagates as a `Result::Err` all the way to
//! the solver's caller, never swallowed. Grounded on
//! `examples/aravind-pg-chalk/chalk-slg/Cargo.toml`, the one Cargo.toml in
//! the retrieval pack that lists `error-chain = "0.11.0"` directly.

error_chain::error_chain! {
    errors {
        /// A variable already has a reifier installed and `contextualize`
        /// (or a second `fresh` call reusing the same identity) attempted
        /// to install a different, conflicting one.
        ReifierConflict(var: String) {
            description("conflicting reifier for an existing variable")
            display("variable {} already has a reifier installed that conflicts with this one", var)
        }
        /// A hook pipeline short-circuited with a replacement value whose
        /// type does not match the in-flight pipeline value. `spec.md` §7.4
        /// and the REDESIGN FLAGS both specify this as fatal, resolving the
        /// ambiguity the source left open (some versions silently skip it).
        ShortCircuitTypeMismatch(hook: String) {
            description("hook short-circuit replacement value has the wrong type")
            display("short-circuit from hook {} carried a replacement value of the wrong type", hook)
        }
        /// A relation was called with a number of arguments that does not
        /// match its declared arity.
        ArityMismatch(relation: String, expected: usize, got: usize) {
            description("relation called with the wrong number of arguments")
            display(
                "relation {} expects {} argument(s), got {}",
                relation, expected, got
            )
        }
        /// A fact table was constructed with zero rows. `spec.md` §8 names
        /// this explicitly: "Empty fact table construction is rejected."
        EmptyFactTable(name: String) {
            description("fact table constructed with no rows")
            display("fact table {} must have at least one row", name)
        }
        /// A fact table row's column count does not match the table's
        /// declared arity.
        RaggedFactTable(name: String, row: usize, expected: usize, got: usize) {
            description("fact table row has the wrong number of columns")
            display(
                "fact table {} row {} has {} column(s), expected {}",
                name, row, got, expected
            )
        }
    }
}
