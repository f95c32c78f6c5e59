//! The `Metrics` facet: the narrow slice of the original's `Metrics.py`
//! that the core itself consumes, per `SPEC_FULL.md`'s "SUPPLEMENTED
//! FEATURES" — a substitution-step counter (`spec.md` §4.10 names this
//! one explicitly), plus goal-invocation and fact-row-scan counters the
//! heuristics and solver use for introspection. The timeseries/statistics
//! export layer the original builds on top is the out-of-scope collaborator
//! `spec.md` §1 names; only the counters themselves are in scope.

use crate::facet::map_facet;

map_facet! {
    /// Named counters, e.g. `"substitutions"`, `"goal_invocations"`,
    /// `"fact_row_scans"`. Missing keys read as zero.
    pub struct MetricsFacet(&'static str => u64)
        default(|| 0)
        name("Metrics");
}

impl MetricsFacet {
    #[must_use]
    pub fn increment(&self, key: &'static str) -> Self {
        self.set(key, self.get(&key) + 1)
    }

    #[must_use]
    pub fn increment_by(&self, key: &'static str, amount: u64) -> Self {
        self.set(key, self.get(&key) + amount)
    }
}

/// Well-known counter names the core increments.
pub mod counters {
    pub const SUBSTITUTIONS: &str = "substitutions";
    pub const GOAL_INVOCATIONS: &str = "goal_invocations";
    pub const FACT_ROW_SCANS: &str = "fact_row_scans";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_is_persistent() {
        let m0 = MetricsFacet::default();
        let m1 = m0.increment(counters::SUBSTITUTIONS);
        let m2 = m1.increment(counters::SUBSTITUTIONS);
        assert_eq!(m0.get(&counters::SUBSTITUTIONS), 0);
        assert_eq!(m1.get(&counters::SUBSTITUTIONS), 1);
        assert_eq!(m2.get(&counters::SUBSTITUTIONS), 2);
    }
}
