//! Per-run counters for the evaluator.
//!
//! [`RunMetrics`] accumulates across every `run()` on one evaluator, so a
//! host that seeds, runs, writes, and runs again sees totals.

use indexmap::IndexMap;

/// Counters collected while driving a network to its fixpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunMetrics {
    /// Wall-clock time spent inside `run()`, in microseconds.
    pub total_us: u64,
    /// Cells removed from the worklist.
    pub cells_processed: u64,
    /// Propagator runs attempted, fired or not.
    pub propagator_runs: u64,
    /// Runs that passed the all-inputs-filled guard and fired.
    pub firings: u64,
    /// Runs that stopped at the guard because an input was empty.
    pub guard_skips: u64,
    /// Calls to `set`, whatever their outcome.
    pub writes: u64,
    /// Writes of a value equal to the one already stored.
    pub equal_writes: u64,
    /// Writes that disagreed with the stored value.
    pub conflicts: u64,
    /// Calls to `notify`, including ones for already-pending cells.
    pub notifications: u64,
    /// Firings per propagator name, in first-fired order.
    pub firings_by_propagator: IndexMap<String, u64>,
}

impl RunMetrics {
    /// Firings recorded under `name`.
    pub fn firings_of(&self, name: &str) -> u64 {
        self.firings_by_propagator.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn record_firing(&mut self, name: &str) {
        self.firings += 1;
        match self.firings_by_propagator.get_mut(name) {
            Some(n) => *n += 1,
            None => {
                self.firings_by_propagator.insert(name.to_string(), 1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = RunMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.cells_processed, 0);
        assert_eq!(m.propagator_runs, 0);
        assert_eq!(m.firings, 0);
        assert_eq!(m.guard_skips, 0);
        assert_eq!(m.writes, 0);
        assert_eq!(m.equal_writes, 0);
        assert_eq!(m.conflicts, 0);
        assert_eq!(m.notifications, 0);
        assert!(m.firings_by_propagator.is_empty());
    }

    #[test]
    fn firings_grouped_by_name() {
        let mut m = RunMetrics::default();
        m.record_firing("add");
        m.record_firing("identity");
        m.record_firing("add");
        assert_eq!(m.firings, 3);
        assert_eq!(m.firings_of("add"), 2);
        assert_eq!(m.firings_of("identity"), 1);
        assert_eq!(m.firings_of("min"), 0);
        let order: Vec<_> = m.firings_by_propagator.keys().cloned().collect();
        assert_eq!(order, vec!["add".to_string(), "identity".to_string()]);
    }
}
