//! Evaluator configuration.
//!
//! [`EvaluatorConfig`] controls the two behaviours the engine leaves to the
//! caller: the order pending cells are removed from the worklist, and
//! whether an equal write to a filled cell re-notifies it.

// ── WorklistOrder ──────────────────────────────────────────────────

/// Removal order of pending cells.
///
/// The fixpoint is independent of this choice only when every propagator
/// body is pure and commutes with the others. `Fifo` is the reproducible
/// default; `Shuffled` models an unordered set while staying replayable
/// from its seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WorklistOrder {
    /// Oldest pending cell first.
    #[default]
    Fifo,
    /// Most recently notified cell first.
    Lifo,
    /// Pseudo-random removal driven by a ChaCha8 stream.
    Shuffled {
        /// RNG seed. The same seed over the same network replays the
        /// same removal sequence.
        seed: u64,
    },
}

// ── EqualWritePolicy ───────────────────────────────────────────────

/// What an equal write to an already-filled cell does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EqualWritePolicy {
    /// The write is a no-op and the cell is not re-notified. Unified cell
    /// pairs reach a fixpoint under this policy.
    #[default]
    Quiescent,
    /// Every equal write re-notifies the cell, re-running its attached
    /// propagators. A unified pair never settles under this policy.
    Renotify,
}

// ── EvaluatorConfig ────────────────────────────────────────────────

/// Configuration for an [`Evaluator`](crate::Evaluator).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Worklist removal order. Default: [`WorklistOrder::Fifo`].
    pub order: WorklistOrder,
    /// Equal-write behaviour. Default: [`EqualWritePolicy::Quiescent`].
    pub equal_writes: EqualWritePolicy,
}

impl EvaluatorConfig {
    /// Replace the worklist order.
    pub fn with_order(mut self, order: WorklistOrder) -> Self {
        self.order = order;
        self
    }

    /// Replace the equal-write policy.
    pub fn with_equal_writes(mut self, policy: EqualWritePolicy) -> Self {
        self.equal_writes = policy;
        self
    }
}
