//! Worklist evaluator: drives a network to its fixpoint.
//!
//! [`Evaluator`] borrows a [`Network`] mutably for the duration of a run.
//! Each iteration removes one pending cell and re-runs every propagator
//! attached to it. A propagator whose inputs are not all filled is skipped
//! silently; that guard is what makes repeated firing safe.
//!
//! # Conflicts
//!
//! A write that disagrees with a filled cell empties the cell and adds a
//! conflict node whose inputs are the context's conflict-handler cell and
//! two fresh cells holding the old and new values. Once the handler cell
//! holds a group, the conflict node builds a resolver from that group's
//! first propagator (its inputs plus the two value cells, output pointed at
//! the conflicted cell) and runs it. If no handler is ever bound the cell
//! stays empty.
//!
//! The resolver fires under the conflicted cell's merged context, not the
//! context the handler value was written with. Its write therefore lands
//! without merging the handler's own context into the cell, and the
//! handler's capability cells gain no identity nodes.

use std::time::Instant;

use propnet_core::{CellId, CellStore, ContextId, EvalError, NetworkError, PropagatorId, Value};
use propnet_propagator::FireContext;

use crate::config::{EqualWritePolicy, EvaluatorConfig};
use crate::metrics::RunMetrics;
use crate::network::{Network, NodeBody, PropagatorNode};
use crate::worklist::Worklist;

/// Worklist scheduler over a borrowed [`Network`].
///
/// ```
/// use propnet_core::Value;
/// use propnet_engine::{Evaluator, EvaluatorConfig, Network};
/// use propnet_propagator::Identity;
///
/// let mut net = Network::new();
/// let a = net.cell();
/// let b = net.cell();
/// net.expression([a], Identity, b).unwrap();
///
/// let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
/// ev.set(a, Value::int(5), None).unwrap();
/// let metrics = ev.run().unwrap();
/// assert_eq!(metrics.firings, 1);
/// assert_eq!(net.value(b), Some(&Value::int(5)));
/// ```
pub struct Evaluator<'n> {
    network: &'n mut Network,
    worklist: Worklist,
    config: EvaluatorConfig,
    metrics: RunMetrics,
}

impl<'n> Evaluator<'n> {
    /// Create an evaluator with `seeds` pending. Cells scheduled by earlier
    /// `unify` calls are added as well.
    pub fn new(
        network: &'n mut Network,
        seeds: impl IntoIterator<Item = CellId>,
        config: EvaluatorConfig,
    ) -> Self {
        let mut worklist = Worklist::new(config.order);
        for cell in seeds {
            worklist.insert(cell);
        }
        let mut ev = Self {
            network,
            worklist,
            config,
            metrics: RunMetrics::default(),
        };
        ev.drain_wakeups();
        ev
    }

    /// The network being evaluated.
    pub fn network(&self) -> &Network {
        self.network
    }

    /// Active configuration.
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Counters accumulated so far.
    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Number of pending cells.
    pub fn pending(&self) -> usize {
        self.worklist.len()
    }

    /// Whether `cell` is pending.
    pub fn is_pending(&self, cell: CellId) -> bool {
        self.worklist.contains(cell)
    }

    /// Mark a cell pending. Notifying an already-pending cell is a no-op.
    pub fn notify(&mut self, cell: CellId) {
        self.metrics.notifications += 1;
        self.worklist.insert(cell);
    }

    /// Write a value to a cell.
    ///
    /// `context` is first merged with the cell's current context and the
    /// result becomes the cell's context. Then:
    ///
    /// - empty cell: the value is stored and the cell notified;
    /// - equal value: nothing changes, and the cell is notified only under
    ///   [`EqualWritePolicy::Renotify`];
    /// - different value: the cell is emptied and a conflict is raised
    ///   under the merged context.
    pub fn set(
        &mut self,
        cell: CellId,
        value: Value,
        context: Option<ContextId>,
    ) -> Result<(), NetworkError> {
        self.metrics.writes += 1;
        let current = self.network.slot(cell)?.context;
        let merged = self.network.merge_contexts(&[current, context])?;

        let slot = self.network.slot_mut(cell)?;
        slot.context = Some(merged);
        match slot.value.take() {
            None => {
                slot.value = Some(value);
                self.notify(cell);
            }
            Some(old) if old == value => {
                slot.value = Some(old);
                self.metrics.equal_writes += 1;
                if self.config.equal_writes == EqualWritePolicy::Renotify {
                    self.notify(cell);
                }
            }
            Some(old) => self.conflict(merged, cell, old, value)?,
        }
        Ok(())
    }

    /// Run one propagator under `context`.
    ///
    /// Returns `false` without effect if any input is empty.
    pub fn fire(
        &mut self,
        propagator: PropagatorId,
        context: Option<ContextId>,
    ) -> Result<bool, EvalError> {
        self.metrics.propagator_runs += 1;
        let node = self.network.node(propagator)?.clone();
        if node.inputs.iter().any(|&cell| !self.network.is_filled(cell)) {
            self.metrics.guard_skips += 1;
            tracing::trace!(%propagator, name = node.body.name(), "inputs incomplete, skipped");
            return Ok(false);
        }

        self.metrics.record_firing(node.body.name());
        tracing::trace!(%propagator, name = node.body.name(), "firing");
        match &node.body {
            NodeBody::User(body) => {
                let mut ctx = FireContext::new(self, context, &node.inputs, node.output);
                body.fire(&mut ctx)
                    .map_err(|reason| EvalError::PropagatorFailed {
                        name: body.name().to_string(),
                        reason,
                    })?;
            }
            NodeBody::Conflict { context } => self.resolve(propagator, &node, *context)?,
        }
        Ok(true)
    }

    /// Drive the network to its fixpoint.
    ///
    /// Terminates when no cell is pending. Nothing bounds the number of
    /// iterations: propagators that keep re-notifying each other run
    /// forever.
    pub fn run(&mut self) -> Result<RunMetrics, EvalError> {
        let start = Instant::now();
        tracing::debug!(pending = self.worklist.len(), order = ?self.config.order, "evaluator run started");

        let result = self.run_loop();
        self.metrics.total_us += start.elapsed().as_micros() as u64;
        result?;

        tracing::debug!(
            cells = self.metrics.cells_processed,
            firings = self.metrics.firings,
            conflicts = self.metrics.conflicts,
            total_us = self.metrics.total_us,
            "fixpoint reached"
        );
        Ok(self.metrics.clone())
    }

    fn run_loop(&mut self) -> Result<(), EvalError> {
        loop {
            self.drain_wakeups();
            let Some(cell) = self.worklist.pop() else {
                return Ok(());
            };
            self.metrics.cells_processed += 1;
            let slot = self.network.slot(cell)?;
            let context = slot.context;
            let readers = slot.propagators.clone();
            for propagator in readers {
                self.fire(propagator, context)?;
            }
        }
    }

    fn drain_wakeups(&mut self) {
        for cell in self.network.take_wakeups() {
            self.worklist.insert(cell);
        }
    }

    fn conflict(
        &mut self,
        context: ContextId,
        cell: CellId,
        old: Value,
        new: Value,
    ) -> Result<(), NetworkError> {
        self.metrics.conflicts += 1;
        tracing::debug!(%cell, %context, %old, %new, "conflict raised");

        let handler = self.network.context_cells(context)?.conflict;
        let old_cell = self.network.cell_with(old);
        let new_cell = self.network.cell_with(new);
        self.network.attach(
            [handler, old_cell, new_cell].into_iter().collect(),
            NodeBody::Conflict { context },
            cell,
        );
        self.notify(old_cell);
        self.notify(new_cell);
        Ok(())
    }

    /// Fire the resolver for conflict node `conflict`, building it from the
    /// handler group on first use.
    fn resolve(
        &mut self,
        conflict: PropagatorId,
        node: &PropagatorNode,
        context: ContextId,
    ) -> Result<(), EvalError> {
        let resolver = match self.network.resolvers.get(&conflict) {
            Some(&resolver) => resolver,
            None => {
                let resolver = self.build_resolver(node, context)?;
                self.network.resolvers.insert(conflict, resolver);
                resolver
            }
        };
        tracing::debug!(%conflict, %resolver, output = %node.output, "resolving conflict");
        self.fire(resolver, Some(context))?;
        Ok(())
    }

    fn build_resolver(
        &mut self,
        node: &PropagatorNode,
        context: ContextId,
    ) -> Result<PropagatorId, EvalError> {
        let (handler, old_cell, new_cell) = match node.inputs.as_slice() {
            &[handler, old_cell, new_cell] => (handler, old_cell, new_cell),
            other => {
                return Err(EvalError::InvalidHandler {
                    context,
                    found: format!("conflict node with {} inputs", other.len()),
                })
            }
        };
        let group = match self.network.value(handler) {
            Some(Value::Group(group)) => *group,
            Some(other) => {
                return Err(EvalError::InvalidHandler {
                    context,
                    found: other.kind().to_string(),
                })
            }
            None => {
                return Err(EvalError::InvalidHandler {
                    context,
                    found: "empty".to_string(),
                })
            }
        };
        let template = match self.network.group_entry(group)?.propagators.first() {
            Some(&template) => template,
            None => {
                return Err(EvalError::InvalidHandler {
                    context,
                    found: format!("group {group} without a resolver propagator"),
                })
            }
        };

        let template = self.network.node(template)?.clone();
        let mut inputs = template.inputs;
        inputs.push(old_cell);
        inputs.push(new_cell);
        Ok(self.network.attach(inputs, template.body, node.output))
    }
}

impl CellStore for Evaluator<'_> {
    fn value(&self, cell: CellId) -> Option<&Value> {
        self.network.value(cell)
    }

    fn set(
        &mut self,
        cell: CellId,
        value: Value,
        context: Option<ContextId>,
    ) -> Result<(), NetworkError> {
        Evaluator::set(self, cell, value, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorklistOrder;
    use propnet_core::PropagatorError;
    use propnet_propagator::{control, expression, Identity};
    use propnet_test_utils::{ConstPropagator, FailingPropagator};

    fn add_one() -> impl propnet_propagator::Expression {
        expression("add_one", |v: &[Value]| {
            v[0].as_int()
                .map(|n| Value::int(n + 1))
                .ok_or(PropagatorError::TypeMismatch {
                    expected: "int",
                    found: v[0].kind(),
                })
        })
    }

    fn smallest() -> impl propnet_propagator::Expression {
        expression("smallest", |v: &[Value]| {
            v.iter()
                .filter_map(Value::as_int)
                .min()
                .map(Value::int)
                .ok_or(PropagatorError::EmptyInputs)
        })
    }

    #[test]
    fn set_on_empty_cell_fills_and_notifies() {
        let mut net = Network::new();
        let a = net.cell();
        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(a, Value::int(5), None).unwrap();
        assert!(ev.is_pending(a));
        assert_eq!(ev.metrics().notifications, 1);
        assert_eq!(ev.value(a), Some(&Value::int(5)));
        // A write with no context on either side allocates one.
        assert!(ev.network().cell_context(a).unwrap().is_some());
    }

    #[test]
    fn set_then_set_equal_is_quiet_by_default() {
        let mut net = Network::new();
        let a = net.cell();
        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(a, Value::int(5), None).unwrap();
        ev.run().unwrap();
        ev.set(a, Value::int(5), None).unwrap();
        assert_eq!(ev.pending(), 0);
        assert_eq!(ev.metrics().equal_writes, 1);
        assert_eq!(ev.metrics().conflicts, 0);
        assert_eq!(ev.value(a), Some(&Value::int(5)));
    }

    #[test]
    fn renotify_policy_requeues_equal_writes() {
        let mut net = Network::new();
        let a = net.cell();
        let config = EvaluatorConfig::default().with_equal_writes(EqualWritePolicy::Renotify);
        let mut ev = Evaluator::new(&mut net, [], config);
        ev.set(a, Value::int(5), None).unwrap();
        ev.run().unwrap();
        ev.set(a, Value::int(5), None).unwrap();
        assert!(ev.is_pending(a));
        assert_eq!(ev.metrics().conflicts, 0);
        assert_eq!(ev.value(a), Some(&Value::int(5)));
    }

    #[test]
    fn guard_skips_until_all_inputs_filled() {
        let mut net = Network::new();
        let a = net.cell();
        let b = net.cell();
        let out = net.cell();
        let p = net.expression([a, b], smallest(), out).unwrap();

        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(a, Value::int(3), None).unwrap();
        assert_eq!(ev.fire(p, None), Ok(false));
        ev.set(b, Value::int(1), None).unwrap();
        assert_eq!(ev.fire(p, None), Ok(true));
        assert_eq!(ev.value(out), Some(&Value::int(1)));
        assert_eq!(ev.metrics().guard_skips, 1);
    }

    #[test]
    fn refiring_with_unchanged_inputs_adds_no_notifications() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(1));
        let out = net.cell();
        let p = net.expression([a], add_one(), out).unwrap();

        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.fire(p, None).unwrap();
        let after_first = ev.metrics().notifications;
        ev.fire(p, None).unwrap();
        ev.fire(p, None).unwrap();
        assert_eq!(after_first, 1);
        assert_eq!(ev.metrics().notifications, after_first);
        assert_eq!(ev.metrics().firings_of("add_one"), 3);
    }

    #[test]
    fn chain_reaches_fixpoint() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(0));
        let b = net.cell();
        let c = net.cell();
        net.expression([a], add_one(), b).unwrap();
        net.expression([b], add_one(), c).unwrap();

        let metrics = net.run([a]).unwrap();
        assert_eq!(net.value(c), Some(&Value::int(2)));
        assert_eq!(metrics.firings, 2);
        assert_eq!(metrics.cells_processed, 3);
    }

    #[test]
    fn unified_cells_settle() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(7));
        let b = net.cell();
        net.unify_cells(a, b).unwrap();
        net.run([]).unwrap();
        assert_eq!(net.value(b), Some(&Value::int(7)));
    }

    #[test]
    fn conflict_without_handler_leaves_cell_empty() {
        let mut net = Network::new();
        let a = net.cell();
        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(a, Value::int(1), None).unwrap();
        ev.set(a, Value::int(2), None).unwrap();
        let metrics = ev.run().unwrap();
        assert_eq!(metrics.conflicts, 1);
        assert_eq!(metrics.firings_of("conflict"), 0);
        assert!(!net.is_filled(a));
    }

    #[test]
    fn conflict_resolved_by_bound_handler() {
        let mut net = Network::new();
        let ctx = net.context();
        let handler_cell = net.context_cells(ctx).unwrap().conflict;
        let scratch = net.cell();
        let min = net.expression([], smallest(), scratch).unwrap();
        let strategy = net.group([scratch], [min], []).unwrap();

        let a = net.cell_in(None, Some(ctx));
        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(handler_cell, Value::Group(strategy), None).unwrap();
        ev.set(a, Value::int(3), None).unwrap();
        ev.set(a, Value::int(2), None).unwrap();
        let metrics = ev.run().unwrap();

        assert_eq!(net.value(a), Some(&Value::int(2)));
        assert_eq!(metrics.conflicts, 1);
        assert!(metrics.firings_of("conflict") >= 1);
        assert!(metrics.firings_of("smallest") >= 1);
        // The shared template itself never fires.
        assert!(!net.is_filled(scratch));
    }

    #[test]
    fn non_group_handler_is_rejected() {
        let mut net = Network::new();
        let ctx = net.context();
        let handler_cell = net.context_cells(ctx).unwrap().conflict;
        let a = net.cell_in(None, Some(ctx));
        let mut ev = Evaluator::new(&mut net, [], EvaluatorConfig::default());
        ev.set(handler_cell, Value::int(0), None).unwrap();
        ev.set(a, Value::int(1), None).unwrap();
        ev.set(a, Value::int(2), None).unwrap();
        assert_eq!(
            ev.run(),
            Err(EvalError::InvalidHandler {
                context: ctx,
                found: "int".into()
            })
        );
    }

    #[test]
    fn body_error_names_the_propagator() {
        let mut net = Network::new();
        let a = net.cell_with(Value::from(true));
        let out = net.cell();
        net.expression([a], add_one(), out).unwrap();
        let err = net.run([a]).unwrap_err();
        assert_eq!(
            err,
            EvalError::PropagatorFailed {
                name: "add_one".into(),
                reason: PropagatorError::TypeMismatch {
                    expected: "int",
                    found: "bool"
                }
            }
        );
    }

    #[test]
    fn base_body_writes_once_inputs_are_filled() {
        let mut net = Network::new();
        let a = net.cell();
        let out = net.cell();
        net.propagator([a], ConstPropagator::new("seven", Value::int(7)), out)
            .unwrap();

        let mut ev = Evaluator::new(&mut net, [out], EvaluatorConfig::default());
        ev.run().unwrap();
        assert!(!ev.network().is_filled(out));

        ev.set(a, Value::from(false), None).unwrap();
        let metrics = ev.run().unwrap();
        assert_eq!(metrics.firings_of("seven"), 1);
        assert_eq!(net.value(out), Some(&Value::int(7)));
    }

    #[test]
    fn failing_body_aborts_and_leaves_cells_alone() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(1));
        let out = net.cell();
        let b = net.cell();
        net.propagator([a], FailingPropagator::new("f", 0), out)
            .unwrap();
        net.expression([a], Identity, b).unwrap();

        let err = net.run([a]).unwrap_err();
        assert_eq!(
            err,
            EvalError::PropagatorFailed {
                name: "f".into(),
                reason: PropagatorError::ExecutionFailed {
                    reason: "f failed on call 0".into()
                }
            }
        );
        assert_eq!(net.value(a), Some(&Value::int(1)));
        assert!(!net.is_filled(out));
        // The identity node is attached after `f` and never ran.
        assert!(!net.is_filled(b));
    }

    #[test]
    fn failing_body_succeeds_until_its_budget_runs_out() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(1));
        let out = net.cell();
        net.propagator([a], FailingPropagator::new("flaky", 1), out)
            .unwrap();

        assert_eq!(net.run([a]).unwrap().firings_of("flaky"), 1);
        assert!(matches!(
            net.run([a]),
            Err(EvalError::PropagatorFailed { ref name, .. }) if name == "flaky"
        ));
    }

    #[test]
    fn control_body_decides_whether_to_write() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(-4));
        let out = net.cell();
        net.propagator(
            [a],
            control("positive_only", |ctx: &mut FireContext<'_>| {
                let v = ctx.input_values()?.remove(0);
                if v.as_int().is_some_and(|n| n > 0) {
                    ctx.set_output(v)?;
                }
                Ok(())
            }),
            out,
        )
        .unwrap();
        let metrics = net.run([a]).unwrap();
        assert_eq!(metrics.firings, 1);
        assert!(!net.is_filled(out));
    }

    #[test]
    fn firing_context_is_the_popped_cells_context() {
        let mut net = Network::new();
        let ctx = net.context();
        let a = net.cell_in(Some(Value::int(1)), Some(ctx));
        let b = net.cell();
        net.expression([a], Identity, b).unwrap();
        net.run([a]).unwrap();
        assert_eq!(net.cell_context(b), Ok(Some(ctx)));
    }

    #[test]
    fn lifo_and_shuffled_reach_same_fixpoint() {
        let build = || {
            let mut net = Network::new();
            let a = net.cell_with(Value::int(1));
            let b = net.cell_with(Value::int(10));
            let sum = net.cell();
            let c = net.cell();
            net.expression(
                [a, b],
                expression("sum", |v: &[Value]| {
                    Ok(Value::int(v[0].as_int().unwrap_or(0) + v[1].as_int().unwrap_or(0)))
                }),
                sum,
            )
            .unwrap();
            net.expression([sum], add_one(), c).unwrap();
            (net, c)
        };
        for order in [
            WorklistOrder::Fifo,
            WorklistOrder::Lifo,
            WorklistOrder::Shuffled { seed: 3 },
        ] {
            let (mut net, c) = build();
            let seeds: Vec<_> = net.filled_cells().collect();
            Evaluator::new(&mut net, seeds, EvaluatorConfig::default().with_order(order))
                .run()
                .unwrap();
            assert_eq!(net.value(c), Some(&Value::int(12)), "{order:?}");
        }
    }
}
