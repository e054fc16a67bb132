//! The owned network session: arenas for cells, propagators, groups, and
//! contexts, addressed by handle.
//!
//! All structure is owned here and referenced elsewhere by index, so the
//! cell ↔ propagator ↔ group graph never forms an ownership cycle. Nothing
//! is ever freed; a network lives until the host drops it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use propnet_core::{
    CellId, ContextId, EvalError, GroupId, Inputs, NetworkError, PropagatorId, Value,
};
use propnet_propagator::{Expression, ExpressionNode, Identity, Propagator};

use crate::config::EvaluatorConfig;
use crate::context::ContextCells;
use crate::evaluator::Evaluator;
use crate::group::Group;
use crate::metrics::RunMetrics;

// ── Arena entries ──────────────────────────────────────────────────

/// A cell: optional value, optional owning context, and the propagators
/// that read it (non-owning back-references).
#[derive(Clone, Debug, Default)]
pub(crate) struct CellSlot {
    pub(crate) value: Option<Value>,
    pub(crate) context: Option<ContextId>,
    pub(crate) propagators: Vec<PropagatorId>,
}

/// What a propagator node runs when it fires.
#[derive(Clone)]
pub(crate) enum NodeBody {
    /// A host-supplied body.
    User(Arc<dyn Propagator>),
    /// Built-in conflict node. Inputs are `[handler, old, new]`; the output
    /// is the cell whose writes disagreed under `context`.
    Conflict { context: ContextId },
}

impl NodeBody {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::User(body) => body.name(),
            Self::Conflict { .. } => "conflict",
        }
    }
}

#[derive(Clone)]
pub(crate) struct PropagatorNode {
    pub(crate) inputs: Inputs,
    pub(crate) output: CellId,
    pub(crate) body: NodeBody,
}

impl fmt::Debug for PropagatorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagatorNode")
            .field("name", &self.body.name())
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .finish()
    }
}

// ── Unification outcome ────────────────────────────────────────────

/// Result of [`Network::unify_values`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unification {
    /// Both values were groups; this many port pairs were wired together.
    Wired {
        /// Named plus indexed ports unified.
        ports: usize,
    },
    /// Both values were equal scalars; nothing to wire.
    Equal,
    /// The values can never agree.
    Mismatch {
        /// Tag of the left-hand value.
        lhs: &'static str,
        /// Tag of the right-hand value.
        rhs: &'static str,
    },
}

// ── Network ────────────────────────────────────────────────────────

/// An owned propagator network.
///
/// Construction, evaluation, and inspection are explicit steps: build cells
/// and nodes here, hand the network to an [`Evaluator`] (or call
/// [`run`](Self::run)), then read values back.
///
/// ```
/// use propnet_core::Value;
/// use propnet_engine::Network;
/// use propnet_propagator::Identity;
///
/// let mut net = Network::new();
/// let a = net.cell_with(Value::int(1));
/// let b = net.cell();
/// net.expression([a], Identity, b).unwrap();
/// net.run([a]).unwrap();
/// assert_eq!(net.value(b), Some(&Value::int(1)));
/// ```
#[derive(Clone, Default)]
pub struct Network {
    pub(crate) cells: Vec<CellSlot>,
    pub(crate) propagators: Vec<PropagatorNode>,
    pub(crate) groups: Vec<Group>,
    pub(crate) contexts: Vec<ContextCells>,
    /// Unordered context pairs whose capabilities are already unified.
    pub(crate) unified_contexts: HashSet<(ContextId, ContextId)>,
    /// Filled cells that gained new readers through `unify` and must be
    /// revisited so the new identity nodes see their value.
    pub(crate) wakeups: Vec<CellId>,
    /// Conflict node → the resolver node built when it first fired.
    pub(crate) resolvers: HashMap<PropagatorId, PropagatorId>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Cells ──────────────────────────────────────────────────────

    /// Allocate an empty cell with no context.
    pub fn cell(&mut self) -> CellId {
        self.cell_in(None, None)
    }

    /// Allocate a filled cell with no context.
    pub fn cell_with(&mut self, value: impl Into<Value>) -> CellId {
        self.cell_in(Some(value.into()), None)
    }

    /// Allocate a cell with an optional initial value and context.
    pub fn cell_in(&mut self, value: Option<Value>, context: Option<ContextId>) -> CellId {
        let id = CellId(self.cells.len() as u32);
        self.cells.push(CellSlot {
            value,
            context,
            propagators: Vec::new(),
        });
        id
    }

    /// Current value of a cell. `None` for empty or unknown cells.
    pub fn value(&self, cell: CellId) -> Option<&Value> {
        self.cells.get(cell.0 as usize)?.value.as_ref()
    }

    /// Whether a cell currently holds a value.
    pub fn is_filled(&self, cell: CellId) -> bool {
        self.value(cell).is_some()
    }

    /// The context currently attached to a cell.
    pub fn cell_context(&self, cell: CellId) -> Result<Option<ContextId>, NetworkError> {
        Ok(self.slot(cell)?.context)
    }

    /// Propagators reading a cell, in attachment order.
    pub fn attached(&self, cell: CellId) -> Result<&[PropagatorId], NetworkError> {
        Ok(&self.slot(cell)?.propagators)
    }

    /// Every filled cell, in allocation order.
    pub fn filled_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(i, _)| CellId(i as u32))
    }

    /// Number of cells allocated.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub(crate) fn slot(&self, cell: CellId) -> Result<&CellSlot, NetworkError> {
        self.cells
            .get(cell.0 as usize)
            .ok_or(NetworkError::UnknownCell { cell })
    }

    pub(crate) fn slot_mut(&mut self, cell: CellId) -> Result<&mut CellSlot, NetworkError> {
        self.cells
            .get_mut(cell.0 as usize)
            .ok_or(NetworkError::UnknownCell { cell })
    }

    // ── Propagators ────────────────────────────────────────────────

    /// Register a base propagator node. Its body decides whether and how
    /// to write `output`.
    ///
    /// The node is appended to each input cell's reader list.
    pub fn propagator(
        &mut self,
        inputs: impl IntoIterator<Item = CellId>,
        body: impl Propagator,
        output: CellId,
    ) -> Result<PropagatorId, NetworkError> {
        self.propagator_shared(inputs, Arc::new(body), output)
    }

    /// Register a node around an already-shared body.
    pub fn propagator_shared(
        &mut self,
        inputs: impl IntoIterator<Item = CellId>,
        body: Arc<dyn Propagator>,
        output: CellId,
    ) -> Result<PropagatorId, NetworkError> {
        let inputs: Inputs = inputs.into_iter().collect();
        for &cell in inputs.iter().chain(std::iter::once(&output)) {
            self.slot(cell)?;
        }
        Ok(self.attach(inputs, NodeBody::User(body), output))
    }

    /// Register an Expression node: when all inputs are filled, the
    /// expression is applied to their values and the result written to
    /// `output`.
    pub fn expression(
        &mut self,
        inputs: impl IntoIterator<Item = CellId>,
        body: impl Expression,
        output: CellId,
    ) -> Result<PropagatorId, NetworkError> {
        self.propagator(inputs, ExpressionNode::new(body), output)
    }

    /// Input cells of a node.
    pub fn propagator_inputs(&self, propagator: PropagatorId) -> Result<&[CellId], NetworkError> {
        Ok(&self.node(propagator)?.inputs)
    }

    /// Output cell of a node.
    pub fn propagator_output(&self, propagator: PropagatorId) -> Result<CellId, NetworkError> {
        Ok(self.node(propagator)?.output)
    }

    /// Name of a node's body.
    pub fn propagator_name(&self, propagator: PropagatorId) -> Result<&str, NetworkError> {
        Ok(self.node(propagator)?.body.name())
    }

    /// Number of propagator nodes allocated.
    pub fn propagator_count(&self) -> usize {
        self.propagators.len()
    }

    pub(crate) fn node(&self, propagator: PropagatorId) -> Result<&PropagatorNode, NetworkError> {
        self.propagators
            .get(propagator.0 as usize)
            .ok_or(NetworkError::UnknownPropagator { propagator })
    }

    /// Allocate a node and register it on its inputs. A cell listed twice
    /// as an input still holds a single back-reference.
    pub(crate) fn attach(&mut self, inputs: Inputs, body: NodeBody, output: CellId) -> PropagatorId {
        let id = PropagatorId(self.propagators.len() as u32);
        for &cell in &inputs {
            if let Some(slot) = self.cells.get_mut(cell.0 as usize) {
                if !slot.propagators.contains(&id) {
                    slot.propagators.push(id);
                }
            }
        }
        self.propagators.push(PropagatorNode {
            inputs,
            output,
            body,
        });
        id
    }

    // ── Unification ────────────────────────────────────────────────

    /// Assert that two cells will eventually hold equal values.
    ///
    /// Wires an identity node in each direction. Nothing is copied now;
    /// whichever side is filled is scheduled for the next evaluator so the
    /// value flows across on its next run.
    pub fn unify_cells(
        &mut self,
        a: CellId,
        b: CellId,
    ) -> Result<(PropagatorId, PropagatorId), NetworkError> {
        let forward = self.expression([a], Identity, b)?;
        let backward = self.expression([b], Identity, a)?;
        for cell in [a, b] {
            if self.is_filled(cell) {
                self.wakeups.push(cell);
            }
        }
        Ok((forward, backward))
    }

    /// Unify two values by tag.
    ///
    /// Two groups are unified port by port through
    /// [`unify_groups`](Self::unify_groups). Two scalars need no wiring and
    /// either agree or mismatch. A scalar never unifies with a group.
    pub fn unify_values(&mut self, lhs: &Value, rhs: &Value) -> Result<Unification, NetworkError> {
        match (lhs, rhs) {
            (Value::Group(a), Value::Group(b)) => Ok(Unification::Wired {
                ports: self.unify_groups(*a, *b)?,
            }),
            (Value::Scalar(a), Value::Scalar(b)) if a == b => Ok(Unification::Equal),
            (Value::Scalar(_), Value::Scalar(_))
            | (Value::Scalar(_), Value::Group(_))
            | (Value::Group(_), Value::Scalar(_)) => Ok(Unification::Mismatch {
                lhs: lhs.kind(),
                rhs: rhs.kind(),
            }),
        }
    }

    pub(crate) fn take_wakeups(&mut self) -> Vec<CellId> {
        std::mem::take(&mut self.wakeups)
    }

    // ── Evaluation ─────────────────────────────────────────────────

    /// Run to a fixpoint with the default [`EvaluatorConfig`], seeding the
    /// worklist with `seeds`.
    pub fn run(&mut self, seeds: impl IntoIterator<Item = CellId>) -> Result<RunMetrics, EvalError> {
        Evaluator::new(self, seeds, EvaluatorConfig::default()).run()
    }

    /// Run to a fixpoint with the default config, seeding the worklist with
    /// every cell that currently holds a value.
    pub fn run_all(&mut self) -> Result<RunMetrics, EvalError> {
        let seeds: Vec<CellId> = self.filled_cells().collect();
        self.run(seeds)
    }

    // ── Groups (lookups shared with group.rs) ──────────────────────

    pub(crate) fn group_entry(&self, group: GroupId) -> Result<&Group, NetworkError> {
        self.groups
            .get(group.0 as usize)
            .ok_or(NetworkError::UnknownGroup { group })
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("cells", &self.cells.len())
            .field("propagators", &self.propagators.len())
            .field("groups", &self.groups.len())
            .field("contexts", &self.contexts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use propnet_core::Scalar;
    use propnet_propagator::expression;

    #[test]
    fn cells_start_empty_or_filled() {
        let mut net = Network::new();
        let a = net.cell();
        let b = net.cell_with(Value::int(3));
        assert!(!net.is_filled(a));
        assert_eq!(net.value(b), Some(&Value::int(3)));
        assert_eq!(net.filled_cells().collect::<Vec<_>>(), vec![b]);
        assert_eq!(net.cell_context(a), Ok(None));
    }

    #[test]
    fn propagator_registers_on_each_input() {
        let mut net = Network::new();
        let a = net.cell();
        let b = net.cell();
        let out = net.cell();
        let p = net
            .expression([a, b], expression("first", |v: &[Value]| Ok(v[0].clone())), out)
            .unwrap();
        assert_eq!(net.attached(a).unwrap(), &[p]);
        assert_eq!(net.attached(b).unwrap(), &[p]);
        assert!(net.attached(out).unwrap().is_empty());
        assert_eq!(net.propagator_inputs(p).unwrap(), &[a, b]);
        assert_eq!(net.propagator_output(p).unwrap(), out);
        assert_eq!(net.propagator_name(p).unwrap(), "first");
    }

    #[test]
    fn repeated_input_holds_one_back_reference() {
        let mut net = Network::new();
        let a = net.cell();
        let out = net.cell();
        let p = net.expression([a, a], Identity, out).unwrap();
        assert_eq!(net.attached(a).unwrap(), &[p]);
    }

    #[test]
    fn unknown_cell_rejected() {
        let mut net = Network::new();
        let a = net.cell();
        let err = net.expression([a], Identity, CellId(99)).unwrap_err();
        assert_eq!(err, NetworkError::UnknownCell { cell: CellId(99) });
        assert_eq!(net.propagator_count(), 0);
    }

    #[test]
    fn unify_cells_is_deferred() {
        let mut net = Network::new();
        let a = net.cell_with(Value::int(8));
        let b = net.cell();
        let (forward, backward) = net.unify_cells(a, b).unwrap();
        assert!(!net.is_filled(b));
        assert_eq!(net.propagator_inputs(forward).unwrap(), &[a]);
        assert_eq!(net.propagator_output(backward).unwrap(), a);
        assert_eq!(net.take_wakeups(), vec![a]);
    }

    #[test]
    fn unify_values_dispatches_on_tag() {
        let mut net = Network::new();
        let g = net.group([], [], []).unwrap();
        let h = net.group([], [], []).unwrap();

        assert_eq!(
            net.unify_values(&Value::int(1), &Value::int(1)),
            Ok(Unification::Equal)
        );
        assert_eq!(
            net.unify_values(&Value::int(1), &Value::Scalar(Scalar::Bool(true))),
            Ok(Unification::Mismatch {
                lhs: "int",
                rhs: "bool"
            })
        );
        assert_eq!(
            net.unify_values(&Value::Group(g), &Value::int(1)),
            Ok(Unification::Mismatch {
                lhs: "group",
                rhs: "int"
            })
        );
        assert_eq!(
            net.unify_values(&Value::Group(g), &Value::Group(h)),
            Ok(Unification::Wired { ports: 0 })
        );
    }

    #[test]
    fn network_clone_is_independent() {
        let mut net = Network::new();
        let a = net.cell();
        let copy = net.clone();
        net.cell_with(Value::int(1));
        assert_eq!(copy.cell_count(), 1);
        assert_eq!(net.cell_count(), 2);
        assert!(!copy.is_filled(a));
    }
}
