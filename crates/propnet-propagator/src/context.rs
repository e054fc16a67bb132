//! Execution context passed to propagators when they fire.
//!
//! [`FireContext`] gives a propagator body its input and output wiring,
//! the context its firing happens under, and monotone write access to
//! cells through the [`CellStore`] trait.

use propnet_core::{CellId, CellStore, ContextId, PropagatorError, Value};

/// Execution context passed to each propagator's `fire()` method.
///
/// Uses dynamic dispatch (`&mut dyn CellStore`) to keep the
/// [`Propagator`](crate::Propagator) trait object-safe while supporting
/// mock-based testing.
pub struct FireContext<'a> {
    cells: &'a mut dyn CellStore,
    context: Option<ContextId>,
    inputs: &'a [CellId],
    output: CellId,
}

impl<'a> FireContext<'a> {
    /// Construct a new fire context.
    ///
    /// Typically called by the evaluator, not by propagators directly.
    /// For testing, construct with a `MockCellStore` from `propnet-test-utils`.
    pub fn new(
        cells: &'a mut dyn CellStore,
        context: Option<ContextId>,
        inputs: &'a [CellId],
        output: CellId,
    ) -> Self {
        Self {
            cells,
            context,
            inputs,
            output,
        }
    }

    /// Input cells, in declaration order.
    pub fn inputs(&self) -> &[CellId] {
        self.inputs
    }

    /// The output cell.
    pub fn output(&self) -> CellId {
        self.output
    }

    /// Context this firing runs under. Writes made through
    /// [`set`](Self::set) carry it.
    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    /// Current value of any cell.
    pub fn value(&self, cell: CellId) -> Option<&Value> {
        self.cells.value(cell)
    }

    /// Snapshot of every input value, in input order.
    ///
    /// The evaluator only fires a propagator once all inputs are filled,
    /// so an empty input here means the body was invoked out of band.
    pub fn input_values(&self) -> Result<Vec<Value>, PropagatorError> {
        self.inputs
            .iter()
            .map(|&cell| {
                self.cells
                    .value(cell)
                    .cloned()
                    .ok_or_else(|| PropagatorError::ExecutionFailed {
                        reason: format!("input {cell} is empty"),
                    })
            })
            .collect()
    }

    /// Write a value to any cell under this firing's context.
    pub fn set(&mut self, cell: CellId, value: Value) -> Result<(), PropagatorError> {
        self.cells.set(cell, value, self.context)?;
        Ok(())
    }

    /// Write a value to the output cell under this firing's context.
    pub fn set_output(&mut self, value: Value) -> Result<(), PropagatorError> {
        self.set(self.output, value)
    }
}
