//! Core abstraction trait for cell access during propagator firing.

use crate::error::NetworkError;
use crate::id::{CellId, ContextId};
use crate::value::Value;

/// Read/write access to cells while a propagator fires.
///
/// Implemented by the evaluator so that propagator bodies can read their
/// inputs and write through the monotone `set` path. Implemented by
/// `MockCellStore` in `propnet-test-utils` for testing bodies in isolation.
pub trait CellStore {
    /// Current value of a cell, or `None` if it is empty (or unknown).
    fn value(&self, cell: CellId) -> Option<&Value>;

    /// Write a value with monotone-fill semantics.
    ///
    /// Writing to an empty cell fills it; an equal write is a no-op for the
    /// stored value; a differing write raises a conflict routed through the
    /// cell's context. None of these outcomes is an error.
    fn set(
        &mut self,
        cell: CellId,
        value: Value,
        context: Option<ContextId>,
    ) -> Result<(), NetworkError>;
}
