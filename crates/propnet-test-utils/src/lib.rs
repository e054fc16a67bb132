//! Test utilities and mock types for propnet development.
//!
//! Provides a mock implementation of [`CellStore`] for exercising
//! propagator bodies without a network, plus reusable fixture propagators
//! in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{ConstPropagator, CountingPropagator, FailingPropagator};

use std::collections::HashMap;

use propnet_core::{CellId, CellStore, ContextId, NetworkError, Value};

/// Mock implementation of [`CellStore`].
///
/// Backed by a `HashMap<CellId, Value>` with the same monotone-fill rules
/// as the evaluator: empty cells fill, equal writes are no-ops, differing
/// writes clear the cell and are recorded in [`conflicts`](Self::conflicts).
/// Every write, accepted or not, is logged in [`writes`](Self::writes).
pub struct MockCellStore {
    cells: HashMap<CellId, Value>,
    writes: Vec<(CellId, Value, Option<ContextId>)>,
    conflicts: Vec<(CellId, Value, Value)>,
}

impl MockCellStore {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            writes: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Pre-populate a cell without logging a write.
    pub fn fill(&mut self, cell: CellId, value: Value) {
        self.cells.insert(cell, value);
    }

    /// Read back the current value for test assertions.
    pub fn get(&self, cell: CellId) -> Option<&Value> {
        self.cells.get(&cell)
    }

    /// Every `set` call in order: `(cell, value, context)`.
    pub fn writes(&self) -> &[(CellId, Value, Option<ContextId>)] {
        &self.writes
    }

    /// Every conflicting write in order: `(cell, old, new)`.
    pub fn conflicts(&self) -> &[(CellId, Value, Value)] {
        &self.conflicts
    }
}

impl Default for MockCellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CellStore for MockCellStore {
    fn value(&self, cell: CellId) -> Option<&Value> {
        self.cells.get(&cell)
    }

    fn set(
        &mut self,
        cell: CellId,
        value: Value,
        context: Option<ContextId>,
    ) -> Result<(), NetworkError> {
        self.writes.push((cell, value.clone(), context));
        match self.cells.get(&cell) {
            Some(old) if *old != value => {
                let old = old.clone();
                self.cells.remove(&cell);
                self.conflicts.push((cell, old, value));
            }
            _ => {
                self.cells.insert(cell, value);
            }
        }
        Ok(())
    }
}
