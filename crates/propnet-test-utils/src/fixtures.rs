//! Reusable propagator test fixtures.
//!
//! - [`ConstPropagator`] writes a constant to its output whenever fired.
//! - [`CountingPropagator`] counts its firings and otherwise does nothing.
//! - [`FailingPropagator`] fails deterministically after N calls.

use std::cell::Cell;
use std::rc::Rc;

use propnet_core::{PropagatorError, Value};
use propnet_propagator::{FireContext, Propagator};

/// Writes a constant value to the output cell.
pub struct ConstPropagator {
    pub name: String,
    pub value: Value,
}

impl ConstPropagator {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Propagator for ConstPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        ctx.set_output(self.value.clone())
    }
}

/// Counts how many times it fires. The counter is shared, so clones of a
/// node produced by group duplication count into the same handle.
pub struct CountingPropagator {
    pub name: String,
    count: Rc<Cell<usize>>,
}

impl CountingPropagator {
    /// Returns the propagator and a handle to read its counter.
    pub fn new(name: impl Into<String>) -> (Self, Rc<Cell<usize>>) {
        let count = Rc::new(Cell::new(0));
        (
            Self {
                name: name.into(),
                count: Rc::clone(&count),
            },
            count,
        )
    }
}

impl Propagator for CountingPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(&self, _ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        self.count.set(self.count.get() + 1);
        Ok(())
    }
}

/// Succeeds `succeed_count` times, then fails every call after.
pub struct FailingPropagator {
    pub name: String,
    succeed_count: usize,
    calls: Cell<usize>,
}

impl FailingPropagator {
    pub fn new(name: impl Into<String>, succeed_count: usize) -> Self {
        Self {
            name: name.into(),
            succeed_count,
            calls: Cell::new(0),
        }
    }
}

impl Propagator for FailingPropagator {
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(&self, _ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        let n = self.calls.get();
        self.calls.set(n + 1);
        if n >= self.succeed_count {
            Err(PropagatorError::ExecutionFailed {
                reason: format!("{} failed on call {n}", self.name),
            })
        } else {
            Ok(())
        }
    }
}
