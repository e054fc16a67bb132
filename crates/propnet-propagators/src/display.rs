//! A side-effecting display node.
//!
//! [`Display`] formats its input values, emits them as an `info` event
//! under the `propnet::display` target, and appends the line to a shared
//! [`DisplaySink`]. It never writes its output cell, so nothing downstream
//! of it ever fires.

use std::sync::{Arc, Mutex};

use propnet_core::PropagatorError;
use propnet_propagator::{FireContext, Propagator};

/// Shared record of every line printed by [`Display`] nodes.
///
/// Cloning the sink shares the underlying buffer.
#[derive(Clone, Debug, Default)]
pub struct DisplaySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl DisplaySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines recorded so far.
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn push(&self, line: String) -> Result<(), PropagatorError> {
        self.lines
            .lock()
            .map_err(|_| PropagatorError::ExecutionFailed {
                reason: "display sink poisoned".to_string(),
            })?
            .push(line);
        Ok(())
    }
}

/// Prints its inputs, space separated.
#[derive(Clone, Debug)]
pub struct Display {
    sink: DisplaySink,
}

impl Display {
    /// A display node recording into `sink`.
    pub fn new(sink: DisplaySink) -> Self {
        Self { sink }
    }
}

impl Propagator for Display {
    fn name(&self) -> &str {
        "display"
    }

    fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        let line = ctx
            .input_values()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(target: "propnet::display", output = %ctx.output(), "{line}");
        self.sink.push(line)
    }
}
