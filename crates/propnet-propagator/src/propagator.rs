//! The [`Propagator`] and [`Expression`] traits.
//!
//! A propagator node connects an ordered list of input cells to one output
//! cell. The evaluator only fires a node once every input holds a value;
//! what happens then depends on the body:
//!
//! - A base [`Propagator`] body receives the whole [`FireContext`] and
//!   decides for itself whether and how to write. Control nodes (conflict
//!   handling, display) are written this way.
//! - An [`Expression`] body receives the resolved input values and returns
//!   the value to write to the output. [`ExpressionNode`] adapts it to the
//!   base trait.

use std::fmt;

use propnet_core::{PropagatorError, Value};

use crate::context::FireContext;

/// A stateless node body in a propagator network.
///
/// # Contract
///
/// - `fire()` SHOULD be pure: the fixpoint is independent of worklist
///   order only if every body's effects commute. The engine does not
///   check this.
/// - `&self`: bodies are stateless and may be shared between a node and
///   its clones produced by group duplication.
///
/// # Object safety
///
/// This trait is object-safe; the network stores bodies as
/// `Arc<dyn Propagator>`.
///
/// # Examples
///
/// A control body that copies its first input only when it is positive:
///
/// ```
/// use propnet_core::{PropagatorError, Value};
/// use propnet_propagator::{FireContext, Propagator};
///
/// struct PositiveGate;
///
/// impl Propagator for PositiveGate {
///     fn name(&self) -> &str { "positive_gate" }
///
///     fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
///         let value = ctx.input_values()?.remove(0);
///         if value.as_int().is_some_and(|v| v > 0) {
///             ctx.set_output(value)?;
///         }
///         Ok(())
///     }
/// }
///
/// assert_eq!(PositiveGate.name(), "positive_gate");
/// ```
pub trait Propagator: 'static {
    /// Human-readable name for error reporting and metrics.
    fn name(&self) -> &str;

    /// Fire the node. Called only when every input cell is filled.
    fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError>;
}

/// A pure function from input values to an output value.
///
/// # Examples
///
/// ```
/// use propnet_core::{PropagatorError, Value};
/// use propnet_propagator::Expression;
///
/// struct Double;
///
/// impl Expression for Double {
///     fn name(&self) -> &str { "double" }
///
///     fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError> {
///         let v = inputs[0].as_int().ok_or(PropagatorError::TypeMismatch {
///             expected: "int",
///             found: inputs[0].kind(),
///         })?;
///         Ok(Value::int(v * 2))
///     }
/// }
///
/// assert_eq!(Double.apply(&[Value::int(4)]), Ok(Value::int(8)));
/// ```
pub trait Expression: 'static {
    /// Human-readable name for error reporting and metrics.
    fn name(&self) -> &str;

    /// Compute the output from the input values, given in input order.
    fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError>;
}

/// Adapts an [`Expression`] into a [`Propagator`]: reads every input,
/// applies the expression, and writes the result to the output cell under
/// the firing context.
pub struct ExpressionNode<E> {
    expression: E,
}

impl<E: Expression> ExpressionNode<E> {
    /// Wrap an expression.
    pub fn new(expression: E) -> Self {
        Self { expression }
    }

    /// The wrapped expression.
    pub fn expression(&self) -> &E {
        &self.expression
    }
}

impl<E: Expression> Propagator for ExpressionNode<E> {
    fn name(&self) -> &str {
        self.expression.name()
    }

    fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        let values = ctx.input_values()?;
        let result = self.expression.apply(&values)?;
        ctx.set_output(result)
    }
}

impl<E: Expression> fmt::Debug for ExpressionNode<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionNode")
            .field("name", &self.expression.name())
            .finish()
    }
}

/// Copies its first input to the output.
///
/// The network wires a pair of these for every `unify`, one per direction.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl Expression for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError> {
        inputs.first().cloned().ok_or(PropagatorError::EmptyInputs)
    }
}

/// An [`Expression`] backed by a closure. Build with [`expression`].
pub struct FnExpression<F> {
    name: String,
    f: F,
}

impl<F> Expression for FnExpression<F>
where
    F: Fn(&[Value]) -> Result<Value, PropagatorError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError> {
        (self.f)(inputs)
    }
}

/// A base [`Propagator`] backed by a closure. Build with [`control`].
pub struct FnPropagator<F> {
    name: String,
    f: F,
}

impl<F> Propagator for FnPropagator<F>
where
    F: Fn(&mut FireContext<'_>) -> Result<(), PropagatorError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fire(&self, ctx: &mut FireContext<'_>) -> Result<(), PropagatorError> {
        (self.f)(ctx)
    }
}

/// Build an [`Expression`] from a closure over input values.
///
/// ```
/// use propnet_core::Value;
/// use propnet_propagator::{expression, Expression};
///
/// let negate = expression("negate", |v: &[Value]| Ok(Value::int(-v[0].as_int().unwrap_or(0))));
/// assert_eq!(negate.apply(&[Value::int(3)]), Ok(Value::int(-3)));
/// ```
pub fn expression<F>(name: impl Into<String>, f: F) -> FnExpression<F>
where
    F: Fn(&[Value]) -> Result<Value, PropagatorError> + 'static,
{
    FnExpression {
        name: name.into(),
        f,
    }
}

/// Build a base [`Propagator`] from a closure over the fire context.
pub fn control<F>(name: impl Into<String>, f: F) -> FnPropagator<F>
where
    F: Fn(&mut FireContext<'_>) -> Result<(), PropagatorError> + 'static,
{
    FnPropagator {
        name: name.into(),
        f,
    }
}
