//! Addition over cell values.
//!
//! # Semantics
//!
//! - All `Int`: checked integer sum. Overflow fails the firing.
//! - Any `Float` among numbers: floating-point sum.
//! - All `Text`: concatenation in input order.
//! - Anything else (bools, groups, numbers mixed with text) is a type
//!   mismatch.
//!
//! ```
//! use propnet_core::Value;
//! use propnet_propagator::Expression;
//! use propnet_propagators::Add;
//!
//! assert_eq!(Add.apply(&[Value::int(1), Value::int(1)]), Ok(Value::int(2)));
//! ```

use propnet_core::{PropagatorError, Scalar, Value};
use propnet_propagator::Expression;

/// Sums its inputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Add;

impl Expression for Add {
    fn name(&self) -> &str {
        "add"
    }

    fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError> {
        let first = inputs.first().ok_or(PropagatorError::EmptyInputs)?;
        match first.as_scalar() {
            Some(Scalar::Text(_)) => concat(inputs),
            _ => sum(inputs),
        }
    }
}

fn sum(inputs: &[Value]) -> Result<Value, PropagatorError> {
    let mut all_int = true;
    for value in inputs {
        match value.as_scalar() {
            Some(Scalar::Int(_)) => {}
            Some(Scalar::Float(_)) => all_int = false,
            _ => {
                return Err(PropagatorError::TypeMismatch {
                    expected: "number",
                    found: value.kind(),
                })
            }
        }
    }

    if all_int {
        inputs
            .iter()
            .filter_map(Value::as_int)
            .try_fold(0i64, i64::checked_add)
            .map(Value::int)
            .ok_or_else(|| PropagatorError::ExecutionFailed {
                reason: "integer overflow in add".to_string(),
            })
    } else {
        let total = inputs
            .iter()
            .filter_map(|v| v.as_scalar().and_then(Scalar::as_f64))
            .sum();
        Ok(Value::float(total))
    }
}

fn concat(inputs: &[Value]) -> Result<Value, PropagatorError> {
    let mut out = String::new();
    for value in inputs {
        match value.as_scalar() {
            Some(Scalar::Text(s)) => out.push_str(s),
            _ => {
                return Err(PropagatorError::TypeMismatch {
                    expected: "text",
                    found: value.kind(),
                })
            }
        }
    }
    Ok(Value::from(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use propnet_core::{CellId, ContextId};
    use propnet_propagator::{ExpressionNode, FireContext, Propagator};
    use propnet_test_utils::MockCellStore;

    #[test]
    fn integers_stay_integers() {
        assert_eq!(
            Add.apply(&[Value::int(2), Value::int(3), Value::int(-1)]),
            Ok(Value::int(4))
        );
    }

    #[test]
    fn any_float_promotes() {
        assert_eq!(
            Add.apply(&[Value::int(1), Value::float(0.5)]),
            Ok(Value::float(1.5))
        );
    }

    #[test]
    fn text_concatenates() {
        assert_eq!(
            Add.apply(&[Value::from("ab"), Value::from("cd")]),
            Ok(Value::from("abcd"))
        );
    }

    #[test]
    fn overflow_fails() {
        assert!(matches!(
            Add.apply(&[Value::int(i64::MAX), Value::int(1)]),
            Err(PropagatorError::ExecutionFailed { .. })
        ));
    }

    #[test]
    fn mismatched_tags_rejected() {
        assert_eq!(
            Add.apply(&[Value::int(1), Value::from(true)]),
            Err(PropagatorError::TypeMismatch {
                expected: "number",
                found: "bool"
            })
        );
        assert_eq!(
            Add.apply(&[Value::from("a"), Value::int(1)]),
            Err(PropagatorError::TypeMismatch {
                expected: "text",
                found: "int"
            })
        );
        assert_eq!(Add.apply(&[]), Err(PropagatorError::EmptyInputs));
    }

    #[test]
    fn node_writes_sum_under_context() {
        let mut store = MockCellStore::new();
        store.fill(CellId(0), Value::int(1));
        store.fill(CellId(1), Value::int(1));
        let inputs = [CellId(0), CellId(1)];
        let node = ExpressionNode::new(Add);

        node.fire(&mut FireContext::new(
            &mut store,
            Some(ContextId(0)),
            &inputs,
            CellId(2),
        ))
        .unwrap();
        assert_eq!(store.get(CellId(2)), Some(&Value::int(2)));
    }
}
