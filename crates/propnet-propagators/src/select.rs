//! Minimum selection, the usual conflict-resolution strategy.
//!
//! Bound as the first propagator of a handler group, [`Min`] receives the
//! two disagreeing values as its trailing inputs and writes the smaller one
//! back to the conflicted cell.

use std::cmp::Ordering;

use propnet_core::{PropagatorError, Value};
use propnet_propagator::Expression;

/// Picks the smallest input. Ints and floats compare numerically; text
/// compares lexicographically.
///
/// An `Int` and a `Float` that compare equal are still different values,
/// so the tie goes to the `Int` whatever the input order. Otherwise the
/// earliest of equal inputs wins.
#[derive(Clone, Copy, Debug, Default)]
pub struct Min;

impl Expression for Min {
    fn name(&self) -> &str {
        "min"
    }

    fn apply(&self, inputs: &[Value]) -> Result<Value, PropagatorError> {
        let (first, rest) = inputs.split_first().ok_or(PropagatorError::EmptyInputs)?;
        let mut best = first;
        for value in rest {
            match value.compare(best) {
                Some(Ordering::Less) => best = value,
                Some(Ordering::Equal) if value.as_int().is_some() && best.as_int().is_none() => {
                    best = value
                }
                Some(_) => {}
                None => {
                    return Err(PropagatorError::TypeMismatch {
                        expected: best.kind(),
                        found: value.kind(),
                    })
                }
            }
        }
        Ok(best.clone())
    }
}
