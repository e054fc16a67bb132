//! Propagator traits and fire context for propnet networks.
//!
//! The [`Propagator`] trait defines the `&self` fire function handed a
//! [`FireContext`] over the node's inputs and output. [`Expression`] is the
//! value-in, value-out specialization, adapted by [`ExpressionNode`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod context;
pub mod propagator;

pub use context::FireContext;
pub use propagator::{
    control, expression, Expression, ExpressionNode, FnExpression, FnPropagator, Identity,
    Propagator,
};
