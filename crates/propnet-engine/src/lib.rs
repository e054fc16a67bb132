//! Network session and worklist evaluator for propnet.
//!
//! [`Network`] owns every cell, propagator, group, and context of one
//! propagator network. [`Evaluator`] borrows a network and drives it to a
//! fixpoint, routing value conflicts through each cell's context.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod evaluator;
pub mod group;
pub mod metrics;
pub mod network;
pub mod worklist;

pub use config::{EqualWritePolicy, EvaluatorConfig, WorklistOrder};
pub use context::ContextCells;
pub use evaluator::Evaluator;
pub use group::{DupMemo, DupTarget, Group};
pub use metrics::RunMetrics;
pub use network::{Network, Unification};
pub use worklist::Worklist;
