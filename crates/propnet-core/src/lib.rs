//! Core types and traits for propnet propagator networks.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the handles into a network's arenas, the tagged [`Value`] stored in
//! cells, the error enums, and the [`CellStore`] trait through which
//! propagator bodies touch cells.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod traits;
pub mod value;

pub use error::{EvalError, NetworkError, PropagatorError};
pub use id::{CellId, ContextId, GroupId, Inputs, PortKey, PropagatorId};
pub use traits::CellStore;
pub use value::{Scalar, Value};
