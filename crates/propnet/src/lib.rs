//! Propnet: a propagator-network evaluation engine.
//!
//! Cells hold values that only ever fill. Propagators connect input cells
//! to an output cell and fire once every input is filled. An evaluator
//! re-fires propagators as cells change until nothing is pending. When two
//! writes disagree, the conflict is routed through the cell's context and
//! resolved by ordinary network wiring.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all propnet sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use propnet::prelude::*;
//!
//! let mut net = Network::new();
//! let x = net.cell();
//! let y = net.cell();
//! let one = net.cell_with(Value::int(1));
//! net.expression([one, y], Add, x).unwrap();
//! net.expression([one], Identity, y).unwrap();
//!
//! net.run([one]).unwrap();
//! assert_eq!(net.value(y), Some(&Value::int(1)));
//! assert_eq!(net.value(x), Some(&Value::int(2)));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `propnet-core` | Handles, `Value`, errors, the `CellStore` trait |
//! | [`propagator`] | `propnet-propagator` | `Propagator`/`Expression` traits, `FireContext` |
//! | [`engine`] | `propnet-engine` | `Network`, `Evaluator`, groups, contexts, config, metrics |
//! | [`propagators`] | `propnet-propagators` | Reference bodies: identity, add, min, display |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handles, values, errors, and core traits (`propnet-core`).
pub use propnet_core as types;

/// Propagator and expression traits (`propnet-propagator`).
///
/// [`propagator::Propagator`] is the extension point for control nodes;
/// [`propagator::Expression`] for pure functions of the inputs.
pub use propnet_propagator as propagator;

/// Network session and evaluator (`propnet-engine`).
pub use propnet_engine as engine;

/// Reference propagator bodies (`propnet-propagators`).
pub use propnet_propagators as propagators;

/// Common imports for typical propnet usage.
///
/// ```rust
/// use propnet::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use propnet_core::{
        CellId, CellStore, ContextId, GroupId, PortKey, PropagatorId, Scalar, Value,
    };

    // Errors
    pub use propnet_core::{EvalError, NetworkError, PropagatorError};

    // Propagator traits
    pub use propnet_propagator::{control, expression, Expression, FireContext, Propagator};

    // Engine
    pub use propnet_engine::{
        DupMemo, DupTarget, EqualWritePolicy, Evaluator, EvaluatorConfig, Network, RunMetrics,
        Unification, WorklistOrder,
    };

    // Reference bodies
    pub use propnet_propagators::{Add, Display, DisplaySink, Identity, Min};
}
