//! Error types for propnet networks.
//!
//! Two families, matching the two ways a network can go wrong:
//!
//! - [`NetworkError`]: structural misuse of the construction API (unknown
//!   handles, unregistered ports, duplication targets outside the group).
//!   Never recovered internally.
//! - [`PropagatorError`] / [`EvalError`]: failures raised while the
//!   evaluator drives the network to a fixpoint.
//!
//! Value conflicts are not errors. They are routed through the cell's
//! context and become ordinary propagator work.

use std::error::Error;
use std::fmt;

use crate::id::{CellId, ContextId, GroupId, PortKey, PropagatorId};

/// Structural misuse of the network construction API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkError {
    /// A cell handle that does not belong to this network.
    UnknownCell {
        /// The offending handle.
        cell: CellId,
    },
    /// A propagator handle that does not belong to this network.
    UnknownPropagator {
        /// The offending handle.
        propagator: PropagatorId,
    },
    /// A group handle that does not belong to this network.
    UnknownGroup {
        /// The offending handle.
        group: GroupId,
    },
    /// A context handle that does not belong to this network.
    UnknownContext {
        /// The offending handle.
        context: ContextId,
    },
    /// Lookup of a port that was never registered on the group.
    PortNotFound {
        /// The group that was searched.
        group: GroupId,
        /// The missing key.
        port: PortKey,
    },
    /// Registration of a port key that is already taken.
    DuplicatePort {
        /// The group being registered on.
        group: GroupId,
        /// The key already in use.
        port: PortKey,
    },
    /// A port registration naming a cell outside the group's members.
    NotAMember {
        /// The group being registered on.
        group: GroupId,
        /// The foreign cell.
        cell: CellId,
    },
    /// A duplication target that is not a member of the group being cloned.
    DupTargetNotInGroup {
        /// The group being cloned.
        group: GroupId,
        /// Description of the target (`c3`, `p1`).
        target: String,
    },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCell { cell } => write!(f, "unknown cell {cell}"),
            Self::UnknownPropagator { propagator } => {
                write!(f, "unknown propagator {propagator}")
            }
            Self::UnknownGroup { group } => write!(f, "unknown group {group}"),
            Self::UnknownContext { context } => write!(f, "unknown context {context}"),
            Self::PortNotFound { group, port } => {
                write!(f, "port {port} not found in group {group}")
            }
            Self::DuplicatePort { group, port } => {
                write!(f, "port {port} already registered in group {group}")
            }
            Self::NotAMember { group, cell } => {
                write!(f, "cell {cell} is not a member of group {group}")
            }
            Self::DupTargetNotInGroup { group, target } => {
                write!(f, "dup target {target} not in group {group}")
            }
        }
    }
}

impl Error for NetworkError {}

/// Errors raised by a propagator body while firing.
#[derive(Clone, Debug, PartialEq)]
pub enum PropagatorError {
    /// An input value had a tag the body cannot handle.
    TypeMismatch {
        /// What the body expected (e.g. `"number"`).
        expected: &'static str,
        /// The tag actually found.
        found: &'static str,
    },
    /// The body needs at least one input and got none.
    EmptyInputs,
    /// The body failed for a body-specific reason.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The body misused the network (e.g. wrote an unknown cell).
    Network(NetworkError),
}

impl fmt::Display for PropagatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::EmptyInputs => write!(f, "propagator has no inputs"),
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Network(e) => write!(f, "network: {e}"),
        }
    }
}

impl Error for PropagatorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NetworkError> for PropagatorError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

/// Errors that abort an evaluator run.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// A propagator body returned an error.
    PropagatorFailed {
        /// Name of the failing propagator.
        name: String,
        /// The underlying propagator error.
        reason: PropagatorError,
    },
    /// A context's conflict-handler capability resolved to something that
    /// cannot resolve conflicts: a non-group value, or a group without a
    /// resolver propagator.
    InvalidHandler {
        /// The context whose handler was consulted.
        context: ContextId,
        /// What the handler cell actually held.
        found: String,
    },
    /// Structural misuse detected while running.
    Network(NetworkError),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropagatorFailed { name, reason } => {
                write!(f, "propagator '{name}' failed: {reason}")
            }
            Self::InvalidHandler { context, found } => {
                write!(f, "conflict handler of {context} is not a resolver: {found}")
            }
            Self::Network(e) => write!(f, "network: {e}"),
        }
    }
}

impl Error for EvalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PropagatorFailed { reason, .. } => Some(reason),
            Self::Network(e) => Some(e),
            Self::InvalidHandler { .. } => None,
        }
    }
}

impl From<NetworkError> for EvalError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_not_found_names_group_and_key() {
        let e = NetworkError::PortNotFound {
            group: GroupId(2),
            port: PortKey::Named("out".into()),
        };
        assert_eq!(e.to_string(), "port 'out' not found in group g2");
    }

    #[test]
    fn propagator_failure_chains_source() {
        let e = EvalError::PropagatorFailed {
            name: "add".into(),
            reason: PropagatorError::TypeMismatch {
                expected: "number",
                found: "group",
            },
        };
        assert_eq!(
            e.to_string(),
            "propagator 'add' failed: type mismatch: expected number, found group"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn network_errors_convert() {
        let e: EvalError = NetworkError::UnknownCell { cell: CellId(9) }.into();
        assert_eq!(e.to_string(), "network: unknown cell c9");
    }
}
