//! Strongly-typed handles and the [`Inputs`] type alias.
//!
//! Every cell, propagator, group, and context lives in an arena owned by a
//! network session. Handles are plain indices into those arenas; they carry
//! no ownership and are `Copy`.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a cell within a network.
///
/// `CellId(n)` is the n-th cell allocated by the owning network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub u32);

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for CellId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a propagator node within a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropagatorId(pub u32);

impl fmt::Display for PropagatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl From<u32> for PropagatorId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a group within a network.
///
/// Groups are also first-class values: a cell may hold
/// [`Value::Group`](crate::Value::Group) referring to one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

impl From<u32> for GroupId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a context (capability tag) within a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx{}", self.0)
    }
}

impl From<u32> for ContextId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Key of a group port: either a name or an integer index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PortKey {
    /// A port registered through `name_port`.
    Named(String),
    /// A port registered through `index_port`.
    Indexed(i64),
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "'{name}'"),
            Self::Indexed(index) => write!(f, "#{index}"),
        }
    }
}

/// Ordered input list of a propagator.
///
/// Uses `SmallVec<[CellId; 4]>` so the common one- and two-input nodes
/// never touch the heap. Conflict resolvers append two cells to a
/// template's inputs and may spill.
pub type Inputs = SmallVec<[CellId; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_with_prefix() {
        assert_eq!(CellId(3).to_string(), "c3");
        assert_eq!(PropagatorId(0).to_string(), "p0");
        assert_eq!(GroupId(12).to_string(), "g12");
        assert_eq!(ContextId(7).to_string(), "ctx7");
    }

    #[test]
    fn port_keys_display() {
        assert_eq!(PortKey::Named("lhs".into()).to_string(), "'lhs'");
        assert_eq!(PortKey::Indexed(-1).to_string(), "#-1");
    }

    #[test]
    fn inputs_stay_inline_for_small_arity() {
        let inputs: Inputs = [CellId(0), CellId(1)].into_iter().collect();
        assert!(!inputs.spilled());
    }
}
