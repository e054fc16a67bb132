//! Contexts: capability tags attached to values, and their merge.
//!
//! A context is two cells, the conflict-handler capability and the general
//! handler capability, both initially empty. Contexts are never mutated in
//! place: when two must coexist on one write they are merged by unifying
//! their capability cells, and any disagreement later surfaces as an
//! ordinary cell conflict.

use propnet_core::{CellId, ContextId, NetworkError};
use smallvec::SmallVec;

use crate::network::Network;

/// The two capability cells of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextCells {
    /// Holds the conflict-resolution strategy (a group value) once bound.
    pub conflict: CellId,
    /// Holds the general handler capability once bound.
    pub handler: CellId,
}

impl Network {
    /// Allocate a fresh context with two empty capability cells.
    pub fn context(&mut self) -> ContextId {
        let conflict = self.cell();
        let handler = self.cell();
        let id = ContextId(self.contexts.len() as u32);
        self.contexts.push(ContextCells { conflict, handler });
        id
    }

    /// The capability cells of a context.
    pub fn context_cells(&self, context: ContextId) -> Result<ContextCells, NetworkError> {
        self.contexts
            .get(context.0 as usize)
            .copied()
            .ok_or(NetworkError::UnknownContext { context })
    }

    /// Number of contexts allocated.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Merge a list of optional contexts into one.
    ///
    /// `None` entries and repeated handles are dropped first. Then:
    ///
    /// - nothing left: a fresh empty context is allocated and returned;
    /// - exactly one left: it is returned as is, with no unification;
    /// - more than one: every distinct pair has its conflict cells unified
    ///   with each other and its handler cells unified with each other,
    ///   and the first context is returned as the representative.
    ///
    /// A pair is wired at most once per network, so merging the same
    /// contexts repeatedly does not stack identity nodes. Merge never
    /// writes a value.
    pub fn merge_contexts(
        &mut self,
        contexts: &[Option<ContextId>],
    ) -> Result<ContextId, NetworkError> {
        let mut distinct: SmallVec<[ContextId; 4]> = SmallVec::new();
        for &context in contexts.iter().flatten() {
            self.context_cells(context)?;
            if !distinct.contains(&context) {
                distinct.push(context);
            }
        }

        match distinct.as_slice() {
            [] => Ok(self.context()),
            [only] => Ok(*only),
            [first, ..] => {
                let first = *first;
                for (i, &a) in distinct.iter().enumerate() {
                    for &b in &distinct[i + 1..] {
                        self.unify_context_pair(a, b)?;
                    }
                }
                tracing::trace!(representative = %first, merged = distinct.len(), "contexts merged");
                Ok(first)
            }
        }
    }

    fn unify_context_pair(&mut self, a: ContextId, b: ContextId) -> Result<(), NetworkError> {
        let key = if a <= b { (a, b) } else { (b, a) };
        if !self.unified_contexts.insert(key) {
            return Ok(());
        }
        let lhs = self.context_cells(a)?;
        let rhs = self.context_cells(b)?;
        self.unify_cells(lhs.conflict, rhs.conflict)?;
        self.unify_cells(lhs.handler, rhs.handler)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_empty_capabilities() {
        let mut net = Network::new();
        let ctx = net.context();
        let cells = net.context_cells(ctx).unwrap();
        assert_ne!(cells.conflict, cells.handler);
        assert!(!net.is_filled(cells.conflict));
        assert!(!net.is_filled(cells.handler));
    }

    #[test]
    fn single_context_returned_unchanged() {
        let mut net = Network::new();
        let ctx = net.context();
        let nodes_before = net.propagator_count();
        assert_eq!(net.merge_contexts(&[None, Some(ctx), None]), Ok(ctx));
        assert_eq!(net.propagator_count(), nodes_before);
    }

    #[test]
    fn repeated_context_is_the_identity_fast_path() {
        let mut net = Network::new();
        let ctx = net.context();
        assert_eq!(net.merge_contexts(&[Some(ctx), Some(ctx)]), Ok(ctx));
        assert_eq!(net.propagator_count(), 0);
    }

    #[test]
    fn no_contexts_allocates_fresh() {
        let mut net = Network::new();
        let merged = net.merge_contexts(&[None, None]).unwrap();
        assert_eq!(net.context_count(), 1);
        assert_eq!(net.context_cells(merged).unwrap().conflict, CellId(0));
    }

    #[test]
    fn two_contexts_unify_capabilities_pairwise() {
        let mut net = Network::new();
        let a = net.context();
        let b = net.context();
        assert_eq!(net.merge_contexts(&[Some(a), Some(b)]), Ok(a));

        let ca = net.context_cells(a).unwrap();
        let cb = net.context_cells(b).unwrap();
        // One identity node in each direction per capability.
        assert_eq!(net.propagator_count(), 4);
        assert_eq!(net.attached(ca.conflict).unwrap().len(), 1);
        assert_eq!(net.attached(cb.handler).unwrap().len(), 1);
        let forward = net.attached(ca.conflict).unwrap()[0];
        assert_eq!(net.propagator_output(forward).unwrap(), cb.conflict);
    }

    #[test]
    fn repeated_merge_wires_once() {
        let mut net = Network::new();
        let a = net.context();
        let b = net.context();
        net.merge_contexts(&[Some(a), Some(b)]).unwrap();
        net.merge_contexts(&[Some(b), Some(a)]).unwrap();
        assert_eq!(net.propagator_count(), 4);
    }

    #[test]
    fn three_contexts_wire_every_pair() {
        let mut net = Network::new();
        let ctxs: Vec<_> = (0..3).map(|_| Some(net.context())).collect();
        let first = ctxs[0].unwrap();
        assert_eq!(net.merge_contexts(&ctxs), Ok(first));
        // 3 pairs x 2 capabilities x 2 directions.
        assert_eq!(net.propagator_count(), 12);
    }

    #[test]
    fn unknown_context_rejected() {
        let mut net = Network::new();
        assert_eq!(
            net.merge_contexts(&[Some(ContextId(5))]),
            Err(NetworkError::UnknownContext {
                context: ContextId(5)
            })
        );
    }
}
