//! The evaluator's set of pending cells.

use std::collections::VecDeque;

use indexmap::IndexSet;
use propnet_core::CellId;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::WorklistOrder;

/// Pending cells with set semantics: a cell is pending at most once no
/// matter how many times it is notified.
///
/// Membership lives in an `IndexSet`. LIFO pops its tail and shuffled
/// removal swaps out a random index. FIFO keeps arrival order in a
/// separate queue so every pop is constant time.
#[derive(Debug)]
pub struct Worklist {
    pending: IndexSet<CellId>,
    queue: VecDeque<CellId>,
    order: WorklistOrder,
    rng: Option<ChaCha8Rng>,
}

impl Worklist {
    /// Create an empty worklist with the given removal order.
    pub fn new(order: WorklistOrder) -> Self {
        let rng = match order {
            WorklistOrder::Shuffled { seed } => Some(ChaCha8Rng::seed_from_u64(seed)),
            WorklistOrder::Fifo | WorklistOrder::Lifo => None,
        };
        Self {
            pending: IndexSet::new(),
            queue: VecDeque::new(),
            order,
            rng,
        }
    }

    /// Add a cell. Returns `false` if it was already pending.
    pub fn insert(&mut self, cell: CellId) -> bool {
        let added = self.pending.insert(cell);
        if added && self.order == WorklistOrder::Fifo {
            self.queue.push_back(cell);
        }
        added
    }

    /// Remove the next cell according to the configured order.
    pub fn pop(&mut self) -> Option<CellId> {
        if self.pending.is_empty() {
            return None;
        }
        match self.order {
            WorklistOrder::Fifo => {
                let cell = self.queue.pop_front()?;
                self.pending.swap_remove(&cell);
                Some(cell)
            }
            WorklistOrder::Lifo => self.pending.pop(),
            WorklistOrder::Shuffled { .. } => {
                let len = self.pending.len() as u64;
                let index = match self.rng.as_mut() {
                    Some(rng) => (rng.next_u64() % len) as usize,
                    None => 0,
                };
                self.pending.swap_remove_index(index)
            }
        }
    }

    /// Whether a cell is currently pending.
    pub fn contains(&self, cell: CellId) -> bool {
        self.pending.contains(&cell)
    }

    /// Number of pending cells.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut w: Worklist) -> Vec<u32> {
        std::iter::from_fn(|| w.pop()).map(|c| c.0).collect()
    }

    fn filled(order: WorklistOrder) -> Worklist {
        let mut w = Worklist::new(order);
        for i in 0..5 {
            w.insert(CellId(i));
        }
        w
    }

    #[test]
    fn insert_is_idempotent() {
        let mut w = Worklist::new(WorklistOrder::Fifo);
        assert!(w.insert(CellId(1)));
        assert!(!w.insert(CellId(1)));
        assert_eq!(w.len(), 1);
        assert!(w.contains(CellId(1)));
    }

    #[test]
    fn fifo_and_lifo_orders() {
        assert_eq!(drain(filled(WorklistOrder::Fifo)), vec![0, 1, 2, 3, 4]);
        assert_eq!(drain(filled(WorklistOrder::Lifo)), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn fifo_requeues_a_popped_cell_at_the_back() {
        let mut w = filled(WorklistOrder::Fifo);
        assert_eq!(w.pop(), Some(CellId(0)));
        assert!(!w.contains(CellId(0)));
        assert!(w.insert(CellId(0)));
        assert!(!w.insert(CellId(2)));
        assert_eq!(w.pop(), Some(CellId(1)));
        assert!(w.insert(CellId(1)));
        assert_eq!(w.len(), 5);
        assert_eq!(drain(w), vec![2, 3, 4, 0, 1]);
    }

    #[test]
    fn fifo_drains_a_long_queue_in_order() {
        let mut w = Worklist::new(WorklistOrder::Fifo);
        for i in 0..10_000 {
            w.insert(CellId(i));
        }
        assert_eq!(drain(w), (0..10_000).collect::<Vec<u32>>());
    }

    #[test]
    fn shuffled_is_a_permutation_and_replayable() {
        let a = drain(filled(WorklistOrder::Shuffled { seed: 11 }));
        let b = drain(filled(WorklistOrder::Shuffled { seed: 11 }));
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_pop_is_none() {
        let mut w = Worklist::new(WorklistOrder::Shuffled { seed: 0 });
        assert!(w.is_empty());
        assert_eq!(w.pop(), None);
    }
}
