//! Reference network builders for benchmarks and examples.
//!
//! - [`identity_chain`]: a line of identity nodes from one filled head
//! - [`add_tree`]: a balanced binary tree of `add` nodes over filled leaves
//! - [`unified_ring`]: a ring of unified cells with one filled member
//! - [`conflict_fan`]: many cells each hit by two disagreeing writers and
//!   resolved by a shared `min` handler
//! - [`adder_group`]: a group of `add` nodes for duplication benchmarks

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use propnet_core::{CellId, ContextId, EvalError, GroupId, Value};
use propnet_engine::{Evaluator, EvaluatorConfig, Network, RunMetrics};
use propnet_propagators::{Add, Identity, Min};

/// A built network and the cells a benchmark seeds and inspects.
#[derive(Debug)]
pub struct Profile {
    /// The network.
    pub network: Network,
    /// Cells to seed the evaluator with.
    pub seeds: Vec<CellId>,
    /// Writes applied through the evaluator before it runs.
    pub writes: Vec<(CellId, Value, Option<ContextId>)>,
    /// Cell expected to be filled at the fixpoint.
    pub probe: CellId,
}

impl Profile {
    /// Apply the profile's writes and run to the fixpoint.
    pub fn run(&mut self, config: EvaluatorConfig) -> Result<RunMetrics, EvalError> {
        let mut ev = Evaluator::new(&mut self.network, self.seeds.iter().copied(), config);
        for (cell, value, context) in self.writes.drain(..) {
            ev.set(cell, value, context)?;
        }
        ev.run()
    }

    /// Value of the probe cell.
    pub fn probe_value(&self) -> Option<&Value> {
        self.network.value(self.probe)
    }
}

/// `len` identity nodes in a line. The head holds `0`.
pub fn identity_chain(len: usize) -> Profile {
    let mut network = Network::new();
    let head = network.cell_with(Value::int(0));
    let mut tail = head;
    for _ in 0..len {
        let next = network.cell();
        network.expression([tail], Identity, next).unwrap();
        tail = next;
    }
    Profile {
        network,
        seeds: vec![head],
        writes: Vec::new(),
        probe: tail,
    }
}

/// A balanced binary `add` tree over `leaves` cells holding `1`. The root
/// ends up holding `leaves`.
pub fn add_tree(leaves: usize) -> Profile {
    let mut network = Network::new();
    let mut level: Vec<CellId> = (0..leaves.max(1))
        .map(|_| network.cell_with(Value::int(1)))
        .collect();
    let seeds = level.clone();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            let out = network.cell();
            network.expression(pair.iter().copied(), Add, out).unwrap();
            next.push(out);
        }
        level = next;
    }
    Profile {
        network,
        seeds,
        writes: Vec::new(),
        probe: level[0],
    }
}

/// `len` cells unified in a ring; the first holds `7`.
pub fn unified_ring(len: usize) -> Profile {
    let mut network = Network::new();
    let first = network.cell_with(Value::int(7));
    let mut cells = vec![first];
    cells.extend((1..len.max(2)).map(|_| network.cell()));
    for i in 0..cells.len() {
        let next = cells[(i + 1) % cells.len()];
        network.unify_cells(cells[i], next).unwrap();
    }
    let probe = cells[cells.len() - 1];
    Profile {
        network,
        seeds: vec![first],
        writes: Vec::new(),
        probe,
    }
}

/// `count` cells in one context, each written `b + 1` and `b + 2` from a
/// shared source `b`. Every cell conflicts once and resolves through a
/// `min` handler bound by the profile's writes.
pub fn conflict_fan(count: usize) -> Profile {
    let mut network = Network::new();
    let ctx = network.context();
    let handler = network.context_cells(ctx).unwrap().conflict;
    let scratch = network.cell();
    let min = network.expression([], Min, scratch).unwrap();
    let strategy = network.group([scratch], [min], []).unwrap();

    let source = network.cell_in(None, Some(ctx));
    let one = network.cell_with(Value::int(1));
    let two = network.cell_with(Value::int(2));
    let mut probe = source;
    for _ in 0..count.max(1) {
        let out = network.cell();
        network.expression([source, one], Add, out).unwrap();
        network.expression([source, two], Add, out).unwrap();
        probe = out;
    }
    Profile {
        network,
        seeds: Vec::new(),
        writes: vec![
            (handler, Value::Group(strategy), None),
            (source, Value::int(0), Some(ctx)),
        ],
        probe,
    }
}

/// A group of `width` `add` nodes, each reading one member cell and one
/// shared free variable.
pub fn adder_group(width: usize) -> (Network, GroupId) {
    let mut network = Network::new();
    let free = network.cell_with(Value::int(1));
    let mut cells = Vec::with_capacity(width * 2);
    let mut nodes = Vec::with_capacity(width);
    for i in 0..width {
        let input = network.cell_with(Value::int(i as i64));
        let output = network.cell();
        nodes.push(network.expression([input, free], Add, output).unwrap());
        cells.push(input);
        cells.push(output);
    }
    let group = network.group(cells, nodes, []).unwrap();
    (network, group)
}
