//! Groups: bundles of cells, propagators, and nested groups with named and
//! indexed ports, plus deep structural duplication.

use std::collections::HashMap;

use indexmap::IndexMap;
use propnet_core::{CellId, GroupId, Inputs, NetworkError, PortKey, PropagatorId};

use crate::network::Network;

// ── Group ──────────────────────────────────────────────────────────

/// Membership lists and port registries of one group.
///
/// Every registered port references a cell in [`cells`](Self::cells).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Group {
    pub(crate) cells: Vec<CellId>,
    pub(crate) propagators: Vec<PropagatorId>,
    pub(crate) groups: Vec<GroupId>,
    pub(crate) named: IndexMap<String, CellId>,
    pub(crate) indexed: IndexMap<i64, CellId>,
}

impl Group {
    /// Member cells, in declaration order.
    pub fn cells(&self) -> &[CellId] {
        &self.cells
    }

    /// Member propagators, in declaration order.
    pub fn propagators(&self) -> &[PropagatorId] {
        &self.propagators
    }

    /// Nested member groups, in declaration order.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// Named ports, in registration order.
    pub fn named_ports(&self) -> impl Iterator<Item = (&str, CellId)> + '_ {
        self.named.iter().map(|(k, &c)| (k.as_str(), c))
    }

    /// Indexed ports, in registration order.
    pub fn indexed_ports(&self) -> impl Iterator<Item = (i64, CellId)> + '_ {
        self.indexed.iter().map(|(&k, &c)| (k, c))
    }

    /// Whether `cell` is in the member list.
    pub fn has_cell(&self, cell: CellId) -> bool {
        self.cells.contains(&cell)
    }

    /// Whether `propagator` is in the member list.
    pub fn has_propagator(&self, propagator: PropagatorId) -> bool {
        self.propagators.contains(&propagator)
    }
}

// ── Duplication memo ───────────────────────────────────────────────

/// Original → clone maps shared across one duplication pass.
///
/// Passing the same memo to several [`Network::dup_group`] calls clones
/// shared sub-structure once and wires the clones to each other.
#[derive(Clone, Debug, Default)]
pub struct DupMemo {
    cells: HashMap<CellId, CellId>,
    propagators: HashMap<PropagatorId, PropagatorId>,
    groups: HashMap<GroupId, GroupId>,
}

impl DupMemo {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone of `cell`, if it was duplicated.
    pub fn cell(&self, cell: CellId) -> Option<CellId> {
        self.cells.get(&cell).copied()
    }

    /// Clone of `propagator`, if it was duplicated.
    pub fn propagator(&self, propagator: PropagatorId) -> Option<PropagatorId> {
        self.propagators.get(&propagator).copied()
    }

    /// Clone of `group`, if it was duplicated.
    pub fn group(&self, group: GroupId) -> Option<GroupId> {
        self.groups.get(&group).copied()
    }

    /// Map a cell through the memo. Cells outside the duplicated
    /// structure map to themselves.
    pub fn remap_cell(&self, cell: CellId) -> CellId {
        self.cell(cell).unwrap_or(cell)
    }

    /// Number of cells cloned so far.
    pub fn cells_cloned(&self) -> usize {
        self.cells.len()
    }
}

/// A member to be located in a group's clone by
/// [`Network::dup_group_with_targets`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DupTarget {
    /// A member cell.
    Cell(CellId),
    /// A member propagator.
    Propagator(PropagatorId),
}

// ── Network: group operations ──────────────────────────────────────

impl Network {
    /// Create a group from member cells, propagators, and nested groups.
    /// Ports start empty.
    pub fn group(
        &mut self,
        cells: impl IntoIterator<Item = CellId>,
        propagators: impl IntoIterator<Item = PropagatorId>,
        groups: impl IntoIterator<Item = GroupId>,
    ) -> Result<GroupId, NetworkError> {
        let group = Group {
            cells: cells.into_iter().collect(),
            propagators: propagators.into_iter().collect(),
            groups: groups.into_iter().collect(),
            ..Group::default()
        };
        for &cell in &group.cells {
            self.slot(cell)?;
        }
        for &propagator in &group.propagators {
            self.node(propagator)?;
        }
        for &nested in &group.groups {
            self.group_entry(nested)?;
        }
        Ok(self.push_group(group))
    }

    /// Membership and ports of a group.
    pub fn group_info(&self, group: GroupId) -> Result<&Group, NetworkError> {
        self.group_entry(group)
    }

    /// Number of groups allocated.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Register a named port. The cell must be a member and the name unused.
    pub fn name_port(
        &mut self,
        group: GroupId,
        name: impl Into<String>,
        cell: CellId,
    ) -> Result<(), NetworkError> {
        let name = name.into();
        let entry = self.group_port_target(group, cell)?;
        if entry.named.contains_key(&name) {
            return Err(NetworkError::DuplicatePort {
                group,
                port: PortKey::Named(name),
            });
        }
        entry.named.insert(name, cell);
        Ok(())
    }

    /// Register an indexed port. The cell must be a member and the index
    /// unused.
    pub fn index_port(
        &mut self,
        group: GroupId,
        index: i64,
        cell: CellId,
    ) -> Result<(), NetworkError> {
        let entry = self.group_port_target(group, cell)?;
        if entry.indexed.contains_key(&index) {
            return Err(NetworkError::DuplicatePort {
                group,
                port: PortKey::Indexed(index),
            });
        }
        entry.indexed.insert(index, cell);
        Ok(())
    }

    /// Look up a named port.
    pub fn named(&self, group: GroupId, name: &str) -> Result<CellId, NetworkError> {
        self.group_entry(group)?
            .named
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::PortNotFound {
                group,
                port: PortKey::Named(name.to_string()),
            })
    }

    /// Look up an indexed port.
    pub fn indexed(&self, group: GroupId, index: i64) -> Result<CellId, NetworkError> {
        self.group_entry(group)?
            .indexed
            .get(&index)
            .copied()
            .ok_or(NetworkError::PortNotFound {
                group,
                port: PortKey::Indexed(index),
            })
    }

    /// Unify every port of `a` with the same port of `b`.
    ///
    /// Every named and indexed port of `a` must exist on `b`; ports only
    /// `b` has are ignored. Nothing is wired unless every lookup succeeds.
    /// Returns the number of port pairs unified.
    pub fn unify_groups(&mut self, a: GroupId, b: GroupId) -> Result<usize, NetworkError> {
        let pairs: Vec<(CellId, CellId)> = {
            let lhs = self.group_entry(a)?;
            let mut pairs = Vec::with_capacity(lhs.named.len() + lhs.indexed.len());
            for (name, &cell) in &lhs.named {
                pairs.push((cell, self.named(b, name)?));
            }
            for (&index, &cell) in &lhs.indexed {
                pairs.push((cell, self.indexed(b, index)?));
            }
            pairs
        };
        for &(lhs, rhs) in &pairs {
            self.unify_cells(lhs, rhs)?;
        }
        Ok(pairs.len())
    }

    /// Deep-clone a group through `memo`.
    ///
    /// Member cells become fresh cells carrying only their current value;
    /// contexts are dropped. Nested groups are cloned through the same
    /// memo. Member propagators are rebuilt with each input and output
    /// mapped through the memo; cells not in the memo are free variables
    /// and stay as they are. A group already in the memo returns its
    /// existing clone.
    pub fn dup_group(&mut self, group: GroupId, memo: &mut DupMemo) -> Result<GroupId, NetworkError> {
        if let Some(clone) = memo.group(group) {
            return Ok(clone);
        }
        let original = self.group_entry(group)?.clone();

        let mut cells = Vec::with_capacity(original.cells.len());
        for &cell in &original.cells {
            let clone = match memo.cell(cell) {
                Some(clone) => clone,
                None => {
                    let value = self.slot(cell)?.value.clone();
                    let clone = self.cell_in(value, None);
                    memo.cells.insert(cell, clone);
                    clone
                }
            };
            cells.push(clone);
        }

        let mut groups = Vec::with_capacity(original.groups.len());
        for &nested in &original.groups {
            groups.push(self.dup_group(nested, memo)?);
        }

        let mut propagators = Vec::with_capacity(original.propagators.len());
        for &propagator in &original.propagators {
            let clone = match memo.propagator(propagator) {
                Some(clone) => clone,
                None => {
                    let node = self.node(propagator)?.clone();
                    let inputs: Inputs = node.inputs.iter().map(|&c| memo.remap_cell(c)).collect();
                    let output = memo.remap_cell(node.output);
                    let clone = self.attach(inputs, node.body, output);
                    memo.propagators.insert(propagator, clone);
                    clone
                }
            };
            propagators.push(clone);
        }

        let named = original
            .named
            .iter()
            .map(|(k, &c)| (k.clone(), memo.remap_cell(c)))
            .collect();
        let indexed = original
            .indexed
            .iter()
            .map(|(&k, &c)| (k, memo.remap_cell(c)))
            .collect();

        let clone = self.push_group(Group {
            cells,
            propagators,
            groups,
            named,
            indexed,
        });
        memo.groups.insert(group, clone);
        tracing::trace!(%group, %clone, "group duplicated");
        Ok(clone)
    }

    /// Deep-clone a group and locate the clones of `targets`.
    ///
    /// Each target must be a direct member of `group`; otherwise the call
    /// fails with [`NetworkError::DupTargetNotInGroup`] before anything is
    /// cloned. Returns the clone and the mapped targets, in order.
    pub fn dup_group_with_targets(
        &mut self,
        group: GroupId,
        targets: &[DupTarget],
        memo: &mut DupMemo,
    ) -> Result<(GroupId, Vec<DupTarget>), NetworkError> {
        let entry = self.group_entry(group)?;
        for target in targets {
            let (member, label) = match *target {
                DupTarget::Cell(cell) => (entry.has_cell(cell), cell.to_string()),
                DupTarget::Propagator(p) => (entry.has_propagator(p), p.to_string()),
            };
            if !member {
                return Err(NetworkError::DupTargetNotInGroup {
                    group,
                    target: label,
                });
            }
        }

        let clone = self.dup_group(group, memo)?;
        let mapped = targets
            .iter()
            .map(|target| match *target {
                DupTarget::Cell(cell) => DupTarget::Cell(memo.remap_cell(cell)),
                DupTarget::Propagator(p) => DupTarget::Propagator(memo.propagator(p).unwrap_or(p)),
            })
            .collect();
        Ok((clone, mapped))
    }

    fn push_group(&mut self, group: Group) -> GroupId {
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(group);
        id
    }

    fn group_port_target(
        &mut self,
        group: GroupId,
        cell: CellId,
    ) -> Result<&mut Group, NetworkError> {
        let entry = self
            .groups
            .get_mut(group.0 as usize)
            .ok_or(NetworkError::UnknownGroup { group })?;
        if !entry.has_cell(cell) {
            return Err(NetworkError::NotAMember { group, cell });
        }
        Ok(entry)
    }
}
