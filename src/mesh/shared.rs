//! **Shared-Vertex Table**
//!
//! Partitions vertex indices into groups of coincident vertices that must move
//! together. A mesh carries two of these: one for positions and one for UV
//! seams. Group ids are always dense (`0..len()`) and every vertex belongs to
//! exactly one group; an ungrouped vertex is simply a singleton.

use crate::errors::{MeshError, MeshResult};
use crate::float_types::{Real, tolerance};
use crate::ops::delete::ShiftMap;
use hashbrown::HashMap;
use nalgebra::Point3;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedVertexTable {
    /// vertex index -> group id
    lookup: Vec<usize>,
    /// group id -> ascending member indices
    groups: Vec<Vec<usize>>,
}

impl SharedVertexTable {
    /// Every vertex in its own group.
    pub fn singletons(vertex_count: usize) -> Self {
        Self {
            lookup: (0..vertex_count).collect(),
            groups: (0..vertex_count).map(|i| vec![i]).collect(),
        }
    }

    /// Builds a table from a per-vertex key list. Equal keys share a group;
    /// `None` gets a group of its own. Groups are numbered densely in order of
    /// first appearance, so arbitrary (sparse, fresh) keys are fine.
    pub fn from_lookup(keys: &[Option<usize>]) -> Self {
        let mut dense: HashMap<usize, usize> = HashMap::with_capacity(keys.len());
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut lookup = Vec::with_capacity(keys.len());

        for (index, key) in keys.iter().enumerate() {
            let group = match key {
                Some(key) => *dense.entry(*key).or_insert_with(|| {
                    groups.push(Vec::new());
                    groups.len() - 1
                }),
                None => {
                    groups.push(Vec::new());
                    groups.len() - 1
                },
            };
            groups[group].push(index);
            lookup.push(group);
        }

        Self { lookup, groups }
    }

    /// Groups vertices whose positions coincide after quantization to the
    /// crate tolerance.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Point3<Real>>) -> Self {
        let scale = 1.0 / tolerance();
        let mut keys: HashMap<[i64; 3], usize> = HashMap::new();
        let lookup: Vec<Option<usize>> = positions
            .into_iter()
            .map(|p| {
                let q = [
                    (p.x * scale).round() as i64,
                    (p.y * scale).round() as i64,
                    (p.z * scale).round() as i64,
                ];
                let next = keys.len();
                Some(*keys.entry(q).or_insert(next))
            })
            .collect();
        Self::from_lookup(&lookup)
    }

    /// Validates host-supplied groups. Indices missing from every group
    /// become singletons; a duplicate or out-of-range member is an error.
    pub fn from_groups(groups: Vec<Vec<usize>>, vertex_count: usize) -> MeshResult<Self> {
        let mut keys: Vec<Option<usize>> = vec![None; vertex_count];
        for (key, members) in groups.iter().enumerate() {
            for &index in members {
                let slot = keys.get_mut(index).ok_or(MeshError::IndexOutOfRange { index, count: vertex_count })?;
                if slot.is_some() {
                    return Err(MeshError::DuplicateGroupMember(index));
                }
                *slot = Some(key);
            }
        }
        Ok(Self::from_lookup(&keys))
    }

    /// Number of groups.
    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of vertices covered by the table.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.lookup.len()
    }

    /// Group id of a vertex.
    #[inline]
    pub fn group(&self, index: usize) -> Option<usize> {
        self.lookup.get(index).copied()
    }

    /// All member indices of a group.
    #[inline]
    pub fn positions_of(&self, group: usize) -> Option<&[usize]> {
        self.groups.get(group).map(Vec::as_slice)
    }

    /// Every vertex coincident with `index`, itself included.
    pub fn coincident(&self, index: usize) -> &[usize] {
        self.group(index).and_then(|g| self.positions_of(g)).unwrap_or(&[])
    }

    #[inline]
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    #[inline]
    pub fn lookup(&self) -> &[usize] {
        &self.lookup
    }

    /// Flat key list suitable for [`SharedVertexTable::from_lookup`].
    pub fn to_lookup(&self) -> Vec<Option<usize>> {
        self.lookup.iter().copied().map(Some).collect()
    }

    /// Distinct groups touched by `indices`, ascending. Unknown indices are
    /// ignored.
    pub fn common_indices(&self, indices: &[usize]) -> BTreeSet<usize> {
        indices.iter().filter_map(|&i| self.group(i)).collect()
    }

    fn check(&self, indices: &[usize]) -> MeshResult<()> {
        if indices.is_empty() {
            return Err(MeshError::EmptyInput("vertex indices"));
        }
        match indices.iter().find(|&&i| i >= self.lookup.len()) {
            Some(&index) => Err(MeshError::IndexOutOfRange { index, count: self.lookup.len() }),
            None => Ok(()),
        }
    }

    /// Drops empty groups and rewrites the lookup. Returns old -> new ids.
    fn compact(&mut self) -> Vec<Option<usize>> {
        let mut remap = vec![None; self.groups.len()];
        let mut next = 0;
        for (old, members) in self.groups.iter().enumerate() {
            if !members.is_empty() {
                remap[old] = Some(next);
                next += 1;
            }
        }
        self.groups.retain(|members| !members.is_empty());
        for (group, members) in self.groups.iter_mut().enumerate() {
            members.sort_unstable();
            for &m in members.iter() {
                self.lookup[m] = group;
            }
        }
        remap
    }

    /// **Union of groups**
    ///
    /// Every group touched by `indices` is folded into the lowest of them.
    /// Transitive and order independent. Returns the resulting group id.
    pub fn merge(&mut self, indices: &[usize]) -> MeshResult<usize> {
        self.check(indices)?;
        let touched = self.common_indices(indices);
        let mut iter = touched.iter().copied();
        let target = iter.next().ok_or(MeshError::EmptyInput("vertex indices"))?;
        for group in iter {
            let members = std::mem::take(&mut self.groups[group]);
            self.groups[target].extend(members);
        }
        let remap = self.compact();
        remap[target].ok_or(MeshError::GroupOutOfRange { group: target, count: self.groups.len() })
    }

    /// Pulls each addressed index out of its group into a group of its own.
    /// Other members of the former group are left together.
    pub fn split(&mut self, indices: &[usize]) -> MeshResult<()> {
        self.check(indices)?;
        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        for index in unique {
            let group = self.lookup[index];
            if self.groups[group].len() > 1 {
                self.groups[group].retain(|&m| m != index);
                self.groups.push(vec![index]);
                self.lookup[index] = self.groups.len() - 1;
            }
        }
        Ok(())
    }

    /// Atomizes every group touched by `indices`: each member ends up alone.
    pub fn split_common(&mut self, indices: &[usize]) -> MeshResult<()> {
        self.check(indices)?;
        for group in self.common_indices(indices) {
            let members = std::mem::take(&mut self.groups[group]);
            let mut rest = members.into_iter();
            if let Some(first) = rest.next() {
                self.groups[group].push(first);
            }
            for index in rest {
                self.groups.push(vec![index]);
                self.lookup[index] = self.groups.len() - 1;
            }
        }
        Ok(())
    }

    /// Moves exactly `indices` (not their former group mates) into one new
    /// group and returns its id.
    pub fn set_coincident(&mut self, indices: &[usize]) -> MeshResult<usize> {
        self.check(indices)?;
        let unique: BTreeSet<usize> = indices.iter().copied().collect();
        for &index in &unique {
            let group = self.lookup[index];
            self.groups[group].retain(|&m| m != index);
        }
        self.groups.push(unique.into_iter().collect());
        let fresh = self.groups.len() - 1;
        let remap = self.compact();
        remap[fresh].ok_or(MeshError::GroupOutOfRange { group: fresh, count: self.groups.len() })
    }

    /// Drops removed vertices and renumbers survivors through `shift`,
    /// keeping group order and density.
    pub fn remove_and_shift(&self, shift: &ShiftMap) -> Self {
        let mut groups: Vec<Vec<usize>> = self
            .groups
            .iter()
            .map(|members| members.iter().filter_map(|&m| shift.remap(m)).collect::<Vec<_>>())
            .filter(|members: &Vec<usize>| !members.is_empty())
            .collect();
        let count = groups.iter().map(Vec::len).sum();
        let mut lookup = vec![0; count];
        for (group, members) in groups.iter_mut().enumerate() {
            members.sort_unstable();
            for &m in members.iter() {
                lookup[m] = group;
            }
        }
        Self { lookup, groups }
    }

    /// Checks the table covers exactly `vertex_count` vertices.
    pub fn validate(&self, vertex_count: usize) -> MeshResult<()> {
        if self.lookup.len() != vertex_count {
            return Err(MeshError::InvalidArgument(format!(
                "shared table covers {} vertices, mesh has {}",
                self.lookup.len(),
                vertex_count
            )));
        }
        for (group, members) in self.groups.iter().enumerate() {
            if members.is_empty() {
                return Err(MeshError::InvalidArgument(format!("shared group {group} is empty")));
            }
            if let Some(&m) = members.iter().find(|&&m| self.lookup.get(m) != Some(&group)) {
                return Err(MeshError::DuplicateGroupMember(m));
            }
        }
        Ok(())
    }
}

/// Hands out ids that are not in use yet: texture groups, element groups,
/// fresh shared-group keys. Owned by the operator that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    /// First id handed out is `start`.
    pub const fn starting_at(start: usize) -> Self {
        Self { next: start }
    }

    /// First id handed out is one past the largest id in `used`.
    pub fn after(used: impl IntoIterator<Item = usize>) -> Self {
        let next = used.into_iter().max().map_or(0, |m| m + 1);
        Self { next }
    }

    /// Same as [`IdAllocator::after`] for signed ids where negatives mean
    /// "unassigned".
    pub fn after_signed(used: impl IntoIterator<Item = i32>) -> Self {
        Self::after(used.into_iter().filter_map(|id| usize::try_from(id).ok()))
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Signed flavour for face group fields.
    pub fn next_signed(&mut self) -> i32 {
        i32::try_from(self.next_id()).unwrap_or(i32::MAX)
    }
}
