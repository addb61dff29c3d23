//! The Community type (spec.md §4.5): a node set with cached internal/
//! external degree counters, a score function, and preview ("test_*")
//! variants used by the engine to compare candidate moves before committing
//! one.

use std::collections::BTreeSet;

use crate::page::IntId;
use crate::store::GraphStoreView;

/// A set of nodes plus the `Kin`/`Kout` bookkeeping spec.md §3 describes.
/// Membership is an ordered set so iteration order is deterministic
/// (spec.md §6's output format depends on this).
#[derive(Debug, Clone)]
pub struct Community {
    id: IntId,
    nodes: BTreeSet<IntId>,
    kin: i64,
    kout: i64,
}

/// Counts how many of `node`'s neighbors (per the graph's adjacency
/// iterator) already belong to `members`, versus how many do not. A
/// neighbor may be counted twice — see `GraphStoreView::neighbors` — and
/// that is preserved deliberately (spec.md §9).
fn split_neighbors(view: &GraphStoreView, members: &BTreeSet<IntId>, node: IntId) -> (i64, i64) {
    let mut k_in = 0i64;
    let mut k_out = 0i64;
    for neighbor in view.neighbors(node) {
        if members.contains(&neighbor) {
            k_in += 1;
        } else {
            k_out += 1;
        }
    }
    (k_in, k_out)
}

/// `Kin'/(Kin' + Kout' + (|M|+1)*|M| - Kin')` when the denominator is
/// positive, else 0 — spec.md §4.5's score function. `size` is the
/// community's size *before* the hypothetical change, per spec.md §9 (the
/// denominator intentionally uses the old `|M|`, not `|M|±1`).
fn score_of(kin: i64, kout: i64, size: usize) -> f64 {
    let size = size as i64;
    let denom = kin + kout + (size + 1) * size - kin;
    if denom > 0 {
        kin as f64 / denom as f64
    } else {
        0.0
    }
}

impl Community {
    /// A fresh singleton community seeded at node creation (spec.md §4.6).
    pub fn singleton(id: IntId) -> Self {
        let mut nodes = BTreeSet::new();
        nodes.insert(id);
        Self {
            id,
            nodes,
            kin: 0,
            kout: 0,
        }
    }

    pub fn id(&self) -> IntId {
        self.id
    }

    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    pub fn exists(&self, n: IntId) -> bool {
        self.nodes.contains(&n)
    }

    pub fn iter(&self) -> impl Iterator<Item = IntId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn score(&self) -> f64 {
        score_of(self.kin, self.kout, self.size())
    }

    /// Previews the score as if `n` (currently outside the community) were
    /// inserted, without mutating state. Precondition: `!self.exists(n)`.
    pub fn test_insert(&self, view: &GraphStoreView, n: IntId) -> f64 {
        debug_assert!(!self.exists(n), "test_insert precondition: node absent");
        let (node_kin, node_kout) = split_neighbors(view, &self.nodes, n);
        let new_kin = self.kin + 2 * node_kin;
        let new_kout = self.kout - node_kin + node_kout;
        score_of(new_kin, new_kout, self.size())
    }

    /// Previews the score as if `n` (currently a member) were removed,
    /// without mutating state. Precondition: `self.exists(n)`.
    pub fn test_remove(&self, view: &GraphStoreView, n: IntId) -> f64 {
        debug_assert!(self.exists(n), "test_remove precondition: node present");
        let (node_kin, node_kout) = split_neighbors(view, &self.nodes, n);
        let new_kin = self.kin - 2 * node_kin;
        let new_kout = self.kout + node_kin - node_kout;
        score_of(new_kin, new_kout, self.size())
    }

    /// Inserts `n`, committing the `Kin`/`Kout` the preview computed.
    /// Precondition: `!self.exists(n)`.
    pub fn insert(&mut self, view: &GraphStoreView, n: IntId) {
        debug_assert!(!self.exists(n), "insert precondition: node absent");
        let (node_kin, node_kout) = split_neighbors(view, &self.nodes, n);
        self.kin += 2 * node_kin;
        self.kout = self.kout - node_kin + node_kout;
        self.nodes.insert(n);
    }

    /// Removes `n`, committing the `Kin`/`Kout` the preview computed.
    /// Precondition: `self.exists(n)`.
    pub fn remove(&mut self, view: &GraphStoreView, n: IntId) {
        debug_assert!(self.exists(n), "remove precondition: node present");
        let (node_kin, node_kout) = split_neighbors(view, &self.nodes, n);
        self.kin -= 2 * node_kin;
        self.kout = self.kout + node_kin - node_kout;
        self.nodes.remove(&n);
    }
}
