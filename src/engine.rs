//! The Community Engine (spec.md §4.6): allocates one singleton community
//! per node, inspects each delivered batch and decides whether to move an
//! endpoint into the other's community under the score-delta rule, and at
//! teardown emits the final partition to a sink supplied at construction
//! (spec.md §9).

use std::io::Write;

use crate::community::Community;
use crate::page::{Edge, IntId};
use crate::store::{GraphCallbacks, GraphStoreView};

/// Splits a slice into two mutable references at distinct indices. Used to
/// borrow a moving node's source and destination communities at the same
/// time without cloning either.
fn two_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b);
    if a < b {
        let (left, right) = slice.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = slice.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Drives per-node community membership from the edge batches the Graph
/// Store delivers. `node_state` maps a node to the arena index of the
/// community currently containing it; the arena is indexed by the seed
/// node's `IntId`, since a community is created exactly once (at its seed
/// node's allocation) and only ever freed, never recreated at that index.
/// `None` in `node_state` means "already emitted," matching spec.md §4.6's
/// "null state is a valid no-op."
pub struct CommunityEngine<W: Write> {
    communities: Vec<Option<Community>>,
    node_state: Vec<Option<usize>>,
    sink: W,
}

impl<W: Write> CommunityEngine<W> {
    pub fn new(sink: W) -> Self {
        Self {
            communities: Vec::new(),
            node_state: Vec::new(),
            sink,
        }
    }

    /// Unwraps the engine, returning its sink — used once ingestion is
    /// finished and the partition has been written.
    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Moves `node` from the community at `from_idx` to the one at
    /// `to_idx`, committing both sides' `Kin`/`Kout`, then releases the
    /// source community if it has become empty (spec.md §4.6 step 4: "if
    /// TC.size()==0, release TC"). Releasing here just drops the arena
    /// slot — there are no members left to emit, so going through the
    /// teardown `node_free` path would be a no-op anyway.
    fn move_node(&mut self, view: &GraphStoreView, node: IntId, from_idx: usize, to_idx: usize) {
        let (from, to) = two_mut(&mut self.communities, from_idx, to_idx);
        from.as_mut().expect("source community must be live").remove(view, node);
        to.as_mut().expect("destination community must be live").insert(view, node);

        self.node_state[node as usize] = Some(to_idx);

        if self.communities[from_idx].as_ref().expect("source community must be live").size() == 0 {
            self.communities[from_idx] = None;
        }
    }
}

impl<W: Write> GraphCallbacks for CommunityEngine<W> {
    fn node_alloc(&mut self, _view: &GraphStoreView, id: IntId) {
        debug_assert_eq!(self.communities.len(), id as usize);
        self.communities.push(Some(Community::singleton(id)));
        self.node_state.push(Some(id as usize));
    }

    fn node_free(&mut self, view: &GraphStoreView, id: IntId) {
        let Some(idx) = self.node_state[id as usize] else {
            return; // already emitted via a fellow member
        };
        let Some(community) = self.communities[idx].take() else {
            return;
        };
        if community.size() == 0 {
            return;
        }

        let line = community
            .iter()
            .map(|member| view.external_id(member).to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(self.sink, "{line}").expect("failed to write community partition");

        for member in community.iter() {
            self.node_state[member as usize] = None;
        }
    }

    fn insert_batch(&mut self, view: &GraphStoreView, edges: &[Edge]) {
        for edge in edges {
            let t = edge.tail;
            let h = edge.head;

            let tc_idx = self.node_state[t as usize].expect("live node has a community");
            let hc_idx = self.node_state[h as usize].expect("live node has a community");
            if tc_idx == hc_idx {
                continue;
            }

            let (current, t_to_h, h_to_t) = {
                let tc = self.communities[tc_idx].as_ref().expect("live community");
                let hc = self.communities[hc_idx].as_ref().expect("live community");
                let current = tc.score() + hc.score();
                let t_to_h = tc.test_remove(view, t) + hc.test_insert(view, t);
                let h_to_t = hc.test_remove(view, h) + tc.test_insert(view, h);
                (current, t_to_h, h_to_t)
            };

            if t_to_h <= current && h_to_t <= current {
                continue; // neither move strictly improves; ties do not move
            }

            // Prefer the larger alternative; on an exact tie prefer h_to_t,
            // i.e. moving h into t's community (spec.md §8, scenario S6).
            if t_to_h > h_to_t {
                self.move_node(view, t, tc_idx, hc_idx);
            } else {
                self.move_node(view, h, hc_idx, tc_idx);
            }
        }
    }

    fn remove_batch(&mut self, _view: &GraphStoreView, _edges: &[Edge]) {
        // Deliberate no-op (spec.md §4.6/§9): evicted structure is already
        // reflected in frozen Kin/Kout counters and is never "unlearned."
    }
}
