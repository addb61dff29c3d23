//! The Graph Store (spec.md §4.4): external/internal id remap, page
//! allocation via the Buffer Pool, the LRU eviction protocol, batched edge
//! delivery, and the callback surface the community engine is driven
//! through.

use std::collections::{HashMap, VecDeque};

use crate::adjacency::{AdjacencyList, PageRef};
use crate::buffer_pool::BufferPool;
use crate::config::{EdgeMode, GraphConfig};
use crate::error::{GraphError, Result};
use crate::page::{Edge, EdgePage, IntId};

/// Node identifier as supplied by the client; arbitrary and possibly sparse.
pub type ExtId = u64;

/// Read-only neighbor-iteration surface of the Graph Store, handed to
/// `GraphCallbacks` methods instead of the whole store (spec.md §9: the
/// callback trait should not need to know about the store's own generic
/// parameter).
pub struct GraphStoreView<'a> {
    mode: EdgeMode,
    pages: &'a [Option<EdgePage>],
    adjacency: &'a [AdjacencyList],
    remap: &'a [ExtId],
}

impl<'a> GraphStoreView<'a> {
    pub(crate) fn new(
        mode: EdgeMode,
        pages: &'a [Option<EdgePage>],
        adjacency: &'a [AdjacencyList],
        remap: &'a [ExtId],
    ) -> Self {
        Self {
            mode,
            pages,
            adjacency,
            remap,
        }
    }

    pub fn mode(&self) -> EdgeMode {
        self.mode
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    /// External id of an internal node id (spec.md §6's output format maps
    /// through this).
    pub fn external_id(&self, n: IntId) -> ExtId {
        self.remap[n as usize]
    }

    /// Neighbors of `n`, yielding the opposite endpoint of every edge
    /// incident on `n` in `n`'s referenced pages (spec.md §4.4). Both
    /// endpoints count in `UNDIRECTED` mode, only `tail == n` in `DIRECTED`
    /// mode. A neighbor may be yielded twice — for self-loops, or because
    /// the scoring arithmetic relies on this double count being stable
    /// between `test_*` and later evaluations (spec.md §9) — and that is
    /// preserved deliberately, not a bug.
    pub fn neighbors(&self, n: IntId) -> Vec<IntId> {
        let mut out = Vec::new();
        let list = &self.adjacency[n as usize];
        for page_ref in list.iter() {
            let Some(page) = &self.pages[page_ref] else {
                continue;
            };
            for edge in page.iter() {
                match self.mode {
                    EdgeMode::Directed => {
                        if edge.tail == n {
                            out.push(edge.head);
                        }
                    }
                    EdgeMode::Undirected => {
                        if edge.tail == n {
                            out.push(edge.head);
                        }
                        if edge.head == n {
                            out.push(edge.tail);
                        }
                    }
                }
            }
        }
        out
    }
}

/// The four engine hooks of spec.md §4.4/§4.6, expressed as a trait the
/// community engine implements rather than C-style function pointers
/// (spec.md §9).
pub trait GraphCallbacks {
    /// Called once, synchronously, the first time a node's external id is
    /// seen — seeds whatever per-node state the engine keeps.
    fn node_alloc(&mut self, view: &GraphStoreView, id: IntId);

    /// Called once per node at `close()`, in ascending `IntId` order — the
    /// engine's chance to emit final state for the node.
    fn node_free(&mut self, view: &GraphStoreView, id: IntId);

    /// Called with a full (or final partial) batch of newly-pushed edges,
    /// in arrival order.
    fn insert_batch(&mut self, view: &GraphStoreView, edges: &[Edge]);

    /// Called with the contents of the LRU-oldest page just before its
    /// buffer is recycled, before any adjacency repair.
    fn remove_batch(&mut self, view: &GraphStoreView, edges: &[Edge]);
}

pub struct GraphStore<C: GraphCallbacks> {
    config: GraphConfig,
    pool: BufferPool,
    pages: Vec<Option<EdgePage>>,
    lru: VecDeque<PageRef>,
    adjacency: Vec<AdjacencyList>,
    map: HashMap<ExtId, IntId>,
    remap: Vec<ExtId>,
    batch: Vec<Edge>,
    num_pushed: u64,
    callbacks: C,
}

impl<C: GraphCallbacks> GraphStore<C> {
    /// Fails with `GraphError::InvalidArgument` if `config` cannot back a
    /// working store: `num_pages` must be able to hand out at least one
    /// buffer, and `batch_size` must be at least 1 (a batch size of 0 would
    /// never satisfy `push`'s flush check, so edges would never reach the
    /// callbacks until `close`, defeating the bounded-memory design).
    pub fn new(config: GraphConfig, callbacks: C) -> Result<Self> {
        if config.num_pages == 0 {
            return Err(GraphError::InvalidArgument(
                "num_pages must be greater than zero".to_string(),
            ));
        }
        if config.batch_size == 0 {
            return Err(GraphError::InvalidArgument(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            pool: BufferPool::new(config.num_pages),
            pages: Vec::new(),
            lru: VecDeque::new(),
            adjacency: Vec::new(),
            map: HashMap::new(),
            remap: Vec::new(),
            batch: Vec::with_capacity(config.batch_size),
            num_pushed: 0,
            config,
            callbacks,
        })
    }

    fn view(&self) -> GraphStoreView<'_> {
        GraphStoreView::new(self.config.mode, &self.pages, &self.adjacency, &self.remap)
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn num_pushed(&self) -> u64 {
        self.num_pushed
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// Resolves an external id to its internal id, assigning a fresh dense
    /// id (and seeding engine state via `node_alloc`) on first sight.
    pub fn get_internal_id(&mut self, ext: ExtId) -> IntId {
        if let Some(&id) = self.map.get(&ext) {
            return id;
        }
        let id = self.remap.len() as IntId;
        self.map.insert(ext, id);
        self.remap.push(ext);
        self.adjacency.push(AdjacencyList::new());
        let view = GraphStoreView::new(self.config.mode, &self.pages, &self.adjacency, &self.remap);
        self.callbacks.node_alloc(&view, id);
        id
    }

    /// Pushes one edge (spec.md §4.4). Synchronous and single-threaded.
    pub fn push(&mut self, ext_tail: ExtId, ext_head: ExtId) {
        let t = self.get_internal_id(ext_tail);
        let h = self.get_internal_id(ext_head);
        self.insert_adjacency(t, h);

        self.batch.push(Edge::new(t, h));
        if self.batch.len() == self.config.batch_size {
            self.flush_batch();
        }

        self.num_pushed += 1;
        if self.num_pushed % 10_000 == 0 {
            tracing::info!(
                edges_read = self.num_pushed,
                free_buffers = self.pool.num_free(),
                total_buffers = self.pool.capacity(),
                "ingest progress"
            );
        }
    }

    fn flush_batch(&mut self) {
        let view = GraphStoreView::new(self.config.mode, &self.pages, &self.adjacency, &self.remap);
        self.callbacks.insert_batch(&view, &self.batch);
        self.batch.clear();
    }

    fn insert_adjacency(&mut self, t: IntId, h: IntId) {
        let page = match self.lru.back() {
            Some(&idx) if !self.pages[idx].as_ref().expect("live page").is_full() => idx,
            _ => self.new_page(),
        };

        self.pages[page]
            .as_mut()
            .expect("live page")
            .append(Edge::new(t, h));

        self.adjacency[t as usize].attach(page);
        if self.config.mode == EdgeMode::Undirected {
            self.adjacency[h as usize].attach(page);
        }
    }

    /// The eviction protocol of spec.md §4.4: ask the pool for a fresh
    /// buffer; if none remains, evict the LRU-oldest page, notify the
    /// engine with its contents, repair adjacency chains that referenced
    /// it, and recycle its buffer handle in place.
    fn new_page(&mut self) -> PageRef {
        if let Some(handle) = self.pool.next_buffer() {
            let page = EdgePage::new(handle, self.config.page_capacity());
            let idx = self.pages.len();
            self.pages.push(Some(page));
            self.lru.push_back(idx);
            return idx;
        }

        let victim = self
            .lru
            .pop_front()
            .expect("buffer pool exhausted with no live pages to evict");

        let evicted: Vec<Edge> = self.pages[victim]
            .as_ref()
            .expect("live page")
            .iter()
            .copied()
            .collect();

        {
            let view =
                GraphStoreView::new(self.config.mode, &self.pages, &self.adjacency, &self.remap);
            self.callbacks.remove_batch(&view, &evicted);
        }

        for edge in &evicted {
            self.adjacency[edge.tail as usize].detach_first_if(victim);
            if self.config.mode == EdgeMode::Undirected {
                self.adjacency[edge.head as usize].detach_first_if(victim);
            }
        }

        let handle = self.pages[victim].as_ref().expect("live page").handle();
        self.pages[victim] = Some(EdgePage::new(handle, self.config.page_capacity()));
        self.lru.push_back(victim);
        victim
    }

    pub fn neighbors(&self, n: IntId) -> Vec<IntId> {
        self.view().neighbors(n)
    }

    /// Flushes any partial batch, frees every node's state via `node_free`
    /// in ascending `IntId` order (spec.md §4.4), and consumes the store.
    /// Pages and adjacency lists are dropped with `self`; there is nothing
    /// left to explicitly release once `node_free` has run.
    pub fn close(mut self) -> C {
        if !self.batch.is_empty() {
            self.flush_batch();
        }

        let num_nodes = self.adjacency.len();
        for id in 0..num_nodes as IntId {
            let view =
                GraphStoreView::new(self.config.mode, &self.pages, &self.adjacency, &self.remap);
            self.callbacks.node_free(&view, id);
        }

        self.callbacks
    }
}
