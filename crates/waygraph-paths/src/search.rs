use std::collections::BinaryHeap;
use std::fmt;

use waygraph_core::Position;

use crate::error::SearchFailure;
use crate::graph::{GraphData, Node, NodeId};
use crate::traits::{Euclidean, Heuristic};

/// Back-pointer of the start node.
const NO_PARENT: usize = usize::MAX;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// A successful search result: the nodes to walk, start first, goal last.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    nodes: Vec<Node>,
    cost: f32,
}

impl Route {
    /// The nodes to traverse, including both endpoints. Never empty.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Sum of the costs of the traversed paths.
    #[inline]
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Number of nodes on the route.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a route holds at least its start node.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The first node.
    #[inline]
    pub fn start(&self) -> &Node {
        &self.nodes[0]
    }

    /// The last node.
    #[inline]
    pub fn goal(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Node identities in walking order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(|n| n.id)
    }

    /// Node positions in walking order, for followers that steer by points.
    pub fn positions(&self) -> Vec<Position> {
        self.nodes.iter().map(|n| n.position).collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.ids().enumerate() {
            if i > 0 {
                f.write_str("=>")?;
            }
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Search-local scratch
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mark {
    Unseen,
    Frontier,
    Explored,
}

/// Per-node search state, indexed by dense node index.
#[derive(Clone)]
struct Scratch {
    /// Cost from the start node.
    g: f32,
    /// Estimated cost to the goal, negative until computed.
    h: f32,
    parent: usize,
    /// Sequence number of the live frontier entry.
    seq: u64,
    mark: Mark,
}

impl Default for Scratch {
    fn default() -> Self {
        Self {
            g: f32::INFINITY,
            h: -1.0,
            parent: NO_PARENT,
            seq: 0,
            mark: Mark::Unseen,
        }
    }
}

/// Reference into the scratch arena, ordered by combined heuristic for use in
/// `BinaryHeap`.
#[derive(Clone, Copy)]
struct FrontierRef {
    idx: usize,
    f: f32,
    seq: u64,
}

impl Ord for FrontierRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Reverse so BinaryHeap (max-heap) pops smallest f first, then the
        // earliest pushed entry.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierRef {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for FrontierRef {}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Outcome of one [`Search::step`].
#[derive(Clone, Debug, PartialEq)]
pub enum SearchStatus {
    /// One node was settled; call `step` again.
    Pending,
    /// The goal was reached.
    Found(Route),
    /// The search ended without a route.
    Failed(SearchFailure),
}

impl SearchStatus {
    /// Whether the search needs more steps.
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// A resumable best-first search between two nodes.
///
/// All per-node state (cost so far, heuristic, back-pointer, frontier and
/// explored membership) lives in the search itself, so any number of searches
/// may run interleaved over the same [`GraphData`]. The graph is passed to
/// every [`step`](Self::step); open/closed flags are read as they are at that
/// moment.
///
/// Each step settles exactly one node: the frontier node with the lowest
/// `path_distance + heuristic`. Ties go to the node whose frontier entry was
/// pushed first (a relaxed node counts as pushed at its relaxation).
pub struct Search<H = Euclidean> {
    heuristic: H,
    from: NodeId,
    to: NodeId,
    start: usize,
    goal: usize,
    goal_pos: Position,
    revision: u64,
    scratch: Vec<Scratch>,
    frontier: BinaryHeap<FrontierRef>,
    seq: u64,
    open: usize,
    explored: usize,
    steps: usize,
    finished: bool,
}

impl Search<Euclidean> {
    /// Prepare a search guided by straight-line distance.
    pub fn new(graph: &GraphData, from: NodeId, to: NodeId) -> Result<Self, SearchFailure> {
        Self::with_heuristic(graph, from, to, Euclidean)
    }
}

impl<H: Heuristic> Search<H> {
    /// Prepare a search with a custom heuristic.
    ///
    /// The graph must have been indexed with
    /// [`GraphData::regenerate_ids`] since its last structural edit.
    pub fn with_heuristic(
        graph: &GraphData,
        from: NodeId,
        to: NodeId,
        heuristic: H,
    ) -> Result<Self, SearchFailure> {
        if !graph.is_indexed() {
            return Err(SearchFailure::GraphChanged);
        }
        let (Some(start), Some(goal)) = (graph.dense_index(from), graph.dense_index(to)) else {
            return Err(SearchFailure::InvalidRequest { from, to });
        };
        let goal_pos = graph.node_at(goal).position;

        let mut search = Self {
            heuristic,
            from,
            to,
            start,
            goal,
            goal_pos,
            revision: graph.revision(),
            scratch: vec![Scratch::default(); graph.len()],
            frontier: BinaryHeap::new(),
            seq: 0,
            open: 1,
            explored: 0,
            steps: 0,
            finished: false,
        };

        let h = search
            .heuristic
            .estimate(graph.node_at(start).position, goal_pos);
        let s = &mut search.scratch[start];
        s.g = 0.0;
        s.h = h;
        search.push(start);
        Ok(search)
    }

    /// Start node identity.
    #[inline]
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Goal node identity.
    #[inline]
    pub fn to(&self) -> NodeId {
        self.to
    }

    /// Number of nodes settled so far.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether the search already reported its outcome.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of discovered but unsettled nodes.
    #[inline]
    pub fn frontier_len(&self) -> usize {
        self.open
    }

    /// Number of settled nodes.
    #[inline]
    pub fn explored_len(&self) -> usize {
        self.explored
    }

    /// Best known cost from the start to `id`, if the search reached it.
    pub fn path_distance(&self, graph: &GraphData, id: NodeId) -> Option<f32> {
        let s = self.scratch.get(graph.dense_index(id)?)?;
        (s.mark != Mark::Unseen).then_some(s.g)
    }

    /// Whether `id` has been settled.
    pub fn is_explored(&self, graph: &GraphData, id: NodeId) -> bool {
        graph
            .dense_index(id)
            .and_then(|i| self.scratch.get(i))
            .is_some_and(|s| s.mark == Mark::Explored)
    }

    /// Settle one node.
    ///
    /// Returns [`SearchStatus::Pending`] until the goal is reached or the
    /// frontier is exhausted. Once a terminal status has been returned, every
    /// further call fails with [`SearchFailure::Finished`].
    pub fn step(&mut self, graph: &GraphData) -> SearchStatus {
        if self.finished {
            return SearchStatus::Failed(SearchFailure::Finished);
        }
        if graph.revision() != self.revision || !graph.is_indexed() {
            return self.fail(SearchFailure::GraphChanged);
        }

        let Some(current) = self.pop() else {
            return self.fail(SearchFailure::NoPathExists {
                from: self.from,
                to: self.to,
            });
        };
        self.steps += 1;

        if current == self.goal {
            self.finished = true;
            self.frontier.clear();
            return SearchStatus::Found(self.reconstruct(graph));
        }

        self.expand(graph, current);

        self.scratch[current].mark = Mark::Explored;
        self.open -= 1;
        self.explored += 1;
        SearchStatus::Pending
    }

    /// Step until the search terminates.
    pub fn run(&mut self, graph: &GraphData) -> Result<Route, SearchFailure> {
        loop {
            match self.step(graph) {
                SearchStatus::Pending => {}
                SearchStatus::Found(route) => return Ok(route),
                SearchStatus::Failed(failure) => return Err(failure),
            }
        }
    }

    fn push(&mut self, idx: usize) {
        let s = &mut self.scratch[idx];
        s.seq = self.seq;
        s.mark = Mark::Frontier;
        self.frontier.push(FrontierRef {
            idx,
            f: s.g + s.h,
            seq: self.seq,
        });
        self.seq += 1;
    }

    /// Pop the best live frontier entry, skipping entries superseded by a
    /// relaxation.
    fn pop(&mut self) -> Option<usize> {
        while let Some(entry) = self.frontier.pop() {
            let s = &self.scratch[entry.idx];
            if s.mark == Mark::Frontier && s.seq == entry.seq {
                return Some(entry.idx);
            }
        }
        None
    }

    fn expand(&mut self, graph: &GraphData, current: usize) {
        let node = graph.node_at(current);
        let current_g = self.scratch[current].g;

        for &pi in graph.incident(current) {
            let path = graph.path_at(pi);
            if !path.is_open || !path.can_leave(node.id) {
                continue;
            }
            let Some(oi) = path.other(node.id).and_then(|id| graph.dense_index(id)) else {
                continue;
            };
            let other = graph.node_at(oi);
            if !other.is_open {
                continue;
            }

            let s = &mut self.scratch[oi];
            if s.mark == Mark::Explored {
                continue;
            }
            if s.h < 0.0 {
                s.h = self.heuristic.estimate(other.position, self.goal_pos);
            }

            let tentative = current_g + path.cost;
            match s.mark {
                Mark::Frontier if tentative < s.g => {}
                Mark::Frontier | Mark::Explored => continue,
                Mark::Unseen => self.open += 1,
            }
            s.g = tentative;
            s.parent = current;
            self.push(oi);
        }
    }

    fn reconstruct(&self, graph: &GraphData) -> Route {
        let mut nodes = Vec::new();
        let mut ci = self.goal;
        while ci != NO_PARENT {
            nodes.push(graph.node_at(ci).clone());
            ci = self.scratch[ci].parent;
        }
        nodes.reverse();
        debug_assert_eq!(nodes.first().map(|n| n.id), Some(self.from));
        Route {
            nodes,
            cost: self.scratch[self.goal].g,
        }
    }

    fn fail(&mut self, failure: SearchFailure) -> SearchStatus {
        self.finished = true;
        self.frontier.clear();
        SearchStatus::Failed(failure)
    }
}

impl GraphData {
    /// Run a search to completion.
    ///
    /// The graph must be indexed (see [`regenerate_ids`](Self::regenerate_ids)).
    pub fn shortest_path<H: Heuristic>(
        &self,
        from: NodeId,
        to: NodeId,
        heuristic: H,
    ) -> Result<Route, SearchFailure> {
        Search::with_heuristic(self, from, to, heuristic)?.run(self)
    }
}
