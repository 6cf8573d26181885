//! The [`PathFinder`] façade: synchronous or tick-driven path requests over
//! one owned [`GraphData`].

use std::fmt;

use log::Level;
use waygraph_core::{CancelToken, Position};

use crate::config::FinderConfig;
use crate::diag::Diagnostics;
use crate::error::SearchFailure;
use crate::graph::{GraphData, NodeId, PathId};
use crate::search::{Route, Search, SearchStatus};
use crate::traits::{Euclidean, Heuristic};

/// How a request is executed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Execution {
    /// Run to completion inside the call. Blocks for the whole search, so
    /// keep it for small graphs.
    Synchronous,
    /// Run a few steps per [`PathFinder::tick`] until the search ends.
    Incremental,
}

/// Completion callback: `Some(route)` on success, `None` on any failure.
pub type Callback = Box<dyn FnOnce(Option<Route>)>;

/// Handle to a submitted request.
///
/// Cancelling an incremental request drops it at the next tick without
/// invoking its callback. Cancelling a finished request has no effect.
#[derive(Clone, Debug)]
pub struct SearchHandle {
    id: u64,
    token: CancelToken,
}

impl SearchHandle {
    /// Identifier unique within the issuing finder.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Request cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

enum JobState<H> {
    Running(Search<H>),
    // Rejected up front; reported on the next tick.
    Rejected(SearchFailure),
}

struct Job<H> {
    id: u64,
    from: NodeId,
    to: NodeId,
    token: CancelToken,
    state: JobState<H>,
    callback: Callback,
}

/// Entry point for path requests.
///
/// Owns the graph, answers synchronous requests on the spot and keeps
/// incremental requests as independent jobs advanced by [`tick`](Self::tick).
/// Every request invokes its callback exactly once unless it is cancelled.
pub struct PathFinder<H = Euclidean> {
    graph: GraphData,
    config: FinderConfig,
    diag: Diagnostics,
    heuristic: H,
    jobs: Vec<Job<H>>,
    next_job: u64,
    ticks: u64,
}

impl PathFinder<Euclidean> {
    /// Create a finder guided by straight-line distance.
    pub fn new(graph: GraphData, config: FinderConfig) -> Self {
        Self::with_heuristic(graph, config, Euclidean)
    }
}

impl<H: Heuristic + Clone> PathFinder<H> {
    /// Create a finder with a custom heuristic.
    pub fn with_heuristic(graph: GraphData, config: FinderConfig, heuristic: H) -> Self {
        let diag = Diagnostics::new(config.log_level);
        Self {
            graph,
            config,
            diag,
            heuristic,
            jobs: Vec::new(),
            next_job: 0,
            ticks: 0,
        }
    }

    /// The graph being searched.
    #[inline]
    pub fn graph(&self) -> &GraphData {
        &self.graph
    }

    /// Mutable access for structural edits. Adding or removing nodes or paths
    /// fails every incremental job still in flight.
    #[inline]
    pub fn graph_mut(&mut self) -> &mut GraphData {
        &mut self.graph
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Number of ticks run so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of incremental jobs waiting for ticks.
    #[inline]
    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Whether no incremental job is waiting.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    // -----------------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------------

    /// Find the cheapest route from `from` to `to`.
    ///
    /// With [`Execution::Synchronous`] the callback runs before this returns.
    /// With [`Execution::Incremental`] it runs during the [`tick`](Self::tick)
    /// on which the search terminates. Unknown identities are reported as
    /// `None`, never as a panic.
    pub fn find_shortest_path<F>(
        &mut self,
        from: NodeId,
        to: NodeId,
        execution: Execution,
        on_complete: F,
    ) -> SearchHandle
    where
        F: FnOnce(Option<Route>) + 'static,
    {
        let handle = SearchHandle {
            id: self.next_job,
            token: CancelToken::new(),
        };
        self.next_job += 1;

        match execution {
            Execution::Synchronous => {
                self.diag.info(format_args!(
                    "synchronous search triggered from {from} to {to}"
                ));
                let outcome = self.find_route(from, to);
                on_complete(outcome);
            }
            Execution::Incremental => {
                self.diag.info(format_args!(
                    "incremental search triggered from {from} to {to}"
                ));
                self.graph.regenerate_ids();
                let state =
                    match Search::with_heuristic(&self.graph, from, to, self.heuristic.clone()) {
                        Ok(search) => JobState::Running(search),
                        Err(failure) => JobState::Rejected(failure),
                    };
                self.jobs.push(Job {
                    id: handle.id,
                    from,
                    to,
                    token: handle.token.clone(),
                    state,
                    callback: Box::new(on_complete),
                });
            }
        }
        handle
    }

    /// Blocking search that returns the route directly.
    pub fn find_route(&mut self, from: NodeId, to: NodeId) -> Option<Route> {
        self.graph.regenerate_ids();
        let outcome = self
            .graph
            .shortest_path(from, to, self.heuristic.clone());
        report(&self.diag, from, to, outcome)
    }

    /// Blocking search returning only the positions to steer through.
    pub fn find_route_positions(&mut self, from: NodeId, to: NodeId) -> Option<Vec<Position>> {
        self.find_route(from, to).map(|route| route.positions())
    }

    /// Cancel a pending request and drop its job right away.
    pub fn cancel(&mut self, handle: &SearchHandle) {
        handle.cancel();
        self.jobs.retain(|job| job.id != handle.id);
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    /// Advance every incremental job by `steps_per_tick` steps and fire the
    /// callbacks of the jobs that terminated. Returns how many completed.
    pub fn tick(&mut self) -> usize {
        self.ticks += 1;
        let steps = self.config.steps_per_tick.max(1);

        let mut done: Vec<(Callback, Option<Route>)> = Vec::new();
        for mut job in std::mem::take(&mut self.jobs) {
            if job.token.is_cancelled() {
                self.diag.emit(
                    Level::Debug,
                    format_args!("search {} from {} to {} cancelled", job.id, job.from, job.to),
                );
                continue;
            }
            match advance(&self.graph, &mut job.state, steps) {
                Some(outcome) => {
                    let route = report(&self.diag, job.from, job.to, outcome);
                    done.push((job.callback, route));
                }
                None => self.jobs.push(job),
            }
        }

        let completed = done.len();
        for (callback, route) in done {
            callback(route);
        }
        completed
    }

    /// Tick until no job is pending or `max_ticks` ticks have run. Returns
    /// the number of ticks spent.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut spent = 0;
        while !self.is_idle() && spent < max_ticks {
            self.tick();
            spent += 1;
        }
        spent
    }

    // -----------------------------------------------------------------------
    // Graph queries and edits
    // -----------------------------------------------------------------------

    /// Identity of the node closest to `point`, or `None` for an empty graph.
    pub fn find_nearest_node(&self, point: Position) -> Option<NodeId> {
        let nearest = self.graph.find_nearest_node(point);
        if nearest.is_none() {
            self.diag
                .warn(format_args!("nearest node to {point} requested on an empty graph"));
        }
        nearest
    }

    /// Open or close a node. Unknown identities are logged and ignored.
    pub fn enable_node(&mut self, id: NodeId, enabled: bool) {
        if let Err(e) = self.graph.set_node_open(id, enabled) {
            self.diag.error(format_args!("enable node: {e}"));
        }
    }

    /// Open or close a path. Unknown identities are logged and ignored.
    pub fn enable_path(&mut self, id: PathId, enabled: bool) {
        if let Err(e) = self.graph.set_path_open(id, enabled) {
            self.diag.error(format_args!("enable path: {e}"));
        }
    }
}

impl<H> fmt::Debug for PathFinder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFinder")
            .field("nodes", &self.graph.len())
            .field("paths", &self.graph.path_count())
            .field("pending", &self.jobs.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

/// Run up to `steps` steps; `Some` once the job terminated.
fn advance<H: Heuristic>(
    graph: &GraphData,
    state: &mut JobState<H>,
    steps: usize,
) -> Option<Result<Route, SearchFailure>> {
    let search = match state {
        JobState::Running(search) => search,
        JobState::Rejected(failure) => return Some(Err(failure.clone())),
    };
    for _ in 0..steps {
        match search.step(graph) {
            SearchStatus::Pending => {}
            SearchStatus::Found(route) => return Some(Ok(route)),
            SearchStatus::Failed(failure) => return Some(Err(failure)),
        }
    }
    None
}

/// Log the outcome of a search and flatten it for the callback.
fn report(
    diag: &Diagnostics,
    from: NodeId,
    to: NodeId,
    outcome: Result<Route, SearchFailure>,
) -> Option<Route> {
    match outcome {
        Ok(route) => {
            diag.info(format_args!("path found between {from} and {to}: {route}"));
            Some(route)
        }
        Err(failure @ SearchFailure::Finished) => {
            diag.error(format_args!("search from {from} to {to}: {failure}"));
            None
        }
        Err(failure) => {
            diag.warn(format_args!("{failure}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use rand::{RngExt, SeedableRng};

    type Slot = Rc<RefCell<Vec<Option<Vec<u32>>>>>;

    fn recorder() -> (Slot, impl Fn() -> Box<dyn FnOnce(Option<Route>)>) {
        let slot: Slot = Rc::new(RefCell::new(Vec::new()));
        let s = slot.clone();
        let make = move || {
            let s = s.clone();
            Box::new(move |route: Option<Route>| {
                s.borrow_mut()
                    .push(route.map(|r| r.ids().map(|id| id.0).collect()));
            }) as Box<dyn FnOnce(Option<Route>)>
        };
        (slot, make)
    }

    /// 0 - 1 - 2 on the x axis, unit costs.
    fn line_finder() -> PathFinder {
        let mut g = GraphData::new();
        for x in 0..3 {
            g.add_node(Position::new(x as f32, 0.0, 0.0)).unwrap();
        }
        g.add_path(NodeId(0), NodeId(1), 1.0).unwrap();
        g.add_path(NodeId(1), NodeId(2), 1.0).unwrap();
        PathFinder::new(g, FinderConfig::default())
    }

    #[test]
    fn synchronous_callback_runs_before_return() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Synchronous, make());
        assert_eq!(*slot.borrow(), vec![Some(vec![0, 1, 2])]);
        assert!(finder.is_idle());
    }

    #[test]
    fn incremental_runs_one_step_per_tick() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        assert!(slot.borrow().is_empty());
        assert_eq!(finder.pending(), 1);

        // Settles 0, then 1, then reaches 2 on the third tick.
        assert_eq!(finder.tick(), 0);
        assert_eq!(finder.tick(), 0);
        assert!(slot.borrow().is_empty());
        assert_eq!(finder.tick(), 1);
        assert_eq!(*slot.borrow(), vec![Some(vec![0, 1, 2])]);
        assert!(finder.is_idle());
        assert_eq!(finder.ticks(), 3);
    }

    #[test]
    fn steps_per_tick_speeds_up_jobs() {
        let mut g = GraphData::new();
        for x in 0..3 {
            g.add_node(Position::new(x as f32, 0.0, 0.0)).unwrap();
        }
        g.add_path(NodeId(0), NodeId(1), 1.0).unwrap();
        g.add_path(NodeId(1), NodeId(2), 1.0).unwrap();
        let mut finder = PathFinder::new(g, FinderConfig::default().with_steps_per_tick(8));
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        assert_eq!(finder.tick(), 1);
        assert_eq!(slot.borrow().len(), 1);
    }

    #[test]
    fn closed_node_fails_in_both_modes() {
        let mut finder = line_finder();
        finder.enable_node(NodeId(1), false);
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Synchronous, make());
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        assert_eq!(finder.run_until_idle(100), 2);
        assert_eq!(*slot.borrow(), vec![None, None]);
    }

    #[test]
    fn one_way_scenario() {
        let mut g = GraphData::new();
        for x in 0..3 {
            g.add_node(Position::new(x as f32, 0.0, 0.0)).unwrap();
        }
        g.add_one_way_path(NodeId(0), NodeId(1), 1.0).unwrap();
        g.add_path(NodeId(1), NodeId(2), 1.0).unwrap();
        let mut finder = PathFinder::new(g, FinderConfig::default());

        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(1), NodeId(0), Execution::Synchronous, make());
        finder.find_shortest_path(NodeId(0), NodeId(1), Execution::Synchronous, make());
        assert_eq!(*slot.borrow(), vec![None, Some(vec![0, 1])]);
    }

    #[test]
    fn invalid_ids_report_none_once() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(99), Execution::Synchronous, make());
        finder.find_shortest_path(NodeId(99), NodeId(0), Execution::Incremental, make());
        assert_eq!(slot.borrow().len(), 1);
        assert_eq!(finder.tick(), 1);
        assert_eq!(*slot.borrow(), vec![None, None]);
        assert_eq!(finder.tick(), 0);
        assert_eq!(slot.borrow().len(), 2);
    }

    #[test]
    fn cancelled_job_never_calls_back() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        let handle = finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        finder.tick();
        finder.cancel(&handle);
        assert!(handle.is_cancelled());
        finder.run_until_idle(10);
        assert!(finder.is_idle());
        assert!(slot.borrow().is_empty());
    }

    #[test]
    fn handles_are_distinct() {
        let mut finder = line_finder();
        let a = finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, |_| {});
        let b = finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Synchronous, |_| {});
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn concurrent_jobs_are_independent() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        finder.find_shortest_path(NodeId(2), NodeId(0), Execution::Incremental, make());
        finder.find_shortest_path(NodeId(1), NodeId(1), Execution::Incremental, make());
        finder.run_until_idle(100);
        let mut got = slot.borrow().clone();
        got.sort();
        assert_eq!(
            got,
            vec![Some(vec![0, 1, 2]), Some(vec![1]), Some(vec![2, 1, 0])]
        );
    }

    #[test]
    fn structural_edit_fails_pending_jobs() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        finder.tick();
        finder.graph_mut().add_node(Position::new(5.0, 0.0, 0.0)).unwrap();
        finder.tick();
        assert_eq!(*slot.borrow(), vec![None]);
    }

    #[test]
    fn closing_mid_search_is_observed() {
        let mut finder = line_finder();
        let (slot, make) = recorder();
        finder.find_shortest_path(NodeId(0), NodeId(2), Execution::Incremental, make());
        finder.tick();
        finder.enable_path(PathId(1), false);
        finder.run_until_idle(10);
        assert_eq!(*slot.borrow(), vec![None]);
    }

    #[test]
    fn unknown_enable_targets_are_ignored() {
        let mut finder = line_finder();
        finder.enable_node(NodeId(42), false);
        finder.enable_path(PathId(42), false);
        assert!(finder.graph().nodes().iter().all(|n| n.is_open));
        assert!(finder.graph().paths().iter().all(|p| p.is_open));
    }

    #[test]
    fn nearest_node_scenario() {
        let mut g = GraphData::new();
        let a = g.add_node(Position::new(0.0, 0.0, 0.0)).unwrap();
        g.add_node(Position::new(10.0, 0.0, 0.0)).unwrap();
        let finder = PathFinder::new(g, FinderConfig::default());
        assert_eq!(finder.find_nearest_node(Position::new(1.0, 0.0, 0.0)), Some(a));

        let empty = PathFinder::new(GraphData::new(), FinderConfig::default());
        assert_eq!(empty.find_nearest_node(Position::ZERO), None);
    }

    #[test]
    fn route_positions() {
        let mut finder = line_finder();
        let points = finder.find_route_positions(NodeId(2), NodeId(0)).unwrap();
        assert_eq!(points.first(), Some(&Position::new(2.0, 0.0, 0.0)));
        assert_eq!(points.last(), Some(&Position::ZERO));
    }

    #[test]
    fn synchronous_and_incremental_agree() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut g = GraphData::new();
        for _ in 0..80 {
            g.add_node(Position::new(
                rng.random_range(0.0..50.0),
                rng.random_range(0.0..50.0),
                0.0,
            )).unwrap();
        }
        for _ in 0..200 {
            let a = NodeId(rng.random_range(0..80));
            let b = NodeId(rng.random_range(0..80));
            let d = g.node(a).unwrap().position.distance(g.node(b).unwrap().position);
            g.add_path(a, b, d + rng.random_range(0.0..3.0)).unwrap();
        }
        let mut finder = PathFinder::new(g, FinderConfig::default());

        let sync: Rc<RefCell<Vec<Option<f32>>>> = Rc::default();
        let incr: Rc<RefCell<Vec<Option<f32>>>> = Rc::default();
        for _ in 0..30 {
            let from = NodeId(rng.random_range(0..80));
            let to = NodeId(rng.random_range(0..80));
            let s = sync.clone();
            finder.find_shortest_path(from, to, Execution::Synchronous, move |r| {
                s.borrow_mut().push(r.map(|r| r.cost()));
            });
            let s = incr.clone();
            finder.find_shortest_path(from, to, Execution::Incremental, move |r| {
                s.borrow_mut().push(r.map(|r| r.cost()));
            });
            finder.run_until_idle(10_000);
        }
        assert_eq!(*sync.borrow(), *incr.borrow());
        assert_eq!(sync.borrow().len(), 30);
    }
}
