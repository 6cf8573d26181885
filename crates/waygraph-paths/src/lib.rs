//! Shortest paths over waypoint graphs.
//!
//! A waypoint graph is a set of [`Node`]s placed in 3-D space and linked by
//! weighted [`Path`]s. Paths may be one-way, and both nodes and paths can be
//! closed and reopened at runtime without rebuilding anything.
//!
//! - [`GraphData`] owns the nodes and paths and indexes them by identity.
//! - [`Search`] is a resumable best-first search guided by a [`Heuristic`]
//!   (straight-line distance by default). It settles one node per
//!   [`step`](Search::step) and keeps all of its bookkeeping to itself, so
//!   searches never interfere with one another.
//! - [`PathFinder`] is the façade most callers want: it runs a request either
//!   to completion on the spot ([`Execution::Synchronous`]) or a step per
//!   [`tick`](PathFinder::tick) ([`Execution::Incremental`]), and reports the
//!   result through a callback.
//!
//! ```
//! use waygraph_core::Position;
//! use waygraph_paths::{Execution, FinderConfig, GraphData, PathFinder};
//!
//! let mut graph = GraphData::new();
//! let a = graph.add_node(Position::new(0.0, 0.0, 0.0)).unwrap();
//! let b = graph.add_node(Position::new(1.0, 0.0, 0.0)).unwrap();
//! let c = graph.add_node(Position::new(2.0, 0.0, 0.0)).unwrap();
//! graph.add_path(a, b, 1.0).unwrap();
//! graph.add_path(b, c, 1.0).unwrap();
//!
//! let mut finder = PathFinder::new(graph, FinderConfig::default());
//! finder.find_shortest_path(a, c, Execution::Synchronous, |route| {
//!     let route = route.expect("a route");
//!     assert_eq!(route.cost(), 2.0);
//! });
//! ```
//!
//! # Heuristics
//!
//! | Type | Behaviour |
//! |---|---|
//! | [`Euclidean`] | A*; optimal when no path is cheaper than the distance it spans |
//! | [`Zero`] | Dijkstra; optimal for any non-negative costs |

mod config;
mod diag;
mod distance;
mod error;
mod finder;
mod graph;
mod nearest;
mod search;
mod traits;

pub use config::FinderConfig;
pub use diag::LOG_TARGET;
pub use distance::euclidean;
pub use error::{GraphError, SearchFailure};
pub use finder::{Callback, Execution, PathFinder, SearchHandle};
pub use graph::{GraphData, Node, NodeId, Path, PathId};
pub use search::{Route, Search, SearchStatus};
pub use traits::{Euclidean, Heuristic, Zero};
