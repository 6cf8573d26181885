use std::fmt;

use waygraph_core::Position;

use crate::graph::{NodeId, PathId};

/// Errors raised by [`GraphData`](crate::GraphData) lookups and edits.
///
/// All of them are recoverable: the graph is left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// No node with this identity exists.
    NodeNotFound(NodeId),
    /// No path with this identity exists.
    PathNotFound(PathId),
    /// A node with this identity already exists.
    DuplicateNode(NodeId),
    /// A path with this identity already exists.
    DuplicatePath(PathId),
    /// A path references a node that does not exist.
    UnknownEndpoint { path: PathId, node: NodeId },
    /// A path cost is negative or not finite.
    InvalidCost { path: PathId, cost: f32 },
    /// A node position has a NaN or infinite coordinate.
    InvalidPosition { node: NodeId, position: Position },
    /// Every fresh identity up to `u32::MAX` has been used.
    IdsExhausted,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node {id} not found"),
            Self::PathNotFound(id) => write!(f, "path {id} not found"),
            Self::DuplicateNode(id) => write!(f, "node {id} already exists"),
            Self::DuplicatePath(id) => write!(f, "path {id} already exists"),
            Self::UnknownEndpoint { path, node } => {
                write!(f, "path {path} references unknown node {node}")
            }
            Self::InvalidCost { path, cost } => {
                write!(f, "path {path} has invalid cost {cost}")
            }
            Self::InvalidPosition { node, position } => {
                write!(f, "node {node} has invalid position {position}")
            }
            Self::IdsExhausted => write!(f, "no fresh identity left"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Why a search ended without a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFailure {
    /// The start or goal identity is not part of the graph.
    InvalidRequest { from: NodeId, to: NodeId },
    /// The frontier ran dry before reaching the goal.
    NoPathExists { from: NodeId, to: NodeId },
    /// Nodes or paths were added or removed after the search was created,
    /// or the identity index was never regenerated.
    GraphChanged,
    /// The search already reported its outcome.
    Finished,
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest { from, to } => {
                write!(f, "invalid request from {from} to {to}")
            }
            Self::NoPathExists { from, to } => write!(f, "path not found between {from} and {to}"),
            Self::GraphChanged => f.write_str("graph structure changed during the search"),
            Self::Finished => f.write_str("search already finished"),
        }
    }
}

impl std::error::Error for SearchFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_identities() {
        assert_eq!(GraphError::NodeNotFound(NodeId(7)).to_string(), "node 7 not found");
        assert_eq!(GraphError::PathNotFound(PathId(3)).to_string(), "path 3 not found");
        let e = GraphError::UnknownEndpoint {
            path: PathId(1),
            node: NodeId(9),
        };
        assert_eq!(e.to_string(), "path 1 references unknown node 9");
        let e = GraphError::InvalidPosition {
            node: NodeId(4),
            position: Position::new(f32::INFINITY, 0.0, 1.0),
        };
        assert_eq!(e.to_string(), "node 4 has invalid position (inf, 0, 1)");
        let e = SearchFailure::NoPathExists {
            from: NodeId(0),
            to: NodeId(2),
        };
        assert_eq!(e.to_string(), "path not found between 0 and 2");
    }
}
