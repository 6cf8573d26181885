use waygraph_core::Position;

use crate::distance::euclidean;
use crate::graph::{GraphData, Node, NodeId};

impl GraphData {
    /// The node closest to `point`, open or closed.
    ///
    /// Linear scan; on equal distances the first node in storage order wins.
    /// Returns `None` for an empty graph.
    pub fn find_nearest_node(&self, point: Position) -> Option<NodeId> {
        nearest(self.nodes().iter(), point)
    }

    /// The open node closest to `point`, for callers that want a usable
    /// start or goal for a search.
    pub fn find_nearest_open_node(&self, point: Position) -> Option<NodeId> {
        nearest(self.nodes().iter().filter(|n| n.is_open), point)
    }
}

fn nearest<'a>(nodes: impl Iterator<Item = &'a Node>, point: Position) -> Option<NodeId> {
    let mut best: Option<(NodeId, f32)> = None;
    for node in nodes {
        let d = euclidean(node.position, point);
        if best.is_none_or(|(_, min)| d < min) {
            best = Some((node.id, d));
        }
    }
    best.map(|(id, _)| id)
}
