use std::collections::HashMap;
use std::fmt;

use waygraph_core::Position;

use crate::error::GraphError;

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

/// Stable identity of a [`Node`], unique within one [`GraphData`].
///
/// Identities need not be contiguous; the dense search index is internal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct NodeId(pub u32);

/// Stable identity of a [`Path`], unique within one [`GraphData`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
pub struct PathId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Node / Path
// ---------------------------------------------------------------------------

/// A graph vertex: a named location in space.
///
/// A closed node stays in the graph but is never entered by a search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    pub is_open: bool,
}

impl Node {
    /// Create an open node.
    pub fn new(id: NodeId, position: Position) -> Self {
        Self {
            id,
            position,
            is_open: true,
        }
    }
}

/// A weighted link between two nodes.
///
/// One-way paths can only be walked from `endpoint_a` to `endpoint_b`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub id: PathId,
    pub endpoint_a: NodeId,
    pub endpoint_b: NodeId,
    pub cost: f32,
    pub is_one_way: bool,
    pub is_open: bool,
}

impl Path {
    /// Create an open, bidirectional path.
    pub fn new(id: PathId, a: NodeId, b: NodeId, cost: f32) -> Self {
        Self {
            id,
            endpoint_a: a,
            endpoint_b: b,
            cost,
            is_one_way: false,
            is_open: true,
        }
    }

    /// Create an open path that can only be walked from `a` to `b`.
    pub fn one_way(id: PathId, a: NodeId, b: NodeId, cost: f32) -> Self {
        Self {
            is_one_way: true,
            ..Self::new(id, a, b, cost)
        }
    }

    /// Whether `node` is one of the endpoints.
    #[inline]
    pub fn touches(&self, node: NodeId) -> bool {
        self.endpoint_a == node || self.endpoint_b == node
    }

    /// The endpoint opposite to `node`, or `None` if `node` is not an endpoint.
    #[inline]
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if node == self.endpoint_a {
            Some(self.endpoint_b)
        } else if node == self.endpoint_b {
            Some(self.endpoint_a)
        } else {
            None
        }
    }

    /// Whether a walker standing on `node` may take this path, ignoring
    /// open/closed state.
    #[inline]
    pub fn can_leave(&self, node: NodeId) -> bool {
        if self.is_one_way {
            node == self.endpoint_a
        } else {
            self.touches(node)
        }
    }
}

// ---------------------------------------------------------------------------
// GraphData
// ---------------------------------------------------------------------------

/// Owner of every [`Node`] and [`Path`] of a waypoint graph.
///
/// Searches address nodes through a dense index built by
/// [`regenerate_ids`](Self::regenerate_ids). Adding or removing nodes or
/// paths bumps a structural revision and invalidates that index until the next
/// regeneration; toggling open/closed flags does not.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    nodes: Vec<Node>,
    paths: Vec<Path>,
    // identity -> dense index, valid while `indexed_revision == Some(revision)`
    nodes_sorted: HashMap<NodeId, usize>,
    paths_sorted: HashMap<PathId, usize>,
    // dense node index -> indices into `paths`, in path order
    incident: Vec<Vec<usize>>,
    revision: u64,
    indexed_revision: Option<u64>,
    // one past the highest identity ever stored, may reach `u32::MAX + 1`
    next_node_id: u64,
    next_path_id: u64,
}

impl GraphData {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes and paths produced by a loader, validating
    /// identities, endpoints and costs. The returned graph is already indexed.
    pub fn from_parts(nodes: Vec<Node>, paths: Vec<Path>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in nodes {
            graph.insert_node(node)?;
        }
        for path in paths {
            graph.insert_path(path)?;
        }
        graph.regenerate_ids();
        Ok(graph)
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of paths.
    #[inline]
    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// All nodes, sorted by identity once the graph is indexed.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All paths, sorted by identity once the graph is indexed.
    #[inline]
    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Structural revision, bumped by every add/remove.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether the identity index matches the current structure.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed_revision == Some(self.revision)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Look up a node by identity.
    pub fn node(&self, id: NodeId) -> Result<&Node, GraphError> {
        self.node_slot(id)
            .map(|i| &self.nodes[i])
            .ok_or(GraphError::NodeNotFound(id))
    }

    /// Look up a path by identity.
    pub fn path(&self, id: PathId) -> Result<&Path, GraphError> {
        self.path_slot(id)
            .map(|i| &self.paths[i])
            .ok_or(GraphError::PathNotFound(id))
    }

    /// Paths with `id` as one of their endpoints, in path order.
    pub fn paths_of(&self, id: NodeId) -> impl Iterator<Item = &Path> + '_ {
        self.paths.iter().filter(move |p| p.touches(id))
    }

    fn node_slot(&self, id: NodeId) -> Option<usize> {
        if self.is_indexed() {
            self.nodes_sorted.get(&id).copied()
        } else {
            self.nodes.iter().position(|n| n.id == id)
        }
    }

    fn path_slot(&self, id: PathId) -> Option<usize> {
        if self.is_indexed() {
            self.paths_sorted.get(&id).copied()
        } else {
            self.paths.iter().position(|p| p.id == id)
        }
    }

    // -----------------------------------------------------------------------
    // Open / closed state
    // -----------------------------------------------------------------------

    /// Open or close a node. Searches already in flight see the new state
    /// the next time they examine the node.
    pub fn set_node_open(&mut self, id: NodeId, open: bool) -> Result<(), GraphError> {
        let i = self.node_slot(id).ok_or(GraphError::NodeNotFound(id))?;
        self.nodes[i].is_open = open;
        Ok(())
    }

    /// Open or close a path.
    pub fn set_path_open(&mut self, id: PathId, open: bool) -> Result<(), GraphError> {
        let i = self.path_slot(id).ok_or(GraphError::PathNotFound(id))?;
        self.paths[i].is_open = open;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    /// Add an open node with a fresh identity.
    ///
    /// Fails with [`GraphError::IdsExhausted`] once `u32::MAX` has been
    /// handed out, and with [`GraphError::InvalidPosition`] for a position
    /// that is not finite.
    pub fn add_node(&mut self, position: Position) -> Result<NodeId, GraphError> {
        let id = u32::try_from(self.next_node_id).map_err(|_| GraphError::IdsExhausted)?;
        self.insert_node(Node::new(NodeId(id), position))
    }

    /// Add an open node with a caller-chosen identity.
    pub fn add_node_with_id(&mut self, id: NodeId, position: Position) -> Result<NodeId, GraphError> {
        self.insert_node(Node::new(id, position))
    }

    /// Insert a fully specified node.
    pub fn insert_node(&mut self, node: Node) -> Result<NodeId, GraphError> {
        if self.node_slot(node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if !node.position.is_finite() {
            return Err(GraphError::InvalidPosition {
                node: node.id,
                position: node.position,
            });
        }
        let id = node.id;
        self.next_node_id = self.next_node_id.max(u64::from(id.0) + 1);
        self.nodes.push(node);
        self.touch();
        Ok(id)
    }

    /// Add an open, bidirectional path with a fresh identity.
    pub fn add_path(&mut self, a: NodeId, b: NodeId, cost: f32) -> Result<PathId, GraphError> {
        self.insert_path(Path::new(self.fresh_path_id()?, a, b, cost))
    }

    /// Add an open path walkable only from `a` to `b`.
    pub fn add_one_way_path(&mut self, a: NodeId, b: NodeId, cost: f32) -> Result<PathId, GraphError> {
        self.insert_path(Path::one_way(self.fresh_path_id()?, a, b, cost))
    }

    fn fresh_path_id(&self) -> Result<PathId, GraphError> {
        u32::try_from(self.next_path_id)
            .map(PathId)
            .map_err(|_| GraphError::IdsExhausted)
    }

    /// Insert a fully specified path.
    pub fn insert_path(&mut self, path: Path) -> Result<PathId, GraphError> {
        if self.path_slot(path.id).is_some() {
            return Err(GraphError::DuplicatePath(path.id));
        }
        for node in [path.endpoint_a, path.endpoint_b] {
            if self.node_slot(node).is_none() {
                return Err(GraphError::UnknownEndpoint {
                    path: path.id,
                    node,
                });
            }
        }
        if !path.cost.is_finite() || path.cost < 0.0 {
            return Err(GraphError::InvalidCost {
                path: path.id,
                cost: path.cost,
            });
        }
        let id = path.id;
        self.next_path_id = self.next_path_id.max(u64::from(id.0) + 1);
        self.paths.push(path);
        self.touch();
        Ok(id)
    }

    /// Remove a node together with every path touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let i = self.node_slot(id).ok_or(GraphError::NodeNotFound(id))?;
        let node = self.nodes.remove(i);
        self.paths.retain(|p| !p.touches(id));
        self.touch();
        Ok(node)
    }

    /// Remove a path.
    pub fn remove_path(&mut self, id: PathId) -> Result<Path, GraphError> {
        let i = self.path_slot(id).ok_or(GraphError::PathNotFound(id))?;
        let path = self.paths.remove(i);
        self.touch();
        Ok(path)
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    /// Rebuild the identity index.
    ///
    /// Nodes and paths are sorted by identity so that the dense index of a
    /// node is its rank among all identities. Calling this twice without a
    /// structural edit in between yields the same table.
    pub fn regenerate_ids(&mut self) {
        self.nodes.sort_by_key(|n| n.id);
        self.paths.sort_by_key(|p| p.id);

        self.nodes_sorted.clear();
        self.nodes_sorted
            .extend(self.nodes.iter().enumerate().map(|(i, n)| (n.id, i)));
        self.paths_sorted.clear();
        self.paths_sorted
            .extend(self.paths.iter().enumerate().map(|(i, p)| (p.id, i)));

        self.incident.clear();
        self.incident.resize(self.nodes.len(), Vec::new());
        for (pi, path) in self.paths.iter().enumerate() {
            let a = self.nodes_sorted.get(&path.endpoint_a).copied();
            let b = self.nodes_sorted.get(&path.endpoint_b).copied();
            if let Some(a) = a {
                self.incident[a].push(pi);
            }
            if let Some(b) = b {
                if a != Some(b) {
                    self.incident[b].push(pi);
                }
            }
        }

        self.indexed_revision = Some(self.revision);
    }

    /// Dense index of `id`. Only meaningful while [`is_indexed`](Self::is_indexed).
    #[inline]
    pub(crate) fn dense_index(&self, id: NodeId) -> Option<usize> {
        self.nodes_sorted.get(&id).copied()
    }

    #[inline]
    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    #[inline]
    pub(crate) fn path_at(&self, idx: usize) -> &Path {
        &self.paths[idx]
    }

    /// Path indices incident to the node at dense index `idx`.
    #[inline]
    pub(crate) fn incident(&self, idx: usize) -> &[usize] {
        &self.incident[idx]
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct GraphRef<'a> {
    nodes: &'a [Node],
    paths: &'a [Path],
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct GraphOwned {
    nodes: Vec<Node>,
    paths: Vec<Path>,
}

#[cfg(feature = "serde")]
impl serde::Serialize for GraphData {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        GraphRef {
            nodes: &self.nodes,
            paths: &self.paths,
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for GraphData {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = GraphOwned::deserialize(deserializer)?;
        GraphData::from_parts(raw.nodes, raw.paths).map_err(serde::de::Error::custom)
    }
}
