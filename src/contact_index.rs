use crate::graph::Graph;
use crate::NodeId;
use fxhash::FxHashMap;

/// Neighbor and edge-identity lookups derived from a generated graph.
///
/// Adjacency lists keep edge-construction order, so neighbor iteration is
/// reproducible. The map resolves any unordered pair to the index of its one
/// canonical record in `Graph::edges`. Built once per network and never
/// partially invalidated; regeneration replaces it wholesale.
pub struct ContactIndex {
    adjacency: Vec<Vec<NodeId>>,
    edge_ids: FxHashMap<(NodeId, NodeId), usize>,
}

impl ContactIndex {
    pub fn build(graph: &Graph) -> Self {
        let mut adjacency = vec![Vec::new(); graph.population()];
        let mut edge_ids =
            FxHashMap::with_capacity_and_hasher(graph.edges.len(), Default::default());

        for (edge_id, edge) in graph.edges.iter().enumerate() {
            adjacency[edge.source].push(edge.target);
            adjacency[edge.target].push(edge.source);
            edge_ids.insert(edge.key(), edge_id);
        }

        Self { adjacency, edge_ids }
    }

    pub fn neighbors(&self, node: NodeId) -> &[NodeId] {
        &self.adjacency[node]
    }

    pub fn degree(&self, node: NodeId) -> usize {
        self.adjacency[node].len()
    }

    /// Index into `Graph::edges` for the unordered pair, if connected.
    pub fn edge_id(&self, a: NodeId, b: NodeId) -> Option<usize> {
        self.edge_ids.get(&(a.min(b), a.max(b))).copied()
    }
}
