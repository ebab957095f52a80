// ============================================================
// Layer 3 — Knowledge Unit Graph
// ============================================================
// The prerequisite structure over knowledge units: a weighted
// directed graph where an edge (src, dst, w) means mastery of
// `src` influences performance on `dst` with strength `w`.
//
// The trainer never looks inside this type — it is handed to
// the network constructor as an opaque parameter. The only
// operations the network needs are the KU count and a dense
// adjacency matrix for score propagation.
//
// On-disk format (JSON):
//   { "ku_num": 124, "edges": [[0, 3, 1.0], [3, 7, 0.5], ...] }

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// One directed prerequisite edge with an influence weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: usize,
    pub dst: usize,
    pub weight: f32,
}

/// A weighted directed graph over `ku_num` knowledge units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub ku_num: usize,
    pub edges: Vec<GraphEdge>,
}

impl KnowledgeGraph {
    /// Build a graph, validating that every edge endpoint is a
    /// real knowledge unit.
    pub fn new(ku_num: usize, edges: Vec<GraphEdge>) -> Result<Self> {
        ensure!(ku_num > 0, "knowledge graph needs at least one knowledge unit");
        for e in &edges {
            ensure!(
                e.src < ku_num && e.dst < ku_num,
                "graph edge ({}, {}) references a knowledge unit outside 0..{}",
                e.src,
                e.dst,
                ku_num
            );
        }
        Ok(Self { ku_num, edges })
    }

    /// A graph with no edges. The network degenerates to a plain
    /// recurrent tracer, which is still a valid configuration.
    pub fn empty(ku_num: usize) -> Result<Self> {
        Self::new(ku_num, Vec::new())
    }

    /// Read a graph from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read graph file '{}'", path.display()))?;
        let raw: KnowledgeGraph = serde_json::from_str(&json)
            .with_context(|| format!("Malformed graph file '{}'", path.display()))?;
        // Re-run validation — the file may reference out-of-range KUs
        Self::new(raw.ku_num, raw.edges)
    }

    /// Dense row-major adjacency matrix, `ku_num * ku_num` entries.
    /// Entry `[src * ku_num + dst]` carries the edge weight; parallel
    /// edges accumulate.
    pub fn dense_adjacency(&self) -> Vec<f32> {
        let mut adj = vec![0.0f32; self.ku_num * self.ku_num];
        for e in &self.edges {
            adj[e.src * self.ku_num + e.dst] += e.weight;
        }
        adj
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn edge(src: usize, dst: usize, weight: f32) -> GraphEdge {
        GraphEdge { src, dst, weight }
    }

    #[test]
    fn dense_adjacency_places_weights() {
        let g = KnowledgeGraph::new(3, vec![edge(0, 1, 1.0), edge(2, 0, 0.5)]).unwrap();
        let adj = g.dense_adjacency();
        assert_eq!(adj.len(), 9);
        assert_eq!(adj[0 * 3 + 1], 1.0);
        assert_eq!(adj[2 * 3 + 0], 0.5);
        assert_eq!(adj.iter().filter(|&&w| w != 0.0).count(), 2);
    }

    #[test]
    fn parallel_edges_accumulate() {
        let g = KnowledgeGraph::new(2, vec![edge(0, 1, 0.25), edge(0, 1, 0.75)]).unwrap();
        assert_eq!(g.dense_adjacency()[1], 1.0);
    }

    #[test]
    fn out_of_range_edge_is_rejected() {
        assert!(KnowledgeGraph::new(2, vec![edge(0, 2, 1.0)]).is_err());
        assert!(KnowledgeGraph::new(0, Vec::new()).is_err());
    }

    #[test]
    fn empty_graph_has_zero_adjacency() {
        let g = KnowledgeGraph::empty(4).unwrap();
        assert!(g.dense_adjacency().iter().all(|&w| w == 0.0));
    }

    #[test]
    fn json_round_trip() {
        let g = KnowledgeGraph::new(3, vec![edge(1, 2, 0.5)]).unwrap();
        let json = serde_json::to_string(&g).unwrap();
        let back: KnowledgeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ku_num, 3);
        assert_eq!(back.edges, g.edges);
    }
}
