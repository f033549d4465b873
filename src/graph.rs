use rustc_hash::FxHashMap;

/// A sequence in the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Identifier used by edges in the source file.
    pub id: String,
    /// Hit identifier, joined against annotation tables.
    pub name: String,
}

/// An undirected similarity edge, stored with `a <= b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub score: f64,
}

/// Weighted undirected graph. Nodes and scores are fixed once built.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// Canonical key for an unordered node pair
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Graph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lowest and highest alignment score, if there is any edge.
    pub fn score_range(&self) -> Option<(f64, f64)> {
        self.edges.iter().fold(None, |acc, e| match acc {
            None => Some((e.score, e.score)),
            Some((lo, hi)) => Some((lo.min(e.score), hi.max(e.score))),
        })
    }
}

/// Incrementally assembles a [`Graph`], collapsing parallel edges.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    id_to_index: FxHashMap<String, usize>,
    edge_index: FxHashMap<(usize, usize), usize>,
    edges: Vec<Edge>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its index. A repeated id returns the
    /// existing index and keeps the first name.
    pub fn add_node(&mut self, id: impl Into<String>, name: impl Into<String>) -> usize {
        let id = id.into();
        if let Some(&idx) = self.id_to_index.get(&id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.id_to_index.insert(id.clone(), idx);
        self.nodes.push(Node {
            id,
            name: name.into(),
        });
        idx
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).copied()
    }

    /// Adds an undirected edge. Reciprocal or repeated edges between the
    /// same pair keep the highest score.
    pub fn add_edge(&mut self, from: usize, to: usize, score: f64) {
        let (a, b) = edge_key(from, to);
        match self.edge_index.get(&(a, b)) {
            Some(&slot) => {
                let edge = &mut self.edges[slot];
                edge.score = edge.score.max(score);
            }
            None => {
                self.edge_index.insert((a, b), self.edges.len());
                self.edges.push(Edge { a, b, score });
            }
        }
    }

    pub fn build(self) -> Graph {
        Graph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }
}
