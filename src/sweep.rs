//! Threshold sweep over the alignment scores of a network.

use log::{debug, warn};

use crate::graph::{Edge, Graph};

/// How the list of thresholds is derived from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThresholdSchedule {
    /// One threshold per distinct alignment score.
    #[default]
    Distinct,
    /// `n` evenly spaced thresholds from the highest score to the lowest.
    /// `Even(0)` and `Even(1)` both give the single highest score.
    Even(usize),
}

/// One step of the sweep: every node of the graph plus the edges whose
/// score is at least `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub index: usize,
    pub threshold: f64,
    pub graph: &'a Graph,
    pub edges: &'a [Edge],
}

impl Frame<'_> {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Sweep plan for one graph. Holds the edges sorted by decreasing score so
/// that each frame's edge set is a prefix of that list.
#[derive(Debug, Clone)]
pub struct Sweep<'g> {
    graph: &'g Graph,
    sorted_edges: Vec<Edge>,
    thresholds: Vec<f64>,
}

impl<'g> Sweep<'g> {
    pub fn new(graph: &'g Graph, schedule: ThresholdSchedule) -> Self {
        let mut sorted_edges = graph.edges().to_vec();
        sorted_edges.sort_by(|x, y| y.score.total_cmp(&x.score));

        let thresholds = if graph.is_empty() {
            warn!("Network has no nodes, nothing to render");
            Vec::new()
        } else if sorted_edges.is_empty() {
            warn!("Network has no edges, rendering isolated nodes only");
            vec![0.0]
        } else {
            thresholds_for(&sorted_edges, schedule)
        };
        debug!("Sweep over {} thresholds", thresholds.len());

        Sweep {
            graph,
            sorted_edges,
            thresholds,
        }
    }

    /// Thresholds in visiting order, strictly decreasing.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    /// Edges with `score >= threshold`, highest score first.
    pub fn subgraph(&self, threshold: f64) -> &[Edge] {
        let keep = self.sorted_edges.partition_point(|e| e.score >= threshold);
        &self.sorted_edges[..keep]
    }

    pub fn frame(&self, index: usize) -> Option<Frame<'_>> {
        let threshold = *self.thresholds.get(index)?;
        Some(Frame {
            index,
            threshold,
            graph: self.graph,
            edges: self.subgraph(threshold),
        })
    }

    /// Lazily yields every frame in sweep order. Each call starts over.
    pub fn frames(&self) -> impl Iterator<Item = Frame<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.frame(i))
    }
}

/// `sorted_edges` must be non-empty and sorted by decreasing score.
fn thresholds_for(sorted_edges: &[Edge], schedule: ThresholdSchedule) -> Vec<f64> {
    match schedule {
        ThresholdSchedule::Distinct => {
            let mut scores: Vec<f64> = sorted_edges.iter().map(|e| e.score).collect();
            scores.dedup();
            scores
        }
        ThresholdSchedule::Even(steps) => {
            let hi = sorted_edges[0].score;
            let lo = sorted_edges[sorted_edges.len() - 1].score;
            if steps <= 1 || hi == lo {
                return vec![hi];
            }
            let span = hi - lo;
            let last = (steps - 1) as f64;
            (0..steps)
                .map(|i| if i + 1 == steps { lo } else { hi - span * i as f64 / last })
                .collect()
        }
    }
}
