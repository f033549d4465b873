//! Seeded Fruchterman-Reingold layout computed once on the full network.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::graph::Graph;

/// Above this many nodes the quadratic repulsion step gets slow enough to
/// warn about.
const LARGE_LAYOUT_NODES: usize = 5_000;

/// Parameters of the spring layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Seed for the initial random placement.
    pub seed: u64,
    /// Iteration budget.
    pub iterations: usize,
    /// Pull toward the center; keeps disconnected components in view.
    pub gravity: f64,
    /// Mean displacement per node below which the layout is considered
    /// settled.
    pub tolerance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            iterations: 300,
            gravity: 1.0,
            tolerance: 1e-5,
        }
    }
}

/// Node positions in the unit square, indexed like [`Graph::nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<(f64, f64)>,
}

impl Layout {
    pub fn compute(graph: &Graph, config: &LayoutConfig) -> Self {
        let n = graph.node_count();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut pos: Vec<(f64, f64)> = (0..n).map(|_| (rng.gen::<f64>(), rng.gen::<f64>())).collect();

        if n > 1 {
            let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
            for e in graph.edges() {
                if e.a != e.b {
                    neighbors[e.a].push(e.b);
                    neighbors[e.b].push(e.a);
                }
            }
            spring(&mut pos, &neighbors, config);
        }

        Layout {
            positions: fit_unit_square(pos),
        }
    }

    pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
        self.positions.get(idx).copied()
    }

    pub fn positions(&self) -> &[(f64, f64)] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn spring(pos: &mut [(f64, f64)], neighbors: &[Vec<usize>], config: &LayoutConfig) {
    let n = pos.len();
    // Repulsion is all-pairs: each iteration costs n² force evaluations.
    info!(
        "Spring layout for {} nodes, up to {} iterations ({} pair evaluations each)",
        n,
        config.iterations,
        n * (n - 1)
    );
    if n > LARGE_LAYOUT_NODES {
        warn!(
            "{} nodes is large for an all-pairs layout; lower --iterations to bound the run time",
            n
        );
    }
    let k = (1.0 / n as f64).sqrt();
    let k2 = k * k;
    let mut temperature = 0.1;
    let cooling = temperature / (config.iterations as f64 + 1.0);

    for iteration in 0..config.iterations {
        let snapshot: &[(f64, f64)] = &*pos;
        // Each node's displacement is summed in index order, so the result
        // does not depend on how rayon splits the work.
        let displacement: Vec<(f64, f64)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let (xi, yi) = snapshot[i];
                let (mut fx, mut fy) = (0.0, 0.0);
                for (j, &(xj, yj)) in snapshot.iter().enumerate() {
                    if j == i {
                        continue;
                    }
                    let (dx, dy) = (xi - xj, yi - yj);
                    let d = (dx * dx + dy * dy).sqrt().max(0.01);
                    let f = k2 / (d * d);
                    fx += dx * f;
                    fy += dy * f;
                }
                for &j in &neighbors[i] {
                    let (dx, dy) = (xi - snapshot[j].0, yi - snapshot[j].1);
                    let d = (dx * dx + dy * dy).sqrt().max(0.01);
                    let f = d / k;
                    fx -= dx * f;
                    fy -= dy * f;
                }
                fx -= config.gravity * (xi - 0.5);
                fy -= config.gravity * (yi - 0.5);
                (fx, fy)
            })
            .collect();

        let mut moved = 0.0;
        for (p, (fx, fy)) in pos.iter_mut().zip(displacement) {
            let len = (fx * fx + fy * fy).sqrt();
            if len > 0.0 {
                let step = len.min(temperature);
                p.0 += fx / len * step;
                p.1 += fy / len * step;
                moved += step;
            }
        }
        temperature -= cooling;

        if moved / (n as f64) < config.tolerance {
            debug!("Layout settled after {} iterations", iteration + 1);
            return;
        }
    }
    debug!(
        "Layout did not settle within {} iterations, using current positions",
        config.iterations
    );
}

/// Scale uniformly into `[0,1]²`, centered. Degenerate layouts collapse to
/// the center.
fn fit_unit_square(pos: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    if pos.is_empty() {
        return pos;
    }
    let (x0, y0) = pos[0];
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
    for &(x, y) in &pos {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    let (w, h) = (max_x - min_x, max_y - min_y);
    let scale = w.max(h);
    if scale <= f64::EPSILON {
        return vec![(0.5, 0.5); pos.len()];
    }
    let (ox, oy) = ((1.0 - w / scale) / 2.0, (1.0 - h / scale) / 2.0);
    pos.into_iter()
        .map(|(x, y)| ((x - min_x) / scale + ox, (y - min_y) / scale + oy))
        .collect()
}
