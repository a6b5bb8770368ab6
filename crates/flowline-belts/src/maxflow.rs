//! Deterministic Dinic max-flow on float capacities.
//!
//! Each directed arc and its reverse twin sit adjacently in one flat arena,
//! so `idx ^ 1` reaches the twin. Arcs store remaining capacity; the flow on
//! a forward arc is its twin's gained capacity. Determinism comes from three
//! rules: adjacency lists keep insertion order (the normalizer inserts in
//! lexicographic order), BFS scans adjacency in order, and the blocking-flow
//! DFS advances a per-vertex current-arc cursor only when an arc is
//! exhausted. Residuals at or below `EPS` count as saturated.

use std::collections::VecDeque;

use flowline_core::tol::EPS;

/// Capacity standing in for "unbounded".
pub const INF_CAPACITY: f64 = 1e18;

#[derive(Debug, Clone)]
struct Arc {
    to: usize,
    /// Remaining capacity in this direction.
    cap: f64,
}

/// A residual flow network over dense vertex indices.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    arcs: Vec<Arc>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    pub fn new(vertices: usize) -> Self {
        Self {
            arcs: Vec::new(),
            adjacency: vec![Vec::new(); vertices],
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Add a directed arc and its zero-capacity twin. Returns the forward
    /// arc's index; the twin is at `index ^ 1`.
    pub fn add_arc(&mut self, from: usize, to: usize, cap: f64) -> usize {
        let idx = self.arcs.len();
        self.arcs.push(Arc { to, cap });
        self.arcs.push(Arc { to: from, cap: 0.0 });
        self.adjacency[from].push(idx);
        self.adjacency[to].push(idx + 1);
        idx
    }

    /// Flow currently routed through a forward arc.
    pub fn flow(&self, arc: usize) -> f64 {
        self.arcs[arc ^ 1].cap
    }

    /// Remaining capacity of an arc.
    pub fn residual(&self, arc: usize) -> f64 {
        self.arcs[arc].cap
    }

    /// Run Dinic from `source` to `sink`; returns the total routed flow.
    pub fn max_flow(&mut self, source: usize, sink: usize) -> f64 {
        let mut total = 0.0;
        loop {
            let level = self.bfs_levels(source);
            if level[sink] < 0 {
                break;
            }
            let mut cursor = vec![0usize; self.vertex_count()];
            loop {
                let pushed = self.push(source, sink, INF_CAPACITY, &level, &mut cursor);
                if pushed <= EPS {
                    break;
                }
                total += pushed;
            }
        }
        total
    }

    /// Vertices reachable from `source` through positive residuals.
    pub fn reachable(&self, source: usize) -> Vec<bool> {
        let mut seen = vec![false; self.vertex_count()];
        let mut queue = VecDeque::new();
        seen[source] = true;
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            for &a in &self.adjacency[v] {
                let arc = &self.arcs[a];
                if !seen[arc.to] && arc.cap > EPS {
                    seen[arc.to] = true;
                    queue.push_back(arc.to);
                }
            }
        }
        seen
    }

    fn bfs_levels(&self, source: usize) -> Vec<i32> {
        let mut level = vec![-1; self.vertex_count()];
        let mut queue = VecDeque::new();
        level[source] = 0;
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            for &a in &self.adjacency[v] {
                let arc = &self.arcs[a];
                if level[arc.to] < 0 && arc.cap > EPS {
                    level[arc.to] = level[v] + 1;
                    queue.push_back(arc.to);
                }
            }
        }
        level
    }

    /// Advance one augmenting path within the level graph. The cursor stays
    /// on an arc that still has residual so later calls resume there.
    fn push(
        &mut self,
        v: usize,
        sink: usize,
        limit: f64,
        level: &[i32],
        cursor: &mut [usize],
    ) -> f64 {
        if v == sink {
            return limit;
        }
        while cursor[v] < self.adjacency[v].len() {
            let a = self.adjacency[v][cursor[v]];
            let (to, cap) = {
                let arc = &self.arcs[a];
                (arc.to, arc.cap)
            };
            if cap > EPS && level[to] == level[v] + 1 {
                let pushed = self.push(to, sink, limit.min(cap), level, cursor);
                if pushed > EPS {
                    self.arcs[a].cap -= pushed;
                    self.arcs[a ^ 1].cap += pushed;
                    return pushed;
                }
            }
            cursor[v] += 1;
        }
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_arc() {
        let mut net = FlowNetwork::new(2);
        let a = net.add_arc(0, 1, 7.5);
        assert_eq!(net.max_flow(0, 1), 7.5);
        assert_eq!(net.flow(a), 7.5);
        assert_eq!(net.residual(a), 0.0);
    }

    #[test]
    fn series_takes_the_minimum() {
        let mut net = FlowNetwork::new(3);
        net.add_arc(0, 1, 10.0);
        net.add_arc(1, 2, 4.0);
        assert_eq!(net.max_flow(0, 2), 4.0);
    }

    #[test]
    fn parallel_paths_add() {
        let mut net = FlowNetwork::new(4);
        net.add_arc(0, 1, 3.0);
        net.add_arc(1, 3, 3.0);
        net.add_arc(0, 2, 2.0);
        net.add_arc(2, 3, 2.0);
        assert_eq!(net.max_flow(0, 3), 5.0);
    }

    #[test]
    fn diamond_with_cross_arc() {
        // The cross arc tempts a single path through the middle; the
        // optimum of 2 needs both outer paths.
        let mut net = FlowNetwork::new(4);
        net.add_arc(0, 1, 1.0);
        net.add_arc(0, 2, 1.0);
        net.add_arc(1, 2, 1.0);
        net.add_arc(1, 3, 1.0);
        net.add_arc(2, 3, 1.0);
        assert_eq!(net.max_flow(0, 3), 2.0);
    }

    #[test]
    fn disconnected_sink_routes_nothing() {
        let mut net = FlowNetwork::new(3);
        net.add_arc(0, 1, 5.0);
        assert_eq!(net.max_flow(0, 2), 0.0);
    }

    #[test]
    fn reachability_follows_residuals() {
        let mut net = FlowNetwork::new(3);
        net.add_arc(0, 1, 5.0);
        net.add_arc(1, 2, 3.0);
        net.max_flow(0, 2);
        let seen = net.reachable(0);
        // 0 -> 1 keeps residual 2; 1 -> 2 is saturated.
        assert!(seen[0]);
        assert!(seen[1]);
        assert!(!seen[2]);
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let build = || {
            let mut net = FlowNetwork::new(5);
            net.add_arc(0, 1, 2.5);
            net.add_arc(0, 2, 1.5);
            net.add_arc(1, 3, 2.0);
            net.add_arc(2, 3, 2.0);
            net.add_arc(1, 2, 0.5);
            net.add_arc(3, 4, 3.25);
            net
        };
        let mut a = build();
        let mut b = build();
        let fa = a.max_flow(0, 4);
        let fb = b.max_flow(0, 4);
        assert_eq!(fa.to_bits(), fb.to_bits());
        for arc in 0..6 {
            let arc = arc * 2;
            assert_eq!(a.flow(arc).to_bits(), b.flow(arc).to_bits());
        }
    }

    #[test]
    fn zero_capacity_arc_is_saturated_from_the_start() {
        let mut net = FlowNetwork::new(2);
        let a = net.add_arc(0, 1, 0.0);
        assert_eq!(net.max_flow(0, 1), 0.0);
        assert_eq!(net.flow(a), 0.0);
        let seen = net.reachable(0);
        assert!(!seen[1]);
    }
}
