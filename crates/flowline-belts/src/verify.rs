//! Answer verification against the original belt constraints.
//!
//! Feasible answers are re-checked edge by edge and node by node; cut
//! certificates are re-checked against an independently recomputed residual
//! reachability. A failed check is a fatal error, never an emitted document.

use flowline_core::tol::{approx_eq, approx_le, EPS};

use crate::error::BeltsError;
use crate::normalize::BeltNetwork;
use crate::schema::CutReport;

/// Re-check a recovered flow, indexed by input edge order.
pub fn check_feasible(network: &BeltNetwork, flows: &[f64]) -> Result<(), BeltsError> {
    for (i, e) in network.edges.iter().enumerate() {
        let f = flows[i];
        if !approx_le(e.lo, f) || !approx_le(f, e.hi) {
            return Err(fail(format!(
                "flow {f} on edge {i} escapes bounds [{}, {}]",
                e.lo, e.hi
            )));
        }
    }

    let mut inflow = vec![0.0; network.nodes.len()];
    let mut outflow = vec![0.0; network.nodes.len()];
    for (i, e) in network.edges.iter().enumerate() {
        outflow[e.u] += flows[i];
        inflow[e.v] += flows[i];
    }

    for (n, name) in network.nodes.iter() {
        let lhs = inflow[n] + network.supply[n];
        let absorbed = if n == network.sink_node {
            network.demand
        } else {
            0.0
        };
        let rhs = outflow[n] + absorbed;
        if !approx_eq(lhs, rhs) {
            return Err(fail(format!(
                "conservation violated at node '{name}': in {lhs} != out {rhs}"
            )));
        }
    }

    for (n, name) in network.nodes.iter() {
        if let Some((_, cap)) = network.cap_arcs[n] {
            // Throughput through the cap: what enters on edges, less what
            // the sink absorbs on arrival.
            let absorbed = if n == network.sink_node {
                network.demand
            } else {
                0.0
            };
            let through = inflow[n] - absorbed;
            if !approx_le(through, cap) {
                return Err(fail(format!(
                    "node '{name}' over its cap: {through} > {cap}"
                )));
            }
        }
    }

    Ok(())
}

/// Re-check a cut certificate against the post-flow residual graph.
pub fn check_infeasible(
    network: &BeltNetwork,
    achieved: f64,
    report: &CutReport,
) -> Result<(), BeltsError> {
    let balance = report.deficit.demand_balance;
    if balance <= EPS {
        return Err(fail(format!(
            "infeasibility report with non-positive deficit {balance}"
        )));
    }
    if !approx_eq(network.required - balance, achieved) {
        return Err(fail(format!(
            "deficit {balance} inconsistent with required {} and achieved {achieved}",
            network.required
        )));
    }

    let reachable = network.net.reachable(network.source);

    // The reachable set must match the certificate exactly.
    let recomputed: Vec<&str> = network
        .nodes
        .iter()
        .filter(|&(n, _)| reachable[network.vert_in[n]])
        .map(|(_, name)| name)
        .collect();
    if recomputed != report.cut_reachable.iter().map(String::as_str).collect::<Vec<_>>() {
        return Err(fail("cut_reachable does not match the residual graph".to_string()));
    }

    for name in &report.deficit.tight_nodes {
        let n = network
            .nodes
            .index_of(name)
            .ok_or_else(|| fail(format!("tight node '{name}' is not a node")))?;
        let (arc, _) = network.cap_arcs[n]
            .ok_or_else(|| fail(format!("tight node '{name}' has no cap")))?;
        if network.net.residual(arc) > EPS {
            return Err(fail(format!("tight node '{name}' is not saturated")));
        }
    }

    for edge in &report.deficit.tight_edges {
        let found = network.edges.iter().any(|e| {
            network.nodes.name(e.u) == edge.u
                && network.nodes.name(e.v) == edge.v
                && reachable[network.vert_out[e.u]]
                && !reachable[network.vert_in[e.v]]
                && network.net.residual(e.arc) <= EPS
        });
        if !found {
            return Err(fail(format!(
                "tight edge {}->{} does not cross the cut saturated",
                edge.u, edge.v
            )));
        }
    }

    Ok(())
}

fn fail(detail: String) -> BeltsError {
    BeltsError::Verification { detail }
}
