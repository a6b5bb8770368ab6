//! Feasibility decision, flow recovery, and cut certificates.
//!
//! After max-flow, feasibility is exactly "the super-source arcs are
//! saturated". On success the original flow is recovered by re-adding each
//! edge's lower bound; on failure the certificate names the residual-
//! reachable nodes, the saturated node caps, and the saturated edges
//! crossing out of the reachable set. Either way the answer is re-verified
//! before it leaves this module.

use flowline_core::tol::{snap_zero, EPS};

use crate::error::BeltsError;
use crate::normalize::BeltNetwork;
use crate::schema::{BeltOutcome, CutReport, Deficit, EdgeFlow, EdgeRef, FlowAssignment};
use crate::verify;

/// Run max-flow on a reduced network and certify the outcome.
pub fn certify(mut network: BeltNetwork) -> Result<BeltOutcome, BeltsError> {
    let achieved = network.net.max_flow(network.source, network.sink_star);

    if achieved >= network.required - EPS {
        let flows: Vec<f64> = network
            .edges
            .iter()
            .map(|e| e.lo + network.net.flow(e.arc))
            .collect();
        verify::check_feasible(&network, &flows)?;

        let flow = network
            .edges
            .iter()
            .zip(flows.iter())
            .map(|(e, &f)| EdgeFlow {
                u: network.nodes.name(e.u).to_string(),
                v: network.nodes.name(e.v).to_string(),
                f: snap_zero(f),
            })
            .collect();
        return Ok(BeltOutcome::Feasible(FlowAssignment {
            feasible: true,
            flow,
        }));
    }

    let reachable = network.net.reachable(network.source);

    // Nodes whose in-vertex the residual graph reaches; node order is
    // canonical, so the list comes out sorted.
    let cut_reachable: Vec<String> = network
        .nodes
        .iter()
        .filter(|&(n, _)| reachable[network.vert_in[n]])
        .map(|(_, name)| name.to_string())
        .collect();

    let tight_nodes: Vec<String> = network
        .nodes
        .iter()
        .filter(|&(n, _)| {
            network.cap_arcs[n]
                .map(|(arc, _)| network.net.residual(arc) <= EPS)
                .unwrap_or(false)
        })
        .map(|(_, name)| name.to_string())
        .collect();

    let mut tight_edges: Vec<EdgeRef> = network
        .edges
        .iter()
        .filter(|e| {
            reachable[network.vert_out[e.u]]
                && !reachable[network.vert_in[e.v]]
                && network.net.residual(e.arc) <= EPS
        })
        .map(|e| EdgeRef {
            u: network.nodes.name(e.u).to_string(),
            v: network.nodes.name(e.v).to_string(),
        })
        .collect();
    tight_edges.sort();
    tight_edges.dedup();

    let report = CutReport {
        feasible: false,
        cut_reachable,
        deficit: Deficit {
            demand_balance: network.required - achieved,
            tight_nodes,
            tight_edges,
        },
    };
    verify::check_infeasible(&network, achieved, &report)?;
    Ok(BeltOutcome::Infeasible(report))
}
