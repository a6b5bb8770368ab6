//! Wire documents for the belt solver.
//!
//! Node, supply, and cap mappings deserialize into `BTreeMap`; the edge list
//! keeps input order because the feasible answer reports flows in input
//! edge order. Output structs serialize fields in declaration order with
//! sorted maps, so emission is byte-stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ===========================================================================
// Input
// ===========================================================================

/// A belt problem instance, read from standard input.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BeltDoc {
    pub nodes: BTreeMap<String, NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub supplies: BTreeMap<String, f64>,
    pub sink: SinkSpec,
}

/// A node with an optional throughput cap.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    #[serde(default)]
    pub cap: Option<f64>,
}

/// A directed edge with capacity bounds. Parallel edges are distinct.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeSpec {
    pub u: String,
    pub v: String,
    #[serde(default)]
    pub lo: f64,
    pub hi: f64,
}

/// The unique sink and its demand, which must equal total supply.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkSpec {
    pub id: String,
    pub demand: f64,
}

// ===========================================================================
// Output
// ===========================================================================

/// The emitted answer document, discriminated by the `feasible` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BeltOutcome {
    Feasible(FlowAssignment),
    Infeasible(CutReport),
}

/// A verified flow, one entry per input edge in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowAssignment {
    pub feasible: bool,
    pub flow: Vec<EdgeFlow>,
}

/// Flow on one original edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeFlow {
    pub u: String,
    pub v: String,
    pub f: f64,
}

/// Cut-based infeasibility certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutReport {
    pub feasible: bool,
    /// Nodes reachable from the super-source in the residual graph, sorted.
    pub cut_reachable: Vec<String>,
    pub deficit: Deficit,
}

/// The evidence behind an infeasibility verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deficit {
    /// How much required flow the max-flow failed to route.
    pub demand_balance: f64,
    /// Capped nodes saturated at their throughput limit, sorted.
    pub tight_nodes: Vec<String>,
    /// Saturated edges crossing out of the reachable set, sorted.
    pub tight_edges: Vec<EdgeRef>,
}

/// An edge named by its endpoints.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EdgeRef {
    pub u: String,
    pub v: String,
}

// ===========================================================================
// Tests
// ===========================================================================
