//! Validation and reduction of a belt document to a pure max-flow instance.
//!
//! Three transformations, applied in order:
//!
//! 1. **Node splitting**: a capped node becomes an in-vertex and an
//!    out-vertex joined by an arc carrying the cap. Incoming edges land on
//!    the in-vertex, outgoing edges leave the out-vertex. Supplies enter at
//!    the out-vertex and the sink absorbs at the in-vertex, so neither is
//!    throttled by the node's own cap.
//! 2. **Lower-bound elimination**: an edge `(u→v, lo, hi)` becomes an arc of
//!    capacity `hi − lo`, and `lo` moves into the imbalance table: the head's
//!    in-vertex owes `+lo`, the tail's out-vertex owes `−lo`.
//! 3. **Imbalance folding**: fixed supplies add at the supplying out-vertex,
//!    the sink demand subtracts at the sink's in-vertex. A super-source arc
//!    feeds every positive imbalance, a super-sink arc drains every negative
//!    one. Feasibility is then exactly "max-flow saturates the super-source".
//!
//! Imbalances are per transformed vertex, not per original node: a capped
//! node's halves must not cancel, or lower-bound flow that still has to
//! traverse the cap arc would go unaccounted.

use flowline_core::tol::{approx_eq, EPS};
use flowline_core::NameTable;

use crate::error::BeltsError;
use crate::maxflow::FlowNetwork;
use crate::schema::BeltDoc;

/// One original edge carried through the reduction.
#[derive(Debug, Clone)]
pub struct BeltEdge {
    pub u: usize,
    pub v: usize,
    pub lo: f64,
    pub hi: f64,
    /// The transformed arc in the flow network.
    pub arc: usize,
}

/// The normalized, reduced instance. Immutable apart from the flow state
/// inside `net`.
#[derive(Debug)]
pub struct BeltNetwork {
    pub nodes: NameTable,
    /// Per node: transformed in-vertex and out-vertex (equal when uncapped).
    pub vert_in: Vec<usize>,
    pub vert_out: Vec<usize>,
    /// Per node: split arc and cap for capped nodes.
    pub cap_arcs: Vec<Option<(usize, f64)>>,
    /// Original edges in input order.
    pub edges: Vec<BeltEdge>,
    pub net: FlowNetwork,
    /// Super-source and super-sink vertices.
    pub source: usize,
    pub sink_star: usize,
    /// Total positive imbalance; the flow the reduction must route.
    pub required: f64,
    /// Node index of the sink and per-node supplies.
    pub sink_node: usize,
    pub supply: Vec<f64>,
    pub demand: f64,
}

/// Validate a document and build the reduced network.
pub fn normalize(doc: &BeltDoc) -> Result<BeltNetwork, BeltsError> {
    for (name, spec) in &doc.nodes {
        if let Some(cap) = spec.cap {
            if cap < 0.0 {
                return Err(BeltsError::NegativeNodeCap {
                    node: name.clone(),
                    cap,
                });
            }
        }
    }

    for (index, e) in doc.edges.iter().enumerate() {
        if e.lo < 0.0 {
            return Err(BeltsError::NegativeLowerBound { index, lo: e.lo });
        }
        if e.hi < e.lo {
            return Err(BeltsError::InvertedBounds {
                index,
                lo: e.lo,
                hi: e.hi,
            });
        }
        for endpoint in [&e.u, &e.v] {
            if !doc.nodes.contains_key(endpoint) {
                return Err(BeltsError::UnknownNode {
                    node: endpoint.clone(),
                    role: "edge endpoint",
                });
            }
        }
    }

    if !doc.nodes.contains_key(&doc.sink.id) {
        return Err(BeltsError::UnknownNode {
            node: doc.sink.id.clone(),
            role: "sink",
        });
    }

    let mut supply_total = 0.0;
    for (name, &supply) in &doc.supplies {
        if !doc.nodes.contains_key(name) {
            return Err(BeltsError::UnknownNode {
                node: name.clone(),
                role: "supply",
            });
        }
        if supply <= 0.0 {
            return Err(BeltsError::NonPositiveSupply {
                node: name.clone(),
                supply,
            });
        }
        if *name == doc.sink.id {
            return Err(BeltsError::SupplyAtSink { node: name.clone() });
        }
        supply_total += supply;
    }
    if !approx_eq(supply_total, doc.sink.demand) {
        return Err(BeltsError::SupplyDemandMismatch {
            supply_total,
            demand: doc.sink.demand,
        });
    }

    let nodes = NameTable::from_names(doc.nodes.keys().cloned());

    // Vertex assignment in canonical node order; capped nodes take two
    // consecutive vertices.
    let mut vert_in = Vec::with_capacity(nodes.len());
    let mut vert_out = Vec::with_capacity(nodes.len());
    let mut caps = Vec::with_capacity(nodes.len());
    let mut next = 0usize;
    for (_, spec) in doc.nodes.iter() {
        match spec.cap {
            Some(cap) => {
                vert_in.push(next);
                vert_out.push(next + 1);
                caps.push(Some(cap));
                next += 2;
            }
            None => {
                vert_in.push(next);
                vert_out.push(next);
                caps.push(None);
                next += 1;
            }
        }
    }
    let source = next;
    let sink_star = next + 1;
    let mut net = FlowNetwork::new(next + 2);

    // Split arcs first, in node order.
    let mut cap_arcs = vec![None; nodes.len()];
    for (n, cap) in caps.iter().enumerate() {
        if let Some(cap) = *cap {
            let arc = net.add_arc(vert_in[n], vert_out[n], cap);
            cap_arcs[n] = Some((arc, cap));
        }
    }

    // Original edges next, inserted in lexicographic order of
    // (u, v, lo, hi, input position) but recorded per input position.
    let mut order: Vec<usize> = (0..doc.edges.len()).collect();
    order.sort_by(|&a, &b| {
        let ea = &doc.edges[a];
        let eb = &doc.edges[b];
        (&ea.u, &ea.v, ea.lo, ea.hi, a)
            .partial_cmp(&(&eb.u, &eb.v, eb.lo, eb.hi, b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut imbalance = vec![0.0; net.vertex_count()];
    let mut edges: Vec<Option<BeltEdge>> = vec![None; doc.edges.len()];
    for &idx in &order {
        let e = &doc.edges[idx];
        let u = nodes
            .index_of(&e.u)
            .expect("edge endpoints validated above");
        let v = nodes
            .index_of(&e.v)
            .expect("edge endpoints validated above");
        let arc = net.add_arc(vert_out[u], vert_in[v], e.hi - e.lo);
        imbalance[vert_in[v]] += e.lo;
        imbalance[vert_out[u]] -= e.lo;
        edges[idx] = Some(BeltEdge {
            u,
            v,
            lo: e.lo,
            hi: e.hi,
            arc,
        });
    }
    let edges: Vec<BeltEdge> = edges.into_iter().flatten().collect();

    // Fold fixed supplies and the sink demand into the imbalance table.
    let mut supply = vec![0.0; nodes.len()];
    for (name, &s) in &doc.supplies {
        let n = nodes.index_of(name).expect("supplies validated above");
        supply[n] = s;
        imbalance[vert_out[n]] += s;
    }
    let sink_node = nodes
        .index_of(&doc.sink.id)
        .expect("sink validated above");
    imbalance[vert_in[sink_node]] -= doc.sink.demand;

    // Super-source and super-sink arcs, in vertex order.
    let mut required = 0.0;
    for (vtx, &d) in imbalance.iter().enumerate() {
        if d > EPS {
            net.add_arc(source, vtx, d);
            required += d;
        } else if d < -EPS {
            net.add_arc(vtx, sink_star, -d);
        }
    }

    Ok(BeltNetwork {
        nodes,
        vert_in,
        vert_out,
        cap_arcs,
        edges,
        net,
        source,
        sink_star,
        required,
        sink_node,
        supply,
        demand: doc.sink.demand,
    })
}
