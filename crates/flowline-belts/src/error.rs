use thiserror::Error;

/// Errors surfaced by the belts pipeline. Input violations and
/// solver/verifier failures map to distinct process exit codes.
#[derive(Debug, Error)]
pub enum BeltsError {
    /// The document is not valid JSON or does not match the wire schema.
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),

    /// An edge endpoint, supply, or sink names an undeclared node.
    #[error("{role} references unknown node '{node}'")]
    UnknownNode { node: String, role: &'static str },

    /// Edge lower bounds must be non-negative.
    #[error("edge {index} has negative lower bound {lo}")]
    NegativeLowerBound { index: usize, lo: f64 },

    /// Edge bounds must satisfy `hi ≥ lo`.
    #[error("edge {index} has hi {hi} below lo {lo}")]
    InvertedBounds { index: usize, lo: f64, hi: f64 },

    /// Node throughput caps must be non-negative.
    #[error("node '{node}' has negative cap {cap}")]
    NegativeNodeCap { node: String, cap: f64 },

    /// Supplies are fixed positive inflows.
    #[error("supply at '{node}' must be positive, got {supply}")]
    NonPositiveSupply { node: String, supply: f64 },

    /// The sink absorbs; it cannot also supply.
    #[error("sink '{node}' cannot carry a supply")]
    SupplyAtSink { node: String },

    /// Total supply must equal the sink demand.
    #[error("total supply {supply_total} does not equal sink demand {demand}")]
    SupplyDemandMismatch { supply_total: f64, demand: f64 },

    /// The computed answer did not re-check against the original constraints.
    #[error("answer verification failed: {detail}")]
    Verification { detail: String },
}

impl BeltsError {
    /// True for errors caused by the input document rather than the solver.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, BeltsError::Verification { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let e = BeltsError::InvertedBounds {
            index: 3,
            lo: 5.0,
            hi: 2.0,
        };
        let msg = format!("{e}");
        assert!(msg.contains('3'));
        assert!(msg.contains('5'));
        assert!(msg.contains('2'));
    }

    #[test]
    fn only_verification_is_a_solver_error() {
        assert!(BeltsError::SupplyDemandMismatch {
            supply_total: 5.0,
            demand: 4.0
        }
        .is_input_error());
        assert!(!BeltsError::Verification {
            detail: "cut".to_string()
        }
        .is_input_error());
    }
}
