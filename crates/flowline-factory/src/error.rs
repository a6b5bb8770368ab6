use thiserror::Error;

/// Errors surfaced by the factory pipeline.
///
/// The first group is malformed input (schema or structural violations); the
/// second is solver or verifier failure. The two groups map to distinct
/// process exit codes, so no variant may straddle them.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The document is not valid JSON or does not match the wire schema.
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),

    /// A recipe names a machine type that was never declared.
    #[error("recipe '{recipe}' references unknown machine '{machine}'")]
    UnknownMachine { recipe: String, machine: String },

    /// A recipe carries a negative input or output quantity.
    #[error("negative quantity {qty} for item '{item}' in recipe '{recipe}'")]
    NegativeQuantity {
        recipe: String,
        item: String,
        qty: f64,
    },

    /// A recipe's craft time must be strictly positive.
    #[error("recipe '{recipe}' has non-positive craft time {time}")]
    NonPositiveTime { recipe: String, time: f64 },

    /// A machine's base speed must be strictly positive.
    #[error("machine '{machine}' has non-positive base speed {speed}")]
    NonPositiveSpeed { machine: String, speed: f64 },

    /// Productivity modules only ever add output.
    #[error("machine '{machine}' has negative productivity modifier {value}")]
    NegativeProductivity { machine: String, value: f64 },

    /// A raw supply cap must be non-negative.
    #[error("raw item '{item}' has negative supply cap {cap}")]
    NegativeRawCap { item: String, cap: f64 },

    /// The requested target rate must be non-negative.
    #[error("target rate {rate} is negative")]
    NegativeTargetRate { rate: f64 },

    /// The LP engine returned a non-terminal status.
    #[error("LP solver failed with status '{status}'")]
    Solver { status: &'static str },

    /// The solved answer did not re-check against the original constraints.
    #[error("answer verification failed: {detail}")]
    Verification { detail: String },
}

impl FactoryError {
    /// True for errors caused by the input document rather than the solver.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            FactoryError::Solver { .. } | FactoryError::Verification { .. }
        )
    }
}
