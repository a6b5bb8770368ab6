//! Factory steady-state solver.
//!
//! Pipeline: ingest → normalize → reduce → solve → verify → emit. Given a
//! crafting graph with machines, modules, raw supply caps, and one target
//! item at a requested rate, find per-recipe crafting rates that balance
//! every intermediate exactly; if the request is infeasible, report the
//! maximum achievable rate with bottleneck evidence from a second
//! maximization phase.

pub mod error;
pub mod normalize;
pub mod reduce;
pub mod schema;
pub mod solve;
pub mod verify;

pub use error::FactoryError;
pub use schema::{FactoryDoc, FactoryOutcome};
pub use solve::plan;

/// Run the whole pipeline on a JSON document, returning the JSON answer.
pub fn run_document(input: &str) -> Result<String, FactoryError> {
    let doc: FactoryDoc = serde_json::from_str(input)?;
    let outcome = plan(&doc)?;
    Ok(serde_json::to_string(&outcome)?)
}
