//! Bounded-flow belt solver.
//!
//! Pipeline: ingest → normalize → reduce → solve → verify → emit. Given a
//! directed graph with edge `[lo, hi]` bounds, node throughput caps, fixed
//! supplies, and one sink, decide whether a feasible flow exists. Feasible
//! instances get a concrete flow per input edge; infeasible ones get a
//! cut-based certificate naming the deficit, the saturated node caps, and
//! the saturated crossing edges.

pub mod certify;
pub mod error;
pub mod maxflow;
pub mod normalize;
pub mod schema;
pub mod verify;

pub use certify::certify;
pub use error::BeltsError;
pub use normalize::normalize;
pub use schema::{BeltDoc, BeltOutcome};

/// Run the whole pipeline on a JSON document, returning the JSON answer.
pub fn run_document(input: &str) -> Result<String, BeltsError> {
    let doc: BeltDoc = serde_json::from_str(input)?;
    let outcome = certify(normalize(&doc)?)?;
    Ok(serde_json::to_string(&outcome)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trip() {
        let input = r#"{
            "nodes": {"s": {}, "t": {}},
            "edges": [{"u": "s", "v": "t", "lo": 0, "hi": 10}],
            "supplies": {"s": 5},
            "sink": {"id": "t", "demand": 5}
        }"#;
        let out = run_document(input).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["feasible"], serde_json::json!(true));
        assert_eq!(value["flow"][0]["f"], serde_json::json!(5.0));
    }

    #[test]
    fn malformed_document_is_an_input_error() {
        let err = run_document("[]").unwrap_err();
        assert!(err.is_input_error());
    }
}
