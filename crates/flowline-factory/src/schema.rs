//! Wire documents for the factory solver.
//!
//! Input maps deserialize into `BTreeMap`, so wire key order is irrelevant
//! and canonical order falls out of the type. Output structs serialize their
//! fields in declaration order and their maps in sorted key order, which is
//! what makes emission byte-stable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ===========================================================================
// Input
// ===========================================================================

/// A factory problem instance, read from standard input.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactoryDoc {
    pub target: TargetSpec,
    pub machines: BTreeMap<String, MachineSpec>,
    pub recipes: BTreeMap<String, RecipeSpec>,
    #[serde(default)]
    pub raws: BTreeMap<String, RawSpec>,
}

/// The single target item and its requested steady-state rate (per minute).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub item: String,
    pub rate: f64,
}

/// A machine type: baseline speed multiplier, fleet cap, module effects.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineSpec {
    pub base_speed: f64,
    pub max: u32,
    #[serde(default)]
    pub modules: ModuleSpec,
}

/// Additive module modifiers. Speed may be negative; productivity may not.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub productivity: f64,
}

/// A recipe: hosting machine, seconds per craft at speed 1, item multisets.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeSpec {
    pub machine: String,
    pub time: f64,
    #[serde(default, rename = "in")]
    pub inputs: BTreeMap<String, f64>,
    #[serde(default, rename = "out")]
    pub outputs: BTreeMap<String, f64>,
}

/// A raw item's external supply. A missing cap means unlimited.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSpec {
    #[serde(default)]
    pub cap: Option<f64>,
}

// ===========================================================================
// Output
// ===========================================================================

/// The emitted answer document. Exactly one of the two shapes, discriminated
/// by the `feasible` field both carry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FactoryOutcome {
    Feasible(FeasiblePlan),
    Infeasible(InfeasibleReport),
}

/// A verified steady-state plan meeting the requested target rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasiblePlan {
    pub feasible: bool,
    /// Crafts per minute per recipe, every declared recipe present.
    pub rates: BTreeMap<String, f64>,
    /// Fractional machine count in use per machine type.
    pub machines: BTreeMap<String, f64>,
    /// External draw per raw item, per minute.
    pub raw_usage: BTreeMap<String, f64>,
}

/// The maximum achievable target rate with bottleneck evidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfeasibleReport {
    pub feasible: bool,
    pub max_target_rate: f64,
    /// A witness rate vector achieving `max_target_rate`.
    pub rates: BTreeMap<String, f64>,
    /// Binding constraints, machines (`_cap`) before raws (`_supply`),
    /// each group lexicographic.
    pub bottlenecks: Vec<String>,
}

// ===========================================================================
// Tests
// ===========================================================================
