//! Answer verification against the original constraints.
//!
//! The solver's output is never trusted: before a document is emitted,
//! every conservation row, capacity row, and sign constraint is re-evaluated
//! from the normalized plant in canonical order. A failed check is a fatal
//! error, not a warning.

use flowline_core::tol::{approx_eq, approx_le, tight, EPS};

use crate::error::FactoryError;
use crate::normalize::Plant;

/// Re-check a rate assignment claiming to meet `target_rate`.
pub fn check_feasible(
    plant: &Plant,
    target_rate: f64,
    rates: &[f64],
    draws: &[f64],
) -> Result<(), FactoryError> {
    for (r, name) in plant.recipes.iter() {
        if rates[r] < -EPS {
            return Err(fail(format!("rate of '{name}' is negative: {}", rates[r])));
        }
        if plant.eff_cpm[r] == 0.0 && rates[r] > EPS {
            return Err(fail(format!("unrunnable recipe '{name}' has rate {}", rates[r])));
        }
    }

    for (i, name) in plant.items.iter() {
        let mut activity = 0.0;
        for r in 0..plant.recipes.len() {
            activity += plant.coefficient(i, r) * rates[r];
        }
        if plant.is_raw(i) {
            activity += draws[i];
        }
        let expected = if i == plant.target_item { target_rate } else { 0.0 };
        if !approx_eq(activity, expected) {
            return Err(fail(format!(
                "conservation violated for item '{name}': {activity} != {expected}"
            )));
        }
    }

    let usage = plant.machine_usage(rates);
    for (m, name) in plant.machines.iter() {
        if !approx_le(usage[m], plant.machine_cap[m]) {
            return Err(fail(format!(
                "machine '{name}' over capacity: {} > {}",
                usage[m], plant.machine_cap[m]
            )));
        }
    }

    for (i, name) in plant.items.iter() {
        if let Some(cap) = plant.raw_cap[i] {
            if draws[i] < -EPS {
                return Err(fail(format!("raw draw of '{name}' is negative")));
            }
            if !approx_le(draws[i], cap) {
                return Err(fail(format!(
                    "raw '{name}' over cap: {} > {cap}",
                    draws[i]
                )));
            }
        }
    }

    Ok(())
}

/// Re-check a max-rate report: the witness must achieve `max_rate` under
/// the same invariants, the rate must not exceed the request, and the
/// certificate must name at least one binding constraint.
pub fn check_infeasible(
    plant: &Plant,
    max_rate: f64,
    rates: &[f64],
    draws: &[f64],
    bottlenecks: &[String],
) -> Result<(), FactoryError> {
    check_feasible(plant, max_rate, rates, draws)?;

    if !approx_le(max_rate, plant.target_rate) {
        return Err(fail(format!(
            "reported maximum {max_rate} exceeds the requested rate {}",
            plant.target_rate
        )));
    }
    if bottlenecks.is_empty() {
        return Err(fail("infeasibility report names no bottleneck".to_string()));
    }

    // Each named cap/supply bottleneck must actually be saturated.
    let usage = plant.machine_usage(rates);
    for name in bottlenecks {
        if let Some(machine) = name.strip_suffix("_cap") {
            let m = plant
                .machines
                .index_of(machine)
                .ok_or_else(|| fail(format!("bottleneck '{name}' names no machine")))?;
            if !tight(plant.machine_cap[m] - usage[m], plant.machine_cap[m]) {
                return Err(fail(format!("bottleneck '{name}' is not saturated")));
            }
        } else if let Some(item) = name.strip_suffix("_supply") {
            let i = plant
                .items
                .index_of(item)
                .ok_or_else(|| fail(format!("bottleneck '{name}' names no raw item")))?;
            let cap = plant.raw_cap[i]
                .ok_or_else(|| fail(format!("bottleneck '{name}' names a non-raw item")))?;
            if !tight(cap - draws[i], cap) {
                return Err(fail(format!("bottleneck '{name}' is not saturated")));
            }
        }
        // "_unreachable" is synthesized structurally and carries no row.
    }

    Ok(())
}

fn fail(detail: String) -> FactoryError {
    FactoryError::Verification { detail }
}
