//! Two-phase solve driver and bottleneck naming.
//!
//! Phase 1 asks for feasibility at the requested rate under the
//! machine-minimizing objective. On infeasibility, phase 2 maximizes the
//! auxiliary rate variable and names the binding constraints. Every answer
//! passes the verifier before it is returned; a failed re-check is a fatal
//! solver error, never a silently emitted document.

use std::collections::BTreeMap;

use flowline_core::tol::{snap_zero, tight, EPS};
use flowline_lp::LpStatus;

use crate::error::FactoryError;
use crate::normalize::{normalize, Plant};
use crate::reduce::{build_lp, Phase};
use crate::schema::{FactoryDoc, FactoryOutcome, FeasiblePlan, InfeasibleReport};
use crate::verify;

/// Solve a factory document end to end.
pub fn plan(doc: &FactoryDoc) -> Result<FactoryOutcome, FactoryError> {
    let plant = normalize(doc)?;

    // Structurally unreachable target: no runnable recipe emits it and it
    // has no external supply. A zero request is trivially met; anything
    // else gets a synthesized certificate without running the LP.
    if !plant.target_has_producer() && !plant.is_raw(plant.target_item) {
        if plant.target_rate <= EPS {
            let rates = vec![0.0; plant.recipes.len()];
            let draws = vec![0.0; plant.items.len()];
            verify::check_feasible(&plant, plant.target_rate, &rates, &draws)?;
            return Ok(FactoryOutcome::Feasible(feasible_plan(&plant, &rates, &draws)));
        }
        let target = plant.items.name(plant.target_item);
        return Ok(FactoryOutcome::Infeasible(InfeasibleReport {
            feasible: false,
            max_target_rate: 0.0,
            rates: BTreeMap::new(),
            bottlenecks: vec![format!("{target}_unreachable")],
        }));
    }

    let reduced = build_lp(&plant, Phase::FixedTarget);
    match reduced.lp.solve() {
        LpStatus::Optimal(sol) => {
            let (rates, draws) = reduced.expand(&plant, &sol.x);
            verify::check_feasible(&plant, plant.target_rate, &rates, &draws)?;
            Ok(FactoryOutcome::Feasible(feasible_plan(&plant, &rates, &draws)))
        }
        LpStatus::Infeasible => max_rate_report(&plant),
        other => Err(FactoryError::Solver {
            status: other.tag(),
        }),
    }
}

/// Phase 2: maximize the achievable target rate and name the bottlenecks.
fn max_rate_report(plant: &Plant) -> Result<FactoryOutcome, FactoryError> {
    let reduced = build_lp(plant, Phase::MaxTarget);
    let sol = match reduced.lp.solve() {
        LpStatus::Optimal(sol) => sol,
        // Phase 2 always admits the all-zero point; any other status is a
        // solver failure.
        other => {
            return Err(FactoryError::Solver {
                status: other.tag(),
            })
        }
    };

    let max_rate = match reduced.t_col {
        Some(t) => sol.x[t],
        None => {
            return Err(FactoryError::Solver {
                status: "missing-aux-column",
            })
        }
    };
    let (rates, draws) = reduced.expand(plant, &sol.x);
    let mut bottlenecks = name_bottlenecks(plant, &rates, &draws);
    if bottlenecks.is_empty() && max_rate <= EPS {
        // Nothing runs and no capacity is saturated: the target is starved
        // of some upstream input rather than capped.
        let target = plant.items.name(plant.target_item);
        bottlenecks.push(format!("{target}_unreachable"));
    }
    verify::check_infeasible(plant, max_rate, &rates, &draws, &bottlenecks)?;

    let mut rate_map = BTreeMap::new();
    for (r, name) in plant.recipes.iter() {
        rate_map.insert(name.to_string(), snap_zero(rates[r]));
    }
    Ok(FactoryOutcome::Infeasible(InfeasibleReport {
        feasible: false,
        max_target_rate: snap_zero(max_rate),
        rates: rate_map,
        bottlenecks,
    }))
}

/// Binding constraints at the phase-2 optimum: saturated machine fleets
/// first, saturated raw supplies second, each group in name order.
fn name_bottlenecks(plant: &Plant, rates: &[f64], draws: &[f64]) -> Vec<String> {
    let usage = plant.machine_usage(rates);
    let hosts_runnable: Vec<bool> = {
        let mut hosts = vec![false; plant.machines.len()];
        for r in 0..plant.recipes.len() {
            if plant.eff_cpm[r] > 0.0 {
                hosts[plant.recipe_machine[r]] = true;
            }
        }
        hosts
    };

    let mut names = Vec::new();
    for (m, name) in plant.machines.iter() {
        if hosts_runnable[m] && tight(plant.machine_cap[m] - usage[m], plant.machine_cap[m]) {
            names.push(format!("{name}_cap"));
        }
    }
    for (i, name) in plant.items.iter() {
        if let Some(cap) = plant.raw_cap[i] {
            if tight(cap - draws[i], cap) {
                names.push(format!("{name}_supply"));
            }
        }
    }
    names
}

/// Assemble the feasible output document from verified vectors.
fn feasible_plan(plant: &Plant, rates: &[f64], draws: &[f64]) -> FeasiblePlan {
    let mut rate_map = BTreeMap::new();
    for (r, name) in plant.recipes.iter() {
        rate_map.insert(name.to_string(), snap_zero(rates[r]));
    }

    let usage = plant.machine_usage(rates);
    let mut machine_map = BTreeMap::new();
    for (m, name) in plant.machines.iter() {
        machine_map.insert(name.to_string(), snap_zero(usage[m]));
    }

    let mut raw_map = BTreeMap::new();
    for (i, name) in plant.items.iter() {
        if plant.raw_cap[i].is_some() {
            raw_map.insert(name.to_string(), snap_zero(draws[i]));
        }
    }

    FeasiblePlan {
        feasible: true,
        rates: rate_map,
        machines: machine_map,
        raw_usage: raw_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> FactoryOutcome {
        let doc: FactoryDoc = serde_json::from_str(json).unwrap();
        plan(&doc).unwrap()
    }

    fn feasible(outcome: FactoryOutcome) -> FeasiblePlan {
        match outcome {
            FactoryOutcome::Feasible(p) => p,
            other => panic!("expected feasible, got: {other:?}"),
        }
    }

    fn infeasible(outcome: FactoryOutcome) -> InfeasibleReport {
        match outcome {
            FactoryOutcome::Infeasible(r) => r,
            other => panic!("expected infeasible, got: {other:?}"),
        }
    }

    #[test]
    fn single_recipe_chain() {
        // One machine at speed 1, 60 s per craft: 1 craft/min each.
        let plan = feasible(run(r#"{
            "target": {"item": "A", "rate": 1},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {"A_rec": {"machine": "M", "time": 60, "in": {"ore": 1}, "out": {"A": 1}}},
            "raws": {"ore": {}}
        }"#));
        assert!((plan.rates["A_rec"] - 1.0).abs() <= 1e-9);
        assert!((plan.machines["M"] - 1.0).abs() <= 1e-9);
        assert!((plan.raw_usage["ore"] - 1.0).abs() <= 1e-9);
    }

    #[test]
    fn cyclic_byproduct_balances() {
        // split: X -> Y + Z, regen: Z -> X. Target Y = 1 forces both
        // recipes to run at 1 so Z and X balance.
        let plan = feasible(run(r#"{
            "target": {"item": "Y", "rate": 1},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {
                "split": {"machine": "M", "time": 60, "in": {"X": 1}, "out": {"Y": 1, "Z": 1}},
                "regen": {"machine": "M", "time": 60, "in": {"Z": 1}, "out": {"X": 1}}
            }
        }"#));
        assert!((plan.rates["split"] - 1.0).abs() <= 1e-9);
        assert!((plan.rates["regen"] - 1.0).abs() <= 1e-9);
    }

    #[test]
    fn machine_cap_bounds_the_rate() {
        // eff = 1 craft/min, 10 machines: max 10/min. Ask for 25.
        let report = infeasible(run(r#"{
            "target": {"item": "A", "rate": 25},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {"A_rec": {"machine": "M", "time": 60, "in": {"ore": 1}, "out": {"A": 1}}},
            "raws": {"ore": {}}
        }"#));
        assert!((report.max_target_rate - 10.0).abs() <= 1e-9);
        assert!((report.rates["A_rec"] - 10.0).abs() <= 1e-9);
        assert_eq!(report.bottlenecks, vec!["M_cap".to_string()]);
    }

    #[test]
    fn raw_supply_bounds_the_rate() {
        let report = infeasible(run(r#"{
            "target": {"item": "widget", "rate": 200},
            "machines": {"press": {"base_speed": 1.0, "max": 1000}},
            "recipes": {"widget": {"machine": "press", "time": 1, "in": {"ore": 10}, "out": {"widget": 1}}},
            "raws": {"ore": {"cap": 100}}
        }"#));
        // 100 ore/min at 10 per craft: 10 widgets/min.
        assert!((report.max_target_rate - 10.0).abs() <= 1e-9);
        assert_eq!(report.bottlenecks, vec!["ore_supply".to_string()]);
    }

    #[test]
    fn machines_sort_before_raws_in_bottlenecks() {
        // Both the machine fleet and the supply saturate at the optimum.
        let report = infeasible(run(r#"{
            "target": {"item": "widget", "rate": 150},
            "machines": {"press": {"base_speed": 1.0, "max": 10}},
            "recipes": {"widget": {"machine": "press", "time": 6, "in": {"ore": 1}, "out": {"widget": 1}}},
            "raws": {"ore": {"cap": 100}}
        }"#));
        // eff = 10/min, 10 presses: 100/min; ore cap 100 also binds at 100.
        assert!((report.max_target_rate - 100.0).abs() <= 1e-9);
        assert_eq!(
            report.bottlenecks,
            vec!["press_cap".to_string(), "ore_supply".to_string()]
        );
    }

    #[test]
    fn unreachable_target_synthesizes_certificate() {
        let report = infeasible(run(r#"{
            "target": {"item": "ghost", "rate": 5},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {"A_rec": {"machine": "M", "time": 60, "out": {"A": 1}}}
        }"#));
        assert_eq!(report.max_target_rate, 0.0);
        assert!(report.rates.is_empty());
        assert_eq!(report.bottlenecks, vec!["ghost_unreachable".to_string()]);
    }

    #[test]
    fn unreachable_target_at_zero_rate_is_feasible() {
        let plan = feasible(run(r#"{
            "target": {"item": "ghost", "rate": 0},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {"A_rec": {"machine": "M", "time": 60, "out": {"A": 1}}}
        }"#));
        assert_eq!(plan.rates["A_rec"], 0.0);
    }

    #[test]
    fn raw_target_feasible_within_cap() {
        let plan = feasible(run(r#"{
            "target": {"item": "ore", "rate": 5},
            "machines": {},
            "recipes": {},
            "raws": {"ore": {"cap": 10}}
        }"#));
        assert!((plan.raw_usage["ore"] - 5.0).abs() <= 1e-9);
        assert!(plan.rates.is_empty());
        assert!(plan.machines.is_empty());
    }

    #[test]
    fn raw_target_clipped_by_cap() {
        let report = infeasible(run(r#"{
            "target": {"item": "ore", "rate": 20},
            "machines": {},
            "recipes": {},
            "raws": {"ore": {"cap": 10}}
        }"#));
        assert!((report.max_target_rate - 10.0).abs() <= 1e-9);
        assert_eq!(report.bottlenecks, vec!["ore_supply".to_string()]);
    }

    #[test]
    fn productivity_reduces_required_crafts() {
        // 20% productivity: 1.2 plates per craft, so 12 plates/min needs
        // x = 10 crafts/min and 10 ore/min.
        let plan = feasible(run(r#"{
            "target": {"item": "plate", "rate": 12},
            "machines": {"furnace": {"base_speed": 1.0, "max": 100, "modules": {"speed": 0, "productivity": 0.2}}},
            "recipes": {"smelt": {"machine": "furnace", "time": 60, "in": {"ore": 1}, "out": {"plate": 1}}},
            "raws": {"ore": {}}
        }"#));
        assert!((plan.rates["smelt"] - 10.0).abs() <= 1e-9);
        assert!((plan.raw_usage["ore"] - 10.0).abs() <= 1e-9);
    }

    #[test]
    fn consumer_of_undeclared_item_cannot_run() {
        // "flux" is neither raw nor produced: its conservation row pins the
        // recipe to zero, so the target is capped at zero.
        let report = infeasible(run(r#"{
            "target": {"item": "A", "rate": 5},
            "machines": {"M": {"base_speed": 1.0, "max": 10}},
            "recipes": {"A_rec": {"machine": "M", "time": 60, "in": {"flux": 1}, "out": {"A": 1}}}
        }"#));
        assert_eq!(report.max_target_rate, 0.0);
        assert_eq!(report.rates["A_rec"], 0.0);
        assert_eq!(report.bottlenecks, vec!["A_unreachable".to_string()]);
    }
}
