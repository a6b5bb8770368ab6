//! Canonicalization of a factory document into an indexed plant.
//!
//! Every name-keyed collection collapses into a sorted [`NameTable`];
//! effective crafting rates are computed once; structural violations
//! (unknown references, negative quantities) reject the document here,
//! before any solver runs.

use std::collections::BTreeMap;

use flowline_core::NameTable;

use crate::error::FactoryError;
use crate::schema::FactoryDoc;

/// Stand-in cap for raw items declared without one.
pub const RAW_CAP_UNLIMITED: f64 = 1e18;

/// An immutable, index-addressed view of the problem. All vectors are
/// parallel to their table's canonical order.
#[derive(Debug, Clone)]
pub struct Plant {
    pub items: NameTable,
    pub recipes: NameTable,
    pub machines: NameTable,

    pub target_item: usize,
    pub target_rate: f64,

    /// Hosting machine per recipe.
    pub recipe_machine: Vec<usize>,
    /// Crafts per minute one machine achieves per recipe; 0 marks the
    /// recipe unrunnable (non-positive speed factor) and pins its rate to 0.
    pub eff_cpm: Vec<f64>,
    /// Productivity bonus of the hosting machine, per recipe.
    pub prod_bonus: Vec<f64>,
    /// Inputs and outputs per recipe as `(item index, quantity)`, item-sorted.
    pub inputs: Vec<Vec<(usize, f64)>>,
    pub outputs: Vec<Vec<(usize, f64)>>,

    /// Fleet cap per machine type.
    pub machine_cap: Vec<f64>,
    /// Supply cap per item; `Some` marks the item raw.
    pub raw_cap: Vec<Option<f64>>,
}

impl Plant {
    pub fn is_raw(&self, item: usize) -> bool {
        self.raw_cap[item].is_some()
    }

    /// Net conservation coefficient of `item` in `recipe`:
    /// `out · (1 + prod) − in`. Productivity multiplies outputs only.
    pub fn coefficient(&self, item: usize, recipe: usize) -> f64 {
        let mut c = 0.0;
        for &(i, qty) in &self.outputs[recipe] {
            if i == item {
                c += qty * (1.0 + self.prod_bonus[recipe]);
            }
        }
        for &(i, qty) in &self.inputs[recipe] {
            if i == item {
                c -= qty;
            }
        }
        c
    }

    /// True if some runnable recipe emits the target item.
    pub fn target_has_producer(&self) -> bool {
        (0..self.recipes.len()).any(|r| {
            self.eff_cpm[r] > 0.0
                && self
                    .outputs[r]
                    .iter()
                    .any(|&(i, qty)| i == self.target_item && qty > 0.0)
        })
    }

    /// Fractional machine count per machine type under the given rates.
    pub fn machine_usage(&self, rates: &[f64]) -> Vec<f64> {
        let mut usage = vec![0.0; self.machines.len()];
        for r in 0..self.recipes.len() {
            if self.eff_cpm[r] > 0.0 {
                usage[self.recipe_machine[r]] += rates[r] / self.eff_cpm[r];
            }
        }
        usage
    }

    /// Item indices of declared raws, ascending.
    pub fn raw_items(&self) -> Vec<usize> {
        (0..self.items.len()).filter(|&i| self.is_raw(i)).collect()
    }
}

/// Validate and canonicalize a document.
pub fn normalize(doc: &FactoryDoc) -> Result<Plant, FactoryError> {
    if doc.target.rate < 0.0 {
        return Err(FactoryError::NegativeTargetRate {
            rate: doc.target.rate,
        });
    }

    for (name, m) in &doc.machines {
        if m.base_speed <= 0.0 {
            return Err(FactoryError::NonPositiveSpeed {
                machine: name.clone(),
                speed: m.base_speed,
            });
        }
        if m.modules.productivity < 0.0 {
            return Err(FactoryError::NegativeProductivity {
                machine: name.clone(),
                value: m.modules.productivity,
            });
        }
    }

    for (name, raw) in &doc.raws {
        if let Some(cap) = raw.cap {
            if cap < 0.0 {
                return Err(FactoryError::NegativeRawCap {
                    item: name.clone(),
                    cap,
                });
            }
        }
    }

    let machines = NameTable::from_names(doc.machines.keys().cloned());
    let recipes = NameTable::from_names(doc.recipes.keys().cloned());

    let mut item_names: Vec<String> = vec![doc.target.item.clone()];
    item_names.extend(doc.raws.keys().cloned());
    for r in doc.recipes.values() {
        item_names.extend(r.inputs.keys().cloned());
        item_names.extend(r.outputs.keys().cloned());
    }
    let items = NameTable::from_names(item_names);

    // Tables are frozen; index the per-recipe and per-machine data.
    // A sorted map and a table built from its keys agree on order, so
    // enumeration gives the canonical index directly.
    let mut recipe_machine = Vec::with_capacity(recipes.len());
    let mut eff_cpm = Vec::with_capacity(recipes.len());
    let mut prod_bonus = Vec::with_capacity(recipes.len());
    let mut inputs = Vec::with_capacity(recipes.len());
    let mut outputs = Vec::with_capacity(recipes.len());

    for (name, spec) in &doc.recipes {
        if spec.time <= 0.0 {
            return Err(FactoryError::NonPositiveTime {
                recipe: name.clone(),
                time: spec.time,
            });
        }
        check_quantities(name, &spec.inputs)?;
        check_quantities(name, &spec.outputs)?;

        let (m, machine) = machines
            .index_of(&spec.machine)
            .map(|m| (m, &doc.machines[&spec.machine]))
            .ok_or_else(|| FactoryError::UnknownMachine {
                recipe: name.clone(),
                machine: spec.machine.clone(),
            })?;

        let speed_factor = 1.0 + machine.modules.speed;
        recipe_machine.push(m);
        eff_cpm.push(if speed_factor > 0.0 {
            machine.base_speed * speed_factor * 60.0 / spec.time
        } else {
            0.0
        });
        prod_bonus.push(machine.modules.productivity);
        inputs.push(index_entries(&items, &spec.inputs));
        outputs.push(index_entries(&items, &spec.outputs));
    }

    let machine_cap = doc.machines.values().map(|m| f64::from(m.max)).collect();

    let mut raw_cap = vec![None; items.len()];
    for (name, spec) in &doc.raws {
        if let Some(i) = items.index_of(name) {
            raw_cap[i] = Some(spec.cap.unwrap_or(RAW_CAP_UNLIMITED));
        }
    }

    let target_item = items
        .index_of(&doc.target.item)
        .expect("target item is interned during table construction");

    Ok(Plant {
        items,
        recipes,
        machines,
        target_item,
        target_rate: doc.target.rate,
        recipe_machine,
        eff_cpm,
        prod_bonus,
        inputs,
        outputs,
        machine_cap,
        raw_cap,
    })
}

fn check_quantities(
    recipe: &str,
    entries: &BTreeMap<String, f64>,
) -> Result<(), FactoryError> {
    for (item, &qty) in entries {
        if qty < 0.0 {
            return Err(FactoryError::NegativeQuantity {
                recipe: recipe.to_string(),
                item: item.clone(),
                qty,
            });
        }
    }
    Ok(())
}

fn index_entries(items: &NameTable, entries: &BTreeMap<String, f64>) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> = entries
        .iter()
        .filter_map(|(name, &qty)| items.index_of(name).map(|i| (i, qty)))
        .collect();
    indexed.sort_by_key(|&(i, _)| i);
    indexed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> FactoryDoc {
        serde_json::from_str(json).unwrap()
    }

    fn simple_doc() -> FactoryDoc {
        doc(r#"{
            "target": {"item": "gear", "rate": 30},
            "machines": {
                "press": {"base_speed": 2.0, "max": 5, "modules": {"speed": 0.5, "productivity": 0.2}}
            },
            "recipes": {
                "gear": {"machine": "press", "time": 6.0, "in": {"plate": 2}, "out": {"gear": 1}}
            },
            "raws": {"plate": {"cap": 500}}
        }"#)
    }

    #[test]
    fn effective_rate_includes_speed_modules() {
        let plant = normalize(&simple_doc()).unwrap();
        let r = plant.recipes.index_of("gear").unwrap();
        // 2.0 * 1.5 * 60 / 6 = 30 crafts/min.
        assert!((plant.eff_cpm[r] - 30.0).abs() <= 1e-12);
        assert!((plant.prod_bonus[r] - 0.2).abs() <= 1e-12);
    }

    #[test]
    fn coefficient_applies_productivity_to_outputs_only() {
        let plant = normalize(&simple_doc()).unwrap();
        let r = plant.recipes.index_of("gear").unwrap();
        let gear = plant.items.index_of("gear").unwrap();
        let plate = plant.items.index_of("plate").unwrap();
        assert!((plant.coefficient(gear, r) - 1.2).abs() <= 1e-12);
        assert!((plant.coefficient(plate, r) - (-2.0)).abs() <= 1e-12);
    }

    #[test]
    fn items_cover_target_raws_and_recipe_entries() {
        let plant = normalize(&simple_doc()).unwrap();
        assert_eq!(plant.items.len(), 2);
        assert!(plant.is_raw(plant.items.index_of("plate").unwrap()));
        assert!(!plant.is_raw(plant.target_item));
    }

    #[test]
    fn crippling_speed_module_marks_recipe_unrunnable() {
        let d = doc(r#"{
            "target": {"item": "gear", "rate": 1},
            "machines": {
                "press": {"base_speed": 1.0, "max": 5, "modules": {"speed": -1.0, "productivity": 0}}
            },
            "recipes": {
                "gear": {"machine": "press", "time": 1.0, "out": {"gear": 1}}
            }
        }"#);
        let plant = normalize(&d).unwrap();
        assert_eq!(plant.eff_cpm[0], 0.0);
        assert!(!plant.target_has_producer());
    }

    #[test]
    fn unknown_machine_is_fatal() {
        let d = doc(r#"{
            "target": {"item": "gear", "rate": 1},
            "machines": {},
            "recipes": {"gear": {"machine": "ghost", "time": 1.0, "out": {"gear": 1}}}
        }"#);
        let result = normalize(&d);
        assert!(matches!(
            result,
            Err(FactoryError::UnknownMachine { ref machine, .. }) if machine == "ghost"
        ));
    }

    #[test]
    fn negative_quantity_is_fatal() {
        let d = doc(r#"{
            "target": {"item": "gear", "rate": 1},
            "machines": {"press": {"base_speed": 1, "max": 1}},
            "recipes": {"gear": {"machine": "press", "time": 1.0, "in": {"plate": -2}, "out": {"gear": 1}}}
        }"#);
        assert!(matches!(
            normalize(&d),
            Err(FactoryError::NegativeQuantity { ref item, .. }) if item == "plate"
        ));
    }

    #[test]
    fn missing_raw_cap_means_unlimited() {
        let d = doc(r#"{
            "target": {"item": "gear", "rate": 1},
            "machines": {"press": {"base_speed": 1, "max": 1}},
            "recipes": {"gear": {"machine": "press", "time": 60, "in": {"ore": 1}, "out": {"gear": 1}}},
            "raws": {"ore": {}}
        }"#);
        let plant = normalize(&d).unwrap();
        let ore = plant.items.index_of("ore").unwrap();
        assert_eq!(plant.raw_cap[ore], Some(RAW_CAP_UNLIMITED));
    }

    #[test]
    fn machine_usage_sums_per_type() {
        let plant = normalize(&simple_doc()).unwrap();
        let r = plant.recipes.index_of("gear").unwrap();
        let mut rates = vec![0.0; plant.recipes.len()];
        rates[r] = 60.0;
        let usage = plant.machine_usage(&rates);
        let press = plant.machines.index_of("press").unwrap();
        assert!((usage[press] - 2.0).abs() <= 1e-12);
    }
}
