//! Reduction of a normalized plant to a linear program.
//!
//! Decision columns, in order:
//! 1. one `x_r` per runnable recipe (crafts per minute),
//! 2. one `u_i` per raw item (external draw per minute),
//! 3. in the max-rate phase, the auxiliary target rate `t`.
//!
//! Rows, in order: one conservation equality per involved item, one capacity
//! inequality per machine hosting a runnable recipe, one supply inequality
//! per raw item. Unrunnable recipes have no column; their rate is fixed at
//! zero by omission.
//!
//! Raw supply is modeled as the explicit draw variable `u_i ∈ [0, cap_i]`
//! entering the conservation equality. This forbids net production of raws,
//! yields `raw_usage` directly, and makes a raw target item feasible exactly
//! when `rate ≤ cap`.

use flowline_lp::LpProblem;

use crate::normalize::{Plant, RAW_CAP_UNLIMITED};

/// Which of the two solver phases the program encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Phase 1: feasibility at the requested target rate, minimizing total
    /// machines.
    FixedTarget,
    /// Phase 2: maximize the auxiliary target rate `t`.
    MaxTarget,
}

/// The assembled program plus the column maps needed to read answers back.
#[derive(Debug)]
pub struct ReducedLp {
    pub lp: LpProblem,
    /// Recipe index per `x` column.
    pub x_cols: Vec<usize>,
    /// Item index per `u` column, ascending.
    pub u_cols: Vec<usize>,
    /// Column of the auxiliary rate variable in the max-rate phase.
    pub t_col: Option<usize>,
}

impl ReducedLp {
    /// Expand a solver solution back to per-recipe rates and per-item draws.
    pub fn expand(&self, plant: &Plant, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut rates = vec![0.0; plant.recipes.len()];
        for (col, &r) in self.x_cols.iter().enumerate() {
            rates[r] = x[col];
        }
        let mut draws = vec![0.0; plant.items.len()];
        for (offset, &i) in self.u_cols.iter().enumerate() {
            draws[i] = x[self.x_cols.len() + offset];
        }
        (rates, draws)
    }
}

/// Assemble the program for the given phase.
pub fn build_lp(plant: &Plant, phase: Phase) -> ReducedLp {
    let x_cols: Vec<usize> = (0..plant.recipes.len())
        .filter(|&r| plant.eff_cpm[r] > 0.0)
        .collect();
    let u_cols = plant.raw_items();

    let nx = x_cols.len();
    let nu = u_cols.len();
    let num_vars = nx + nu + usize::from(phase == Phase::MaxTarget);
    let t_col = (phase == Phase::MaxTarget).then_some(nx + nu);

    let mut lp = LpProblem::new(num_vars);

    // Conservation equalities, one per involved item in canonical order.
    for item in 0..plant.items.len() {
        let mut row = vec![0.0; num_vars];
        let mut involved = false;
        for (col, &r) in x_cols.iter().enumerate() {
            let c = plant.coefficient(item, r);
            if c != 0.0 {
                row[col] = c;
                involved = true;
            }
        }
        if let Some(offset) = u_cols.iter().position(|&i| i == item) {
            row[nx + offset] = 1.0;
            involved = true;
        }
        let mut rhs = 0.0;
        if item == plant.target_item {
            match phase {
                Phase::FixedTarget => rhs = plant.target_rate,
                Phase::MaxTarget => {
                    if let Some(t) = t_col {
                        row[t] = -1.0;
                    }
                    involved = true;
                }
            }
        }
        if involved || rhs != 0.0 {
            lp.add_eq(row, rhs);
        }
    }

    // Machine capacity rows for machines hosting at least one runnable
    // recipe.
    for machine in 0..plant.machines.len() {
        let mut row = vec![0.0; num_vars];
        let mut hosts = false;
        for (col, &r) in x_cols.iter().enumerate() {
            if plant.recipe_machine[r] == machine {
                row[col] = 1.0 / plant.eff_cpm[r];
                hosts = true;
            }
        }
        if hosts {
            lp.add_ub(row, plant.machine_cap[machine]);
        }
    }

    // Raw supply rows: u_i ≤ cap_i. Unlimited caps get no row; the huge
    // sentinel would otherwise poison the tableau's scaling.
    for (offset, &item) in u_cols.iter().enumerate() {
        if let Some(cap) = plant.raw_cap[item] {
            if cap < RAW_CAP_UNLIMITED {
                let mut row = vec![0.0; num_vars];
                row[nx + offset] = 1.0;
                lp.add_ub(row, cap);
            }
        }
    }

    let objective = match phase {
        Phase::FixedTarget => {
            // Total machines: Σ x_r / eff_cpm(r). Also the tie-break toward
            // the smallest fleet among feasible optima.
            let mut c = vec![0.0; num_vars];
            for (col, &r) in x_cols.iter().enumerate() {
                c[col] = 1.0 / plant.eff_cpm[r];
            }
            c
        }
        Phase::MaxTarget => {
            let mut c = vec![0.0; num_vars];
            if let Some(t) = t_col {
                c[t] = -1.0;
            }
            c
        }
    };
    lp.set_objective(objective);

    ReducedLp {
        lp,
        x_cols,
        u_cols,
        t_col,
    }
}
