//! Deterministic dense two-phase primal simplex.
//!
//! Solves `min c·x` subject to `A_eq·x = b_eq`, `A_ub·x ≤ b_ub`, `x ≥ 0`.
//! Built for the small, dense programs the factory reducer assembles: a few
//! hundred variables and rows, solved once per process.
//!
//! # Determinism contract
//!
//! - Entering variable: Bland's rule, the lowest-index column with reduced
//!   cost below `-EPS`. This also rules out cycling.
//! - Leaving variable: minimum ratio; ties within tolerance break toward the
//!   lowest basic variable index.
//! - All comparisons use the shared [`EPS`] from `flowline-core`.
//!
//! The result is an explicit status variant; callers branch on the tag and
//! never see a partially solved tableau.

use flowline_core::tol::EPS;

// ---------------------------------------------------------------------------
// Problem description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Row {
    coeffs: Vec<f64>,
    rhs: f64,
}

/// A linear program over non-negative decision variables.
#[derive(Debug, Clone)]
pub struct LpProblem {
    num_vars: usize,
    objective: Vec<f64>,
    eq: Vec<Row>,
    ub: Vec<Row>,
}

impl LpProblem {
    /// Create a program with `num_vars` non-negative variables and a zero
    /// objective.
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            objective: vec![0.0; num_vars],
            eq: Vec::new(),
            ub: Vec::new(),
        }
    }

    /// Replace the minimization objective. Length must match `num_vars`.
    pub fn set_objective(&mut self, coeffs: Vec<f64>) {
        assert_eq!(coeffs.len(), self.num_vars, "objective length mismatch");
        self.objective = coeffs;
    }

    /// Add an equality row `coeffs · x = rhs`.
    pub fn add_eq(&mut self, coeffs: Vec<f64>, rhs: f64) {
        assert_eq!(coeffs.len(), self.num_vars, "equality row length mismatch");
        self.eq.push(Row { coeffs, rhs });
    }

    /// Add an inequality row `coeffs · x ≤ rhs`.
    pub fn add_ub(&mut self, coeffs: Vec<f64>, rhs: f64) {
        assert_eq!(coeffs.len(), self.num_vars, "inequality row length mismatch");
        self.ub.push(Row { coeffs, rhs });
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn num_rows(&self) -> usize {
        self.eq.len() + self.ub.len()
    }

    /// Solve the program. Every call rebuilds the tableau from scratch, so
    /// repeated calls on the same problem return identical results.
    pub fn solve(&self) -> LpStatus {
        let mut t = Tableau::build(self);

        // Phase 1: minimize the artificial sum to find a feasible basis.
        let mut phase1_cost = vec![0.0; t.ncols];
        for c in phase1_cost.iter_mut().skip(t.art_start) {
            *c = 1.0;
        }
        match t.optimize(&phase1_cost, t.ncols) {
            RunOutcome::Optimal => {}
            // Phase 1 is bounded below by zero; anything else is numerical.
            RunOutcome::Unbounded | RunOutcome::IterationLimit => {
                return LpStatus::IterationLimit;
            }
        }

        let artificial_sum: f64 = t
            .basis
            .iter()
            .zip(t.rows.iter())
            .filter(|(b, _)| **b >= t.art_start)
            .map(|(_, row)| row[t.ncols])
            .sum();
        if artificial_sum > EPS * t.rhs_scale.max(1.0) {
            return LpStatus::Infeasible;
        }

        t.eliminate_basic_artificials();

        // Phase 2: minimize the real objective over the feasible basis.
        // Artificial columns are excluded from entering; none are basic.
        let mut phase2_cost = vec![0.0; t.ncols];
        phase2_cost[..t.num_struct].copy_from_slice(&self.objective);
        match t.optimize(&phase2_cost, t.art_start) {
            RunOutcome::Optimal => {}
            RunOutcome::Unbounded => return LpStatus::Unbounded,
            RunOutcome::IterationLimit => return LpStatus::IterationLimit,
        }

        let x = t.extract();
        let objective = self.objective.iter().zip(x.iter()).map(|(c, v)| c * v).sum();
        LpStatus::Optimal(LpSolution { x, objective })
    }
}

/// Outcome of a solve. `IterationLimit` marks a numerical failure: the
/// tableau did not terminate within the pivot budget.
#[derive(Debug, Clone, PartialEq)]
pub enum LpStatus {
    Optimal(LpSolution),
    Infeasible,
    Unbounded,
    IterationLimit,
}

impl LpStatus {
    /// Short stable tag for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            LpStatus::Optimal(_) => "optimal",
            LpStatus::Infeasible => "infeasible",
            LpStatus::Unbounded => "unbounded",
            LpStatus::IterationLimit => "iteration-limit",
        }
    }
}

/// A primal-feasible optimum.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// Values of the structural variables, in problem order.
    pub x: Vec<f64>,
    /// The objective value `c · x`.
    pub objective: f64,
}

// ---------------------------------------------------------------------------
// Tableau
// ---------------------------------------------------------------------------

/// Outcome of one simplex run over a fixed cost vector.
enum RunOutcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

struct Tableau {
    /// `m` rows of `ncols + 1` entries; the last entry is the rhs.
    rows: Vec<Vec<f64>>,
    /// Basic variable per row.
    basis: Vec<usize>,
    num_struct: usize,
    /// First artificial column; structural and slack columns sit below it.
    art_start: usize,
    ncols: usize,
    /// Largest |rhs| among rows carrying an artificial. Scales the phase-1
    /// feasibility decision; slack-seeded rows never leave residue in the
    /// artificial sum and must not inflate the threshold.
    rhs_scale: f64,
    iterations: usize,
    max_iterations: usize,
}

impl Tableau {
    fn build(p: &LpProblem) -> Self {
        let num_struct = p.num_vars;
        let num_slack = p.ub.len();
        let art_start = num_struct + num_slack;

        // Artificials: one per equality row, plus one per inequality row
        // whose rhs is negative (its slack alone cannot seed the basis).
        let num_art = p.eq.len() + p.ub.iter().filter(|r| r.rhs < 0.0).count();
        let ncols = art_start + num_art;
        let m = p.num_rows();

        let mut rows = Vec::with_capacity(m);
        let mut basis = Vec::with_capacity(m);
        let mut next_art = art_start;
        let mut rhs_scale: f64 = 1.0;

        for (slack_idx, r) in p.ub.iter().enumerate() {
            let mut row = vec![0.0; ncols + 1];
            let flip = if r.rhs < 0.0 { -1.0 } else { 1.0 };
            for (j, &c) in r.coeffs.iter().enumerate() {
                row[j] = flip * c;
            }
            row[num_struct + slack_idx] = flip;
            row[ncols] = flip * r.rhs;
            if flip < 0.0 {
                row[next_art] = 1.0;
                basis.push(next_art);
                next_art += 1;
                rhs_scale = rhs_scale.max(r.rhs.abs());
            } else {
                basis.push(num_struct + slack_idx);
            }
            rows.push(row);
        }

        for r in &p.eq {
            let mut row = vec![0.0; ncols + 1];
            let flip = if r.rhs < 0.0 { -1.0 } else { 1.0 };
            for (j, &c) in r.coeffs.iter().enumerate() {
                row[j] = flip * c;
            }
            row[ncols] = flip * r.rhs;
            rhs_scale = rhs_scale.max(r.rhs.abs());
            row[next_art] = 1.0;
            basis.push(next_art);
            next_art += 1;
            rows.push(row);
        }

        let max_iterations = 10_000 + 200 * (m + ncols);
        Self {
            rows,
            basis,
            num_struct,
            art_start,
            ncols,
            rhs_scale,
            iterations: 0,
            max_iterations,
        }
    }

    /// One simplex run: Bland entering over columns `< col_limit`, ratio
    /// test with lowest-basis-index tie-breaking.
    fn optimize(&mut self, cost: &[f64], col_limit: usize) -> RunOutcome {
        loop {
            self.iterations += 1;
            if self.iterations > self.max_iterations {
                return RunOutcome::IterationLimit;
            }

            // Simplex multipliers from the basic costs.
            let y: Vec<f64> = self.basis.iter().map(|&b| cost[b]).collect();

            // Entering column: lowest index with reduced cost < -EPS.
            let mut entering = None;
            for j in 0..col_limit {
                if self.basis.contains(&j) {
                    continue;
                }
                let mut z = 0.0;
                for (i, row) in self.rows.iter().enumerate() {
                    z += y[i] * row[j];
                }
                if cost[j] - z < -EPS {
                    entering = Some(j);
                    break;
                }
            }
            let Some(j) = entering else {
                return RunOutcome::Optimal;
            };

            // Ratio test.
            let mut leave: Option<(usize, f64)> = None;
            for (i, row) in self.rows.iter().enumerate() {
                let a = row[j];
                if a > EPS {
                    let ratio = row[self.ncols] / a;
                    match leave {
                        None => leave = Some((i, ratio)),
                        Some((best_i, best_ratio)) => {
                            let tie = EPS * best_ratio.abs().max(1.0);
                            if ratio < best_ratio - tie {
                                leave = Some((i, ratio));
                            } else if (ratio - best_ratio).abs() <= tie
                                && self.basis[i] < self.basis[best_i]
                            {
                                leave = Some((i, ratio));
                            }
                        }
                    }
                }
            }
            let Some((r, _)) = leave else {
                return RunOutcome::Unbounded;
            };

            self.pivot(r, j);
        }
    }

    /// Pivot on `(row r, column j)`: normalize the pivot row, eliminate the
    /// column from every other row, and update the basis.
    fn pivot(&mut self, r: usize, j: usize) {
        let pivot = self.rows[r][j];
        for v in self.rows[r].iter_mut() {
            *v /= pivot;
        }
        let pivot_row = self.rows[r].clone();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let factor = row[j];
            if factor != 0.0 {
                for (v, p) in row.iter_mut().zip(pivot_row.iter()) {
                    *v -= factor * p;
                }
            }
        }
        self.basis[r] = j;
    }

    /// After phase 1, no artificial may stay basic: pivot each one out on
    /// any real column, or drop its row as redundant. Both are degenerate
    /// operations (the row's rhs is zero), so feasibility is preserved.
    fn eliminate_basic_artificials(&mut self) {
        let mut i = 0;
        while i < self.rows.len() {
            if self.basis[i] < self.art_start {
                i += 1;
                continue;
            }
            let mut pivot_col = None;
            for j in 0..self.art_start {
                if self.rows[i][j].abs() > EPS {
                    pivot_col = Some(j);
                    break;
                }
            }
            match pivot_col {
                Some(j) => {
                    self.pivot(i, j);
                    i += 1;
                }
                None => {
                    // The row is zero across real columns: a redundant
                    // constraint. Remove it.
                    self.rows.remove(i);
                    self.basis.remove(i);
                }
            }
        }
    }

    /// Read the structural solution out of the basis.
    fn extract(&self) -> Vec<f64> {
        let mut x = vec![0.0; self.num_struct];
        for (i, &b) in self.basis.iter().enumerate() {
            if b < self.num_struct {
                x[b] = self.rows[i][self.ncols];
            }
        }
        x
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
