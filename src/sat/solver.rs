//! SAT solver integration using CaDiCaL

use super::constraints::Clause;
use super::variables::Literal;
use crate::error::{MonadError, Result};
use cadical::{Solver, Timeout};
use std::time::{Duration, Instant};
use tracing::debug;

/// Preset option bundles accepted by CaDiCaL
pub const CADICAL_CONFIGS: [&str; 4] = ["default", "plain", "sat", "unsat"];

/// SAT solver wrapper for CaDiCaL
pub struct SatSolver {
    solver: Solver,
    variable_count: usize,
    clause_count: usize,
    timeout: Option<Duration>,
    solve_calls: usize,
    solve_time: Duration,
}

/// A satisfying assignment
#[derive(Debug, Clone)]
pub struct SolverSolution {
    /// `assignment[v]` is the value of variable `v`; index 0 is unused
    pub assignment: Vec<bool>,
    pub solve_time: Duration,
}

impl SolverSolution {
    /// Truth value of a literal under this assignment
    pub fn value(&self, literal: Literal) -> bool {
        let var = literal.unsigned_abs() as usize;
        let value = self.assignment.get(var).copied().unwrap_or(false);
        if literal < 0 {
            !value
        } else {
            value
        }
    }
}

/// Result of one solve call
#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Sat(SolverSolution),
    Unsat,
    /// Interrupted by the timeout callback
    Unknown,
}

/// Statistics about the solving process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverStatistics {
    pub variable_count: usize,
    pub clause_count: usize,
    pub solve_calls: usize,
    pub solve_time: Duration,
}

impl SatSolver {
    /// Create a new SAT solver instance
    pub fn new() -> Self {
        Self::from_solver(Solver::new())
    }

    /// Create a solver with one of [`CADICAL_CONFIGS`]
    pub fn with_config(config: &str) -> Result<Self> {
        if !CADICAL_CONFIGS.contains(&config) {
            return Err(MonadError::Backend(format!(
                "unknown CaDiCaL configuration {:?} (expected one of {})",
                config,
                CADICAL_CONFIGS.join(", ")
            )));
        }
        let solver = Solver::with_config(config)
            .map_err(|err| MonadError::Backend(format!("CaDiCaL rejected {:?}: {:?}", config, err)))?;
        Ok(Self::from_solver(solver))
    }

    fn from_solver(solver: Solver) -> Self {
        Self {
            solver,
            variable_count: 0,
            clause_count: 0,
            timeout: None,
            solve_calls: 0,
            solve_time: Duration::ZERO,
        }
    }

    /// Limit each subsequent solve call to `timeout`
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Add clauses to the solver
    pub fn add_clauses(&mut self, clauses: &[Clause]) -> Result<()> {
        for clause in clauses {
            self.add_clause(clause)?;
        }
        Ok(())
    }

    /// Add a single clause to the solver
    pub fn add_clause(&mut self, clause: &Clause) -> Result<()> {
        if clause.is_empty() {
            return Err(MonadError::Backend(
                "cannot add empty clause (unsatisfiable)".to_string(),
            ));
        }

        for &literal in &clause.literals {
            let var = literal.unsigned_abs() as usize;
            if var > self.variable_count {
                self.variable_count = var;
            }
        }

        self.solver.add_clause(clause.literals.iter().copied());
        self.clause_count += 1;
        Ok(())
    }

    pub fn solve(&mut self) -> Result<SolveOutcome> {
        self.solve_with(&[])
    }

    /// Solve with `assumptions` holding for this call only
    pub fn solve_with(&mut self, assumptions: &[Literal]) -> Result<SolveOutcome> {
        if let Some(&bad) = assumptions
            .iter()
            .find(|lit| **lit == 0 || lit.unsigned_abs() as usize > self.variable_count)
        {
            return Err(MonadError::Backend(format!(
                "assumption {} names no variable of the formula",
                bad
            )));
        }

        match self.timeout {
            Some(timeout) => self
                .solver
                .set_callbacks(Some(Timeout::new(timeout.as_secs_f32()))),
            None => self.solver.set_callbacks(None),
        }

        let start_time = Instant::now();
        let result = self.solver.solve_with(assumptions.iter().copied());
        let solve_time = start_time.elapsed();
        self.solve_calls += 1;
        self.solve_time += solve_time;

        debug!(
            call = self.solve_calls,
            assumptions = assumptions.len(),
            result = ?result,
            elapsed_ms = solve_time.as_millis() as u64,
            "solve call finished"
        );

        Ok(match result {
            Some(true) => SolveOutcome::Sat(SolverSolution {
                assignment: self.extract_assignment(),
                solve_time,
            }),
            Some(false) => SolveOutcome::Unsat,
            None => SolveOutcome::Unknown,
        })
    }

    /// Extract variable assignment from the solver
    fn extract_assignment(&self) -> Vec<bool> {
        let mut assignment = vec![false; self.variable_count + 1];
        for var in 1..=self.variable_count {
            assignment[var] = self.solver.value(var as i32).unwrap_or(false);
        }
        assignment
    }

    /// Get solver statistics
    pub fn statistics(&self) -> SolverStatistics {
        SolverStatistics {
            variable_count: self.variable_count,
            clause_count: self.clause_count,
            solve_calls: self.solve_calls,
            solve_time: self.solve_time,
        }
    }

    /// Get the number of variables
    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    /// Get the number of clauses
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    pub fn solve_calls(&self) -> usize {
        self.solve_calls
    }
}

impl Default for SatSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SolverStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solver Statistics:")?;
        writeln!(f, "  Variables: {}", self.variable_count)?;
        writeln!(f, "  Clauses: {}", self.clause_count)?;
        writeln!(f, "  Solve calls: {}", self.solve_calls)?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        Ok(())
    }
}

impl std::fmt::Display for SolverSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SAT Solution:")?;
        writeln!(f, "  Solve time: {:.3}s", self.solve_time.as_secs_f64())?;
        writeln!(
            f,
            "  Variables assigned: {}",
            self.assignment.len().saturating_sub(1)
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_creation() {
        let solver = SatSolver::new();
        assert_eq!(solver.variable_count(), 0);
        assert_eq!(solver.clause_count(), 0);
        assert_eq!(solver.solve_calls(), 0);
    }

    #[test]
    fn test_simple_sat() {
        let mut solver = SatSolver::new();

        // (x1 OR x2) AND (NOT x1 OR x2) AND (x1 OR NOT x2)
        solver.add_clause(&Clause::binary(1, 2)).unwrap();
        solver.add_clause(&Clause::binary(-1, 2)).unwrap();
        solver.add_clause(&Clause::binary(1, -2)).unwrap();

        match solver.solve().unwrap() {
            SolveOutcome::Sat(solution) => {
                assert!(solution.value(1));
                assert!(solution.value(2));
                assert!(!solution.value(-1));
            }
            other => panic!("expected SAT, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_unsat() {
        let mut solver = SatSolver::new();

        solver.add_clause(&Clause::unit(1)).unwrap();
        solver.add_clause(&Clause::unit(-1)).unwrap();

        assert!(matches!(solver.solve().unwrap(), SolveOutcome::Unsat));
    }

    #[test]
    fn test_assumptions_are_per_call() {
        let mut solver = SatSolver::new();
        solver.add_clause(&Clause::binary(1, 2)).unwrap();

        assert!(matches!(solver.solve_with(&[-1, -2]).unwrap(), SolveOutcome::Unsat));
        assert!(matches!(solver.solve_with(&[-1]).unwrap(), SolveOutcome::Sat(_)));
        assert!(matches!(solver.solve().unwrap(), SolveOutcome::Sat(_)));
        assert_eq!(solver.statistics().solve_calls, 3);
    }

    #[test]
    fn test_unknown_assumption_rejected() {
        let mut solver = SatSolver::new();
        solver.add_clause(&Clause::unit(1)).unwrap();
        assert!(solver.solve_with(&[7]).is_err());
        assert!(solver.solve_with(&[0]).is_err());
    }

    #[test]
    fn test_empty_clause_rejected() {
        let mut solver = SatSolver::new();
        assert!(solver.add_clause(&Clause::new(vec![])).is_err());
    }

    #[test]
    fn test_configurations() {
        for config in CADICAL_CONFIGS {
            assert!(SatSolver::with_config(config).is_ok(), "{}", config);
        }
        assert!(SatSolver::with_config("fastest").is_err());
    }
}
