//! Lexicographic optimization of the model number over the SAT encoding
//!
//! Fourteen objectives, one per digit position, are registered in position
//! order; earlier objectives dominate later ones. After one unconstrained
//! solve, each position in turn is pushed as far as it will go with all
//! earlier positions held at their decided values.

use super::solution::{AnswerPair, Solution, SolveStatistics};
use crate::error::{MonadError, Result};
use crate::monad::{
    build_chain, evaluate_chain, CoefficientTable, DigitChain, ModelNumber, DIGIT_COUNT,
    MAX_DIGIT, MIN_DIGIT,
};
use crate::sat::{ChainEncoder, Literal, SatSolver, SolveOutcome};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Default per-run time limit
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Which extreme of the accepted model numbers to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Maximize,
    Minimize,
}

impl Direction {
    /// Digit values from most to least preferred
    pub fn preference(self) -> Vec<u8> {
        match self {
            Direction::Maximize => (MIN_DIGIT..=MAX_DIGIT).rev().collect(),
            Direction::Minimize => (MIN_DIGIT..=MAX_DIGIT).collect(),
        }
    }

    /// Whether `candidate` is strictly better than `current`
    pub fn improves(self, candidate: u8, current: u8) -> bool {
        match self {
            Direction::Maximize => candidate > current,
            Direction::Minimize => candidate < current,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Maximize => write!(f, "maximize"),
            Direction::Minimize => write!(f, "minimize"),
        }
    }
}

/// One registered objective; registration order is priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    pub position: usize,
    pub direction: Direction,
}

/// Lifecycle of an [`OptimizationRun`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Chain built, nothing asserted yet
    Built,
    /// `z_final == 0` asserted and objectives registered
    Constrained,
    Solving,
    Solved,
    Failed,
}

/// Knobs for a single optimization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerOptions {
    /// Wall-clock budget for the whole run; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// CaDiCaL preset, one of [`crate::sat::CADICAL_CONFIGS`]
    pub cadical_config: String,
    /// Run maximization and minimization on separate threads
    pub parallel: bool,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            cadical_config: "default".to_string(),
            parallel: false,
        }
    }
}

/// One independent optimization: its own expression pool, encoding and solver
pub struct OptimizationRun {
    direction: Direction,
    table: CoefficientTable,
    chain: DigitChain,
    encoder: ChainEncoder,
    solver: SatSolver,
    objectives: Vec<Objective>,
    options: OptimizerOptions,
    state: RunState,
}

impl OptimizationRun {
    /// Build the symbolic chain for `table`
    pub fn new(table: &CoefficientTable, direction: Direction, options: OptimizerOptions) -> Result<Self> {
        let chain = build_chain(table);
        let encoder = ChainEncoder::new()?;
        let solver = SatSolver::with_config(&options.cadical_config)?;
        debug!(%direction, nodes = chain.pool().len(), "built digit chain");

        Ok(Self {
            direction,
            table: table.clone(),
            chain,
            encoder,
            solver,
            objectives: Vec::with_capacity(DIGIT_COUNT),
            options,
            state: RunState::Built,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn objectives(&self) -> &[Objective] {
        &self.objectives
    }

    /// Assert `z_final == 0` and register one objective per position
    pub fn constrain(&mut self) -> Result<()> {
        if self.state != RunState::Built {
            return Err(MonadError::InvalidState(format!(
                "cannot constrain a run in state {:?}",
                self.state
            )));
        }

        let result = self.assert_acceptance();
        self.state = if result.is_ok() {
            RunState::Constrained
        } else {
            RunState::Failed
        };
        result
    }

    fn assert_acceptance(&mut self) -> Result<()> {
        self.encoder
            .assert_zero(self.chain.pool(), self.chain.z_final())?;
        self.solver.add_clauses(&self.encoder.take_clauses())?;
        self.objectives = (0..DIGIT_COUNT)
            .map(|position| Objective {
                position,
                direction: self.direction,
            })
            .collect();
        Ok(())
    }

    /// Run the lexicographic search; constrains first when still `Built`
    pub fn solve(&mut self) -> Result<Solution> {
        if self.state == RunState::Built {
            self.constrain()?;
        }
        if self.state != RunState::Constrained {
            return Err(MonadError::InvalidState(format!(
                "cannot solve a run in state {:?}",
                self.state
            )));
        }

        self.state = RunState::Solving;
        let started = Instant::now();
        let result = self.search(started);
        self.state = match &result {
            Ok(_) => RunState::Solved,
            Err(_) => RunState::Failed,
        };
        result
    }

    fn search(&mut self, started: Instant) -> Result<Solution> {
        let mut current = match self.call(&[], started)? {
            Some(number) => number,
            None => {
                return Err(self.failure("no model number drives the accumulator to zero"));
            }
        };
        debug!(direction = %self.direction, initial = %current, "initial model");

        let mut decided: Vec<Literal> = Vec::with_capacity(DIGIT_COUNT);
        for objective in self.objectives.clone() {
            let position = objective.position;
            let present = current.digit(position);

            let candidates: Vec<u8> = objective
                .direction
                .preference()
                .into_iter()
                .filter(|&candidate| objective.direction.improves(candidate, present))
                .collect();

            for candidate in candidates {
                let mut assumptions = decided.clone();
                assumptions.push(self.literal(position, candidate)?);
                if let Some(improved) = self.call(&assumptions, started)? {
                    current = improved;
                    break;
                }
            }

            debug!(position, value = current.digit(position), "decided digit");
            decided.push(self.literal(position, current.digit(position))?);
        }

        let trace = evaluate_chain(&self.table, &current)?;
        if !trace.is_accepted() {
            return Err(self.failure(&format!(
                "model {} leaves the accumulator at {}",
                current,
                trace.z_final()
            )));
        }

        let encoding = self.encoder.statistics();
        let solving = self.solver.statistics();
        let statistics = SolveStatistics {
            variables: solving.variable_count,
            clauses: solving.clause_count,
            solve_calls: solving.solve_calls,
            encoded_nodes: encoding.encoded_nodes,
            division_witnesses: encoding.division_witnesses,
            elapsed: started.elapsed(),
        };
        info!(
            direction = %self.direction,
            model_number = %current,
            solve_calls = statistics.solve_calls,
            elapsed_ms = statistics.elapsed.as_millis() as u64,
            "optimization finished"
        );
        Ok(Solution::new(current, self.direction, statistics))
    }

    /// One solve under `assumptions`; `None` when unsatisfiable
    fn call(&mut self, assumptions: &[Literal], started: Instant) -> Result<Option<ModelNumber>> {
        if let Some(limit) = self.options.timeout {
            let remaining = limit.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(self.timed_out(started));
            }
            self.solver.set_timeout(Some(remaining));
        }

        match self.solver.solve_with(assumptions)? {
            SolveOutcome::Sat(solution) => self.encoder.decode(&solution).map(Some),
            SolveOutcome::Unsat => Ok(None),
            SolveOutcome::Unknown => match self.options.timeout {
                Some(limit) if started.elapsed() >= limit => Err(self.timed_out(started)),
                _ => Err(self.failure("solver returned unknown")),
            },
        }
    }

    fn literal(&self, position: usize, value: u8) -> Result<Literal> {
        self.encoder.digit_literal(position, value).ok_or_else(|| {
            MonadError::InvalidState(format!("no literal for digit {} = {}", position, value))
        })
    }

    fn failure(&self, reason: &str) -> MonadError {
        MonadError::SolverFailure {
            direction: self.direction,
            reason: reason.to_string(),
        }
    }

    fn timed_out(&self, started: Instant) -> MonadError {
        MonadError::Timeout {
            direction: self.direction,
            elapsed: started.elapsed(),
        }
    }
}

/// Find the lexicographically best accepted model number in `direction`
pub fn optimize(table: &CoefficientTable, direction: Direction, options: &OptimizerOptions) -> Result<Solution> {
    info!(%direction, timeout = ?options.timeout, "starting optimization run");
    let mut run = OptimizationRun::new(table, direction, options.clone())?;
    run.constrain()?;
    run.solve()
}

pub fn find_maximum(table: &CoefficientTable, options: &OptimizerOptions) -> Result<Solution> {
    optimize(table, Direction::Maximize, options)
}

pub fn find_minimum(table: &CoefficientTable, options: &OptimizerOptions) -> Result<Solution> {
    optimize(table, Direction::Minimize, options)
}

/// Maximum then minimum, on two threads when `options.parallel` is set
pub fn solve_both(table: &CoefficientTable, options: &OptimizerOptions) -> Result<AnswerPair> {
    if options.parallel {
        let (maximum, minimum) =
            rayon::join(|| find_maximum(table, options), || find_minimum(table, options));
        return Ok(AnswerPair {
            maximum: maximum?,
            minimum: minimum?,
        });
    }

    // The minimum run is skipped once the maximum run has failed
    let maximum = find_maximum(table, options)?;
    let minimum = find_minimum(table, options)?;
    Ok(AnswerPair { maximum, minimum })
}
