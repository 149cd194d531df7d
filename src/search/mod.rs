//! Optimization driver: lexicographic search and result checking

pub mod optimizer;
pub mod solution;
pub mod validator;

pub use optimizer::{
    find_maximum, find_minimum, optimize, solve_both, Direction, Objective, OptimizationRun,
    OptimizerOptions, RunState, DEFAULT_TIMEOUT,
};
pub use solution::{AnswerPair, Solution, SolveStatistics};
pub use validator::{SolutionValidator, ValidationResult};
