//! MONAD model-number solver
//!
//! This library folds the fourteen-step digit chain into a symbolic
//! expression, lowers the acceptance condition `z == 0` to CNF and finds the
//! lexicographically largest and smallest accepted model numbers with
//! CaDiCaL.

pub mod config;
pub mod error;
pub mod monad;
pub mod sat;
pub mod search;
pub mod utils;

pub use config::Settings;
pub use error::{MonadError, Result};
pub use monad::{CoefficientTable, ModelNumber};
pub use search::{find_maximum, find_minimum, solve_both, AnswerPair, Direction, OptimizerOptions, Solution};

/// Solve the built-in puzzle table with default options
pub fn solve_puzzle() -> Result<AnswerPair> {
    solve_both(&CoefficientTable::puzzle(), &OptimizerOptions::default())
}
