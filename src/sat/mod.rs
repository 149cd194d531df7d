//! SAT backend: CNF encoding of the digit chain and the CaDiCaL wrapper

pub mod constraints;
pub mod encoder;
pub mod solver;
pub mod variables;

pub use constraints::{BitVector, CircuitBuilder, Clause};
pub use encoder::{ChainEncoder, EncodingStatistics};
pub use solver::{SatSolver, SolveOutcome, SolverSolution, SolverStatistics, CADICAL_CONFIGS};
pub use variables::{Literal, VariableManager, VariableType};
