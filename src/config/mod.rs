//! Configuration management for the MONAD solver

pub mod settings;

pub use settings::{
    load_program, CliOverrides, InputConfig, OutputConfig, OutputFormat, Settings, SolverConfig,
};
