//! MONAD digit-chain domain: coefficients, expressions, evaluation and the ALU

pub mod alu;
pub mod chain;
pub mod coefficients;
pub mod digits;
pub mod expr;
pub mod reference;

pub use alu::{Instruction, Operand, Program, Register, Registers};
pub use chain::{apply_step, build_chain, evaluate_chain, ChainTrace, DigitChain};
pub use coefficients::{
    CoefficientTable, StepCoefficients, StepKind, DIGIT_COUNT, PUZZLE_COEFFICIENTS, STACK_BASE,
};
pub use digits::{ModelNumber, MAX_DIGIT, MIN_DIGIT};
pub use expr::{ExprId, ExprPool, Interval, Node};
pub use reference::ReferenceSearch;
