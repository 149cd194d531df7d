//! The four-register ALU that MONAD programs are written for
//!
//! Programs use six instructions over registers `w x y z`:
//! `inp a`, `add a b`, `mul a b`, `div a b`, `mod a b`, `eql a b`.
//! Division truncates toward zero. Dividing by zero, or taking `mod` with a
//! negative left operand or a non-positive right operand, is a fault.

use super::coefficients::{CoefficientTable, StepCoefficients, DIGIT_COUNT, STACK_BASE};
use crate::error::{MonadError, Result};
use std::str::FromStr;

/// Instructions per digit in a canonical MONAD program
pub const BLOCK_LEN: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    W,
    X,
    Y,
    Z,
}

impl Register {
    fn index(self) -> usize {
        match self {
            Register::W => 0,
            Register::X => 1,
            Register::Y => 2,
            Register::Z => 3,
        }
    }
}

impl FromStr for Register {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "w" => Ok(Register::W),
            "x" => Ok(Register::X),
            "y" => Ok(Register::Y),
            "z" => Ok(Register::Z),
            other => Err(format!("unknown register {:?}", other)),
        }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Register::W => "w",
            Register::X => "x",
            Register::Y => "y",
            Register::Z => "z",
        };
        write!(f, "{}", name)
    }
}

/// Right-hand operand: a register or an integer literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    Literal(i64),
}

impl FromStr for Operand {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        if let Ok(register) = s.parse::<Register>() {
            return Ok(Operand::Register(register));
        }
        s.parse::<i64>()
            .map(Operand::Literal)
            .map_err(|_| format!("expected a register or integer, found {:?}", s))
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{}", register),
            Operand::Literal(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Inp(Register),
    Add(Register, Operand),
    Mul(Register, Operand),
    Div(Register, Operand),
    Mod(Register, Operand),
    Eql(Register, Operand),
}

impl Instruction {
    fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut parts = text.split_whitespace();
        let opcode = parts.next().ok_or("empty instruction")?;
        let target: Register = parts
            .next()
            .ok_or_else(|| format!("`{}` is missing its target register", opcode))?
            .parse()?;

        let instruction = if opcode == "inp" {
            Instruction::Inp(target)
        } else {
            let operand: Operand = parts
                .next()
                .ok_or_else(|| format!("`{}` is missing its second operand", opcode))?
                .parse()?;
            match opcode {
                "add" => Instruction::Add(target, operand),
                "mul" => Instruction::Mul(target, operand),
                "div" => Instruction::Div(target, operand),
                "mod" => Instruction::Mod(target, operand),
                "eql" => Instruction::Eql(target, operand),
                other => return Err(format!("unknown opcode {:?}", other)),
            }
        };

        if let Some(extra) = parts.next() {
            return Err(format!("unexpected trailing token {:?}", extra));
        }
        Ok(instruction)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Inp(a) => write!(f, "inp {}", a),
            Instruction::Add(a, b) => write!(f, "add {} {}", a, b),
            Instruction::Mul(a, b) => write!(f, "mul {} {}", a, b),
            Instruction::Div(a, b) => write!(f, "div {} {}", a, b),
            Instruction::Mod(a, b) => write!(f, "mod {} {}", a, b),
            Instruction::Eql(a, b) => write!(f, "eql {} {}", a, b),
        }
    }
}

/// Register file after a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers([i64; 4]);

impl Registers {
    pub fn get(&self, register: Register) -> i64 {
        self.0[register.index()]
    }

    fn set(&mut self, register: Register, value: i64) {
        self.0[register.index()] = value;
    }

    fn read(&self, operand: Operand) -> i64 {
        match operand {
            Operand::Register(register) => self.get(register),
            Operand::Literal(value) => value,
        }
    }
}

/// A parsed ALU program with the source line of every instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    lines: Vec<usize>,
}

impl Program {
    /// Parse program text; blank lines and `#` comments are skipped
    pub fn parse(text: &str) -> Result<Self> {
        let mut instructions = Vec::new();
        let mut lines = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let instruction = Instruction::parse(line).map_err(|message| MonadError::Program {
                line: index + 1,
                message,
            })?;
            instructions.push(instruction);
            lines.push(index + 1);
        }
        Ok(Self { instructions, lines })
    }

    /// Render a coefficient table as the canonical MONAD program
    pub fn from_table(table: &CoefficientTable) -> Self {
        let instructions: Vec<Instruction> = table.iter().flat_map(canonical_block).collect();
        let lines = (1..=instructions.len()).collect();
        Self { instructions, lines }
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Execute with `inputs` consumed by successive `inp` instructions
    pub fn run(&self, inputs: &[i64]) -> Result<Registers> {
        let mut registers = Registers::default();
        let mut inputs = inputs.iter().copied();

        for (instruction, &line) in self.instructions.iter().zip(&self.lines) {
            let fault = |message: &str| MonadError::Execution(format!("line {}: {}", line, message));
            match *instruction {
                Instruction::Inp(a) => {
                    let value = inputs.next().ok_or_else(|| fault("input exhausted"))?;
                    registers.set(a, value);
                }
                Instruction::Add(a, b) => {
                    let value = registers
                        .get(a)
                        .checked_add(registers.read(b))
                        .ok_or_else(|| fault("overflow in add"))?;
                    registers.set(a, value);
                }
                Instruction::Mul(a, b) => {
                    let value = registers
                        .get(a)
                        .checked_mul(registers.read(b))
                        .ok_or_else(|| fault("overflow in mul"))?;
                    registers.set(a, value);
                }
                Instruction::Div(a, b) => {
                    let divisor = registers.read(b);
                    if divisor == 0 {
                        return Err(fault("division by zero"));
                    }
                    let value = registers
                        .get(a)
                        .checked_div(divisor)
                        .ok_or_else(|| fault("overflow in div"))?;
                    registers.set(a, value);
                }
                Instruction::Mod(a, b) => {
                    let dividend = registers.get(a);
                    let divisor = registers.read(b);
                    if dividend < 0 || divisor <= 0 {
                        return Err(fault(&format!("mod {} {} is undefined", dividend, divisor)));
                    }
                    registers.set(a, dividend % divisor);
                }
                Instruction::Eql(a, b) => {
                    let value = i64::from(registers.get(a) == registers.read(b));
                    registers.set(a, value);
                }
            }
        }
        Ok(registers)
    }

    /// Recover the coefficient table from a canonical MONAD program
    pub fn extract_coefficients(&self) -> Result<CoefficientTable> {
        let expected_len = DIGIT_COUNT * BLOCK_LEN;
        if self.instructions.len() != expected_len {
            return Err(MonadError::Program {
                line: self.lines.last().copied().unwrap_or(0),
                message: format!(
                    "expected {} instructions ({} blocks of {}), found {}",
                    expected_len,
                    DIGIT_COUNT,
                    BLOCK_LEN,
                    self.instructions.len()
                ),
            });
        }

        let mut steps = Vec::with_capacity(DIGIT_COUNT);
        for (block, chunk) in self.instructions.chunks(BLOCK_LEN).enumerate() {
            let offset = block * BLOCK_LEN;
            let literal = |index: usize| -> Result<i64> {
                match chunk[index] {
                    Instruction::Div(_, Operand::Literal(v)) | Instruction::Add(_, Operand::Literal(v)) => {
                        Ok(v)
                    }
                    other => Err(MonadError::Program {
                        line: self.lines[offset + index],
                        message: format!("expected a literal operand, found `{}`", other),
                    }),
                }
            };
            let step = StepCoefficients::new(literal(4)?, literal(5)?, literal(15)?);

            for (index, (found, expected)) in chunk.iter().zip(canonical_block(&step)).enumerate() {
                if *found != expected {
                    return Err(MonadError::Program {
                        line: self.lines[offset + index],
                        message: format!("expected `{}`, found `{}`", expected, found),
                    });
                }
            }
            steps.push(step);
        }

        CoefficientTable::try_from(steps)
    }
}

impl FromStr for Program {
    type Err = MonadError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

/// The 18 instructions computing one step of the recurrence
fn canonical_block(step: &StepCoefficients) -> [Instruction; BLOCK_LEN] {
    use Instruction::*;
    use Operand::{Literal, Register as Reg};
    use Register::{W, X, Y, Z};

    [
        Inp(W),
        Mul(X, Literal(0)),
        Add(X, Reg(Z)),
        Mod(X, Literal(STACK_BASE)),
        Div(Z, Literal(step.div)),
        Add(X, Literal(step.cmp)),
        Eql(X, Reg(W)),
        Eql(X, Literal(0)),
        Mul(Y, Literal(0)),
        Add(Y, Literal(STACK_BASE - 1)),
        Mul(Y, Reg(X)),
        Add(Y, Literal(1)),
        Mul(Z, Reg(Y)),
        Mul(Y, Literal(0)),
        Add(Y, Reg(W)),
        Add(Y, Literal(step.add)),
        Mul(Y, Reg(X)),
        Add(Z, Reg(Y)),
    ]
}
