//! Per-position coefficient triples of the digit chain

use crate::error::{MonadError, Result};
use serde::{Deserialize, Serialize};

/// Number of digit positions (and fold steps) in a model number
pub const DIGIT_COUNT: usize = 14;

/// Radix of the accumulator's digit stack; also the divisor of every pop step
pub const STACK_BASE: i64 = 26;

/// Coefficients `(div, cmp, add)` applied at one fold step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepCoefficients {
    pub div: i64,
    pub cmp: i64,
    pub add: i64,
}

/// Whether a step can shrink the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// `div == 1`: never shrinks the accumulator
    Push,
    /// `div == 26`: drops the top stack digit when the step's digit matches
    Pop,
}

impl StepCoefficients {
    pub const fn new(div: i64, cmp: i64, add: i64) -> Self {
        Self { div, cmp, add }
    }

    /// Classify the step by its divisor
    pub fn kind(&self) -> StepKind {
        if self.div == 1 {
            StepKind::Push
        } else {
            StepKind::Pop
        }
    }
}

impl std::fmt::Display for StepCoefficients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{})", self.div, self.cmp, self.add)
    }
}

/// The puzzle's coefficient table, in fold order.
pub const PUZZLE_COEFFICIENTS: [StepCoefficients; DIGIT_COUNT] = [
    StepCoefficients::new(1, 0, 12),
    StepCoefficients::new(1, 0, 7),
    StepCoefficients::new(1, 0, 8),
    StepCoefficients::new(1, 0, 8),
    StepCoefficients::new(1, 0, 15),
    StepCoefficients::new(26, -16, 12),
    StepCoefficients::new(1, 0, 8),
    StepCoefficients::new(26, -11, 13),
    StepCoefficients::new(26, -13, 3),
    StepCoefficients::new(1, 0, 13),
    StepCoefficients::new(26, -8, 3),
    StepCoefficients::new(26, -1, 9),
    StepCoefficients::new(26, -4, 4),
    StepCoefficients::new(26, -14, 13),
];

/// Validated, ordered table of exactly [`DIGIT_COUNT`] steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoefficientTable {
    steps: [StepCoefficients; DIGIT_COUNT],
}

impl CoefficientTable {
    /// Create a table, rejecting non-positive divisors
    pub fn new(steps: [StepCoefficients; DIGIT_COUNT]) -> Result<Self> {
        for (position, step) in steps.iter().enumerate() {
            if step.div <= 0 {
                return Err(MonadError::InvalidCoefficients(format!(
                    "step {} has non-positive divisor {}",
                    position, step.div
                )));
            }
        }
        Ok(Self { steps })
    }

    /// The hard-coded puzzle table
    pub fn puzzle() -> Self {
        Self {
            steps: PUZZLE_COEFFICIENTS,
        }
    }

    pub fn steps(&self) -> &[StepCoefficients; DIGIT_COUNT] {
        &self.steps
    }

    pub fn step(&self, position: usize) -> Option<&StepCoefficients> {
        self.steps.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepCoefficients> {
        self.steps.iter()
    }

    /// Copy of this table with one step replaced
    pub fn with_step(&self, position: usize, step: StepCoefficients) -> Result<Self> {
        if position >= DIGIT_COUNT {
            return Err(MonadError::InvalidCoefficients(format!(
                "position {} out of range (table has {} steps)",
                position, DIGIT_COUNT
            )));
        }
        let mut steps = self.steps;
        steps[position] = step;
        Self::new(steps)
    }

    /// Number of steps with [`StepKind::Pop`]
    pub fn pop_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.kind() == StepKind::Pop)
            .count()
    }
}

impl Default for CoefficientTable {
    fn default() -> Self {
        Self::puzzle()
    }
}

impl TryFrom<Vec<StepCoefficients>> for CoefficientTable {
    type Error = MonadError;

    fn try_from(steps: Vec<StepCoefficients>) -> Result<Self> {
        let len = steps.len();
        let steps: [StepCoefficients; DIGIT_COUNT] = steps.try_into().map_err(|_| {
            MonadError::InvalidCoefficients(format!(
                "expected {} coefficient triples, found {}",
                DIGIT_COUNT, len
            ))
        })?;
        Self::new(steps)
    }
}

impl std::fmt::Display for CoefficientTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "pos  kind   div   cmp   add")?;
        for (position, step) in self.steps.iter().enumerate() {
            let kind = match step.kind() {
                StepKind::Push => "push",
                StepKind::Pop => "pop",
            };
            writeln!(
                f,
                "{:>3}  {:<5} {:>4} {:>5} {:>5}",
                position, kind, step.div, step.cmp, step.add
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_puzzle_table_shape() {
        let table = CoefficientTable::puzzle();
        assert_eq!(table.steps().len(), DIGIT_COUNT);
        assert_eq!(table.pop_count(), 7);
        assert_eq!(table.step(0), Some(&StepCoefficients::new(1, 0, 12)));
        assert_eq!(table.step(13), Some(&StepCoefficients::new(26, -14, 13)));
        assert_eq!(table.step(14), None);
    }

    #[test]
    fn test_step_kind() {
        assert_eq!(StepCoefficients::new(1, 0, 8).kind(), StepKind::Push);
        assert_eq!(StepCoefficients::new(26, -8, 3).kind(), StepKind::Pop);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = PUZZLE_COEFFICIENTS[..13].to_vec();
        let err = CoefficientTable::try_from(short).unwrap_err();
        assert!(matches!(err, MonadError::InvalidCoefficients(_)));

        let mut long = PUZZLE_COEFFICIENTS.to_vec();
        long.push(StepCoefficients::new(1, 0, 1));
        assert!(CoefficientTable::try_from(long).is_err());

        let exact = CoefficientTable::try_from(PUZZLE_COEFFICIENTS.to_vec()).unwrap();
        assert_eq!(exact, CoefficientTable::puzzle());
    }

    #[test]
    fn test_non_positive_divisor_rejected() {
        let table = CoefficientTable::puzzle();
        assert!(table.with_step(3, StepCoefficients::new(0, 0, 8)).is_err());
        assert!(table.with_step(3, StepCoefficients::new(-26, 0, 8)).is_err());
        assert!(table.with_step(14, StepCoefficients::new(1, 0, 8)).is_err());
    }

    #[test]
    fn test_with_step_leaves_original_untouched() {
        let table = CoefficientTable::puzzle();
        let changed = table.with_step(5, StepCoefficients::new(26, -15, 12)).unwrap();
        assert_eq!(table.step(5).unwrap().cmp, -16);
        assert_eq!(changed.step(5).unwrap().cmp, -15);
    }

    #[test]
    fn test_table_display() {
        let rendered = CoefficientTable::puzzle().to_string();
        assert_eq!(rendered.lines().count(), DIGIT_COUNT + 1);
        assert!(rendered.contains("pop"));
        assert!(rendered.contains("-14"));
    }
}
