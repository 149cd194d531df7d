//! Exhaustive search over the digit chain, independent of any solver
//!
//! A memoized depth-first walk over `(position, z)` states. A state is
//! pruned once `z >= 26^(pops remaining)`: a pop step can at best divide the
//! accumulator by 26 and a push step never shrinks it, so such a state can
//! never reach zero. Only tables whose divisors are 1 or 26 and whose `add`
//! coefficients are non-negative satisfy those premises.

use super::chain::apply_step;
use super::coefficients::{CoefficientTable, StepKind, DIGIT_COUNT, STACK_BASE};
use super::digits::{ModelNumber, MAX_DIGIT, MIN_DIGIT};
use crate::error::{MonadError, Result};
use crate::search::Direction;
use std::collections::HashMap;

/// Memoized exact search over one coefficient table
pub struct ReferenceSearch {
    table: CoefficientTable,
    /// `limits[i]` is `26^(pop steps at positions >= i)`
    limits: [i64; DIGIT_COUNT + 1],
    counts: HashMap<(usize, i64), u64>,
}

impl ReferenceSearch {
    pub fn new(table: &CoefficientTable) -> Result<Self> {
        for (position, step) in table.iter().enumerate() {
            if step.div != 1 && step.div != STACK_BASE {
                return Err(MonadError::InvalidCoefficients(format!(
                    "reference search needs divisor 1 or {} (step {} has {})",
                    STACK_BASE, position, step.div
                )));
            }
            if step.add < 0 {
                return Err(MonadError::InvalidCoefficients(format!(
                    "reference search needs non-negative add (step {} has {})",
                    position, step.add
                )));
            }
        }

        let mut limits = [1i64; DIGIT_COUNT + 1];
        for position in (0..DIGIT_COUNT).rev() {
            let pops = limits[position + 1];
            limits[position] = if table.steps()[position].kind() == StepKind::Pop {
                pops.saturating_mul(STACK_BASE)
            } else {
                pops
            };
        }

        Ok(Self {
            table: table.clone(),
            limits,
            counts: HashMap::new(),
        })
    }

    /// Number of accepted completions from accumulator `z` at `position`
    fn count_from(&mut self, position: usize, z: i64) -> Result<u64> {
        if position == DIGIT_COUNT {
            return Ok(u64::from(z == 0));
        }
        if z >= self.limits[position] {
            return Ok(0);
        }
        if let Some(&count) = self.counts.get(&(position, z)) {
            return Ok(count);
        }

        let step = self.table.steps()[position];
        let mut total = 0u64;
        for w in MIN_DIGIT..=MAX_DIGIT {
            let next = apply_step(z, &step, i64::from(w)).ok_or_else(|| {
                MonadError::Execution(format!("accumulator overflow at step {}", position))
            })?;
            total += self.count_from(position + 1, next)?;
        }
        self.counts.insert((position, z), total);
        Ok(total)
    }

    /// Whether any completion from `z` at `position` is accepted
    pub fn is_satisfiable_from(&mut self, position: usize, z: i64) -> Result<bool> {
        Ok(self.count_from(position, z)? > 0)
    }

    /// Total number of accepted model numbers
    pub fn count_solutions(&mut self) -> Result<u64> {
        self.count_from(0, 0)
    }

    /// Lexicographically best accepted model number, or `None` when there is none
    pub fn extreme(&mut self, direction: Direction) -> Result<Option<ModelNumber>> {
        if !self.is_satisfiable_from(0, 0)? {
            return Ok(None);
        }

        let mut digits = [0u8; DIGIT_COUNT];
        let mut z = 0i64;
        for position in 0..DIGIT_COUNT {
            let step = self.table.steps()[position];
            let mut chosen = None;
            for w in direction.preference() {
                let next = apply_step(z, &step, i64::from(w)).ok_or_else(|| {
                    MonadError::Execution(format!("accumulator overflow at step {}", position))
                })?;
                if self.is_satisfiable_from(position + 1, next)? {
                    chosen = Some((w, next));
                    break;
                }
            }
            let (w, next) = chosen.ok_or_else(|| {
                MonadError::InvalidState(format!("no satisfiable digit at position {}", position))
            })?;
            digits[position] = w;
            z = next;
        }
        ModelNumber::new(digits).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monad::chain::evaluate_chain;
    use crate::monad::coefficients::StepCoefficients;

    #[test]
    fn test_puzzle_extremes() {
        let mut search = ReferenceSearch::new(&CoefficientTable::puzzle()).unwrap();
        let max = search.extreme(Direction::Maximize).unwrap().unwrap();
        let min = search.extreme(Direction::Minimize).unwrap().unwrap();
        assert_eq!(max.to_string(), "99199996849497");
        assert_eq!(min.to_string(), "31111241191841");
    }

    #[test]
    fn test_puzzle_count() {
        let mut search = ReferenceSearch::new(&CoefficientTable::puzzle()).unwrap();
        assert_eq!(search.count_solutions().unwrap(), 7_089_656);
    }

    #[test]
    fn test_extremes_are_accepted() {
        let table = CoefficientTable::puzzle();
        let mut search = ReferenceSearch::new(&table).unwrap();
        for direction in [Direction::Maximize, Direction::Minimize] {
            let number = search.extreme(direction).unwrap().unwrap();
            assert!(evaluate_chain(&table, &number).unwrap().is_accepted());
        }
    }

    #[test]
    fn test_rejects_unsupported_tables() {
        let table = CoefficientTable::puzzle()
            .with_step(0, StepCoefficients::new(2, 0, 12))
            .unwrap();
        assert!(ReferenceSearch::new(&table).is_err());

        let table = CoefficientTable::puzzle()
            .with_step(0, StepCoefficients::new(1, 0, -3))
            .unwrap();
        assert!(ReferenceSearch::new(&table).is_err());
    }

    #[test]
    fn test_all_push_table_has_no_solutions() {
        let table = CoefficientTable::new([StepCoefficients::new(1, 10, 5); DIGIT_COUNT]).unwrap();
        let mut search = ReferenceSearch::new(&table).unwrap();
        assert_eq!(search.count_solutions().unwrap(), 0);
        assert_eq!(search.extreme(Direction::Maximize).unwrap(), None);
    }
}
