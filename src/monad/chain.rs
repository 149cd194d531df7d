//! The digit-chain recurrence, built symbolically and evaluated concretely
//!
//! For each position `i`, with `z` starting at 0:
//!
//! ```text
//! cond   = ((z mod 26) + cmp_i) != w_i
//! z_next = (25 * cond + 1) * (z div div_i) + (w_i + add_i) * cond
//! ```

use super::coefficients::{CoefficientTable, StepCoefficients, DIGIT_COUNT, STACK_BASE};
use super::digits::ModelNumber;
use super::expr::{ExprId, ExprPool};
use crate::error::{MonadError, Result};

/// Symbolic fold of a coefficient table over the fourteen digit variables
#[derive(Debug, Clone)]
pub struct DigitChain {
    pool: ExprPool,
    digits: [ExprId; DIGIT_COUNT],
    z_final: ExprId,
}

impl DigitChain {
    pub fn pool(&self) -> &ExprPool {
        &self.pool
    }

    /// Digit variable handles indexed by position
    pub fn digits(&self) -> &[ExprId; DIGIT_COUNT] {
        &self.digits
    }

    pub fn z_final(&self) -> ExprId {
        self.z_final
    }

    /// Evaluate the symbolic `z_final` under a concrete assignment
    pub fn evaluate(&self, number: &ModelNumber) -> Result<i64> {
        self.pool.eval(self.z_final, &number.as_inputs())
    }
}

/// Fold the recurrence over `table` into a fresh expression pool
pub fn build_chain(table: &CoefficientTable) -> DigitChain {
    let mut pool = ExprPool::new();
    let digits: [ExprId; DIGIT_COUNT] = std::array::from_fn(|position| pool.digit(position));

    let base = pool.constant(STACK_BASE);
    let grow = pool.constant(STACK_BASE - 1);
    let one = pool.constant(1);

    let mut z = pool.constant(0);
    for (position, step) in table.iter().enumerate() {
        let w = digits[position];
        let div = pool.constant(step.div);
        let cmp = pool.constant(step.cmp);
        let add = pool.constant(step.add);

        let top = pool.rem(z, base);
        let expected = pool.add(top, cmp);
        let cond = pool.ne(expected, w);

        let grown = pool.mul(grow, cond);
        let scale = pool.add(grown, one);
        let kept = pool.div(z, div);
        let shifted = pool.mul(scale, kept);

        let offset = pool.add(w, add);
        let pushed = pool.mul(offset, cond);

        z = pool.add(shifted, pushed);
    }

    DigitChain {
        pool,
        digits,
        z_final: z,
    }
}

/// One concrete application of the recurrence; `None` on overflow
pub fn apply_step(z: i64, step: &StepCoefficients, w: i64) -> Option<i64> {
    let top = z.checked_rem_euclid(STACK_BASE)?;
    let cond = i64::from(top.checked_add(step.cmp)? != w);
    let scale = (STACK_BASE - 1) * cond + 1;
    let kept = z.checked_div_euclid(step.div)?;
    let pushed = w.checked_add(step.add)?.checked_mul(cond)?;
    scale.checked_mul(kept)?.checked_add(pushed)
}

/// Accumulator values after each step of a concrete fold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTrace {
    pub values: Vec<i64>,
}

impl ChainTrace {
    /// Final accumulator value
    pub fn z_final(&self) -> i64 {
        self.values.last().copied().unwrap_or(0)
    }

    pub fn is_accepted(&self) -> bool {
        self.z_final() == 0
    }
}

/// Run the recurrence numerically over a concrete model number
pub fn evaluate_chain(table: &CoefficientTable, number: &ModelNumber) -> Result<ChainTrace> {
    let mut values = Vec::with_capacity(DIGIT_COUNT);
    let mut z = 0i64;
    for (position, step) in table.iter().enumerate() {
        let w = i64::from(number.digit(position));
        z = apply_step(z, step, w).ok_or_else(|| {
            MonadError::Execution(format!("accumulator overflow at step {}", position))
        })?;
        values.push(z);
    }
    Ok(ChainTrace { values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monad::coefficients::StepCoefficients;
    use proptest::prelude::*;

    fn number(s: &str) -> ModelNumber {
        s.parse().unwrap()
    }

    #[test]
    fn test_known_accepted_numbers() {
        let table = CoefficientTable::puzzle();
        for s in ["99199996849497", "31111241191841", "96299896449997", "31162141116841"] {
            let trace = evaluate_chain(&table, &number(s)).unwrap();
            assert!(trace.is_accepted(), "{} should be accepted", s);
        }
    }

    #[test]
    fn test_known_rejected_numbers() {
        let table = CoefficientTable::puzzle();
        let trace = evaluate_chain(&table, &number("13579246899999")).unwrap();
        assert_eq!(trace.z_final(), 4140932948);
        let trace = evaluate_chain(&table, &number("11111111111111")).unwrap();
        assert_eq!(trace.z_final(), 158278316);
    }

    #[test]
    fn test_trace_values() {
        let table = CoefficientTable::puzzle();
        let trace = evaluate_chain(&table, &number("96299896449997")).unwrap();
        assert_eq!(trace.values.len(), DIGIT_COUNT);
        assert_eq!(&trace.values[..4], &[21, 559, 14544, 378161]);
        assert_eq!(trace.values[13], 0);
    }

    #[test]
    fn test_push_step_with_matching_digit_is_a_noop() {
        // z mod 26 == 8 and cmp == 0, so w == 8 leaves z unchanged
        let step = StepCoefficients::new(1, 0, 7);
        assert_eq!(apply_step(8, &step, 8), Some(8));
        assert_eq!(apply_step(8, &step, 9), Some(8 * 26 + 16));
    }

    #[test]
    fn test_pop_step() {
        let step = StepCoefficients::new(26, -16, 12);
        // top digit 17, 17 - 16 == 1 == w: pop
        let z = 5 * 26 + 17;
        assert_eq!(apply_step(z, &step, 1), Some(5));
        // mismatch: replace the top digit
        assert_eq!(apply_step(z, &step, 2), Some(5 * 26 + 14));
    }

    #[test]
    fn test_symbolic_chain_matches_concrete() {
        let table = CoefficientTable::puzzle();
        let chain = build_chain(&table);
        for s in ["99199996849497", "13579246899999", "11111111111111", "99999999999999"] {
            let n = number(s);
            let concrete = evaluate_chain(&table, &n).unwrap().z_final();
            assert_eq!(chain.evaluate(&n).unwrap(), concrete, "{}", s);
        }
    }

    #[test]
    fn test_fold_order_matters() {
        let table = CoefficientTable::puzzle();
        let mut reversed = *table.steps();
        reversed.reverse();
        let reversed = CoefficientTable::new(reversed).unwrap();
        let n = number("99199996849497");
        assert!(evaluate_chain(&table, &n).unwrap().is_accepted());
        assert!(!evaluate_chain(&reversed, &n).unwrap().is_accepted());
    }

    #[test]
    fn test_chain_bounds_are_non_negative() {
        let chain = build_chain(&CoefficientTable::puzzle());
        let bounds = chain.pool().bounds(chain.z_final());
        assert!(bounds.is_non_negative());
        assert!(bounds.contains(0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_symbolic_equals_concrete(s in "[1-9]{14}") {
            let table = CoefficientTable::puzzle();
            let chain = build_chain(&table);
            let n: ModelNumber = s.parse().unwrap();
            let concrete = evaluate_chain(&table, &n).unwrap().z_final();
            prop_assert_eq!(chain.evaluate(&n).unwrap(), concrete);
            prop_assert!(chain.pool().bounds(chain.z_final()).contains(concrete as i128));
        }
    }
}
