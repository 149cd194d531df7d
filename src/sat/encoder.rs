//! Lowering of digit-chain expressions to CNF
//!
//! Every expression node becomes a two's-complement bit vector just wide
//! enough for the node's interval bounds, so modular circuit arithmetic is
//! exact. Digits are one-hot encoded; the exactly-one constraint over the
//! nine indicators of a position doubles as its `1..=9` range constraint.

use super::constraints::{BitVector, CircuitBuilder, Clause};
use super::solver::SolverSolution;
use super::variables::Literal;
use crate::error::{MonadError, Result};
use crate::monad::{ExprId, ExprPool, Interval, ModelNumber, Node, DIGIT_COUNT, MAX_DIGIT, MIN_DIGIT};
use std::collections::HashMap;
use tracing::debug;

/// Widest bit vector the encoder will build
pub const MAX_WIDTH: usize = 126;

const DIGIT_VALUES: usize = (MAX_DIGIT - MIN_DIGIT + 1) as usize;

/// Encodes an [`ExprPool`] over the fourteen digit variables into clauses
#[derive(Debug)]
pub struct ChainEncoder {
    circuit: CircuitBuilder,
    digits: [[Literal; DIGIT_VALUES]; DIGIT_COUNT],
    vectors: HashMap<ExprId, BitVector>,
    /// `(dividend, divisor) -> (quotient, remainder)`, shared by div and mod
    witnesses: HashMap<(ExprId, i64), (BitVector, BitVector)>,
}

impl ChainEncoder {
    /// Allocate the digit indicators and their range constraints
    pub fn new() -> Result<Self> {
        let mut circuit = CircuitBuilder::new()?;
        let mut digits = [[0; DIGIT_VALUES]; DIGIT_COUNT];
        for (position, row) in digits.iter_mut().enumerate() {
            let literals = circuit.variable_manager().digit_variables(position)?;
            circuit.exactly_one(&literals);
            row.copy_from_slice(&literals);
        }

        Ok(Self {
            circuit,
            digits,
            vectors: HashMap::new(),
            witnesses: HashMap::new(),
        })
    }

    /// Indicator literal for `digit[position] == value`
    pub fn digit_literal(&self, position: usize, value: u8) -> Option<Literal> {
        if !(MIN_DIGIT..=MAX_DIGIT).contains(&value) {
            return None;
        }
        self.digits
            .get(position)
            .map(|row| row[usize::from(value - MIN_DIGIT)])
    }

    /// Constrain `root` to evaluate to zero
    pub fn assert_zero(&mut self, pool: &ExprPool, root: ExprId) -> Result<()> {
        let value = self.encode(pool, root)?;
        let zero = self.circuit.constant_vector(0, value.width());
        let is_zero = self.circuit.equal(&value, &zero)?;
        self.circuit.assert_lit(is_zero);
        debug!(
            nodes = pool.len(),
            width = value.width(),
            variables = self.circuit.variables().variable_count(),
            clauses = self.circuit.clause_count(),
            "encoded chain"
        );
        Ok(())
    }

    /// Bit vector for `root`, encoding any operands not yet seen
    pub fn encode(&mut self, pool: &ExprPool, root: ExprId) -> Result<BitVector> {
        for id in pool.ids().take_while(|&id| id <= root) {
            if !self.vectors.contains_key(&id) {
                let vector = self.encode_node(pool, id)?;
                self.vectors.insert(id, vector);
            }
        }
        self.vector(root)
    }

    fn vector(&self, id: ExprId) -> Result<BitVector> {
        self.vectors.get(&id).cloned().ok_or_else(|| {
            MonadError::InvalidState(format!("expression {} has not been encoded", id.index()))
        })
    }

    fn encode_node(&mut self, pool: &ExprPool, id: ExprId) -> Result<BitVector> {
        let width = signed_width(pool.bounds(id))?;
        match pool.node(id) {
            Node::Const(value) => Ok(self.circuit.constant_vector(i128::from(value), width)),
            Node::Digit(position) => self.encode_digit(position),
            Node::Add(a, b) => {
                let (va, vb) = (self.vector(a)?, self.vector(b)?);
                self.circuit.add(&va, &vb, width)
            }
            Node::Mul(a, b) => {
                let (va, vb) = (self.vector(a)?, self.vector(b)?);
                if pool.bounds(a).is_boolean() {
                    let other = self.circuit.resize(&vb, width);
                    self.circuit.mul_mask(&other, va.bits()[0])
                } else if pool.bounds(b).is_boolean() {
                    let other = self.circuit.resize(&va, width);
                    self.circuit.mul_mask(&other, vb.bits()[0])
                } else {
                    self.circuit.mul(&va, &vb, width)
                }
            }
            Node::Div(a, b) => {
                let (quotient, _) = self.witness(pool, a, b)?;
                Ok(self.circuit.resize(&quotient, width))
            }
            Node::Mod(a, b) => {
                let (_, remainder) = self.witness(pool, a, b)?;
                Ok(self.circuit.resize(&remainder, width))
            }
            Node::Ne(a, b) => {
                let (va, vb) = (self.vector(a)?, self.vector(b)?);
                let same = self.circuit.equal(&va, &vb)?;
                Ok(BitVector::new(vec![-same, self.circuit.false_lit()]))
            }
        }
    }

    /// Binary value of a digit from its one-hot indicators
    fn encode_digit(&mut self, position: usize) -> Result<BitVector> {
        let value_bits = unsigned_bits(i128::from(MAX_DIGIT));
        let row = self.digits.get(position).copied().ok_or_else(|| {
            MonadError::UnsupportedExpression(format!("digit position {} out of range", position))
        })?;

        let mut bits = Vec::with_capacity(value_bits + 1);
        for bit in 0..value_bits {
            let set: Vec<Literal> = (MIN_DIGIT..=MAX_DIGIT)
                .filter(|value| (value >> bit) & 1 == 1)
                .map(|value| row[usize::from(value - MIN_DIGIT)])
                .collect();
            bits.push(self.circuit.or_all(&set)?);
        }
        bits.push(self.circuit.false_lit());
        Ok(BitVector::new(bits))
    }

    /// Quotient and remainder with `z == q * d + r` and `0 <= r < d`
    fn witness(
        &mut self,
        pool: &ExprPool,
        dividend: ExprId,
        divisor: ExprId,
    ) -> Result<(BitVector, BitVector)> {
        let d = match pool.node(divisor) {
            Node::Const(d) if d > 0 => d,
            _ => {
                return Err(MonadError::UnsupportedExpression(format!(
                    "division needs a positive constant divisor, found bounds {:?}",
                    pool.bounds(divisor)
                )))
            }
        };
        let bounds = pool.bounds(dividend);
        if !bounds.is_non_negative() {
            return Err(MonadError::UnsupportedExpression(format!(
                "dividend may be negative (bounds {:?})",
                bounds
            )));
        }
        if let Some(pair) = self.witnesses.get(&(dividend, d)) {
            return Ok(pair.clone());
        }

        let d = i128::from(d);
        let quotient_bits = unsigned_bits(bounds.hi / d);
        let remainder_bits = unsigned_bits(d - 1);
        let quotient = self.circuit.fresh_unsigned(quotient_bits)?;
        let remainder = self.circuit.fresh_unsigned(remainder_bits)?;

        // Sized for every value the fresh vectors can hold, not just the bounds
        let largest = capacity(quotient_bits)
            .checked_mul(d)
            .and_then(|scaled| scaled.checked_add(capacity(remainder_bits)))
            .ok_or_else(|| {
                MonadError::UnsupportedExpression(format!(
                    "division witness for divisor {} is too wide",
                    d
                ))
            })?;
        let z = self.vector(dividend)?;
        let width = signed_width(Interval::new(0, largest))?.max(z.width());

        let divisor_bits = self.circuit.constant_vector(d, signed_width(Interval::point(d))?);
        let scaled = self.circuit.mul(&quotient, &divisor_bits, width)?;
        let recombined = self.circuit.add(&scaled, &remainder, width)?;
        let z = self.circuit.resize(&z, width);
        let exact = self.circuit.equal(&z, &recombined)?;
        self.circuit.assert_lit(exact);

        let limit = self.circuit.constant_vector(d, remainder_bits + 1);
        let below = self.circuit.less_than_unsigned(&remainder, &limit)?;
        self.circuit.assert_lit(below);

        self.witnesses
            .insert((dividend, d as i64), (quotient.clone(), remainder.clone()));
        Ok((quotient, remainder))
    }

    /// Read the model number back from a satisfying assignment
    pub fn decode(&self, solution: &SolverSolution) -> Result<ModelNumber> {
        let mut digits = [0u8; DIGIT_COUNT];
        for (position, row) in self.digits.iter().enumerate() {
            let mut chosen = (MIN_DIGIT..=MAX_DIGIT)
                .zip(row.iter())
                .filter(|&(_, &literal)| solution.value(literal));
            digits[position] = match (chosen.next(), chosen.next()) {
                (Some((value, _)), None) => value,
                _ => {
                    return Err(MonadError::Backend(format!(
                        "model does not select exactly one value for digit {}",
                        position
                    )))
                }
            };
        }
        ModelNumber::new(digits)
    }

    /// Hand the accumulated clauses to the solver
    pub fn take_clauses(&mut self) -> Vec<Clause> {
        self.circuit.take_clauses()
    }

    pub fn statistics(&self) -> EncodingStatistics {
        let variables = self.circuit.variables().statistics();
        EncodingStatistics {
            total_variables: variables.total_variables,
            digit_variables: variables.digit_variables,
            auxiliary_variables: variables.auxiliary_variables,
            encoded_nodes: self.vectors.len(),
            division_witnesses: self.witnesses.len(),
        }
    }
}

/// Number of bits needed for the unsigned value `value >= 0`
fn unsigned_bits(value: i128) -> usize {
    (128 - value.leading_zeros()) as usize
}

/// Largest value of a `bits`-bit unsigned vector
fn capacity(bits: usize) -> i128 {
    if bits == 0 {
        0
    } else {
        (1i128 << bits) - 1
    }
}

/// Smallest two's-complement width holding every value in `bounds`
pub fn signed_width(bounds: Interval) -> Result<usize> {
    (1..=MAX_WIDTH)
        .find(|&width| {
            let half = 1i128 << (width - 1);
            bounds.lo >= -half && bounds.hi < half
        })
        .ok_or_else(|| {
            MonadError::UnsupportedExpression(format!(
                "bounds [{}, {}] need more than {} bits",
                bounds.lo, bounds.hi, MAX_WIDTH
            ))
        })
}

/// Snapshot of the encoding size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingStatistics {
    pub total_variables: usize,
    pub digit_variables: usize,
    pub auxiliary_variables: usize,
    pub encoded_nodes: usize,
    pub division_witnesses: usize,
}

impl std::fmt::Display for EncodingStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Encoding Statistics:")?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Digit variables: {}", self.digit_variables)?;
        writeln!(f, "  Auxiliary variables: {}", self.auxiliary_variables)?;
        writeln!(f, "  Encoded nodes: {}", self.encoded_nodes)?;
        writeln!(f, "  Division witnesses: {}", self.division_witnesses)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monad::{build_chain, CoefficientTable};
    use crate::sat::solver::{SatSolver, SolveOutcome};

    fn solve(encoder: &mut ChainEncoder, assumptions: &[Literal]) -> SolveOutcome {
        let mut solver = SatSolver::new();
        solver.add_clauses(&encoder.take_clauses()).unwrap();
        solver.solve_with(assumptions).unwrap()
    }

    fn fix(encoder: &ChainEncoder, number: &ModelNumber) -> Vec<Literal> {
        number
            .digits()
            .iter()
            .enumerate()
            .map(|(position, &value)| encoder.digit_literal(position, value).unwrap())
            .collect()
    }

    #[test]
    fn test_signed_width() {
        assert_eq!(signed_width(Interval::point(0)).unwrap(), 1);
        assert_eq!(signed_width(Interval::new(0, 1)).unwrap(), 2);
        assert_eq!(signed_width(Interval::new(1, 9)).unwrap(), 5);
        assert_eq!(signed_width(Interval::new(-8, 7)).unwrap(), 4);
        assert_eq!(signed_width(Interval::new(-9, 7)).unwrap(), 5);
        assert!(signed_width(Interval::new(0, i128::MAX)).is_err());
    }

    #[test]
    fn test_digit_literals() {
        let encoder = ChainEncoder::new().unwrap();
        assert!(encoder.digit_literal(0, 1).is_some());
        assert!(encoder.digit_literal(13, 9).is_some());
        assert_eq!(encoder.digit_literal(14, 1), None);
        assert_eq!(encoder.digit_literal(0, 0), None);
        assert_eq!(encoder.statistics().digit_variables, DIGIT_COUNT * DIGIT_VALUES);
    }

    #[test]
    fn test_accepted_number_is_satisfiable() {
        let chain = build_chain(&CoefficientTable::puzzle());
        let mut encoder = ChainEncoder::new().unwrap();
        encoder.assert_zero(chain.pool(), chain.z_final()).unwrap();

        let number: ModelNumber = "99199996849497".parse().unwrap();
        let assumptions = fix(&encoder, &number);
        match solve(&mut encoder, &assumptions) {
            SolveOutcome::Sat(solution) => assert_eq!(encoder.decode(&solution).unwrap(), number),
            other => panic!("expected a model, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_number_is_unsatisfiable() {
        let chain = build_chain(&CoefficientTable::puzzle());
        let mut encoder = ChainEncoder::new().unwrap();
        encoder.assert_zero(chain.pool(), chain.z_final()).unwrap();

        let number: ModelNumber = "13579246899999".parse().unwrap();
        let assumptions = fix(&encoder, &number);
        assert!(matches!(solve(&mut encoder, &assumptions), SolveOutcome::Unsat));
    }

    #[test]
    fn test_division_and_modulo_share_a_witness() {
        let mut pool = ExprPool::new();
        let w = pool.digit(0);
        let scaled = pool.constant(31);
        let z = pool.mul(w, scaled);
        let base = pool.constant(26);
        let q = pool.div(z, base);
        let r = pool.rem(z, base);
        let eight = pool.constant(8);
        let shifted = pool.add(q, eight);
        let target = pool.ne(shifted, r);

        let mut encoder = ChainEncoder::new().unwrap();
        encoder.encode(&pool, target).unwrap();
        assert_eq!(encoder.statistics().division_witnesses, 1);

        // q + 8 == r only for w = 2: 62 = 2 * 26 + 10
        encoder.assert_zero(&pool, target).unwrap();
        let mut solver = SatSolver::new();
        solver.add_clauses(&encoder.take_clauses()).unwrap();
        match solver.solve().unwrap() {
            SolveOutcome::Sat(solution) => {
                let number = encoder.decode(&solution).unwrap();
                assert_eq!(number.digit(0), 2);
            }
            other => panic!("expected a model, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_dividend_rejected() {
        let mut pool = ExprPool::new();
        let w = pool.digit(0);
        let offset = pool.constant(-5);
        let shifted = pool.add(w, offset);
        let base = pool.constant(26);
        let q = pool.div(shifted, base);

        let mut encoder = ChainEncoder::new().unwrap();
        let err = encoder.encode(&pool, q).unwrap_err();
        assert!(matches!(err, MonadError::UnsupportedExpression(_)));
    }

    #[test]
    fn test_symbolic_divisor_rejected() {
        let mut pool = ExprPool::new();
        let a = pool.digit(0);
        let b = pool.digit(1);
        let q = pool.div(a, b);

        let mut encoder = ChainEncoder::new().unwrap();
        assert!(encoder.encode(&pool, q).is_err());
    }
}
