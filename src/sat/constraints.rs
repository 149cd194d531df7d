//! Boolean circuit construction for the SAT encoding
//!
//! [`CircuitBuilder`] produces Tseitin-encoded gates over a shared
//! [`VariableManager`]. Every gate folds constants against the builder's
//! true literal and is hash-consed, so structurally equal gates share one
//! output wire. Bit vectors are two's complement, least significant bit
//! first, and arithmetic on them is modulo `2^width`.

use super::variables::{Literal, VariableManager};
use crate::error::Result;
use std::collections::HashMap;

/// Represents a SAT clause (disjunction of literals)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub literals: Vec<i32>, // Positive for variable, negative for negation
}

impl Clause {
    /// Create a new clause from literals
    pub fn new(literals: Vec<i32>) -> Self {
        Self { literals }
    }

    /// Create a unit clause (single literal)
    pub fn unit(literal: i32) -> Self {
        Self {
            literals: vec![literal],
        }
    }

    /// Create a binary clause (two literals)
    pub fn binary(lit1: i32, lit2: i32) -> Self {
        Self {
            literals: vec![lit1, lit2],
        }
    }

    /// Create a ternary clause
    pub fn ternary(lit1: i32, lit2: i32, lit3: i32) -> Self {
        Self {
            literals: vec![lit1, lit2, lit3],
        }
    }

    /// Check if clause is empty (unsatisfiable)
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Check if clause is unit
    pub fn is_unit(&self) -> bool {
        self.literals.len() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Gate {
    And(Literal, Literal),
    Xor(Literal, Literal),
}

/// Two's-complement bit vector, least significant bit first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    bits: Vec<Literal>,
}

impl BitVector {
    pub fn new(bits: Vec<Literal>) -> Self {
        Self { bits }
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[Literal] {
        &self.bits
    }

    /// Bit `index`, sign-extended past the top
    fn bit(&self, index: usize, false_lit: Literal) -> Literal {
        match self.bits.get(index) {
            Some(&bit) => bit,
            None => self.bits.last().copied().unwrap_or(false_lit),
        }
    }
}

/// Builds gates and arithmetic circuits, collecting their clauses
#[derive(Debug)]
pub struct CircuitBuilder {
    variables: VariableManager,
    clauses: Vec<Clause>,
    gates: HashMap<Gate, Literal>,
    truth: Literal,
}

impl CircuitBuilder {
    pub fn new() -> Result<Self> {
        let mut variables = VariableManager::new();
        let truth = variables.true_literal()?;
        Ok(Self {
            variables,
            clauses: vec![Clause::unit(truth)],
            gates: HashMap::new(),
            truth,
        })
    }

    pub fn true_lit(&self) -> Literal {
        self.truth
    }

    pub fn false_lit(&self) -> Literal {
        -self.truth
    }

    pub fn constant_lit(&self, value: bool) -> Literal {
        if value {
            self.truth
        } else {
            -self.truth
        }
    }

    pub fn variable_manager(&mut self) -> &mut VariableManager {
        &mut self.variables
    }

    pub fn variables(&self) -> &VariableManager {
        &self.variables
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Hand the collected clauses to the caller, leaving the builder empty
    pub fn take_clauses(&mut self) -> Vec<Clause> {
        std::mem::take(&mut self.clauses)
    }

    pub fn add_clause(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }

    /// Force `literal` to hold
    pub fn assert_lit(&mut self, literal: Literal) {
        if literal != self.truth {
            self.clauses.push(Clause::unit(literal));
        }
    }

    /// Exactly one of `literals` holds
    pub fn exactly_one(&mut self, literals: &[Literal]) {
        self.clauses.push(Clause::new(literals.to_vec()));
        for (i, &a) in literals.iter().enumerate() {
            for &b in &literals[i + 1..] {
                self.clauses.push(Clause::binary(-a, -b));
            }
        }
    }

    pub fn and(&mut self, a: Literal, b: Literal) -> Result<Literal> {
        let (t, f) = (self.truth, -self.truth);
        if a == f || b == f || a == -b {
            return Ok(f);
        }
        if a == t || a == b {
            return Ok(b);
        }
        if b == t {
            return Ok(a);
        }

        let key = Gate::And(a.min(b), a.max(b));
        if let Some(&g) = self.gates.get(&key) {
            return Ok(g);
        }
        let g = self.variables.fresh()?;
        self.clauses.push(Clause::binary(-g, a));
        self.clauses.push(Clause::binary(-g, b));
        self.clauses.push(Clause::ternary(g, -a, -b));
        self.gates.insert(key, g);
        Ok(g)
    }

    pub fn or(&mut self, a: Literal, b: Literal) -> Result<Literal> {
        Ok(-self.and(-a, -b)?)
    }

    pub fn xor(&mut self, a: Literal, b: Literal) -> Result<Literal> {
        let (t, f) = (self.truth, -self.truth);
        if a == f {
            return Ok(b);
        }
        if b == f {
            return Ok(a);
        }
        if a == t {
            return Ok(-b);
        }
        if b == t {
            return Ok(-a);
        }
        if a == b {
            return Ok(f);
        }
        if a == -b {
            return Ok(t);
        }

        // xor(-a, b) == -xor(a, b): cache on positive operands only
        let negate = (a < 0) != (b < 0);
        let (x, y) = (a.abs().min(b.abs()), a.abs().max(b.abs()));
        let key = Gate::Xor(x, y);
        let g = match self.gates.get(&key) {
            Some(&g) => g,
            None => {
                let g = self.variables.fresh()?;
                self.clauses.push(Clause::ternary(-g, x, y));
                self.clauses.push(Clause::ternary(-g, -x, -y));
                self.clauses.push(Clause::ternary(g, -x, y));
                self.clauses.push(Clause::ternary(g, x, -y));
                self.gates.insert(key, g);
                g
            }
        };
        Ok(if negate { -g } else { g })
    }

    pub fn and_all(&mut self, literals: &[Literal]) -> Result<Literal> {
        let mut acc = self.truth;
        for &literal in literals {
            acc = self.and(acc, literal)?;
        }
        Ok(acc)
    }

    pub fn or_all(&mut self, literals: &[Literal]) -> Result<Literal> {
        let mut acc = -self.truth;
        for &literal in literals {
            acc = self.or(acc, literal)?;
        }
        Ok(acc)
    }

    /// `value` as a `width`-bit vector of constant literals
    pub fn constant_vector(&self, value: i128, width: usize) -> BitVector {
        let bits = (0..width)
            .map(|i| {
                let bit = if i < 127 { (value >> i) & 1 == 1 } else { value < 0 };
                self.constant_lit(bit)
            })
            .collect();
        BitVector::new(bits)
    }

    /// Fresh vector holding any value in `0..2^value_bits`, plus a zero sign bit
    pub fn fresh_unsigned(&mut self, value_bits: usize) -> Result<BitVector> {
        let mut bits = Vec::with_capacity(value_bits + 1);
        for _ in 0..value_bits {
            bits.push(self.variables.fresh()?);
        }
        bits.push(self.false_lit());
        Ok(BitVector::new(bits))
    }

    /// Sign-extend or truncate to `width` bits
    pub fn resize(&self, v: &BitVector, width: usize) -> BitVector {
        let bits = (0..width).map(|i| v.bit(i, self.false_lit())).collect();
        BitVector::new(bits)
    }

    /// `a + b` modulo `2^width`
    pub fn add(&mut self, a: &BitVector, b: &BitVector, width: usize) -> Result<BitVector> {
        let f = self.false_lit();
        let mut carry = f;
        let mut bits = Vec::with_capacity(width);
        for i in 0..width {
            let (x, y) = (a.bit(i, f), b.bit(i, f));
            let half = self.xor(x, y)?;
            bits.push(self.xor(half, carry)?);
            if i + 1 < width {
                let generate = self.and(x, y)?;
                let propagate = self.and(half, carry)?;
                carry = self.or(generate, propagate)?;
            }
        }
        Ok(BitVector::new(bits))
    }

    /// `v * flag` for a single boolean `flag`
    pub fn mul_mask(&mut self, v: &BitVector, flag: Literal) -> Result<BitVector> {
        let mut bits = Vec::with_capacity(v.width());
        for &bit in v.bits() {
            bits.push(self.and(bit, flag)?);
        }
        Ok(BitVector::new(bits))
    }

    /// `a * b` modulo `2^width` by shift and add
    pub fn mul(&mut self, a: &BitVector, b: &BitVector, width: usize) -> Result<BitVector> {
        let f = self.false_lit();
        let a = self.resize(a, width);
        let mut acc = self.constant_vector(0, width);
        for i in 0..width {
            let flag = b.bit(i, f);
            if flag == f {
                continue;
            }
            let mut shifted = vec![f; i];
            shifted.extend_from_slice(&a.bits()[..width - i]);
            let partial = self.mul_mask(&BitVector::new(shifted), flag)?;
            acc = self.add(&acc, &partial, width)?;
        }
        Ok(acc)
    }

    /// Literal true exactly when `a == b` over `max(width)` bits
    pub fn equal(&mut self, a: &BitVector, b: &BitVector) -> Result<Literal> {
        let f = self.false_lit();
        let width = a.width().max(b.width());
        let mut same = Vec::with_capacity(width);
        for i in 0..width {
            let differ = self.xor(a.bit(i, f), b.bit(i, f))?;
            same.push(-differ);
        }
        self.and_all(&same)
    }

    /// Literal true exactly when `a < b` with both read as unsigned
    pub fn less_than_unsigned(&mut self, a: &BitVector, b: &BitVector) -> Result<Literal> {
        let f = self.false_lit();
        let width = a.width().max(b.width());
        let mut less = f;
        for i in 0..width {
            let (x, y) = (a.bits().get(i).copied().unwrap_or(f), b.bits().get(i).copied().unwrap_or(f));
            let here = self.and(-x, y)?;
            let differ = self.xor(x, y)?;
            let carried = self.and(-differ, less)?;
            less = self.or(here, carried)?;
        }
        Ok(less)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadical::Solver;

    fn check_sat(builder: &CircuitBuilder) -> Option<Solver> {
        let mut solver = Solver::new();
        for clause in builder.clauses() {
            solver.add_clause(clause.literals.iter().copied());
        }
        if solver.solve() == Some(true) {
            Some(solver)
        } else {
            None
        }
    }

    fn read_signed(solver: &Solver, v: &BitVector) -> i128 {
        let mut value = 0i128;
        for (i, &bit) in v.bits().iter().enumerate() {
            if solver.value(bit) == Some(true) {
                value |= 1 << i;
            }
        }
        let width = v.width();
        if width > 0 && value >> (width - 1) & 1 == 1 {
            value -= 1 << width;
        }
        value
    }

    #[test]
    fn test_clause_creation() {
        let clause = Clause::new(vec![1, -2, 3]);
        assert_eq!(clause.literals, vec![1, -2, 3]);
        assert!(!clause.is_empty());
        assert!(!clause.is_unit());

        let unit_clause = Clause::unit(5);
        assert!(unit_clause.is_unit());
        assert_eq!(unit_clause.literals, vec![5]);
    }

    #[test]
    fn test_gate_constant_folding() {
        let mut builder = CircuitBuilder::new().unwrap();
        let t = builder.true_lit();
        let f = builder.false_lit();
        let a = builder.variable_manager().fresh().unwrap();

        assert_eq!(builder.and(a, t).unwrap(), a);
        assert_eq!(builder.and(a, f).unwrap(), f);
        assert_eq!(builder.and(a, -a).unwrap(), f);
        assert_eq!(builder.or(a, t).unwrap(), t);
        assert_eq!(builder.or(a, f).unwrap(), a);
        assert_eq!(builder.xor(a, t).unwrap(), -a);
        assert_eq!(builder.xor(a, a).unwrap(), f);
        assert_eq!(builder.clause_count(), 1);
    }

    #[test]
    fn test_gates_are_shared() {
        let mut builder = CircuitBuilder::new().unwrap();
        let a = builder.variable_manager().fresh().unwrap();
        let b = builder.variable_manager().fresh().unwrap();

        let g1 = builder.and(a, b).unwrap();
        let g2 = builder.and(b, a).unwrap();
        assert_eq!(g1, g2);

        let x1 = builder.xor(a, b).unwrap();
        let x2 = builder.xor(-a, b).unwrap();
        assert_eq!(x1, -x2);
    }

    #[test]
    fn test_constant_arithmetic_folds_completely() {
        let mut builder = CircuitBuilder::new().unwrap();
        let a = builder.constant_vector(37, 8);
        let b = builder.constant_vector(-5, 8);
        let sum = builder.add(&a, &b, 8).unwrap();
        let product = builder.mul(&a, &b, 10).unwrap();

        let solver = check_sat(&builder).unwrap();
        assert_eq!(read_signed(&solver, &sum), 32);
        assert_eq!(read_signed(&solver, &product), -185);
        assert_eq!(builder.clause_count(), 1);
    }

    #[test]
    fn test_division_witness_is_unique() {
        // 100 = q * 26 + r with r < 26 forces q = 3, r = 22
        let mut builder = CircuitBuilder::new().unwrap();
        let q = builder.fresh_unsigned(3).unwrap();
        let r = builder.fresh_unsigned(5).unwrap();
        let d = builder.constant_vector(26, 6);
        let width = 10;
        let scaled = builder.mul(&q, &d, width).unwrap();
        let sum = builder.add(&scaled, &r, width).unwrap();
        let z = builder.constant_vector(100, width);
        let eq = builder.equal(&z, &sum).unwrap();
        builder.assert_lit(eq);
        let bound = builder.constant_vector(26, 6);
        let lt = builder.less_than_unsigned(&r, &bound).unwrap();
        builder.assert_lit(lt);

        let solver = check_sat(&builder).unwrap();
        assert_eq!(read_signed(&solver, &q), 3);
        assert_eq!(read_signed(&solver, &r), 22);
    }

    #[test]
    fn test_less_than_unsigned() {
        for (a, b) in [(3, 5), (5, 3), (4, 4), (0, 1), (15, 0)] {
            let mut builder = CircuitBuilder::new().unwrap();
            let va = builder.constant_vector(a, 5);
            let vb = builder.constant_vector(b, 5);
            let lt = builder.less_than_unsigned(&va, &vb).unwrap();
            assert_eq!(lt == builder.true_lit(), a < b, "{} < {}", a, b);
        }
    }

    #[test]
    fn test_exactly_one() {
        let mut builder = CircuitBuilder::new().unwrap();
        let lits: Vec<Literal> = (0..4)
            .map(|_| builder.variable_manager().fresh().unwrap())
            .collect();
        builder.exactly_one(&lits);
        builder.add_clause(Clause::binary(lits[1], lits[2]));
        builder.assert_lit(-lits[1]);

        let solver = check_sat(&builder).unwrap();
        let chosen: Vec<bool> = lits.iter().map(|&l| solver.value(l) == Some(true)).collect();
        assert_eq!(chosen, vec![false, false, true, false]);
    }

    #[test]
    fn test_symbolic_addition_and_equality() {
        // find x in 0..8 with x + 9 == 14
        let mut builder = CircuitBuilder::new().unwrap();
        let x = builder.fresh_unsigned(3).unwrap();
        let nine = builder.constant_vector(9, 6);
        let sum = builder.add(&x, &nine, 6).unwrap();
        let target = builder.constant_vector(14, 6);
        let eq = builder.equal(&sum, &target).unwrap();
        builder.assert_lit(eq);

        let solver = check_sat(&builder).unwrap();
        assert_eq!(read_signed(&solver, &x), 5);
    }
}
