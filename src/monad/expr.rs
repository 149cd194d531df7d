//! Hash-consed symbolic integer expressions over the digit variables
//!
//! Nodes are stored in creation order, so every node's operands have smaller
//! ids than the node itself. Evaluation and CNF lowering both walk the pool
//! front to back and never recurse.
//!
//! `div` and `mod` are Euclidean, as in the SMT-LIB integer theory. For the
//! positive divisors and non-negative dividends of the digit chain this is
//! ordinary floor division.

use crate::error::{MonadError, Result};
use std::collections::HashMap;

/// Handle to a node inside an [`ExprPool`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Const(i64),
    /// Digit variable at a position
    Digit(usize),
    Add(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Mod(ExprId, ExprId),
    /// 1 when the operands differ, 0 otherwise
    Ne(ExprId, ExprId),
}

/// Inclusive range of values a node can take over all digit assignments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub lo: i128,
    pub hi: i128,
}

impl Interval {
    pub fn new(lo: i128, hi: i128) -> Self {
        Self { lo, hi }
    }

    pub fn point(value: i128) -> Self {
        Self { lo: value, hi: value }
    }

    pub fn contains(&self, value: i128) -> bool {
        self.lo <= value && value <= self.hi
    }

    pub fn is_boolean(&self) -> bool {
        self.lo >= 0 && self.hi <= 1
    }

    pub fn is_non_negative(&self) -> bool {
        self.lo >= 0
    }

    fn add(self, other: Interval) -> Interval {
        Interval::new(self.lo + other.lo, self.hi + other.hi)
    }

    fn mul(self, other: Interval) -> Interval {
        let corners = [
            self.lo * other.lo,
            self.lo * other.hi,
            self.hi * other.lo,
            self.hi * other.hi,
        ];
        Interval::new(
            corners.iter().copied().min().unwrap_or(0),
            corners.iter().copied().max().unwrap_or(0),
        )
    }

    fn div(self, divisor: Interval) -> Interval {
        if divisor.lo >= 1 {
            // Floor division is monotone in each argument on a positive divisor range
            let corners = [
                self.lo.div_euclid(divisor.lo),
                self.lo.div_euclid(divisor.hi),
                self.hi.div_euclid(divisor.lo),
                self.hi.div_euclid(divisor.hi),
            ];
            Interval::new(
                corners.iter().copied().min().unwrap_or(0),
                corners.iter().copied().max().unwrap_or(0),
            )
        } else {
            let magnitude = self.lo.abs().max(self.hi.abs());
            Interval::new(-magnitude, magnitude)
        }
    }

    fn rem(self, divisor: Interval) -> Interval {
        let modulus = divisor.lo.abs().max(divisor.hi.abs());
        if divisor.lo >= 1 && self.lo >= 0 && self.hi < divisor.lo {
            self
        } else {
            Interval::new(0, (modulus - 1).max(0))
        }
    }
}

/// Arena of expression nodes with structural sharing
#[derive(Debug, Clone, Default)]
pub struct ExprPool {
    nodes: Vec<Node>,
    bounds: Vec<Interval>,
    index: HashMap<Node, ExprId>,
}

impl ExprPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: ExprId) -> Node {
        self.nodes[id.index()]
    }

    pub fn bounds(&self, id: ExprId) -> Interval {
        self.bounds[id.index()]
    }

    /// All node ids in creation order
    pub fn ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.nodes.len() as u32).map(ExprId)
    }

    fn constant_value(&self, id: ExprId) -> Option<i64> {
        match self.node(id) {
            Node::Const(value) => Some(value),
            _ => None,
        }
    }

    fn intern(&mut self, node: Node) -> ExprId {
        if let Some(&id) = self.index.get(&node) {
            return id;
        }
        let bounds = self.compute_bounds(node);
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.bounds.push(bounds);
        self.index.insert(node, id);
        id
    }

    fn compute_bounds(&self, node: Node) -> Interval {
        match node {
            Node::Const(value) => Interval::point(value as i128),
            Node::Digit(_) => Interval::new(1, 9),
            Node::Add(a, b) => self.bounds(a).add(self.bounds(b)),
            Node::Mul(a, b) => self.bounds(a).mul(self.bounds(b)),
            Node::Div(a, b) => self.bounds(a).div(self.bounds(b)),
            Node::Mod(a, b) => self.bounds(a).rem(self.bounds(b)),
            Node::Ne(_, _) => Interval::new(0, 1),
        }
    }

    /// Operands of commutative nodes are stored in id order
    fn ordered(a: ExprId, b: ExprId) -> (ExprId, ExprId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn constant(&mut self, value: i64) -> ExprId {
        self.intern(Node::Const(value))
    }

    pub fn digit(&mut self, position: usize) -> ExprId {
        self.intern(Node::Digit(position))
    }

    pub fn add(&mut self, a: ExprId, b: ExprId) -> ExprId {
        match (self.constant_value(a), self.constant_value(b)) {
            (Some(x), Some(y)) => {
                if let Some(sum) = x.checked_add(y) {
                    return self.constant(sum);
                }
            }
            (Some(0), None) => return b,
            (None, Some(0)) => return a,
            _ => {}
        }
        let (a, b) = Self::ordered(a, b);
        self.intern(Node::Add(a, b))
    }

    pub fn mul(&mut self, a: ExprId, b: ExprId) -> ExprId {
        match (self.constant_value(a), self.constant_value(b)) {
            (Some(x), Some(y)) => {
                if let Some(product) = x.checked_mul(y) {
                    return self.constant(product);
                }
            }
            (Some(0), None) | (None, Some(0)) => return self.constant(0),
            (Some(1), None) => return b,
            (None, Some(1)) => return a,
            _ => {}
        }
        let (a, b) = Self::ordered(a, b);
        self.intern(Node::Mul(a, b))
    }

    pub fn div(&mut self, a: ExprId, b: ExprId) -> ExprId {
        match (self.constant_value(a), self.constant_value(b)) {
            (Some(x), Some(y)) if y != 0 => {
                if let Some(quotient) = x.checked_div_euclid(y) {
                    return self.constant(quotient);
                }
            }
            (_, Some(1)) => return a,
            _ => {}
        }
        self.intern(Node::Div(a, b))
    }

    pub fn rem(&mut self, a: ExprId, b: ExprId) -> ExprId {
        match (self.constant_value(a), self.constant_value(b)) {
            (Some(x), Some(y)) if y != 0 => {
                if let Some(remainder) = x.checked_rem_euclid(y) {
                    return self.constant(remainder);
                }
            }
            (_, Some(1)) => return self.constant(0),
            _ => {}
        }
        self.intern(Node::Mod(a, b))
    }

    pub fn ne(&mut self, a: ExprId, b: ExprId) -> ExprId {
        if a == b {
            return self.constant(0);
        }
        if let (Some(x), Some(y)) = (self.constant_value(a), self.constant_value(b)) {
            return self.constant(i64::from(x != y));
        }
        let (a, b) = Self::ordered(a, b);
        self.intern(Node::Ne(a, b))
    }

    /// Evaluate `root` under a concrete digit assignment
    pub fn eval(&self, root: ExprId, digits: &[i64]) -> Result<i64> {
        let mut values: Vec<i64> = Vec::with_capacity(root.index() + 1);
        for id in self.ids().take(root.index() + 1) {
            let value = match self.node(id) {
                Node::Const(value) => Some(value),
                Node::Digit(position) => Some(*digits.get(position).ok_or_else(|| {
                    MonadError::UnsupportedExpression(format!(
                        "digit {} referenced but only {} digits supplied",
                        position,
                        digits.len()
                    ))
                })?),
                Node::Add(a, b) => values[a.index()].checked_add(values[b.index()]),
                Node::Mul(a, b) => values[a.index()].checked_mul(values[b.index()]),
                Node::Div(a, b) => values[a.index()].checked_div_euclid(values[b.index()]),
                Node::Mod(a, b) => values[a.index()].checked_rem_euclid(values[b.index()]),
                Node::Ne(a, b) => Some(i64::from(values[a.index()] != values[b.index()])),
            };
            let value = value.ok_or_else(|| {
                MonadError::UnsupportedExpression(format!(
                    "node {} ({:?}) overflows or divides by zero",
                    id.index(),
                    self.node(id)
                ))
            })?;
            values.push(value);
        }
        Ok(values[root.index()])
    }
}
