//! Variable management for the SAT encoding

use crate::error::{MonadError, Result};
use crate::monad::{DIGIT_COUNT, MAX_DIGIT, MIN_DIGIT};
use std::collections::HashMap;

/// A DIMACS literal: positive for a variable, negative for its negation
pub type Literal = i32;

/// Named variables of the encoding; circuit wires are anonymous
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// Constant-true variable, fixed by a unit clause
    True,
    /// One-hot indicator: digit at `position` equals `value`
    Digit { position: usize, value: u8 },
}

/// Manages SAT variables and their mapping to integers
#[derive(Debug)]
pub struct VariableManager {
    /// Map from variable type to SAT variable ID (positive integer)
    variable_map: HashMap<VariableType, i32>,
    /// Next available variable ID
    next_id: i32,
    auxiliary: usize,
}

impl VariableManager {
    pub fn new() -> Self {
        Self {
            variable_map: HashMap::new(),
            next_id: 1, // SAT variables start from 1
            auxiliary: 0,
        }
    }

    /// Get or create a variable ID for the given variable type
    pub fn get_variable(&mut self, var_type: VariableType) -> Result<i32> {
        if let Some(&id) = self.variable_map.get(&var_type) {
            return Ok(id);
        }

        self.validate_variable(&var_type)?;

        let id = self.allocate()?;
        self.variable_map.insert(var_type, id);
        Ok(id)
    }

    /// Literal asserting that the digit at `position` equals `value`
    pub fn digit_variable(&mut self, position: usize, value: u8) -> Result<Literal> {
        self.get_variable(VariableType::Digit { position, value })
    }

    /// The nine one-hot literals of a position, ordered by value 1..=9
    pub fn digit_variables(&mut self, position: usize) -> Result<Vec<Literal>> {
        (MIN_DIGIT..=MAX_DIGIT)
            .map(|value| self.digit_variable(position, value))
            .collect()
    }

    pub fn true_literal(&mut self) -> Result<Literal> {
        self.get_variable(VariableType::True)
    }

    /// Fresh anonymous variable for a circuit wire
    pub fn fresh(&mut self) -> Result<Literal> {
        let id = self.allocate()?;
        self.auxiliary += 1;
        Ok(id)
    }

    fn allocate(&mut self) -> Result<i32> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| MonadError::Backend("SAT variable space exhausted".to_string()))?;
        Ok(id)
    }

    /// Get the total number of variables created
    pub fn variable_count(&self) -> usize {
        (self.next_id - 1) as usize
    }

    fn validate_variable(&self, var_type: &VariableType) -> Result<()> {
        if let VariableType::Digit { position, value } = var_type {
            if *position >= DIGIT_COUNT {
                return Err(MonadError::Backend(format!(
                    "digit position {} out of bounds (digits: {})",
                    position, DIGIT_COUNT
                )));
            }
            if !(MIN_DIGIT..=MAX_DIGIT).contains(value) {
                return Err(MonadError::Backend(format!(
                    "digit value {} outside {}..={}",
                    value, MIN_DIGIT, MAX_DIGIT
                )));
            }
        }
        Ok(())
    }

    /// Get statistics about variable usage
    pub fn statistics(&self) -> VariableStatistics {
        let digit_variables = self
            .variable_map
            .keys()
            .filter(|var_type| matches!(var_type, VariableType::Digit { .. }))
            .count();

        VariableStatistics {
            total_variables: self.variable_count(),
            digit_variables,
            auxiliary_variables: self.auxiliary,
        }
    }
}

impl Default for VariableManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about variable usage
#[derive(Debug, Clone)]
pub struct VariableStatistics {
    pub total_variables: usize,
    pub digit_variables: usize,
    pub auxiliary_variables: usize,
}

impl std::fmt::Display for VariableStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Variable Statistics:")?;
        writeln!(f, "  Total variables: {}", self.total_variables)?;
        writeln!(f, "  Digit variables: {}", self.digit_variables)?;
        writeln!(f, "  Auxiliary variables: {}", self.auxiliary_variables)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_creation() {
        let mut vm = VariableManager::new();

        let var1 = vm.digit_variable(0, 1).unwrap();
        let var2 = vm.digit_variable(13, 9).unwrap();

        assert_eq!(var1, 1);
        assert_eq!(var2, 2);

        // Same variable returns same ID
        assert_eq!(vm.digit_variable(0, 1).unwrap(), var1);
    }

    #[test]
    fn test_variable_bounds() {
        let mut vm = VariableManager::new();

        assert!(vm.digit_variable(0, 1).is_ok());
        assert!(vm.digit_variable(13, 9).is_ok());

        assert!(vm.digit_variable(14, 1).is_err());
        assert!(vm.digit_variable(0, 0).is_err());
        assert!(vm.digit_variable(0, 10).is_err());
    }

    #[test]
    fn test_digit_variables_are_distinct() {
        let mut vm = VariableManager::new();

        let vars = vm.digit_variables(3).unwrap();
        assert_eq!(vars.len(), 9);

        let mut unique_vars = vars.clone();
        unique_vars.sort();
        unique_vars.dedup();
        assert_eq!(vars.len(), unique_vars.len());
    }

    #[test]
    fn test_fresh_and_statistics() {
        let mut vm = VariableManager::new();
        let t = vm.true_literal().unwrap();
        vm.digit_variables(0).unwrap();
        let a = vm.fresh().unwrap();
        let b = vm.fresh().unwrap();

        assert_eq!(vm.true_literal().unwrap(), t);
        assert_ne!(a, b);

        let stats = vm.statistics();
        assert_eq!(stats.total_variables, 12);
        assert_eq!(stats.digit_variables, 9);
        assert_eq!(stats.auxiliary_variables, 2);
    }
}
