//! Independent checking of candidate model numbers

use crate::monad::{
    evaluate_chain, CoefficientTable, ModelNumber, Program, Register, DIGIT_COUNT, MAX_DIGIT,
    MIN_DIGIT,
};

/// Replays candidates through the recurrence and, optionally, an ALU program
pub struct SolutionValidator {
    table: CoefficientTable,
    program: Option<Program>,
}

/// Result of solution validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub candidate: String,
    pub is_valid: bool,
    /// Accumulator after each step, empty when the digits were rejected
    pub trace: Vec<i64>,
    /// `z` register after running the ALU program, when one was supplied
    pub alu_z: Option<i64>,
    pub failures: Vec<String>,
}

impl ValidationResult {
    pub fn z_final(&self) -> Option<i64> {
        self.trace.last().copied()
    }
}

impl SolutionValidator {
    pub fn new(table: CoefficientTable) -> Self {
        Self {
            table,
            program: None,
        }
    }

    /// Also replay every candidate through `program`
    pub fn with_program(mut self, program: Program) -> Self {
        self.program = Some(program);
        self
    }

    /// Validate a candidate given as text, reporting every failed check
    pub fn check(&self, candidate: &str) -> ValidationResult {
        let candidate = candidate.trim();
        let mut failures = Vec::new();

        let length = candidate.chars().count();
        if length != DIGIT_COUNT {
            failures.push(format!("expected {} digits, found {}", DIGIT_COUNT, length));
        }
        for (position, ch) in candidate.chars().enumerate() {
            let in_range = ch
                .to_digit(10)
                .map(|d| (u32::from(MIN_DIGIT)..=u32::from(MAX_DIGIT)).contains(&d))
                .unwrap_or(false);
            if !in_range {
                failures.push(format!(
                    "position {}: {:?} is not a digit in {}..={}",
                    position, ch, MIN_DIGIT, MAX_DIGIT
                ));
            }
        }

        if !failures.is_empty() {
            return ValidationResult {
                candidate: candidate.to_string(),
                is_valid: false,
                trace: Vec::new(),
                alu_z: None,
                failures,
            };
        }

        match candidate.parse::<ModelNumber>() {
            Ok(number) => self.validate(&number),
            Err(err) => ValidationResult {
                candidate: candidate.to_string(),
                is_valid: false,
                trace: Vec::new(),
                alu_z: None,
                failures: vec![err.to_string()],
            },
        }
    }

    /// Validate a well-formed model number
    pub fn validate(&self, number: &ModelNumber) -> ValidationResult {
        let mut failures = Vec::new();

        let trace = match evaluate_chain(&self.table, number) {
            Ok(trace) => {
                if !trace.is_accepted() {
                    failures.push(format!(
                        "recurrence ends at z = {}, expected 0",
                        trace.z_final()
                    ));
                }
                trace.values
            }
            Err(err) => {
                failures.push(format!("recurrence failed: {}", err));
                Vec::new()
            }
        };

        let alu_z = self.program.as_ref().and_then(|program| {
            match program.run(&number.as_inputs()) {
                Ok(registers) => {
                    let z = registers.get(Register::Z);
                    if z != 0 {
                        failures.push(format!("ALU program ends at z = {}, expected 0", z));
                    }
                    Some(z)
                }
                Err(err) => {
                    failures.push(format!("ALU program failed: {}", err));
                    None
                }
            }
        });

        ValidationResult {
            candidate: number.to_string(),
            is_valid: failures.is_empty(),
            trace,
            alu_z,
            failures,
        }
    }
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Validation Result:")?;
        writeln!(f, "  Candidate: {}", self.candidate)?;
        writeln!(f, "  Valid: {}", if self.is_valid { "✓" } else { "✗" })?;
        if let Some(z) = self.z_final() {
            writeln!(f, "  Final z (recurrence): {}", z)?;
        }
        if let Some(z) = self.alu_z {
            writeln!(f, "  Final z (ALU): {}", z)?;
        }
        if !self.trace.is_empty() {
            let steps: Vec<String> = self.trace.iter().map(|z| z.to_string()).collect();
            writeln!(f, "  Trace: {}", steps.join(" → "))?;
        }
        for failure in &self.failures {
            writeln!(f, "  Failure: {}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SolutionValidator {
        let table = CoefficientTable::puzzle();
        let program = Program::from_table(&table);
        SolutionValidator::new(table).with_program(program)
    }

    #[test]
    fn test_accepts_known_answer() {
        let result = validator().check("99199996849497");
        assert!(result.is_valid, "{}", result);
        assert_eq!(result.z_final(), Some(0));
        assert_eq!(result.alu_z, Some(0));
        assert_eq!(result.trace.len(), DIGIT_COUNT);
    }

    #[test]
    fn test_rejects_non_zero_accumulator() {
        let result = validator().check("13579246899999");
        assert!(!result.is_valid);
        assert_eq!(result.z_final(), Some(4140932948));
        assert_eq!(result.alu_z, Some(4140932948));
        assert_eq!(result.failures.len(), 2);
    }

    #[test]
    fn test_reports_every_bad_digit() {
        let result = validator().check("1357924680999x");
        assert!(!result.is_valid);
        assert!(result.trace.is_empty());
        assert_eq!(result.failures.len(), 2);
        assert!(result.failures[0].contains("position 9"));
        assert!(result.failures[1].contains("position 13"));
    }

    #[test]
    fn test_reports_wrong_length() {
        let result = SolutionValidator::new(CoefficientTable::puzzle()).check("1234");
        assert!(!result.is_valid);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.alu_z, None);
    }

    #[test]
    fn test_display_lists_failures() {
        let rendered = validator().check("11111111111111").to_string();
        assert!(rendered.contains("✗"));
        assert!(rendered.contains("158278316"));
    }
}
