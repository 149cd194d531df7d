//! Optimization results and their serialized forms

use super::optimizer::Direction;
use crate::monad::ModelNumber;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of one optimization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub model_number: ModelNumber,
    pub direction: Direction,
    pub statistics: SolveStatistics,
}

/// Size and cost of the encoding behind a [`Solution`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStatistics {
    pub variables: usize,
    pub clauses: usize,
    pub solve_calls: usize,
    pub encoded_nodes: usize,
    pub division_witnesses: usize,
    /// Wall-clock time of the search, serialized in milliseconds
    #[serde(rename = "elapsed_ms", with = "millis")]
    pub elapsed: Duration,
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

impl Solution {
    pub fn new(model_number: ModelNumber, direction: Direction, statistics: SolveStatistics) -> Self {
        Self {
            model_number,
            direction,
            statistics,
        }
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl std::fmt::Display for SolveStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} variables, {} clauses, {} solve calls, {:.3}s",
            self.variables,
            self.clauses,
            self.solve_calls,
            self.elapsed.as_secs_f64()
        )
    }
}

/// The two answers, maximum first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPair {
    pub maximum: Solution,
    pub minimum: Solution,
}

impl AnswerPair {
    /// The two answer lines, maximum then minimum
    pub fn lines(&self) -> [String; 2] {
        [
            self.maximum.model_number.to_string(),
            self.minimum.model_number.to_string(),
        ]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(number: &str, direction: Direction) -> Solution {
        Solution::new(
            number.parse().unwrap(),
            direction,
            SolveStatistics {
                variables: 10,
                clauses: 20,
                solve_calls: 3,
                elapsed: Duration::from_millis(1500),
                ..SolveStatistics::default()
            },
        )
    }

    #[test]
    fn test_answer_lines() {
        let pair = AnswerPair {
            maximum: solution("99199996849497", Direction::Maximize),
            minimum: solution("31111241191841", Direction::Minimize),
        };
        assert_eq!(pair.lines(), ["99199996849497".to_string(), "31111241191841".to_string()]);
    }

    #[test]
    fn test_json_shape() {
        let json = solution("99199996849497", Direction::Maximize).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model_number"], "99199996849497");
        assert_eq!(value["direction"], "maximize");
        assert_eq!(value["statistics"]["elapsed_ms"], 1500);

        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back.statistics.elapsed, Duration::from_millis(1500));
    }

    #[test]
    fn test_statistics_display() {
        let text = solution("99199996849497", Direction::Maximize).statistics.to_string();
        assert!(text.contains("3 solve calls"));
        assert!(text.contains("1.500s"));
    }
}
