//! Model numbers: fourteen digits, each in 1..=9

use super::coefficients::DIGIT_COUNT;
use crate::error::{MonadError, Result};
use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Smallest value a digit variable may take
pub const MIN_DIGIT: u8 = 1;
/// Largest value a digit variable may take
pub const MAX_DIGIT: u8 = 9;

/// A complete digit assignment, most-significant position first.
///
/// The derived ordering compares positions left to right, so it is the
/// lexicographic order of the 14-character strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelNumber([u8; DIGIT_COUNT]);

impl ModelNumber {
    /// Create a model number, rejecting digits outside 1..=9
    pub fn new(digits: [u8; DIGIT_COUNT]) -> Result<Self> {
        if let Some((position, digit)) = digits
            .iter()
            .enumerate()
            .find(|&(_, &d)| !(MIN_DIGIT..=MAX_DIGIT).contains(&d))
        {
            return Err(MonadError::InvalidModelNumber(format!(
                "digit {} at position {} is outside {}..={}",
                digit, position, MIN_DIGIT, MAX_DIGIT
            )));
        }
        Ok(Self(digits))
    }

    pub fn digits(&self) -> &[u8; DIGIT_COUNT] {
        &self.0
    }

    /// Digit at `position`; panics when out of range like slice indexing
    pub fn digit(&self, position: usize) -> u8 {
        self.0[position]
    }

    /// Digits widened for arithmetic
    pub fn as_inputs(&self) -> Vec<i64> {
        self.0.iter().map(|&d| i64::from(d)).collect()
    }
}

impl FromStr for ModelNumber {
    type Err = MonadError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let count = s.chars().count();
        if count != DIGIT_COUNT {
            return Err(MonadError::InvalidModelNumber(format!(
                "expected {} digits, found {} characters in {:?}",
                DIGIT_COUNT, count, s
            )));
        }

        let mut digits = [0u8; DIGIT_COUNT];
        for (position, ch) in s.chars().enumerate() {
            let value = ch.to_digit(10).ok_or_else(|| {
                MonadError::InvalidModelNumber(format!(
                    "character {:?} at position {} is not a decimal digit",
                    ch, position
                ))
            })?;
            digits[position] = value as u8;
        }
        Self::new(digits)
    }
}

impl std::fmt::Display for ModelNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(""))
    }
}

impl Serialize for ModelNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModelNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
