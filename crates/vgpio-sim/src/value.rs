//! Four-state logic vectors

use crate::error::{SimError, SimResult};
use bitvec::prelude::*;
use std::fmt;

/// A vector of 0/1/X bits, least significant bit first.
///
/// X and Z are not told apart: both make the vector unresolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicValue {
    bits: BitVec,
    unknown: BitVec,
}

impl LogicValue {
    pub fn zeros(width: usize) -> Self {
        LogicValue {
            bits: BitVec::repeat(false, width),
            unknown: BitVec::repeat(false, width),
        }
    }

    /// All bits X, as a bus looks before anything drives it
    pub fn unknown(width: usize) -> Self {
        LogicValue {
            bits: BitVec::repeat(false, width),
            unknown: BitVec::repeat(true, width),
        }
    }

    pub fn from_u64(width: usize, value: u64) -> Self {
        Self::from_u128(width, u128::from(value))
    }

    pub fn from_u128(width: usize, value: u128) -> Self {
        let mut logic = Self::zeros(width);
        for i in 0..width.min(128) {
            logic.bits.set(i, (value >> i) & 1 == 1);
        }
        logic
    }

    /// Parse an MSB-first binary string (`0`, `1`, `x`, `z`, `_` separators)
    /// or a `0x` hex literal. A lone `x` or `z` marks every bit unknown.
    pub fn parse(width: usize, text: &str) -> SimResult<Self> {
        let trimmed = text.trim();
        let invalid = |reason: &str| SimError::InvalidValue {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            let value = u128::from_str_radix(&hex.replace('_', ""), 16)
                .map_err(|e| invalid(&e.to_string()))?;
            if width < 128 && value >> width != 0 {
                return Err(invalid("value does not fit the signal width"));
            }
            return Ok(Self::from_u128(width, value));
        }

        if trimmed.eq_ignore_ascii_case("x") || trimmed.eq_ignore_ascii_case("z") {
            return Ok(Self::unknown(width));
        }

        let digits: Vec<char> = trimmed.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return Err(invalid("empty value"));
        }
        if digits.len() > width {
            return Err(invalid("more digits than the signal is wide"));
        }

        let mut logic = Self::zeros(width);
        for (i, digit) in digits.iter().rev().enumerate() {
            match digit {
                '0' => {}
                '1' => logic.bits.set(i, true),
                'x' | 'X' | 'z' | 'Z' => logic.unknown.set(i, true),
                other => return Err(invalid(&format!("unexpected digit '{other}'"))),
            }
        }
        Ok(logic)
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.unknown.not_any()
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown.count_ones()
    }

    /// The 0/1 bits, or `None` while any bit is unknown
    pub fn resolve(&self) -> Option<BitVec> {
        self.is_resolved().then(|| self.bits.clone())
    }

    /// Copy of this value with bit `index` forced to X
    pub fn with_unknown_bit(mut self, index: usize) -> Self {
        if index < self.width() {
            self.unknown.set(index, true);
        }
        self
    }

    /// Truncate or zero-extend to `width` bits
    pub fn resized(&self, width: usize) -> Self {
        let mut bits = self.bits.clone();
        let mut unknown = self.unknown.clone();
        bits.resize(width, false);
        unknown.resize(width, false);
        LogicValue { bits, unknown }
    }
}

impl fmt::Display for LogicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.width()).rev() {
            let digit = if self.unknown[i] {
                'x'
            } else if self.bits[i] {
                '1'
            } else {
                '0'
            };
            write!(f, "{digit}")?;
        }
        Ok(())
    }
}
