use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// A block reduced to the two fields the search needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Block number.
    pub number: U256,
    /// Block timestamp in seconds since the Unix epoch.
    pub timestamp: U256,
}

impl Block {
    pub const fn new(number: U256, timestamp: U256) -> Self {
        Self { number, timestamp }
    }

    /// Absolute distance in seconds between this block and `target`.
    pub fn distance(&self, target: U256) -> U256 {
        self.timestamp.abs_diff(target)
    }

    /// Signed offset of this block from `target`, for display.
    pub fn offset(&self, target: U256) -> Offset {
        Offset {
            ahead: self.timestamp >= target,
            seconds: self.distance(target),
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} @ {}", self.number, self.timestamp)
    }
}

/// Signed seconds between a block timestamp and a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    ahead: bool,
    seconds: U256,
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ahead || self.seconds.is_zero() {
            write!(f, "{}", self.seconds)
        } else {
            write!(f, "-{}", self.seconds)
        }
    }
}
