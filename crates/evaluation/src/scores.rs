// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::LifecycleError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DIMENSIONS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Innovation,
    Feasibility,
    Impact,
    Technical,
}

impl Dimension {
    pub const ALL: [Dimension; DIMENSIONS] = [
        Dimension::Innovation,
        Dimension::Feasibility,
        Dimension::Impact,
        Dimension::Technical,
    ];
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Innovation => write!(f, "innovation"),
            Dimension::Feasibility => write!(f, "feasibility"),
            Dimension::Impact => write!(f, "impact"),
            Dimension::Technical => write!(f, "technical"),
        }
    }
}

/// Plaintext scores as submitted by an evaluator, one per dimension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scores {
    pub innovation: u8,
    pub feasibility: u8,
    pub impact: u8,
    pub technical: u8,
}

impl Scores {
    pub fn new(innovation: u8, feasibility: u8, impact: u8, technical: u8) -> Self {
        Self {
            innovation,
            feasibility,
            impact,
            technical,
        }
    }

    pub fn values(&self) -> [u8; DIMENSIONS] {
        [self.innovation, self.feasibility, self.impact, self.technical]
    }

    /// Every dimension must lie in `0..=max`
    pub fn validate(&self, max: u8) -> Result<(), LifecycleError> {
        for (dimension, value) in Dimension::ALL.into_iter().zip(self.values()) {
            if value > max {
                return Err(LifecycleError::ScoreOutOfRange {
                    dimension,
                    value,
                    max,
                });
            }
        }
        Ok(())
    }

    pub fn sum(&self) -> u64 {
        self.values().iter().map(|v| *v as u64).sum()
    }
}

impl From<[u8; DIMENSIONS]> for Scores {
    fn from(v: [u8; DIMENSIONS]) -> Self {
        Scores::new(v[0], v[1], v[2], v[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_dimension_is_range_checked_independently() {
        for position in 0..DIMENSIONS {
            let mut values = [5u8; DIMENSIONS];
            values[position] = 11;
            let err = Scores::from(values).validate(10).unwrap_err();
            assert_eq!(
                err,
                LifecycleError::ScoreOutOfRange {
                    dimension: Dimension::ALL[position],
                    value: 11,
                    max: 10
                }
            );
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(Scores::new(0, 10, 10, 0).validate(10).is_ok());
        assert_eq!(Scores::new(8, 7, 9, 8).sum(), 32);
    }
}
