//! Fixed-point scores and the sentinel codes reported through the C ABI.
//!
//! A score is a percentage with two implied decimals: `4625` is 46.25 %. The
//! valid range is `0..=20000` (0 % to 200 %). Values above 100 % pass through;
//! only grossly out-of-range probabilities are turned into errors.

use std::fmt;

use thiserror::Error;

/// Fixed-point units per percent.
pub const SCALE: i32 = 100;

/// Largest valid score, 200.00 %.
pub const MAX_SCORE: i32 = 200 * SCALE;

/// Why a message could not be scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("message is null, not valid UTF-8, or of disallowed length")]
    InvalidMessage,

    #[error("probability {0} is above 200%")]
    AboveRange(f64),

    #[error("probability {0} is below 0%")]
    BelowRange(f64),

    /// The network failed to produce a value at all.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl ScoreError {
    /// Sentinel returned by `ravensaid()` for this error.
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidMessage => -1,
            Self::AboveRange(_) | Self::Inference(_) => -2,
            Self::BelowRange(_) => -3,
        }
    }
}

/// A probability in fixed-point percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(i32);

impl Score {
    /// Convert a probability (1.0 = 100 %) to a score, truncating towards zero.
    ///
    /// NaN is treated as above range.
    pub fn from_probability(probability: f64) -> Result<Self, ScoreError> {
        if probability.is_nan() || probability > 2.0 {
            return Err(ScoreError::AboveRange(probability));
        }
        if probability < 0.0 {
            return Err(ScoreError::BelowRange(probability));
        }
        Ok(Self((probability * 100.0 * SCALE as f64) as i32))
    }

    /// Wrap an already fixed-point value. `None` outside `0..=MAX_SCORE`.
    pub fn from_fixed_point(value: i32) -> Option<Self> {
        (0..=MAX_SCORE).contains(&value).then_some(Self(value))
    }

    pub fn fixed_point(self) -> i32 {
        self.0
    }

    pub fn percent(self) -> f64 {
        self.0 as f64 / SCALE as f64
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / SCALE, self.0 % SCALE)
    }
}

/// Collapse a scoring result into the integer returned over the C ABI.
pub fn score_to_code(result: Result<Score, ScoreError>) -> i32 {
    match result {
        Ok(score) => score.fixed_point(),
        Err(e) => e.code(),
    }
}
