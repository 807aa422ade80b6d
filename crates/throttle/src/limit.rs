//! Validated concurrency limit.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::error::InvalidArgument;

/// Maximum number of tasks allowed in flight at once. Always `>= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Limit(NonZeroUsize);

impl Limit {
    /// Create a limit, rejecting zero.
    pub fn new(value: usize) -> Result<Self, InvalidArgument> {
        NonZeroUsize::new(value)
            .map(Limit)
            .ok_or_else(|| invalid(format_args!("{value}")))
    }

    /// One less than the available parallelism of the host, and at least one.
    pub fn available_parallelism() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        NonZeroUsize::new(cpus.saturating_sub(1))
            .map(Limit)
            .unwrap_or(Limit(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

fn invalid(got: fmt::Arguments<'_>) -> InvalidArgument {
    InvalidArgument(format!(
        "expected `limit` to be an integer >= 1, got `{got}`"
    ))
}

impl From<NonZeroUsize> for Limit {
    fn from(value: NonZeroUsize) -> Self {
        Limit(value)
    }
}

impl TryFrom<usize> for Limit {
    type Error = InvalidArgument;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Limit::new(value)
    }
}

impl TryFrom<i64> for Limit {
    type Error = InvalidArgument;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Limit)
            .ok_or_else(|| invalid(format_args!("{value}")))
    }
}

impl TryFrom<f64> for Limit {
    type Error = InvalidArgument;

    /// Accepts integral floats such as `3.0`; rejects fractions, NaN and infinities.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > usize::MAX as f64 {
            return Err(invalid(format_args!("{value}")));
        }
        Limit::new(value as usize)
    }
}

impl FromStr for Limit {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return Limit::try_from(int);
        }
        match trimmed.parse::<f64>() {
            Ok(float) => Limit::try_from(float),
            Err(_) => Err(invalid(format_args!("{s}"))),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
