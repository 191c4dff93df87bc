use std::ops::Bound;

use super::{set_once, SpecError};
use crate::model::LongRange;

const TARGET: &str = "range";

/// Fluid builder for a [`LongRange`].
///
/// Each end may be set at most once; `eq` sets both.
///
/// ```
/// use shachi::spec::LongValueSpec;
///
/// let range = LongValueSpec::new().ge(10)?.lt(20)?.freeze()?;
/// assert!(range.contains(19));
/// assert!(!range.contains(20));
/// # Ok::<(), shachi::spec::SpecError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct LongValueSpec {
    lower: Option<Bound<i64>>,
    upper: Option<Bound<i64>>,
}

impl LongValueSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(self, value: i64) -> Result<Self, SpecError> {
        self.lower(Bound::Excluded(value))
    }

    pub fn ge(self, value: i64) -> Result<Self, SpecError> {
        self.lower(Bound::Included(value))
    }

    pub fn lt(self, value: i64) -> Result<Self, SpecError> {
        self.upper(Bound::Excluded(value))
    }

    pub fn le(self, value: i64) -> Result<Self, SpecError> {
        self.upper(Bound::Included(value))
    }

    pub fn eq(self, value: i64) -> Result<Self, SpecError> {
        self.lower(Bound::Included(value))?
            .upper(Bound::Included(value))
    }

    fn lower(mut self, bound: Bound<i64>) -> Result<Self, SpecError> {
        set_once(&mut self.lower, bound, TARGET, "lower bound")?;
        Ok(self)
    }

    fn upper(mut self, bound: Bound<i64>) -> Result<Self, SpecError> {
        set_once(&mut self.upper, bound, TARGET, "upper bound")?;
        Ok(self)
    }

    /// Seal the range, rejecting one that admits no value.
    pub fn freeze(self) -> Result<LongRange, SpecError> {
        let lower = self.lower.unwrap_or(Bound::Unbounded);
        let upper = self.upper.unwrap_or(Bound::Unbounded);
        let range = LongRange::from_bounds(lower, upper);
        if range.is_empty() {
            return Err(SpecError::EmptyRange { lower, upper });
        }
        Ok(range)
    }
}
