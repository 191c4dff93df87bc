use std::ops::Bound;

/// A range over signed 64-bit values (timestamps or versions).
///
/// Both ends may be open, inclusive or exclusive. Ranges from
/// [`LongValueSpec`](crate::spec::LongValueSpec) never have a lower bound
/// above the upper one; an intersection can still come out empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LongRange {
    lower: Bound<i64>,
    upper: Bound<i64>,
}

impl Default for LongRange {
    fn default() -> Self {
        Self::all()
    }
}

impl LongRange {
    const EMPTY: LongRange = LongRange::from_bounds(Bound::Excluded(i64::MAX), Bound::Unbounded);

    /// Unbounded on both ends.
    pub const fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    /// Exactly one value.
    pub const fn exactly(value: i64) -> Self {
        Self {
            lower: Bound::Included(value),
            upper: Bound::Included(value),
        }
    }

    /// Inclusive on both ends.
    pub const fn between(lower: i64, upper: i64) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Included(upper),
        }
    }

    pub(crate) const fn from_bounds(lower: Bound<i64>, upper: Bound<i64>) -> Self {
        Self { lower, upper }
    }

    /// Lower bound.
    pub fn lower(&self) -> Bound<i64> {
        self.lower
    }

    /// Upper bound.
    pub fn upper(&self) -> Bound<i64> {
        self.upper
    }

    /// Whether neither end is bounded.
    pub fn is_unbounded(&self) -> bool {
        matches!((self.lower, self.upper), (Bound::Unbounded, Bound::Unbounded))
    }

    /// Whether `value` falls inside the range.
    pub fn contains(&self, value: i64) -> bool {
        self.inclusive(i64::MIN)
            .is_some_and(|(lower, upper)| lower <= value && value <= upper)
    }

    /// Collapse to inclusive `(lower, upper)` ends, raising the lower end to
    /// at least `floor`. `None` when nothing remains.
    pub(crate) fn inclusive(&self, floor: i64) -> Option<(i64, i64)> {
        let lower = match self.lower {
            Bound::Unbounded => floor,
            Bound::Included(v) => v.max(floor),
            Bound::Excluded(v) => v.checked_add(1)?.max(floor),
        };
        let upper = match self.upper {
            Bound::Unbounded => i64::MAX,
            Bound::Included(v) => v,
            Bound::Excluded(v) => v.checked_sub(1)?,
        };
        (lower <= upper).then_some((lower, upper))
    }

    /// Intersection of two ranges; may be empty.
    pub fn intersect(&self, other: &LongRange) -> LongRange {
        match self.inclusive(i64::MIN).zip(other.inclusive(i64::MIN)) {
            Some(((a, b), (c, d))) if a.max(c) <= b.min(d) => LongRange::from_bounds(
                Bound::Included(a.max(c)),
                Bound::Included(b.min(d)),
            )
            .normalized(),
            _ => LongRange::EMPTY,
        }
    }

    fn normalized(self) -> Self {
        match (self.lower, self.upper) {
            (Bound::Included(i64::MIN), Bound::Included(i64::MAX)) => LongRange::all(),
            _ => self,
        }
    }

    /// Whether the range admits no value at all.
    pub fn is_empty(&self) -> bool {
        self.inclusive(i64::MIN).is_none()
    }
}
