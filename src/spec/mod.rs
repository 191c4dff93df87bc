//! Fluid operation builders and the frozen operations they produce.
//!
//! Builders accumulate fields one call at a time and enforce cardinality as
//! they go: exactly-once fields reject a second assignment and are checked
//! again on freeze, at-most-once fields only reject the second assignment.
//! Freezing validates the whole operation against its table model and
//! yields an immutable [`ReadOp`] or [`WriteOp`].

mod column;
mod op;
mod range;

use std::{borrow::Borrow, fmt, sync::Arc};

pub use column::{
    Condition, ConditionSpec, ReadColumn, ReadColumnSpec, VersionConstraint, WriteColumn,
    WriteColumnSpec,
};
pub use op::{ReadOp, ReadOpSpec, WriteOp, WriteOpSpec};
pub use range::LongValueSpec;
use thiserror::Error;

use crate::model::{Name, RowKey};

/// Caller-chosen label for an operation within a batch, or for a column
/// within an operation.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(Arc<str>);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Handle {
    fn from(value: &str) -> Self {
        Handle(Arc::from(value))
    }
}

impl From<String> for Handle {
    fn from(value: String) -> Self {
        Handle(Arc::from(value))
    }
}

impl From<&Handle> for Handle {
    fn from(value: &Handle) -> Self {
        value.clone()
    }
}

impl Borrow<str> for Handle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:?})", &*self.0)
    }
}

/// Why a complete operation failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Reason {
    #[error("no columns declared")]
    NoColumns,
    #[error("family {0} is not declared by the table")]
    UnknownFamily(Name),
    #[error("a version and a version filter were both given")]
    VersionConflict,
    #[error("a version constraint needs a qualifier")]
    VersionWithoutQualifier,
    #[error("qualifier {0} is not versioned")]
    Unversioned(Name),
    #[error("timestamp and version both given for a timestamp-versioned qualifier")]
    TimestampVersionConflict,
    #[error("column {0} written twice")]
    DuplicateColumn(String),
    #[error("column handle {0} used twice")]
    DuplicateColumnHandle(Handle),
    #[error("a row delete cannot carry columns")]
    DeleteWithColumns,
    #[error("condition names a version on an unversioned qualifier")]
    ConditionVersion,
    #[error("condition on a qualifier-versioned column needs a version")]
    ConditionNeedsVersion,
}

/// Builder misuse or an operation that cannot be executed as declared.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    /// An exactly-once or at-most-once field was assigned again.
    #[error("{field} is already set on {target}")]
    AlreadySet {
        target: &'static str,
        field: &'static str,
    },
    /// An exactly-once field was never assigned.
    #[error("{target} is missing {field}")]
    Missing {
        target: &'static str,
        field: &'static str,
    },
    /// Two operations in one batch share a handle.
    #[error("operation handle {0} is already used in this batch")]
    DuplicateHandle(Handle),
    /// A value range admits nothing.
    #[error("range from {lower:?} to {upper:?} is empty")]
    EmptyRange {
        lower: std::ops::Bound<i64>,
        upper: std::ops::Bound<i64>,
    },
    /// `at_most(0)`.
    #[error("result limit must be at least one")]
    ZeroLimit,
    /// A complete operation failed validation.
    #[error("invalid {target} on {table}/{row} [{}]: {reason}", .columns.join(", "))]
    Invalid {
        target: &'static str,
        table: Name,
        row: RowKey,
        columns: Vec<String>,
        reason: Reason,
    },
}

/// Assign `value` to `slot` unless it already holds one.
pub(crate) fn set_once<T>(
    slot: &mut Option<T>,
    value: T,
    target: &'static str,
    field: &'static str,
) -> Result<(), SpecError> {
    if slot.is_some() {
        return Err(SpecError::AlreadySet { target, field });
    }
    *slot = Some(value);
    Ok(())
}

/// Take an exactly-once value out of `slot`.
pub(crate) fn required<T>(
    slot: Option<T>,
    target: &'static str,
    field: &'static str,
) -> Result<T, SpecError> {
    slot.ok_or(SpecError::Missing { target, field })
}
