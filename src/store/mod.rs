//! Storage collaborator interface.
//!
//! The access layer never talks to a storage engine directly. It shapes
//! requests into [`Get`], [`Mutation`] and [`Check`] values and hands them to
//! an [`Admin`]/[`Table`] pair; anything that keeps cells keyed by row,
//! family, qualifier and timestamp can sit behind these traits.

pub mod mem;

use std::{io, sync::Arc};

use bytes::Bytes;
use thiserror::Error;

use crate::model::{LongRange, Name};

/// Failures reported by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("table {0} does not exist")]
    TableNotFound(Name),
    #[error("table {0} already exists")]
    TableExists(Name),
    #[error("family {} is not defined on table {table}", .family.escape_ascii())]
    FamilyNotFound { table: Name, family: Bytes },
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("store error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Table administration.
pub trait Admin: Send + Sync {
    fn table_exists(&self, table: &Name) -> Result<bool, StoreError>;

    /// Create `table` with the given families. Fails with
    /// [`StoreError::TableExists`] if it is already there.
    fn create_table(&self, table: &Name, families: &[Name]) -> Result<(), StoreError>;

    fn open_table(&self, table: &Name) -> Result<Arc<dyn Table>, StoreError>;
}

/// A live table handle.
pub trait Table: Send + Sync {
    fn name(&self) -> &Name;

    /// Cells of one family in `row`, qualifiers ascending, newest timestamp
    /// first within a qualifier.
    fn get(&self, row: &[u8], get: &Get) -> Result<Vec<Cell>, StoreError>;

    fn mutate(&self, row: &[u8], mutation: &Mutation) -> Result<(), StoreError>;

    /// Apply `mutation` only if `check` holds, atomically. Returns whether
    /// the mutation was applied.
    fn check_and_mutate(
        &self,
        row: &[u8],
        check: &Check,
        mutation: &Mutation,
    ) -> Result<bool, StoreError>;
}

/// Which qualifiers of a family a [`Get`] covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QualifierSelector {
    All,
    Exact(Bytes),
    /// Inclusive on both ends.
    Range { start: Bytes, end: Bytes },
}

impl QualifierSelector {
    pub fn matches(&self, qualifier: &[u8]) -> bool {
        match self {
            QualifierSelector::All => true,
            QualifierSelector::Exact(exact) => exact.as_ref() == qualifier,
            QualifierSelector::Range { start, end } => {
                start.as_ref() <= qualifier && qualifier <= end.as_ref()
            }
        }
    }
}

/// Single-row, single-family read request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Get {
    pub family: Bytes,
    pub qualifiers: QualifierSelector,
    pub time_range: LongRange,
    /// Newest versions kept per qualifier; `None` keeps all.
    pub max_versions: Option<usize>,
    /// Total cells returned; `None` returns all.
    pub limit: Option<usize>,
}

impl Get {
    pub fn family(family: impl Into<Bytes>) -> Self {
        Self {
            family: family.into(),
            qualifiers: QualifierSelector::All,
            time_range: LongRange::all(),
            max_versions: None,
            limit: None,
        }
    }
}

/// A stored cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub family: Bytes,
    pub qualifier: Bytes,
    pub timestamp: i64,
    pub value: Bytes,
}

/// One cell to write. A missing timestamp is filled from the store's clock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Put {
    pub family: Bytes,
    pub qualifier: Bytes,
    pub timestamp: Option<i64>,
    pub value: Bytes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Put(Vec<Put>),
    DeleteRow,
}

/// Precondition for [`Table::check_and_mutate`]: the newest cell at
/// `family:qualifier` holds `expected`, or no cell exists when `expected` is
/// `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub family: Bytes,
    pub qualifier: Bytes,
    /// Restrict the check to this exact timestamp.
    pub timestamp: Option<i64>,
    pub expected: Option<Bytes>,
}
