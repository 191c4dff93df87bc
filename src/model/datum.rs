//! Cells as read back from the store.

use std::{
    any::Any,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::Arc,
};

use bytes::Bytes;
use once_cell::sync::OnceCell;
use thiserror::Error;

use super::{Name, RowKey, Value};

/// Deserialized cell content.
pub type Content = Arc<dyn Any + Send + Sync>;

/// Failure reported by a [`CellDeserializer`].
#[derive(Debug, Error)]
#[error("cell deserialization failed: {0}")]
pub struct DeserializeError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

impl DeserializeError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Turns raw cell bytes into a typed value.
pub trait CellDeserializer: Send + Sync {
    fn deserialize(&self, bytes: &[u8]) -> Result<Content, DeserializeError>;
}

struct FnDeserializer<F, T> {
    decode: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> CellDeserializer for FnDeserializer<F, T>
where
    F: Fn(&[u8]) -> Result<T, DeserializeError> + Send + Sync,
    T: Any + Send + Sync,
{
    fn deserialize(&self, bytes: &[u8]) -> Result<Content, DeserializeError> {
        (self.decode)(bytes).map(|value| Arc::new(value) as Content)
    }
}

/// Wrap a plain decoding function as a shareable deserializer.
pub fn deserializer_fn<F, T>(decode: F) -> Arc<dyn CellDeserializer>
where
    F: Fn(&[u8]) -> Result<T, DeserializeError> + Send + Sync + 'static,
    T: Any + Send + Sync,
{
    Arc::new(FnDeserializer {
        decode,
        _output: PhantomData,
    })
}

/// Errors from [`Datum::content`].
#[derive(Debug, Error)]
pub enum DatumError {
    #[error("no deserializer is defined for {0}")]
    NoDeserializer(String),
    #[error(transparent)]
    Deserialize(#[from] DeserializeError),
    #[error("content of {0} is not of the requested type")]
    TypeMismatch(String),
}

/// A physical column exactly as stored.
///
/// For qualifier-versioned columns the qualifier here is the literal stored
/// qualifier, version suffix included, not the logical name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FamilyQualifierPair {
    family: Name,
    qualifier: Bytes,
}

impl FamilyQualifierPair {
    pub fn new(family: Name, qualifier: impl Into<Bytes>) -> Self {
        Self {
            family,
            qualifier: qualifier.into(),
        }
    }

    pub fn family(&self) -> &Name {
        &self.family
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }
}

impl fmt::Display for FamilyQualifierPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.qualifier.escape_ascii())
    }
}

impl fmt::Debug for FamilyQualifierPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FamilyQualifierPair({self})")
    }
}

/// Logical table name plus the caller's (unsalted) row key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRow {
    table: Name,
    row: RowKey,
}

impl TableRow {
    pub fn new(table: Name, row: RowKey) -> Self {
        Self { table, row }
    }

    pub fn table(&self) -> &Name {
        &self.table
    }

    pub fn row(&self) -> &RowKey {
        &self.row
    }
}

impl fmt::Display for TableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.row)
    }
}

/// One cell read back from the store.
///
/// Equality and hashing cover the value, the row and the physical column.
/// The string form and deserialized content are computed on first use and
/// cached.
pub struct Datum {
    value: Value,
    timestamp: i64,
    version: Option<i64>,
    row: TableRow,
    column: FamilyQualifierPair,
    deserializer: Option<Arc<dyn CellDeserializer>>,
    content: OnceCell<Content>,
    repr: OnceCell<String>,
}

impl Datum {
    pub(crate) fn new(
        value: Value,
        timestamp: i64,
        version: Option<i64>,
        row: TableRow,
        column: FamilyQualifierPair,
        deserializer: Option<Arc<dyn CellDeserializer>>,
    ) -> Self {
        Self {
            value,
            timestamp,
            version,
            row,
            column,
            deserializer,
            content: OnceCell::new(),
            repr: OnceCell::new(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Cell timestamp as reported by the store.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Logical version decoded from the qualifier or timestamp, if the
    /// column is versioned.
    pub fn version(&self) -> Option<i64> {
        self.version
    }

    pub fn table_row(&self) -> &TableRow {
        &self.row
    }

    pub fn column(&self) -> &FamilyQualifierPair {
        &self.column
    }

    /// Deserialize the value with the most specific deserializer declared on
    /// the qualifier, family or table model.
    pub fn content(&self) -> Result<&Content, DatumError> {
        self.content.get_or_try_init(|| match &self.deserializer {
            Some(deserializer) => Ok(deserializer.deserialize(self.value.as_bytes())?),
            None => Err(DatumError::NoDeserializer(self.to_string())),
        })
    }

    /// Deserialize and downcast to `T`.
    pub fn content_as<T: Any>(&self) -> Result<&T, DatumError> {
        self.content()?
            .downcast_ref::<T>()
            .ok_or_else(|| DatumError::TypeMismatch(self.to_string()))
    }
}

impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.row == other.row && self.column == other.column
    }
}

impl Eq for Datum {}

impl Hash for Datum {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.row.hash(state);
        self.column.hash(state);
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self.repr.get_or_init(|| {
            format!(
                "Datum(value={},row={},column={},ts={})",
                self.value, self.row, self.column, self.timestamp
            )
        });
        f.write_str(repr)
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datum")
            .field("value", &self.value)
            .field("timestamp", &self.timestamp)
            .field("version", &self.version)
            .field("row", &self.row)
            .field("column", &self.column)
            .finish()
    }
}
