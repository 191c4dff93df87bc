//! Immutable domain values: names, table/family/qualifier models, row keys,
//! values and the cells read back from the store.
//!
//! Everything here is built once and then shared freely across threads.

mod cell;
mod datum;
mod name;
mod range;
mod table;
mod versioning;

pub use cell::{RowKey, Value};
pub use datum::{
    deserializer_fn, CellDeserializer, Content, Datum, DatumError, DeserializeError,
    FamilyQualifierPair, TableRow,
};
pub use name::Name;
pub use range::LongRange;
pub use table::{
    FamilyModel, FamilyModelBuilder, ModelError, QualModel, QualModelBuilder, TableModel,
    TableModelBuilder,
};
pub use versioning::VersioningModel;
