use crate::{
    codec::CodecError,
    connect::AcquisitionError,
    model::{ModelError, Name, RowKey},
    spec::SpecError,
    store::StoreError,
};

/// Error returned by batch execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Table model error
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    /// Builder misuse or invalid operation
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),
    /// Version encoding or decoding error
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    /// Table could not be acquired
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    /// Store request failed
    #[error("store error on {table}/{row} [{}]: {source}", .columns.join(", "))]
    Store {
        table: Name,
        row: RowKey,
        columns: Vec<String>,
        #[source]
        source: StoreError,
    },
    /// Required columns came back empty
    #[error("no data for required column(s) [{}] on {table}/{row}", .columns.join(", "))]
    MissingData {
        table: Name,
        row: RowKey,
        columns: Vec<String>,
    },
    /// Async execution task did not complete
    #[error("execution task failed: {0}")]
    Join(#[source] Box<dyn std::error::Error + Send + Sync>),
}
