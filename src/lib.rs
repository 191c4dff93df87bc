//! Typed client-side access layer for column-family stores.
//!
//! Tables are described once as immutable [`model::TableModel`]s. Reads and
//! writes are declared through fluid builders that enforce how often each
//! attribute may be set, frozen into validated operations, and executed in
//! batches against a [`store::Admin`] implementation, synchronously or via an
//! [`executor::Executor`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use shachi::{
//!     model::{FamilyModel, QualModel, TableModel, VersioningModel},
//!     spec::{ReadColumn, WriteColumn},
//!     store::mem::MemStore,
//!     Client, Context,
//! };
//!
//! let table = TableModel::with("users")
//!     .family(
//!         FamilyModel::with("profile")
//!             .qual(
//!                 QualModel::with("email")
//!                     .versioning(VersioningModel::QualifierLatest)
//!                     .build(),
//!             )
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let client = Client::new(Context::builder(Arc::new(MemStore::new())).build());
//!
//! let mut batch = client.begin();
//! batch.write("put")?.on(&table, "alice")?.with(
//!     WriteColumn::new()
//!         .fam("profile")?
//!         .qual("email")?
//!         .value("alice@example.com")?
//!         .version(1)?,
//! )?;
//! batch.exec()?;
//!
//! let mut batch = client.begin();
//! batch
//!     .read("get")?
//!     .from(&table, "alice")?
//!     .with_handle("email", ReadColumn::new().fam("profile")?.qual("email")?)?;
//! let results = batch.exec()?;
//!
//! let email = &results.read_result("get").unwrap().data("email").unwrap()[0];
//! assert_eq!(email.version(), Some(1));
//! assert_eq!(email.value().as_bytes(), b"alice@example.com");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod client;
mod clock;
pub mod codec;
pub mod connect;
mod context;
mod error;
mod exec;
pub mod executor;
pub mod model;
mod observability;
pub mod salt;
pub mod spec;
pub mod store;

pub use client::Client;
pub use context::{Context, ContextBuilder};
pub use error::Error;
pub use exec::{
    ExecFuture, FrozenBatch, OpBatch, OpResult, OpResultSet, ReadResult, WriteOutcome,
    WriteResult,
};
