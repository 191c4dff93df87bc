//! Table acquisition with retry and exponential backoff.

mod naming;
mod tolerance;

use std::sync::Arc;

pub use naming::{ModelNaming, PrefixedNaming, TableNaming};
use thiserror::Error;
pub use tolerance::{
    Backoff, ConnectTolerance, Sleeper, ThreadSleeper, DEFAULT_ATTEMPTS_MAX,
    DEFAULT_RETRY_DELAY_INIT, DEFAULT_RETRY_DELAY_MAX, DEFAULT_RETRY_DELAY_MULTIPLIER,
};

use crate::{
    model::{Name, TableModel},
    observability::{log_debug, log_error, log_info, log_warn, CONNECT},
    store::{Admin, StoreError, Table},
};

/// Every attempt to acquire a table failed.
#[derive(Debug, Error)]
#[error("failed to connect to table {table} after {attempts} attempt(s); last error: {source}")]
pub struct AcquisitionError {
    /// Physical table name.
    pub table: Name,
    pub attempts: u32,
    #[source]
    pub source: StoreError,
}

/// Turns table models into live table handles, creating tables on demand.
pub struct Connector {
    admin: Arc<dyn Admin>,
    naming: Arc<dyn TableNaming>,
    tolerance: ConnectTolerance,
    sleeper: Arc<dyn Sleeper>,
}

impl Connector {
    pub fn new(
        admin: Arc<dyn Admin>,
        naming: Arc<dyn TableNaming>,
        tolerance: ConnectTolerance,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            admin,
            naming,
            tolerance,
            sleeper,
        }
    }

    pub fn tolerance(&self) -> &ConnectTolerance {
        &self.tolerance
    }

    /// Physical name `model` maps to.
    pub fn physical_name(&self, model: &TableModel) -> Name {
        self.naming.resolve(model)
    }

    /// Acquire a handle to `model`'s table, creating the table and its
    /// families if absent. Blocks the calling thread between attempts.
    pub fn connect(&self, model: &TableModel) -> Result<Arc<dyn Table>, AcquisitionError> {
        let table = self.naming.resolve(model);
        let attempts_max = self.tolerance.max_attempts();
        let mut backoff = self.tolerance.backoff();
        let mut attempt = 0;

        loop {
            let delay = backoff.next_delay();
            if !delay.is_zero() {
                log_debug!(
                    CONNECT, "retry_scheduled",
                    table = %table,
                    attempt,
                    attempts_max,
                    delay_ms = delay.as_millis() as u64,
                );
                self.sleeper.sleep(delay);
            }
            attempt += 1;

            match self.attempt(model, &table) {
                Ok(handle) => {
                    log_debug!(
                        CONNECT, "table_connected",
                        table = %table,
                        attempt,
                    );
                    return Ok(handle);
                }
                Err(source) if attempt >= attempts_max => {
                    log_error!(
                        CONNECT, "retries_exhausted",
                        table = %table,
                        attempts = attempt,
                        error = %source,
                    );
                    return Err(AcquisitionError {
                        table,
                        attempts: attempt,
                        source,
                    });
                }
                Err(err) => {
                    log_warn!(
                        CONNECT, "attempt_failed",
                        table = %table,
                        attempt,
                        attempts_max,
                        error = %err,
                    );
                }
            }
        }
    }

    fn attempt(&self, model: &TableModel, table: &Name) -> Result<Arc<dyn Table>, StoreError> {
        if !self.admin.table_exists(table)? {
            let families: Vec<Name> = model
                .families()
                .iter()
                .map(|family| family.name().clone())
                .collect();
            match self.admin.create_table(table, &families) {
                Ok(()) => log_info!(
                    CONNECT, "table_created",
                    table = %table,
                    families = families.len(),
                ),
                // Lost a creation race; the table is there either way.
                Err(StoreError::TableExists(_)) => {}
                Err(err) => return Err(err),
            }
        }
        self.admin.open_table(table)
    }
}
