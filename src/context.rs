use std::sync::Arc;

use crate::{
    connect::{ConnectTolerance, Connector, ModelNaming, Sleeper, TableNaming, ThreadSleeper},
    salt::{RowKeySalter, SaltHash, Xxh32},
    store::Admin,
};

/// Everything execution needs besides the operations themselves: how to
/// reach and name tables, how hard to try, and how to salt row keys.
pub struct Context {
    connector: Connector,
    salter: RowKeySalter,
}

impl Context {
    pub fn builder(admin: Arc<dyn Admin>) -> ContextBuilder {
        ContextBuilder {
            admin,
            naming: Arc::new(ModelNaming),
            tolerance: ConnectTolerance::default(),
            sleeper: Arc::new(ThreadSleeper),
            salt_hash: Arc::new(Xxh32::default()),
        }
    }

    pub(crate) fn connector(&self) -> &Connector {
        &self.connector
    }

    pub(crate) fn salter(&self) -> &RowKeySalter {
        &self.salter
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("tolerance", self.connector.tolerance())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Context`].
pub struct ContextBuilder {
    admin: Arc<dyn Admin>,
    naming: Arc<dyn TableNaming>,
    tolerance: ConnectTolerance,
    sleeper: Arc<dyn Sleeper>,
    salt_hash: Arc<dyn SaltHash>,
}

impl ContextBuilder {
    #[must_use]
    pub fn naming(mut self, naming: Arc<dyn TableNaming>) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn tolerance(mut self, tolerance: ConnectTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn salt_hash(mut self, salt_hash: Arc<dyn SaltHash>) -> Self {
        self.salt_hash = salt_hash;
        self
    }

    pub fn build(self) -> Context {
        Context {
            connector: Connector::new(self.admin, self.naming, self.tolerance, self.sleeper),
            salter: RowKeySalter::new(self.salt_hash),
        }
    }
}
