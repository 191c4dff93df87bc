//! Common test utilities for integration tests.
#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use shachi::{
    connect::{ConnectTolerance, Sleeper},
    model::{FamilyModel, QualModel, TableModel, VersioningModel},
    store::mem::MemStore,
    Client, Context, ContextBuilder,
};

/// Sleeper that returns immediately.
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _delay: Duration) {}
}

/// `profile` family covering every versioning model.
pub fn profile_family() -> FamilyModel {
    FamilyModel::with("profile")
        .qual(
            QualModel::with("email")
                .versioning(VersioningModel::QualifierLatest)
                .build(),
        )
        .qual(
            QualModel::with("history")
                .versioning(VersioningModel::QualifierSequential)
                .build(),
        )
        .qual(
            QualModel::with("login")
                .versioning(VersioningModel::TimestampChrono)
                .build(),
        )
        .qual(
            QualModel::with("status")
                .versioning(VersioningModel::TimestampLatest)
                .build(),
        )
        .qual(QualModel::of("nick"))
        .build()
        .expect("profile family should build")
}

pub fn users_table() -> TableModel {
    TableModel::with("users")
        .family(profile_family())
        .build()
        .expect("users table should build")
}

pub fn salted_users_table() -> TableModel {
    TableModel::with("salted_users")
        .family(profile_family())
        .salt_rows()
        .build()
        .expect("salted users table should build")
}

/// Context builder over `store` that never sleeps between attempts.
pub fn context(store: &Arc<MemStore>) -> ContextBuilder {
    Context::builder(store.clone())
        .sleeper(Arc::new(NoSleep))
        .tolerance(ConnectTolerance::default().attempts_max(2))
}

pub fn setup() -> (Arc<MemStore>, Client) {
    let store = Arc::new(MemStore::new());
    let client = Client::new(context(&store).build());
    (store, client)
}
