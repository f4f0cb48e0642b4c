mod ids;
pub mod queries;
pub mod tables;

use crate::{Error, Result};
use anyhow::anyhow;
use chrono::{Datelike, Utc};
use sea_orm::{
    entity::prelude::*,
    sea_query::{Expr, Func},
    ActiveValue, Condition, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr,
    IntoActiveModel, IsolationLevel, QueryOrder, RuntimeErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use sqlx::{
    migrate::{Migrate as _, Migration, MigrationSource},
    Connection as _,
};
use std::{
    collections::HashMap, future::Future, ops::Deref, path::Path, sync::Arc, time::Duration,
};

pub use ids::*;
pub use queries::{
    purchases::{
        PurchaseHistoryEntry, PurchaseSubscription, PurchaseVehicle, RecordPurchaseParams,
    },
    snapshots::UserSnapshot,
    subscriptions::{CreateSubscriptionParams, SubscriptionWithVehicle},
    users::{CreateUserParams, UpdateUserParams},
    vehicles::{CreateVehicleParams, UpdateVehicleParams},
};
pub use sea_orm::ConnectOptions;
pub use tables::*;

/// Number of times to retry a transaction that failed to serialize against
/// a concurrent one before giving up.
const MAX_TRANSACTION_RETRIES: u32 = 10;

/// Handle to the portal's relational store. All engine operations are
/// methods on this type, implemented in the [`queries`] submodules; each
/// runs as one request-scoped transaction.
pub struct Database {
    options: ConnectOptions,
    pool: DatabaseConnection,
}

impl Database {
    /// Connects to the database at the given options.
    pub async fn new(options: ConnectOptions) -> Result<Self> {
        Ok(Self {
            options: options.clone(),
            pool: sea_orm::Database::connect(options).await?,
        })
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Applies the migrations in the given directory, skipping any that
    /// have already been applied.
    pub async fn migrate(
        &self,
        migrations_path: &Path,
        ignore_checksum_mismatch: bool,
    ) -> anyhow::Result<Vec<(Migration, Duration)>> {
        let migrations = MigrationSource::resolve(migrations_path)
            .await
            .map_err(|err| anyhow!("failed to load migrations: {err:?}"))?;

        sqlx::any::install_default_drivers();
        let mut connection = sqlx::AnyConnection::connect(self.options.get_url()).await?;

        connection.ensure_migrations_table().await?;
        let migrated_migrations = connection.list_applied_migrations().await?;

        let mut new_migrations = Vec::new();
        for migration in migrations {
            match migrated_migrations
                .iter()
                .find(|m| m.version == migration.version)
            {
                Some(applied_migration) => {
                    if migration.checksum != applied_migration.checksum && !ignore_checksum_mismatch
                    {
                        Err(anyhow!(
                            "checksum mismatch for applied migration {}",
                            migration.description
                        ))?;
                    }
                }
                None => {
                    let elapsed = connection.apply(&migration).await?;
                    new_migrations.push((migration, elapsed));
                }
            }
        }

        Ok(new_migrations)
    }

    async fn transaction<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Send + Fn(TransactionHandle) -> Fut,
        Fut: Send + Future<Output = Result<T>>,
    {
        let mut i = 0;
        loop {
            let (tx, result) = self.with_transaction(&f).await?;
            match result {
                Ok(result) => match tx.commit().await.map_err(Into::into) {
                    Ok(()) => return Ok(result),
                    Err(error) => {
                        if !retry_on_serialization_error(&error, i) {
                            return Err(error);
                        }
                    }
                },
                Err(error) => {
                    tx.rollback().await?;
                    if !retry_on_serialization_error(&error, i) {
                        return Err(error);
                    }
                }
            }
            i += 1;
        }
    }

    async fn with_transaction<F, Fut, T>(&self, f: &F) -> Result<(DatabaseTransaction, Result<T>)>
    where
        F: Send + Fn(TransactionHandle) -> Fut,
        Fut: Send + Future<Output = Result<T>>,
    {
        let tx = if self.pool.get_database_backend() == DatabaseBackend::Postgres {
            self.pool
                .begin_with_config(Some(IsolationLevel::Serializable), None)
                .await?
        } else {
            self.pool.begin().await?
        };

        let mut tx = Arc::new(Some(tx));
        let result = f(TransactionHandle(tx.clone())).await;
        let Some(tx) = Arc::get_mut(&mut tx).and_then(|tx| tx.take()) else {
            return Err(Error::Internal(anyhow!(
                "couldn't complete transaction because it's still in use"
            )));
        };

        Ok((tx, result))
    }
}

pub struct TransactionHandle(Arc<Option<DatabaseTransaction>>);

impl Deref for TransactionHandle {
    type Target = DatabaseTransaction;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref().as_ref().unwrap()
    }
}

fn retry_on_serialization_error(error: &Error, prev_attempt_count: u32) -> bool {
    prev_attempt_count < MAX_TRANSACTION_RETRIES && is_serialization_error(error)
}

fn is_serialization_error(error: &Error) -> bool {
    const SERIALIZATION_FAILURE_CODE: &str = "40001";
    matches!(
        error,
        Error::Database(
            DbErr::Exec(RuntimeErr::SqlxError(error)) | DbErr::Query(RuntimeErr::SqlxError(error)),
        ) if error
            .as_database_error()
            .and_then(|error| error.code())
            .as_deref()
            == Some(SERIALIZATION_FAILURE_CODE)
    )
}

/// Parses a `YYYY-MM-DD` calendar date supplied by a caller.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<Date> {
    Date::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        Error::Validation(format!("invalid {field} {value:?}, expected YYYY-MM-DD"))
    })
}
