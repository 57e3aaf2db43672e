use std::{future::Future, pin::Pin};

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::AppError;

pub type TxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AppError>> + Send + 'a>>;

#[derive(Debug)]
pub struct DatabaseTransaction;

impl DatabaseTransaction {
    /// Run a closure inside `BEGIN IMMEDIATE`, so the write lock is held
    /// before the closure's first read.
    ///
    /// The work happens on a sqlx `Transaction`: if this future is dropped
    /// before it finishes, the rollback is queued on the connection before
    /// it goes back to the pool.
    pub async fn run<T, F>(pool: &SqlitePool, f: F) -> Result<T, AppError>
    where
        F: for<'a> FnOnce(&'a mut SqliteConnection) -> TxFuture<'a, T>,
        T: Send,
    {
        let mut tx = pool.begin_with("BEGIN IMMEDIATE").await?;

        match f(&mut *tx).await {
            Ok(value) => {
                tx.commit().await.map_err(|commit_err| {
                    log::error!("Commit failed: {}", commit_err);
                    AppError::from(commit_err)
                })?;
                Ok(value)
            }
            Err(err) => {
                log::warn!("Transaction failed with error: {}, rolling back", err);
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!(
                        "Rollback failed after error (orig: {}, rollback: {})",
                        err,
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }
}
