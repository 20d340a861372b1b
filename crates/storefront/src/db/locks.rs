//! Per-user mutual exclusion for checkout.
//!
//! Two checkouts of the same user must not interleave. In-process runs use a
//! `moka` cache of async mutexes keyed by user; `PostgreSQL` deployments use a
//! transaction-scoped advisory lock so that several server processes agree.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use eglys_core::UserId;

use super::RepositoryError;

/// First key of every advisory lock taken by the storefront.
const ADVISORY_NAMESPACE: i32 = 0x4547_4c59;

/// How long an unused per-user mutex stays cached.
const LOCAL_IDLE: Duration = Duration::from_secs(600);

/// Exclusive scope over one user's checkout. Dropping it releases the scope.
pub enum UserScope {
    /// Held in-process mutex.
    Local(OwnedMutexGuard<()>),
    /// Open transaction holding `pg_advisory_xact_lock`.
    Postgres(Transaction<'static, Postgres>),
}

impl UserScope {
    /// Release the scope.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lock transaction fails to commit. The
    /// lock is released by the server either way.
    pub async fn release(self) -> Result<(), RepositoryError> {
        match self {
            Self::Local(guard) => {
                drop(guard);
                Ok(())
            }
            Self::Postgres(tx) => Ok(tx.commit().await?),
        }
    }
}

impl std::fmt::Debug for UserScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(_) => f.write_str("UserScope::Local"),
            Self::Postgres(_) => f.write_str("UserScope::Postgres"),
        }
    }
}

/// Provider of per-user exclusive scopes.
#[async_trait]
pub trait UserLocks: Send + Sync {
    /// Wait until no other scope of `user` is held, then take it.
    async fn acquire(&self, user: UserId) -> Result<UserScope, RepositoryError>;
}

/// In-process user locks.
#[derive(Clone)]
pub struct LocalUserLocks {
    locks: Cache<UserId, Arc<Mutex<()>>>,
}

impl LocalUserLocks {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: Cache::builder().time_to_idle(LOCAL_IDLE).build(),
        }
    }
}

impl Default for LocalUserLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserLocks for LocalUserLocks {
    async fn acquire(&self, user: UserId) -> Result<UserScope, RepositoryError> {
        let lock = self
            .locks
            .get_with(user, async { Arc::new(Mutex::new(())) })
            .await;
        Ok(UserScope::Local(lock.lock_owned().await))
    }
}

/// Advisory-lock based user locks shared by every process on the database.
#[derive(Clone)]
pub struct PgUserLocks {
    pool: PgPool,
}

impl PgUserLocks {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserLocks for PgUserLocks {
    async fn acquire(&self, user: UserId) -> Result<UserScope, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind(ADVISORY_NAMESPACE)
            .bind(user)
            .execute(&mut *tx)
            .await?;
        Ok(UserScope::Postgres(tx))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn test_same_user_is_exclusive() {
        let locks = LocalUserLocks::new();
        let scope = locks.acquire(UserId::new(1)).await.unwrap();

        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(UserId::new(1)),
        )
        .await;
        assert!(pending.is_err(), "second scope must wait");

        scope.release().await.unwrap();
        let again = tokio::time::timeout(
            Duration::from_millis(500),
            locks.acquire(UserId::new(1)),
        )
        .await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_different_users_do_not_block() {
        let locks = LocalUserLocks::new();
        let _first = locks.acquire(UserId::new(1)).await.unwrap();
        let second =
            tokio::time::timeout(Duration::from_millis(500), locks.acquire(UserId::new(2))).await;
        assert!(second.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_scopes_serialize_critical_sections() {
        let locks = Arc::new(LocalUserLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let scope = locks.acquire(UserId::new(7)).await.unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                    scope.release().await.unwrap();
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
