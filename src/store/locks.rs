//! Per-product mutual exclusion for assignment passes.
//!
//! One lock per `ProductId`, system-wide within the process: two concurrent
//! status-change events for the same product serialize, so the second pass
//! reads the first pass's committed rows. Locks for different products never
//! contend.

use crate::domain::ProductId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock acquisition failed within the caller's bounded wait.
///
/// Transient: retry with backoff. Never proceed without the lock.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("timed out acquiring lock for product {product_id} after {waited_ms}ms")]
pub struct LockTimeout {
    pub product_id: ProductId,
    pub waited_ms: u64,
}

/// How long an acquirer is willing to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Block until the lock is free.
    Wait,
    /// Fail fast with `LockTimeout` after the given bound.
    Timeout(Duration),
}

/// Guard over one product's ledger entries. Mutations are legal only while
/// a guard is held; dropping it releases the lock.
#[derive(Debug)]
pub struct ProductGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Registry of per-product async locks.
#[derive(Debug, Default)]
pub struct ProductLocks {
    inner: Mutex<HashMap<ProductId, Arc<AsyncMutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a product, waiting per `mode`.
    pub async fn acquire(
        &self,
        product_id: &ProductId,
        mode: LockMode,
    ) -> Result<ProductGuard, LockTimeout> {
        let handle = self.handle(product_id);
        let guard = match mode {
            LockMode::Wait => handle.lock_owned().await,
            LockMode::Timeout(bound) => tokio::time::timeout(bound, handle.lock_owned())
                .await
                .map_err(|_| LockTimeout {
                    product_id: product_id.clone(),
                    waited_ms: bound.as_millis() as u64,
                })?,
        };
        Ok(ProductGuard { _guard: guard })
    }

    /// Run `f` while holding the product's lock.
    pub async fn with_lock<T, F, Fut>(
        &self,
        product_id: &ProductId,
        mode: LockMode,
        f: F,
    ) -> Result<T, LockTimeout>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let _guard = self.acquire(product_id, mode).await?;
        Ok(f().await)
    }

    fn handle(&self, product_id: &ProductId) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().expect("lock registry poisoned");
        map.entry(product_id.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}
