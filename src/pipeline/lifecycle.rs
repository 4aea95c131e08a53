//! Lazily loaded, lock-guarded process singletons (models, scorers, indices).
//!
//! A `ManagedResource` starts `not_loaded`. The first caller of `get()` marks
//! it `loading` and runs the loader; concurrent callers queue on a separate
//! load lock and then reuse whatever the first caller produced. The slot lock
//! is never held across a load, so `status()` answers immediately. A failed
//! load is sticky: the loader is not retried and callers take their fallback
//! path. Mock resources never load and report `mock` to the health endpoint.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

use crate::models::ResourceStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResourceError {
    #[error("{0} runs in mock mode")]
    Mock(&'static str),

    #[error("{name} failed to load: {reason}")]
    Failed { name: &'static str, reason: String },

    #[error("Internal lock error")]
    LockPoisoned,
}

type Loader<T> = Box<dyn Fn() -> Result<T, String> + Send + Sync>;

enum Slot<T> {
    NotLoaded,
    Loading,
    Loaded(Arc<T>),
    Failed(String),
    Mock,
}

pub struct ManagedResource<T> {
    name: &'static str,
    loader: Option<Loader<T>>,
    slot: Mutex<Slot<T>>,
    /// Held for the duration of a load; the slot lock never is.
    load_lock: Mutex<()>,
}

/// Health snapshot of one managed resource.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    pub name: &'static str,
    pub status: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl<T> ManagedResource<T> {
    /// Resource built on first use by `loader`.
    pub fn lazy<F>(name: &'static str, loader: F) -> Self
    where
        F: Fn() -> Result<T, String> + Send + Sync + 'static,
    {
        Self {
            name,
            loader: Some(Box::new(loader)),
            slot: Mutex::new(Slot::NotLoaded),
            load_lock: Mutex::new(()),
        }
    }

    /// Resource that is never loaded; `get()` always yields `ResourceError::Mock`.
    pub fn mock(name: &'static str) -> Self {
        Self {
            name,
            loader: None,
            slot: Mutex::new(Slot::Mock),
            load_lock: Mutex::new(()),
        }
    }

    /// Resource that is already available.
    pub fn ready(name: &'static str, value: T) -> Self {
        Self {
            name,
            loader: None,
            slot: Mutex::new(Slot::Loaded(Arc::new(value))),
            load_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the loaded value, loading it first if this is the first call.
    pub fn get(&self) -> Result<Arc<T>, ResourceError> {
        if let Some(settled) = self.settled()? {
            return settled;
        }

        let _loading = self.load_lock.lock().map_err(|_| ResourceError::LockPoisoned)?;
        // Another caller may have finished while we queued.
        if let Some(settled) = self.settled()? {
            return settled;
        }

        let Some(loader) = &self.loader else {
            let reason = "no loader configured".to_string();
            self.store(Slot::Failed(reason.clone()))?;
            return Err(ResourceError::Failed {
                name: self.name,
                reason,
            });
        };

        self.store(Slot::Loading)?;
        let start = Instant::now();
        match loader() {
            Ok(value) => {
                let value = Arc::new(value);
                tracing::info!(
                    resource = self.name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Resource loaded"
                );
                self.store(Slot::Loaded(Arc::clone(&value)))?;
                Ok(value)
            }
            Err(reason) => {
                tracing::warn!(resource = self.name, reason = %reason, "Resource failed to load");
                self.store(Slot::Failed(reason.clone()))?;
                Err(ResourceError::Failed {
                    name: self.name,
                    reason,
                })
            }
        }
    }

    /// Outcome of a finished load, or `None` while one is still owed.
    fn settled(&self) -> Result<Option<Result<Arc<T>, ResourceError>>, ResourceError> {
        let slot = self.slot.lock().map_err(|_| ResourceError::LockPoisoned)?;
        Ok(match &*slot {
            Slot::Loaded(value) => Some(Ok(Arc::clone(value))),
            Slot::Mock => Some(Err(ResourceError::Mock(self.name))),
            Slot::Failed(reason) => Some(Err(ResourceError::Failed {
                name: self.name,
                reason: reason.clone(),
            })),
            Slot::NotLoaded | Slot::Loading => None,
        })
    }

    fn store(&self, next: Slot<T>) -> Result<(), ResourceError> {
        *self.slot.lock().map_err(|_| ResourceError::LockPoisoned)? = next;
        Ok(())
    }

    pub fn status(&self) -> ResourceStatus {
        match self.slot.lock() {
            Ok(slot) => match &*slot {
                Slot::NotLoaded => ResourceStatus::NotLoaded,
                Slot::Loading => ResourceStatus::Loading,
                Slot::Loaded(_) => ResourceStatus::Loaded,
                Slot::Failed(_) => ResourceStatus::Failed,
                Slot::Mock => ResourceStatus::Mock,
            },
            Err(_) => ResourceStatus::Failed,
        }
    }

    pub fn report(&self) -> ResourceReport {
        let detail = match self.slot.lock() {
            Ok(slot) => match &*slot {
                Slot::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
            Err(_) => Some("lock poisoned".to_string()),
        };
        ResourceReport {
            name: self.name,
            status: self.status(),
            detail,
        }
    }
}
