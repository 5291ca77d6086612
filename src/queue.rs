//! Request deduplication and admission control.
//!
//! [`RequestQueue`] guarantees two things about in-flight requests:
//!
//! - **Dedup**: at most one live slot exists per canonical signature.
//!   A second caller with the same signature attaches to the existing
//!   slot's pending result instead of starting another exchange, and
//!   observes the same settlement (success or failure).
//! - **Admission ceiling**: at most `admission_limit` slots run their
//!   operation concurrently. Admission beyond the ceiling waits until a
//!   running slot vacates.
//!
//! The queue never retries — retries happen inside the admitted
//! operation. Slots run on a detached task so a caller abandoning its
//! request cannot strand the other callers attached to the same slot.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::telemetry;
use crate::types::{RequestSignature, ResponseBody};

/// Default ceiling on concurrently admitted requests.
pub const DEFAULT_ADMISSION_LIMIT: usize = 5;

type SlotFuture = Shared<BoxFuture<'static, Result<ResponseBody>>>;

/// Deduplicates identical in-flight requests and bounds concurrency.
pub struct RequestQueue {
    slots: Arc<Mutex<HashMap<String, SlotFuture>>>,
    permits: Arc<Semaphore>,
}

impl RequestQueue {
    pub fn new(admission_limit: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            permits: Arc::new(Semaphore::new(admission_limit)),
        }
    }

    /// Number of live slots (admitted or waiting for admission).
    pub fn live_slots(&self) -> usize {
        self.slots.lock().expect("slot table lock poisoned").len()
    }

    /// Run `operation` under this signature's slot, or attach to the slot
    /// that is already running it.
    ///
    /// The slot is removed at settlement regardless of outcome; every
    /// attached caller receives a clone of the settled result.
    pub async fn admit<F>(&self, signature: &RequestSignature, operation: F) -> Result<ResponseBody>
    where
        F: Future<Output = Result<ResponseBody>> + Send + 'static,
    {
        let slot = {
            let mut slots = self.slots.lock().expect("slot table lock poisoned");
            if let Some(existing) = slots.get(signature.as_str()) {
                metrics::counter!(telemetry::DEDUP_JOINS_TOTAL).increment(1);
                debug!(signature = %signature, "attaching to in-flight request");
                existing.clone()
            } else {
                let key = signature.as_str().to_owned();
                let permits = Arc::clone(&self.permits);
                let table = Arc::clone(&self.slots);
                let task_key = key.clone();
                // Detached: the exchange settles even if every caller is
                // dropped, so attached callers and the cache write-back
                // still observe it. The slot table lock is held across
                // spawn + insert, so the task's removal cannot run first.
                let task = tokio::spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .expect("admission semaphore closed");
                    let result = operation.await;
                    table
                        .lock()
                        .expect("slot table lock poisoned")
                        .remove(&task_key);
                    result
                });
                let slot: SlotFuture = async move {
                    match task.await {
                        Ok(result) => result,
                        Err(e) => Err(ApiError::Network(format!("request task failed: {e}"))),
                    }
                }
                .boxed()
                .shared();
                slots.insert(key, slot.clone());
                slot
            }
        };
        slot.await
    }
}
