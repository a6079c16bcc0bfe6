//! Screen-lifetime cancellation for in-flight requests.
//!
//! # Responsibility
//! - Tie async work started by one screen to that screen's lifetime.
//! - Stop result delivery once the screen is gone.
//!
//! # Invariants
//! - After `close()`, every `run()` resolves to `CoreError::Cancelled`,
//!   including calls whose remote request already completed.
//! - Cancellation is local only; remote writes already sent are not undone.

use crate::error::{CoreError, CoreResult};
use futures::future::{AbortHandle, Abortable};
use log::debug;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

#[derive(Default)]
struct ScopeState {
    closed: bool,
    next_id: u64,
    in_flight: HashMap<u64, AbortHandle>,
}

/// Cancellation scope owned by one screen.
#[derive(Default)]
pub struct ScreenScope {
    state: Mutex<ScopeState>,
}

impl ScreenScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `fut` unless the scope closes first.
    ///
    /// # Errors
    /// - `Cancelled` when the scope is closed before, during or right after `fut`.
    /// - Errors from `fut` unchanged.
    pub async fn run<T, F>(&self, fut: F) -> CoreResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        let (handle, registration) = AbortHandle::new_pair();
        let task_id = {
            let Ok(mut state) = self.state.lock() else {
                return Err(CoreError::Cancelled);
            };
            if state.closed {
                return Err(CoreError::Cancelled);
            }
            let task_id = state.next_id;
            state.next_id += 1;
            state.in_flight.insert(task_id, handle);
            task_id
        };

        let outcome = Abortable::new(fut, registration).await;

        let closed = match self.state.lock() {
            Ok(mut state) => {
                state.in_flight.remove(&task_id);
                state.closed
            }
            Err(_) => true,
        };

        match outcome {
            Ok(_) if closed => {
                debug!("event=scope_result module=scope status=dropped reason=closed");
                Err(CoreError::Cancelled)
            }
            Ok(result) => result,
            Err(_aborted) => Err(CoreError::Cancelled),
        }
    }

    /// Closes the scope and aborts every in-flight task. Idempotent.
    pub fn close(&self) {
        let handles = match self.state.lock() {
            Ok(mut state) => {
                state.closed = true;
                state.in_flight.drain().map(|(_, handle)| handle).collect::<Vec<_>>()
            }
            Err(_) => return,
        };
        if !handles.is_empty() {
            debug!(
                "event=scope_close module=scope status=ok aborted={}",
                handles.len()
            );
        }
        for handle in handles {
            handle.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().map_or(true, |state| state.closed)
    }

    /// Number of tasks currently awaiting completion.
    pub fn in_flight(&self) -> usize {
        self.state.lock().map_or(0, |state| state.in_flight.len())
    }
}

impl Drop for ScreenScope {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::ScreenScope;
    use crate::error::CoreError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn run_passes_results_through_while_open() {
        let scope = ScreenScope::new();
        let value = scope.run(async { Ok::<_, CoreError>(7) }).await.unwrap();
        assert_eq!(value, 7);

        let err = scope
            .run(async { Err::<(), _>(CoreError::Lookup("boom".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Lookup(_)));
        assert_eq!(scope.in_flight(), 0);
    }

    #[tokio::test]
    async fn run_after_close_is_cancelled_without_polling() {
        let scope = ScreenScope::new();
        scope.close();
        scope.close();
        assert!(scope.is_closed());

        let polled = AtomicBool::new(false);
        let err = scope
            .run(async {
                polled.store(true, Ordering::SeqCst);
                Ok::<_, CoreError>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Cancelled);
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn close_aborts_in_flight_task() {
        let scope = Arc::new(ScreenScope::new());
        let task_scope = Arc::clone(&scope);
        let task = tokio::spawn(async move {
            task_scope
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok::<_, CoreError>(())
                })
                .await
        });

        while scope.in_flight() == 0 {
            tokio::task::yield_now().await;
        }
        scope.close();

        let outcome = task.await.unwrap();
        assert_eq!(outcome.unwrap_err(), CoreError::Cancelled);
    }
}
