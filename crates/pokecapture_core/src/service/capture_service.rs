//! Capture lookup and toggle use-cases.
//!
//! # Responsibility
//! - Answer "is this entity captured by this user" from the capture store.
//! - Flip capture state and re-read the store to report the outcome.
//!
//! # Invariants
//! - Toggle never reports the optimistic target state; the returned flag is
//!   always the result of a lookup issued after the write.
//! - Toggle without a user leaves the store untouched.
//! - Each handled failure publishes exactly one notice.

use crate::error::{CoreError, CoreResult};
use crate::model::capture::{CaptureRecord, CaptureState, UserId};
use crate::notice::NoticeSink;
use crate::repo::capture_repo::CaptureStore;
use log::{error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Lookup/toggle service over an injected capture store.
#[derive(Clone)]
pub struct CaptureService {
    store: Arc<dyn CaptureStore>,
    notices: NoticeSink,
}

impl CaptureService {
    pub fn new(store: Arc<dyn CaptureStore>, notices: NoticeSink) -> Self {
        Self { store, notices }
    }

    /// Returns `true` iff at least one record matches `user_id` and `entity_name`.
    ///
    /// # Errors
    /// - `Lookup` when the store query fails; a notice is published.
    pub async fn lookup(&self, user_id: &UserId, entity_name: &str) -> CoreResult<bool> {
        match self.store.find_matching(user_id, entity_name).await {
            Ok(records) => Ok(!records.is_empty()),
            Err(err) => {
                warn!(
                    "event=capture_lookup module=service status=error entity={entity_name} error={err}"
                );
                Err(self.fail(CoreError::Lookup(format!("{entity_name}: {err}"))))
            }
        }
    }

    /// Batched lookup: returns the captured subset of `entity_names`.
    ///
    /// # Errors
    /// - `Lookup` when the store query fails; one notice covers the batch.
    pub async fn lookup_many(
        &self,
        user_id: &UserId,
        entity_names: &[String],
    ) -> CoreResult<HashSet<String>> {
        match self.store.find_captured_names(user_id, entity_names).await {
            Ok(captured) => Ok(captured),
            Err(err) => {
                warn!(
                    "event=capture_lookup_batch module=service status=error names={} error={err}",
                    entity_names.len()
                );
                Err(self.fail(CoreError::Lookup(err.to_string())))
            }
        }
    }

    /// Captures (`currently_captured == false`) or releases the entity for
    /// `user_id`, then re-reads the store.
    ///
    /// Returns the re-read captured flag.
    ///
    /// # Errors
    /// - `AuthRequired` when `user_id` is `None`.
    /// - `Toggle` when the insert or delete fails.
    /// - `Lookup` when the re-read fails after a successful write.
    pub async fn toggle(
        &self,
        user_id: Option<&UserId>,
        entity_name: &str,
        currently_captured: bool,
    ) -> CoreResult<bool> {
        let Some(user_id) = user_id else {
            info!("event=capture_toggle module=service status=rejected reason=auth_required");
            return Err(self.fail(CoreError::AuthRequired));
        };

        let started_at = Instant::now();
        let target = CaptureState::from_captured(currently_captured).toggled();
        let write = match target {
            CaptureState::Captured => self
                .store
                .insert(&CaptureRecord::new(user_id.clone(), entity_name))
                .await
                .map(|_| 1),
            CaptureState::Released => self.store.delete_matching(user_id, entity_name).await,
        };

        let affected = match write {
            Ok(affected) => affected,
            Err(err) => {
                error!(
                    "event=capture_toggle module=service status=error entity={entity_name} target={target:?} error={err}"
                );
                return Err(self.fail(CoreError::Toggle(format!("{entity_name}: {err}"))));
            }
        };

        let captured = self.lookup(user_id, entity_name).await?;
        info!(
            "event=capture_toggle module=service status=ok entity={entity_name} target={target:?} affected={affected} captured={captured} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(captured)
    }

    fn fail(&self, err: CoreError) -> CoreError {
        self.notices.publish_error(&err);
        err
    }
}
