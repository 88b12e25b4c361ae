//! Debounced saves and tree refreshes.

use std::collections::BTreeMap;
use tokio::time::Instant;

use planmark_core::{AppEvent, Error, PersistenceEvent, Result, StatusLevel};

use crate::geometry::NormalizedRect;
use crate::lockout::HoldReason;

use super::AnnotatorSession;

impl AnnotatorSession {
    /// Waits for the debounce timer and runs the queued save.
    ///
    /// Returns immediately when no timer is armed, e.g. while a gesture
    /// has paused it.
    pub async fn run_pending_save(&mut self) -> Result<usize> {
        let Some(deadline) = self.debouncer.deadline() else {
            return Ok(0);
        };
        tokio::time::sleep_until(deadline).await;
        self.flush_due_saves().await
    }

    /// Runs the queued save if its timer has fired.
    pub async fn flush_due_saves(&mut self) -> Result<usize> {
        match self.debouncer.take_due(Instant::now()) {
            Some(batch) => self.flush_batch(batch).await,
            None => Ok(0),
        }
    }

    /// Retries patches that failed earlier.
    pub async fn retry_failed_saves(&mut self) -> Result<usize> {
        if self.failed_saves.is_empty() {
            return Ok(0);
        }
        let batch = std::mem::take(&mut self.failed_saves);
        self.lockout.acquire(HoldReason::PendingSave);
        self.flush_batch(batch).await
    }

    pub fn has_failed_saves(&self) -> bool {
        !self.failed_saves.is_empty()
    }

    /// Patches each annotation in `batch` with its latest geometry.
    ///
    /// The lockout stays held until every patch has resolved. Failed patches
    /// are kept for [`retry_failed_saves`](Self::retry_failed_saves); local
    /// geometry is never rolled back.
    async fn flush_batch(&mut self, batch: BTreeMap<u64, NormalizedRect>) -> Result<usize> {
        if batch.is_empty() {
            self.lockout.release(HoldReason::PendingSave);
            return Ok(0);
        }

        self.lockout.begin_release();
        let count = batch.len();
        self.publish(AppEvent::Persistence(PersistenceEvent::SaveStarted { count }));

        let mut saved = 0;
        let mut first_error = None;
        for (id, geometry) in batch {
            match self.annotations_api.patch_annotation(id, geometry).await {
                Ok(()) => saved += 1,
                Err(err) => {
                    tracing::error!("Saving annotation {} failed: {}", id, err);
                    self.failed_saves.insert(id, geometry);
                    first_error.get_or_insert(err);
                }
            }
        }
        self.lockout.finish_release();
        // A later gesture's batch is still queued.
        if self.debouncer.is_pending() {
            self.lockout.acquire(HoldReason::PendingSave);
        }

        let result = match first_error {
            Some(err) => {
                let failed = self.failed_saves.len();
                let err = Error::from(err);
                self.publish(AppEvent::Persistence(PersistenceEvent::SaveFailed {
                    operation: "Save geometry".to_string(),
                    message: err.to_string(),
                }));
                self.status(
                    StatusLevel::Error,
                    format!("Failed to save {} annotation(s): {}. Retry available.", failed, err),
                );
                Err(err)
            }
            None => {
                tracing::info!("Saved geometry for {} annotations", saved);
                self.publish(AppEvent::Persistence(PersistenceEvent::SaveSucceeded {
                    count: saved,
                }));
                Ok(saved)
            }
        };

        if self.refresh_deferred && !self.lockout.is_held() {
            if let Err(err) = self.load_tree().await {
                tracing::warn!("Deferred tree refresh failed: {}", err);
            }
        }
        result
    }

    /// Drives timers: flushes a due save and runs a deferred refresh once
    /// the lockout is clear.
    pub async fn tick(&mut self) -> Result<()> {
        self.flush_due_saves().await?;
        if self.refresh_deferred && !self.lockout.is_held() {
            self.refresh_tree().await?;
        }
        Ok(())
    }

    /// Reloads the project tree.
    ///
    /// While only a pending save holds the lockout, polls until it clears.
    /// While a gesture holds it, the refresh is deferred until the next
    /// [`tick`](Self::tick) after release. Returns whether the tree was
    /// reloaded.
    pub async fn refresh_tree(&mut self) -> Result<bool> {
        while self.lockout.is_held() {
            let only_pending = self.lockout.reasons() == [HoldReason::PendingSave];
            if !only_pending || !self.debouncer.is_armed() {
                if !self.refresh_deferred {
                    tracing::warn!("Tree refresh deferred: lockout held");
                }
                self.refresh_deferred = true;
                return Ok(false);
            }
            tokio::time::sleep(self.config.interaction.refresh_poll).await;
            if let Some(batch) = self.debouncer.take_due(Instant::now()) {
                // failures are already reported
                let _ = self.flush_batch(batch).await;
            }
        }

        self.load_tree().await?;
        Ok(true)
    }

    async fn load_tree(&mut self) -> Result<()> {
        self.refresh_deferred = false;
        let nodes = match self.entities_api.load_tree(self.config.project_id).await {
            Ok(nodes) => nodes,
            Err(err) => {
                let err = Error::from(err);
                self.report_failure("Load tree", &err);
                return Err(err);
            }
        };
        self.tree.replace(nodes);
        tracing::debug!("Project tree refreshed");
        Ok(())
    }
}
