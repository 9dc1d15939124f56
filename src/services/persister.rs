use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{PendingSummary, SavedSummaryRecord};

use super::RemoteMirror;

const MAX_ID_ATTEMPTS: usize = 5;

/// Durable store of saved summaries with an optional best-effort mirror.
pub struct SummaryPersister {
    repository: Repository,
    mirror: Option<Arc<RemoteMirror>>,
    mirror_tasks: Mutex<JoinSet<()>>,
}

impl SummaryPersister {
    pub fn new(repository: Repository, mirror: Option<RemoteMirror>) -> Self {
        Self {
            repository,
            mirror: mirror.map(Arc::new),
            mirror_tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Append `pending` as a new record. The mirror copy happens in the
    /// background and never affects the result.
    pub async fn save(&self, pending: &PendingSummary) -> Result<SavedSummaryRecord> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let created_at = Utc::now().timestamp_millis();
            let record = SavedSummaryRecord {
                id: new_record_id(created_at),
                video_url: pending.video_url.clone(),
                title: pending.title.clone(),
                thumbnail_url: pending.thumbnail_url.clone(),
                summary: pending.summary.clone(),
                provenance: pending.provenance,
                mode: pending.mode,
                created_at,
            };

            if self.repository.insert_summary(record.clone()).await? {
                tracing::info!("Saved summary {} for {}", record.id, record.video_url);
                self.spawn_mirror(record.clone());
                return Ok(record);
            }
            tracing::debug!("Summary id {} already taken, retrying", record.id);
        }

        Err(AppError::Other(anyhow::anyhow!(
            "could not allocate a unique summary id"
        )))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repository.delete_summary(id).await? {
            tracing::debug!("No saved summary with id {}", id);
        }
        Ok(())
    }

    /// Most recent first.
    pub async fn list(&self) -> Result<Vec<SavedSummaryRecord>> {
        self.repository.list_summaries().await
    }

    /// Wait for mirror copies still in flight.
    pub async fn finish_mirrors(&self) {
        let mut tasks = match self.mirror_tasks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return,
        };
        while tasks.join_next().await.is_some() {}
    }

    fn spawn_mirror(&self, record: SavedSummaryRecord) {
        let Some(mirror) = self.mirror.clone() else {
            return;
        };
        let Ok(mut tasks) = self.mirror_tasks.lock() else {
            tracing::error!("Mirror task list poisoned, skipping mirror of {}", record.id);
            return;
        };
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            match mirror.push(&record).await {
                Ok(()) => tracing::debug!("Mirrored summary {} to {}", record.id, mirror.endpoint_url()),
                Err(e) => tracing::error!("Failed to mirror summary {}: {}", record.id, e),
            }
        });
    }
}

/// `<created_at ms>-<6 hex chars>`.
fn new_record_id(created_at: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", created_at, &suffix[..6])
}
