use chrono::{Duration as ChronoDuration, Utc};
use reelvault_db::UploadRecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

const REAP_BATCH_SIZE: i64 = 500;

/// Clears write handles that expired without being used.
///
/// Only the handle is dropped; the record stays PENDING until the retention
/// sweep expires it.
#[derive(Clone)]
pub struct UploadHandleReaper {
    store: Arc<dyn UploadRecordStore>,
    handle_ttl: ChronoDuration,
    period: Duration,
}

impl UploadHandleReaper {
    pub fn new(store: Arc<dyn UploadRecordStore>, handle_ttl_secs: u64, period_secs: u64) -> Self {
        Self {
            store,
            handle_ttl: ChronoDuration::seconds(handle_ttl_secs as i64),
            period: Duration::from_secs(period_secs),
        }
    }

    /// Start the background task. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reap_interval = interval(self.period);

            loop {
                reap_interval.tick().await;

                match self.reap_once().await {
                    Ok(0) => tracing::debug!("No expired upload handles"),
                    Ok(cleared) => tracing::info!(cleared, "Expired upload handles cleared"),
                    Err(e) => tracing::error!(error = %e, "Upload handle reaper run failed"),
                }
            }
        })
    }

    /// One pass: clear every handle issued more than the handle TTL ago.
    #[tracing::instrument(skip(self))]
    pub async fn reap_once(&self) -> Result<usize, anyhow::Error> {
        let cutoff = Utc::now() - self.handle_ttl;
        let stale = self
            .store
            .list_stale_handles(cutoff, REAP_BATCH_SIZE)
            .await?;

        let mut cleared = 0;
        for record in stale {
            match self.store.clear_upload_handle(record.file_id).await {
                Ok(true) => cleared += 1,
                Ok(false) => {
                    tracing::debug!(file_id = %record.file_id, "Upload record moved on before its handle was cleared")
                }
                Err(e) => {
                    tracing::warn!(error = %e, file_id = %record.file_id, "Failed to clear upload handle")
                }
            }
        }
        Ok(cleared)
    }
}
