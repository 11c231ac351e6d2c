//! In-process collaborators used when no external service is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use common::{Notification, Notifier, Result, StatusStore, TradeSessionStats};

/// Writes notifications to the log instead of pushing them anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, recipients: &[String], notification: &Notification) -> Result<()> {
        info!(
            recipients = recipients.len(),
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// Keeps the latest status snapshot per user in memory.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    snapshots: RwLock<HashMap<String, TradeSessionStats>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, user: &str) -> Option<TradeSessionStats> {
        self.snapshots.read().await.get(user).cloned()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn save_status(&self, user: &str, status: &TradeSessionStats) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(user.to_string(), status.clone());
        Ok(())
    }
}
