//! Vocabulary synchronization: pull the Notion database and upsert it
//! into the local pool keyed on the Notion page id.

use serde::Serialize;
use thiserror::Error;

use crate::services::notion::{NotionClient, NotionError};
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub fetched: usize,
    pub synced: usize,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Notion(#[from] NotionError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub async fn run(store: &Store, notion: &NotionClient) -> Result<SyncReport, SyncError> {
    let entries = notion.fetch_vocabulary().await?;
    let fetched = entries.len();
    tracing::info!(fetched, "Fetched vocabulary entries from Notion");

    if entries.is_empty() {
        return Ok(SyncReport { fetched, synced: 0 });
    }

    let synced = store.upsert_vocabulary(&entries)?;
    tracing::info!(synced, "Vocabulary synchronized");

    Ok(SyncReport { fetched, synced })
}

#[cfg(test)]
mod tests {
    use crate::config::NotionConfig;

    use super::*;

    #[tokio::test]
    async fn sync_with_mock_source_fills_the_pool() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = Store::open(tmp.path().join("sync.sled").to_str().unwrap()).unwrap();
        let notion = NotionClient::new(&NotionConfig {
            api_key: String::new(),
            database_id: String::new(),
            mock: true,
            timeout_secs: 1,
        });

        let report = run(&store, &notion).await.unwrap();
        assert!(report.fetched >= 5);
        assert_eq!(report.fetched, report.synced);
        assert_eq!(store.count_vocabulary().unwrap(), report.synced);

        // a second run updates in place instead of duplicating
        let report = run(&store, &notion).await.unwrap();
        assert_eq!(store.count_vocabulary().unwrap(), report.synced);
    }
}
