use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::keys;
use crate::store::{Store, StoreError};

/// One vocabulary entry, mirrored from the Notion source database.
/// Immutable between syncs; the sync job owns every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    pub id: String,
    pub notion_page_id: String,
    pub english: String,
    pub japanese: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

/// What one sync round carries per entry; identity is the Notion page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyUpsert {
    pub notion_page_id: String,
    pub english: String,
    pub japanese: String,
}

impl Store {
    /// Insert-or-update keyed on `notion_page_id`. Existing entries keep
    /// their id and created_at so stats and past sessions stay linked.
    pub fn upsert_vocabulary(&self, entries: &[VocabularyUpsert]) -> Result<usize, StoreError> {
        let now = Utc::now();
        let mut synced = 0usize;

        for entry in entries {
            if entry.english.is_empty() || entry.japanese.is_empty() {
                tracing::warn!(
                    notion_page_id = %entry.notion_page_id,
                    "Skipping vocabulary entry with empty term"
                );
                continue;
            }

            let index_key = keys::vocabulary_notion_index_key(&entry.notion_page_id);
            let existing_id = self
                .vocabulary_by_notion_page
                .get(index_key.as_bytes())?
                .map(|raw| String::from_utf8_lossy(&raw).to_string());

            let item = match existing_id {
                Some(id) => {
                    let mut item: VocabularyItem = match self
                        .vocabulary
                        .get(keys::vocabulary_key(&id).as_bytes())?
                    {
                        Some(raw) => Self::deserialize(&raw)?,
                        None => {
                            return Err(StoreError::NotFound {
                                entity: "vocabulary".to_string(),
                                key: id,
                            })
                        }
                    };
                    item.english = entry.english.clone();
                    item.japanese = entry.japanese.clone();
                    item.updated_at = now;
                    item.last_synced_at = now;
                    item
                }
                None => VocabularyItem {
                    id: Uuid::new_v4().to_string(),
                    notion_page_id: entry.notion_page_id.clone(),
                    english: entry.english.clone(),
                    japanese: entry.japanese.clone(),
                    created_at: now,
                    updated_at: now,
                    last_synced_at: now,
                },
            };

            self.vocabulary.insert(
                keys::vocabulary_key(&item.id).as_bytes(),
                Self::serialize(&item)?,
            )?;
            self.vocabulary_by_notion_page
                .insert(index_key.as_bytes(), item.id.as_bytes())?;
            synced += 1;
        }

        Ok(synced)
    }

    pub fn list_vocabulary(&self) -> Result<Vec<VocabularyItem>, StoreError> {
        let mut items = Vec::new();
        for entry in self.vocabulary.iter() {
            let (_, raw) = entry?;
            items.push(Self::deserialize(&raw)?);
        }
        Ok(items)
    }

    pub fn count_vocabulary(&self) -> Result<usize, StoreError> {
        Ok(self.vocabulary.len())
    }
}
