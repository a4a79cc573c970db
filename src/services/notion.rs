//! Notion database client for the vocabulary source. Pages carry the
//! English term in the `English` title property and the Japanese term
//! in the `日本語` rich-text property.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::NotionConfig;
use crate::store::operations::vocabulary::VocabularyUpsert;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

const ENGLISH_PROPERTY: &str = "English";
const JAPANESE_PROPERTY: &str = "日本語";

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
    #[error("notion network error: {0}")]
    Network(String),
    #[error("notion api error: status={status}, message={message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
struct QueryRequest {
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    results: Vec<NotionPage>,
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotionPage {
    id: String,
    #[serde(default)]
    properties: HashMap<String, NotionProperty>,
}

#[derive(Debug, Deserialize)]
struct NotionProperty {
    #[serde(default)]
    title: Option<Vec<NotionRichText>>,
    #[serde(default)]
    rich_text: Option<Vec<NotionRichText>>,
}

#[derive(Debug, Deserialize)]
struct NotionRichText {
    plain_text: String,
}

fn join_plain_text(fragments: Option<&Vec<NotionRichText>>) -> String {
    fragments
        .map(|list| {
            list.iter()
                .map(|t| t.plain_text.as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl NotionPage {
    fn into_upsert(self) -> Option<VocabularyUpsert> {
        let english = join_plain_text(
            self.properties
                .get(ENGLISH_PROPERTY)
                .and_then(|p| p.title.as_ref()),
        );
        let japanese = join_plain_text(
            self.properties
                .get(JAPANESE_PROPERTY)
                .and_then(|p| p.rich_text.as_ref()),
        );

        if english.is_empty() || japanese.is_empty() {
            return None;
        }

        Some(VocabularyUpsert {
            notion_page_id: self.id,
            english,
            japanese,
        })
    }
}

#[derive(Debug)]
pub struct NotionClient {
    config: NotionConfig,
    client: reqwest::Client,
}

impl NotionClient {
    pub fn new(config: &NotionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config: config.clone(),
            client,
        }
    }

    /// Pull every vocabulary page, following the query cursor until the
    /// database is exhausted.
    pub async fn fetch_vocabulary(&self) -> Result<Vec<VocabularyUpsert>, NotionError> {
        if self.config.mock {
            return Ok(mock_vocabulary());
        }

        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.query_page(cursor.take()).await?;
            entries.extend(page.results.into_iter().filter_map(NotionPage::into_upsert));

            if !page.has_more {
                break;
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(entries)
    }

    async fn query_page(&self, start_cursor: Option<String>) -> Result<QueryResponse, NotionError> {
        let url = format!(
            "{NOTION_API_BASE}/databases/{}/query",
            self.config.database_id
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&QueryRequest {
                page_size: PAGE_SIZE,
                start_cursor,
            })
            .send()
            .await
            .map_err(|e| NotionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| NotionError::Network(e.to_string()))
    }
}

/// Fixture pool for mock mode so dev environments and tests can run the
/// full dispatch flow without Notion credentials.
fn mock_vocabulary() -> Vec<VocabularyUpsert> {
    [
        ("mock-1", "dog", "犬"),
        ("mock-2", "cat", "猫"),
        ("mock-3", "water", "水"),
        ("mock-4", "mountain", "山"),
        ("mock-5", "library", "図書館"),
        ("mock-6", "breakfast", "朝ごはん"),
    ]
    .into_iter()
    .map(|(page, english, japanese)| VocabularyUpsert {
        notion_page_id: page.to_string(),
        english: english.to_string(),
        japanese: japanese.to_string(),
    })
    .collect()
}
