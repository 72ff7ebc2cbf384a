//! Wikibase-backed knowledge base.

use anyhow::{Context, Result};
use async_trait::async_trait;
use wikibase_client::{Item, ItemId, WikibaseClient};

use super::BaseKnowledgeBase;

/// Adapts `WikibaseClient` to `BaseKnowledgeBase`, resolving titles through one site's sitelinks.
pub struct WikibaseAdapter {
    client: WikibaseClient,
    site: String,
    lang: String,
}

impl WikibaseAdapter {
    pub fn new(client: WikibaseClient, site: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            client,
            site: site.into(),
            lang: lang.into(),
        }
    }
}

#[async_trait]
impl BaseKnowledgeBase for WikibaseAdapter {
    async fn find_item(&self, title: &str) -> Result<Option<Item>> {
        self.client
            .get_item_by_title(&self.site, title, &self.lang)
            .await
            .with_context(|| format!("Failed to look up item for {}:{}", self.site, title))
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        self.client
            .get_item(id, &self.lang)
            .await
            .with_context(|| format!("Failed to load item {}", id))
    }

    async fn add_claim(&self, subject: &ItemId, property: &str, target: &ItemId) -> Result<String> {
        self.client
            .create_item_claim(subject, property, target)
            .await
            .with_context(|| format!("Failed to add {} claim to {}", property, subject))
    }

    async fn add_source(&self, statement_id: &str, property: &str, target: &ItemId) -> Result<()> {
        self.client
            .add_item_reference(statement_id, property, target)
            .await
            .with_context(|| format!("Failed to add source to {}", statement_id))
    }
}
