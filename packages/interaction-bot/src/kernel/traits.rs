// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no import rules.
// The import decision logic lives in domains/interactions and uses these traits.
//
// Naming convention: Base* for trait names (e.g., BaseKnowledgeBase, BaseFileFetcher)

use anyhow::Result;
use async_trait::async_trait;
use wikibase_client::{Item, ItemId};

// =============================================================================
// Knowledge Base Trait (Infrastructure - item reads and claim writes)
// =============================================================================

#[async_trait]
pub trait BaseKnowledgeBase: Send + Sync {
    /// Resolve the item behind a page title; None if no item exists
    async fn find_item(&self, title: &str) -> Result<Option<Item>>;

    /// Load an item by id; None if it does not exist
    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>>;

    /// Add an item-valued claim to `subject`, returning the new statement id
    async fn add_claim(&self, subject: &ItemId, property: &str, target: &ItemId) -> Result<String>;

    /// Attach a single-snak source to an existing statement
    async fn add_source(&self, statement_id: &str, property: &str, target: &ItemId) -> Result<()>;
}

// =============================================================================
// File Fetcher Trait (Infrastructure - input download)
// =============================================================================

#[async_trait]
pub trait BaseFileFetcher: Send + Sync {
    /// Fetch the full text behind a URL or local path
    async fn fetch(&self, location: &str) -> Result<String>;
}
