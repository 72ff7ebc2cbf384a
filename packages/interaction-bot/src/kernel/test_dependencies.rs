// Mock implementations for testing
//
// Provides in-memory knowledge base and fetcher doubles that record every call.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use wikibase_client::{Item, ItemId, SnakValue, Statement};

use super::{BaseFileFetcher, BaseKnowledgeBase};

// =============================================================================
// Item fixtures
// =============================================================================

/// Builder for `Item` fixtures
#[derive(Debug, Clone)]
pub struct ItemFixture {
    item: Item,
    next_statement: usize,
}

impl ItemFixture {
    pub fn new(id: &str, english_label: &str) -> Self {
        let mut item = Item {
            id: ItemId::parse(id),
            ..Default::default()
        };
        item.labels.insert("en".to_string(), english_label.to_string());
        Self {
            item,
            next_statement: 0,
        }
    }

    /// An item with no labels at all
    pub fn unlabeled(id: &str) -> Self {
        Self {
            item: Item {
                id: ItemId::parse(id),
                ..Default::default()
            },
            next_statement: 0,
        }
    }

    pub fn with_string(self, property: &str, value: &str) -> Self {
        self.with_value(property, SnakValue::String(value.to_string()))
    }

    pub fn with_item_claim(self, property: &str, target: ItemId) -> Self {
        self.with_value(property, SnakValue::Item(target))
    }

    pub fn with_value(mut self, property: &str, value: SnakValue) -> Self {
        self.next_statement += 1;
        let subject = self
            .item
            .id
            .as_ref()
            .map(ItemId::to_string)
            .unwrap_or_default();
        let statement = Statement {
            id: format!("{}$fixture-{}", subject, self.next_statement),
            property: property.to_string(),
            value,
        };
        self.item
            .claims
            .entry(property.to_string())
            .or_default()
            .push(statement);
        self
    }

    pub fn build(self) -> Item {
        self.item
    }
}

// =============================================================================
// Mock Knowledge Base
// =============================================================================

/// A claim written through the mock
#[derive(Debug, Clone, PartialEq)]
pub struct AddedClaim {
    pub statement_id: String,
    pub subject: ItemId,
    pub property: String,
    pub target: ItemId,
}

/// A source attached through the mock
#[derive(Debug, Clone, PartialEq)]
pub struct AddedSource {
    pub statement_id: String,
    pub property: String,
    pub target: ItemId,
}

#[derive(Default)]
struct MockKnowledgeBaseState {
    by_title: HashMap<String, Item>,
    by_id: HashMap<ItemId, Item>,
    failing_titles: HashSet<String>,
    lookups: Vec<String>,
    loads: Vec<ItemId>,
    claims: Vec<AddedClaim>,
    sources: Vec<AddedSource>,
}

#[derive(Clone, Default)]
pub struct MockKnowledgeBase {
    state: Arc<Mutex<MockKnowledgeBaseState>>,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item reachable by title and by id
    pub fn with_item(self, title: &str, item: Item) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(id) = item.id.clone() {
                state.by_id.insert(id, item.clone());
            }
            state.by_title.insert(title.to_string(), item);
        }
        self
    }

    /// Register an item reachable only by id (e.g. a claim target)
    pub fn with_linked_item(self, item: Item) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(id) = item.id.clone() {
                state.by_id.insert(id, item);
            }
        }
        self
    }

    /// Make lookups of `title` fail like a service outage
    pub fn with_failing_title(self, title: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_titles
            .insert(title.to_string());
        self
    }

    /// Titles looked up, in order
    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }

    /// Item ids loaded, in order
    pub fn loads(&self) -> Vec<ItemId> {
        self.state.lock().unwrap().loads.clone()
    }

    pub fn claims(&self) -> Vec<AddedClaim> {
        self.state.lock().unwrap().claims.clone()
    }

    pub fn sources(&self) -> Vec<AddedSource> {
        self.state.lock().unwrap().sources.clone()
    }

    /// True if any write went through
    pub fn was_mutated(&self) -> bool {
        let state = self.state.lock().unwrap();
        !state.claims.is_empty() || !state.sources.is_empty()
    }
}

#[async_trait]
impl BaseKnowledgeBase for MockKnowledgeBase {
    async fn find_item(&self, title: &str) -> Result<Option<Item>> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(title.to_string());
        if state.failing_titles.contains(title) {
            bail!("mock service unavailable for {}", title);
        }
        Ok(state.by_title.get(title).cloned())
    }

    async fn get_item(&self, id: &ItemId) -> Result<Option<Item>> {
        let mut state = self.state.lock().unwrap();
        state.loads.push(id.clone());
        Ok(state.by_id.get(id).cloned())
    }

    async fn add_claim(&self, subject: &ItemId, property: &str, target: &ItemId) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let statement_id = format!("{}$mock-{}", subject, state.claims.len() + 1);
        state.claims.push(AddedClaim {
            statement_id: statement_id.clone(),
            subject: subject.clone(),
            property: property.to_string(),
            target: target.clone(),
        });
        Ok(statement_id)
    }

    async fn add_source(&self, statement_id: &str, property: &str, target: &ItemId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.claims.iter().any(|c| c.statement_id == statement_id) {
            bail!("no such statement: {}", statement_id);
        }
        state.sources.push(AddedSource {
            statement_id: statement_id.to_string(),
            property: property.to_string(),
            target: target.clone(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock File Fetcher
// =============================================================================

#[derive(Clone, Default)]
pub struct MockFetcher {
    files: Arc<Mutex<HashMap<String, String>>>,
    fetches: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, location: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(location.to_string(), content.to_string());
        self
    }

    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseFileFetcher for MockFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        self.fetches.lock().unwrap().push(location.to_string());
        match self.files.lock().unwrap().get(location) {
            Some(content) => Ok(content.clone()),
            None => bail!("HTTP 404 for {}", location),
        }
    }
}
