//! Kernel module - infrastructure behind the importer.

pub mod fetcher;
pub mod test_dependencies;
pub mod traits;
pub mod wikibase;

pub use fetcher::{FileLocation, HttpFileFetcher};
pub use test_dependencies::{ItemFixture, MockFetcher, MockKnowledgeBase};
pub use traits::*;
pub use wikibase::WikibaseAdapter;
