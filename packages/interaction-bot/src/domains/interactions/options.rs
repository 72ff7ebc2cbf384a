use thiserror::Error;
use wikibase_client::ItemId;

use super::row::DEFAULT_ID_PREFIX;

/// Problems with the run configuration, reported before any row is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing mandatory arguments: {}", .0.join(", "))]
    MissingArguments(Vec<&'static str>),

    #[error("Invalid delimiter {0:?}: expected a single ASCII character")]
    InvalidDelimiter(String),

    #[error("Invalid reference item {0:?}: expected an item id such as Q17505343")]
    InvalidReference(String),

    #[error("WIKIBASE_USERNAME and WIKIBASE_PASSWORD must be set unless running with -dry")]
    MissingCredentials,
}

/// Validated settings for one import run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// URL or local path of the delimited file
    pub source: String,
    pub delimiter: u8,
    pub dry_run: bool,
    /// Item cited as "stated in" on every new claim
    pub reference: ItemId,
    pub id_prefix: String,
    pub lang: String,
    pub site: String,
}

impl ImportOptions {
    pub fn new(source: impl Into<String>, reference: ItemId) -> Self {
        Self {
            source: source.into(),
            delimiter: b',',
            dry_run: false,
            reference,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            lang: "en".to_string(),
            site: "enwiki".to_string(),
        }
    }
}

/// Parse a delimiter argument: one ASCII character, or `\t` / `tab`.
pub fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    match raw {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}
