//! Command line surface
//!
//! Accepts both the single-dash bot style (`-dry -file=<url> -delim=; -ref=Q17505343`)
//! and the usual GNU style (`--dry --file <url>`).

use clap::Parser;
use wikibase_client::ItemId;

use crate::domains::interactions::{parse_delimiter, ConfigError, ImportOptions, DEFAULT_ID_PREFIX};

const LONG_FLAGS: &[&str] = &[
    "dry", "file", "delim", "ref", "lang", "site", "id-prefix", "json", "help", "version",
];

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "interaction-import")]
#[command(about = "Add \"drug action altered by\" claims from a delimited interaction file")]
#[command(version)]
pub struct Cli {
    /// If set, nothing will be changed
    #[arg(long)]
    pub dry: bool,

    /// Full HTTP url (or local path) of the file
    #[arg(long, value_name = "URL")]
    pub file: Option<String>,

    /// Delimiter character (`\t` or `tab` for tabs)
    #[arg(long, value_name = "CHAR", default_value = ",")]
    pub delim: String,

    /// Item cited as "stated in" on new claims
    #[arg(long = "ref", value_name = "ITEM")]
    pub reference: Option<String>,

    /// Label language used when comparing items
    #[arg(long, default_value = "en")]
    pub lang: String,

    /// Site whose page titles name the items
    #[arg(long, default_value = "enwiki")]
    pub site: String,

    /// Prefix stripped from identifier fields
    #[arg(long, default_value = DEFAULT_ID_PREFIX)]
    pub id_prefix: String,

    /// Print the per-row report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse process arguments, accepting single-dash long flags.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }

    /// Validate into run options. Every missing mandatory flag is reported at once.
    pub fn into_options(self) -> Result<ImportOptions, ConfigError> {
        let mut missing = Vec::new();
        if self.file.is_none() {
            missing.push("-file");
        }
        if self.reference.is_none() {
            missing.push("-ref");
        }
        let (Some(source), Some(reference)) = (self.file, self.reference) else {
            return Err(ConfigError::MissingArguments(missing));
        };

        let delimiter = parse_delimiter(&self.delim)?;
        let reference =
            ItemId::parse(&reference).ok_or(ConfigError::InvalidReference(reference))?;

        Ok(ImportOptions {
            source,
            delimiter,
            dry_run: self.dry,
            reference,
            id_prefix: self.id_prefix,
            lang: self.lang,
            site: self.site,
        })
    }
}

/// Rewrite `-file=x` style arguments to `--file=x`. Unknown arguments pass through untouched.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(index, arg)| {
            if index == 0 || arg.starts_with("--") {
                return arg;
            }
            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            let name = rest.split('=').next().unwrap_or_default();
            if LONG_FLAGS.contains(&name) {
                format!("-{}", arg)
            } else {
                arg
            }
        })
        .collect()
}
