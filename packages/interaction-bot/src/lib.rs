// Drug interaction importer - library core
//
// Reads delimited object/precipitant pairs and writes "drug action altered by"
// claims to a Wikibase instance, citing a reference item.
//
// Infrastructure (knowledge base, file fetching) sits behind traits in kernel/;
// the import rules live in domains/interactions.

pub mod cli;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
