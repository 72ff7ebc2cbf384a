//! Claim importer
//!
//! For every row: resolve the object and precipitant items by title, check
//! their DrugBank ids against the row, skip pairs that already carry a
//! "drug action altered by" claim for the precipitant, and otherwise add the
//! claim with a "stated in" source.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};
use wikibase_client::{Item, ItemId, SnakValue};

use super::decision::{EntityRole, ImportDecision, ImportReport};
use super::options::ImportOptions;
use super::row::{parse_rows, InteractionRow, ParsedRow};
use crate::kernel::{BaseFileFetcher, BaseKnowledgeBase};

/// drug action altered by
pub const DRUG_ACTION_ALTERED_BY: &str = "P769";
/// DrugBank ID
pub const DRUGBANK_ID: &str = "P715";
/// stated in
pub const STATED_IN: &str = "P248";

/// The claim added for every accepted row, built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimTemplate {
    pub property: &'static str,
    pub source_property: &'static str,
    pub source_target: ItemId,
}

impl ClaimTemplate {
    pub fn new(reference: ItemId) -> Self {
        Self {
            property: DRUG_ACTION_ALTERED_BY,
            source_property: STATED_IN,
            source_target: reference,
        }
    }
}

pub struct ClaimImporter {
    kb: Arc<dyn BaseKnowledgeBase>,
    template: ClaimTemplate,
    dry_run: bool,
    lang: String,
}

impl ClaimImporter {
    pub fn new(kb: Arc<dyn BaseKnowledgeBase>, reference: ItemId) -> Self {
        Self {
            kb,
            template: ClaimTemplate::new(reference),
            dry_run: false,
            lang: "en".to_string(),
        }
    }

    pub fn from_options(kb: Arc<dyn BaseKnowledgeBase>, options: &ImportOptions) -> Self {
        Self::new(kb, options.reference.clone())
            .dry_run(options.dry_run)
            .language(&options.lang)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Label language used for duplicate detection
    pub fn language(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn template(&self) -> &ClaimTemplate {
        &self.template
    }

    /// Fetch `options.source`, parse it and process every row in order.
    pub async fn import(
        &self,
        fetcher: &dyn BaseFileFetcher,
        options: &ImportOptions,
    ) -> Result<ImportReport> {
        let content = fetcher
            .fetch(&options.source)
            .await
            .with_context(|| format!("Failed to fetch {}", options.source))?;
        let rows = parse_rows(&content, options.delimiter, &options.id_prefix)?;
        info!(rows = rows.len(), source = %options.source, "Parsed input file");
        self.run(&rows).await
    }

    /// Process rows sequentially. Skips never abort the run; service errors do.
    pub async fn run(&self, rows: &[ParsedRow]) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for parsed in rows {
            let decision = match parsed {
                ParsedRow::Row(row) => self
                    .process_row(row)
                    .await
                    .with_context(|| format!("Failed to process line {}", row.line))?,
                ParsedRow::Malformed { fields, .. } => {
                    ImportDecision::SkippedMalformed { fields: *fields }
                }
            };

            if decision.is_applied() {
                info!(line = parsed.line(), %decision, "Row imported");
            } else {
                info!(line = parsed.line(), %decision, "Row skipped");
            }
            report.push(parsed.line(), decision);
        }

        let summary = &report.summary;
        info!(
            rows = summary.rows,
            applied = summary.applied,
            missing_entity = summary.missing_entity,
            id_mismatch = summary.id_mismatch,
            duplicate = summary.duplicate,
            dry_run = summary.dry_run,
            malformed = summary.malformed,
            "Import finished"
        );
        Ok(report)
    }

    pub async fn process_row(&self, row: &InteractionRow) -> Result<ImportDecision> {
        debug!(
            line = row.line,
            object = %row.object_name,
            object_id = %row.object_id,
            precipitant = %row.precipitant_name,
            precipitant_id = %row.precipitant_id,
            "Processing row"
        );

        let Some(object) = self.kb.find_item(&row.object_name).await? else {
            return Ok(ImportDecision::SkippedMissingEntity {
                role: EntityRole::Object,
                name: row.object_name.clone(),
            });
        };
        let Some(precipitant) = self.kb.find_item(&row.precipitant_name).await? else {
            return Ok(ImportDecision::SkippedMissingEntity {
                role: EntityRole::Precipitant,
                name: row.precipitant_name.clone(),
            });
        };

        if let Some(mismatch) = check_identifier(&object, &row.object_id, EntityRole::Object) {
            return Ok(mismatch);
        }
        if let Some(mismatch) =
            check_identifier(&precipitant, &row.precipitant_id, EntityRole::Precipitant)
        {
            return Ok(mismatch);
        }

        if let Some(duplicate) = self.find_duplicate(&object, &precipitant).await? {
            return Ok(duplicate);
        }

        if self.dry_run {
            return Ok(ImportDecision::SkippedDryRun);
        }

        let subject = object
            .id
            .as_ref()
            .ok_or_else(|| anyhow!("Item for {} has no id", row.object_name))?;
        let target = precipitant
            .id
            .as_ref()
            .ok_or_else(|| anyhow!("Item for {} has no id", row.precipitant_name))?;

        let statement_id = self
            .kb
            .add_claim(subject, self.template.property, target)
            .await?;
        self.kb
            .add_source(
                &statement_id,
                self.template.source_property,
                &self.template.source_target,
            )
            .await?;

        Ok(ImportDecision::Applied { statement_id })
    }

    /// First existing relation claim whose target shares the precipitant's label.
    async fn find_duplicate(&self, object: &Item, precipitant: &Item) -> Result<Option<ImportDecision>> {
        let precipitant_label = precipitant.label(&self.lang);

        for target in object.item_targets(self.template.property) {
            if precipitant.id.as_ref() == Some(target) {
                return Ok(Some(ImportDecision::SkippedDuplicate {
                    label: precipitant_label.map(str::to_string),
                }));
            }

            let Some(existing) = self.kb.get_item(target).await? else {
                warn!(target = %target, "Claim target no longer exists");
                continue;
            };
            if existing.label(&self.lang) == precipitant_label {
                return Ok(Some(ImportDecision::SkippedDuplicate {
                    label: precipitant_label.map(str::to_string),
                }));
            }
        }
        Ok(None)
    }
}

/// Compare an item's first DrugBank id statement with the row's.
///
/// Only items with no statement at all pass unchecked; `novalue`, `somevalue`
/// and non-string values never equal a row id.
fn check_identifier(item: &Item, expected: &str, role: EntityRole) -> Option<ImportDecision> {
    match item.first_value(DRUGBANK_ID) {
        None => None,
        Some(SnakValue::String(found)) if found == expected => None,
        Some(found) => Some(ImportDecision::SkippedIdMismatch {
            role,
            expected: expected.to_string(),
            found: found.to_string(),
        }),
    }
}
