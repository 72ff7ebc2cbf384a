use serde::Serialize;
use std::fmt;

/// Which side of the interaction an entity plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRole {
    Object,
    Precipitant,
}

impl fmt::Display for EntityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Precipitant => f.write_str("precipitant"),
        }
    }
}

/// Outcome of processing a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ImportDecision {
    Applied {
        statement_id: String,
    },
    SkippedMissingEntity {
        role: EntityRole,
        name: String,
    },
    SkippedIdMismatch {
        role: EntityRole,
        expected: String,
        found: String,
    },
    SkippedDuplicate {
        label: Option<String>,
    },
    SkippedDryRun,
    SkippedMalformed {
        fields: usize,
    },
}

impl ImportDecision {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl fmt::Display for ImportDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { statement_id } => write!(f, "applied ({})", statement_id),
            Self::SkippedMissingEntity { role, name } => {
                write!(f, "skipped: no item found for {} {}", role, name)
            }
            Self::SkippedIdMismatch {
                role,
                expected,
                found,
            } => write!(
                f,
                "skipped: {} id is incorrect (row {}, item {})",
                role, expected, found
            ),
            Self::SkippedDuplicate { label } => write!(
                f,
                "skipped: found entry for precipitant {}",
                label.as_deref().unwrap_or("(no label)")
            ),
            Self::SkippedDryRun => f.write_str("skipped: dry run"),
            Self::SkippedMalformed { fields } => {
                write!(f, "skipped: expected 4 fields, found {}", fields)
            }
        }
    }
}

/// Decision attached to its input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    pub line: u64,
    #[serde(flatten)]
    pub decision: ImportDecision,
}

/// Per-decision counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub applied: usize,
    pub missing_entity: usize,
    pub id_mismatch: usize,
    pub duplicate: usize,
    pub dry_run: usize,
    pub malformed: usize,
}

impl ImportSummary {
    pub fn record(&mut self, decision: &ImportDecision) {
        self.rows += 1;
        let counter = match decision {
            ImportDecision::Applied { .. } => &mut self.applied,
            ImportDecision::SkippedMissingEntity { .. } => &mut self.missing_entity,
            ImportDecision::SkippedIdMismatch { .. } => &mut self.id_mismatch,
            ImportDecision::SkippedDuplicate { .. } => &mut self.duplicate,
            ImportDecision::SkippedDryRun => &mut self.dry_run,
            ImportDecision::SkippedMalformed { .. } => &mut self.malformed,
        };
        *counter += 1;
    }

    pub fn skipped(&self) -> usize {
        self.rows - self.applied
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub outcomes: Vec<RowOutcome>,
    pub summary: ImportSummary,
}

impl ImportReport {
    pub fn push(&mut self, line: u64, decision: ImportDecision) {
        self.summary.record(&decision);
        self.outcomes.push(RowOutcome { line, decision });
    }
}
