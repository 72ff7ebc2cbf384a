pub mod decision;
pub mod importer;
pub mod options;
pub mod row;

pub use decision::{EntityRole, ImportDecision, ImportReport, ImportSummary, RowOutcome};
pub use importer::{ClaimImporter, ClaimTemplate, DRUGBANK_ID, DRUG_ACTION_ALTERED_BY, STATED_IN};
pub use options::{parse_delimiter, ConfigError, ImportOptions};
pub use row::{parse_rows, strip_id_prefix, InteractionRow, ParsedRow, DEFAULT_ID_PREFIX};
