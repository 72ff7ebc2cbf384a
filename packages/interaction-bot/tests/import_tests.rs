//! End-to-end importer tests against the in-memory knowledge base.

use interaction_bot::domains::interactions::{
    ClaimImporter, EntityRole, ImportDecision, ImportOptions, DRUGBANK_ID,
    DRUG_ACTION_ALTERED_BY, STATED_IN,
};
use interaction_bot::kernel::{ItemFixture, MockFetcher, MockKnowledgeBase};
use std::sync::Arc;
use wikibase_client::{ItemId, SnakValue};

const SOURCE: &str = "https://example.org/interactions.csv";
const REFERENCE: &str = "Q17505343";

fn q(id: &str) -> ItemId {
    ItemId::parse(id).unwrap()
}

fn options() -> ImportOptions {
    ImportOptions::new(SOURCE, q(REFERENCE))
}

fn atomoxetine() -> ItemFixture {
    ItemFixture::new("Q423391", "atomoxetine").with_string(DRUGBANK_ID, "00289")
}

fn isocarboxazid() -> ItemFixture {
    ItemFixture::new("Q412443", "isocarboxazid").with_string(DRUGBANK_ID, "01247")
}

fn knowledge_base() -> MockKnowledgeBase {
    MockKnowledgeBase::new()
        .with_item("Atomoxetine", atomoxetine().build())
        .with_item("Isocarboxazid", isocarboxazid().build())
}

async fn import(kb: &MockKnowledgeBase, content: &str, options: &ImportOptions) -> Vec<ImportDecision> {
    let fetcher = MockFetcher::new().with_file(SOURCE, content);
    let importer = ClaimImporter::from_options(Arc::new(kb.clone()), options);
    importer
        .import(&fetcher, options)
        .await
        .unwrap()
        .outcomes
        .into_iter()
        .map(|o| o.decision)
        .collect()
}

#[tokio::test]
async fn test_applies_claim_with_source() {
    let kb = knowledge_base();

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(decisions.len(), 1);
    assert!(decisions[0].is_applied());

    let claims = kb.claims();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].subject, q("Q423391"));
    assert_eq!(claims[0].property, DRUG_ACTION_ALTERED_BY);
    assert_eq!(claims[0].target, q("Q412443"));

    let sources = kb.sources();
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].statement_id, claims[0].statement_id);
    assert_eq!(sources[0].property, STATED_IN);
    assert_eq!(sources[0].target, q(REFERENCE));
}

#[tokio::test]
async fn test_missing_object_skips_without_precipitant_lookup() {
    let kb = knowledge_base();

    let decisions = import(&kb, "Nosuchdrug,DB99999,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(
        decisions,
        vec![ImportDecision::SkippedMissingEntity {
            role: EntityRole::Object,
            name: "Nosuchdrug".into(),
        }]
    );
    assert_eq!(kb.lookups(), vec!["Nosuchdrug"]);
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_missing_precipitant_skips() {
    let kb = knowledge_base();

    let decisions = import(&kb, "Atomoxetine,DB00289,Nosuchdrug,DB99999\n", &options()).await;

    assert_eq!(
        decisions,
        vec![ImportDecision::SkippedMissingEntity {
            role: EntityRole::Precipitant,
            name: "Nosuchdrug".into(),
        }]
    );
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_object_id_mismatch_skips() {
    let kb = knowledge_base();

    let decisions = import(&kb, "Atomoxetine,DB00290,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(
        decisions,
        vec![ImportDecision::SkippedIdMismatch {
            role: EntityRole::Object,
            expected: "00290".into(),
            found: "00289".into(),
        }]
    );
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_precipitant_id_mismatch_skips() {
    let kb = knowledge_base();

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01248\n", &options()).await;

    assert!(matches!(
        decisions[0],
        ImportDecision::SkippedIdMismatch {
            role: EntityRole::Precipitant,
            ..
        }
    ));
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_identifier_statement_without_value_mismatches() {
    let kb = MockKnowledgeBase::new()
        .with_item(
            "Atomoxetine",
            ItemFixture::new("Q423391", "atomoxetine")
                .with_value(DRUGBANK_ID, SnakValue::NoValue)
                .build(),
        )
        .with_item("Isocarboxazid", isocarboxazid().build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(
        decisions,
        vec![ImportDecision::SkippedIdMismatch {
            role: EntityRole::Object,
            expected: "00289".into(),
            found: "novalue".into(),
        }]
    );
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_report_lines_follow_blank_lines() {
    let kb = knowledge_base();
    let fetcher = MockFetcher::new().with_file(
        SOURCE,
        "Nosuchdrug,DB99999,Isocarboxazid,DB01247\n\n\nAtomoxetine,DB00289,Isocarboxazid,DB01247\n",
    );
    let importer = ClaimImporter::from_options(Arc::new(kb.clone()), &options());

    let report = importer.import(&fetcher, &options()).await.unwrap();

    assert_eq!(
        report.outcomes.iter().map(|o| o.line).collect::<Vec<_>>(),
        vec![1, 4]
    );
}

#[tokio::test]
async fn test_items_without_identifier_are_accepted() {
    let kb = MockKnowledgeBase::new()
        .with_item("Atomoxetine", ItemFixture::new("Q423391", "atomoxetine").build())
        .with_item("Isocarboxazid", ItemFixture::new("Q412443", "isocarboxazid").build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert!(decisions[0].is_applied());
    assert_eq!(kb.claims().len(), 1);
}

#[tokio::test]
async fn test_existing_claim_with_same_label_is_duplicate() {
    // Existing claim points at a different item that carries the same label
    let kb = MockKnowledgeBase::new()
        .with_item(
            "Atomoxetine",
            atomoxetine()
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q100"))
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q200"))
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q300"))
                .build(),
        )
        .with_item("Isocarboxazid", isocarboxazid().build())
        .with_linked_item(ItemFixture::new("Q100", "fluoxetine").build())
        .with_linked_item(ItemFixture::new("Q200", "isocarboxazid").build())
        .with_linked_item(ItemFixture::new("Q300", "isocarboxazid").build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(
        decisions,
        vec![ImportDecision::SkippedDuplicate {
            label: Some("isocarboxazid".into()),
        }]
    );
    // First match short-circuits the scan
    assert_eq!(kb.loads(), vec![q("Q100"), q("Q200")]);
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_existing_claim_to_same_item_is_duplicate() {
    let kb = MockKnowledgeBase::new()
        .with_item(
            "Atomoxetine",
            atomoxetine()
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q412443"))
                .build(),
        )
        .with_item("Isocarboxazid", isocarboxazid().build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert!(matches!(decisions[0], ImportDecision::SkippedDuplicate { .. }));
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_unrelated_existing_claims_do_not_block() {
    let kb = MockKnowledgeBase::new()
        .with_item(
            "Atomoxetine",
            atomoxetine()
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q100"))
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q999"))
                .build(),
        )
        .with_item("Isocarboxazid", isocarboxazid().build())
        .with_linked_item(ItemFixture::new("Q100", "fluoxetine").build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert!(decisions[0].is_applied());
    assert_eq!(kb.claims().len(), 1);
}

#[tokio::test]
async fn test_unlabeled_target_matches_unlabeled_precipitant() {
    let kb = MockKnowledgeBase::new()
        .with_item(
            "Atomoxetine",
            atomoxetine()
                .with_item_claim(DRUG_ACTION_ALTERED_BY, q("Q100"))
                .build(),
        )
        .with_item("Isocarboxazid", ItemFixture::unlabeled("Q412443").build())
        .with_linked_item(ItemFixture::unlabeled("Q100").build());

    let decisions = import(&kb, "Atomoxetine,DB00289,Isocarboxazid,DB01247\n", &options()).await;

    assert_eq!(decisions, vec![ImportDecision::SkippedDuplicate { label: None }]);
}

#[tokio::test]
async fn test_dry_run_never_mutates() {
    let kb = knowledge_base();
    let mut options = options();
    options.dry_run = true;

    let content = "Atomoxetine,DB00289,Isocarboxazid,DB01247\nAtomoxetine,DB00290,Isocarboxazid,DB01247\n";
    let decisions = import(&kb, content, &options).await;

    assert_eq!(decisions[0], ImportDecision::SkippedDryRun);
    assert!(matches!(decisions[1], ImportDecision::SkippedIdMismatch { .. }));
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_skips_do_not_abort_remaining_rows() {
    let kb = knowledge_base();

    let content = "\
Nosuchdrug,DB99999,Isocarboxazid,DB01247
Atomoxetine,DB00289
Atomoxetine,DB00290,Isocarboxazid,DB01247
Atomoxetine,DB00289,Isocarboxazid,DB01247
";
    let fetcher = MockFetcher::new().with_file(SOURCE, content);
    let importer = ClaimImporter::from_options(Arc::new(kb.clone()), &options());
    let report = importer.import(&fetcher, &options()).await.unwrap();

    assert_eq!(report.summary.rows, 4);
    assert_eq!(report.summary.missing_entity, 1);
    assert_eq!(report.summary.malformed, 1);
    assert_eq!(report.summary.id_mismatch, 1);
    assert_eq!(report.summary.applied, 1);
    assert_eq!(
        report.outcomes.iter().map(|o| o.line).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );
    assert_eq!(kb.claims().len(), 1);
    assert_eq!(fetcher.fetches(), vec![SOURCE]);
}

#[tokio::test]
async fn test_custom_delimiter() {
    let kb = knowledge_base();
    let mut options = options();
    options.delimiter = b'\t';

    let decisions = import(&kb, "Atomoxetine\tDB00289\tIsocarboxazid\tDB01247\n", &options).await;

    assert!(decisions[0].is_applied());
}

#[tokio::test]
async fn test_service_error_fails_run() {
    let kb = knowledge_base().with_failing_title("Warfarin");
    let fetcher = MockFetcher::new().with_file(
        SOURCE,
        "Warfarin,DB00682,Aspirin,DB00945\nAtomoxetine,DB00289,Isocarboxazid,DB01247\n",
    );
    let importer = ClaimImporter::from_options(Arc::new(kb.clone()), &options());

    let err = importer.import(&fetcher, &options()).await.unwrap_err();

    assert!(format!("{:#}", err).contains("line 1"));
    assert!(!kb.was_mutated());
}

#[tokio::test]
async fn test_fetch_failure_is_reported() {
    let kb = knowledge_base();
    let fetcher = MockFetcher::new();
    let importer = ClaimImporter::from_options(Arc::new(kb.clone()), &options());

    let err = importer.import(&fetcher, &options()).await.unwrap_err();

    assert!(err.to_string().contains(SOURCE));
    assert!(kb.lookups().is_empty());
}
