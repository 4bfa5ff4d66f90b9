use std::sync::Arc;

use iam_reference_mcp::reference::{ReferenceCatalog, ReferenceErrorKind};
use serde_json::json;

use crate::support::{FakeSource, SPARSE_URL, demo_document_value, sparse_document_value};

fn catalog() -> (Arc<FakeSource>, ReferenceCatalog) {
    let source = Arc::new(FakeSource::demo());
    let catalog = ReferenceCatalog::new(source.clone());
    (source, catalog)
}

#[tokio::test]
async fn given_catalog_when_codes_requested_then_index_order_is_kept() {
    let (_, catalog) = catalog();
    let codes = catalog.service_codes().await.expect("codes should load");
    assert_eq!(codes, vec!["demo".to_string(), "broken".to_string()]);
}

#[tokio::test]
async fn given_unknown_service_when_document_requested_then_not_found_without_document_fetch() {
    let (source, catalog) = catalog();
    let err = catalog
        .service_stats("nope")
        .await
        .expect_err("unknown service should fail");
    assert_eq!(err.kind, ReferenceErrorKind::ServiceNotFound);
    assert_eq!(source.document_fetches(), 0);
}

#[tokio::test]
async fn given_repeated_queries_then_index_is_shared_and_documents_are_refetched() {
    let (source, catalog) = catalog();

    catalog.service_stats("demo").await.expect("stats should load");
    catalog
        .action_names("demo")
        .await
        .expect("actions should load");
    catalog
        .condition_key_information("demo", "demo:Attributes")
        .await
        .expect("condition key lookup should succeed");

    assert_eq!(source.index_fetches(), 1);
    assert_eq!(source.document_fetches(), 3);
}

#[tokio::test]
async fn given_broken_document_when_queried_then_transport_error_surfaces() {
    let (_, catalog) = catalog();
    let err = catalog
        .resource_names("broken")
        .await
        .expect_err("broken document should fail");
    assert_eq!(err.kind, ReferenceErrorKind::Transport);
}

#[tokio::test]
async fn given_known_service_when_entity_missing_then_none_is_returned() {
    let (_, catalog) = catalog();
    let missing = catalog
        .action_information("demo", "DeleteEverything")
        .await
        .expect("lookup should succeed");
    assert!(missing.is_none());
}

#[tokio::test]
async fn given_known_service_when_document_requested_then_upstream_json_is_returned_verbatim() {
    let source = Arc::new(FakeSource::demo().with_document(
        "sparse",
        SPARSE_URL,
        sparse_document_value(),
    ));
    let catalog = ReferenceCatalog::new(source);

    let demo = catalog
        .service_document("demo")
        .await
        .expect("demo document should load");
    assert_eq!(demo, demo_document_value());

    let sparse = catalog
        .service_document("sparse")
        .await
        .expect("sparse document should load");
    assert_eq!(sparse, sparse_document_value());
}

#[tokio::test]
async fn given_sparse_document_when_joined_then_missing_fields_stay_missing() {
    let source = Arc::new(FakeSource::demo().with_document(
        "sparse",
        SPARSE_URL,
        sparse_document_value(),
    ));
    let catalog = ReferenceCatalog::new(source);

    let stats = catalog
        .service_stats("sparse")
        .await
        .expect("stats should load");
    assert_eq!(
        serde_json::to_value(stats).expect("stats should serialize"),
        json!({"Actions": 0, "Resources": 2, "ConditionKeys": 0})
    );

    let bare = catalog
        .resource_information("sparse", "bare")
        .await
        .expect("lookup should succeed")
        .expect("resource should exist");
    assert_eq!(
        serde_json::to_value(bare).expect("resource should serialize"),
        json!({"Name": "bare"})
    );

    let nulled = catalog
        .resource_information("sparse", "nulled")
        .await
        .expect("lookup should succeed")
        .expect("resource should exist");
    assert_eq!(
        serde_json::to_value(nulled).expect("resource should serialize"),
        json!({"Name": "nulled", "ConditionKeys": ["sparse:Tag"]})
    );
}
