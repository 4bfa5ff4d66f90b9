#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use iam_reference_mcp::reference::{
    ReferenceError, ReferenceSource, ServiceDocument, ServiceEntry, ServiceIndex,
    error::{map_http_status, service_not_found, transport_error},
};
use serde_json::{Value, json};

pub const DEMO_URL: &str = "https://ref.test/demo.json";
pub const BROKEN_URL: &str = "https://ref.test/broken.json";
pub const SPARSE_URL: &str = "https://ref.test/sparse.json";

/// A document with no `Actions`/`ConditionKeys`, a resource without
/// `ARNFormats` and one whose `ARNFormats` is null.
pub fn sparse_document_value() -> Value {
    json!({
        "Name": "sparse",
        "Resources": [
            {"Name": "bare"},
            {"Name": "nulled", "ARNFormats": null, "ConditionKeys": ["sparse:Tag"]},
        ],
    })
}

pub fn demo_document_value() -> Value {
    json!({
        "Name": "demo",
        "Version": "v1.4",
        "Actions": [
            {
                "Name": "GetItem",
                "ActionConditionKeys": ["demo:Attributes", "demo:TableName"],
                "Resources": [{"Name": "table"}],
            },
            {
                "Name": "ListTables",
            },
            {
                "Name": "DescribeStream",
                "Resources": [{"Name": "stream"}],
            },
            {
                "Name": "TagResource",
                "ActionConditionKeys": ["aws:ResourceTag/${TagKey}"],
                "Resources": [{"Name": "table"}, {"Name": "backup"}, {"Name": "missing"}],
            },
            {
                "Name": "Query",
                "ActionConditionKeys": ["demo:TableName", "demo:TableNameSuffix"],
                "Resources": [{"Name": "table"}],
                "Annotations": {"Properties": {"IsList": false, "IsWrite": false}},
            },
        ],
        "Resources": [
            {
                "Name": "table",
                "ARNFormats": ["arn:${Partition}:demo:${Region}:${Account}:table/${TableName}"],
                "ConditionKeys": ["aws:ResourceTag/${TagKey}"],
            },
            {
                "Name": "stream",
                "ARNFormats": ["arn:${Partition}:demo:${Region}:${Account}:table/${TableName}/stream/${StreamLabel}"],
            },
            {
                "Name": "backup",
                "ARNFormats": ["arn:${Partition}:demo:${Region}:${Account}:backup"],
                "ConditionKeys": ["aws:ResourceTag/${TagKey}"],
            },
        ],
        "ConditionKeys": [
            {"Name": "aws:ResourceTag/${TagKey}", "Types": ["String"]},
            {"Name": "demo:TableName", "Types": ["String"]},
            {"Name": "demo:TableNameSuffix", "Types": ["String"]},
            {"Name": "demo:Attributes", "Types": ["ArrayOfString"]},
        ],
    })
}

pub fn demo_document() -> ServiceDocument {
    serde_json::from_value(demo_document_value()).expect("demo fixture should parse")
}

pub fn demo_index() -> ServiceIndex {
    ServiceIndex::from_entries([
        ServiceEntry {
            service: "demo".to_string(),
            url: DEMO_URL.to_string(),
        },
        ServiceEntry {
            service: "broken".to_string(),
            url: BROKEN_URL.to_string(),
        },
    ])
}

/// In-memory source that counts fetches. The first `failing_index_fetches`
/// index fetches fail with a 503.
pub struct FakeSource {
    index: ServiceIndex,
    documents: HashMap<String, Value>,
    index_delay: Duration,
    failing_index_fetches: AtomicUsize,
    index_fetches: AtomicUsize,
    document_fetches: AtomicUsize,
}

impl FakeSource {
    pub fn demo() -> Self {
        let mut documents = HashMap::new();
        documents.insert(DEMO_URL.to_string(), demo_document_value());
        Self {
            index: demo_index(),
            documents,
            index_delay: Duration::ZERO,
            failing_index_fetches: AtomicUsize::new(0),
            index_fetches: AtomicUsize::new(0),
            document_fetches: AtomicUsize::new(0),
        }
    }

    /// Replaces the index, keeping the known documents.
    pub fn with_index(mut self, index: ServiceIndex) -> Self {
        self.index = index;
        self
    }

    /// Appends `service` to the index, served from `url`.
    pub fn with_document(mut self, service: &str, url: &str, document: Value) -> Self {
        let entry = ServiceEntry {
            service: service.to_string(),
            url: url.to_string(),
        };
        self.index =
            ServiceIndex::from_entries(self.index.entries().iter().cloned().chain([entry]));
        self.documents.insert(url.to_string(), document);
        self
    }

    pub fn with_index_delay(mut self, delay: Duration) -> Self {
        self.index_delay = delay;
        self
    }

    pub fn with_failing_index_fetches(self, count: usize) -> Self {
        self.failing_index_fetches.store(count, Ordering::SeqCst);
        self
    }

    pub fn index_fetches(&self) -> usize {
        self.index_fetches.load(Ordering::SeqCst)
    }

    pub fn document_fetches(&self) -> usize {
        self.document_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceSource for FakeSource {
    async fn fetch_index(&self) -> Result<ServiceIndex, ReferenceError> {
        self.index_fetches.fetch_add(1, Ordering::SeqCst);
        if !self.index_delay.is_zero() {
            tokio::time::sleep(self.index_delay).await;
        }

        let should_fail = self
            .failing_index_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(map_http_status(503, "https://ref.test/", "unavailable"));
        }
        Ok(self.index.clone())
    }

    async fn fetch_document(&self, url: &str) -> Result<Value, ReferenceError> {
        self.document_fetches.fetch_add(1, Ordering::SeqCst);
        if url == BROKEN_URL {
            return Err(transport_error(url, "connection reset"));
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| service_not_found(url))
    }
}
