use std::sync::Arc;

use serde_json::Value;

use crate::reference::{
    cache::ServiceIndexCache,
    error::{ReferenceError, service_not_found},
    queries,
    source::ReferenceSource,
    types::{
        ActionEntry, ConditionKeyInformation, ResourceInformation, ServiceDocument, ServiceIndex,
        ServiceStats,
    },
};

/// Service authorization reference lookups.
///
/// The index is fetched once and shared; service documents are fetched on
/// every call.
pub struct ReferenceCatalog {
    source: Arc<dyn ReferenceSource>,
    index: ServiceIndexCache,
}

impl ReferenceCatalog {
    pub fn new(source: Arc<dyn ReferenceSource>) -> Self {
        Self {
            index: ServiceIndexCache::new(Arc::clone(&source)),
            source,
        }
    }

    pub async fn service_index(&self) -> Result<Arc<ServiceIndex>, ReferenceError> {
        self.index.get().await
    }

    pub async fn service_codes(&self) -> Result<Vec<String>, ReferenceError> {
        let index = self.index.get().await?;
        Ok(index.codes().map(str::to_string).collect())
    }

    pub async fn service_url(&self, service: &str) -> Result<String, ReferenceError> {
        let index = self.index.get().await?;
        index
            .url_for(service)
            .map(str::to_string)
            .ok_or_else(|| service_not_found(service))
    }

    /// The upstream document, untouched.
    pub async fn service_document(&self, service: &str) -> Result<Value, ReferenceError> {
        let url = self.service_url(service).await?;
        tracing::debug!(target: "reference", service, url = %url, "service_match_found");
        self.source.fetch_document(&url).await
    }

    async fn decoded_document(&self, service: &str) -> Result<ServiceDocument, ReferenceError> {
        let url = self.service_url(service).await?;
        tracing::debug!(target: "reference", service, url = %url, "service_match_found");
        let value = self.source.fetch_document(&url).await?;
        ServiceDocument::from_value(&url, value)
    }

    pub async fn service_stats(&self, service: &str) -> Result<ServiceStats, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::service_stats(&document))
    }

    pub async fn action_names(&self, service: &str) -> Result<Vec<String>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::action_names(&document))
    }

    pub async fn resource_names(&self, service: &str) -> Result<Vec<String>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::resource_names(&document))
    }

    pub async fn condition_key_names(&self, service: &str) -> Result<Vec<String>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::condition_key_names(&document))
    }

    pub async fn action_information(
        &self,
        service: &str,
        action: &str,
    ) -> Result<Option<ActionEntry>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::action_information(&document, action))
    }

    pub async fn resource_information(
        &self,
        service: &str,
        resource: &str,
    ) -> Result<Option<ResourceInformation>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::resource_information(service, &document, resource))
    }

    pub async fn condition_key_information(
        &self,
        service: &str,
        condition_key: &str,
    ) -> Result<Option<ConditionKeyInformation>, ReferenceError> {
        let document = self.decoded_document(service).await?;
        Ok(queries::condition_key_information(&document, condition_key))
    }
}
