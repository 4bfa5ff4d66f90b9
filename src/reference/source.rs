use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value;

use crate::{
    config::ReferenceConfig,
    reference::{
        error::{ReferenceError, decode_error, map_http_status, transport_error},
        types::ServiceIndex,
    },
};

/// Where service authorization reference data comes from.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_index(&self) -> Result<ServiceIndex, ReferenceError>;

    /// The service document exactly as upstream sent it.
    async fn fetch_document(&self, url: &str) -> Result<Value, ReferenceError>;
}

#[derive(Clone)]
pub struct HttpReferenceSource {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl HttpReferenceSource {
    pub fn new(config: &ReferenceConfig) -> Result<Self, ReferenceError> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| transport_error(&config.base_url, err))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_millis(config.timeout_ms.max(1)),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, ReferenceError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .header(header::USER_AGENT, &self.user_agent)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| transport_error(url, err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_status(status.as_u16(), url, &body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| decode_error(url, err))
    }
}

#[async_trait]
impl ReferenceSource for HttpReferenceSource {
    async fn fetch_index(&self) -> Result<ServiceIndex, ReferenceError> {
        tracing::debug!(target: "reference", url = %self.base_url, "fetching_service_index");
        let value = self.get_json(&self.base_url).await?;
        ServiceIndex::from_value(value)
    }

    async fn fetch_document(&self, url: &str) -> Result<Value, ReferenceError> {
        tracing::debug!(target: "reference", url = %url, "fetching_service_document");
        self.get_json(url).await
    }
}
