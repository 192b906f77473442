//! Resource catalog client.

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::{
    domain::resources::{
        errors::ResourceCatalogError,
        models::{Resource, ResourceId, SpaceEnvelope},
    },
    resilience::{ResilienceConfig, Resilient},
};

/// Looks up resources in the venue service over HTTP.
#[derive(Debug)]
pub struct HttpResourceCatalog {
    http: Client,
    base_url: String,
    resilient: Resilient,
}

impl HttpResourceCatalog {
    /// Create a client for the venue service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client can't be built.
    pub fn new(
        base_url: impl Into<String>,
        config: &ResilienceConfig,
    ) -> Result<Self, ResourceCatalogError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            resilient: Resilient::new("resource-catalog", config),
        })
    }

    async fn fetch_resource(&self, resource: ResourceId) -> Result<Resource, ResourceCatalogError> {
        let url = format!("{}/api/v1/spaces/{resource}", self.base_url);

        debug!(%url, "fetching resource");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ResourceCatalogError::NotFound);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            return Err(ResourceCatalogError::UnexpectedResponse {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: SpaceEnvelope = response.json().await?;

        Ok(envelope.data.into())
    }
}

#[async_trait]
impl ResourceCatalog for HttpResourceCatalog {
    async fn get_resource(&self, resource: ResourceId) -> Result<Resource, ResourceCatalogError> {
        self.resilient
            .call(|| self.fetch_resource(resource))
            .await
    }
}

#[automock]
#[async_trait]
pub trait ResourceCatalog: Send + Sync {
    /// Fetch a resource and its hourly price.
    async fn get_resource(&self, resource: ResourceId) -> Result<Resource, ResourceCatalogError>;
}
