use crate::domain::model::{AccessToken, ListingRecord, PipelineResult, SiteInfo, WebhookEvent};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken>;
    async fn fetch_listing(&self, id: &str, token: &AccessToken) -> Result<ListingRecord>;
}

/// Read side of the content repository. `Ok(None)` means the path does not exist.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn fetch_template(&self, path: &str) -> Result<Option<String>>;
    async fn fetch_asset(&self, path: &str) -> Result<Option<Vec<u8>>>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create or update `path`, returning the new revision marker.
    async fn publish(&self, path: &str, content: &[u8], message: &str) -> Result<String>;
}

#[async_trait]
pub trait SiteProvisioner: Send + Sync {
    /// Never fails: falls back to a derived URL when the hosting API cannot be used.
    async fn ensure_site(&self, name: &str, source_path: &str) -> SiteInfo;
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &WebhookEvent) -> PipelineResult;
}
