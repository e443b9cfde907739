// Wiring: builds the live pipeline from configuration.

use crate::adapters::{
    ContentsClient, GitHubPublisher, GitHubTemplateStore, HostingClient, ListingApiClient,
    SiteRepository,
};
use crate::config::AppConfig;
use crate::core::renderer::PageRenderer;
use crate::core::webhook_pipeline::{PublishSettings, WebhookPipeline};
use crate::utils::error::Result;
use reqwest::Client;
use std::time::Duration;

pub type LivePipeline =
    WebhookPipeline<ListingApiClient, GitHubTemplateStore, GitHubPublisher, HostingClient>;

/// Shared HTTP client; every outbound call carries the configured timeout.
pub fn build_http_client(config: &AppConfig) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_seconds))
        .user_agent(config.http.user_agent.clone())
        .build()?;
    Ok(client)
}

pub fn build_pipeline(config: &AppConfig) -> Result<LivePipeline> {
    let client = build_http_client(config)?;

    let listings = ListingApiClient::new(client.clone(), config.listing_api.clone());

    let templates = GitHubTemplateStore::new(
        ContentsClient::new(client.clone(), config.template_store.repository.clone()),
        config.template_store.templates_dir.clone(),
    );

    let publisher = GitHubPublisher::new(ContentsClient::new(
        client.clone(),
        config.publisher.repository.clone(),
    ));

    let repository = &config.publisher.repository;
    let sites = HostingClient::new(
        client,
        config.hosting.clone(),
        config.hosting_token().map(str::to_string),
        SiteRepository {
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            branch: repository.branch.clone(),
        },
    );

    let renderer = PageRenderer::new(&config.render.anchors)?;

    tracing::debug!(
        "🔧 Pipeline ready: {} variant(s), {} anchor(s), {} supporting file(s)",
        config.render.variants.len(),
        config.render.anchors.len(),
        config.publisher.supporting_files.len()
    );

    Ok(WebhookPipeline::new(
        listings,
        templates,
        publisher,
        sites,
        renderer,
        PublishSettings::from_config(config),
    ))
}
