use crate::config::{AppConfig, SupportingFile, TemplateVariant};
use crate::core::renderer::PageRenderer;
use crate::domain::model::{
    EventKind, FileOutcome, ListingRecord, PipelineResult, PipelineStage, RenderedPage,
    WebhookEvent,
};
use crate::domain::ports::{EventHandler, ListingSource, Publisher, SiteProvisioner, TemplateStore};
use crate::utils::error::{PublisherError, Result};
use crate::utils::slug::slugify;
use async_trait::async_trait;

/// Layout of the published sites, taken from `[publisher]`, `[hosting]` and `[render]`.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub site_namespace: String,
    pub site_root: String,
    pub variants: Vec<TemplateVariant>,
    pub supporting_files: Vec<SupportingFile>,
}

impl PublishSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            site_namespace: config.hosting.namespace.clone(),
            site_root: config.publisher.site_root.clone(),
            variants: config.render.variants.clone(),
            supporting_files: config.publisher.supporting_files.clone(),
        }
    }
}

/// Hosted site name for a city: `<namespace>-<slug(city)>`.
pub fn site_name(namespace: &str, city: &str) -> String {
    format!("{}-{}", namespace, slugify(city))
}

struct FetchedTemplate {
    variant: TemplateVariant,
    text: String,
}

struct FetchedAsset {
    file: SupportingFile,
    content: Vec<u8>,
}

/// Runs one listing event through authenticate → fetch → render → publish → provision.
pub struct WebhookPipeline<L, T, P, S> {
    listings: L,
    templates: T,
    publisher: P,
    sites: S,
    renderer: PageRenderer,
    settings: PublishSettings,
}

impl<L, T, P, S> WebhookPipeline<L, T, P, S>
where
    L: ListingSource,
    T: TemplateStore,
    P: Publisher,
    S: SiteProvisioner,
{
    pub fn new(
        listings: L,
        templates: T,
        publisher: P,
        sites: S,
        renderer: PageRenderer,
        settings: PublishSettings,
    ) -> Self {
        Self {
            listings,
            templates,
            publisher,
            sites,
            renderer,
            settings,
        }
    }

    /// Always returns a structured result; failures are reported in-body.
    pub async fn run(&self, event: &WebhookEvent) -> PipelineResult {
        match event.kind() {
            EventKind::Added | EventKind::Updated => {}
            EventKind::Deleted => {
                tracing::info!(
                    "🗑️ Listing {} deleted upstream, acknowledged without changes",
                    event.estate_id
                );
                return PipelineResult::acknowledged();
            }
            EventKind::Other(name) => {
                tracing::info!("❔ Ignoring unrecognised event '{}'", name);
                return PipelineResult::acknowledged();
            }
        }

        tracing::info!("🚀 Processing {} for listing {}", event.event, event.estate_id);
        let mut stage = PipelineStage::Received;

        match self.process(&event.estate_id, &mut stage).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    "❌ Listing {} failed after stage '{}': {} (Category: {:?})",
                    event.estate_id,
                    stage,
                    e,
                    e.category()
                );
                advance(&mut stage, PipelineStage::Failed, &event.estate_id);
                PipelineResult::failure(e.to_string())
            }
        }
    }

    async fn process(&self, estate_id: &str, stage: &mut PipelineStage) -> Result<PipelineResult> {
        let token = self.listings.authenticate().await?;
        advance(stage, PipelineStage::Authenticated, estate_id);

        let listing = self.listings.fetch_listing(estate_id, &token).await?;
        let templates = self.fetch_templates().await?;
        let assets = self.fetch_supporting_files().await;
        advance(stage, PipelineStage::Fetched, estate_id);

        let pages = self.render_pages(&listing, &templates);
        advance(stage, PipelineStage::Rendered, estate_id);

        let city_slug = slugify(&listing.location.city);
        if city_slug.is_empty() {
            return Err(PublisherError::decode(
                "listing API",
                format!("city '{}' does not produce a usable site name", listing.location.city),
            ));
        }
        let site_dir = format!("{}/{}", self.settings.site_root.trim_end_matches('/'), city_slug);

        let outcomes = self.publish_all(&listing, &site_dir, pages, assets).await;
        advance(stage, PipelineStage::Published, estate_id);

        let name = site_name(&self.settings.site_namespace, &listing.location.city);
        let site = self.sites.ensure_site(&name, &site_dir).await;
        advance(stage, PipelineStage::Provisioned, estate_id);

        tracing::info!(
            "✅ Listing {} ({}) published to {} [{:?}]",
            estate_id,
            listing.reference,
            site.url,
            site.source
        );
        let result = PipelineResult::completed(site.url, listing.reference, outcomes);
        advance(stage, PipelineStage::Completed, estate_id);
        Ok(result)
    }

    /// Primary template first; secondary variants only once the primary is known to exist.
    async fn fetch_templates(&self) -> Result<Vec<FetchedTemplate>> {
        let primary = self
            .settings
            .variants
            .iter()
            .find(|v| v.primary)
            .ok_or_else(|| PublisherError::MissingConfigError {
                field: "render.variants (primary)".to_string(),
            })?;

        let text = self
            .templates
            .fetch_template(&primary.template)
            .await?
            .ok_or_else(|| PublisherError::TemplatesNotFoundError {
                path: primary.template.clone(),
            })?;

        let mut fetched = vec![FetchedTemplate {
            variant: primary.clone(),
            text,
        }];

        for variant in self.settings.variants.iter().filter(|v| !v.primary) {
            match self.templates.fetch_template(&variant.template).await {
                Ok(Some(text)) => fetched.push(FetchedTemplate {
                    variant: variant.clone(),
                    text,
                }),
                Ok(None) => {
                    tracing::debug!("📄 Optional template {} not present", variant.template);
                }
                Err(e) => {
                    tracing::warn!("📄 Skipping optional template {}: {}", variant.template, e);
                }
            }
        }

        Ok(fetched)
    }

    async fn fetch_supporting_files(&self) -> Vec<FetchedAsset> {
        let mut assets = Vec::new();
        for file in &self.settings.supporting_files {
            match self.templates.fetch_asset(&file.source).await {
                Ok(Some(content)) => assets.push(FetchedAsset {
                    file: file.clone(),
                    content,
                }),
                Ok(None) => tracing::debug!("📎 Supporting file {} not present", file.source),
                Err(e) => tracing::warn!("📎 Skipping supporting file {}: {}", file.source, e),
            }
        }
        assets
    }

    fn render_pages(&self, listing: &ListingRecord, templates: &[FetchedTemplate]) -> Vec<RenderedPage> {
        templates
            .iter()
            .map(|t| RenderedPage {
                locale: t.variant.locale,
                path: t.variant.output.clone(),
                content: self.renderer.render(&t.text, listing, t.variant.locale),
            })
            .collect()
    }

    /// Every file is an independent upsert; a failure is recorded and the rest still run.
    async fn publish_all(
        &self,
        listing: &ListingRecord,
        site_dir: &str,
        pages: Vec<RenderedPage>,
        assets: Vec<FetchedAsset>,
    ) -> Vec<FileOutcome> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
        let mut outcomes = Vec::with_capacity(pages.len() + assets.len());

        for page in pages {
            let path = format!("{}/{}", site_dir, page.path);
            let message = format!(
                "{}: publish {} page ({})",
                listing.reference, page.locale, timestamp
            );
            outcomes.push(self.publish_one(path, page.content.as_bytes(), &message).await);
        }

        for asset in assets {
            let path = format!("{}/{}", site_dir, asset.file.target);
            let message = format!(
                "{}: sync {} ({})",
                listing.reference, asset.file.target, timestamp
            );
            outcomes.push(self.publish_one(path, &asset.content, &message).await);
        }

        outcomes
    }

    async fn publish_one(&self, path: String, content: &[u8], message: &str) -> FileOutcome {
        match self.publisher.publish(&path, content, message).await {
            Ok(revision) => FileOutcome::Published { path, revision },
            Err(e) => {
                tracing::warn!("⚠️ Publishing {} failed: {}", path, e);
                FileOutcome::Failed {
                    path,
                    error: e.to_string(),
                }
            }
        }
    }
}

fn advance(stage: &mut PipelineStage, next: PipelineStage, estate_id: &str) {
    tracing::debug!("🔄 Listing {}: {} → {}", estate_id, stage, next);
    *stage = next;
}

#[async_trait]
impl<L, T, P, S> EventHandler for WebhookPipeline<L, T, P, S>
where
    L: ListingSource,
    T: TemplateStore,
    P: Publisher,
    S: SiteProvisioner,
{
    async fn handle(&self, event: &WebhookEvent) -> PipelineResult {
        self.run(event).await
    }
}
