pub mod renderer;
pub mod webhook_pipeline;

pub use crate::domain::model::{ListingRecord, PipelineResult, WebhookEvent};
pub use crate::domain::ports::{EventHandler, ListingSource, Publisher, SiteProvisioner, TemplateStore};
pub use crate::utils::error::Result;
pub use renderer::PageRenderer;
pub use webhook_pipeline::{site_name, PublishSettings, WebhookPipeline};
