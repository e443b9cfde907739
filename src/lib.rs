pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use app::{build_pipeline, LivePipeline};
pub use config::AppConfig;
pub use core::{renderer::PageRenderer, webhook_pipeline::WebhookPipeline};
pub use domain::model::{PipelineResult, WebhookEvent};
pub use utils::error::{PublisherError, Result};
