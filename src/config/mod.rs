#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command};
pub use toml_config::{
    AppConfig, HostingConfig, HttpConfig, ListingApiConfig, PublisherConfig, RenderConfig,
    RepositoryConfig, ServerConfig, SupportingFile, TemplateStoreConfig, TemplateVariant,
};
