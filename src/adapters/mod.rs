// Adapters layer: concrete implementations of the domain ports for remote systems.

pub mod github;
pub mod hosting;
pub mod listing_api;

pub use github::{ContentsClient, GitHubPublisher, GitHubTemplateStore, RemoteFile};
pub use hosting::{HostingClient, SiteRepository};
pub use listing_api::ListingApiClient;
