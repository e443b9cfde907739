use crate::config::HostingConfig;
use crate::domain::model::{SiteInfo, SiteSource};
use crate::domain::ports::SiteProvisioner;
use crate::utils::error::{PublisherError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "hosting API";

#[derive(Debug, Deserialize)]
struct RawSite {
    id: Option<String>,
    name: String,
    ssl_url: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateSiteRequest<'a> {
    name: &'a str,
    repo: RepoBinding<'a>,
}

#[derive(Debug, Serialize)]
struct RepoBinding<'a> {
    provider: &'a str,
    repo: String,
    branch: &'a str,
    dir: &'a str,
}

/// Repository the hosted sites are built from.
#[derive(Debug, Clone)]
pub struct SiteRepository {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

/// Create-only site provisioning against a Netlify-style hosting API.
pub struct HostingClient {
    client: Client,
    config: HostingConfig,
    token: Option<String>,
    repository: SiteRepository,
}

impl HostingClient {
    pub fn new(
        client: Client,
        config: HostingConfig,
        token: Option<String>,
        repository: SiteRepository,
    ) -> Self {
        Self {
            client,
            config,
            token,
            repository,
        }
    }

    /// URL implied by the naming convention, used when the hosting API cannot answer.
    pub fn derived_url(&self, name: &str) -> String {
        format!("https://{}.{}", name, self.config.domain.trim_matches('.'))
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base.trim_end_matches('/'), path)
    }

    async fn find_site(&self, token: &str, name: &str) -> Result<Option<SiteInfo>> {
        let response = self
            .client
            .get(self.api_url("sites"))
            .bearer_auth(token)
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublisherError::remote(
                SERVICE,
                format!("site lookup returned {}", status),
            ));
        }

        let sites: Vec<RawSite> = response
            .json()
            .await
            .map_err(|e| PublisherError::decode(SERVICE, e.to_string()))?;

        // name 篩選是前綴比對，必須再做精確比對
        Ok(sites
            .into_iter()
            .find(|site| site.name == name)
            .map(|site| self.site_info(site, SiteSource::Existing)))
    }

    async fn create_site(&self, token: &str, name: &str, source_path: &str) -> Result<SiteInfo> {
        let request = CreateSiteRequest {
            name,
            repo: RepoBinding {
                provider: &self.config.repo_provider,
                repo: format!("{}/{}", self.repository.owner, self.repository.repo),
                branch: &self.repository.branch,
                dir: source_path,
            },
        };

        let response = self
            .client
            .post(self.api_url("sites"))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublisherError::remote(
                SERVICE,
                format!("site creation returned {}", status),
            ));
        }

        let site: RawSite = response
            .json()
            .await
            .map_err(|e| PublisherError::decode(SERVICE, e.to_string()))?;
        Ok(self.site_info(site, SiteSource::Created))
    }

    fn site_info(&self, site: RawSite, source: SiteSource) -> SiteInfo {
        let url = site
            .ssl_url
            .or(site.url)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.derived_url(&site.name));
        SiteInfo {
            name: site.name,
            url,
            site_id: site.id,
            source,
        }
    }

    fn derived(&self, name: &str) -> SiteInfo {
        SiteInfo {
            name: name.to_string(),
            url: self.derived_url(name),
            site_id: None,
            source: SiteSource::Derived,
        }
    }
}

#[async_trait]
impl SiteProvisioner for HostingClient {
    async fn ensure_site(&self, name: &str, source_path: &str) -> SiteInfo {
        let Some(token) = self.token.as_deref() else {
            tracing::warn!("🌐 No hosting token configured, using derived URL for {}", name);
            return self.derived(name);
        };

        match self.find_site(token, name).await {
            Ok(Some(site)) => {
                tracing::info!("🌐 Site {} already exists: {}", name, site.url);
                return site;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("🌐 Site lookup for {} failed: {}", name, e);
                return self.derived(name);
            }
        }

        match self.create_site(token, name, source_path).await {
            Ok(site) => {
                tracing::info!("🌐 Created site {} from {}: {}", name, source_path, site.url);
                site
            }
            Err(e) => {
                tracing::warn!("🌐 Site creation for {} failed: {}", name, e);
                self.derived(name)
            }
        }
    }
}
