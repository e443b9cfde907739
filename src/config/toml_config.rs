use crate::core::renderer::Anchor;
use crate::domain::model::Locale;
use crate::utils::error::{PublisherError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    pub listing_api: ListingApiConfig,
    pub template_store: TemplateStoreConfig,
    pub publisher: PublisherConfig,
    pub hosting: HostingConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingApiConfig {
    pub token_url: String,
    /// Listing resources live under `{base_url}/properties/{id}`.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default)]
    pub token_cache: bool,
}

/// GitHub-compatible contents API coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_github_api")]
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStoreConfig {
    #[serde(flatten)]
    pub repository: RepositoryConfig,
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(flatten)]
    pub repository: RepositoryConfig,
    #[serde(default = "default_site_root")]
    pub site_root: String,
    #[serde(default)]
    pub supporting_files: Vec<SupportingFile>,
}

/// A file copied verbatim from the template store into every published site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportingFile {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    #[serde(default = "default_hosting_api")]
    pub api_base: String,
    pub token: Option<String>,
    pub namespace: String,
    #[serde(default = "default_hosting_domain")]
    pub domain: String,
    #[serde(default = "default_repo_provider")]
    pub repo_provider: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_variants")]
    pub variants: Vec<TemplateVariant>,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            anchors: Vec::new(),
        }
    }
}

/// One language variant of the site: which template to render and where to publish it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateVariant {
    pub locale: Locale,
    pub template: String,
    pub output: String,
    #[serde(default)]
    pub primary: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_seconds() -> u64 {
    20
}

fn default_user_agent() -> String {
    format!("estate-publisher/{}", env!("CARGO_PKG_VERSION"))
}

fn default_media_type() -> String {
    "application/vnd.listing.v1+json".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

fn default_site_root() -> String {
    "sites".to_string()
}

fn default_hosting_api() -> String {
    "https://api.netlify.com/api/v1".to_string()
}

fn default_hosting_domain() -> String {
    "netlify.app".to_string()
}

fn default_repo_provider() -> String {
    "github".to_string()
}

fn default_variants() -> Vec<TemplateVariant> {
    vec![
        TemplateVariant {
            locale: Locale::Fr,
            template: "index.html".to_string(),
            output: "index.html".to_string(),
            primary: true,
        },
        TemplateVariant {
            locale: Locale::En,
            template: "index_en.html".to_string(),
            output: "en/index.html".to_string(),
            primary: false,
        },
    ]
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PublisherError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PublisherError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GITHUB_TOKEN})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PublisherError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 主要語系的模板（必須存在）
    pub fn primary_variant(&self) -> Option<&TemplateVariant> {
        self.render.variants.iter().find(|v| v.primary)
    }

    /// Hosting token, ignoring empty values and unresolved `${VAR}` placeholders.
    pub fn hosting_token(&self) -> Option<&str> {
        self.hosting
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains("${"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 120)?;

        validation::validate_url("listing_api.token_url", &self.listing_api.token_url)?;
        validation::validate_url("listing_api.base_url", &self.listing_api.base_url)?;
        validation::validate_non_empty_string("listing_api.client_id", &self.listing_api.client_id)?;
        validation::validate_non_empty_string(
            "listing_api.client_secret",
            &self.listing_api.client_secret,
        )?;

        validate_repository("template_store", &self.template_store.repository)?;
        validation::validate_repo_path(
            "template_store.templates_dir",
            &self.template_store.templates_dir,
        )?;

        validate_repository("publisher", &self.publisher.repository)?;
        validation::validate_repo_path("publisher.site_root", &self.publisher.site_root)?;
        for file in &self.publisher.supporting_files {
            validation::validate_repo_path("publisher.supporting_files.source", &file.source)?;
            validation::validate_repo_path("publisher.supporting_files.target", &file.target)?;
        }

        validation::validate_url("hosting.api_base", &self.hosting.api_base)?;
        validation::validate_dns_label("hosting.namespace", &self.hosting.namespace)?;
        validation::validate_non_empty_string("hosting.domain", &self.hosting.domain)?;

        // 必須恰好有一個主要語系
        let primaries = self.render.variants.iter().filter(|v| v.primary).count();
        if primaries != 1 {
            return Err(PublisherError::InvalidConfigValueError {
                field: "render.variants".to_string(),
                value: primaries.to_string(),
                reason: "Exactly one variant must be marked primary".to_string(),
            });
        }
        for variant in &self.render.variants {
            validation::validate_repo_path("render.variants.template", &variant.template)?;
            validation::validate_repo_path("render.variants.output", &variant.output)?;
        }

        for anchor in &self.render.anchors {
            validation::validate_non_empty_string("render.anchors.literal", &anchor.literal)?;
        }

        Ok(())
    }
}

fn validate_repository(section: &str, repository: &RepositoryConfig) -> Result<()> {
    validation::validate_url(&format!("{}.api_base", section), &repository.api_base)?;
    validation::validate_non_empty_string(&format!("{}.owner", section), &repository.owner)?;
    validation::validate_non_empty_string(&format!("{}.repo", section), &repository.repo)?;
    validation::validate_non_empty_string(&format!("{}.branch", section), &repository.branch)?;
    validation::validate_non_empty_string(&format!("{}.token", section), &repository.token)?;
    Ok(())
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
