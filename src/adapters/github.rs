use crate::config::RepositoryConfig;
use crate::domain::ports::{Publisher, TemplateStore};
use crate::utils::error::{PublisherError, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

const SERVICE: &str = "content repository";

/// A file as stored in the repository: decoded bytes plus its revision marker (blob SHA).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub sha: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    content: Option<String>,
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: PutContentsFile,
}

#[derive(Debug, Deserialize)]
struct PutContentsFile {
    sha: String,
}

/// Thin client over a GitHub-compatible `/repos/{owner}/{repo}/contents/{path}` API.
#[derive(Clone)]
pub struct ContentsClient {
    client: Client,
    config: RepositoryConfig,
}

impl ContentsClient {
    pub fn new(client: Client, config: RepositoryConfig) -> Self {
        Self { client, config }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    /// `Ok(None)` when the path does not exist on the configured branch.
    pub async fn get_file(&self, path: &str) -> Result<Option<RemoteFile>> {
        let url = self.contents_url(path);
        tracing::debug!("📂 GET {} (ref {})", url, self.config.branch);

        let response = self
            .authorized(self.client.get(&url))
            .query(&[("ref", self.config.branch.as_str())])
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(PublisherError::remote(
                SERVICE,
                format!("GET {} returned {}", path, status),
            ));
        }

        let body: ContentsResponse = response
            .json()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, format!("unreadable entry for {}: {}", path, e)))?;

        if let Some(encoding) = body.encoding.as_deref() {
            if encoding != "base64" {
                return Err(PublisherError::remote(
                    SERVICE,
                    format!("unsupported encoding '{}' for {}", encoding, path),
                ));
            }
        }

        // GitHub 會在 base64 內容中插入換行
        let encoded: String = body
            .content
            .unwrap_or_default()
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let content = STANDARD
            .decode(encoded)
            .map_err(|e| PublisherError::remote(SERVICE, format!("invalid base64 for {}: {}", path, e)))?;

        Ok(Some(RemoteFile {
            sha: body.sha,
            content,
        }))
    }

    /// Create (`sha = None`) or update a file; returns the new revision marker.
    pub async fn put_file(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        sha: Option<&str>,
    ) -> Result<String> {
        let url = self.contents_url(path);
        tracing::debug!(
            "📝 PUT {} ({})",
            url,
            if sha.is_some() { "update" } else { "create" }
        );

        let request = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            branch: &self.config.branch,
            sha,
        };

        let response = self
            .authorized(self.client.put(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            return Err(PublisherError::ConflictError {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PublisherError::remote(
                SERVICE,
                format!("PUT {} returned {}", path, status),
            ));
        }

        let body: PutContentsResponse = response
            .json()
            .await
            .map_err(|e| PublisherError::decode(SERVICE, e.to_string()))?;
        Ok(body.content.sha)
    }
}

/// Template documents and supporting assets, addressed relative to a templates directory.
pub struct GitHubTemplateStore {
    contents: ContentsClient,
    templates_dir: String,
}

impl GitHubTemplateStore {
    pub fn new(contents: ContentsClient, templates_dir: impl Into<String>) -> Self {
        Self {
            contents,
            templates_dir: templates_dir.into(),
        }
    }

    fn full_path(&self, path: &str) -> String {
        let dir = self.templates_dir.trim_matches('/');
        if dir.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", dir, path.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl TemplateStore for GitHubTemplateStore {
    async fn fetch_template(&self, path: &str) -> Result<Option<String>> {
        let full_path = self.full_path(path);
        match self.contents.get_file(&full_path).await? {
            Some(file) => String::from_utf8(file.content).map(Some).map_err(|e| {
                PublisherError::remote(SERVICE, format!("{} is not valid UTF-8: {}", full_path, e))
            }),
            None => Ok(None),
        }
    }

    async fn fetch_asset(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let full_path = self.full_path(path);
        Ok(self
            .contents
            .get_file(&full_path)
            .await?
            .map(|file| file.content))
    }
}

/// Upserts files: read the current SHA, then write with it so the store rejects lost updates.
pub struct GitHubPublisher {
    contents: ContentsClient,
}

impl GitHubPublisher {
    pub fn new(contents: ContentsClient) -> Self {
        Self { contents }
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    async fn publish(&self, path: &str, content: &[u8], message: &str) -> Result<String> {
        let current = self.contents.get_file(path).await?;
        if let Some(file) = current.as_ref().filter(|file| file.content == content) {
            tracing::info!("📝 {} unchanged ({})", path, file.sha);
            return Ok(file.sha.clone());
        }
        let sha = current.as_ref().map(|file| file.sha.as_str());

        let revision = self.contents.put_file(path, content, message, sha).await?;
        tracing::info!(
            "📝 {} {} ({})",
            if sha.is_some() { "Updated" } else { "Created" },
            path,
            revision
        );
        Ok(revision)
    }
}
