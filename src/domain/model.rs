use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A listing as read from the listing-management API. Only `id`, `reference`
/// and `location.city` are guaranteed; every other field may be absent upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: String,
    pub reference: String,
    pub price: Option<Price>,
    pub location: Location,
    pub areas: Areas,
    pub rooms: Rooms,
    pub energy: EnergyRatings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Areas {
    pub living: Option<f64>,
    pub plot: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rooms {
    pub total: Option<u32>,
    pub bedrooms: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyRatings {
    pub consumption: Option<String>,
    pub emissions: Option<String>,
}

/// Bearer token issued by the listing API's client-credentials exchange.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Option<u64>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Inbound webhook body: `{ "event": "...", "estate_id": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(deserialize_with = "string_or_number")]
    pub estate_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Added,
    Updated,
    Deleted,
    Other(String),
}

impl WebhookEvent {
    pub const ESTATE_ADDED: &'static str = "estate-added";
    pub const ESTATE_UPDATED: &'static str = "estate-updated";
    pub const ESTATE_DELETED: &'static str = "estate-deleted";

    pub fn estate_added(estate_id: impl Into<String>) -> Self {
        Self {
            event: Self::ESTATE_ADDED.to_string(),
            estate_id: estate_id.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self.event.as_str() {
            Self::ESTATE_ADDED => EventKind::Added,
            Self::ESTATE_UPDATED => EventKind::Updated,
            Self::ESTATE_DELETED => EventKind::Deleted,
            other => EventKind::Other(other.to_string()),
        }
    }
}

/// 上游 API 的 id 可能是字串也可能是數字
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Unsigned(n) => n.to_string(),
        StringOrNumber::Signed(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Fr,
    En,
}

impl Locale {
    pub fn thousands_separator(&self) -> &'static str {
        match self {
            Locale::Fr => "\u{a0}",
            Locale::En => ",",
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            Locale::Fr => ',',
            Locale::En => '.',
        }
    }

    /// Substituted for any value the listing does not provide.
    pub fn missing_marker(&self) -> &'static str {
        match self {
            Locale::Fr => "Non communiqué",
            Locale::En => "Not communicated",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Fr => write!(f, "fr"),
            Locale::En => write!(f, "en"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub locale: Locale,
    pub path: String,
    pub content: String,
}

/// Result of one independent repository upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Published { path: String, revision: String },
    Failed { path: String, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteSource {
    /// Found by name on the hosting API; returned unchanged.
    Existing,
    /// Created during this run.
    Created,
    /// Hosting API unavailable or not configured; URL built from the naming convention.
    Derived,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    pub site_id: Option<String>,
    pub source: SiteSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedFile {
    pub path: String,
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// The only value returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub published: Vec<PublishedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<FailedFile>,
}

impl PipelineResult {
    /// Events that are acknowledged without processing.
    pub fn acknowledged() -> Self {
        Self {
            success: true,
            url: None,
            reference: None,
            error: None,
            published: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn completed(url: String, reference: String, outcomes: Vec<FileOutcome>) -> Self {
        let mut published = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Published { path, revision } => {
                    published.push(PublishedFile { path, revision })
                }
                FileOutcome::Failed { path, error } => failed.push(FailedFile { path, error }),
            }
        }

        Self {
            success: true,
            url: Some(url),
            reference: Some(reference),
            error: None,
            published,
            failed,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            reference: None,
            error: Some(error.into()),
            published: Vec::new(),
            failed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Authenticated,
    Fetched,
    Rendered,
    Published,
    Provisioned,
    Completed,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Received => "received",
            PipelineStage::Authenticated => "authenticated",
            PipelineStage::Fetched => "fetched",
            PipelineStage::Rendered => "rendered",
            PipelineStage::Published => "published",
            PipelineStage::Provisioned => "provisioned",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
