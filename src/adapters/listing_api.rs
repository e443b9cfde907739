use crate::config::ListingApiConfig;
use crate::domain::model::{
    string_or_number, AccessToken, Areas, EnergyRatings, ListingRecord, Location, Price, Rooms,
};
use crate::domain::ports::ListingSource;
use crate::utils::error::{PublisherError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

const SERVICE: &str = "listing API";

// 快取的 token 在到期前 60 秒即視為失效
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;
const MAX_TOKEN_LIFETIME_SECONDS: u64 = 86_400;

/// Client-credentials authentication plus listing lookup against the listing-management API.
pub struct ListingApiClient {
    client: Client,
    config: ListingApiConfig,
    cached_token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    reference: Option<String>,
    price: Option<RawPrice>,
    city: Option<RawCity>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    area: Option<RawArea>,
    plot: Option<RawArea>,
    rooms: Option<u32>,
    bedrooms: Option<u32>,
    regulations: Option<RawRegulations>,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    value: Option<f64>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    name: Option<String>,
    zipcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawArea {
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawRegulations {
    energy_class: Option<String>,
    ghg_class: Option<String>,
}

impl ListingApiClient {
    pub fn new(client: Client, config: ListingApiConfig) -> Self {
        Self {
            client,
            config,
            cached_token: Mutex::new(None),
        }
    }

    async fn request_token(&self) -> Result<AccessToken> {
        tracing::debug!("🔑 Requesting access token from {}", self.config.token_url);

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PublisherError::AuthError {
                message: format!("token endpoint returned {}", status),
            });
        }

        let payload: TokenResponse = response.json().await.map_err(|e| PublisherError::AuthError {
            message: format!("malformed token payload: {}", e),
        })?;

        match payload.access_token.filter(|t| !t.trim().is_empty()) {
            Some(value) => Ok(AccessToken {
                value,
                expires_in: payload.expires_in,
            }),
            None => Err(PublisherError::AuthError {
                message: "token payload has no access_token".to_string(),
            }),
        }
    }

    /// `id` is pushed as a single percent-encoded path segment.
    fn listing_url(&self, id: &str) -> Result<Url> {
        let invalid = |reason: &str| PublisherError::InvalidConfigValueError {
            field: "listing_api.base_url".to_string(),
            value: self.config.base_url.clone(),
            reason: reason.to_string(),
        };

        let mut url = Url::parse(&self.config.base_url).map_err(|e| invalid(&e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot have path segments"))?
            .pop_if_empty()
            .push("properties")
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl ListingSource for ListingApiClient {
    async fn authenticate(&self) -> Result<AccessToken> {
        if !self.config.token_cache {
            return self.request_token().await;
        }

        let mut cached = self.cached_token.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Utc::now() < entry.expires_at {
                tracing::debug!("🔑 Reusing cached access token");
                return Ok(entry.token.clone());
            }
        }

        let token = self.request_token().await?;
        if let Some(expires_in) = token.expires_in {
            let lifetime = expires_in.min(MAX_TOKEN_LIFETIME_SECONDS) as i64;
            *cached = Some(CachedToken {
                token: token.clone(),
                expires_at: Utc::now() + Duration::seconds(lifetime - TOKEN_EXPIRY_MARGIN_SECONDS),
            });
        }
        Ok(token)
    }

    async fn fetch_listing(&self, id: &str, token: &AccessToken) -> Result<ListingRecord> {
        // "." 與 ".." 會被當成路徑跳轉
        if id.trim().is_empty() || id == "." || id == ".." {
            return Err(PublisherError::NotFoundError { id: id.to_string() });
        }

        let url = self.listing_url(id)?;
        tracing::debug!("📡 Fetching listing {} from {}", id, url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&token.value)
            .header(reqwest::header::ACCEPT, &self.config.media_type)
            .send()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PublisherError::NotFoundError { id: id.to_string() });
        }
        if !status.is_success() {
            return Err(PublisherError::remote(
                SERVICE,
                format!("GET {} returned {}", url, status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PublisherError::remote(SERVICE, e.to_string()))?;
        let raw: RawProperty =
            serde_json::from_str(&body).map_err(|e| PublisherError::decode(SERVICE, e.to_string()))?;

        raw.into_record()
    }
}

impl RawProperty {
    fn into_record(self) -> Result<ListingRecord> {
        let city = self.city.unwrap_or(RawCity {
            name: None,
            zipcode: None,
        });
        let city_name = city
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PublisherError::decode(SERVICE, format!("listing {} has no city", self.id)))?;

        let price = self.price.and_then(|p| {
            p.value.filter(|v| *v >= 0.0).map(|value| Price {
                amount: value.round() as u64,
                currency: p.currency.unwrap_or_else(|| "EUR".to_string()),
            })
        });

        let (consumption, emissions) = match self.regulations {
            Some(r) => (r.energy_class, r.ghg_class),
            None => (None, None),
        };

        Ok(ListingRecord {
            reference: self
                .reference
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| self.id.clone()),
            id: self.id,
            price,
            location: Location {
                city: city_name,
                postal_code: city.zipcode,
                latitude: self.latitude,
                longitude: self.longitude,
            },
            areas: Areas {
                living: self.area.and_then(|a| a.value),
                plot: self.plot.and_then(|a| a.value),
            },
            rooms: Rooms {
                total: self.rooms,
                bedrooms: self.bedrooms,
            },
            energy: EnergyRatings {
                consumption: consumption.map(|c| c.trim().to_uppercase()),
                emissions: emissions.map(|c| c.trim().to_uppercase()),
            },
        })
    }
}
