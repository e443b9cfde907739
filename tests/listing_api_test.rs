use estate_publisher::adapters::ListingApiClient;
use estate_publisher::config::ListingApiConfig;
use estate_publisher::domain::model::AccessToken;
use estate_publisher::domain::ports::ListingSource;
use estate_publisher::PublisherError;
use httpmock::prelude::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

fn listing_config(server: &MockServer, token_cache: bool) -> ListingApiConfig {
    ListingApiConfig {
        token_url: server.url("/oauth/token"),
        base_url: server.url("/agencies/42"),
        client_id: "publisher".to_string(),
        client_secret: "s3cret".to_string(),
        media_type: "application/vnd.listing.v1+json".to_string(),
        token_cache,
    }
}

fn token(value: &str) -> AccessToken {
    AccessToken {
        value: value.to_string(),
        expires_in: Some(3600),
    }
}

#[tokio::test]
async fn test_authenticate_uses_client_credentials() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/oauth/token")
                .body_contains("grant_type=client_credentials")
                .body_contains("client_id=publisher")
                .body_contains("client_secret=s3cret");
            then.status(200)
                .json_body(json!({ "access_token": "tok-1", "expires_in": 3600 }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let token = client.authenticate().await.unwrap();

    token_mock.assert_async().await;
    assert_eq!(token.value, "tok-1");
    assert_eq!(token.expires_in, Some(3600));
}

#[tokio::test]
async fn test_rejected_credentials_are_an_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(401).json_body(json!({ "error": "invalid_client" }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, PublisherError::AuthError { .. }));
}

#[tokio::test]
async fn test_token_payload_without_access_token_is_an_auth_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200).json_body(json!({ "token_type": "bearer" }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, PublisherError::AuthError { .. }));
}

#[tokio::test]
async fn test_cached_token_is_reused() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .json_body(json!({ "access_token": "tok-1", "expires_in": 3600 }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, true));
    let first = client.authenticate().await.unwrap();
    let second = client.authenticate().await.unwrap();

    token_mock.assert_hits_async(1).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_every_run_authenticates_without_cache() {
    let server = MockServer::start_async().await;
    let token_mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .json_body(json!({ "access_token": "tok-1", "expires_in": 3600 }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    client.authenticate().await.unwrap();
    client.authenticate().await.unwrap();

    token_mock.assert_hits_async(2).await;
}

#[tokio::test]
async fn test_fetch_listing_maps_payload() {
    let server = MockServer::start_async().await;
    let listing_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/agencies/42/properties/4521")
                .header("authorization", "Bearer tok-1")
                .header("accept", "application/vnd.listing.v1+json");
            then.status(200).json_body(json!({
                "id": 4521,
                "reference": "ICI-4521",
                "price": { "value": 198000, "currency": "EUR" },
                "city": { "name": "Sarlat-la-Canéda", "zipcode": "24200" },
                "latitude": 44.89,
                "longitude": 1.21,
                "area": { "value": 142.5 },
                "plot": { "value": 2300 },
                "rooms": 6,
                "bedrooms": 4,
                "regulations": { "energy_class": "c", "ghg_class": "a" }
            }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let listing = client.fetch_listing("4521", &token("tok-1")).await.unwrap();

    listing_mock.assert_async().await;
    assert_eq!(listing.id, "4521");
    assert_eq!(listing.reference, "ICI-4521");
    assert_eq!(listing.price.as_ref().map(|p| p.amount), Some(198_000));
    assert_eq!(listing.location.city, "Sarlat-la-Canéda");
    assert_eq!(listing.location.postal_code.as_deref(), Some("24200"));
    assert_eq!(listing.areas.living, Some(142.5));
    assert_eq!(listing.areas.plot, Some(2300.0));
    assert_eq!(listing.rooms.total, Some(6));
    assert_eq!(listing.rooms.bedrooms, Some(4));
    assert_eq!(listing.energy.consumption.as_deref(), Some("C"));
    assert_eq!(listing.energy.emissions.as_deref(), Some("A"));
}

#[tokio::test]
async fn test_unknown_listing_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agencies/42/properties/999");
            then.status(404);
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client.fetch_listing("999", &token("tok-1")).await.unwrap_err();

    assert!(matches!(err, PublisherError::NotFoundError { ref id } if id == "999"));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_server_error_is_a_remote_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agencies/42/properties/4521");
            then.status(503);
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client.fetch_listing("4521", &token("tok-1")).await.unwrap_err();

    assert!(matches!(err, PublisherError::RemoteError { .. }));
}

#[tokio::test]
async fn test_malformed_listing_is_a_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agencies/42/properties/4521");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client.fetch_listing("4521", &token("tok-1")).await.unwrap_err();

    assert!(matches!(err, PublisherError::DecodeError { .. }));
}

#[tokio::test]
async fn test_listing_id_is_encoded_as_one_path_segment() {
    let server = MockServer::start_async().await;
    let escaped = server
        .mock_async(|when, then| {
            when.path("/agencies/admin/secrets");
            then.status(200).json_body(json!({ "id": "leak", "city": { "name": "Nowhere" } }));
        })
        .await;
    let listing_lookup = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/agencies/42/properties/");
            then.status(404);
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    let err = client
        .fetch_listing("../../admin/secrets", &token("tok-1"))
        .await
        .unwrap_err();

    escaped.assert_hits_async(0).await;
    listing_lookup.assert_hits_async(1).await;
    assert!(matches!(err, PublisherError::NotFoundError { .. }));
}

#[tokio::test]
async fn test_dot_segment_ids_never_reach_the_api() {
    let server = MockServer::start_async().await;
    let any_call = server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).json_body(json!({ "id": "42", "city": { "name": "Nowhere" } }));
        })
        .await;

    let client = ListingApiClient::new(Client::new(), listing_config(&server, false));
    for id in ["..", ".", " "] {
        let err = client.fetch_listing(id, &token("tok-1")).await.unwrap_err();
        assert!(matches!(err, PublisherError::NotFoundError { .. }));
    }

    any_call.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_listing_timeout_is_a_remote_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/agencies/42/properties/4521");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "id": "4521", "city": { "name": "Bergerac" } }));
        })
        .await;

    let client = Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = ListingApiClient::new(client, listing_config(&server, false));
    let err = client.fetch_listing("4521", &token("tok-1")).await.unwrap_err();

    assert!(matches!(err, PublisherError::RemoteError { .. }));
}

#[tokio::test]
async fn test_token_endpoint_timeout_is_a_remote_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/oauth/token");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(json!({ "access_token": "tok-1", "expires_in": 3600 }));
        })
        .await;

    let client = Client::builder()
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let client = ListingApiClient::new(client, listing_config(&server, false));
    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, PublisherError::RemoteError { .. }));
}
