//! Tests for the story server client.
//!
//! These tests use mock servers to verify request shapes and error mapping
//! without a real backend.

use std::time::Duration;
use story_core::{
    MediaFetcher, SigningService, StoryError, StoryId, UserId, ViewBackend, ViewInsert,
};
use story_server_client::{ServerClientError, ServerConfig, StoryServerClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> StoryServerClient {
    let config = ServerConfig::new(server.uri(), "anon-key")
        .with_access_token("user-token")
        .with_media_bucket("stories")
        .with_signed_url_ttl(Duration::from_secs(600));
    StoryServerClient::new(config).expect("valid config")
}

// =============================================================================
// Server Config Tests
// =============================================================================

mod server_config {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new("https://example.com", "key");
        assert_eq!(config.url, "https://example.com");
        assert_eq!(config.api_key, "key");
        assert!(config.access_token.is_none());
        assert_eq!(config.media_bucket, "stories");
        assert_eq!(config.signed_url_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_url_without_scheme_rejected() {
        let result = StoryServerClient::new(ServerConfig::new("example.com", "key"));
        match result {
            Err(ServerClientError::InvalidUrl(msg)) => {
                assert!(msg.contains("http://") || msg.contains("https://"));
            }
            _ => panic!("Expected InvalidUrl error"),
        }
    }
}

// =============================================================================
// Signing Tests
// =============================================================================

mod signing {
    use super::*;

    #[tokio::test]
    async fn test_sign_joins_relative_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/storage/v1/object/sign/stories/u1/s1.jpg"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer user-token"))
            .and(body_json(serde_json::json!({ "expiresIn": 600 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "signedURL": "/object/sign/stories/u1/s1.jpg?token=abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let signed = client_for(&server).signing().sign("u1/s1.jpg").await.unwrap();

        assert_eq!(
            signed.url,
            format!("{}/storage/v1/object/sign/stories/u1/s1.jpg?token=abc", server.uri())
        );
        assert!(signed.expires_at.is_some());
    }

    #[tokio::test]
    async fn test_sign_falls_back_to_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("authorization", "Bearer anon-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "signedURL": "/object/sign/stories/a.jpg?token=t"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StoryServerClient::new(ServerConfig::new(server.uri(), "anon-key")).unwrap();
        assert!(client.signing().sign("a.jpg").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_object_is_signing_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Object not found"))
            .mount(&server)
            .await;

        let result = client_for(&server).signing().sign("u1/missing.jpg").await;
        match result {
            Err(StoryError::Signing(msg)) => assert!(msg.contains("Object not found")),
            other => panic!("Expected signing error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = client_for(&server).signing().sign_object("a.jpg").await;
        assert!(matches!(result, Err(ServerClientError::ParseError(_))));
    }
}

// =============================================================================
// Download Tests
// =============================================================================

mod download {
    use super::*;

    #[tokio::test]
    async fn test_fetch_returns_body_without_credentials() {
        let server = MockServer::start().await;
        let bytes = vec![7u8; 64 * 1024];

        Mock::given(method("GET"))
            .and(path("/storage/v1/object/sign/stories/v1.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/storage/v1/object/sign/stories/v1.mp4?token=t", server.uri());
        let body = client_for(&server).media_fetcher().fetch(&url).await.unwrap();
        assert_eq!(body, bytes);

        let requests = server.received_requests().await.unwrap();
        assert!(!requests[0]
            .headers
            .iter()
            .any(|(name, _)| name.as_str().eq_ignore_ascii_case("authorization")));
    }

    #[tokio::test]
    async fn test_expired_url_is_download_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("expired"))
            .mount(&server)
            .await;

        let url = format!("{}/object/a.jpg", server.uri());
        let result = client_for(&server).media_fetcher().fetch(&url).await;
        assert!(matches!(result, Err(StoryError::Download(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_download_error() {
        let client = StoryServerClient::new(ServerConfig::new("http://127.0.0.1:1", "key")).unwrap();
        let result = client.media_fetcher().fetch("http://127.0.0.1:1/a.jpg").await;
        assert!(matches!(result, Err(StoryError::Download(_))));
    }
}

// =============================================================================
// View Tests
// =============================================================================

mod views {
    use super::*;

    #[tokio::test]
    async fn test_insert_posts_row() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/story_views"))
            .and(header("apikey", "anon-key"))
            .and(body_json(serde_json::json!({
                "viewer_id": "viewer-1",
                "story_id": "story-1"
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .view_backend()
            .insert_view(&UserId::new("viewer-1"), &StoryId::new("story-1"))
            .await
            .unwrap();
        assert_eq!(outcome, ViewInsert::Inserted);
    }

    #[tokio::test]
    async fn test_conflict_is_already_exists() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/story_views"))
            .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .view_backend()
            .insert_view(&UserId::new("viewer-1"), &StoryId::new("story-1"))
            .await
            .unwrap();
        assert_eq!(outcome, ViewInsert::AlreadyExists);
    }

    #[tokio::test]
    async fn test_server_failure_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .view_backend()
            .insert_view(&UserId::new("viewer-1"), &StoryId::new("story-1"))
            .await;
        match result {
            Err(error @ StoryError::ViewRecord(_)) => assert!(!error.is_benign()),
            other => panic!("Expected transient view error, got {:?}", other),
        }
    }
}
