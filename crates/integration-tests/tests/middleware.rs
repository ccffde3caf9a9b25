mod harness;

use harness::config::ConfigBuilder;
use harness::mock_engine::MockEngine;
use harness::server::TestServer;
use vocalis_config::{CorsConfig, HumanDuration};

#[tokio::test]
async fn cors_allows_any_origin() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _artifacts) = ConfigBuilder::new(&engine.endpoint())
        .with_cors(CorsConfig::default())
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .get(server.url("/voices"))
        .header("origin", "https://reader.example")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn cors_preflight_for_tts() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _artifacts) = ConfigBuilder::new(&engine.endpoint())
        .with_cors(CorsConfig::default())
        .build();
    let server = TestServer::start(&config).await.unwrap();

    let resp = server
        .client()
        .request(reqwest::Method::OPTIONS, server.url("/tts"))
        .header("origin", "https://reader.example")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(engine.calls(), 0);
}

#[tokio::test]
async fn global_limit_applies_across_clients() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _artifacts) = ConfigBuilder::new(&engine.endpoint())
        .with_global_limit(2, HumanDuration::from_secs(60))
        .build();
    let server = TestServer::start(&config).await.unwrap();

    for _ in 0..2 {
        let resp = server.client().get(server.url("/voices")).send().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    let resp = server.client().get(server.url("/voices")).send().await.unwrap();
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key("retry-after"));

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn forwarded_address_is_ignored_without_trusted_hops() {
    let engine = MockEngine::start().await.unwrap();
    let (config, _artifacts) = ConfigBuilder::new(&engine.endpoint()).build();
    let server = TestServer::start(&config).await.unwrap();

    assert_eq!(server.get_as("198.51.100.1", "/tts?text=a").await.status(), 200);

    // A spoofed header does not buy a fresh slot
    assert_eq!(server.get_as("198.51.100.2", "/tts?text=b").await.status(), 429);
}
