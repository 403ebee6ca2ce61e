// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end tests against a mock flag backend.

use std::sync::Arc;
use std::time::Duration;

use ff_client::{
	AuthInfo, AuthenticationRequest, ClientApi, FfClient, FfClientError, FfConfig, HttpClientApi,
	NetworkChecker, Target,
};
use futures::StreamExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_PREFIX: &str = "/api/1.0";

fn token() -> String {
	let claims = json!({
		"environment": "env-uuid",
		"environmentIdentifier": "prod",
		"clusterIdentifier": "1",
		"accountID": "acct",
	});
	encode(
		&Header::default(),
		&claims,
		&EncodingKey::from_secret(b"backend-secret"),
	)
	.unwrap()
}

fn target() -> Target {
	Target::builder()
		.identifier("ada")
		.name("Ada")
		.attribute("plan", "enterprise")
		.build()
		.unwrap()
}

fn session() -> AuthInfo {
	AuthInfo {
		bearer_token: "token".to_string(),
		api_key: "key".to_string(),
		environment: "env-uuid".to_string(),
		environment_identifier: "prod".to_string(),
		cluster_identifier: "2".to_string(),
		account_id: "acct".to_string(),
		organization: String::new(),
		project: String::new(),
		project_identifier: String::new(),
	}
}

fn base_url(server: &MockServer) -> String {
	format!("{}{API_PREFIX}", server.uri())
}

fn evaluations_path() -> String {
	format!("{API_PREFIX}/client/env/env-uuid/target/ada/evaluations")
}

async fn mount_auth(server: &MockServer) {
	Mock::given(method("POST"))
		.and(path(format!("{API_PREFIX}/client/auth")))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "authToken": token() })))
		.mount(server)
		.await;
}

struct Offline;

impl NetworkChecker for Offline {
	fn is_network_available(&self) -> bool {
		false
	}
}

#[tokio::test]
async fn test_client_seeds_cache_and_applies_stream_delete() {
	let server = MockServer::start().await;
	mount_auth(&server).await;

	// The seed poll and the poll on stream connect see the flag; later polls do not.
	Mock::given(method("GET"))
		.and(path(evaluations_path()))
		.and(query_param("cluster", "1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{ "flag": "dark-mode", "kind": "boolean", "value": "true", "identifier": "true" },
			{ "flag": "banner", "kind": "string", "value": "hello", "identifier": "v1" }
		])))
		.up_to_n_times(2)
		.with_priority(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(evaluations_path()))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
		.mount(&server)
		.await;

	Mock::given(method("GET"))
		.and(path(format!("{API_PREFIX}/stream")))
		.and(header("api-key", "sdk-key"))
		.and(header("accept", "text/event-stream"))
		.respond_with(ResponseTemplate::new(200).set_body_string(
			": heartbeat\ndata: {\"event\":\"delete\",\"domain\":\"flag\",\"identifier\":\"dark-mode\",\"version\":2}\n",
		))
		.mount(&server)
		.await;

	let config = FfConfig::builder()
		.config_url(base_url(&server))
		.analytics_enabled(false)
		.build();
	let client = FfClient::builder()
		.api_key("sdk-key")
		.target(target())
		.config(config)
		.build()
		.unwrap();

	assert!(client.wait_for_initialization(Duration::from_secs(5)).await);
	assert_eq!(client.string_variation("banner", "fallback"), "hello");

	let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
	while client.evaluation("dark-mode").is_some() {
		assert!(tokio::time::Instant::now() < deadline, "stream delete was never applied");
		tokio::time::sleep(Duration::from_millis(20)).await;
	}
	assert!(!client.bool_variation("dark-mode", false));
	// Upserting polls never evict flags that were not removed by the stream.
	assert_eq!(client.string_variation("banner", "fallback"), "hello");

	client.shutdown().await;
}

#[tokio::test]
async fn test_polling_client_posts_usage_on_shutdown() {
	let server = MockServer::start().await;
	mount_auth(&server).await;

	Mock::given(method("GET"))
		.and(path(evaluations_path()))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([
			{ "flag": "dark-mode", "kind": "boolean", "value": "true", "identifier": "true" }
		])))
		.mount(&server)
		.await;

	Mock::given(method("POST"))
		.and(path(format!("{API_PREFIX}/metrics/env-uuid")))
		.and(query_param("cluster", "1"))
		.and(header("harness-accountid", "acct"))
		.and(header("harness-environmentid", "prod"))
		.and(body_partial_json(json!({
			"targetData": [{ "identifier": "ada" }]
		})))
		.respond_with(ResponseTemplate::new(200))
		.expect(1)
		.mount(&server)
		.await;

	let config = FfConfig::builder()
		.config_url(base_url(&server))
		.event_url(base_url(&server))
		.stream_enabled(false)
		.build();
	let client = FfClient::builder()
		.api_key("sdk-key")
		.target(target())
		.config(config)
		.build()
		.unwrap();

	assert!(client.wait_for_initialization(Duration::from_secs(5)).await);
	for _ in 0..3 {
		assert!(client.bool_variation("dark-mode", false));
	}

	client.shutdown().await;

	let requests = server.received_requests().await.unwrap();
	let posted = requests
		.iter()
		.find(|r| r.url.path().ends_with("/metrics/env-uuid"))
		.expect("metrics were not posted");
	let body: serde_json::Value = posted.body_json().unwrap();
	assert_eq!(body["metricsData"][0]["count"], 3);
	assert_eq!(body["metricsData"][0]["metricsType"], "FFMETRICS");
}

#[tokio::test]
async fn test_offline_client_makes_no_requests() {
	let server = MockServer::start().await;
	mount_auth(&server).await;

	let config = FfConfig::builder()
		.config_url(base_url(&server))
		.event_url(base_url(&server))
		.network_checker(Arc::new(Offline))
		.build();
	let client = FfClient::builder()
		.api_key("sdk-key")
		.target(target())
		.config(config)
		.build()
		.unwrap();

	assert!(!client.wait_for_initialization(Duration::from_millis(300)).await);
	assert!(client.bool_variation("dark-mode", true));

	client.shutdown().await;
	assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_api_authenticate_sends_key_and_target() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path(format!("{API_PREFIX}/client/auth")))
		.and(header_exists("harness-sdk-info"))
		.and(body_partial_json(json!({
			"apiKey": "key",
			"target": { "identifier": "ada", "name": "Ada", "attributes": { "plan": "enterprise" } }
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "authToken": "jwt" })))
		.mount(&server)
		.await;

	let api = HttpClientApi::new(&FfConfig::builder().config_url(base_url(&server)).build()).unwrap();
	let token = api
		.authenticate(&AuthenticationRequest::new("key", &target()))
		.await
		.unwrap();
	assert_eq!(token, "jwt");
}

#[tokio::test]
async fn test_http_api_sends_session_headers_and_cluster() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(format!("{}/dark-mode", evaluations_path())))
		.and(query_param("cluster", "2"))
		.and(header("authorization", "Bearer token"))
		.and(header("harness-accountid", "acct"))
		.and(header("harness-environmentid", "prod"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"flag": "dark-mode", "kind": "boolean", "value": "false", "identifier": "false"
		})))
		.mount(&server)
		.await;

	let api = HttpClientApi::new(&FfConfig::builder().config_url(base_url(&server)).build()).unwrap();
	let evaluation = api.get_evaluation(&session(), "dark-mode", "ada").await.unwrap();
	assert_eq!(evaluation.flag, "dark-mode");
	assert_eq!(evaluation.value, "false");
}

#[tokio::test]
async fn test_http_api_maps_server_errors() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(evaluations_path()))
		.respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
		.mount(&server)
		.await;

	let api = HttpClientApi::new(&FfConfig::builder().config_url(base_url(&server)).build()).unwrap();
	let err = api.get_evaluations(&session(), "ada").await.unwrap_err();
	assert!(matches!(
		&err,
		FfClientError::ServerError { status: 503, message } if message == "maintenance"
	));
	assert!(err.is_retryable());
}

#[tokio::test]
async fn test_http_api_stream_yields_lines() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(format!("{API_PREFIX}/stream")))
		.and(query_param("cluster", "2"))
		.and(header("api-key", "key"))
		.and(header("cache-control", "no-cache"))
		.respond_with(ResponseTemplate::new(200).set_body_string(":\nfirst\nsecond\n"))
		.mount(&server)
		.await;

	let api = HttpClientApi::new(&FfConfig::builder().config_url(base_url(&server)).build()).unwrap();
	let lines: Vec<String> = api
		.open_stream(&session())
		.await
		.unwrap()
		.map(|line| line.unwrap())
		.collect()
		.await;
	assert_eq!(lines, vec![":", "first", "second"]);
}

#[tokio::test]
async fn test_http_api_rejected_stream_is_stream_error() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path(format!("{API_PREFIX}/stream")))
		.respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
		.mount(&server)
		.await;

	let api = HttpClientApi::new(&FfConfig::builder().config_url(base_url(&server)).build()).unwrap();
	let result = api.open_stream(&session()).await;
	assert!(matches!(result, Err(FfClientError::Stream(_))));
}

#[tokio::test]
async fn test_http_api_without_event_url_refuses_metrics() {
	let config = FfConfig::builder()
		.event_url("")
		.analytics_enabled(false)
		.build();
	let api = HttpClientApi::new(&config).unwrap();
	let result = api.post_metrics(&session(), &ff_client::Metrics::default()).await;
	assert!(matches!(result, Err(FfClientError::Config(_))));
}
