//! Pact contract tests for the Fleet Management Pipeline API
//!
//! These tests define the contract between the Fleet Pipeline Controller and
//! `pipeline.v1.PipelineService`. The real `FleetClient` talks to a Pact mock
//! server, so request shape, auth and error mapping are exercised together.

mod common;

use common::{finalized_pipeline, init_rustls};
use fleet_pipeline_controller::config::FleetClientConfig;
use fleet_pipeline_controller::controller::reconciler::{
    build_upsert_request, classify, Classification,
};
use fleet_pipeline_controller::provider::fleet::FleetClient;
use fleet_pipeline_controller::provider::{PipelineSyncPort, SyncError};
use pact_consumer::prelude::*;
use serde_json::json;

const CONSUMER: &str = "Fleet-Pipeline-Controller";
const PROVIDER: &str = "Fleet-Management-Pipeline-API";
const SERVICE_PATH: &str = "/pipeline.v1.PipelineService";
/// `fleet-user:fleet-token`
const AUTHORIZATION: &str = "Basic ZmxlZXQtdXNlcjpmbGVldC10b2tlbg==";

fn client_for(mock_server: &dyn ValidatingMockServer) -> FleetClient {
    let mut base_url = mock_server.url().to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    let config = FleetClientConfig::new(
        format!("{base_url}{SERVICE_PATH}/"),
        "fleet-user",
        "fleet-token",
    );
    FleetClient::new(&config).expect("Failed to build Fleet Management client")
}

fn upsert_body() -> serde_json::Value {
    let request = build_upsert_request(&finalized_pipeline(1)).expect("valid pipeline");
    serde_json::to_value(request).expect("serializable request")
}

#[tokio::test]
async fn test_upsert_pipeline_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("upsert a pipeline", "", |mut i| {
        i.given("no pipeline named node-metrics exists");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/UpsertPipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(upsert_body());
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "id": "12345",
                "name": "node-metrics",
                "contents": "prometheus.exporter.unix \"default\" { }",
                "matchers": ["env=prod"],
                "enabled": true,
                "configType": "CONFIG_TYPE_ALLOY",
                "source": {
                    "type": "SOURCE_TYPE_KUBERNETES",
                    "namespace": "observability"
                },
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-02T00:00:00Z",
                "revisionId": "7"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    let request = build_upsert_request(&finalized_pipeline(1)).expect("valid pipeline");
    let remote = client
        .upsert_pipeline(&request)
        .await
        .expect("UpsertPipeline should succeed");

    assert_eq!(remote.id, "12345");
    assert_eq!(remote.revision_id.as_deref(), Some("7"));
    assert_eq!(
        remote.created_at.map(|t| t.to_rfc3339()),
        Some("2026-01-01T00:00:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_upsert_pipeline_validation_error_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("upsert a pipeline with invalid contents", "", |mut i| {
        i.given("the pipeline contents do not parse");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/UpsertPipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(upsert_body());
        i.response
            .status(400)
            .header("content-type", "text/plain")
            .body("invalid pipeline contents: unexpected token");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    let request = build_upsert_request(&finalized_pipeline(1)).expect("valid pipeline");
    let error = client
        .upsert_pipeline(&request)
        .await
        .expect_err("UpsertPipeline should be rejected");

    assert_eq!(
        classify(&error),
        Classification::Validation {
            message: "invalid pipeline contents: unexpected token".to_string()
        }
    );
}

#[tokio::test]
async fn test_upsert_pipeline_rate_limited_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("upsert a pipeline while rate limited", "", |mut i| {
        i.given("the stack has exhausted its request budget");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/UpsertPipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(upsert_body());
        i.response.status(429).body("rate limit exceeded");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    let request = build_upsert_request(&finalized_pipeline(1)).expect("valid pipeline");
    let error = client
        .upsert_pipeline(&request)
        .await
        .expect_err("UpsertPipeline should be throttled");

    assert_eq!(error.status(), Some(429));
    assert_eq!(classify(&error), Classification::RateLimited);
}

#[tokio::test]
async fn test_delete_pipeline_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("delete an existing pipeline", "", |mut i| {
        i.given("pipeline 12345 exists");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/DeletePipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(json!({ "id": "12345" }));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    client
        .delete_pipeline("12345")
        .await
        .expect("DeletePipeline should succeed");
}

#[tokio::test]
async fn test_delete_missing_pipeline_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("delete a pipeline that does not exist", "", |mut i| {
        i.given("pipeline 12345 does not exist");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/DeletePipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(json!({ "id": "12345" }));
        i.response.status(404).body("pipeline not found");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    // Already absent counts as deleted
    client
        .delete_pipeline("12345")
        .await
        .expect("DeletePipeline of a missing pipeline should succeed");
}

#[tokio::test]
async fn test_delete_pipeline_server_error_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("delete a pipeline during an outage", "", |mut i| {
        i.given("the pipeline service is unavailable");
        i.request
            .method("POST")
            .path(format!("{SERVICE_PATH}/DeletePipeline"))
            .header("authorization", AUTHORIZATION)
            .header("content-type", "application/json")
            .json_body(json!({ "id": "12345" }));
        i.response.status(503).body("upstream unavailable");
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = client_for(mock_server.as_ref());

    let error = client
        .delete_pipeline("12345")
        .await
        .expect_err("DeletePipeline should fail");

    assert_eq!(
        error,
        SyncError::Api {
            status: 503,
            operation: "DeletePipeline".to_string(),
            message: "upstream unavailable".to_string(),
        }
    );
}
