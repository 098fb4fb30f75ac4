//! Variables in workspaces and variable sets, including stored state upgrades

use super::{apply, config, configured_server, plan_create};
use mockito::{Matcher, Server};
use serde_json::json;
use tfe::TfeProvider;
use tfplug::context::Context;
use tfplug::resource::{UpgradeResourceStateRequest, ValidateResourceConfigRequest};
use tfplug::server::ProviderServer;
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue, RawState};

fn upgrade_request(raw: &[u8]) -> UpgradeResourceStateRequest {
    UpgradeResourceStateRequest {
        type_name: "tfe_variable".to_string(),
        version: 0,
        raw_state: RawState::from_json(raw.to_vec()),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn sensitive_variable_set_variable_keeps_its_value() {
    let mut mock_server = Server::new_async().await;
    let create = mock_server
        .mock("POST", "/api/v2/varsets/varset-1/relationships/vars")
        .match_body(Matcher::PartialJson(json!({
            "data": {"type": "vars", "attributes": {
                "key": "AWS_SECRET_ACCESS_KEY", "value": "s3cret",
                "category": "env", "sensitive": true
            }}
        })))
        .with_status(201)
        .with_body(
            r#"{"data":{"id":"var-9","type":"vars","attributes":{
                "key":"AWS_SECRET_ACCESS_KEY","value":null,"category":"env",
                "hcl":false,"sensitive":true,"description":""}}}"#,
        )
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let mut config = config([
        ("key", "AWS_SECRET_ACCESS_KEY"),
        ("value", "s3cret"),
        ("category", "env"),
        ("variable_set_id", "varset-1"),
    ]);
    let _ = config.set_bool(&AttributePath::new("sensitive"), true);

    let plan = plan_create(&server, "tfe_variable", &config).await;
    assert_eq!(
        plan.planned_state.get_value(&AttributePath::new("readable_value")),
        Some(&Dynamic::Null)
    );

    let applied = apply(
        &server,
        "tfe_variable",
        DynamicValue::null(),
        plan.planned_state,
        &config,
    )
    .await;
    assert!(applied.diagnostics.is_empty(), "{:?}", applied.diagnostics);

    let state = applied.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "var-9");
    assert_eq!(state.get_string(&AttributePath::new("value")).unwrap(), "s3cret");
    assert_eq!(
        state.get_string(&AttributePath::new("variable_set_id")).unwrap(),
        "varset-1"
    );
    assert_eq!(
        state.get_value(&AttributePath::new("workspace_id")),
        Some(&Dynamic::Null)
    );
    create.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn variable_needs_exactly_one_container() {
    let mock_server = Server::new_async().await;
    let server = configured_server(&mock_server.url()).await;

    let both = config([
        ("key", "region"),
        ("category", "terraform"),
        ("workspace_id", "ws-1"),
        ("variable_set_id", "varset-1"),
    ]);
    let response = server
        .validate_resource_config(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "tfe_variable".to_string(),
                config: both,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Invalid attribute combination");

    let bad_category = config([
        ("key", "region"),
        ("category", "secret"),
        ("workspace_id", "ws-1"),
    ]);
    let response = server
        .validate_resource_config(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "tfe_variable".to_string(),
                config: bad_category,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(!response.diagnostics.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_workspace_name_is_resolved_on_upgrade() {
    let mut mock_server = Server::new_async().await;
    let lookup = mock_server
        .mock("GET", "/api/v2/organizations/acme/workspaces/app")
        .with_body(
            r#"{"data":{"id":"ws-123","type":"workspaces","attributes":{"name":"app"}}}"#,
        )
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let response = server
        .upgrade_resource_state(
            Context::new(),
            upgrade_request(
                br#"{"id":"var-1","key":"region","value":"eu-west-1","category":"terraform",
                    "hcl":false,"sensitive":false,"workspace_id":"acme/app"}"#,
            ),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.upgraded_state;
    assert_eq!(
        state.get_string(&AttributePath::new("workspace_id")).unwrap(),
        "ws-123"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("readable_value")).unwrap(),
        "eu-west-1"
    );
    lookup.assert_async().await;
}

#[tokio::test]
async fn upgrade_without_configuration() {
    let server = ProviderServer::new(TfeProvider::new());

    let response = server
        .upgrade_resource_state(
            Context::new(),
            upgrade_request(
                br#"{"id":"var-1","key":"token","value":"x","category":"env",
                    "hcl":false,"sensitive":true,"workspace_id":"ws-1"}"#,
            ),
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .upgraded_state
            .get_value(&AttributePath::new("readable_value")),
        Some(&Dynamic::Null)
    );

    let response = server
        .upgrade_resource_state(
            Context::new(),
            upgrade_request(
                br#"{"id":"var-1","key":"token","value":"x","category":"env",
                    "hcl":false,"sensitive":true,"workspace_id":"acme/app"}"#,
            ),
        )
        .await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}
