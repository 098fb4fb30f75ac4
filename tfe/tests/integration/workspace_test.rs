//! Workspace lifecycle through plan, apply, read, import and destroy

use super::{apply, config, configured_server, plan_create};
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::{ImportResourceStateRequest, ReadResourceRequest};
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue};

const WORKSPACE: &str = r#"{"data":{"id":"ws-123","type":"workspaces",
    "attributes":{"name":"app","auto-apply":false,"terraform-version":"1.9.0",
        "working-directory":"","queue-all-runs":true,"speculative-enabled":true,
        "file-triggers-enabled":true,"trigger-prefixes":[],"tag-names":[],
        "allow-destroy-plan":true,"global-remote-state":false,
        "assessments-enabled":false,"resource-count":0},
    "relationships":{
        "organization":{"data":{"id":"acme","type":"organizations"}},
        "project":{"data":{"id":"prj-default","type":"projects"}}}}}"#;

#[tokio::test(flavor = "multi_thread")]
async fn workspace_create_read_and_destroy() {
    let mut mock_server = Server::new_async().await;
    let create = mock_server
        .mock("POST", "/api/v2/organizations/acme/workspaces")
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "data": {"type": "workspaces", "attributes": {"name": "app"}}
        })))
        .with_status(201)
        .with_body(WORKSPACE)
        .create_async()
        .await;
    let read = mock_server
        .mock("GET", "/api/v2/workspaces/ws-123")
        .with_body(WORKSPACE)
        .create_async()
        .await;
    let safe_delete = mock_server
        .mock("POST", "/api/v2/workspaces/ws-123/actions/safe-delete")
        .with_status(204)
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let config = config([("name", "app")]);

    let plan = plan_create(&server, "tfe_workspace", &config).await;
    let planned = plan.planned_state;
    assert_eq!(
        planned.get_string(&AttributePath::new("organization")).unwrap(),
        "acme"
    );
    assert_eq!(
        planned.get_value(&AttributePath::new("id")),
        Some(&Dynamic::Unknown)
    );
    assert!(!planned.get_bool(&AttributePath::new("auto_apply")).unwrap());

    let applied = apply(&server, "tfe_workspace", DynamicValue::null(), planned, &config).await;
    assert!(applied.diagnostics.is_empty(), "{:?}", applied.diagnostics);
    let state = applied.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "ws-123");
    assert_eq!(
        state.get_string(&AttributePath::new("project_id")).unwrap(),
        "prj-default"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("html_url")).unwrap(),
        format!("{}/app/acme/workspaces/app", mock_server.url())
    );
    create.assert_async().await;

    let refreshed = server
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "tfe_workspace".to_string(),
                current_state: state.clone(),
                private: vec![],
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
                current_identity: None,
            },
        )
        .await;
    assert!(refreshed.diagnostics.is_empty());
    assert_eq!(refreshed.new_state.as_ref(), Some(&state));
    read.assert_async().await;

    let destroyed = apply(&server, "tfe_workspace", state, DynamicValue::null(), &config).await;
    assert!(destroyed.diagnostics.is_empty(), "{:?}", destroyed.diagnostics);
    assert!(destroyed.new_state.is_null());
    safe_delete.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_removed_remotely_drops_from_state() {
    let mut mock_server = Server::new_async().await;
    let _gone = mock_server
        .mock("GET", "/api/v2/workspaces/ws-gone")
        .with_status(404)
        .with_body(r#"{"errors":[{"status":"404","title":"not found"}]}"#)
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let response = server
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "tfe_workspace".to_string(),
                current_state: config([("id", "ws-gone"), ("name", "app")]),
                private: vec![],
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
                current_identity: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn workspace_imports_by_organization_and_name() {
    let mut mock_server = Server::new_async().await;
    let _by_name = mock_server
        .mock("GET", "/api/v2/organizations/acme/workspaces/app")
        .with_body(WORKSPACE)
        .create_async()
        .await;
    let _by_id = mock_server
        .mock("GET", "/api/v2/workspaces/ws-123")
        .with_body(WORKSPACE)
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let response = server
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "tfe_workspace".to_string(),
                id: "acme/app".to_string(),
                client_capabilities: ClientCapabilities::default(),
                identity: None,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.imported_resources.len(), 1);
    let state = &response.imported_resources[0].state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "ws-123");
    assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), "app");
    assert!(!state.get_bool(&AttributePath::new("force_delete")).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_import_id_is_rejected() {
    let mock_server = Server::new_async().await;
    let server = configured_server(&mock_server.url()).await;

    let response = server
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "tfe_workspace".to_string(),
                id: "acme/app/extra".to_string(),
                client_capabilities: ClientCapabilities::default(),
                identity: None,
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.imported_resources.is_empty());
}
