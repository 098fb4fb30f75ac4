//! Policy set workspace membership is synced by difference on update

use super::{apply, config, configured_server};
use mockito::{Matcher, Server};
use serde_json::json;
use tfplug::context::Context;
use tfplug::resource::ValidateResourceConfigRequest;
use tfplug::server::PlanResourceChangeRequest;
use tfplug::types::{AttributePath, ClientCapabilities, Dynamic, DynamicValue};

fn with_workspaces(mut value: DynamicValue, ids: &[&str]) -> DynamicValue {
    let ids = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>();
    let _ = value.set_value(&AttributePath::new("workspace_ids"), Dynamic::string_list(ids));
    value
}

fn policy_set_state(ids: &[&str]) -> DynamicValue {
    let mut state = config([
        ("id", "polset-1"),
        ("name", "guardrails"),
        ("organization", "acme"),
        ("kind", "sentinel"),
    ]);
    let _ = state.set_bool(&AttributePath::new("global"), false);
    let _ = state.set_bool(&AttributePath::new("overridable"), false);
    let _ = state.set_bool(&AttributePath::new("agent_enabled"), false);
    with_workspaces(state, ids)
}

#[tokio::test(flavor = "multi_thread")]
async fn update_adds_and_removes_only_the_difference() {
    let mut mock_server = Server::new_async().await;
    let patch = mock_server
        .mock("PATCH", "/api/v2/policy-sets/polset-1")
        .with_body(
            r#"{"data":{"id":"polset-1","type":"policy-sets","attributes":{
                "name":"guardrails","kind":"sentinel","global":false,"overridable":false,
                "agent-enabled":false},
                "relationships":{"organization":{"data":{"id":"acme","type":"organizations"}}}}}"#,
        )
        .create_async()
        .await;
    let add = mock_server
        .mock("POST", "/api/v2/policy-sets/polset-1/relationships/workspaces")
        .match_body(Matcher::Json(json!({"data":[{"type":"workspaces","id":"ws-3"}]})))
        .with_status(204)
        .create_async()
        .await;
    let remove = mock_server
        .mock("DELETE", "/api/v2/policy-sets/polset-1/relationships/workspaces")
        .match_body(Matcher::Json(json!({"data":[{"type":"workspaces","id":"ws-1"}]})))
        .with_status(204)
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let prior = policy_set_state(&["ws-1", "ws-2"]);
    let planned = policy_set_state(&["ws-2", "ws-3"]);
    let config = with_workspaces(config([("name", "guardrails")]), &["ws-2", "ws-3"]);

    let applied = apply(&server, "tfe_policy_set", prior, planned, &config).await;
    assert!(applied.diagnostics.is_empty(), "{:?}", applied.diagnostics);
    assert_eq!(
        applied
            .new_state
            .get_list(&AttributePath::new("workspace_ids"))
            .unwrap(),
        vec![Dynamic::from("ws-2"), Dynamic::from("ws-3")]
    );

    patch.assert_async().await;
    add.assert_async().await;
    remove.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_membership_call_keeps_applied_changes() {
    let mut mock_server = Server::new_async().await;
    let _patch = mock_server
        .mock("PATCH", "/api/v2/policy-sets/polset-1")
        .with_body(
            r#"{"data":{"id":"polset-1","type":"policy-sets","attributes":{
                "name":"guardrails-v2","kind":"sentinel","global":false,"overridable":false,
                "agent-enabled":false},
                "relationships":{"organization":{"data":{"id":"acme","type":"organizations"}}}}}"#,
        )
        .create_async()
        .await;
    let _add = mock_server
        .mock("POST", "/api/v2/policy-sets/polset-1/relationships/workspaces")
        .with_status(204)
        .create_async()
        .await;
    let _remove = mock_server
        .mock("DELETE", "/api/v2/policy-sets/polset-1/relationships/workspaces")
        .with_status(422)
        .with_body(r#"{"errors":[{"status":"422","title":"invalid workspace"}]}"#)
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let prior = policy_set_state(&["ws-1", "ws-2"]);
    let mut planned = policy_set_state(&["ws-2", "ws-3"]);
    let _ = planned.set_string(&AttributePath::new("name"), "guardrails-v2".to_string());
    let config = with_workspaces(config([("name", "guardrails-v2")]), &["ws-2", "ws-3"]);

    let applied = apply(&server, "tfe_policy_set", prior, planned, &config).await;
    assert_eq!(applied.diagnostics.len(), 1);
    assert_eq!(applied.diagnostics[0].summary, "Error updating policy set workspaces");

    let state = applied.new_state;
    assert_eq!(state.get_string(&AttributePath::new("name")).unwrap(), "guardrails-v2");
    assert_eq!(
        state.get_list(&AttributePath::new("workspace_ids")).unwrap(),
        vec![Dynamic::from("ws-1"), Dynamic::from("ws-2"), Dynamic::from("ws-3")]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn reordered_workspace_ids_plan_no_change() {
    let mock_server = Server::new_async().await;
    let server = configured_server(&mock_server.url()).await;

    let mut prior = policy_set_state(&["ws-1", "ws-2"]);
    let _ = prior.set_value(&AttributePath::new("description"), Dynamic::Null);
    let _ = prior.set_value(&AttributePath::new("policies_path"), Dynamic::Null);
    let _ = prior.set_string(&AttributePath::new("policy_tool_version"), "0.5.0".to_string());

    let proposed = with_workspaces(prior.clone(), &["ws-2", "ws-1"]);
    let config = with_workspaces(config([("name", "guardrails")]), &["ws-2", "ws-1"]);

    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "tfe_policy_set".to_string(),
                prior_state: prior.clone(),
                proposed_new_state: proposed,
                config,
                prior_private: vec![],
            },
        )
        .await;

    assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
    assert!(plan.requires_replace.is_empty());
    assert_eq!(plan.planned_state, prior);
    assert_eq!(
        plan.planned_state.get_value(&AttributePath::new("overridable")),
        Some(&Dynamic::Bool(false))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn global_policy_set_cannot_list_workspaces() {
    let mock_server = Server::new_async().await;
    let server = configured_server(&mock_server.url()).await;

    let mut config = with_workspaces(config([("name", "guardrails")]), &["ws-1"]);
    let _ = config.set_bool(&AttributePath::new("global"), true);

    let response = server
        .validate_resource_config(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "tfe_policy_set".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(
        response.diagnostics[0].summary,
        "Conflicting configuration arguments"
    );
}
