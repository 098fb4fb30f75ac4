//! Data source lookups through the server

use super::{config, configured_server};
use mockito::{Matcher, Server};
use std::sync::Arc;
use tfe::TfeProvider;
use tfplug::context::Context;
use tfplug::data_source::ReadDataSourceRequest;
use tfplug::server::ProviderServer;
use tfplug::types::{AttributePath, ClientCapabilities, DynamicValue};

fn read_request(type_name: &str, config: DynamicValue) -> ReadDataSourceRequest {
    ReadDataSourceRequest {
        type_name: type_name.to_string(),
        config,
        provider_meta: None,
        client_capabilities: ClientCapabilities::default(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn organization_defaults_to_the_provider_organization() {
    let mut mock_server = Server::new_async().await;
    let mock = mock_server
        .mock("GET", "/api/v2/organizations/acme")
        .with_body(
            r#"{"data":{"id":"acme","type":"organizations","attributes":{
                "name":"acme","email":"ops@acme.test","collaborator-auth-policy":"two_factor_mandatory"}}}"#,
        )
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let response = server
        .read_data_source(Context::new(), read_request("tfe_organization", DynamicValue::object()))
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .state
            .get_string(&AttributePath::new("collaborator_auth_policy"))
            .unwrap(),
        "two_factor_mandatory"
    );
    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn variable_set_variables_are_listed() {
    let mut mock_server = Server::new_async().await;
    let _mock = mock_server
        .mock("GET", "/api/v2/varsets/varset-1/relationships/vars")
        .match_query(Matcher::Any)
        .with_body(
            r#"{"data":[
                {"id":"var-1","type":"vars","attributes":{"key":"TF_LOG","value":"DEBUG",
                    "category":"env","hcl":false,"sensitive":false}}]}"#,
        )
        .create_async()
        .await;

    let server = configured_server(&mock_server.url()).await;
    let response = server
        .read_data_source(
            Context::new(),
            read_request("tfe_variables", config([("variable_set_id", "varset-1")])),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = response.state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "varset-1");
    assert_eq!(
        state
            .get_string(&AttributePath::new("env").index(0).attribute("name"))
            .unwrap(),
        "TF_LOG"
    );
    assert!(state.get_list(&AttributePath::new("terraform")).unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn lookups_reject_unknown_arguments() {
    let mock_server = Server::new_async().await;
    let server = configured_server(&mock_server.url()).await;

    let response = server
        .read_data_source(
            Context::new(),
            read_request("tfe_project", config([("name", "core"), ("color", "blue")])),
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Unsupported argument");
}

#[tokio::test]
async fn lookups_need_a_configured_provider() {
    let server = ProviderServer::new(TfeProvider::new());
    let response = server
        .read_data_source(
            Context::new(),
            read_request("tfe_workspace", config([("name", "app")])),
        )
        .await;

    assert!(!response.diagnostics.is_empty());
    assert!(response.state.is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_lookups_share_one_server() {
    let mut mock_server = Server::new_async().await;
    let mock = mock_server
        .mock("GET", "/api/v2/organizations/acme")
        .with_body(r#"{"data":{"id":"acme","type":"organizations","attributes":{"name":"acme"}}}"#)
        .expect(5)
        .create_async()
        .await;

    let server = Arc::new(configured_server(&mock_server.url()).await);
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server
                    .read_data_source(
                        Context::new(),
                        read_request("tfe_organization", DynamicValue::object()),
                    )
                    .await
            })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap();
        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert_eq!(response.state.get_string(&AttributePath::new("id")).unwrap(), "acme");
    }
    mock.assert_async().await;
}
