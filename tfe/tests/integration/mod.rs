//! Provider scenarios driven through the in-process server against a mock API

mod data_source_test;
mod policy_set_test;
mod variable_test;
mod workspace_test;

use tfe::TfeProvider;
use tfplug::context::Context;
use tfplug::provider::ConfigureProviderRequest;
use tfplug::server::{
    ApplyResourceChangeRequest, ApplyResourceChangeResponse, LogLevel,
    PlanResourceChangeRequest, PlanResourceChangeResponse, ProviderServer, ServerConfig,
};
use tfplug::types::{AttributePath, ClientCapabilities, DynamicValue};

pub const ORGANIZATION: &str = "acme";

/// Server configured against `url` with `acme` as the default organization
pub async fn configured_server(url: &str) -> ProviderServer<TfeProvider> {
    let server = tfe::server(&ServerConfig::new().with_log_level(LogLevel::Warn));

    let mut config = DynamicValue::object();
    let _ = config.set_string(&AttributePath::new("hostname"), url.to_string());
    let _ = config.set_string(&AttributePath::new("token"), "test-token".to_string());
    let _ = config.set_string(&AttributePath::new("organization"), ORGANIZATION.to_string());

    let diagnostics = server
        .configure_provider(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(diagnostics.is_empty(), "configure failed: {:?}", diagnostics);
    server
}

pub fn config<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> DynamicValue {
    let mut config = DynamicValue::object();
    for (name, value) in values {
        let _ = config.set_string(&AttributePath::new(name), value.to_string());
    }
    config
}

/// Plans a create of `config` and fails the test on any diagnostic
pub async fn plan_create(
    server: &ProviderServer<TfeProvider>,
    type_name: &str,
    config: &DynamicValue,
) -> PlanResourceChangeResponse {
    let response = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: type_name.to_string(),
                prior_state: DynamicValue::null(),
                proposed_new_state: config.clone(),
                config: config.clone(),
                prior_private: vec![],
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "plan failed: {:?}", response.diagnostics);
    response
}

pub async fn apply(
    server: &ProviderServer<TfeProvider>,
    type_name: &str,
    prior_state: DynamicValue,
    planned_state: DynamicValue,
    config: &DynamicValue,
) -> ApplyResourceChangeResponse {
    server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: type_name.to_string(),
                prior_state,
                planned_state,
                config: config.clone(),
                planned_private: vec![],
            },
        )
        .await
}
