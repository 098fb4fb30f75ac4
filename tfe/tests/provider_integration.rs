mod integration;

use tfe::TfeProvider;
use tfplug::context::Context;
use tfplug::server::ProviderServer;

#[tokio::test]
async fn every_type_exposes_a_schema() {
    let server = ProviderServer::new(TfeProvider::new());
    let response = server.get_provider_schema(Context::new()).await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(response.resource_schemas.len(), 18);
    assert_eq!(response.data_source_schemas.len(), 7);

    for (name, schema) in &response.resource_schemas {
        let id = schema
            .attribute("id")
            .unwrap_or_else(|| panic!("{} has no id attribute", name));
        assert!(id.computed, "{} id must be computed", name);
    }
    for name in [
        "tfe_aws_oidc_configuration",
        "tfe_gcp_oidc_configuration",
        "tfe_azure_oidc_configuration",
        "tfe_vault_oidc_configuration",
    ] {
        assert!(response.resource_schemas.contains_key(name), "missing {}", name);
    }

    let token = response.provider.attribute("token").unwrap();
    assert!(token.sensitive);
}

#[tokio::test]
async fn resources_need_a_configured_provider() {
    let server = ProviderServer::new(TfeProvider::new());
    let config = integration::config([("name", "app")]);

    let response = server
        .plan_resource_change(
            Context::new(),
            tfplug::server::PlanResourceChangeRequest {
                type_name: "tfe_workspace".to_string(),
                prior_state: tfplug::types::DynamicValue::null(),
                proposed_new_state: config.clone(),
                config,
                prior_private: vec![],
            },
        )
        .await;

    assert_eq!(response.diagnostics.len(), 1);
}
