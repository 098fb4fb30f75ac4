//! Organization data source implementation

use crate::data_sources::{computed, read_error};
use crate::models;
use crate::resources::{missing_attribute, not_configured, organization::write_state};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

#[derive(Default)]
pub struct OrganizationDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl OrganizationDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for OrganizationDataSource {
    fn type_name(&self) -> &str {
        "tfe_organization"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Reads an organization's settings")
            .attribute(computed("id", AttributeType::String, "The organization name"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Organization name. Defaults to the provider organization")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(computed("email", AttributeType::String, "Admin email address"))
            .attribute(computed(
                "session_timeout_minutes",
                AttributeType::Number,
                "Session idle timeout",
            ))
            .attribute(computed(
                "session_remember_minutes",
                AttributeType::Number,
                "Session expiration",
            ))
            .attribute(computed(
                "collaborator_auth_policy",
                AttributeType::String,
                "Authentication policy for members",
            ))
            .attribute(computed(
                "cost_estimation_enabled",
                AttributeType::Bool,
                "Whether cost estimation runs",
            ))
            .attribute(computed(
                "assessments_enforced",
                AttributeType::Bool,
                "Whether health assessments are enforced on every workspace",
            ))
            .attribute(computed(
                "allow_force_delete_workspaces",
                AttributeType::Bool,
                "Whether admins may delete workspaces that still manage resources",
            ))
            .attribute(computed("external_id", AttributeType::String, "External organization ID"))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => return ReadDataSourceResponse::error(not_configured()),
        };

        let explicit = models::non_empty_string(&request.config, "name");
        let name = match provider_data.organization_or(explicit) {
            Some(name) => name,
            None => return ReadDataSourceResponse::error(missing_attribute("name")),
        };

        match provider_data.client.organizations().read(&name).await {
            Ok(organization) => {
                let mut state = request.config;
                write_state(&mut state, &organization);
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("reading organization", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for OrganizationDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match crate::TfeProviderData::from_provider_data(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use tfplug::types::{ClientCapabilities, DynamicValue};

    #[tokio::test]
    async fn reads_the_provider_organization_by_default() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/organizations/acme")
            .with_body(
                r#"{"data":{"id":"acme","type":"organizations","attributes":{
                "name":"acme","email":"ops@acme.test","session-timeout":20160,
                "collaborator-auth-policy":"password","cost-estimation-enabled":true,
                "external-id":"org-123"}}}"#,
            )
            .create_async()
            .await;

        let mut data_source = OrganizationDataSource::new();
        data_source.provider_data = Some(crate::TfeProviderData::new(
            test_client(&server.url()),
            Some("acme".to_string()),
        ));

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "tfe_organization".to_string(),
                    config: DynamicValue::object(),
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(models::optional_string(&response.state, "id").as_deref(), Some("acme"));
        assert_eq!(
            models::optional_string(&response.state, "external_id").as_deref(),
            Some("org-123")
        );
        mock.assert_async().await;
    }
}
