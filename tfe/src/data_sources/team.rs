//! Team data source implementation

use crate::data_sources::{computed, lookup_key, name_attribute, organization_attribute, read_error};
use crate::resources::not_configured;
use crate::resources::team::{organization_access_type, write_state};
use crate::models;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeType, SchemaBuilder};

#[derive(Default)]
pub struct TeamDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl TeamDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for TeamDataSource {
    fn type_name(&self) -> &str {
        "tfe_team"
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
            .description("Looks up a team by name")
            .attribute(computed("id", AttributeType::String, "Team ID"))
            .attribute(name_attribute("Team name"))
            .attribute(organization_attribute())
            .attribute(computed("visibility", AttributeType::String, "secret or organization"))
            .attribute(computed("sso_team_id", AttributeType::String, "Linked SSO team"))
            .attribute(computed(
                "allow_member_token_management",
                AttributeType::Bool,
                "Whether members may manage the team token",
            ))
            .attribute(computed(
                "organization_access",
                organization_access_type(),
                "Organization-level permissions",
            ))
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

        let (organization, name) = match lookup_key(provider_data, &request.config) {
            Ok(key) => key,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };

        match provider_data
            .client
            .teams()
            .find_by_name(&organization, &name)
            .await
        {
            Ok(team) => {
                let mut state = request.config;
                write_state(&mut state, &team);
                if models::optional_string(&state, "organization").is_none() {
                    models::set(&mut state, "organization", organization);
                }
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("reading team", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for TeamDataSource {
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
    use mockito::Matcher;
    use tfplug::types::{AttributePath, ClientCapabilities, DynamicValue};

    #[tokio::test]
    async fn team_lookup_fills_organization_access() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/organizations/acme/teams")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"data":[{"id":"team-1","type":"teams","attributes":{
                    "name":"owners","visibility":"secret",
                    "organization-access":{"manage-workspaces":true}}}],
                "meta":{"pagination":{"current-page":1,"total-pages":1}}}"#,
            )
            .create_async()
            .await;

        let mut data_source = TeamDataSource::new();
        data_source.provider_data = Some(crate::TfeProviderData::new(
            test_client(&server.url()),
            Some("acme".to_string()),
        ));

        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "owners");
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "tfe_team".to_string(),
                    config,
                    provider_meta: None,
                    client_capabilities: ClientCapabilities::default(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(models::optional_string(&response.state, "id").as_deref(), Some("team-1"));
        assert_eq!(
            models::optional_string(&response.state, "organization").as_deref(),
            Some("acme")
        );
        assert_eq!(
            response
                .state
                .get_bool(&AttributePath::new("organization_access").attribute("manage_workspaces"))
                .ok(),
            Some(true)
        );
    }
}
