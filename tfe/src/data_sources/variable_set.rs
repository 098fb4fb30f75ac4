//! Variable set data source implementation

use crate::data_sources::{computed, lookup_key, name_attribute, organization_attribute, read_error};
use crate::models;
use crate::resources::{not_configured, variable_set::write_state};
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
pub struct VariableSetDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl VariableSetDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for VariableSetDataSource {
    fn type_name(&self) -> &str {
        "tfe_variable_set"
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
            .description("Looks up a variable set by name")
            .attribute(computed("id", AttributeType::String, "Variable set ID"))
            .attribute(name_attribute("Variable set name"))
            .attribute(organization_attribute())
            .attribute(computed("description", AttributeType::String, "Variable set description"))
            .attribute(computed("global", AttributeType::Bool, "Whether the set applies everywhere"))
            .attribute(computed(
                "priority",
                AttributeType::Bool,
                "Whether the set overrides workspace variables",
            ))
            .attribute(computed(
                "workspace_ids",
                AttributeType::string_set(),
                "Workspaces the set is applied to",
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
            .variable_sets()
            .find_by_name(&organization, &name)
            .await
        {
            Ok(variable_set) => {
                let mut state = request.config;
                write_state(&mut state, &variable_set);
                if models::optional_string(&state, "organization").is_none() {
                    models::set(&mut state, "organization", organization);
                }
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("reading variable set", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for VariableSetDataSource {
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
