//! Agent pool data source implementation

use crate::data_sources::{computed, lookup_key, name_attribute, organization_attribute, read_error};
use crate::models;
use crate::resources::{agent_pool::write_state, not_configured};
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
pub struct AgentPoolDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl AgentPoolDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for AgentPoolDataSource {
    fn type_name(&self) -> &str {
        "tfe_agent_pool"
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
            .description("Looks up an agent pool by name")
            .attribute(computed("id", AttributeType::String, "Agent pool ID"))
            .attribute(name_attribute("Agent pool name"))
            .attribute(organization_attribute())
            .attribute(computed(
                "organization_scoped",
                AttributeType::Bool,
                "Whether every workspace may use the pool",
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
            .agent_pools()
            .find_by_name(&organization, &name)
            .await
        {
            Ok(pool) => {
                let mut state = request.config;
                write_state(&mut state, &pool);
                if models::optional_string(&state, "organization").is_none() {
                    models::set(&mut state, "organization", organization);
                }
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("reading agent pool", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for AgentPoolDataSource {
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
