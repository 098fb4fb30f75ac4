//! Variables data source implementation
//!
//! Lists every variable of a workspace or a variable set. Besides the full
//! `variables` list the result is split by category into `terraform` and
//! `env`. Sensitive values come back from the API empty and stay empty.

use crate::api::variables::Variable;
use crate::data_sources::{computed, read_error};
use crate::models;
use crate::resources::not_configured;
use crate::resources::variable::VariableContainer;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Dynamic, DynamicValue};
use tfplug::validator::exactly_one_of;

#[derive(Default)]
pub struct VariablesDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl VariablesDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn variable_list_type() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::object([
        ("id", AttributeType::String),
        ("name", AttributeType::String),
        ("category", AttributeType::String),
        ("value", AttributeType::String),
        ("sensitive", AttributeType::Bool),
        ("hcl", AttributeType::Bool),
    ])))
}

fn variable_list(name: &str, description: &str) -> tfplug::schema::Attribute {
    AttributeBuilder::new(name, variable_list_type())
        .description(description)
        .computed()
        .sensitive()
        .build()
}

fn variable_value(variable: &Variable) -> Dynamic {
    let attrs = &variable.attributes;
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), Dynamic::from(variable.id()));
    fields.insert("name".to_string(), Dynamic::from(attrs.key.clone()));
    fields.insert("category".to_string(), Dynamic::from(attrs.category.clone()));
    fields.insert(
        "value".to_string(),
        Dynamic::from(attrs.value.clone().unwrap_or_default()),
    );
    fields.insert(
        "sensitive".to_string(),
        Dynamic::from(attrs.sensitive.unwrap_or(false)),
    );
    fields.insert("hcl".to_string(), Dynamic::from(attrs.hcl.unwrap_or(false)));
    Dynamic::Map(fields)
}

/// Fills `variables`, `terraform` and `env` from one listing
fn write_variables(state: &mut DynamicValue, variables: &[Variable]) {
    let by_category = |category: &str| -> Dynamic {
        Dynamic::List(
            variables
                .iter()
                .filter(|v| v.attributes.category.as_deref() == Some(category))
                .map(variable_value)
                .collect(),
        )
    };

    models::set(state, "terraform", by_category("terraform"));
    models::set(state, "env", by_category("env"));
    models::set(
        state,
        "variables",
        Dynamic::List(variables.iter().map(variable_value).collect()),
    );
}

#[async_trait]
impl DataSource for VariablesDataSource {
    fn type_name(&self) -> &str {
        "tfe_variables"
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
            .description("Lists the variables of a workspace or a variable set")
            .attribute(computed("id", AttributeType::String, "ID of the container"))
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("Workspace to list")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("variable_set_id", AttributeType::String)
                    .description("Variable set to list")
                    .optional()
                    .build(),
            )
            .attribute(variable_list("variables", "Every variable"))
            .attribute(variable_list("terraform", "Terraform variables only"))
            .attribute(variable_list("env", "Environment variables only"))
            .build();

        DataSourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: exactly_one_of(&request.config, &["workspace_id", "variable_set_id"]),
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => return ReadDataSourceResponse::error(not_configured()),
        };

        let container = match VariableContainer::from_value(&request.config) {
            Ok(container) => container,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };

        match container.list(&provider_data.client).await {
            Ok(variables) => {
                tracing::debug!(count = variables.len(), "listed variables");
                let mut state = request.config;
                let id = match &container {
                    VariableContainer::Workspace(id) | VariableContainer::VariableSet(id) => id,
                };
                models::set(&mut state, "id", id.as_str());
                write_variables(&mut state, &variables);
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("listing variables", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for VariablesDataSource {
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
