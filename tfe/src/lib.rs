//! Terraform provider for HCP Terraform and Terraform Enterprise

pub mod api;
pub mod config;
pub mod data_sources;
pub mod ids;
pub mod models;
pub mod plan_modifiers;
pub mod provider_data;
pub mod resources;
pub mod version;

pub use provider_data::TfeProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, DataSourceFactory, Provider,
    ProviderMetadataRequest, ProviderMetadataResponse, ProviderSchemaRequest,
    ProviderSchemaResponse, ResourceFactory, ValidateProviderConfigRequest,
    ValidateProviderConfigResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::server::{ProviderServer, ServerConfig};
use tfplug::types::{AttributePath, Diagnostic};

use api::oidc::OidcKind;

#[derive(Default)]
pub struct TfeProvider {
    provider_data: Option<TfeProviderData>,
}

impl TfeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }
}

fn resource<R, F>(factories: &mut HashMap<String, ResourceFactory>, name: &str, build: F)
where
    R: ResourceWithConfigure + 'static,
    F: Fn() -> R + Send + Sync + 'static,
{
    factories.insert(
        name.to_string(),
        Box::new(move || Box::new(build()) as Box<dyn ResourceWithConfigure>),
    );
}

fn data_source<D, F>(factories: &mut HashMap<String, DataSourceFactory>, name: &str, build: F)
where
    D: DataSourceWithConfigure + 'static,
    F: Fn() -> D + Send + Sync + 'static,
{
    factories.insert(
        name.to_string(),
        Box::new(move || Box::new(build()) as Box<dyn DataSourceWithConfigure>),
    );
}

/// Server hosting the provider, with stderr logging installed first
pub fn server(config: &ServerConfig) -> ProviderServer<TfeProvider> {
    if let Err(e) = tfplug::init_logging(config) {
        tracing::debug!(error = %e, "Logging already initialised");
    }
    ProviderServer::new(TfeProvider::new())
}

#[async_trait]
impl Provider for TfeProvider {
    fn type_name(&self) -> &str {
        "tfe"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .description("Manages HCP Terraform and Terraform Enterprise")
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description("Remote hostname. Defaults to app.terraform.io or TFE_HOSTNAME")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("token", AttributeType::String)
                    .description("API token. Defaults to TFE_TOKEN, then the CLI credentials file")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization", AttributeType::String)
                    .description("Default organization for resources that omit one. Defaults to TFE_ORGANIZATION")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ssl_skip_verify", AttributeType::Bool)
                    .description("Skip TLS certificate verification. Defaults to TFE_SSL_SKIP_VERIFY")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        let mut diagnostics = vec![];

        if let Some(hostname) = models::non_empty_string(&request.config, "hostname") {
            if let Err(e) = api::client::base_url(&hostname) {
                diagnostics.push(
                    Diagnostic::error("Invalid hostname", e.to_string())
                        .with_attribute(AttributePath::new("hostname")),
                );
            }
        }

        ValidateProviderConfigResponse { diagnostics }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = match config::ProviderConfig::resolve(&request.config) {
            Ok(config) => config,
            Err(e) => {
                return ConfigureProviderResponse {
                    diagnostics: vec![Diagnostic::error("Invalid provider configuration", e.to_string())],
                    provider_data: None,
                }
            }
        };

        tracing::info!(
            hostname = %config.hostname,
            organization = ?config.organization,
            ssl_skip_verify = config.ssl_skip_verify,
            "Configuring tfe provider"
        );

        match api::Client::new(&config.hostname, &config.token, config.ssl_skip_verify) {
            Ok(client) => {
                let data = TfeProviderData::new(client, config.organization);
                self.provider_data = Some(data.clone());
                ConfigureProviderResponse {
                    diagnostics: vec![],
                    provider_data: Some(Arc::new(data)),
                }
            }
            Err(e) => ConfigureProviderResponse {
                diagnostics: vec![Diagnostic::error(
                    "Failed to create API client",
                    e.to_string(),
                )],
                provider_data: None,
            },
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        use crate::resources::*;

        let mut factories = HashMap::new();
        resource(&mut factories, "tfe_organization", organization::OrganizationResource::new);
        resource(&mut factories, "tfe_workspace", workspace::WorkspaceResource::new);
        resource(
            &mut factories,
            "tfe_workspace_settings",
            workspace_settings::WorkspaceSettingsResource::new,
        );
        resource(&mut factories, "tfe_project", project::ProjectResource::new);
        resource(&mut factories, "tfe_team", team::TeamResource::new);
        resource(&mut factories, "tfe_team_member", team_member::TeamMemberResource::new);
        resource(&mut factories, "tfe_team_access", team_access::TeamAccessResource::new);
        resource(&mut factories, "tfe_policy_set", policy_set::PolicySetResource::new);
        resource(&mut factories, "tfe_variable", variable::VariableResource::new);
        resource(&mut factories, "tfe_variable_set", variable_set::VariableSetResource::new);
        resource(&mut factories, "tfe_agent_pool", agent_pool::AgentPoolResource::new);
        resource(&mut factories, "tfe_agent_token", agent_token::AgentTokenResource::new);
        for kind in OidcKind::ALL {
            resource(&mut factories, oidc_configuration::type_name(kind), move || {
                oidc_configuration::OidcConfigurationResource::new(kind)
            });
        }
        resource(
            &mut factories,
            "tfe_hyok_configuration",
            hyok_configuration::HyokConfigurationResource::new,
        );
        resource(&mut factories, "tfe_stack", stack::StackResource::new);
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        use crate::data_sources::*;

        let mut factories = HashMap::new();
        data_source(&mut factories, "tfe_organization", organization::OrganizationDataSource::new);
        data_source(&mut factories, "tfe_workspace", workspace::WorkspaceDataSource::new);
        data_source(&mut factories, "tfe_project", project::ProjectDataSource::new);
        data_source(&mut factories, "tfe_team", team::TeamDataSource::new);
        data_source(&mut factories, "tfe_agent_pool", agent_pool::AgentPoolDataSource::new);
        data_source(&mut factories, "tfe_variable_set", variable_set::VariableSetDataSource::new);
        data_source(&mut factories, "tfe_variables", variables::VariablesDataSource::new);
        factories
    }
}
