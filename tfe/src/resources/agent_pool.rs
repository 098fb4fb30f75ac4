//! Agent pool resource implementation

use crate::api::agent_pools::{AgentPool, AgentPoolAttributes};
use crate::ids;
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};

#[derive(Default)]
pub struct AgentPoolResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl AgentPoolResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn extract_agent_pool_config(config: &DynamicValue) -> Result<AgentPoolAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;
    Ok(AgentPoolAttributes {
        name: Some(name),
        organization_scoped: Some(models::optional_bool(config, "organization_scoped").unwrap_or(true)),
    })
}

pub(crate) fn write_state(state: &mut DynamicValue, pool: &AgentPool) {
    models::set(state, "id", pool.id());
    models::set(state, "name", pool.attributes.name.clone());
    if let Some(organization) = pool.related_id("organization") {
        models::set(state, "organization", organization);
    }
    models::set(
        state,
        "organization_scoped",
        pool.attributes.organization_scoped.unwrap_or(true),
    );
}

#[async_trait]
impl Resource for AgentPoolResource {
    fn type_name(&self) -> &str {
        "tfe_agent_pool"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages an agent pool")
            .attribute(id_attribute("The agent pool ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the agent pool")
                    .required()
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("organization_scoped", AttributeType::Bool)
                    .description("Whether every workspace in the organization may use the pool")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        ValidateResourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn create(
        &self,
        _ctx: Context,
        request: CreateResourceRequest,
    ) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let extracted = resolve_organization(provider_data, &request.planned_state).and_then(
            |organization| Ok((organization, extract_agent_pool_config(&request.config)?)),
        );
        let (organization, attributes) = match extracted {
            Ok(extracted) => extracted,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        match provider_data
            .client
            .agent_pools()
            .create(&organization, attributes)
            .await
        {
            Ok(pool) => {
                let mut state = request.planned_state;
                write_state(&mut state, &pool);
                models::set(&mut state, "organization", organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating agent pool", &e));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let id = match models::optional_string(&request.current_state, "id") {
            Some(id) => id,
            None => {
                return ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                };
            }
        };

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                };
            }
        };

        let new_state = match provider_data.client.agent_pools().read(&id).await {
            Ok(pool) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &pool);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading agent pool", &e));
                Some(request.current_state)
            }
        };

        ReadResourceResponse {
            new_state,
            diagnostics,
            private: request.private,
            deferred: None,
            new_identity: None,
        }
    }

    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
        };

        let extracted = models::optional_string(&request.prior_state, "id")
            .ok_or_else(|| missing_attribute("id"))
            .and_then(|id| Ok((id, extract_agent_pool_config(&request.config)?)));
        let (id, attributes) = match extracted {
            Ok(extracted) => extracted,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
        };

        match provider_data.client.agent_pools().update(&id, attributes).await {
            Ok(pool) => {
                let mut state = request.planned_state;
                write_state(&mut state, &pool);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating agent pool", &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
        }
    }

    async fn delete(
        &self,
        _ctx: Context,
        request: DeleteResourceRequest,
    ) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(not_configured());
                return DeleteResourceResponse { diagnostics };
            }
        };

        let id = match models::optional_string(&request.prior_state, "id") {
            Some(id) => id,
            None => return DeleteResourceResponse { diagnostics },
        };

        match provider_data.client.agent_pools().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting agent pool", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }

    fn as_modify_plan(&self) -> Option<&dyn ResourceWithModifyPlan> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithModifyPlan for AgentPoolResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for AgentPoolResource {
    /// Import ID: `apool-id` or `organization/pool-name`
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let id = match ids::unpack_id(&request.id) {
            Ok((organization, name)) => {
                let provider_data = match &self.provider_data {
                    Some(data) => data,
                    None => return ImportResourceStateResponse::error(not_configured()),
                };
                match provider_data
                    .client
                    .agent_pools()
                    .find_by_name(&organization, &name)
                    .await
                {
                    Ok(pool) => pool.id().to_string(),
                    Err(e) => {
                        return ImportResourceStateResponse::error(api_error(
                            "importing agent pool",
                            &e,
                        ))
                    }
                }
            }
            Err(_) => request.id.clone(),
        };

        let mut state = DynamicValue::object();
        models::set(&mut state, "id", id);

        let mut response = ImportResourceStateResponse::new();
        response.imported_resources.push(ImportedResource {
            type_name: request.type_name,
            state,
            private: vec![],
            identity: request.identity,
        });
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for AgentPoolResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        let mut diagnostics = vec![];

        match crate::TfeProviderData::from_provider_data(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureResourceResponse { diagnostics }
    }
}
