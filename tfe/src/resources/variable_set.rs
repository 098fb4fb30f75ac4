//! Variable set resource implementation

use crate::api::variable_sets::{VariableSet, VariableSetAttributes};
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::import_state_passthrough_id;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::conflicts_with;

#[derive(Default)]
pub struct VariableSetResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl VariableSetResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn extract_variable_set_config(config: &DynamicValue) -> Result<VariableSetAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

    Ok(VariableSetAttributes {
        name: Some(name),
        description: Some(models::optional_string(config, "description").unwrap_or_default()),
        global: Some(models::optional_bool(config, "global").unwrap_or(false)),
        priority: Some(models::optional_bool(config, "priority").unwrap_or(false)),
    })
}

pub(crate) fn write_state(state: &mut DynamicValue, variable_set: &VariableSet) {
    let attrs = &variable_set.attributes;

    models::set(state, "id", variable_set.id());
    models::set(state, "name", attrs.name.clone());
    if let Some(organization) = variable_set.related_id("organization") {
        models::set(state, "organization", organization);
    }
    models::set_remote_string(state, "description", attrs.description.clone());
    models::set(state, "global", attrs.global.unwrap_or(false));
    models::set(state, "priority", attrs.priority.unwrap_or(false));
    models::set_strings(state, "workspace_ids", variable_set.related_ids("workspaces"));
}

#[async_trait]
impl Resource for VariableSetResource {
    fn type_name(&self) -> &str {
        "tfe_variable_set"
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
            .description("Manages a variable set and the workspaces it applies to")
            .attribute(id_attribute("The variable set ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the variable set")
                    .required()
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the variable set")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("global", AttributeType::Bool)
                    .description("Whether the set applies to every workspace in the organization")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Bool)
                    .description("Whether the set's variables override workspace variables")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_ids", AttributeType::string_set())
                    .description("Workspaces the variable set applies to")
                    .optional()
                    .default(StaticDefault::empty_list())
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        if models::optional_bool(&request.config, "global") == Some(true) {
            diagnostics.extend(conflicts_with(&request.config, "global", &["workspace_ids"]));
        }

        ValidateResourceConfigResponse { diagnostics }
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
            |organization| Ok((organization, extract_variable_set_config(&request.config)?)),
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
        let workspace_ids = models::string_set(&request.config, "workspace_ids").unwrap_or_default();

        match provider_data
            .client
            .variable_sets()
            .create(&organization, attributes, &workspace_ids)
            .await
        {
            Ok(variable_set) => {
                let mut state = request.planned_state;
                write_state(&mut state, &variable_set);
                models::set(&mut state, "organization", organization);
                models::set_strings(&mut state, "workspace_ids", workspace_ids);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating variable set", &e));
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

        let new_state = match provider_data.client.variable_sets().read(&id).await {
            Ok(variable_set) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &variable_set);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading variable set", &e));
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
            .and_then(|id| Ok((id, extract_variable_set_config(&request.config)?)));
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

        let variable_sets = provider_data.client.variable_sets();
        let variable_set = match variable_sets.update(&id, attributes).await {
            Ok(variable_set) => variable_set,
            Err(e) => {
                diagnostics.push(api_error("updating variable set", &e));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
        };

        let current = models::string_set(&request.prior_state, "workspace_ids").unwrap_or_default();
        let desired = models::string_set(&request.config, "workspace_ids").unwrap_or_default();
        let (added, removed) = models::set_difference(&current, &desired);

        let (add_result, remove_result) = futures::join!(
            variable_sets.apply_to_workspaces(&id, &added),
            variable_sets.remove_from_workspaces(&id, &removed),
        );
        for result in [&add_result, &remove_result] {
            if let Err(e) = result {
                diagnostics.push(api_error("updating variable set workspaces", e));
            }
        }
        let workspace_ids = models::members_after_sync(
            &desired,
            &added,
            &removed,
            add_result.is_ok(),
            remove_result.is_ok(),
        );

        let mut state = request.planned_state;
        write_state(&mut state, &variable_set);
        models::set_strings(&mut state, "workspace_ids", workspace_ids);
        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics,
            new_identity: None,
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

        match provider_data.client.variable_sets().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting variable set", &e)),
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
impl ResourceWithModifyPlan for VariableSetResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for VariableSetResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::new();
        import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithConfigure for VariableSetResource {
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
