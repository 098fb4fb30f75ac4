//! Workspace execution settings resource implementation
//!
//! Settings left out of configuration are inherited from the organization
//! default. The computed `overwrites` object records which settings the
//! workspace sets itself.

use crate::api::workspaces::{Workspace, WorkspaceSettings};
use crate::api::ApiError;
use crate::models;
use crate::plan_modifiers::sync_setting_overwrites;
use crate::resources::{api_error, missing_attribute, not_configured};
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
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
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::OneOfValidator;

const EXECUTION_MODES: [&str; 3] = ["remote", "local", "agent"];

#[derive(Default)]
pub struct WorkspaceSettingsResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl WorkspaceSettingsResource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn apply_settings(
        &self,
        provider_data: &crate::TfeProviderData,
        workspace_id: &str,
        settings: &WorkspaceSettings,
    ) -> Result<Workspace, ApiError> {
        tracing::info!(
            workspace_id = %workspace_id,
            execution_mode = ?settings.execution_mode,
            agent_pool_id = ?settings.agent_pool_id,
            "Applying workspace settings"
        );
        provider_data
            .client
            .workspaces()
            .update_settings(workspace_id, settings)
            .await
    }
}

#[async_trait]
impl Resource for WorkspaceSettingsResource {
    fn type_name(&self) -> &str {
        "tfe_workspace_settings"
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
            .description("Manages execution settings of an existing workspace")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The workspace ID")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("ID of the workspace to configure")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("execution_mode", AttributeType::String)
                    .description("remote, local or agent. Inherited from the organization when unset")
                    .optional()
                    .computed()
                    .validator(OneOfValidator::create(&EXECUTION_MODES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agent_pool_id", AttributeType::String)
                    .description("Agent pool used when execution_mode is agent")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "overwrites",
                    AttributeType::object([
                        ("execution_mode", AttributeType::Bool),
                        ("agent_pool", AttributeType::Bool),
                    ]),
                )
                .description("Which settings are set on the workspace instead of inherited")
                .computed()
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

        let mode = models::optional_string(&request.config, "execution_mode");
        let has_pool = models::is_known(&request.config, "agent_pool_id");
        let pool_unknown = models::is_unknown(&request.config, "agent_pool_id");

        match mode.as_deref() {
            Some("agent") if !has_pool && !pool_unknown => diagnostics.push(
                Diagnostic::error(
                    "Missing agent pool",
                    "agent_pool_id is required when execution_mode is agent",
                )
                .with_attribute(AttributePath::new("agent_pool_id")),
            ),
            Some(mode) if mode != "agent" && has_pool => diagnostics.push(
                Diagnostic::error(
                    "Invalid agent pool",
                    format!("agent_pool_id can only be set when execution_mode is agent, got {}", mode),
                )
                .with_attribute(AttributePath::new("agent_pool_id")),
            ),
            _ => {}
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

        let (workspace_id, settings) = match extract_settings(&request.config) {
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

        match self
            .apply_settings(provider_data, &workspace_id, &settings)
            .await
        {
            Ok(workspace) => {
                let mut state = request.planned_state;
                write_state(&mut state, &workspace);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating workspace settings", &e));
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

        match provider_data.client.workspaces().read(&id).await {
            Ok(workspace) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &workspace);
                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
            Err(e) if e.is_not_found() => ReadResourceResponse {
                new_state: None,
                diagnostics,
                private: request.private,
                deferred: None,
                new_identity: None,
            },
            Err(e) => {
                diagnostics.push(api_error("reading workspace settings", &e));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
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

        let (workspace_id, settings) = match extract_settings(&request.config) {
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

        match self
            .apply_settings(provider_data, &workspace_id, &settings)
            .await
        {
            Ok(workspace) => {
                let mut state = request.planned_state;
                write_state(&mut state, &workspace);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating workspace settings", &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
        }
    }

    /// Hands every setting back to the organization default
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

        let workspace_id = match models::optional_string(&request.prior_state, "id") {
            Some(id) => id,
            None => return DeleteResourceResponse { diagnostics },
        };

        let inherited = WorkspaceSettings::default();
        match self
            .apply_settings(provider_data, &workspace_id, &inherited)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("resetting workspace settings", &e)),
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

fn extract_settings(config: &DynamicValue) -> Result<(String, WorkspaceSettings), Diagnostic> {
    let workspace_id = models::optional_string(config, "workspace_id")
        .ok_or_else(|| missing_attribute("workspace_id"))?;

    Ok((
        workspace_id,
        WorkspaceSettings {
            execution_mode: models::non_empty_string(config, "execution_mode"),
            agent_pool_id: models::non_empty_string(config, "agent_pool_id"),
        },
    ))
}

fn write_state(state: &mut DynamicValue, workspace: &Workspace) {
    let overwrites = workspace.attributes.setting_overwrites.unwrap_or_default();

    models::set(state, "id", workspace.id());
    models::set(state, "workspace_id", workspace.id());
    models::set(state, "execution_mode", workspace.attributes.execution_mode.clone());
    models::set(state, "agent_pool_id", workspace.agent_pool_id());

    let mut flags = HashMap::new();
    flags.insert("execution_mode".to_string(), Dynamic::Bool(overwrites.execution_mode));
    flags.insert("agent_pool".to_string(), Dynamic::Bool(overwrites.agent_pool));
    let _ = state.set_map(&AttributePath::new("overwrites"), flags);
}

#[async_trait]
impl ResourceWithModifyPlan for WorkspaceSettingsResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let mut planned = request.proposed_new_state;
        sync_setting_overwrites(&request.config, &request.prior_state, &mut planned);

        ModifyPlanResponse {
            planned_state: planned,
            requires_replace: vec![],
            planned_private: request.prior_private,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithImportState for WorkspaceSettingsResource {
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
impl ResourceWithConfigure for WorkspaceSettingsResource {
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
