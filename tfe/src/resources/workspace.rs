//! Workspace resource implementation

use crate::api::workspaces::{Workspace, WorkspaceAttributes};
use crate::ids;
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ModifyPlanRequest, ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::StringPatternValidator;

const NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

#[derive(Default)]
pub struct WorkspaceResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl WorkspaceResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for WorkspaceResource {
    fn type_name(&self) -> &str {
        "tfe_workspace"
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
        let mut diagnostics = vec![];

        let mut name = AttributeBuilder::new("name", AttributeType::String)
            .description("Name of the workspace")
            .required();
        match StringPatternValidator::create(
            NAME_PATTERN,
            "can only include letters, numbers, - and _",
        ) {
            Ok(validator) => name = name.validator(validator),
            Err(e) => diagnostics.push(Diagnostic::error("Invalid name pattern", e.to_string())),
        }

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a workspace")
            .attribute(id_attribute("The workspace ID"))
            .attribute(name.build())
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("A description for the workspace")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("project_id", AttributeType::String)
                    .description("ID of the project that contains the workspace. Defaults to the organization's default project")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("auto_apply", AttributeType::Bool)
                    .description("Whether successful plans are applied automatically")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("terraform_version", AttributeType::String)
                    .description("Terraform version or constraint used by runs")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("working_directory", AttributeType::String)
                    .description("Directory Terraform runs in, relative to the repository root")
                    .optional()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("queue_all_runs", AttributeType::Bool)
                    .description("Whether runs are queued as soon as the workspace is created")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("speculative_enabled", AttributeType::Bool)
                    .description("Whether pull requests trigger speculative plans")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("file_triggers_enabled", AttributeType::Bool)
                    .description("Whether runs are filtered by changed files")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("trigger_prefixes", AttributeType::string_list())
                    .description("Path prefixes that trigger runs")
                    .optional()
                    .default(StaticDefault::empty_list())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tag_names", AttributeType::string_set())
                    .description("Tags applied to the workspace")
                    .optional()
                    .default(StaticDefault::empty_list())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_destroy_plan", AttributeType::Bool)
                    .description("Whether destroy plans can be queued")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("global_remote_state", AttributeType::Bool)
                    .description("Whether every workspace in the organization can read this state")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("assessments_enabled", AttributeType::Bool)
                    .description("Whether health assessments run for this workspace")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("force_delete", AttributeType::Bool)
                    .description("Delete the workspace even when it still manages resources")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("resource_count", AttributeType::Number)
                    .description("Number of resources managed by the workspace")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("html_url", AttributeType::String)
                    .description("URL of the workspace in the web UI")
                    .computed()
                    .build(),
            )
            .build();

        ResourceSchemaResponse {
            schema,
            diagnostics,
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let file_triggers = models::optional_bool(&request.config, "file_triggers_enabled");
        let prefixes = models::string_set(&request.config, "trigger_prefixes").unwrap_or_default();
        if file_triggers == Some(false) && !prefixes.is_empty() {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid trigger configuration",
                    "trigger_prefixes has no effect when file_triggers_enabled is false",
                )
                .with_attribute(AttributePath::new("trigger_prefixes")),
            );
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

        let organization = match resolve_organization(provider_data, &request.planned_state) {
            Ok(organization) => organization,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let attributes = match self.extract_workspace_config(&request.config) {
            Ok(attributes) => attributes,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };
        let project_id = models::non_empty_string(&request.config, "project_id");

        tracing::info!(organization = %organization, name = ?attributes.name, "Creating workspace");
        match provider_data
            .client
            .workspaces()
            .create(&organization, attributes, project_id.as_deref())
            .await
        {
            Ok(workspace) => {
                let mut state = request.planned_state;
                write_state(&mut state, &workspace, provider_data.client.address());
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating workspace", &e));
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
                write_state(&mut state, &workspace, provider_data.client.address());
                // Local-only setting; imported workspaces get the default
                if !models::is_known(&state, "force_delete") {
                    models::set(&mut state, "force_delete", false);
                }
                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(id = %id, "Workspace no longer exists");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("reading workspace", &e));
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

        let id = match models::optional_string(&request.prior_state, "id") {
            Some(id) => id,
            None => {
                diagnostics.push(missing_attribute("id"));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
        };

        let attributes = match self.extract_workspace_config(&request.config) {
            Ok(attributes) => attributes,
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
        let project_id = models::non_empty_string(&request.config, "project_id");

        match provider_data
            .client
            .workspaces()
            .update(&id, attributes, project_id.as_deref())
            .await
        {
            Ok(workspace) => {
                let mut state = request.planned_state;
                write_state(&mut state, &workspace, provider_data.client.address());
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating workspace", &e));
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

        let workspaces = provider_data.client.workspaces();
        let result = if models::optional_bool(&request.prior_state, "force_delete") == Some(true) {
            tracing::info!(id = %id, "Force deleting workspace");
            workspaces.delete(&id).await
        } else {
            tracing::info!(id = %id, "Safe deleting workspace");
            workspaces.safe_delete(&id).await
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting workspace", &e)),
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

impl WorkspaceResource {
    fn extract_workspace_config(
        &self,
        config: &DynamicValue,
    ) -> Result<WorkspaceAttributes, Diagnostic> {
        let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

        Ok(WorkspaceAttributes {
            name: Some(name),
            description: Some(models::optional_string(config, "description").unwrap_or_default()),
            auto_apply: models::optional_bool(config, "auto_apply"),
            terraform_version: models::non_empty_string(config, "terraform_version"),
            working_directory: models::optional_string(config, "working_directory"),
            queue_all_runs: models::optional_bool(config, "queue_all_runs"),
            speculative_enabled: models::optional_bool(config, "speculative_enabled"),
            file_triggers_enabled: models::optional_bool(config, "file_triggers_enabled"),
            trigger_prefixes: models::string_set(config, "trigger_prefixes"),
            tag_names: models::string_set(config, "tag_names"),
            allow_destroy_plan: models::optional_bool(config, "allow_destroy_plan"),
            global_remote_state: models::optional_bool(config, "global_remote_state"),
            assessments_enabled: models::optional_bool(config, "assessments_enabled"),
            ..Default::default()
        })
    }

    /// `org/name` import ids are resolved to the workspace id
    async fn resolve_import_id(&self, id: &str) -> Result<String, Diagnostic> {
        if !id.contains(ids::SEPARATOR) {
            return Ok(id.to_string());
        }

        let parts = ids::split_import_id(id, 2)
            .map_err(|e| Diagnostic::error("Invalid import ID", e.to_string()))?;
        let provider_data = self.provider_data.as_ref().ok_or_else(not_configured)?;

        provider_data
            .client
            .workspaces()
            .read_by_name(&parts[0], &parts[1])
            .await
            .map(|workspace| workspace.id().to_string())
            .map_err(|e| api_error("importing workspace", &e))
    }
}

/// Web UI link from the `self-html` link, or built from org and name
pub(crate) fn html_url(workspace: &Workspace, address: &str) -> String {
    match workspace.link("self-html") {
        Some(path) => format!("{}{}", address, path),
        None => format!(
            "{}/app/{}/workspaces/{}",
            address,
            workspace.organization().unwrap_or_default(),
            workspace.attributes.name.as_deref().unwrap_or_default()
        ),
    }
}

pub(crate) fn write_state(state: &mut DynamicValue, workspace: &Workspace, address: &str) {
    let attrs = &workspace.attributes;

    models::set(state, "id", workspace.id());
    models::set(state, "name", attrs.name.clone());
    models::set(state, "organization", workspace.organization());
    models::set_remote_string(state, "description", attrs.description.clone());
    models::set(state, "project_id", workspace.project_id());
    models::set(state, "auto_apply", attrs.auto_apply.unwrap_or(false));
    models::set(state, "terraform_version", attrs.terraform_version.clone());
    models::set(
        state,
        "working_directory",
        attrs.working_directory.clone().unwrap_or_default(),
    );
    models::set(state, "queue_all_runs", attrs.queue_all_runs.unwrap_or(true));
    models::set(state, "speculative_enabled", attrs.speculative_enabled.unwrap_or(true));
    models::set(state, "file_triggers_enabled", attrs.file_triggers_enabled.unwrap_or(true));
    models::set(
        state,
        "trigger_prefixes",
        Dynamic::string_list(attrs.trigger_prefixes.clone().unwrap_or_default()),
    );
    models::set_strings(state, "tag_names", attrs.tag_names.clone().unwrap_or_default());
    models::set(state, "allow_destroy_plan", attrs.allow_destroy_plan.unwrap_or(true));
    models::set(state, "global_remote_state", attrs.global_remote_state.unwrap_or(false));
    models::set(state, "assessments_enabled", attrs.assessments_enabled.unwrap_or(false));
    models::set(state, "resource_count", attrs.resource_count.unwrap_or(0));
    models::set(state, "html_url", html_url(workspace, address));
}

#[async_trait]
impl ResourceWithModifyPlan for WorkspaceResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for WorkspaceResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        if !request.id.contains(ids::SEPARATOR) {
            let mut response = ImportResourceStateResponse::new();
            import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
            return response;
        }

        match self.resolve_import_id(&request.id).await {
            Ok(id) => {
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
            Err(diag) => ImportResourceStateResponse::error(diag),
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for WorkspaceResource {
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
