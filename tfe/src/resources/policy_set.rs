//! Policy set resource implementation

use crate::api::policy_sets::{PolicySet, PolicySetAttributes};
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{conflicts_with, OneOfValidator};

const KINDS: [&str; 2] = ["sentinel", "opa"];

#[derive(Default)]
pub struct PolicySetResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl PolicySetResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for PolicySetResource {
    fn type_name(&self) -> &str {
        "tfe_policy_set"
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
            .description("Manages a policy set and the workspaces it applies to")
            .attribute(id_attribute("The policy set ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the policy set")
                    .required()
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("A description of the policy set's purpose")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("kind", AttributeType::String)
                    .description("Policy framework: sentinel or opa")
                    .optional()
                    .default(StaticDefault::string("sentinel"))
                    .validator(OneOfValidator::create(&KINDS))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("global", AttributeType::Bool)
                    .description("Whether the policy set applies to every workspace")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("overridable", AttributeType::Bool)
                    .description("Whether users can override failed policies. OPA only")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("policies_path", AttributeType::String)
                    .description("Subdirectory of the VCS repository holding the policies")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agent_enabled", AttributeType::Bool)
                    .description("Whether policy evaluation runs on agents")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("policy_tool_version", AttributeType::String)
                    .description("Version of the policy tool")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_ids", AttributeType::string_set())
                    .description("Workspaces the policy set applies to")
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
        let config = &request.config;

        if models::optional_bool(config, "global") == Some(true) {
            diagnostics.extend(conflicts_with(config, "global", &["workspace_ids"]));
        }

        let kind = models::optional_string(config, "kind").unwrap_or_else(|| "sentinel".to_string());
        if models::is_known(config, "overridable") && kind != "opa" {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid overridable",
                    "overridable can only be set when kind is opa",
                )
                .with_attribute(AttributePath::new("overridable")),
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

        let extracted = resolve_organization(provider_data, &request.planned_state)
            .and_then(|organization| Ok((organization, extract_policy_set_config(&request.config)?)));
        let (organization, mut attributes) = match extracted {
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
        attributes.kind = models::optional_string(&request.planned_state, "kind");
        let workspace_ids = models::string_set(&request.config, "workspace_ids").unwrap_or_default();

        match provider_data
            .client
            .policy_sets()
            .create(&organization, attributes, &workspace_ids)
            .await
        {
            Ok(policy_set) => {
                let mut state = request.planned_state;
                write_state(&mut state, &policy_set);
                models::set(&mut state, "organization", organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating policy set", &e));
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

        let new_state = match provider_data.client.policy_sets().read(&id).await {
            Ok(policy_set) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &policy_set);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading policy set", &e));
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
            .and_then(|id| Ok((id, extract_policy_set_config(&request.config)?)));
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

        let policy_sets = provider_data.client.policy_sets();
        let policy_set = match policy_sets.update(&id, attributes).await {
            Ok(policy_set) => policy_set,
            Err(e) => {
                diagnostics.push(api_error("updating policy set", &e));
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
        tracing::debug!(id = %id, added = ?added, removed = ?removed, "Syncing policy set workspaces");

        let (add_result, remove_result) = futures::join!(
            policy_sets.add_workspaces(&id, &added),
            policy_sets.remove_workspaces(&id, &removed),
        );
        for result in [&add_result, &remove_result] {
            if let Err(e) = result {
                diagnostics.push(api_error("updating policy set workspaces", e));
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
        write_state(&mut state, &policy_set);
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

        match provider_data.client.policy_sets().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting policy set", &e)),
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

/// Attributes accepted on both create and update; `kind` is create-only
fn extract_policy_set_config(config: &DynamicValue) -> Result<PolicySetAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

    Ok(PolicySetAttributes {
        name: Some(name),
        description: Some(models::optional_string(config, "description").unwrap_or_default()),
        kind: None,
        global: models::optional_bool(config, "global"),
        overridable: models::optional_bool(config, "overridable"),
        policies_path: models::non_empty_string(config, "policies_path"),
        agent_enabled: models::optional_bool(config, "agent_enabled"),
        policy_tool_version: models::non_empty_string(config, "policy_tool_version"),
    })
}

fn write_state(state: &mut DynamicValue, policy_set: &PolicySet) {
    let attrs = &policy_set.attributes;
    let global = attrs.global.unwrap_or(false);

    models::set(state, "id", policy_set.id());
    models::set(state, "name", attrs.name.clone());
    if let Some(organization) = policy_set.related_id("organization") {
        models::set(state, "organization", organization);
    }
    models::set_remote_string(state, "description", attrs.description.clone());
    models::set(state, "kind", attrs.kind.clone().unwrap_or_else(|| "sentinel".to_string()));
    models::set(state, "global", global);
    models::set(state, "overridable", attrs.overridable.unwrap_or(false));
    models::set(state, "policies_path", attrs.policies_path.clone());
    models::set(state, "agent_enabled", attrs.agent_enabled.unwrap_or(false));
    models::set(state, "policy_tool_version", attrs.policy_tool_version.clone());
    // Global sets apply everywhere; membership is only tracked otherwise
    let workspace_ids = if global {
        vec![]
    } else {
        policy_set.related_ids("workspaces")
    };
    models::set_strings(state, "workspace_ids", workspace_ids);
}

#[async_trait]
impl ResourceWithModifyPlan for PolicySetResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for PolicySetResource {
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
impl ResourceWithConfigure for PolicySetResource {
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
