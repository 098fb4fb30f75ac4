//! Variable resource implementation
//!
//! A variable lives either in a workspace or in a variable set. The two
//! containers share attributes but sit behind different endpoints, so every
//! handler first resolves a [`VariableContainer`] and dispatches through it.

use crate::api::variables::{Variable, VariableAttributes};
use crate::api::{ApiError, Client};
use crate::ids;
use crate::models;
use crate::resources::{api_error, id_attribute, missing_attribute, not_configured};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplace, RequiresReplaceIf};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource, ModifyPlanRequest,
    ModifyPlanResponse, ReadResourceRequest, ReadResourceResponse, Resource,
    ResourceMetadataRequest, ResourceMetadataResponse, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, ResourceWithImportState,
    ResourceWithModifyPlan, ResourceWithUpgradeState, UpdateResourceRequest,
    UpdateResourceResponse, UpgradeResourceStateRequest, UpgradeResourceStateResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, PlanModifierRequest, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::{exactly_one_of, OneOfValidator};

const CATEGORIES: [&str; 2] = ["terraform", "env"];
const VARIABLE_SET_PREFIX: &str = "varset-";

/// Where a variable is stored
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VariableContainer {
    Workspace(String),
    VariableSet(String),
}

impl VariableContainer {
    /// Reads `workspace_id` or `variable_set_id`, whichever is set
    pub(crate) fn from_value(value: &DynamicValue) -> Result<Self, Diagnostic> {
        match (
            models::non_empty_string(value, "workspace_id"),
            models::non_empty_string(value, "variable_set_id"),
        ) {
            (Some(workspace_id), None) => Ok(Self::Workspace(workspace_id)),
            (None, Some(variable_set_id)) => Ok(Self::VariableSet(variable_set_id)),
            (Some(_), Some(_)) => Err(Diagnostic::error(
                "Invalid attribute combination",
                "Only one of workspace_id, variable_set_id can be specified",
            )),
            (None, None) => Err(missing_attribute("workspace_id")),
        }
    }

    pub(crate) async fn list(&self, client: &Client) -> Result<Vec<Variable>, ApiError> {
        match self {
            Self::Workspace(ws) => client.variables().list(ws).await,
            Self::VariableSet(vs) => client.variable_set_variables().list(vs).await,
        }
    }

    async fn read(&self, client: &Client, id: &str) -> Result<Variable, ApiError> {
        match self {
            Self::Workspace(ws) => client.variables().read(ws, id).await,
            Self::VariableSet(vs) => client.variable_set_variables().read(vs, id).await,
        }
    }

    async fn create(&self, client: &Client, attributes: VariableAttributes) -> Result<Variable, ApiError> {
        match self {
            Self::Workspace(ws) => client.variables().create(ws, attributes).await,
            Self::VariableSet(vs) => client.variable_set_variables().create(vs, attributes).await,
        }
    }

    async fn update(
        &self,
        client: &Client,
        id: &str,
        attributes: VariableAttributes,
    ) -> Result<Variable, ApiError> {
        match self {
            Self::Workspace(ws) => client.variables().update(ws, id, attributes).await,
            Self::VariableSet(vs) => client.variable_set_variables().update(vs, id, attributes).await,
        }
    }

    async fn delete(&self, client: &Client, id: &str) -> Result<(), ApiError> {
        match self {
            Self::Workspace(ws) => client.variables().delete(ws, id).await,
            Self::VariableSet(vs) => client.variable_set_variables().delete(vs, id).await,
        }
    }

    fn write(&self, state: &mut DynamicValue) {
        match self {
            Self::Workspace(ws) => {
                models::set(state, "workspace_id", ws.as_str());
                models::set(state, "variable_set_id", Dynamic::Null);
            }
            Self::VariableSet(vs) => {
                models::set(state, "workspace_id", Dynamic::Null);
                models::set(state, "variable_set_id", vs.as_str());
            }
        }
    }
}

#[derive(Default)]
pub struct VariableResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl VariableResource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A variable can be made sensitive in place, but never un-sensitive
fn sensitive_cleared(request: &PlanModifierRequest) -> bool {
    request.state_value.as_bool() == Some(true) && request.plan_value.as_bool() == Some(false)
}

fn extract_variable_config(config: &DynamicValue) -> Result<VariableAttributes, Diagnostic> {
    let key = models::optional_string(config, "key").ok_or_else(|| missing_attribute("key"))?;
    let category =
        models::optional_string(config, "category").ok_or_else(|| missing_attribute("category"))?;

    Ok(VariableAttributes {
        key: Some(key),
        value: Some(models::optional_string(config, "value").unwrap_or_default()),
        description: Some(models::optional_string(config, "description").unwrap_or_default()),
        category: Some(category),
        hcl: Some(models::optional_bool(config, "hcl").unwrap_or(false)),
        sensitive: Some(models::optional_bool(config, "sensitive").unwrap_or(false)),
    })
}

/// Writes the remote variable into `state`. Sensitive values never come back
/// from the API, so `known_value` supplies the last value Terraform saw.
fn write_state(state: &mut DynamicValue, variable: &Variable, known_value: Option<String>) {
    let attrs = &variable.attributes;
    let sensitive = attrs.sensitive.unwrap_or(false);
    let value = if sensitive {
        known_value.unwrap_or_default()
    } else {
        attrs.value.clone().unwrap_or_default()
    };

    models::set(state, "id", variable.id());
    models::set(state, "key", attrs.key.clone());
    models::set(state, "category", attrs.category.clone());
    models::set(state, "hcl", attrs.hcl.unwrap_or(false));
    models::set(state, "sensitive", sensitive);
    models::set_remote_string(state, "description", attrs.description.clone());
    models::set(state, "value", value.clone());
    set_readable_value(state, sensitive, Dynamic::String(value));
}

fn set_readable_value(state: &mut DynamicValue, sensitive: bool, value: Dynamic) {
    let readable = if sensitive { Dynamic::Null } else { value };
    models::set(state, "readable_value", readable);
}

#[async_trait]
impl Resource for VariableResource {
    fn type_name(&self) -> &str {
        "tfe_variable"
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
            .version(1)
            .description("Manages a Terraform or environment variable in a workspace or variable set")
            .attribute(id_attribute("The variable ID"))
            .attribute(
                AttributeBuilder::new("key", AttributeType::String)
                    .description("Name of the variable")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("value", AttributeType::String)
                    .description("Value of the variable")
                    .optional()
                    .sensitive()
                    .default(StaticDefault::string(""))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the variable")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("category", AttributeType::String)
                    .description("Whether this is a terraform or env variable")
                    .required()
                    .validator(OneOfValidator::create(&CATEGORIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("hcl", AttributeType::Bool)
                    .description("Whether to evaluate the value as HCL")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sensitive", AttributeType::Bool)
                    .description("Whether the value is write-only")
                    .optional()
                    .default(StaticDefault::bool(false))
                    .plan_modifier(RequiresReplaceIf::create(
                        sensitive_cleared,
                        "A sensitive variable cannot be made non-sensitive; it is recreated",
                    ))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("readable_value", AttributeType::String)
                    .description("The value when the variable is not sensitive, null otherwise")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("ID of the owning workspace")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("variable_set_id", AttributeType::String)
                    .description("ID of the owning variable set")
                    .optional()
                    .plan_modifier(RequiresReplace::create())
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
        ValidateResourceConfigResponse {
            diagnostics: exactly_one_of(&request.config, &["workspace_id", "variable_set_id"]),
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

        let extracted = VariableContainer::from_value(&request.config)
            .and_then(|container| Ok((container, extract_variable_config(&request.config)?)));
        let (container, attributes) = match extracted {
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

        let value = attributes.value.clone();
        tracing::info!(key = ?attributes.key, container = ?container, "Creating variable");
        match container.create(&provider_data.client, attributes).await {
            Ok(variable) => {
                let mut state = request.planned_state;
                write_state(&mut state, &variable, value);
                container.write(&mut state);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating variable", &e));
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

        let container = match VariableContainer::from_value(&request.current_state) {
            Ok(container) => container,
            Err(diag) => {
                diagnostics.push(diag);
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                };
            }
        };

        let new_state = match container.read(&provider_data.client, &id).await {
            Ok(variable) => {
                let known_value = models::optional_string(&request.current_state, "value");
                let mut state = request.current_state.clone();
                write_state(&mut state, &variable, known_value);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading variable", &e));
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
            .and_then(|id| Ok((id, VariableContainer::from_value(&request.prior_state)?)))
            .and_then(|(id, container)| {
                Ok((id, container, extract_variable_config(&request.config)?))
            });
        let (id, container, attributes) = match extracted {
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

        let value = attributes.value.clone();
        match container.update(&provider_data.client, &id, attributes).await {
            Ok(variable) => {
                let mut state = request.planned_state;
                write_state(&mut state, &variable, value);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating variable", &e));
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

        let container = match VariableContainer::from_value(&request.prior_state) {
            Ok(container) => container,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match container.delete(&provider_data.client, &id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting variable", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }

    fn as_modify_plan(&self) -> Option<&dyn ResourceWithModifyPlan> {
        Some(self)
    }

    fn as_upgrade_state(&self) -> Option<&dyn ResourceWithUpgradeState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithModifyPlan for VariableResource {
    /// Keeps `readable_value` in step with `value` and `sensitive`
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        let mut planned = request.proposed_new_state;

        if !planned.is_null() {
            let path = AttributePath::new("value");
            let value = planned.get_value(&path).cloned().unwrap_or(Dynamic::Null);
            match models::optional_bool(&planned, "sensitive") {
                Some(sensitive) => set_readable_value(&mut planned, sensitive, value),
                None => models::set(&mut planned, "readable_value", Dynamic::Unknown),
            }
        }

        ModifyPlanResponse {
            planned_state: planned,
            requires_replace: vec![],
            planned_private: request.prior_private,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithImportState for VariableResource {
    /// Import ID: `organization/workspace-name/var-id` or
    /// `organization/varset-id/var-id`
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let parts = match ids::split_import_id(&request.id, 3) {
            Ok(parts) => parts,
            Err(e) => {
                return ImportResourceStateResponse::error(Diagnostic::error(
                    "Invalid import ID",
                    format!(
                        "{}; import variables as <organization>/<workspace>/<var-id> or <organization>/<varset-id>/<var-id>",
                        e
                    ),
                ))
            }
        };

        let container = if parts[1].starts_with(VARIABLE_SET_PREFIX) {
            VariableContainer::VariableSet(parts[1].clone())
        } else {
            let provider_data = match &self.provider_data {
                Some(data) => data,
                None => return ImportResourceStateResponse::error(not_configured()),
            };
            match provider_data
                .client
                .workspaces()
                .read_by_name(&parts[0], &parts[1])
                .await
            {
                Ok(workspace) => VariableContainer::Workspace(workspace.id().to_string()),
                Err(e) => {
                    return ImportResourceStateResponse::error(api_error("importing variable", &e))
                }
            }
        };

        let mut state = DynamicValue::object();
        models::set(&mut state, "id", parts[2].as_str());
        container.write(&mut state);

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
impl ResourceWithUpgradeState for VariableResource {
    /// Version 0 stored `workspace_id` as `organization/workspace-name`
    async fn upgrade_state(
        &self,
        _ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse {
        let mut state = match request.raw_state.decode() {
            Ok(state) => state,
            Err(e) => {
                return UpgradeResourceStateResponse {
                    upgraded_state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Unable to Read Previously Saved State for UpgradeResourceState",
                        e.to_string(),
                    )],
                }
            }
        };

        if let Some(workspace) = models::optional_string(&state, "workspace_id") {
            if let Ok((organization, name)) = ids::unpack_id(&workspace) {
                let provider_data = match &self.provider_data {
                    Some(data) => data,
                    None => {
                        return UpgradeResourceStateResponse {
                            upgraded_state: DynamicValue::null(),
                            diagnostics: vec![not_configured()],
                        }
                    }
                };

                tracing::info!(workspace = %workspace, "Resolving workspace name in stored variable state");
                match provider_data
                    .client
                    .workspaces()
                    .read_by_name(&organization, &name)
                    .await
                {
                    Ok(ws) => models::set(&mut state, "workspace_id", ws.id()),
                    Err(e) => {
                        return UpgradeResourceStateResponse {
                            upgraded_state: DynamicValue::null(),
                            diagnostics: vec![api_error("upgrading variable state", &e)],
                        }
                    }
                }
            }
        }

        if state.get_value(&AttributePath::new("variable_set_id")).is_none() {
            models::set(&mut state, "variable_set_id", Dynamic::Null);
        }
        let sensitive = models::optional_bool(&state, "sensitive").unwrap_or(false);
        let value = state
            .get_value(&AttributePath::new("value"))
            .cloned()
            .unwrap_or(Dynamic::Null);
        set_readable_value(&mut state, sensitive, value);

        UpgradeResourceStateResponse {
            upgraded_state: state,
            diagnostics: vec![],
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for VariableResource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ResourceObject;
    use tfplug::types::RawState;

    fn variable(sensitive: bool, value: Option<&str>) -> Variable {
        ResourceObject::new(
            "vars",
            VariableAttributes {
                key: Some("region".to_string()),
                value: value.map(str::to_string),
                description: Some(String::new()),
                category: Some("terraform".to_string()),
                hcl: Some(false),
                sensitive: Some(sensitive),
            },
        )
        .with_id("var-1")
    }

    #[test]
    fn container_requires_exactly_one_owner() {
        let mut value = DynamicValue::object();
        assert_eq!(
            VariableContainer::from_value(&value).unwrap_err().summary,
            "Missing workspace_id"
        );

        models::set(&mut value, "variable_set_id", "varset-1");
        assert_eq!(
            VariableContainer::from_value(&value).unwrap(),
            VariableContainer::VariableSet("varset-1".to_string())
        );

        models::set(&mut value, "workspace_id", "ws-1");
        assert!(VariableContainer::from_value(&value).is_err());
    }

    #[test]
    fn sensitive_values_are_kept_from_state() {
        let mut state = DynamicValue::object();
        write_state(&mut state, &variable(true, None), Some("s3cr3t".to_string()));
        assert_eq!(models::optional_string(&state, "value").as_deref(), Some("s3cr3t"));
        assert_eq!(
            state.get_value(&AttributePath::new("readable_value")),
            Some(&Dynamic::Null)
        );

        write_state(&mut state, &variable(false, Some("eu-west-1")), Some("stale".to_string()));
        assert_eq!(models::optional_string(&state, "value").as_deref(), Some("eu-west-1"));
        assert_eq!(
            models::optional_string(&state, "readable_value").as_deref(),
            Some("eu-west-1")
        );
        assert_eq!(models::optional_string(&state, "description"), None);
    }

    #[test]
    fn empty_description_survives_refresh() {
        let mut state = DynamicValue::object();
        models::set(&mut state, "description", "");
        write_state(&mut state, &variable(false, Some("eu-west-1")), None);
        assert_eq!(models::optional_string(&state, "description").as_deref(), Some(""));
    }

    #[test]
    fn clearing_sensitive_forces_replacement() {
        let request = |state: bool, plan: bool| PlanModifierRequest {
            config_value: Dynamic::Bool(plan),
            state_value: Dynamic::Bool(state),
            plan_value: Dynamic::Bool(plan),
            path: AttributePath::new("sensitive"),
            is_create: false,
        };
        assert!(sensitive_cleared(&request(true, false)));
        assert!(!sensitive_cleared(&request(false, true)));
        assert!(!sensitive_cleared(&request(true, true)));
    }

    #[tokio::test]
    async fn validate_requires_one_container() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "key", "region");
        models::set(&mut config, "category", "env");
        let request = |config: DynamicValue| ValidateResourceConfigRequest {
            type_name: "tfe_variable".to_string(),
            config,
            client_capabilities: Default::default(),
        };

        let resource = VariableResource::new();
        let response = resource.validate(Context::new(), request(config.clone())).await;
        assert_eq!(response.diagnostics.len(), 1);

        models::set(&mut config, "workspace_id", "ws-1");
        let response = resource.validate(Context::new(), request(config)).await;
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn import_detects_variable_set_ids_without_lookup() {
        let response = VariableResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tfe_variable".to_string(),
                    id: "acme/varset-abc/var-1".to_string(),
                    client_capabilities: Default::default(),
                    identity: None,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = &response.imported_resources[0].state;
        assert_eq!(models::optional_string(state, "id").as_deref(), Some("var-1"));
        assert_eq!(
            models::optional_string(state, "variable_set_id").as_deref(),
            Some("varset-abc")
        );
    }

    #[tokio::test]
    async fn upgrade_keeps_workspace_ids_and_fills_readable_value() {
        let raw = br#"{"id":"var-1","key":"region","value":"eu-west-1","category":"terraform",
            "hcl":false,"sensitive":false,"workspace_id":"ws-1"}"#;
        let response = VariableResource::new()
            .upgrade_state(
                Context::new(),
                UpgradeResourceStateRequest {
                    type_name: "tfe_variable".to_string(),
                    version: 0,
                    raw_state: RawState::from_json(raw.to_vec()),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = &response.upgraded_state;
        assert_eq!(models::optional_string(state, "workspace_id").as_deref(), Some("ws-1"));
        assert_eq!(
            models::optional_string(state, "readable_value").as_deref(),
            Some("eu-west-1")
        );
    }

    #[tokio::test]
    async fn upgrade_needs_provider_for_workspace_names() {
        let raw = br#"{"id":"var-1","key":"region","workspace_id":"acme/app"}"#;
        let response = VariableResource::new()
            .upgrade_state(
                Context::new(),
                UpgradeResourceStateRequest {
                    type_name: "tfe_variable".to_string(),
                    version: 0,
                    raw_state: RawState::from_json(raw.to_vec()),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
