//! Team workspace access resource implementation

use crate::api::teams::TeamAccess;
use crate::ids;
use crate::models;
use crate::resources::{api_error, id_attribute, missing_attribute, not_configured};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::RequiresReplace;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceMetadataRequest,
    ResourceMetadataResponse, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
    UpdateResourceResponse, ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{Diagnostic, DynamicValue};
use tfplug::validator::OneOfValidator;

const ACCESS_LEVELS: [&str; 4] = ["read", "plan", "write", "admin"];

#[derive(Default)]
pub struct TeamAccessResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl TeamAccessResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn extract_access_config(config: &DynamicValue) -> Result<(String, String, String), Diagnostic> {
    let access = models::optional_string(config, "access").ok_or_else(|| missing_attribute("access"))?;
    let team_id =
        models::optional_string(config, "team_id").ok_or_else(|| missing_attribute("team_id"))?;
    let workspace_id = models::optional_string(config, "workspace_id")
        .ok_or_else(|| missing_attribute("workspace_id"))?;
    Ok((access, team_id, workspace_id))
}

fn write_state(state: &mut DynamicValue, access: &TeamAccess) {
    models::set(state, "id", access.id());
    models::set(state, "access", access.attributes.access.as_str());
    if let Some(team_id) = access.related_id("team") {
        models::set(state, "team_id", team_id);
    }
    if let Some(workspace_id) = access.related_id("workspace") {
        models::set(state, "workspace_id", workspace_id);
    }
}

#[async_trait]
impl Resource for TeamAccessResource {
    fn type_name(&self) -> &str {
        "tfe_team_access"
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
            .description("Grants a team access to a workspace")
            .attribute(id_attribute("The team workspace access ID"))
            .attribute(
                AttributeBuilder::new("access", AttributeType::String)
                    .description("Access level: read, plan, write or admin")
                    .required()
                    .validator(OneOfValidator::create(&ACCESS_LEVELS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("team_id", AttributeType::String)
                    .description("ID of the team")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("workspace_id", AttributeType::String)
                    .description("ID of the workspace")
                    .required()
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

        let (access, team_id, workspace_id) = match extract_access_config(&request.config) {
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
            .team_access()
            .add(&access, &team_id, &workspace_id)
            .await
        {
            Ok(team_access) => {
                let mut state = request.planned_state;
                write_state(&mut state, &team_access);
                models::set(&mut state, "team_id", team_id);
                models::set(&mut state, "workspace_id", workspace_id);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("adding team access", &e));
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

        let new_state = match provider_data.client.team_access().read(&id).await {
            Ok(team_access) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &team_access);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading team access", &e));
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

        let id = models::optional_string(&request.prior_state, "id");
        let access = models::optional_string(&request.config, "access");
        let (id, access) = match (id, access) {
            (Some(id), Some(access)) => (id, access),
            (None, _) => {
                diagnostics.push(missing_attribute("id"));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
            (_, None) => {
                diagnostics.push(missing_attribute("access"));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                };
            }
        };

        match provider_data.client.team_access().update(&id, &access).await {
            Ok(team_access) => {
                let mut state = request.planned_state;
                write_state(&mut state, &team_access);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating team access", &e));
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

        match provider_data.client.team_access().remove(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("removing team access", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for TeamAccessResource {
    /// Import ID: `organization/workspace-name/tws-id`
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
                    format!("{}; import team access as <organization>/<workspace>/<tws-id>", e),
                ))
            }
        };

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => return ImportResourceStateResponse::error(not_configured()),
        };

        let workspace = match provider_data
            .client
            .workspaces()
            .read_by_name(&parts[0], &parts[1])
            .await
        {
            Ok(workspace) => workspace,
            Err(e) => {
                return ImportResourceStateResponse::error(api_error("importing team access", &e))
            }
        };

        let mut state = DynamicValue::object();
        models::set(&mut state, "id", parts[2].as_str());
        models::set(&mut state, "workspace_id", workspace.id());

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
impl ResourceWithConfigure for TeamAccessResource {
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
    use crate::api::teams::TeamAccessAttributes;
    use crate::api::{Relationship, ResourceObject};

    #[test]
    fn relationships_fill_ids() {
        let access = ResourceObject::new(
            "team-workspaces",
            TeamAccessAttributes {
                access: "write".to_string(),
            },
        )
        .with_id("tws-1")
        .with_relationship("team", Relationship::one("teams", "team-1"))
        .with_relationship("workspace", Relationship::one("workspaces", "ws-1"));

        let mut state = DynamicValue::object();
        write_state(&mut state, &access);
        assert_eq!(models::optional_string(&state, "access").as_deref(), Some("write"));
        assert_eq!(models::optional_string(&state, "team_id").as_deref(), Some("team-1"));
        assert_eq!(models::optional_string(&state, "workspace_id").as_deref(), Some("ws-1"));
    }

    #[tokio::test]
    async fn import_requires_three_parts() {
        let response = TeamAccessResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tfe_team_access".to_string(),
                    id: "acme/app".to_string(),
                    client_capabilities: Default::default(),
                    identity: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid import ID");
    }
}
