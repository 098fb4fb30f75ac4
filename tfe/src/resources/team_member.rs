//! Team membership resource implementation
//!
//! The ID packs the team and user as `team-id/username`.

use crate::ids::{pack_id, unpack_id};
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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct TeamMemberResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl TeamMemberResource {
    pub fn new() -> Self {
        Self::default()
    }
}

/// (team_id, username), preferring the attributes over the packed id
fn membership(value: &DynamicValue) -> Result<(String, String), Diagnostic> {
    match (
        models::optional_string(value, "team_id"),
        models::optional_string(value, "username"),
    ) {
        (Some(team_id), Some(username)) => Ok((team_id, username)),
        _ => {
            let id = models::optional_string(value, "id").ok_or_else(|| missing_attribute("id"))?;
            unpack_id(&id).map_err(|e| Diagnostic::error("Invalid team member ID", e.to_string()))
        }
    }
}

fn write_state(state: &mut DynamicValue, team_id: &str, username: &str) {
    models::set(state, "id", pack_id(team_id, username));
    models::set(state, "team_id", team_id);
    models::set(state, "username", username);
}

#[async_trait]
impl Resource for TeamMemberResource {
    fn type_name(&self) -> &str {
        "tfe_team_member"
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
            .description("Adds a single user to a team")
            .attribute(id_attribute("team_id/username"))
            .attribute(
                AttributeBuilder::new("team_id", AttributeType::String)
                    .description("ID of the team")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("Name of the user to add")
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
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        for name in ["team_id", "username"] {
            if let Some(value) = models::optional_string(&request.config, name) {
                if value.contains(crate::ids::SEPARATOR) {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Invalid {}", name),
                            format!("{} cannot contain '{}'", name, crate::ids::SEPARATOR),
                        )
                        .with_attribute(AttributePath::new(name)),
                    );
                }
            }
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

        let (team_id, username) = match membership(&request.config) {
            Ok(parts) => parts,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        tracing::info!(team_id = %team_id, username = %username, "Adding team member");
        match provider_data
            .client
            .team_members()
            .add(&team_id, &[username.as_str()])
            .await
        {
            Ok(()) => {
                let mut state = request.planned_state;
                write_state(&mut state, &team_id, &username);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("adding user to team", &e));
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

        let (team_id, username) = match membership(&request.current_state) {
            Ok(parts) => parts,
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

        let new_state = match provider_data.client.team_members().list(&team_id).await {
            Ok(members) if members.contains(&username) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &team_id, &username);
                Some(state)
            }
            Ok(_) => {
                tracing::warn!(team_id = %team_id, username = %username, "User is no longer a team member");
                None
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading team members", &e));
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

    /// Every attribute forces replacement
    async fn update(
        &self,
        _ctx: Context,
        request: UpdateResourceRequest,
    ) -> UpdateResourceResponse {
        UpdateResourceResponse {
            new_state: request.planned_state,
            private: vec![],
            diagnostics: vec![],
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

        let (team_id, username) = match membership(&request.prior_state) {
            Ok(parts) => parts,
            Err(diag) => {
                diagnostics.push(diag);
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .team_members()
            .remove(&team_id, &[username.as_str()])
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("removing user from team", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for TeamMemberResource {
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let (team_id, username) = match unpack_id(&request.id) {
            Ok(parts) => parts,
            Err(e) => {
                return ImportResourceStateResponse::error(Diagnostic::error(
                    "Invalid import ID",
                    format!("{}; import team members as <team-id>/<username>", e),
                ))
            }
        };

        let mut state = DynamicValue::object();
        write_state(&mut state, &team_id, &username);

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
impl ResourceWithConfigure for TeamMemberResource {
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

    #[test]
    fn membership_falls_back_to_packed_id() {
        let mut state = DynamicValue::object();
        models::set(&mut state, "id", "team-1/alice");
        assert_eq!(
            membership(&state).unwrap(),
            ("team-1".to_string(), "alice".to_string())
        );

        models::set(&mut state, "id", "team-1");
        assert_eq!(membership(&state).unwrap_err().summary, "Invalid team member ID");
    }

    #[tokio::test]
    async fn import_rejects_single_part_ids() {
        let response = TeamMemberResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tfe_team_member".to_string(),
                    id: "team-1".to_string(),
                    client_capabilities: Default::default(),
                    identity: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid import ID");
    }

    #[tokio::test]
    async fn import_fills_both_parts() {
        let response = TeamMemberResource::new()
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "tfe_team_member".to_string(),
                    id: "team-1/alice".to_string(),
                    client_capabilities: Default::default(),
                    identity: None,
                },
            )
            .await;
        let state = &response.imported_resources[0].state;
        assert_eq!(models::optional_string(state, "team_id").as_deref(), Some("team-1"));
        assert_eq!(models::optional_string(state, "username").as_deref(), Some("alice"));
    }
}
