//! Team resource implementation

use crate::api::teams::{OrganizationAccess, Team, TeamAttributes};
use crate::ids;
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
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
use tfplug::validator::OneOfValidator;

const VISIBILITIES: [&str; 2] = ["secret", "organization"];

#[derive(Default)]
pub struct TeamResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl TeamResource {
    pub fn new() -> Self {
        Self::default()
    }
}

pub(crate) fn organization_access_type() -> AttributeType {
    AttributeType::object(
        OrganizationAccess::FIELDS
            .iter()
            .map(|field| (*field, AttributeType::Bool)),
    )
}

#[async_trait]
impl Resource for TeamResource {
    fn type_name(&self) -> &str {
        "tfe_team"
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
            .description("Manages a team")
            .attribute(id_attribute("The team ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the team")
                    .required()
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("visibility", AttributeType::String)
                    .description("secret or organization")
                    .optional()
                    .default(StaticDefault::string("secret"))
                    .validator(OneOfValidator::create(&VISIBILITIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("sso_team_id", AttributeType::String)
                    .description("Identity provider team ID linked to this team")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_member_token_management", AttributeType::Bool)
                    .description("Whether members may manage the team token")
                    .optional()
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("organization_access", organization_access_type())
                    .description("Organization-level permissions granted to the team")
                    .optional()
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

        // Owners are managed by the organization, not by this resource
        if models::optional_string(&request.config, "name").as_deref() == Some("owners") {
            if let Some(access) = extract_organization_access(&request.config) {
                if access != OrganizationAccess::default() {
                    diagnostics.push(
                        Diagnostic::error(
                            "Invalid organization access",
                            "organization_access cannot be set on the owners team",
                        )
                        .with_attribute(AttributePath::new("organization_access")),
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

        let extracted = resolve_organization(provider_data, &request.planned_state)
            .and_then(|organization| Ok((organization, extract_team_config(&request.config)?)));
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
            .teams()
            .create(&organization, attributes)
            .await
        {
            Ok(team) => {
                let mut state = request.planned_state;
                write_state(&mut state, &team);
                models::set(&mut state, "organization", organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating team", &e));
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

        match provider_data.client.teams().read(&id).await {
            Ok(team) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &team);
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
                diagnostics.push(api_error("reading team", &e));
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

        let extracted = models::optional_string(&request.prior_state, "id")
            .ok_or_else(|| missing_attribute("id"))
            .and_then(|id| Ok((id, extract_team_config(&request.config)?)));
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

        match provider_data.client.teams().update(&id, attributes).await {
            Ok(team) => {
                let mut state = request.planned_state;
                write_state(&mut state, &team);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating team", &e));
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

        match provider_data.client.teams().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting team", &e)),
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

fn extract_team_config(config: &DynamicValue) -> Result<TeamAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

    Ok(TeamAttributes {
        name: Some(name),
        visibility: models::optional_string(config, "visibility"),
        sso_team_id: Some(models::optional_string(config, "sso_team_id").unwrap_or_default()),
        allow_member_token_management: models::optional_bool(
            config,
            "allow_member_token_management",
        ),
        organization_access: extract_organization_access(config),
    })
}

/// Unset or null flags inside the object read as false
fn extract_organization_access(config: &DynamicValue) -> Option<OrganizationAccess> {
    let nested = models::object(config, "organization_access")?;
    let mut access = OrganizationAccess::default();
    for field in OrganizationAccess::FIELDS {
        access.set(field, models::optional_bool(&nested, field).unwrap_or(false));
    }
    Some(access)
}

pub(crate) fn organization_access_value(access: &OrganizationAccess) -> HashMap<String, Dynamic> {
    OrganizationAccess::FIELDS
        .iter()
        .map(|field| {
            (
                field.to_string(),
                Dynamic::Bool(access.get(field).unwrap_or(false)),
            )
        })
        .collect()
}

pub(crate) fn write_state(state: &mut DynamicValue, team: &Team) {
    let attrs = &team.attributes;

    models::set(state, "id", team.id());
    models::set(state, "name", attrs.name.clone());
    if let Some(organization) = team.related_id("organization") {
        models::set(state, "organization", organization);
    }
    models::set(state, "visibility", attrs.visibility.clone());
    models::set_remote_string(state, "sso_team_id", attrs.sso_team_id.clone());
    models::set(
        state,
        "allow_member_token_management",
        attrs.allow_member_token_management,
    );
    let access = attrs.organization_access.clone().unwrap_or_default();
    let _ = state.set_map(
        &AttributePath::new("organization_access"),
        organization_access_value(&access),
    );
}

#[async_trait]
impl ResourceWithModifyPlan for TeamResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for TeamResource {
    /// Accepts a team ID or `organization/team-name`
    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let id = if request.id.contains(ids::SEPARATOR) {
            let (organization, name) = match ids::unpack_id(&request.id) {
                Ok(parts) => parts,
                Err(e) => {
                    return ImportResourceStateResponse::error(Diagnostic::error(
                        "Invalid import ID",
                        e.to_string(),
                    ))
                }
            };
            let provider_data = match &self.provider_data {
                Some(data) => data,
                None => return ImportResourceStateResponse::error(not_configured()),
            };
            match provider_data.client.teams().find_by_name(&organization, &name).await {
                Ok(team) => team.id().to_string(),
                Err(e) => return ImportResourceStateResponse::error(api_error("importing team", &e)),
            }
        } else {
            request.id.clone()
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
impl ResourceWithConfigure for TeamResource {
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
    fn partial_access_object_defaults_to_false() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "devs");
        let mut nested = HashMap::new();
        nested.insert("manage_workspaces".to_string(), Dynamic::Bool(true));
        let _ = config.set_map(&AttributePath::new("organization_access"), nested);

        let attributes = extract_team_config(&config).unwrap();
        let access = attributes.organization_access.unwrap();
        assert!(access.manage_workspaces);
        assert!(!access.manage_policies);
    }

    #[test]
    fn unset_access_is_not_sent() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "devs");
        let attributes = extract_team_config(&config).unwrap();
        assert!(attributes.organization_access.is_none());
        assert_eq!(attributes.sso_team_id.as_deref(), Some(""));
    }

    #[test]
    fn access_value_lists_every_flag() {
        let mut access = OrganizationAccess::default();
        access.set("read_projects", true);
        let value = organization_access_value(&access);
        assert_eq!(value.len(), OrganizationAccess::FIELDS.len());
        assert_eq!(value.get("read_projects"), Some(&Dynamic::Bool(true)));
    }

    #[tokio::test]
    async fn owners_team_cannot_set_access() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "owners");
        let mut nested = HashMap::new();
        nested.insert("manage_policies".to_string(), Dynamic::Bool(true));
        let _ = config.set_map(&AttributePath::new("organization_access"), nested);

        let response = TeamResource::new()
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "tfe_team".to_string(),
                    config,
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid organization access");
    }
}
