//! Project resource implementation

use crate::api::projects::{Project, ProjectAttributes};
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use tfplug::context::Context;
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
use tfplug::validator::StringLengthValidator;

#[derive(Default)]
pub struct ProjectResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl ProjectResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &str {
        "tfe_project"
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
            .description("Manages a project")
            .attribute(id_attribute("The project ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the project")
                    .required()
                    .validator(StringLengthValidator::between(3, 40))
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("A description for the project")
                    .optional()
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
            |organization| Ok((organization, self.extract_project_config(&request.config)?)),
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
            .projects()
            .create(&organization, attributes)
            .await
        {
            Ok(project) => {
                let mut state = request.planned_state;
                write_state(&mut state, &project, &organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating project", &e));
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

        match provider_data.client.projects().read(&id).await {
            Ok(project) => {
                let organization = project
                    .related_id("organization")
                    .map(str::to_string)
                    .or_else(|| models::optional_string(&request.current_state, "organization"))
                    .unwrap_or_default();
                let mut state = request.current_state.clone();
                write_state(&mut state, &project, &organization);
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
                diagnostics.push(api_error("reading project", &e));
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
            .and_then(|id| Ok((id, self.extract_project_config(&request.config)?)));
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

        match provider_data.client.projects().update(&id, attributes).await {
            Ok(project) => {
                let organization =
                    models::optional_string(&request.planned_state, "organization").unwrap_or_default();
                let mut state = request.planned_state;
                write_state(&mut state, &project, &organization);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating project", &e));
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

        match provider_data.client.projects().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting project", &e)),
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

impl ProjectResource {
    fn extract_project_config(&self, config: &DynamicValue) -> Result<ProjectAttributes, Diagnostic> {
        let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

        Ok(ProjectAttributes {
            name: Some(name),
            description: Some(models::optional_string(config, "description").unwrap_or_default()),
        })
    }
}

pub(crate) fn write_state(state: &mut DynamicValue, project: &Project, organization: &str) {
    models::set(state, "id", project.id());
    models::set(state, "name", project.attributes.name.clone());
    models::set(state, "organization", organization);
    models::set_remote_string(state, "description", project.attributes.description.clone());
}

#[async_trait]
impl ResourceWithModifyPlan for ProjectResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for ProjectResource {
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
impl ResourceWithConfigure for ProjectResource {
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
    use crate::api::{Relationship, ResourceObject};

    #[test]
    fn empty_description_reads_as_null() {
        let project = ResourceObject::new(
            "projects",
            ProjectAttributes {
                name: Some("platform".to_string()),
                description: Some(String::new()),
            },
        )
        .with_id("prj-1")
        .with_relationship("organization", Relationship::one("organizations", "acme"));

        let mut state = DynamicValue::object();
        write_state(&mut state, &project, "acme");
        assert_eq!(models::optional_string(&state, "id").as_deref(), Some("prj-1"));
        assert_eq!(models::optional_string(&state, "description"), None);
        assert!(state.get_value(&AttributePath::new("description")).is_some());
    }
}
