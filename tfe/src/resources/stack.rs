//! Stack resource implementation

use crate::api::stacks::{Stack, StackAttributes, StackVcsRepo};
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, require_tfe_version,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::exactly_one_of;

pub(crate) const STACKS_MINIMUM_VERSION: &str = "1.0.0";

#[derive(Default)]
pub struct StackResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl StackResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn vcs_repo_type() -> AttributeType {
    AttributeType::object([
        ("identifier", AttributeType::String),
        ("branch", AttributeType::String),
        ("oauth_token_id", AttributeType::String),
        ("github_app_installation_id", AttributeType::String),
    ])
}

fn extract_vcs_repo(config: &DynamicValue) -> Result<Option<StackVcsRepo>, Diagnostic> {
    let repo = match models::object(config, "vcs_repo") {
        Some(repo) => repo,
        None => return Ok(None),
    };

    Ok(Some(StackVcsRepo {
        identifier: models::optional_string(&repo, "identifier")
            .ok_or_else(|| missing_attribute("vcs_repo.identifier"))?,
        branch: models::non_empty_string(&repo, "branch"),
        oauth_token_id: models::non_empty_string(&repo, "oauth_token_id"),
        github_app_installation_id: models::non_empty_string(&repo, "github_app_installation_id"),
    }))
}

fn extract_stack_config(config: &DynamicValue) -> Result<StackAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;

    Ok(StackAttributes {
        name: Some(name),
        description: Some(models::optional_string(config, "description").unwrap_or_default()),
        vcs_repo: extract_vcs_repo(config)?,
        ..Default::default()
    })
}

fn write_state(state: &mut DynamicValue, stack: &Stack) {
    let attrs = &stack.attributes;

    models::set(state, "id", stack.id());
    models::set(state, "name", attrs.name.clone());
    models::set_remote_string(state, "description", attrs.description.clone());
    if let Some(project_id) = stack.related_id("project") {
        models::set(state, "project_id", project_id);
    }

    let vcs_repo = attrs
        .vcs_repo
        .as_ref()
        .map(|repo| {
            let mut fields = HashMap::new();
            fields.insert("identifier".to_string(), Dynamic::from(repo.identifier.as_str()));
            fields.insert("branch".to_string(), repo.branch.clone().into());
            fields.insert("oauth_token_id".to_string(), repo.oauth_token_id.clone().into());
            fields.insert(
                "github_app_installation_id".to_string(),
                repo.github_app_installation_id.clone().into(),
            );
            Dynamic::Map(fields)
        })
        .unwrap_or(Dynamic::Null);
    models::set(state, "vcs_repo", vcs_repo);

    models::set_strings(
        state,
        "deployment_names",
        attrs.deployment_names.clone().unwrap_or_default(),
    );
    models::set(state, "created_at", models::timestamp(attrs.created_at));
    models::set(state, "updated_at", models::timestamp(attrs.updated_at));
}

#[async_trait]
impl Resource for StackResource {
    fn type_name(&self) -> &str {
        "tfe_stack"
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
            .description("Manages a Terraform stack within a project")
            .attribute(id_attribute("The stack ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the stack")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("project_id", AttributeType::String)
                    .description("ID of the project that owns the stack")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description of the stack")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vcs_repo", vcs_repo_type())
                    .description("Repository holding the stack configuration")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("deployment_names", AttributeType::string_set())
                    .description("Deployments defined by the stack configuration")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created_at", AttributeType::String)
                    .description("When the stack was created")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("updated_at", AttributeType::String)
                    .description("When the stack was last updated")
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

        if let Some(repo) = models::object(&request.config, "vcs_repo") {
            diagnostics.extend(
                exactly_one_of(&repo, &["oauth_token_id", "github_app_installation_id"])
                    .into_iter()
                    .map(|d| d.with_attribute(AttributePath::new("vcs_repo"))),
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

        if let Err(diag) =
            require_tfe_version(&provider_data.client, STACKS_MINIMUM_VERSION, "Stacks").await
        {
            diagnostics.push(diag);
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        }

        let extracted = models::optional_string(&request.config, "project_id")
            .ok_or_else(|| missing_attribute("project_id"))
            .and_then(|project_id| Ok((project_id, extract_stack_config(&request.config)?)));
        let (project_id, attributes) = match extracted {
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

        match provider_data.client.stacks().create(&project_id, attributes).await {
            Ok(stack) => {
                let mut state = request.planned_state;
                write_state(&mut state, &stack);
                models::set(&mut state, "project_id", project_id);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating stack", &e));
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

        let new_state = match provider_data.client.stacks().read(&id).await {
            Ok(stack) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &stack);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading stack", &e));
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
            .and_then(|id| Ok((id, extract_stack_config(&request.config)?)));
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

        match provider_data.client.stacks().update(&id, attributes).await {
            Ok(stack) => {
                let mut state = request.planned_state;
                write_state(&mut state, &stack);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating stack", &e));
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

        match provider_data.client.stacks().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting stack", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithImportState for StackResource {
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
impl ResourceWithConfigure for StackResource {
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

    fn repo(fields: &[(&str, &str)]) -> Dynamic {
        Dynamic::Map(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), Dynamic::from(*v)))
                .collect(),
        )
    }

    async fn validate(config: DynamicValue) -> Vec<Diagnostic> {
        StackResource::new()
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "tfe_stack".to_string(),
                    config,
                    client_capabilities: Default::default(),
                },
            )
            .await
            .diagnostics
    }

    #[tokio::test]
    async fn vcs_repo_needs_one_credential() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "network");
        models::set(&mut config, "vcs_repo", repo(&[("identifier", "acme/network")]));
        assert_eq!(validate(config.clone()).await.len(), 1);

        models::set(
            &mut config,
            "vcs_repo",
            repo(&[("identifier", "acme/network"), ("oauth_token_id", "ot-1")]),
        );
        assert!(validate(config.clone()).await.is_empty());

        models::set(
            &mut config,
            "vcs_repo",
            repo(&[
                ("identifier", "acme/network"),
                ("oauth_token_id", "ot-1"),
                ("github_app_installation_id", "ghain-1"),
            ]),
        );
        assert_eq!(validate(config).await.len(), 1);
    }

    #[test]
    fn state_carries_computed_fields() {
        let stack = ResourceObject::new(
            "stacks",
            StackAttributes {
                name: Some("network".to_string()),
                description: Some(String::new()),
                vcs_repo: Some(StackVcsRepo {
                    identifier: "acme/network".to_string(),
                    branch: Some("main".to_string()),
                    oauth_token_id: Some("ot-1".to_string()),
                    github_app_installation_id: None,
                }),
                deployment_names: Some(vec!["prod".to_string(), "dev".to_string()]),
                created_at: None,
                updated_at: None,
            },
        )
        .with_id("st-1")
        .with_relationship("project", Relationship::one("projects", "prj-1"));

        let mut state = DynamicValue::object();
        write_state(&mut state, &stack);
        assert_eq!(models::optional_string(&state, "project_id").as_deref(), Some("prj-1"));
        assert_eq!(
            models::string_set(&state, "deployment_names"),
            Some(vec!["dev".to_string(), "prod".to_string()])
        );
        let repo = models::object(&state, "vcs_repo").unwrap();
        assert_eq!(models::optional_string(&repo, "branch").as_deref(), Some("main"));
        assert_eq!(models::optional_string(&state, "description"), None);
    }

    #[test]
    fn vcs_repo_requires_identifier() {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "network");
        models::set(&mut config, "vcs_repo", repo(&[("branch", "main")]));
        assert_eq!(
            extract_stack_config(&config).unwrap_err().summary,
            "Missing vcs_repo.identifier"
        );
    }
}
