//! Organization resource implementation

use crate::api::organizations::{Organization, OrganizationAttributes};
use crate::models;
use crate::resources::{api_error, id_attribute, missing_attribute, not_configured};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::import::import_state_passthrough_id;
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
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};
use tfplug::validator::{NumberRangeValidator, OneOfValidator};

const AUTH_POLICIES: [&str; 2] = ["password", "two_factor_mandatory"];

#[derive(Default)]
pub struct OrganizationResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl OrganizationResource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Resource for OrganizationResource {
    fn type_name(&self) -> &str {
        "tfe_organization"
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
            .description("Manages an organization")
            .attribute(id_attribute("The organization name"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the organization")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("email", AttributeType::String)
                    .description("Admin email address")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("session_timeout_minutes", AttributeType::Number)
                    .description("Session timeout after inactivity, in minutes")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::between(1.0, 20160.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("session_remember_minutes", AttributeType::Number)
                    .description("Session expiration, in minutes")
                    .optional()
                    .computed()
                    .validator(NumberRangeValidator::between(1.0, 20160.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("collaborator_auth_policy", AttributeType::String)
                    .description("Authentication policy: password or two_factor_mandatory")
                    .optional()
                    .computed()
                    .validator(OneOfValidator::create(&AUTH_POLICIES))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("cost_estimation_enabled", AttributeType::Bool)
                    .description("Whether cost estimation runs for all workspaces")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("assessments_enforced", AttributeType::Bool)
                    .description("Whether health assessments are enforced for all workspaces")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_force_delete_workspaces", AttributeType::Bool)
                    .description("Whether admins may delete workspaces that still manage resources")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("external_id", AttributeType::String)
                    .description("The organization's external identifier")
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

        if let Some(email) = models::optional_string(&request.config, "email") {
            if !email.contains('@') {
                diagnostics.push(
                    Diagnostic::error("Invalid email", format!("{:?} is not an email address", email))
                        .with_attribute(AttributePath::new("email")),
                );
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

        let attributes = match self.extract_organization_config(&request.config) {
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

        tracing::info!(name = ?attributes.name, "Creating organization");
        match provider_data.client.organizations().create(attributes).await {
            Ok(organization) => {
                let mut state = request.planned_state;
                write_state(&mut state, &organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating organization", &e));
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

        let name = match models::optional_string(&request.current_state, "id") {
            Some(name) => name,
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

        match provider_data.client.organizations().read(&name).await {
            Ok(organization) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &organization);
                ReadResourceResponse {
                    new_state: Some(state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(name = %name, "Organization no longer exists");
                ReadResourceResponse {
                    new_state: None,
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("reading organization", &e));
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

        // Renames address the organization by its current name
        let current_name = match models::optional_string(&request.prior_state, "id") {
            Some(name) => name,
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

        let attributes = match self.extract_organization_config(&request.config) {
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

        match provider_data
            .client
            .organizations()
            .update(&current_name, attributes)
            .await
        {
            Ok(organization) => {
                let mut state = request.planned_state;
                write_state(&mut state, &organization);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating organization", &e));
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

        let name = match models::optional_string(&request.prior_state, "id") {
            Some(name) => name,
            None => return DeleteResourceResponse { diagnostics },
        };

        match provider_data.client.organizations().delete(&name).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting organization", &e)),
        }

        DeleteResourceResponse { diagnostics }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }
}

impl OrganizationResource {
    fn extract_organization_config(
        &self,
        config: &DynamicValue,
    ) -> Result<OrganizationAttributes, Diagnostic> {
        let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;
        let email =
            models::optional_string(config, "email").ok_or_else(|| missing_attribute("email"))?;

        Ok(OrganizationAttributes {
            name: Some(name),
            email: Some(email),
            session_timeout: models::optional_i64(config, "session_timeout_minutes"),
            session_remember: models::optional_i64(config, "session_remember_minutes"),
            collaborator_auth_policy: models::optional_string(config, "collaborator_auth_policy"),
            cost_estimation_enabled: models::optional_bool(config, "cost_estimation_enabled"),
            assessments_enforced: models::optional_bool(config, "assessments_enforced"),
            allow_force_delete_workspaces: models::optional_bool(
                config,
                "allow_force_delete_workspaces",
            ),
            external_id: None,
        })
    }
}

pub(crate) fn write_state(state: &mut DynamicValue, organization: &Organization) {
    let attrs = &organization.attributes;
    let name = attrs
        .name
        .clone()
        .unwrap_or_else(|| organization.id().to_string());

    models::set(state, "id", name.as_str());
    models::set(state, "name", name);
    models::set(state, "email", attrs.email.clone());
    models::set(state, "session_timeout_minutes", attrs.session_timeout);
    models::set(state, "session_remember_minutes", attrs.session_remember);
    models::set(state, "collaborator_auth_policy", attrs.collaborator_auth_policy.clone());
    models::set(state, "cost_estimation_enabled", attrs.cost_estimation_enabled);
    models::set(state, "assessments_enforced", attrs.assessments_enforced);
    models::set(
        state,
        "allow_force_delete_workspaces",
        attrs.allow_force_delete_workspaces,
    );
    models::set(state, "external_id", attrs.external_id.clone());
}

#[async_trait]
impl ResourceWithImportState for OrganizationResource {
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
impl ResourceWithConfigure for OrganizationResource {
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

    fn config() -> DynamicValue {
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "acme");
        models::set(&mut config, "email", "admin@acme.test");
        models::set(&mut config, "session_timeout_minutes", 60i64);
        config
    }

    #[test]
    fn extract_maps_minutes_to_api_fields() {
        let attributes = OrganizationResource::new()
            .extract_organization_config(&config())
            .unwrap();
        assert_eq!(attributes.name.as_deref(), Some("acme"));
        assert_eq!(attributes.session_timeout, Some(60));
        assert_eq!(attributes.session_remember, None);
    }

    #[test]
    fn extract_requires_email() {
        let mut config = config();
        models::set(&mut config, "email", tfplug::types::Dynamic::Null);
        let diag = OrganizationResource::new()
            .extract_organization_config(&config)
            .unwrap_err();
        assert_eq!(diag.summary, "Missing email");
    }

    #[tokio::test]
    async fn validate_rejects_malformed_email() {
        let mut config = config();
        models::set(&mut config, "email", "not-an-email");
        let response = OrganizationResource::new()
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "tfe_organization".to_string(),
                    config,
                    client_capabilities: Default::default(),
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Invalid email");
    }

    #[tokio::test]
    async fn create_without_configuration_fails() {
        let response = OrganizationResource::new()
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "tfe_organization".to_string(),
                    planned_state: config(),
                    config: config(),
                    planned_private: vec![],
                    provider_meta: None,
                },
            )
            .await;
        assert_eq!(response.diagnostics[0].summary, "Provider not configured");
    }
}
