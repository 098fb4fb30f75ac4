//! OIDC configuration resources
//!
//! One implementation serves `tfe_aws_oidc_configuration`,
//! `tfe_gcp_oidc_configuration`, `tfe_azure_oidc_configuration` and
//! `tfe_vault_oidc_configuration`. Each kind contributes a table of string
//! fields; schema, request bodies and state all derive from it.

use crate::api::oidc::{OidcConfiguration, OidcKind};
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, resolve_organization,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
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
use tfplug::validator::StringPatternValidator;

/// A kind-specific string attribute
#[derive(Debug, Clone, Copy)]
pub(crate) struct OidcField {
    pub name: &'static str,
    pub api_name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// `(regex, message)` checked by a schema validator
    pub pattern: Option<(&'static str, &'static str)>,
}

const fn field(
    name: &'static str,
    api_name: &'static str,
    description: &'static str,
    required: bool,
) -> OidcField {
    OidcField {
        name,
        api_name,
        description,
        required,
        pattern: None,
    }
}

const AWS_FIELDS: &[OidcField] = &[OidcField {
    name: "role_arn",
    api_name: "role-arn",
    description: "ARN of the IAM role to assume",
    required: true,
    pattern: Some((r"^arn:aws[a-z-]*:iam::\d{12}:role/.+$", "must be an IAM role ARN")),
}];

const GCP_FIELDS: &[OidcField] = &[
    field(
        "service_account_email",
        "service-account-email",
        "Email of the service account to impersonate",
        true,
    ),
    field(
        "project_number",
        "project-number",
        "GCP project number",
        true,
    ),
    field(
        "workload_provider_name",
        "workload-provider-name",
        "Fully qualified workload identity provider name",
        true,
    ),
];

const AZURE_FIELDS: &[OidcField] = &[
    field("client_id", "client-id", "Application (client) ID", true),
    field("subscription_id", "subscription-id", "Azure subscription ID", true),
    field("tenant_id", "tenant-id", "Azure tenant ID", true),
];

const VAULT_FIELDS: &[OidcField] = &[
    field("address", "address", "Address of the Vault server", true),
    field("role", "role", "Vault JWT auth role", true),
    field("namespace", "namespace", "Vault namespace", false),
    field("auth_path", "auth-path", "Mount path of the JWT auth method", false),
    field(
        "encoded_cacert",
        "encoded-cacert",
        "Base64 encoded CA certificate for the Vault server",
        false,
    ),
];

pub(crate) fn fields(kind: OidcKind) -> &'static [OidcField] {
    match kind {
        OidcKind::Aws => AWS_FIELDS,
        OidcKind::Gcp => GCP_FIELDS,
        OidcKind::Azure => AZURE_FIELDS,
        OidcKind::Vault => VAULT_FIELDS,
    }
}

pub fn type_name(kind: OidcKind) -> &'static str {
    match kind {
        OidcKind::Aws => "tfe_aws_oidc_configuration",
        OidcKind::Gcp => "tfe_gcp_oidc_configuration",
        OidcKind::Azure => "tfe_azure_oidc_configuration",
        OidcKind::Vault => "tfe_vault_oidc_configuration",
    }
}

fn label(kind: OidcKind) -> &'static str {
    match kind {
        OidcKind::Aws => "AWS",
        OidcKind::Gcp => "GCP",
        OidcKind::Azure => "Azure",
        OidcKind::Vault => "Vault",
    }
}

pub struct OidcConfigurationResource {
    kind: OidcKind,
    provider_data: Option<crate::TfeProviderData>,
}

impl OidcConfigurationResource {
    pub fn new(kind: OidcKind) -> Self {
        Self {
            kind,
            provider_data: None,
        }
    }

    /// Kebab-case attribute map for the API. Unset optional fields are omitted.
    fn extract_attributes(&self, config: &DynamicValue) -> Result<Map<String, Value>, Diagnostic> {
        let mut attributes = Map::new();
        for field in fields(self.kind) {
            match models::optional_string(config, field.name) {
                Some(value) => {
                    attributes.insert(field.api_name.to_string(), Value::String(value));
                }
                None if field.required => return Err(missing_attribute(field.name)),
                None => {}
            }
        }
        Ok(attributes)
    }

    fn write_state(&self, state: &mut DynamicValue, configuration: &OidcConfiguration) {
        models::set(state, "id", configuration.id());
        if let Some(organization) = configuration.related_id("organization") {
            models::set(state, "organization", organization);
        }
        for field in fields(self.kind) {
            let value = configuration
                .attributes
                .get(field.api_name)
                .and_then(Value::as_str)
                .filter(|v| field.required || !v.is_empty())
                .map(str::to_string);
            models::set(state, field.name, value);
        }
    }

    fn action(&self, verb: &str) -> String {
        format!("{} {} OIDC configuration", verb, label(self.kind))
    }
}

#[async_trait]
impl Resource for OidcConfigurationResource {
    fn type_name(&self) -> &str {
        type_name(self.kind)
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
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description(&format!(
                "Manages the OIDC configuration used for {} workload identity",
                label(self.kind)
            ))
            .attribute(id_attribute("The OIDC configuration ID"))
            .attribute(organization_attribute());

        for field in fields(self.kind) {
            let mut attribute = AttributeBuilder::new(field.name, AttributeType::String)
                .description(field.description);
            attribute = if field.required {
                attribute.required()
            } else {
                attribute.optional()
            };
            if let Some((pattern, message)) = field.pattern {
                match StringPatternValidator::create(pattern, message) {
                    Ok(validator) => attribute = attribute.validator(validator),
                    Err(e) => diagnostics.push(Diagnostic::error("Invalid schema pattern", e.to_string())),
                }
            }
            builder = builder.attribute(attribute.build());
        }

        ResourceSchemaResponse {
            schema: builder.build(),
            diagnostics,
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

        let extracted = resolve_organization(provider_data, &request.planned_state)
            .and_then(|organization| Ok((organization, self.extract_attributes(&request.config)?)));
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
            .oidc_configurations()
            .create(&organization, self.kind, attributes)
            .await
        {
            Ok(configuration) => {
                let mut state = request.planned_state;
                self.write_state(&mut state, &configuration);
                models::set(&mut state, "organization", organization);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error(&self.action("creating"), &e));
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

        let new_state = match provider_data.client.oidc_configurations().read(&id).await {
            Ok(configuration) if OidcKind::from_api_type(&configuration.kind) != Some(self.kind) => {
                diagnostics.push(Diagnostic::error(
                    "Unexpected OIDC configuration type",
                    format!(
                        "{} has type {}, expected {} OIDC configuration",
                        id,
                        configuration.kind,
                        label(self.kind)
                    ),
                ));
                Some(request.current_state)
            }
            Ok(configuration) => {
                let mut state = request.current_state.clone();
                self.write_state(&mut state, &configuration);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error(&self.action("reading"), &e));
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
            .and_then(|id| Ok((id, self.extract_attributes(&request.config)?)));
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

        match provider_data
            .client
            .oidc_configurations()
            .update(&id, self.kind, attributes)
            .await
        {
            Ok(configuration) => {
                let mut state = request.planned_state;
                self.write_state(&mut state, &configuration);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error(&self.action("updating"), &e));
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

        match provider_data.client.oidc_configurations().delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error(&self.action("deleting"), &e)),
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

#[async_trait]
impl ResourceWithModifyPlan for OidcConfigurationResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for OidcConfigurationResource {
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
impl ResourceWithConfigure for OidcConfigurationResource {
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

    #[test]
    fn every_kind_has_a_distinct_type_name() {
        let names: std::collections::HashSet<_> = OidcKind::ALL.into_iter().map(type_name).collect();
        assert_eq!(names.len(), OidcKind::ALL.len());
        for kind in OidcKind::ALL {
            assert!(type_name(kind).contains(kind.name()));
            assert!(!fields(kind).is_empty());
        }
    }

    #[test]
    fn required_fields_must_be_configured() {
        let resource = OidcConfigurationResource::new(OidcKind::Azure);
        let mut config = DynamicValue::object();
        models::set(&mut config, "client_id", "c");
        models::set(&mut config, "subscription_id", "s");
        assert_eq!(
            resource.extract_attributes(&config).unwrap_err().summary,
            "Missing tenant_id"
        );

        models::set(&mut config, "tenant_id", "t");
        let attributes = resource.extract_attributes(&config).unwrap();
        assert_eq!(attributes.get("tenant-id"), Some(&Value::from("t")));
    }

    #[test]
    fn optional_vault_fields_are_omitted_and_read_back_as_null() {
        let resource = OidcConfigurationResource::new(OidcKind::Vault);
        let mut config = DynamicValue::object();
        models::set(&mut config, "address", "https://vault.example.com");
        models::set(&mut config, "role", "tfc");
        let attributes = resource.extract_attributes(&config).unwrap();
        assert!(!attributes.contains_key("namespace"));

        let mut remote = attributes.clone();
        remote.insert("namespace".to_string(), Value::from(""));
        let configuration = ResourceObject::new("vault-oidc-configurations", remote).with_id("voidc-1");
        let mut state = DynamicValue::object();
        resource.write_state(&mut state, &configuration);
        assert_eq!(models::optional_string(&state, "namespace"), None);
        assert_eq!(models::optional_string(&state, "role").as_deref(), Some("tfc"));
    }

    #[tokio::test]
    async fn aws_role_arn_carries_a_pattern_validator() {
        let resource = OidcConfigurationResource::new(OidcKind::Aws);
        let response = resource.schema(Context::new(), ResourceSchemaRequest).await;
        assert!(response.diagnostics.is_empty());

        let role_arn = response.schema.attribute("role_arn").unwrap();
        assert!(role_arn.required);
        assert_eq!(role_arn.validators.len(), 1);
    }
}
