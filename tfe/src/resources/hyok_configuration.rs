//! Hold Your Own Key configuration resource implementation
//!
//! HYOK endpoints are missing from older Terraform Enterprise releases, so
//! create checks the remote version first.

use crate::api::hyok::{HyokAttributes, HyokConfiguration, HyokLinks, KmsOptions};
use crate::api::oidc::OidcKind;
use crate::models;
use crate::resources::{
    api_error, id_attribute, missing_attribute, not_configured, organization_attribute,
    plan_with_default_organization, require_tfe_version, resolve_organization,
};
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
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
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use tfplug::validator::OneOfValidator;

pub(crate) const HYOK_MINIMUM_VERSION: &str = "1.1.0";
const FEATURE: &str = "Hold Your Own Key";

const KMS_FIELDS: [&str; 3] = ["key_region", "key_location", "key_ring_id"];

#[derive(Default)]
pub struct HyokConfigurationResource {
    provider_data: Option<crate::TfeProviderData>,
}

impl HyokConfigurationResource {
    pub fn new() -> Self {
        Self::default()
    }
}

fn kms_options_type() -> AttributeType {
    AttributeType::object(KMS_FIELDS.map(|name| (name, AttributeType::String)))
}

/// Values in `KMS_FIELDS` order
fn kms_values(options: &KmsOptions) -> [Option<String>; 3] {
    [
        options.key_region.clone(),
        options.key_location.clone(),
        options.key_ring_id.clone(),
    ]
}

fn extract_kms_options(config: &DynamicValue) -> Option<KmsOptions> {
    let options = models::object(config, "kms_options")?;
    Some(KmsOptions {
        key_region: models::non_empty_string(&options, "key_region"),
        key_location: models::non_empty_string(&options, "key_location"),
        key_ring_id: models::non_empty_string(&options, "key_ring_id"),
    })
}

fn extract_hyok_config(config: &DynamicValue) -> Result<HyokAttributes, Diagnostic> {
    let name = models::optional_string(config, "name").ok_or_else(|| missing_attribute("name"))?;
    let kek_id = models::optional_string(config, "kek_id").ok_or_else(|| missing_attribute("kek_id"))?;

    Ok(HyokAttributes {
        name: Some(name),
        kek_id: Some(kek_id),
        kms_options: extract_kms_options(config),
        status: None,
    })
}

fn extract_links(config: &DynamicValue) -> Result<HyokLinks, Diagnostic> {
    let kind = models::optional_string(config, "oidc_configuration_type")
        .ok_or_else(|| missing_attribute("oidc_configuration_type"))?;
    let oidc_kind = OidcKind::from_name(&kind).ok_or_else(|| {
        Diagnostic::error(
            "Invalid oidc_configuration_type",
            format!("unknown OIDC configuration type {:?}", kind),
        )
        .with_attribute(AttributePath::new("oidc_configuration_type"))
    })?;

    Ok(HyokLinks {
        oidc_kind,
        oidc_configuration_id: models::optional_string(config, "oidc_configuration_id")
            .ok_or_else(|| missing_attribute("oidc_configuration_id"))?,
        agent_pool_id: models::optional_string(config, "agent_pool_id")
            .ok_or_else(|| missing_attribute("agent_pool_id"))?,
    })
}

fn write_state(state: &mut DynamicValue, configuration: &HyokConfiguration) {
    let attrs = &configuration.attributes;

    models::set(state, "id", configuration.id());
    models::set(state, "name", attrs.name.clone());
    models::set(state, "kek_id", attrs.kek_id.clone());
    models::set(state, "status", attrs.status.clone());
    if let Some(organization) = configuration.related_id("organization") {
        models::set(state, "organization", organization);
    }
    if let Some(pool) = configuration.related_id("agent-pool") {
        models::set(state, "agent_pool_id", pool);
    }
    if let Some((kind, id)) = configuration.oidc_configuration() {
        models::set(state, "oidc_configuration_type", kind.name());
        models::set(state, "oidc_configuration_id", id);
    }

    let kms_options = attrs
        .kms_options
        .as_ref()
        .filter(|o| **o != KmsOptions::default())
        .map(|options| {
            let fields: HashMap<String, Dynamic> = KMS_FIELDS
                .iter()
                .zip(kms_values(options))
                .map(|(name, value)| (name.to_string(), value.into()))
                .collect();
            Dynamic::Map(fields)
        })
        .unwrap_or(Dynamic::Null);
    models::set(state, "kms_options", kms_options);
}

#[async_trait]
impl Resource for HyokConfigurationResource {
    fn type_name(&self) -> &str {
        "tfe_hyok_configuration"
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
        let oidc_kinds = OidcKind::ALL.map(OidcKind::name);

        let schema = SchemaBuilder::new()
            .version(0)
            .description("Manages a Hold Your Own Key configuration")
            .attribute(id_attribute("The HYOK configuration ID"))
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the HYOK configuration")
                    .required()
                    .build(),
            )
            .attribute(organization_attribute())
            .attribute(
                AttributeBuilder::new("kek_id", AttributeType::String)
                    .description("ID of the key encryption key in the external KMS")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("kms_options", kms_options_type())
                    .description("Provider-specific KMS options")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("oidc_configuration_id", AttributeType::String)
                    .description("ID of the OIDC configuration used to reach the KMS")
                    .required()
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("oidc_configuration_type", AttributeType::String)
                    .description("Kind of the OIDC configuration: aws, gcp, azure or vault")
                    .required()
                    .validator(OneOfValidator::create(&oidc_kinds))
                    .plan_modifier(RequiresReplace::create())
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("agent_pool_id", AttributeType::String)
                    .description("ID of the agent pool that talks to the KMS")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("Lifecycle status of the configuration")
                    .computed()
                    .plan_modifier(UseStateForUnknown::create())
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

        let kind = models::optional_string(config, "oidc_configuration_type")
            .and_then(|k| OidcKind::from_name(&k));
        if let (Some(kind), Some(options)) = (kind, extract_kms_options(config)) {
            let misplaced = match kind {
                OidcKind::Aws => options.key_location.is_some() || options.key_ring_id.is_some(),
                OidcKind::Gcp => options.key_region.is_some(),
                OidcKind::Azure | OidcKind::Vault => options != KmsOptions::default(),
            };
            if misplaced {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid kms_options",
                        format!(
                            "key_region applies to aws and key_location/key_ring_id to gcp; got {} options",
                            kind.name()
                        ),
                    )
                    .with_attribute(AttributePath::new("kms_options")),
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

        if let Err(diag) =
            require_tfe_version(&provider_data.client, HYOK_MINIMUM_VERSION, FEATURE).await
        {
            diagnostics.push(diag);
            return CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            };
        }

        let extracted = resolve_organization(provider_data, &request.planned_state)
            .and_then(|organization| Ok((organization, extract_hyok_config(&request.config)?)))
            .and_then(|(organization, attributes)| {
                Ok((organization, attributes, extract_links(&request.config)?))
            });
        let (organization, attributes, links) = match extracted {
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
            .hyok_configurations()
            .create(&organization, attributes, &links)
            .await
        {
            Ok(configuration) => {
                let mut state = request.planned_state;
                write_state(&mut state, &configuration);
                models::set(&mut state, "organization", organization);
                models::set(&mut state, "oidc_configuration_type", links.oidc_kind.name());
                models::set(&mut state, "oidc_configuration_id", links.oidc_configuration_id);
                models::set(&mut state, "agent_pool_id", links.agent_pool_id);
                CreateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("creating HYOK configuration", &e));
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

        let new_state = match provider_data.client.hyok_configurations().read(&id).await {
            Ok(configuration) => {
                let mut state = request.current_state.clone();
                write_state(&mut state, &configuration);
                Some(state)
            }
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                diagnostics.push(api_error("reading HYOK configuration", &e));
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
            .and_then(|id| Ok((id, extract_hyok_config(&request.config)?)));
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

        let prior_pool = models::optional_string(&request.prior_state, "agent_pool_id");
        let pool = models::optional_string(&request.config, "agent_pool_id");
        let changed_pool = pool.as_deref().filter(|p| prior_pool.as_deref() != Some(*p));

        match provider_data
            .client
            .hyok_configurations()
            .update(&id, attributes, changed_pool)
            .await
        {
            Ok(configuration) => {
                let mut state = request.planned_state;
                write_state(&mut state, &configuration);
                UpdateResourceResponse {
                    new_state: state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
            Err(e) => {
                diagnostics.push(api_error("updating HYOK configuration", &e));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                    new_identity: None,
                }
            }
        }
    }

    /// Keys must be revoked before the configuration can be removed
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

        let configurations = provider_data.client.hyok_configurations();
        let revoked = models::optional_string(&request.prior_state, "status").as_deref() == Some("revoked");
        if !revoked {
            tracing::info!(id = %id, "Revoking HYOK configuration before delete");
            match configurations.revoke(&id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => return DeleteResourceResponse { diagnostics },
                Err(e) => {
                    diagnostics.push(api_error("revoking HYOK configuration", &e));
                    return DeleteResourceResponse { diagnostics };
                }
            }
        }

        match configurations.delete(&id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => diagnostics.push(api_error("deleting HYOK configuration", &e)),
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
impl ResourceWithModifyPlan for HyokConfigurationResource {
    async fn modify_plan(&self, _ctx: Context, request: ModifyPlanRequest) -> ModifyPlanResponse {
        plan_with_default_organization(self.provider_data.as_ref(), request)
    }
}

#[async_trait]
impl ResourceWithImportState for HyokConfigurationResource {
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
impl ResourceWithConfigure for HyokConfigurationResource {
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
