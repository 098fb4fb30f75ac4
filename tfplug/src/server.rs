//! In-process provider server
//!
//! ProviderServer owns one provider and runs the framework half of every
//! Terraform operation: schema collection, schema-level validation, planning
//! (defaults, unknown computed values, plan modifiers), apply dispatch, import
//! and state upgrades. Resources and data sources are built per request from
//! the provider's factories and configured with the stored provider data.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceSchemaRequest, DataSourceWithConfigure,
    ReadDataSourceRequest, ReadDataSourceResponse, ValidateDataSourceConfigRequest,
    ValidateDataSourceConfigResponse,
};
use crate::error::{Result, TfplugError};
use crate::provider::{
    ConfigureProviderRequest, DataSourceFactory, Provider, ProviderSchemaRequest,
    ResourceFactory, ValidateProviderConfigRequest,
};
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource, ModifyPlanRequest,
    ReadResourceRequest, ReadResourceResponse, ResourceSchemaRequest, ResourceWithConfigure,
    UpdateResourceRequest, UpgradeResourceStateRequest, UpgradeResourceStateResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use crate::plan_modifier::sets_equal;
use crate::schema::{
    AttributeType, DefaultRequest, PlanModifierRequest, Schema, ValidatorRequest,
};
use crate::types::{has_errors, AttributePath, Diagnostic, Dynamic, DynamicValue};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Log level for the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub enable_logging: bool,
    /// Used when TF_LOG_PROVIDER is not set
    pub log_level: LogLevel,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_logging: true,
            log_level: LogLevel::Info,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_logging(mut self) -> Self {
        self.enable_logging = false;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }
}

/// Install a stderr fmt subscriber. Terraform owns stdout.
///
/// The filter comes from TF_LOG_PROVIDER when set, else from the config.
pub fn init_logging(config: &ServerConfig) -> Result<()> {
    if !config.enable_logging {
        return Ok(());
    }

    let filter = tracing_subscriber::EnvFilter::try_from_env("TF_LOG_PROVIDER")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| TfplugError::LoggingError(e.to_string()))
}

pub struct GetProviderSchemaResponse {
    pub provider: Schema,
    pub resource_schemas: HashMap<String, Schema>,
    pub data_source_schemas: HashMap<String, Schema>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct PlanResourceChangeRequest {
    pub type_name: String,
    /// Null when the resource is being created
    pub prior_state: DynamicValue,
    /// Null when the resource is being destroyed
    pub proposed_new_state: DynamicValue,
    pub config: DynamicValue,
    pub prior_private: Vec<u8>,
}

pub struct PlanResourceChangeResponse {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub planned_private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ApplyResourceChangeRequest {
    pub type_name: String,
    pub prior_state: DynamicValue,
    /// Null when the resource is being destroyed
    pub planned_state: DynamicValue,
    pub config: DynamicValue,
    pub planned_private: Vec<u8>,
}

pub struct ApplyResourceChangeResponse {
    pub new_state: DynamicValue,
    pub private: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

type ProviderData = Arc<dyn Any + Send + Sync>;

pub struct ProviderServer<P: Provider> {
    provider: RwLock<P>,
    provider_data: RwLock<Option<ProviderData>>,
    resources: HashMap<String, ResourceFactory>,
    data_sources: HashMap<String, DataSourceFactory>,
}

impl<P: Provider> ProviderServer<P> {
    pub fn new(provider: P) -> Self {
        let resources = provider.resources();
        let data_sources = provider.data_sources();
        Self {
            provider: RwLock::new(provider),
            provider_data: RwLock::new(None),
            resources,
            data_sources,
        }
    }

    pub fn resource_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn data_source_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data_sources.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn is_configured(&self) -> bool {
        self.provider_data.read().await.is_some()
    }

    pub async fn get_provider_schema(&self, ctx: Context) -> GetProviderSchemaResponse {
        let provider = self.provider.read().await;
        let provider_schema = provider.schema(ctx.clone(), ProviderSchemaRequest).await;
        let mut diagnostics = provider_schema.diagnostics;

        let mut resource_schemas = HashMap::new();
        for (name, factory) in &self.resources {
            let response = factory().schema(ctx.clone(), ResourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            resource_schemas.insert(name.clone(), response.schema);
        }

        let mut data_source_schemas = HashMap::new();
        for (name, factory) in &self.data_sources {
            let response = factory().schema(ctx.clone(), DataSourceSchemaRequest).await;
            diagnostics.extend(response.diagnostics);
            data_source_schemas.insert(name.clone(), response.schema);
        }

        GetProviderSchemaResponse {
            provider: provider_schema.schema,
            resource_schemas,
            data_source_schemas,
            diagnostics,
        }
    }

    pub async fn validate_provider_config(
        &self,
        ctx: Context,
        config: DynamicValue,
    ) -> Vec<Diagnostic> {
        let provider = self.provider.read().await;
        let schema = provider
            .schema(ctx.clone(), ProviderSchemaRequest)
            .await
            .schema;

        let mut diagnostics = validate_config(&schema, &config);
        if has_errors(&diagnostics) {
            return diagnostics;
        }

        let response = provider
            .validate(ctx, ValidateProviderConfigRequest { config })
            .await;
        diagnostics.extend(response.diagnostics);
        diagnostics
    }

    pub async fn configure_provider(
        &self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> Vec<Diagnostic> {
        info!(terraform_version = %request.terraform_version, "Configuring provider");

        let mut provider = self.provider.write().await;
        let response = provider.configure(ctx, request).await;

        if has_errors(&response.diagnostics) {
            warn!("Provider configuration failed");
        } else {
            *self.provider_data.write().await = response.provider_data;
        }
        response.diagnostics
    }

    pub async fn validate_resource_config(
        &self,
        ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let resource = match self.new_resource(&request.type_name) {
            Ok(resource) => resource,
            Err(diagnostic) => {
                return ValidateResourceConfigResponse {
                    diagnostics: vec![diagnostic],
                }
            }
        };

        let schema = resource
            .schema(ctx.clone(), ResourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_config(&schema, &request.config);
        if has_errors(&diagnostics) {
            return ValidateResourceConfigResponse { diagnostics };
        }

        diagnostics.extend(resource.validate(ctx, request).await.diagnostics);
        ValidateResourceConfigResponse { diagnostics }
    }

    pub async fn validate_data_source_config(
        &self,
        ctx: Context,
        request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        let data_source = match self.new_data_source(&request.type_name) {
            Ok(data_source) => data_source,
            Err(diagnostic) => {
                return ValidateDataSourceConfigResponse {
                    diagnostics: vec![diagnostic],
                }
            }
        };

        let schema = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_config(&schema, &request.config);
        if has_errors(&diagnostics) {
            return ValidateDataSourceConfigResponse { diagnostics };
        }

        diagnostics.extend(data_source.validate(ctx, request).await.diagnostics);
        ValidateDataSourceConfigResponse { diagnostics }
    }

    pub async fn plan_resource_change(
        &self,
        ctx: Context,
        request: PlanResourceChangeRequest,
    ) -> PlanResourceChangeResponse {
        debug!(type_name = %request.type_name, "Planning resource change");

        if request.proposed_new_state.is_null() {
            return PlanResourceChangeResponse {
                planned_state: DynamicValue::null(),
                requires_replace: vec![],
                planned_private: request.prior_private,
                diagnostics: vec![],
            };
        }

        let resource = match self.configured_resource(ctx.clone(), &request.type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return PlanResourceChangeResponse {
                    planned_state: request.proposed_new_state,
                    requires_replace: vec![],
                    planned_private: request.prior_private,
                    diagnostics,
                }
            }
        };

        let schema = resource
            .schema(ctx.clone(), ResourceSchemaRequest)
            .await
            .schema;
        let is_create = request.prior_state.is_null();
        let mut planned = request.proposed_new_state.clone();
        let mut diagnostics = vec![];

        // Computed attributes left out of config: default, else prior value
        let mut unset_computed = vec![];
        for attr in &schema.block.attributes {
            if !attr.computed || !attribute_value(&request.config, &attr.name).is_null() {
                continue;
            }
            let path = AttributePath::new(&attr.name);
            let value = match &attr.default {
                Some(default) => {
                    default
                        .default_value(DefaultRequest { path: path.clone() })
                        .value
                }
                None if is_create => Dynamic::Unknown,
                None => {
                    unset_computed.push(path.clone());
                    attribute_value(&request.prior_state, &attr.name)
                }
            };
            let _ = planned.set_value(&path, value);
        }

        // Sets with the same members keep the prior element order
        if !is_create {
            for attr in &schema.block.attributes {
                if !matches!(attr.r#type, AttributeType::Set(_)) {
                    continue;
                }
                let prior_value = attribute_value(&request.prior_state, &attr.name);
                if sets_equal(&attribute_value(&planned, &attr.name), &prior_value) {
                    let _ = planned.set_value(&AttributePath::new(&attr.name), prior_value);
                }
            }
        }

        // A change anywhere invalidates computed values carried over from state
        if !is_create && planned != request.prior_state {
            for path in &unset_computed {
                let _ = planned.mark_unknown(path);
            }
        }

        let mut requires_replace = vec![];
        for attr in &schema.block.attributes {
            if attr.plan_modifiers.is_empty() {
                continue;
            }
            let path = AttributePath::new(&attr.name);
            let config_value = attribute_value(&request.config, &attr.name);
            let state_value = attribute_value(&request.prior_state, &attr.name);
            let mut plan_value = attribute_value(&planned, &attr.name);
            let mut replace = false;

            for modifier in &attr.plan_modifiers {
                let response = modifier.modify(PlanModifierRequest {
                    config_value: config_value.clone(),
                    state_value: state_value.clone(),
                    plan_value,
                    path: path.clone(),
                    is_create,
                });
                plan_value = response.plan_value;
                replace |= response.requires_replace;
                diagnostics.extend(response.diagnostics);
            }

            if replace {
                debug!(type_name = %request.type_name, attribute = %path, "Attribute requires replacement");
                requires_replace.push(path.clone());
            }
            let _ = planned.set_value(&path, plan_value);
        }

        let mut planned_private = request.prior_private.clone();
        if let Some(modifier) = resource.as_modify_plan() {
            let response = modifier
                .modify_plan(
                    ctx,
                    ModifyPlanRequest {
                        type_name: request.type_name.clone(),
                        config: request.config.clone(),
                        prior_state: request.prior_state.clone(),
                        proposed_new_state: planned,
                        prior_private: request.prior_private.clone(),
                        provider_meta: None,
                    },
                )
                .await;
            planned = response.planned_state;
            planned_private = response.planned_private;
            for path in response.requires_replace {
                if !requires_replace.contains(&path) {
                    requires_replace.push(path);
                }
            }
            diagnostics.extend(response.diagnostics);
        }

        PlanResourceChangeResponse {
            planned_state: planned,
            requires_replace,
            planned_private,
            diagnostics,
        }
    }

    pub async fn apply_resource_change(
        &self,
        ctx: Context,
        request: ApplyResourceChangeRequest,
    ) -> ApplyResourceChangeResponse {
        let type_name = request.type_name.clone();

        let resource = match self.configured_resource(ctx.clone(), &type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ApplyResourceChangeResponse {
                    new_state: request.prior_state,
                    private: request.planned_private,
                    diagnostics,
                }
            }
        };

        if request.planned_state.is_null() {
            info!(type_name = %type_name, "Deleting resource");
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name,
                        prior_state: request.prior_state.clone(),
                        planned_private: request.planned_private,
                        provider_meta: None,
                    },
                )
                .await;
            let new_state = if has_errors(&response.diagnostics) {
                request.prior_state
            } else {
                DynamicValue::null()
            };
            return ApplyResourceChangeResponse {
                new_state,
                private: vec![],
                diagnostics: response.diagnostics,
            };
        }

        if request.prior_state.is_null() {
            info!(type_name = %type_name, "Creating resource");
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name,
                        planned_state: request.planned_state,
                        config: request.config,
                        planned_private: request.planned_private,
                        provider_meta: None,
                    },
                )
                .await;
            let mut diagnostics = response.diagnostics;
            if !has_errors(&diagnostics) {
                diagnostics.extend(unknown_values_after_apply(&response.new_state));
            }
            return ApplyResourceChangeResponse {
                new_state: response.new_state,
                private: response.private,
                diagnostics,
            };
        }

        info!(type_name = %type_name, "Updating resource");
        let response = resource
            .update(
                ctx,
                UpdateResourceRequest {
                    type_name,
                    prior_state: request.prior_state.clone(),
                    planned_state: request.planned_state,
                    config: request.config,
                    planned_private: request.planned_private,
                    provider_meta: None,
                    planned_identity: None,
                },
            )
            .await;

        let mut diagnostics = response.diagnostics;
        let new_state = if has_errors(&diagnostics) && response.new_state.is_null() {
            request.prior_state
        } else {
            if !has_errors(&diagnostics) {
                diagnostics.extend(unknown_values_after_apply(&response.new_state));
            }
            response.new_state
        };

        ApplyResourceChangeResponse {
            new_state,
            private: response.private,
            diagnostics,
        }
    }

    pub async fn read_resource(
        &self,
        ctx: Context,
        request: ReadResourceRequest,
    ) -> ReadResourceResponse {
        let type_name = request.type_name.clone();

        let resource = match self.configured_resource(ctx.clone(), &type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    diagnostics,
                    private: request.private,
                    deferred: None,
                    new_identity: None,
                }
            }
        };

        let response = resource.read(ctx, request).await;
        if response.new_state.is_none() && !has_errors(&response.diagnostics) {
            info!(type_name = %type_name, "Remote object no longer exists, removing from state");
        }
        response
    }

    /// Import, then read every imported object so state is complete
    pub async fn import_resource_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let type_name = request.type_name.clone();
        info!(type_name = %type_name, id = %request.id, "Importing resource");

        let resource = match self.configured_resource(ctx.clone(), &type_name).await {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return ImportResourceStateResponse {
                    diagnostics,
                    ..ImportResourceStateResponse::new()
                }
            }
        };

        let importer = match resource.as_import_state() {
            Some(importer) => importer,
            None => {
                return ImportResourceStateResponse::error(Diagnostic::error(
                    "Resource Import Not Implemented",
                    format!("{} does not support import", type_name),
                ))
            }
        };

        let client_capabilities = request.client_capabilities.clone();
        let mut response = importer.import_state(ctx.clone(), request).await;
        if has_errors(&response.diagnostics) {
            return response;
        }

        let mut imported = vec![];
        for object in std::mem::take(&mut response.imported_resources) {
            let read = resource
                .read(
                    ctx.clone(),
                    ReadResourceRequest {
                        type_name: object.type_name.clone(),
                        current_state: object.state,
                        private: object.private,
                        provider_meta: None,
                        client_capabilities: client_capabilities.clone(),
                        current_identity: object.identity.clone(),
                    },
                )
                .await;
            response.diagnostics.extend(read.diagnostics);

            match read.new_state {
                Some(state) => imported.push(ImportedResource {
                    type_name: object.type_name,
                    state,
                    private: read.private,
                    identity: read.new_identity.or(object.identity),
                }),
                None => response.diagnostics.push(Diagnostic::error(
                    "Cannot import non-existent remote object",
                    format!(
                        "While attempting to import an existing object to {}, \
                         the provider detected that no object exists with the given id.",
                        type_name
                    ),
                )),
            }
        }

        response.imported_resources = imported;
        response
    }

    pub async fn upgrade_resource_state(
        &self,
        ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse {
        // Upgrades can run before configuration; use provider data when present
        let resource = if self.is_configured().await {
            self.configured_resource(ctx.clone(), &request.type_name)
                .await
        } else {
            self.new_resource(&request.type_name).map_err(|d| vec![d])
        };
        let resource = match resource {
            Ok(resource) => resource,
            Err(diagnostics) => {
                return UpgradeResourceStateResponse {
                    upgraded_state: DynamicValue::null(),
                    diagnostics,
                }
            }
        };

        let schema = resource
            .schema(ctx.clone(), ResourceSchemaRequest)
            .await
            .schema;

        if request.version == schema.version {
            return match request.raw_state.decode() {
                Ok(upgraded_state) => UpgradeResourceStateResponse {
                    upgraded_state,
                    diagnostics: vec![],
                },
                Err(e) => UpgradeResourceStateResponse {
                    upgraded_state: DynamicValue::null(),
                    diagnostics: vec![Diagnostic::error(
                        "Unable to Read Previously Saved State for UpgradeResourceState",
                        e.to_string(),
                    )],
                },
            };
        }

        if request.version > schema.version {
            return UpgradeResourceStateResponse {
                upgraded_state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(
                    "Unable to Upgrade Resource State",
                    format!(
                        "Stored state version {} of {} is newer than the provider's schema version {}",
                        request.version, request.type_name, schema.version
                    ),
                )],
            };
        }

        info!(
            type_name = %request.type_name,
            from = request.version,
            to = schema.version,
            "Upgrading resource state"
        );

        match resource.as_upgrade_state() {
            Some(upgrader) => upgrader.upgrade_state(ctx, request).await,
            None => UpgradeResourceStateResponse {
                upgraded_state: DynamicValue::null(),
                diagnostics: vec![Diagnostic::error(
                    "Unable to Upgrade Resource State",
                    format!(
                        "{} has no state upgrader from version {} to {}",
                        request.type_name, request.version, schema.version
                    ),
                )],
            },
        }
    }

    pub async fn read_data_source(
        &self,
        ctx: Context,
        request: ReadDataSourceRequest,
    ) -> ReadDataSourceResponse {
        debug!(type_name = %request.type_name, "Reading data source");

        let data_source = match self
            .configured_data_source(ctx.clone(), &request.type_name)
            .await
        {
            Ok(data_source) => data_source,
            Err(diagnostics) => {
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                    deferred: None,
                }
            }
        };

        let schema = data_source
            .schema(ctx.clone(), DataSourceSchemaRequest)
            .await
            .schema;
        let mut diagnostics = validate_config(&schema, &request.config);
        if has_errors(&diagnostics) {
            return ReadDataSourceResponse {
                state: DynamicValue::null(),
                diagnostics,
                deferred: None,
            };
        }

        let response = data_source.read(ctx, request).await;
        diagnostics.extend(response.diagnostics);
        ReadDataSourceResponse {
            state: response.state,
            diagnostics,
            deferred: response.deferred,
        }
    }

    fn new_resource(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Diagnostic> {
        self.resources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    TfplugError::ResourceNotFound(type_name.to_string()).to_string(),
                    "The provider does not implement this resource type",
                )
            })
    }

    fn new_data_source(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Diagnostic> {
        self.data_sources
            .get(type_name)
            .map(|factory| factory())
            .ok_or_else(|| {
                Diagnostic::error(
                    TfplugError::DataSourceNotFound(type_name.to_string()).to_string(),
                    "The provider does not implement this data source type",
                )
            })
    }

    async fn provider_data(&self) -> std::result::Result<ProviderData, Vec<Diagnostic>> {
        self.provider_data.read().await.clone().ok_or_else(|| {
            vec![Diagnostic::error(
                TfplugError::ProviderNotConfigured.to_string(),
                "The provider must be configured before resources or data sources are used",
            )]
        })
    }

    async fn configured_resource(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Vec<Diagnostic>> {
        let mut resource = self.new_resource(type_name).map_err(|d| vec![d])?;
        let provider_data = self.provider_data().await?;

        let response = resource
            .configure(
                ctx,
                ConfigureResourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(resource)
    }

    async fn configured_data_source(
        &self,
        ctx: Context,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Vec<Diagnostic>> {
        let mut data_source = self.new_data_source(type_name).map_err(|d| vec![d])?;
        let provider_data = self.provider_data().await?;

        let response = data_source
            .configure(
                ctx,
                ConfigureDataSourceRequest {
                    provider_data: Some(provider_data),
                },
            )
            .await;
        if has_errors(&response.diagnostics) {
            return Err(response.diagnostics);
        }
        Ok(data_source)
    }
}

fn attribute_value(value: &DynamicValue, name: &str) -> Dynamic {
    value
        .get_value(&AttributePath::new(name))
        .cloned()
        .unwrap_or(Dynamic::Null)
}

/// Schema-level checks shared by every validate entry point
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = vec![];

    if let Some(values) = config.value.as_map() {
        let mut unknown: Vec<&String> = values
            .keys()
            .filter(|key| schema.attribute(key).is_none())
            .collect();
        unknown.sort();
        for key in unknown {
            diagnostics.push(
                Diagnostic::error(
                    "Unsupported argument",
                    format!("An argument named \"{}\" is not expected here.", key),
                )
                .with_attribute(AttributePath::new(key)),
            );
        }
    }

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = attribute_value(config, &attr.name);

        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!(
                            "The argument \"{}\" is required, but no definition was found.",
                            attr.name
                        ),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }

        if attr.computed && !attr.optional && !attr.required {
            diagnostics.push(
                Diagnostic::error(
                    "Invalid Configuration for Read-Only Attribute",
                    format!("Cannot set value for this attribute as the provider has marked it as read-only: {}", attr.name),
                )
                .with_attribute(path),
            );
            continue;
        }

        if !attr.r#type.accepts(&value) {
            diagnostics.push(
                Diagnostic::error(
                    "Incorrect attribute value type",
                    format!(
                        "Inappropriate value for attribute \"{}\": expected {:?}, got {}.",
                        attr.name,
                        attr.r#type,
                        value.type_name()
                    ),
                )
                .with_attribute(path),
            );
            continue;
        }

        if let Some(message) = &attr.deprecation_message {
            diagnostics.push(
                Diagnostic::warning("Argument is deprecated", message.clone())
                    .with_attribute(path.clone()),
            );
        }

        if value.is_unknown() {
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                value: value.clone(),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

/// Apply must settle every value
fn unknown_values_after_apply(state: &DynamicValue) -> Vec<Diagnostic> {
    let mut paths = vec![];
    collect_unknown(&state.value, AttributePath::root(), &mut paths);
    paths
        .into_iter()
        .map(|path| {
            Diagnostic::error(
                "Provider returned invalid result object after apply",
                format!(
                    "After the apply operation, the provider still indicated an unknown value for {}. \
                     All values must be known after apply.",
                    path
                ),
            )
            .with_attribute(path)
        })
        .collect()
}

fn collect_unknown(value: &Dynamic, path: AttributePath, out: &mut Vec<AttributePath>) {
    match value {
        Dynamic::Unknown => out.push(path),
        Dynamic::List(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_unknown(item, path.clone().index(i as i64), out);
            }
        }
        Dynamic::Map(entries) => {
            for (key, item) in entries {
                let next = if path.steps.is_empty() {
                    AttributePath::new(key)
                } else {
                    path.clone().attribute(key)
                };
                collect_unknown(item, next, out);
            }
        }
        _ => {}
    }
}
