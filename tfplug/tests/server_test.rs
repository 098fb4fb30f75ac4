//! End-to-end tests of the in-process server against a small in-memory provider

#![allow(clippy::disallowed_methods)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tfplug::context::Context;
use tfplug::data_source::*;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::{RequiresReplace, UseStateForUnknown};
use tfplug::provider::*;
use tfplug::resource::*;
use tfplug::schema::{AttributeBuilder, AttributeType, SchemaBuilder};
use tfplug::server::{ApplyResourceChangeRequest, PlanResourceChangeRequest, ProviderServer};
use tfplug::types::{AttributePath, ClientCapabilities, Diagnostic, Dynamic, DynamicValue, RawState};

type Store = Arc<Mutex<HashMap<String, String>>>;

#[derive(Default)]
struct NotesProvider {
    store: Store,
}

#[async_trait]
impl Provider for NotesProvider {
    fn type_name(&self) -> &str {
        "notes"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "notes".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("prefix", AttributeType::String)
                        .optional()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateProviderConfigRequest,
    ) -> ValidateProviderConfigResponse {
        ValidateProviderConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        _request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        ConfigureProviderResponse {
            diagnostics: vec![],
            provider_data: Some(Arc::new(self.store.clone())),
        }
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        let mut factories: HashMap<String, ResourceFactory> = HashMap::new();
        factories.insert(
            "notes_note".to_string(),
            Box::new(|| Box::new(NoteResource::default()) as Box<dyn ResourceWithConfigure>),
        );
        factories
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        let mut factories: HashMap<String, DataSourceFactory> = HashMap::new();
        factories.insert(
            "notes_count".to_string(),
            Box::new(|| Box::new(CountDataSource::default()) as Box<dyn DataSourceWithConfigure>),
        );
        factories
    }
}

#[derive(Default)]
struct NoteResource {
    store: Option<Store>,
}

fn store_from(data: Option<Arc<dyn std::any::Any + Send + Sync>>) -> Result<Store, Diagnostic> {
    data.ok_or_else(|| Diagnostic::error("No provider data", ""))?
        .downcast_ref::<Store>()
        .cloned()
        .ok_or_else(|| Diagnostic::error("Invalid provider data", ""))
}

#[async_trait]
impl Resource for NoteResource {
    fn type_name(&self) -> &str {
        "notes_note"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ResourceMetadataRequest,
    ) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: "notes_note".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: SchemaBuilder::new()
                .version(1)
                .attribute(
                    AttributeBuilder::new("id", AttributeType::String)
                        .computed()
                        .plan_modifier(UseStateForUnknown::create())
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("name", AttributeType::String)
                        .required()
                        .plan_modifier(RequiresReplace::create())
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("body", AttributeType::String)
                        .optional()
                        .computed()
                        .default(StaticDefault::string(""))
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("revision", AttributeType::Number)
                        .computed()
                        .build(),
                )
                .attribute(
                    AttributeBuilder::new("labels", AttributeType::string_set())
                        .optional()
                        .plan_modifier(RequiresReplace::create())
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];
        if request.config.get_string(&AttributePath::new("name")).ok().as_deref() == Some("forbidden") {
            diagnostics.push(Diagnostic::error("Forbidden name", ""));
        }
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let store = self.store.clone().unwrap();
        let name = request.planned_state.get_string(&AttributePath::new("name")).unwrap();
        let body = request.planned_state.get_string(&AttributePath::new("body")).unwrap();
        store.lock().unwrap().insert(name.clone(), body);

        let mut state = request.planned_state;
        let _ = state.set_string(&AttributePath::new("id"), format!("note-{}", name));
        let _ = state.set_number(&AttributePath::new("revision"), 1.0);
        CreateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let store = self.store.clone().unwrap();
        let id = request.current_state.get_string(&AttributePath::new("id")).unwrap();
        let name = id.trim_start_matches("note-").to_string();
        let body = store.lock().unwrap().get(&name).cloned();

        let new_state = body.map(|body| {
            let mut state = request.current_state.clone();
            let _ = state.set_string(&AttributePath::new("name"), name.clone());
            let _ = state.set_string(&AttributePath::new("body"), body);
            if state.get_number(&AttributePath::new("revision")).is_err() {
                let _ = state.set_number(&AttributePath::new("revision"), 1.0);
            }
            state
        });

        ReadResourceResponse {
            new_state,
            diagnostics: vec![],
            private: request.private,
            deferred: None,
            new_identity: None,
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let store = self.store.clone().unwrap();
        let name = request.planned_state.get_string(&AttributePath::new("name")).unwrap();
        let body = request.planned_state.get_string(&AttributePath::new("body")).unwrap();
        store.lock().unwrap().insert(name, body);

        let revision = request
            .prior_state
            .get_number(&AttributePath::new("revision"))
            .unwrap_or(0.0);
        let mut state = request.planned_state;
        let _ = state.set_number(&AttributePath::new("revision"), revision + 1.0);
        UpdateResourceResponse {
            new_state: state,
            private: vec![],
            diagnostics: vec![],
            new_identity: None,
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let store = self.store.clone().unwrap();
        let name = request.prior_state.get_string(&AttributePath::new("name")).unwrap();
        store.lock().unwrap().remove(&name);
        DeleteResourceResponse {
            diagnostics: vec![],
        }
    }

    fn as_import_state(&self) -> Option<&dyn ResourceWithImportState> {
        Some(self)
    }

    fn as_upgrade_state(&self) -> Option<&dyn ResourceWithUpgradeState> {
        Some(self)
    }
}

#[async_trait]
impl ResourceWithConfigure for NoteResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
        match store_from(request.provider_data) {
            Ok(store) => {
                self.store = Some(store);
                ConfigureResourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diagnostic) => ConfigureResourceResponse {
                diagnostics: vec![diagnostic],
            },
        }
    }
}

#[async_trait]
impl ResourceWithImportState for NoteResource {
    async fn import_state(
        &self,
        ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut response = ImportResourceStateResponse::new();
        tfplug::import_state_passthrough_id(&ctx, AttributePath::new("id"), &request, &mut response);
        response
    }
}

#[async_trait]
impl ResourceWithUpgradeState for NoteResource {
    async fn upgrade_state(
        &self,
        _ctx: Context,
        request: UpgradeResourceStateRequest,
    ) -> UpgradeResourceStateResponse {
        // v0 stored the name as "title"
        let old = request.raw_state.decode().unwrap();
        let mut state = DynamicValue::object();
        let _ = state.set_string(
            &AttributePath::new("id"),
            old.get_string(&AttributePath::new("id")).unwrap(),
        );
        let _ = state.set_string(
            &AttributePath::new("name"),
            old.get_string(&AttributePath::new("title")).unwrap(),
        );
        let _ = state.set_string(&AttributePath::new("body"), String::new());
        let _ = state.set_number(&AttributePath::new("revision"), 1.0);
        UpgradeResourceStateResponse {
            upgraded_state: state,
            diagnostics: vec![],
        }
    }
}

#[derive(Default)]
struct CountDataSource {
    store: Option<Store>,
}

#[async_trait]
impl DataSource for CountDataSource {
    fn type_name(&self) -> &str {
        "notes_count"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: "notes_count".to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: SchemaBuilder::new()
                .attribute(
                    AttributeBuilder::new("count", AttributeType::Number)
                        .computed()
                        .build(),
                )
                .build(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let count = self.store.as_ref().unwrap().lock().unwrap().len();
        let mut state = DynamicValue::object();
        let _ = state.set_number(&AttributePath::new("count"), count as f64);
        ReadDataSourceResponse {
            state,
            diagnostics: vec![],
            deferred: None,
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for CountDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        match store_from(request.provider_data) {
            Ok(store) => {
                self.store = Some(store);
                ConfigureDataSourceResponse {
                    diagnostics: vec![],
                }
            }
            Err(diagnostic) => ConfigureDataSourceResponse {
                diagnostics: vec![diagnostic],
            },
        }
    }
}

fn object(pairs: &[(&str, Dynamic)]) -> DynamicValue {
    let mut dv = DynamicValue::object();
    for (k, v) in pairs {
        dv.set_value(&AttributePath::new(k), v.clone()).unwrap();
    }
    dv
}

async fn configured_server() -> ProviderServer<NotesProvider> {
    let server = ProviderServer::new(NotesProvider::default());
    let diagnostics = server
        .configure_provider(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: DynamicValue::object(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(diagnostics.is_empty());
    server
}

async fn create_note(server: &ProviderServer<NotesProvider>, name: &str) -> DynamicValue {
    create_from(server, object(&[("name", Dynamic::from(name))])).await
}

async fn create_from(server: &ProviderServer<NotesProvider>, config: DynamicValue) -> DynamicValue {
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: DynamicValue::null(),
                proposed_new_state: config.clone(),
                config: config.clone(),
                prior_private: vec![],
            },
        )
        .await;
    assert!(plan.diagnostics.is_empty());

    let apply = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: DynamicValue::null(),
                planned_state: plan.planned_state,
                config,
                planned_private: vec![],
            },
        )
        .await;
    assert!(apply.diagnostics.is_empty(), "{:?}", apply.diagnostics);
    apply.new_state
}

#[tokio::test]
async fn schema_lists_every_type() {
    let server = ProviderServer::new(NotesProvider::default());
    let response = server.get_provider_schema(Context::new()).await;

    assert!(response.diagnostics.is_empty());
    assert!(response.resource_schemas.contains_key("notes_note"));
    assert!(response.data_source_schemas.contains_key("notes_count"));
    assert_eq!(server.resource_types(), vec!["notes_note".to_string()]);
}

#[tokio::test]
async fn validation_runs_schema_checks_before_resource_checks() {
    let server = ProviderServer::new(NotesProvider::default());

    let response = server
        .validate_resource_config(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "notes_note".to_string(),
                config: DynamicValue::object(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert_eq!(response.diagnostics.len(), 1);
    assert_eq!(response.diagnostics[0].summary, "Missing required argument");

    let response = server
        .validate_resource_config(
            Context::new(),
            ValidateResourceConfigRequest {
                type_name: "notes_note".to_string(),
                config: object(&[("name", Dynamic::from("forbidden"))]),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert_eq!(response.diagnostics[0].summary, "Forbidden name");
}

#[tokio::test]
async fn operations_fail_before_configure() {
    let server = ProviderServer::new(NotesProvider::default());
    let response = server
        .read_data_source(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "notes_count".to_string(),
                config: DynamicValue::object(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics[0].summary.contains("Provider not configured"));
}

#[tokio::test]
async fn unknown_type_names_are_reported() {
    let server = configured_server().await;
    let response = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_missing".to_string(),
                prior_state: DynamicValue::null(),
                proposed_new_state: DynamicValue::object(),
                config: DynamicValue::object(),
                prior_private: vec![],
            },
        )
        .await;

    assert!(response.diagnostics[0].summary.contains("notes_missing"));
}

#[tokio::test]
async fn create_plan_applies_defaults_and_unknowns() {
    let server = configured_server().await;
    let config = object(&[("name", Dynamic::from("groceries"))]);

    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: DynamicValue::null(),
                proposed_new_state: config.clone(),
                config,
                prior_private: vec![],
            },
        )
        .await;

    let planned = plan.planned_state;
    assert_eq!(planned.get_value(&AttributePath::new("id")), Some(&Dynamic::Unknown));
    assert_eq!(
        planned.get_value(&AttributePath::new("revision")),
        Some(&Dynamic::Unknown)
    );
    assert_eq!(planned.get_string(&AttributePath::new("body")).unwrap(), "");
    assert!(plan.requires_replace.is_empty());
}

#[tokio::test]
async fn update_plan_keeps_stable_ids_and_flags_replacement() {
    let server = configured_server().await;
    let state = create_note(&server, "groceries").await;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "note-groceries");

    // Changing the body: revision becomes unknown, id stays
    let config = object(&[
        ("name", Dynamic::from("groceries")),
        ("body", Dynamic::from("milk")),
    ]);
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state.clone(),
                proposed_new_state: config.clone(),
                config: config.clone(),
                prior_private: vec![],
            },
        )
        .await;
    assert_eq!(
        plan.planned_state.get_string(&AttributePath::new("id")).unwrap(),
        "note-groceries"
    );
    assert_eq!(
        plan.planned_state.get_value(&AttributePath::new("revision")),
        Some(&Dynamic::Unknown)
    );
    assert!(plan.requires_replace.is_empty());

    let apply = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state.clone(),
                planned_state: plan.planned_state,
                config,
                planned_private: vec![],
            },
        )
        .await;
    assert!(apply.diagnostics.is_empty());
    assert_eq!(apply.new_state.get_number(&AttributePath::new("revision")).unwrap(), 2.0);

    // Renaming forces replacement
    let config = object(&[("name", Dynamic::from("chores"))]);
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state,
                proposed_new_state: config.clone(),
                config,
                prior_private: vec![],
            },
        )
        .await;
    assert_eq!(plan.requires_replace, vec![AttributePath::new("name")]);
}

#[tokio::test]
async fn unchanged_plan_keeps_computed_values() {
    let server = configured_server().await;
    let state = create_note(&server, "todo").await;

    let config = object(&[("name", Dynamic::from("todo"))]);
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state.clone(),
                proposed_new_state: config.clone(),
                config,
                prior_private: vec![],
            },
        )
        .await;

    assert_eq!(plan.planned_state, state);
}

#[tokio::test]
async fn reordered_set_members_plan_no_change() {
    let server = configured_server().await;
    let state = create_from(
        &server,
        object(&[
            ("name", Dynamic::from("todo")),
            ("labels", Dynamic::string_list(["home", "urgent"])),
        ]),
    )
    .await;

    let reordered = object(&[
        ("name", Dynamic::from("todo")),
        ("labels", Dynamic::string_list(["urgent", "home"])),
    ]);
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state.clone(),
                proposed_new_state: reordered.clone(),
                config: reordered,
                prior_private: vec![],
            },
        )
        .await;
    assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
    assert_eq!(plan.planned_state, state);
    assert!(plan.requires_replace.is_empty());

    let changed = object(&[
        ("name", Dynamic::from("todo")),
        ("labels", Dynamic::string_list(["home", "later"])),
    ]);
    let plan = server
        .plan_resource_change(
            Context::new(),
            PlanResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state,
                proposed_new_state: changed.clone(),
                config: changed,
                prior_private: vec![],
            },
        )
        .await;
    assert_eq!(plan.requires_replace, vec![AttributePath::new("labels")]);
    assert_eq!(
        plan.planned_state.get_value(&AttributePath::new("revision")),
        Some(&Dynamic::Unknown)
    );
}

#[tokio::test]
async fn delete_and_read_removes_from_state() {
    let server = configured_server().await;
    let state = create_note(&server, "temp").await;

    let apply = server
        .apply_resource_change(
            Context::new(),
            ApplyResourceChangeRequest {
                type_name: "notes_note".to_string(),
                prior_state: state.clone(),
                planned_state: DynamicValue::null(),
                config: DynamicValue::null(),
                planned_private: vec![],
            },
        )
        .await;
    assert!(apply.diagnostics.is_empty());
    assert!(apply.new_state.is_null());

    let read = server
        .read_resource(
            Context::new(),
            ReadResourceRequest {
                type_name: "notes_note".to_string(),
                current_state: state,
                private: vec![],
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
                current_identity: None,
            },
        )
        .await;
    assert!(read.diagnostics.is_empty());
    assert!(read.new_state.is_none());
}

#[tokio::test]
async fn import_reads_the_imported_object() {
    let server = configured_server().await;
    create_note(&server, "existing").await;

    let response = server
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "notes_note".to_string(),
                id: "note-existing".to_string(),
                client_capabilities: ClientCapabilities::default(),
                identity: None,
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(
        response.imported_resources[0]
            .state
            .get_string(&AttributePath::new("name"))
            .unwrap(),
        "existing"
    );

    let response = server
        .import_resource_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "notes_note".to_string(),
                id: "note-absent".to_string(),
                client_capabilities: ClientCapabilities::default(),
                identity: None,
            },
        )
        .await;
    assert!(response.imported_resources.is_empty());
    assert_eq!(
        response.diagnostics[0].summary,
        "Cannot import non-existent remote object"
    );
}

#[tokio::test]
async fn upgrade_passes_current_version_through_and_migrates_old_ones() {
    let server = ProviderServer::new(NotesProvider::default());

    let current = br#"{"id":"note-a","name":"a","body":"","revision":3}"#.to_vec();
    let response = server
        .upgrade_resource_state(
            Context::new(),
            UpgradeResourceStateRequest {
                type_name: "notes_note".to_string(),
                version: 1,
                raw_state: RawState::from_json(current),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(
        response.upgraded_state.get_number(&AttributePath::new("revision")).unwrap(),
        3.0
    );

    let old = br#"{"id":"note-a","title":"a"}"#.to_vec();
    let response = server
        .upgrade_resource_state(
            Context::new(),
            UpgradeResourceStateRequest {
                type_name: "notes_note".to_string(),
                version: 0,
                raw_state: RawState::from_json(old),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(
        response.upgraded_state.get_string(&AttributePath::new("name")).unwrap(),
        "a"
    );

    let response = server
        .upgrade_resource_state(
            Context::new(),
            UpgradeResourceStateRequest {
                type_name: "notes_note".to_string(),
                version: 7,
                raw_state: RawState::from_json(b"{}".to_vec()),
            },
        )
        .await;
    assert!(!response.diagnostics.is_empty());
}

#[tokio::test]
async fn data_source_reads_through_configured_provider() {
    let server = configured_server().await;
    create_note(&server, "one").await;
    create_note(&server, "two").await;

    let response = server
        .read_data_source(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "notes_count".to_string(),
                config: DynamicValue::object(),
                provider_meta: None,
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    assert_eq!(response.state.get_number(&AttributePath::new("count")).unwrap(), 2.0);
}
