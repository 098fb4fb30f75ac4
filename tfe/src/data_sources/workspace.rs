//! Workspace data source implementation

use crate::data_sources::{computed, lookup_key, name_attribute, organization_attribute, read_error};
use crate::resources::{not_configured, workspace::write_state};
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceMetadataRequest,
    DataSourceMetadataResponse, DataSourceSchemaRequest, DataSourceSchemaResponse,
    DataSourceWithConfigure, ReadDataSourceRequest, ReadDataSourceResponse,
    ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeType, SchemaBuilder};

#[derive(Default)]
pub struct WorkspaceDataSource {
    provider_data: Option<crate::TfeProviderData>,
}

impl WorkspaceDataSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataSource for WorkspaceDataSource {
    fn type_name(&self) -> &str {
        "tfe_workspace"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: DataSourceMetadataRequest,
    ) -> DataSourceMetadataResponse {
        DataSourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("Looks up a workspace by name")
            .attribute(computed("id", AttributeType::String, "Workspace ID"))
            .attribute(name_attribute("Workspace name"))
            .attribute(organization_attribute())
            .attribute(computed("description", AttributeType::String, "Workspace description"))
            .attribute(computed("project_id", AttributeType::String, "Owning project"))
            .attribute(computed("auto_apply", AttributeType::Bool, "Whether runs apply automatically"))
            .attribute(computed(
                "terraform_version",
                AttributeType::String,
                "Terraform version or constraint",
            ))
            .attribute(computed(
                "working_directory",
                AttributeType::String,
                "Directory Terraform runs in",
            ))
            .attribute(computed("queue_all_runs", AttributeType::Bool, "Whether runs queue on creation"))
            .attribute(computed(
                "speculative_enabled",
                AttributeType::Bool,
                "Whether pull requests trigger speculative plans",
            ))
            .attribute(computed(
                "file_triggers_enabled",
                AttributeType::Bool,
                "Whether runs are filtered by changed paths",
            ))
            .attribute(computed(
                "trigger_prefixes",
                AttributeType::string_list(),
                "Paths that trigger runs",
            ))
            .attribute(computed("tag_names", AttributeType::string_set(), "Workspace tags"))
            .attribute(computed(
                "allow_destroy_plan",
                AttributeType::Bool,
                "Whether destroy plans may be queued",
            ))
            .attribute(computed(
                "global_remote_state",
                AttributeType::Bool,
                "Whether every workspace can read this state",
            ))
            .attribute(computed(
                "assessments_enabled",
                AttributeType::Bool,
                "Whether health assessments run",
            ))
            .attribute(computed(
                "resource_count",
                AttributeType::Number,
                "Resources in the current state",
            ))
            .attribute(computed("html_url", AttributeType::String, "Workspace web URL"))
            .build();

        DataSourceSchemaResponse {
            schema,
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

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => return ReadDataSourceResponse::error(not_configured()),
        };

        let (organization, name) = match lookup_key(provider_data, &request.config) {
            Ok(key) => key,
            Err(diag) => return ReadDataSourceResponse::error(diag),
        };

        tracing::debug!(%organization, %name, "looking up workspace");

        match provider_data
            .client
            .workspaces()
            .read_by_name(&organization, &name)
            .await
        {
            Ok(workspace) => {
                let mut state = request.config;
                write_state(&mut state, &workspace, provider_data.client.address());
                ReadDataSourceResponse {
                    state,
                    diagnostics: vec![],
                    deferred: None,
                }
            }
            Err(e) => read_error("reading workspace", &e),
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for WorkspaceDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match crate::TfeProviderData::from_provider_data(request.provider_data) {
            Ok(data) => self.provider_data = Some(data),
            Err(diag) => diagnostics.push(diag),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use crate::models;
    use tfplug::types::{ClientCapabilities, DynamicValue};

    fn request(config: DynamicValue) -> ReadDataSourceRequest {
        ReadDataSourceRequest {
            type_name: "tfe_workspace".to_string(),
            config,
            provider_meta: None,
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    async fn looks_up_workspace_in_provider_organization() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v2/organizations/acme/workspaces/app")
            .with_body(
                r#"{"data":{"id":"ws-123","type":"workspaces",
                "attributes":{"name":"app","auto-apply":true,"tag-names":["prod","api"],
                    "trigger-prefixes":["modules/"],"resource-count":7},
                "relationships":{
                    "organization":{"data":{"id":"acme","type":"organizations"}},
                    "project":{"data":{"id":"prj-1","type":"projects"}}}}}"#,
            )
            .create_async()
            .await;

        let mut data_source = WorkspaceDataSource::new();
        data_source.provider_data = Some(crate::TfeProviderData::new(
            test_client(&server.url()),
            Some("acme".to_string()),
        ));

        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "app");
        let response = data_source.read(Context::new(), request(config)).await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(models::optional_string(&response.state, "id").as_deref(), Some("ws-123"));
        assert_eq!(
            models::optional_string(&response.state, "project_id").as_deref(),
            Some("prj-1")
        );
        assert_eq!(models::optional_bool(&response.state, "auto_apply"), Some(true));
        assert_eq!(models::optional_i64(&response.state, "resource_count"), Some(7));
        assert_eq!(
            models::string_set(&response.state, "tag_names"),
            Some(vec!["api".to_string(), "prod".to_string()])
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_workspace_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/organizations/acme/workspaces/gone")
            .with_status(404)
            .with_body(r#"{"errors":[{"status":"404","title":"not found"}]}"#)
            .create_async()
            .await;

        let mut data_source = WorkspaceDataSource::new();
        data_source.provider_data = Some(crate::TfeProviderData::new(
            test_client(&server.url()),
            Some("acme".to_string()),
        ));

        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "gone");
        let response = data_source.read(Context::new(), request(config)).await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].detail, "no matching object was found");
    }

    #[tokio::test]
    async fn unconfigured_lookup_is_an_error() {
        let data_source = WorkspaceDataSource::new();
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "app");
        let response = data_source.read(Context::new(), request(config)).await;
        assert_eq!(response.diagnostics.len(), 1);
    }
}
