//! Workspace API, including execution settings and safe delete

use super::common::{segment, Document, ListOptions, Relationship, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type Workspace = ResourceObject<WorkspaceAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_all_runs: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speculative_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_triggers_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_prefixes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_destroy_plan: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_remote_state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessments_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting_overwrites: Option<SettingOverwrites>,
    #[serde(default, skip_serializing)]
    pub resource_count: Option<i64>,
}

/// Which settings the workspace sets itself instead of inheriting
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingOverwrites {
    #[serde(default)]
    pub execution_mode: bool,
    #[serde(default)]
    pub agent_pool: bool,
}

/// Execution settings; `None` fields are left to the organization default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkspaceSettings {
    pub execution_mode: Option<String>,
    pub agent_pool_id: Option<String>,
}

pub struct WorkspacesApi<'a> {
    client: &'a Client,
}

impl<'a> WorkspacesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /workspaces/{id}
    pub async fn read(&self, id: &str) -> Result<Workspace, ApiError> {
        let doc: Document<Workspace> = self
            .client
            .get(&format!("/workspaces/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/workspaces/{name}
    pub async fn read_by_name(&self, organization: &str, name: &str) -> Result<Workspace, ApiError> {
        let doc: Document<Workspace> = self
            .client
            .get(&format!(
                "/organizations/{}/workspaces/{}",
                segment(organization),
                segment(name)
            ))
            .await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/workspaces, every page
    pub async fn list(
        &self,
        organization: &str,
        options: ListOptions,
    ) -> Result<Vec<Workspace>, ApiError> {
        self.client
            .list_all(
                &format!("/organizations/{}/workspaces", segment(organization)),
                options,
            )
            .await
    }

    /// POST /organizations/{org}/workspaces
    pub async fn create(
        &self,
        organization: &str,
        attributes: WorkspaceAttributes,
        project_id: Option<&str>,
    ) -> Result<Workspace, ApiError> {
        let mut object = ResourceObject::new("workspaces", attributes);
        if let Some(project_id) = project_id {
            object = object.with_relationship("project", Relationship::one("projects", project_id));
        }

        let doc: Document<Workspace> = self
            .client
            .post(
                &format!("/organizations/{}/workspaces", segment(organization)),
                &Document::new(object),
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /workspaces/{id}
    pub async fn update(
        &self,
        id: &str,
        attributes: WorkspaceAttributes,
        project_id: Option<&str>,
    ) -> Result<Workspace, ApiError> {
        let mut object = ResourceObject::new("workspaces", attributes).with_id(id);
        if let Some(project_id) = project_id {
            object = object.with_relationship("project", Relationship::one("projects", project_id));
        }

        let doc: Document<Workspace> = self
            .client
            .patch(&format!("/workspaces/{}", segment(id)), &Document::new(object))
            .await?;
        Ok(doc.data)
    }

    /// Applies execution settings, marking set values as overwrites
    pub async fn update_settings(
        &self,
        id: &str,
        settings: &WorkspaceSettings,
    ) -> Result<Workspace, ApiError> {
        let overwrites = SettingOverwrites {
            execution_mode: settings.execution_mode.is_some(),
            agent_pool: settings.agent_pool_id.is_some(),
        };
        let attributes = WorkspaceAttributes {
            execution_mode: settings.execution_mode.clone(),
            setting_overwrites: Some(overwrites),
            ..Default::default()
        };

        let agent_pool = match &settings.agent_pool_id {
            Some(pool) => Relationship::one("agent-pools", pool),
            None => Relationship::default(),
        };
        let object = ResourceObject::new("workspaces", attributes)
            .with_id(id)
            .with_relationship("agent-pool", agent_pool);

        let doc: Document<Workspace> = self
            .client
            .patch(&format!("/workspaces/{}", segment(id)), &Document::new(object))
            .await?;
        Ok(doc.data)
    }

    /// DELETE /workspaces/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/workspaces/{}", segment(id)))
            .await
    }

    /// POST /workspaces/{id}/actions/safe-delete; fails while resources are managed
    pub async fn safe_delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_no_content(
                &format!("/workspaces/{}/actions/safe-delete", segment(id)),
                &serde_json::json!({}),
            )
            .await
    }
}

impl Workspace {
    pub fn organization(&self) -> Option<&str> {
        self.related_id("organization")
    }

    pub fn project_id(&self) -> Option<&str> {
        self.related_id("project")
    }

    pub fn agent_pool_id(&self) -> Option<&str> {
        self.related_id("agent-pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use mockito::{Matcher, Server};

    const WORKSPACE: &str = r#"{"data":{"id":"ws-123","type":"workspaces",
        "attributes":{"name":"app","auto-apply":true,"execution-mode":"agent",
            "setting-overwrites":{"execution-mode":true,"agent-pool":true},
            "tag-names":["prod"],"resource-count":4},
        "relationships":{
            "organization":{"data":{"id":"acme","type":"organizations"}},
            "project":{"data":{"id":"prj-1","type":"projects"}},
            "agent-pool":{"data":{"id":"apool-1","type":"agent-pools"}}},
        "links":{"self-html":"/app/acme/workspaces/app"}}}"#;

    #[tokio::test]
    async fn read_by_name_exposes_relationships() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/organizations/acme/workspaces/app")
            .with_body(WORKSPACE)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let ws = client.workspaces().read_by_name("acme", "app").await.unwrap();

        assert_eq!(ws.id(), "ws-123");
        assert_eq!(ws.organization(), Some("acme"));
        assert_eq!(ws.project_id(), Some("prj-1"));
        assert_eq!(ws.agent_pool_id(), Some("apool-1"));
        assert_eq!(ws.attributes.resource_count, Some(4));
        assert_eq!(
            ws.attributes.setting_overwrites,
            Some(SettingOverwrites {
                execution_mode: true,
                agent_pool: true
            })
        );
    }

    #[tokio::test]
    async fn update_settings_marks_overwrites() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PATCH", "/api/v2/workspaces/ws-123")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "data": {
                    "attributes": {
                        "execution-mode": "agent",
                        "setting-overwrites": {"execution-mode": true, "agent-pool": true}
                    },
                    "relationships": {"agent-pool": {"data": {"type": "agent-pools", "id": "apool-1"}}}
                }
            })))
            .with_body(WORKSPACE)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .workspaces()
            .update_settings(
                "ws-123",
                &WorkspaceSettings {
                    execution_mode: Some("agent".to_string()),
                    agent_pool_id: Some("apool-1".to_string()),
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn safe_delete_surfaces_conflict() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/workspaces/ws-123/actions/safe-delete")
            .with_status(409)
            .with_body(r#"{"errors":[{"status":"409","title":"conflict","detail":"Workspace is currently managing resources"}]}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.workspaces().safe_delete("ws-123").await.unwrap_err();

        assert!(err.to_string().contains("currently managing resources"));
    }
}
