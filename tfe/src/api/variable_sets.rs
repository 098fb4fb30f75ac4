//! Variable set API

use super::common::{identifiers, segment, Document, ListOptions, Relationship, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type VariableSet = ResourceObject<VariableSetAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableSetAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<bool>,
}

pub struct VariableSetsApi<'a> {
    client: &'a Client,
}

impl<'a> VariableSetsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /varsets/{id}
    pub async fn read(&self, id: &str) -> Result<VariableSet, ApiError> {
        let doc: Document<VariableSet> = self
            .client
            .get(&format!("/varsets/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/varsets, every page
    pub async fn list(&self, organization: &str) -> Result<Vec<VariableSet>, ApiError> {
        self.client
            .list_all(
                &format!("/organizations/{}/varsets", segment(organization)),
                ListOptions::new(),
            )
            .await
    }

    pub async fn find_by_name(&self, organization: &str, name: &str) -> Result<VariableSet, ApiError> {
        self.list(organization)
            .await?
            .into_iter()
            .find(|v| v.attributes.name.as_deref() == Some(name))
            .ok_or(ApiError::NotFound)
    }

    /// POST /organizations/{org}/varsets
    pub async fn create(
        &self,
        organization: &str,
        attributes: VariableSetAttributes,
        workspace_ids: &[String],
    ) -> Result<VariableSet, ApiError> {
        let mut object = ResourceObject::new("varsets", attributes);
        if !workspace_ids.is_empty() {
            object = object.with_relationship("workspaces", Relationship::many("workspaces", workspace_ids));
        }

        let doc: Document<VariableSet> = self
            .client
            .post(
                &format!("/organizations/{}/varsets", segment(organization)),
                &Document::new(object),
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /varsets/{id}
    pub async fn update(&self, id: &str, attributes: VariableSetAttributes) -> Result<VariableSet, ApiError> {
        let body = Document::new(ResourceObject::new("varsets", attributes).with_id(id));
        let doc: Document<VariableSet> = self
            .client
            .patch(&format!("/varsets/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /varsets/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/varsets/{}", segment(id))).await
    }

    /// POST /varsets/{id}/relationships/workspaces
    pub async fn apply_to_workspaces(&self, id: &str, workspace_ids: &[String]) -> Result<(), ApiError> {
        if workspace_ids.is_empty() {
            return Ok(());
        }
        self.client
            .post_no_content(
                &format!("/varsets/{}/relationships/workspaces", segment(id)),
                &identifiers("workspaces", workspace_ids),
            )
            .await
    }

    /// DELETE /varsets/{id}/relationships/workspaces
    pub async fn remove_from_workspaces(&self, id: &str, workspace_ids: &[String]) -> Result<(), ApiError> {
        if workspace_ids.is_empty() {
            return Ok(());
        }
        self.client
            .delete_with_body(
                &format!("/varsets/{}/relationships/workspaces", segment(id)),
                &identifiers("workspaces", workspace_ids),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn remove_from_workspaces_sends_delete_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/v2/varsets/varset-1/relationships/workspaces")
            .match_body(Matcher::Json(serde_json::json!({
                "data": [{"type": "workspaces", "id": "ws-2"}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client
            .variable_sets()
            .remove_from_workspaces("varset-1", &["ws-2".to_string()])
            .await
            .unwrap();
        mock.assert_async().await;
    }
}
