//! Policy set API

use super::common::{identifiers, segment, Document, Relationship, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type PolicySet = ResourceObject<PolicySetAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PolicySetAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overridable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_tool_version: Option<String>,
}

pub struct PolicySetsApi<'a> {
    client: &'a Client,
}

impl<'a> PolicySetsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /policy-sets/{id}
    pub async fn read(&self, id: &str) -> Result<PolicySet, ApiError> {
        let doc: Document<PolicySet> = self
            .client
            .get(&format!("/policy-sets/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /organizations/{org}/policy-sets
    pub async fn create(
        &self,
        organization: &str,
        attributes: PolicySetAttributes,
        workspace_ids: &[String],
    ) -> Result<PolicySet, ApiError> {
        let mut object = ResourceObject::new("policy-sets", attributes);
        if !workspace_ids.is_empty() {
            object = object.with_relationship("workspaces", Relationship::many("workspaces", workspace_ids));
        }

        let doc: Document<PolicySet> = self
            .client
            .post(
                &format!("/organizations/{}/policy-sets", segment(organization)),
                &Document::new(object),
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /policy-sets/{id}
    pub async fn update(&self, id: &str, attributes: PolicySetAttributes) -> Result<PolicySet, ApiError> {
        let body = Document::new(ResourceObject::new("policy-sets", attributes).with_id(id));
        let doc: Document<PolicySet> = self
            .client
            .patch(&format!("/policy-sets/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /policy-sets/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/policy-sets/{}", segment(id))).await
    }

    /// POST /policy-sets/{id}/relationships/workspaces
    pub async fn add_workspaces(&self, id: &str, workspace_ids: &[String]) -> Result<(), ApiError> {
        if workspace_ids.is_empty() {
            return Ok(());
        }
        self.client
            .post_no_content(
                &format!("/policy-sets/{}/relationships/workspaces", segment(id)),
                &identifiers("workspaces", workspace_ids),
            )
            .await
    }

    /// DELETE /policy-sets/{id}/relationships/workspaces
    pub async fn remove_workspaces(&self, id: &str, workspace_ids: &[String]) -> Result<(), ApiError> {
        if workspace_ids.is_empty() {
            return Ok(());
        }
        self.client
            .delete_with_body(
                &format!("/policy-sets/{}/relationships/workspaces", segment(id)),
                &identifiers("workspaces", workspace_ids),
            )
            .await
    }
}
