//! Organization API

use super::common::{segment, Document, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type Organization = ResourceObject<OrganizationAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrganizationAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_remember: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborator_auth_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_estimation_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessments_enforced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_force_delete_workspaces: Option<bool>,
    /// Read-only `org-...` identifier
    #[serde(default, skip_serializing)]
    pub external_id: Option<String>,
}

pub struct OrganizationsApi<'a> {
    client: &'a Client,
}

impl<'a> OrganizationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /organizations/{name}
    pub async fn read(&self, name: &str) -> Result<Organization, ApiError> {
        let doc: Document<Organization> = self
            .client
            .get(&format!("/organizations/{}", segment(name)))
            .await?;
        Ok(doc.data)
    }

    /// POST /organizations
    pub async fn create(&self, attributes: OrganizationAttributes) -> Result<Organization, ApiError> {
        let body = Document::new(ResourceObject::new("organizations", attributes));
        let doc: Document<Organization> = self.client.post("/organizations", &body).await?;
        Ok(doc.data)
    }

    /// PATCH /organizations/{name}
    pub async fn update(
        &self,
        name: &str,
        attributes: OrganizationAttributes,
    ) -> Result<Organization, ApiError> {
        let body = Document::new(ResourceObject::new("organizations", attributes));
        let doc: Document<Organization> = self
            .client
            .patch(&format!("/organizations/{}", segment(name)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /organizations/{name}
    pub async fn delete(&self, name: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/organizations/{}", segment(name)))
            .await
    }
}
