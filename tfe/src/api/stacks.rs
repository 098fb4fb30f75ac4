//! Stack API

use super::common::{segment, Document, Relationship, ResourceObject};
use super::{ApiError, Client};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Stack = ResourceObject<StackAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StackAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcs_repo: Option<StackVcsRepo>,
    #[serde(default, skip_serializing)]
    pub deployment_names: Option<Vec<String>>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StackVcsRepo {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_app_installation_id: Option<String>,
}

pub struct StacksApi<'a> {
    client: &'a Client,
}

impl<'a> StacksApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /stacks/{id}
    pub async fn read(&self, id: &str) -> Result<Stack, ApiError> {
        let doc: Document<Stack> = self.client.get(&format!("/stacks/{}", segment(id))).await?;
        Ok(doc.data)
    }

    /// POST /stacks
    pub async fn create(&self, project_id: &str, attributes: StackAttributes) -> Result<Stack, ApiError> {
        let object = ResourceObject::new("stacks", attributes)
            .with_relationship("project", Relationship::one("projects", project_id));
        let doc: Document<Stack> = self.client.post("/stacks", &Document::new(object)).await?;
        Ok(doc.data)
    }

    /// PATCH /stacks/{id}
    pub async fn update(&self, id: &str, attributes: StackAttributes) -> Result<Stack, ApiError> {
        let body = Document::new(ResourceObject::new("stacks", attributes).with_id(id));
        let doc: Document<Stack> = self
            .client
            .patch(&format!("/stacks/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /stacks/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/stacks/{}", segment(id))).await
    }
}
