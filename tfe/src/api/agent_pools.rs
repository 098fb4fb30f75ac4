//! Agent pool and agent token API

use super::common::{segment, Document, ListOptions, ResourceObject};
use super::{ApiError, Client};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AgentPool = ResourceObject<AgentPoolAttributes>;
pub type AgentToken = ResourceObject<AgentTokenAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AgentPoolAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_scoped: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AgentTokenAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only present in the create response
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
}

pub struct AgentPoolsApi<'a> {
    client: &'a Client,
}

impl<'a> AgentPoolsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /agent-pools/{id}
    pub async fn read(&self, id: &str) -> Result<AgentPool, ApiError> {
        let doc: Document<AgentPool> = self
            .client
            .get(&format!("/agent-pools/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/agent-pools?filter[name]=
    pub async fn find_by_name(&self, organization: &str, name: &str) -> Result<AgentPool, ApiError> {
        let pools: Vec<AgentPool> = self
            .client
            .list_all(
                &format!("/organizations/{}/agent-pools", segment(organization)),
                ListOptions::new().filter("name", name),
            )
            .await?;
        pools
            .into_iter()
            .find(|p| p.attributes.name.as_deref() == Some(name))
            .ok_or(ApiError::NotFound)
    }

    /// POST /organizations/{org}/agent-pools
    pub async fn create(&self, organization: &str, attributes: AgentPoolAttributes) -> Result<AgentPool, ApiError> {
        let body = Document::new(ResourceObject::new("agent-pools", attributes));
        let doc: Document<AgentPool> = self
            .client
            .post(
                &format!("/organizations/{}/agent-pools", segment(organization)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /agent-pools/{id}
    pub async fn update(&self, id: &str, attributes: AgentPoolAttributes) -> Result<AgentPool, ApiError> {
        let body = Document::new(ResourceObject::new("agent-pools", attributes).with_id(id));
        let doc: Document<AgentPool> = self
            .client
            .patch(&format!("/agent-pools/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /agent-pools/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/agent-pools/{}", segment(id))).await
    }
}

pub struct AgentTokensApi<'a> {
    client: &'a Client,
}

impl<'a> AgentTokensApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /authentication-tokens/{id}
    pub async fn read(&self, id: &str) -> Result<AgentToken, ApiError> {
        let doc: Document<AgentToken> = self
            .client
            .get(&format!("/authentication-tokens/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /agent-pools/{id}/authentication-tokens
    pub async fn create(&self, agent_pool_id: &str, description: &str) -> Result<AgentToken, ApiError> {
        let body = Document::new(ResourceObject::new(
            "authentication-tokens",
            AgentTokenAttributes {
                description: Some(description.to_string()),
                ..Default::default()
            },
        ));
        let doc: Document<AgentToken> = self
            .client
            .post(
                &format!("/agent-pools/{}/authentication-tokens", segment(agent_pool_id)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// DELETE /authentication-tokens/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/authentication-tokens/{}", segment(id)))
            .await
    }
}
