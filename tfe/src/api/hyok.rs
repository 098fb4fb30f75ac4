//! Hold Your Own Key configuration API

use super::common::{segment, Document, Relationship, ResourceObject};
use super::oidc::OidcKind;
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type HyokConfiguration = ResourceObject<HyokAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HyokAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kek_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_options: Option<KmsOptions>,
    #[serde(default, skip_serializing)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KmsOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ring_id: Option<String>,
}

/// Relationships set on create
#[derive(Debug, Clone)]
pub struct HyokLinks {
    pub oidc_kind: OidcKind,
    pub oidc_configuration_id: String,
    pub agent_pool_id: String,
}

pub struct HyokConfigurationsApi<'a> {
    client: &'a Client,
}

impl<'a> HyokConfigurationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /hyok-configurations/{id}
    pub async fn read(&self, id: &str) -> Result<HyokConfiguration, ApiError> {
        let doc: Document<HyokConfiguration> = self
            .client
            .get(&format!("/hyok-configurations/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /organizations/{org}/hyok-configurations
    pub async fn create(
        &self,
        organization: &str,
        attributes: HyokAttributes,
        links: &HyokLinks,
    ) -> Result<HyokConfiguration, ApiError> {
        let object = ResourceObject::new("hyok-configurations", attributes)
            .with_relationship(
                "oidc-configuration",
                Relationship::one(links.oidc_kind.api_type(), &links.oidc_configuration_id),
            )
            .with_relationship(
                "agent-pool",
                Relationship::one("agent-pools", &links.agent_pool_id),
            );

        let doc: Document<HyokConfiguration> = self
            .client
            .post(
                &format!("/organizations/{}/hyok-configurations", segment(organization)),
                &Document::new(object),
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /hyok-configurations/{id}
    pub async fn update(
        &self,
        id: &str,
        attributes: HyokAttributes,
        agent_pool_id: Option<&str>,
    ) -> Result<HyokConfiguration, ApiError> {
        let mut object = ResourceObject::new("hyok-configurations", attributes).with_id(id);
        if let Some(pool) = agent_pool_id {
            object = object.with_relationship("agent-pool", Relationship::one("agent-pools", pool));
        }

        let doc: Document<HyokConfiguration> = self
            .client
            .patch(&format!("/hyok-configurations/{}", segment(id)), &Document::new(object))
            .await?;
        Ok(doc.data)
    }

    /// POST /hyok-configurations/{id}/actions/revoke
    pub async fn revoke(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .post_no_content(
                &format!("/hyok-configurations/{}/actions/revoke", segment(id)),
                &serde_json::json!({}),
            )
            .await
    }

    /// DELETE /hyok-configurations/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/hyok-configurations/{}", segment(id)))
            .await
    }
}

impl HyokConfiguration {
    pub fn oidc_configuration(&self) -> Option<(OidcKind, String)> {
        match self.relationships.get("oidc-configuration")?.data.as_ref()? {
            super::common::RelationshipData::One(identifier) => {
                OidcKind::from_api_type(&identifier.kind).map(|k| (k, identifier.id.clone()))
            }
            super::common::RelationshipData::Many(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn create_links_oidc_configuration_by_kind() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/organizations/acme/hyok-configurations")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "data": {
                    "attributes": {"name": "vault-kek", "kek-id": "kek", "kms-options": {"key-region": "us-east-1"}},
                    "relationships": {
                        "oidc-configuration": {"data": {"type": "aws-oidc-configurations", "id": "awsoidc-1"}},
                        "agent-pool": {"data": {"type": "agent-pools", "id": "apool-1"}}
                    }
                }
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":"hyokc-1","type":"hyok-configurations",
                "attributes":{"name":"vault-kek","kek-id":"kek","kms-options":{"key-region":"us-east-1"},"status":"untested"},
                "relationships":{
                    "oidc-configuration":{"data":{"id":"awsoidc-1","type":"aws-oidc-configurations"}},
                    "agent-pool":{"data":{"id":"apool-1","type":"agent-pools"}}}}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let config = client
            .hyok_configurations()
            .create(
                "acme",
                HyokAttributes {
                    name: Some("vault-kek".to_string()),
                    kek_id: Some("kek".to_string()),
                    kms_options: Some(KmsOptions {
                        key_region: Some("us-east-1".to_string()),
                        ..Default::default()
                    }),
                    status: None,
                },
                &HyokLinks {
                    oidc_kind: OidcKind::Aws,
                    oidc_configuration_id: "awsoidc-1".to_string(),
                    agent_pool_id: "apool-1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            config.oidc_configuration(),
            Some((OidcKind::Aws, "awsoidc-1".to_string()))
        );
        assert_eq!(config.attributes.status.as_deref(), Some("untested"));
        mock.assert_async().await;
    }
}
