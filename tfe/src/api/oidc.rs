//! OIDC configuration API (AWS, GCP, Azure, Vault)
//!
//! The four kinds share endpoints and differ only in their JSON:API type and
//! attribute set, so attributes travel as a loose JSON map.

use super::common::{segment, Document, ResourceObject};
use super::{ApiError, Client};
use serde_json::{Map, Value};

pub type OidcConfiguration = ResourceObject<Map<String, Value>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OidcKind {
    Aws,
    Gcp,
    Azure,
    Vault,
}

impl OidcKind {
    pub const ALL: [OidcKind; 4] = [OidcKind::Aws, OidcKind::Gcp, OidcKind::Azure, OidcKind::Vault];

    /// JSON:API resource type
    pub fn api_type(self) -> &'static str {
        match self {
            OidcKind::Aws => "aws-oidc-configurations",
            OidcKind::Gcp => "gcp-oidc-configurations",
            OidcKind::Azure => "azure-oidc-configurations",
            OidcKind::Vault => "vault-oidc-configurations",
        }
    }

    pub fn from_api_type(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.api_type() == value)
    }

    /// Short name used in configuration (`aws`, `gcp`, ...)
    pub fn name(self) -> &'static str {
        match self {
            OidcKind::Aws => "aws",
            OidcKind::Gcp => "gcp",
            OidcKind::Azure => "azure",
            OidcKind::Vault => "vault",
        }
    }

    pub fn from_name(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == value)
    }
}

pub struct OidcConfigurationsApi<'a> {
    client: &'a Client,
}

impl<'a> OidcConfigurationsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /oidc-configurations/{id}
    pub async fn read(&self, id: &str) -> Result<OidcConfiguration, ApiError> {
        let doc: Document<OidcConfiguration> = self
            .client
            .get(&format!("/oidc-configurations/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /organizations/{org}/oidc-configurations
    pub async fn create(
        &self,
        organization: &str,
        kind: OidcKind,
        attributes: Map<String, Value>,
    ) -> Result<OidcConfiguration, ApiError> {
        let body = Document::new(ResourceObject::new(kind.api_type(), attributes));
        let doc: Document<OidcConfiguration> = self
            .client
            .post(
                &format!("/organizations/{}/oidc-configurations", segment(organization)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /oidc-configurations/{id}
    pub async fn update(
        &self,
        id: &str,
        kind: OidcKind,
        attributes: Map<String, Value>,
    ) -> Result<OidcConfiguration, ApiError> {
        let body = Document::new(ResourceObject::new(kind.api_type(), attributes).with_id(id));
        let doc: Document<OidcConfiguration> = self
            .client
            .patch(&format!("/oidc-configurations/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /oidc-configurations/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/oidc-configurations/{}", segment(id)))
            .await
    }
}
