//! Variables owned by a workspace or by a variable set
//!
//! Both containers expose the same attributes behind different paths, so the
//! two services share `VariableAttributes`.

use super::common::{segment, Document, ListDocument, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type Variable = ResourceObject<VariableAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Always empty in responses for sensitive variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hcl: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitive: Option<bool>,
}

pub struct VariablesApi<'a> {
    client: &'a Client,
}

impl<'a> VariablesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /workspaces/{ws}/vars
    pub async fn list(&self, workspace_id: &str) -> Result<Vec<Variable>, ApiError> {
        let doc: ListDocument<Variable> = self
            .client
            .get(&format!("/workspaces/{}/vars", segment(workspace_id)))
            .await?;
        Ok(doc.data)
    }

    /// GET /workspaces/{ws}/vars/{id}
    pub async fn read(&self, workspace_id: &str, id: &str) -> Result<Variable, ApiError> {
        let doc: Document<Variable> = self
            .client
            .get(&format!(
                "/workspaces/{}/vars/{}",
                segment(workspace_id),
                segment(id)
            ))
            .await?;
        Ok(doc.data)
    }

    /// POST /workspaces/{ws}/vars
    pub async fn create(&self, workspace_id: &str, attributes: VariableAttributes) -> Result<Variable, ApiError> {
        let body = Document::new(ResourceObject::new("vars", attributes));
        let doc: Document<Variable> = self
            .client
            .post(&format!("/workspaces/{}/vars", segment(workspace_id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// PATCH /workspaces/{ws}/vars/{id}
    pub async fn update(
        &self,
        workspace_id: &str,
        id: &str,
        attributes: VariableAttributes,
    ) -> Result<Variable, ApiError> {
        let body = Document::new(ResourceObject::new("vars", attributes).with_id(id));
        let doc: Document<Variable> = self
            .client
            .patch(
                &format!("/workspaces/{}/vars/{}", segment(workspace_id), segment(id)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// DELETE /workspaces/{ws}/vars/{id}
    pub async fn delete(&self, workspace_id: &str, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!(
                "/workspaces/{}/vars/{}",
                segment(workspace_id),
                segment(id)
            ))
            .await
    }
}

pub struct VariableSetVariablesApi<'a> {
    client: &'a Client,
}

impl<'a> VariableSetVariablesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    fn collection(variable_set_id: &str) -> String {
        format!("/varsets/{}/relationships/vars", segment(variable_set_id))
    }

    /// GET /varsets/{id}/relationships/vars
    pub async fn list(&self, variable_set_id: &str) -> Result<Vec<Variable>, ApiError> {
        let doc: ListDocument<Variable> = self.client.get(&Self::collection(variable_set_id)).await?;
        Ok(doc.data)
    }

    /// GET /varsets/{id}/relationships/vars/{var}
    pub async fn read(&self, variable_set_id: &str, id: &str) -> Result<Variable, ApiError> {
        let doc: Document<Variable> = self
            .client
            .get(&format!("{}/{}", Self::collection(variable_set_id), segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /varsets/{id}/relationships/vars
    pub async fn create(
        &self,
        variable_set_id: &str,
        attributes: VariableAttributes,
    ) -> Result<Variable, ApiError> {
        let body = Document::new(ResourceObject::new("vars", attributes));
        let doc: Document<Variable> = self
            .client
            .post(&Self::collection(variable_set_id), &body)
            .await?;
        Ok(doc.data)
    }

    /// PATCH /varsets/{id}/relationships/vars/{var}
    pub async fn update(
        &self,
        variable_set_id: &str,
        id: &str,
        attributes: VariableAttributes,
    ) -> Result<Variable, ApiError> {
        let body = Document::new(ResourceObject::new("vars", attributes).with_id(id));
        let doc: Document<Variable> = self
            .client
            .patch(
                &format!("{}/{}", Self::collection(variable_set_id), segment(id)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// DELETE /varsets/{id}/relationships/vars/{var}
    pub async fn delete(&self, variable_set_id: &str, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("{}/{}", Self::collection(variable_set_id), segment(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use mockito::Server;

    const VAR: &str = r#"{"data":{"id":"var-1","type":"vars","attributes":{
        "key":"region","value":"eu-west-1","category":"terraform","hcl":false,"sensitive":false}}}"#;

    #[tokio::test]
    async fn workspace_and_variable_set_paths_differ() {
        let mut server = Server::new_async().await;
        let ws = server
            .mock("GET", "/api/v2/workspaces/ws-1/vars/var-1")
            .with_body(VAR)
            .create_async()
            .await;
        let vs = server
            .mock("GET", "/api/v2/varsets/varset-1/relationships/vars/var-1")
            .with_body(VAR)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let a = client.variables().read("ws-1", "var-1").await.unwrap();
        let b = client
            .variable_set_variables()
            .read("varset-1", "var-1")
            .await
            .unwrap();

        assert_eq!(a.attributes.key, b.attributes.key);
        ws.assert_async().await;
        vs.assert_async().await;
    }

    #[tokio::test]
    async fn sensitive_values_come_back_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/v2/workspaces/ws-1/vars")
            .with_status(201)
            .with_body(r#"{"data":{"id":"var-2","type":"vars","attributes":{
                "key":"token","value":null,"category":"env","hcl":false,"sensitive":true}}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let var = client
            .variables()
            .create(
                "ws-1",
                VariableAttributes {
                    key: Some("token".to_string()),
                    value: Some("s3cr3t".to_string()),
                    category: Some("env".to_string()),
                    sensitive: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(var.attributes.value, None);
        assert_eq!(var.attributes.sensitive, Some(true));
    }
}
