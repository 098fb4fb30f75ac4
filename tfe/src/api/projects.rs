//! Project API

use super::common::{segment, Document, ListOptions, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type Project = ResourceObject<ProjectAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct ProjectsApi<'a> {
    client: &'a Client,
}

impl<'a> ProjectsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /projects/{id}
    pub async fn read(&self, id: &str) -> Result<Project, ApiError> {
        let doc: Document<Project> = self
            .client
            .get(&format!("/projects/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/projects, every page
    pub async fn list(&self, organization: &str, options: ListOptions) -> Result<Vec<Project>, ApiError> {
        self.client
            .list_all(
                &format!("/organizations/{}/projects", segment(organization)),
                options,
            )
            .await
    }

    /// Exact-name lookup; the API filter also matches substrings
    pub async fn find_by_name(&self, organization: &str, name: &str) -> Result<Project, ApiError> {
        self.list(organization, ListOptions::new().filter("names", name))
            .await?
            .into_iter()
            .find(|p| p.attributes.name.as_deref() == Some(name))
            .ok_or(ApiError::NotFound)
    }

    /// POST /organizations/{org}/projects
    pub async fn create(&self, organization: &str, attributes: ProjectAttributes) -> Result<Project, ApiError> {
        let body = Document::new(ResourceObject::new("projects", attributes));
        let doc: Document<Project> = self
            .client
            .post(
                &format!("/organizations/{}/projects", segment(organization)),
                &body,
            )
            .await?;
        Ok(doc.data)
    }

    /// PATCH /projects/{id}
    pub async fn update(&self, id: &str, attributes: ProjectAttributes) -> Result<Project, ApiError> {
        let body = Document::new(ResourceObject::new("projects", attributes).with_id(id));
        let doc: Document<Project> = self
            .client
            .patch(&format!("/projects/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /projects/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/projects/{}", segment(id))).await
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_client;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn find_by_name_requires_exact_match() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/organizations/acme/projects")
            .match_query(Matcher::UrlEncoded("filter[names]".into(), "core".into()))
            .with_body(
                r#"{"data":[
                    {"id":"prj-2","type":"projects","attributes":{"name":"core-legacy"}},
                    {"id":"prj-1","type":"projects","attributes":{"name":"core"}}
                ],"meta":{"pagination":{"current-page":1,"next-page":null,"total-pages":1,"total-count":2}}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let project = client.projects().find_by_name("acme", "core").await.unwrap();
        assert_eq!(project.id(), "prj-1");

        let missing = client.projects().find_by_name("acme", "core-").await;
        assert!(missing.is_err());
    }
}
