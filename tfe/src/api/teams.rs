//! Team, team membership and team workspace access APIs

use super::common::{identifiers, segment, Document, ListOptions, Relationship, ResourceObject};
use super::{ApiError, Client};
use serde::{Deserialize, Serialize};

pub type Team = ResourceObject<TeamAttributes>;
pub type User = ResourceObject<UserAttributes>;
pub type TeamAccess = ResourceObject<TeamAccessAttributes>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TeamAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_member_token_management: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_access: Option<OrganizationAccess>,
}

/// Organization-level permissions granted to a team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OrganizationAccess {
    #[serde(default)]
    pub manage_policies: bool,
    #[serde(default)]
    pub manage_policy_overrides: bool,
    #[serde(default)]
    pub manage_workspaces: bool,
    #[serde(default)]
    pub manage_vcs_settings: bool,
    #[serde(default)]
    pub manage_providers: bool,
    #[serde(default)]
    pub manage_modules: bool,
    #[serde(default)]
    pub manage_run_tasks: bool,
    #[serde(default)]
    pub manage_projects: bool,
    #[serde(default)]
    pub manage_membership: bool,
    #[serde(default)]
    pub read_workspaces: bool,
    #[serde(default)]
    pub read_projects: bool,
}

impl OrganizationAccess {
    /// Attribute names shared by the API (kebab-case) and the schema (snake_case)
    pub const FIELDS: [&'static str; 11] = [
        "manage_policies",
        "manage_policy_overrides",
        "manage_workspaces",
        "manage_vcs_settings",
        "manage_providers",
        "manage_modules",
        "manage_run_tasks",
        "manage_projects",
        "manage_membership",
        "read_workspaces",
        "read_projects",
    ];

    pub fn get(&self, field: &str) -> Option<bool> {
        let value = match field {
            "manage_policies" => self.manage_policies,
            "manage_policy_overrides" => self.manage_policy_overrides,
            "manage_workspaces" => self.manage_workspaces,
            "manage_vcs_settings" => self.manage_vcs_settings,
            "manage_providers" => self.manage_providers,
            "manage_modules" => self.manage_modules,
            "manage_run_tasks" => self.manage_run_tasks,
            "manage_projects" => self.manage_projects,
            "manage_membership" => self.manage_membership,
            "read_workspaces" => self.read_workspaces,
            "read_projects" => self.read_projects,
            _ => return None,
        };
        Some(value)
    }

    pub fn set(&mut self, field: &str, value: bool) {
        let slot = match field {
            "manage_policies" => &mut self.manage_policies,
            "manage_policy_overrides" => &mut self.manage_policy_overrides,
            "manage_workspaces" => &mut self.manage_workspaces,
            "manage_vcs_settings" => &mut self.manage_vcs_settings,
            "manage_providers" => &mut self.manage_providers,
            "manage_modules" => &mut self.manage_modules,
            "manage_run_tasks" => &mut self.manage_run_tasks,
            "manage_projects" => &mut self.manage_projects,
            "manage_membership" => &mut self.manage_membership,
            "read_workspaces" => &mut self.read_workspaces,
            "read_projects" => &mut self.read_projects,
            _ => return,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserAttributes {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamAccessAttributes {
    pub access: String,
}

/// Team document with the `users` include
#[derive(Debug, Deserialize)]
struct TeamWithUsers {
    #[allow(dead_code)]
    data: Team,
    #[serde(default)]
    included: Vec<User>,
}

pub struct TeamsApi<'a> {
    client: &'a Client,
}

impl<'a> TeamsApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /teams/{id}
    pub async fn read(&self, id: &str) -> Result<Team, ApiError> {
        let doc: Document<Team> = self.client.get(&format!("/teams/{}", segment(id))).await?;
        Ok(doc.data)
    }

    /// GET /organizations/{org}/teams?filter[names]=
    pub async fn find_by_name(&self, organization: &str, name: &str) -> Result<Team, ApiError> {
        let teams: Vec<Team> = self
            .client
            .list_all(
                &format!("/organizations/{}/teams", segment(organization)),
                ListOptions::new().filter("names", name),
            )
            .await?;
        teams
            .into_iter()
            .find(|t| t.attributes.name.as_deref() == Some(name))
            .ok_or(ApiError::NotFound)
    }

    /// POST /organizations/{org}/teams
    pub async fn create(&self, organization: &str, attributes: TeamAttributes) -> Result<Team, ApiError> {
        let body = Document::new(ResourceObject::new("teams", attributes));
        let doc: Document<Team> = self
            .client
            .post(&format!("/organizations/{}/teams", segment(organization)), &body)
            .await?;
        Ok(doc.data)
    }

    /// PATCH /teams/{id}
    pub async fn update(&self, id: &str, attributes: TeamAttributes) -> Result<Team, ApiError> {
        let body = Document::new(ResourceObject::new("teams", attributes).with_id(id));
        let doc: Document<Team> = self
            .client
            .patch(&format!("/teams/{}", segment(id)), &body)
            .await?;
        Ok(doc.data)
    }

    /// DELETE /teams/{id}
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&format!("/teams/{}", segment(id))).await
    }
}

pub struct TeamMembersApi<'a> {
    client: &'a Client,
}

impl<'a> TeamMembersApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Usernames of the team's members
    pub async fn list(&self, team_id: &str) -> Result<Vec<String>, ApiError> {
        let doc: TeamWithUsers = self
            .client
            .get(&format!("/teams/{}?include=users", segment(team_id)))
            .await?;
        Ok(doc
            .included
            .into_iter()
            .filter(|u| u.kind == "users")
            .map(|u| u.attributes.username)
            .collect())
    }

    /// POST /teams/{id}/relationships/users
    pub async fn add(&self, team_id: &str, usernames: &[&str]) -> Result<(), ApiError> {
        self.client
            .post_no_content(
                &format!("/teams/{}/relationships/users", segment(team_id)),
                &identifiers("users", usernames),
            )
            .await
    }

    /// DELETE /teams/{id}/relationships/users
    pub async fn remove(&self, team_id: &str, usernames: &[&str]) -> Result<(), ApiError> {
        self.client
            .delete_with_body(
                &format!("/teams/{}/relationships/users", segment(team_id)),
                &identifiers("users", usernames),
            )
            .await
    }
}

pub struct TeamAccessApi<'a> {
    client: &'a Client,
}

impl<'a> TeamAccessApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// GET /team-workspaces/{id}
    pub async fn read(&self, id: &str) -> Result<TeamAccess, ApiError> {
        let doc: Document<TeamAccess> = self
            .client
            .get(&format!("/team-workspaces/{}", segment(id)))
            .await?;
        Ok(doc.data)
    }

    /// POST /team-workspaces
    pub async fn add(&self, access: &str, team_id: &str, workspace_id: &str) -> Result<TeamAccess, ApiError> {
        let object = ResourceObject::new(
            "team-workspaces",
            TeamAccessAttributes {
                access: access.to_string(),
            },
        )
        .with_relationship("team", Relationship::one("teams", team_id))
        .with_relationship("workspace", Relationship::one("workspaces", workspace_id));

        let doc: Document<TeamAccess> = self
            .client
            .post("/team-workspaces", &Document::new(object))
            .await?;
        Ok(doc.data)
    }

    /// PATCH /team-workspaces/{id}
    pub async fn update(&self, id: &str, access: &str) -> Result<TeamAccess, ApiError> {
        let object = ResourceObject::new(
            "team-workspaces",
            TeamAccessAttributes {
                access: access.to_string(),
            },
        )
        .with_id(id);

        let doc: Document<TeamAccess> = self
            .client
            .patch(&format!("/team-workspaces/{}", segment(id)), &Document::new(object))
            .await?;
        Ok(doc.data)
    }

    /// DELETE /team-workspaces/{id}
    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/team-workspaces/{}", segment(id)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;
    use mockito::{Matcher, Server};

    #[test]
    fn organization_access_fields_round_trip_by_name() {
        let mut access = OrganizationAccess::default();
        for field in OrganizationAccess::FIELDS {
            assert_eq!(access.get(field), Some(false));
            access.set(field, true);
            assert_eq!(access.get(field), Some(true));
        }
        assert_eq!(access.get("manage_everything"), None);
    }

    #[tokio::test]
    async fn members_are_read_from_included_users() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v2/teams/team-1")
            .match_query(Matcher::UrlEncoded("include".into(), "users".into()))
            .with_body(
                r#"{"data":{"id":"team-1","type":"teams","attributes":{"name":"ops"}},
                    "included":[
                        {"id":"user-1","type":"users","attributes":{"username":"alice"}},
                        {"id":"user-2","type":"users","attributes":{"username":"bob"}}
                    ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let members = client.team_members().list("team-1").await.unwrap();
        assert_eq!(members, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn add_member_posts_user_identifiers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/teams/team-1/relationships/users")
            .match_body(Matcher::Json(serde_json::json!({
                "data": [{"type": "users", "id": "alice"}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.team_members().add("team-1", &["alice"]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn team_access_links_team_and_workspace() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/team-workspaces")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "data": {
                    "attributes": {"access": "write"},
                    "relationships": {
                        "team": {"data": {"type": "teams", "id": "team-1"}},
                        "workspace": {"data": {"type": "workspaces", "id": "ws-1"}}
                    }
                }
            })))
            .with_status(201)
            .with_body(r#"{"data":{"id":"tws-1","type":"team-workspaces","attributes":{"access":"write"}}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let access = client.team_access().add("write", "team-1", "ws-1").await.unwrap();
        assert_eq!(access.id(), "tws-1");
        mock.assert_async().await;
    }
}
