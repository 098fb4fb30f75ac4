//! HCP Terraform / Terraform Enterprise API client
//!
//! Each remote object group gets a small service struct borrowing the
//! client, e.g. `client.workspaces().read(id)`.

pub mod agent_pools;
pub mod client;
pub mod common;
pub mod error;
pub mod hyok;
pub mod oidc;
pub mod organizations;
pub mod policy_sets;
pub mod projects;
pub mod stacks;
pub mod teams;
pub mod variable_sets;
pub mod variables;
pub mod workspaces;

pub use client::{Client, RemoteMetadata, RetryConfig, DEFAULT_HOSTNAME};
pub use common::{
    ApiQueryParams, Document, ListDocument, ListOptions, Relationship, ResourceIdentifier,
    ResourceObject,
};
pub use error::ApiError;

impl Client {
    pub fn organizations(&self) -> organizations::OrganizationsApi<'_> {
        organizations::OrganizationsApi::new(self)
    }

    pub fn workspaces(&self) -> workspaces::WorkspacesApi<'_> {
        workspaces::WorkspacesApi::new(self)
    }

    pub fn projects(&self) -> projects::ProjectsApi<'_> {
        projects::ProjectsApi::new(self)
    }

    pub fn teams(&self) -> teams::TeamsApi<'_> {
        teams::TeamsApi::new(self)
    }

    pub fn team_members(&self) -> teams::TeamMembersApi<'_> {
        teams::TeamMembersApi::new(self)
    }

    pub fn team_access(&self) -> teams::TeamAccessApi<'_> {
        teams::TeamAccessApi::new(self)
    }

    pub fn policy_sets(&self) -> policy_sets::PolicySetsApi<'_> {
        policy_sets::PolicySetsApi::new(self)
    }

    pub fn variables(&self) -> variables::VariablesApi<'_> {
        variables::VariablesApi::new(self)
    }

    pub fn variable_set_variables(&self) -> variables::VariableSetVariablesApi<'_> {
        variables::VariableSetVariablesApi::new(self)
    }

    pub fn variable_sets(&self) -> variable_sets::VariableSetsApi<'_> {
        variable_sets::VariableSetsApi::new(self)
    }

    pub fn agent_pools(&self) -> agent_pools::AgentPoolsApi<'_> {
        agent_pools::AgentPoolsApi::new(self)
    }

    pub fn agent_tokens(&self) -> agent_pools::AgentTokensApi<'_> {
        agent_pools::AgentTokensApi::new(self)
    }

    pub fn oidc_configurations(&self) -> oidc::OidcConfigurationsApi<'_> {
        oidc::OidcConfigurationsApi::new(self)
    }

    pub fn hyok_configurations(&self) -> hyok::HyokConfigurationsApi<'_> {
        hyok::HyokConfigurationsApi::new(self)
    }

    pub fn stacks(&self) -> stacks::StacksApi<'_> {
        stacks::StacksApi::new(self)
    }
}

#[cfg(test)]
pub(crate) fn test_client(url: &str) -> Client {
    Client::with_config(
        url,
        "test-token",
        false,
        RetryConfig {
            max_retries: 0,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
            timeout_seconds: 5,
        },
    )
    .unwrap()
}
