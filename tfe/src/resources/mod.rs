//! Managed resources

pub mod agent_pool;
pub mod agent_token;
pub mod hyok_configuration;
pub mod oidc_configuration;
pub mod organization;
pub mod policy_set;
pub mod project;
pub mod stack;
pub mod team;
pub mod team_access;
pub mod team_member;
pub mod variable;
pub mod variable_set;
pub mod workspace;
pub mod workspace_settings;

use crate::api::ApiError;
use crate::{models, plan_modifiers, version, TfeProviderData};
use tfplug::resource::{ModifyPlanRequest, ModifyPlanResponse};
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

pub(crate) fn not_configured() -> Diagnostic {
    Diagnostic::error(
        "Provider not configured",
        "Provider data was not properly configured",
    )
}

/// "Error creating workspace" style diagnostic carrying the API error text
pub(crate) fn api_error(action: &str, err: &ApiError) -> Diagnostic {
    Diagnostic::error(format!("Error {}", action), err.to_string())
}

pub(crate) fn missing_attribute(name: &str) -> Diagnostic {
    Diagnostic::error(
        format!("Missing {}", name),
        format!("The '{}' attribute is required", name),
    )
    .with_attribute(AttributePath::new(name))
}

/// Computed `id` that survives updates
pub(crate) fn id_attribute(description: &str) -> Attribute {
    AttributeBuilder::new("id", AttributeType::String)
        .description(description)
        .computed()
        .plan_modifier(tfplug::plan_modifier::UseStateForUnknown::create())
        .build()
}

/// Optional `organization` filled from the provider default during planning
pub(crate) fn organization_attribute() -> Attribute {
    AttributeBuilder::new("organization", AttributeType::String)
        .description("Organization name. Defaults to the provider organization")
        .optional()
        .computed()
        .plan_modifier(tfplug::plan_modifier::UseStateForUnknown::create())
        .plan_modifier(tfplug::plan_modifier::RequiresReplace::create())
        .build()
}

/// Plan adjustment for resources whose only plan-time logic is the
/// organization default
pub(crate) fn plan_with_default_organization(
    provider_data: Option<&TfeProviderData>,
    request: ModifyPlanRequest,
) -> ModifyPlanResponse {
    let mut planned = request.proposed_new_state;
    let mut diagnostics = vec![];

    let default = provider_data.and_then(|data| data.organization.as_deref());
    if let Some(diag) = plan_modifiers::default_organization(&request.config, &mut planned, default) {
        diagnostics.push(diag);
    }

    ModifyPlanResponse {
        planned_state: planned,
        requires_replace: vec![],
        planned_private: request.prior_private,
        diagnostics,
    }
}

/// Organization from state, falling back to the provider default
pub(crate) fn resolve_organization(
    provider_data: &TfeProviderData,
    value: &DynamicValue,
) -> Result<String, Diagnostic> {
    provider_data
        .organization_or(models::non_empty_string(value, "organization"))
        .ok_or_else(|| missing_attribute("organization"))
}

/// Checks the remote version before using an endpoint that needs `minimum`
pub(crate) async fn require_tfe_version(
    client: &crate::api::Client,
    minimum: &str,
    feature: &str,
) -> Result<(), Diagnostic> {
    let meta = client
        .ping()
        .await
        .map_err(|e| api_error("checking remote version", &e))?;

    version::ensure_minimum_tfe_version(meta.tfe_version.as_deref(), minimum, feature)
        .map_err(|e| Diagnostic::error("Unsupported Terraform Enterprise version", e.to_string()))
}
