//! Data sources
//!
//! Lookups take a name plus an optional organization and fill the same
//! attributes as the matching resource, all computed.

pub mod agent_pool;
pub mod organization;
pub mod project;
pub mod team;
pub mod variable_set;
pub mod variables;
pub mod workspace;

use crate::resources::api_error;
use crate::{models, TfeProviderData};
use crate::api::ApiError;
use tfplug::data_source::ReadDataSourceResponse;
use tfplug::schema::{Attribute, AttributeBuilder, AttributeType};
use tfplug::types::{Diagnostic, DynamicValue};

pub(crate) fn name_attribute(description: &str) -> Attribute {
    AttributeBuilder::new("name", AttributeType::String)
        .description(description)
        .required()
        .build()
}

/// Optional lookup scope; the provider organization is used when omitted
pub(crate) fn organization_attribute() -> Attribute {
    AttributeBuilder::new("organization", AttributeType::String)
        .description("Organization name. Defaults to the provider organization")
        .optional()
        .computed()
        .build()
}

pub(crate) fn computed(name: &str, ty: AttributeType, description: &str) -> Attribute {
    AttributeBuilder::new(name, ty)
        .description(description)
        .computed()
        .build()
}

/// `(organization, name)` from the lookup config
pub(crate) fn lookup_key(
    provider_data: &TfeProviderData,
    config: &DynamicValue,
) -> Result<(String, String), Diagnostic> {
    let organization = crate::resources::resolve_organization(provider_data, config)?;
    let name = models::optional_string(config, "name")
        .ok_or_else(|| crate::resources::missing_attribute("name"))?;
    Ok((organization, name))
}

/// Lookups report a missing object as an error rather than an empty result
pub(crate) fn read_error(action: &str, err: &ApiError) -> ReadDataSourceResponse {
    let diag = if err.is_not_found() {
        Diagnostic::error(
            format!("Error {}", action),
            "no matching object was found",
        )
    } else {
        api_error(action, err)
    };
    ReadDataSourceResponse::error(diag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_client;

    #[test]
    fn lookup_key_falls_back_to_provider_organization() {
        let data = TfeProviderData::new(test_client("http://127.0.0.1:1"), Some("acme".to_string()));
        let mut config = DynamicValue::object();
        models::set(&mut config, "name", "app");
        assert_eq!(
            lookup_key(&data, &config).unwrap(),
            ("acme".to_string(), "app".to_string())
        );

        models::set(&mut config, "organization", "other");
        assert_eq!(lookup_key(&data, &config).unwrap().0, "other");
    }

    #[test]
    fn not_found_reads_are_errors() {
        let response = read_error("reading workspace", &ApiError::NotFound);
        assert_eq!(response.diagnostics[0].summary, "Error reading workspace");
        assert_eq!(response.diagnostics[0].detail, "no matching object was found");
        assert!(response.state.is_null());
    }
}
