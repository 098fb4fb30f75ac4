//! Resource-level plan adjustments shared by several resources

use crate::models;
use std::collections::HashMap;
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Pairs of (top-level attribute, key inside `overwrites`)
const OVERWRITE_PAIRS: [(&str, &str); 2] = [
    ("execution_mode", "execution_mode"),
    ("agent_pool_id", "agent_pool"),
];

/// Keeps the nested `overwrites` flags in step with the top-level settings.
///
/// A setting present in configuration is an overwrite. An absent setting is
/// inherited from the organization: its planned value is unknown, unless the
/// prior state already inherited it, in which case the prior value stands.
pub fn sync_setting_overwrites(
    config: &DynamicValue,
    prior_state: &DynamicValue,
    planned: &mut DynamicValue,
) {
    let prior_overwrites = models::object(prior_state, "overwrites");
    let mut overwrites = HashMap::new();

    for (attribute, flag) in OVERWRITE_PAIRS {
        let configured = models::is_known(config, attribute);
        overwrites.insert(flag.to_string(), Dynamic::Bool(configured));

        if configured {
            continue;
        }

        let previously_inherited = prior_overwrites
            .as_ref()
            .and_then(|o| models::optional_bool(o, flag))
            == Some(false);
        let prior_value = prior_state.get_value(&AttributePath::new(attribute));

        let value = match prior_value {
            Some(value) if previously_inherited => value.clone(),
            _ => Dynamic::Unknown,
        };
        models::set(planned, attribute, value);
    }

    let _ = planned.set_map(&AttributePath::new("overwrites"), overwrites);
}

/// Fills a missing `organization` from the provider default
pub fn default_organization(
    config: &DynamicValue,
    planned: &mut DynamicValue,
    default: Option<&str>,
) -> Option<Diagnostic> {
    if models::is_known(config, "organization") || models::is_known(planned, "organization") {
        return None;
    }

    match default {
        Some(organization) => {
            models::set(planned, "organization", organization);
            None
        }
        None => Some(
            Diagnostic::error(
                "Missing organization",
                "Set the organization attribute, or configure a default organization on the provider or with TFE_ORGANIZATION",
            )
            .with_attribute(AttributePath::new("organization")),
        ),
    }
}
