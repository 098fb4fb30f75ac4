//! Built-in attribute plan modifiers
//!
//! Plan modifiers run after the framework has filled in defaults and unknown
//! computed values. They can:
//! - Modify the planned value
//! - Mark an attribute as requiring replacement
//! - Add warnings or errors to the plan

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::{Diagnostic, Dynamic};

/// Marks an attribute as requiring replacement when a known prior value changes
pub struct RequiresReplace;

impl RequiresReplace {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces replacement".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = !request.is_create
            && !request.state_value.is_unknown()
            && !request.plan_value.is_unknown()
            && !values_equal(&request.state_value, &request.plan_value);

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: vec![],
        }
    }
}

/// Uses the prior state value when the planned value is unknown
///
/// For computed attributes that never change after creation (ids, urls),
/// this keeps plans free of "known after apply" noise.
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value of this attribute in state will not change".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        if request.is_create || !request.plan_value.is_unknown() || request.state_value.is_null()
        {
            return PlanModifierResponse::unchanged(request);
        }

        PlanModifierResponse {
            plan_value: request.state_value,
            requires_replace: false,
            diagnostics: vec![],
        }
    }
}

/// Requires replacement when the predicate holds
pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync + 'static,
{
    pub fn create(predicate: F, description: impl Into<String>) -> Box<dyn PlanModifier> {
        Box::new(Self {
            predicate,
            description: description.into(),
        })
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifierRequest) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let mut diagnostics = vec![];
        let requires_replace = !request.is_create && (self.predicate)(&request);

        if requires_replace {
            diagnostics.push(Diagnostic::warning(
                format!("Attribute '{}' requires resource replacement", request.path),
                self.description.clone(),
            ));
        }

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics,
        }
    }
}

/// Structural equality over dynamic values. List order matters.
pub fn values_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::Null, Dynamic::Null) => true,
        (Dynamic::Unknown, Dynamic::Unknown) => true,
        (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
        (Dynamic::Number(a), Dynamic::Number(b)) => (a - b).abs() < f64::EPSILON,
        (Dynamic::String(a), Dynamic::String(b)) => a == b,
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Dynamic::Map(a), Dynamic::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

/// Equality for set-typed values. Element order and repeats are ignored.
pub fn sets_equal(a: &Dynamic, b: &Dynamic) -> bool {
    match (a, b) {
        (Dynamic::List(a), Dynamic::List(b)) => {
            a.iter().all(|x| b.iter().any(|y| values_equal(x, y)))
                && b.iter().all(|y| a.iter().any(|x| values_equal(x, y)))
        }
        _ => values_equal(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;
    use std::collections::HashMap;

    fn request(state: Dynamic, plan: Dynamic, is_create: bool) -> PlanModifierRequest {
        PlanModifierRequest {
            config_value: plan.clone(),
            state_value: state,
            plan_value: plan,
            path: AttributePath::new("field"),
            is_create,
        }
    }

    #[test]
    fn requires_replace_does_not_trigger_on_same_value() {
        let response = RequiresReplace.modify(request(
            Dynamic::String("hello".to_string()),
            Dynamic::String("hello".to_string()),
            false,
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn requires_replace_triggers_on_different_value() {
        let response = RequiresReplace.modify(request(
            Dynamic::String("hello".to_string()),
            Dynamic::String("world".to_string()),
            false,
        ));
        assert!(response.requires_replace);
    }

    #[test]
    fn requires_replace_ignores_create_and_unknown() {
        let response = RequiresReplace.modify(request(
            Dynamic::Null,
            Dynamic::String("new".to_string()),
            true,
        ));
        assert!(!response.requires_replace);

        let response = RequiresReplace.modify(request(
            Dynamic::String("value".to_string()),
            Dynamic::Unknown,
            false,
        ));
        assert!(!response.requires_replace);
    }

    #[test]
    fn use_state_for_unknown_preserves_state_when_unknown() {
        let response = UseStateForUnknown.modify(request(
            Dynamic::String("ws-abc".to_string()),
            Dynamic::Unknown,
            false,
        ));
        assert_eq!(response.plan_value, Dynamic::String("ws-abc".to_string()));
    }

    #[test]
    fn use_state_for_unknown_keeps_unknown_on_create() {
        let response = UseStateForUnknown.modify(request(Dynamic::Null, Dynamic::Unknown, true));
        assert_eq!(response.plan_value, Dynamic::Unknown);
    }

    #[test]
    fn requires_replace_if_triggers_on_condition() {
        let modifier = RequiresReplaceIf::create(
            |req| {
                matches!((&req.state_value, &req.plan_value),
                    (Dynamic::Bool(true), Dynamic::Bool(false)))
            },
            "turning sensitivity off forces replacement",
        );

        let response = modifier.modify(request(Dynamic::Bool(true), Dynamic::Bool(false), false));
        assert!(response.requires_replace);
        assert_eq!(response.diagnostics.len(), 1);

        let response = modifier.modify(request(Dynamic::Bool(false), Dynamic::Bool(true), false));
        assert!(!response.requires_replace);
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn values_equal_handles_nested_values() {
        let mut map1 = HashMap::new();
        map1.insert("key".to_string(), Dynamic::string_list(["a", "b"]));
        let map2 = map1.clone();
        let mut map3 = HashMap::new();
        map3.insert("key".to_string(), Dynamic::string_list(["b", "a"]));

        assert!(values_equal(&Dynamic::Map(map1.clone()), &Dynamic::Map(map2)));
        assert!(!values_equal(&Dynamic::Map(map1), &Dynamic::Map(map3)));
        assert!(!values_equal(&Dynamic::Number(1.0), &Dynamic::Number(2.0)));
    }

    #[test]
    fn sets_ignore_order_and_repeats() {
        let a = Dynamic::string_list(["x", "y"]);
        assert!(sets_equal(&a, &Dynamic::string_list(["y", "x", "y"])));
        assert!(!sets_equal(&a, &Dynamic::string_list(["x", "z"])));
        assert!(sets_equal(&Dynamic::Null, &Dynamic::Null));
        assert!(!values_equal(&a, &Dynamic::string_list(["y", "x"])));
    }
}
