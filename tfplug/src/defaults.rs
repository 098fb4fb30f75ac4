//! Default value providers for attributes
//!
//! Defaults are evaluated during planning when an optional+computed attribute
//! is absent from configuration. They never override an explicit value.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::StaticDefault;
//!
//! let auto_apply = AttributeBuilder::new("auto_apply", AttributeType::Bool)
//!     .optional()
//!     .default(StaticDefault::bool(false))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse};
use crate::types::Dynamic;
use std::env;

/// StaticDefault provides a fixed value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Box<dyn Default> {
        Box::new(Self { value })
    }

    pub fn string(value: &str) -> Box<dyn Default> {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Box<dyn Default> {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Box<dyn Default> {
        Self::create(Dynamic::Bool(value))
    }

    /// An empty list, used for set attributes that should never plan as null
    pub fn empty_list() -> Box<dyn Default> {
        Self::create(Dynamic::List(vec![]))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("defaults to {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}

/// EnvDefault reads the default from an environment variable
pub struct EnvDefault {
    env_var: String,
    fallback: Option<String>,
}

impl EnvDefault {
    pub fn create(env_var: &str, fallback: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            fallback: Some(fallback.to_string()),
        })
    }

    /// Null when the variable is unset
    pub fn create_optional(env_var: &str) -> Box<dyn Default> {
        Box::new(Self {
            env_var: env_var.to_string(),
            fallback: None,
        })
    }
}

impl Default for EnvDefault {
    fn description(&self) -> String {
        match &self.fallback {
            Some(fallback) => format!(
                "default from environment variable {} (fallback: {})",
                self.env_var, fallback
            ),
            None => format!("default from environment variable {}", self.env_var),
        }
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        let value = match env::var(&self.env_var) {
            Ok(val) if !val.is_empty() => Dynamic::String(val),
            _ => self
                .fallback
                .clone()
                .map(Dynamic::String)
                .unwrap_or(Dynamic::Null),
        };

        DefaultResponse { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    fn request() -> DefaultRequest {
        DefaultRequest {
            path: AttributePath::new("test"),
        }
    }

    #[test]
    fn static_defaults() {
        assert_eq!(
            StaticDefault::string("remote").default_value(request()).value,
            Dynamic::String("remote".to_string())
        );
        assert_eq!(
            StaticDefault::bool(true).default_value(request()).value,
            Dynamic::Bool(true)
        );
        assert_eq!(
            StaticDefault::empty_list().default_value(request()).value,
            Dynamic::List(vec![])
        );
    }

    #[test]
    fn env_default_uses_fallback_when_unset() {
        let default = EnvDefault::create("TFPLUG_TEST_SURELY_UNSET_VAR", "fallback");
        assert_eq!(
            default.default_value(request()).value,
            Dynamic::String("fallback".to_string())
        );

        let default = EnvDefault::create_optional("TFPLUG_TEST_SURELY_UNSET_VAR");
        assert_eq!(default.default_value(request()).value, Dynamic::Null);
    }
}
