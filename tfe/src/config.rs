//! Provider configuration: schema values, environment fallbacks and the
//! Terraform CLI credentials file

use crate::api::DEFAULT_HOSTNAME;
use crate::models;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tfplug::defaults::EnvDefault;
use tfplug::schema::{Default as AttributeDefault, DefaultRequest};
use tfplug::types::{AttributePath, Dynamic, DynamicValue};

pub const ENV_HOSTNAME: &str = "TFE_HOSTNAME";
pub const ENV_TOKEN: &str = "TFE_TOKEN";
pub const ENV_ORGANIZATION: &str = "TFE_ORGANIZATION";
pub const ENV_SSL_SKIP_VERIFY: &str = "TFE_SSL_SKIP_VERIFY";
pub const ENV_CLI_CONFIG_DIR: &str = "TF_CLI_CONFIG_DIR";

const CREDENTIALS_FILE: &str = "credentials.tfrc.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token found for {hostname}: set the token attribute, TFE_TOKEN, or run `terraform login {hostname}`")]
    MissingToken { hostname: String },

    #[error("failed to read credentials file {path}: {message}")]
    CredentialsFile { path: String, message: String },

    #[error("{name} must be a boolean, got {value:?}")]
    InvalidBool { name: String, value: String },
}

#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    pub hostname: String,
    pub token: String,
    pub organization: Option<String>,
    pub ssl_skip_verify: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("hostname", &self.hostname)
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("ssl_skip_verify", &self.ssl_skip_verify)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: HashMap<String, CredentialsEntry>,
}

#[derive(Debug, Deserialize)]
struct CredentialsEntry {
    token: String,
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn default_string(name: &str, default: Box<dyn AttributeDefault>) -> Option<String> {
    let request = DefaultRequest {
        path: AttributePath::new(name),
    };
    match default.default_value(request).value {
        Dynamic::String(value) => Some(value),
        _ => None,
    }
}

/// Configured value, else the attribute's default
fn configured_or(
    config: &DynamicValue,
    name: &str,
    default: Box<dyn AttributeDefault>,
) -> Option<String> {
    models::non_empty_string(config, name).or_else(|| default_string(name, default))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Host part used as the credentials file key
fn credentials_key(hostname: &str) -> &str {
    hostname
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
}

/// `$TF_CLI_CONFIG_DIR/credentials.tfrc.json`, else `~/.terraform.d/credentials.tfrc.json`
pub fn credentials_path() -> Option<PathBuf> {
    match env(ENV_CLI_CONFIG_DIR) {
        Some(dir) => Some(PathBuf::from(dir).join(CREDENTIALS_FILE)),
        None => dirs::home_dir().map(|home| home.join(".terraform.d").join(CREDENTIALS_FILE)),
    }
}

/// Token stored by `terraform login`; a missing file is not an error
pub fn token_from_credentials(hostname: &str, path: &Path) -> Result<Option<String>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::CredentialsFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
    };

    let file: CredentialsFile =
        serde_json::from_str(&contents).map_err(|e| ConfigError::CredentialsFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    Ok(file
        .credentials
        .get(credentials_key(hostname))
        .map(|entry| entry.token.clone())
        .filter(|token| !token.is_empty()))
}

impl ProviderConfig {
    /// Configuration values beat environment values
    pub fn resolve(config: &DynamicValue) -> Result<Self, ConfigError> {
        let hostname = configured_or(
            config,
            "hostname",
            EnvDefault::create(ENV_HOSTNAME, DEFAULT_HOSTNAME),
        )
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

        let organization = configured_or(
            config,
            "organization",
            EnvDefault::create_optional(ENV_ORGANIZATION),
        );

        let ssl_skip_verify = match models::optional_bool(config, "ssl_skip_verify") {
            Some(value) => value,
            None => match default_string(
                "ssl_skip_verify",
                EnvDefault::create_optional(ENV_SSL_SKIP_VERIFY),
            ) {
                Some(value) => parse_bool(ENV_SSL_SKIP_VERIFY, &value)?,
                None => false,
            },
        };

        let token = match configured_or(config, "token", EnvDefault::create_optional(ENV_TOKEN)) {
            Some(token) => token,
            None => {
                let from_file = match credentials_path() {
                    Some(path) => {
                        tracing::debug!(path = %path.display(), "Looking up token in credentials file");
                        token_from_credentials(&hostname, &path)?
                    }
                    None => None,
                };
                from_file.ok_or_else(|| ConfigError::MissingToken {
                    hostname: hostname.clone(),
                })?
            }
        };

        Ok(Self {
            hostname,
            token,
            organization,
            ssl_skip_verify,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            ENV_HOSTNAME,
            ENV_TOKEN,
            ENV_ORGANIZATION,
            ENV_SSL_SKIP_VERIFY,
            ENV_CLI_CONFIG_DIR,
        ] {
            std::env::remove_var(name);
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tfe-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    #[serial]
    fn configuration_beats_environment() {
        clear_env();
        std::env::set_var(ENV_HOSTNAME, "tfe.env.test");
        std::env::set_var(ENV_TOKEN, "env-token");
        std::env::set_var(ENV_ORGANIZATION, "env-org");

        let mut config = DynamicValue::object();
        let _ = config.set_string(&AttributePath::new("hostname"), "tfe.config.test".to_string());
        let _ = config.set_string(&AttributePath::new("organization"), "config-org".to_string());

        let resolved = ProviderConfig::resolve(&config).unwrap();
        assert_eq!(resolved.hostname, "tfe.config.test");
        assert_eq!(resolved.token, "env-token");
        assert_eq!(resolved.organization.as_deref(), Some("config-org"));
        assert!(!resolved.ssl_skip_verify);
        clear_env();
    }

    #[test]
    #[serial]
    fn defaults_to_hcp_terraform() {
        clear_env();
        std::env::set_var(ENV_TOKEN, "t");

        let resolved = ProviderConfig::resolve(&DynamicValue::object()).unwrap();
        assert_eq!(resolved.hostname, "app.terraform.io");
        assert_eq!(resolved.organization, None);
        clear_env();
    }

    #[test]
    #[serial]
    fn environment_fills_unset_attributes() {
        clear_env();
        std::env::set_var(ENV_TOKEN, "env-token");
        std::env::set_var(ENV_ORGANIZATION, "env-org");
        std::env::set_var(ENV_SSL_SKIP_VERIFY, "true");
        std::env::set_var(ENV_HOSTNAME, "");

        let resolved = ProviderConfig::resolve(&DynamicValue::object()).unwrap();
        assert_eq!(resolved.hostname, "app.terraform.io");
        assert_eq!(resolved.token, "env-token");
        assert_eq!(resolved.organization.as_deref(), Some("env-org"));
        assert!(resolved.ssl_skip_verify);
        clear_env();
    }

    #[test]
    #[serial]
    fn token_falls_back_to_credentials_file() {
        clear_env();
        let dir = temp_dir();
        std::fs::write(
            dir.join(CREDENTIALS_FILE),
            r#"{"credentials":{"tfe.example.com":{"token":"file-token"}}}"#,
        )
        .unwrap();
        std::env::set_var(ENV_CLI_CONFIG_DIR, &dir);
        std::env::set_var(ENV_HOSTNAME, "tfe.example.com");

        let resolved = ProviderConfig::resolve(&DynamicValue::object()).unwrap();
        assert_eq!(resolved.token, "file-token");

        std::env::set_var(ENV_HOSTNAME, "other.example.com");
        let err = ProviderConfig::resolve(&DynamicValue::object()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken { ref hostname } if hostname == "other.example.com"));

        clear_env();
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    #[serial]
    fn invalid_skip_verify_is_reported() {
        clear_env();
        std::env::set_var(ENV_TOKEN, "t");
        std::env::set_var(ENV_SSL_SKIP_VERIFY, "maybe");

        let err = ProviderConfig::resolve(&DynamicValue::object()).unwrap_err();
        assert_eq!(err.to_string(), "TFE_SSL_SKIP_VERIFY must be a boolean, got \"maybe\"");
        clear_env();
    }

    #[test]
    fn credentials_key_strips_scheme() {
        assert_eq!(credentials_key("https://tfe.example.com/"), "tfe.example.com");
        assert_eq!(credentials_key("app.terraform.io"), "app.terraform.io");
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = ProviderConfig {
            hostname: "app.terraform.io".to_string(),
            token: "super-secret".to_string(),
            organization: None,
            ssl_skip_verify: false,
        };
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
