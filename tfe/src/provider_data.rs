//! Provider data structure passed to resources and data sources

use crate::api::Client;
use std::any::Any;
use std::sync::Arc;
use tfplug::types::Diagnostic;

#[derive(Clone)]
pub struct TfeProviderData {
    pub client: Arc<Client>,
    /// Default organization for resources that omit one
    pub organization: Option<String>,
}

impl TfeProviderData {
    pub fn new(client: Client, organization: Option<String>) -> Self {
        Self {
            client: Arc::new(client),
            organization,
        }
    }

    /// Explicit value first, then the provider default
    pub fn organization_or(&self, explicit: Option<String>) -> Option<String> {
        explicit.or_else(|| self.organization.clone())
    }

    /// Recovers provider data handed to `configure`
    pub fn from_provider_data(
        data: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Result<Self, Diagnostic> {
        let data = data.ok_or_else(|| {
            Diagnostic::error(
                "No provider data",
                "No provider data was provided to the resource",
            )
        })?;

        data.downcast_ref::<TfeProviderData>()
            .cloned()
            .ok_or_else(|| {
                Diagnostic::error(
                    "Invalid provider data",
                    "Failed to extract TfeProviderData from provider data",
                )
            })
    }
}
