//! tfplug - Terraform Plugin Framework for Rust
//!
//! Values, schemas, provider/resource/data source traits and an in-process
//! server that runs the framework side of planning, apply, import and
//! state upgrades.

// Core modules
pub mod context;
pub mod error;
pub mod schema;
pub mod types;

// Provider API modules
pub mod data_source;
pub mod provider;
pub mod resource;

// Helper modules
pub mod defaults;
pub mod import;
pub mod plan_modifier;
pub mod validator;

pub mod server;

// Re-exports for convenience
pub use context::Context;
pub use data_source::{DataSource, DataSourceWithConfigure};
pub use error::{Result, TfplugError};
pub use import::import_state_passthrough_id;
pub use provider::{DataSourceFactory, Provider, ResourceFactory};
pub use resource::{
    Resource, ResourceWithConfigure, ResourceWithImportState, ResourceWithModifyPlan,
    ResourceWithUpgradeState,
};
pub use schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
pub use server::{init_logging, LogLevel, ProviderServer, ServerConfig};
pub use types::{Diagnostic, Dynamic, DynamicValue, PrivateStateData};
