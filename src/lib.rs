//! Folge provider
//!
//! A provider plugin that manages [Folge](https://folge.io) monitoring
//! objects: applications, their datasources and the checks that run against
//! those datasources. The host spawns the provider as a subprocess and talks
//! to it over gRPC.
//!
//! # Resources
//!
//! | type | import id |
//! |---|---|
//! | `folge_application` | `<id>` |
//! | `folge_datasource` | `<application_id>/<id>` |
//! | `folge_check_http_status` | `<application_id>/<datasource_id>/<id>` |
//! | `folge_check_json_property` | `<application_id>/<datasource_id>/<id>` |
//!
//! # Layout
//!
//! - [`check`]: the typed check codec between resource models and the API's
//!   discriminated check envelope.
//! - [`client`]: the management API client and its transport chain.
//! - [`resources`]: one [`resources::Resource`] per resource type.
//! - [`provider`]: [`FolgeProvider`], configuration and dispatch.
//! - [`server`]: the gRPC adapter, handshake and shutdown handling.
//!
//! # Handshake Protocol
//!
//! When started via [`serve`], the provider prints one line to stdout:
//!
//! ```text
//! FOLGE_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `FOLGE_PROVIDER|<protocol_version>|<address>`. Logs go to stderr.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod check;
pub mod client;
pub mod error;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use error::{ApiError, ProviderError};
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{CassetteOptions, FolgeProvider, ProviderConfig, ProviderOptions};
pub use schema::ProviderSchema;
pub use server::{
    serve, serve_on, serve_on_with_options, serve_with_options, ProviderService, ServeOptions,
};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, ServerCapabilities,
    HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};
pub use validation::{validate, validate_result};

pub use async_trait::async_trait;
