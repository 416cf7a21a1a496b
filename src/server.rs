//! gRPC server for the provider protocol.
//!
//! [`ProviderService`] is the high-level trait the provider implements;
//! [`serve`] binds a port, prints the handshake line and runs the server
//! until SIGTERM or SIGINT.
//!
//! # Signal Handling
//!
//! On a shutdown signal the server stops accepting connections and waits up
//! to [`ServeOptions::shutdown_timeout`] for in-flight requests. The
//! provider's `stop()` runs afterwards.
//!
//! Provider failures never surface as gRPC status codes: every RPC answers
//! with a response whose diagnostics describe the failure.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as pb;
use crate::schema::{Block, Diagnostic, DiagnosticSeverity, NestingMode, ProviderSchema, Schema};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// Operations the host can invoke on a provider.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// The provider configuration schema and every resource schema.
    fn schema(&self) -> ProviderSchema;

    /// Resource type names and capabilities, derived from the schema.
    fn metadata(&self) -> ProviderMetadata {
        let mut resources: Vec<String> = self.schema().resources.keys().cloned().collect();
        resources.sort();
        ProviderMetadata {
            resources,
            capabilities: Default::default(),
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Release resources held by the provider.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Upgrade state written under an older schema version.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Compute the planned state and the attribute changes.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a resource, returning its new state.
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh a resource's state from the API.
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError>;

    /// Update a resource in place, returning its new state.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Adopt an existing object by its import id.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let _ = id;
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }
}

/// Adapter from [`ProviderService`] to the generated gRPC trait.
struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<pb::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| pb::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => pb::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => pb::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_diagnostics(err: ProviderError) -> Vec<pb::Diagnostic> {
    vec![pb::Diagnostic {
        severity: pb::diagnostic::Severity::Error as i32,
        summary: err.to_string(),
        detail: String::new(),
        attribute: String::new(),
    }]
}

fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

fn decode_json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(Value::Null)
}

fn encode_json(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn schema_to_proto(schema: &Schema) -> pb::Schema {
    pb::Schema {
        version: schema.version as i64,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> pb::Block {
    let mut attributes: Vec<pb::Attribute> = block
        .attributes
        .iter()
        .map(|(name, attr)| pb::Attribute {
            name: name.clone(),
            r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
            required: attr.flags.required,
            optional: attr.flags.optional,
            computed: attr.flags.computed,
            sensitive: attr.flags.sensitive,
            description: attr.description.clone().unwrap_or_default(),
            force_new: attr.force_new,
            default_value: attr.default.as_ref().map(encode_json).unwrap_or_default(),
            allowed_values: attr.allowed_values.clone(),
        })
        .collect();
    attributes.sort_by(|a, b| a.name.cmp(&b.name));

    let mut block_types: Vec<pb::NestedBlock> = block
        .blocks
        .iter()
        .map(|(name, nested)| pb::NestedBlock {
            type_name: name.clone(),
            block: Some(block_to_proto(&nested.block)),
            nesting_mode: match nested.nesting_mode {
                NestingMode::Single => pb::nested_block::NestingMode::Single as i32,
            },
            min_items: nested.min_items as i32,
            max_items: nested.max_items as i32,
        })
        .collect();
    block_types.sort_by(|a, b| a.type_name.cmp(&b.type_name));

    pb::Block {
        attributes,
        block_types,
        description: block.description.clone().unwrap_or_default(),
    }
}

#[tonic::async_trait]
impl<P: ProviderService> pb::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<pb::GetMetadataRequest>,
    ) -> Result<tonic::Response<pb::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        debug!(resources = metadata.resources.len(), "GetMetadata completed");
        Ok(tonic::Response::new(pb::GetMetadataResponse {
            server_capabilities: Some(pb::ServerCapabilities {
                plan_destroy: metadata.capabilities.plan_destroy,
            }),
            resources: metadata.resources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<pb::GetSchemaRequest>,
    ) -> Result<tonic::Response<pb::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        debug!(resources = schema.resources.len(), "GetSchema completed");
        Ok(tonic::Response::new(pb::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<pb::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<pb::ValidateProviderConfigResponse>, tonic::Status> {
        let config = decode_json(&request.into_inner().config);

        let diagnostics = match self.provider.validate_provider_config(config).await {
            Ok(diagnostics) => {
                if has_errors(&diagnostics) {
                    warn!(diagnostics = diagnostics.len(), "ValidateProviderConfig completed with errors");
                }
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateProviderConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(pb::ValidateProviderConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<pb::ConfigureRequest>,
    ) -> Result<tonic::Response<pb::ConfigureResponse>, tonic::Status> {
        let config = decode_json(&request.into_inner().config);

        let diagnostics = match self.provider.configure(config).await {
            Ok(diagnostics) => {
                if has_errors(&diagnostics) {
                    warn!(diagnostics = diagnostics.len(), "Configure completed with errors");
                } else {
                    info!("Configure completed successfully");
                }
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "Configure failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(pb::ConfigureResponse { diagnostics }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<pb::StopRequest>,
    ) -> Result<tonic::Response<pb::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(pb::StopResponse { error }))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.validate_resource_config")]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<pb::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<pb::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let config = decode_json(&req.config);

        let diagnostics = match self
            .provider
            .validate_resource_config(&req.resource_type, config)
            .await
        {
            Ok(diagnostics) => {
                if has_errors(&diagnostics) {
                    warn!(diagnostics = diagnostics.len(), "ValidateResourceConfig completed with errors");
                }
                diagnostics_to_proto(diagnostics)
            },
            Err(e) => {
                error!(error = %e, "ValidateResourceConfig failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(pb::ValidateResourceConfigResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.upgrade_resource_state")]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<pb::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<pb::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let state = decode_json(&req.raw_state);

        let response = match self
            .provider
            .upgrade_resource_state(&req.resource_type, req.version, state)
            .await
        {
            Ok(upgraded) => {
                debug!(from_version = req.version, "UpgradeResourceState completed");
                pb::UpgradeResourceStateResponse {
                    upgraded_state: encode_json(&upgraded),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(version = req.version, error = %e, "UpgradeResourceState failed");
                pb::UpgradeResourceStateResponse {
                    upgraded_state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.plan")]
    async fn plan(
        &self,
        request: tonic::Request<pb::PlanRequest>,
    ) -> Result<tonic::Response<pb::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());

        let prior_state = if req.prior_state.is_empty() {
            Ok(None)
        } else {
            serde_json::from_slice::<Value>(&req.prior_state).map(Some)
        };
        let proposed_state = decode_json(&req.proposed_state);
        let config = decode_json(&req.config);

        let result = match prior_state {
            Ok(prior_state) => {
                self.provider
                    .plan(&req.resource_type, prior_state, proposed_state, config)
                    .await
            },
            Err(e) => {
                warn!(error = %e, "Discarding plan with unreadable prior state");
                Err(ProviderError::InvalidRequest(format!("invalid prior state: {}", e)))
            },
        };

        let response = match result {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                pb::PlanResponse {
                    planned_state: encode_json(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Plan failed");
                pb::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.create")]
    async fn create(
        &self,
        request: tonic::Request<pb::CreateRequest>,
    ) -> Result<tonic::Response<pb::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let planned_state = decode_json(&req.planned_state);

        let response = match self.provider.create(&req.resource_type, planned_state).await {
            Ok(state) => {
                info!("Create completed successfully");
                pb::CreateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Create failed");
                pb::CreateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.read")]
    async fn read(
        &self,
        request: tonic::Request<pb::ReadRequest>,
    ) -> Result<tonic::Response<pb::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let current_state = decode_json(&req.current_state);

        let response = match self.provider.read(&req.resource_type, current_state).await {
            Ok(state) => {
                debug!("Read completed successfully");
                pb::ReadResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Read failed");
                pb::ReadResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.update")]
    async fn update(
        &self,
        request: tonic::Request<pb::UpdateRequest>,
    ) -> Result<tonic::Response<pb::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let prior_state = decode_json(&req.prior_state);
        let planned_state = decode_json(&req.planned_state);

        let response = match self
            .provider
            .update(&req.resource_type, prior_state, planned_state)
            .await
        {
            Ok(state) => {
                info!("Update completed successfully");
                pb::UpdateResponse {
                    state: encode_json(&state),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Update failed");
                pb::UpdateResponse {
                    state: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(skip(self, request), fields(resource_type), name = "grpc.delete")]
    async fn delete(
        &self,
        request: tonic::Request<pb::DeleteRequest>,
    ) -> Result<tonic::Response<pb::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        tracing::Span::current().record("resource_type", req.resource_type.as_str());
        let current_state = decode_json(&req.current_state);

        let diagnostics = match self.provider.delete(&req.resource_type, current_state).await {
            Ok(()) => {
                info!("Delete completed successfully");
                vec![]
            },
            Err(e) => {
                error!(error = %e, "Delete failed");
                error_to_diagnostics(e)
            },
        };
        Ok(tonic::Response::new(pb::DeleteResponse { diagnostics }))
    }

    #[instrument(skip(self, request), fields(resource_type, id), name = "grpc.import_resource_state")]
    async fn import_resource_state(
        &self,
        request: tonic::Request<pb::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<pb::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let span = tracing::Span::current();
        span.record("resource_type", req.resource_type.as_str());
        span.record("id", req.id.as_str());

        let response = match self.provider.import_resource(&req.resource_type, &req.id).await {
            Ok(imported) => {
                info!(imported_count = imported.len(), "ImportResourceState completed");
                pb::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| pb::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode_json(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                pb::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_diagnostics(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }
}

/// Options for running the provider server.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// How long in-flight requests may run after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for SIGTERM or SIGINT (CTRL+C on Windows).
///
/// If the handlers cannot be installed this never resolves; the host then
/// stops the plugin by killing it.
async fn wait_for_shutdown_signal() {
    if let Err(e) = recv_shutdown_signal().await {
        error!(error = %e, "Failed to install signal handlers");
        std::future::pending::<()>().await;
    }
}

async fn recv_shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received CTRL+C, initiating graceful shutdown");
    }

    #[cfg(not(any(unix, windows)))]
    {
        std::future::pending::<()>().await;
    }

    Ok(())
}

/// Serve a provider on an ephemeral localhost port.
///
/// Prints `FOLGE_PROVIDER|<version>|<address>` to stdout once the port is
/// bound, then serves until a shutdown signal arrives.
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), Box<dyn std::error::Error>> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Like [`serve`], with custom options.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    serve_on_listener(provider, listener, options).await
}

/// Serve a provider on a fixed address.
pub async fn serve_on<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    serve_on_with_options(provider, addr, ServeOptions::default()).await
}

/// Like [`serve_on`], with custom options.
pub async fn serve_on_with_options<P: ProviderService>(
    provider: P,
    addr: SocketAddr,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    serve_on_listener(provider, listener, options).await
}

async fn serve_on_listener<P: ProviderService>(
    provider: P,
    listener: TcpListener,
    options: ServeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = listener.local_addr()?;
    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let grpc_service = ProviderGrpcService {
        provider: Arc::clone(&provider),
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(
        Server::builder()
            .add_service(pb::provider_server::ProviderServer::new(grpc_service))
            .serve_with_incoming_shutdown(
                tokio_stream::wrappers::TcpListenerStream::new(listener),
                async {
                    let _ = shutdown_rx.await;
                },
            ),
    );

    let signalled = tokio::select! {
        result = &mut server => {
            // The server stopped without being asked to.
            result??;
            false
        }
        _ = wait_for_shutdown_signal() => true,
    };

    if signalled {
        let _ = shutdown_tx.send(());
        match tokio::time::timeout(options.shutdown_timeout, &mut server).await {
            Ok(result) => result??,
            Err(_) => {
                warn!(timeout = ?options.shutdown_timeout, "Shutdown timeout exceeded, forcing shutdown");
                server.abort();
            },
        }
    }

    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}
