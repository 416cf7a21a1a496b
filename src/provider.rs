//! The Folge provider.
//!
//! [`FolgeProvider`] implements [`ProviderService`]: it resolves the provider
//! configuration, builds the API client with its transport chain and
//! dispatches resource operations to the [`Resource`] implementations.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::client::{
    Credentials, DebugTransport, FolgeApi, FolgeClient, Recorder, RecorderMode, ReqwestTransport,
    RetryPolicy, RetryTransport, Transport, DEFAULT_URL,
};
use crate::error::ProviderError;
use crate::resources::{self, Resource};
use crate::schema::{Attribute, Diagnostic, ProviderSchema, Schema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation;

/// Environment variable holding the API URL.
pub const ENV_URL: &str = "FOLGE_URL";
/// Environment variable holding the OAuth client id.
pub const ENV_CLIENT_ID: &str = "FOLGE_CLIENT_ID";
/// Environment variable holding the OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "FOLGE_CLIENT_SECRET";

/// Where to record API traffic to, or replay it from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassetteOptions {
    /// The cassette file.
    pub path: PathBuf,
    /// Record, replay, or replay when the file exists.
    pub mode: RecorderMode,
}

/// Process-level options, set from the command line.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Retry behavior for API requests.
    pub retry: RetryPolicy,
    /// Record or replay API traffic.
    pub cassette: Option<CassetteOptions>,
}

/// The provider configuration block as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// API URL.
    #[serde(default)]
    pub url: Option<String>,
    /// OAuth client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
}

/// Configuration after environment fallbacks and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// API URL.
    pub url: String,
    /// OAuth client id, possibly empty.
    pub client_id: String,
    /// Credentials, when both id and secret are known.
    pub credentials: Option<Credentials>,
}

impl ProviderConfig {
    /// Apply environment fallbacks and defaults.
    ///
    /// Values set in the configuration win over the environment. `env` looks
    /// up a variable by name.
    pub fn resolve(self, env: impl Fn(&str) -> Option<String>) -> ResolvedConfig {
        let pick = |configured: Option<String>, name: &str| {
            configured.or_else(|| env(name)).unwrap_or_default()
        };

        let mut url = pick(self.url, ENV_URL);
        if url.is_empty() {
            url = DEFAULT_URL.to_string();
        }
        let client_id = pick(self.client_id, ENV_CLIENT_ID);
        let client_secret = pick(self.client_secret, ENV_CLIENT_SECRET);

        let credentials = (!client_id.is_empty() && !client_secret.is_empty())
            .then(|| Credentials::new(client_id.clone(), client_secret));

        ResolvedConfig {
            url,
            client_id,
            credentials,
        }
    }
}

/// Schema of the provider configuration block.
pub fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_attribute(
            "url",
            Attribute::optional_string()
                .with_description("The Folge API URL. May also be set with FOLGE_URL."),
        )
        .with_attribute(
            "client_id",
            Attribute::optional_string()
                .with_description("The OAuth client id. May also be set with FOLGE_CLIENT_ID.")
                .sensitive(),
        )
        .with_attribute(
            "client_secret",
            Attribute::optional_string()
                .with_description(
                    "The OAuth client secret. May also be set with FOLGE_CLIENT_SECRET.",
                )
                .sensitive(),
        )
}

/// The Folge provider.
pub struct FolgeProvider {
    options: ProviderOptions,
    resources: Vec<Box<dyn Resource>>,
    client: RwLock<Option<Arc<dyn FolgeApi>>>,
    recorder: Mutex<Option<Arc<Recorder>>>,
}

impl Default for FolgeProvider {
    fn default() -> Self {
        Self::new(ProviderOptions::default())
    }
}

impl FolgeProvider {
    /// Create an unconfigured provider.
    pub fn new(options: ProviderOptions) -> Self {
        Self {
            options,
            resources: resources::all(),
            client: RwLock::new(None),
            recorder: Mutex::new(None),
        }
    }

    /// Use `client` for API calls instead of configuring one.
    ///
    /// A later `configure` replaces it.
    pub fn with_client(mut self, client: Arc<dyn FolgeApi>) -> Self {
        self.client = RwLock::new(Some(client));
        self
    }

    /// The process-level options.
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn Resource, ProviderError> {
        self.resources
            .iter()
            .find(|r| r.type_name() == resource_type)
            .map(|r| &**r)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    async fn api(&self) -> Result<Arc<dyn FolgeApi>, ProviderError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(|| ProviderError::Configuration("provider is not configured".to_string()))
    }

    /// Build the transport chain: reqwest, then the recorder, retries and
    /// traffic logging. Traffic is logged at debug level, so `RUST_LOG`
    /// decides whether it shows.
    fn build_transport(&self) -> Result<(Arc<dyn Transport>, Option<Arc<Recorder>>), ProviderError> {
        let mut transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);

        let recorder = match &self.options.cassette {
            Some(cassette) => {
                let recorder = Arc::new(Recorder::new(
                    cassette.path.clone(),
                    cassette.mode,
                    Some(transport),
                )?);
                let recording: Arc<dyn Transport> = recorder.clone();
                transport = recording;
                Some(recorder)
            },
            None => None,
        };

        let retrying = RetryTransport::new(transport, self.options.retry);
        let transport: Arc<dyn Transport> = Arc::new(DebugTransport::new(retrying));
        Ok((transport, recorder))
    }

    async fn stop_recorder(&self, recorder: Option<Arc<Recorder>>) -> Result<(), ProviderError> {
        if let Some(recorder) = recorder {
            recorder.stop().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProviderService for FolgeProvider {
    fn schema(&self) -> ProviderSchema {
        self.resources.iter().fold(
            ProviderSchema::new().with_provider_config(provider_config_schema()),
            |schema, resource| schema.with_resource(resource.type_name(), resource.schema()),
        )
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validation::validate(&provider_config_schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config: ProviderConfig = if config.is_null() {
            ProviderConfig::default()
        } else {
            serde_json::from_value(config)?
        };
        let resolved = config.resolve(|name| std::env::var(name).ok());

        if let Err(e) = reqwest::Url::parse(&resolved.url) {
            return Ok(vec![Diagnostic::error("Invalid Folge API URL")
                .with_detail(format!("{:?}: {}", resolved.url, e))
                .with_attribute("url")]);
        }

        info!(
            folge_url = %resolved.url,
            folge_client_id = %resolved.client_id,
            "Creating Folge client"
        );

        let mut diagnostics = Vec::new();
        if resolved.credentials.is_none() {
            warn!("No Folge API credentials configured");
            diagnostics.push(
                Diagnostic::warning("Missing Folge API credentials").with_detail(
                    "Set client_id and client_secret, or FOLGE_CLIENT_ID and \
                     FOLGE_CLIENT_SECRET. Requests are sent unauthenticated.",
                ),
            );
        }

        let (transport, recorder) = self.build_transport()?;
        let client = FolgeClient::new(resolved.url, resolved.credentials.as_ref(), transport);
        *self.client.write().await = Some(Arc::new(client));

        let previous = std::mem::replace(&mut *self.recorder.lock().await, recorder);
        self.stop_recorder(previous).await?;

        info!("Configured Folge client");
        Ok(diagnostics)
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        let recorder = self.recorder.lock().await.take();
        self.stop_recorder(recorder).await
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(self.resource(resource_type)?.validate(&config))
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let result = self
            .resource(resource_type)?
            .plan(prior_state.as_ref(), &proposed_state);
        debug!(
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "Planned {}",
            resource_type
        );
        Ok(result)
    }

    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let api = self.api().await?;
        resource.create(api.as_ref(), planned_state).await
    }

    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let api = self.api().await?;
        resource.read(api.as_ref(), current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        let api = self.api().await?;
        resource.update(api.as_ref(), prior_state, planned_state).await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        let api = self.api().await?;
        resource.delete(api.as_ref(), current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let api = self.api().await?;
        let state = resource.import(api.as_ref(), id).await?;
        Ok(vec![ImportedResource::new(resource_type, state)])
    }
}
