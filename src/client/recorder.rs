//! Request/response recording for offline tests.
//!
//! A [`Recorder`] sits in the transport chain and stores every interaction
//! in a YAML cassette, or answers requests from a previously recorded one.
//! Credentials never reach the cassette: request headers are dropped and
//! response headers are reduced to `Content-Type`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::error::ApiError;

/// Version written to new cassettes.
pub const CASSETTE_VERSION: u32 = 1;

/// Response headers kept in recorded interactions.
const KEPT_RESPONSE_HEADERS: &[&str] = &["Content-Type"];

/// How a [`Recorder`] treats the network and the cassette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderMode {
    /// Forward every request and record it, replacing the cassette.
    Record,
    /// Answer only from the cassette; never touch the network.
    Replay,
    /// Replay when the cassette exists, otherwise record a new one.
    ReplayOrRecord,
}

/// A recorded request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Absolute URL.
    pub url: String,
    /// Headers, after scrubbing.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A recorded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Headers, after scrubbing.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(default)]
    pub body: String,
}

/// One request and the response it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    /// The request.
    pub request: RecordedRequest,
    /// The response.
    pub response: RecordedResponse,
}

/// The on-disk cassette format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cassette {
    /// Format version.
    pub version: u32,
    /// Interactions in the order they happened.
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Read a cassette from disk.
    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Recorder(format!("reading {}: {}", path.display(), e)))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| ApiError::Recorder(format!("parsing {}: {}", path.display(), e)))
    }

    /// Write the cassette to disk, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ApiError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Recorder(format!("creating {}: {}", parent.display(), e)))?;
        }
        let raw = serde_yaml::to_string(self)
            .map_err(|e| ApiError::Recorder(format!("encoding cassette: {}", e)))?;
        std::fs::write(path, raw)
            .map_err(|e| ApiError::Recorder(format!("writing {}: {}", path.display(), e)))
    }
}

fn clean_headers(headers: &[(String, String)], keep: &[&str]) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| keep.iter().any(|k| k.eq_ignore_ascii_case(name)))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[derive(Debug)]
struct ReplaySlot {
    interaction: Interaction,
    used: bool,
}

#[derive(Debug, Default)]
struct RecorderState {
    recorded: Vec<Interaction>,
    replay: Vec<ReplaySlot>,
}

/// Records interactions to, or replays them from, a cassette file.
pub struct Recorder {
    path: PathBuf,
    replaying: bool,
    inner: Option<Arc<dyn Transport>>,
    state: Mutex<RecorderState>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("path", &self.path)
            .field("replaying", &self.replaying)
            .finish()
    }
}

impl Recorder {
    /// Open a recorder on `path`.
    ///
    /// `inner` is required whenever the mode may record; [`RecorderMode::Replay`]
    /// fails if the cassette does not exist.
    pub fn new(
        path: impl Into<PathBuf>,
        mode: RecorderMode,
        inner: Option<Arc<dyn Transport>>,
    ) -> Result<Self, ApiError> {
        let path = path.into();
        let replaying = match mode {
            RecorderMode::Record => false,
            RecorderMode::Replay => true,
            RecorderMode::ReplayOrRecord => path.exists(),
        };

        let mut state = RecorderState::default();
        if replaying {
            let cassette = Cassette::load(&path)?;
            state.replay = cassette
                .interactions
                .into_iter()
                .map(|interaction| ReplaySlot {
                    interaction,
                    used: false,
                })
                .collect();
        } else if inner.is_none() {
            return Err(ApiError::Recorder(format!(
                "recording {} needs a transport to forward to",
                path.display()
            )));
        }

        info!(path = %path.display(), replaying, "Opened cassette");
        Ok(Self {
            path,
            replaying,
            inner,
            state: Mutex::new(state),
        })
    }

    /// Whether requests are answered from the cassette.
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Finish the session, writing recorded interactions to the cassette.
    ///
    /// A replaying recorder leaves the cassette untouched.
    pub async fn stop(&self) -> Result<(), ApiError> {
        if self.replaying {
            return Ok(());
        }
        let state = self.state.lock().await;
        let cassette = Cassette {
            version: CASSETTE_VERSION,
            interactions: state.recorded.clone(),
        };
        cassette.save(&self.path)?;
        info!(
            path = %self.path.display(),
            interactions = cassette.interactions.len(),
            "Saved cassette"
        );
        Ok(())
    }

    async fn replay(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let mut state = self.state.lock().await;
        let method = request.method.as_str();
        let slot = state
            .replay
            .iter_mut()
            .find(|slot| {
                !slot.used
                    && slot.interaction.request.method == method
                    && slot.interaction.request.url == request.url
            })
            .ok_or_else(|| {
                ApiError::Recorder(format!(
                    "no recorded interaction left for {} {}",
                    method, request.url
                ))
            })?;
        slot.used = true;

        let recorded = &slot.interaction.response;
        debug!(method, url = %request.url, status = recorded.status, "Replaying interaction");
        Ok(ApiResponse {
            status: StatusCode::from_u16(recorded.status).map_err(|e| {
                ApiError::Recorder(format!("invalid recorded status {}: {}", recorded.status, e))
            })?,
            headers: recorded
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            body: recorded.body.clone(),
        })
    }
}

#[async_trait]
impl Transport for Recorder {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if self.replaying {
            return self.replay(&request).await;
        }

        let inner = self
            .inner
            .as_ref()
            .ok_or_else(|| ApiError::Recorder("no transport to record from".to_string()))?;
        let recorded_request = RecordedRequest {
            method: request.method.as_str().to_string(),
            url: request.url.clone(),
            headers: clean_headers(&request.headers, &[]),
            body: request.body.clone(),
        };

        let response = inner.send(request).await?;
        self.state.lock().await.recorded.push(Interaction {
            request: recorded_request,
            response: RecordedResponse {
                status: response.status.as_u16(),
                headers: clean_headers(&response.headers, KEPT_RESPONSE_HEADERS),
                body: response.body.clone(),
            },
        });
        Ok(response)
    }
}
