//! Folge management API client.
//!
//! [`FolgeApi`] is the seam between the resources and the network. The
//! provider talks to a [`FolgeClient`] in production; unit tests swap in an
//! in-memory mock.

use async_trait::async_trait;

use crate::error::ApiError;

pub mod http;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod recorder;
pub mod transport;

pub use http::{Credentials, FolgeClient, DEFAULT_URL};
pub use models::{Application, ApplicationRequest, Check, DataSource};
pub use recorder::{Recorder, RecorderMode};
pub use transport::{
    ApiRequest, ApiResponse, DebugTransport, ReqwestTransport, RetryPolicy, RetryTransport,
    Transport, DEFAULT_MAX_RETRIES,
};

/// Operations of the Folge management API used by the resources.
#[async_trait]
pub trait FolgeApi: Send + Sync {
    /// Create an application.
    async fn create_application(
        &self,
        request: &ApplicationRequest,
    ) -> Result<Application, ApiError>;

    /// Fetch an application.
    async fn get_application(&self, id: i64) -> Result<Application, ApiError>;

    /// Replace an application's settings.
    async fn update_application(
        &self,
        id: i64,
        request: &ApplicationRequest,
    ) -> Result<Application, ApiError>;

    /// Delete an application.
    async fn delete_application(&self, id: i64) -> Result<(), ApiError>;

    /// Create a datasource under an application.
    async fn create_datasource(
        &self,
        application_id: i64,
        request: &DataSource,
    ) -> Result<DataSource, ApiError>;

    /// Fetch a datasource.
    async fn get_datasource(&self, application_id: i64, id: i64) -> Result<DataSource, ApiError>;

    /// Replace a datasource's settings.
    async fn update_datasource(
        &self,
        application_id: i64,
        id: i64,
        request: &DataSource,
    ) -> Result<DataSource, ApiError>;

    /// Delete a datasource.
    async fn delete_datasource(&self, application_id: i64, id: i64) -> Result<(), ApiError>;

    /// Create a check on a datasource.
    async fn create_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        check: &Check,
    ) -> Result<Check, ApiError>;

    /// Fetch a check.
    async fn get_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
    ) -> Result<Check, ApiError>;

    /// Replace a check's settings.
    async fn update_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
        check: &Check,
    ) -> Result<Check, ApiError>;

    /// Delete a check.
    async fn delete_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
    ) -> Result<(), ApiError>;
}
