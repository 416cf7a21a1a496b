//! In-memory Folge API for unit tests.
//!
//! Behaves like the management API for the objects the provider manages:
//! ids are assigned on create, unknown ids answer `NotFound`, and bodies are
//! echoed back the way the server stores them.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use super::models::{Application, ApplicationRequest, Check, DataSource};
use super::FolgeApi;
use crate::error::ApiError;

/// A captured API call for test assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// The API method called (e.g. "create_check").
    pub method: String,
    /// Request body, when the call had one.
    pub body: Option<Value>,
}

#[derive(Default)]
struct Store {
    next_id: i64,
    applications: BTreeMap<i64, Application>,
    datasources: BTreeMap<(i64, i64), DataSource>,
    checks: BTreeMap<(i64, i64, i64), Check>,
}

impl Store {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Mock API client for testing.
#[derive(Default)]
pub struct MockFolgeClient {
    store: Arc<Mutex<Store>>,
    /// Error to return (if any) - consumed on first use
    error: Arc<Mutex<Option<ApiError>>>,
    /// Replaces every check the API returns
    check_response: Arc<Mutex<Option<Check>>>,
    captured_requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockFolgeClient {
    /// Create an empty mock API.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure an error to return on the next API call.
    pub async fn with_error(self, error: ApiError) -> Self {
        *self.error.lock().await = Some(error);
        self
    }

    /// Answer every check call with `check` instead of the stored object.
    pub async fn with_check_response(self, check: Check) -> Self {
        *self.check_response.lock().await = Some(check);
        self
    }

    /// Seed a check as if it had been created out of band.
    pub async fn with_check(
        self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
        check: Check,
    ) -> Self {
        {
            let mut store = self.store.lock().await;
            store.next_id = store.next_id.max(id);
            store.checks.insert((application_id, datasource_id, id), check);
        }
        self
    }

    /// Get all captured requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.captured_requests.lock().await.clone()
    }

    /// Number of checks currently stored.
    pub async fn check_count(&self) -> usize {
        self.store.lock().await.checks.len()
    }

    async fn begin(&self, method: &str, body: Option<Value>) -> Result<(), ApiError> {
        self.captured_requests.lock().await.push(CapturedRequest {
            method: method.to_string(),
            body,
        });
        match self.error.lock().await.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn respond_check(&self, stored: Check) -> Check {
        match &*self.check_response.lock().await {
            Some(check) => check.clone(),
            None => stored,
        }
    }
}

fn body_of(value: &impl serde::Serialize) -> Option<Value> {
    serde_json::to_value(value).ok()
}

fn not_found(path: String) -> ApiError {
    ApiError::NotFound(path)
}

fn with_id<T>(mut envelope: T, id: i64, payload: impl FnOnce(&mut T) -> &mut serde_json::Map<String, Value>) -> T {
    payload(&mut envelope).insert("id".to_string(), json!(id));
    envelope
}

#[async_trait]
impl FolgeApi for MockFolgeClient {
    async fn create_application(
        &self,
        request: &ApplicationRequest,
    ) -> Result<Application, ApiError> {
        self.begin("create_application", body_of(request)).await?;
        let mut store = self.store.lock().await;
        let id = store.assign_id();
        let app = Application {
            id: Some(id),
            name: request.name.clone(),
        };
        store.applications.insert(id, app.clone());
        Ok(app)
    }

    async fn get_application(&self, id: i64) -> Result<Application, ApiError> {
        self.begin("get_application", None).await?;
        let store = self.store.lock().await;
        store
            .applications
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("/api/applications/{}/", id)))
    }

    async fn update_application(
        &self,
        id: i64,
        request: &ApplicationRequest,
    ) -> Result<Application, ApiError> {
        self.begin("update_application", body_of(request)).await?;
        let mut store = self.store.lock().await;
        let app = store
            .applications
            .get_mut(&id)
            .ok_or_else(|| not_found(format!("/api/applications/{}/", id)))?;
        app.name = request.name.clone();
        Ok(app.clone())
    }

    async fn delete_application(&self, id: i64) -> Result<(), ApiError> {
        self.begin("delete_application", None).await?;
        let mut store = self.store.lock().await;
        store
            .applications
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(format!("/api/applications/{}/", id)))
    }

    async fn create_datasource(
        &self,
        application_id: i64,
        request: &DataSource,
    ) -> Result<DataSource, ApiError> {
        self.begin("create_datasource", body_of(request)).await?;
        let mut store = self.store.lock().await;
        let id = store.assign_id();
        let created = with_id(request.clone(), id, |d| &mut d.payload);
        store
            .datasources
            .insert((application_id, id), created.clone());
        Ok(created)
    }

    async fn get_datasource(&self, application_id: i64, id: i64) -> Result<DataSource, ApiError> {
        self.begin("get_datasource", None).await?;
        let store = self.store.lock().await;
        store
            .datasources
            .get(&(application_id, id))
            .cloned()
            .ok_or_else(|| not_found(format!("datasource {}", id)))
    }

    async fn update_datasource(
        &self,
        application_id: i64,
        id: i64,
        request: &DataSource,
    ) -> Result<DataSource, ApiError> {
        self.begin("update_datasource", body_of(request)).await?;
        let mut store = self.store.lock().await;
        let stored = store
            .datasources
            .get_mut(&(application_id, id))
            .ok_or_else(|| not_found(format!("datasource {}", id)))?;
        *stored = with_id(request.clone(), id, |d| &mut d.payload);
        Ok(stored.clone())
    }

    async fn delete_datasource(&self, application_id: i64, id: i64) -> Result<(), ApiError> {
        self.begin("delete_datasource", None).await?;
        let mut store = self.store.lock().await;
        store
            .datasources
            .remove(&(application_id, id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("datasource {}", id)))
    }

    async fn create_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        check: &Check,
    ) -> Result<Check, ApiError> {
        self.begin("create_check", body_of(check)).await?;
        let created = {
            let mut store = self.store.lock().await;
            let id = store.assign_id();
            let created = with_id(check.clone(), id, |c| &mut c.payload);
            store
                .checks
                .insert((application_id, datasource_id, id), created.clone());
            created
        };
        Ok(self.respond_check(created).await)
    }

    async fn get_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
    ) -> Result<Check, ApiError> {
        self.begin("get_check", None).await?;
        let stored = {
            let store = self.store.lock().await;
            store
                .checks
                .get(&(application_id, datasource_id, id))
                .cloned()
                .ok_or_else(|| not_found(format!("check {}", id)))?
        };
        Ok(self.respond_check(stored).await)
    }

    async fn update_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
        check: &Check,
    ) -> Result<Check, ApiError> {
        self.begin("update_check", body_of(check)).await?;
        let updated = {
            let mut store = self.store.lock().await;
            let stored = store
                .checks
                .get_mut(&(application_id, datasource_id, id))
                .ok_or_else(|| not_found(format!("check {}", id)))?;
            *stored = with_id(check.clone(), id, |c| &mut c.payload);
            stored.clone()
        };
        Ok(self.respond_check(updated).await)
    }

    async fn delete_check(
        &self,
        application_id: i64,
        datasource_id: i64,
        id: i64,
    ) -> Result<(), ApiError> {
        self.begin("delete_check", None).await?;
        let mut store = self.store.lock().await;
        store
            .checks
            .remove(&(application_id, datasource_id, id))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("check {}", id)))
    }
}
