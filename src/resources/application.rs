//! `folge_application`: a named group of datasources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{api_error, from_state, parse_import_id, require_id, to_state, Resource};
use crate::client::{Application, ApplicationRequest, FolgeApi};
use crate::error::{ApiError, ProviderError};
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "folge_application";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ApplicationState {
    #[serde(default)]
    id: Option<i64>,
    name: String,
}

impl ApplicationState {
    fn request(&self) -> ApplicationRequest {
        ApplicationRequest {
            name: self.name.clone(),
        }
    }

    fn from_remote(app: Application) -> Result<Self, ProviderError> {
        let id = app.id.ok_or_else(|| {
            ApiError::InvalidResponse("application response has no id".to_string())
        })?;
        Ok(Self {
            id: Some(id),
            name: app.name,
        })
    }
}

/// The `folge_application` resource.
pub struct ApplicationResource;

#[async_trait]
impl Resource for ApplicationResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("The application")
            .with_attribute(
                "id",
                Attribute::computed_int64().with_description("The ID of the application"),
            )
            .with_attribute(
                "name",
                Attribute::required_string().with_description("The name."),
            )
    }

    async fn create(&self, api: &dyn FolgeApi, planned_state: Value) -> Result<Value, ProviderError> {
        let plan: ApplicationState = from_state(TYPE_NAME, planned_state)?;
        let created = api.create_application(&plan.request()).await?;
        let state = ApplicationState::from_remote(created)?;
        debug!(id = ?state.id, "created application");
        to_state(&state)
    }

    async fn read(&self, api: &dyn FolgeApi, current_state: Value) -> Result<Value, ProviderError> {
        let current: ApplicationState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.id)?;
        let app = api
            .get_application(id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;
        to_state(&ApplicationState::from_remote(app)?)
    }

    async fn update(
        &self,
        api: &dyn FolgeApi,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: ApplicationState = from_state(TYPE_NAME, prior_state)?;
        let plan: ApplicationState = from_state(TYPE_NAME, planned_state)?;
        let id = require_id(TYPE_NAME, prior.id)?;
        let updated = api
            .update_application(id, &plan.request())
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;
        to_state(&ApplicationState::from_remote(updated)?)
    }

    async fn delete(&self, api: &dyn FolgeApi, current_state: Value) -> Result<(), ProviderError> {
        let current: ApplicationState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.id)?;
        api.delete_application(id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))
    }

    async fn import(&self, api: &dyn FolgeApi, id: &str) -> Result<Value, ProviderError> {
        let [id] = parse_import_id(TYPE_NAME, id, "<id>")?;
        let app = api
            .get_application(id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;
        to_state(&ApplicationState::from_remote(app)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockFolgeClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_crud() {
        let api = MockFolgeClient::new();
        let resource = ApplicationResource;

        let state = resource
            .create(&api, json!({"id": null, "name": "shop"}))
            .await
            .unwrap();
        assert_eq!(state, json!({"id": 1, "name": "shop"}));

        let state = resource
            .update(&api, state.clone(), json!({"id": 1, "name": "webshop"}))
            .await
            .unwrap();
        assert_eq!(state["name"], "webshop");

        let read = resource.read(&api, state.clone()).await.unwrap();
        assert_eq!(read, state);

        resource.delete(&api, state.clone()).await.unwrap();
        let err = resource.read(&api, state).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));

        let methods: Vec<_> = api
            .captured_requests()
            .await
            .into_iter()
            .map(|r| r.method)
            .collect();
        assert_eq!(
            methods,
            vec![
                "create_application",
                "update_application",
                "get_application",
                "delete_application",
                "get_application",
            ]
        );
    }

    #[tokio::test]
    async fn test_import() {
        let api = MockFolgeClient::new();
        let resource = ApplicationResource;
        resource.create(&api, json!({"name": "shop"})).await.unwrap();

        let state = resource.import(&api, "1").await.unwrap();
        assert_eq!(state, json!({"id": 1, "name": "shop"}));

        assert!(matches!(
            resource.import(&api, "2").await.unwrap_err(),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            resource.import(&api, "shop").await.unwrap_err(),
            ProviderError::InvalidRequest(_)
        ));
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let api = MockFolgeClient::new()
            .with_error(ApiError::UnexpectedStatus {
                status: 400,
                body: "{\"name\":[\"required\"]}".to_string(),
            })
            .await;

        let err = ApplicationResource
            .create(&api, json!({"name": ""}))
            .await
            .unwrap_err();
        assert!(err.message().contains("unexpected status code 400"));
    }

    #[tokio::test]
    async fn test_state_without_id() {
        let api = MockFolgeClient::new();
        let err = ApplicationResource
            .read(&api, json!({"name": "shop"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }
}
