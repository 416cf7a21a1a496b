//! `folge_datasource`: an HTTP endpoint the checks of an application fetch.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{api_error, from_state, parse_import_id, require_id, to_state, Resource};
use crate::client::models::{HttpDataSourceTyped, HTTP_DATASOURCE_KIND};
use crate::client::{DataSource, FolgeApi};
use crate::error::{ApiError, ProviderError};
use crate::schema::{Attribute, Block, NestedBlock, Schema};

const TYPE_NAME: &str = "folge_datasource";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BasicAuth {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DatasourceState {
    #[serde(default)]
    id: Option<i64>,
    application_id: i64,
    name: String,
    url: String,
    #[serde(default)]
    basic_auth: Option<BasicAuth>,
}

impl DatasourceState {
    fn request(&self) -> Result<DataSource, ProviderError> {
        let auth = self.basic_auth.as_ref();
        let payload = HttpDataSourceTyped {
            id: None,
            label: Some(self.name.clone()),
            url: self.url.clone(),
            basic_auth_username: auth.and_then(|a| a.username.clone()),
            basic_auth_password: auth.and_then(|a| a.password.clone()),
        };
        DataSource::from_payload(HTTP_DATASOURCE_KIND, &payload)
            .map_err(|e| ProviderError::Internal(format!("building {} request: {}", TYPE_NAME, e)))
    }

    /// Overwrite the model with the remote object.
    ///
    /// The API may leave out the credentials; the known ones are kept then.
    fn merge_remote(&mut self, remote: DataSource, application_id: i64) -> Result<(), ProviderError> {
        if remote.kind != HTTP_DATASOURCE_KIND {
            return Err(ProviderError::Validation(format!(
                "unknown data source type: {:?}",
                remote.kind
            )));
        }
        let data: HttpDataSourceTyped = remote.payload_as().map_err(|e| {
            ApiError::InvalidResponse(format!("invalid {} payload: {}", HTTP_DATASOURCE_KIND, e))
        })?;
        let id = data
            .id
            .ok_or_else(|| ApiError::InvalidResponse("datasource response has no id".to_string()))?;

        self.id = Some(id);
        self.application_id = application_id;
        self.name = data.label.unwrap_or_default();
        self.url = data.url;

        if data.basic_auth_username.is_some() || data.basic_auth_password.is_some() {
            let known_password = self.basic_auth.take().and_then(|a| a.password);
            self.basic_auth = Some(BasicAuth {
                username: data.basic_auth_username,
                password: data.basic_auth_password.or(known_password),
            });
        }
        Ok(())
    }
}

/// The `folge_datasource` resource.
pub struct DatasourceResource;

#[async_trait]
impl Resource for DatasourceResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("The datasource")
            .with_attribute(
                "id",
                Attribute::computed_int64().with_description("The ID of the datasource"),
            )
            .with_attribute(
                "application_id",
                Attribute::required_int64()
                    .with_description("The ID of the application")
                    .with_force_new(),
            )
            .with_attribute("name", Attribute::required_string().with_description("The name."))
            .with_attribute("url", Attribute::required_string().with_description("The URL."))
            .with_block(
                "basic_auth",
                NestedBlock::single(
                    Block::new()
                        .with_description("Basic auth credentials")
                        .with_attribute(
                            "username",
                            Attribute::required_string().with_description("The username."),
                        )
                        .with_attribute(
                            "password",
                            Attribute::required_string()
                                .with_description("The password.")
                                .sensitive(),
                        ),
                ),
            )
    }

    async fn create(&self, api: &dyn FolgeApi, planned_state: Value) -> Result<Value, ProviderError> {
        let mut plan: DatasourceState = from_state(TYPE_NAME, planned_state)?;
        let created = api
            .create_datasource(plan.application_id, &plan.request()?)
            .await?;
        let application_id = plan.application_id;
        plan.merge_remote(created, application_id)?;
        debug!(id = ?plan.id, application_id, "created datasource");
        to_state(&plan)
    }

    async fn read(&self, api: &dyn FolgeApi, current_state: Value) -> Result<Value, ProviderError> {
        let mut current: DatasourceState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.id)?;
        let application_id = current.application_id;
        let remote = api
            .get_datasource(application_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;
        current.merge_remote(remote, application_id)?;
        to_state(&current)
    }

    async fn update(
        &self,
        api: &dyn FolgeApi,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: DatasourceState = from_state(TYPE_NAME, prior_state)?;
        let mut plan: DatasourceState = from_state(TYPE_NAME, planned_state)?;
        let id = require_id(TYPE_NAME, prior.id)?;
        let application_id = plan.application_id;
        let updated = api
            .update_datasource(application_id, id, &plan.request()?)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;
        plan.merge_remote(updated, application_id)?;
        to_state(&plan)
    }

    async fn delete(&self, api: &dyn FolgeApi, current_state: Value) -> Result<(), ProviderError> {
        let current: DatasourceState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.id)?;
        api.delete_datasource(current.application_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))
    }

    async fn import(&self, api: &dyn FolgeApi, id: &str) -> Result<Value, ProviderError> {
        let [application_id, id] = parse_import_id(TYPE_NAME, id, "<application_id>/<id>")?;
        let remote = api
            .get_datasource(application_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        let mut state = DatasourceState {
            id: None,
            application_id,
            name: String::new(),
            url: String::new(),
            basic_auth: None,
        };
        state.merge_remote(remote, application_id)?;
        to_state(&state)
    }
}
