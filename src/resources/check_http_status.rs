//! `folge_check_http_status`: expects a given HTTP status from a datasource.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{api_error, decode_check, from_state, parse_import_id, require_id, to_state, Resource};
use crate::check::{self, CheckConfig, HttpStatusCheck};
use crate::client::{Check, FolgeApi};
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

const TYPE_NAME: &str = "folge_check_http_status";

/// Resource state: the check plus the schedule, which only lives in state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HttpStatusState {
    #[serde(flatten)]
    check: HttpStatusCheck,
    #[serde(default)]
    crontab: String,
}

impl HttpStatusState {
    fn request(&self) -> Result<Check, ProviderError> {
        check::encode(&CheckConfig::HttpStatus(self.check.clone()))
            .map_err(|e| ProviderError::from_check(TYPE_NAME, self.check.id, e))
    }
}

fn decode(remote: Check, application_id: i64, datasource_id: i64) -> Result<HttpStatusCheck, ProviderError> {
    let id = remote.payload.get("id").and_then(Value::as_i64);
    decode_check(TYPE_NAME, remote, application_id, datasource_id)?
        .into_http_status()
        .map_err(|e| ProviderError::from_check(TYPE_NAME, id, e))
}

/// The `folge_check_http_status` resource.
pub struct CheckHttpStatusResource;

#[async_trait]
impl Resource for CheckHttpStatusResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("The check_http_status")
            .with_attribute(
                "id",
                Attribute::computed_int64().with_description("The ID of the check_http_status"),
            )
            .with_attribute(
                "application_id",
                Attribute::required_int64()
                    .with_description("The ID of the application")
                    .with_force_new(),
            )
            .with_attribute(
                "datasource_id",
                Attribute::required_int64()
                    .with_description("The ID of the datasource")
                    .with_force_new(),
            )
            .with_attribute("name", Attribute::required_string().with_description("The name."))
            .with_attribute(
                "enabled",
                Attribute::optional_bool()
                    .with_description("Whether the check is enabled.")
                    .with_default(Value::Bool(true)),
            )
            .with_attribute(
                "crontab",
                Attribute::required_string().with_description("The crontab."),
            )
            .with_attribute(
                "status_code",
                Attribute::required_int64().with_description("The expected status code."),
            )
    }

    async fn create(&self, api: &dyn FolgeApi, planned_state: Value) -> Result<Value, ProviderError> {
        let plan: HttpStatusState = from_state(TYPE_NAME, planned_state)?;
        let (application_id, datasource_id) = (plan.check.application_id, plan.check.datasource_id);

        let created = api
            .create_check(application_id, datasource_id, &plan.request()?)
            .await?;
        let check = decode(created, application_id, datasource_id)?;
        debug!(id = ?check.id, application_id, datasource_id, "created http status check");

        to_state(&HttpStatusState {
            check,
            crontab: plan.crontab,
        })
    }

    async fn read(&self, api: &dyn FolgeApi, current_state: Value) -> Result<Value, ProviderError> {
        let current: HttpStatusState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.check.id)?;
        let (application_id, datasource_id) =
            (current.check.application_id, current.check.datasource_id);

        let remote = api
            .get_check(application_id, datasource_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        to_state(&HttpStatusState {
            check: decode(remote, application_id, datasource_id)?,
            crontab: current.crontab,
        })
    }

    async fn update(
        &self,
        api: &dyn FolgeApi,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: HttpStatusState = from_state(TYPE_NAME, prior_state)?;
        let mut plan: HttpStatusState = from_state(TYPE_NAME, planned_state)?;
        let id = require_id(TYPE_NAME, prior.check.id)?;
        plan.check.id = Some(id);
        let (application_id, datasource_id) = (plan.check.application_id, plan.check.datasource_id);

        let updated = api
            .update_check(application_id, datasource_id, id, &plan.request()?)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        to_state(&HttpStatusState {
            check: decode(updated, application_id, datasource_id)?,
            crontab: plan.crontab,
        })
    }

    async fn delete(&self, api: &dyn FolgeApi, current_state: Value) -> Result<(), ProviderError> {
        let current: HttpStatusState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.check.id)?;
        api.delete_check(current.check.application_id, current.check.datasource_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))
    }

    async fn import(&self, api: &dyn FolgeApi, id: &str) -> Result<Value, ProviderError> {
        let [application_id, datasource_id, id] =
            parse_import_id(TYPE_NAME, id, "<application_id>/<datasource_id>/<id>")?;
        let remote = api
            .get_check(application_id, datasource_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        to_state(&HttpStatusState {
            check: decode(remote, application_id, datasource_id)?,
            crontab: String::new(),
        })
    }
}
