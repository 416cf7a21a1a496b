//! `folge_check_json_property`: compares a property of a datasource's JSON
//! response against an expected value.
//!
//! The expected value lives in one of four typed slots (`value_bool`,
//! `value_int`, `value_string`, `value_datetime`); `datatype` picks which one
//! is sent. Configuration validation warns when the picked slot is empty.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{api_error, decode_check, from_state, parse_import_id, require_id, to_state, Resource};
use crate::check::{self, CheckConfig, Datatype, JsonPropertyCheck, Operator};
use crate::client::{Check, FolgeApi};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::validation;

const TYPE_NAME: &str = "folge_check_json_property";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JsonPropertyState {
    #[serde(flatten)]
    check: JsonPropertyCheck,
    #[serde(default)]
    crontab: String,
}

impl JsonPropertyState {
    fn request(&self) -> Result<Check, ProviderError> {
        check::encode(&CheckConfig::JsonProperty(self.check.clone()))
            .map_err(|e| ProviderError::from_check(TYPE_NAME, self.check.id, e))
    }
}

fn decode(
    remote: Check,
    application_id: i64,
    datasource_id: i64,
) -> Result<JsonPropertyCheck, ProviderError> {
    let id = remote.payload.get("id").and_then(Value::as_i64);
    decode_check(TYPE_NAME, remote, application_id, datasource_id)?
        .into_json_property()
        .map_err(|e| ProviderError::from_check(TYPE_NAME, id, e))
}

/// The `folge_check_json_property` resource.
pub struct CheckJsonPropertyResource;

#[async_trait]
impl Resource for CheckJsonPropertyResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("The check_json_property")
            .with_attribute(
                "id",
                Attribute::computed_int64().with_description("The ID of the check_json_property"),
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
                "path",
                Attribute::required_string().with_description("The json path to check."),
            )
            .with_attribute(
                "datatype",
                Attribute::required_string()
                    .with_description("The data type of the property.")
                    .with_allowed_values(Datatype::ALL.iter().map(Datatype::as_str)),
            )
            .with_attribute(
                "operator",
                Attribute::required_string()
                    .with_description("The operator to use for the check.")
                    .with_allowed_values(Operator::ALL.iter().map(Operator::as_str)),
            )
            .with_attribute(
                "value_bool",
                Attribute::optional_bool()
                    .with_description("The value to compare against for a boolean property."),
            )
            .with_attribute(
                "value_int",
                Attribute::optional_int64()
                    .with_description("The value to compare against for an integer property."),
            )
            .with_attribute(
                "value_string",
                Attribute::optional_string()
                    .with_description("The value to compare against for a string property."),
            )
            .with_attribute(
                "value_datetime",
                Attribute::optional_string()
                    .with_description("The value to compare against for a datetime property."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = validation::validate(&self.schema(), config);
        if !diagnostics.is_empty() {
            return diagnostics;
        }

        let config = validation::apply_defaults(&self.schema(), config);
        let state = match serde_json::from_value::<JsonPropertyState>(config) {
            Ok(state) => state,
            Err(e) => {
                diagnostics.push(
                    Diagnostic::error("Invalid json property check configuration")
                        .with_detail(e.to_string()),
                );
                return diagnostics;
            }
        };
        if let Some(slot) = state.check.unpopulated_value_slot() {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "No value set for datatype '{}'",
                    state.check.datatype
                ))
                .with_detail(format!(
                    "'{}' is empty, so the check compares against the zero value",
                    slot
                ))
                .with_attribute(slot),
            );
        }
        diagnostics
    }

    async fn create(&self, api: &dyn FolgeApi, planned_state: Value) -> Result<Value, ProviderError> {
        let plan: JsonPropertyState = from_state(TYPE_NAME, planned_state)?;
        let (application_id, datasource_id) = (plan.check.application_id, plan.check.datasource_id);

        let created = api
            .create_check(application_id, datasource_id, &plan.request()?)
            .await?;
        let check = decode(created, application_id, datasource_id)?;
        debug!(id = ?check.id, application_id, datasource_id, "created json property check");

        to_state(&JsonPropertyState {
            check,
            crontab: plan.crontab,
        })
    }

    async fn read(&self, api: &dyn FolgeApi, current_state: Value) -> Result<Value, ProviderError> {
        let current: JsonPropertyState = from_state(TYPE_NAME, current_state)?;
        let id = require_id(TYPE_NAME, current.check.id)?;
        let (application_id, datasource_id) =
            (current.check.application_id, current.check.datasource_id);

        let remote = api
            .get_check(application_id, datasource_id, id)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        to_state(&JsonPropertyState {
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
        let prior: JsonPropertyState = from_state(TYPE_NAME, prior_state)?;
        let mut plan: JsonPropertyState = from_state(TYPE_NAME, planned_state)?;
        let id = require_id(TYPE_NAME, prior.check.id)?;
        plan.check.id = Some(id);
        let (application_id, datasource_id) = (plan.check.application_id, plan.check.datasource_id);

        let updated = api
            .update_check(application_id, datasource_id, id, &plan.request()?)
            .await
            .map_err(|e| api_error(TYPE_NAME, id, e))?;

        to_state(&JsonPropertyState {
            check: decode(updated, application_id, datasource_id)?,
            crontab: plan.crontab,
        })
    }

    async fn delete(&self, api: &dyn FolgeApi, current_state: Value) -> Result<(), ProviderError> {
        let current: JsonPropertyState = from_state(TYPE_NAME, current_state)?;
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

        to_state(&JsonPropertyState {
            check: decode(remote, application_id, datasource_id)?,
            crontab: String::new(),
        })
    }
}
