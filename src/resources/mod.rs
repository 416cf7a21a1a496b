//! The Folge resources the provider manages.
//!
//! Every resource implements [`Resource`]: it declares a schema and maps its
//! state to and from API calls. Planning is shared and driven by the schema
//! alone, see [`plan`].

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::check::{self, CheckConfig};
use crate::client::{Check, FolgeApi};
use crate::error::{ApiError, ProviderError};
use crate::schema::{Attribute, Diagnostic, Schema};
use crate::types::{AttributeChange, PlanResult};
use crate::validation;

pub mod application;
pub mod check_http_status;
pub mod check_json_property;
pub mod datasource;

pub use application::ApplicationResource;
pub use check_http_status::CheckHttpStatusResource;
pub use check_json_property::CheckJsonPropertyResource;
pub use datasource::DatasourceResource;

/// A resource type served by the provider.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, e.g. `folge_application`.
    fn type_name(&self) -> &'static str;

    /// The resource schema.
    fn schema(&self) -> Schema;

    /// Validate a resource configuration.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validation::validate(&self.schema(), config)
    }

    /// Compute the planned state for a proposed configuration.
    fn plan(&self, prior_state: Option<&Value>, proposed_state: &Value) -> PlanResult {
        plan(&self.schema(), prior_state, proposed_state)
    }

    /// Create the remote object and return the new state.
    async fn create(&self, api: &dyn FolgeApi, planned_state: Value) -> Result<Value, ProviderError>;

    /// Refresh the state from the remote object.
    async fn read(&self, api: &dyn FolgeApi, current_state: Value) -> Result<Value, ProviderError>;

    /// Update the remote object in place and return the new state.
    async fn update(
        &self,
        api: &dyn FolgeApi,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, api: &dyn FolgeApi, current_state: Value) -> Result<(), ProviderError>;

    /// Read an existing remote object by its import id.
    async fn import(&self, api: &dyn FolgeApi, id: &str) -> Result<Value, ProviderError>;
}

/// Every resource type the provider serves.
pub fn all() -> Vec<Box<dyn Resource>> {
    vec![
        Box::new(ApplicationResource),
        Box::new(DatasourceResource),
        Box::new(CheckHttpStatusResource),
        Box::new(CheckJsonPropertyResource),
    ]
}

fn is_computed_only(attr: &Attribute) -> bool {
    attr.flags.computed && !attr.flags.optional && !attr.flags.required
}

fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    value.get(name).filter(|v| !v.is_null())
}

/// Plan a resource change from its schema.
///
/// - A null proposal plans a destroy.
/// - Schema defaults fill unset attributes.
/// - Computed-only attributes keep their prior value, unless a force-new
///   attribute changed and the object is replaced.
/// - Each top-level attribute whose value differs becomes one change; null
///   and absent are the same.
pub fn plan(schema: &Schema, prior_state: Option<&Value>, proposed_state: &Value) -> PlanResult {
    let prior = prior_state.filter(|p| !p.is_null());

    if proposed_state.is_null() {
        let changes = prior.map(|p| diff(p, &Value::Null)).unwrap_or_default();
        return PlanResult::with_changes(Value::Null, changes, false);
    }

    let mut planned = validation::apply_defaults(schema, proposed_state);
    if let Value::Object(obj) = &mut planned {
        for (name, attr) in &schema.block.attributes {
            if is_computed_only(attr) {
                obj.remove(name);
            }
        }
    }

    let Some(prior) = prior else {
        let changes = diff(&Value::Null, &planned);
        return PlanResult::with_changes(planned, changes, false);
    };

    let requires_replace = schema
        .block
        .attributes
        .iter()
        .filter(|(_, attr)| attr.force_new)
        .any(|(name, _)| field(prior, name) != field(&planned, name));

    if !requires_replace {
        if let Value::Object(obj) = &mut planned {
            for (name, attr) in &schema.block.attributes {
                if !is_computed_only(attr) {
                    continue;
                }
                if let Some(value) = field(prior, name) {
                    obj.insert(name.clone(), value.clone());
                }
            }
        }
    }

    let changes = diff(prior, &planned);
    PlanResult::with_changes(planned, changes, requires_replace)
}

fn diff(before: &Value, after: &Value) -> Vec<AttributeChange> {
    let mut names = BTreeSet::new();
    for value in [before, after] {
        if let Value::Object(obj) = value {
            names.extend(obj.keys().cloned());
        }
    }

    names
        .into_iter()
        .filter_map(|name| {
            let old = field(before, &name);
            let new = field(after, &name);
            (old != new).then(|| AttributeChange::new(name, old.cloned(), new.cloned()))
        })
        .collect()
}

/// Deserialize resource state or configuration into its model.
pub(crate) fn from_state<T: DeserializeOwned>(
    resource_type: &str,
    state: Value,
) -> Result<T, ProviderError> {
    serde_json::from_value(state)
        .map_err(|e| ProviderError::InvalidRequest(format!("invalid {} state: {}", resource_type, e)))
}

/// Serialize a model into resource state.
pub(crate) fn to_state(model: &impl Serialize) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

/// The id of an object that must already exist.
pub(crate) fn require_id(resource_type: &str, id: Option<i64>) -> Result<i64, ProviderError> {
    id.ok_or_else(|| ProviderError::InvalidRequest(format!("{} state has no id", resource_type)))
}

/// Map an API failure for one object, turning 404 into `NotFound`.
pub(crate) fn api_error(resource_type: &str, id: i64, err: ApiError) -> ProviderError {
    match err {
        ApiError::NotFound(_) => ProviderError::NotFound(format!("{} {}", resource_type, id)),
        other => ProviderError::Api(other),
    }
}

/// Decode a check returned by the API, naming the resource in errors.
pub(crate) fn decode_check(
    resource_type: &str,
    remote: Check,
    application_id: i64,
    datasource_id: i64,
) -> Result<CheckConfig, ProviderError> {
    let id = remote.payload.get("id").and_then(Value::as_i64);
    check::decode(remote, application_id, datasource_id)
        .map_err(|e| ProviderError::from_check(resource_type, id, e))
}

/// Split an import id of the form `a/b/c` into its numeric parts.
pub(crate) fn parse_import_id<const N: usize>(
    resource_type: &str,
    id: &str,
    format: &str,
) -> Result<[i64; N], ProviderError> {
    let invalid = || {
        ProviderError::InvalidRequest(format!(
            "invalid import id {:?} for {}: expected {}",
            id, resource_type, format
        ))
    };

    let parts = id
        .split('/')
        .map(|part| part.trim().parse::<i64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;
    parts.try_into().map_err(|_| invalid())
}
