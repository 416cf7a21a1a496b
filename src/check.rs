//! Typed check codec.
//!
//! The Folge API models checks as a single [`Check`] envelope carrying a
//! `kind` discriminator and a variant-specific payload. JSON property checks
//! nest a second discriminator: `datatype` decides how the embedded `value`
//! string is parsed. That string is itself JSON, so a datetime check travels
//! as `"value": "\"2024-01-01T00:00:00Z\""`.
//!
//! This module converts between that wire shape and the strongly-typed
//! [`CheckConfig`] used by the check resources:
//!
//! - [`encode`] builds the envelope sent on create and update.
//! - [`decode`] validates an envelope returned by the API and fills in the
//!   application and datasource ids, which the payload does not carry.
//!
//! Both functions are pure: no I/O, no logging, no shared state.
//!
//! # Example
//!
//! ```
//! use folge_provider::check::{self, CheckConfig, Datatype, JsonPropertyCheck, Operator};
//!
//! let config = CheckConfig::JsonProperty(JsonPropertyCheck {
//!     value_datetime: Some("2024-01-01T00:00:00Z".to_string()),
//!     ..JsonPropertyCheck::new(7, 3, "fresh", "$.updated_at", Datatype::DateTime, Operator::Gt)
//! });
//!
//! let wire = check::encode(&config).unwrap();
//! assert_eq!(wire.kind, "json_property");
//! assert_eq!(wire.payload["value"], "\"2024-01-01T00:00:00Z\"");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::models::{Check, HttpStatusCheckTyped, JsonDataCheckTyped};

/// Errors raised while encoding or decoding a check envelope.
///
/// Every variant is terminal for the operation that produced it.
#[derive(Debug, Error)]
pub enum CheckCodecError {
    /// The envelope's `kind` is missing or not a known check kind.
    #[error("unknown check kind: {0:?}")]
    UnknownKind(String),

    /// The embedded value could not be parsed as the declared datatype.
    #[error("invalid {datatype} value: {source}")]
    InvalidValue {
        /// The declared datatype the value failed to parse as.
        datatype: Datatype,
        /// The underlying parse error.
        source: serde_json::Error,
    },

    /// The payload declares a datatype this provider does not know.
    #[error("unknown datatype: {0}")]
    UnknownDatatype(String),

    /// The payload declares an operator this provider does not know.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// The payload does not have the shape its kind requires.
    #[error("invalid {kind} check payload: {source}")]
    InvalidPayload {
        /// The kind named by the envelope.
        kind: CheckKind,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },

    /// The API returned a check without its server-assigned id.
    #[error("{0} check payload has no id")]
    MissingId(CheckKind),

    /// The envelope decoded to a different kind than the caller manages.
    #[error("expected a {expected} check, got {actual}")]
    UnexpectedKind {
        /// The kind the caller asked for.
        expected: CheckKind,
        /// The kind the envelope carried.
        actual: CheckKind,
    },

    /// Serializing an outbound value failed. This is an internal defect,
    /// never a problem with user input.
    #[error("failed to marshal check payload: {0}")]
    Marshal(#[source] serde_json::Error),
}

/// The check variant named by the envelope's `kind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Expects a given HTTP response status.
    HttpStatus,
    /// Compares a property of the JSON response body.
    JsonProperty,
}

impl CheckKind {
    /// The wire discriminator for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpStatus => "http_status",
            Self::JsonProperty => "json_property",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = CheckCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http_status" => Ok(Self::HttpStatus),
            "json_property" => Ok(Self::JsonProperty),
            other => Err(CheckCodecError::UnknownKind(other.to_string())),
        }
    }
}

/// Datatype of the JSON property a check compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    /// `true` / `false`.
    Bool,
    /// A 64-bit signed integer.
    Int,
    /// An arbitrary string.
    Str,
    /// A datetime, kept as its string form.
    DateTime,
}

impl Datatype {
    /// Every datatype, in schema order.
    pub const ALL: [Datatype; 4] = [Self::Str, Self::Int, Self::Bool, Self::DateTime];

    /// The wire name of this datatype.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Str => "str",
            Self::DateTime => "datetime",
        }
    }

    /// The configuration attribute holding values of this datatype.
    pub fn value_slot(&self) -> &'static str {
        match self {
            Self::Bool => "value_bool",
            Self::Int => "value_int",
            Self::Str => "value_string",
            Self::DateTime => "value_datetime",
        }
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = CheckCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "datetime" => Ok(Self::DateTime),
            other => Err(CheckCodecError::UnknownDatatype(other.to_string())),
        }
    }
}

/// Comparison applied between the observed property and the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
}

impl Operator {
    /// Every operator, in schema order.
    pub const ALL: [Operator; 4] = [Self::Eq, Self::Neq, Self::Gt, Self::Lt];

    /// The wire name of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Lt => "lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = CheckCodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(Self::Eq),
            "neq" => Ok(Self::Neq),
            "gt" => Ok(Self::Gt),
            "lt" => Ok(Self::Lt),
            other => Err(CheckCodecError::UnknownOperator(other.to_string())),
        }
    }
}

/// A value tagged with its datatype.
///
/// Only converted to the double-encoded wire string at the envelope boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
    /// A string value.
    Str(String),
    /// A datetime in its string form.
    DateTime(String),
}

impl TypedValue {
    /// The datatype this value belongs to.
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Bool(_) => Datatype::Bool,
            Self::Int(_) => Datatype::Int,
            Self::Str(_) => Datatype::Str,
            Self::DateTime(_) => Datatype::DateTime,
        }
    }

    /// Serialize into the JSON literal carried by the payload's `value` field.
    pub fn to_wire(&self) -> Result<String, CheckCodecError> {
        let encoded = match self {
            Self::Bool(v) => serde_json::to_string(v),
            Self::Int(v) => serde_json::to_string(v),
            Self::Str(v) | Self::DateTime(v) => serde_json::to_string(v),
        };
        encoded.map_err(CheckCodecError::Marshal)
    }

    /// Parse a wire `value` as exactly the given datatype.
    ///
    /// No other datatype is attempted when parsing fails.
    pub fn from_wire(datatype: Datatype, raw: &str) -> Result<Self, CheckCodecError> {
        let invalid = |source| CheckCodecError::InvalidValue { datatype, source };
        match datatype {
            Datatype::Bool => serde_json::from_str(raw).map(Self::Bool).map_err(invalid),
            Datatype::Int => serde_json::from_str(raw).map(Self::Int).map_err(invalid),
            Datatype::Str => serde_json::from_str(raw).map(Self::Str).map_err(invalid),
            Datatype::DateTime => serde_json::from_str(raw).map(Self::DateTime).map_err(invalid),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// A check expecting a specific HTTP status from the datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStatusCheck {
    /// Server-assigned id, unknown until created.
    #[serde(default)]
    pub id: Option<i64>,
    /// The owning application.
    pub application_id: i64,
    /// The datasource the check runs against.
    pub datasource_id: i64,
    /// Display name, sent as the payload's `label`.
    pub name: String,
    /// Whether the check is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// The expected HTTP response code.
    pub status_code: i64,
}

/// A check comparing a JSON property of the datasource response.
///
/// Exactly one of the `value_*` slots is meaningful, chosen by `datatype`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPropertyCheck {
    /// Server-assigned id, unknown until created.
    #[serde(default)]
    pub id: Option<i64>,
    /// The owning application.
    pub application_id: i64,
    /// The datasource the check runs against.
    pub datasource_id: i64,
    /// Display name, sent as the payload's `label`.
    pub name: String,
    /// Whether the check is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Location of the property in the response document.
    pub path: String,
    /// Datatype of the property; selects the value slot.
    pub datatype: Datatype,
    /// Comparison operator.
    pub operator: Operator,
    /// Expected value when `datatype` is `bool`.
    #[serde(default)]
    pub value_bool: Option<bool>,
    /// Expected value when `datatype` is `int`.
    #[serde(default)]
    pub value_int: Option<i64>,
    /// Expected value when `datatype` is `str`.
    #[serde(default)]
    pub value_string: Option<String>,
    /// Expected value when `datatype` is `datetime`.
    #[serde(default)]
    pub value_datetime: Option<String>,
}

impl JsonPropertyCheck {
    /// Create an enabled check with every value slot empty.
    pub fn new(
        application_id: i64,
        datasource_id: i64,
        name: impl Into<String>,
        path: impl Into<String>,
        datatype: Datatype,
        operator: Operator,
    ) -> Self {
        Self {
            id: None,
            application_id,
            datasource_id,
            name: name.into(),
            enabled: true,
            path: path.into(),
            datatype,
            operator,
            value_bool: None,
            value_int: None,
            value_string: None,
            value_datetime: None,
        }
    }

    /// The value held by the slot `datatype` selects.
    ///
    /// An empty slot yields the datatype's zero value; the pairing between
    /// `datatype` and the populated slot is not checked here.
    pub fn typed_value(&self) -> TypedValue {
        match self.datatype {
            Datatype::Bool => TypedValue::Bool(self.value_bool.unwrap_or_default()),
            Datatype::Int => TypedValue::Int(self.value_int.unwrap_or_default()),
            Datatype::Str => TypedValue::Str(self.value_string.clone().unwrap_or_default()),
            Datatype::DateTime => {
                TypedValue::DateTime(self.value_datetime.clone().unwrap_or_default())
            }
        }
    }

    /// Store `value` in its slot and clear the other three.
    pub fn set_typed_value(&mut self, value: TypedValue) {
        self.value_bool = None;
        self.value_int = None;
        self.value_string = None;
        self.value_datetime = None;
        match value {
            TypedValue::Bool(v) => self.value_bool = Some(v),
            TypedValue::Int(v) => self.value_int = Some(v),
            TypedValue::Str(v) => self.value_string = Some(v),
            TypedValue::DateTime(v) => self.value_datetime = Some(v),
        }
    }

    /// Name of the slot `datatype` selects when that slot is empty.
    pub fn unpopulated_value_slot(&self) -> Option<&'static str> {
        let populated = match self.datatype {
            Datatype::Bool => self.value_bool.is_some(),
            Datatype::Int => self.value_int.is_some(),
            Datatype::Str => self.value_string.is_some(),
            Datatype::DateTime => self.value_datetime.is_some(),
        };
        (!populated).then(|| self.datatype.value_slot())
    }
}

/// A check configuration of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckConfig {
    /// See [`HttpStatusCheck`].
    HttpStatus(HttpStatusCheck),
    /// See [`JsonPropertyCheck`].
    JsonProperty(JsonPropertyCheck),
}

impl CheckConfig {
    /// The discriminator this configuration encodes to.
    pub fn kind(&self) -> CheckKind {
        match self {
            Self::HttpStatus(_) => CheckKind::HttpStatus,
            Self::JsonProperty(_) => CheckKind::JsonProperty,
        }
    }

    /// Unwrap an HTTP status check.
    pub fn into_http_status(self) -> Result<HttpStatusCheck, CheckCodecError> {
        match self {
            Self::HttpStatus(check) => Ok(check),
            other => Err(CheckCodecError::UnexpectedKind {
                expected: CheckKind::HttpStatus,
                actual: other.kind(),
            }),
        }
    }

    /// Unwrap a JSON property check.
    pub fn into_json_property(self) -> Result<JsonPropertyCheck, CheckCodecError> {
        match self {
            Self::JsonProperty(check) => Ok(check),
            other => Err(CheckCodecError::UnexpectedKind {
                expected: CheckKind::JsonProperty,
                actual: other.kind(),
            }),
        }
    }
}

/// Build the wire envelope for a create or update request.
///
/// The id fields are not part of the payload; the API takes them from the
/// request path.
pub fn encode(config: &CheckConfig) -> Result<Check, CheckCodecError> {
    match config {
        CheckConfig::HttpStatus(check) => {
            let payload = HttpStatusCheckTyped {
                id: None,
                label: check.name.clone(),
                enabled: Some(check.enabled),
                status_code: check.status_code,
            };
            Check::from_payload(CheckKind::HttpStatus.as_str(), &payload)
                .map_err(CheckCodecError::Marshal)
        }
        CheckConfig::JsonProperty(check) => {
            let payload = JsonDataCheckTyped {
                id: None,
                label: check.name.clone(),
                enabled: Some(check.enabled),
                path: check.path.clone(),
                datatype: check.datatype.as_str().to_string(),
                operator: check.operator.as_str().to_string(),
                value: check.typed_value().to_wire()?,
            };
            Check::from_payload(CheckKind::JsonProperty.as_str(), &payload)
                .map_err(CheckCodecError::Marshal)
        }
    }
}

/// Validate an envelope returned by the API and build its configuration.
///
/// `application_id` and `datasource_id` come from the calling context; the
/// payload does not carry them.
pub fn decode(
    check: Check,
    application_id: i64,
    datasource_id: i64,
) -> Result<CheckConfig, CheckCodecError> {
    let kind: CheckKind = check.kind.parse()?;
    match kind {
        CheckKind::HttpStatus => {
            let data: HttpStatusCheckTyped = check
                .payload_as()
                .map_err(|source| CheckCodecError::InvalidPayload { kind, source })?;
            Ok(CheckConfig::HttpStatus(HttpStatusCheck {
                id: Some(data.id.ok_or(CheckCodecError::MissingId(kind))?),
                application_id,
                datasource_id,
                name: data.label,
                enabled: data.enabled.unwrap_or(true),
                status_code: data.status_code,
            }))
        }
        CheckKind::JsonProperty => {
            let data: JsonDataCheckTyped = check
                .payload_as()
                .map_err(|source| CheckCodecError::InvalidPayload { kind, source })?;
            let id = data.id.ok_or(CheckCodecError::MissingId(kind))?;
            let datatype: Datatype = data.datatype.parse()?;
            let operator: Operator = data.operator.parse()?;

            let mut decoded = JsonPropertyCheck {
                id: Some(id),
                enabled: data.enabled.unwrap_or(true),
                ..JsonPropertyCheck::new(
                    application_id,
                    datasource_id,
                    data.label,
                    data.path,
                    datatype,
                    operator,
                )
            };
            decoded.set_typed_value(TypedValue::from_wire(datatype, &data.value)?);
            Ok(CheckConfig::JsonProperty(decoded))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json_check(datatype: Datatype) -> JsonPropertyCheck {
        JsonPropertyCheck::new(7, 3, "status ok", "$.status", datatype, Operator::Eq)
    }

    fn wire(value: serde_json::Value) -> Check {
        serde_json::from_value(value).unwrap()
    }

    /// Stand in for the API: echo the envelope back with an id assigned.
    fn assign_id(mut check: Check, id: i64) -> Check {
        check.payload.insert("id".to_string(), json!(id));
        check
    }

    #[test]
    fn test_round_trip_every_datatype() {
        let samples = [
            TypedValue::Bool(true),
            TypedValue::Int(-42),
            TypedValue::Str("healthy".to_string()),
            TypedValue::DateTime("2024-01-01T00:00:00Z".to_string()),
        ];

        for value in samples {
            let mut check = json_check(value.datatype());
            check.set_typed_value(value.clone());
            let config = CheckConfig::JsonProperty(check.clone());

            let encoded = encode(&config).unwrap();
            let decoded = decode(assign_id(encoded, 11), 7, 3).unwrap();

            check.id = Some(11);
            assert_eq!(decoded, CheckConfig::JsonProperty(check));
        }
    }

    #[test]
    fn test_decode_populates_only_matching_slot() {
        for datatype in Datatype::ALL {
            let value = match datatype {
                Datatype::Bool => "false",
                Datatype::Int => "5",
                Datatype::Str => "\"up\"",
                Datatype::DateTime => "\"2024-06-01T12:00:00Z\"",
            };
            let envelope = wire(json!({
                "kind": "json_property",
                "id": 1,
                "label": "probe",
                "enabled": true,
                "path": "$.a",
                "datatype": datatype.as_str(),
                "operator": "eq",
                "value": value,
            }));

            let decoded = decode(envelope, 1, 2).unwrap().into_json_property().unwrap();
            let populated = [
                decoded.value_bool.is_some(),
                decoded.value_int.is_some(),
                decoded.value_string.is_some(),
                decoded.value_datetime.is_some(),
            ];
            assert_eq!(populated.iter().filter(|p| **p).count(), 1);
            assert_eq!(decoded.unpopulated_value_slot(), None);
        }
    }

    #[test]
    fn test_datetime_scenario() {
        let config = CheckConfig::JsonProperty(JsonPropertyCheck {
            value_datetime: Some("2024-01-01T00:00:00Z".to_string()),
            ..json_check(Datatype::DateTime)
        });

        let encoded = encode(&config).unwrap();
        assert_eq!(encoded.kind, "json_property");
        assert_eq!(encoded.payload["value"], json!("\"2024-01-01T00:00:00Z\""));
        assert_eq!(encoded.payload["datatype"], json!("datetime"));

        let decoded = decode(assign_id(encoded, 99), 7, 3)
            .unwrap()
            .into_json_property()
            .unwrap();
        assert_eq!(decoded.datatype, Datatype::DateTime);
        assert_eq!(
            decoded.value_datetime.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
        assert_eq!(decoded.application_id, 7);
        assert_eq!(decoded.datasource_id, 3);
    }

    #[test]
    fn test_value_is_double_encoded_on_the_wire() {
        let mut check = json_check(Datatype::Int);
        check.value_int = Some(200);
        let encoded = encode(&CheckConfig::JsonProperty(check)).unwrap();

        let body = serde_json::to_value(&encoded).unwrap();
        assert_eq!(body["value"], json!("200"));
        assert!(body.get("id").is_none());
        assert!(body.get("application_id").is_none());
    }

    #[test]
    fn test_encode_http_status() {
        let config = CheckConfig::HttpStatus(HttpStatusCheck {
            id: Some(4),
            application_id: 1,
            datasource_id: 2,
            name: "homepage".to_string(),
            enabled: false,
            status_code: 204,
        });

        let encoded = encode(&config).unwrap();
        assert_eq!(
            serde_json::to_value(&encoded).unwrap(),
            json!({
                "kind": "http_status",
                "label": "homepage",
                "enabled": false,
                "status_code": 204,
            })
        );
    }

    #[test]
    fn test_decode_http_status() {
        let envelope = wire(json!({
            "kind": "http_status",
            "id": 8,
            "label": "homepage",
            "enabled": true,
            "status_code": 200,
        }));

        let decoded = decode(envelope, 5, 6).unwrap().into_http_status().unwrap();
        assert_eq!(decoded.id, Some(8));
        assert_eq!(decoded.application_id, 5);
        assert_eq!(decoded.datasource_id, 6);
        assert_eq!(decoded.status_code, 200);
    }

    #[test]
    fn test_encode_empty_slot_sends_zero_value() {
        let check = json_check(Datatype::Int);
        assert_eq!(check.unpopulated_value_slot(), Some("value_int"));

        let encoded = encode(&CheckConfig::JsonProperty(check)).unwrap();
        assert_eq!(encoded.payload["value"], json!("0"));
    }

    #[test]
    fn test_decode_invalid_int_value() {
        let envelope = wire(json!({
            "kind": "json_property",
            "id": 1,
            "label": "count",
            "path": "$.count",
            "datatype": "int",
            "operator": "gt",
            "value": "\"not-a-number\"",
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            CheckCodecError::InvalidValue {
                datatype: Datatype::Int,
                ..
            }
        ));
        assert!(err.to_string().starts_with("invalid int value"));
    }

    #[test]
    fn test_decode_does_not_fall_back_to_other_types() {
        // Valid as a string, but the declared datatype is bool.
        let envelope = wire(json!({
            "kind": "json_property",
            "id": 1,
            "label": "flag",
            "path": "$.flag",
            "datatype": "bool",
            "operator": "eq",
            "value": "\"true\"",
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(err.to_string().starts_with("invalid bool value"));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let envelope = wire(json!({"kind": "unknown_kind", "id": 1}));
        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(err, CheckCodecError::UnknownKind(ref k) if k == "unknown_kind"));
        assert!(err.to_string().contains("unknown check kind"));
    }

    #[test]
    fn test_decode_missing_kind() {
        let envelope = wire(json!({"id": 1, "label": "x"}));
        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(err, CheckCodecError::UnknownKind(ref k) if k.is_empty()));
    }

    #[test]
    fn test_decode_unknown_datatype() {
        let envelope = wire(json!({
            "kind": "json_property",
            "id": 1,
            "label": "x",
            "path": "$.x",
            "datatype": "bogus",
            "operator": "eq",
            "value": "1",
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(err, CheckCodecError::UnknownDatatype(ref d) if d == "bogus"));
        assert_eq!(err.to_string(), "unknown datatype: bogus");
    }

    #[test]
    fn test_decode_unknown_operator() {
        let envelope = wire(json!({
            "kind": "json_property",
            "id": 1,
            "label": "x",
            "path": "$.x",
            "datatype": "int",
            "operator": "gte",
            "value": "1",
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(err, CheckCodecError::UnknownOperator(_)));
    }

    #[test]
    fn test_decode_missing_id() {
        let envelope = wire(json!({
            "kind": "http_status",
            "label": "homepage",
            "status_code": 200,
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(err, CheckCodecError::MissingId(CheckKind::HttpStatus)));
    }

    #[test]
    fn test_decode_malformed_payload() {
        let envelope = wire(json!({
            "kind": "http_status",
            "id": 1,
            "label": "homepage",
            "status_code": "two hundred",
        }));

        let err = decode(envelope, 1, 1).unwrap_err();
        assert!(matches!(
            err,
            CheckCodecError::InvalidPayload {
                kind: CheckKind::HttpStatus,
                ..
            }
        ));
    }

    #[test]
    fn test_decode_enabled_defaults_to_true() {
        let envelope = wire(json!({
            "kind": "http_status",
            "id": 1,
            "label": "homepage",
            "status_code": 200,
        }));

        let decoded = decode(envelope, 1, 1).unwrap().into_http_status().unwrap();
        assert!(decoded.enabled);
    }

    #[test]
    fn test_unexpected_kind() {
        let envelope = wire(json!({
            "kind": "http_status",
            "id": 1,
            "label": "homepage",
            "status_code": 200,
        }));

        let err = decode(envelope, 1, 1)
            .unwrap()
            .into_json_property()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected a json_property check, got http_status"
        );
    }

    #[test]
    fn test_enum_wire_names() {
        for datatype in Datatype::ALL {
            assert_eq!(datatype.as_str().parse::<Datatype>().unwrap(), datatype);
            assert_eq!(
                serde_json::to_value(datatype).unwrap(),
                json!(datatype.as_str())
            );
        }
        for operator in Operator::ALL {
            assert_eq!(operator.as_str().parse::<Operator>().unwrap(), operator);
        }
        assert_eq!(
            "json_property".parse::<CheckKind>().unwrap(),
            CheckKind::JsonProperty
        );
    }
}
