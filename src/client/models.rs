//! Wire models for the Folge management API.
//!
//! Polymorphic objects (checks and datasources) travel as an envelope with a
//! `kind` discriminator next to the variant's own fields. The envelope keeps
//! the variant fields as a raw JSON map; callers pick the typed payload once
//! they have looked at `kind`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An application groups datasources and their checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Application name.
    pub name: String,
}

/// Request body for creating or updating an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRequest {
    /// Application name.
    pub name: String,
}

fn into_envelope(kind: &str, payload: &impl Serialize) -> Result<Map<String, Value>, serde_json::Error> {
    let mut fields = match serde_json::to_value(payload)? {
        Value::Object(fields) => fields,
        other => {
            return Err(serde::ser::Error::custom(format!(
                "{} payload must serialize to an object, got {}",
                kind, other
            )))
        }
    };
    fields.remove("kind");
    Ok(fields)
}

/// Discriminated check envelope, as sent to and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// The check variant; empty when the API omitted it.
    #[serde(default)]
    pub kind: String,
    /// The variant's own fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Check {
    /// Wrap a typed payload under the given discriminator.
    pub fn from_payload(kind: &str, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: kind.to_string(),
            payload: into_envelope(kind, payload)?,
        })
    }

    /// Interpret the payload as a typed variant.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }
}

/// Payload of an `http_status` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpStatusCheckTyped {
    /// Server-assigned id; absent on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub label: String,
    /// Whether the check is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Expected HTTP status code.
    pub status_code: i64,
}

/// Payload of a `json_property` check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDataCheckTyped {
    /// Server-assigned id; absent on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    pub label: String,
    /// Whether the check is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Location of the property in the response document.
    pub path: String,
    /// Datatype name, see [`crate::check::Datatype`].
    pub datatype: String,
    /// Operator name, see [`crate::check::Operator`].
    pub operator: String,
    /// JSON-encoded expected value.
    pub value: String,
}

/// Discriminator of the only datasource kind the API offers.
pub const HTTP_DATASOURCE_KIND: &str = "http";

/// Discriminated datasource envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// The datasource variant.
    #[serde(default)]
    pub kind: String,
    /// The variant's own fields.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl DataSource {
    /// Wrap a typed payload under the given discriminator.
    pub fn from_payload(kind: &str, payload: &impl Serialize) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: kind.to_string(),
            payload: into_envelope(kind, payload)?,
        })
    }

    /// Interpret the payload as a typed variant.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }
}

/// Payload of an `http` datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDataSourceTyped {
    /// Server-assigned id; absent on requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// URL the checks fetch.
    pub url: String,
    /// Basic auth user sent to the datasource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_username: Option<String>,
    /// Basic auth password sent to the datasource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_envelope_flattens_payload() {
        let check = Check::from_payload(
            "http_status",
            &HttpStatusCheckTyped {
                id: None,
                label: "homepage".to_string(),
                enabled: None,
                status_code: 200,
            },
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&check).unwrap(),
            json!({"kind": "http_status", "label": "homepage", "status_code": 200})
        );
    }

    #[test]
    fn test_check_envelope_keeps_unknown_fields() {
        let check: Check = serde_json::from_value(json!({
            "kind": "http_status",
            "id": 3,
            "label": "homepage",
            "status_code": 200,
            "last_run": "2024-01-01T00:00:00Z",
        }))
        .unwrap();

        assert_eq!(check.kind, "http_status");
        assert!(check.payload.contains_key("last_run"));

        let typed: HttpStatusCheckTyped = check.payload_as().unwrap();
        assert_eq!(typed.id, Some(3));
    }

    #[test]
    fn test_datasource_envelope() {
        let ds = DataSource::from_payload(
            HTTP_DATASOURCE_KIND,
            &HttpDataSourceTyped {
                id: None,
                label: Some("api".to_string()),
                url: "https://example.com/health".to_string(),
                basic_auth_username: Some("user".to_string()),
                basic_auth_password: None,
            },
        )
        .unwrap();

        let body = serde_json::to_value(&ds).unwrap();
        assert_eq!(body["kind"], "http");
        assert_eq!(body["basic_auth_username"], "user");
        assert!(body.get("basic_auth_password").is_none());
    }
}
