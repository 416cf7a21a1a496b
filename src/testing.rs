//! Test harness for driving a [`ProviderService`] without a gRPC server.
//!
//! # Example
//!
//! ```no_run
//! use folge_provider::testing::{assert_plan_creates, ProviderTester};
//! use folge_provider::FolgeProvider;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let tester = ProviderTester::new(FolgeProvider::default());
//! tester
//!     .configure(json!({"url": "http://127.0.0.1:8000", "client_id": "id", "client_secret": "s"}))
//!     .await?;
//!
//! let plan = tester.plan_create("folge_application", json!({"name": "shop"})).await?;
//! assert_plan_creates(&plan);
//!
//! let state = tester.lifecycle_create("folge_application", json!({"name": "shop"})).await?;
//! assert_eq!(state["name"], "shop");
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Wraps a provider and calls its operations the way the host would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Create a tester for `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Resource type names, sorted.
    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    /// Validate the provider configuration; error diagnostics fail.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider; error diagnostics fail.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a resource configuration; error diagnostics fail.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan creating a resource from `config`.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan moving `prior_state` to `config`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Plan destroying a resource.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    /// Create a resource from a planned state.
    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    /// Import a resource by id.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Plan, create, then read back. Returns the state after the read.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read(resource_type, created).await
    }

    /// Plan, update, then read back. Returns the state after the read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read(resource_type, updated).await
    }

    /// Plan the destroy, then delete.
    pub async fn lifecycle_delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        self.plan_delete(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state).await
    }

    /// Create, update and delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, ProviderError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// A tester operation failed.
#[derive(Debug)]
pub enum TestError {
    /// The provider answered with error diagnostics.
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    Provider(ProviderError),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Diagnostics(diags) => {
                writeln!(f, "{} error diagnostic(s):", diags.len())?;
                for diag in diags {
                    write!(f, "  {}", diag.summary)?;
                    if let Some(detail) = &diag.detail {
                        write!(f, ": {}", detail)?;
                    }
                    if let Some(attr) = &diag.attribute {
                        write!(f, " (at {})", attr)?;
                    }
                    writeln!(f)?;
                }
                Ok(())
            },
            TestError::Provider(e) => write!(f, "Provider error: {}", e),
        }
    }
}

impl std::error::Error for TestError {}

impl From<ProviderError> for TestError {
    fn from(e: ProviderError) -> Self {
        TestError::Provider(e)
    }
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}

/// Assert the plan creates a new object.
///
/// # Panics
///
/// Panics if the plan has no changes or replaces an object.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// Assert the plan changes nothing.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        changed_paths(plan)
    );
}

/// Assert the plan replaces the object.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert the plan updates the object in place.
///
/// # Panics
///
/// Panics if the plan has no changes or replaces the object.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert the plan changes `path`.
///
/// # Panics
///
/// Panics if `path` is not among the changes.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        changed_paths(plan)
    );
}

/// Assert the plan leaves `path` alone.
///
/// # Panics
///
/// Panics if `path` is among the changes.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !plan.changes.iter().any(|c| c.path == path),
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// Assert none of the diagnostics is an error.
///
/// # Panics
///
/// Panics if any diagnostic is an error.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// Assert at least one diagnostic is an error.
///
/// # Panics
///
/// Panics if no diagnostic is an error.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert an error diagnostic's summary contains `substring`.
///
/// # Panics
///
/// Panics if no error summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}'. Errors: {:?}",
        substring,
        diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| &d.summary)
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockFolgeClient;
    use crate::provider::FolgeProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn tester() -> ProviderTester<FolgeProvider> {
        ProviderTester::new(FolgeProvider::default().with_client(Arc::new(MockFolgeClient::new())))
    }

    fn check_config(status_code: i64) -> Value {
        json!({
            "application_id": 1,
            "datasource_id": 2,
            "name": "homepage up",
            "crontab": "*/5 * * * *",
            "status_code": status_code,
        })
    }

    #[test]
    fn test_resource_types() {
        let types = tester().resource_types();
        assert_eq!(types.len(), 4);
        assert!(types.contains(&"folge_check_http_status".to_string()));
    }

    #[tokio::test]
    async fn test_validate_resource_config() {
        let tester = tester();
        tester
            .validate_resource_config("folge_check_http_status", check_config(200))
            .await
            .unwrap();

        let err = tester
            .validate_resource_config("folge_check_http_status", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Diagnostics(ref d) if d.len() == 4));
    }

    #[tokio::test]
    async fn test_plan_create_and_update() {
        let tester = tester();
        let plan = tester
            .plan_create("folge_check_http_status", check_config(200))
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_eq!(plan.planned_state["enabled"], json!(true));

        let state = tester
            .create("folge_check_http_status", plan.planned_state)
            .await
            .unwrap();

        let plan = tester
            .plan_update("folge_check_http_status", state.clone(), check_config(200))
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let plan = tester
            .plan_update("folge_check_http_status", state.clone(), check_config(204))
            .await
            .unwrap();
        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "status_code");
        assert_plan_does_not_change_attribute(&plan, "id");

        let mut moved = check_config(200);
        moved["datasource_id"] = json!(3);
        let plan = tester
            .plan_update("folge_check_http_status", state, moved)
            .await
            .unwrap();
        assert_plan_replaces(&plan);
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let tester = tester();
        let state = tester
            .lifecycle_crud(
                "folge_check_http_status",
                check_config(200),
                check_config(204),
            )
            .await
            .unwrap();

        assert_eq!(state["status_code"], json!(204));
        assert_eq!(state["crontab"], "*/5 * * * *");
        assert!(tester
            .read("folge_check_http_status", state)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_configure_error_diagnostics() {
        let tester = ProviderTester::new(FolgeProvider::default());
        let err = tester
            .configure(json!({"url": "::not a url"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid Folge API URL"));
    }

    #[test]
    fn test_assert_no_errors() {
        assert_no_errors(&[Diagnostic::warning("No value set for datatype 'int'")]);
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("Missing required attribute 'name'")]);
    }

    #[test]
    fn test_assert_error_contains() {
        let diagnostics = vec![Diagnostic::error("Unsupported attribute 'label'")];
        assert_has_errors(&diagnostics);
        assert_error_contains(&diagnostics, "Unsupported");
    }

    #[test]
    fn test_test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("Missing required attribute 'crontab'").with_attribute("crontab"),
            Diagnostic::error("Invalid value for attribute 'operator'").with_detail("got \"gte\""),
        ]);

        let display = err.to_string();
        assert!(display.contains("2 error diagnostic(s)"));
        assert!(display.contains("(at crontab)"));
        assert!(display.contains("got \"gte\""));
    }
}
