//! Trait seams over the remote control planes.
//!
//! The orchestration logic ([`FunctionDeployer`](super::FunctionDeployer),
//! [`GatewayPublisher`](super::GatewayPublisher)) talks to these traits, not
//! to the AWS SDK directly, so create-vs-update reconciliation and the
//! permission-grant flow are testable against in-memory mocks. Production
//! implementations live in [`super::aws`].

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ServiceError;

/// Per-function deployment settings, merged from configuration for one run.
///
/// Ephemeral: constructed from `[lambda]` + `[functions]` config at deploy
/// time, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub handler: String,
    pub runtime: String,
    pub role_arn: String,
    pub memory_mb: u32,
    pub timeout_seconds: u32,
    pub publish: bool,
    pub vpc: Option<VpcPlacement>,
}

/// Network placement for functions that must run inside a VPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcPlacement {
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
}

/// Provider-returned metadata for one deployed function.
///
/// The ARN is what the Swagger merge and the permission grants are built
/// from. Held only for the duration of one deploy run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedFunction {
    pub name: String,
    pub arn: String,
    pub version: Option<String>,
}

/// A REST API created by importing a specification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestApi {
    pub id: String,
    pub name: Option<String>,
}

/// Function-compute management operations.
#[async_trait]
pub trait FunctionService: Send + Sync {
    /// Look up an existing function. Returns [`ServiceError::NotFound`] when
    /// no function with that name exists; that is a normal branch for the
    /// caller, not a failure.
    async fn get_function(&self, name: &str) -> Result<DeployedFunction, ServiceError>;

    /// Create a function with the given settings and zip payload.
    async fn create_function(
        &self,
        spec: &FunctionSpec,
        code: &[u8],
    ) -> Result<DeployedFunction, ServiceError>;

    /// Replace the code of an existing function.
    async fn update_function_code(
        &self,
        name: &str,
        code: &[u8],
        publish: bool,
    ) -> Result<DeployedFunction, ServiceError>;

    /// Apply the configuration fields of `spec` to an existing function.
    async fn update_function_configuration(
        &self,
        spec: &FunctionSpec,
    ) -> Result<DeployedFunction, ServiceError>;

    /// Grant the API gateway principal permission to invoke a function.
    async fn add_invoke_permission(
        &self,
        function_name: &str,
        statement_id: &str,
        source_arn: &str,
    ) -> Result<(), ServiceError>;

    /// Revoke a previously granted invoke permission.
    async fn remove_invoke_permission(
        &self,
        function_name: &str,
        statement_id: &str,
    ) -> Result<(), ServiceError>;
}

/// API gateway provisioning operations.
#[async_trait]
pub trait GatewayService: Send + Sync {
    /// Import a specification document as a new REST API.
    async fn import_api(&self, body: &serde_json::Value) -> Result<RestApi, ServiceError>;

    /// Create a deployment of the API under the named stage.
    async fn create_deployment(&self, api_id: &str, stage: &str) -> Result<(), ServiceError>;
}
