//! Publishing the merged Swagger document to API Gateway.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{DeployResult, ServiceError};

use super::outcome::PublishOutcome;
use super::service::{DeployedFunction, FunctionService, GatewayService};

/// Statement id used for the gateway invoke grant. Fixed so re-deploys can
/// replace the previous grant instead of accumulating statements.
pub const PERMISSION_STATEMENT_ID: &str = "api-gateway-execute";

/// Source ARN for the invoke grant: scoped to the deployed stage, wildcarded
/// on method and resource path (one function may back several operations).
pub fn execute_api_source_arn(region: &str, account_id: &str, api_id: &str, stage: &str) -> String {
    format!("arn:aws:execute-api:{region}:{account_id}:{api_id}/{stage}/*")
}

/// Imports the merged specification, deploys it to a stage, and grants API
/// Gateway permission to invoke each deployed function.
pub struct GatewayPublisher<'a, G: GatewayService + ?Sized, F: FunctionService + ?Sized> {
    gateway: &'a G,
    functions: &'a F,
    region: String,
    account_id: String,
}

impl<'a, G: GatewayService + ?Sized, F: FunctionService + ?Sized> GatewayPublisher<'a, G, F> {
    pub fn new(gateway: &'a G, functions: &'a F, region: String, account_id: String) -> Self {
        Self {
            gateway,
            functions,
            region,
            account_id,
        }
    }

    /// Import `document` (already merged) and, when a stage is given, deploy
    /// it and wire up invoke permissions.
    ///
    /// Import failure is fatal. Everything after the import is best-effort:
    /// a stage-deployment or permission failure becomes a warning on the
    /// outcome, never an error, and never rolls back the imported API.
    pub async fn publish(
        &self,
        document: &Value,
        deployed: &BTreeMap<String, DeployedFunction>,
        stage: Option<&str>,
    ) -> DeployResult<PublishOutcome> {
        println!("🌐 Importing API specification...");
        let api = self.gateway.import_api(document).await?;

        let mut warnings = Vec::new();

        if let Some(stage) = stage {
            println!("   Deploying stage '{stage}'");
            match self.gateway.create_deployment(&api.id, stage).await {
                Ok(()) => {
                    for name in deployed.keys() {
                        if let Err(err) = self.grant_invoke(&api.id, stage, name).await {
                            warnings.push(format!("invoke permission for '{name}': {err}"));
                        }
                    }
                }
                Err(err) => warnings.push(format!("stage deployment '{stage}': {err}")),
            }
        }

        Ok(PublishOutcome {
            api_id: api.id,
            stage: stage.map(str::to_string),
            warnings,
        })
    }

    async fn grant_invoke(
        &self,
        api_id: &str,
        stage: &str,
        function_name: &str,
    ) -> Result<(), ServiceError> {
        // A stale grant from a previous deploy may or may not exist; removal
        // failure is expected and ignored, the add still proceeds.
        let _ = self
            .functions
            .remove_invoke_permission(function_name, PERMISSION_STATEMENT_ID)
            .await;

        let source_arn = execute_api_source_arn(&self.region, &self.account_id, api_id, stage);
        self.functions
            .add_invoke_permission(function_name, PERMISSION_STATEMENT_ID, &source_arn)
            .await
    }
}
