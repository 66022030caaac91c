//! Create-or-update reconciliation for Lambda functions.

use std::collections::BTreeMap;

use crate::error::{DeployResult, ServiceError};

use super::service::{DeployedFunction, FunctionService, FunctionSpec};

/// Drives one deploy run's function creates and updates through a
/// [`FunctionService`].
pub struct FunctionDeployer<'a, S: FunctionService + ?Sized> {
    service: &'a S,
}

impl<'a, S: FunctionService + ?Sized> FunctionDeployer<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Ensure every descriptor exists remotely with the given code.
    ///
    /// Calls are independent: a failure aborts the run but already-completed
    /// functions are not rolled back.
    pub async fn deploy_all(
        &self,
        specs: &[FunctionSpec],
        code: &[u8],
    ) -> DeployResult<BTreeMap<String, DeployedFunction>> {
        let mut deployed = BTreeMap::new();
        for spec in specs {
            let function = self.ensure_function(spec, code).await?;
            println!("   ✅ {} -> {}", function.name, function.arn);
            deployed.insert(function.name.clone(), function);
        }
        Ok(deployed)
    }

    /// Idempotent create-or-update of a single function.
    ///
    /// The existence probe is best-effort: a create that reports "already
    /// exists" falls through to the update path, and an update that reports
    /// "not found" falls back to create, so a resource changing between probe
    /// and act does not fail the run. Both paths surface the same
    /// [`DeployedFunction`] shape.
    pub async fn ensure_function(
        &self,
        spec: &FunctionSpec,
        code: &[u8],
    ) -> DeployResult<DeployedFunction> {
        let exists = match self.service.get_function(&spec.name).await {
            Ok(_) => true,
            Err(err) if err.is_not_found() => false,
            Err(err) => return Err(err.into()),
        };

        if exists {
            return Ok(self.update(spec, code).await?);
        }

        println!("   Creating function '{}'", spec.name);
        match self.service.create_function(spec, code).await {
            Ok(function) => Ok(function),
            Err(err) if err.is_conflict() => {
                // Lost a race against a concurrent creator.
                Ok(self.update(spec, code).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Code first, then configuration. Falls back to create exactly once if
    /// the function vanished since the probe.
    async fn update(
        &self,
        spec: &FunctionSpec,
        code: &[u8],
    ) -> Result<DeployedFunction, ServiceError> {
        println!("   Updating function '{}'", spec.name);
        match self
            .service
            .update_function_code(&spec.name, code, spec.publish)
            .await
        {
            Ok(_) => self.service.update_function_configuration(spec).await,
            Err(err) if err.is_not_found() => self.service.create_function(spec, code).await,
            Err(err) => Err(err),
        }
    }
}
