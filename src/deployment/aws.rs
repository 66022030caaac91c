//! AWS SDK implementations of the service traits.
//!
//! Clients are built once from the standard SDK config chain with the
//! resolved region; no ambient credential state is consulted after that.

use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{FunctionCode, Runtime, VpcConfig as LambdaVpcConfig};

use crate::error::ServiceError;

use super::service::{DeployedFunction, FunctionService, FunctionSpec, GatewayService, RestApi};

/// The four control-plane clients one deploy run needs.
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub lambda: aws_sdk_lambda::Client,
    pub gateway: aws_sdk_apigateway::Client,
    pub iam: aws_sdk_iam::Client,
    pub sts: aws_sdk_sts::Client,
}

impl AwsClients {
    /// Build all clients from the standard config chain, pinned to `region`.
    pub async fn connect(region: String) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;

        Self {
            lambda: aws_sdk_lambda::Client::new(&config),
            gateway: aws_sdk_apigateway::Client::new(&config),
            iam: aws_sdk_iam::Client::new(&config),
            sts: aws_sdk_sts::Client::new(&config),
        }
    }

    /// Resolve an IAM role name to its ARN.
    pub async fn resolve_role_arn(&self, role_name: &str) -> Result<String, ServiceError> {
        match self.iam.get_role().role_name(role_name).send().await {
            Ok(output) => output
                .role()
                .map(|role| role.arn().to_string())
                .ok_or_else(|| ServiceError::Api {
                    operation: "GetRole",
                    message: format!("no role data returned for '{role_name}'"),
                    source: None,
                }),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_entity_exception())
                {
                    Err(ServiceError::NotFound {
                        resource: format!("IAM role '{role_name}'"),
                    })
                } else {
                    Err(map_sdk_error("GetRole", err))
                }
            }
        }
    }

    /// The account id of the caller, used to scope permission grants.
    pub async fn caller_account_id(&self) -> Result<String, ServiceError> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|err| map_sdk_error("GetCallerIdentity", err))?;

        identity
            .account()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Api {
                operation: "GetCallerIdentity",
                message: "response carried no account id".to_string(),
                source: None,
            })
    }
}

/// Maps an AWS SDK error to a [`ServiceError::Api`].
fn map_sdk_error(
    operation: &'static str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> ServiceError {
    ServiceError::Api {
        operation,
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

/// [`FunctionService`] over the Lambda control plane.
#[derive(Debug, Clone)]
pub struct AwsFunctionService {
    client: aws_sdk_lambda::Client,
}

impl AwsFunctionService {
    pub fn new(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

fn vpc_config(spec: &FunctionSpec) -> Option<LambdaVpcConfig> {
    spec.vpc.as_ref().map(|vpc| {
        LambdaVpcConfig::builder()
            .set_subnet_ids(Some(vpc.subnet_ids.clone()))
            .set_security_group_ids(Some(vpc.security_group_ids.clone()))
            .build()
    })
}

#[async_trait]
impl FunctionService for AwsFunctionService {
    async fn get_function(&self, name: &str) -> Result<DeployedFunction, ServiceError> {
        match self.client.get_function().function_name(name).send().await {
            Ok(output) => {
                let config = output.configuration().ok_or_else(|| ServiceError::Api {
                    operation: "GetFunction",
                    message: format!("no configuration returned for '{name}'"),
                    source: None,
                })?;
                Ok(DeployedFunction {
                    name: name.to_string(),
                    arn: config.function_arn().unwrap_or_default().to_string(),
                    version: config.version().map(str::to_string),
                })
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    Err(ServiceError::NotFound {
                        resource: format!("function '{name}'"),
                    })
                } else {
                    Err(map_sdk_error("GetFunction", err))
                }
            }
        }
    }

    async fn create_function(
        &self,
        spec: &FunctionSpec,
        code: &[u8],
    ) -> Result<DeployedFunction, ServiceError> {
        let mut request = self
            .client
            .create_function()
            .function_name(&spec.name)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .role(&spec.role_arn)
            .handler(&spec.handler)
            .memory_size(spec.memory_mb as i32)
            .timeout(spec.timeout_seconds as i32)
            .publish(spec.publish)
            .code(FunctionCode::builder().zip_file(Blob::new(code)).build());

        if let Some(vpc) = vpc_config(spec) {
            request = request.vpc_config(vpc);
        }

        match request.send().await {
            Ok(output) => Ok(DeployedFunction {
                name: spec.name.clone(),
                arn: output.function_arn().unwrap_or_default().to_string(),
                version: output.version().map(str::to_string),
            }),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_conflict_exception())
                {
                    Err(ServiceError::Conflict {
                        resource: format!("function '{}'", spec.name),
                    })
                } else {
                    Err(map_sdk_error("CreateFunction", err))
                }
            }
        }
    }

    async fn update_function_code(
        &self,
        name: &str,
        code: &[u8],
        publish: bool,
    ) -> Result<DeployedFunction, ServiceError> {
        match self
            .client
            .update_function_code()
            .function_name(name)
            .zip_file(Blob::new(code))
            .publish(publish)
            .send()
            .await
        {
            Ok(output) => Ok(DeployedFunction {
                name: name.to_string(),
                arn: output.function_arn().unwrap_or_default().to_string(),
                version: output.version().map(str::to_string),
            }),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    Err(ServiceError::NotFound {
                        resource: format!("function '{name}'"),
                    })
                } else {
                    Err(map_sdk_error("UpdateFunctionCode", err))
                }
            }
        }
    }

    async fn update_function_configuration(
        &self,
        spec: &FunctionSpec,
    ) -> Result<DeployedFunction, ServiceError> {
        let mut request = self
            .client
            .update_function_configuration()
            .function_name(&spec.name)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .role(&spec.role_arn)
            .handler(&spec.handler)
            .memory_size(spec.memory_mb as i32)
            .timeout(spec.timeout_seconds as i32);

        if let Some(vpc) = vpc_config(spec) {
            request = request.vpc_config(vpc);
        }

        let output = request
            .send()
            .await
            .map_err(|err| map_sdk_error("UpdateFunctionConfiguration", err))?;

        Ok(DeployedFunction {
            name: spec.name.clone(),
            arn: output.function_arn().unwrap_or_default().to_string(),
            version: output.version().map(str::to_string),
        })
    }

    async fn add_invoke_permission(
        &self,
        function_name: &str,
        statement_id: &str,
        source_arn: &str,
    ) -> Result<(), ServiceError> {
        self.client
            .add_permission()
            .function_name(function_name)
            .statement_id(statement_id)
            .action("lambda:InvokeFunction")
            .principal("apigateway.amazonaws.com")
            .source_arn(source_arn)
            .send()
            .await
            .map_err(|err| map_sdk_error("AddPermission", err))?;
        Ok(())
    }

    async fn remove_invoke_permission(
        &self,
        function_name: &str,
        statement_id: &str,
    ) -> Result<(), ServiceError> {
        match self
            .client
            .remove_permission()
            .function_name(function_name)
            .statement_id(statement_id)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    Err(ServiceError::NotFound {
                        resource: format!("permission statement '{statement_id}'"),
                    })
                } else {
                    Err(map_sdk_error("RemovePermission", err))
                }
            }
        }
    }
}

/// [`GatewayService`] over the API Gateway control plane.
#[derive(Debug, Clone)]
pub struct AwsGatewayService {
    client: aws_sdk_apigateway::Client,
}

impl AwsGatewayService {
    pub fn new(client: aws_sdk_apigateway::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GatewayService for AwsGatewayService {
    async fn import_api(&self, body: &serde_json::Value) -> Result<RestApi, ServiceError> {
        let bytes = serde_json::to_vec(body).map_err(|err| ServiceError::Api {
            operation: "ImportRestApi",
            message: format!("failed to serialize specification: {err}"),
            source: Some(Box::new(err)),
        })?;

        let output = self
            .client
            .import_rest_api()
            .fail_on_warnings(true)
            .body(aws_sdk_apigateway::primitives::Blob::new(bytes))
            .send()
            .await
            .map_err(|err| map_sdk_error("ImportRestApi", err))?;

        let id = output.id().ok_or_else(|| ServiceError::Api {
            operation: "ImportRestApi",
            message: "response carried no API id".to_string(),
            source: None,
        })?;

        Ok(RestApi {
            id: id.to_string(),
            name: output.name().map(str::to_string),
        })
    }

    async fn create_deployment(&self, api_id: &str, stage: &str) -> Result<(), ServiceError> {
        self.client
            .create_deployment()
            .rest_api_id(api_id)
            .stage_name(stage)
            .send()
            .await
            .map_err(|err| map_sdk_error("CreateDeployment", err))?;
        Ok(())
    }
}
