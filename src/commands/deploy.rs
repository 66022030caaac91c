//! The default command: package, deploy functions, publish the API.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Instant;

use crate::deployment::aws::{AwsClients, AwsFunctionService, AwsGatewayService};
use crate::deployment::service::FunctionSpec;
use crate::deployment::{
    DeployConfig, DeployReport, FunctionDeployer, GatewayPublisher, Packager,
};
use crate::swagger::merge::merge_invocation_uris;
use crate::swagger::SwaggerInput;

/// CLI overrides folded into the config file before resolution, so the
/// precedence is always flag > file > environment.
#[derive(Debug, Clone, Default)]
pub struct DeployOverrides {
    pub region: Option<String>,
    pub role: Option<String>,
    pub stage: Option<String>,
    pub spec: Option<PathBuf>,
}

pub struct DeployExecutor {
    project_root: PathBuf,
    overrides: DeployOverrides,
}

impl DeployExecutor {
    pub fn new(project_root: PathBuf, overrides: DeployOverrides) -> Self {
        Self {
            project_root,
            overrides,
        }
    }

    pub async fn execute(&self) -> Result<DeployReport> {
        let start = Instant::now();

        println!("🚀 Deploying Lambda functions...");
        println!();

        let mut config = DeployConfig::load(&self.project_root)?;
        self.apply_overrides(&mut config);

        let region = config.resolved_region()?;
        println!("🌍 Region: {region}");

        // Validate the Swagger document up front: a malformed spec must fail
        // before any remote call.
        let api_document = match self.swagger_input(&config) {
            Some(input) => Some(input.load()?),
            None => None,
        };

        println!("📦 Packaging {}...", config.build.dist_dir.display());
        let artifact = Packager::new(self.project_root.clone()).package(&config)?;
        artifact.ensure_deployable()?;
        let code = artifact.read_archive()?;
        println!("   ✅ {} ({} KB)", artifact.archive.display(), code.len() / 1024);
        println!();

        let clients = AwsClients::connect(region.clone()).await;
        let role_arn = clients.resolve_role_arn(config.required_role()?).await?;

        let specs: Vec<FunctionSpec> = artifact
            .functions
            .iter()
            .map(|(name, handler)| config.function_spec(name, handler, &role_arn))
            .collect();

        println!("λ  Deploying {} function(s)...", specs.len());
        let lambda = AwsFunctionService::new(clients.lambda.clone());
        let deployed = FunctionDeployer::new(&lambda).deploy_all(&specs, &code).await?;
        println!();

        let publish = match api_document {
            Some(document) => {
                let merged = merge_invocation_uris(&document, &region, &deployed);
                let account_id = clients.caller_account_id().await?;
                let gateway = AwsGatewayService::new(clients.gateway.clone());
                let publisher =
                    GatewayPublisher::new(&gateway, &lambda, region.clone(), account_id);
                Some(
                    publisher
                        .publish(&merged, &deployed, config.api_stage())
                        .await?,
                )
            }
            None => None,
        };

        let report = DeployReport {
            functions: deployed,
            publish,
        };

        let elapsed = start.elapsed();
        if report.is_complete() {
            println!("✅ Deployment complete in {:.1}s", elapsed.as_secs_f64());
        } else {
            println!(
                "⚠️  Deployed with gateway-wiring warnings in {:.1}s",
                elapsed.as_secs_f64()
            );
        }
        println!();
        report.display();

        Ok(report)
    }

    fn apply_overrides(&self, config: &mut DeployConfig) {
        if let Some(region) = &self.overrides.region {
            config.aws.region = Some(region.clone());
        }
        if let Some(role) = &self.overrides.role {
            config.aws.role = Some(role.clone());
        }
        if let Some(stage) = &self.overrides.stage {
            config.api.get_or_insert_with(Default::default).stage = Some(stage.clone());
        }
    }

    /// Where the Swagger document comes from for this run. A `--spec` path
    /// is taken verbatim; a configured value is resolved against the project
    /// root so relative paths work from any subdirectory.
    fn swagger_input(&self, config: &DeployConfig) -> Option<SwaggerInput> {
        if let Some(path) = &self.overrides.spec {
            return Some(SwaggerInput::Path(path.clone()));
        }
        config
            .api
            .as_ref()
            .and_then(|api| api.spec.as_deref())
            .map(|value| SwaggerInput::from_config_value(value, &config.project_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::config::ApiConfig;

    #[test]
    fn overrides_take_precedence_over_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DeployConfig::default_for_project(
            Some("us-east-1".to_string()),
            dir.path().to_path_buf(),
        );
        config.aws.role = Some("old-role".to_string());

        let executor = DeployExecutor::new(
            dir.path().to_path_buf(),
            DeployOverrides {
                region: Some("eu-west-1".to_string()),
                role: Some("new-role".to_string()),
                stage: Some("prod".to_string()),
                spec: None,
            },
        );
        executor.apply_overrides(&mut config);

        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws.role.as_deref(), Some("new-role"));
        assert_eq!(config.api_stage(), Some("prod"));
    }

    #[test]
    fn absent_overrides_leave_the_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DeployConfig::default_for_project(
            Some("us-east-1".to_string()),
            dir.path().to_path_buf(),
        );

        let executor =
            DeployExecutor::new(dir.path().to_path_buf(), DeployOverrides::default());
        executor.apply_overrides(&mut config);

        assert_eq!(config.aws.region.as_deref(), Some("us-east-1"));
        assert!(config.api.is_none());
    }

    #[test]
    fn spec_override_path_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            DeployConfig::default_for_project(None, dir.path().to_path_buf());

        let executor = DeployExecutor::new(
            dir.path().to_path_buf(),
            DeployOverrides {
                spec: Some(PathBuf::from("apis/items.yaml")),
                ..Default::default()
            },
        );

        match executor.swagger_input(&config) {
            Some(SwaggerInput::Path(path)) => assert_eq!(path, PathBuf::from("apis/items.yaml")),
            other => panic!("expected a path input, got {other:?}"),
        }
    }

    #[test]
    fn configured_spec_resolves_against_the_project_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("api.yaml"), "swagger: \"2.0\"\n").unwrap();

        let mut config = DeployConfig::default_for_project(None, dir.path().to_path_buf());
        config.api = Some(ApiConfig {
            spec: Some("api.yaml".to_string()),
            stage: None,
        });

        let executor = DeployExecutor::new(dir.path().to_path_buf(), DeployOverrides::default());

        // The process CWD is not the project root; the file must still be
        // found next to the config.
        match executor.swagger_input(&config) {
            Some(SwaggerInput::Path(path)) => assert_eq!(path, dir.path().join("api.yaml")),
            other => panic!("expected a path input, got {other:?}"),
        }
    }
}
