//! Deployment configuration: `.ldeploy/deploy.toml`.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{DeployError, DeployResult};

use super::service::{FunctionSpec, VpcPlacement};

const CONFIG_FILE: &str = ".ldeploy/deploy.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub lambda: LambdaConfig,
    #[serde(default)]
    pub build: BuildConfig,
    /// Logical function name -> handler entry point.
    #[serde(default)]
    pub functions: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Project root directory (not serialized)
    #[serde(skip)]
    pub project_root: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Target region. Optional here; resolution order is CLI flag, then this
    /// field, then `AWS_REGION`/`AWS_DEFAULT_REGION`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// IAM role *name* the functions execute under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaConfig {
    pub runtime: String,
    pub timeout_seconds: u32,
    pub memory_mb: u32,
    pub publish: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<VpcConfig>,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            runtime: "provided.al2023".to_string(),
            timeout_seconds: 60,
            memory_mb: 128,
            publish: true,
            vpc: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcConfig {
    #[serde(default)]
    pub subnets: Vec<String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory whose contents become the deployment archive.
    pub dist_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dist_dir: PathBuf::from("dist"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Swagger document: a file path, or raw inline YAML/JSON text when the
    /// path does not exist on disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
    /// Deployment stage name. When absent the API is imported but not
    /// deployed and no invoke permissions are granted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl DeployConfig {
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!("Deployment not initialized. Run: cargo ldeploy init");
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let mut config: Self = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.project_root = project_root.to_path_buf();

        Ok(config)
    }

    pub fn save(&self, project_root: &Path) -> anyhow::Result<()> {
        let config_path = project_root.join(CONFIG_FILE);
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, config_str)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        Ok(())
    }

    pub fn config_path(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE)
    }

    pub fn default_for_project(region: Option<String>, project_root: PathBuf) -> Self {
        Self {
            aws: AwsConfig {
                region,
                role: None,
                account_id: None,
            },
            lambda: LambdaConfig::default(),
            build: BuildConfig::default(),
            functions: BTreeMap::new(),
            api: None,
            project_root,
        }
    }

    /// Resolve the target region: explicit value, then the config file, then
    /// the environment, then fail. No ambient session state is consulted.
    pub fn resolved_region(&self) -> DeployResult<String> {
        resolve_region_with(self.aws.region.as_deref(), |key| std::env::var(key).ok())
    }

    /// IAM role name, required for the deploy path.
    pub fn required_role(&self) -> DeployResult<&str> {
        self.aws.role.as_deref().ok_or_else(|| {
            DeployError::Config(
                "no IAM role configured; set [aws].role or pass --role".to_string(),
            )
        })
    }

    pub fn api_stage(&self) -> Option<&str> {
        self.api.as_ref().and_then(|api| api.stage.as_deref())
    }

    /// Merge `[lambda]` settings with one `[functions]` entry into the
    /// descriptor handed to the function service.
    pub fn function_spec(&self, name: &str, handler: &str, role_arn: &str) -> FunctionSpec {
        let vpc = self.lambda.vpc.as_ref().and_then(|vpc| {
            if vpc.subnets.is_empty() && vpc.security_groups.is_empty() {
                None
            } else {
                Some(VpcPlacement {
                    subnet_ids: vpc.subnets.clone(),
                    security_group_ids: vpc.security_groups.clone(),
                })
            }
        });

        FunctionSpec {
            name: name.to_string(),
            handler: handler.to_string(),
            runtime: self.lambda.runtime.clone(),
            role_arn: role_arn.to_string(),
            memory_mb: self.lambda.memory_mb,
            timeout_seconds: self.lambda.timeout_seconds,
            publish: self.lambda.publish,
            vpc,
        }
    }
}

fn resolve_region_with(
    configured: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> DeployResult<String> {
    if let Some(region) = configured {
        return Ok(region.to_string());
    }
    if let Some(region) = env("AWS_REGION").or_else(|| env("AWS_DEFAULT_REGION")) {
        return Ok(region);
    }
    Err(DeployError::Config(
        "no region configured; set [aws].region, pass --region, or export AWS_REGION".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> DeployConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn minimal_config_gets_lambda_defaults() {
        let config = parse("[aws]\nregion = \"eu-west-1\"\n");

        assert_eq!(config.lambda.runtime, "provided.al2023");
        assert_eq!(config.lambda.timeout_seconds, 60);
        assert_eq!(config.lambda.memory_mb, 128);
        assert!(config.lambda.publish);
        assert_eq!(config.build.dist_dir, PathBuf::from("dist"));
        assert!(config.functions.is_empty());
    }

    #[test]
    fn region_prefers_configured_value_over_env() {
        let region =
            resolve_region_with(Some("eu-central-1"), |_| Some("us-east-1".to_string())).unwrap();
        assert_eq!(region, "eu-central-1");
    }

    #[test]
    fn region_falls_back_to_env() {
        let region = resolve_region_with(None, |key| {
            (key == "AWS_DEFAULT_REGION").then(|| "ap-southeast-2".to_string())
        })
        .unwrap();
        assert_eq!(region, "ap-southeast-2");
    }

    #[test]
    fn region_fails_when_nothing_is_set() {
        let err = resolve_region_with(None, |_| None).unwrap_err();
        assert!(matches!(err, DeployError::Config(_)));
    }

    #[test]
    fn function_spec_merges_lambda_settings() {
        let config = parse(
            r#"
            [aws]
            region = "us-east-1"
            role = "api-role"

            [lambda]
            runtime = "provided.al2023"
            timeout_seconds = 30
            memory_mb = 256
            publish = false

            [lambda.vpc]
            subnets = ["subnet-1", "subnet-2"]
            security_groups = ["sg-1"]

            [functions]
            get_item = "handlers.get_item"
            "#,
        );

        let spec = config.function_spec("get_item", "handlers.get_item", "arn:aws:iam::1:role/r");
        assert_eq!(spec.name, "get_item");
        assert_eq!(spec.handler, "handlers.get_item");
        assert_eq!(spec.memory_mb, 256);
        assert_eq!(spec.timeout_seconds, 30);
        assert!(!spec.publish);
        let vpc = spec.vpc.unwrap();
        assert_eq!(vpc.subnet_ids, vec!["subnet-1", "subnet-2"]);
        assert_eq!(vpc.security_group_ids, vec!["sg-1"]);
    }

    #[test]
    fn empty_vpc_section_is_dropped_from_spec() {
        let config = parse("[aws]\n[lambda.vpc]\nsubnets = []\n");
        let spec = config.function_spec("f", "h", "arn");
        assert!(spec.vpc.is_none());
    }

    #[test]
    fn required_role_errors_when_absent() {
        let config = parse("[aws]\nregion = \"us-east-1\"\n");
        assert!(config.required_role().is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config =
            DeployConfig::default_for_project(Some("us-east-1".to_string()), dir.path().into());
        config
            .functions
            .insert("f".to_string(), "handlers.f".to_string());
        config.save(dir.path()).unwrap();

        let loaded = DeployConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.aws.region.as_deref(), Some("us-east-1"));
        assert_eq!(loaded.functions.get("f").map(String::as_str), Some("handlers.f"));
        assert_eq!(loaded.project_root, dir.path());
    }

    #[test]
    fn load_without_init_points_at_init_command() {
        let dir = tempfile::tempdir().unwrap();
        let err = DeployConfig::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("cargo ldeploy init"));
    }
}
