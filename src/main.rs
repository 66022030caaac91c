//! cargo-ldeploy: deploy zip-packaged Lambda functions and wire an API
//! Gateway from a Swagger 2.0 specification.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cargo_ldeploy::commands;

/// Deploy zip-packaged Lambda functions and wire an API Gateway
#[derive(Parser)]
#[command(name = "cargo-ldeploy")]
#[command(bin_name = "cargo ldeploy")]
#[command(about = "Package, deploy, and publish Lambda-backed APIs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    deploy: DeployArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Default)]
struct DeployArgs {
    /// AWS region (overrides config file and environment)
    #[arg(long)]
    region: Option<String>,

    /// IAM role name the functions execute under
    #[arg(long)]
    role: Option<String>,

    /// Deployment stage name for the API
    #[arg(long)]
    stage: Option<String>,

    /// Swagger 2.0 document to publish
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Project root (defaults to the nearest ancestor with a Cargo.toml)
    #[arg(long)]
    project_root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter .ldeploy/deploy.toml
    Init {
        /// Default region to record in the config
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Build the deployment archive without deploying
    Package,

    /// Validate the Swagger document without deploying
    Validate {
        /// Document to validate (defaults to [api].spec from the config)
        #[arg(long)]
        spec: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Handle cargo subcommand invocation: when called as `cargo ldeploy`,
    // cargo passes "ldeploy" as the first argument.
    let cli = if std::env::args().nth(1).as_deref() == Some("ldeploy") {
        let args: Vec<String> = std::env::args()
            .enumerate()
            .filter_map(|(i, arg)| (i != 1).then_some(arg))
            .collect();
        Cli::parse_from(args)
    } else {
        Cli::parse()
    };

    let project_root = match &cli.deploy.project_root {
        Some(root) => root.clone(),
        None => find_project_root()?,
    };

    match cli.command {
        Some(Commands::Init { region, force }) => commands::init::InitCommand::new(project_root)
            .with_region(region)
            .with_force(force)
            .execute(),
        Some(Commands::Package) => commands::package::PackageCommand::new(project_root).execute(),
        Some(Commands::Validate { spec }) => commands::validate::ValidateCommand::new(project_root)
            .with_spec(spec)
            .execute(),
        None => {
            let overrides = commands::deploy::DeployOverrides {
                region: cli.deploy.region,
                role: cli.deploy.role,
                stage: cli.deploy.stage,
                spec: cli.deploy.spec,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime
                .block_on(commands::deploy::DeployExecutor::new(project_root, overrides).execute())
                .map(|_report| ())
        }
    }
}

fn find_project_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    let mut dir = current_dir.as_path();

    loop {
        if dir.join("Cargo.toml").exists() {
            return Ok(dir.to_path_buf());
        }
        dir = dir
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Could not find Cargo.toml in any parent directory"))?;
    }
}
