//! `cargo ldeploy init`: write a starter configuration file.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::deployment::DeployConfig;

pub struct InitCommand {
    project_root: PathBuf,
    region: Option<String>,
    force: bool,
}

impl InitCommand {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            region: None,
            force: false,
        }
    }

    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn execute(&self) -> Result<()> {
        let config_path = DeployConfig::config_path(&self.project_root);
        if config_path.exists() && !self.force {
            bail!(
                "{} already exists; pass --force to overwrite",
                config_path.display()
            );
        }

        let config =
            DeployConfig::default_for_project(self.region.clone(), self.project_root.clone());
        config.save(&self.project_root)?;

        println!("✅ Wrote {}", config_path.display());
        println!();
        println!("Next steps:");
        println!("   1. Set [aws].role to the IAM role your functions run as");
        println!("   2. Add [functions] entries (name = \"handler\")");
        println!("   3. Optionally point [api].spec at a Swagger 2.0 document");
        println!("   4. Run: cargo ldeploy");

        Ok(())
    }
}
