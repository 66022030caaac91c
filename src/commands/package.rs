//! `cargo ldeploy package`: run only the packaging step.

use anyhow::Result;
use std::path::PathBuf;

use crate::deployment::{DeployConfig, Packager};

pub struct PackageCommand {
    project_root: PathBuf,
}

impl PackageCommand {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    pub fn execute(&self) -> Result<()> {
        let config = DeployConfig::load(&self.project_root)?;

        println!("📦 Packaging {}...", config.build.dist_dir.display());
        let artifact = Packager::new(self.project_root.clone()).package(&config)?;
        let size = std::fs::metadata(&artifact.archive)?.len();

        println!("✅ {} ({} KB)", artifact.archive.display(), size / 1024);
        println!("   {} function(s) mapped", artifact.functions.len());
        for (name, handler) in &artifact.functions {
            println!("   {name} -> {handler}");
        }

        Ok(())
    }
}
