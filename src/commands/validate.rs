//! `cargo ldeploy validate`: check the Swagger document without deploying.

use anyhow::{bail, Result};
use std::path::PathBuf;

use crate::deployment::DeployConfig;
use crate::swagger::SwaggerInput;

pub struct ValidateCommand {
    project_root: PathBuf,
    spec_override: Option<PathBuf>,
}

impl ValidateCommand {
    pub fn new(project_root: PathBuf) -> Self {
        Self {
            project_root,
            spec_override: None,
        }
    }

    pub fn with_spec(mut self, spec: Option<PathBuf>) -> Self {
        self.spec_override = spec;
        self
    }

    pub fn execute(&self) -> Result<()> {
        let input = match &self.spec_override {
            Some(path) => SwaggerInput::Path(path.clone()),
            None => {
                let config = DeployConfig::load(&self.project_root)?;
                match config.api.and_then(|api| api.spec) {
                    Some(value) => SwaggerInput::from_config_value(&value, &self.project_root),
                    None => bail!("no Swagger document configured; set [api].spec or pass --spec"),
                }
            }
        };

        let document = input.load()?;

        let paths = document["paths"].as_object().map_or(0, |paths| paths.len());
        let operations: usize = document["paths"]
            .as_object()
            .map_or(0, |paths| {
                paths
                    .values()
                    .filter_map(|item| item.as_object())
                    .map(|item| {
                        item.values().filter(|op| op.is_object()).count()
                    })
                    .sum()
            });

        println!("✅ Valid Swagger 2.0 document");
        println!("   {paths} path(s), {operations} operation(s)");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_a_spec_file_directly() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.yaml");
        std::fs::write(
            &spec,
            "swagger: \"2.0\"\ninfo:\n  title: t\n  version: \"1\"\npaths: {}\n",
        )
        .unwrap();

        ValidateCommand::new(dir.path().to_path_buf())
            .with_spec(Some(spec))
            .execute()
            .unwrap();
    }

    #[test]
    fn rejects_an_invalid_spec_file() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.yaml");
        std::fs::write(&spec, "swagger: \"2.0\"\n").unwrap();

        let err = ValidateCommand::new(dir.path().to_path_buf())
            .with_spec(Some(spec))
            .execute()
            .unwrap_err();
        assert!(err.to_string().contains("configuration error"));
    }
}
