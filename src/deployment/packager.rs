//! Archive packaging: the upstream collaborator of the deploy step.
//!
//! Zips every regular file under the configured dist directory into a single
//! deployment archive and pairs it with the logical-name -> handler mapping
//! from `[functions]`. The deploy step refuses to start unless both are
//! present.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use crate::error::{DeployError, DeployResult};

use super::config::DeployConfig;

/// Output of the packaging step.
#[derive(Debug, Clone)]
pub struct BuildArtifact {
    pub archive: PathBuf,
    /// Logical function name -> handler entry point.
    pub functions: BTreeMap<String, String>,
}

impl BuildArtifact {
    /// Fail fast when the packaging step did not produce what the deploy
    /// step needs. Checked before any remote call is made.
    pub fn ensure_deployable(&self) -> DeployResult<()> {
        if !self.archive.is_file() {
            return Err(DeployError::MissingArtifact {
                what: "a deployment archive",
            });
        }
        if self.functions.is_empty() {
            return Err(DeployError::MissingArtifact {
                what: "a function mapping",
            });
        }
        Ok(())
    }

    pub fn read_archive(&self) -> DeployResult<Vec<u8>> {
        Ok(std::fs::read(&self.archive)?)
    }
}

pub struct Packager {
    project_root: PathBuf,
}

impl Packager {
    pub fn new(project_root: PathBuf) -> Self {
        Self { project_root }
    }

    /// Zip the dist directory into `target/ldeploy/<project>.zip`.
    pub fn package(&self, config: &DeployConfig) -> DeployResult<BuildArtifact> {
        let dist_dir = self.project_root.join(&config.build.dist_dir);
        if !dist_dir.is_dir() {
            return Err(DeployError::Config(format!(
                "dist directory {} does not exist; build the project first",
                dist_dir.display()
            )));
        }

        let out_dir = self.project_root.join("target/ldeploy");
        std::fs::create_dir_all(&out_dir)?;
        let archive = out_dir.join(format!("{}.zip", self.archive_stem()));

        let file = File::create(&archive)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let map_zip_err = |source| DeployError::Archive {
            path: archive.clone(),
            source,
        };

        let mut entries = 0usize;
        for entry in walkdir::WalkDir::new(&dist_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let relative = path.strip_prefix(&dist_dir).map_err(|_| {
                DeployError::Config(format!("file {} escapes the dist directory", path.display()))
            })?;

            // Forward slashes regardless of platform.
            let zip_name = relative
                .to_str()
                .ok_or_else(|| {
                    DeployError::Config(format!("non-UTF-8 path in dist dir: {}", path.display()))
                })?
                .replace('\\', "/");

            zip.start_file(&zip_name, options).map_err(map_zip_err)?;
            let mut src = File::open(path)?;
            std::io::copy(&mut src, &mut zip)?;
            entries += 1;
        }

        if entries == 0 {
            return Err(DeployError::Config(format!(
                "dist directory {} is empty",
                dist_dir.display()
            )));
        }

        zip.finish().map_err(map_zip_err)?;

        Ok(BuildArtifact {
            archive,
            functions: config.functions.clone(),
        })
    }

    fn archive_stem(&self) -> String {
        self.project_root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("bundle")
            .to_string()
    }
}
