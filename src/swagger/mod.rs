//! Swagger 2.0 document handling: loading, validation, and URI merging.
//!
//! Documents are held as `serde_json::Value` so unknown vendor extensions
//! survive the round trip untouched; YAML input is accepted because JSON is a
//! subset of it.

pub mod merge;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{DeployError, DeployResult};

/// Where a Swagger document comes from: an in-memory value, a file on disk,
/// or raw YAML/JSON text.
#[derive(Debug, Clone)]
pub enum SwaggerInput {
    Document(Value),
    Path(PathBuf),
    Text(String),
}

impl SwaggerInput {
    /// Interpret a configuration string: a path if it names an existing
    /// file, raw document text otherwise. Relative values are resolved
    /// against `base` (the project root), not the process CWD, so running
    /// from a subdirectory finds the same file.
    pub fn from_config_value(value: &str, base: &Path) -> Self {
        let path = Path::new(value);
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };
        if candidate.exists() {
            SwaggerInput::Path(candidate)
        } else {
            SwaggerInput::Text(value.to_string())
        }
    }

    /// Read, parse, and validate the document. Runs once per deploy, before
    /// any remote call.
    pub fn load(&self) -> DeployResult<Value> {
        let document = match self {
            SwaggerInput::Document(value) => value.clone(),
            SwaggerInput::Path(path) => {
                let text = std::fs::read_to_string(path).map_err(|err| {
                    DeployError::Config(format!(
                        "failed to read Swagger file {}: {err}",
                        path.display()
                    ))
                })?;
                parse_document(&text)?
            }
            SwaggerInput::Text(text) => parse_document(text)?,
        };

        validate_document(&document)?;
        Ok(document)
    }
}

fn parse_document(text: &str) -> DeployResult<Value> {
    serde_yaml::from_str(text)
        .map_err(|err| DeployError::Config(format!("not a valid Swagger document: {err}")))
}

/// Structural validation of a Swagger 2.0 document.
///
/// Not a full schema check: it verifies the shape the merge and import steps
/// rely on, and names the first problem found.
pub fn validate_document(document: &Value) -> DeployResult<()> {
    let root = document
        .as_object()
        .ok_or_else(|| config_err("document root must be a mapping"))?;

    match root.get("swagger").and_then(Value::as_str) {
        Some("2.0") => {}
        Some(other) => {
            return Err(config_err(&format!(
                "unsupported swagger version '{other}', expected '2.0'"
            )))
        }
        None => return Err(config_err("missing required 'swagger' version field")),
    }

    let info = root
        .get("info")
        .and_then(Value::as_object)
        .ok_or_else(|| config_err("missing required 'info' object"))?;
    for field in ["title", "version"] {
        if !info.get(field).is_some_and(Value::is_string) {
            return Err(config_err(&format!("'info' object is missing '{field}'")));
        }
    }

    let paths = root
        .get("paths")
        .and_then(Value::as_object)
        .ok_or_else(|| config_err("missing required 'paths' object"))?;

    for (path, item) in paths {
        if !path.starts_with('/') {
            return Err(config_err(&format!("path '{path}' must start with '/'")));
        }
        let item = item
            .as_object()
            .ok_or_else(|| config_err(&format!("path item '{path}' must be a mapping")))?;
        for (method, operation) in item {
            // Path items also carry `parameters`, `$ref`, and vendor
            // extensions; only the HTTP method keys are operations.
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let operation = operation.as_object().ok_or_else(|| {
                config_err(&format!("operation '{method} {path}' must be a mapping"))
            })?;
            if let Some(op_id) = operation.get("operationId") {
                if !op_id.is_string() {
                    return Err(config_err(&format!(
                        "operationId of '{method} {path}' must be a string"
                    )));
                }
            }
        }
    }

    Ok(())
}

/// The operation keys a Swagger 2.0 path item can carry.
const HTTP_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

fn config_err(message: &str) -> DeployError {
    DeployError::Config(format!("invalid Swagger document: {message}"))
}
