//! Named outcomes of a deploy run.
//!
//! Gateway wiring is best-effort: stage deployment and permission grants can
//! fail without undoing the already-imported API. Instead of swallowing those
//! failures, they are carried as warnings so callers can tell "fully
//! deployed" from "deployed with gateway-wiring warnings" deterministically.

use std::collections::BTreeMap;

use serde::Serialize;

use super::service::DeployedFunction;

/// Result of publishing the API: the imported API plus any best-effort
/// failures that followed the import.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub api_id: String,
    pub stage: Option<String>,
    pub warnings: Vec<String>,
}

impl PublishOutcome {
    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Everything one deploy run produced.
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub functions: BTreeMap<String, DeployedFunction>,
    pub publish: Option<PublishOutcome>,
}

impl DeployReport {
    /// True when every step, including best-effort gateway wiring, succeeded.
    pub fn is_complete(&self) -> bool {
        self.publish.as_ref().is_none_or(PublishOutcome::is_complete)
    }

    /// Human-readable summary printed to the terminal.
    pub fn display(&self) {
        println!("📊 Deployed functions:");
        for function in self.functions.values() {
            println!("   {} -> {}", function.name, function.arn);
        }
        if let Some(publish) = &self.publish {
            println!("🌐 API: {}", publish.api_id);
            if let Some(stage) = &publish.stage {
                println!("   Stage: {stage}");
            }
            for warning in &publish.warnings {
                println!("   ⚠️  {warning}");
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_without_api_is_complete() {
        let report = DeployReport {
            functions: BTreeMap::new(),
            publish: None,
        };
        assert!(report.is_complete());
    }

    #[test]
    fn warnings_make_the_report_incomplete() {
        let report = DeployReport {
            functions: BTreeMap::new(),
            publish: Some(PublishOutcome {
                api_id: "abc123".to_string(),
                stage: Some("prod".to_string()),
                warnings: vec!["invoke permission for 'f': boom".to_string()],
            }),
        };
        assert!(!report.is_complete());
    }
}
