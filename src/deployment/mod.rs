pub mod aws;
pub mod config;
pub mod functions;
pub mod gateway;
pub mod outcome;
pub mod packager;
pub mod service;

pub use config::DeployConfig;
pub use functions::FunctionDeployer;
pub use gateway::GatewayPublisher;
pub use outcome::{DeployReport, PublishOutcome};
pub use packager::{BuildArtifact, Packager};
pub use service::{DeployedFunction, FunctionService, FunctionSpec, GatewayService};
