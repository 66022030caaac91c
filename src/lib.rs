//! cargo-ldeploy: zip-and-ship deployment for AWS Lambda backed APIs.
//!
//! Packages a project's dist directory into a Lambda-compatible archive,
//! ensures one Lambda function per configured logical endpoint, and optionally
//! imports a Swagger 2.0 document into API Gateway with its routes wired to
//! the deployed functions.

pub mod commands;
pub mod deployment;
pub mod error;
pub mod swagger;
