//! Injecting deployed-function invocation URIs into a Swagger document.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::deployment::service::DeployedFunction;

/// Vendor extension carrying the API Gateway integration for an operation.
pub const INTEGRATION_KEY: &str = "x-amazon-apigateway-integration";

/// API Gateway's Lambda integration path version.
const INVOCATION_API_VERSION: &str = "2015-03-31";

/// The URI API Gateway uses to invoke a Lambda function.
pub fn invocation_uri(region: &str, function_arn: &str) -> String {
    format!(
        "arn:aws:apigateway:{region}:lambda:path/{INVOCATION_API_VERSION}/functions/{function_arn}/invocations"
    )
}

/// Rewrite the integration target of every operation whose `operationId`
/// matches a deployed function.
///
/// Operations with no matching function, or without an existing
/// `x-amazon-apigateway-integration` object, are left untouched. The caller's
/// document is never mutated; the merge works on a clone.
pub fn merge_invocation_uris(
    document: &Value,
    region: &str,
    functions: &BTreeMap<String, DeployedFunction>,
) -> Value {
    let mut merged = document.clone();

    let Some(paths) = merged.get_mut("paths").and_then(Value::as_object_mut) else {
        return merged;
    };

    for item in paths.values_mut() {
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        for operation in item.values_mut() {
            let Some(operation) = operation.as_object_mut() else {
                continue;
            };
            let Some(deployed) = operation
                .get("operationId")
                .and_then(Value::as_str)
                .and_then(|op_id| functions.get(op_id))
            else {
                continue;
            };
            let uri = invocation_uri(region, &deployed.arn);
            if let Some(integration) = operation
                .get_mut(INTEGRATION_KEY)
                .and_then(Value::as_object_mut)
            {
                integration.insert("uri".to_string(), Value::String(uri));
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployed(name: &str, arn: &str) -> (String, DeployedFunction) {
        (
            name.to_string(),
            DeployedFunction {
                name: name.to_string(),
                arn: arn.to_string(),
                version: None,
            },
        )
    }

    #[test]
    fn invocation_uri_format() {
        assert_eq!(
            invocation_uri("us-east-1", "arn:1"),
            "arn:aws:apigateway:us-east-1:lambda:path/2015-03-31/functions/arn:1/invocations"
        );
    }

    #[test]
    fn injects_uri_without_mutating_input() {
        let input = json!({
            "paths": {
                "/x": {
                    "get": {
                        "operationId": "f",
                        "x-amazon-apigateway-integration": {"type": "aws_proxy"}
                    }
                }
            }
        });
        let snapshot = input.clone();
        let functions: BTreeMap<_, _> = [deployed("f", "arn:1")].into();

        let merged = merge_invocation_uris(&input, "us-east-1", &functions);

        assert_eq!(input, snapshot, "caller's document must not be mutated");
        assert_eq!(
            merged["paths"]["/x"]["get"][INTEGRATION_KEY]["uri"],
            json!(invocation_uri("us-east-1", "arn:1"))
        );
        // The rest of the integration object survives.
        assert_eq!(merged["paths"]["/x"]["get"][INTEGRATION_KEY]["type"], "aws_proxy");
    }

    #[test]
    fn unmapped_operations_are_untouched() {
        let input = json!({
            "paths": {
                "/x": {
                    "get": {
                        "operationId": "unknown",
                        "x-amazon-apigateway-integration": {"type": "aws_proxy"}
                    }
                }
            }
        });
        let functions: BTreeMap<_, _> = [deployed("f", "arn:1")].into();

        let merged = merge_invocation_uris(&input, "us-east-1", &functions);
        assert_eq!(merged, input);
    }

    #[test]
    fn operations_without_integration_object_get_no_uri() {
        let input = json!({
            "paths": {"/x": {"get": {"operationId": "f"}}}
        });
        let functions: BTreeMap<_, _> = [deployed("f", "arn:1")].into();

        let merged = merge_invocation_uris(&input, "us-east-1", &functions);
        assert_eq!(merged, input);
    }

    #[test]
    fn merges_across_methods_and_paths() {
        let input = json!({
            "swagger": "2.0",
            "paths": {
                "/a": {
                    "get": {"operationId": "getA", "x-amazon-apigateway-integration": {}},
                    "post": {"operationId": "postA", "x-amazon-apigateway-integration": {}}
                },
                "/b": {
                    "get": {"operationId": "getB", "x-amazon-apigateway-integration": {}}
                }
            }
        });
        let functions: BTreeMap<_, _> = [
            deployed("getA", "arn:a-get"),
            deployed("postA", "arn:a-post"),
            deployed("getB", "arn:b-get"),
        ]
        .into();

        let merged = merge_invocation_uris(&input, "eu-west-1", &functions);
        for (path, method, arn) in [
            ("/a", "get", "arn:a-get"),
            ("/a", "post", "arn:a-post"),
            ("/b", "get", "arn:b-get"),
        ] {
            assert_eq!(
                merged["paths"][path][method][INTEGRATION_KEY]["uri"],
                json!(invocation_uri("eu-west-1", arn))
            );
        }
    }

    #[test]
    fn documents_without_paths_pass_through() {
        let input = json!({"swagger": "2.0"});
        let functions = BTreeMap::new();
        assert_eq!(merge_invocation_uris(&input, "us-east-1", &functions), input);
    }
}
