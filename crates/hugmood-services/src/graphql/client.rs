//! Minimal GraphQL-over-HTTP transport.

use serde::Deserialize;
use serde_json::{Value, json};

use hugmood_core::error::{AppError, ErrorKind};
use hugmood_core::result::AppResult;

/// Response envelope returned by every backend.
#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

/// POSTs documents to one GraphQL endpoint.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    http: reqwest::Client,
}

impl GraphqlClient {
    /// Bind a shared HTTP client to an endpoint.
    pub fn new(endpoint: &str, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            http,
        }
    }

    /// Execute `document` and return `data.<operation>`.
    ///
    /// The first GraphQL error message is surfaced verbatim. A missing or
    /// null result is returned as `Value::Null`.
    pub async fn execute(
        &self,
        operation: &str,
        document: &str,
        variables: Value,
        bearer: Option<&str>,
    ) -> AppResult<Value> {
        let body = self.send(operation, document, variables, bearer).await?;
        extract(operation, body, None)
    }

    /// Like [`execute`](Self::execute), but a missing or null result fails
    /// with `missing`.
    pub async fn execute_required(
        &self,
        operation: &str,
        document: &str,
        variables: Value,
        bearer: Option<&str>,
        missing: &str,
    ) -> AppResult<Value> {
        let body = self.send(operation, document, variables, bearer).await?;
        extract(operation, body, Some(missing))
    }

    async fn send(
        &self,
        operation: &str,
        document: &str,
        variables: Value,
        bearer: Option<&str>,
    ) -> AppResult<GraphqlResponse> {
        let mut request = self.http.post(&self.endpoint).json(&json!({
            "query": document,
            "variables": variables,
        }));
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        tracing::debug!(endpoint = %self.endpoint, operation, "Sending GraphQL request");

        let response = request.send().await.map_err(|e| {
            let kind = if e.is_timeout() {
                ErrorKind::Timeout
            } else {
                ErrorKind::ExternalService
            };
            AppError::with_source(kind, format!("{operation} request failed: {e}"), e)
        })?;

        let status = response.status();
        response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("{operation} returned an unreadable response (HTTP {status})"),
                e,
            )
        })
    }
}

fn extract(operation: &str, body: GraphqlResponse, missing: Option<&str>) -> AppResult<Value> {
    if let Some(first) = body.errors.into_iter().next() {
        return Err(AppError::external_service(first.message));
    }

    let value = body
        .data
        .and_then(|mut data| data.get_mut(operation).map(Value::take))
        .unwrap_or(Value::Null);
    match missing {
        Some(message) if value.is_null() => Err(AppError::external_service(message)),
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: Value) -> GraphqlResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_extract_returns_operation_field() {
        let body = parse(json!({"data": {"createMood": {"id": "m1"}}}));
        let value = extract("createMood", body, Some("Failed to create mood")).unwrap();
        assert_eq!(value["id"], "m1");
    }

    #[test]
    fn test_extract_surfaces_first_error() {
        let body = parse(json!({
            "data": null,
            "errors": [{"message": "Recipient not found"}, {"message": "other"}]
        }));
        let err = extract("sendHug", body, Some("Failed to send hug")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert_eq!(err.message, "Recipient not found");
    }

    #[test]
    fn test_extract_null_result_uses_missing_message() {
        let body = parse(json!({"data": {"me": null}}));
        assert_eq!(
            extract("me", body, Some("Invalid token")).unwrap_err().message,
            "Invalid token"
        );

        let body = parse(json!({}));
        assert_eq!(
            extract("login", body, Some("Login failed")).unwrap_err().message,
            "Login failed"
        );
    }

    #[test]
    fn test_extract_null_query_result_passes_through() {
        let body = parse(json!({"data": {"userProfile": null}}));
        assert_eq!(extract("userProfile", body, None).unwrap(), Value::Null);
    }
}
