//! Shared plumbing for the OpenAI-style HTTP providers

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;

use crate::{Error, Result};

pub(crate) fn client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Attach a bearer token when one is configured. Without it the request goes
/// out unauthenticated and the provider reports the failure.
pub(crate) fn authorize(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<serde_json::Value>,
}

/// Pass successful responses through; turn anything else into
/// [`Error::Provider`] carrying the provider's error type, code and message.
pub(crate) fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(Error::Provider {
        status: Some(status.as_u16()),
        message: describe_error(&body),
    })
}

fn describe_error(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };

    if let Some(detail) = parsed.error {
        let code = detail.code.map(|c| match c {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        });
        let parts: Vec<String> = [detail.error_type, code, detail.message]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        if !parts.is_empty() {
            return parts.join(": ");
        }
    }
    if let Some(detail) = parsed.detail {
        return match detail {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_style_error() {
        let body = r#"{"error":{"message":"Rate limit reached for model","type":"tokens",
            "code":"rate_limit_exceeded"}}"#;
        assert_eq!(
            describe_error(body),
            "tokens: rate_limit_exceeded: Rate limit reached for model"
        );
    }

    #[test]
    fn test_numeric_code() {
        let body = r#"{"error":{"message":"No auth credentials found","code":401}}"#;
        assert_eq!(describe_error(body), "401: No auth credentials found");
    }

    #[test]
    fn test_detail_style_error() {
        let body = r#"{"detail":"Invalid API key"}"#;
        assert_eq!(describe_error(body), "Invalid API key");
    }

    #[test]
    fn test_plain_text_error() {
        assert_eq!(describe_error("  Bad Gateway\n"), "Bad Gateway");
    }
}
