pub mod fake;
pub mod luna;

pub use fake::{FakeService, ServiceCall};
pub use luna::LunaSendService;

use crate::{Guess, SpellCheckResult};
use serde::Deserialize;
use thiserror::Error;

/// Method names exposed by the SmartKey service
pub const SEARCH_METHOD: &str = "search";
pub const SET_LOCALE_METHOD: &str = "setLocale";

/// Anything that can answer spelling queries and switch locale.
///
/// Implementations must be shareable across worker threads: the runner may
/// score independent cases in parallel between locale changes.
pub trait SpellCheckService: Send + Sync {
    fn check_spelling(&self, word: &str) -> Result<SpellCheckResult, ServiceCallError>;

    fn set_locale(&self, locale: &str) -> Result<(), ServiceCallError>;
}

#[derive(Debug, Error)]
pub enum ServiceCallError {
    #[error("{method} call failed: {}", .error_text.as_deref().unwrap_or("returnValue was false"))]
    Rejected {
        method: String,
        error_text: Option<String>,
    },

    #[error("{method} call returned no response")]
    NoResponse { method: String },

    #[error("{method} call timed out after {secs}s")]
    Timeout { method: String, secs: u64 },

    #[error("{method} call returned a malformed response: {reason}")]
    MalformedResponse { method: String, reason: String },

    #[error("failed to run {method} call: {source}")]
    Io {
        method: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(rename = "returnValue", default)]
    return_value: bool,

    #[serde(rename = "errorText")]
    error_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(flatten)]
    status: StatusResponse,

    #[serde(rename = "spelledCorrectly")]
    spelled_correctly: Option<bool>,

    guesses: Option<Vec<Guess>>,
}

/// Parse one line returned by a `search` call.
pub fn parse_search_response(line: &str) -> Result<SpellCheckResult, ServiceCallError> {
    let response: SearchResponse = decode(SEARCH_METHOD, line)?;
    check_status(SEARCH_METHOD, response.status)?;

    let spelled_correctly =
        response
            .spelled_correctly
            .ok_or_else(|| ServiceCallError::MalformedResponse {
                method: SEARCH_METHOD.to_string(),
                reason: "missing spelledCorrectly".to_string(),
            })?;

    Ok(SpellCheckResult {
        spelled_correctly,
        guesses: response.guesses.unwrap_or_default(),
    })
}

/// Parse one line returned by a call that only reports success, such as `setLocale`.
pub fn parse_status_response(method: &str, line: &str) -> Result<(), ServiceCallError> {
    let response: StatusResponse = decode(method, line)?;
    check_status(method, response)
}

fn decode<'a, T: Deserialize<'a>>(method: &str, line: &'a str) -> Result<T, ServiceCallError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ServiceCallError::NoResponse {
            method: method.to_string(),
        });
    }

    serde_json::from_str(line).map_err(|e| ServiceCallError::MalformedResponse {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

fn check_status(method: &str, status: StatusResponse) -> Result<(), ServiceCallError> {
    if status.return_value {
        Ok(())
    } else {
        Err(ServiceCallError::Rejected {
            method: method.to_string(),
            error_text: status.error_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let line = r#"{"returnValue":true,"spelledCorrectly":false,"guesses":[{"str":"hte","sp":false},{"str":"the","sp":true,"auto-accept":true}]}"#;
        let result = parse_search_response(line).unwrap();

        assert!(!result.spelled_correctly);
        assert_eq!(result.guesses.len(), 2);
        assert_eq!(result.guesses[0].text, "hte");
        assert!(!result.guesses[0].auto_accept);
        assert_eq!(result.guesses[1].text, "the");
        assert!(result.guesses[1].spelled_correctly);
        assert!(result.guesses[1].auto_accept);
        assert!(!result.guesses[1].auto_replace);
    }

    #[test]
    fn test_parse_search_response_without_guesses() {
        let result = parse_search_response(r#"{"returnValue":true,"spelledCorrectly":true}"#).unwrap();
        assert!(result.spelled_correctly);
        assert!(result.guesses.is_empty());
    }

    #[test]
    fn test_false_return_value_is_rejected() {
        let err = parse_search_response(r#"{"returnValue":false,"errorText":"no database"}"#)
            .unwrap_err();
        match err {
            ServiceCallError::Rejected { method, error_text } => {
                assert_eq!(method, "search");
                assert_eq!(error_text.as_deref(), Some("no database"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_return_value_is_rejected() {
        let err = parse_status_response(SET_LOCALE_METHOD, "{}").unwrap_err();
        assert!(matches!(err, ServiceCallError::Rejected { .. }));
        assert!(err.to_string().contains("returnValue was false"));
    }

    #[test]
    fn test_garbage_is_malformed_not_fatal() {
        let err = parse_search_response("Segmentation fault").unwrap_err();
        assert!(matches!(err, ServiceCallError::MalformedResponse { .. }));

        let err = parse_search_response(r#"{"returnValue":true}"#).unwrap_err();
        assert!(matches!(err, ServiceCallError::MalformedResponse { .. }));

        let err = parse_search_response(
            r#"{"returnValue":true,"spelledCorrectly":false,"guesses":[{"sp":true}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceCallError::MalformedResponse { .. }));
    }

    #[test]
    fn test_empty_line_is_no_response() {
        let err = parse_status_response(SET_LOCALE_METHOD, "\n").unwrap_err();
        assert!(matches!(err, ServiceCallError::NoResponse { .. }));
    }

    #[test]
    fn test_parse_status_response() {
        assert!(parse_status_response(SET_LOCALE_METHOD, r#"{"returnValue": true}"#).is_ok());
    }
}
