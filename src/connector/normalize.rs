use super::types::{RawResponse, ToolContent, ToolResult};
use crate::error::{BridgeError, Result};
use serde_json::Value;

/// Turn a transport outcome into the uniform result shape.
/// Transport failures become failed results carrying the classified message.
pub(crate) fn normalize(outcome: Result<RawResponse>) -> ToolResult {
    match outcome.and_then(normalize_raw) {
        Ok(result) => result,
        Err(err) => ToolResult::failure(err.classify()),
    }
}

fn normalize_raw(raw: RawResponse) -> Result<ToolResult> {
    match raw {
        RawResponse::Envelope(body) => {
            serde_json::from_value::<ToolResult>(body).map_err(BridgeError::protocol)
        }
        RawResponse::Content {
            content,
            structured,
            is_error,
        } => {
            if is_error {
                let message = content_text(&content);
                if message.is_empty() {
                    return Ok(ToolResult::failure(
                        "tool execution failed: no error message returned",
                    ));
                }
                return Ok(ToolResult::failure(message));
            }

            if let Some(structured) = structured {
                return Ok(ToolResult::success(structured));
            }

            Ok(ToolResult::success(content_value(content)))
        }
    }
}

fn content_text(content: &[ToolContent]) -> String {
    content
        .iter()
        .filter_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn content_value(content: Vec<ToolContent>) -> Value {
    match content.as_slice() {
        [] => Value::Null,
        [ToolContent::Text { text }] => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))
        }
        _ => serde_json::to_value(content).unwrap_or(Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_envelope_success() {
        let result = normalize(Ok(RawResponse::Envelope(
            json!({"success": true, "result": {"count": 3}}),
        )));
        assert!(result.is_success());
        assert_eq!(result.result(), Some(&json!({"count": 3})));
    }

    #[test]
    fn test_envelope_failure_keeps_message() {
        let result = normalize(Ok(RawResponse::Envelope(
            json!({"success": false, "error": "tool not found: search_records"}),
        )));
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("tool not found: search_records"));
    }

    #[test]
    fn test_malformed_envelope_is_transport_error() {
        let result = normalize(Ok(RawResponse::Envelope(json!({"status": "ok"}))));
        assert!(!result.is_success());
        assert!(
            result
                .error()
                .unwrap()
                .starts_with("transport error: malformed response")
        );
    }

    #[test]
    fn test_transport_failure_is_classified() {
        let result = normalize(Err(BridgeError::Timeout(Duration::from_secs(2))));
        assert_eq!(
            result.error(),
            Some("transport error: request timed out after 2s")
        );
        assert!(result.result().is_none());
    }

    #[test]
    fn test_content_json_text_is_decoded() {
        let result = normalize(Ok(RawResponse::Content {
            content: vec![ToolContent::Text {
                text: r#"{"records": []}"#.to_string(),
            }],
            structured: None,
            is_error: false,
        }));
        assert_eq!(result.result(), Some(&json!({"records": []})));
    }

    #[test]
    fn test_content_plain_text_stays_string() {
        let result = normalize(Ok(RawResponse::Content {
            content: vec![ToolContent::Text {
                text: "erDiagram".to_string(),
            }],
            structured: None,
            is_error: false,
        }));
        assert_eq!(result.result(), Some(&json!("erDiagram")));
    }

    #[test]
    fn test_structured_content_wins() {
        let result = normalize(Ok(RawResponse::Content {
            content: vec![ToolContent::Text {
                text: "ignored".to_string(),
            }],
            structured: Some(json!({"ok": true})),
            is_error: false,
        }));
        assert_eq!(result.result(), Some(&json!({"ok": true})));
    }

    #[test]
    fn test_content_error_joins_text() {
        let result = normalize(Ok(RawResponse::Content {
            content: vec![
                ToolContent::Text {
                    text: "tool execution failed:".to_string(),
                },
                ToolContent::Text {
                    text: "access denied".to_string(),
                },
            ],
            structured: None,
            is_error: true,
        }));
        assert_eq!(result.error(), Some("tool execution failed:\naccess denied"));
    }

    #[test]
    fn test_content_error_without_text() {
        let result = normalize(Ok(RawResponse::Content {
            content: vec![],
            structured: None,
            is_error: true,
        }));
        assert!(!result.is_success());
        assert!(result.error().unwrap().starts_with("tool execution failed"));
    }
}
