use serde_json::Value;

use crate::core::completion::CompletionError;

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .or_else(|| match value.get("error") {
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        })
        .or_else(|| value.get("message").and_then(Value::as_str).map(str::to_owned))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    Some(collapsed).filter(|text| !text.is_empty())
}

/// Render a provider error body for display in the transcript.
///
/// JSON bodies are pretty-printed in a fenced block, led by the provider's
/// own message when one can be found.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();
    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
        if let Ok(pretty) = serde_json::to_string_pretty(&json) {
            return match extract_error_summary(&json) {
                Some(summary) => format!("API Error: {summary}\n```json\n{pretty}\n```"),
                None => format!("API Error:\n```json\n{pretty}\n```"),
            };
        }
    }

    let fence = if trimmed.starts_with('<') && trimmed.ends_with('>') {
        "xml"
    } else {
        ""
    };
    format!("API Error:\n```{fence}\n{trimmed}\n```")
}

pub(crate) async fn http_error(response: reqwest::Response) -> CompletionError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    CompletionError::Http {
        status,
        body: format_api_error(&body),
    }
}

/// Whether a streamed payload is an error object rather than a delta.
pub(crate) fn stream_error(payload: &Value) -> Option<String> {
    payload.get("error")?;
    Some(format_api_error(&payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_errors_lead_with_the_provider_message() {
        let raw = r#"{"error":{"message":"model   overloaded","code":429}}"#;
        let expected = r#"API Error: model overloaded
```json
{
  "error": {
    "code": 429,
    "message": "model   overloaded"
  }
}
```"#;
        assert_eq!(format_api_error(raw), expected);
    }

    #[test]
    fn ollama_string_errors_are_summarized() {
        let formatted = format_api_error(r#"{"error":"model 'llama9' not found"}"#);
        assert!(formatted.starts_with("API Error: model 'llama9' not found\n```json"));
    }

    #[test]
    fn json_without_message_has_bare_heading() {
        assert_eq!(
            format_api_error(r#"{"status":"failed"}"#),
            "API Error:\n```json\n{\n  \"status\": \"failed\"\n}\n```"
        );
    }

    #[test]
    fn non_json_bodies_are_fenced() {
        assert_eq!(
            format_api_error("<html>bad gateway</html>"),
            "API Error:\n```xml\n<html>bad gateway</html>\n```"
        );
        assert_eq!(format_api_error("  upstream reset "), "API Error:\n```\nupstream reset\n```");
        assert_eq!(format_api_error(""), "API Error:\n```\n<empty>\n```");
    }

    #[test]
    fn stream_error_only_matches_error_objects() {
        let delta: Value = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(stream_error(&delta).is_none());

        let err: Value = serde_json::from_str(r#"{"error":{"message":"rate limited"}}"#).unwrap();
        assert!(stream_error(&err)
            .unwrap()
            .starts_with("API Error: rate limited"));
    }
}
