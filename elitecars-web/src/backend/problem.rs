//! Human-readable messages out of heterogeneous backend response bodies.
//!
//! The backend answers with several JSON shapes: `{"message": ...}` from its own
//! handlers, RFC 7807 problem details (`title`, `errors`) from model binding, and
//! occasionally plain text. Each known shape is a parser; parsers are tried in
//! order and the first one that yields a non-blank string wins. Bodies that are
//! not JSON objects, or match no parser, are returned as raw text.

use serde_json::{Map, Value};

/// Shown when a failed response carries no body at all.
pub const GENERIC_ERROR_MESSAGE: &str = "Unknown error occurred. Please try again.";

/// Shown when a successful response carries no body at all.
pub const GENERIC_SUCCESS_MESSAGE: &str = "Operation completed successfully.";

/// Separator between individual validation messages of an `errors` payload.
pub const ERRORS_SEPARATOR: &str = " | ";

type ShapeParser = fn(&Map<String, Value>) -> Option<String>;

/// Error shapes, highest priority first.
const ERROR_SHAPES: &[(&str, ShapeParser)] = &[
    ("message", message_field),
    ("title", title_field),
    ("errors", errors_field),
];

/// Shapes a success body may carry.
const SUCCESS_SHAPES: &[(&str, ShapeParser)] = &[
    ("message", message_field),
    ("title", title_field),
    ("success", success_field),
];

/// Message for a non-success response body.
pub fn extract_error_message(body: &str) -> String {
    extract_with(body, ERROR_SHAPES, GENERIC_ERROR_MESSAGE)
}

/// Message for a success response body (login confirmations and the like).
pub fn extract_success_message(body: &str) -> String {
    extract_with(body, SUCCESS_SHAPES, GENERIC_SUCCESS_MESSAGE)
}

fn extract_with(body: &str, shapes: &[(&str, ShapeParser)], fallback: &str) -> String {
    if body.trim().is_empty() {
        return String::from(fallback);
    }

    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for (name, parse) in shapes {
            if let Some(message) = parse(&fields) {
                tracing::trace!(shape = name, "matched backend message shape");
                return message;
            }
        }
    }

    body.to_string()
}

fn message_field(fields: &Map<String, Value>) -> Option<String> {
    fields.get("message").and_then(scalar_text)
}

fn title_field(fields: &Map<String, Value>) -> Option<String> {
    fields.get("title").and_then(scalar_text)
}

fn success_field(fields: &Map<String, Value>) -> Option<String> {
    fields.get("success").and_then(scalar_text)
}

/// `errors` may be a field map (`{"Year": ["..."]}`), a list, or a single string.
fn errors_field(fields: &Map<String, Value>) -> Option<String> {
    let mut collected = Vec::new();
    match fields.get("errors")? {
        Value::Object(map) => {
            for value in map.values() {
                collect_messages(value, &mut collected);
            }
        }
        other => collect_messages(other, &mut collected),
    }

    if collected.is_empty() {
        None
    } else {
        Some(collected.join(ERRORS_SEPARATOR))
    }
}

fn collect_messages(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_messages(item, out);
            }
        }
        other => {
            if let Some(text) = scalar_text(other) {
                out.push(text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        extract_error_message, extract_success_message, GENERIC_ERROR_MESSAGE,
        GENERIC_SUCCESS_MESSAGE,
    };

    #[test]
    fn message_field_wins_over_everything_else() {
        let body = r#"{"title":"Bad Request","errors":{"Year":["too old"]},"message":"Car not found."}"#;
        assert_eq!(extract_error_message(body), "Car not found.");
    }

    #[test]
    fn title_is_used_when_message_is_missing() {
        let body = r#"{"type":"https://tools.ietf.org/html/rfc7231","title":"Not Found","status":404}"#;
        assert_eq!(extract_error_message(body), "Not Found");
    }

    #[test]
    fn blank_message_falls_through_to_title() {
        let body = r#"{"message":"   ","title":"Unauthorized"}"#;
        assert_eq!(extract_error_message(body), "Unauthorized");
    }

    #[test]
    fn errors_map_is_flattened_and_joined() {
        let body = r#"{"errors":{"Make":["Make is required."],"Year":["Year must be between 1886 and 2100.","Year is required."]}}"#;
        assert_eq!(
            extract_error_message(body),
            "Make is required. | Year must be between 1886 and 2100. | Year is required."
        );
    }

    #[test]
    fn errors_map_keeps_the_order_the_backend_sent() {
        let body = r#"{"errors":{"Year":["bad year"],"Make":["bad make"]}}"#;
        assert_eq!(extract_error_message(body), "bad year | bad make");
    }

    #[test]
    fn errors_list_and_string_are_accepted() {
        assert_eq!(
            extract_error_message(r#"{"errors":["first","second"]}"#),
            "first | second"
        );
        assert_eq!(extract_error_message(r#"{"errors":"only one"}"#), "only one");
    }

    #[test]
    fn empty_errors_fall_back_to_raw_body() {
        let body = r#"{"errors":{}}"#;
        assert_eq!(extract_error_message(body), body);
    }

    #[test]
    fn plain_text_is_returned_verbatim() {
        assert_eq!(
            extract_error_message("Invalid credentials"),
            "Invalid credentials"
        );
    }

    #[test]
    fn json_that_is_not_an_object_is_returned_verbatim() {
        assert_eq!(extract_error_message("[1,2,3]"), "[1,2,3]");
        assert_eq!(extract_error_message("\"quoted\""), "\"quoted\"");
    }

    #[test]
    fn empty_body_uses_generic_fallback() {
        assert_eq!(extract_error_message(""), GENERIC_ERROR_MESSAGE);
        assert_eq!(extract_error_message(" \n "), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn non_string_message_is_rendered_as_json() {
        assert_eq!(extract_error_message(r#"{"message":42}"#), "42");
    }

    #[test]
    fn success_message_prefers_message_then_title_then_success() {
        assert_eq!(
            extract_success_message(r#"{"success":true,"message":"Welcome back"}"#),
            "Welcome back"
        );
        assert_eq!(extract_success_message(r#"{"success":true}"#), "true");
        assert_eq!(extract_success_message(""), GENERIC_SUCCESS_MESSAGE);
        assert_eq!(extract_success_message("Logged in"), "Logged in");
    }
}
