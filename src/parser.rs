//! Parsing of the transformer's raw text output into menu items.
//!
//! Models are asked for a bare JSON array but routinely wrap it in a
//! markdown code fence anyway, so the fence is stripped before parsing.
//! No semantic validation happens here: field values pass through as-is.

use serde_json::Value;
use thiserror::Error;

use crate::record::MenuItem;

/// Failure to turn raw transformer output into structured items.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("output is valid JSON but not an array")]
    NotAnArray,

    #[error("array element {index} is not an object")]
    NonObjectItem { index: usize },
}

/// Remove a surrounding markdown code fence, if present.
///
/// Handles a leading fence with an optional language hint (```` ```json ````)
/// and a trailing bare fence. Text without a fence is returned trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the rest of the fence line (language hint included).
        text = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

/// Parse raw transformer output into a sequence of menu items.
pub fn parse_items(raw: &str) -> Result<Vec<MenuItem>, ParseError> {
    let text = strip_code_fence(raw);
    let value: Value = serde_json::from_str(text)?;

    let Value::Array(elements) = value else {
        return Err(ParseError::NotAnArray);
    };

    elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| match element {
            Value::Object(fields) => Ok(MenuItem(fields)),
            _ => Err(ParseError::NonObjectItem { index }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BARE: &str = r#"[{"category":"BEER","name":"Kingfisher","age":null,"size":"500ml","Price":195}]"#;

    #[test]
    fn parses_bare_array() {
        let items = parse_items(BARE).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("name"), Some(&json!("Kingfisher")));
        assert_eq!(items[0].get("Price"), Some(&json!(195)));
    }

    #[test]
    fn fenced_output_parses_identically_to_bare() {
        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(parse_items(&fenced).unwrap(), parse_items(BARE).unwrap());
    }

    #[test]
    fn fence_without_language_hint() {
        let fenced = format!("```\n{BARE}\n```");
        let items = parse_items(&fenced).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn fence_with_surrounding_whitespace() {
        let fenced = format!("\n  ```json\n{BARE}\n```  \n");
        let items = parse_items(&fenced).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn strip_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn empty_array_yields_no_items() {
        let items = parse_items("[]").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_items("Sorry, I could not read the menu.").unwrap_err();
        assert!(matches!(err, ParseError::Json(_)));
    }

    #[test]
    fn non_array_json_is_rejected() {
        let err = parse_items(r#"{"category":"BEER"}"#).unwrap_err();
        assert!(matches!(err, ParseError::NotAnArray));
    }

    #[test]
    fn non_object_element_is_rejected() {
        let err = parse_items(r#"[{"name":"ok"}, 42]"#).unwrap_err();
        assert!(matches!(err, ParseError::NonObjectItem { index: 1 }));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let items = parse_items(r#"[{"name":"Stout","house_special":true}]"#).unwrap();
        assert_eq!(items[0].get("house_special"), Some(&json!(true)));
    }

    #[test]
    fn size_variants_become_separate_items() {
        let raw = r#"[
            {"category":"IMPORTED REDS","name":"AG 47 MALBEC SHIRAZ","age":null,"size":"glass","Price":635},
            {"category":"IMPORTED REDS","name":"AG 47 MALBEC SHIRAZ","age":null,"size":"bottle","Price":3295}
        ]"#;
        let items = parse_items(raw).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("size"), Some(&json!("glass")));
        assert_eq!(items[1].get("size"), Some(&json!("bottle")));
    }
}
