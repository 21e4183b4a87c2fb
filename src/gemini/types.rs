//! Request and response types for the Gemini generateContent API.
//!
//! All structs serialize to the camelCase JSON the REST endpoint expects.

use serde::{Deserialize, Serialize};

/// Inline binary data carried inside a request part.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// Declared MIME type of the data (e.g. "image/jpeg").
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

/// One part of a content block: either text or inline binary data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_image(mime_type: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: base64_data.into(),
            }),
        }
    }
}

/// A block of parts forming one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Generation tuning knobs; only what the pipeline needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    /// Build the single-turn request the pipeline sends: an inline image
    /// followed by the extraction instruction.
    pub fn for_image(
        mime_type: &str,
        base64_data: String,
        instruction: &str,
        max_output_tokens: Option<u32>,
    ) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::inline_image(mime_type, base64_data),
                    Part::text(instruction),
                ],
            }],
            generation_config: max_output_tokens
                .map(|max| GenerationConfig {
                    max_output_tokens: Some(max),
                }),
        }
    }
}

/// One generated candidate in the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Response body from `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if any.
    /// Mirrors `candidates[0].content.parts[0].text` in the wire format.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }
}
