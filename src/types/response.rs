//! Canonical generation results
//!
//! Decoded provider responses, one result shape per modality, plus the
//! warnings the normalizer attaches when it alters a request for a
//! target. Raw provider JSON is kept alongside the decoded fields so
//! hosts can reach anything the canonical shape does not carry.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::request::Modality;

/// Token usage reported by a chat completion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    /// Tokens in the completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    /// Total tokens billed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

/// Decoded chat completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    /// Assistant message text from the first choice
    pub text: String,
    /// Model the provider reports having used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token usage, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Full provider response body
    pub raw: Value,
}

/// A single generated image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Image URL, when `response_format` was `url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Base64 payload, when `response_format` was `b64_json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    /// Provider-revised prompt, when the prompt was rewritten
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

/// Decoded image generation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResult {
    /// Generated images in provider order
    pub images: Vec<GeneratedImage>,
    /// Full provider response body
    pub raw: Value,
}

/// Decoded synchronous video generation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoResult {
    /// URL of the rendered clip
    pub video_url: String,
    /// Full provider response body
    pub raw: Value,
}

/// Decoded speech synthesis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechResult {
    /// Raw audio bytes
    pub audio: Vec<u8>,
    /// Container format sniffed from the bytes, e.g. `mp3`, `wav`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Decoded result of a generation request, one variant per modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "modality", rename_all = "lowercase")]
pub enum CanonicalResult {
    /// Chat completion
    Text(TextResult),
    /// Image generation
    Image(ImageResult),
    /// Video generation
    Video(VideoResult),
    /// Speech synthesis
    Speech(SpeechResult),
}

impl CanonicalResult {
    /// The modality this result belongs to.
    pub const fn modality(&self) -> Modality {
        match self {
            Self::Text(_) => Modality::Text,
            Self::Image(_) => Modality::Image,
            Self::Video(_) => Modality::Video,
            Self::Speech(_) => Modality::Speech,
        }
    }

    /// The text result, if this is one.
    pub const fn as_text(&self) -> Option<&TextResult> {
        match self {
            Self::Text(result) => Some(result),
            _ => None,
        }
    }

    /// The image result, if this is one.
    pub const fn as_image(&self) -> Option<&ImageResult> {
        match self {
            Self::Image(result) => Some(result),
            _ => None,
        }
    }

    /// The video result, if this is one.
    pub const fn as_video(&self) -> Option<&VideoResult> {
        match self {
            Self::Video(result) => Some(result),
            _ => None,
        }
    }

    /// The speech result, if this is one.
    pub const fn as_speech(&self) -> Option<&SpeechResult> {
        match self {
            Self::Speech(result) => Some(result),
            _ => None,
        }
    }
}

/// Warning recorded while translating a request for a target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationWarning {
    /// An optional field the target does not support was left out
    Dropped {
        /// The canonical field name
        field: String,
    },
    /// A value was snapped to the nearest supported one
    Quantized {
        /// The canonical field name
        field: String,
        /// Value the caller asked for
        requested: Value,
        /// Value actually sent
        applied: Value,
    },
}

impl fmt::Display for NormalizationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropped { field } => {
                write!(f, "field `{field}` is not supported by this target and was dropped")
            }
            Self::Quantized {
                field,
                requested,
                applied,
            } => {
                write!(f, "field `{field}` was quantized from {requested} to {applied}")
            }
        }
    }
}

/// A decoded result together with its request metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The decoded result
    pub result: CanonicalResult,
    /// Warnings accumulated while normalizing the request
    pub warnings: Vec<NormalizationWarning>,
    /// Client-assigned id correlating logs for this request
    pub request_id: Uuid,
}

impl GenerationResponse {
    /// Text of the first choice, for text results.
    pub fn text(&self) -> Option<&str> {
        self.result.as_text().map(|r| r.text.as_str())
    }

    /// URL of the rendered clip, for video results.
    pub fn video_url(&self) -> Option<&str> {
        self.result.as_video().map(|r| r.video_url.as_str())
    }

    /// Generated images, for image results.
    pub fn images(&self) -> Option<&[GeneratedImage]> {
        self.result.as_image().map(|r| r.images.as_slice())
    }

    /// Audio bytes, for speech results.
    pub fn audio(&self) -> Option<&[u8]> {
        self.result.as_speech().map(|r| r.audio.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_tolerates_missing_fields() {
        let usage: Usage = serde_json::from_value(serde_json::json!({"total_tokens": 42})).unwrap();
        assert_eq!(usage.total_tokens, Some(42));
        assert_eq!(usage.prompt_tokens, None);
    }

    #[test]
    fn result_accessors_are_modality_scoped() {
        let result = CanonicalResult::Video(VideoResult {
            video_url: "https://cdn.example.com/v.mp4".into(),
            raw: serde_json::json!({}),
        });
        assert_eq!(result.modality(), Modality::Video);
        assert!(result.as_video().is_some());
        assert!(result.as_text().is_none());
    }

    #[test]
    fn warnings_render_readably() {
        let dropped = NormalizationWarning::Dropped {
            field: "fps".into(),
        };
        assert_eq!(
            dropped.to_string(),
            "field `fps` is not supported by this target and was dropped"
        );

        let quantized = NormalizationWarning::Quantized {
            field: "duration".into(),
            requested: 5.into(),
            applied: 4.into(),
        };
        assert_eq!(
            quantized.to_string(),
            "field `duration` was quantized from 5 to 4"
        );
    }

    #[test]
    fn canonical_result_serializes_with_modality_tag() {
        let result = CanonicalResult::Text(TextResult {
            text: "hi".into(),
            model: Some("gpt-4o".into()),
            usage: None,
            raw: serde_json::json!({"id": "cmpl-1"}),
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["modality"], "text");
        assert_eq!(json["text"], "hi");
    }
}
