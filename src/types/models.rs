//! Model listing types
//!
//! Wire-shaped entries from `GET /models` plus keyword-based capability
//! matching over model identifiers. Providers rarely expose structured
//! capability metadata, so classification works off well-known id
//! substrings and deliberately errs on the permissive side.

use serde::{Deserialize, Serialize};

/// A model advertised by a provider's listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier
    pub id: String,
    /// Object type, usually `model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    /// Creation time as a unix timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    /// Owning organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,
}

impl ModelInfo {
    /// Create an entry with only an id, as thin listings return.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: None,
            created: None,
            owned_by: None,
        }
    }
}

/// Broad capability classes inferred from model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelCapability {
    /// Chat completion
    Text,
    /// Image understanding inside chat
    Vision,
    /// Image generation
    Image,
    /// Speech synthesis or transcription
    Speech,
    /// Video generation
    Video,
}

impl ModelCapability {
    /// Identifier substrings that indicate this capability.
    pub const fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::Text => &["gpt", "claude", "llama", "mistral", "qwen"],
            Self::Vision => &["vision", "gpt-4", "claude-3", "gemini"],
            Self::Image => &["dall-e", "dalle", "stable-diffusion", "sd", "flux", "midjourney"],
            Self::Speech => &["tts", "whisper", "speech", "audio"],
            Self::Video => &["video", "sora", "runway", "kling", "pika"],
        }
    }

    /// Whether a model id looks like it has this capability.
    pub fn matches(&self, model_id: &str) -> bool {
        let id = model_id.to_lowercase();
        self.keywords().iter().any(|keyword| id.contains(keyword))
    }
}
