//! Core data types
//!
//! Everything the client, normalizer, and decoder exchange, organized
//! by concern:
//!
//! - **`chat`** - Chat messages and multimodal content parts
//! - **`request`** - Canonical requests and their per-modality builders
//! - **`response`** - Decoded results and normalization warnings
//! - **`job`** - Asynchronous job handles and lifecycle states
//! - **`models`** - Model listing entries and capability matching
//!
//! The commonly used types are re-exported at the module root.

pub mod chat;
pub mod job;
pub mod models;
pub mod request;
pub mod response;

pub use chat::{ChatMessage, ContentPart, ImageUrl, MessageContent, MessageRole};
pub use job::{JobHandle, JobOutput, JobState};
pub use models::{ModelCapability, ModelInfo};
pub use request::{
    GenerationRequest, ImageRequestBuilder, Modality, RequestPayload, SpeechRequestBuilder,
    TextRequestBuilder, VideoRequestBuilder,
};
pub use response::{
    CanonicalResult, GeneratedImage, GenerationResponse, ImageResult, NormalizationWarning,
    SpeechResult, TextResult, Usage, VideoResult,
};
