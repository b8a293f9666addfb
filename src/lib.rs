//! # anygen: one client for OpenAI-compatible generation APIs
//!
//! `anygen` speaks to any provider that clones the OpenAI surface, and smooths
//! over the parts they clone imperfectly. A [`ProviderProfile`] describes what
//! one target actually accepts; the client normalizes each request against
//! that profile, sends it over a retrying HTTP transport, and decodes the
//! answer into a canonical response, whether the provider finished inline or
//! handed back a job to poll.
//!
//! [`ProviderProfile`]: profile::ProviderProfile
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use anygen::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = GenClient::builder("openai")?
//!         .api_key("sk-...")
//!         .build()?;
//!
//!     let request = GenerationRequest::text("gpt-4o", vec![ChatMessage::user("Hello!")])
//!         .temperature(0.7)
//!         .build()?;
//!
//!     let response = client.chat(&request).await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Capabilities
//!
//! - **Text, image, video, and speech** requests behind one request type and
//!   one canonical response type.
//! - **Profile-driven normalization**: unsupported parameters are dropped or
//!   renamed, sizes and durations are quantized to what the target offers,
//!   and every adjustment is reported as a [`NormalizationWarning`].
//! - **Deferred work**: video jobs are submitted, polled, and awaited through
//!   an explicit [`JobHandle`], with cancellation and wait budgets.
//! - **Retry with backoff** for idempotent requests, connect-only retry for
//!   submissions that may have reached the server.
//! - **Model discovery** with a TTL cache that serves stale listings when a
//!   refresh fails.
//!
//! [`NormalizationWarning`]: types::NormalizationWarning
//! [`JobHandle`]: types::JobHandle

#![deny(unsafe_code)]

pub mod catalog;
pub mod client;
pub mod decode;
pub mod defaults;
pub mod error;
pub mod normalize;
pub mod poll;
pub mod profile;
pub mod retry;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod utils;

pub use client::GenClient;
pub use error::GenError;

/// One-stop import for the common surface.
///
/// ```rust
/// use anygen::prelude::*;
/// ```
pub mod prelude {
    // Client and the shapes it hands back
    pub use crate::client::{GenClient, GenClientBuilder, VideoJob, VideoSubmission};

    // Requests
    pub use crate::types::{ChatMessage, GenerationRequest, MessageRole, Modality};

    // Responses
    pub use crate::types::{
        CanonicalResult, GeneratedImage, GenerationResponse, ImageResult, NormalizationWarning,
        SpeechResult, TextResult, Usage, VideoResult,
    };

    // Errors
    pub use crate::error::{ErrorCategory, GenError};

    // Provider profiles
    pub use crate::profile::registry::{profile, register_profile};
    pub use crate::profile::{
        CompletionStyle, ModalitySupport, ProviderProfile, QuantizeRules, SizeOption,
    };

    // Deferred jobs
    pub use crate::poll::PollOptions;
    pub use crate::types::{JobHandle, JobState};
    pub use crate::utils::CancelHandle;

    // Model discovery
    pub use crate::catalog::{FetchOptions, ModelCatalog, ModelList, filter_by_capability};
    pub use crate::types::{ModelCapability, ModelInfo};

    // Transport tuning
    pub use crate::retry::{RetryOptions, RetryPolicy, retry_with};
    pub use crate::transport::HttpTransport;
}
