//! Client facade
//!
//! [`GenClient`] ties the pipeline together for one provider target:
//! normalize the request against the profile, send it through the
//! transport, decode the response, and for job-style video targets
//! drive the poller until the job is terminal. One client per target;
//! clients on different targets are fully independent.
//!
//! ## Example
//!
//! ```rust,no_run
//! use anygen::client::GenClient;
//! use anygen::types::chat::ChatMessage;
//! use anygen::types::request::GenerationRequest;
//!
//! # async fn run() -> Result<(), anygen::error::GenError> {
//! let client = GenClient::builder("openai")?.api_key("sk-...").build()?;
//! let request = GenerationRequest::text("gpt-4o", vec![ChatMessage::user("hello")])
//!     .temperature(0.7)
//!     .build()?;
//! let response = client.chat(&request).await?;
//! println!("{}", response.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use uuid::Uuid;

use crate::catalog::{FetchOptions, ModelCatalog, ModelList};
use crate::decode::{
    DecodedVideo, decode_image, decode_job_status, decode_models, decode_speech, decode_text,
    decode_video_submission,
};
use crate::defaults;
use crate::error::GenError;
use crate::normalize::normalize;
use crate::poll::{self, JobStatusSource, PollOptions};
use crate::profile::{ModalitySupport, ProviderProfile, registry};
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;
use crate::types::job::{JobHandle, JobState};
use crate::types::request::{GenerationRequest, Modality};
use crate::types::response::{
    CanonicalResult, GenerationResponse, NormalizationWarning, VideoResult,
};
use crate::utils::join_url;

/// Status path polled when a target declared synchronous answers with a
/// job reference anyway.
const FALLBACK_STATUS_TEMPLATE: &str = "videos/{id}";

/// Outcome of a video submission
#[derive(Debug, Clone)]
pub enum VideoSubmission {
    /// The target answered with a finished clip; nothing to poll
    Complete(GenerationResponse),
    /// The target accepted an asynchronous job
    Job(VideoJob),
}

/// An accepted asynchronous video job, ready to poll
#[derive(Debug, Clone)]
pub struct VideoJob {
    /// Handle polled until the job is terminal
    pub handle: JobHandle,
    /// Warnings accumulated while normalizing the request
    pub warnings: Vec<NormalizationWarning>,
    /// Client-assigned id correlating log events for this submission
    pub request_id: Uuid,
}

/// Client for one OpenAI-compatible generation target
pub struct GenClient {
    profile: ProviderProfile,
    transport: HttpTransport,
    catalog: ModelCatalog,
    poll_options: PollOptions,
}

impl GenClient {
    /// Start a builder from a profile registered under `provider_id`.
    pub fn builder(provider_id: &str) -> Result<GenClientBuilder, GenError> {
        Ok(GenClientBuilder::new(registry::profile(provider_id)?))
    }

    /// Start a builder from an explicit profile.
    pub fn from_profile(profile: ProviderProfile) -> GenClientBuilder {
        GenClientBuilder::new(profile)
    }

    /// The profile this client targets.
    pub const fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// The poll options applied when no explicit options are given.
    pub const fn poll_options(&self) -> &PollOptions {
        &self.poll_options
    }

    /// Run a chat completion.
    pub async fn chat(&self, request: &GenerationRequest) -> Result<GenerationResponse, GenError> {
        expect_modality(request, Modality::Text)?;
        let support = self.support(Modality::Text)?;
        let normalized = normalize(request, &self.profile)?;
        let request_id = self.announce(Modality::Text, &normalized.warnings);

        let url = join_url(&self.profile.base_url, &support.endpoint);
        let raw = self.transport.post_json(&url, &normalized.to_value()).await?;
        let result = decode_text(raw)?;

        Ok(GenerationResponse {
            result: CanonicalResult::Text(result),
            warnings: normalized.warnings,
            request_id,
        })
    }

    /// Generate one or more images.
    pub async fn generate_image(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenError> {
        expect_modality(request, Modality::Image)?;
        let support = self.support(Modality::Image)?;
        let normalized = normalize(request, &self.profile)?;
        let request_id = self.announce(Modality::Image, &normalized.warnings);

        let url = join_url(&self.profile.base_url, &support.endpoint);
        let raw = self.transport.post_json(&url, &normalized.to_value()).await?;
        let result = decode_image(raw)?;

        Ok(GenerationResponse {
            result: CanonicalResult::Image(result),
            warnings: normalized.warnings,
            request_id,
        })
    }

    /// Synthesize speech, returning the raw audio with a sniffed format
    /// label.
    pub async fn generate_speech(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenError> {
        expect_modality(request, Modality::Speech)?;
        let support = self.support(Modality::Speech)?;
        let normalized = normalize(request, &self.profile)?;
        let request_id = self.announce(Modality::Speech, &normalized.warnings);

        // Fall back to the format actually sent, not the one requested:
        // if the profile dropped `response_format` the target used its own
        // default and the caller's label would be wrong.
        let requested_format = normalized
            .body
            .get("response_format")
            .and_then(Value::as_str)
            .map(str::to_string);

        let url = join_url(&self.profile.base_url, &support.endpoint);
        let audio = self.transport.post_binary(&url, &normalized.to_value()).await?;
        let result = decode_speech(audio, requested_format.as_deref());

        Ok(GenerationResponse {
            result: CanonicalResult::Speech(result),
            warnings: normalized.warnings,
            request_id,
        })
    }

    /// Submit a video generation request without waiting for completion.
    ///
    /// Whether the target answered synchronously is decided by the
    /// response payload, not the profile: a body carrying a job id yields
    /// [`VideoSubmission::Job`] even from a target declared synchronous,
    /// in which case the conventional `videos/{id}` status path is polled.
    pub async fn submit_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<VideoSubmission, GenError> {
        expect_modality(request, Modality::Video)?;
        let support = self.support(Modality::Video)?;
        let normalized = normalize(request, &self.profile)?;
        let request_id = self.announce(Modality::Video, &normalized.warnings);

        let url = join_url(&self.profile.base_url, &support.endpoint);
        let template = support
            .status_template()
            .unwrap_or(FALLBACK_STATUS_TEMPLATE)
            .to_string();
        let raw = self.transport.post_json(&url, &normalized.to_value()).await?;

        match decode_video_submission(&self.profile.id, raw, &self.profile.base_url, &template)? {
            DecodedVideo::Complete(result) => Ok(VideoSubmission::Complete(GenerationResponse {
                result: CanonicalResult::Video(result),
                warnings: normalized.warnings,
                request_id,
            })),
            DecodedVideo::Job(handle) => {
                tracing::info!(
                    target: "anygen::poll",
                    provider = %self.profile.id,
                    request_id = %request_id,
                    job_id = handle.id(),
                    state = handle.state().name(),
                    "video job accepted"
                );
                Ok(VideoSubmission::Job(VideoJob {
                    handle,
                    warnings: normalized.warnings,
                    request_id,
                }))
            }
        }
    }

    /// Poll a video job until terminal, using the client's default poll
    /// options.
    pub async fn wait_video(&self, handle: &mut JobHandle) -> Result<JobState, GenError> {
        let options = self.poll_options.clone();
        self.wait_video_with(handle, &options).await
    }

    /// Poll a video job until terminal with explicit poll options.
    pub async fn wait_video_with(
        &self,
        handle: &mut JobHandle,
        options: &PollOptions,
    ) -> Result<JobState, GenError> {
        poll::wait(self, handle, options).await
    }

    /// Generate a video end to end: submit, then poll until terminal with
    /// the client's default poll options.
    ///
    /// Unlike [`GenClient::wait_video`], poller-local outcomes fail here:
    /// `TimedOut` becomes a timeout error and `Cancelled` a cancellation
    /// error, so the caller always gets either a clip or an error.
    pub async fn generate_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenError> {
        let options = self.poll_options.clone();
        self.generate_video_with(request, &options).await
    }

    /// Generate a video end to end with explicit poll options.
    pub async fn generate_video_with(
        &self,
        request: &GenerationRequest,
        options: &PollOptions,
    ) -> Result<GenerationResponse, GenError> {
        match self.submit_video(request).await? {
            VideoSubmission::Complete(response) => Ok(response),
            VideoSubmission::Job(mut job) => {
                let state = self.wait_video_with(&mut job.handle, options).await?;
                let result = finished_video(&job.handle, state)?;
                Ok(GenerationResponse {
                    result: CanonicalResult::Video(result),
                    warnings: job.warnings,
                    request_id: job.request_id,
                })
            }
        }
    }

    /// List the target's advertised models, served from the cache while
    /// fresh.
    pub async fn list_models(&self) -> Result<ModelList, GenError> {
        self.list_models_with(FetchOptions::new()).await
    }

    /// List models with explicit fetch options.
    pub async fn list_models_with(&self, options: FetchOptions) -> Result<ModelList, GenError> {
        let url = join_url(&self.profile.base_url, "models");
        self.catalog
            .get_models(&self.profile.id, options, || async move {
                let raw = self.transport.get_json(&url).await?;
                decode_models(&raw)
            })
            .await
    }

    /// Drop this target's cached model listing. Returns whether an entry
    /// existed.
    pub async fn invalidate_models(&self) -> bool {
        self.catalog.invalidate(&self.profile.id).await
    }

    fn support(&self, modality: Modality) -> Result<&ModalitySupport, GenError> {
        self.profile.support(modality).ok_or_else(|| {
            GenError::UnsupportedOperation(format!(
                "profile `{}` does not support {modality} generation",
                self.profile.id
            ))
        })
    }

    // Assigns the submission's correlation id and surfaces normalization
    // warnings in the log, so nothing is altered silently.
    fn announce(&self, modality: Modality, warnings: &[NormalizationWarning]) -> Uuid {
        let request_id = Uuid::new_v4();
        tracing::debug!(
            provider = %self.profile.id,
            request_id = %request_id,
            %modality,
            "submitting generation request"
        );
        for warning in warnings {
            tracing::warn!(
                provider = %self.profile.id,
                request_id = %request_id,
                %warning,
                "request adjusted for target"
            );
        }
        request_id
    }
}

#[async_trait]
impl JobStatusSource for GenClient {
    async fn poll_status(&self, handle: &JobHandle) -> Result<JobState, GenError> {
        let raw = self.transport.get_json(handle.status_url()).await?;
        Ok(decode_job_status(&self.profile.id, &raw))
    }
}

fn expect_modality(request: &GenerationRequest, expected: Modality) -> Result<(), GenError> {
    let actual = request.modality();
    if actual != expected {
        return Err(GenError::InvalidInput(format!(
            "expected a {expected} request, got {actual}"
        )));
    }
    Ok(())
}

fn finished_video(handle: &JobHandle, state: JobState) -> Result<VideoResult, GenError> {
    match state {
        JobState::Completed { output } => match output.video_url {
            Some(video_url) => Ok(VideoResult {
                video_url,
                raw: output.raw,
            }),
            None => Err(GenError::ParseError(format!(
                "video job `{}` completed without a video URL",
                handle.id()
            ))),
        },
        JobState::Failed { error } => Err(*error),
        JobState::TimedOut => Err(GenError::TimeoutError(format!(
            "video job `{}` did not finish within the wait budget",
            handle.id()
        ))),
        JobState::Cancelled => Err(GenError::Cancelled(format!(
            "wait for video job `{}` was cancelled",
            handle.id()
        ))),
        // `wait` only returns terminal states.
        JobState::Queued | JobState::Processing => Err(GenError::TimeoutError(format!(
            "video job `{}` is still running",
            handle.id()
        ))),
    }
}

/// Builder for [`GenClient`]
#[derive(Debug, Clone)]
pub struct GenClientBuilder {
    profile: ProviderProfile,
    timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    poll_options: Option<PollOptions>,
    http_client: Option<reqwest::Client>,
}

impl GenClientBuilder {
    fn new(profile: ProviderProfile) -> Self {
        Self {
            profile,
            timeout: None,
            retry_policy: None,
            poll_options: None,
            http_client: None,
        }
    }

    /// Set the bearer token, overriding the profile's key and its
    /// environment fallback.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.profile.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Override the profile's base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.profile.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout. Ignored when a pre-configured HTTP
    /// client is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the retry policy applied by the transport.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Set the poll options applied when waiting on video jobs without
    /// explicit options.
    pub fn poll_options(mut self, options: PollOptions) -> Self {
        self.poll_options = Some(options);
        self
    }

    /// Supply a pre-configured `reqwest` client, keeping its timeout and
    /// TLS settings.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validate the profile and build the client.
    ///
    /// The bearer token resolves in order: an explicit
    /// [`GenClientBuilder::api_key`], the profile's own key, then the
    /// environment variable the profile names. No key at all is valid;
    /// requests then go out without an `Authorization` header.
    pub fn build(self) -> Result<GenClient, GenError> {
        let profile = self.profile;
        profile.validate()?;

        let api_key = profile.api_key.clone().or_else(|| {
            profile
                .api_key_env
                .as_deref()
                .and_then(|variable| std::env::var(variable).ok())
                .filter(|key| !key.is_empty())
                .map(SecretString::from)
        });

        let policy = self.retry_policy.unwrap_or_default();
        let transport = match self.http_client {
            Some(client) => HttpTransport::with_client(client, &profile.id, api_key, policy),
            None => HttpTransport::new(
                &profile.id,
                api_key,
                policy,
                self.timeout.unwrap_or(defaults::http::REQUEST_TIMEOUT),
            )?,
        };

        Ok(GenClient {
            profile,
            transport,
            catalog: ModelCatalog::new(),
            poll_options: self.poll_options.unwrap_or_default(),
        })
    }
}
