//! Response decoding
//!
//! Turns 2xx provider bodies into canonical results. HTTP-level error
//! classification happens in the transport; by the time a body reaches
//! this module the status was success, so the only failures here are
//! shape problems, surfaced as `ParseError` with a body excerpt rather
//! than a panic or a retry.
//!
//! Video submissions are ambiguous on the wire: some targets answer
//! with a finished clip, some with a job reference, and both arrive as
//! 200. The split is decided by the presence of a job-identifier field
//! in the payload, never by status code.

use serde_json::Value;

use crate::error::GenError;
use crate::types::job::{JobHandle, JobOutput, JobState};
use crate::types::models::ModelInfo;
use crate::types::response::{
    GeneratedImage, ImageResult, SpeechResult, TextResult, Usage, VideoResult,
};
use crate::utils::{excerpt, join_url};

/// Outcome of decoding a video submission response
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedVideo {
    /// The response already carried the finished clip
    Complete(VideoResult),
    /// The response carried a job reference to poll
    Job(JobHandle),
}

/// Decode a chat completion body.
pub fn decode_text(raw: Value) -> Result<TextResult, GenError> {
    let content = raw
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"));

    let text = match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .find_map(|part| {
                part.get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_default(),
        _ => {
            return Err(GenError::ParseError(format!(
                "chat completion has no message content: {}",
                excerpt(&raw.to_string())
            )));
        }
    };

    let model = raw.get("model").and_then(Value::as_str).map(str::to_string);
    let usage = raw
        .get("usage")
        .cloned()
        .and_then(|u| serde_json::from_value::<Usage>(u).ok());

    Ok(TextResult {
        text,
        model,
        usage,
        raw,
    })
}

/// Decode an image generation body.
pub fn decode_image(raw: Value) -> Result<ImageResult, GenError> {
    let Some(data) = raw.get("data").and_then(Value::as_array) else {
        return Err(GenError::ParseError(format!(
            "image response has no data array: {}",
            excerpt(&raw.to_string())
        )));
    };

    let images: Vec<GeneratedImage> = data
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .filter(|image: &GeneratedImage| image.url.is_some() || image.b64_json.is_some())
        .collect();

    Ok(ImageResult { images, raw })
}

/// Decode a speech synthesis body, sniffing the container format from
/// the leading bytes and falling back to what was requested.
pub fn decode_speech(audio: Vec<u8>, requested_format: Option<&str>) -> SpeechResult {
    let format = infer::get(&audio)
        .map(|kind| kind.extension().to_string())
        .or_else(|| requested_format.map(str::to_string));
    SpeechResult { audio, format }
}

/// Decode a video submission body into either a finished result or a
/// job handle. The handle's status URL comes from filling the job id
/// into `status_template` (`videos/{id}` style) under the base URL.
pub fn decode_video_submission(
    provider: &str,
    raw: Value,
    base_url: &str,
    status_template: &str,
) -> Result<DecodedVideo, GenError> {
    let video_url = extract_video_url(&raw);

    let Some(job_id) = extract_job_id(&raw) else {
        // No job reference: this target answered synchronously.
        return match video_url {
            Some(video_url) => Ok(DecodedVideo::Complete(VideoResult { video_url, raw })),
            None => Err(GenError::ParseError(format!(
                "video response carries neither a job id nor a video URL: {}",
                excerpt(&raw.to_string())
            ))),
        };
    };

    let status_url = join_url(base_url, &status_template.replace("{id}", &job_id));
    let state = match raw.get("status").and_then(Value::as_str) {
        Some(status) => map_job_status(provider, status, &raw),
        // Accepted without a status field: a URL means it already
        // finished, otherwise assume it is waiting to start.
        None => match video_url {
            Some(video_url) => JobState::Completed {
                output: JobOutput {
                    video_url: Some(video_url),
                    raw: raw.clone(),
                },
            },
            None => JobState::Queued,
        },
    };

    Ok(DecodedVideo::Job(JobHandle::with_state(
        job_id, status_url, state,
    )))
}

/// Decode a job status body into the state it reports.
pub fn decode_job_status(provider: &str, raw: &Value) -> JobState {
    match raw.get("status").and_then(Value::as_str) {
        Some(status) => map_job_status(provider, status, raw),
        None => match extract_video_url(raw) {
            Some(video_url) => JobState::Completed {
                output: JobOutput {
                    video_url: Some(video_url),
                    raw: raw.clone(),
                },
            },
            None => JobState::Queued,
        },
    }
}

/// Decode a model listing body, accepting both the OpenAI envelope
/// `{"data": [...]}` and a bare array.
pub fn decode_models(raw: &Value) -> Result<Vec<ModelInfo>, GenError> {
    let entries = match raw.get("data").and_then(Value::as_array) {
        Some(data) => data,
        None => raw.as_array().ok_or_else(|| {
            GenError::ParseError(format!(
                "model listing has no data array: {}",
                excerpt(&raw.to_string())
            ))
        })?,
    };

    Ok(entries
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect())
}

fn extract_job_id(raw: &Value) -> Option<String> {
    ["id", "task_id", "job_id"].iter().find_map(|field| {
        match raw.get(*field) {
            Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        }
    })
}

fn extract_video_url(raw: &Value) -> Option<String> {
    if let Some(url) = raw.get("video_url").and_then(Value::as_str) {
        return Some(url.to_string());
    }
    if let Some(url) = raw
        .get("video")
        .and_then(|video| video.get("url"))
        .and_then(Value::as_str)
    {
        return Some(url.to_string());
    }
    raw.get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|entry| entry.get("url"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn job_error_message(raw: &Value) -> String {
    raw.get("error")
        .and_then(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
        })
        .or_else(|| raw.get("message").and_then(Value::as_str))
        .unwrap_or("job failed without a reported reason")
        .to_string()
}

// Status vocabularies differ per provider; match leniently and treat
// anything unrecognized as still running, bounded by the poller's
// deadline.
fn map_job_status(provider: &str, status: &str, raw: &Value) -> JobState {
    let normalized = status.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "completed" | "succeeded" | "success" | "done" => JobState::Completed {
            output: JobOutput {
                video_url: extract_video_url(raw),
                raw: raw.clone(),
            },
        },
        "failed" | "error" | "failure" => JobState::Failed {
            error: Box::new(GenError::provider_error(
                provider,
                200,
                job_error_message(raw),
                Some(excerpt(&raw.to_string())),
            )),
        },
        "queued" | "pending" | "submitted" | "starting" | "created" => JobState::Queued,
        other if other.starts_with("cancel") => JobState::Failed {
            error: Box::new(GenError::provider_error(
                provider,
                200,
                "provider reported the job cancelled",
                Some(excerpt(&raw.to_string())),
            )),
        },
        _ => JobState::Processing,
    }
}
