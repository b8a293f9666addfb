//! Video job lifecycle tests: submission, polling, and the convenience
//! wrapper that hides the wait.
//!
//! wiremock does real socket I/O, so these run on real time with a short
//! poll interval instead of tokio's paused clock.

use std::time::Duration;

use anygen::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_poll() -> PollOptions {
    PollOptions::new()
        .with_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_secs(5))
}

fn video_client(server: &MockServer) -> GenClient {
    GenClient::builder("openai")
        .unwrap()
        .base_url(server.uri())
        .api_key("test-api-key")
        .poll_options(fast_poll())
        .build()
        .unwrap()
}

fn video_request() -> GenerationRequest {
    GenerationRequest::video("sora-2", "a paper boat crossing a puddle")
        .duration(8)
        .build()
        .unwrap()
}

/// Queues one `in_progress` status answer, then `completed` with a URL.
async fn mount_status_sequence(server: &MockServer, job_id: &str, video_url: &str) {
    let status_path = format!("/videos/{job_id}");
    Mock::given(method("GET"))
        .and(path(status_path.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": job_id,
            "status": "in_progress"
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(status_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": job_id,
            "status": "completed",
            "video": {"url": video_url}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn submissions_come_back_as_pollable_jobs() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .and(body_partial_json(json!({
            "model": "sora-2",
            "prompt": "a paper boat crossing a puddle",
            "duration": 8
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_123",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_status_sequence(&server, "video_123", "https://cdn.example.com/video_123.mp4").await;

    let client = video_client(&server);
    let submission = client.submit_video(&video_request()).await.unwrap();
    let VideoSubmission::Job(mut job) = submission else {
        panic!("expected a job submission");
    };
    assert_eq!(job.handle.id(), "video_123");
    assert_eq!(job.handle.state(), &JobState::Queued);
    assert!(job.handle.status_url().ends_with("/videos/video_123"));

    let state = client
        .wait_video_with(&mut job.handle, &fast_poll())
        .await
        .unwrap();
    assert!(matches!(state, JobState::Completed { .. }));
    assert!(job.handle.state().is_terminal());
}

#[tokio::test]
async fn generate_video_waits_for_the_rendered_clip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_456",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_status_sequence(&server, "video_456", "https://cdn.example.com/video_456.mp4").await;

    let client = video_client(&server);
    let response = client.generate_video(&video_request()).await.unwrap();
    assert_eq!(
        response.video_url(),
        Some("https://cdn.example.com/video_456.mp4")
    );
}

#[tokio::test]
async fn failed_jobs_surface_the_provider_report() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_789",
            "status": "queued"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/video_789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_789",
            "status": "failed",
            "error": {"message": "content policy violation"}
        })))
        .mount(&server)
        .await;

    let client = video_client(&server);
    let error = client.generate_video(&video_request()).await.unwrap_err();
    assert!(matches!(error, GenError::ProviderError { .. }));
    assert!(error.to_string().contains("content policy violation"));
}

#[tokio::test]
async fn exhausted_wait_budgets_time_out_without_poisoning_the_handle() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_slow",
            "status": "queued"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos/video_slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "video_slow",
            "status": "in_progress"
        })))
        .mount(&server)
        .await;

    let client = video_client(&server);
    let VideoSubmission::Job(mut job) = client.submit_video(&video_request()).await.unwrap()
    else {
        panic!("expected a job submission");
    };

    let options = PollOptions::new()
        .with_interval(Duration::from_millis(10))
        .with_max_wait(Duration::from_millis(35));
    let state = client
        .wait_video_with(&mut job.handle, &options)
        .await
        .unwrap();

    assert_eq!(state, JobState::TimedOut);
    // Only provider-observed states land in the handle; a later wait can
    // resume right where this one gave up.
    assert_eq!(job.handle.state(), &JobState::Processing);
}

#[tokio::test]
async fn job_declared_targets_may_still_answer_inline() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": {"url": "https://cdn.example.com/inline.mp4"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = video_client(&server);
    let submission = client.submit_video(&video_request()).await.unwrap();
    let VideoSubmission::Complete(response) = submission else {
        panic!("expected an inline completion");
    };
    assert_eq!(
        response.video_url(),
        Some("https://cdn.example.com/inline.mp4")
    );
}

#[tokio::test]
async fn sync_declared_targets_returning_job_ids_poll_the_conventional_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "task-9",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut profile = ProviderProfile::openai_compatible("local", server.uri());
    if let Some(video) = profile.modalities.get_mut(&Modality::Video) {
        video.completion = CompletionStyle::Sync;
    }

    let client = GenClient::from_profile(profile).build().unwrap();
    let VideoSubmission::Job(job) = client.submit_video(&video_request()).await.unwrap() else {
        panic!("expected a job submission");
    };
    assert!(job.handle.status_url().ends_with("/videos/task-9"));
}

#[tokio::test]
async fn quantized_video_parameters_carry_their_warnings_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/videos/create"))
        .and(body_partial_json(json!({"duration": 4})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video": {"url": "https://cdn.example.com/short.mp4"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = video_client(&server);
    let request = GenerationRequest::video("sora-2", "a paper boat crossing a puddle")
        .duration(5)
        .build()
        .unwrap();

    let VideoSubmission::Complete(response) = client.submit_video(&request).await.unwrap() else {
        panic!("expected an inline completion");
    };
    assert_eq!(
        response.warnings,
        vec![NormalizationWarning::Quantized {
            field: "duration".to_string(),
            requested: json!(5),
            applied: json!(4)
        }]
    );
}
