//! API integration tests against an in-memory video source and fake classifier.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use vwatch_api::{create_router, ApiConfig, AppState, SourceFactory};
use vwatch_media::{CapturedFrame, MediaResult, VideoMetadata, VideoSource};
use vwatch_ml_client::{
    ClassifierError, ClassifierResult, EventClassifier, MomentSummarizer,
};
use vwatch_models::{DetectionEvent, KeyMoment};
use vwatch_storage::{LibraryConfig, LibraryStore};
use vwatch_worker::{PipelineConfig, PipelineOrchestrator};

/// Sources with this path never finish loading, keeping their run in flight.
const HANGING_SOURCE: &str = "/videos/hanging.mp4";

fn jpeg() -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(16, 9))
        .write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Jpeg(80))
        .unwrap();
    buf
}

struct FakeSource {
    source: String,
    metadata: Option<VideoMetadata>,
    position: f64,
}

#[async_trait]
impl VideoSource for FakeSource {
    fn source_ref(&self) -> &str {
        &self.source
    }

    async fn load_metadata(&mut self) -> MediaResult<VideoMetadata> {
        if self.source == HANGING_SOURCE {
            std::future::pending::<()>().await;
        }
        let metadata = VideoMetadata {
            duration: Some(10.0),
            width: 16,
            height: 9,
        };
        self.metadata = Some(metadata);
        Ok(metadata)
    }

    fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    fn position(&self) -> f64 {
        self.position
    }

    async fn seek(&mut self, seconds: f64) -> MediaResult<()> {
        self.position = seconds;
        Ok(())
    }

    async fn render_frame(&mut self, _jpeg_qscale: u8) -> MediaResult<Vec<u8>> {
        Ok(jpeg())
    }
}

/// Sees a person at 00:03 and nothing elsewhere.
struct DoorCamClassifier;

#[async_trait]
impl EventClassifier for DoorCamClassifier {
    async fn classify(&self, frame: &CapturedFrame) -> ClassifierResult<Vec<DetectionEvent>> {
        if frame.offset.seconds() == 3.0 {
            Ok(vec![DetectionEvent::new("Person detected", true)])
        } else {
            Ok(Vec::new())
        }
    }
}

struct FakeSummarizer {
    available: bool,
}

#[async_trait]
impl MomentSummarizer for FakeSummarizer {
    async fn summarize(&self, moments: &[KeyMoment]) -> ClassifierResult<String> {
        if !self.available {
            return Err(ClassifierError::Status {
                status: 503,
                body: "summary model offline".into(),
            });
        }
        Ok(format!("{} moment(s) reviewed", moments.len()))
    }
}

struct TestApp {
    router: Router,
    _dir: TempDir,
}

async fn test_app(summarizer_available: bool) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let library = LibraryStore::open(LibraryConfig {
        path: dir.path().join("saved_videos.json"),
    })
    .await
    .unwrap();

    let pipeline = PipelineOrchestrator::new(
        PipelineConfig {
            sample_interval: 3.0,
            metadata_timeout: Duration::from_secs(30),
            ..Default::default()
        },
        Arc::new(DoorCamClassifier),
    )
    .unwrap();

    let sources: SourceFactory = Arc::new(|source: &str| -> Box<dyn VideoSource> {
        Box::new(FakeSource {
            source: source.to_string(),
            metadata: None,
            position: 0.0,
        })
    });

    let state = AppState::with_parts(
        ApiConfig::default(),
        Arc::new(pipeline),
        Arc::new(FakeSummarizer {
            available: summarizer_available,
        }),
        library,
    )
    .with_source_factory(sources);

    TestApp {
        router: create_router(state, None),
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn wait_for_completion(app: &Router) -> Value {
    for _ in 0..200 {
        let (status, run) = send(app, get("/api/runs/current")).await;
        assert_eq!(status, StatusCode::OK);
        if run["status"] == "completed" || run["status"] == "failed" {
            return run;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("run did not finish");
}

async fn analyze_and_save(app: &Router) -> Value {
    let (status, _) = send(
        app,
        post_json("/api/analyze", json!({"source": "/videos/front_door.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    wait_for_completion(app).await;

    let (status, saved) = send(
        app,
        post_json("/api/runs/current/save", json!({"name": "Front door"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    saved
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app(true).await;
    let (status, body) = send(&app.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_route_absent_without_recorder() {
    let app = test_app(true).await;
    let (status, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = test_app(true).await;
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_analyze_runs_to_completion() {
    let app = test_app(true).await;

    let (status, started) = send(
        &app.router,
        post_json("/api/analyze", json!({"source": "/videos/front_door.mp4"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(started["name"], "front_door.mp4");
    assert_eq!(started["status"], "pending");

    let run = wait_for_completion(&app.router).await;
    assert_eq!(run["status"], "completed");
    assert_eq!(run["progress"], 100);
    assert_eq!(run["framesSampled"], 4);
    assert_eq!(
        run["events"],
        json!([{"timestamp": "00:03", "description": "Person detected", "isDangerous": true}])
    );

    let run_id = run["runId"].as_str().unwrap().to_string();
    let (status, by_id) = send(&app.router, get(&format!("/api/runs/{}", run_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["runId"], run_id.as_str());
}

#[tokio::test]
async fn test_analyze_rejects_bad_sources() {
    let app = test_app(true).await;

    for source in ["", "   ", "ftp://example.com/a.mp4", "http://169.254.169.254/x"] {
        let (status, body) = send(&app.router, post_json("/api/analyze", json!({"source": source}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "source {:?}: {}", source, body);
    }

    let (status, _) = send(&app.router, get("/api/runs/current")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_new_analysis_supersedes_running_one() {
    let app = test_app(true).await;

    let (_, first) = send(&app.router, post_json("/api/analyze", json!({"source": HANGING_SOURCE}))).await;
    let first_id = first["runId"].as_str().unwrap().to_string();

    let (status, second) = send(
        &app.router,
        post_json("/api/analyze", json!({"source": "/videos/front_door.mp4", "name": "Second"})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_ne!(second["runId"], first["runId"]);

    let (status, body) = send(&app.router, get(&format!("/api/runs/{}", first_id))).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "run_superseded");

    let run = wait_for_completion(&app.router).await;
    assert_eq!(run["runId"], second["runId"]);
    assert_eq!(run["name"], "Second");

    let (status, _) = send(
        &app.router,
        get("/api/runs/550e8400-e29b-41d4-a716-446655440000"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_requires_completed_run() {
    let app = test_app(true).await;

    let (status, _) = send(&app.router, post_json("/api/runs/current/save", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app.router, post_json("/api/analyze", json!({"source": HANGING_SOURCE}))).await;
    let (status, body) = send(&app.router, post_json("/api/runs/current/save", json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "run_not_completed");

    let (status, _) = send(&app.router, get("/api/videos")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_save_and_browse_library() {
    let app = test_app(true).await;
    let saved = analyze_and_save(&app.router).await;

    assert_eq!(saved["name"], "Front door");
    assert_eq!(saved["sourceRef"], "/videos/front_door.mp4");
    assert_eq!(saved["timestamps"][0]["timestamp"], "00:03");

    // The saved run leaves the session
    let (status, _) = send(&app.router, get("/api/runs/current")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = send(&app.router, get("/api/videos")).await;
    assert_eq!(list["total"], 1);

    let (_, hits) = send(&app.router, get("/api/videos?q=PERSON")).await;
    assert_eq!(hits["total"], 1);
    let (_, misses) = send(&app.router, get("/api/videos?q=forklift")).await;
    assert_eq!(misses["total"], 0);

    let id = saved["id"].as_str().unwrap();
    let (status, fetched) = send(&app.router, get(&format!("/api/videos/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, saved);

    let (status, _) = send(&app.router, delete(&format!("/api/videos/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, get(&format!("/api/videos/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app.router, delete(&format!("/api/videos/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_statistics_and_export() {
    let app = test_app(true).await;
    analyze_and_save(&app.router).await;

    let (status, stats) = send(&app.router, get("/api/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["totalMoments"], 1);
    assert_eq!(stats["dangerousCount"], 1);
    assert_eq!(stats["safeCount"], 0);
    assert_eq!(stats["activeVideos"], 1);
    assert_eq!(stats["incidentsByVideo"], json!([{"name": "Front door", "incidents": 1}]));
    assert_eq!(stats["timeline"], json!([{"time": "00:00", "incidents": 1}]));

    let response = app
        .router
        .clone()
        .oneshot(get("/api/statistics/export"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("key_moments.csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Video Name,Timestamp,Description,Is Dangerous"));
    assert!(lines.next().unwrap().contains("\"Person detected\""));
}

#[tokio::test]
async fn test_summary() {
    let app = test_app(true).await;

    let (status, _) = send(&app.router, post_json("/api/statistics/summary", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    analyze_and_save(&app.router).await;
    let (status, body) = send(&app.router, post_json("/api/statistics/summary", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["summary"], "1 moment(s) reviewed");
    assert_eq!(body["momentCount"], 1);
}

#[tokio::test]
async fn test_summary_failure_is_bad_gateway() {
    let app = test_app(false).await;
    analyze_and_save(&app.router).await;

    let (status, body) = send(&app.router, post_json("/api/statistics/summary", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "classifier_unavailable");
    assert!(body["detail"].as_str().unwrap().contains("summary model offline"));
}
