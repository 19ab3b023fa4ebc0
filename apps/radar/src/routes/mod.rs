pub mod health;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::jobs::handlers::handle_fetch_jobs;
use crate::resumes::handlers::handle_upload_resume;
use crate::state::{JobFetcherState, ResumeAnalyzerState};

/// Largest accepted resume upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn health_router(service: &'static str) -> Router {
    Router::new().route("/health", get(move || health::health_handler(service)))
}

pub fn job_fetcher_router(state: JobFetcherState) -> Router {
    Router::new()
        .route("/fetch-jobs", post(handle_fetch_jobs))
        .with_state(state)
        .merge(health_router("job-fetcher"))
}

pub fn resume_analyzer_router(state: ResumeAnalyzerState) -> Router {
    Router::new()
        .route("/upload-resume", post(handle_upload_resume))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
        .merge(health_router("resume-analyzer"))
}

/// Binds `0.0.0.0:port` and serves `router` until the process exits.
pub async fn serve(router: Router, port: u16) -> Result<()> {
    let app = router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::bus::{InMemoryBus, MessageBus};
    use crate::jobs::source::RawJobPosting;
    use crate::jobs::{JobFetcher, JobQuery, JobSource, JobSourceError};
    use crate::models::{decode_payload, Channel, ResumeAvailable};
    use crate::resumes::{RegexSectionExtractor, ResumeAnalyzer};

    const BOUNDARY: &str = "radar-test-boundary";

    /// Echoes the query back as a single posting.
    struct EchoSource;

    #[async_trait]
    impl JobSource for EchoSource {
        async fn search(&self, query: &JobQuery) -> Result<Vec<RawJobPosting>, JobSourceError> {
            Ok(vec![RawJobPosting {
                id: "42".into(),
                title: query.keywords.clone(),
                location: query.location_id.clone(),
                description: "Build things".into(),
                ..Default::default()
            }])
        }
    }

    fn fetcher_app(bus: Arc<InMemoryBus>) -> Router {
        job_fetcher_router(JobFetcherState {
            fetcher: Arc::new(JobFetcher::new(Arc::new(EchoSource), None, bus)),
            default_query: JobQuery::new("Fullstack developer", "101282230"),
        })
    }

    fn analyzer_app(bus: Arc<InMemoryBus>) -> Router {
        resume_analyzer_router(ResumeAnalyzerState {
            analyzer: Arc::new(ResumeAnalyzer::new(
                Arc::new(RegexSectionExtractor),
                None,
                bus,
            )),
        })
    }

    fn multipart_request(field: &str, file_name: &str, content: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             {content}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/upload-resume")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = health_router("notifier")
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "notifier");
    }

    #[tokio::test]
    async fn test_upload_without_resume_field_is_bad_request() {
        let response = analyzer_app(Arc::new(InMemoryBus::new()))
            .oneshot(multipart_request("cover_letter", "letter.txt", "Hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_of_blank_file_is_bad_request() {
        let response = analyzer_app(Arc::new(InMemoryBus::new()))
            .oneshot(multipart_request("resume", "cv.txt", "   "))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_publishes_resume() {
        let bus = Arc::new(InMemoryBus::new());
        let mut rx = bus.subscribe_raw(&[Channel::Resume]).await.unwrap();

        let response = analyzer_app(bus.clone())
            .oneshot(multipart_request(
                "resume",
                "cv.txt",
                "Jane Doe\njane@example.com\nRust engineer",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["personalInformation"]["email"], "jane@example.com");

        let published: ResumeAvailable =
            decode_payload(&rx.recv().await.unwrap().payload).unwrap();
        assert_eq!(body["id"], published.id.as_str());
        assert!(published.content.unwrap().contains("Rust engineer"));
    }

    #[tokio::test]
    async fn test_upload_with_bus_down_is_service_unavailable() {
        let bus = Arc::new(InMemoryBus::new());
        bus.set_connected(false);
        let response = analyzer_app(bus)
            .oneshot(multipart_request("resume", "cv.txt", "Jane Doe"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_fetch_jobs_uses_default_query_without_body() {
        let response = fetcher_app(Arc::new(InMemoryBus::new()))
            .oneshot(
                Request::post("/fetch-jobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["fetched"], 1);
        assert_eq!(body["published"], 1);
        assert_eq!(body["jobs"][0]["title"], "Fullstack developer");
        assert_eq!(body["jobs"][0]["jobSourceId"], "42");
    }

    #[tokio::test]
    async fn test_fetch_jobs_applies_overrides() {
        let response = fetcher_app(Arc::new(InMemoryBus::new()))
            .oneshot(
                Request::post("/fetch-jobs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"keywords": "Rust engineer", "locationId": "90000084"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["jobs"][0]["title"], "Rust engineer");
        assert_eq!(body["jobs"][0]["location"], "90000084");
    }

    #[tokio::test]
    async fn test_fetch_jobs_rejects_mistyped_overrides() {
        let bus = Arc::new(InMemoryBus::new());
        let mut rx = bus.subscribe_raw(&[Channel::Job]).await.unwrap();
        let response = fetcher_app(bus)
            .oneshot(
                Request::post("/fetch-jobs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"keywords": "Rust engineer", "locationId": 90000084}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        // No search ran, so nothing was published.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fetch_jobs_rejects_malformed_json() {
        let response = fetcher_app(Arc::new(InMemoryBus::new()))
            .oneshot(
                Request::post("/fetch-jobs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"keywords": "#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fetch_jobs_empty_json_body_uses_default_query() {
        let response = fetcher_app(Arc::new(InMemoryBus::new()))
            .oneshot(
                Request::post("/fetch-jobs")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["jobs"][0]["title"], "Fullstack developer");
    }
}
