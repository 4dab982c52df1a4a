//! Sightline API Server
//!
//! REST server exposing the frame analysis pipeline: per-frame scene
//! analysis, question answering, distance calibration and text reading.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
pub mod rate_limit;
mod routes;
mod settings;

pub use error::ApiError;
pub use rate_limit::RateLimitConfig;
pub use settings::Settings;

use captioning::{MockCaptioner, SceneCaptioner};
use perception::{MockDetector, ObjectDetector};
use pipeline::{AnalysisPipeline, PipelineConfig};
use rate_limit::create_governor_config;
use text_recognition::{LanguageSet, ReaderProvider, RecognitionError, TextRecognizer};

/// Uploaded frames from phone cameras exceed axum's 2 MB default body cap
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application state shared across handlers
pub struct AppState {
    /// Analysis pipeline
    pub pipeline: Arc<AnalysisPipeline>,
    /// Version string
    pub version: String,
}

impl AppState {
    /// Create new application state
    pub fn new(pipeline: Arc<AnalysisPipeline>) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Create the application router
///
/// Frame-accepting endpoints share the standard rate tier; calibration
/// endpoints mutate persisted state and get a stricter one. `/health`
/// and `/get_calib_K` are cheap reads and stay unthrottled.
pub fn create_router(state: Arc<AppState>, rate_limit: &RateLimitConfig) -> Router {
    let standard = create_governor_config(rate_limit);
    let strict = create_governor_config(&RateLimitConfig::strict());

    let frame_routes = Router::new()
        .route("/analyze_frame", post(routes::analyze::analyze_frame))
        .route("/question", post(routes::question::ask_question))
        .route("/ocr", post(routes::ocr::read_text))
        .layer(GovernorLayer { config: standard });

    let calibration_routes = Router::new()
        .route("/calibrate", post(routes::calibrate::calibrate))
        .route("/reset_calib", post(routes::calibrate::reset_calibration))
        .layer(GovernorLayer { config: strict });

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/get_calib_K", get(routes::calibrate::get_calibration))
        .merge(frame_routes)
        .merge(calibration_routes)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Install the process-wide Prometheus recorder
pub fn install_metrics_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install metrics recorder")
}

/// Reader provider used until real OCR weights are wired in
struct UnloadedReaderProvider;

impl ReaderProvider for UnloadedReaderProvider {
    fn create(
        &self,
        languages: &LanguageSet,
    ) -> Result<Arc<dyn TextRecognizer>, RecognitionError> {
        Err(RecognitionError::Unavailable(languages.to_string()))
    }
}

/// Build the pipeline with stand-in model delegates
///
/// Real detector, captioner and OCR bindings plug in here once their
/// runtimes are linked. The stand-ins keep every endpoint serving: no
/// detections, caption fallback to navigation text, OCR reporting the
/// model as unavailable.
pub fn build_pipeline(config: &PipelineConfig) -> Arc<AnalysisPipeline> {
    let detector: Arc<dyn ObjectDetector> = Arc::new(MockDetector::empty());
    let captioner: Arc<dyn SceneCaptioner> = Arc::new(MockCaptioner::unavailable());
    let readers: Arc<dyn ReaderProvider> = Arc::new(UnloadedReaderProvider);
    Arc::new(AnalysisPipeline::new(config, detector, captioner, readers))
}

/// Run the server
pub async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let recorder = install_metrics_recorder();

    let pipeline = build_pipeline(&settings.pipeline);
    // Reader warmup loads models; keep it off the async runtime
    let warm = pipeline.clone();
    tokio::task::spawn_blocking(move || warm.warm_readers());

    let state = Arc::new(AppState::new(pipeline));
    let app = create_router(state, &settings.rate_limit)
        .route("/metrics", get(move || async move { recorder.render() }));

    info!("Starting API server on {}", settings.bind_addr);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibration::CalibrationConfig;
    use perception::RawDetection;
    use reqwest::multipart::{Form, Part};
    use serde_json::Value;
    use tempfile::TempDir;
    use text_recognition::{MockProvider, RecognizedLine};

    fn png_bytes() -> Vec<u8> {
        let image = image::RgbImage::from_pixel(320, 240, image::Rgb([127, 127, 127]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        bytes.into_inner()
    }

    fn person() -> RawDetection {
        RawDetection::new([100, 100, 200, 200], "person", 0.9)
    }

    fn exit_sign() -> RecognizedLine {
        RecognizedLine {
            region: [0, 0, 100, 30],
            text: "EXIT".to_string(),
            confidence: 0.9,
        }
    }

    fn test_pipeline(
        dir: &TempDir,
        detections: Vec<RawDetection>,
        provider: MockProvider,
    ) -> Arc<AnalysisPipeline> {
        let config = PipelineConfig {
            calibration: CalibrationConfig {
                store_path: dir.path().join("calib_K.json"),
            },
            ..PipelineConfig::default()
        };
        Arc::new(AnalysisPipeline::new(
            &config,
            Arc::new(MockDetector::new(detections)),
            Arc::new(MockCaptioner::unavailable()),
            Arc::new(provider),
        ))
    }

    async fn spawn_app(pipeline: Arc<AnalysisPipeline>) -> String {
        let state = Arc::new(AppState::new(pipeline));
        // Generous quota so tests never trip the limiter
        let rate = RateLimitConfig {
            replenish_ms: 1,
            burst_size: 1000,
        };
        let app = create_router(state, &rate);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .await
            .unwrap();
        });
        format!("http://{}", addr)
    }

    fn frame_form() -> Form {
        Form::new().part("frame", Part::bytes(png_bytes()).file_name("frame.jpg"))
    }

    #[tokio::test]
    async fn test_health_reports_status() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![person()], MockProvider::new(vec![]))).await;

        let body: Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["calibrated"], false);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_analyze_frame_round_trip() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![person()], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/analyze_frame", base))
            .multipart(frame_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["has_objects"], true);
        assert_eq!(body["detections"][0]["class"], "person");
        assert_eq!(body["detections"][0]["distance_str"], "?");
        assert!(body["K_value"].is_null());
        assert_eq!(body["wall_info"]["detected"], false);
        assert!(body.get("wall_alert").is_none());
        assert!(body["caption"].as_str().unwrap().starts_with("Navigation:"));
    }

    #[tokio::test]
    async fn test_analyze_frame_requires_frame() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/analyze_frame", base))
            .multipart(Form::new().text("unrelated", "field"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No frame provided");
    }

    #[tokio::test]
    async fn test_analyze_frame_rejects_bad_image() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let form = Form::new().part(
            "frame",
            Part::bytes(b"not an image".to_vec()).file_name("frame.jpg"),
        );
        let response = client
            .post(format!("{}/analyze_frame", base))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid image");
    }

    #[tokio::test]
    async fn test_question_answered_from_detections() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![person()], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/question", base))
            .multipart(frame_form().text("question", "what do you see"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["question"], "what do you see");
        assert_eq!(body["answer"], "I can see: person.");
    }

    #[tokio::test]
    async fn test_question_requires_both_fields() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/question", base))
            .multipart(frame_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Missing frame or question");

        let response = client
            .post(format!("{}/question", base))
            .multipart(Form::new().text("question", "what do you see"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Missing frame or question");
    }

    #[tokio::test]
    async fn test_calibration_flow() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![person()], MockProvider::new(vec![]))).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/calibrate", base))
            .multipart(frame_form().text("distance_m", "2.0"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["K"], 200.0);
        assert_eq!(body["bbox_height"], 100);
        assert_eq!(body["distance_m"], 2.0);

        let body: Value = reqwest::get(format!("{}/get_calib_K", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["K"], 200.0);
        assert_eq!(body["is_calibrated"], true);

        let response = client
            .post(format!("{}/reset_calib", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert!(body["K"].is_null());

        let body: Value = reqwest::get(format!("{}/get_calib_K", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["is_calibrated"], false);
    }

    #[tokio::test]
    async fn test_calibrate_validates_distance() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![person()], MockProvider::new(vec![]))).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/calibrate", base))
            .multipart(frame_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Missing frame or distance_m");

        let response = client
            .post(format!("{}/calibrate", base))
            .multipart(frame_form().text("distance_m", "abc"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid distance_m");

        let response = client
            .post(format!("{}/calibrate", base))
            .multipart(frame_form().text("distance_m", "-1"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Known distance must be positive, got -1");
    }

    #[tokio::test]
    async fn test_calibrate_requires_visible_object() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(&dir, vec![], MockProvider::new(vec![]))).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/calibrate", base))
            .multipart(frame_form().text("distance_m", "2.0"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No object detected for calibration");
    }

    #[tokio::test]
    async fn test_ocr_reads_text() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(
            &dir,
            vec![],
            MockProvider::new(vec![exit_sign()]),
        ))
        .await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/ocr", base))
            .multipart(frame_form().text("lang", "en,hi"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["text"], "EXIT");
        assert_eq!(body["line_count"], 1);
        assert_eq!(body["lines"][0], "EXIT");
        assert!((body["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert_eq!(body["languages"][0], "en");
        assert_eq!(body["languages"][1], "hi");
    }

    #[tokio::test]
    async fn test_ocr_reports_unavailable_languages() {
        let dir = TempDir::new().unwrap();
        let provider =
            MockProvider::new(vec![exit_sign()]).failing_for(LanguageSet::from_csv("xx"));
        let base = spawn_app(test_pipeline(&dir, vec![], provider)).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/ocr", base))
            .multipart(frame_form().text("lang", "xx"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "OCR not available - model not loaded");
    }

    #[tokio::test]
    async fn test_ocr_validates_frame() {
        let dir = TempDir::new().unwrap();
        let base = spawn_app(test_pipeline(
            &dir,
            vec![],
            MockProvider::new(vec![exit_sign()]),
        ))
        .await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/ocr", base))
            .multipart(Form::new().text("lang", "en"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "No frame provided");

        let response = client
            .post(format!("{}/ocr", base))
            .multipart(Form::new().part("frame", Part::bytes(Vec::new()).file_name("frame.jpg")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Empty file");

        let response = client
            .post(format!("{}/ocr", base))
            .multipart(Form::new().part(
                "frame",
                Part::bytes(b"garbage".to_vec()).file_name("frame.jpg"),
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid frame format");
    }

    #[tokio::test]
    async fn test_build_pipeline_serves_without_models() {
        let settings = Settings::default();
        let pipeline = build_pipeline(&settings.pipeline);
        let base = spawn_app(pipeline).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/analyze_frame", base))
            .multipart(frame_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["has_objects"], false);
        assert_eq!(body["caption"], "Navigation: no obstacles detected.");

        let response = client
            .post(format!("{}/ocr", base))
            .multipart(frame_form())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
    }
}
