//! End-to-end analysis service
//!
//! One `AnalysisPipeline` owns every domain service and the shared
//! process state: the calibration constant, the caption throttle, the
//! alert cooldown and the reader cache. All model calls go through the
//! inference pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use calibration::{best_height, CalibrationError, CalibrationStore};
use captioning::{compose_caption, navigation_sentence, CaptionThrottle, DelegateError, SceneCaptioner};
use frame_ingest::Frame;
use metrics::{counter, histogram};
use obstacle_scan::{fuse, wall_alert_for, AlertGate, TextEvidence, WallEvidence, WallScanner};
use perception::{enrich_detections, Detection, ObjectDetector};
use query_resolver::QueryResolver;
use text_recognition::{summarize, LanguageSet, ReaderCache, ReaderProvider};
use tracing::{debug, info, warn};

use crate::pool::InferencePool;
use crate::response::{
    AnalyzeResponse, CalibrationResponse, CalibrationState, OcrResponse, QuestionResponse,
    ResetResponse,
};
use crate::{PipelineConfig, PipelineError};

pub struct AnalysisPipeline {
    detector: Arc<dyn ObjectDetector>,
    captioner: Arc<dyn SceneCaptioner>,
    resolver: Arc<QueryResolver>,
    calibration: Arc<CalibrationStore>,
    scanner: Arc<WallScanner>,
    readers: Arc<ReaderCache>,
    throttle: CaptionThrottle,
    alert_gate: AlertGate,
    pool: InferencePool,
    confidence_floor: f32,
}

impl AnalysisPipeline {
    pub fn new(
        config: &PipelineConfig,
        detector: Arc<dyn ObjectDetector>,
        captioner: Arc<dyn SceneCaptioner>,
        reader_provider: Arc<dyn ReaderProvider>,
    ) -> Self {
        let calibration = Arc::new(CalibrationStore::open(&config.calibration));
        info!(calibrated = calibration.is_calibrated(), "analysis pipeline ready");
        Self {
            resolver: Arc::new(QueryResolver::new(captioner.clone())),
            calibration,
            scanner: Arc::new(WallScanner::new(config.scan.clone())),
            readers: Arc::new(ReaderCache::with_default_capacity(reader_provider)),
            throttle: CaptionThrottle::new(Duration::from_secs_f64(config.caption_interval_secs)),
            alert_gate: AlertGate::new(Duration::from_secs_f64(config.alert_cooldown_secs)),
            pool: InferencePool::new(
                config.inference_concurrency,
                config.inference_queue_limit,
                Duration::from_secs(config.inference_timeout_secs),
            ),
            confidence_floor: config.confidence_floor,
            detector,
            captioner,
        }
    }

    /// Construct common readers up front; blocks while models load.
    pub fn warm_readers(&self) {
        self.readers.warmup();
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_calibrated()
    }

    /// Analyze one frame: detect, enrich, caption, scan for walls and
    /// gate the resulting alert.
    pub async fn analyze_frame(&self, image: &[u8]) -> Result<AnalyzeResponse, PipelineError> {
        let started = Instant::now();
        let frame = decode_frame(image, "Invalid image")?;
        let k = self.calibration.k();

        let detections = self.detect(frame.clone(), k).await?;

        let generative = {
            let captioner = self.captioner.clone();
            let caption_frame = frame.clone();
            let outcome = self
                .throttle
                .generate_if_due(|| async move {
                    match self
                        .pool
                        .run(move || captioner.caption(&caption_frame, None))
                        .await
                    {
                        Ok(result) => result,
                        Err(e) => Err(DelegateError::Failed(e.to_string())),
                    }
                })
                .await;
            match outcome {
                Some(Ok(text)) => Some(text),
                Some(Err(e)) => {
                    warn!(error = %e, "caption generation failed");
                    None
                }
                None => None,
            }
        };

        let text_evidence = TextEvidence::from_caption(generative.as_deref());
        let evidence = {
            let scanner = self.scanner.clone();
            let scan_frame = frame.clone();
            match tokio::task::spawn_blocking(move || scanner.scan(&scan_frame, k)).await {
                Ok(Ok(evidence)) => evidence,
                Ok(Err(e)) => {
                    warn!(error = %e, "wall scan failed");
                    WallEvidence::NoHypothesis
                }
                Err(e) => {
                    warn!(error = %e, "wall scan task failed");
                    WallEvidence::NoHypothesis
                }
            }
        };
        let wall_info = fuse(evidence, text_evidence);
        let wall_alert = self.alert_gate.try_emit(|| wall_alert_for(&wall_info));
        if let Some(alert) = &wall_alert {
            info!(message = %alert.message, urgent = alert.urgent, "wall alert emitted");
            counter!("wall_alerts_total").increment(1);
        }

        let navigation_caption = navigation_sentence(&detections);
        let caption = compose_caption(generative.as_deref(), &navigation_caption);

        counter!("frames_analyzed_total").increment(1);
        histogram!("analyze_duration_seconds").record(started.elapsed().as_secs_f64());

        Ok(AnalyzeResponse {
            has_objects: !detections.is_empty(),
            detections,
            caption,
            navigation_caption,
            k_value: k,
            wall_alert,
            wall_info,
        })
    }

    /// Answer a free-text question about the frame.
    pub async fn answer_question(
        &self,
        image: &[u8],
        question: &str,
    ) -> Result<QuestionResponse, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::InvalidInput(
                "Missing frame or question".to_string(),
            ));
        }
        let frame = decode_frame(image, "Invalid image")?;
        let k = self.calibration.k();
        let detections = self.detect(frame.clone(), k).await?;

        let resolver = self.resolver.clone();
        let asked = question.to_string();
        let answer = self
            .pool
            .run(move || resolver.answer(&frame, &asked, &detections))
            .await?;

        counter!("questions_answered_total").increment(1);
        Ok(QuestionResponse {
            question: question.to_string(),
            answer,
        })
    }

    /// Derive the calibration constant from a frame of an object at a
    /// known distance.
    pub async fn calibrate(
        &self,
        image: &[u8],
        known_distance_m: f64,
    ) -> Result<CalibrationResponse, PipelineError> {
        if !(known_distance_m > 0.0) || !known_distance_m.is_finite() {
            return Err(CalibrationError::InvalidDistance(known_distance_m).into());
        }
        let frame = decode_frame(image, "Invalid image")?;
        let detections = self.detect(frame, None).await?;
        let height = best_height(&detections).ok_or(CalibrationError::NoObjectDetected)?;
        let outcome = self.calibration.set_from_measurement(known_distance_m, height)?;
        counter!("calibrations_total").increment(1);
        Ok(CalibrationResponse::from(outcome))
    }

    pub fn calibration_state(&self) -> CalibrationState {
        let k = self.calibration.k();
        CalibrationState {
            is_calibrated: k.is_some(),
            k,
        }
    }

    pub fn reset_calibration(&self) -> Result<ResetResponse, PipelineError> {
        self.calibration.reset()?;
        Ok(ResetResponse {
            success: true,
            k: None,
        })
    }

    /// Read printed text out of a frame with a reader for the requested
    /// languages.
    pub async fn read_text(
        &self,
        image: &[u8],
        languages: LanguageSet,
    ) -> Result<OcrResponse, PipelineError> {
        let frame = decode_frame(image, "Invalid frame format")?;
        let readers = self.readers.clone();
        let langs = languages.clone();
        let lines = self
            .pool
            .run(move || {
                let reader = readers.reader(&langs)?;
                reader.recognize(&frame)
            })
            .await??;

        let outcome = summarize(&lines);
        debug!(line_count = outcome.line_count, "text recognition finished");
        counter!("ocr_requests_total").increment(1);
        Ok(OcrResponse {
            success: true,
            text: outcome.text,
            confidence: outcome.confidence,
            line_count: outcome.line_count,
            lines: outcome.lines,
            languages,
        })
    }

    async fn detect(&self, frame: Frame, k: Option<f64>) -> Result<Vec<Detection>, PipelineError> {
        let detector = self.detector.clone();
        let (width, height) = (frame.width, frame.height);
        let raw = self.pool.run(move || detector.detect(&frame)).await??;
        Ok(enrich_detections(raw, width, height, k, self.confidence_floor))
    }
}

fn decode_frame(image: &[u8], invalid: &str) -> Result<Frame, PipelineError> {
    if image.is_empty() {
        return Err(PipelineError::InvalidInput("Empty file".to_string()));
    }
    Frame::decode(image).map_err(|e| {
        debug!(error = %e, "frame decode failed");
        PipelineError::InvalidInput(invalid.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibration::CalibrationConfig;
    use perception::{MockDetector, RawDetection};
    use captioning::MockCaptioner;
    use text_recognition::{MockProvider, RecognizedLine};
    use tempfile::TempDir;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(320, 240, image::Rgb([127, 127, 127]));
        let mut bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut bytes);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        bytes
    }

    fn person() -> RawDetection {
        RawDetection::new([100, 100, 200, 200], "person", 0.9)
    }

    fn test_config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            calibration: CalibrationConfig {
                store_path: dir.path().join("calib_K.json"),
            },
            ..PipelineConfig::default()
        }
    }

    fn pipeline_with(
        config: PipelineConfig,
        detections: Vec<RawDetection>,
        captioner: MockCaptioner,
    ) -> AnalysisPipeline {
        AnalysisPipeline::new(
            &config,
            Arc::new(MockDetector::new(detections)),
            Arc::new(captioner),
            Arc::new(MockProvider::new(vec![RecognizedLine {
                region: [0, 0, 100, 30],
                text: "EXIT".to_string(),
                confidence: 0.9,
            }])),
        )
    }

    #[tokio::test]
    async fn test_analyze_uncalibrated_frame() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        let response = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert!(response.has_objects);
        assert_eq!(response.k_value, None);
        assert_eq!(response.detections.len(), 1);
        assert_eq!(response.detections[0].distance, None);
        assert_eq!(response.detections[0].distance_str, "?");
        assert_eq!(
            response.navigation_caption,
            "Navigation: person on your center"
        );
        assert_eq!(
            response.caption,
            "A quiet street. Navigation: person on your center"
        );
        assert!(!response.wall_info.detected);
        assert!(response.wall_alert.is_none());
    }

    #[tokio::test]
    async fn test_second_analysis_within_interval_skips_generation() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        let first = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert!(first.caption.starts_with("A quiet street. "));

        let second = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert_eq!(second.caption, second.navigation_caption);
    }

    #[tokio::test]
    async fn test_caption_regenerated_after_interval() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.caption_interval_secs = 0.03;
        let pipeline = pipeline_with(
            config,
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        pipeline.analyze_frame(&png_bytes()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let later = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert!(later.caption.starts_with("A quiet street. "));
    }

    #[tokio::test]
    async fn test_calibrate_then_analyze_reports_distances() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        let calibrated = pipeline.calibrate(&png_bytes(), 2.0).await.unwrap();
        assert!(calibrated.success);
        assert_eq!(calibrated.k, 200.0);
        assert_eq!(calibrated.bbox_height, 100);
        assert_eq!(calibrated.distance_m, 2.0);

        let response = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert_eq!(response.k_value, Some(200.0));
        assert_eq!(response.detections[0].distance, Some(2.0));
        assert_eq!(response.detections[0].distance_str, "2.0 m");

        let state = pipeline.calibration_state();
        assert!(state.is_calibrated);
        assert_eq!(state.k, Some(200.0));
    }

    #[tokio::test]
    async fn test_calibrate_without_detection_is_rejected() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            Vec::new(),
            MockCaptioner::new("A quiet street", "unused"),
        );

        let err = pipeline.calibrate(&png_bytes(), 2.0).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Calibration(CalibrationError::NoObjectDetected)
        ));
    }

    #[tokio::test]
    async fn test_calibrate_rejects_non_positive_distance() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        let err = pipeline.calibrate(&png_bytes(), 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Calibration(CalibrationError::InvalidDistance(_))
        ));
    }

    #[tokio::test]
    async fn test_reset_calibration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("A quiet street", "unused"),
        );

        for _ in 0..3 {
            let reset = pipeline.reset_calibration().unwrap();
            assert!(reset.success);
            assert_eq!(reset.k, None);
        }
        assert!(!pipeline.is_calibrated());

        pipeline.calibrate(&png_bytes(), 2.0).await.unwrap();
        assert!(pipeline.is_calibrated());
        pipeline.reset_calibration().unwrap();
        assert!(!pipeline.is_calibrated());
    }

    #[tokio::test]
    async fn test_wall_alert_respects_cooldown() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.caption_interval_secs = 0.0;
        config.alert_cooldown_secs = 0.1;
        let pipeline = pipeline_with(
            config,
            vec![person()],
            MockCaptioner::new("A wall very close ahead", "unused"),
        );
        pipeline.calibrate(&png_bytes(), 2.0).await.unwrap();

        let first = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        let alert = first.wall_alert.expect("alert expected");
        assert_eq!(alert.message, "Slow down. Obstacle 1.5 m ahead.");
        assert!(first.wall_info.detected);

        // Hazard still flagged, alert suppressed by the cooldown
        let second = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert!(second.wall_info.detected);
        assert!(second.wall_alert.is_none());

        tokio::time::sleep(Duration::from_millis(150)).await;
        let third = pipeline.analyze_frame(&png_bytes()).await.unwrap();
        assert!(third.wall_alert.is_some());
    }

    #[tokio::test]
    async fn test_question_prefers_delegate_answer() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("unused", "A person waiting at a crossing"),
        );

        let response = pipeline
            .answer_question(&png_bytes(), "what do you see?")
            .await
            .unwrap();
        assert_eq!(response.question, "what do you see?");
        assert_eq!(response.answer, "A person waiting at a crossing");
    }

    #[tokio::test]
    async fn test_question_falls_back_without_delegate() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::unavailable(),
        );

        let response = pipeline
            .answer_question(&png_bytes(), "what do you see?")
            .await
            .unwrap();
        assert_eq!(response.answer, "I can see: person.");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("unused", "unused"),
        );

        let err = pipeline
            .answer_question(&png_bytes(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_undecodable_image_rejected() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("unused", "unused"),
        );

        let err = pipeline.analyze_frame(b"not an image").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(ref m) if m == "Invalid image"));

        let err = pipeline.analyze_frame(b"").await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(ref m) if m == "Empty file"));

        let err = pipeline
            .read_text(b"junk", LanguageSet::english())
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(ref m) if m == "Invalid frame format"));
    }

    #[tokio::test]
    async fn test_ocr_summarizes_recognized_lines() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(
            test_config(&dir),
            vec![person()],
            MockCaptioner::new("unused", "unused"),
        );

        let response = pipeline
            .read_text(&png_bytes(), LanguageSet::from_csv("en,hi"))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.text, "EXIT");
        assert_eq!(response.line_count, 1);
        assert_eq!(response.lines, vec!["EXIT"]);
        assert!((response.confidence - 0.9).abs() < 1e-6);
        assert_eq!(response.languages, LanguageSet::from_csv("en,hi"));
    }

    #[tokio::test]
    async fn test_ocr_without_reader_reports_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let provider =
            MockProvider::new(Vec::new()).failing_for(LanguageSet::from_csv("xx"));
        let pipeline = AnalysisPipeline::new(
            &config,
            Arc::new(MockDetector::new(vec![person()])),
            Arc::new(MockCaptioner::new("unused", "unused")),
            Arc::new(provider),
        );

        let err = pipeline
            .read_text(&png_bytes(), LanguageSet::from_csv("xx"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ModelUnavailable));
    }
}
