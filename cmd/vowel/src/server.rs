//! HTTP server for vowel classification.
//!
//! API endpoints:
//! - GET /         - Web UI (index.html from the static dir, or a built-in page)
//! - GET /status   - {"is_trained": bool}
//! - POST /analyze - multipart field `audio` with raw PCM16 mono at 16 kHz

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use vocal_audio::pcm::{Format, PcmError};
use vocal_audio::trim::{self, TrimConfig};
use vocal_vowel::{ClassificationService, Prediction, VowelError, SAMPLE_RATE};

/// Format of uploaded clips.
const INPUT_FORMAT: Format = Format::mono(SAMPLE_RATE);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ClassificationService>,
    pub trim: TrimConfig,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct StatusResponse {
    pub is_trained: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AnalyzeResponse {
    pub vocal: String,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    reason: String,
}

/// Errors returned by the handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request: missing field, unreadable body, bad PCM.
    BadRequest(String),
    /// The classification pipeline refused the clip.
    Vowel(VowelError),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Vowel(VowelError::ModelUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Vowel(VowelError::DimensionMismatch { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Vowel(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> String {
        match self {
            Self::BadRequest(_) => "invalid_request".to_string(),
            Self::Vowel(e) => e.reason().to_string(),
            Self::Internal(_) => "internal".to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) | Self::Internal(msg) => write!(f, "{msg}"),
            Self::Vowel(e) => write!(f, "{e}"),
        }
    }
}

impl From<VowelError> for ApiError {
    fn from(e: VowelError) -> Self {
        Self::Vowel(e)
    }
}

impl From<PcmError> for ApiError {
    fn from(e: PcmError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, "analyze failed: {self}");
        } else {
            tracing::info!(status = %status, "analyze rejected: {self}");
        }
        let body = ErrorBody {
            error: self.to_string(),
            reason: self.reason(),
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/status", get(status))
        .route("/analyze", post(analyze))
        .with_state(state);

    // Serve static files or fallback to embedded
    match static_dir {
        Some(dir) if dir.exists() => {
            app = app.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => {
            tracing::warn!("static dir not found: {}", dir.display());
            app = app.route("/", get(fallback_index));
        }
        None => {
            app = app.route("/", get(fallback_index));
        }
    }

    app.layer(CorsLayer::permissive())
}

/// Starts the HTTP server and runs until it fails.
pub async fn serve(addr: &str, state: AppState, static_dir: Option<PathBuf>) -> Result<()> {
    let app = router(state, static_dir);

    let addr = parse_addr(addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("server started at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Parse address string to SocketAddr.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

async fn fallback_index() -> impl IntoResponse {
    Html(FALLBACK_HTML)
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        is_trained: state.service.is_trained(),
    })
}

async fn analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("audio") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            audio = Some(data);
            break;
        }
    }
    let data = audio.ok_or_else(|| ApiError::BadRequest("missing audio field".to_string()))?;

    tracing::debug!(
        bytes = data.len(),
        duration_ms = INPUT_FORMAT.duration(data.len()).as_millis() as u64,
        "analyze request"
    );

    let service = Arc::clone(&state.service);
    let trim_config = state.trim;
    let prediction = tokio::task::spawn_blocking(move || analyze_pcm(&service, &trim_config, &data))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    tracing::debug!(
        label = %prediction.label,
        confidence = prediction.confidence,
        "analyze result"
    );
    Ok(Json(AnalyzeResponse {
        vocal: prediction.label,
        confidence: prediction.confidence,
    }))
}

/// Decodes, trims and classifies one PCM16 clip.
pub fn analyze_pcm(
    service: &ClassificationService,
    trim_config: &TrimConfig,
    data: &[u8],
) -> Result<Prediction, ApiError> {
    if !service.is_trained() {
        return Err(VowelError::ModelUnavailable.into());
    }
    let samples = INPUT_FORMAT.decode(data)?;
    let voiced = trim::trim(&samples, trim_config);
    Ok(service.predict(voiced, INPUT_FORMAT.sample_rate)?)
}

const FALLBACK_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Vowel Detector</title>
    <style>
        body { font-family: sans-serif; max-width: 480px; margin: 40px auto; text-align: center; }
        #vowel { font-size: 96px; margin: 24px 0; }
        button { font-size: 18px; padding: 8px 24px; }
    </style>
</head>
<body>
    <h1>Vowel Detector</h1>
    <p id="state">checking model...</p>
    <div id="vowel">-</div>
    <p id="confidence"></p>
    <button id="record">Record 1s</button>
    <script>
    const RATE = 16000;

    fetch('/status').then(r => r.json()).then(s => {
        document.getElementById('state').textContent = s.is_trained ? 'model loaded' : 'model not found';
    });

    async function record() {
        const stream = await navigator.mediaDevices.getUserMedia({ audio: true });
        const ctx = new AudioContext({ sampleRate: RATE });
        const source = ctx.createMediaStreamSource(stream);
        const proc = ctx.createScriptProcessor(4096, 1, 1);
        const chunks = [];
        proc.onaudioprocess = e => chunks.push(new Float32Array(e.inputBuffer.getChannelData(0)));
        source.connect(proc);
        proc.connect(ctx.destination);
        await new Promise(r => setTimeout(r, 1000));
        proc.disconnect();
        stream.getTracks().forEach(t => t.stop());
        await ctx.close();

        const n = chunks.reduce((a, c) => a + c.length, 0);
        const pcm = new Int16Array(n);
        let i = 0;
        for (const c of chunks) for (const s of c) pcm[i++] = Math.max(-32768, Math.min(32767, s * 32768));

        const form = new FormData();
        form.append('audio', new Blob([pcm.buffer]), 'audio.pcm');
        const res = await fetch('/analyze', { method: 'POST', body: form });
        const body = await res.json();
        if (res.ok) {
            document.getElementById('vowel').textContent = body.vocal;
            document.getElementById('confidence').textContent = (body.confidence * 100).toFixed(1) + '%';
        } else {
            document.getElementById('vowel').textContent = '-';
            document.getElementById('confidence').textContent = body.error;
        }
    }

    document.getElementById('record').onclick = record;
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use vocal_audio::pcm;
    use std::f64::consts::PI;
    use vocal_vowel::{FeatureScaler, FEATURE_DIM};

    fn sine_pcm(freq_hz: f64, n_samples: usize) -> Vec<u8> {
        let samples: Vec<f32> = (0..n_samples)
            .map(|i| (0.5 * (2.0 * PI * freq_hz * i as f64 / 16000.0).sin()) as f32)
            .collect();
        pcm::encode_pcm16(&samples)
    }

    /// Splits on the spectral centroid at 1 kHz.
    fn trained_service() -> ClassificationService {
        let mut low = vec![0.0; FEATURE_DIM];
        let mut high = vec![0.0; FEATURE_DIM];
        low[0] = -0.01;
        high[0] = 0.01;
        let model = serde_json::json!({
            "version": 1,
            "labels": ["u", "i"],
            "model": {
                "kind": "linear",
                "weights": [low, high],
                "intercepts": [10.0, -10.0],
            }
        });
        let classifier = vocal_vowel::classifier::from_json(model.to_string().as_bytes()).unwrap();
        ClassificationService::ready(FeatureScaler::identity(FEATURE_DIM), classifier)
    }

    fn state(service: ClassificationService) -> AppState {
        AppState {
            service: Arc::new(service),
            trim: TrimConfig::default(),
        }
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_addr() {
        let any: SocketAddr = "0.0.0.0:5000".parse().unwrap();
        let local: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(parse_addr(":5000").unwrap(), any);
        assert_eq!(parse_addr("127.0.0.1:8080").unwrap(), local);
        assert!(parse_addr("not an address").is_err());
    }

    #[test]
    fn test_analyze_pcm_classifies() {
        let service = trained_service();
        let p = analyze_pcm(&service, &TrimConfig::default(), &sine_pcm(200.0, 16000)).unwrap();
        assert_eq!(p.label, "u");
        let p = analyze_pcm(&service, &TrimConfig::default(), &sine_pcm(3000.0, 16000)).unwrap();
        assert_eq!(p.label, "i");
    }

    #[test]
    fn test_analyze_pcm_trims_before_predict() {
        // 300 voiced samples followed by silence trim to 1536 samples.
        let mut samples: Vec<f32> = (0..300).map(|i| 0.5 * (i as f32 * 0.08).sin()).collect();
        samples.extend(vec![0.0f32; 8000]);
        let data = pcm::encode_pcm16(&samples);
        let err = analyze_pcm(&trained_service(), &TrimConfig::default(), &data).unwrap_err();
        assert!(matches!(err, ApiError::Vowel(VowelError::InsufficientAudio { .. })));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_analyze_pcm_odd_length() {
        let err =
            analyze_pcm(&trained_service(), &TrimConfig::default(), &[0u8; 4097]).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_analyze_pcm_untrained() {
        let err = analyze_pcm(
            &ClassificationService::untrained(),
            &TrimConfig::default(),
            &sine_pcm(200.0, 16000),
        )
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.reason(), "model_unavailable");
    }

    #[test]
    fn test_error_status_mapping() {
        let mismatch = ApiError::from(VowelError::DimensionMismatch { expected: 10, got: 56 });
        assert_eq!(mismatch.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(mismatch.reason(), "dimension_mismatch");
        let short = ApiError::from(VowelError::InsufficientAudio {
            min_samples: 2048,
            got_samples: 10,
        });
        assert_eq!(short.status(), StatusCode::BAD_REQUEST);
        assert_eq!(short.reason(), "insufficient_audio");
    }

    #[tokio::test]
    async fn test_status_handler() {
        let Json(s) = status(State(state(ClassificationService::untrained()))).await;
        assert_eq!(s, StatusResponse { is_trained: false });
        let Json(s) = status(State(state(trained_service()))).await;
        assert_eq!(s, StatusResponse { is_trained: true });
    }

    async fn multipart_request(field: &str, payload: &[u8]) -> Multipart {
        use axum::body::Body;
        use axum::extract::FromRequest;
        use axum::http::Request;

        let mut body = format!(
            "--BOUNDARY\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"clip.pcm\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(payload);
        body.extend_from_slice(b"\r\n--BOUNDARY--\r\n");

        let req = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "multipart/form-data; boundary=BOUNDARY")
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(req, &()).await.unwrap()
    }

    #[tokio::test]
    async fn test_analyze_handler() {
        let mp = multipart_request("audio", &sine_pcm(200.0, 16000)).await;
        let Json(resp) = analyze(State(state(trained_service())), mp).await.unwrap();
        assert_eq!(resp.vocal, "u");
        assert!(resp.confidence > 0.99);
    }

    #[tokio::test]
    async fn test_analyze_handler_missing_audio() {
        let mp = multipart_request("file", &sine_pcm(200.0, 16000)).await;
        let err = analyze(State(state(trained_service())), mp).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_response_body() {
        let resp = ApiError::from(VowelError::ModelUnavailable).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(resp).await;
        assert_eq!(body["reason"], "model_unavailable");
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_fallback_index() {
        let resp = fallback_index().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/analyze"));
    }

    #[tokio::test]
    async fn test_analyze_response_shape() {
        let resp = Json(AnalyzeResponse {
            vocal: "a".into(),
            confidence: 0.75,
        })
        .into_response();
        let body = body_json(resp).await;
        assert_eq!(body, serde_json::json!({"vocal": "a", "confidence": 0.75}));
    }
}
