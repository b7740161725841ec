//! Recognizer backed by the Hugging Face inference API.

use std::{io::Cursor, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest_middleware::ClientWithMiddleware;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::{TextRecognizer, http::http_client, text::post_process};

pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_MODEL: &str = "kha-white/manga-ocr-base";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HfInferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub token: Option<SecretString>,
    pub timeout_secs: u64,
}

impl Default for HfInferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            token: None,
            timeout_secs: 60,
        }
    }
}

impl HfInferenceConfig {
    pub fn model_url(&self) -> String {
        format!(
            "{}/models/{}",
            self.endpoint.trim_end_matches('/'),
            self.model.trim_matches('/')
        )
    }
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<Generated>),
    Single(Generated),
    Error { error: String },
}

pub struct HfInferenceRecognizer {
    client: ClientWithMiddleware,
    url: String,
    token: Option<SecretString>,
}

impl HfInferenceRecognizer {
    pub fn new(config: &HfInferenceConfig) -> anyhow::Result<Self> {
        let client = http_client(Duration::from_secs(config.timeout_secs))
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            url: config.model_url(),
            token: config.token.clone(),
        })
    }

    /// Checks that the inference endpoint answers at all. Any HTTP status
    /// counts as reachable; only transport failures are errors.
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    pub async fn init(&self) -> anyhow::Result<()> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("recognizer endpoint {} is unreachable", self.url))?;

        tracing::info!(status = %response.status(), "recognizer endpoint reachable");
        Ok(())
    }
}

#[async_trait]
impl TextRecognizer for HfInferenceRecognizer {
    #[instrument(level = "debug", skip_all, fields(width = image.width(), height = image.height()))]
    async fn recognize(&self, image: &DynamicImage) -> anyhow::Result<String> {
        // gray content in an RGB layout
        let image = DynamicImage::ImageRgb8(image.grayscale().to_rgb8());
        let mut body = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut body), ImageFormat::Png)
            .context("failed to encode image")?;

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "image/png")
            .header(ACCEPT, "application/json")
            .body(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let parsed = serde_json::from_slice::<InferenceResponse>(&bytes);
        let text = match parsed {
            Ok(InferenceResponse::Error { error }) => {
                anyhow::bail!("recognizer returned {status}: {error}")
            }
            _ if !status.is_success() => anyhow::bail!(
                "recognizer returned {status}: {}",
                String::from_utf8_lossy(&bytes)
            ),
            Ok(InferenceResponse::Single(generated)) => generated.generated_text,
            Ok(InferenceResponse::Batch(generated)) => generated
                .into_iter()
                .next()
                .map(|g| g.generated_text)
                .unwrap_or_default(),
            Err(err) => return Err(err).context("unexpected recognizer response"),
        };

        Ok(post_process(&text))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode, header},
        response::IntoResponse,
        routing::post,
    };
    use image::{Rgb, RgbImage};
    use secrecy::SecretString;
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Clone, Default)]
    struct Seen {
        headers: Arc<Mutex<Option<HeaderMap>>>,
        body: Arc<Mutex<Vec<u8>>>,
    }

    async fn start_server(app: Router) -> (String, oneshot::Sender<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("get local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve test app");
        });

        (format!("http://{addr}"), shutdown_tx)
    }

    fn config(endpoint: String, token: Option<&str>) -> HfInferenceConfig {
        HfInferenceConfig {
            endpoint,
            token: token.map(|t| SecretString::from(t.to_string())),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn posts_png_and_post_processes_text() {
        async fn handler(
            State(seen): State<Seen>,
            headers: HeaderMap,
            body: axum::body::Bytes,
        ) -> impl IntoResponse {
            *seen.headers.lock().unwrap() = Some(headers);
            *seen.body.lock().unwrap() = body.to_vec();
            Json(serde_json::json!([{ "generated_text": "ｶﾞ ABC…" }]))
        }

        let seen = Seen::default();
        let app = Router::new()
            .route("/models/kha-white/manga-ocr-base", post(handler))
            .with_state(seen.clone());
        let (endpoint, shutdown) = start_server(app).await;

        let recognizer = HfInferenceRecognizer::new(&config(endpoint, Some("secret"))).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([200, 40, 10])));
        let text = recognizer.recognize(&image).await.expect("recognize");

        assert_eq!(text, "ガＡＢＣ．．．");
        let headers = seen.headers.lock().unwrap().clone().expect("request seen");
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer secret");

        let sent = image::load_from_memory(&seen.body.lock().unwrap()).expect("png body");
        let sent = sent.as_rgb8().expect("rgb png");
        let [r, g, b] = sent.get_pixel(8, 8).0;
        assert!(r == g && g == b, "expected gray, got {r} {g} {b}");
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn error_payload_is_reported() {
        async fn handler() -> impl IntoResponse {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Model is unavailable" })),
            )
        }

        let app = Router::new().route("/models/kha-white/manga-ocr-base", post(handler));
        let (endpoint, shutdown) = start_server(app).await;

        let recognizer = HfInferenceRecognizer::new(&config(endpoint, None)).unwrap();
        let err = recognizer
            .recognize(&DynamicImage::new_rgb8(4, 4))
            .await
            .expect_err("error payload must fail");
        assert!(
            err.to_string().contains("Model is unavailable"),
            "unexpected error: {err:#}"
        );
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn init_accepts_any_status() {
        let app = Router::new();
        let (endpoint, shutdown) = start_server(app).await;

        let recognizer = HfInferenceRecognizer::new(&config(endpoint, None)).unwrap();
        recognizer.init().await.expect("404 still means reachable");
        let _ = shutdown.send(());
    }

    #[test]
    fn model_url_joins_cleanly() {
        let config = HfInferenceConfig {
            endpoint: "http://localhost:8080/".to_string(),
            model: "/owner/model".to_string(),
            ..Default::default()
        };
        assert_eq!(config.model_url(), "http://localhost:8080/models/owner/model");
    }
}
