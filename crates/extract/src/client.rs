use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ExtractionError;
use crate::schema::{ExtractionOutcome, ExtractionParameters, Triplet};

/// Anything that can turn text into triplets.
#[async_trait]
pub trait TripletExtractor: Send + Sync {
    async fn extract(
        &self,
        text: &str,
        params: &ExtractionParameters,
    ) -> Result<ExtractionOutcome, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub endpoint: String,
    /// `None` leaves the transport default in place.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            request_timeout_secs: None,
        }
    }
}

/// HTTP client for the `/generate` endpoint.
#[derive(Clone)]
pub struct ExtractionClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
    gen_kwargs: GenKwargs,
}

#[derive(Serialize)]
struct GenKwargs {
    num_beams: u32,
    max_length: u32,
    length_penalty: f64,
    num_return_sequences: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    triplets: Option<Vec<Triplet>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    detail: Option<serde_json::Value>,
}

impl From<&ExtractionParameters> for GenKwargs {
    fn from(params: &ExtractionParameters) -> Self {
        Self {
            num_beams: params.beam_count,
            max_length: params.max_output_length,
            length_penalty: params.length_penalty,
            num_return_sequences: params.sequence_count,
        }
    }
}

impl ExtractionClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Result<Self, ExtractionError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ExtractionError::RequestConstruction(e.to_string()))?;

        Ok(Self {
            base_url: config.endpoint.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one extraction request. No retries.
    pub async fn submit(
        &self,
        text: &str,
        params: &ExtractionParameters,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let url = format!("{}/generate", self.base_url.trim_end_matches('/'));

        let request = GenerateRequest {
            text,
            gen_kwargs: params.into(),
        };

        tracing::debug!(
            url = %url,
            chars = text.chars().count(),
            num_beams = params.beam_count,
            length_penalty = params.length_penalty,
            "Sending extraction request"
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(ExtractionError::from_send)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Connectivity(e.to_string()))?;

        if !status.is_success() {
            return Err(ExtractionError::service(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        // The whole array is accepted or nothing is
        let parsed: GenerateResponse = serde_json::from_slice(&body).map_err(|e| {
            ExtractionError::service(
                status.as_u16(),
                format!("invalid extraction response: {}", e),
            )
        })?;

        Ok(ExtractionOutcome::from_triplets(parsed.triplets))
    }
}

#[async_trait]
impl TripletExtractor for ExtractionClient {
    async fn extract(
        &self,
        text: &str,
        params: &ExtractionParameters,
    ) -> Result<ExtractionOutcome, ExtractionError> {
        self.submit(text, params).await
    }
}

/// Prefer the service's own `detail` text when it sent one.
fn error_message(status: reqwest::StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.detail)
        .and_then(|detail| detail.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("extraction service returned {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn params() -> ExtractionParameters {
        ExtractionParameters {
            beam_count: 50,
            max_output_length: 512,
            length_penalty: 5.0,
            sequence_count: 1,
        }
    }

    #[tokio::test]
    async fn test_posts_text_and_gen_kwargs() {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let router = Router::new()
            .route(
                "/generate",
                post(
                    |State(seen): State<Arc<Mutex<Option<Value>>>>, Json(body): Json<Value>| async move {
                        *seen.lock().unwrap() = Some(body);
                        Json(json!({
                            "triplets": [{"head": "Obama", "type": "born in", "tail": "Hawaii"}]
                        }))
                    },
                ),
            )
            .with_state(seen.clone());
        let base = serve(router).await;

        // trailing slash on the endpoint is tolerated
        let client = ExtractionClient::new(format!("{}/", base));
        let outcome = client.submit("Obama was born in Hawaii.", &params()).await.unwrap();

        assert_eq!(
            outcome,
            ExtractionOutcome::Triplets(vec![Triplet::new("Obama", "born in", "Hawaii")])
        );

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["text"], "Obama was born in Hawaii.");
        assert_eq!(body["gen_kwargs"]["num_beams"], 50);
        assert_eq!(body["gen_kwargs"]["max_length"], 512);
        assert_eq!(body["gen_kwargs"]["length_penalty"], 5.0);
        assert_eq!(body["gen_kwargs"]["num_return_sequences"], 1);
    }

    #[tokio::test]
    async fn test_error_detail_becomes_service_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({"detail": "model overloaded"})),
                )
            }),
        );
        let client = ExtractionClient::new(serve(router).await);

        let err = client.submit("text", &params()).await.unwrap_err();
        assert_eq!(err, ExtractionError::service(503, "model overloaded"));
        assert_eq!(err.to_string(), "model overloaded");
    }

    #[tokio::test]
    async fn test_error_without_detail_uses_status() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = ExtractionClient::new(serve(router).await);

        match client.submit("text", &params()).await {
            Err(ExtractionError::Service { status, message }) => {
                assert_eq!(status, 500);
                assert!(message.contains("500"));
            }
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_triplets_is_empty() {
        let router = Router::new()
            .route("/generate", post(|| async { Json(json!({"status": "ok"})) }));
        let client = ExtractionClient::new(serve(router).await);
        assert_eq!(
            client.submit("text", &params()).await.unwrap(),
            ExtractionOutcome::Empty
        );

        let router = Router::new()
            .route("/generate", post(|| async { Json(json!({"triplets": []})) }));
        let client = ExtractionClient::new(serve(router).await);
        assert_eq!(
            client.submit("text", &params()).await.unwrap(),
            ExtractionOutcome::Empty
        );
    }

    #[tokio::test]
    async fn test_malformed_triplets_are_rejected_whole() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                Json(json!({
                    "triplets": [
                        {"head": "a", "type": "r", "tail": "b"},
                        {"head": "c", "tail": "d"}
                    ]
                }))
            }),
        );
        let client = ExtractionClient::new(serve(router).await);

        let err = client.submit("text", &params()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Service { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connectivity_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ExtractionClient::new(format!("http://{}", addr));
        let err = client.submit("text", &params()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_bad_endpoint_is_request_construction_error() {
        let client = ExtractionClient::new("not a url".to_string());
        let err = client.submit("text", &params()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::RequestConstruction(_)));
    }
}
