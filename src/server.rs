//! HTTP surface of the gateway: `POST /generate` and `GET /check-env`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::GenerationRequest;
use crate::error::GenerateError;
use crate::generate::Generator;

const EXECUTION_FAILED_MESSAGE: &str = "Generation process execution failed";

/// Successful `/generate` body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    pub llmstxt: String,
}

/// Body of every failed request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `/check-env` body: which defaults are configured and the effective base URL.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvStatus {
    pub firecrawl: bool,
    pub openai: bool,
    pub firecrawl_base_url: String,
}

/// Maps a request failure to its status code and JSON body.
pub enum ApiError {
    Generate(GenerateError),
    InvalidBody(JsonRejection),
}

impl From<GenerateError> for ApiError {
    fn from(error: GenerateError) -> Self {
        Self::Generate(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidBody(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid request body".to_owned(),
                    details: Some(rejection.body_text()),
                },
            ),
            ApiError::Generate(GenerateError::Credential) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: GenerateError::Credential.to_string(),
                    details: None,
                },
            ),
            ApiError::Generate(error @ GenerateError::InvalidUrl { .. }) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid URL".to_owned(),
                    details: Some(error.to_string()),
                },
            ),
            ApiError::Generate(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: EXECUTION_FAILED_MESSAGE.to_owned(),
                    details: Some(error.to_string()),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Builds the router around a shared generator.
pub fn router(generator: Arc<Generator>) -> Router {
    Router::new()
        .route("/generate", post(generate_handler))
        .route("/check-env", get(check_env_handler))
        .with_state(generator)
}

/// Serves the router on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(generator: Arc<Generator>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(generator))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn generate_handler(
    State(generator): State<Arc<Generator>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = payload.map_err(ApiError::InvalidBody)?;

    match generator.generate(&request).await {
        Ok(llmstxt) => Ok(Json(GenerationResponse { llmstxt })),
        Err(e) => {
            if e.is_client_error() {
                info!("Rejected request for {}: {e}", request.url);
            } else {
                error!("Generation for {} failed: {e}", request.url);
            }
            Err(e.into())
        }
    }
}

async fn check_env_handler(State(generator): State<Arc<Generator>>) -> Json<EnvStatus> {
    let defaults = generator.defaults();
    Json(EnvStatus {
        firecrawl: defaults.firecrawl_api_key.is_some(),
        openai: defaults.openai_api_key.is_some(),
        firecrawl_base_url: defaults.effective_base_url(),
    })
}
