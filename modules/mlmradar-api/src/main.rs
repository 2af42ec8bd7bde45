use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ai_client::LmStudio;
use instagram_client::InstagramClient;
use mlmradar_common::{Config, RetryPolicy};
use mlmradar_pipeline::{Classifier, Pipeline, ReasoningFormat};

pub struct AppState {
    pub pipeline: Pipeline,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    url: String,
}

/// Analyze one social post URL. Returns the classification JSON, or a 500
/// with the failure message as the body; no structured error codes are
/// exposed externally.
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let url = body.url.trim().to_string();

    if let Err(message) = validate_url(&url) {
        return (StatusCode::INTERNAL_SERVER_ERROR, message).into_response();
    }

    match state.pipeline.analyze(&url).await {
        Ok(classification) => Json(classification).into_response(),
        Err(e) => {
            error!(url = %url, error = %e, "analysis failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn validate_url(url: &str) -> Result<(), String> {
    let parsed = url::Url::parse(url).map_err(|_| format!("Invalid URL: {url}"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err("URL must use http or https scheme".to_string());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("mlmradar=info".parse()?))
        .init();

    let config = Config::from_env();

    let model = LmStudio::new(&config.lmstudio_api_key, &config.model_id)
        .with_base_url(&config.lmstudio_base_url);
    let instagram = Arc::new(InstagramClient::new()?);
    let classifier = Classifier::new(Arc::new(model), ReasoningFormat::Structured);
    let pipeline = Pipeline::new(
        instagram.clone(),
        instagram,
        classifier,
        RetryPolicy::default(),
    );

    let state = Arc::new(AppState { pipeline });

    let app = Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!(addr = %addr, model = %config.model_id, "starting analysis API");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
