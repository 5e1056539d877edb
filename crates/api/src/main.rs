use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fortune_core::predictor::{FortunePredictor, PredictError};

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = fortune_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let predictor = Arc::new(FortunePredictor::from_settings(&settings)?);
    tracing::info!(source = ?predictor.source(), "fortune predictor ready");

    tokio::spawn(sweep_cache(predictor.clone()));

    let state = AppState { predictor };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/fortune", post(predict_fortune))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    predictor: Arc<FortunePredictor>,
}

#[derive(Debug, Deserialize)]
struct FortuneRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    birthdate: String,
}

#[derive(Debug, Serialize)]
struct ApiError {
    message: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            message: message.into(),
        }),
    )
        .into_response()
}

async fn predict_fortune(
    State(state): State<AppState>,
    body: Result<Json<FortuneRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return reject_body(rejection),
    };

    match state.predictor.predict(&req.name, &req.birthdate).await {
        Ok(sequence) => Json(sequence).into_response(),
        Err(PredictError::InvalidInput(detail)) => error_response(
            StatusCode::BAD_REQUEST,
            format!("name and birthdate are required: {detail}"),
        ),
        Err(PredictError::Internal(err)) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "fortune prediction failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to compute fortune")
        }
    }
}

fn reject_body(rejection: JsonRejection) -> Response {
    tracing::debug!(error = %rejection.body_text(), "rejected fortune request body");
    error_response(
        StatusCode::BAD_REQUEST,
        format!("name and birthdate are required: {}", rejection.body_text()),
    )
}

async fn sweep_cache(predictor: Arc<FortunePredictor>) {
    let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        match predictor.cache().purge_expired() {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "purged expired fortunes"),
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "cache sweep failed");
            }
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &fortune_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::{header, Request};

    async fn rejection_for(content_type: &str, body: &str) -> JsonRejection {
        let req = Request::builder()
            .method("POST")
            .uri("/api/fortune")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        match Json::<FortuneRequest>::from_request(req, &()).await {
            Ok(_) => panic!("expected body to be rejected: {body}"),
            Err(rejection) => rejection,
        }
    }

    async fn message_of(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        v["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn malformed_bodies_get_json_400() {
        let cases = [
            ("application/json", "{not json"),
            ("text/plain", r#"{"name":"Alice","birthdate":"1990-05-15"}"#),
            ("application/json", r#"{"name":42,"birthdate":"1990-05-15"}"#),
        ];
        for (content_type, body) in cases {
            let res = reject_body(rejection_for(content_type, body).await);
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(message_of(res).await.starts_with("name and birthdate are required"));
        }
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let req: FortuneRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_empty());
        assert!(req.birthdate.is_empty());
    }
}
