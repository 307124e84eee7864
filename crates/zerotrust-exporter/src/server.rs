//! Metrics HTTP server.
//!
//! `GET /metrics` renders the registry in the Prometheus text format;
//! `GET /healthz` returns the health snapshot as JSON.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use zerotrust_core::{HealthSignal, HealthSnapshot, PrometheusSink};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub sink: Arc<PrometheusSink>,
    pub health: HealthSignal,
}

/// Build the router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then drain open connections.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C"),
        () = terminate => info!("received terminate signal"),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(
        "<html><head><title>zerotrust-exporter</title></head><body>\
         <h1>zerotrust-exporter</h1><p><a href=\"/metrics\">Metrics</a></p>\
         </body></html>",
    )
}

async fn metrics(State(state): State<AppState>) -> Response {
    match state.sink.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn healthz(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(state.health.snapshot())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use zerotrust_core::metrics::DEVICES_UP;
    use zerotrust_core::{LabelSet, MetricsSink};

    use super::*;

    /// Start a server on a random port and return its base URL.
    async fn start() -> (String, AppState) {
        let sink = Arc::new(PrometheusSink::new());
        let health = HealthSignal::new(sink.clone());
        let state = AppState { sink, health };

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let served = state.clone();
        tokio::spawn(async move {
            serve(listener, served, std::future::pending()).await.unwrap();
        });

        (format!("http://{addr}"), state)
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_text_format() {
        let (base, state) = start().await;
        state.health.record_success();
        state.sink.set_gauge(
            &DEVICES_UP,
            &LabelSet::new().with("device_id", "a").with("user_email", ""),
            1.0,
        );

        let resp = reqwest::get(format!("{base}/metrics")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let content_type = resp.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(content_type.starts_with("text/plain"));

        let body = resp.text().await.unwrap();
        assert!(body.contains(r#"zerotrust_devices_up{device_id="a",user_email=""} 1"#));
        assert!(body.contains("api_calls_total 1"));
        assert!(body.contains("api_errors_total 0"));
        assert!(body.contains("up 1"));
    }

    #[tokio::test]
    async fn health_series_are_exported_before_first_cycle() {
        let (base, _state) = start().await;

        let body = reqwest::get(format!("{base}/metrics")).await.unwrap().text().await.unwrap();
        assert!(body.contains("# TYPE api_errors_total counter"));
        assert!(body.contains("api_calls_total 0"));
        assert!(body.contains("api_errors_total 0"));
        assert!(body.contains("up 0"));
    }

    #[tokio::test]
    async fn healthz_reports_snapshot() {
        let (base, state) = start().await;
        state.health.record_failure();

        let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body, serde_json::json!({ "up": false, "api_calls": 1, "api_errors": 1 }));
    }
}
