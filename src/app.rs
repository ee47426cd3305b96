use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    http::header,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use tokio::sync::Notify;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::error::ErrorBody;
use crate::state::AppState;
use crate::{health, users};

pub fn build_app(state: AppState) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .nest("/api", users::router())
        .merge(health::health_routes())
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::map_response(json_error_body))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let duration_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, duration_ms, "response");
                        } else {
                            tracing::info!(%status, duration_ms, "response");
                        }
                    },
                ),
        )
}

/// Gives bodyless error responses (unknown route, wrong method, timeout) a JSON body.
async fn json_error_body(res: Response) -> Response {
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error())
        || res.headers().contains_key(header::CONTENT_TYPE)
    {
        return res;
    }

    let allow = res.headers().get(header::ALLOW).cloned();
    let body = ErrorBody {
        error: status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    let mut json = (status, Json(body)).into_response();
    if let Some(allow) = allow {
        json.headers_mut().insert(header::ALLOW, allow);
    }
    json
}

/// Serves until SIGINT/SIGTERM, then gives in-flight requests `shutdown_grace` to finish.
pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    let stop = Arc::new(Notify::new());
    let stop_rx = Arc::clone(&stop);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { stop_rx.notified().await })
            .await
    });

    tokio::select! {
        res = &mut server => {
            return res.context("server task panicked")?.context("server error");
        }
        _ = shutdown_signal() => {}
    }

    tracing::info!(grace_secs = config.shutdown_grace.as_secs(), "shutting down server");
    // notify_one stores a permit, so the shutdown future sees it even if not yet polled.
    stop.notify_one();

    match tokio::time::timeout(config.shutdown_grace, &mut server).await {
        Ok(res) => res.context("server task panicked")?.context("server error")?,
        Err(_) => {
            tracing::warn!("grace period elapsed; forcing close of remaining connections");
            server.abort();
        }
    }

    tracing::info!("server exited");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
