use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use scolaguard_core::ErrorReport;
use scolaguard_models::RequestContext;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// One line per request, tagged with the resolved scope and denial kind.
///
/// Mounted outside the guard so the [`RequestContext`] and [`ErrorReport`]
/// it attaches to responses are visible here.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let request_id = uuid::Uuid::new_v4();

    debug!(%request_id, %method, %path, "Incoming request");

    let response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();

    let ctx = response.extensions().get::<RequestContext>();
    let tenant = ctx.map(|c| c.tenant_id().to_string()).unwrap_or_default();
    let level = ctx
        .map(|c| c.school_level_id().to_string())
        .unwrap_or_default();
    let kind = response
        .extensions()
        .get::<ErrorReport>()
        .and_then(|r| r.kind)
        .map(|k| k.as_str())
        .unwrap_or_default();

    if response.status().is_server_error() {
        error!(%request_id, %method, %path, status, latency_ms, %tenant, %level, "Server error");
    } else if response.status().is_client_error() {
        warn!(%request_id, %method, %path, status, latency_ms, %tenant, %level, kind, "Request rejected");
    } else {
        info!(%request_id, %method, %path, status, latency_ms, %tenant, %level, "Request completed");
    }

    response
}

/// Console, error file and JSON file layers.
///
/// The returned guards flush the file writers on drop; keep them alive for
/// the lifetime of the process.
pub fn init_tracing() -> std::io::Result<Vec<WorkerGuard>> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::fmt;

    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    std::fs::create_dir_all(&log_dir)?;

    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,scolaguard_registry=info,audit=info,tower_http=warn",
            env!("CARGO_CRATE_NAME")
        ))
    });

    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let (error_writer, error_guard) = tracing_appender::non_blocking(RollingFileAppender::new(
        Rotation::DAILY,
        &log_dir,
        "scolaguard.log",
    ));
    let file_layer = fmt::layer()
        .with_writer(error_writer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"));

    // Structured logs, including the audit target when the tracing sink is used.
    let (json_writer, json_guard) = tracing_appender::non_blocking(RollingFileAppender::new(
        Rotation::DAILY,
        &log_dir,
        "scolaguard.json",
    ));
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_writer)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(json_layer)
        .init();

    info!("Tracing initialized");
    Ok(vec![error_guard, json_guard])
}
