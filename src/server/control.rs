//! HTTP control plane
//!
//! Stateless handlers over the shared context. No authentication.
//!
//! | Route          | Effect                                  |
//! |----------------|-----------------------------------------|
//! | `/frame`       | current JPEG (placeholder when stopped) |
//! | `/info`        | quality floor, mode, resolution         |
//! | `/connect`     | session count + 1                       |
//! | `/disconnect`  | session count - 1                       |
//! | `/information` | session count as text                   |
//! | `/stats`       | capture counters and listener list      |

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::context::AppContext;
use crate::device::{CaptureMode, Resolution};
use crate::stats::CaptureSnapshot;

/// Build the control plane router
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/frame", get(frame))
        .route("/info", get(info))
        .route("/connect", get(connect))
        .route("/disconnect", get(disconnect))
        .route("/information", get(information))
        .route("/stats", get(stats))
        .with_state(ctx)
}

/// Body of `GET /info`
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Minimum JPEG quality of the adaptive policy
    pub quality: u8,
    /// Capture mode
    pub target: CaptureMode,
    /// Capture resolution `[width, height]`
    pub resolution: Resolution,
}

/// Body of `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Whether a capture worker is active
    pub running: bool,
    /// Version of the current frame
    pub version: u64,
    /// Session count, stream viewers and control plane connects together
    pub active: usize,
    /// Addresses of registered stream viewers
    pub listeners: Vec<String>,
    /// Capture counters
    pub capture: CaptureSnapshot,
}

fn status_text(active: usize) -> &'static str {
    if active > 0 {
        "Connected"
    } else {
        "Disconnected"
    }
}

async fn frame(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let frame = ctx.device.current_frame();
    ([(header::CONTENT_TYPE, "image/jpeg")], frame.data().clone())
}

async fn info(State(ctx): State<Arc<AppContext>>) -> Json<InfoResponse> {
    let config = ctx.device.config();
    Json(InfoResponse {
        quality: config.min_quality,
        target: config.target,
        resolution: config.resolution,
    })
}

async fn connect(State(ctx): State<Arc<AppContext>>) -> Response {
    match ctx.sessions.increment().await {
        Ok(active) => status_text(active).into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Device unavailable: {}", e),
        )
            .into_response(),
    }
}

async fn disconnect(State(ctx): State<Arc<AppContext>>) -> &'static str {
    status_text(ctx.sessions.decrement().await)
}

async fn information(State(ctx): State<Arc<AppContext>>) -> String {
    format!("Active listeners: {}", ctx.sessions.active_count().await)
}

async fn stats(State(ctx): State<Arc<AppContext>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        running: ctx.device.is_running(),
        version: ctx.device.current_frame().version(),
        active: ctx.sessions.active_count().await,
        listeners: ctx.sessions.addresses().await,
        capture: ctx.device.stats(),
    })
}
