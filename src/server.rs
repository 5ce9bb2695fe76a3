//! HTTP 入口 - 定时任务或 Webhook 调用此接口触发一次召回

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::RuntimeConfig;
use crate::reengagement::{self, ReEngagementPipeline};

/// 流水线来源
pub enum PipelineSource {
    /// 每次调用时按配置构建（配置不完整时返回 500）
    Config(RuntimeConfig),
    /// 预先构建好的流水线
    Prebuilt(Arc<ReEngagementPipeline>),
}

#[derive(Clone)]
pub struct ServerState {
    source: Arc<PipelineSource>,
    /// 同一进程内串行执行调用
    gate: Arc<Mutex<()>>,
}

impl ServerState {
    pub fn new(source: PipelineSource) -> Self {
        Self {
            source: Arc::new(source),
            gate: Arc::new(Mutex::new(())),
        }
    }
}

pub fn app_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/send-reengagement-notifications",
            get(send_notifications).post(send_notifications),
        )
        .with_state(state)
}

/// 启动 HTTP 服务，Ctrl-C 退出
pub async fn serve(config: RuntimeConfig, host: &str, port: u16) -> Result<()> {
    let bind_addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind server at {bind_addr}"))?;
    info!(addr = %listener.local_addr()?, "Re-engagement server listening");

    axum::serve(listener, app_router(ServerState::new(PipelineSource::Config(config))))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server failed")
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

async fn send_notifications(State(state): State<ServerState>) -> Response {
    let _guard = state.gate.lock().await;
    let now = Utc::now();

    let response = match state.source.as_ref() {
        PipelineSource::Config(config) => reengagement::invoke(config, now).await,
        PipelineSource::Prebuilt(pipeline) => reengagement::invoke_with(pipeline, now).await,
    };

    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}
