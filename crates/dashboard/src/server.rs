//! 대시보드 HTTP 서버 (axum)
//!
//! # 라우트
//!
//! | 경로 | 응답 |
//! |------|------|
//! | `GET /` | 레이아웃이 내장된 HTML 셸 |
//! | `GET /layout` | 레이아웃 JSON |
//! | `GET /data` | 모든 비-컨텍스트 뷰의 표/그래프 데이터 |
//! | `GET /context/{view}/{key}` | 드릴다운 표 (`key`는 표준 base64) |
//! | `GET /health` | 상태, 레코드 수, 가동 시간 |
//!
//! 스냅샷은 잠금 대기가 블로킹이므로 `spawn_blocking` 안에서 얻고,
//! 쿼리도 같은 블로킹 태스크에서 실행합니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{MatchedPath, Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use logalyzer_core::metrics as m;
use logalyzer_log_pipeline::Dataset;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::error::DashboardError;
use crate::html;
use crate::view::Dashboards;

/// 라우터 공유 상태
#[derive(Clone)]
pub struct DashboardState {
    dashboards: Arc<Dashboards>,
    dataset: Arc<Dataset>,
    started: Instant,
}

impl DashboardState {
    pub fn new(dashboards: Arc<Dashboards>, dataset: Arc<Dataset>) -> Self {
        Self {
            dashboards,
            dataset,
            started: Instant::now(),
        }
    }

    pub fn dashboards(&self) -> &Dashboards {
        &self.dashboards
    }
}

/// `/health` 응답
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
    pub uptime_secs: u64,
}

/// 라우터를 만듭니다.
pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/layout", get(layout_handler))
        .route("/data", get(data_handler))
        .route("/context/{view}/{key}", get(context_handler))
        .route("/health", get(health_handler))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

/// 주소에 바인드합니다.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, DashboardError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| DashboardError::Server(format!("failed to bind {host}:{port}: {e}")))?;
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(addr = %addr, "dashboard server listening");
    }
    Ok(listener)
}

/// `shutdown`이 완료될 때까지 요청을 처리합니다.
pub async fn serve(
    listener: TcpListener,
    state: DashboardState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DashboardError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("dashboard server stopped");
    Ok(())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_owned(), |p| p.as_str().to_owned());
    let start = Instant::now();
    let response = next.run(request).await;

    metrics::counter!(m::DASHBOARD_REQUESTS_TOTAL, m::LABEL_ENDPOINT => endpoint.clone())
        .increment(1);
    metrics::histogram!(m::DASHBOARD_REQUEST_DURATION_SECONDS, m::LABEL_ENDPOINT => endpoint.clone())
        .record(start.elapsed().as_secs_f64());
    tracing::debug!(
        endpoint = %endpoint,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dashboard request"
    );
    response
}

/// 데이터셋 스냅샷을 얻어 블로킹 스레드에서 `work`를 실행합니다.
async fn with_snapshot<T, F>(state: &DashboardState, work: F) -> Result<T, StatusCode>
where
    T: Send + 'static,
    F: FnOnce(&Dashboards, &logalyzer_log_pipeline::Snapshot) -> T + Send + 'static,
{
    let dashboards = Arc::clone(&state.dashboards);
    let dataset = Arc::clone(&state.dataset);
    tokio::task::spawn_blocking(move || {
        let snapshot = dataset.snapshot();
        work(&dashboards, &snapshot)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "dashboard query task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn index_handler(State(state): State<DashboardState>) -> Html<String> {
    Html(html::render_index(&state.dashboards.layout()))
}

async fn layout_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(state.dashboards.layout())
}

async fn data_handler(State(state): State<DashboardState>) -> Result<Response, StatusCode> {
    let data = with_snapshot(&state, |dashboards, snapshot| dashboards.data(snapshot)).await?;
    Ok(Json(data).into_response())
}

async fn context_handler(
    State(state): State<DashboardState>,
    Path((view, key)): Path<(String, String)>,
) -> Result<Json<Value>, StatusCode> {
    let key = STANDARD
        .decode(key.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .ok_or_else(|| {
            tracing::warn!(view = %view, "context key is not base64-encoded UTF-8");
            StatusCode::BAD_REQUEST
        })?;

    let context = with_snapshot(&state, move |dashboards, snapshot| {
        dashboards.context(&view, &key, snapshot)
    })
    .await?;

    let body = match context {
        Some(ctx) => serde_json::to_value(ctx).unwrap_or_else(|_| json!({})),
        None => json!({}),
    };
    Ok(Json(body))
}

async fn health_handler(
    State(state): State<DashboardState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let dataset = Arc::clone(&state.dataset);
    let records = tokio::task::spawn_blocking(move || dataset.len_within_timeout())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "health task failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(HealthResponse {
        status: "healthy",
        records,
        uptime_secs: state.started.elapsed().as_secs(),
    }))
}
