//! 대시보드 뷰 -- 레이아웃, 데이터, 컨텍스트 응답
//!
//! 설정의 `[[dashboards]]` 항목마다 쿼리 정의와 렌더링된 그래프 설정을
//! 준비해 두고, 요청마다 스냅샷 하나에 대해 쿼리를 실행합니다.

use std::collections::HashSet;

use logalyzer_core::config::{DashboardConfig, ServerConfig};
use logalyzer_core::metrics as m;
use logalyzer_core::table::Table;
use logalyzer_core::types::FieldValue;
use logalyzer_log_pipeline::Snapshot;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::chart::{ChartRenderer, render_graph_config};
use crate::error::DashboardError;
use crate::html;
use crate::query::{Filter, QuerySpec};

/// 배지 id 접미어
pub const BADGE_SUFFIX: &str = "_badge";

/// 컨텍스트 모달 표 id
pub const MODAL_TABLE_ID: &str = "db-modal-table";

/// 큰 뷰가 홀수 위치에 올 때 앞에 끼워 넣는 빈 칸
pub const EMPTY_SLOT_ID: &str = "_empty_";

/// 큰 뷰 뒤에 끼워 넣는 숨은 칸
pub const HIDDEN_SLOT_ID: &str = "_hidden_";

// ─── 응답 타입 ──────────────────────────────────────────────────────

/// 페이지 레이아웃
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub badges: Vec<BadgeLayout>,
    pub dashboards: Vec<ViewLayout>,
    pub refresh_times: Vec<u64>,
}

/// 배지 하나
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BadgeLayout {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub badge_type: String,
}

/// 뷰 하나의 레이아웃
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewLayout {
    pub id: String,
    pub title: String,
    pub columns: Vec<String>,
    pub order: Option<Value>,
    pub hide: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctxt_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_config: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub large: bool,
}

impl ViewLayout {
    /// 격자 정렬용 빈 칸
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            title: String::new(),
            columns: Vec::new(),
            order: None,
            hide: Vec::new(),
            ctxt_filter: None,
            graph_config: None,
            large: false,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == EMPTY_SLOT_ID || self.id == HIDDEN_SLOT_ID
    }
}

/// `/data` 응답
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataResponse {
    pub dashboards: Vec<ViewData>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 뷰 하나의 데이터
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewData {
    pub db_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_value: Option<usize>,
    pub table_data: Vec<Vec<FieldValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_data: Option<Map<String, Value>>,
}

/// `/context` 응답
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextResponse {
    pub table_id: String,
    pub table_cols: Vec<String>,
    pub table_data: Vec<Vec<FieldValue>>,
    pub title: String,
    pub html: String,
}

// ─── 뷰 ─────────────────────────────────────────────────────────────

/// 설정 하나와 미리 준비한 쿼리/그래프
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    query: QuerySpec,
    graph_config: Option<Value>,
}

impl Dashboard {
    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn query(&self) -> &QuerySpec {
        &self.query
    }

    /// 스냅샷에 쿼리를 실행합니다.
    ///
    /// 쿼리 에러는 경고 로그와 함께 빈 표가 됩니다.
    fn run(&self, snapshot: &Snapshot, query: &QuerySpec, filter: Option<&Filter>) -> Table {
        if snapshot.is_empty() {
            return Table::empty(query.output_columns());
        }
        match query.run(snapshot.to_table(), filter) {
            Ok(table) => table,
            Err(e) => {
                metrics::counter!(m::DASHBOARD_QUERY_ERRORS_TOTAL).increment(1);
                tracing::warn!(dashboard = %self.config.id, error = %e, "dashboard query failed");
                Table::empty(query.output_columns())
            }
        }
    }
}

/// 설정 순서대로 정렬된 대시보드 모음
#[derive(Debug, Clone)]
pub struct Dashboards {
    views: Vec<Dashboard>,
    charts: ChartRenderer,
    range_time_format: String,
    refresh_times: Vec<u64>,
}

fn config_error(id: &str, reason: impl Into<String>) -> DashboardError {
    DashboardError::Config {
        id: id.to_owned(),
        reason: reason.into(),
    }
}

impl Dashboards {
    /// 설정을 검증하고 대시보드를 준비합니다.
    ///
    /// id 중복, 필터 없는 컨텍스트 뷰, 잘못된 `on_click` 대상,
    /// 파싱할 수 없는 `time_group`은 에러입니다.
    pub fn from_config(
        configs: &[DashboardConfig],
        server: &ServerConfig,
    ) -> Result<Self, DashboardError> {
        let mut seen = HashSet::new();
        for db in configs {
            if db.id.is_empty() {
                return Err(config_error("", "id must not be empty"));
            }
            if !seen.insert(db.id.as_str()) {
                return Err(config_error(&db.id, "duplicate dashboard id"));
            }
            if db.contextual && db.filter.as_deref().is_none_or(str::is_empty) {
                return Err(config_error(&db.id, "contextual dashboards require a filter"));
            }
        }

        for db in configs {
            if let Some(target) = &db.on_click {
                match configs.iter().find(|c| &c.id == target) {
                    Some(c) if c.contextual => {}
                    Some(_) => {
                        return Err(config_error(
                            &db.id,
                            format!("on_click target '{target}' is not contextual"),
                        ));
                    }
                    None => {
                        return Err(config_error(
                            &db.id,
                            format!("on_click target '{target}' does not exist"),
                        ));
                    }
                }
            }
        }

        let views = configs
            .iter()
            .map(|db| {
                let query =
                    QuerySpec::from_config(db).map_err(|e| config_error(&db.id, e.to_string()))?;
                let graph_config = db
                    .graph_config
                    .as_ref()
                    .and_then(|g| render_graph_config(&db.id, g));
                Ok(Dashboard {
                    config: db.clone(),
                    query,
                    graph_config,
                })
            })
            .collect::<Result<Vec<_>, DashboardError>>()?;

        tracing::info!(dashboards = views.len(), "dashboards configured");

        Ok(Self {
            views,
            charts: ChartRenderer::new()?,
            range_time_format: server.range_time_format.clone(),
            refresh_times: server.refresh_times.clone(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&Dashboard> {
        self.views.iter().find(|v| v.id() == id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    fn main_views(&self) -> impl Iterator<Item = &Dashboard> {
        self.views.iter().filter(|v| !v.config.contextual)
    }

    /// 페이지 레이아웃을 만듭니다.
    pub fn layout(&self) -> Layout {
        let mut badges = Vec::new();
        let mut dashboards: Vec<ViewLayout> = Vec::new();

        for view in self.main_views() {
            let db = &view.config;
            if let Some(title) = &db.badge_title {
                badges.push(BadgeLayout {
                    id: format!("{}{BADGE_SUFFIX}", db.id),
                    title: title.clone(),
                    badge_type: db.badge_type.clone(),
                });
            }

            if db.large && dashboards.len() % 2 != 0 {
                dashboards.push(ViewLayout::placeholder(EMPTY_SLOT_ID));
            }

            let ctxt_filter = db
                .on_click
                .as_deref()
                .and_then(|target| self.get(target))
                .and_then(|target| target.config.filter.clone());

            dashboards.push(ViewLayout {
                id: db.id.clone(),
                title: db.table_title.clone(),
                columns: view.query.output_columns(),
                order: db.table_order.clone(),
                hide: db.table_hide.clone(),
                ctxt_filter,
                graph_config: view.graph_config.clone(),
                large: db.large,
            });

            if db.large {
                dashboards.push(ViewLayout::placeholder(HIDDEN_SLOT_ID));
            }
        }

        Layout {
            badges,
            dashboards,
            refresh_times: self.refresh_times.clone(),
        }
    }

    /// 모든 비-컨텍스트 뷰의 데이터를 계산합니다.
    pub fn data(&self, snapshot: &Snapshot) -> DataResponse {
        let dashboards = self
            .main_views()
            .map(|view| {
                let table = view.run(snapshot, &view.query, None);
                let badge = view.config.badge_title.is_some();
                let graph_data = view
                    .graph_config
                    .as_ref()
                    .map(|g| self.charts.extract_graph_data(view.id(), g, &table));
                ViewData {
                    db_id: view.id().to_owned(),
                    badge_id: badge.then(|| format!("{}{BADGE_SUFFIX}", view.id())),
                    badge_value: badge.then_some(table.len()),
                    table_data: table.rows,
                    graph_data,
                }
            })
            .collect();

        let format = |ts: chrono::DateTime<chrono::FixedOffset>| {
            ts.format(&self.range_time_format).to_string()
        };
        DataResponse {
            dashboards,
            start_date: snapshot.first_timestamp().map(&format),
            end_date: snapshot.last_timestamp().map(&format),
        }
    }

    /// 뷰의 행 클릭에 대한 드릴다운 표를 만듭니다.
    ///
    /// 뷰가 없거나 `on_click`이 없으면 `None`입니다.
    pub fn context(&self, view: &str, key: &str, snapshot: &Snapshot) -> Option<ContextResponse> {
        let parent = self.get(view)?;
        let target_id = parent.config.on_click.as_deref()?;
        let Some(target) = self.get(target_id) else {
            tracing::warn!(dashboard = view, target = target_id, "on_click target not found");
            return None;
        };

        let mut filter_key = target.config.filter.clone().unwrap_or_default();
        if filter_key == "timestamp" {
            if let Some(group) = &parent.config.time_group {
                filter_key = group.clone();
            }
        }
        let filter = Filter::new(filter_key, key);

        let query = QuerySpec {
            time_group: None,
            ..target.query.clone()
        };
        let table = target.run(snapshot, &query, Some(&filter));

        let title = target.config.table_title.replace("{}", key);
        let html = html::render_modal(&title, MODAL_TABLE_ID, &table.columns);
        Some(ContextResponse {
            table_id: MODAL_TABLE_ID.to_owned(),
            table_cols: table.columns,
            table_data: table.rows,
            title,
            html,
        })
    }
}
