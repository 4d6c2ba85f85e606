//! 그래프 설정 렌더링과 그래프 데이터 추출
//!
//! 그래프 설정은 plotly.js 형식의 JSON이며, 데이터셋의 축 키(`x`, `y` 등)에
//! 표 컬럼 이름을 적습니다. 레이아웃에는 기본값을 채운 설정을, 데이터 응답에는
//! 컬럼 값 배열을 보냅니다.

use logalyzer_core::table::Table;
use logalyzer_core::types::FieldValue;
use regex::Regex;
use serde_json::{Map, Value, json};

/// 마커 크기 상한 기본값
pub const DEFAULT_MARKER_SIZE_MAX: i64 = 100;

/// 데이터셋 축 역할 조합 (앞에서부터 처음으로 모두 존재하는 조합 사용)
const AXIS_ROLES: [[&str; 2]; 3] = [["x", "y"], ["values", "labels"], ["lat", "lon"]];

/// 텍스트 템플릿 자리표시자
const TEXT_PLACEHOLDER: &str = r"\{\{(?P<key>[\d\s\w]*)\}\}";

fn default_data() -> Value {
    json!({
        "fill": "tozeroy",
        "line": { "shape": "spline" },
    })
}

fn default_layout() -> Value {
    json!({
        "height": 250,
        "automargin": true,
        "autosize": true,
        "margin": { "l": 60, "r": 20, "t": 30, "b": 65, "pad": 4 },
        "plot_bgcolor": "#F5F5F5",
        "paper_bgcolor": "rgba(0,0,0,0)",
        "geo": {
            "scope": "world",
            "showland": true,
            "landcolor": "rgb(217, 217, 217)",
            "subunitwidth": 1,
            "countrywidth": 1,
            "subunitcolor": "rgb(255,255,255)",
            "countrycolor": "rgb(255,255,255)",
            "showcoastlines": false,
            "showocean": true,
            "showcountries": true,
            "showsubunits": true,
            "resolution": 50,
            "showframe": false,
        },
    })
}

fn default_config() -> Value {
    json!({ "scrollZoom": true, "responsive": true })
}

fn fill_defaults(target: &mut Map<String, Value>, defaults: Value) {
    if let Value::Object(defaults) = defaults {
        for (key, value) in defaults {
            target.entry(key).or_insert(value);
        }
    }
}

/// 데이터셋에서 사용할 축 역할 조합을 찾습니다.
pub fn axis_roles(dataset: &Map<String, Value>) -> Option<[&'static str; 2]> {
    AXIS_ROLES
        .iter()
        .find(|roles| roles.iter().all(|r| dataset.contains_key(*r)))
        .copied()
}

/// 그래프 설정에 기본값을 채웁니다.
///
/// `data` 배열이나 `layout` 객체가 없으면 경고를 남기고 `None`을 돌려줍니다.
pub fn render_graph_config(dashboard_id: &str, config: &Value) -> Option<Value> {
    let mut rendered = config.as_object()?.clone();

    let data_ok = rendered.get("data").is_some_and(Value::is_array);
    let layout_ok = rendered.get("layout").is_some_and(Value::is_object);
    if !data_ok || !layout_ok {
        tracing::warn!(
            dashboard = dashboard_id,
            "graph config needs a 'data' array and a 'layout' object, graph ignored"
        );
        return None;
    }

    if let Some(Value::Object(layout)) = rendered.get_mut("layout") {
        fill_defaults(layout, default_layout());
    }
    if let Some(Value::Array(datasets)) = rendered.get_mut("data") {
        for dataset in datasets.iter_mut().filter_map(Value::as_object_mut) {
            if axis_roles(dataset).is_none() {
                tracing::error!(
                    dashboard = dashboard_id,
                    keys = ?dataset.keys().collect::<Vec<_>>(),
                    "no axis keys found in graph dataset"
                );
            }
            fill_defaults(dataset, default_data());
        }
    }
    rendered.entry("config").or_insert_with(default_config);

    Some(Value::Object(rendered))
}

fn column_json(table: &Table, dashboard_id: &str, column: &str) -> Vec<Value> {
    match table.column_index(column) {
        Some(idx) => table.rows.iter().map(|row| cell_json(&row[idx])).collect(),
        None => {
            tracing::warn!(
                dashboard = dashboard_id,
                column,
                "graph references a column missing from the table"
            );
            Vec::new()
        }
    }
}

fn cell_json(cell: &FieldValue) -> Value {
    serde_json::to_value(cell).unwrap_or(Value::Null)
}

fn marker_sizes(table: &Table, column: &str, max: i64) -> Vec<Value> {
    let Some(idx) = table.column_index(column) else {
        return Vec::new();
    };
    table
        .rows
        .iter()
        .map(|row| {
            let size = row[idx].as_f64().map_or(0, |v| v as i64);
            Value::from(size.min(max))
        })
        .collect()
}

fn push_series(graph_data: &mut Map<String, Value>, key: &str, value: Value) {
    if let Value::Array(list) = graph_data
        .entry(key.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        list.push(value);
    }
}

/// 쿼리 결과를 그래프 데이터로 바꾸는 렌더러
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    placeholder: Regex,
}

impl ChartRenderer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            placeholder: Regex::new(TEXT_PLACEHOLDER)?,
        })
    }

    /// `{{column}}` 자리표시자를 행마다 치환합니다.
    ///
    /// 표에 없는 컬럼은 빈 문자열로 바뀝니다.
    pub fn render_text(&self, template: &str, table: &Table) -> Vec<String> {
        let fields: Vec<(String, Option<usize>)> = self
            .placeholder
            .captures_iter(template)
            .filter_map(|caps| caps.name("key"))
            .map(|m| (m.as_str().to_owned(), table.column_index(m.as_str())))
            .collect();

        table
            .rows
            .iter()
            .map(|row| {
                fields.iter().fold(template.to_owned(), |text, (name, idx)| {
                    let value = idx.map(|i| row[i].to_string()).unwrap_or_default();
                    text.replace(&format!("{{{{{name}}}}}"), &value)
                })
            })
            .collect()
    }

    /// 쿼리 결과에서 그래프 데이터를 뽑습니다.
    ///
    /// 역할마다 데이터셋 순서대로 컬럼 값 배열을 하나씩 쌓습니다.
    /// `scattergeo` 데이터셋은 `text` 템플릿과 컬럼 이름으로 지정한
    /// `marker.size`도 렌더링합니다.
    pub fn extract_graph_data(
        &self,
        dashboard_id: &str,
        config: &Value,
        table: &Table,
    ) -> Map<String, Value> {
        let mut graph_data = Map::new();
        let datasets = config
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for dataset in datasets.iter().filter_map(Value::as_object) {
            for role in axis_roles(dataset).into_iter().flatten() {
                let values = dataset
                    .get(role)
                    .and_then(Value::as_str)
                    .map(|column| column_json(table, dashboard_id, column))
                    .unwrap_or_default();
                push_series(&mut graph_data, role, Value::Array(values));
            }

            if dataset.get("type").and_then(Value::as_str) != Some("scattergeo") {
                continue;
            }
            if let Some(template) = dataset.get("text").and_then(Value::as_str) {
                let texts = self
                    .render_text(template, table)
                    .into_iter()
                    .map(Value::from)
                    .collect();
                push_series(&mut graph_data, "text", Value::Array(texts));
            }
            let Some(marker) = dataset.get("marker").and_then(Value::as_object) else {
                continue;
            };
            if let Some(column) = marker.get("size").and_then(Value::as_str) {
                let max = marker
                    .get("sizemax")
                    .and_then(Value::as_i64)
                    .unwrap_or(DEFAULT_MARKER_SIZE_MAX);
                let mut rendered = marker.clone();
                rendered.insert(
                    "size".to_owned(),
                    Value::Array(marker_sizes(table, column, max)),
                );
                push_series(&mut graph_data, "marker", Value::Object(rendered));
            }
        }
        graph_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn geo_table() -> Table {
        let ts = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z").unwrap();
        Table {
            columns: vec!["city".into(), "lat".into(), "long".into(), "count".into()],
            rows: vec![
                vec![FieldValue::from("Paris"), FieldValue::Float(48.8), FieldValue::Float(2.3), FieldValue::Int(250)],
                vec![FieldValue::from("Lyon"), FieldValue::Float(45.7), FieldValue::Float(4.8), FieldValue::Int(7)],
            ],
            index: vec![ts, ts],
        }
    }

    #[test]
    fn render_fills_defaults_without_overriding() {
        let config = json!({
            "data": [{ "type": "scatter", "x": "timestamp", "y": "tcount", "fill": "none" }],
            "layout": { "height": 400 },
        });
        let rendered = render_graph_config("hits", &config).unwrap();
        assert_eq!(rendered["layout"]["height"], 400);
        assert_eq!(rendered["layout"]["plot_bgcolor"], "#F5F5F5");
        assert_eq!(rendered["layout"]["geo"]["resolution"], 50);
        assert_eq!(rendered["data"][0]["fill"], "none");
        assert_eq!(rendered["data"][0]["line"]["shape"], "spline");
        assert_eq!(rendered["config"]["scrollZoom"], true);
    }

    #[test]
    fn render_keeps_explicit_config() {
        let config = json!({
            "data": [{ "values": "count", "labels": "os" }],
            "layout": {},
            "config": { "displayModeBar": false },
        });
        let rendered = render_graph_config("os", &config).unwrap();
        assert_eq!(rendered["config"], json!({ "displayModeBar": false }));
    }

    #[test]
    fn render_drops_incomplete_configs() {
        assert!(render_graph_config("a", &json!({ "data": [] })).is_none());
        assert!(render_graph_config("a", &json!({ "layout": {} })).is_none());
        assert!(render_graph_config("a", &json!("nope")).is_none());
    }

    #[test]
    fn axis_roles_prefers_first_complete_set() {
        let ds = json!({ "lat": "lat", "lon": "long", "x": "a" });
        assert_eq!(axis_roles(ds.as_object().unwrap()), Some(["lat", "lon"]));
        let ds = json!({ "x": "a", "y": "b", "values": "c", "labels": "d" });
        assert_eq!(axis_roles(ds.as_object().unwrap()), Some(["x", "y"]));
        assert_eq!(axis_roles(json!({}).as_object().unwrap()), None);
    }

    #[test]
    fn extracts_columns_per_role() {
        let config = json!({
            "data": [
                { "x": "city", "y": "count" },
                { "x": "city", "y": "missing" },
            ],
            "layout": {},
        });
        let data = ChartRenderer::new().unwrap().extract_graph_data("cities", &config, &geo_table());
        assert_eq!(data["x"], json!([["Paris", "Lyon"], ["Paris", "Lyon"]]));
        assert_eq!(data["y"], json!([[250, 7], []]));
    }

    #[test]
    fn scattergeo_renders_text_and_capped_marker_sizes() {
        let config = json!({
            "data": [{
                "type": "scattergeo",
                "lat": "lat",
                "lon": "long",
                "text": "{{city}}: {{count}} hits",
                "marker": { "size": "count", "color": "red" },
            }],
            "layout": {},
        });
        let data = ChartRenderer::new().unwrap().extract_graph_data("geo", &config, &geo_table());
        assert_eq!(data["lat"], json!([[48.8, 45.7]]));
        assert_eq!(data["text"], json!([["Paris: 250 hits", "Lyon: 7 hits"]]));
        assert_eq!(data["marker"][0]["size"], json!([100, 7]));
        assert_eq!(data["marker"][0]["color"], "red");
    }

    #[test]
    fn text_template_blanks_unknown_columns() {
        let texts = ChartRenderer::new()
            .unwrap()
            .render_text("{{city}} / {{nope}}", &geo_table());
        assert_eq!(texts, ["Paris / ", "Lyon / "]);
    }

    #[test]
    fn numeric_marker_size_is_left_alone() {
        let config = json!({
            "data": [{ "type": "scattergeo", "lat": "lat", "lon": "long", "marker": { "size": 8 } }],
            "layout": {},
        });
        let data = ChartRenderer::new().unwrap().extract_graph_data("geo", &config, &geo_table());
        assert!(!data.contains_key("marker"));
    }

    #[test]
    fn marker_size_respects_sizemax() {
        let config = json!({
            "data": [{ "type": "scattergeo", "lat": "lat", "lon": "long",
                       "marker": { "size": "count", "sizemax": 10 } }],
            "layout": {},
        });
        let data = ChartRenderer::new().unwrap().extract_graph_data("geo", &config, &geo_table());
        assert_eq!(data["marker"][0]["size"], json!([10, 7]));
    }
}
