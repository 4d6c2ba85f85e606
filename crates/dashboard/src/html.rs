//! HTML 렌더링
//!
//! 대시보드 셸 페이지는 레이아웃 JSON을 내장하고, 표와 그래프는 브라우저에서
//! `/data` 응답으로 채웁니다.

use std::fmt::Write;

use crate::view::{HIDDEN_SLOT_ID, Layout, ViewLayout};

const PLOTLY_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// HTML 특수 문자를 이스케이프합니다.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<script>` 안에 넣을 JSON 문자열에서 태그 종료를 막습니다.
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn table_head(columns: &[String]) -> String {
    let mut head = String::from("<thead><tr>");
    for col in columns {
        let class = if col == "timestamp" {
            " class=\"time_column\""
        } else {
            ""
        };
        let _ = write!(head, "<th{class}>{}</th>", escape(col));
    }
    head.push_str("</tr></thead>");
    head
}

fn view_card(out: &mut String, view: &ViewLayout) {
    if view.is_placeholder() {
        let hidden = if view.id == HIDDEN_SLOT_ID { " db-hidden" } else { "" };
        let _ = write!(
            out,
            "<div class=\"db-placeholder{hidden}\" id=\"{}\"></div>",
            escape(&view.id)
        );
        return;
    }
    let width = if view.large { "db-card db-large" } else { "db-card" };
    let id = escape(&view.id);
    let _ = write!(
        out,
        "<section class=\"{width}\" id=\"db-card-{id}\"><h2>{}</h2>",
        escape(&view.title)
    );
    if view.graph_config.is_some() {
        let _ = write!(out, "<div class=\"db-chart\" id=\"db-card-chart-{id}\"></div>");
    }
    let _ = write!(
        out,
        "<table class=\"db-table\" id=\"db-card-table-{id}\" data-db=\"{id}\">{}<tbody></tbody></table></section>",
        table_head(&view.columns)
    );
}

/// 대시보드 셸 페이지를 렌더링합니다.
pub fn render_index(layout: &Layout) -> String {
    let layout_json = serde_json::to_string(layout).unwrap_or_else(|_| "{}".to_owned());

    let mut badges = String::new();
    for badge in &layout.badges {
        let _ = write!(
            badges,
            "<div class=\"badge badge-{}\"><span class=\"badge-title\">{}</span><span class=\"badge-value\" id=\"{}\">-</span></div>",
            escape(&badge.badge_type),
            escape(&badge.title),
            escape(&badge.id),
        );
    }

    let mut cards = String::new();
    for view in &layout.dashboards {
        view_card(&mut cards, view);
    }

    let mut refresh = String::new();
    for secs in &layout.refresh_times {
        let _ = write!(refresh, "<option value=\"{secs}\">{secs}s</option>");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>logalyzer</title>
<script src="{PLOTLY_URL}"></script>
<style>
body {{ font-family: sans-serif; margin: 1em; background: #fafafa; }}
#badges {{ display: flex; gap: 1em; margin-bottom: 1em; }}
.badge {{ padding: .5em 1em; border-radius: 4px; background: #ddd; }}
.badge-value {{ font-weight: bold; margin-left: .5em; }}
#dashboard-cards {{ display: grid; grid-template-columns: 1fr 1fr; gap: 1em; }}
.db-large {{ grid-column: span 2; }}
.db-hidden {{ display: none; }}
.db-card {{ background: #fff; padding: .5em; overflow: auto; max-height: 40em; }}
.db-table {{ border-collapse: collapse; width: 100%; font-size: .85em; }}
.db-table td, .db-table th {{ border-bottom: 1px solid #eee; padding: 2px 6px; text-align: left; }}
.db-table tbody tr {{ cursor: pointer; }}
#db_modal {{ display: none; position: fixed; inset: 5%; background: #fff; overflow: auto; padding: 1em; box-shadow: 0 0 20px #888; }}
</style>
</head>
<body>
<header>
<span>From <b id="start_date">-</b> to <b id="end_date">-</b></span>
<label>Refresh <select id="refresh"><option value="0">off</option>{refresh}</select></label>
</header>
<div id="badges">{badges}</div>
<div id="dashboard-cards">{cards}</div>
<div id="db_modal"></div>
<script id="layout-json" type="application/json">{layout}</script>
<script>
const layout = JSON.parse(document.getElementById("layout-json").textContent);
const views = Object.fromEntries(layout.dashboards.map(v => [v.id, v]));
function fillTable(el, rows) {{
  const body = el.querySelector("tbody");
  body.innerHTML = "";
  for (const row of rows) {{
    const tr = document.createElement("tr");
    for (const cell of row) {{
      const td = document.createElement("td");
      td.textContent = cell === null ? "" : cell;
      tr.appendChild(td);
    }}
    body.appendChild(tr);
  }}
}}
function b64(text) {{
  return btoa(String.fromCharCode(...new TextEncoder().encode(text)));
}}
async function openContext(dbId, key) {{
  const resp = await fetch("context/" + encodeURIComponent(dbId) + "/" + encodeURIComponent(b64(String(key))));
  const data = await resp.json();
  if (!data.html) return;
  const modal = document.getElementById("db_modal");
  modal.innerHTML = data.html;
  fillTable(document.getElementById(data.table_id), data.table_data);
  modal.style.display = "block";
  modal.onclick = () => {{ modal.style.display = "none"; }};
}}
for (const view of layout.dashboards) {{
  if (view.graph_config) {{
    const g = view.graph_config;
    Plotly.newPlot("db-card-chart-" + view.id, g.data, g.layout, g.config);
  }}
  const table = document.getElementById("db-card-table-" + view.id);
  if (table && view.ctxt_filter) {{
    table.addEventListener("click", ev => {{
      const tr = ev.target.closest("tr");
      if (tr && tr.parentElement.tagName === "TBODY") openContext(view.id, tr.cells[0].textContent);
    }});
  }}
}}
async function refreshData() {{
  const resp = await fetch("data");
  const data = await resp.json();
  document.getElementById("start_date").textContent = data.start_date ?? "-";
  document.getElementById("end_date").textContent = data.end_date ?? "-";
  for (const db of data.dashboards) {{
    if (db.badge_id) document.getElementById(db.badge_id).textContent = db.badge_value;
    if (db.graph_data && views[db.db_id].graph_config) Plotly.restyle("db-card-chart-" + db.db_id, db.graph_data);
    fillTable(document.getElementById("db-card-table-" + db.db_id), db.table_data);
  }}
}}
let timer = null;
document.getElementById("refresh").addEventListener("change", ev => {{
  clearInterval(timer);
  const secs = Number(ev.target.value);
  if (secs > 0) timer = setInterval(refreshData, secs * 1000);
}});
refreshData();
</script>
</body>
</html>
"#,
        layout = script_json(&layout_json),
    )
}

/// 컨텍스트 모달 조각을 렌더링합니다.
pub fn render_modal(title: &str, table_id: &str, columns: &[String]) -> String {
    format!(
        "<div class=\"db-modal\"><h2>{}</h2><table class=\"db-table\" id=\"{}\">{}<tbody></tbody></table></div>",
        escape(title),
        escape(table_id),
        table_head(columns),
    )
}
