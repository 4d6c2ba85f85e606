//! 내장 보강 플러그인
//!
//! | 클래스 | 추가 필드 | 설정 |
//! |---|---|---|
//! | `url_query` | `aux_param` | `enable` (기본 true) |
//! | `url_prefix` | `aux_<field>` | `field` (기본 `category`), `default`, `[[rules]] prefix/label` |
//! | `ip_label` | `aux_<field>` | `field` (기본 `ip_label`), 레이블 파일은 `<root>/<path>` |

use std::collections::HashMap;

use logalyzer_core::error::EnrichError;
use logalyzer_core::plugin::{Enricher, EnricherContext, EnricherRegistry};
use logalyzer_core::types::{FieldValue, LogRecord};
use tracing::debug;

/// 내장 플러그인 팩토리를 레지스트리에 등록합니다.
pub fn register_builtin(registry: &mut EnricherRegistry) {
    registry.register_factory(UrlQueryEnricher::CLASS, UrlQueryEnricher::create);
    registry.register_factory(UrlPrefixEnricher::CLASS, UrlPrefixEnricher::create);
    registry.register_factory(IpLabelEnricher::CLASS, IpLabelEnricher::create);
}

/// 레지스트리를 만들고 내장 플러그인을 등록합니다.
pub fn builtin_registry() -> EnricherRegistry {
    let mut registry = EnricherRegistry::new();
    register_builtin(&mut registry);
    registry
}

fn field_name(ctx: &EnricherContext, default: &str) -> Result<String, EnrichError> {
    match ctx.config.get("field") {
        None => Ok(default.to_owned()),
        Some(value) => value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ctx.construction_error("'field' must be a string")),
    }
}

// ─── url_query ───────────────────────────────────────────────────────

/// URL의 쿼리 문자열을 `aux_param`으로 추가합니다.
pub struct UrlQueryEnricher {
    enabled: bool,
    fields: Vec<String>,
}

impl UrlQueryEnricher {
    pub const CLASS: &'static str = "url_query";

    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            fields: vec!["param".to_owned()],
        }
    }

    fn create(ctx: &EnricherContext) -> Result<Box<dyn Enricher>, EnrichError> {
        Ok(Box::new(Self::new(ctx.get_bool("enable", true))))
    }
}

impl Enricher for UrlQueryEnricher {
    fn name(&self) -> &str {
        Self::CLASS
    }

    fn aux_fields(&self) -> &[String] {
        &self.fields
    }

    fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError> {
        let query = if self.enabled {
            record
                .core
                .http_url
                .split_once('?')
                .map(|(_, query)| query.to_owned())
        } else {
            None
        };
        debug!(url = %record.core.http_url, "parsed url");
        record.add_aux("param", query);
        Ok(())
    }
}

// ─── url_prefix ──────────────────────────────────────────────────────

/// URL 접두어 규칙으로 레이블을 붙입니다. 첫 번째로 일치하는 규칙이 이깁니다.
pub struct UrlPrefixEnricher {
    field: String,
    fields: Vec<String>,
    rules: Vec<(String, String)>,
    default: Option<String>,
}

impl UrlPrefixEnricher {
    pub const CLASS: &'static str = "url_prefix";

    pub fn new(field: impl Into<String>, rules: Vec<(String, String)>, default: Option<String>) -> Self {
        let field = field.into();
        Self {
            fields: vec![field.clone()],
            field,
            rules,
            default,
        }
    }

    fn create(ctx: &EnricherContext) -> Result<Box<dyn Enricher>, EnrichError> {
        let field = field_name(ctx, "category")?;
        let default = ctx.get_str("default").map(str::to_owned);

        let mut rules = Vec::new();
        if let Some(value) = ctx.config.get("rules") {
            let entries = value
                .as_array()
                .ok_or_else(|| ctx.construction_error("'rules' must be an array of tables"))?;
            for (i, entry) in entries.iter().enumerate() {
                let prefix = entry.get("prefix").and_then(|v| v.as_str());
                let label = entry.get("label").and_then(|v| v.as_str());
                match (prefix, label) {
                    (Some(prefix), Some(label)) => rules.push((prefix.to_owned(), label.to_owned())),
                    _ => {
                        return Err(ctx.construction_error(format!(
                            "rule #{i} needs string 'prefix' and 'label'"
                        )));
                    }
                }
            }
        }

        Ok(Box::new(Self::new(field, rules, default)))
    }
}

impl Enricher for UrlPrefixEnricher {
    fn name(&self) -> &str {
        Self::CLASS
    }

    fn aux_fields(&self) -> &[String] {
        &self.fields
    }

    fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError> {
        let label = self
            .rules
            .iter()
            .find(|(prefix, _)| record.core.http_url.starts_with(prefix.as_str()))
            .map(|(_, label)| label.clone())
            .or_else(|| self.default.clone());
        record.add_aux(&self.field, label);
        Ok(())
    }
}

// ─── ip_label ────────────────────────────────────────────────────────

/// 원격 주소별 레이블 파일(TOML `ip = "label"`)로 레이블을 붙입니다.
pub struct IpLabelEnricher {
    field: String,
    fields: Vec<String>,
    labels: HashMap<String, String>,
}

impl IpLabelEnricher {
    pub const CLASS: &'static str = "ip_label";

    pub fn new(field: impl Into<String>, labels: HashMap<String, String>) -> Self {
        let field = field.into();
        Self {
            fields: vec![field.clone()],
            field,
            labels,
        }
    }

    fn create(ctx: &EnricherContext) -> Result<Box<dyn Enricher>, EnrichError> {
        let field = field_name(ctx, "ip_label")?;
        let path = ctx.resolve(&ctx.path);
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ctx.construction_error(format!("cannot read {}: {e}", path.display())))?;
        let table: toml::Table = toml::from_str(&content)
            .map_err(|e| ctx.construction_error(format!("cannot parse {}: {e}", path.display())))?;

        let mut labels = HashMap::with_capacity(table.len());
        for (ip, label) in table {
            let label = label.as_str().ok_or_else(|| {
                ctx.construction_error(format!("label for '{ip}' must be a string"))
            })?;
            labels.insert(ip, label.to_owned());
        }

        Ok(Box::new(Self::new(field, labels)))
    }
}

impl Enricher for IpLabelEnricher {
    fn name(&self) -> &str {
        Self::CLASS
    }

    fn aux_fields(&self) -> &[String] {
        &self.fields
    }

    fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError> {
        let label = self.labels.get(&record.core.remote_ip).cloned();
        record.add_aux(&self.field, FieldValue::from(label));
        Ok(())
    }
}
