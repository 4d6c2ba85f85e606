//! 보강 플러그인 시스템 -- 보조 필드를 붙이는 플러그인 등록과 실행
//!
//! [`Enricher`] trait은 레코드 하나에 `aux_` 보조 필드를 추가하는 계약입니다.
//! 플러그인은 디스크에서 동적으로 로드하지 않고, 컴파일 시점에 등록된
//! 팩토리([`EnricherFactory`])를 클래스 식별자로 찾아 생성합니다.
//!
//! # 실행 순서
//! ```text
//! 설정 순서대로 load → 레코드마다 enrich (앞 플러그인의 필드를 뒤 플러그인이 볼 수 있음)
//!                   → 실패한 플러그인의 선언 필드 Null 백필
//!                   → 선언 순서로 보조 필드 정렬 + 누락 필드 Null 백필
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::{EnricherEntry, EnrichersConfig};
use crate::error::EnrichError;
use crate::metrics as m;
use crate::types::{FieldValue, LogRecord, aux_field_name, is_core_field};

// ─── Enricher Trait ──────────────────────────────────────────────────

/// 레코드에 보조 필드를 추가하는 플러그인 trait
///
/// # 구현 예시
/// ```ignore
/// struct Upper { fields: Vec<String> }
///
/// impl Enricher for Upper {
///     fn name(&self) -> &str { "upper" }
///     fn aux_fields(&self) -> &[String] { &self.fields }
///     fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError> {
///         record.add_aux("upper_url", record.core.http_url.to_uppercase());
///         Ok(())
///     }
/// }
/// ```
pub trait Enricher: Send {
    /// 플러그인 이름 (로그용)
    fn name(&self) -> &str;

    /// 이 플러그인이 추가하는 보조 필드 이름 (접두어 없음)
    fn aux_fields(&self) -> &[String];

    /// 레코드를 보강합니다.
    ///
    /// [`LogRecord::add_aux`]로 필드를 추가합니다.
    fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError>;
}

// ─── EnricherContext ─────────────────────────────────────────────────

/// 플러그인 생성 시 팩토리에 전달되는 컨텍스트
#[derive(Debug, Clone)]
pub struct EnricherContext {
    /// 설정의 `path` (플러그인 식별용 경로)
    pub path: String,
    /// 설정의 `class`
    pub class: String,
    /// 플러그인 루트 디렉토리 (`enrichers.root`)
    pub root: PathBuf,
    /// 플러그인별 설정 테이블
    pub config: toml::Table,
}

impl EnricherContext {
    /// 설정 항목으로 컨텍스트를 만듭니다.
    pub fn new(entry: &EnricherEntry, root: impl AsRef<Path>) -> Self {
        Self {
            path: entry.path.clone(),
            class: entry.class.clone(),
            root: root.as_ref().to_path_buf(),
            config: entry.config.clone(),
        }
    }

    /// 문자열 설정 값
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(|v| v.as_str())
    }

    /// 불리언 설정 값 (없으면 `default`)
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.config
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// 루트 기준 상대 경로를 해석합니다.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// 생성 실패 에러를 만듭니다.
    pub fn construction_error(&self, reason: impl Into<String>) -> EnrichError {
        EnrichError::Construction {
            class: self.class.clone(),
            reason: reason.into(),
        }
    }
}

/// 플러그인 팩토리 함수
pub type EnricherFactory = fn(&EnricherContext) -> Result<Box<dyn Enricher>, EnrichError>;

// ─── EnricherRegistry ────────────────────────────────────────────────

struct LoadedEnricher {
    enricher: Box<dyn Enricher>,
    /// 접두어 포함 선언 필드
    declared: Vec<String>,
}

/// 보강 플러그인 레지스트리
///
/// 팩토리 등록과 활성 플러그인 목록을 함께 관리합니다.
/// 활성 플러그인은 설정 순서대로 실행됩니다.
///
/// # 사용 예시
/// ```ignore
/// let mut registry = EnricherRegistry::new();
/// registry.register_factory("url_query", UrlQueryEnricher::from_context);
/// registry.load(&config.enrichers);
///
/// registry.enrich(&mut record);
/// ```
#[derive(Default)]
pub struct EnricherRegistry {
    factories: HashMap<String, EnricherFactory>,
    active: Vec<LoadedEnricher>,
    /// 모든 활성 플러그인의 선언 필드 (접두어 포함, 실행 순서)
    declared: Vec<String>,
}

impl EnricherRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 클래스 식별자로 팩토리를 등록합니다.
    ///
    /// 같은 클래스가 이미 있으면 교체합니다.
    pub fn register_factory(&mut self, class: impl Into<String>, factory: EnricherFactory) {
        let class = class.into();
        if self.factories.insert(class.clone(), factory).is_some() {
            warn!(class = %class, "enricher factory replaced");
        }
    }

    /// 등록된 팩토리 클래스 목록 (정렬됨)
    pub fn classes(&self) -> Vec<&str> {
        let mut classes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        classes.sort_unstable();
        classes
    }

    /// 설정된 플러그인을 순서대로 로드합니다.
    ///
    /// 실패한 항목은 에러 로그를 남기고 제외하며, 나머지는 계속 로드합니다.
    /// 로드된 플러그인 수를 반환합니다.
    pub fn load(&mut self, config: &EnrichersConfig) -> usize {
        let mut loaded = 0;
        for entry in &config.plugins {
            match self.load_one(entry, &config.root) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    error!(
                        path = %entry.path,
                        class = %entry.class,
                        error = %e,
                        "failed to load enricher, skipping"
                    );
                }
            }
        }
        metrics::gauge!(m::ENRICHERS_LOADED).set(self.active.len() as f64);
        loaded
    }

    /// 플러그인 하나를 생성하고 선언 필드를 검증한 뒤 활성화합니다.
    pub fn load_one(&mut self, entry: &EnricherEntry, root: &str) -> Result<(), EnrichError> {
        let factory = self
            .factories
            .get(&entry.class)
            .copied()
            .ok_or_else(|| EnrichError::UnknownClass(entry.class.clone()))?;

        let ctx = EnricherContext::new(entry, root);
        let enricher = factory(&ctx)?;
        let declared = self.validate_fields(enricher.as_ref())?;

        info!(
            enricher = enricher.name(),
            class = %entry.class,
            fields = ?declared,
            "enricher loaded"
        );
        self.declared.extend(declared.iter().cloned());
        self.active.push(LoadedEnricher { enricher, declared });
        Ok(())
    }

    fn validate_fields(&self, enricher: &dyn Enricher) -> Result<Vec<String>, EnrichError> {
        let invalid = |reason: String| EnrichError::InvalidFields {
            plugin: enricher.name().to_owned(),
            reason,
        };

        let mut declared: Vec<String> = Vec::with_capacity(enricher.aux_fields().len());
        for name in enricher.aux_fields() {
            if name.is_empty() {
                return Err(invalid("empty field name".to_owned()));
            }
            if is_core_field(name) {
                return Err(invalid(format!("'{name}' collides with a core field")));
            }
            let full = aux_field_name(name);
            if declared.contains(&full) || self.declared.contains(&full) {
                return Err(invalid(format!("'{name}' is declared more than once")));
            }
            declared.push(full);
        }
        Ok(declared)
    }

    /// 활성 플러그인을 순서대로 적용합니다.
    ///
    /// 플러그인 에러는 경고 로그만 남기고, 그 플러그인의 누락된 선언 필드를
    /// `Null`로 채운 뒤 다음 플러그인으로 넘어갑니다.
    pub fn enrich(&self, record: &mut LogRecord) {
        for loaded in &self.active {
            if let Err(e) = loaded.enricher.enrich(record) {
                warn!(
                    enricher = loaded.enricher.name(),
                    error = %e,
                    "enricher failed, backfilling declared fields"
                );
                metrics::counter!(m::ENRICHER_ERRORS_TOTAL).increment(1);
                for name in loaded.enricher.aux_fields() {
                    if record.aux(name).is_none() {
                        record.add_aux(name, FieldValue::Null);
                    }
                }
            }
        }
        if !self.declared.is_empty() {
            record.arrange_aux(&self.declared);
        }
    }

    /// 활성 플러그인 수
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// 활성 플러그인이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// 활성 플러그인 이름 (실행 순서)
    pub fn names(&self) -> Vec<&str> {
        self.active.iter().map(|l| l.enricher.name()).collect()
    }

    /// 활성 플러그인의 선언 필드 (접두어 포함, 실행 순서)
    pub fn declared_fields(&self) -> &[String] {
        &self.declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CoreFields;

    struct Tagger {
        name: String,
        fields: Vec<String>,
        fail_on: Option<String>,
    }

    impl Enricher for Tagger {
        fn name(&self) -> &str {
            &self.name
        }

        fn aux_fields(&self) -> &[String] {
            &self.fields
        }

        fn enrich(&self, record: &mut LogRecord) -> Result<(), EnrichError> {
            if self.fail_on.as_deref() == Some(record.core.http_url.as_str()) {
                return Err(EnrichError::Runtime {
                    plugin: self.name.clone(),
                    reason: "boom".to_owned(),
                });
            }
            // 역순으로 추가해도 선언 순서로 정렬되어야 함
            for field in self.fields.iter().rev() {
                record.add_aux(field, format!("{}:{}", self.name, field));
            }
            Ok(())
        }
    }

    fn tagger_factory(ctx: &EnricherContext) -> Result<Box<dyn Enricher>, EnrichError> {
        let fields = ctx
            .get_str("fields")
            .unwrap_or("tag")
            .split(',')
            .map(|s| s.trim().to_owned())
            .collect();
        Ok(Box::new(Tagger {
            name: ctx.path.clone(),
            fields,
            fail_on: ctx.get_str("fail_on").map(str::to_owned),
        }))
    }

    fn failing_factory(ctx: &EnricherContext) -> Result<Box<dyn Enricher>, EnrichError> {
        Err(ctx.construction_error("missing resource"))
    }

    fn entry(path: &str, class: &str, config: &str) -> EnricherEntry {
        EnricherEntry {
            path: path.to_owned(),
            class: class.to_owned(),
            config: toml::from_str(config).unwrap(),
        }
    }

    fn registry() -> EnricherRegistry {
        let mut registry = EnricherRegistry::new();
        registry.register_factory("tagger", tagger_factory);
        registry.register_factory("failing", failing_factory);
        registry
    }

    fn record(url: &str) -> LogRecord {
        LogRecord::new(CoreFields {
            http_url: url.to_owned(),
            ..CoreFields::default()
        })
    }

    #[test]
    fn unknown_class_is_excluded_and_others_still_load() {
        let mut registry = registry();
        let config = EnrichersConfig {
            root: ".".to_owned(),
            plugins: vec![
                entry("first", "tagger", "fields = \"one\""),
                entry("missing", "does_not_exist", ""),
                entry("second", "tagger", "fields = \"two\""),
            ],
        };
        assert_eq!(registry.load(&config), 2);
        assert_eq!(registry.names(), vec!["first", "second"]);
    }

    #[test]
    fn factory_failure_is_excluded() {
        let mut registry = registry();
        let err = registry
            .load_one(&entry("broken", "failing", ""), ".")
            .unwrap_err();
        assert!(matches!(err, EnrichError::Construction { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn core_field_collision_is_rejected() {
        let mut registry = registry();
        let err = registry
            .load_one(&entry("bad", "tagger", "fields = \"city\""), ".")
            .unwrap_err();
        assert!(matches!(err, EnrichError::InvalidFields { .. }));
    }

    #[test]
    fn duplicate_fields_across_plugins_are_rejected() {
        let mut registry = registry();
        registry
            .load_one(&entry("a", "tagger", "fields = \"tag\""), ".")
            .unwrap();
        let err = registry
            .load_one(&entry("b", "tagger", "fields = \"tag\""), ".")
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn enrich_orders_fields_by_declaration() {
        let mut registry = registry();
        registry
            .load_one(&entry("a", "tagger", "fields = \"x, y\""), ".")
            .unwrap();
        let mut rec = record("/");
        registry.enrich(&mut rec);
        let names: Vec<&str> = rec.aux_fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["aux_x", "aux_y"]);
    }

    #[test]
    fn failing_plugin_fields_are_backfilled_with_null() {
        let mut registry = registry();
        registry
            .load_one(
                &entry("a", "tagger", "fields = \"x\"\nfail_on = \"/bad\""),
                ".",
            )
            .unwrap();
        registry
            .load_one(&entry("b", "tagger", "fields = \"y\""), ".")
            .unwrap();

        let mut good = record("/ok");
        let mut bad = record("/bad");
        registry.enrich(&mut good);
        registry.enrich(&mut bad);

        assert_eq!(good.field_names(), bad.field_names());
        assert!(bad.aux("x").unwrap().is_null());
        assert_eq!(bad.aux("y"), Some(&FieldValue::Str("b:y".to_owned())));
    }

    #[test]
    fn context_resolves_relative_to_root() {
        let ctx = EnricherContext::new(&entry("p", "tagger", "enable = false"), "/opt/plugins");
        assert_eq!(ctx.resolve("labels.toml"), PathBuf::from("/opt/plugins/labels.toml"));
        assert!(!ctx.get_bool("enable", true));
        assert!(ctx.get_bool("other", true));
    }

    #[test]
    fn classes_are_sorted() {
        let registry = registry();
        assert_eq!(registry.classes(), vec!["failing", "tagger"]);
    }
}
