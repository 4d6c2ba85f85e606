//! 라인 템플릿 컴파일러
//!
//! `{name}` 형태의 이름 있는 자리표시자와 `{}` 익명 자리표시자를 가진 템플릿을
//! 시작 시 한 번 정규식으로 컴파일합니다.
//!
//! - 자리표시자는 한 글자 이상을 non-greedy로 매칭합니다.
//! - 리터럴 텍스트는 정확히 일치해야 합니다.
//! - 라인 전체가 템플릿과 일치해야 합니다 (`^...$`).

use std::collections::HashMap;

use regex::Regex;

use crate::error::LogPipelineError;

/// 템플릿이 반드시 포함해야 하는 자리표시자
pub const REQUIRED_PLACEHOLDERS: [&str; 9] = [
    "remote_ip",
    "datetime",
    "request",
    "status",
    "bytes_sent",
    "referer",
    "hostname",
    "user_agent",
    "request_time",
];

/// 자리표시자 이름 → 매칭된 원문
pub type FieldMap = HashMap<String, String>;

/// 컴파일된 라인 템플릿
#[derive(Debug, Clone)]
pub struct LineTemplate {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

impl LineTemplate {
    /// 템플릿을 컴파일합니다.
    ///
    /// 괄호 짝이 맞지 않거나, 필수 자리표시자가 빠졌거나,
    /// 같은 이름이 두 번 나오면 에러를 반환합니다.
    pub fn compile(template: &str) -> Result<Self, LogPipelineError> {
        let template_error = |reason: String| LogPipelineError::Template { reason };

        let mut pattern = String::with_capacity(template.len() * 2);
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices();

        pattern.push('^');
        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        if inner == '{' {
                            return Err(template_error(format!("nested '{{' at offset {pos}")));
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(template_error(format!("unbalanced '{{' at offset {pos}")));
                    }

                    pattern.push_str(&regex::escape(&literal));
                    literal.clear();

                    if name.is_empty() {
                        pattern.push_str(".+?");
                        continue;
                    }
                    if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
                        || name.starts_with(|ch: char| ch.is_ascii_digit())
                    {
                        return Err(template_error(format!(
                            "invalid placeholder name '{name}'"
                        )));
                    }
                    if names.contains(&name) {
                        return Err(template_error(format!(
                            "placeholder '{name}' appears more than once"
                        )));
                    }
                    pattern.push_str(&format!("(?P<{name}>.+?)"));
                    names.push(name);
                }
                '}' => {
                    return Err(template_error(format!("unbalanced '}}' at offset {pos}")));
                }
                other => literal.push(other),
            }
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        let missing: Vec<&str> = REQUIRED_PLACEHOLDERS
            .iter()
            .copied()
            .filter(|required| !names.iter().any(|n| n == required))
            .collect();
        if !missing.is_empty() {
            return Err(template_error(format!(
                "missing required placeholders: {}",
                missing.join(", ")
            )));
        }

        let regex = Regex::new(&pattern)?;
        Ok(Self {
            source: template.to_owned(),
            regex,
            names,
        })
    }

    /// 라인을 매칭하여 이름 있는 자리표시자 값을 반환합니다.
    ///
    /// 일치하지 않으면 `None`을 반환합니다.
    pub fn captures(&self, line: &str) -> Option<FieldMap> {
        let caps = self.regex.captures(line)?;
        let mut fields = FieldMap::with_capacity(self.names.len());
        for name in &self.names {
            if let Some(m) = caps.name(name) {
                fields.insert(name.clone(), m.as_str().to_owned());
            }
        }
        Some(fields)
    }

    /// 원본 템플릿 문자열
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 이름 있는 자리표시자 (템플릿 등장 순서)
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
