//! woothee 기반 User-Agent 리졸버

use logalyzer_core::pipeline::{UA_OTHER, UaInfo, UaResolver};
use woothee::parser::Parser;

// woothee가 인식하지 못한 항목에 쓰는 값
const WOOTHEE_UNKNOWN: &str = "UNKNOWN";

/// woothee 기반 [`UaResolver`]
pub struct WootheeResolver {
    parser: Parser,
}

impl WootheeResolver {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }
}

impl Default for WootheeResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn known_or_other(value: &str) -> String {
    if value.is_empty() || value == WOOTHEE_UNKNOWN {
        UA_OTHER.to_owned()
    } else {
        value.to_owned()
    }
}

impl UaResolver for WootheeResolver {
    fn parse(&self, user_agent: &str) -> UaInfo {
        let Some(result) = self.parser.parse(user_agent) else {
            return UaInfo::default();
        };

        UaInfo {
            browser: known_or_other(result.name),
            os: known_or_other(result.os),
            device: known_or_other(result.category),
        }
    }
}
