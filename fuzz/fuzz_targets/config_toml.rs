#![no_main]

use libfuzzer_sys::fuzz_target;
use logalyzer_core::LogalyzerConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(toml_str) = std::str::from_utf8(data) {
        if let Ok(config) = LogalyzerConfig::parse(toml_str) {
            let _ = config.validate();
        }
    }
});
