#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use logalyzer_log_pipeline::LineTemplate;

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    template: String,
    line: String,
}

fuzz_target!(|input: FuzzInput| {
    if let Ok(template) = LineTemplate::compile(&input.template) {
        if let Some(fields) = template.captures(&input.line) {
            assert!(fields.len() <= template.names().len());
        }
    }
});
