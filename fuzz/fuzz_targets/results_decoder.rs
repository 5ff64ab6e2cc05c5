#![no_main]

use libfuzzer_sys::fuzz_target;
use perfwatch::loader::decode_results;
use perfwatch::metric::{MetricRecord, RunContext};

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic, and neither may validation
    // of whatever the decoder accepted.
    if let Ok((metrics, _skipped)) = decode_results(data, "Unknown Platform") {
        let ctx = RunContext::new("fuzz", "main");
        for raw in metrics {
            let _ = MetricRecord::new(raw, &ctx);
        }
    }
});
