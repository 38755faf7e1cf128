#![no_main]

use abtester::comparison::run_comparison;
use abtester::dataset::{parse_json, parse_long_csv, DatasetOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and comparing must return errors, never panic
        let options = DatasetOptions::default();
        for pair in [parse_long_csv(input, &options), parse_json(input)]
            .into_iter()
            .flatten()
        {
            let _ = run_comparison(&pair, 0.05);
        }
    }
});
