#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Truncated or unknown escapes must never panic
    let _ = mandex::utils::normalize(data);
    let _ = mandex::utils::normalize_lossy(data);
});
