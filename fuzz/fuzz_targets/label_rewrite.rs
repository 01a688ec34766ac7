//! Fuzz target for the label class rewriter.
//!
//! Feeds arbitrary UTF-8 label files through the rewriter, checking for
//! panics and for the line-count and idempotence guarantees.

#![no_main]

use libfuzzer_sys::fuzz_target;
use yoloprep::reclassify::fuzz_rewrite_content;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(content) = std::str::from_utf8(data) else {
        return;
    };

    fuzz_rewrite_content(content);
});
