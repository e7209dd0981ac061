//! Fuzz target for `badges` tag decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(badges) = tmi_proto::decode_badges(input) {
            // display must re-decode to the same list
            let again = tmi_proto::decode_badges(&badges.to_string());
            assert_eq!(again.as_ref(), Ok(&badges));
        }
    }
});
