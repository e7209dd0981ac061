//! Fuzz target for inbound line decoding.

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::str;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = str::from_utf8(data) {
        if input.is_empty() || input.len() > 8191 {
            return;
        }

        if let Ok(msg) = input.parse::<tmi_proto::DecodedMessage>() {
            // accessors must not panic on anything the parser accepted
            let _ = msg.badges();
            let _ = msg.badge_info();
            let _ = msg.channel_name();
            let _ = msg.nickname();
            let _ = msg.trailing();
        }
    }
});
