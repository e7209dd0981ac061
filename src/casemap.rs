//! Case-insensitive matching of channel names and nicknames.
//!
//! Twitch logins and channel names are ASCII and compared without regard to
//! ASCII case. Channel names may be given with or without the leading `#`.

/// Lowercase a channel name and strip a leading `#`.
pub fn normalize_channel(name: &str) -> String {
    name.strip_prefix('#').unwrap_or(name).to_ascii_lowercase()
}

/// Compare two nicknames ignoring ASCII case.
pub fn nick_eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Compare two channel names ignoring ASCII case and a leading `#` on either side.
pub fn channel_eq(a: &str, b: &str) -> bool {
    let a = a.strip_prefix('#').unwrap_or(a);
    let b = b.strip_prefix('#').unwrap_or(b);
    a.eq_ignore_ascii_case(b)
}
