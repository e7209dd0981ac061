//! Reply classification.
//!
//! Pure predicates deciding whether an inbound message answers a specific
//! outstanding operation. Predicates that belong to a channel-scoped
//! operation always check the channel, so concurrent operations on different
//! channels never match each other's replies.

use crate::casemap::{channel_eq, nick_eq};
use crate::message::DecodedMessage;

/// Numeric welcome reply sent once login has been accepted.
pub const RPL_WELCOME: &str = "001";

/// `msg-id` values of channel NOTICEs that reject a chat line.
pub const FATAL_NOTICE_IDS: &[&str] = &[
    "msg_banned",
    "msg_banned_email_alias",
    "msg_bad_characters",
    "msg_channel_blocked",
    "msg_channel_suspended",
    "msg_duplicate",
    "msg_emoteonly",
    "msg_facebook",
    "msg_followersonly",
    "msg_followersonly_followed",
    "msg_followersonly_zero",
    "msg_r9k",
    "msg_ratelimit",
    "msg_rejected",
    "msg_rejected_mandatory",
    "msg_requires_verified_phone_number",
    "msg_room_not_found",
    "msg_slowmode",
    "msg_subsonly",
    "msg_suspended",
    "msg_timedout",
    "msg_verified_email",
];

/// `msg-id` values of channel NOTICEs that report state changes and say
/// nothing about a pending chat line.
pub const INFORMATIONAL_NOTICE_IDS: &[&str] = &[
    "emote_only_on",
    "emote_only_off",
    "followers_on",
    "followers_on_zero",
    "followers_off",
    "host_on",
    "host_off",
    "host_target_went_offline",
    "hosts_remaining",
    "r9k_on",
    "r9k_off",
    "slow_on",
    "slow_off",
    "subs_on",
    "subs_off",
];

/// How a channel NOTICE relates to a pending chat line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeSeverity {
    /// A recognized rejection.
    Fatal,
    /// A recognized state change, unrelated to the pending line.
    Informational,
    /// No `msg-id`, or one this crate does not know. Treated as a rejection.
    Unrecognized,
}

/// Classify a NOTICE by its `msg-id` tag.
pub fn notice_severity(msg: &DecodedMessage) -> NoticeSeverity {
    match msg.message_id() {
        Some(id) if FATAL_NOTICE_IDS.contains(&id) => NoticeSeverity::Fatal,
        Some(id) if INFORMATIONAL_NOTICE_IDS.contains(&id) => NoticeSeverity::Informational,
        _ => NoticeSeverity::Unrecognized,
    }
}

/// Whether the message's first parameter names `channel`.
fn targets_channel(msg: &DecodedMessage, channel: &str) -> bool {
    msg.param(0)
        .map_or(false, |target| target.starts_with('#') && channel_eq(target, channel))
}

/// Login was accepted.
pub fn is_login_success(msg: &DecodedMessage) -> bool {
    msg.command() == RPL_WELCOME
}

/// Login was refused: a NOTICE addressed to `*` or to the nickname logging in.
pub fn is_login_failure(msg: &DecodedMessage, nickname: &str) -> bool {
    msg.command() == "NOTICE"
        && msg
            .param(0)
            .map_or(false, |target| target == "*" || nick_eq(target, nickname))
}

/// The server confirmed a chat line in `channel`.
pub fn is_say_success(msg: &DecodedMessage, channel: &str) -> bool {
    msg.command() == "USERSTATE" && targets_channel(msg, channel)
}

/// The server rejected a chat line in `channel`.
pub fn is_say_failure(msg: &DecodedMessage, channel: &str) -> bool {
    msg.command() == "NOTICE"
        && targets_channel(msg, channel)
        && notice_severity(msg) != NoticeSeverity::Informational
}

/// The server answered a `PING :<token>`.
pub fn is_pong_for(msg: &DecodedMessage, token: &str) -> bool {
    msg.command() == "PONG" && msg.trailing() == Some(token)
}
