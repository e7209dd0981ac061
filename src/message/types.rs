use std::fmt;
use std::str::FromStr;

use crate::error::{BadgeParseError, MessageParseError, ProtocolError};
use crate::prefix::Prefix;

use super::badges::{decode_badges, BadgeList};
use super::nom_parser::ParsedMessage;
use super::tags::Tags;

/// One decoded inbound line.
///
/// Built once per line and never mutated afterwards. The raw source is kept
/// verbatim (minus the line terminator) so replies can be reported exactly
/// as the server sent them.
///
/// # Example
///
/// ```
/// use tmi_proto::DecodedMessage;
///
/// let raw = "@msg-id=msg_channel_suspended :tmi.twitch.tv NOTICE #pajlada \
///            :This channel has been suspended.";
/// let msg: DecodedMessage = raw.parse().unwrap();
/// assert_eq!(msg.command(), "NOTICE");
/// assert_eq!(msg.channel_name(), Some("pajlada"));
/// assert_eq!(msg.message_id(), Some("msg_channel_suspended"));
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedMessage {
    raw: String,
    tags: Tags,
    prefix: Option<Prefix>,
    command: String,
    params: Vec<String>,
}

impl DecodedMessage {
    /// The line as received, without its terminator.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Value of a tag, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key)
    }

    pub fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// Nickname of the sender, for user prefixes.
    pub fn nickname(&self) -> Option<&str> {
        self.prefix.as_ref().and_then(Prefix::nickname)
    }

    /// The command verb, e.g. `NOTICE` or `001`.
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The last parameter, usually the free-form text of the message.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Channel named by the first parameter, without the leading `#`.
    pub fn channel_name(&self) -> Option<&str> {
        self.param(0).and_then(|target| target.strip_prefix('#'))
    }

    /// The `msg-id` tag Twitch attaches to NOTICE and USERNOTICE messages.
    pub fn message_id(&self) -> Option<&str> {
        self.tag("msg-id")
    }

    /// Decoded `badges` tag. A missing tag is an empty list.
    pub fn badges(&self) -> Result<BadgeList, BadgeParseError> {
        decode_badges(self.tag("badges").unwrap_or_default())
    }

    /// Decoded `badge-info` tag. A missing tag is an empty list.
    pub fn badge_info(&self) -> Result<BadgeList, BadgeParseError> {
        decode_badges(self.tag("badge-info").unwrap_or_default())
    }
}

impl FromStr for DecodedMessage {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<DecodedMessage, Self::Err> {
        let line = s.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        let parsed = ParsedMessage::parse(line).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })?;

        Ok(DecodedMessage {
            raw: line.to_owned(),
            tags: parsed.tags.map(Tags::parse).unwrap_or_default(),
            prefix: parsed.prefix.map(Prefix::new_from_str),
            command: parsed.command.to_owned(),
            params: parsed.params.into_iter().map(str::to_owned).collect(),
        })
    }
}

impl fmt::Display for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
