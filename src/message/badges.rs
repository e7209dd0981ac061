//! Badge tag decoding.
//!
//! The `badges` and `badge-info` tags carry comma-separated `name/version`
//! tokens:
//!
//! ```text
//! moderator/1,subscriber/12,glhf-pledge/1
//! ```
//!
//! Decoding is strict. A token without `/`, with an empty name, or whose
//! version is not a plain base-10 integer fails the whole list.

use std::fmt;

use nom::{
    character::complete::digit1,
    combinator::{all_consuming, map_res},
    IResult,
};

use crate::error::BadgeParseError;

/// A single `name/version` badge.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Badge {
    name: String,
    version: u64,
}

impl Badge {
    pub fn new(name: impl Into<String>, version: u64) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_admin(&self) -> bool {
        self.name == "admin"
    }

    pub fn is_broadcaster(&self) -> bool {
        self.name == "broadcaster"
    }

    pub fn is_global_mod(&self) -> bool {
        self.name == "global_mod"
    }

    pub fn is_moderator(&self) -> bool {
        self.name == "moderator"
    }

    pub fn is_subscriber(&self) -> bool {
        self.name == "subscriber"
    }

    pub fn is_staff(&self) -> bool {
        self.name == "staff"
    }

    pub fn is_turbo(&self) -> bool {
        self.name == "turbo"
    }

    pub fn is_vip(&self) -> bool {
        self.name == "vip"
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)
    }
}

/// An ordered list of badges, exactly as sent on the wire.
///
/// Duplicates are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BadgeList(Vec<Badge>);

impl BadgeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, badge: Badge) {
        self.0.push(badge);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Badge> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Badge] {
        &self.0
    }

    /// First badge with the given name.
    pub fn get(&self, name: &str) -> Option<&Badge> {
        self.0.iter().find(|b| b.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_broadcaster(&self) -> bool {
        self.0.iter().any(Badge::is_broadcaster)
    }

    pub fn has_moderator(&self) -> bool {
        self.0.iter().any(Badge::is_moderator)
    }

    pub fn has_subscriber(&self) -> bool {
        self.0.iter().any(Badge::is_subscriber)
    }

    pub fn has_vip(&self) -> bool {
        self.0.iter().any(Badge::is_vip)
    }
}

impl fmt::Display for BadgeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, badge) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", badge)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a BadgeList {
    type Item = &'a Badge;
    type IntoIter = std::slice::Iter<'a, Badge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for BadgeList {
    type Item = Badge;
    type IntoIter = std::vec::IntoIter<Badge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Badge> for BadgeList {
    fn from_iter<I: IntoIterator<Item = Badge>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Badge>> for BadgeList {
    fn from(badges: Vec<Badge>) -> Self {
        Self(badges)
    }
}

/// Digits only, whole input, fits in a `u64`.
fn parse_version(input: &str) -> IResult<&str, u64> {
    all_consuming(map_res(digit1, str::parse::<u64>))(input)
}

/// Decode a single `name/version` token.
///
/// Only the first `/` separates; anything after it is the version.
pub fn decode_badge(token: &str) -> Result<Badge, BadgeParseError> {
    let (name, version_src) =
        token
            .split_once('/')
            .ok_or_else(|| BadgeParseError::MissingSeparator {
                token: token.to_owned(),
            })?;

    if name.is_empty() {
        return Err(BadgeParseError::EmptyName {
            token: token.to_owned(),
        });
    }

    let (_, version) = parse_version(version_src).map_err(|_| BadgeParseError::InvalidVersion {
        token: token.to_owned(),
        version: version_src.to_owned(),
    })?;

    Ok(Badge::new(name, version))
}

/// Decode a comma-separated badge list.
///
/// An empty source is an empty list. The first malformed token aborts the
/// decode.
pub fn decode_badges(source: &str) -> Result<BadgeList, BadgeParseError> {
    if source.is_empty() {
        return Ok(BadgeList::new());
    }

    source.split(',').map(decode_badge).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_badge() {
        let badge = decode_badge("subscriber/12").unwrap();
        assert_eq!(badge.name(), "subscriber");
        assert_eq!(badge.version(), 12);
        assert!(badge.is_subscriber());
    }

    #[test]
    fn test_decode_zero_version() {
        assert_eq!(decode_badge("premium/0").unwrap(), Badge::new("premium", 0));
    }

    #[test]
    fn test_missing_separator_names_token() {
        let err = decode_badge("moderator").unwrap_err();
        assert_eq!(
            err,
            BadgeParseError::MissingSeparator {
                token: "moderator".to_string()
            }
        );
        assert_eq!(err.token(), "moderator");
    }

    #[test]
    fn test_version_split_is_limited_to_first_slash() {
        let err = decode_badge("a/1/2").unwrap_err();
        assert_eq!(
            err,
            BadgeParseError::InvalidVersion {
                token: "a/1/2".to_string(),
                version: "1/2".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_loose_integers() {
        for token in ["a/+1", "a/-1", "a/ 1", "a/1 ", "a/1x", "a/", "a/0x10", "a/1.0"] {
            assert!(
                matches!(decode_badge(token), Err(BadgeParseError::InvalidVersion { .. })),
                "{} should be rejected",
                token
            );
        }
    }

    #[test]
    fn test_rejects_version_overflow() {
        assert!(decode_badge("a/18446744073709551615").is_ok());
        assert!(decode_badge("a/18446744073709551616").is_err());
    }

    #[test]
    fn test_rejects_empty_name() {
        assert!(matches!(
            decode_badge("/1"),
            Err(BadgeParseError::EmptyName { .. })
        ));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(decode_badges("").unwrap(), BadgeList::new());
    }

    #[test]
    fn test_list_keeps_wire_order() {
        let badges = decode_badges("b/2,a/1").unwrap();
        let pairs: Vec<_> = badges.iter().map(|b| (b.name(), b.version())).collect();
        assert_eq!(pairs, vec![("b", 2), ("a", 1)]);
    }

    #[test]
    fn test_list_keeps_duplicates() {
        let badges = decode_badges("a/1,a/1").unwrap();
        assert_eq!(badges.len(), 2);
    }

    #[test]
    fn test_list_aborts_on_any_bad_token() {
        let err = decode_badges("a/1,broken,b/2").unwrap_err();
        assert_eq!(err.token(), "broken");

        // A trailing comma yields an empty token, which has no separator.
        let err = decode_badges("a/1,").unwrap_err();
        assert_eq!(err.token(), "");
    }

    #[test]
    fn test_list_helpers() {
        let badges = decode_badges("broadcaster/1,subscriber/3012,vip/1").unwrap();
        assert!(badges.has_broadcaster());
        assert!(badges.has_subscriber());
        assert!(badges.has_vip());
        assert!(!badges.has_moderator());
        assert_eq!(badges.get("subscriber").map(Badge::version), Some(3012));
        assert_eq!(badges.to_string(), "broadcaster/1,subscriber/3012,vip/1");
    }
}
