//! IRCv3 message tags: value unescaping and the ordered tag map.

/// Unescape a tag value from wire format.
///
/// `\:` becomes `;`, `\s` a space, `\\` a backslash, `\r` and `\n` CR and LF.
/// Unknown escapes drop the backslash; a trailing lone backslash is dropped.
pub fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match iter.next() {
            Some(':') => unescaped.push(';'),
            Some('s') => unescaped.push(' '),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            None => break,
        }
    }
    unescaped
}

/// Tags attached to a message.
///
/// Keys are unique and keep the position of their first occurrence; a
/// repeated key overwrites the earlier value. A tag sent without `=` has an
/// empty value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tags {
    entries: Vec<(String, String)>,
}

impl Tags {
    /// Create an empty tag map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the tags section of a line (without the leading `@`).
    pub fn parse(source: &str) -> Self {
        let mut tags = Self::new();
        for tag in source.split(';').filter(|s| !s.is_empty()) {
            let (key, value) = match tag.split_once('=') {
                Some((key, value)) => (key, unescape_tag_value(value)),
                None => (tag, String::new()),
            };
            tags.insert(key, value);
        }
        tags
    }

    /// Insert a tag, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up the value of a tag.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
