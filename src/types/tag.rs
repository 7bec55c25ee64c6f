//! Tag normalization.
//!
//! Raw tag input arrives as comma-delimited strings (`",rust,web,"`), possibly
//! several of them at once when a form repeats the `tags` key. [`TagSet`] is the
//! only representation the rest of the crate stores: it is built exclusively
//! through normalization, so every tag in it is non-empty, trimmed and unique.

use serde::{Deserialize, Serialize};

/// Separator between tag tokens in raw input.
pub const TAG_DELIMITER: char = ',';

/// An ordered set of normalized tag names.
///
/// Order is first-seen order of the input; duplicates are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

/// Yields the trimmed, non-empty tokens of one raw tag string.
fn tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Parses one delimited string: `",tag1, tag2,,"` becomes `[tag1, tag2]`.
    pub fn parse(raw: &str) -> Self {
        Self::parse_all([raw])
    }

    /// Parses several raw values and unions them in first-seen order.
    pub fn parse_all<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for value in values {
            for token in tokens(value.as_ref()) {
                set.push(token);
            }
        }
        set
    }

    fn push(&mut self, tag: &str) {
        if !self.contains(tag) {
            self.0.push(tag.to_string());
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Joins the set back into a single delimited string.
    ///
    /// `TagSet::parse(&set.to_delimited()) == set` for every set.
    pub fn to_delimited(&self) -> String {
        self.0.join(&TAG_DELIMITER.to_string())
    }

    /// Replaces `old` with `new` in place.
    ///
    /// If `new` is already present, the later duplicate is dropped so the set
    /// keeps the first occurrence. Returns `false` when `old` is absent.
    pub(crate) fn replace(&mut self, old: &str, new: &str) -> bool {
        let Some(index) = self.0.iter().position(|t| t == old) else {
            return false;
        };
        self.0[index] = new.to_string();
        let mut seen = false;
        self.0.retain(|t| {
            if t != new {
                return true;
            }
            let keep = !seen;
            seen = true;
            keep
        });
        true
    }
}

impl From<Vec<String>> for TagSet {
    fn from(values: Vec<String>) -> Self {
        Self::parse_all(values)
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Builds the single tag name a rename produces from raw input.
///
/// The tokens of `raw` are merged into one label joined by a space, so
/// `"tag3,tag4"` yields `"tag3 tag4"`. Returns `None` when `raw` has no tokens.
pub fn merged_tag_name(raw: &str) -> Option<String> {
    let merged = tokens(raw).collect::<Vec<_>>().join(" ");
    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

/// Derived view of one tag: its name and how many bookmarks carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub usage_count: usize,
}
