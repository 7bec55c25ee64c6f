//! Tag Manager for markshelf.
//!
//! Tags are not stored on their own: they exist while at least one bookmark
//! references them. This manager answers which tags exist, how often each is
//! used, and rewrites a tag across every bookmark.
//!
//! Listing order is the tag position order kept by the store: a tag is
//! appended when it first becomes referenced, and the output of a rename is
//! always moved to the end.

use tracing::info;

use crate::managers::bookmark_store::BookmarkStore;
use crate::types::errors::BookmarkError;
use crate::types::tag::{merged_tag_name, TagInfo};

/// Trait defining tag operations.
pub trait TagManagerTrait {
    fn list_tags(&self) -> Result<Vec<String>, BookmarkError>;
    fn get_tag(&self, name: &str) -> Result<TagInfo, BookmarkError>;
    /// Replaces `old` in every bookmark with one tag built from `new_raw`.
    fn rename_tag(&self, old: &str, new_raw: &str) -> Result<(), BookmarkError>;
}

/// Tag manager borrowing a bookmark store.
pub struct TagManager<'a> {
    store: &'a BookmarkStore,
}

impl<'a> TagManager<'a> {
    /// Creates a new `TagManager` over the provided store.
    pub fn new(store: &'a BookmarkStore) -> Self {
        Self { store }
    }
}

impl<'a> TagManagerTrait for TagManager<'a> {
    fn list_tags(&self) -> Result<Vec<String>, BookmarkError> {
        self.store.with_catalog(|catalog| catalog.ordered_tags())
    }

    fn get_tag(&self, name: &str) -> Result<TagInfo, BookmarkError> {
        let usage_count = self.store.with_catalog(|catalog| catalog.usage_count(name))?;
        if usage_count == 0 {
            return Err(BookmarkError::TagNotFound(name.to_string()));
        }
        Ok(TagInfo {
            name: name.to_string(),
            usage_count,
        })
    }

    /// `new_raw` is split like creation-time tag input, and its tokens are
    /// merged into a single space-joined name: `"tag3,tag4"` → `"tag3 tag4"`.
    fn rename_tag(&self, old: &str, new_raw: &str) -> Result<(), BookmarkError> {
        let new_name = merged_tag_name(new_raw)
            .ok_or_else(|| BookmarkError::InvalidInput("new tag name is empty".to_string()))?;
        let ids = self.store.rewrite_tag(old, &new_name)?;
        info!(from = old, to = %new_name, bookmarks = ids.len(), "tag renamed");
        Ok(())
    }
}

