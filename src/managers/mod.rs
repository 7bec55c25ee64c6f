// markshelf state managers
// Managers own the bookmark records and the tag views derived from them.

pub mod bookmark_store;
pub mod tag_manager;
