//! Unit tests for the bookmark record store.
//!
//! These tests exercise CRUD, search and persistence through the
//! `BookmarkStoreTrait` interface, mostly on an in-memory SQLite database.

use markshelf::managers::bookmark_store::{BookmarkStore, BookmarkStoreTrait};
use markshelf::managers::tag_manager::{TagManager, TagManagerTrait};
use markshelf::types::bookmark::{BookmarkUpdate, NewBookmark, SearchQuery};
use markshelf::types::errors::BookmarkError;
use markshelf::types::tag::TagSet;
use rstest::{fixture, rstest};

#[fixture]
fn store() -> BookmarkStore {
    BookmarkStore::open_in_memory().expect("Failed to open in-memory store")
}

/// Store holding three bookmarks used by the search tests.
#[fixture]
fn populated(store: BookmarkStore) -> BookmarkStore {
    store
        .create(
            NewBookmark::new("https://www.rust-lang.org")
                .with_title("Rust Programming Language")
                .with_description("A language empowering everyone")
                .with_tags(TagSet::parse("rust,programming")),
        )
        .unwrap();
    store
        .create(
            NewBookmark::new("https://docs.python.org")
                .with_title("Python Docs")
                .with_tags(TagSet::parse("python,programming")),
        )
        .unwrap();
    store
        .create(
            NewBookmark::new("https://rustacean.net")
                .with_title("Ferris the crab")
                .with_tags(TagSet::parse("mascot")),
        )
        .unwrap();
    store
}

#[rstest]
fn test_empty_store(store: BookmarkStore) {
    assert!(store.is_empty().unwrap());
    assert_eq!(store.get_all().unwrap(), vec![]);
    assert_eq!(store.search(&SearchQuery::any(["rust"])).unwrap(), vec![]);
}

#[rstest]
fn test_create_assigns_sequential_ids(store: BookmarkStore) {
    let a = store.create(NewBookmark::new("http://a.example")).unwrap();
    let b = store.create(NewBookmark::new("http://b.example")).unwrap();
    assert_eq!((a, b), (1, 2));
    assert_eq!(store.len().unwrap(), 2);
}

#[rstest]
fn test_create_defaults_to_empty_fields(store: BookmarkStore) {
    let id = store.create(NewBookmark::new("http://google.com")).unwrap();
    let bookmark = store.get(id).unwrap();
    assert_eq!(bookmark.url, "http://google.com");
    assert_eq!(bookmark.title, "");
    assert_eq!(bookmark.description, "");
    assert!(bookmark.tags.is_empty());
}

#[rstest]
fn test_duplicate_create_is_rejected(store: BookmarkStore) {
    store.create(NewBookmark::new("http://google.com")).unwrap();
    let result = store.create(NewBookmark::new("http://google.com").with_title("Again"));
    assert_eq!(
        result,
        Err(BookmarkError::DuplicateUrl("http://google.com".to_string()))
    );

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "");
}

#[rstest]
fn test_urls_compare_exactly(store: BookmarkStore) {
    store.create(NewBookmark::new("http://google.com")).unwrap();
    assert!(store.create(NewBookmark::new("http://google.com/")).is_ok());
    assert!(store.create(NewBookmark::new("HTTP://google.com")).is_ok());
}

#[rstest]
#[case("")]
#[case("   ")]
fn test_blank_url_is_rejected(store: BookmarkStore, #[case] url: &str) {
    let result = store.create(NewBookmark::new(url));
    assert!(matches!(result, Err(BookmarkError::InvalidInput(_))));
    assert!(store.is_empty().unwrap());
}

#[rstest]
fn test_get_unknown_id(store: BookmarkStore) {
    assert_eq!(store.get(1), Err(BookmarkError::NotFound(1)));
}

#[rstest]
fn test_update_tags_only(store: BookmarkStore) {
    let id = store
        .create(NewBookmark::new("http://google.com").with_title("Google"))
        .unwrap();

    let update = BookmarkUpdate {
        tags: Some(TagSet::parse(",tag1,tag2,")),
        ..Default::default()
    };
    store.update(id, update).unwrap();

    let bookmark = store.get(id).unwrap();
    assert_eq!(bookmark.tags.as_slice(), ["tag1", "tag2"]);
    assert_eq!(bookmark.title, "Google");
    assert_eq!(bookmark.url, "http://google.com");
}

#[rstest]
fn test_update_replaces_tag_set(store: BookmarkStore) {
    let id = store
        .create(NewBookmark::new("http://a.example").with_tags(TagSet::parse("a,b")))
        .unwrap();
    store
        .update(
            id,
            BookmarkUpdate {
                tags: Some(TagSet::parse("c")),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.get(id).unwrap().tags.as_slice(), ["c"]);
    assert_eq!(TagManager::new(&store).list_tags().unwrap(), vec!["c"]);
}

#[rstest]
fn test_update_url_collision(store: BookmarkStore) {
    store.create(NewBookmark::new("http://a.example")).unwrap();
    let b = store.create(NewBookmark::new("http://b.example")).unwrap();

    let result = store.update(
        b,
        BookmarkUpdate {
            url: Some("http://a.example".to_string()),
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(BookmarkError::InvalidInput(_))));
    assert_eq!(store.get(b).unwrap().url, "http://b.example");

    // Setting a bookmark's url to its current value is fine.
    let same = BookmarkUpdate {
        url: Some("http://b.example".to_string()),
        ..Default::default()
    };
    assert!(store.update(b, same).is_ok());
}

#[rstest]
fn test_update_changes_url(store: BookmarkStore) {
    let id = store.create(NewBookmark::new("http://old.example")).unwrap();
    store
        .update(
            id,
            BookmarkUpdate {
                url: Some("http://new.example".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(store.get(id).unwrap().url, "http://new.example");
    // The old url is free again.
    assert!(store.create(NewBookmark::new("http://old.example")).is_ok());
}

#[rstest]
fn test_update_unknown_id(store: BookmarkStore) {
    let update = BookmarkUpdate {
        title: Some("x".to_string()),
        ..Default::default()
    };
    assert_eq!(store.update(1, update), Err(BookmarkError::NotFound(1)));
    assert_eq!(store.update(1, BookmarkUpdate::default()), Err(BookmarkError::NotFound(1)));
}

#[rstest]
fn test_empty_update_changes_nothing(store: BookmarkStore) {
    let id = store.create(NewBookmark::new("http://a.example").with_title("A")).unwrap();
    let before = store.get(id).unwrap();
    store.update(id, BookmarkUpdate::default()).unwrap();
    assert_eq!(store.get(id).unwrap(), before);
}

#[rstest]
fn test_delete_keeps_other_ids(store: BookmarkStore) {
    let a = store.create(NewBookmark::new("http://a.example")).unwrap();
    let b = store.create(NewBookmark::new("http://b.example")).unwrap();
    let c = store.create(NewBookmark::new("http://c.example")).unwrap();

    store.delete(b).unwrap();

    assert_eq!(store.get(b), Err(BookmarkError::NotFound(b)));
    let ids: Vec<u64> = store.get_all().unwrap().iter().map(|bm| bm.id).collect();
    assert_eq!(ids, vec![a, c]);
    assert_eq!(store.delete(b), Err(BookmarkError::NotFound(b)));
}

#[rstest]
fn test_delete_all_does_not_reuse_ids(store: BookmarkStore) {
    store.create(NewBookmark::new("http://a.example").with_tags(TagSet::parse("x"))).unwrap();
    store.create(NewBookmark::new("http://b.example")).unwrap();

    store.delete_all().unwrap();
    assert!(store.is_empty().unwrap());
    assert!(TagManager::new(&store).list_tags().unwrap().is_empty());

    let id = store.create(NewBookmark::new("http://a.example")).unwrap();
    assert_eq!(id, 3);
}

#[rstest]
fn test_delete_all_on_empty_store(store: BookmarkStore) {
    assert!(store.delete_all().is_ok());
}

#[rstest]
#[case(&["rust"], false, false, &[1])]
#[case(&["RUST"], false, false, &[1])]
#[case(&["rust"], false, true, &[1, 3])]
#[case(&["programming"], false, false, &[1, 2])]
#[case(&["python", "mascot"], false, false, &[2, 3])]
#[case(&["rust", "programming"], true, false, &[1])]
#[case(&["python", "mascot"], true, false, &[])]
#[case(&["crab"], false, false, &[3])]
#[case(&["nothing"], false, true, &[])]
#[case(&[], false, false, &[])]
#[case(&["  "], false, true, &[])]
fn test_search(
    populated: BookmarkStore,
    #[case] keywords: &[&str],
    #[case] all_keywords: bool,
    #[case] deep: bool,
    #[case] expected: &[u64],
) {
    let query = SearchQuery {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        all_keywords,
        deep,
    };
    let ids: Vec<u64> = populated.search(&query).unwrap().iter().map(|b| b.id).collect();
    assert_eq!(ids, expected);
}

#[rstest]
fn test_set_title_if_url(store: BookmarkStore) {
    let id = store.create(NewBookmark::new("http://a.example")).unwrap();

    assert!(store.set_title_if_url(id, "http://a.example", "A").unwrap());
    assert_eq!(store.get(id).unwrap().title, "A");

    assert!(!store.set_title_if_url(id, "http://other.example", "B").unwrap());
    assert_eq!(store.get(id).unwrap().title, "A");

    assert_eq!(
        store.set_title_if_url(99, "http://a.example", "C"),
        Err(BookmarkError::NotFound(99))
    );
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let path = dir.path().join("bookmarks.db");

    {
        let store = BookmarkStore::open(&path).unwrap();
        store
            .create(
                NewBookmark::new("http://a.example")
                    .with_title("A")
                    .with_description("first")
                    .with_tags(TagSet::parse("one,two")),
            )
            .unwrap();
        let b = store.create(NewBookmark::new("http://b.example").with_tags(TagSet::parse("three"))).unwrap();
        store.delete(b).unwrap();
        TagManager::new(&store).rename_tag("one", "uno").unwrap();
    }

    let store = BookmarkStore::open(&path).unwrap();
    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "A");
    assert_eq!(all[0].description, "first");
    assert_eq!(all[0].tags.as_slice(), ["uno", "two"]);
    assert_eq!(TagManager::new(&store).list_tags().unwrap(), vec!["two", "uno"]);

    // Ids keep counting past the deleted record.
    let id = store.create(NewBookmark::new("http://c.example")).unwrap();
    assert_eq!(id, 3);
}
