//! Bookmark record store for markshelf.
//!
//! Implements `BookmarkStoreTrait`: CRUD and keyword search over bookmarks.
//! Records live in an in-memory [`Catalog`] behind a reader/writer lock and
//! are written through to SQLite via `rusqlite`. Every mutation validates
//! against the catalog, commits one transaction, and only then updates the
//! catalog, so readers never see a half-applied write.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Transaction};
use tracing::{debug, info};

use crate::database::Database;
use crate::types::bookmark::{Bookmark, BookmarkUpdate, NewBookmark, SearchQuery};
use crate::types::errors::BookmarkError;
use crate::types::tag::TagSet;

/// Trait defining bookmark record operations.
pub trait BookmarkStoreTrait {
    fn create(&self, new: NewBookmark) -> Result<u64, BookmarkError>;
    fn get(&self, id: u64) -> Result<Bookmark, BookmarkError>;
    /// All bookmarks ordered by id.
    fn get_all(&self) -> Result<Vec<Bookmark>, BookmarkError>;
    fn update(&self, id: u64, update: BookmarkUpdate) -> Result<(), BookmarkError>;
    fn delete(&self, id: u64) -> Result<(), BookmarkError>;
    fn delete_all(&self) -> Result<(), BookmarkError>;
    fn search(&self, query: &SearchQuery) -> Result<Vec<Bookmark>, BookmarkError>;
}

/// In-memory view of every bookmark plus the position of each referenced tag.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    records: BTreeMap<u64, Bookmark>,
    urls: HashMap<String, u64>,
    tag_positions: HashMap<String, i64>,
    next_position: i64,
}

/// Tag position changes caused by one mutation.
#[derive(Debug, Default)]
struct TagDelta {
    assigned: Vec<(String, i64)>,
    released: Vec<String>,
    next_position: i64,
}

impl Catalog {
    /// Referenced tags ordered by position.
    pub(crate) fn ordered_tags(&self) -> Vec<String> {
        let mut tags: Vec<(&String, &i64)> = self.tag_positions.iter().collect();
        tags.sort_by_key(|(_, position)| **position);
        tags.into_iter().map(|(name, _)| name.clone()).collect()
    }

    pub(crate) fn usage_count(&self, tag: &str) -> usize {
        self.records.values().filter(|b| b.tags.contains(tag)).count()
    }

    fn insert(&mut self, bookmark: Bookmark) {
        self.urls.insert(bookmark.url.clone(), bookmark.id);
        self.records.insert(bookmark.id, bookmark);
    }

    fn remove(&mut self, id: u64) -> Option<Bookmark> {
        let removed = self.records.remove(&id)?;
        self.urls.remove(&removed.url);
        Some(removed)
    }

    fn clear(&mut self) {
        self.records.clear();
        self.urls.clear();
        self.tag_positions.clear();
    }

    /// Computes how tag positions change when the tag sets in `removed` are
    /// replaced by those in `added`.
    ///
    /// Tags that appear for the first time are appended in order of appearance.
    /// `touched`, if given, is appended even when it already has a position.
    /// Tags left without any referencing record lose their position.
    fn tag_delta(&self, removed: &[&TagSet], added: &[&TagSet], touched: Option<&str>) -> TagDelta {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for bookmark in self.records.values() {
            for tag in &bookmark.tags {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }
        for set in removed {
            for tag in *set {
                if let Some(count) = counts.get_mut(tag.as_str()) {
                    *count = count.saturating_sub(1);
                }
            }
        }
        for set in added {
            for tag in *set {
                *counts.entry(tag.as_str()).or_default() += 1;
            }
        }

        let mut next_position = self.next_position;
        let mut assigned: Vec<(String, i64)> = Vec::new();
        for set in added {
            for tag in *set {
                if Some(tag.as_str()) == touched
                    || self.tag_positions.contains_key(tag)
                    || assigned.iter().any(|(name, _)| name == tag)
                {
                    continue;
                }
                assigned.push((tag.clone(), next_position));
                next_position += 1;
            }
        }
        if let Some(name) = touched {
            assigned.push((name.to_string(), next_position));
            next_position += 1;
        }

        let released = self
            .tag_positions
            .keys()
            .filter(|name| counts.get(name.as_str()).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();

        TagDelta {
            assigned,
            released,
            next_position,
        }
    }

    fn apply_delta(&mut self, delta: TagDelta) {
        for name in delta.released {
            self.tag_positions.remove(&name);
        }
        for (name, position) in delta.assigned {
            self.tag_positions.insert(name, position);
        }
        self.next_position = delta.next_position;
    }
}

/// Bookmark store backed by a SQLite database.
///
/// Lock order is catalog first, then database.
pub struct BookmarkStore {
    catalog: RwLock<Catalog>,
    db: Mutex<Database>,
}

impl BookmarkStore {
    /// Creates a store over an opened database, loading every stored record.
    pub fn new(db: Database) -> Result<Self, BookmarkError> {
        let catalog = load_catalog(&db)?;
        let store = Self {
            catalog: RwLock::new(catalog),
            db: Mutex::new(db),
        };
        store.reconcile_tag_positions()?;
        let count = store.len()?;
        info!(bookmarks = count, "bookmark store loaded");
        Ok(store)
    }

    /// Opens (or creates) the database file at `path` and loads it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BookmarkError> {
        Self::new(Database::open(path)?)
    }

    /// Creates a store over a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self, BookmarkError> {
        Self::new(Database::open_in_memory()?)
    }

    /// Number of stored bookmarks.
    pub fn len(&self) -> Result<usize, BookmarkError> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool, BookmarkError> {
        Ok(self.len()? == 0)
    }

    /// Overwrites the title of bookmark `id`, provided its url is still `expected_url`.
    ///
    /// Returns `Ok(false)` without writing when the url has changed.
    pub fn set_title_if_url(&self, id: u64, expected_url: &str, title: &str) -> Result<bool, BookmarkError> {
        let mut catalog = self.write()?;
        let mut updated = catalog.records.get(&id).cloned().ok_or(BookmarkError::NotFound(id))?;
        if updated.url != expected_url {
            return Ok(false);
        }
        updated.title = title.to_string();
        updated.updated_at = Self::now();

        self.persist(|tx| update_row(tx, &updated))?;
        catalog.insert(updated);
        debug!(id, "bookmark title refreshed");
        Ok(true)
    }

    /// Runs `f` against the catalog under the read lock.
    pub(crate) fn with_catalog<R>(&self, f: impl FnOnce(&Catalog) -> R) -> Result<R, BookmarkError> {
        let catalog = self.read()?;
        Ok(f(&catalog))
    }

    /// Replaces tag `old` with `new_name` in every bookmark that has it, as one
    /// transaction. `new_name` becomes the most recently positioned tag.
    ///
    /// Returns the ids of the rewritten bookmarks.
    pub(crate) fn rewrite_tag(&self, old: &str, new_name: &str) -> Result<Vec<u64>, BookmarkError> {
        let mut catalog = self.write()?;
        let affected: Vec<Bookmark> = catalog
            .records
            .values()
            .filter(|b| b.tags.contains(old))
            .cloned()
            .collect();
        if affected.is_empty() {
            return Err(BookmarkError::TagNotFound(old.to_string()));
        }

        let now = Self::now();
        let rewritten: Vec<Bookmark> = affected
            .iter()
            .cloned()
            .map(|mut bookmark| {
                bookmark.tags.replace(old, new_name);
                bookmark.updated_at = now;
                bookmark
            })
            .collect();

        let removed: Vec<&TagSet> = affected.iter().map(|b| &b.tags).collect();
        let added: Vec<&TagSet> = rewritten.iter().map(|b| &b.tags).collect();
        let delta = catalog.tag_delta(&removed, &added, Some(new_name));

        self.persist(|tx| {
            for bookmark in &rewritten {
                update_row(tx, bookmark)?;
            }
            write_tag_delta(tx, &delta)
        })?;

        catalog.apply_delta(delta);
        let ids = rewritten.iter().map(|b| b.id).collect();
        for bookmark in rewritten {
            catalog.insert(bookmark);
        }
        Ok(ids)
    }

    /// Returns the current UNIX timestamp in seconds.
    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>, BookmarkError> {
        self.catalog.read().map_err(|_| BookmarkError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>, BookmarkError> {
        self.catalog.write().map_err(|_| BookmarkError::LockPoisoned)
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, BookmarkError> {
        self.db.lock().map_err(|_| BookmarkError::LockPoisoned)
    }

    /// Runs `f` inside a transaction; nothing is committed if `f` fails.
    fn persist<T>(&self, f: impl FnOnce(&Transaction) -> Result<T, BookmarkError>) -> Result<T, BookmarkError> {
        let mut db = self.db()?;
        let tx = db.connection_mut().transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Gives every referenced tag a position and drops positions of
    /// unreferenced tags, e.g. after the database was edited externally.
    fn reconcile_tag_positions(&self) -> Result<(), BookmarkError> {
        let mut catalog = self.write()?;
        let sets: Vec<TagSet> = catalog.records.values().map(|b| b.tags.clone()).collect();
        let added: Vec<&TagSet> = sets.iter().collect();
        let delta = catalog.tag_delta(&added, &added, None);
        if delta.assigned.is_empty() && delta.released.is_empty() {
            return Ok(());
        }
        self.persist(|tx| write_tag_delta(tx, &delta))?;
        catalog.apply_delta(delta);
        Ok(())
    }
}

impl BookmarkStoreTrait for BookmarkStore {
    /// Adds a new bookmark. Returns the assigned id.
    fn create(&self, new: NewBookmark) -> Result<u64, BookmarkError> {
        if new.url.trim().is_empty() {
            return Err(BookmarkError::InvalidInput("url is required".to_string()));
        }

        let mut catalog = self.write()?;
        if catalog.urls.contains_key(&new.url) {
            return Err(BookmarkError::DuplicateUrl(new.url));
        }

        let now = Self::now();
        let mut bookmark = Bookmark {
            id: 0,
            url: new.url,
            title: new.title.unwrap_or_default(),
            description: new.description.unwrap_or_default(),
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };
        let delta = catalog.tag_delta(&[], &[&bookmark.tags], None);

        let id = self.persist(|tx| {
            let id = insert_row(tx, &bookmark)?;
            write_tag_delta(tx, &delta)?;
            Ok(id)
        })?;

        bookmark.id = id;
        catalog.apply_delta(delta);
        catalog.insert(bookmark);
        debug!(id, "bookmark created");
        Ok(id)
    }

    fn get(&self, id: u64) -> Result<Bookmark, BookmarkError> {
        self.read()?
            .records
            .get(&id)
            .cloned()
            .ok_or(BookmarkError::NotFound(id))
    }

    fn get_all(&self) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.read()?.records.values().cloned().collect())
    }

    /// Applies the supplied fields; supplied tags replace the existing set.
    fn update(&self, id: u64, update: BookmarkUpdate) -> Result<(), BookmarkError> {
        let mut catalog = self.write()?;
        let current = catalog.records.get(&id).cloned().ok_or(BookmarkError::NotFound(id))?;
        if update.is_empty() {
            return Ok(());
        }

        let mut updated = current.clone();
        if let Some(url) = update.url {
            if url.trim().is_empty() {
                return Err(BookmarkError::InvalidInput("url must not be empty".to_string()));
            }
            if let Some(&other) = catalog.urls.get(&url) {
                if other != id {
                    return Err(BookmarkError::InvalidInput(format!(
                        "url {} is already bookmarked as {}",
                        url, other
                    )));
                }
            }
            updated.url = url;
        }
        if let Some(title) = update.title {
            updated.title = title;
        }
        if let Some(description) = update.description {
            updated.description = description;
        }
        if let Some(tags) = update.tags {
            updated.tags = tags;
        }
        updated.updated_at = Self::now();

        let delta = catalog.tag_delta(&[&current.tags], &[&updated.tags], None);
        self.persist(|tx| {
            update_row(tx, &updated)?;
            write_tag_delta(tx, &delta)
        })?;

        catalog.apply_delta(delta);
        catalog.remove(id);
        catalog.insert(updated);
        debug!(id, "bookmark updated");
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<(), BookmarkError> {
        let mut catalog = self.write()?;
        let current = catalog.records.get(&id).ok_or(BookmarkError::NotFound(id))?;
        let delta = catalog.tag_delta(&[&current.tags], &[], None);

        self.persist(|tx| {
            tx.execute("DELETE FROM bookmarks WHERE id = ?1", params![id as i64])?;
            write_tag_delta(tx, &delta)
        })?;

        catalog.apply_delta(delta);
        catalog.remove(id);
        debug!(id, "bookmark deleted");
        Ok(())
    }

    fn delete_all(&self) -> Result<(), BookmarkError> {
        let mut catalog = self.write()?;
        self.persist(|tx| {
            tx.execute_batch("DELETE FROM bookmarks; DELETE FROM tags;")?;
            Ok(())
        })?;
        let count = catalog.records.len();
        catalog.clear();
        debug!(count, "all bookmarks deleted");
        Ok(())
    }

    /// Case-insensitive keyword search. No keywords yields no results.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Bookmark>, BookmarkError> {
        let keywords: Vec<String> = query
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = self.read()?;
        let results = catalog
            .records
            .values()
            .filter(|bookmark| matches_keywords(bookmark, &keywords, query))
            .cloned()
            .collect();
        Ok(results)
    }
}

fn matches_keywords(bookmark: &Bookmark, keywords: &[String], query: &SearchQuery) -> bool {
    let mut fields = vec![
        bookmark.url.to_lowercase(),
        bookmark.title.to_lowercase(),
        bookmark.description.to_lowercase(),
    ];
    fields.extend(bookmark.tags.iter().map(|t| t.to_lowercase()));

    let hit = |keyword: &String| {
        fields.iter().any(|field| {
            if query.deep {
                field.contains(keyword.as_str())
            } else {
                contains_word(field, keyword)
            }
        })
    };

    if query.all_keywords {
        keywords.iter().all(hit)
    } else {
        keywords.iter().any(hit)
    }
}

/// True when `needle` occurs in `haystack` delimited by non-alphanumeric
/// characters or the ends of the string.
fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn insert_row(tx: &Transaction, bookmark: &Bookmark) -> Result<u64, BookmarkError> {
    let tags = serde_json::to_string(&bookmark.tags)?;
    tx.execute(
        "INSERT INTO bookmarks (url, title, description, tags, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            bookmark.url,
            bookmark.title,
            bookmark.description,
            tags,
            bookmark.created_at,
            bookmark.updated_at
        ],
    )?;
    Ok(tx.last_insert_rowid() as u64)
}

fn update_row(tx: &Transaction, bookmark: &Bookmark) -> Result<(), BookmarkError> {
    let tags = serde_json::to_string(&bookmark.tags)?;
    let affected = tx.execute(
        "UPDATE bookmarks SET url = ?1, title = ?2, description = ?3, tags = ?4, updated_at = ?5 \
         WHERE id = ?6",
        params![
            bookmark.url,
            bookmark.title,
            bookmark.description,
            tags,
            bookmark.updated_at,
            bookmark.id as i64
        ],
    )?;
    if affected == 0 {
        return Err(BookmarkError::NotFound(bookmark.id));
    }
    Ok(())
}

fn write_tag_delta(tx: &Transaction, delta: &TagDelta) -> Result<(), BookmarkError> {
    for name in &delta.released {
        tx.execute("DELETE FROM tags WHERE name = ?1", params![name])?;
    }
    for (name, position) in &delta.assigned {
        tx.execute(
            "INSERT OR REPLACE INTO tags (name, position) VALUES (?1, ?2)",
            params![name, position],
        )?;
    }
    Ok(())
}

fn load_catalog(db: &Database) -> Result<Catalog, BookmarkError> {
    let conn = db.connection();
    let mut catalog = Catalog::default();

    let mut stmt = conn.prepare(
        "SELECT id, url, title, description, tags, created_at, updated_at FROM bookmarks ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, i64>(6)?,
        ))
    })?;
    for row in rows {
        let (id, url, title, description, tags, created_at, updated_at) = row?;
        let tags: TagSet = serde_json::from_str(&tags)?;
        catalog.insert(Bookmark {
            id: id as u64,
            url,
            title,
            description,
            tags,
            created_at,
            updated_at,
        });
    }

    let mut stmt = conn.prepare("SELECT name, position FROM tags")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
    for row in rows {
        let (name, position) = row?;
        catalog.next_position = catalog.next_position.max(position + 1);
        catalog.tag_positions.insert(name, position);
    }

    Ok(catalog)
}
