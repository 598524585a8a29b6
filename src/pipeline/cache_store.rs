/*!
 * Durable page-translation cache backing the resume logic.
 *
 * The cache is a thread-safe mapping from page index to completed
 * translation, persisted as a single JSON document with string-encoded
 * index keys. Every upsert rewrites the whole record (write-through), so a
 * crash loses at most the in-flight pages, never previously completed ones.
 */

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;

use crate::document::PageTranslation;
use crate::errors::CacheError;

/// Thread-safe, write-through cache of completed page translations.
///
/// All mutation of the in-memory map and the backing file is funneled
/// through a single mutex, so concurrent worker completions are totally
/// ordered and the persisted record never diverges from memory by more than
/// one in-flight upsert.
pub struct CacheStore {
    /// Path of the persisted cache record
    path: PathBuf,

    /// Guarded in-memory mapping, kept sorted by page index
    pages: Mutex<BTreeMap<u32, PageTranslation>>,
}

impl CacheStore {
    /// Create a cache store backed by the given record path, starting empty
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: Mutex::new(BTreeMap::new()),
        }
    }

    /// Path of the persisted record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record into memory, replacing current contents.
    ///
    /// A missing file is not an error and yields an empty cache; a file
    /// that exists but cannot be parsed fails loudly with
    /// [`CacheError::Corrupt`].
    pub fn load(&self) -> Result<usize, CacheError> {
        if !self.path.exists() {
            debug!("No cache record at {:?}, starting empty", self.path);
            let mut pages = self.pages.lock();
            pages.clear();
            return Ok(0);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;

        let record: BTreeMap<String, PageTranslation> =
            serde_json::from_str(&raw).map_err(|source| CacheError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        let mut pages = self.pages.lock();
        pages.clear();
        for (_, translation) in record {
            pages.insert(translation.index, translation);
        }

        debug!("Loaded {} cached pages from {:?}", pages.len(), self.path);
        Ok(pages.len())
    }

    /// Insert or replace the entry for the result's page index and
    /// immediately persist the full record.
    pub fn upsert(&self, result: PageTranslation) -> Result<(), CacheError> {
        let pages = {
            let mut pages = self.pages.lock();
            pages.insert(result.index, result);
            // Persist while holding the lock so writes are totally ordered
            self.write_record(&pages)?;
            pages.len()
        };
        debug!("Cache now holds {} pages", pages);
        Ok(())
    }

    /// Persist the current in-memory mapping. Idempotent; called on every
    /// run exit path so the on-disk state reflects memory regardless of how
    /// the run ended.
    pub fn flush(&self) -> Result<(), CacheError> {
        let pages = self.pages.lock();
        self.write_record(&pages)
    }

    /// Drop all in-memory entries without touching the persisted record.
    /// Used by non-resume runs, which start from an empty mapping; the
    /// record is overwritten on the next write-through.
    pub fn clear(&self) {
        self.pages.lock().clear();
    }

    /// Indices currently present in the cache
    pub fn cached_indices(&self) -> BTreeSet<u32> {
        self.pages.lock().keys().copied().collect()
    }

    /// Look up a single cached page
    pub fn get(&self, index: u32) -> Option<PageTranslation> {
        self.pages.lock().get(&index).cloned()
    }

    /// Copy of the full in-memory mapping, ordered by page index
    pub fn snapshot(&self) -> BTreeMap<u32, PageTranslation> {
        self.pages.lock().clone()
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    /// Check whether the cache holds no pages
    pub fn is_empty(&self) -> bool {
        self.pages.lock().is_empty()
    }

    /// Serialize the mapping with string-encoded index keys and rewrite the
    /// backing record wholesale.
    fn write_record(&self, pages: &BTreeMap<u32, PageTranslation>) -> Result<(), CacheError> {
        let record: BTreeMap<String, &PageTranslation> = pages
            .iter()
            .map(|(index, translation)| (index.to_string(), translation))
            .collect();

        let json = serde_json::to_string_pretty(&record).map_err(|source| CacheError::Encode {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        fs::write(&self.path, json).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
