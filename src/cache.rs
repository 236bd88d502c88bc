//! File-backed dataset cache
//!
//! Parsed datasets are cached per path and reused for as long as the file's
//! modification time and size are unchanged. Entries can also be dropped on
//! demand with `invalidate` or `clear`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// Identity of a file version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStamp {
    pub modified: SystemTime,
    pub size: u64,
}

impl FileStamp {
    /// Stamp of the file at `path`, or `None` if it cannot be stat'ed
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok()?,
            size: metadata.len(),
        })
    }
}

struct CachedFile<T> {
    stamp: FileStamp,
    data: Arc<T>,
}

/// Cache of parsed files keyed by path
pub struct FileCache<T> {
    entries: HashMap<PathBuf, CachedFile<T>>,
}

impl<T> Default for FileCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FileCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cached data for `path` if it was loaded from the same file version
    pub fn get(&self, path: &Path, stamp: &FileStamp) -> Option<Arc<T>> {
        let cached = self.entries.get(path)?;
        if cached.stamp == *stamp {
            Some(cached.data.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, path: &Path, stamp: FileStamp, data: T) -> Arc<T> {
        let data = Arc::new(data);
        self.entries.insert(
            path.to_path_buf(),
            CachedFile {
                stamp,
                data: data.clone(),
            },
        );
        data
    }

    /// Drop the entry for `path`; returns whether one existed
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Return the cached dataset for `path`, loading it on a miss
///
/// A file that cannot be stat'ed is never cached: `load` runs directly so it
/// can report the problem, and any stale entry is removed.
pub fn get_or_load<T, E, F>(cache: &RwLock<FileCache<T>>, path: &Path, load: F) -> Result<Arc<T>, E>
where
    F: FnOnce(&Path) -> Result<T, E>,
{
    let Some(stamp) = FileStamp::of(path) else {
        if let Ok(mut c) = cache.write() {
            c.invalidate(path);
        }
        return load(path).map(Arc::new);
    };

    if let Ok(c) = cache.read() {
        if let Some(data) = c.get(path, &stamp) {
            return Ok(data);
        }
    }

    tracing::info!("Loading {:?}", path);
    let data = load(path)?;
    match cache.write() {
        Ok(mut c) => Ok(c.insert(path, stamp, data)),
        Err(_) => Ok(Arc::new(data)),
    }
}
