//! JSON file implementation of the teamkill [`CounterStore`].
//!
//! The whole mapping lives in one file and is re-read on every operation and
//! rewritten on every mutation. There is no cache, so reads always see the
//! last committed write.
//!
//! # File Format
//!
//! ```json
//! {
//!   "123456789": { "username": "Alice", "tks": 3 },
//!   "987654321": { "username": "Bob", "tks": 0 }
//! }
//! ```
//!
//! This is the layout the bot has always written, so existing `tk_data.json`
//! files load unchanged.
//!
//! # Durability
//!
//! Writes go to a sibling temp file which is fsynced and then renamed over
//! the data file. A crash leaves either the old or the new mapping, never a
//! torn one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use teamkill_core::{AuthorizationPolicy, CommandDispatcher};
//! use teamkill_persistence::JsonFileStore;
//!
//! let store = Arc::new(JsonFileStore::new("tk_data.json"));
//! let dispatcher = CommandDispatcher::new(store, AuthorizationPolicy::default());
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use teamkill_core::{CounterRecord, CounterStore, CounterTable, Delta, StoreError};

/// Counter store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    // Held by the blocking worker for the whole read-modify-write, so a
    // dropped caller future cannot release it mid-write.
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    /// Create a store for `path`. The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full table, zero counts included.
    pub async fn load(&self) -> Result<CounterTable, StoreError> {
        self.locked(|path| read_table(path)).await
    }

    /// Run `op` on a blocking thread while holding the store lock.
    async fn locked<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        let lock = Arc::clone(&self.lock);
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            op(&path)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl CounterStore for JsonFileStore {
    async fn apply_delta(
        &self,
        user_id: &str,
        display_name: &str,
        delta: Delta,
    ) -> Result<u64, StoreError> {
        let user_id = user_id.to_owned();
        let display_name = display_name.to_owned();
        self.locked(move |path| {
            let mut table = read_table(path)?;
            let count = table.apply(&user_id, &display_name, delta)?;
            write_table(path, &table)?;
            Ok(count)
        })
        .await
    }

    async fn snapshot(&self) -> Result<Vec<CounterRecord>, StoreError> {
        self.locked(|path| Ok(read_table(path)?.snapshot())).await
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.locked(|path| write_table(path, &CounterTable::new()))
            .await
    }
}

/// Load the table, treating a missing or blank file as empty.
fn read_table(path: &Path) -> Result<CounterTable, StoreError> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CounterTable::new()),
        Err(e) => return Err(e.into()),
    };
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(CounterTable::new());
    }
    serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace the file contents atomically: temp file, fsync, rename.
fn write_table(path: &Path, table: &CounterTable) -> Result<(), StoreError> {
    let data = serde_json::to_vec_pretty(table).map_err(StoreError::Encode)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent)?;
            Some(parent)
        }
        _ => None,
    };

    let tmp_path = tmp_path(path);
    let mut file = File::create(&tmp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    // fsync the directory so the rename itself is durable
    #[cfg(unix)]
    File::open(dir.unwrap_or(Path::new(".")))?.sync_all()?;
    #[cfg(not(unix))]
    let _ = dir;

    tracing::trace!(path = %path.display(), users = table.len(), "counter data committed");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
