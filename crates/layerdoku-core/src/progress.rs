use crate::error::StoreError;
use crate::levels::{Difficulty, Mode};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::warn;

/// Marker value a completed level stores under its level key.
pub const COMPLETED_VALUE: &str = "completed";

/// Substring shared by every per-level key; bulk clear targets it.
pub const LEVEL_KEY_MARKER: &str = "_level_";

/// Prefix of in-progress session keys; bulk clear targets it too.
pub const SESSION_KEY_PREFIX: &str = "current_game_";

/// Key of a level's completion marker. The exact shape is shared with
/// previously persisted data and must never change.
pub fn level_key(difficulty: Difficulty, mode: Mode, level: usize) -> String {
    format!("{difficulty}_{mode}_level_{level}")
}

/// Key of a level's elapsed time in seconds.
pub fn time_key(difficulty: Difficulty, mode: Mode, level: usize) -> String {
    format!("{}_time", level_key(difficulty, mode, level))
}

/// Key of a level's mistake count.
pub fn mistakes_key(difficulty: Difficulty, mode: Mode, level: usize) -> String {
    format!("{}_mistakes", level_key(difficulty, mode, level))
}

/// Key of the saved in-progress session for a mode.
pub fn session_key(mode: Mode) -> String {
    format!("{SESSION_KEY_PREFIX}{mode}")
}

/// The key-value persistence the engine depends on. String keys and string
/// values; integers are stored as decimal strings. Absent keys are a normal
/// state, not a failure.
pub trait ProgressStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
    /// Every currently persisted key. Must stay callable after partial
    /// failures so bulk operations can re-enumerate.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

/// One level's persisted play record. Missing entries read as the default:
/// not completed, zero time, zero mistakes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelRecord {
    pub completed: bool,
    pub time_secs: u64,
    pub mistakes: u32,
}

/// Read the record of one level through the store contract.
pub fn read_level_record(
    store: &dyn ProgressStore,
    mode: Mode,
    difficulty: Difficulty,
    level: usize,
) -> Result<LevelRecord, StoreError> {
    let completed = store.get(&level_key(difficulty, mode, level))?.as_deref()
        == Some(COMPLETED_VALUE);
    let time_secs = read_number(store, &time_key(difficulty, mode, level))?;
    let mistakes = read_number(store, &mistakes_key(difficulty, mode, level))? as u32;
    Ok(LevelRecord {
        completed,
        time_secs,
        mistakes,
    })
}

/// Persist a completed level: the completion marker plus its elapsed time
/// and mistake count.
pub fn record_completion(
    store: &dyn ProgressStore,
    mode: Mode,
    difficulty: Difficulty,
    level: usize,
    time_secs: u64,
    mistakes: u32,
) -> Result<(), StoreError> {
    store.set(&level_key(difficulty, mode, level), COMPLETED_VALUE)?;
    store.set(&time_key(difficulty, mode, level), &time_secs.to_string())?;
    store.set(&mistakes_key(difficulty, mode, level), &mistakes.to_string())
}

/// Numeric read: absent keys are zero, and an unparsable value reads as
/// zero rather than poisoning every aggregate built on top of it.
fn read_number(store: &dyn ProgressStore, key: &str) -> Result<u64, StoreError> {
    match store.get(key)? {
        None => Ok(0),
        Some(raw) => match raw.parse() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(key, raw = %raw, "unparsable stored number, reading as 0");
                Ok(0)
            }
        },
    }
}

// ==================== Store implementations ====================

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.data.lock().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.data.lock().unwrap().keys().cloned().collect())
    }
}

/// JSON-file-backed store: a flat string map persisted at an explicit
/// path, loaded lazily and rewritten on every mutation.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Option<HashMap<String, String>>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        let mut cache = self.cache.lock().unwrap();
        if let Some(ref data) = *cache {
            return Ok(data.clone());
        }

        let data = match fs::read_to_string(&self.path) {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| StoreError(format!("corrupt store file: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError(e.to_string())),
        };

        *cache = Some(data.clone());
        Ok(data)
    }

    fn persist(&self, data: HashMap<String, String>) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(&data).map_err(|e| StoreError(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| StoreError(e.to_string()))?;
        *self.cache.lock().unwrap() = Some(data);
        Ok(())
    }
}

impl ProgressStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut data = self.load()?;
        data.insert(key.to_string(), value.to_string());
        self.persist(data)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.load()?;
        data.remove(key);
        self.persist(data)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_schema_is_stable() {
        assert_eq!(
            level_key(Difficulty::Expert, Mode::Classic, 7),
            "expert_classic_level_7"
        );
        assert_eq!(
            time_key(Difficulty::Easy, Mode::Crazy, 1),
            "easy_crazy_level_1_time"
        );
        assert_eq!(
            mistakes_key(Difficulty::Master, Mode::Classic, 50),
            "master_classic_level_50_mistakes"
        );
        assert_eq!(session_key(Mode::Crazy), "current_game_crazy");
    }

    #[test]
    fn test_absent_record_reads_as_defaults() {
        let store = MemoryStore::new();
        let record = read_level_record(&store, Mode::Classic, Difficulty::Easy, 3).unwrap();
        assert_eq!(record, LevelRecord::default());
    }

    #[test]
    fn test_record_completion_round_trip() {
        let store = MemoryStore::new();
        record_completion(&store, Mode::Crazy, Difficulty::Hard, 4, 321, 2).unwrap();

        assert_eq!(
            store.get("hard_crazy_level_4").unwrap().as_deref(),
            Some("completed")
        );
        let record = read_level_record(&store, Mode::Crazy, Difficulty::Hard, 4).unwrap();
        assert_eq!(
            record,
            LevelRecord {
                completed: true,
                time_secs: 321,
                mistakes: 2
            }
        );
    }

    #[test]
    fn test_unparsable_number_reads_as_zero() {
        let store = MemoryStore::new();
        store.set("easy_classic_level_1", COMPLETED_VALUE).unwrap();
        store.set("easy_classic_level_1_time", "garbage").unwrap();
        let record = read_level_record(&store, Mode::Classic, Difficulty::Easy, 1).unwrap();
        assert!(record.completed);
        assert_eq!(record.time_secs, 0);
    }

    #[test]
    fn test_non_completed_marker_is_not_completion() {
        let store = MemoryStore::new();
        store.set("easy_classic_level_1", "started").unwrap();
        let record = read_level_record(&store, Mode::Classic, Difficulty::Easy, 1).unwrap();
        assert!(!record.completed);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let store = FileStore::new(&path);
        record_completion(&store, Mode::Classic, Difficulty::Easy, 1, 60, 0).unwrap();
        drop(store);

        let reopened = FileStore::new(&path);
        let record = read_level_record(&reopened, Mode::Classic, Difficulty::Easy, 1).unwrap();
        assert!(record.completed);
        assert_eq!(record.time_secs, 60);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.keys().unwrap(), Vec::<String>::new());
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_file_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("progress.json"));
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }
}
