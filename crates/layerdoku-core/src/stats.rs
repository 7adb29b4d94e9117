use crate::error::StoreError;
use crate::levels::{Difficulty, Mode};
use crate::progress::{
    self, read_level_record, ProgressStore, COMPLETED_VALUE, LEVEL_KEY_MARKER, SESSION_KEY_PREFIX,
};
use std::sync::Arc;
use tracing::info;

/// Levels authored per (mode, difficulty) category.
pub const LEVELS_PER_CATEGORY: usize = 50;

/// Expert completions required before the master tier opens.
pub const MASTER_UNLOCK_WINS: usize = 3;

/// The record of one level inside a category summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDetail {
    /// 1-based level number.
    pub level: usize,
    pub completed: bool,
    pub time_secs: u64,
    pub mistakes: u32,
}

/// Aggregate view of one (mode, difficulty) category. Derived on demand,
/// never persisted.
#[derive(Debug, Clone)]
pub struct CategoryStats {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub levels: Vec<LevelDetail>,
    pub levels_completed: usize,
    pub completion_pct: f32,
    /// Truncated mean over completed levels; 0 with no completions.
    pub avg_time_secs: u64,
    /// Minimum positive time among completed levels; a completion with no
    /// recorded time does not count. 0 when nothing qualifies.
    pub best_time_secs: u64,
    /// Mean over completed levels; 0.0 with no completions.
    pub avg_mistakes: f32,
    pub unlocked: bool,
}

/// Turns raw per-level records into category summaries and unlock
/// decisions. Owns nothing but a handle to the injected store.
pub struct StatsManager {
    store: Arc<dyn ProgressStore>,
}

impl StatsManager {
    pub fn new(store: Arc<dyn ProgressStore>) -> Self {
        StatsManager { store }
    }

    /// Summary of one category over the standard level count.
    pub fn category_stats(
        &self,
        mode: Mode,
        difficulty: Difficulty,
    ) -> Result<CategoryStats, StoreError> {
        self.category_stats_over(mode, difficulty, LEVELS_PER_CATEGORY)
    }

    /// Summary of one category over an explicit level count. Reads run in
    /// increasing level order; the reduction itself is order-independent.
    pub fn category_stats_over(
        &self,
        mode: Mode,
        difficulty: Difficulty,
        level_count: usize,
    ) -> Result<CategoryStats, StoreError> {
        let mut levels = Vec::with_capacity(level_count);
        for level in 1..=level_count {
            let record = read_level_record(self.store.as_ref(), mode, difficulty, level)?;
            levels.push(LevelDetail {
                level,
                completed: record.completed,
                time_secs: record.time_secs,
                mistakes: record.mistakes,
            });
        }

        let completed: Vec<&LevelDetail> = levels.iter().filter(|d| d.completed).collect();
        let levels_completed = completed.len();
        let completion_pct = if level_count > 0 {
            levels_completed as f32 / level_count as f32 * 100.0
        } else {
            0.0
        };

        let (avg_time_secs, avg_mistakes) = if levels_completed > 0 {
            let total_time: u64 = completed.iter().map(|d| d.time_secs).sum();
            let total_mistakes: u32 = completed.iter().map(|d| d.mistakes).sum();
            (
                total_time / levels_completed as u64,
                total_mistakes as f32 / levels_completed as f32,
            )
        } else {
            (0, 0.0)
        };

        let best_time_secs = completed
            .iter()
            .map(|d| d.time_secs)
            .filter(|&t| t > 0)
            .min()
            .unwrap_or(0);

        Ok(CategoryStats {
            mode,
            difficulty,
            levels,
            levels_completed,
            completion_pct,
            avg_time_secs,
            best_time_secs,
            avg_mistakes,
            unlocked: self.is_unlocked(mode, difficulty)?,
        })
    }

    /// Completed-level count of one category.
    pub fn completed_count(&self, mode: Mode, difficulty: Difficulty) -> Result<usize, StoreError> {
        let mut count = 0;
        for level in 1..=LEVELS_PER_CATEGORY {
            let key = progress::level_key(difficulty, mode, level);
            if self.store.get(&key)?.as_deref() == Some(COMPLETED_VALUE) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Whether a tier is playable. Every tier but master always is; master
    /// opens once the expert tier of the same mode has enough completions.
    pub fn is_unlocked(&self, mode: Mode, difficulty: Difficulty) -> Result<bool, StoreError> {
        if difficulty != Difficulty::Master {
            return Ok(true);
        }
        Ok(self.completed_count(mode, Difficulty::Expert)? >= MASTER_UNLOCK_WINS)
    }

    /// Completed levels across every tier of a mode.
    pub fn total_completed(&self, mode: Mode) -> Result<usize, StoreError> {
        let mut total = 0;
        for &difficulty in Difficulty::all() {
            total += self.completed_count(mode, difficulty)?;
        }
        Ok(total)
    }

    /// Remove every persisted level record and saved session. Destructive
    /// and irreversible. The store may not offer transactions, so the sweep
    /// attempts every matching key and reports the first failure only after
    /// the pass; each key has either been removed or left intact, and the
    /// store stays enumerable.
    pub fn clear_all_progress(&self) -> Result<(), StoreError> {
        let keys = self.store.keys()?;
        let mut removed = 0usize;
        let mut first_failure = None;
        for key in keys {
            if !is_progress_key(&key) {
                continue;
            }
            match self.store.remove(&key) {
                Ok(()) => removed += 1,
                Err(e) => {
                    if first_failure.is_none() {
                        first_failure = Some(e);
                    }
                }
            }
        }
        info!(removed, "cleared persisted progress");
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Whether a key belongs to the progress namespace subject to bulk clear.
fn is_progress_key(key: &str) -> bool {
    key.contains(LEVEL_KEY_MARKER) || key.contains(SESSION_KEY_PREFIX)
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_time(secs: u64) -> String {
    if secs >= 3600 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        let secs = secs % 60;
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{:02}:{:02}", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{record_completion, MemoryStore};

    fn manager() -> (Arc<MemoryStore>, StatsManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = StatsManager::new(store.clone());
        (store, manager)
    }

    #[test]
    fn test_empty_category_baseline() {
        let (_, manager) = manager();
        let stats = manager.category_stats(Mode::Classic, Difficulty::Easy).unwrap();
        assert_eq!(stats.levels_completed, 0);
        assert_eq!(stats.avg_time_secs, 0);
        assert_eq!(stats.best_time_secs, 0);
        assert_eq!(stats.avg_mistakes, 0.0);
        assert_eq!(stats.completion_pct, 0.0);
        assert_eq!(stats.levels.len(), LEVELS_PER_CATEGORY);
        assert!(stats.unlocked);
    }

    #[test]
    fn test_expert_aggregation_scenario() {
        // Three completions with times [100, 0, 50] and mistakes [2, 1, 0].
        let (store, manager) = manager();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 1, 100, 2).unwrap();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 2, 0, 1).unwrap();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 3, 50, 0).unwrap();

        let stats = manager
            .category_stats(Mode::Classic, Difficulty::Expert)
            .unwrap();
        assert_eq!(stats.levels_completed, 3);
        assert_eq!(stats.avg_time_secs, 50);
        // The zero-time completion is excluded from best-time consideration.
        assert_eq!(stats.best_time_secs, 50);
        assert_eq!(stats.avg_mistakes, 1.0);
        assert_eq!(stats.completion_pct, 6.0);
    }

    #[test]
    fn test_incomplete_levels_do_not_count() {
        let (store, manager) = manager();
        // A time recorded without the completion marker stays out of every
        // aggregate.
        store.set("easy_classic_level_9_time", "10").unwrap();
        let stats = manager.category_stats(Mode::Classic, Difficulty::Easy).unwrap();
        assert_eq!(stats.levels_completed, 0);
        assert_eq!(stats.best_time_secs, 0);
    }

    #[test]
    fn test_master_unlock_threshold() {
        let (store, manager) = manager();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 1, 90, 0).unwrap();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 2, 80, 0).unwrap();
        assert!(!manager.is_unlocked(Mode::Classic, Difficulty::Master).unwrap());

        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 3, 70, 0).unwrap();
        assert!(manager.is_unlocked(Mode::Classic, Difficulty::Master).unwrap());

        // The gate is per mode: crazy master stays locked.
        assert!(!manager.is_unlocked(Mode::Crazy, Difficulty::Master).unwrap());
    }

    #[test]
    fn test_lower_tiers_always_unlocked() {
        let (_, manager) = manager();
        for &difficulty in Difficulty::all() {
            let expected = difficulty != Difficulty::Master;
            assert_eq!(
                manager.is_unlocked(Mode::Classic, difficulty).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn test_total_completed_spans_tiers() {
        let (store, manager) = manager();
        record_completion(store.as_ref(), Mode::Crazy, Difficulty::Medium, 1, 10, 0).unwrap();
        record_completion(store.as_ref(), Mode::Crazy, Difficulty::Hard, 1, 10, 0).unwrap();
        record_completion(store.as_ref(), Mode::Crazy, Difficulty::Hard, 2, 10, 0).unwrap();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Easy, 1, 10, 0).unwrap();

        assert_eq!(manager.total_completed(Mode::Crazy).unwrap(), 3);
        assert_eq!(manager.total_completed(Mode::Classic).unwrap(), 1);
    }

    #[test]
    fn test_clear_all_progress_resets_to_baseline() {
        let (store, manager) = manager();
        record_completion(store.as_ref(), Mode::Classic, Difficulty::Expert, 1, 100, 2).unwrap();
        store.set("current_game_classic", "{}").unwrap();
        // A key outside the progress namespace survives the sweep.
        store.set("sound_enabled", "true").unwrap();

        manager.clear_all_progress().unwrap();

        let stats = manager
            .category_stats(Mode::Classic, Difficulty::Expert)
            .unwrap();
        assert_eq!(stats.levels_completed, 0);
        assert_eq!(stats.avg_time_secs, 0);
        assert_eq!(stats.best_time_secs, 0);
        assert_eq!(stats.avg_mistakes, 0.0);
        assert_eq!(manager.total_completed(Mode::Classic).unwrap(), 0);
        assert_eq!(store.get("current_game_classic").unwrap(), None);
        assert_eq!(store.get("sound_enabled").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_clear_reports_failure_after_full_sweep() {
        // A store whose removes all fail: the sweep still visits every key
        // and the store stays enumerable.
        struct StubbornStore(MemoryStore);
        impl ProgressStore for StubbornStore {
            fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
                self.0.get(key)
            }
            fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
                self.0.set(key, value)
            }
            fn remove(&self, _key: &str) -> Result<(), StoreError> {
                Err(StoreError("read-only".into()))
            }
            fn keys(&self) -> Result<Vec<String>, StoreError> {
                self.0.keys()
            }
        }

        let store = Arc::new(StubbornStore(MemoryStore::new()));
        store.set("easy_classic_level_1", COMPLETED_VALUE).unwrap();
        let manager = StatsManager::new(store.clone());

        assert!(manager.clear_all_progress().is_err());
        assert!(!store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(59), "00:59");
        assert_eq!(format_time(125), "02:05");
        assert_eq!(format_time(3700), "1:01:40");
    }
}
