use crate::error::{AssetError, StoreError};
use crate::grid::Grid;
use crate::levels::{Difficulty, LevelLibrary, Mode};
use crate::progress::{self, record_completion, ProgressStore};
use crate::puzzle::{CombinedPuzzle, Layer, Puzzle};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result of entering a symbol on the working board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    /// Placed, and it matches the authored solution.
    Correct,
    /// Placed, but it contradicts the authored solution. Counted as a
    /// mistake; the wrong value stays on the board.
    Wrong,
    /// The cell was emptied.
    Cleared,
    /// The cell is a clue; nothing changed.
    Fixed,
    /// The value is outside the symbol domain or the layer is absent;
    /// nothing changed.
    Rejected,
}

#[derive(Debug, Clone)]
enum SessionPuzzle {
    Classic(Puzzle),
    Combined(CombinedPuzzle),
}

/// The player's mutable state layered over an immutable puzzle: one working
/// grid per layer, a mistake counter and an elapsed-time accumulator. The
/// puzzle's clue and solution boards are never touched.
#[derive(Debug, Clone)]
pub struct GameSession {
    mode: Mode,
    difficulty: Difficulty,
    level: usize,
    puzzle: SessionPuzzle,
    working: Vec<Grid>,
    mistakes: u32,
    elapsed_secs: u64,
}

impl GameSession {
    /// Start a classic level. `level` is the 1-based level number.
    pub fn classic(difficulty: Difficulty, level: usize, puzzle: Puzzle) -> GameSession {
        let working = vec![puzzle.initial().clone()];
        GameSession {
            mode: Mode::Classic,
            difficulty,
            level,
            puzzle: SessionPuzzle::Classic(puzzle),
            working,
            mistakes: 0,
            elapsed_secs: 0,
        }
    }

    /// Start a combined level. `level` is the 0-based pack index the level
    /// was requested with (pre-wrap, so replays resume the same request).
    pub fn combined(difficulty: Difficulty, level: usize, puzzle: CombinedPuzzle) -> GameSession {
        let working = puzzle
            .layers()
            .iter()
            .map(|boards| boards.initial.clone())
            .collect();
        GameSession {
            mode: Mode::Crazy,
            difficulty,
            level,
            puzzle: SessionPuzzle::Combined(puzzle),
            working,
            mistakes: 0,
            elapsed_secs: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// Advance the play clock. The host owns real time; the session only
    /// accumulates.
    pub fn add_elapsed(&mut self, secs: u64) {
        self.elapsed_secs = self.elapsed_secs.saturating_add(secs);
    }

    /// Working boards in layer order; classic sessions have exactly one.
    pub fn working(&self) -> &[Grid] {
        &self.working
    }

    /// The layer receiving input focus when the session opens.
    pub fn default_layer(&self) -> Layer {
        match &self.puzzle {
            SessionPuzzle::Classic(_) => Layer::Number,
            SessionPuzzle::Combined(p) => p.default_layer(),
        }
    }

    fn layer_index(&self, layer: Layer) -> Option<usize> {
        match &self.puzzle {
            SessionPuzzle::Classic(_) => (layer == Layer::Number).then_some(0),
            SessionPuzzle::Combined(p) => p.layer_set().index_of(layer),
        }
    }

    fn is_fixed(&self, row: usize, col: usize) -> bool {
        match &self.puzzle {
            SessionPuzzle::Classic(p) => p.is_fixed(row, col),
            SessionPuzzle::Combined(p) => p.is_fixed(row, col),
        }
    }

    fn solution_value(&self, index: usize, row: usize, col: usize) -> u8 {
        match &self.puzzle {
            SessionPuzzle::Classic(p) => p.solution().value(row, col),
            SessionPuzzle::Combined(p) => p.layers()[index].solution.value(row, col),
        }
    }

    /// Enter a symbol at a coordinate of one layer. Clue cells reject the
    /// write; `0` clears; a wrong value is placed anyway and bumps the
    /// mistake counter.
    pub fn enter(&mut self, layer: Layer, row: usize, col: usize, value: u8) -> Entry {
        let Some(index) = self.layer_index(layer) else {
            return Entry::Rejected;
        };
        let grid = &self.working[index];
        if row >= grid.side() || col >= grid.side() || value > grid.size().max_symbol() {
            return Entry::Rejected;
        }
        if self.is_fixed(row, col) {
            return Entry::Fixed;
        }

        self.working[index].set(row, col, value);
        if value == 0 {
            Entry::Cleared
        } else if value == self.solution_value(index, row, col) {
            Entry::Correct
        } else {
            self.mistakes += 1;
            Entry::Wrong
        }
    }

    /// Whether every working board matches its authored solution.
    pub fn is_solved(&self) -> bool {
        match &self.puzzle {
            SessionPuzzle::Classic(p) => p.is_solved_by(&self.working[0]),
            SessionPuzzle::Combined(p) => p.is_solved_by(&self.working),
        }
    }

    /// Persist the completion record for this session and drop its saved
    /// snapshot, if any.
    pub fn finish(&self, store: &dyn ProgressStore) -> Result<(), StoreError> {
        record_completion(
            store,
            self.mode,
            self.difficulty,
            self.level,
            self.elapsed_secs,
            self.mistakes,
        )?;
        store.remove(&progress::session_key(self.mode))
    }

    /// Serializable snapshot of the session.
    pub fn snapshot(&self) -> SavedSession {
        SavedSession {
            mode: self.mode,
            difficulty: self.difficulty,
            level: self.level,
            elapsed_secs: self.elapsed_secs,
            mistakes: self.mistakes,
            boards: self.working.iter().map(Grid::to_flat_string).collect(),
        }
    }

    /// Save the snapshot under the mode's session key.
    pub fn save(&self, store: &dyn ProgressStore) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.snapshot())
            .map_err(|e| StoreError(e.to_string()))?;
        store.set(&progress::session_key(self.mode), &json)
    }

    /// Rebuild a session from a snapshot, reloading the puzzle through the
    /// level library. Saved values are replayed onto fresh boards, skipping
    /// clue cells, so a snapshot can never corrupt the clue layout.
    pub fn from_saved(
        saved: &SavedSession,
        library: &LevelLibrary,
    ) -> Result<GameSession, AssetError> {
        let mut session = match saved.mode {
            Mode::Classic => {
                let puzzle = library.classic_level(saved.difficulty, saved.level)?;
                GameSession::classic(saved.difficulty, saved.level, puzzle)
            }
            Mode::Crazy => {
                let puzzle = library.combined_level(saved.difficulty, saved.level)?;
                GameSession::combined(saved.difficulty, saved.level, puzzle)
            }
        };

        let key = progress::session_key(saved.mode);
        if saved.boards.len() != session.working.len() {
            return Err(AssetError::malformed(
                &key,
                format!(
                    "snapshot has {} boards, puzzle has {} layers",
                    saved.boards.len(),
                    session.working.len()
                ),
            ));
        }

        let size = session.working[0].size();
        for (index, board) in saved.boards.iter().enumerate() {
            let grid = Grid::from_flat_str(size, board)
                .map_err(|e| AssetError::malformed(&key, format!("board {index}: {e}")))?;
            for row in 0..size.side() {
                for col in 0..size.side() {
                    if !session.is_fixed(row, col) {
                        session.working[index].set(row, col, grid.value(row, col));
                    }
                }
            }
        }

        session.mistakes = saved.mistakes;
        session.elapsed_secs = saved.elapsed_secs;
        Ok(session)
    }
}

/// A saved in-progress game, one per mode, persisted as JSON through the
/// progress store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub mode: Mode,
    pub difficulty: Difficulty,
    pub level: usize,
    pub elapsed_secs: u64,
    pub mistakes: u32,
    /// Working boards as flat strings, layer order.
    pub boards: Vec<String>,
}

/// Load the saved session for a mode, if one exists. A corrupt snapshot is
/// discarded with a warning rather than blocking a fresh start; a saved
/// game is disposable state.
pub fn load_session(
    store: &dyn ProgressStore,
    mode: Mode,
) -> Result<Option<SavedSession>, StoreError> {
    let key = progress::session_key(mode);
    match store.get(&key)? {
        None => Ok(None),
        Some(json) => match serde_json::from_str(&json) {
            Ok(saved) => Ok(Some(saved)),
            Err(e) => {
                warn!(key = %key, error = %e, "discarding corrupt saved session");
                Ok(None)
            }
        },
    }
}
