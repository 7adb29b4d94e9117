//! Core engine for Layerdoku, a Sudoku variant that superimposes several
//! symbol layers (shapes, colors, numbers) on one grid.
//!
//! The crate covers everything below the presentation layer:
//!
//! - the board and puzzle model with its validity invariants
//!   ([`grid`], [`puzzle`]),
//! - loading and validating authored level packs, memoized per asset path
//!   ([`levels`]),
//! - the persisted progress contract and its key schema ([`progress`]),
//! - per-category statistics and tier unlocking ([`stats`]),
//! - the player's working state over a puzzle, including saved sessions
//!   ([`session`]).
//!
//! Rendering, input and platform persistence live in the host; everything
//! here takes its collaborators (asset source, progress store) as injected
//! trait objects.

pub mod error;
pub mod grid;
pub mod levels;
pub mod progress;
pub mod puzzle;
pub mod session;
pub mod stats;

pub use error::{AssetError, PuzzleError, StoreError};
pub use grid::{Grid, GridSize};
pub use levels::{
    parse_classic_pack, parse_combined_pack, AssetSource, Difficulty, DirAssets, LevelLibrary,
    MemoryAssets, Mode,
};
pub use progress::{
    level_key, mistakes_key, read_level_record, record_completion, session_key, time_key,
    FileStore, LevelRecord, MemoryStore, ProgressStore, COMPLETED_VALUE,
};
pub use puzzle::{CombinedCell, CombinedPuzzle, Layer, LayerBoards, LayerSet, Puzzle};
pub use session::{load_session, Entry, GameSession, SavedSession};
pub use stats::{
    format_time, CategoryStats, LevelDetail, StatsManager, LEVELS_PER_CATEGORY,
    MASTER_UNLOCK_WINS,
};
