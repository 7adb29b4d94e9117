use crate::error::AssetError;
use crate::grid::{Grid, GridSize};
use crate::puzzle::{CombinedPuzzle, Layer, LayerBoards, LayerSet, Puzzle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Difficulty tier. Levels are authored per tier; master is gated behind
/// expert progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
    Master,
}

impl Difficulty {
    pub const fn all() -> &'static [Difficulty] {
        &[
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Expert,
            Difficulty::Master,
        ]
    }

    /// Board size of the classic packs: the easiest tier plays 6x6,
    /// everything above it 9x9.
    pub const fn classic_grid_size(self) -> GridSize {
        match self {
            Difficulty::Easy => GridSize::Six,
            _ => GridSize::Nine,
        }
    }

    /// Asset path of the classic (single-layer) pack for this tier.
    pub fn classic_asset_path(self) -> String {
        format!("assets/levels/classic_{self}.json")
    }

    /// Asset path of the combined (multi-layer) pack for this tier. Not
    /// every tier ships one; a missing pack surfaces as a not-found error.
    pub fn combined_asset_path(self) -> String {
        format!("assets/levels/crazy_{self}.json")
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
            Difficulty::Expert => write!(f, "expert"),
            Difficulty::Master => write!(f, "master"),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" => Ok(Difficulty::Expert),
            "master" => Ok(Difficulty::Master),
            _ => Err(format!("unknown difficulty '{s}'")),
        }
    }
}

/// Play mode. Classic is the single-layer game; crazy superimposes shape,
/// color and (on harder tiers) number layers on one grid. The lowercase
/// names are part of the persisted progress-key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Classic,
    Crazy,
}

impl Mode {
    pub const fn all() -> &'static [Mode] {
        &[Mode::Classic, Mode::Crazy]
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Classic => write!(f, "classic"),
            Mode::Crazy => write!(f, "crazy"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classic" => Ok(Mode::Classic),
            "crazy" => Ok(Mode::Crazy),
            _ => Err(format!("unknown mode '{s}'")),
        }
    }
}

// ==================== Asset documents ====================

#[derive(Debug, Deserialize)]
struct ClassicDoc {
    levels: Vec<ClassicLevelDoc>,
}

#[derive(Debug, Deserialize)]
struct ClassicLevelDoc {
    puzzle: String,
    solution: String,
}

#[derive(Debug, Deserialize)]
struct CombinedLevelDoc {
    size: usize,
    layers: Vec<LayerDoc>,
}

#[derive(Debug, Deserialize)]
struct LayerDoc {
    initial: Vec<Vec<u8>>,
    solution: Vec<Vec<u8>>,
}

// ==================== Asset sources ====================

/// Where level documents come from. Injected into [`LevelLibrary`] so tests
/// run against in-memory bytes and the app against files on disk.
pub trait AssetSource: Send + Sync {
    /// Fetch the raw bytes behind a relative asset path.
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Filesystem-backed assets resolved against a root directory.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssets { root: root.into() }
    }
}

impl AssetSource for DirAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        std::fs::read(self.root.join(path)).map_err(|_| AssetError::not_found(path))
    }
}

/// In-memory assets for tests.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl AssetSource for MemoryAssets {
    fn read(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::not_found(path))
    }
}

// ==================== Parsing ====================

/// Decode and validate a classic pack document. Fails loudly on schema or
/// invariant violations; an empty pack is corrupt data, not a valid
/// zero-level pack.
pub fn parse_classic_pack(
    path: &str,
    bytes: &[u8],
    size: GridSize,
) -> Result<Vec<Puzzle>, AssetError> {
    let doc: ClassicDoc =
        serde_json::from_slice(bytes).map_err(|e| AssetError::malformed(path, e))?;
    if doc.levels.is_empty() {
        return Err(AssetError::malformed(path, "pack contains no levels"));
    }

    let mut puzzles = Vec::with_capacity(doc.levels.len());
    for (index, level) in doc.levels.iter().enumerate() {
        let build = || -> Result<Puzzle, crate::error::PuzzleError> {
            let initial = Grid::from_flat_str(size, &level.puzzle)?;
            let solution = Grid::from_flat_str(size, &level.solution)?;
            Puzzle::new(initial, solution)
        };
        let puzzle = build()
            .map_err(|e| AssetError::malformed(path, format!("level {}: {e}", index + 1)))?;
        puzzles.push(puzzle);
    }
    Ok(puzzles)
}

/// Decode and validate a combined pack document: a JSON array of records,
/// each carrying its own size and an ordered layer list (shape, color,
/// optionally number).
pub fn parse_combined_pack(path: &str, bytes: &[u8]) -> Result<Vec<CombinedPuzzle>, AssetError> {
    let docs: Vec<CombinedLevelDoc> =
        serde_json::from_slice(bytes).map_err(|e| AssetError::malformed(path, e))?;
    if docs.is_empty() {
        return Err(AssetError::malformed(path, "pack contains no levels"));
    }

    let mut puzzles = Vec::with_capacity(docs.len());
    for (index, doc) in docs.iter().enumerate() {
        let puzzle = build_combined(doc)
            .map_err(|reason| AssetError::malformed(path, format!("level {}: {reason}", index)))?;
        puzzles.push(puzzle);
    }
    Ok(puzzles)
}

fn build_combined(doc: &CombinedLevelDoc) -> Result<CombinedPuzzle, String> {
    let size = GridSize::new(doc.size).ok_or_else(|| format!("unsupported size {}", doc.size))?;
    let layer_set = LayerSet::from_layer_count(doc.layers.len())
        .ok_or_else(|| format!("unsupported layer count {}", doc.layers.len()))?;

    let mut layers = Vec::with_capacity(doc.layers.len());
    for layer in &doc.layers {
        let initial = Grid::from_rows(size, &layer.initial).map_err(|e| e.to_string())?;
        let solution = Grid::from_rows(size, &layer.solution).map_err(|e| e.to_string())?;
        layers.push(LayerBoards { initial, solution });
    }

    CombinedPuzzle::new(layer_set, layers, Layer::Shape).map_err(|e| e.to_string())
}

// ==================== Level library ====================

/// Loads, validates and memoizes level packs. Parsed packs are cached by
/// resolved asset path for the lifetime of the library; repeated requests
/// never re-read or re-validate the source.
pub struct LevelLibrary {
    source: Box<dyn AssetSource>,
    classic: Mutex<HashMap<String, Arc<Vec<Puzzle>>>>,
    combined: Mutex<HashMap<String, Arc<Vec<CombinedPuzzle>>>>,
}

impl LevelLibrary {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        LevelLibrary {
            source: Box::new(source),
            classic: Mutex::new(HashMap::new()),
            combined: Mutex::new(HashMap::new()),
        }
    }

    /// The full classic pack for a tier, parsed at most once.
    pub fn classic_pack(&self, difficulty: Difficulty) -> Result<Arc<Vec<Puzzle>>, AssetError> {
        let path = difficulty.classic_asset_path();
        if let Some(pack) = self.classic.lock().unwrap().get(&path) {
            debug!(%path, "classic pack served from cache");
            return Ok(Arc::clone(pack));
        }

        let bytes = self.source.read(&path)?;
        let pack = Arc::new(parse_classic_pack(
            &path,
            &bytes,
            difficulty.classic_grid_size(),
        )?);
        debug!(%path, levels = pack.len(), "classic pack parsed");
        self.classic
            .lock()
            .unwrap()
            .entry(path)
            .or_insert(pack.clone());
        Ok(pack)
    }

    /// One classic level by 1-based number. Numbers outside the authored
    /// range are an error; classic play never wraps.
    pub fn classic_level(
        &self,
        difficulty: Difficulty,
        level: usize,
    ) -> Result<Puzzle, AssetError> {
        let pack = self.classic_pack(difficulty)?;
        if level == 0 || level > pack.len() {
            return Err(AssetError::IndexOutOfRange {
                requested: level,
                available: pack.len(),
            });
        }
        Ok(pack[level - 1].clone())
    }

    /// The full combined pack for a tier, parsed at most once.
    pub fn combined_pack(
        &self,
        difficulty: Difficulty,
    ) -> Result<Arc<Vec<CombinedPuzzle>>, AssetError> {
        let path = difficulty.combined_asset_path();
        if let Some(pack) = self.combined.lock().unwrap().get(&path) {
            debug!(%path, "combined pack served from cache");
            return Ok(Arc::clone(pack));
        }

        let bytes = self.source.read(&path)?;
        let pack = Arc::new(parse_combined_pack(&path, &bytes)?);
        debug!(%path, levels = pack.len(), "combined pack parsed");
        self.combined
            .lock()
            .unwrap()
            .entry(path)
            .or_insert(pack.clone());
        Ok(pack)
    }

    /// One combined level by 0-based index. Indices wrap modulo the pack
    /// size: requesting past the authored set replays from the start.
    pub fn combined_level(
        &self,
        difficulty: Difficulty,
        index: usize,
    ) -> Result<CombinedPuzzle, AssetError> {
        let pack = self.combined_pack(difficulty)?;
        Ok(pack[index % pack.len()].clone())
    }

    /// Drop every cached pack. Only meant for teardown and tests.
    pub fn clear_cache(&self) {
        self.classic.lock().unwrap().clear();
        self.combined.lock().unwrap().clear();
    }
}
