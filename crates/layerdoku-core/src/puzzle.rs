use crate::error::PuzzleError;
use crate::grid::{Grid, GridSize};
use serde::{Deserialize, Serialize};

/// One of the parallel symbol dimensions superimposed on a combined board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Shape,
    Color,
    Number,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Shape => write!(f, "shape"),
            Layer::Color => write!(f, "color"),
            Layer::Number => write!(f, "number"),
        }
    }
}

/// Which layers a combined puzzle carries. The number layer only appears on
/// the harder tiers, so it is a variant of the set rather than a nullable
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerSet {
    ShapeColor,
    ShapeColorNumber,
}

impl LayerSet {
    /// Layers in asset order: shape first, color second, number last.
    pub const fn layers(self) -> &'static [Layer] {
        match self {
            LayerSet::ShapeColor => &[Layer::Shape, Layer::Color],
            LayerSet::ShapeColorNumber => &[Layer::Shape, Layer::Color, Layer::Number],
        }
    }

    pub const fn len(self) -> usize {
        self.layers().len()
    }

    pub const fn is_empty(self) -> bool {
        false
    }

    pub fn contains(self, layer: Layer) -> bool {
        self.layers().contains(&layer)
    }

    /// Position of a layer within asset order, if present.
    pub fn index_of(self, layer: Layer) -> Option<usize> {
        self.layers().iter().position(|&l| l == layer)
    }

    /// Map an asset layer count onto a set.
    pub fn from_layer_count(count: usize) -> Option<LayerSet> {
        match count {
            2 => Some(LayerSet::ShapeColor),
            3 => Some(LayerSet::ShapeColorNumber),
            _ => None,
        }
    }
}

/// A single-layer puzzle: the clue board and the authored solution it must
/// resolve to. Both boards are immutable after construction; play happens
/// on a separate working grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    size: GridSize,
    initial: Grid,
    solution: Grid,
}

impl Puzzle {
    /// Validate and build a puzzle. The solution must be fully filled and
    /// repeat no symbol within a row, column or box; every clue on the
    /// initial board must equal the solution at its coordinate.
    pub fn new(initial: Grid, solution: Grid) -> Result<Puzzle, PuzzleError> {
        if initial.size() != solution.size() {
            return Err(PuzzleError::SizeMismatch);
        }
        validate_boards(&initial, &solution)?;
        Ok(Puzzle {
            size: initial.size(),
            initial,
            solution,
        })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn initial(&self) -> &Grid {
        &self.initial
    }

    pub fn solution(&self) -> &Grid {
        &self.solution
    }

    /// True when the coordinate holds a clue and may not be edited.
    pub fn is_fixed(&self, row: usize, col: usize) -> bool {
        !self.initial.is_empty_at(row, col)
    }

    pub fn clue_count(&self) -> usize {
        self.initial.filled_count()
    }

    /// Whether a working board completes this puzzle. The board must equal
    /// the authored solution exactly; an alternative completion that merely
    /// satisfies the placement rules does not count.
    pub fn is_solved_by(&self, working: &Grid) -> bool {
        *working == self.solution
    }
}

/// Clue and solution boards for one layer of a combined puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerBoards {
    pub initial: Grid,
    pub solution: Grid,
}

/// The per-layer symbols at one coordinate of a combined puzzle, plus
/// whether the position is a clue. Clue status belongs to the position:
/// either every layer is filled there or none is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedCell {
    /// Clue symbols in asset layer order; all zero for an open cell.
    pub symbols: Vec<u8>,
    pub is_fixed: bool,
}

/// A multi-layer puzzle: one clue/solution board pair per layer, all
/// sharing clue positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedPuzzle {
    size: GridSize,
    layer_set: LayerSet,
    layers: Vec<LayerBoards>,
    default_layer: Layer,
}

impl CombinedPuzzle {
    /// Validate and build a combined puzzle. On top of the per-layer checks
    /// of [`Puzzle::new`], every coordinate must be a clue in all layers or
    /// in none, and the default input-focus layer must belong to the set.
    pub fn new(
        layer_set: LayerSet,
        layers: Vec<LayerBoards>,
        default_layer: Layer,
    ) -> Result<CombinedPuzzle, PuzzleError> {
        if layers.len() != layer_set.len() {
            return Err(PuzzleError::LayerCountMismatch {
                expected: layer_set.len(),
                actual: layers.len(),
            });
        }
        if !layer_set.contains(default_layer) {
            return Err(PuzzleError::LayerNotPresent(default_layer));
        }

        let size = layers[0].initial.size();
        for boards in &layers {
            if boards.initial.size() != size || boards.solution.size() != size {
                return Err(PuzzleError::SizeMismatch);
            }
            validate_boards(&boards.initial, &boards.solution)?;
        }

        // Clue status must agree across layers at every coordinate.
        let first = &layers[0].initial;
        for row in 0..size.side() {
            for col in 0..size.side() {
                let fixed = !first.is_empty_at(row, col);
                for boards in &layers[1..] {
                    if !boards.initial.is_empty_at(row, col) != fixed {
                        return Err(PuzzleError::MixedClueStatus { row, col });
                    }
                }
            }
        }

        Ok(CombinedPuzzle {
            size,
            layer_set,
            layers,
            default_layer,
        })
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn layer_set(&self) -> LayerSet {
        self.layer_set
    }

    /// The layer that receives input focus when the puzzle opens.
    pub fn default_layer(&self) -> Layer {
        self.default_layer
    }

    /// All layer boards in asset order.
    pub fn layers(&self) -> &[LayerBoards] {
        &self.layers
    }

    /// The boards for one layer, if it is part of this puzzle.
    pub fn boards(&self, layer: Layer) -> Option<&LayerBoards> {
        self.layer_set.index_of(layer).map(|i| &self.layers[i])
    }

    /// Clue status of a position. Identical across layers, so the first
    /// layer answers for all of them.
    pub fn is_fixed(&self, row: usize, col: usize) -> bool {
        !self.layers[0].initial.is_empty_at(row, col)
    }

    pub fn clue_count(&self) -> usize {
        self.layers[0].initial.filled_count()
    }

    /// The per-layer view of one coordinate.
    pub fn cell(&self, row: usize, col: usize) -> CombinedCell {
        CombinedCell {
            symbols: self
                .layers
                .iter()
                .map(|boards| boards.initial.value(row, col))
                .collect(),
            is_fixed: self.is_fixed(row, col),
        }
    }

    /// Whether a set of working boards (one per layer, asset order)
    /// completes this puzzle: every layer must equal its authored solution.
    pub fn is_solved_by(&self, working: &[Grid]) -> bool {
        working.len() == self.layers.len()
            && self
                .layers
                .iter()
                .zip(working)
                .all(|(boards, grid)| *grid == boards.solution)
    }

    /// Whether a set of working boards satisfies the placement rules on
    /// every layer, regardless of the authored solution. Informational
    /// only; completion is defined by [`CombinedPuzzle::is_solved_by`].
    pub fn satisfies_rules(&self, working: &[Grid]) -> bool {
        working.len() == self.layers.len() && working.iter().all(Grid::satisfies_rules)
    }
}

fn validate_boards(initial: &Grid, solution: &Grid) -> Result<(), PuzzleError> {
    let n = solution.side();
    for row in 0..n {
        for col in 0..n {
            if solution.is_empty_at(row, col) {
                return Err(PuzzleError::IncompleteSolution { row, col });
            }
        }
    }
    if let Some((row, col)) = solution.first_conflict() {
        return Err(PuzzleError::DuplicateInSolution { row, col });
    }
    for row in 0..n {
        for col in 0..n {
            let clue = initial.value(row, col);
            if clue != 0 && clue != solution.value(row, col) {
                return Err(PuzzleError::ClueMismatch { row, col });
            }
        }
    }
    Ok(())
}
