use crate::puzzle::Layer;
use thiserror::Error;

/// Validation failures raised while building a puzzle out of board data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// A flat board string had the wrong number of characters.
    #[error("board string has {actual} cells, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    /// A flat board string contained something other than a digit in range.
    #[error("'{found}' is not a digit in 0..={max}")]
    BadSymbol { found: char, max: u8 },

    /// A row matrix had the wrong number of rows.
    #[error("board has {actual} rows, expected {expected}")]
    WrongRowCount { expected: usize, actual: usize },

    /// A row matrix was jagged.
    #[error("row {row} has {actual} cells, expected {expected}")]
    JaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A cell value was outside the symbol domain for the grid size.
    #[error("value {value} at row {row}, column {col} is outside 0..={max}")]
    ValueOutOfRange {
        row: usize,
        col: usize,
        value: u8,
        max: u8,
    },

    /// Boards belonging to one puzzle had different sizes.
    #[error("boards within one puzzle have different sizes")]
    SizeMismatch,

    /// A solution board had an unfilled cell.
    #[error("solution has an empty cell at row {row}, column {col}")]
    IncompleteSolution { row: usize, col: usize },

    /// A solution board repeated a symbol within a row, column or box.
    #[error("solution repeats a symbol at row {row}, column {col}")]
    DuplicateInSolution { row: usize, col: usize },

    /// A clue disagreed with the solution at the same coordinate.
    #[error("clue at row {row}, column {col} contradicts the solution")]
    ClueMismatch { row: usize, col: usize },

    /// Layers disagreed on whether a coordinate is a clue.
    #[error("layers disagree on clue status at row {row}, column {col}")]
    MixedClueStatus { row: usize, col: usize },

    /// A combined puzzle was given the wrong number of layer boards.
    #[error("got {actual} layer boards, expected {expected}")]
    LayerCountMismatch { expected: usize, actual: usize },

    /// The requested input-focus layer is not part of the puzzle.
    #[error("layer {0} is not part of this puzzle")]
    LayerNotPresent(Layer),
}

/// Failures while resolving, decoding or indexing level assets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The asset path did not resolve to readable bytes.
    #[error("level asset not found: {path}")]
    NotFound { path: String },

    /// The asset resolved but its content violates the document schema
    /// or a puzzle invariant.
    #[error("malformed level asset {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// A classic level number outside the authored range was requested.
    #[error("level {requested} is outside 1..={available}")]
    IndexOutOfRange { requested: usize, available: usize },
}

impl AssetError {
    pub fn not_found(path: impl Into<String>) -> Self {
        AssetError::NotFound { path: path.into() }
    }

    pub fn malformed(path: impl Into<String>, reason: impl ToString) -> Self {
        AssetError::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the underlying key-value progress store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("progress store failure: {0}")]
pub struct StoreError(pub String);
