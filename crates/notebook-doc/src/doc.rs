//! Notebook document model and store operations.
//!
//! The JSON shape follows the stored `.ipynb` format the gateway serves:
//! `source` may arrive as a single string or a line array (joined on read),
//! `execution_count` may be `null` (read as 0), and unknown metadata keys are
//! preserved on round-trip via flattened maps.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::outputs::Output;

/// Error type for document store operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocError {
    #[error("cell index {index} out of range (document has {len} cells)")]
    OutOfRange { index: usize, len: usize },
}

/// Cell type tag. Anything the gateway serves that we don't recognize
/// collapses to `Other` rather than failing the whole document load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Code,
    Markdown,
    Raw,
    #[serde(other)]
    Other,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Stable cell id (nbformat 4.5+). Generated for cells created here,
    /// optional for cells loaded from older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default)]
    pub cell_type: CellType,

    /// Caller-assigned execution counter; 0 for never-executed cells.
    /// Stored documents use `null` for unexecuted cells.
    #[serde(default, deserialize_with = "count_or_null")]
    pub execution_count: i64,

    #[serde(default, deserialize_with = "string_or_lines")]
    pub source: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Output>,
}

impl Cell {
    /// A blank code cell: fresh id, counter 0, empty source, no outputs.
    pub fn blank() -> Self {
        Cell {
            id: Some(Uuid::new_v4().to_string()),
            cell_type: CellType::Code,
            execution_count: 0,
            source: String::new(),
            outputs: Vec::new(),
        }
    }
}

/// `kernelspec` entry in notebook metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelspecMetadata {
    pub name: String,
    pub display_name: String,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, Value>,
}

/// `language_info` entry in notebook metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfoMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codemirror_mode: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pygments_lexer: Option<String>,
}

/// Notebook-level metadata. Keys we don't model are kept in `additional`
/// so a load/save cycle never strips extension data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotebookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelspec: Option<KernelspecMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_info: Option<LanguageInfoMetadata>,
    #[serde(flatten)]
    pub additional: serde_json::Map<String, Value>,
}

/// An in-memory notebook document. Cell order is display order; no
/// uniqueness constraint is enforced on cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub nbformat: i32,
    #[serde(default)]
    pub nbformat_minor: i32,
    #[serde(default)]
    pub metadata: NotebookMetadata,
}

impl Default for Notebook {
    fn default() -> Self {
        Notebook {
            cells: Vec::new(),
            nbformat: 4,
            nbformat_minor: 5,
            metadata: NotebookMetadata::default(),
        }
    }
}

impl Notebook {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Borrow the cell at `index`, failing with a bounds error if it
    /// does not exist.
    pub fn cell(&self, index: usize) -> Result<&Cell, DocError> {
        let len = self.cells.len();
        self.cells
            .get(index)
            .ok_or(DocError::OutOfRange { index, len })
    }

    /// Insert a blank cell at `index` (above the cell currently there).
    /// The position is clamped to the document length. Returns the index
    /// the new cell landed at.
    pub fn add_cell_above(&mut self, index: usize) -> usize {
        let at = index.min(self.cells.len());
        self.cells.insert(at, Cell::blank());
        at
    }

    /// Insert a blank cell directly below `index`, clamped to the
    /// document length. Returns the index the new cell landed at.
    pub fn add_cell_below(&mut self, index: usize) -> usize {
        let at = (index + 1).min(self.cells.len());
        self.cells.insert(at, Cell::blank());
        at
    }

    /// Remove exactly the cell at `index`. Out-of-range indices fail with
    /// a bounds error and leave the document unchanged.
    pub fn delete_cell(&mut self, index: usize) -> Result<Cell, DocError> {
        let len = self.cells.len();
        if index >= len {
            return Err(DocError::OutOfRange { index, len });
        }
        Ok(self.cells.remove(index))
    }

    /// Index of the cell after `index`, or `None` at the last cell.
    /// No wraparound.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        let next = index.checked_add(1)?;
        (next < self.cells.len()).then_some(next)
    }

    /// Index of the cell before `index`, or `None` at the first cell or
    /// out of range.
    pub fn previous_index(&self, index: usize) -> Option<usize> {
        (index > 0 && index < self.cells.len()).then(|| index - 1)
    }

    /// Assign the execution counter for a cell after a successful run.
    /// Counters are caller-assigned; the store never increments on its own.
    pub fn set_execution_count(&mut self, index: usize, count: i64) -> Result<(), DocError> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(DocError::OutOfRange { index, len })?;
        cell.execution_count = count;
        Ok(())
    }
}

/// Stored notebooks write cell source either as one string or as a list of
/// lines (with embedded newlines). Join the latter on read.
fn string_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        One(String),
        Lines(Vec<String>),
    }
    Ok(match Repr::deserialize(deserializer)? {
        Repr::One(s) => s,
        Repr::Lines(lines) => lines.concat(),
    })
}

/// `execution_count: null` in stored documents maps to 0.
fn count_or_null<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(0))
}
