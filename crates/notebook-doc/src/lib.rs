//! notebook-doc - In-memory notebook document model and cell store.
//!
//! Holds the editable representation of a notebook: an ordered list of cells
//! plus format version and metadata, with the document-store operations the
//! editor binds to (insert, delete, focus moves) and a pure output-rendering
//! selector. Persistence is the gateway's job; nothing here touches disk or
//! network.

pub mod doc;
pub mod outputs;

pub use doc::{
    Cell, CellType, DocError, KernelspecMetadata, LanguageInfoMetadata, Notebook,
    NotebookMetadata,
};
pub use outputs::{select_rendering, Output, Rendering};
