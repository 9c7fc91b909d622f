//! notebook-editor - Embeddable notebook editor core.
//!
//! Composes the document store, the gateway REST client, and the kernel
//! channel behind one explicit context object, [`NotebookEditor`]. A UI
//! layer binds its actions (menu/button clicks) to the editor's methods;
//! every failure surfaces as an [`EditorError`], scoped to the action that
//! triggered it. Not a standalone executable - there is no CLI here.

pub mod editor;

pub use editor::{EditorError, NotebookEditor};
