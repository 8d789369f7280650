//! In-memory project model for the editor shell.
//!
//! The tree is a small, single-rooted hierarchy of files and folders addressed
//! by stable [`NodeId`]s. It is not a filesystem: nothing here touches disk,
//! and there is exactly one logical owner mutating it.
//!
//! [`EditHistory`] keeps linear undo/redo snapshots of the active document.

mod error;
mod history;
mod ids;
mod node;
mod tree;

pub use error::TreeError;
pub use history::{EditHistory, DEFAULT_HISTORY_LIMIT};
pub use ids::{NodeId, NodeIdAllocator, ENTRY_POINT_ID, ROOT_ID};
pub use node::{FileNode, NodeKind};
pub use tree::{
    language_for, FileTree, TreeRow, DEFAULT_FILE_NAME, DEFAULT_FOLDER_NAME, DEFAULT_PROGRAM,
    ENTRY_POINT_NAME, ROOT_NAME,
};
