use thiserror::Error;

use crate::ids::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node '{id}' is protected and cannot be renamed or deleted")]
    ProtectedNode { id: NodeId },

    #[error("no node with id '{id}' exists in the project tree")]
    NodeNotFound { id: NodeId },

    #[error("node '{id}' is not a folder")]
    NotAFolder { id: NodeId },

    #[error("node '{id}' is not a file")]
    NotAFile { id: NodeId },

    #[error("id '{id}' is already used in the project tree")]
    DuplicateId { id: NodeId },
}

impl TreeError {
    /// Errors a caller is expected to surface to the user.
    ///
    /// Missing ids and non-folder targets are lenient no-ops.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::ProtectedNode { .. })
    }
}
