use crate::ids::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File {
        content: String,
    },
    Folder {
        children: Vec<FileNode>,
        is_open: bool,
    },
}

/// One entry of the project tree.
///
/// Parentage is implied by containment; nodes hold no back-references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
}

impl FileNode {
    #[must_use]
    pub fn file(id: impl Into<NodeId>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File {
                content: content.into(),
            },
        }
    }

    /// New folders start open, like the sidebar expects after creation.
    #[must_use]
    pub fn folder(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder {
                children: Vec::new(),
                is_open: true,
            },
        }
    }

    #[must_use]
    pub fn with_children(mut self, nodes: impl IntoIterator<Item = FileNode>) -> Self {
        if let NodeKind::Folder { children, .. } = &mut self.kind {
            children.extend(nodes);
        }
        self
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { .. })
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Folder { .. } => None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[FileNode] {
        match &self.kind {
            NodeKind::Folder { children, .. } => children,
            NodeKind::File { .. } => &[],
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { is_open: true, .. })
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<FileNode>> {
        match &mut self.kind {
            NodeKind::Folder { children, .. } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    pub(crate) fn contains_id(&self, id: &NodeId) -> bool {
        self.id == *id || self.children().iter().any(|child| child.contains_id(id))
    }
}
