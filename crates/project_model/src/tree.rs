use crate::error::TreeError;
use crate::ids::NodeId;
use crate::node::{FileNode, NodeKind};

pub const ROOT_NAME: &str = "Project";
pub const ENTRY_POINT_NAME: &str = "main.py";
pub const DEFAULT_FILE_NAME: &str = "untitled.py";
pub const DEFAULT_FOLDER_NAME: &str = "New Folder";

pub const DEFAULT_PROGRAM: &str = "# Simple Calculator Program
# This program adds two numbers entered by the user

def sum(a, b):
    return (a + b)

# Get input from user
a = int(input('Enter 1st number: '))
b = int(input('Enter 2nd number: '))

# Calculate and display the result
print(f'Sum of {a} and {b} is {sum(a, b)}')
";

/// One row of a depth-first sidebar listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub name: String,
    pub depth: usize,
    pub is_folder: bool,
    pub is_open: bool,
}

/// Single-rooted project tree.
///
/// Every mutation walks the whole tree; projects are editor-sized. A failed
/// mutation leaves the tree untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTree {
    root: FileNode,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    /// `Project/` holding the protected `main.py` entry point.
    pub fn new() -> Self {
        Self::with_root(FileNode::folder(NodeId::root(), ROOT_NAME).with_children([
            FileNode::file(NodeId::entry_point(), ENTRY_POINT_NAME, DEFAULT_PROGRAM),
        ]))
    }

    pub fn with_root(root: FileNode) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &FileNode {
        &self.root
    }

    pub fn find(&self, id: &NodeId) -> Option<&FileNode> {
        find_node(&self.root, id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.find(id).is_some()
    }

    /// Names from the root down to `id`, inclusive.
    pub fn find_path(&self, id: &NodeId) -> Option<Vec<String>> {
        let mut path = Vec::new();
        if collect_path(&self.root, id, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    pub fn toggle_folder(&mut self, id: &NodeId) -> Result<(), TreeError> {
        let node = self.find_mut(id)?;
        match &mut node.kind {
            NodeKind::Folder { is_open, .. } => {
                *is_open = !*is_open;
                Ok(())
            }
            NodeKind::File { .. } => Err(TreeError::NotAFolder { id: id.clone() }),
        }
    }

    pub fn add_child(&mut self, parent_id: &NodeId, node: FileNode) -> Result<(), TreeError> {
        if let Some(duplicate) = first_shared_id(&self.root, &node) {
            return Err(TreeError::DuplicateId { id: duplicate });
        }

        let parent = self.find_mut(parent_id)?;
        let Some(children) = parent.children_mut() else {
            return Err(TreeError::NotAFolder {
                id: parent_id.clone(),
            });
        };
        children.push(node);
        Ok(())
    }

    pub fn rename(&mut self, id: &NodeId, new_name: impl Into<String>) -> Result<(), TreeError> {
        if id.is_entry_point() {
            return Err(TreeError::ProtectedNode { id: id.clone() });
        }

        self.find_mut(id)?.name = new_name.into();
        Ok(())
    }

    /// Removes `id` together with its whole subtree.
    pub fn remove(&mut self, id: &NodeId) -> Result<(), TreeError> {
        if id.is_entry_point() || id.is_root() {
            return Err(TreeError::ProtectedNode { id: id.clone() });
        }

        if remove_from(&mut self.root, id) {
            Ok(())
        } else {
            Err(TreeError::NodeNotFound { id: id.clone() })
        }
    }

    pub fn update_content(
        &mut self,
        id: &NodeId,
        new_content: impl Into<String>,
    ) -> Result<(), TreeError> {
        let node = self.find_mut(id)?;
        match &mut node.kind {
            NodeKind::File { content } => {
                *content = new_content.into();
                Ok(())
            }
            NodeKind::Folder { .. } => Err(TreeError::NotAFile { id: id.clone() }),
        }
    }

    /// Rows in display order, descending only into open folders.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        push_rows(&self.root, 0, &mut rows);
        rows
    }

    fn find_mut(&mut self, id: &NodeId) -> Result<&mut FileNode, TreeError> {
        find_node_mut(&mut self.root, id).ok_or_else(|| TreeError::NodeNotFound { id: id.clone() })
    }
}

/// Editor language tag for a file name.
pub fn language_for(name: &str) -> &'static str {
    let extension = name
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "py" | "pyw" => "python",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "rs" => "rust",
        "json" => "json",
        "md" => "markdown",
        "toml" => "toml",
        "sh" => "shell",
        _ => "plaintext",
    }
}

fn find_node<'a>(node: &'a FileNode, id: &NodeId) -> Option<&'a FileNode> {
    if node.id == *id {
        return Some(node);
    }
    node.children().iter().find_map(|child| find_node(child, id))
}

fn find_node_mut<'a>(node: &'a mut FileNode, id: &NodeId) -> Option<&'a mut FileNode> {
    if node.id == *id {
        return Some(node);
    }
    node.children_mut()?
        .iter_mut()
        .find_map(|child| find_node_mut(child, id))
}

fn collect_path(node: &FileNode, id: &NodeId, path: &mut Vec<String>) -> bool {
    path.push(node.name.clone());
    if node.id == *id {
        return true;
    }
    for child in node.children() {
        if collect_path(child, id, path) {
            return true;
        }
    }
    path.pop();
    false
}

fn remove_from(node: &mut FileNode, id: &NodeId) -> bool {
    let Some(children) = node.children_mut() else {
        return false;
    };

    let before = children.len();
    children.retain(|child| child.id != *id);
    if children.len() != before {
        return true;
    }

    children.iter_mut().any(|child| remove_from(child, id))
}

fn first_shared_id(tree: &FileNode, incoming: &FileNode) -> Option<NodeId> {
    if tree.contains_id(&incoming.id) {
        return Some(incoming.id.clone());
    }
    incoming
        .children()
        .iter()
        .find_map(|child| first_shared_id(tree, child))
}

fn push_rows(node: &FileNode, depth: usize, rows: &mut Vec<TreeRow>) {
    rows.push(TreeRow {
        id: node.id.clone(),
        name: node.name.clone(),
        depth,
        is_folder: node.is_folder(),
        is_open: node.is_open(),
    });
    if node.is_open() {
        for child in node.children() {
            push_rows(child, depth + 1, rows);
        }
    }
}
