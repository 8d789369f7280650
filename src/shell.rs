//! The editor shell: project tree, active document, and execution wired together.

use std::io;

use executor_protocol::{InboundEvent, ProtocolMode};
use project_model::{
    language_for, EditHistory, FileNode, FileTree, NodeId, NodeIdAllocator, TreeError,
    DEFAULT_FILE_NAME, DEFAULT_FOLDER_NAME, DEFAULT_HISTORY_LIMIT, DEFAULT_PROGRAM,
    ENTRY_POINT_NAME, ROOT_NAME,
};
use session_transport::ConnectionState;
use tracing::{debug, info, warn};

use crate::controller::{ExecutionController, MessageSink, ProgramState, RunError};
use crate::surface::{error_line, success_line, EditorView, FileSaver, TerminalSurface};

pub const SAVED_MESSAGE: &str = "File saved and downloaded successfully!";
pub const CREATED_AND_SAVED_MESSAGE: &str = "New file created, saved, and downloaded!";

/// Outcome of [`EditorShell::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { id: NodeId },
    Created { id: NodeId },
}

pub struct EditorShell {
    tree: FileTree,
    ids: NodeIdAllocator,
    history: EditHistory,
    active: Option<NodeId>,
    buffer: String,
    path: Vec<String>,
    controller: ExecutionController,
}

impl Default for EditorShell {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, ProtocolMode::default())
    }
}

impl EditorShell {
    /// Starts on `main.py` of a fresh project.
    pub fn new(history_limit: usize, mode: ProtocolMode) -> Self {
        Self::with_tree(FileTree::new(), history_limit, mode)
    }

    pub fn with_tree(tree: FileTree, history_limit: usize, mode: ProtocolMode) -> Self {
        let entry = NodeId::entry_point();
        let (active, buffer, path) = match tree.find(&entry).and_then(FileNode::content) {
            Some(content) => (
                Some(entry.clone()),
                content.to_string(),
                tree.find_path(&entry).unwrap_or_default(),
            ),
            None => (None, DEFAULT_PROGRAM.to_string(), vec![ROOT_NAME.to_string()]),
        };

        Self {
            tree,
            ids: NodeIdAllocator::new(),
            history: EditHistory::with_limit(history_limit),
            active,
            buffer,
            path,
            controller: ExecutionController::new(mode),
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn controller(&self) -> &ExecutionController {
        &self.controller
    }

    pub fn program_state(&self) -> ProgramState {
        self.controller.state()
    }

    pub fn active_file(&self) -> Option<&NodeId> {
        self.active.as_ref()
    }

    pub fn content(&self) -> &str {
        &self.buffer
    }

    pub fn current_path(&self) -> &[String] {
        &self.path
    }

    pub fn editor_view(&self) -> EditorView {
        let name = self
            .active
            .as_ref()
            .and_then(|id| self.tree.find(id))
            .map_or(ENTRY_POINT_NAME, |node| node.name.as_str());
        EditorView {
            content: self.buffer.clone(),
            language: language_for(name),
            path: self.path.clone(),
        }
    }

    /// Sidebar click: folders toggle, files become the active document.
    pub fn open(&mut self, id: &NodeId) {
        let Some(node) = self.tree.find(id) else {
            debug!(%id, "open ignored for unknown node");
            return;
        };

        if node.is_folder() {
            if let Err(error) = self.tree.toggle_folder(id) {
                debug!(%id, error = %error, "toggle ignored");
            }
            return;
        }

        let content = node.content().unwrap_or_default().to_string();
        self.buffer = content;
        self.active = Some(id.clone());
        self.history.clear();
        self.refresh_path();
    }

    /// Replaces the buffer, keeping the previous text for undo.
    pub fn edit(&mut self, content: impl Into<String>) {
        let content = content.into();
        if content == self.buffer {
            return;
        }
        let previous = std::mem::replace(&mut self.buffer, content);
        self.history.record_edit(previous);
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.buffer) {
            Some(previous) => {
                self.buffer = previous;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.buffer) {
            Some(next) => {
                self.buffer = next;
                true
            }
            None => false,
        }
    }

    /// Appends an `untitled.py` holding the default program. `None` when the
    /// parent is missing or is a file.
    pub fn new_file(&mut self, parent: &NodeId) -> Option<NodeId> {
        let id = self.allocate_id();
        let node = FileNode::file(id.clone(), DEFAULT_FILE_NAME, DEFAULT_PROGRAM);
        self.insert(parent, node).then_some(id)
    }

    pub fn new_folder(&mut self, parent: &NodeId) -> Option<NodeId> {
        let id = self.allocate_id();
        let node = FileNode::folder(id.clone(), DEFAULT_FOLDER_NAME);
        self.insert(parent, node).then_some(id)
    }

    /// Renames `id` to the trimmed `name`. Blank names are ignored.
    pub fn rename(&mut self, id: &NodeId, name: &str, terminal: &mut dyn TerminalSurface) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        match self.tree.rename(id, name) {
            Ok(()) => {
                self.refresh_path();
                true
            }
            Err(error) => {
                self.report_tree_error(error, "rename", terminal);
                false
            }
        }
    }

    /// Deletes `id` and its subtree. Losing the active file resets the editor.
    pub fn delete(&mut self, id: &NodeId, terminal: &mut dyn TerminalSurface) -> bool {
        if let Err(error) = self.tree.remove(id) {
            self.report_tree_error(error, "delete", terminal);
            return false;
        }

        let lost_active = self
            .active
            .as_ref()
            .is_some_and(|active| !self.tree.contains(active));
        if lost_active {
            info!(%id, "active file deleted");
            self.active = None;
            self.buffer = DEFAULT_PROGRAM.to_string();
            self.path = vec![ROOT_NAME.to_string()];
            self.history.clear();
        }
        true
    }

    /// Writes the buffer into the tree and hands it to `saver`.
    ///
    /// Without an active file, a new `untitled.py` is created under the root
    /// and becomes active.
    pub fn save(
        &mut self,
        saver: &mut dyn FileSaver,
        terminal: &mut dyn TerminalSurface,
    ) -> io::Result<SaveOutcome> {
        let active = self
            .active
            .clone()
            .filter(|id| self.tree.find(id).is_some_and(FileNode::is_file));

        let (outcome, name, message) = match active {
            Some(id) => {
                if let Err(error) = self.tree.update_content(&id, self.buffer.clone()) {
                    warn!(%id, error = %error, "failed to store buffer");
                }
                let name = self
                    .tree
                    .find(&id)
                    .map_or_else(|| DEFAULT_FILE_NAME.to_string(), |node| node.name.clone());
                (SaveOutcome::Saved { id }, name, SAVED_MESSAGE)
            }
            None => {
                let id = self.allocate_id();
                let node = FileNode::file(id.clone(), DEFAULT_FILE_NAME, self.buffer.clone());
                if let Err(error) = self.tree.add_child(&NodeId::root(), node) {
                    warn!(%id, error = %error, "failed to create file for save");
                    terminal.write(&error_line(&format!("Error: {error}")));
                    return Err(io::Error::other(error));
                }
                self.active = Some(id.clone());
                self.refresh_path();
                (
                    SaveOutcome::Created { id },
                    DEFAULT_FILE_NAME.to_string(),
                    CREATED_AND_SAVED_MESSAGE,
                )
            }
        };

        if let Err(error) = saver.save(&name, &self.buffer) {
            warn!(file = %name, error = %error, "file saver failed");
            terminal.write(&error_line(&format!("Error: {error}")));
            return Err(error);
        }

        info!(file = %name, "saved file");
        terminal.write(&success_line(message));
        Ok(outcome)
    }

    pub fn run(
        &mut self,
        sink: &mut dyn MessageSink,
        terminal: &mut dyn TerminalSurface,
    ) -> Result<(), RunError> {
        self.controller.run(&self.buffer, sink, terminal)
    }

    pub fn send_input(&mut self, text: &str, sink: &mut dyn MessageSink) {
        self.controller.send_input(text, sink);
    }

    pub fn on_inbound(&mut self, text: &str, terminal: &mut dyn TerminalSurface) -> InboundEvent {
        self.controller.on_inbound(text, terminal)
    }

    pub fn on_connection_state(&mut self, state: ConnectionState) {
        self.controller.on_connection_state(state);
    }

    fn insert(&mut self, parent: &NodeId, node: FileNode) -> bool {
        let id = node.id.clone();
        match self.tree.add_child(parent, node) {
            Ok(()) => {
                debug!(%id, %parent, "node created");
                true
            }
            Err(error) => {
                debug!(%id, %parent, error = %error, "node creation ignored");
                false
            }
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        loop {
            let id = self.ids.allocate();
            if !self.tree.contains(&id) {
                return id;
            }
        }
    }

    fn refresh_path(&mut self) {
        if let Some(path) = self.active.as_ref().and_then(|id| self.tree.find_path(id)) {
            self.path = path;
        }
    }

    fn report_tree_error(
        &self,
        error: TreeError,
        action: &'static str,
        terminal: &mut dyn TerminalSurface,
    ) {
        let TreeError::ProtectedNode { id } = &error else {
            debug!(action, error = %error, "tree change ignored");
            return;
        };

        warn!(action, %id, "rejected change to protected node");
        let name = self
            .tree
            .find(id)
            .map_or(ENTRY_POINT_NAME, |node| node.name.as_str());
        terminal.write(&error_line(&format!(
            "Cannot {action} {name} - it is a required file"
        )));
    }
}

impl std::fmt::Debug for EditorShell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorShell")
            .field("active", &self.active)
            .field("path", &self.path)
            .field("state", &self.controller.state())
            .finish_non_exhaustive()
    }
}
