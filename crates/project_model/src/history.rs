use std::collections::VecDeque;

/// Snapshots kept per stack before the oldest one is dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Linear undo/redo over full document snapshots.
///
/// Recording a new edit discards the redo stack; there is no branching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory {
    undo_stack: VecDeque<String>,
    redo_stack: VecDeque<String>,
    limit: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A limit of zero is raised to one so undo keeps working.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Must be called with the content as it was *before* the edit is applied.
    pub fn record_edit(&mut self, previous_content: impl Into<String>) {
        push_bounded(&mut self.undo_stack, previous_content.into(), self.limit);
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, current_content: &str) -> Option<String> {
        let restored = self.undo_stack.pop_back()?;
        push_bounded(&mut self.redo_stack, current_content.to_owned(), self.limit);
        Some(restored)
    }

    pub fn redo(&mut self, current_content: &str) -> Option<String> {
        let restored = self.redo_stack.pop_back()?;
        push_bounded(&mut self.undo_stack, current_content.to_owned(), self.limit);
        Some(restored)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<String>, snapshot: String, limit: usize) {
    if stack.len() == limit {
        stack.pop_front();
    }
    stack.push_back(snapshot);
}
