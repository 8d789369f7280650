use std::fmt;

/// Id of the root folder.
pub const ROOT_ID: &str = "root";
/// Id of the entry-point file. It can never be renamed or deleted.
pub const ENTRY_POINT_ID: &str = "main";

/// Opaque, stable node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn root() -> Self {
        Self::new(ROOT_ID)
    }

    #[must_use]
    pub fn entry_point() -> Self {
        Self::new(ENTRY_POINT_ID)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_entry_point(&self) -> bool {
        self.0 == ENTRY_POINT_ID
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Hands out node ids that are never reused for the lifetime of the allocator,
/// including after the node they named has been deleted.
#[derive(Debug, Clone, Default)]
pub struct NodeIdAllocator {
    next: u64,
}

impl NodeIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> NodeId {
        self.next += 1;
        NodeId(format!("node-{}", self.next))
    }
}
