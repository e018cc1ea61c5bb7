//! Generic attributed-tree boundary for descriptor ingestion.
//!
//! Serialized object descriptors arrive as a tree of named nodes with an
//! optional text value and ordered children. Producing that tree from XML
//! or any other wire format is the host's job; this crate only walks it
//! through three operations: first child by name, text value, and ordered
//! children.

/// One node of the descriptor tree.
#[derive(Clone, Debug, Default)]
pub struct Node {
    name: String,
    value: Option<String>,
    children: Vec<Node>,
}

impl Node {
    /// Create a node with no value and no children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf node carrying a text value.
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            children: Vec::new(),
        }
    }

    /// Append a child, builder style.
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The node's text value.
    ///
    /// An empty value and an absent value are indistinguishable on the
    /// wire, so both come back as `None`.
    pub fn text(&self) -> Option<&str> {
        match self.value.as_deref() {
            Some("") | None => None,
            Some(v) => Some(v),
        }
    }

    /// First child with the given name, in document order.
    pub fn first_child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children in document order.
    pub fn children(&self) -> &[Node] {
        &self.children
    }
}
