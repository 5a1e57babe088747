//! Tagged tree values produced by fragment conversion

use indexmap::IndexMap;
use serde::Serialize;

/// One element: qualified tag, attributes in source order, and content
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TreeNode {
    pub tag: String,
    pub attrs: IndexMap<String, String>,
    pub content: Vec<TreeContent>,
}

/// A child of a [`TreeNode`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeContent {
    Node(TreeNode),
    Text(String),
}

impl TreeNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Value of an attribute by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Child elements, skipping text
    pub fn children(&self) -> impl Iterator<Item = &TreeNode> + '_ {
        self.content.iter().filter_map(|c| match c {
            TreeContent::Node(node) => Some(node),
            TreeContent::Text(_) => None,
        })
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                TreeContent::Text(text) => Some(text.as_str()),
                TreeContent::Node(_) => None,
            })
            .collect()
    }

    /// Append character data, merging with a preceding text run
    pub(crate) fn push_text(&mut self, text: &str) {
        match self.content.last_mut() {
            Some(TreeContent::Text(last)) => last.push_str(text),
            _ => self.content.push(TreeContent::Text(text.to_string())),
        }
    }
}
