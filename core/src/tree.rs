/// Localization tree model
/// A document is either a leaf string or an ordered map of nested trees
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A localization document. Leaves hold translatable text; an empty
/// string marks an untranslated entry. Key order is preserved so that
/// written files diff cleanly against their source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tree {
    Leaf(String),
    Node(IndexMap<String, Tree>),
}

impl Tree {
    /// Build a tree from raw JSON. Objects recurse; strings become
    /// leaves. Null maps to an empty leaf, other scalars and arrays are
    /// kept verbatim as their JSON text (arrays are not recursed).
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Tree::Node(
                map.into_iter()
                    .map(|(key, val)| (key, Tree::from_value(val)))
                    .collect(),
            ),
            Value::String(text) => Tree::Leaf(text),
            Value::Null => Tree::Leaf(String::new()),
            other => Tree::Leaf(other.to_string()),
        }
    }

    /// Parse a tree from JSON text.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(content)?;
        Ok(Self::from_value(value))
    }

    /// Render with two-space indentation, the layout the editor and
    /// bootstrap scripts have always produced.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Node(map) => map.values().map(Tree::leaf_count).sum(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    /// Empty node, the starting point for a language file that does not
    /// exist yet.
    pub fn empty() -> Self {
        Tree::Node(IndexMap::new())
    }

    /// Look up a nested value by dot-separated path.
    pub fn get_path(&self, path: &str) -> Option<&Tree> {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                Tree::Node(map) => current = map.get(segment)?,
                Tree::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    /// Set a leaf value at a dot-separated path, creating intermediate
    /// nodes as needed. Returns false when the path runs through an
    /// existing leaf.
    pub fn set_leaf(&mut self, path: &str, value: String) -> bool {
        let mut current = self;
        let segments: Vec<&str> = path.split('.').collect();
        for (index, segment) in segments.iter().enumerate() {
            let last = index == segments.len() - 1;
            match current {
                Tree::Node(map) => {
                    if last {
                        map.insert((*segment).to_string(), Tree::Leaf(value));
                        return true;
                    }
                    current = map
                        .entry((*segment).to_string())
                        .or_insert_with(Tree::empty);
                }
                Tree::Leaf(_) => return false,
            }
        }
        false
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Tree::from_value(value))
    }
}
