/// Template generation for bootstrapping new languages
use crate::tree::Tree;

/// Produce a structural copy of `tree` with every leaf blanked. Used
/// when bootstrapping a new language and when sync has to rebuild a
/// subtree whose target value does not match the baseline's shape.
pub fn empty_mirror(tree: &Tree) -> Tree {
    match tree {
        Tree::Leaf(_) => Tree::Leaf(String::new()),
        Tree::Node(map) => Tree::Node(
            map.iter()
                .map(|(key, value)| (key.clone(), empty_mirror(value)))
                .collect(),
        ),
    }
}
