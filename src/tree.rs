//! Request-parameter trees.
//!
//! A [`ParameterTree`] owns a forest of named parameters: scalar leaves and
//! composite groups of arbitrary nesting depth. Nodes live in a
//! generational arena and reference their children by [`Index`], so the
//! structure is a strict forest with no back-references.
//!
//! Two serializations are supported:
//! - [`ParameterTree::to_h`]: a plain nested mapping,
//! - [`ParameterTree::to_vra`]: the catalog API wire shape, which wraps
//!   every composite level (including the tree root) in a `"data"` envelope.

use generational_arena::{Arena, Index};
use itertools::Itertools;
use serde_json::{Map, Value};
use tracing::instrument;

use crate::errors::ParameterResult;
use crate::spec::{self, ParamSpec};
use crate::value::ParameterValue;

/// A single named parameter: a scalar leaf, or a group holding children.
#[derive(Debug, Clone)]
pub struct ParameterNode {
    /// Parameter key, immutable after creation
    pub key: String,
    /// Scalar payload; `None` for group holders
    pub value: Option<ParameterValue>,
    /// Indices of child nodes in the arena, in append order
    pub children: Vec<Index>,
}

impl ParameterNode {
    /// Scalar leaf carrying a coerced value.
    pub fn leaf(key: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// Valueless holder for a parameter group.
    pub fn holder(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            children: Vec::new(),
        }
    }

    /// A node is a leaf iff it has no children. Holders that never receive
    /// children serialize as leaves with an empty scalar.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn scalar(&self) -> Value {
        match &self.value {
            Some(v) => v.to_json(),
            None => Value::from(""),
        }
    }
}

/// Arena-backed container for the root parameter entries.
///
/// Root keys are unique; inserting an existing key silently replaces the
/// prior entry (keeping its position) and drops the replaced subtree.
/// Nested nodes are only ever removed together with their root ancestor.
#[derive(Debug, Default)]
pub struct ParameterTree {
    /// Arena storage for all nodes
    arena: Arena<ParameterNode>,
    /// Root entries, in insertion order
    roots: Vec<Index>,
}

impl ParameterTree {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Build a tree from a JSON parameter document (a top-level mapping of
    /// leaf and group specs).
    pub fn from_json_str(doc: &str) -> ParameterResult<Self> {
        Self::from_entries(spec::parse_json_document(doc)?)
    }

    /// Build a tree from a TOML parameter document.
    pub fn from_toml_str(doc: &str) -> ParameterResult<Self> {
        Self::from_entries(spec::parse_toml_document(doc)?)
    }

    fn from_entries(entries: Vec<(String, ParamSpec)>) -> ParameterResult<Self> {
        let mut tree = Self::new();
        for (key, param_spec) in &entries {
            tree.build_from_spec(key, param_spec, None);
        }
        Ok(tree)
    }

    /// Recursively build nodes for one spec entry.
    ///
    /// A leaf spec becomes a leaf node; a group spec becomes a holder whose
    /// children are built from the group's entries in document order. With
    /// no `parent` the node lands as a root entry (overwriting an existing
    /// entry with the same key), otherwise it is appended to `parent`.
    /// Recursion depth equals input nesting depth.
    #[instrument(level = "debug", skip(self, param_spec))]
    pub fn build_from_spec(
        &mut self,
        key: &str,
        param_spec: &ParamSpec,
        parent: Option<Index>,
    ) -> Index {
        match param_spec {
            ParamSpec::Leaf(value) => {
                self.insert_node(ParameterNode::leaf(key, value.clone()), parent)
            }
            ParamSpec::Group(children) => {
                let group_idx = self.insert_node(ParameterNode::holder(key), parent);
                for (child_key, child_spec) in children {
                    self.build_from_spec(child_key, child_spec, Some(group_idx));
                }
                group_idx
            }
        }
    }

    /// Create a root-level entry directly.
    ///
    /// Used both for leaves (`type_tag` + `value`) and for explicit
    /// valueless roots (`None`, `None`). Overwrites any existing root entry
    /// with the same key. Coercion failures surface here.
    #[instrument(level = "debug", skip(self, value))]
    pub fn set(
        &mut self,
        key: &str,
        type_tag: Option<&str>,
        value: Option<Value>,
    ) -> ParameterResult<Index> {
        let node = match value {
            Some(raw) => ParameterNode::leaf(key, ParameterValue::coerce(key, type_tag, &raw)?),
            None => ParameterNode::holder(key),
        };
        Ok(self.insert_node(node, None))
    }

    /// Remove the root entry for `key` and its whole subtree. No-op if the
    /// key is absent.
    #[instrument(level = "debug", skip(self))]
    pub fn delete(&mut self, key: &str) {
        if let Some(pos) = self.root_position(key) {
            let idx = self.roots.remove(pos);
            self.remove_subtree(idx);
        }
    }

    /// Root-level nodes in insertion order.
    pub fn all_entries(&self) -> Vec<&ParameterNode> {
        self.roots
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .collect()
    }

    /// Insert a node into the arena, either appended to `parent` or as a
    /// root entry. Root inserts overwrite an existing entry with the same
    /// key in place, dropping the replaced subtree.
    #[instrument(level = "trace", skip(self, node), fields(key = %node.key))]
    pub fn insert_node(&mut self, node: ParameterNode, parent: Option<Index>) -> Index {
        let key = node.key.clone();
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent_node) = self.arena.get_mut(parent_idx) {
                parent_node.children.push(node_idx);
            }
        } else if let Some(pos) = self.root_position(&key) {
            let replaced = self.roots[pos];
            self.roots[pos] = node_idx;
            self.remove_subtree(replaced);
        } else {
            self.roots.push(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&ParameterNode> {
        self.arena.get(idx)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    /// Number of root entries.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first pre-order iterator over all nodes of all root entries.
    pub fn iter(&self) -> ParameterIterator<'_> {
        ParameterIterator::new(self)
    }

    /// Maximum nesting depth over all root entries; 0 for an empty tree.
    #[instrument(level = "trace", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&idx| self.node_depth(idx))
            .max()
            .unwrap_or(0)
    }

    fn node_depth(&self, idx: Index) -> usize {
        if let Some(node) = self.arena.get(idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.node_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Dotted key paths of all leaves, for diagnostics.
    ///
    /// `{"a": {"b": 5}, "c": 1}` yields `["a.b", "c"]`.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut trail = Vec::new();
        for &root in &self.roots {
            self.collect_leaf_paths(root, &mut trail, &mut paths);
        }
        paths
    }

    fn collect_leaf_paths(&self, idx: Index, trail: &mut Vec<String>, paths: &mut Vec<String>) {
        if let Some(node) = self.arena.get(idx) {
            trail.push(node.key.clone());
            if node.children.is_empty() {
                paths.push(trail.iter().join("."));
            } else {
                for &child in &node.children {
                    self.collect_leaf_paths(child, trail, paths);
                }
            }
            trail.pop();
        }
    }

    /// Plain nested mapping, assembled depth-first.
    ///
    /// Fragments of sibling nodes are merged last-write-wins: when two
    /// fragments collide on a key, the later one replaces the earlier.
    #[instrument(level = "debug", skip(self))]
    pub fn to_h(&self) -> Value {
        let mut hash = Map::new();
        for &root in &self.roots {
            if let Some((key, fragment)) = self.plain_entry(root) {
                hash.insert(key, fragment);
            }
        }
        Value::Object(hash)
    }

    /// Catalog API wire shape: `{"data": {...}}` at the top, plus one
    /// nested `"data"` envelope per composite level. Leaves carry no
    /// envelope.
    #[instrument(level = "debug", skip(self))]
    pub fn to_vra(&self) -> Value {
        let mut data = Map::new();
        for &root in &self.roots {
            if let Some((key, fragment)) = self.wire_entry(root) {
                data.insert(key, fragment);
            }
        }
        let mut hash = Map::new();
        hash.insert("data".to_string(), Value::Object(data));
        Value::Object(hash)
    }

    fn plain_entry(&self, idx: Index) -> Option<(String, Value)> {
        let node = self.arena.get(idx)?;
        if node.is_leaf() {
            return Some((node.key.clone(), node.scalar()));
        }

        let mut inner = Map::new();
        for &child in &node.children {
            if let Some((key, fragment)) = self.plain_entry(child) {
                inner.insert(key, fragment);
            }
        }
        Some((node.key.clone(), Value::Object(inner)))
    }

    fn wire_entry(&self, idx: Index) -> Option<(String, Value)> {
        let node = self.arena.get(idx)?;
        if node.is_leaf() {
            return Some((node.key.clone(), node.scalar()));
        }

        let mut inner = Map::new();
        for &child in &node.children {
            if let Some((key, fragment)) = self.wire_entry(child) {
                inner.insert(key, fragment);
            }
        }
        let mut envelope = Map::new();
        envelope.insert("data".to_string(), Value::Object(inner));
        Some((node.key.clone(), Value::Object(envelope)))
    }

    fn root_position(&self, key: &str) -> Option<usize> {
        self.roots.iter().position(|&idx| {
            self.arena
                .get(idx)
                .map(|node| node.key == key)
                .unwrap_or(false)
        })
    }

    fn remove_subtree(&mut self, idx: Index) {
        if let Some(node) = self.arena.remove(idx) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }
}

pub struct ParameterIterator<'a> {
    tree: &'a ParameterTree,
    stack: Vec<Index>,
}

impl<'a> ParameterIterator<'a> {
    fn new(tree: &'a ParameterTree) -> Self {
        let stack = tree.roots.iter().rev().copied().collect();
        Self { tree, stack }
    }
}

impl<'a> Iterator for ParameterIterator<'a> {
    type Item = (Index, &'a ParameterNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // machine
    // ├── cpu
    // └── disks
    //     └── boot
    fn sample_tree() -> ParameterTree {
        let param_spec = ParamSpec::from_json(
            "machine",
            &json!({
                "cpu": {"type": "integer", "value": 2},
                "disks": {
                    "boot": {"type": "string", "value": "40GB"},
                },
            }),
        )
        .unwrap();

        let mut tree = ParameterTree::new();
        tree.build_from_spec("machine", &param_spec, None);
        tree
    }

    #[test]
    fn test_build_from_spec_structure() {
        let tree = sample_tree();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), 3);

        let machine = tree.all_entries()[0];
        assert_eq!(machine.key, "machine");
        assert_eq!(machine.children.len(), 2);
        assert!(!machine.is_leaf());

        let cpu = tree.get_node(machine.children[0]).unwrap();
        assert_eq!(cpu.key, "cpu");
        assert_eq!(cpu.value, Some(ParameterValue::Integer(2)));
        assert!(cpu.is_leaf());
    }

    #[test]
    fn test_overwrite_keeps_root_position() {
        let mut tree = ParameterTree::new();
        tree.set("first", Some("string"), Some(json!("a"))).unwrap();
        tree.set("second", Some("string"), Some(json!("b"))).unwrap();
        tree.set("first", Some("string"), Some(json!("c"))).unwrap();

        let keys: Vec<&str> = tree.all_entries().iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, ["first", "second"]);
    }

    #[test]
    fn test_overwrite_drops_replaced_subtree() {
        let mut tree = ParameterTree::new();
        let param_spec = ParamSpec::from_json(
            "machine",
            &json!({"cpu": {"type": "integer", "value": 2}}),
        )
        .unwrap();
        tree.build_from_spec("machine", &param_spec, None);
        tree.set("machine", Some("string"), Some(json!("flat"))).unwrap();

        // Only the new root remains in the arena
        assert_eq!(tree.iter().count(), 1);
        assert_eq!(tree.to_h(), json!({"machine": "flat"}));
    }

    #[test]
    fn test_iter_visits_depth_first() {
        let tree = sample_tree();
        let keys: Vec<&str> = tree.iter().map(|(_, node)| node.key.as_str()).collect();
        assert_eq!(keys, ["machine", "cpu", "disks", "boot"]);
    }

    #[test]
    fn test_leaf_paths() {
        let tree = sample_tree();
        assert_eq!(tree.leaf_paths(), ["machine.cpu", "machine.disks.boot"]);
    }
}
