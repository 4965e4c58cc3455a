/*
Workaround for error: https://doc.rust-lang.org/error_codes/E0116.html
Cannot define inherent `impl` for a type outside of the crate where the type is defined

define a trait that has the desired associated functions/types/constants and implement the trait for the type in question
 */
use generational_arena::Index;
use termtree::Tree;

use crate::tree::ParameterTree;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for ParameterTree {
    fn to_tree_string(&self) -> Tree<String> {
        let mut tree = Tree::new("parameters".to_string());

        fn build_tree(params: &ParameterTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            if let Some(node) = params.get_node(node_idx) {
                let label = match &node.value {
                    Some(value) if node.is_leaf() => format!("{}: {}", node.key, value),
                    _ => node.key.clone(),
                };
                let mut child_tree = Tree::new(label);
                for &child_idx in &node.children {
                    build_tree(params, child_idx, &mut child_tree);
                }
                parent_tree.push(child_tree);
            }
        }

        for &root_idx in self.roots() {
            build_tree(self, root_idx, &mut tree);
        }
        tree
    }
}
