//! Named registry the host uses to hand hit stores to stepping actions at setup.

use std::collections::BTreeMap;

const HIT_NODE_PREFIX: &str = "G4HIT_";

/// Node name of the hit store belonging to `detector`.
pub fn hit_node_name(detector: &str) -> String {
    format!("{HIT_NODE_PREFIX}{detector}")
}

#[derive(Debug)]
pub struct NodeTree<S> {
    nodes: BTreeMap<String, S>,
}

impl<S> Default for NodeTree<S> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }
}

impl<S> NodeTree<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` under `name`, returning any node it replaces.
    pub fn insert(&mut self, name: &str, node: S) -> Option<S> {
        self.nodes.insert(name.to_string(), node)
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.nodes.get(name)
    }

    /// Remove and return the node registered under `name`.
    pub fn take(&mut self, name: &str) -> Option<S> {
        self.nodes.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_name() {
        assert_eq!(hit_node_name("dRICH"), "G4HIT_dRICH");
    }

    #[test]
    fn test_insert_take() {
        let mut tree = NodeTree::new();
        assert!(tree.insert("G4HIT_dRICH", 1u32).is_none());
        assert_eq!(tree.insert("G4HIT_dRICH", 2), Some(1));
        assert_eq!(tree.get("G4HIT_dRICH"), Some(&2));
        assert_eq!(tree.names().collect::<Vec<_>>(), vec!["G4HIT_dRICH"]);
        assert_eq!(tree.take("G4HIT_dRICH"), Some(2));
        assert_eq!(tree.take("G4HIT_dRICH"), None);
    }
}
