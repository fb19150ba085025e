//! A generalized compressed prefix tree.
//!
//! Keys are strings, edges carry multi-character labels and the tree is the
//! root node itself. At every node no outgoing label is a prefix of another
//! one; inserting a key that is a proper prefix of existing labels splits
//! those edges and re-parents the affected children.

use std::collections::{BTreeMap, HashMap};

/// A node of the prefix tree. The whole tree is just its root node.
#[derive(Debug)]
pub struct PrefixTree<T> {
    data: Option<T>,
    children: HashMap<String, PrefixTree<T>>,
}

impl<T> Default for PrefixTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PrefixTree<T> {
    pub fn new() -> Self {
        Self {
            data: None,
            children: HashMap::new(),
        }
    }

    fn with_data(data: T) -> Self {
        Self {
            data: Some(data),
            children: HashMap::new(),
        }
    }

    /// Inserts `data` under `key`. Returns false (leaving the tree
    /// untouched) when the key already holds data.
    pub fn add(&mut self, key: &str, data: T) -> bool {
        if key.is_empty() {
            if self.data.is_some() {
                return false;
            }
            self.data = Some(data);
            return true;
        }

        // Descend along the longest edge label matching the key so that a
        // stored key sharing a stem with a longer sibling is not treated as
        // a divergence.
        let matched = self
            .children
            .keys()
            .filter(|label| key.starts_with(label.as_str()))
            .max_by_key(|label| label.len())
            .cloned();
        if let Some(label) = matched {
            if let Some(child) = self.children.get_mut(&label) {
                return child.add(&key[label.len()..], data);
            }
        }

        // Divergence: the remainder becomes a new edge here. Children whose
        // labels extend it move under the new node with their labels cut.
        let mut node = PrefixTree::with_data(data);
        let extending: Vec<String> = self
            .children
            .keys()
            .filter(|label| label.starts_with(key))
            .cloned()
            .collect();
        for label in extending {
            if let Some(child) = self.children.remove(&label) {
                node.children.insert(label[key.len()..].to_string(), child);
            }
        }
        self.children.insert(key.to_string(), node);
        true
    }

    /// Exact-match lookup. A traversal that stops short of consuming the
    /// whole key yields nothing.
    pub fn get(&self, key: &str) -> Option<&T> {
        if key.is_empty() {
            return self.data.as_ref();
        }
        let (label, child) = self
            .children
            .iter()
            .filter(|(label, _)| key.starts_with(label.as_str()))
            .max_by_key(|(label, _)| label.len())?;
        child.get(&key[label.len()..])
    }

    /// Whether `key` holds data.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns every stored key starting with `prefix`, mapped to its data.
    /// The empty prefix returns all entries.
    pub fn search(&self, prefix: &str) -> BTreeMap<String, &T> {
        let mut found = BTreeMap::new();
        self.collect(prefix, String::new(), &mut found);
        found
    }

    fn collect<'a>(&'a self, prefix: &str, path: String, found: &mut BTreeMap<String, &'a T>) {
        if path.len() >= prefix.len() {
            // The search prefix is exhausted; everything below is a match.
            if let Some(data) = &self.data {
                found.insert(path.clone(), data);
            }
            for (label, child) in &self.children {
                child.collect(prefix, format!("{path}{label}"), found);
            }
        } else {
            // Keep walking, but only down edges that stay on the prefix
            // path (in either direction: the label may overshoot the
            // remaining prefix or fall short of it).
            let rest = &prefix[path.len()..];
            for (label, child) in &self.children {
                if label.starts_with(rest) || rest.starts_with(label.as_str()) {
                    child.collect(prefix, format!("{path}{label}"), found);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trips() {
        let mut tree = PrefixTree::new();
        let items = [("abc", 1), ("abcd", 2), ("a", 3), ("ab", 4), ("", 5)];
        for (key, data) in items {
            assert!(tree.add(key, data), "failed to add {key:?}");
        }
        for (key, data) in items {
            assert_eq!(tree.get(key), Some(&data), "wrong data for {key:?}");
        }
        assert_eq!(tree.get("abx"), None);
        assert_eq!(tree.get("abcde"), None);
    }

    #[test]
    fn duplicate_add_is_rejected_and_keeps_data() {
        let mut tree = PrefixTree::new();
        assert!(tree.add("weather", 1));
        assert!(!tree.add("weather", 2));
        assert_eq!(tree.get("weather"), Some(&1));
    }

    #[test]
    fn partial_traversal_is_not_a_match() {
        let mut tree = PrefixTree::new();
        tree.add("weather", 1);
        assert_eq!(tree.get("wea"), None);
        assert_eq!(tree.get("weatherx"), None);
    }

    #[test]
    fn edge_split_redistributes_children() {
        let mut tree = PrefixTree::new();
        // "abc" and "abd" start as sibling edges; inserting "ab" must split
        // both under the new node.
        tree.add("abc", 2);
        tree.add("abd", 3);
        tree.add("ab", 1);
        assert_eq!(tree.get("ab"), Some(&1));
        assert_eq!(tree.get("abc"), Some(&2));
        assert_eq!(tree.get("abd"), Some(&3));
    }

    #[test]
    fn search_returns_whole_subtree() {
        let mut tree = PrefixTree::new();
        tree.add("ab", 1);
        tree.add("abc", 2);
        tree.add("abd", 3);

        let hits = tree.search("ab");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits.get("ab"), Some(&&1));
        assert_eq!(hits.get("abc"), Some(&&2));
        assert_eq!(hits.get("abd"), Some(&&3));

        let hits = tree.search("abc");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits.get("abc"), Some(&&2));
    }

    #[test]
    fn search_empty_prefix_returns_everything() {
        let mut tree = PrefixTree::new();
        for key in ["help", "weather", "weathermap", "seen"] {
            tree.add(key, ());
        }
        let all = tree.search("");
        assert_eq!(
            all.keys().cloned().collect::<Vec<_>>(),
            vec!["help", "seen", "weather", "weathermap"]
        );
    }

    #[test]
    fn search_crosses_mid_label_divergence() {
        let mut tree = PrefixTree::new();
        tree.add("weather", 1);
        tree.add("weathermap", 2);
        tree.add("wealth", 3);

        let hits = tree.search("wea");
        assert_eq!(
            hits.keys().cloned().collect::<Vec<_>>(),
            vec!["wealth", "weather", "weathermap"]
        );

        let hits = tree.search("weath");
        assert_eq!(
            hits.keys().cloned().collect::<Vec<_>>(),
            vec!["weather", "weathermap"]
        );
    }

    #[test]
    fn search_misses_unrelated_prefix() {
        let mut tree = PrefixTree::new();
        tree.add("weather", 1);
        assert!(tree.search("x").is_empty());
        assert!(tree.search("weatherman").is_empty());
    }
}
