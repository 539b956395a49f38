//! Entry registry — the path tree
//!
//! Maps dot-separated paths to entry records and tracks parent/child
//! relationships in insertion order. Registration is explicit and two-phase:
//! entry definitions are inert until [`EntryRegistry::attach`] computes their
//! path and inserts them, so a failed attach leaves no side effects behind.

use indexmap::IndexMap;

use crate::entry::{EntryData, EntryKind};
use crate::error::{FormError, Result};
use crate::path::EntryPath;

/// One node in the path tree. A node may exist without a registered entry
/// when it was created as an intermediate for a deeper path.
#[derive(Clone, Default)]
struct EntryNode {
    entry: Option<EntryData>,
    /// Child ids in insertion order
    children: Vec<String>,
}

/// Path-indexed tree of every entry registered under one root form.
///
/// Exactly one registry exists per root form; nested subforms share it,
/// scoped under their own paths.
pub(crate) struct EntryRegistry {
    nodes: IndexMap<EntryPath, EntryNode>,
}

impl EntryRegistry {
    /// Create a registry whose root node is the root form itself.
    pub fn new(root: EntryData) -> Self {
        let mut nodes = IndexMap::new();
        nodes.insert(
            EntryPath::root(),
            EntryNode {
                entry: Some(root),
                children: Vec::new(),
            },
        );
        Self { nodes }
    }

    /// Register an entry under the given parent, computing and returning its
    /// path.
    ///
    /// Fails when the parent is not attached, when an entry already occupies
    /// the computed path, or when the parent is a parameter (parameters are
    /// leaves).
    pub fn attach(&mut self, parent: &EntryPath, mut entry: EntryData) -> Result<EntryPath> {
        let parent_entry = self
            .nodes
            .get(parent)
            .and_then(|node| node.entry.as_ref())
            .ok_or_else(|| FormError::ParentNotAttached {
                path: parent.to_string(),
            })?;
        if parent_entry.kind == EntryKind::Parameter {
            return Err(FormError::ParameterNesting {
                parent: parent.to_string(),
                id: entry.id.clone(),
            });
        }

        let path = parent.join(&entry.id)?;
        if self
            .nodes
            .get(&path)
            .is_some_and(|node| node.entry.is_some())
        {
            return Err(FormError::DuplicatePath {
                path: path.to_string(),
            });
        }

        // Create intermediate nodes for any missing ancestors, then insert.
        self.ensure_node(&path);
        entry.path = path.clone();
        if let Some(node) = self.nodes.get_mut(&path) {
            node.entry = Some(entry);
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            let id = path.id().to_string();
            if !parent_node.children.contains(&id) {
                parent_node.children.push(id);
            }
        }
        Ok(path)
    }

    fn ensure_node(&mut self, path: &EntryPath) {
        let mut ancestors = Vec::new();
        let mut cursor = Some(path.clone());
        while let Some(p) = cursor {
            if self.nodes.contains_key(&p) {
                break;
            }
            cursor = p.parent();
            ancestors.push(p);
        }
        for p in ancestors.into_iter().rev() {
            self.nodes.insert(p, EntryNode::default());
        }
    }

    /// Exact-path resolution. The root path resolves to the root form entry.
    pub fn lookup(&self, path: &EntryPath) -> Option<&EntryData> {
        self.nodes.get(path).and_then(|node| node.entry.as_ref())
    }

    pub fn lookup_mut(&mut self, path: &EntryPath) -> Option<&mut EntryData> {
        self.nodes.get_mut(path).and_then(|node| node.entry.as_mut())
    }

    /// The entry registered at the immediate parent node, if any. Returns
    /// `None` for the root path itself and for an unregistered intermediate
    /// parent; the parent of a top-level entry is the root form.
    pub fn lookup_parent(&self, path: &EntryPath) -> Option<&EntryData> {
        self.lookup(&path.parent()?)
    }

    /// Direct children of a path in insertion order. Unregistered
    /// intermediates are skipped.
    pub fn lookup_children(&self, path: &EntryPath) -> Vec<&EntryData> {
        let Some(node) = self.nodes.get(path) else {
            return Vec::new();
        };
        node.children
            .iter()
            .filter_map(|id| {
                let child_path = path.join(id).ok()?;
                self.lookup(&child_path)
            })
            .collect()
    }

    /// Resolve `id` relative to `base` (`lookup(base + "." + id)`).
    pub fn lookup_relative(&self, base: &EntryPath, id: &str) -> Option<&EntryData> {
        let path = base.join(id).ok()?;
        self.lookup(&path)
    }

    /// Pre-order walk over every registered entry, root form excluded.
    pub fn for_each<F: FnMut(&EntryData)>(&self, mut f: F) {
        self.walk(&EntryPath::root(), &mut f);
    }

    fn walk<F: FnMut(&EntryData)>(&self, path: &EntryPath, f: &mut F) {
        let Some(node) = self.nodes.get(path) else {
            return;
        };
        if !path.is_root() {
            if let Some(entry) = &node.entry {
                f(entry);
            }
        }
        for id in &node.children {
            if let Ok(child_path) = path.join(id) {
                self.walk(&child_path, f);
            }
        }
    }

    /// Number of registered entries, root excluded.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each(|_| count += 1);
        count
    }

    /// Paths of every registered entry in pre-order, root excluded.
    pub fn paths(&self) -> Vec<EntryPath> {
        let mut paths = Vec::new();
        self.for_each(|entry| paths.push(entry.path.clone()));
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> EntryRegistry {
        EntryRegistry::new(EntryData::new(String::new(), EntryPath::root(), EntryKind::Form))
    }

    fn entry(id: &str, kind: EntryKind) -> EntryData {
        EntryData::new(id.into(), EntryPath::root(), kind)
    }

    #[test]
    fn attach_computes_paths() {
        let mut reg = registry();
        let root = EntryPath::root();

        let drivers = reg
            .attach(&root, entry("drivers", EntryKind::Section))
            .unwrap();
        assert_eq!(drivers.as_str(), "drivers");

        let max = reg
            .attach(&drivers, entry("max", EntryKind::Parameter))
            .unwrap();
        assert_eq!(max.as_str(), "drivers.max");
        assert_eq!(reg.lookup(&max).unwrap().id, "max");
    }

    #[test]
    fn duplicate_paths_rejected() {
        let mut reg = registry();
        let root = EntryPath::root();
        reg.attach(&root, entry("make", EntryKind::Parameter)).unwrap();
        let err = reg
            .attach(&root, entry("make", EntryKind::Parameter))
            .unwrap_err();
        assert!(matches!(err, FormError::DuplicatePath { .. }));
    }

    #[test]
    fn unattached_parent_rejected() {
        let mut reg = registry();
        let missing = EntryPath::parse("ghost").unwrap();
        let err = reg
            .attach(&missing, entry("make", EntryKind::Parameter))
            .unwrap_err();
        assert!(matches!(err, FormError::ParentNotAttached { .. }));
    }

    #[test]
    fn parameters_are_leaves() {
        let mut reg = registry();
        let root = EntryPath::root();
        let make = reg.attach(&root, entry("make", EntryKind::Parameter)).unwrap();
        let err = reg
            .attach(&make, entry("model", EntryKind::Parameter))
            .unwrap_err();
        assert!(matches!(err, FormError::ParameterNesting { .. }));
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let reg = registry();
        let root_entry = reg.lookup(&EntryPath::root()).unwrap();
        assert_eq!(root_entry.kind, EntryKind::Form);
    }

    #[test]
    fn children_in_insertion_order() {
        let mut reg = registry();
        let root = EntryPath::root();
        reg.attach(&root, entry("make", EntryKind::Parameter)).unwrap();
        reg.attach(&root, entry("model", EntryKind::Parameter)).unwrap();
        let drivers = reg
            .attach(&root, entry("drivers", EntryKind::Section))
            .unwrap();
        reg.attach(&drivers, entry("names", EntryKind::Parameter)).unwrap();

        let ids: Vec<_> = reg
            .lookup_children(&root)
            .iter()
            .map(|e| e.id.clone())
            .collect();
        assert_eq!(ids, vec!["make", "model", "drivers"]);
    }

    #[test]
    fn preorder_walk_visits_each_entry_once() {
        let mut reg = registry();
        let root = EntryPath::root();
        reg.attach(&root, entry("make", EntryKind::Parameter)).unwrap();
        let drivers = reg
            .attach(&root, entry("drivers", EntryKind::Section))
            .unwrap();
        let advanced = reg
            .attach(&drivers, entry("advanced", EntryKind::Section))
            .unwrap();
        reg.attach(&advanced, entry("max", EntryKind::Parameter)).unwrap();

        let mut visited = Vec::new();
        reg.for_each(|e| visited.push(e.path.to_string()));
        assert_eq!(
            visited,
            vec!["make", "drivers", "drivers.advanced", "drivers.advanced.max"]
        );
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn relative_and_parent_lookup() {
        let mut reg = registry();
        let root = EntryPath::root();
        let drivers = reg
            .attach(&root, entry("drivers", EntryKind::Section))
            .unwrap();
        let max = reg
            .attach(&drivers, entry("max", EntryKind::Parameter))
            .unwrap();

        assert_eq!(reg.lookup_relative(&drivers, "max").unwrap().path, max);
        assert_eq!(reg.lookup_relative(&root, "drivers").unwrap().path, drivers);
        assert_eq!(reg.lookup_parent(&max).unwrap().path, drivers);
        // The parent of a top-level entry is the root form itself.
        assert_eq!(reg.lookup_parent(&drivers).unwrap().kind, EntryKind::Form);
        assert!(reg.lookup_parent(&root).is_none());
    }
}
