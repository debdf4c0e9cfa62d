//! # Filter Projection
//!
//! Read-only view over a [`MirrorTree`] that hides subtrees by element-type
//! allow-list and free-text search.
//!
//! A node is visible when it matches directly or when at least one of its
//! children is visible. Matching ancestors of a hit are shown as the route
//! to it even if they do not match themselves.
//!
//! Match results are memoized per tree instance and revision, so any
//! structural change to the tree drops the memo.

use crate::config::FilterConfig;
use crate::node::NodeId;
use crate::tree::MirrorTree;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Element types shown outside expert mode
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "vehicles",
    "aircraft",
    "rotorcraft",
    "model",
    "wings",
    "wing",
    "fuselages",
    "fuselage",
    "sections",
    "section",
    "positionings",
    "positioning",
    "segments",
    "segment",
    "componentSegments",
    "componentSegment",
    "profiles",
    "wingAirfoils",
    "wingAirfoil",
    "fuselageProfiles",
    "fuselageProfile",
];

#[derive(Debug, Default)]
struct VisibilityCache {
    key: Option<(u64, u64)>,
    visible: HashMap<NodeId, bool>,
}

/// Allow-list and search projection
#[derive(Debug)]
pub struct FilterProjection {
    allowed_types: HashSet<String>,
    /// Stored lowercased
    search_pattern: String,
    match_on_uid: bool,
    expert: bool,
    cache: RefCell<VisibilityCache>,
}

impl FilterProjection {
    pub fn new() -> Self {
        Self::with_allowed_types(DEFAULT_ALLOWED_TYPES.iter().copied())
    }

    pub fn with_allowed_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_types: types.into_iter().map(Into::into).collect(),
            search_pattern: String::new(),
            match_on_uid: true,
            expert: false,
            cache: RefCell::new(VisibilityCache::default()),
        }
    }

    /// Projection configured from the `filter` section of the editor config
    ///
    /// An empty type list selects [`DEFAULT_ALLOWED_TYPES`].
    pub fn from_config(config: &FilterConfig) -> Self {
        let mut projection = if config.allowed_types.is_empty() {
            Self::new()
        } else {
            Self::with_allowed_types(config.allowed_types.iter().cloned())
        };
        projection.match_on_uid = config.match_on_uid;
        projection.expert = config.expert;
        projection
    }

    pub fn set_search_pattern(&mut self, pattern: &str) {
        self.search_pattern = pattern.trim().to_lowercase();
        self.invalidate();
    }

    pub fn search_pattern(&self) -> &str {
        &self.search_pattern
    }

    /// Expert mode disables the allow-list
    pub fn set_expert_view(&mut self, expert: bool) {
        self.expert = expert;
        self.invalidate();
    }

    pub fn is_expert_view(&self) -> bool {
        self.expert
    }

    pub fn set_match_on_uid(&mut self, enabled: bool) {
        self.match_on_uid = enabled;
        self.invalidate();
    }

    pub fn set_allowed_types<I, S>(&mut self, types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = types.into_iter().map(Into::into).collect();
        self.invalidate();
    }

    pub fn is_type_allowed(&self, element_type: &str) -> bool {
        self.expert || self.allowed_types.contains(element_type)
    }

    fn invalidate(&mut self) {
        let cache = self.cache.get_mut();
        cache.key = None;
        cache.visible.clear();
    }

    /// Whether the node itself satisfies the allow-list and the search pattern
    pub fn matches(&self, tree: &MirrorTree, node: NodeId) -> bool {
        let Some(mirror) = tree.node(node) else {
            return false;
        };
        if !self.is_type_allowed(mirror.element_type()) {
            return false;
        }
        if self.search_pattern.is_empty() {
            return true;
        }
        mirror.element_type().to_lowercase().contains(&self.search_pattern)
            || (self.match_on_uid && mirror.uid().to_lowercase().contains(&self.search_pattern))
    }

    /// Whether the node is shown: it matches or one of its children is shown
    pub fn is_visible(&self, tree: &MirrorTree, node: NodeId) -> bool {
        if !tree.contains(node) {
            return false;
        }
        {
            let mut cache = self.cache.borrow_mut();
            let key = Some((tree.instance(), tree.revision()));
            if cache.key != key {
                cache.key = key;
                cache.visible.clear();
            }
            if let Some(hit) = cache.visible.get(&node) {
                return *hit;
            }
        }

        let visible = self.matches(tree, node)
            || tree.children(node).iter().any(|c| self.is_visible(tree, *c));
        self.cache.borrow_mut().visible.insert(node, visible);
        visible
    }

    /// Visible children of a node, in mirror order
    pub fn visible_children(&self, tree: &MirrorTree, node: NodeId) -> Vec<NodeId> {
        tree.children(node)
            .iter()
            .copied()
            .filter(|c| self.is_visible(tree, *c))
            .collect()
    }

    pub fn visible_row_count(&self, tree: &MirrorTree, node: NodeId) -> usize {
        self.visible_children(tree, node).len()
    }

    /// Node the view starts at: the mirror root in expert mode, otherwise
    /// the first aircraft model
    pub fn display_root(&self, tree: &MirrorTree) -> Option<NodeId> {
        if self.expert {
            return tree.root();
        }
        tree.find_all_of_type("model")
            .into_iter()
            .next()
            .or_else(|| tree.root())
    }

    /// Visible nodes below `start` in pre-order, with their depth relative to it
    pub fn visible_preorder(&self, tree: &MirrorTree, start: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        if !self.is_visible(tree, start) {
            return out;
        }
        let mut stack = vec![(start, 0)];
        while let Some((node, depth)) = stack.pop() {
            out.push((node, depth));
            for child in self.visible_children(tree, node).into_iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

impl Default for FilterProjection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpacs_parser::parse;

    const SOURCE: &str = r#"
        <cpacs>
            <vehicles>
                <aircraft>
                    <model uID="D150">
                        <name>D150</name>
                        <wings>
                            <wing uID="MainWing">
                                <sections>
                                    <section uID="Root"><name>Root</name></section>
                                </sections>
                            </wing>
                        </wings>
                    </model>
                </aircraft>
                <materials><material uID="Al"/></materials>
            </vehicles>
        </cpacs>
    "#;

    fn tree() -> MirrorTree {
        let doc = parse(SOURCE).unwrap();
        let mut tree = MirrorTree::new();
        tree.build(&doc, "/cpacs/vehicles").unwrap();
        tree
    }

    #[test]
    fn test_match_promotes_ancestors_only() {
        let tree = tree();
        // only "section" is allowed: A(wings) -> B(wing) -> C(section)
        let filter = FilterProjection::with_allowed_types(["section"]);
        let wings = tree.find_all_of_type("wings")[0];
        let wing = tree.find_by_uid("MainWing").unwrap();
        let section = tree.find_by_uid("Root").unwrap();
        let name = tree.find_all_of_type("name")[0];
        let materials = tree.find_all_of_type("materials")[0];

        assert!(filter.is_visible(&tree, section));
        assert!(filter.is_visible(&tree, wing));
        assert!(filter.is_visible(&tree, wings));
        assert!(!filter.is_visible(&tree, name));
        assert!(!filter.is_visible(&tree, materials));
    }

    #[test]
    fn test_expert_with_empty_pattern_shows_everything() {
        let tree = tree();
        let mut filter = FilterProjection::new();
        filter.set_expert_view(true);
        let root = tree.root().unwrap();
        assert!(tree.preorder(root).all(|id| filter.is_visible(&tree, id)));
        assert_eq!(filter.display_root(&tree), Some(root));
    }

    #[test]
    fn test_search_on_type_and_uid_case_insensitive() {
        let tree = tree();
        let mut filter = FilterProjection::new();
        filter.set_expert_view(true);
        filter.set_search_pattern("mainw");
        let wing = tree.find_by_uid("MainWing").unwrap();
        let section = tree.find_by_uid("Root").unwrap();
        assert!(filter.matches(&tree, wing));
        assert!(!filter.is_visible(&tree, section));

        filter.set_match_on_uid(false);
        assert!(!filter.is_visible(&tree, wing));

        filter.set_search_pattern("SECT");
        assert!(filter.is_visible(&tree, section));
    }

    #[test]
    fn test_display_root_is_model_outside_expert_mode() {
        let tree = tree();
        let filter = FilterProjection::new();
        assert_eq!(filter.display_root(&tree), tree.find_by_uid("D150"));
    }

    #[test]
    fn test_cache_dropped_after_tree_edit() {
        let mut tree = tree();
        let filter = FilterProjection::with_allowed_types(["material"]);
        let materials = tree.find_all_of_type("materials")[0];
        assert!(filter.is_visible(&tree, materials));

        tree.remove_child_at(materials, 0).unwrap();
        assert!(!filter.is_visible(&tree, materials));

        tree.insert_child_at(materials, 0, "material", "Ti").unwrap();
        assert!(filter.is_visible(&tree, materials));
    }

    #[test]
    fn test_unbuilt_tree_shows_nothing() {
        let mut tree = tree();
        let root = tree.root().unwrap();
        tree.clean();
        let filter = FilterProjection::new();
        assert!(!filter.is_visible(&tree, root));
        assert_eq!(filter.display_root(&tree), None);
        assert!(filter.visible_preorder(&tree, root).is_empty());
    }

    #[test]
    fn test_visible_preorder_depths() {
        let tree = tree();
        let filter = FilterProjection::new();
        let model = filter.display_root(&tree).unwrap();
        let rows: Vec<_> = filter
            .visible_preorder(&tree, model)
            .into_iter()
            .map(|(id, depth)| (tree.element_type(id).unwrap().to_string(), depth))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("model".to_string(), 0),
                ("wings".to_string(), 1),
                ("wing".to_string(), 2),
                ("sections".to_string(), 3),
                ("section".to_string(), 4),
            ]
        );
    }
}
