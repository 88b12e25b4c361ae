//! Project tree as served by the tree API.
//!
//! Used for entity name lookups, expanding and selecting the sidebar path of
//! the focused entity, and choosing which page to navigate to.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use planmark_core::EntityId;

use crate::model::ViewType;

/// Entity kind of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNodeKind {
    Room,
    #[serde(alias = "location")]
    RoomLocation,
    CabinetRun,
    Cabinet,
}

/// A page on which an entity appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreePage {
    pub page: u32,
    #[serde(rename = "viewType", default)]
    pub view_type: Option<ViewType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TreeNodeKind,
    #[serde(default)]
    pub pages: Vec<TreePage>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn key(&self) -> NodeKey {
        NodeKey {
            kind: self.kind,
            id: self.id,
        }
    }

    /// First page of this node in the given view.
    pub fn page_in_view(&self, view: ViewType) -> Option<u32> {
        self.pages
            .iter()
            .find(|p| p.view_type == Some(view))
            .map(|p| p.page)
    }
}

/// Identity of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub kind: TreeNodeKind,
    pub id: EntityId,
}

impl NodeKey {
    pub fn new(kind: TreeNodeKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

/// Loaded tree plus sidebar expansion and selection state.
#[derive(Debug, Clone, Default)]
pub struct ProjectTree {
    roots: Vec<TreeNode>,
    expanded: BTreeSet<NodeKey>,
    selected: Option<NodeKey>,
}

impl ProjectTree {
    pub fn new(roots: Vec<TreeNode>) -> Self {
        Self {
            roots,
            ..Self::default()
        }
    }

    /// Replaces the nodes, keeping expansion state for nodes that survive.
    pub fn replace(&mut self, roots: Vec<TreeNode>) {
        self.roots = roots;
        let roots = &self.roots;
        self.expanded.retain(|key| path_to(roots, *key).is_some());
        if let Some(selected) = self.selected {
            if path_to(roots, selected).is_none() {
                self.selected = None;
            }
        }
    }

    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, key: NodeKey) -> Option<&TreeNode> {
        path_to(&self.roots, key).and_then(|path| path.last().copied())
    }

    /// Nodes from the root down to `key`, inclusive.
    pub fn path(&self, key: NodeKey) -> Option<Vec<&TreeNode>> {
        path_to(&self.roots, key)
    }

    pub fn room_name(&self, id: EntityId) -> Option<&str> {
        self.find(NodeKey::new(TreeNodeKind::Room, id))
            .map(|node| node.name.as_str())
    }

    pub fn location_name(&self, id: EntityId) -> Option<&str> {
        self.find(NodeKey::new(TreeNodeKind::RoomLocation, id))
            .map(|node| node.name.as_str())
    }

    pub fn cabinet_run_name(&self, id: EntityId) -> Option<&str> {
        self.find(NodeKey::new(TreeNodeKind::CabinetRun, id))
            .map(|node| node.name.as_str())
    }

    /// Expands every ancestor of `key` and the node itself.
    pub fn expand_path(&mut self, key: NodeKey) -> bool {
        let keys: Vec<NodeKey> = match path_to(&self.roots, key) {
            Some(path) => path.iter().map(|node| node.key()).collect(),
            None => return false,
        };
        self.expanded.extend(keys);
        true
    }

    pub fn toggle_expanded(&mut self, key: NodeKey) -> bool {
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
            return true;
        }
        false
    }

    pub fn is_expanded(&self, key: NodeKey) -> bool {
        self.expanded.contains(&key)
    }

    pub fn select(&mut self, key: Option<NodeKey>) {
        self.selected = key;
    }

    pub fn selected(&self) -> Option<NodeKey> {
        self.selected
    }

    /// Page to show for a node.
    ///
    /// Tried in order: the node's own page in `view`, its parent location's,
    /// its parent room's, then the node's first page. Returns `None` when the
    /// target is already `current_page`.
    pub fn navigation_target(
        &self,
        key: NodeKey,
        view: ViewType,
        current_page: u32,
    ) -> Option<u32> {
        let path = self.path(key)?;
        let node = path.last()?;

        let parent_of = |kind: TreeNodeKind| {
            path.iter()
                .rev()
                .skip(1)
                .find(|n| n.kind == kind)
                .copied()
        };

        let target = node
            .page_in_view(view)
            .or_else(|| parent_of(TreeNodeKind::RoomLocation).and_then(|n| n.page_in_view(view)))
            .or_else(|| parent_of(TreeNodeKind::Room).and_then(|n| n.page_in_view(view)))
            .or_else(|| node.pages.first().map(|p| p.page))?;

        (target != current_page).then_some(target)
    }
}

fn path_to(nodes: &[TreeNode], key: NodeKey) -> Option<Vec<&TreeNode>> {
    for node in nodes {
        if node.key() == key {
            return Some(vec![node]);
        }
        if let Some(mut rest) = path_to(&node.children, key) {
            rest.insert(0, node);
            return Some(rest);
        }
    }
    None
}
