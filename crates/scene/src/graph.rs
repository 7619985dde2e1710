use std::collections::HashMap;

use scenescript_common::{ObjectId, Transform};

/// Errors from scene graph edits.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("scene object {0} not found")]
    NodeNotFound(ObjectId),
    #[error("the scene root cannot be removed")]
    RootRemoval,
}

/// One renderable node.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: ObjectId,
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

impl SceneNode {
    fn new(id: ObjectId, name: String, transform: Transform, parent: Option<ObjectId>) -> Self {
        Self {
            id,
            name,
            transform,
            visible: true,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }
}

/// Node tree owned by a scene record.
///
/// Children keep insertion order so traversal is deterministic.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    root: ObjectId,
    nodes: HashMap<ObjectId, SceneNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let root = ObjectId::new();
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            SceneNode::new(root, "root".into(), Transform::default(), None),
        );
        Self { root, nodes }
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// Number of nodes excluding the root.
    pub fn object_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Add a node directly under the root.
    pub fn add(&mut self, name: impl Into<String>, transform: Transform) -> ObjectId {
        let id = ObjectId::new();
        self.insert(id, self.root, name.into(), transform);
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(
        &mut self,
        parent: ObjectId,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<ObjectId, GraphError> {
        if !self.nodes.contains_key(&parent) {
            return Err(GraphError::NodeNotFound(parent));
        }
        let id = ObjectId::new();
        self.insert(id, parent, name.into(), transform);
        Ok(id)
    }

    fn insert(&mut self, id: ObjectId, parent: ObjectId, name: String, transform: Transform) {
        self.nodes
            .insert(id, SceneNode::new(id, name, transform, Some(parent)));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
    }

    /// Remove a node and its whole subtree. Returns the removed ids, parent first.
    pub fn remove(&mut self, id: ObjectId) -> Result<Vec<ObjectId>, GraphError> {
        if id == self.root {
            return Err(GraphError::RootRemoval);
        }
        let parent = self
            .nodes
            .get(&id)
            .ok_or(GraphError::NodeNotFound(id))?
            .parent;
        let removed = self.subtree(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }
        Ok(removed)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// First node (depth-first) with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.traverse().into_iter().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.name == name)
        })
    }

    pub fn set_transform(&mut self, id: ObjectId, transform: Transform) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Depth-first ids starting at the root.
    pub fn traverse(&self) -> Vec<ObjectId> {
        self.subtree(self.root)
    }

    fn subtree(&self, start: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Visible non-root nodes in traversal order.
    pub fn visible_objects(&self) -> impl Iterator<Item = &SceneNode> {
        self.traverse()
            .into_iter()
            .filter(move |id| *id != self.root)
            .filter_map(move |id| self.nodes.get(&id))
            .filter(|n| n.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn graph_starts_with_root_only() {
        let g = SceneGraph::new();
        assert_eq!(g.object_count(), 0);
        assert!(g.contains(g.root()));
    }

    #[test]
    fn add_and_find() {
        let mut g = SceneGraph::new();
        let lamp = g.add("lamp", Transform::from_position(Vec3::X));
        assert_eq!(g.find_by_name("lamp"), Some(lamp));
        assert_eq!(g.get(lamp).unwrap().parent(), Some(g.root()));
        assert_eq!(g.object_count(), 1);
    }

    #[test]
    fn add_child_to_missing_parent_fails() {
        let mut g = SceneGraph::new();
        let ghost = ObjectId::new();
        assert_eq!(
            g.add_child(ghost, "x", Transform::default()),
            Err(GraphError::NodeNotFound(ghost))
        );
    }

    #[test]
    fn remove_takes_subtree() {
        let mut g = SceneGraph::new();
        let room = g.add("room", Transform::default());
        let lamp = g.add_child(room, "lamp", Transform::default()).unwrap();
        let other = g.add("other", Transform::default());

        let removed = g.remove(room).unwrap();
        assert_eq!(removed, vec![room, lamp]);
        assert!(!g.contains(lamp));
        assert_eq!(g.get(g.root()).unwrap().children(), &[other]);
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut g = SceneGraph::new();
        let root = g.root();
        assert_eq!(g.remove(root), Err(GraphError::RootRemoval));
    }

    #[test]
    fn traversal_is_depth_first_in_insertion_order() {
        let mut g = SceneGraph::new();
        let a = g.add("a", Transform::default());
        let a1 = g.add_child(a, "a1", Transform::default()).unwrap();
        let b = g.add("b", Transform::default());
        assert_eq!(g.traverse(), vec![g.root(), a, a1, b]);
    }

    #[test]
    fn hidden_nodes_are_not_listed_as_visible() {
        let mut g = SceneGraph::new();
        let a = g.add("a", Transform::default());
        let b = g.add("b", Transform::default());
        g.get_mut(a).unwrap().visible = false;
        let visible: Vec<ObjectId> = g.visible_objects().map(|n| n.id).collect();
        assert_eq!(visible, vec![b]);
    }
}
