//! In-memory document used as the drag target when no rendering engine is
//! attached, and by tests

use super::ghost::DragDocument;
use egui::{Rect, Vec2};

/// Slot index plus the generation it was issued for. Ids of removed nodes
/// never resolve again, even after their slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct SceneNode {
    pub tag: String,
    pub classes: Vec<String>,
    pub title: String,
    pub rect: Rect,
    /// Explicit width/height style, if forced
    pub fixed_size: Option<Vec2>,
    /// Absolute `top` style, if positioned
    pub top: Option<f32>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SceneNode {
    fn new(tag: &str, rect: Rect) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            title: String::new(),
            rect,
            fixed_size: None,
            top: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Node arena rooted at a `body` element. Removing a node frees it and its
/// descendants; freed slots are reused.
#[derive(Debug)]
pub struct SceneDocument {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
    drag_image: Option<(NodeId, Vec2)>,
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneDocument {
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(SceneNode::new("body", Rect::EVERYTHING)),
            }],
            free: Vec::new(),
            body: NodeId { index: 0, generation: 0 },
            drag_image: None,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// The live node behind `id`, `None` once removed
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Live nodes, body included
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Create an element under `parent`
    pub fn add_element(&mut self, parent: NodeId, tag: &str, rect: Rect) -> NodeId {
        let id = self.insert(SceneNode::new(tag, rect));
        self.attach(parent, id);
        id
    }

    /// Whether `id` is live and reachable from the body
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.body {
                return true;
            }
            current = self.node(node).and_then(|n| n.parent);
        }
        false
    }

    /// The registered drag image and its anchor offset
    pub fn drag_image(&self) -> Option<(NodeId, Vec2)> {
        self.drag_image
    }

    fn insert(&mut self, node: SceneNode) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        if self.node(parent).is_none() {
            return;
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else { return };
        let children = node.children.clone();
        for child in children {
            self.free_subtree(child);
        }
        let slot = &mut self.slots[id.index];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    fn copy_subtree(&mut self, node: NodeId, deep: bool) -> NodeId {
        let Some(original) = self.node(node) else {
            return self.insert(SceneNode::new("div", Rect::NOTHING));
        };
        let mut copy = original.clone();
        let children = std::mem::take(&mut copy.children);
        copy.parent = None;
        let copy_id = self.insert(copy);

        if deep {
            for child in children {
                let child_copy = self.copy_subtree(child, true);
                self.attach(copy_id, child_copy);
            }
        }
        copy_id
    }
}

impl DragDocument for SceneDocument {
    type Node = NodeId;

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.node(node).map_or(Rect::NOTHING, |n| n.rect)
    }

    fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        self.copy_subtree(node, deep)
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(node) = self.node_mut(node) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    fn set_title(&mut self, node: NodeId, title: &str) {
        if let Some(node) = self.node_mut(node) {
            node.title = title.to_string();
        }
    }

    fn set_fixed_size(&mut self, node: NodeId, size: Vec2) {
        if let Some(node) = self.node_mut(node) {
            node.fixed_size = Some(size);
        }
    }

    fn place_at_top(&mut self, node: NodeId, top: f32) {
        if let Some(node) = self.node_mut(node) {
            node.top = Some(top);
            node.rect = node.rect.translate(Vec2::new(0.0, top - node.rect.min.y));
        }
    }

    fn append_to_body(&mut self, node: NodeId) {
        if self.node(node).is_some_and(|n| n.parent.is_none()) {
            let body = self.body;
            self.attach(body, node);
        }
    }

    fn remove(&mut self, node: NodeId) {
        if node == self.body {
            return;
        }
        if let Some(parent) = self.node_mut(node).and_then(|n| n.parent.take()) {
            if let Some(parent) = self.node_mut(parent) {
                parent.children.retain(|c| *c != node);
            }
        }
        if matches!(self.drag_image, Some((image, _)) if image == node) {
            self.drag_image = None;
        }
        self.free_subtree(node);
    }

    fn nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.node.as_ref()?;
                let id = NodeId {
                    index,
                    generation: slot.generation,
                };
                (node.has_class(class) && self.is_attached(id)).then_some(id)
            })
            .collect()
    }

    fn set_drag_image(&mut self, node: NodeId, offset: Vec2) {
        self.drag_image = Some((node, offset));
    }
}
