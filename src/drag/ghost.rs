//! Drag preview ("ghost image") synthesis
//!
//! A ghost is a clone of the dragged element, attached off-screen so the
//! platform can capture it as the drag image. Only one ghost exists at a
//! time; every ghost carries [`GHOST_CLASS`] so leftovers can be swept.

use egui::{Pos2, Rect, Vec2};
use std::fmt::Debug;
use tracing::{debug, warn};

/// Marker class carried by every ghost element
pub const GHOST_CLASS: &str = "drag-ghost";
/// Extra class for previews of library items
pub const TEMPLATE_CLASS: &str = "template";
/// Vertical position that keeps the ghost out of the viewport
pub const OFFSCREEN_TOP: f32 = -9999.0;

/// The operations the synthesizer needs from a rendered document
pub trait DragDocument {
    type Node: Copy + Eq + Debug;

    /// Measured box of `node` in client coordinates
    fn bounding_rect(&self, node: Self::Node) -> Rect;
    /// Detached copy of `node`; children are copied only when `deep`
    fn clone_node(&mut self, node: Self::Node, deep: bool) -> Self::Node;
    fn add_class(&mut self, node: Self::Node, class: &str);
    fn set_title(&mut self, node: Self::Node, title: &str);
    /// Force an explicit pixel width and height
    fn set_fixed_size(&mut self, node: Self::Node, size: Vec2);
    /// Absolute positioning at `top` pixels
    fn place_at_top(&mut self, node: Self::Node, top: f32);
    fn append_to_body(&mut self, node: Self::Node);
    fn remove(&mut self, node: Self::Node);
    /// Attached nodes carrying `class`
    fn nodes_with_class(&self, class: &str) -> Vec<Self::Node>;
    /// Register `node` as the drag image, anchored at `offset`
    fn set_drag_image(&mut self, node: Self::Node, offset: Vec2);
}

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// An element already placed on the canvas
    WorkspaceElement,
    /// A template dragged from the library palette
    LibraryItem,
}

impl DragMode {
    fn deep_clone(&self) -> bool {
        matches!(self, DragMode::LibraryItem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhostImageSpec<N> {
    pub source: N,
    pub ghost: N,
    pub mode: DragMode,
    /// Pointer position relative to the source's top-left corner
    pub pointer_offset: Vec2,
    /// Explicit size forced on the ghost, workspace elements only
    pub fixed_size: Option<Vec2>,
}

/// Anchor offset that keeps the preview under the cursor at the grab point
pub fn pointer_offset(source_rect: Rect, pointer: Pos2) -> Vec2 {
    pointer - source_rect.min
}

/// Owner of the single active ghost
#[derive(Debug)]
pub struct GhostImages<N> {
    active: Option<N>,
}

impl<N> Default for GhostImages<N> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<N: Copy + Eq + Debug> GhostImages<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Build and register the drag preview for a drag starting at `pointer`
    pub fn begin<D>(&mut self, doc: &mut D, source: N, mode: DragMode, pointer: Pos2) -> GhostImageSpec<N>
    where
        D: DragDocument<Node = N>,
    {
        let stale = doc.nodes_with_class(GHOST_CLASS);
        if self.active.is_some() || !stale.is_empty() {
            warn!(count = stale.len(), "Drag started while a ghost image was still attached, removing it");
            for node in stale {
                doc.remove(node);
            }
            self.active = None;
        }

        let rect = doc.bounding_rect(source);
        let offset = pointer_offset(rect, pointer);

        let ghost = doc.clone_node(source, mode.deep_clone());
        doc.add_class(ghost, GHOST_CLASS);
        if mode == DragMode::LibraryItem {
            doc.add_class(ghost, TEMPLATE_CLASS);
        }
        doc.set_title(ghost, "");

        let fixed_size = match mode {
            DragMode::WorkspaceElement => {
                let size = rect.size();
                doc.set_fixed_size(ghost, size);
                Some(size)
            }
            DragMode::LibraryItem => None,
        };

        // Must be in the document when the platform captures the image
        doc.place_at_top(ghost, OFFSCREEN_TOP);
        doc.append_to_body(ghost);
        doc.set_drag_image(ghost, offset);

        debug!(?mode, dx = offset.x, dy = offset.y, "Ghost image attached");
        self.active = Some(ghost);

        GhostImageSpec {
            source,
            ghost,
            mode,
            pointer_offset: offset,
            fixed_size,
        }
    }

    /// Remove this drag's ghost, then any other marked element except the
    /// ghost of a drag still in progress
    pub fn end<D>(&mut self, doc: &mut D, spec: GhostImageSpec<N>)
    where
        D: DragDocument<Node = N>,
    {
        doc.remove(spec.ghost);
        if self.active == Some(spec.ghost) {
            self.active = None;
        } else {
            debug!("Drag end for a ghost that is no longer active");
        }

        let leaked: Vec<N> = doc
            .nodes_with_class(GHOST_CLASS)
            .into_iter()
            .filter(|node| Some(*node) != self.active)
            .collect();
        if !leaked.is_empty() {
            warn!(count = leaked.len(), "Removing leaked ghost images");
            for node in leaked {
                doc.remove(node);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::scene::SceneDocument;
    use egui::{pos2, vec2};

    fn card(doc: &mut SceneDocument) -> crate::drag::scene::NodeId {
        let body = doc.body();
        let card = doc.add_element(body, "div", Rect::from_min_size(pos2(50.0, 100.0), vec2(200.0, 80.0)));
        doc.add_class(card, "card");
        doc.set_title(card, "Drag me");
        doc.add_element(card, "span", Rect::from_min_size(pos2(60.0, 110.0), vec2(40.0, 20.0)));
        card
    }

    #[test]
    fn test_pointer_offset() {
        let rect = Rect::from_min_size(pos2(50.0, 100.0), vec2(10.0, 10.0));
        assert_eq!(pointer_offset(rect, pos2(70.0, 130.0)), vec2(20.0, 30.0));
    }

    #[test]
    fn test_workspace_element_is_shallow_and_sized() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let spec = ghosts.begin(&mut doc, source, DragMode::WorkspaceElement, pos2(70.0, 130.0));

        assert_eq!(spec.pointer_offset, vec2(20.0, 30.0));
        assert_eq!(spec.fixed_size, Some(vec2(200.0, 80.0)));

        let ghost = doc.node(spec.ghost).unwrap();
        assert_eq!(ghost.fixed_size, Some(vec2(200.0, 80.0)));
        assert!(ghost.children.is_empty());
        assert!(ghost.has_class(GHOST_CLASS));
        assert!(!ghost.has_class(TEMPLATE_CLASS));
    }

    #[test]
    fn test_library_item_is_deep_and_unsized() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let spec = ghosts.begin(&mut doc, source, DragMode::LibraryItem, pos2(55.0, 101.0));

        assert_eq!(spec.fixed_size, None);
        let ghost = doc.node(spec.ghost).unwrap();
        assert_eq!(ghost.fixed_size, None);
        assert_eq!(ghost.children.len(), 1);
        assert!(ghost.has_class(TEMPLATE_CLASS));
        assert!(ghost.has_class("card"));
    }

    #[test]
    fn test_ghost_is_offscreen_untitled_and_registered() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let spec = ghosts.begin(&mut doc, source, DragMode::WorkspaceElement, pos2(70.0, 130.0));

        let ghost = doc.node(spec.ghost).unwrap();
        assert_eq!(ghost.top, Some(OFFSCREEN_TOP));
        assert_eq!(ghost.title, "");
        assert!(doc.is_attached(spec.ghost));
        assert_eq!(doc.drag_image(), Some((spec.ghost, vec2(20.0, 30.0))));
        // Source untouched
        assert_eq!(doc.node(source).unwrap().title, "Drag me");
        assert!(!doc.node(source).unwrap().has_class(GHOST_CLASS));
    }

    #[test]
    fn test_exactly_one_ghost_during_drag_none_after() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        assert_eq!(doc.nodes_with_class(GHOST_CLASS).len(), 0);
        let spec = ghosts.begin(&mut doc, source, DragMode::LibraryItem, pos2(60.0, 120.0));
        assert_eq!(doc.nodes_with_class(GHOST_CLASS).len(), 1);
        assert!(ghosts.is_active());

        ghosts.end(&mut doc, spec);
        assert_eq!(doc.nodes_with_class(GHOST_CLASS).len(), 0);
        assert!(!ghosts.is_active());
        assert!(!doc.is_attached(spec.ghost));
    }

    #[test]
    fn test_second_begin_sweeps_stale_ghost() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let first = ghosts.begin(&mut doc, source, DragMode::WorkspaceElement, pos2(60.0, 120.0));
        let second = ghosts.begin(&mut doc, source, DragMode::LibraryItem, pos2(60.0, 120.0));

        assert_eq!(doc.nodes_with_class(GHOST_CLASS), vec![second.ghost]);
        assert!(!doc.is_attached(first.ghost));

        ghosts.end(&mut doc, second);
        assert!(doc.nodes_with_class(GHOST_CLASS).is_empty());
    }

    #[test]
    fn test_end_sweeps_leaked_ghosts() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let spec = ghosts.begin(&mut doc, source, DragMode::WorkspaceElement, pos2(60.0, 120.0));

        // Something outside the synthesizer leaves a marked element behind
        let body = doc.body();
        let leaked = doc.add_element(body, "div", Rect::NOTHING);
        doc.add_class(leaked, GHOST_CLASS);
        assert_eq!(doc.nodes_with_class(GHOST_CLASS).len(), 2);

        ghosts.end(&mut doc, spec);
        assert!(doc.nodes_with_class(GHOST_CLASS).is_empty());
    }

    #[test]
    fn test_late_end_keeps_live_ghost() {
        let mut doc = SceneDocument::new();
        let source = card(&mut doc);
        let mut ghosts = GhostImages::new();

        let first = ghosts.begin(&mut doc, source, DragMode::WorkspaceElement, pos2(60.0, 120.0));
        let second = ghosts.begin(&mut doc, source, DragMode::LibraryItem, pos2(60.0, 120.0));

        // Drag-end for the first gesture arrives after the second started
        ghosts.end(&mut doc, first);
        assert!(doc.is_attached(second.ghost));
        assert_eq!(doc.nodes_with_class(GHOST_CLASS), vec![second.ghost]);
        assert!(ghosts.is_active());

        ghosts.end(&mut doc, second);
        assert!(doc.nodes_with_class(GHOST_CLASS).is_empty());
        assert!(!ghosts.is_active());
    }
}
