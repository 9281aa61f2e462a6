// ABOUTME: N-ary frame tree for pane layout, stored as an arena keyed by frame id.
// ABOUTME: Implements proportional sizing, positioning, and the split/close/exchange reshapes.

use ft_core::{Axis, Rect};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Identity of a frame within its tree
    pub struct FrameId;
}

#[derive(Debug)]
enum Content<W> {
    Leaf(W),
    Split {
        orientation: Axis,
        children: Vec<FrameId>,
    },
}

/// A node of the tree: a leaf holding one window, or a split holding children.
#[derive(Debug)]
pub struct Frame<W> {
    parent: Option<FrameId>,
    rect: Rect,
    content: Content<W>,
}

impl<W> Frame<W> {
    fn leaf(window: W, parent: Option<FrameId>) -> Self {
        Self {
            parent,
            rect: Rect::default(),
            content: Content::Leaf(window),
        }
    }

    pub fn parent(&self) -> Option<FrameId> {
        self.parent
    }

    /// Geometry from the most recent layout pass
    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn window(&self) -> Option<&W> {
        match &self.content {
            Content::Leaf(window) => Some(window),
            Content::Split { .. } => None,
        }
    }

    pub fn children(&self) -> &[FrameId] {
        match &self.content {
            Content::Leaf(_) => &[],
            Content::Split { children, .. } => children,
        }
    }

    /// Orientation of a split; None for a leaf
    pub fn orientation(&self) -> Option<Axis> {
        match &self.content {
            Content::Leaf(_) => None,
            Content::Split { orientation, .. } => Some(*orientation),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.content, Content::Leaf(_))
    }

    /// Split orientation and children, if this frame has at least one child
    fn split_children(&self) -> Option<(Axis, &[FrameId])> {
        match &self.content {
            Content::Split {
                orientation,
                children,
            } if !children.is_empty() => Some((*orientation, children)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Frame {0:?} does not exist")]
    UnknownFrame(FrameId),

    #[error("Frame {0:?} already has children")]
    NotALeaf(FrameId),

    #[error("Frame {0:?} has no window")]
    NoWindow(FrameId),

    #[error("Frame {0:?} is the root and cannot be closed")]
    RootFrame(FrameId),

    #[error("No window with id {0}")]
    UnknownWindow(crate::WindowId),

    #[error("No pane has focus")]
    NoFocus,
}

/// Result of a split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOutcome {
    /// The newly created leaf, always placed right after the split source
    pub new_leaf: FrameId,
    /// When the source was turned into a split node, the new frame now
    /// holding the source's window
    pub moved: Option<FrameId>,
}

/// Result of a close
#[derive(Debug)]
pub struct CloseOutcome<W> {
    /// The window that was hosted by the closed leaf
    pub window: W,
    /// Sibling that should receive focus, if any frame was left to take it
    pub focus: Option<FrameId>,
    /// Ancestors removed because closing left them without children
    pub collapsed: Vec<FrameId>,
}

#[derive(Debug)]
pub struct FrameTree<W> {
    frames: SlotMap<FrameId, Frame<W>>,
    root: FrameId,
}

impl<W> FrameTree<W> {
    /// Create a tree with a single leaf. `make` receives the leaf's id.
    pub fn new(make: impl FnOnce(FrameId) -> W) -> Self {
        let mut frames = SlotMap::with_key();
        let root = frames.insert_with_key(|key| Frame::leaf(make(key), None));
        Self { frames, root }
    }

    pub fn root(&self) -> FrameId {
        self.root
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame<W>> {
        self.frames.get(id)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(id)
    }

    pub fn window(&self, id: FrameId) -> Option<&W> {
        self.frames.get(id).and_then(Frame::window)
    }

    pub fn window_mut(&mut self, id: FrameId) -> Option<&mut W> {
        match &mut self.frames.get_mut(id)?.content {
            Content::Leaf(window) => Some(window),
            Content::Split { .. } => None,
        }
    }

    pub fn rect(&self, id: FrameId) -> Option<Rect> {
        self.frames.get(id).map(Frame::rect)
    }

    /// Number of frames, leaves and splits alike
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True once every leaf has been closed and only a bare root remains
    pub fn is_empty(&self) -> bool {
        self.frames[self.root].split_children().is_none() && !self.frames[self.root].is_leaf()
    }

    /// Leaf frames in depth-first, first-to-last order
    pub fn leaves(&self) -> Vec<FrameId> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: FrameId, out: &mut Vec<FrameId>) {
        let frame = &self.frames[id];
        if frame.is_leaf() {
            out.push(id);
        }
        for child in frame.children() {
            self.collect_leaves(*child, out);
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    /// Number of frames on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        self.depth_of(self.root)
    }

    fn depth_of(&self, id: FrameId) -> usize {
        1 + self.frames[id]
            .children()
            .iter()
            .map(|c| self.depth_of(*c))
            .max()
            .unwrap_or(0)
    }

    /// First leaf under `id`, following the first child at every split
    pub fn first_leaf(&self, id: FrameId) -> Option<FrameId> {
        let mut current = id;
        loop {
            let frame = self.frames.get(current)?;
            if frame.is_leaf() {
                return Some(current);
            }
            current = *frame.children().first()?;
        }
    }

    /// First leaf whose window matches the predicate
    pub fn find_leaf(&self, mut pred: impl FnMut(&W) -> bool) -> Option<FrameId> {
        self.leaves()
            .into_iter()
            .find(|id| self.window(*id).is_some_and(&mut pred))
    }

    /// Leaf whose last computed rectangle contains the point
    pub fn hit_test(&self, x: u32, y: u32) -> Option<FrameId> {
        self.leaves()
            .into_iter()
            .find(|id| self.frames[*id].rect.contains(x, y))
    }

    /// Check that `id` names a leaf, returning its window.
    pub fn leaf_window(&self, id: FrameId) -> Result<&W, LayoutError> {
        let frame = self.frames.get(id).ok_or(LayoutError::UnknownFrame(id))?;
        match &frame.content {
            Content::Leaf(window) => Ok(window),
            Content::Split { children, .. } if children.is_empty() => {
                Err(LayoutError::NoWindow(id))
            }
            Content::Split { .. } => Err(LayoutError::NotALeaf(id)),
        }
    }

    fn children_mut(&mut self, id: FrameId) -> Option<&mut Vec<FrameId>> {
        match &mut self.frames.get_mut(id)?.content {
            Content::Split { children, .. } => Some(children),
            Content::Leaf(_) => None,
        }
    }

    // -- Layout ----------------------------------------------------------------

    /// Number of equal-sized leaf units the frame needs along `axis`.
    pub fn count_splits(&self, id: FrameId, axis: Axis) -> Option<u32> {
        self.frames.get(id).map(|_| self.units(id, axis))
    }

    fn units(&self, id: FrameId, axis: Axis) -> u32 {
        let Some((orientation, children)) = self.frames[id].split_children() else {
            return 1;
        };
        let counts = children.iter().map(|c| self.units(*c, axis));
        if orientation == axis {
            counts.sum()
        } else {
            counts.max().unwrap_or(1)
        }
    }

    /// Propagate a per-unit size along `axis` from `id` downwards.
    ///
    /// Children laid out along `axis` each get one unit. Children laid out
    /// across it are stretched to the full span, the share being truncated
    /// to whole pixels.
    pub fn set_size(&mut self, id: FrameId, axis: Axis, unit: u32) -> Result<(), LayoutError> {
        if !self.frames.contains_key(id) {
            return Err(LayoutError::UnknownFrame(id));
        }
        self.size_pass(id, axis, unit);
        Ok(())
    }

    fn size_pass(&mut self, id: FrameId, axis: Axis, unit: u32) {
        let Some((orientation, children)) = self.frames[id]
            .split_children()
            .map(|(o, c)| (o, c.to_vec()))
        else {
            self.frames[id].rect.set_extent(axis, unit);
            return;
        };

        let max = self.units(id, axis);
        self.frames[id].rect.set_extent(axis, max.saturating_mul(unit));

        for child in children {
            let share = if orientation == axis {
                unit
            } else {
                stretch(unit, max, self.units(child, axis))
            };
            self.size_pass(child, axis, share);
        }
    }

    /// Place `id` at (x, y) and lay its children out contiguously along its orientation.
    pub fn set_position(&mut self, id: FrameId, x: u32, y: u32) -> Result<(), LayoutError> {
        if !self.frames.contains_key(id) {
            return Err(LayoutError::UnknownFrame(id));
        }
        self.position_pass(id, x, y);
        Ok(())
    }

    fn position_pass(&mut self, id: FrameId, mut x: u32, mut y: u32) {
        let frame = &mut self.frames[id];
        frame.rect.x = x;
        frame.rect.y = y;
        let Some((orientation, children)) = frame.split_children().map(|(o, c)| (o, c.to_vec()))
        else {
            return;
        };

        for child in children {
            self.position_pass(child, x, y);
            let rect = self.frames[child].rect;
            match orientation {
                Axis::Horizontal => x = x.saturating_add(rect.width),
                Axis::Vertical => y = y.saturating_add(rect.height),
            }
        }
    }

    /// Full layout pass over a `width` x `height` area anchored at the origin.
    ///
    /// Each axis gets its own unit size (area extent divided by the root's
    /// unit count), so the root ends up `units * unit` wide and high; any
    /// remainder pixels are left unused.
    pub fn layout(&mut self, width: u32, height: u32) {
        for (axis, extent) in [(Axis::Horizontal, width), (Axis::Vertical, height)] {
            let unit = extent / self.units(self.root, axis);
            self.size_pass(self.root, axis, unit);
        }
        self.position_pass(self.root, 0, 0);
    }

    // -- Reshaping -------------------------------------------------------------

    /// Split leaf `id` along `orientation`.
    ///
    /// If the parent already splits along `orientation` the new leaf becomes
    /// the next sibling. Otherwise `id` keeps its identity but turns into a
    /// split node whose children are a new frame holding the old window and
    /// the new leaf. `make` receives the new leaf's id and is only called
    /// once all preconditions hold.
    pub fn split(
        &mut self,
        id: FrameId,
        orientation: Axis,
        make: impl FnOnce(FrameId) -> W,
    ) -> Result<SplitOutcome, LayoutError> {
        self.leaf_window(id)?;
        let parent = self.frames[id].parent;

        if let Some(parent) =
            parent.filter(|p| self.frames[*p].orientation() == Some(orientation))
        {
            let new_leaf = self
                .frames
                .insert_with_key(|key| Frame::leaf(make(key), Some(parent)));
            if let Some(children) = self.children_mut(parent) {
                let at = children
                    .iter()
                    .position(|c| *c == id)
                    .map_or(children.len(), |i| i + 1);
                children.insert(at, new_leaf);
            }
            self.debug_check();
            return Ok(SplitOutcome {
                new_leaf,
                moved: None,
            });
        }

        let placeholder = Content::Split {
            orientation,
            children: Vec::new(),
        };
        let window = match std::mem::replace(&mut self.frames[id].content, placeholder) {
            Content::Leaf(window) => window,
            other => {
                self.frames[id].content = other;
                return Err(LayoutError::NotALeaf(id));
            }
        };
        let moved = self.frames.insert(Frame::leaf(window, Some(id)));
        let new_leaf = self
            .frames
            .insert_with_key(|key| Frame::leaf(make(key), Some(id)));
        self.frames[id].content = Content::Split {
            orientation,
            children: vec![moved, new_leaf],
        };
        self.debug_check();
        Ok(SplitOutcome {
            new_leaf,
            moved: Some(moved),
        })
    }

    /// Close leaf `id`, collapsing ancestors left without children.
    ///
    /// The focus candidate is the sibling that took the removed index, or the
    /// previous one when the removed frame was last. Collapsing stops at the
    /// root, which may be left empty.
    pub fn close(&mut self, id: FrameId) -> Result<CloseOutcome<W>, LayoutError> {
        self.leaf_window(id)?;
        let Some(mut parent) = self.frames[id].parent else {
            return Err(LayoutError::RootFrame(id));
        };
        let Some(Frame {
            content: Content::Leaf(window),
            ..
        }) = self.frames.remove(id)
        else {
            return Err(LayoutError::UnknownFrame(id));
        };

        let mut collapsed = Vec::new();
        let mut node = id;
        let focus = loop {
            let Some(children) = self.children_mut(parent) else {
                break None;
            };
            let index = children.iter().position(|c| *c == node);
            if let Some(i) = index {
                children.remove(i);
            }
            if !children.is_empty() {
                let i = index.unwrap_or(0).min(children.len() - 1);
                break Some(children[i]);
            }

            // An emptied root stays in place.
            let Some(grandparent) = self.frames[parent].parent else {
                break None;
            };
            self.frames.remove(parent);
            collapsed.push(parent);
            node = parent;
            parent = grandparent;
        };

        self.debug_check();
        Ok(CloseOutcome {
            window,
            focus,
            collapsed,
        })
    }

    /// Swap `id` with its next sibling, or its previous one when it is last.
    ///
    /// A frame without siblings hands the request to its parent, repeating up
    /// the tree. Returns the frame that actually moved, or None when the root
    /// was reached without finding siblings.
    pub fn exchange(&mut self, id: FrameId) -> Result<Option<FrameId>, LayoutError> {
        if !self.frames.contains_key(id) {
            return Err(LayoutError::UnknownFrame(id));
        }
        let mut node = id;
        loop {
            let Some(parent) = self.frames[node].parent else {
                return Ok(None);
            };
            let Some(children) = self.children_mut(parent) else {
                return Ok(None);
            };
            if children.len() < 2 {
                node = parent;
                continue;
            }
            let Some(i) = children.iter().position(|c| *c == node) else {
                return Ok(None);
            };
            let j = if i + 1 == children.len() { i - 1 } else { i + 1 };
            children.swap(i, j);
            return Ok(Some(node));
        }
    }

    // -- Invariants ------------------------------------------------------------

    /// Verify the structural invariants, describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.frames[self.root].parent.is_some() {
            return Err("root has a parent".to_string());
        }
        let mut seen = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(frame) = self.frames.get(id) else {
                return Err(format!("{id:?} is referenced but missing"));
            };
            seen += 1;
            if seen > self.frames.len() {
                return Err("frame referenced from more than one parent".to_string());
            }
            if id != self.root && !frame.is_leaf() && frame.children().is_empty() {
                return Err(format!("{id:?} is a split without children"));
            }
            for child in frame.children() {
                match self.frames.get(*child) {
                    Some(c) if c.parent == Some(id) => stack.push(*child),
                    Some(_) => return Err(format!("{child:?} does not point back to {id:?}")),
                    None => return Err(format!("{child:?} is referenced but missing")),
                }
            }
        }
        if seen != self.frames.len() {
            return Err(format!(
                "{} frames unreachable from the root",
                self.frames.len() - seen
            ));
        }
        Ok(())
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()));
    }
}

/// Per-unit size for a child needing `units` of a `max`-unit span
fn stretch(unit: u32, max: u32, units: u32) -> u32 {
    let share = u64::from(unit) * u64::from(max) / u64::from(units.max(1));
    u32::try_from(share).unwrap_or(u32::MAX)
}
