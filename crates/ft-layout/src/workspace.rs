// ABOUTME: One top-level window's pane tree together with its windows and focus.
// ABOUTME: Runs split/close/exchange, re-lays out the whole tree, then resolves focus.

use std::sync::Arc;

use ft_core::{Axis, PaneCommand, Rect};

use crate::tree::{FrameTree, LayoutError};
use crate::window::{Platform, Surface, Window};
use crate::{FrameId, WindowId, WindowRegistry};

pub struct Workspace<P: Platform> {
    platform: P,
    container: P::Container,
    registry: Arc<WindowRegistry<P::Buffer>>,
    tree: FrameTree<Window<P>>,
    focused: Option<FrameId>,
    width: u32,
    height: u32,
}

impl<P: Platform> Workspace<P> {
    /// Open a workspace showing `buffer` in a single pane of `width` x `height` pixels.
    pub fn new(
        mut platform: P,
        container: P::Container,
        registry: Arc<WindowRegistry<P::Buffer>>,
        buffer: P::Buffer,
        width: u32,
        height: u32,
    ) -> Self {
        let tree = FrameTree::new(|frame| {
            Window::open(&mut platform, &container, &registry, frame, buffer)
        });
        let root = tree.root();
        let mut workspace = Self {
            platform,
            container,
            registry,
            tree,
            focused: None,
            width,
            height,
        };
        workspace.relayout();
        workspace.set_focus(root);
        workspace
    }

    // -- Mutators --------------------------------------------------------------

    /// Split the focused pane. The new pane shows the same buffer and takes focus.
    pub fn split(&mut self, orientation: Axis) -> Result<WindowId, LayoutError> {
        let focused = self.focused.ok_or(LayoutError::NoFocus)?;
        self.split_frame(focused, orientation)
    }

    pub fn split_frame(&mut self, id: FrameId, orientation: Axis) -> Result<WindowId, LayoutError> {
        let buffer = self.tree.leaf_window(id)?.buffer().clone();

        let platform = &mut self.platform;
        let container = &self.container;
        let registry = &self.registry;
        let outcome = self.tree.split(id, orientation, |frame| {
            Window::open(platform, container, registry, frame, buffer)
        })?;

        if let Some(moved) = outcome.moved {
            if let Some(window) = self.tree.window_mut(moved) {
                window.set_frame(moved);
            }
        }
        let new_window = self
            .tree
            .window(outcome.new_leaf)
            .map(Window::id)
            .ok_or(LayoutError::NoWindow(outcome.new_leaf))?;
        tracing::info!(
            "Split {:?} {}, added {}, total panes: {}",
            id,
            orientation.label(),
            new_window,
            self.pane_count()
        );

        self.relayout();
        self.set_focus(outcome.new_leaf);
        self.debug_check();
        Ok(new_window)
    }

    /// Close the focused pane. Returns the leaf that received focus, if any.
    pub fn close(&mut self) -> Result<Option<FrameId>, LayoutError> {
        let focused = self.focused.ok_or(LayoutError::NoFocus)?;
        self.close_frame(focused)
    }

    pub fn close_frame(&mut self, id: FrameId) -> Result<Option<FrameId>, LayoutError> {
        let mut outcome = self.tree.close(id)?;
        let window = &mut outcome.window;
        self.registry.unregister(window.id());
        window.view_mut().hide();
        tracing::info!(
            "Closed {} ({} ancestors collapsed), remaining panes: {}",
            window.id(),
            outcome.collapsed.len(),
            self.pane_count()
        );

        self.relayout();
        self.focused = None;
        let focus = outcome.focus.and_then(|frame| self.set_focus(frame));
        self.debug_check();
        Ok(focus)
    }

    /// Swap the focused pane with its neighbour. Returns the leaf that received focus.
    pub fn exchange(&mut self) -> Result<Option<FrameId>, LayoutError> {
        let focused = self.focused.ok_or(LayoutError::NoFocus)?;
        self.exchange_frame(focused)
    }

    pub fn exchange_frame(&mut self, id: FrameId) -> Result<Option<FrameId>, LayoutError> {
        let Some(moved) = self.tree.exchange(id)? else {
            tracing::debug!("Nothing to exchange {:?} with", id);
            return Ok(None);
        };
        tracing::info!("Exchanged {:?} with its sibling", moved);
        self.relayout();
        let focus = self.set_focus(moved);
        self.debug_check();
        Ok(focus)
    }

    /// Run a key-bound command against the focused pane
    pub fn apply(&mut self, command: PaneCommand) -> Result<(), LayoutError> {
        match command.split_axis() {
            Some(axis) => self.split(axis).map(drop),
            None if command == PaneCommand::Close => self.close().map(drop),
            None => self.exchange().map(drop),
        }
    }

    /// Verify every leaf's window points back at the leaf hosting it.
    pub fn check_bindings(&self) -> Result<(), String> {
        for leaf in self.tree.leaves() {
            let window = self.tree.leaf_window(leaf).map_err(|e| e.to_string())?;
            if window.frame() != leaf {
                return Err(format!(
                    "{} is hosted by {:?} but bound to {:?}",
                    window.id(),
                    leaf,
                    window.frame()
                ));
            }
        }
        Ok(())
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_bindings(), Ok(()));
    }

    // -- Focus -----------------------------------------------------------------

    /// Focus the first leaf under `frame`. Returns the leaf that was activated.
    pub fn set_focus(&mut self, frame: FrameId) -> Option<FrameId> {
        let leaf = self.tree.first_leaf(frame)?;
        let window = self.tree.window_mut(leaf)?;
        window.view_mut().set_focus();
        tracing::debug!("Focus on {}", window.id());
        self.focused = Some(leaf);
        Some(leaf)
    }

    /// Focus the pane under a point, as for a mouse click
    pub fn focus_at(&mut self, x: u32, y: u32) -> Option<FrameId> {
        let leaf = self.tree.hit_test(x, y)?;
        if Some(leaf) == self.focused {
            return Some(leaf);
        }
        self.set_focus(leaf)
    }

    pub fn focused_frame(&self) -> Option<FrameId> {
        self.focused
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        self.focused
            .and_then(|frame| self.tree.window(frame))
            .map(Window::id)
    }

    // -- Layout ----------------------------------------------------------------

    /// Equalize every pane over the viewport and push the geometry to the surfaces.
    pub fn relayout(&mut self) {
        self.tree.layout(self.width, self.height);
        for leaf in self.tree.leaves() {
            let Some(rect) = self.tree.rect(leaf) else {
                continue;
            };
            if let Some(window) = self.tree.window_mut(leaf) {
                window.view_mut().resize(rect);
            }
        }
        tracing::debug!(
            "Laid out {} panes over {}x{}",
            self.pane_count(),
            self.width,
            self.height
        );
    }

    /// The top-level window changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.relayout();
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn geometry(&self, frame: FrameId) -> Option<Rect> {
        self.tree.rect(frame)
    }

    pub fn window_geometry(&self, id: WindowId) -> Option<Rect> {
        self.frame_of(id).and_then(|frame| self.tree.rect(frame))
    }

    // -- Windows ---------------------------------------------------------------

    /// Show `buffer` in window `id`
    pub fn load_buffer(&mut self, id: WindowId, buffer: P::Buffer) -> Result<(), LayoutError> {
        let frame = self.frame_of(id).ok_or(LayoutError::UnknownWindow(id))?;
        let window = self
            .tree
            .window_mut(frame)
            .ok_or(LayoutError::UnknownWindow(id))?;
        window.load_buffer(buffer.clone());
        self.registry.rebind(id, buffer);
        tracing::debug!("Loaded buffer into {}", id);
        Ok(())
    }

    /// Scroll the focused pane's surface. Returns false when nothing has focus.
    pub fn scroll(&mut self, dx: i32, dy: i32) -> bool {
        match self.focused.and_then(|frame| self.tree.window_mut(frame)) {
            Some(window) => {
                window.view_mut().scroll(dx, dy);
                true
            }
            None => false,
        }
    }

    pub fn frame_of(&self, id: WindowId) -> Option<FrameId> {
        self.tree.find_leaf(|window| window.id() == id)
    }

    pub fn window(&self, id: WindowId) -> Option<&Window<P>> {
        self.frame_of(id).and_then(|frame| self.tree.window(frame))
    }

    /// Window ids in pane order
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.tree
            .leaves()
            .into_iter()
            .filter_map(|leaf| self.tree.window(leaf).map(Window::id))
            .collect()
    }

    pub fn pane_count(&self) -> usize {
        self.tree.leaf_count()
    }

    /// True once the last pane has been closed
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn tree(&self) -> &FrameTree<Window<P>> {
        &self.tree
    }

    pub fn registry(&self) -> &Arc<WindowRegistry<P::Buffer>> {
        &self.registry
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn container(&self) -> &P::Container {
        &self.container
    }
}

impl<P: Platform> Drop for Workspace<P> {
    fn drop(&mut self) {
        for id in self.window_ids() {
            self.registry.unregister(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Parent(&'static str),
        Bind(&'static str),
        Show,
        Hide,
        Scroll(i32, i32),
        Focus,
        Resize(Rect),
    }

    type Log = Rc<RefCell<Vec<(u32, Call)>>>;

    #[derive(Default)]
    struct TestPlatform {
        next: u32,
        log: Log,
    }

    struct TestSurface {
        id: u32,
        log: Log,
    }

    impl TestSurface {
        fn record(&self, call: Call) {
            self.log.borrow_mut().push((self.id, call));
        }
    }

    impl Surface for TestSurface {
        type Buffer = &'static str;
        type Container = &'static str;

        fn set_parent(&mut self, container: &&'static str) {
            self.record(Call::Parent(*container));
        }
        fn bind_buffer(&mut self, buffer: &&'static str) {
            self.record(Call::Bind(*buffer));
        }
        fn show(&mut self) {
            self.record(Call::Show);
        }
        fn hide(&mut self) {
            self.record(Call::Hide);
        }
        fn scroll(&mut self, dx: i32, dy: i32) {
            self.record(Call::Scroll(dx, dy));
        }
        fn set_focus(&mut self) {
            self.record(Call::Focus);
        }
        fn resize(&mut self, rect: Rect) {
            self.record(Call::Resize(rect));
        }
    }

    impl Platform for TestPlatform {
        type Buffer = &'static str;
        type Container = &'static str;
        type Surface = TestSurface;

        fn create_surface(&mut self) -> TestSurface {
            let id = self.next;
            self.next += 1;
            TestSurface {
                id,
                log: Rc::clone(&self.log),
            }
        }
    }

    fn workspace() -> Workspace<TestPlatform> {
        Workspace::new(
            TestPlatform::default(),
            "main",
            Arc::new(WindowRegistry::new()),
            "scratch",
            800,
            600,
        )
    }

    fn calls(ws: &Workspace<TestPlatform>) -> Vec<(u32, Call)> {
        ws.platform().log.borrow().clone()
    }

    fn clear(ws: &Workspace<TestPlatform>) {
        ws.platform().log.borrow_mut().clear();
    }

    fn rects(ws: &Workspace<TestPlatform>) -> Vec<Rect> {
        ws.window_ids()
            .into_iter()
            .map(|id| ws.window_geometry(id).unwrap())
            .collect()
    }

    #[test]
    fn new_workspace_opens_and_focuses_root_window() {
        let ws = workspace();
        assert_eq!(ws.pane_count(), 1);
        assert_eq!(ws.registry().len(), 1);
        assert_eq!(ws.focused_frame(), Some(ws.tree().root()));
        assert_eq!(
            calls(&ws),
            vec![
                (0, Call::Parent("main")),
                (0, Call::Bind("scratch")),
                (0, Call::Show),
                (0, Call::Resize(Rect::new(0, 0, 800, 600))),
                (0, Call::Focus),
            ]
        );
    }

    #[test]
    fn split_close_exchange_scenario() {
        let mut ws = workspace();
        let w0 = ws.focused_window().unwrap();

        let w1 = ws.split(Axis::Horizontal).unwrap();
        assert_eq!(ws.window_ids(), vec![w0, w1]);
        assert_eq!(ws.focused_window(), Some(w1));
        assert_eq!(
            rects(&ws),
            vec![Rect::new(0, 0, 400, 600), Rect::new(400, 0, 400, 600)]
        );
        assert_eq!(ws.window(w1).unwrap().buffer(), &"scratch");

        let w2 = ws.split(Axis::Vertical).unwrap();
        assert_eq!(ws.window_ids(), vec![w0, w1, w2]);
        assert_eq!(ws.focused_window(), Some(w2));
        assert_eq!(
            rects(&ws),
            vec![
                Rect::new(0, 0, 400, 600),
                Rect::new(400, 0, 400, 300),
                Rect::new(400, 300, 400, 300),
            ]
        );

        let focus = ws.close().unwrap();
        assert_eq!(focus, ws.frame_of(w1));
        assert_eq!(ws.focused_window(), Some(w1));
        assert!(!ws.registry().contains(w2));
        assert_eq!(
            rects(&ws),
            vec![Rect::new(0, 0, 400, 600), Rect::new(400, 0, 400, 600)]
        );

        let left = ws.frame_of(w0).unwrap();
        ws.set_focus(left);
        ws.exchange().unwrap();
        assert_eq!(ws.window_ids(), vec![w1, w0]);
        assert_eq!(ws.window_geometry(w0), Some(Rect::new(400, 0, 400, 600)));
        assert_eq!(ws.window_geometry(w1), Some(Rect::new(0, 0, 400, 600)));
        assert_eq!(ws.focused_window(), Some(w0));
        assert_eq!(ws.check_bindings(), Ok(()));
    }

    #[test]
    fn windows_stay_bound_to_their_leaves() {
        let mut ws = workspace();
        ws.split(Axis::Horizontal).unwrap();
        ws.split(Axis::Vertical).unwrap();
        ws.split(Axis::Vertical).unwrap();
        assert_eq!(ws.check_bindings(), Ok(()));
        ws.exchange().unwrap();
        assert_eq!(ws.check_bindings(), Ok(()));
        ws.close().unwrap();
        ws.close().unwrap();
        assert_eq!(ws.check_bindings(), Ok(()));

        for id in ws.window_ids() {
            let frame = ws.window(id).unwrap().frame();
            assert_eq!(ws.frame_of(id), Some(frame));
            assert!(ws.tree().get(frame).unwrap().is_leaf());
        }
    }

    #[test]
    fn stale_window_frame_is_detected() {
        let mut ws = workspace();
        let root = ws.tree().root();
        let w1 = ws.split(Axis::Horizontal).unwrap();
        let leaf = ws.frame_of(w1).unwrap();
        ws.tree.window_mut(leaf).unwrap().set_frame(root);

        let err = ws.check_bindings().unwrap_err();
        assert!(err.contains(&w1.to_string()), "{err}");
    }

    #[test]
    fn split_updates_moved_window_frame() {
        let mut ws = workspace();
        let w0 = ws.focused_window().unwrap();
        let root = ws.tree().root();
        ws.split(Axis::Vertical).unwrap();

        let frame = ws.window(w0).unwrap().frame();
        assert_ne!(frame, root);
        assert_eq!(ws.frame_of(w0), Some(frame));
        assert_eq!(ws.tree().get(frame).unwrap().parent(), Some(root));
    }

    #[test]
    fn split_rejects_internal_frame() {
        let mut ws = workspace();
        let root = ws.tree().root();
        ws.split(Axis::Horizontal).unwrap();
        clear(&ws);

        assert_eq!(
            ws.split_frame(root, Axis::Vertical).unwrap_err(),
            LayoutError::NotALeaf(root)
        );
        assert_eq!(ws.pane_count(), 2);
        assert_eq!(ws.registry().len(), 2);
        assert!(calls(&ws).is_empty());
    }

    #[test]
    fn close_sole_pane_is_rejected() {
        let mut ws = workspace();
        let root = ws.tree().root();
        assert_eq!(ws.close().unwrap_err(), LayoutError::RootFrame(root));
        assert_eq!(ws.pane_count(), 1);
        assert_eq!(ws.focused_frame(), Some(root));
    }

    #[test]
    fn close_hides_and_unregisters() {
        let mut ws = workspace();
        let w1 = ws.split(Axis::Horizontal).unwrap();
        clear(&ws);

        ws.close().unwrap();
        let log = calls(&ws);
        assert_eq!(log[0], (1, Call::Hide));
        assert!(log.contains(&(0, Call::Resize(Rect::new(0, 0, 800, 600)))));
        assert_eq!(log.last(), Some(&(0, Call::Focus)));
        assert!(!ws.registry().contains(w1));
    }

    #[test]
    fn closing_everything_empties_workspace() {
        let mut ws = workspace();
        ws.split(Axis::Horizontal).unwrap();
        ws.close().unwrap();
        assert_eq!(ws.pane_count(), 1);

        let focus = ws.close().unwrap();
        assert_eq!(focus, None);
        assert!(ws.is_empty());
        assert_eq!(ws.focused_frame(), None);
        assert!(ws.registry().is_empty());
        assert_eq!(ws.close().unwrap_err(), LayoutError::NoFocus);
        assert_eq!(ws.split(Axis::Vertical).unwrap_err(), LayoutError::NoFocus);
        assert!(!ws.scroll(0, 1));
    }

    #[test]
    fn exchange_alone_does_nothing() {
        let mut ws = workspace();
        clear(&ws);
        assert_eq!(ws.exchange().unwrap(), None);
        assert!(calls(&ws).is_empty());
    }

    #[test]
    fn apply_dispatches_commands() {
        let mut ws = workspace();
        ws.apply(PaneCommand::SplitVertical).unwrap();
        assert_eq!(
            rects(&ws),
            vec![Rect::new(0, 0, 800, 300), Rect::new(0, 300, 800, 300)]
        );
        ws.apply(PaneCommand::SplitHorizontal).unwrap();
        assert_eq!(ws.pane_count(), 3);
        ws.apply(PaneCommand::Exchange).unwrap();
        ws.apply(PaneCommand::Close).unwrap();
        assert_eq!(ws.pane_count(), 2);
        assert_eq!(ws.tree().check_invariants(), Ok(()));
        assert_eq!(ws.check_bindings(), Ok(()));
    }

    #[test]
    fn load_buffer_rebinds_surface_and_registry() {
        let mut ws = workspace();
        let w0 = ws.focused_window().unwrap();
        let w1 = ws.split(Axis::Horizontal).unwrap();
        clear(&ws);

        ws.load_buffer(w0, "main.rs").unwrap();
        assert_eq!(calls(&ws), vec![(0, Call::Bind("main.rs"))]);
        assert_eq!(ws.window(w0).unwrap().buffer(), &"main.rs");
        assert_eq!(ws.registry().windows_showing(|b| *b == "scratch"), vec![w1]);

        ws.close().unwrap();
        assert_eq!(ws.load_buffer(w1, "x").unwrap_err(), LayoutError::UnknownWindow(w1));
    }

    #[test]
    fn resize_relayouts_every_pane() {
        let mut ws = workspace();
        ws.split(Axis::Horizontal).unwrap();
        ws.split(Axis::Horizontal).unwrap();
        ws.resize(1000, 400);

        assert_eq!(ws.size(), (1000, 400));
        // 1000 / 3 leaves one pixel unused at the right edge.
        assert_eq!(
            rects(&ws),
            vec![
                Rect::new(0, 0, 333, 400),
                Rect::new(333, 0, 333, 400),
                Rect::new(666, 0, 333, 400),
            ]
        );
    }

    #[test]
    fn scroll_and_click_focus() {
        let mut ws = workspace();
        let w0 = ws.focused_window().unwrap();
        ws.split(Axis::Horizontal).unwrap();
        clear(&ws);

        assert!(ws.scroll(0, -3));
        assert_eq!(calls(&ws), vec![(1, Call::Scroll(0, -3))]);

        ws.focus_at(100, 100);
        assert_eq!(ws.focused_window(), Some(w0));
        assert_eq!(ws.focus_at(2000, 100), None);
        assert_eq!(ws.focused_window(), Some(w0));
    }

    #[test]
    fn workspaces_share_registry() {
        let registry = Arc::new(WindowRegistry::new());
        let open = |container, buffer| {
            Workspace::new(
                TestPlatform::default(),
                container,
                Arc::clone(&registry),
                buffer,
                100,
                100,
            )
        };
        let first = open("one", "a");
        let mut second = open("two", "b");
        second.split(Axis::Vertical).unwrap();
        assert_eq!(registry.len(), 3);

        let ids = first.window_ids();
        drop(first);
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(ids[0]));
        assert_eq!(second.window_ids().len(), 2);
    }
}
