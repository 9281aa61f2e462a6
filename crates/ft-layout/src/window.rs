// ABOUTME: Windows bound to buffers, and the rendering collaborators they drive.
// ABOUTME: A window owns its surface; the buffer is a shared handle owned elsewhere.

use std::fmt;

use ft_core::Rect;

use crate::{FrameId, WindowId, WindowRegistry};

/// The toolkit side of a workspace: buffer handles and surface creation
pub trait Platform {
    /// Shared handle to a document owned by the editing backend
    type Buffer: Clone;
    /// Whatever surfaces get parented to, typically the top-level window's central widget
    type Container;
    type Surface: Surface<Buffer = Self::Buffer, Container = Self::Container>;

    fn create_surface(&mut self) -> Self::Surface;
}

/// A rendering surface that paints one buffer
pub trait Surface {
    type Buffer;
    type Container;

    fn set_parent(&mut self, container: &Self::Container);
    fn bind_buffer(&mut self, buffer: &Self::Buffer);
    fn show(&mut self);
    fn hide(&mut self);
    fn scroll(&mut self, dx: i32, dy: i32);
    fn set_focus(&mut self);
    fn resize(&mut self, rect: Rect);
}

/// A leaf's viewport onto one buffer
pub struct Window<P: Platform> {
    id: WindowId,
    frame: FrameId,
    buffer: P::Buffer,
    view: P::Surface,
}

impl<P: Platform> Window<P> {
    /// Register a new window for `buffer` and bring up its surface.
    pub(crate) fn open(
        platform: &mut P,
        container: &P::Container,
        registry: &WindowRegistry<P::Buffer>,
        frame: FrameId,
        buffer: P::Buffer,
    ) -> Self {
        let id = registry.register(buffer.clone());
        let mut view = platform.create_surface();
        view.set_parent(container);
        view.bind_buffer(&buffer);
        view.show();
        tracing::debug!("Opened window {} in frame {:?}", id, frame);
        Self {
            id,
            frame,
            buffer,
            view,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The leaf frame hosting this window
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: FrameId) {
        self.frame = frame;
    }

    pub fn buffer(&self) -> &P::Buffer {
        &self.buffer
    }

    pub fn view(&self) -> &P::Surface {
        &self.view
    }

    pub(crate) fn view_mut(&mut self) -> &mut P::Surface {
        &mut self.view
    }

    /// Show a different buffer in this window
    pub(crate) fn load_buffer(&mut self, buffer: P::Buffer) {
        self.view.bind_buffer(&buffer);
        self.buffer = buffer;
    }
}

impl<P: Platform> fmt::Debug for Window<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
