// ABOUTME: Pane layout management for the editor's window manager.
// ABOUTME: A tree of frames split side by side or stacked, each leaf hosting one window.

mod registry;
mod tree;
mod window;
mod workspace;

pub use registry::{WindowId, WindowRegistry};
pub use tree::{CloseOutcome, Frame, FrameId, FrameTree, LayoutError, SplitOutcome};
pub use window::{Platform, Surface, Window};
pub use workspace::Workspace;
