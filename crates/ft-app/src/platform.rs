// ABOUTME: Headless rendering platform for driving a workspace without a toolkit.
// ABOUTME: Surfaces keep their last geometry and log every call through tracing.

use std::sync::Arc;

use ft_core::Rect;
use ft_layout::{Platform, Surface};

/// An open document, as far as the layout engine is concerned
#[derive(Debug, PartialEq, Eq)]
pub struct Document {
    pub name: String,
}

impl Document {
    pub fn open(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    next_surface: u32,
}

impl Platform for HeadlessPlatform {
    type Buffer = Arc<Document>;
    type Container = String;
    type Surface = HeadlessSurface;

    fn create_surface(&mut self) -> HeadlessSurface {
        let id = self.next_surface;
        self.next_surface += 1;
        tracing::debug!("surface {}: created", id);
        HeadlessSurface {
            id,
            ..HeadlessSurface::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct HeadlessSurface {
    id: u32,
    parent: Option<String>,
    document: Option<String>,
    rect: Rect,
    visible: bool,
    scroll: (i64, i64),
}

impl HeadlessSurface {
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn scroll_offset(&self) -> (i64, i64) {
        self.scroll
    }
}

impl Surface for HeadlessSurface {
    type Buffer = Arc<Document>;
    type Container = String;

    fn set_parent(&mut self, container: &String) {
        tracing::debug!("surface {}: parent {}", self.id, container);
        self.parent = Some(container.clone());
    }

    fn bind_buffer(&mut self, buffer: &Arc<Document>) {
        tracing::debug!("surface {}: showing {}", self.id, buffer.name);
        self.document = Some(buffer.name.clone());
    }

    fn show(&mut self) {
        self.visible = true;
    }

    fn hide(&mut self) {
        tracing::debug!("surface {}: hidden", self.id);
        self.visible = false;
    }

    fn scroll(&mut self, dx: i32, dy: i32) {
        self.scroll.0 += i64::from(dx);
        self.scroll.1 += i64::from(dy);
        tracing::debug!("surface {}: scrolled to {:?}", self.id, self.scroll);
    }

    fn set_focus(&mut self) {
        tracing::debug!("surface {}: focused", self.id);
    }

    fn resize(&mut self, rect: Rect) {
        if rect != self.rect {
            tracing::debug!(
                "surface {}: {}x{} at ({}, {})",
                self.id,
                rect.width,
                rect.height,
                rect.x,
                rect.y
            );
        }
        self.rect = rect;
    }
}
