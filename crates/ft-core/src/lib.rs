// ABOUTME: Shared types and configuration for frametile.
// ABOUTME: Defines geometry, pane commands, key bindings, and config file handling.

pub mod command;
pub mod config;
pub mod geometry;

pub use command::{KeyBindings, PaneCommand};
pub use config::{Config, ConfigError};
pub use geometry::{Axis, Rect};
