// ABOUTME: Main application entry point.
// ABOUTME: Plays a pane command script against a headless workspace and dumps its layout.

mod platform;
mod script;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use ft_core::{Axis, Config, KeyBindings, PaneCommand, Rect};
use ft_layout::{FrameId, WindowRegistry, Workspace};
use platform::{Document, HeadlessPlatform, HeadlessSurface};
use script::Step;

#[derive(Debug, Parser)]
#[command(name = "frametile", about = "Drive a pane layout from a command script")]
struct Args {
    /// Script to run; commands are read from stdin when omitted
    script: Option<PathBuf>,

    /// Config file to use instead of ~/.config/frametile/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured window width
    #[arg(long)]
    width: Option<u32>,

    /// Override the configured window height
    #[arg(long)]
    height: Option<u32>,

    /// Document shown in the first pane
    #[arg(long, default_value = "scratch")]
    document: String,

    /// Write the effective config (after overrides) to this path
    #[arg(long)]
    save_config: Option<PathBuf>,
}

/// Frame tree as printed by `dump`
#[derive(Debug, Serialize)]
struct FrameSnapshot {
    rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    orientation: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    window: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    surface: Option<SurfaceSnapshot>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    focused: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<FrameSnapshot>,
}

/// What a pane's surface was last told to do
#[derive(Debug, Serialize)]
struct SurfaceSnapshot {
    parent: Option<String>,
    document: Option<String>,
    visible: bool,
    scroll: (i64, i64),
}

impl SurfaceSnapshot {
    fn of(surface: &HeadlessSurface) -> Self {
        Self {
            parent: surface.parent().map(str::to_string),
            document: surface.document().map(str::to_string),
            visible: surface.is_visible(),
            scroll: surface.scroll_offset(),
        }
    }
}

struct App {
    workspace: Workspace<HeadlessPlatform>,
    keys: KeyBindings,
}

impl App {
    fn new(config: Config, registry: Arc<WindowRegistry<Arc<Document>>>, document: &str) -> Self {
        let workspace = Workspace::new(
            HeadlessPlatform::default(),
            "frametile".to_string(),
            registry,
            Document::open(document),
            config.window_width,
            config.window_height,
        );
        Self {
            workspace,
            keys: config.keys,
        }
    }

    fn run(&mut self, step: Step) -> Result<()> {
        match step {
            Step::Pane(command) => self.command(command),
            Step::Key(chord) => match self.keys.lookup(&chord) {
                Some(command) => self.command(command),
                None => tracing::warn!("No binding for {}", chord),
            },
            Step::Open(name) => self.open(&name),
            Step::Resize(width, height) => {
                self.workspace.resize(width, height);
                tracing::info!("Resized to {}x{}", width, height);
            }
            Step::Scroll(dx, dy) => {
                if !self.workspace.scroll(dx, dy) {
                    tracing::warn!("Nothing focused to scroll");
                }
            }
            Step::Click(x, y) => match self.workspace.focus_at(x, y) {
                Some(frame) => tracing::info!("Focus changed to {:?}", frame),
                None => tracing::warn!("No pane at ({}, {})", x, y),
            },
            Step::Dump => {
                let snapshot = self.snapshot(self.workspace.tree().root());
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
        }
        Ok(())
    }

    fn command(&mut self, command: PaneCommand) {
        if let Err(e) = self.workspace.apply(command) {
            tracing::warn!("{:?} rejected: {}", command, e);
        }
    }

    fn open(&mut self, name: &str) {
        let Some(window) = self.workspace.focused_window() else {
            tracing::warn!("No pane to open {} in", name);
            return;
        };
        if let Err(e) = self.workspace.load_buffer(window, Document::open(name)) {
            tracing::error!("Failed to open {}: {}", name, e);
            return;
        }
        let showing = self
            .workspace
            .registry()
            .windows_showing(|doc| doc.name == name);
        tracing::info!("Opened {} in {}, shown in {} panes", name, window, showing.len());
    }

    fn snapshot(&self, id: FrameId) -> Option<FrameSnapshot> {
        let frame = self.workspace.tree().get(id)?;
        let window = frame.window();
        Some(FrameSnapshot {
            rect: frame.rect(),
            orientation: frame.orientation(),
            window: window.map(|w| w.id().0),
            document: window.map(|w| w.buffer().name.clone()),
            surface: window.map(|w| SurfaceSnapshot::of(w.view())),
            focused: self.workspace.focused_frame() == Some(id),
            children: frame
                .children()
                .iter()
                .filter_map(|child| self.snapshot(*child))
                .collect(),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = Args::parse();
    tracing::info!("Starting frametile");

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_or_default(),
    };
    if let Some(width) = args.width {
        config.window_width = width;
    }
    if let Some(height) = args.height {
        config.window_height = height;
    }
    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save config to {}", path.display()))?;
        tracing::info!("Saved config to {}", path.display());
    }

    let registry = Arc::new(WindowRegistry::new());
    let mut app = App::new(config, Arc::clone(&registry), &args.document);

    let reader: Box<dyn BufRead> = match &args.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let Some(step) = script::parse_line(&line)
            .with_context(|| format!("line {}: {}", index + 1, line.trim()))?
        else {
            continue;
        };
        app.run(step)?;

        if app.workspace.is_empty() {
            tracing::info!("All panes closed, exiting");
            break;
        }
    }

    tracing::info!("{} windows still open", registry.len());
    Ok(())
}
