// ABOUTME: Pane commands and the key chords bound to them.
// ABOUTME: Chords are normalised so "V+Ctrl" and "ctrl+v" name the same binding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Axis;

/// Structural operations the key-binding layer can request on the focused pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneCommand {
    /// Split so the new pane sits to the right of the focused one
    SplitHorizontal,
    /// Split so the new pane sits below the focused one
    SplitVertical,
    Close,
    Exchange,
}

impl PaneCommand {
    /// Orientation requested by a split command
    pub fn split_axis(self) -> Option<Axis> {
        match self {
            PaneCommand::SplitHorizontal => Some(Axis::Horizontal),
            PaneCommand::SplitVertical => Some(Axis::Vertical),
            PaneCommand::Close | PaneCommand::Exchange => None,
        }
    }
}

const MODIFIERS: &[&str] = &["ctrl", "alt", "shift", "super"];

/// Normalise a chord like "Shift+Ctrl+V" to "ctrl+shift+v".
///
/// Modifiers come first in a fixed order, the key last. Returns None for an
/// empty chord or one made only of modifiers.
pub fn normalize_chord(chord: &str) -> Option<String> {
    let mut mods: Vec<&str> = Vec::new();
    let mut key = None;
    for part in chord.split('+').map(str::trim).filter(|p| !p.is_empty()) {
        let lower = part.to_ascii_lowercase();
        match MODIFIERS.iter().find(|m| **m == lower) {
            Some(m) => {
                if !mods.contains(m) {
                    mods.push(*m);
                }
            }
            None => key = Some(lower),
        }
    }
    let key = key?;
    mods.sort_by_key(|m| MODIFIERS.iter().position(|x| x == m));
    let mut out = mods.join("+");
    if !out.is_empty() {
        out.push('+');
    }
    out.push_str(&key);
    Some(out)
}

/// Chord to command map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyBindings {
    bindings: BTreeMap<String, PaneCommand>,
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Bind a chord, replacing any previous binding. Invalid chords are ignored.
    pub fn bind(&mut self, chord: &str, command: PaneCommand) -> bool {
        match normalize_chord(chord) {
            Some(chord) => {
                self.bindings.insert(chord, command);
                true
            }
            None => false,
        }
    }

    /// Re-key every binding through [`normalize_chord`], dropping invalid chords.
    ///
    /// Bindings deserialized from a config file arrive exactly as written.
    pub fn normalized(self) -> Self {
        let mut keys = Self::empty();
        for (chord, command) in self.bindings {
            keys.bind(&chord, command);
        }
        keys
    }

    pub fn lookup(&self, chord: &str) -> Option<PaneCommand> {
        let chord = normalize_chord(chord)?;
        self.bindings.get(&chord).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PaneCommand)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut keys = Self::empty();
        keys.bind("ctrl+v", PaneCommand::SplitHorizontal);
        keys.bind("ctrl+s", PaneCommand::SplitVertical);
        keys.bind("ctrl+w", PaneCommand::Close);
        keys.bind("ctrl+x", PaneCommand::Exchange);
        keys
    }
}
