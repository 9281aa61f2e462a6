// ABOUTME: Process-wide table of live windows, keyed by monotonically increasing ids.
// ABOUTME: Writers take the exclusive lock; lookups from other threads share it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;

/// Unique window identifier. Monotonically increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "win{}", self.0)
    }
}

#[derive(Debug)]
struct Entries<B> {
    next_id: u64,
    windows: HashMap<WindowId, B>,
}

/// Registry of live windows and the buffer each one shows.
///
/// Construct one per process and share it by `Arc` with every workspace and
/// with any backend thread that needs to ask whether a window still exists.
#[derive(Debug)]
pub struct WindowRegistry<B> {
    entries: RwLock<Entries<B>>,
}

impl<B: Clone> WindowRegistry<B> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                next_id: 0,
                windows: HashMap::new(),
            }),
        }
    }

    /// Allocate a fresh id and record the window's buffer under it
    pub fn register(&self, buffer: B) -> WindowId {
        let mut entries = self.entries.write();
        let id = WindowId(entries.next_id);
        entries.next_id += 1;
        entries.windows.insert(id, buffer);
        id
    }

    pub fn unregister(&self, id: WindowId) -> Option<B> {
        self.entries.write().windows.remove(&id)
    }

    /// Point a live window at another buffer. Returns false if the id is gone.
    pub fn rebind(&self, id: WindowId, buffer: B) -> bool {
        match self.entries.write().windows.get_mut(&id) {
            Some(slot) => {
                *slot = buffer;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.entries.read().windows.contains_key(&id)
    }

    pub fn buffer(&self, id: WindowId) -> Option<B> {
        self.entries.read().windows.get(&id).cloned()
    }

    /// Ids of the windows whose buffer matches, in ascending order
    pub fn windows_showing(&self, mut pred: impl FnMut(&B) -> bool) -> Vec<WindowId> {
        let entries = self.entries.read();
        let mut ids: Vec<WindowId> = entries
            .windows
            .iter()
            .filter(|(_, buffer)| pred(buffer))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows_showing(|_| true)
    }

    pub fn len(&self) -> usize {
        self.entries.read().windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<B: Clone> Default for WindowRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn ids_are_never_reused() {
        let registry = WindowRegistry::new();
        let a = registry.register("a");
        let b = registry.register("b");
        assert_eq!(registry.unregister(b), Some("b"));
        let c = registry.register("c");

        assert!(a < b && b < c);
        assert_eq!(registry.ids(), vec![a, c]);
        assert!(!registry.contains(b));
        assert_eq!(registry.unregister(b), None);
    }

    #[test]
    fn rebind_updates_buffer_queries() {
        let registry = WindowRegistry::new();
        let a = registry.register("notes.txt");
        let b = registry.register("notes.txt");
        assert_eq!(registry.windows_showing(|buf| *buf == "notes.txt"), vec![a, b]);

        assert!(registry.rebind(b, "main.rs"));
        assert_eq!(registry.buffer(b), Some("main.rs"));
        assert_eq!(registry.windows_showing(|buf| *buf == "notes.txt"), vec![a]);

        registry.unregister(a);
        assert!(!registry.rebind(a, "main.rs"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_readers_see_consistent_state() {
        let registry = Arc::new(WindowRegistry::new());
        let keep = registry.register("keep");

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        assert!(registry.contains(keep));
                        assert!(!registry.is_empty());
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            let id = registry.register("temp");
            registry.unregister(id);
        }
        for reader in readers {
            reader.join().unwrap();
        }

        assert_eq!(registry.ids(), vec![keep]);
        assert_eq!(registry.register("next"), WindowId(1001));
    }

    #[test]
    fn display() {
        assert_eq!(WindowId(7).to_string(), "win7");
    }
}
