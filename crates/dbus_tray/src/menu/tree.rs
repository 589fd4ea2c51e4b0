use std::collections::BTreeMap;

use super::{entry::ROOT_ID, MenuEntry};

/// What an accepted mutation changed, so the caller can announce it once the lock is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Entries were added or removed.
    Layout { revision: u32 },
    /// A single property of one entry changed.
    Property { revision: u32, id: i32, name: &'static str },
}

impl Change {
    pub fn revision(&self) -> u32 {
        match self {
            Change::Layout { revision } | Change::Property { revision, .. } => *revision,
        }
    }
}

/// The menu entries, the id allocator and the revision counter.
///
/// This type does no locking; [`Menu`][super::Menu] owns it behind a reader/writer lock.
#[derive(Debug)]
pub struct MenuTree {
    // ids only ever grow, so key order is insertion order
    entries: BTreeMap<i32, MenuEntry>,
    next_id: i32,
    revision: u32,
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuTree {
    /// A tree containing only the root entry, at revision 1.
    pub fn new() -> Self {
        Self { entries: BTreeMap::from([(ROOT_ID, MenuEntry::root())]), next_id: 1, revision: 1 }
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn lookup(&self, id: i32) -> Option<&MenuEntry> {
        self.entries.get(&id)
    }

    /// Number of entries, including the root and orphans.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Add a normal or checkable item under `parent` and return its id.
    ///
    /// If `parent` doesn't exist the entry is still created, but no layout will ever contain it.
    pub fn add_item(&mut self, label: impl Into<String>, checkable: bool, checked: bool, parent: i32) -> (i32, Change) {
        let id = self.allocate_id();
        let mut entry = MenuEntry::item(id, label.into(), parent);
        entry.checkable = checkable;
        entry.checked = checked;
        self.insert(entry)
    }

    pub fn add_separator(&mut self, parent: i32) -> (i32, Change) {
        let id = self.allocate_id();
        self.insert(MenuEntry::separator(id, parent))
    }

    /// Mutable access for attaching handlers to a fresh entry. Doesn't count as a change.
    pub(super) fn entry_mut(&mut self, id: i32) -> Option<&mut MenuEntry> {
        self.entries.get_mut(&id)
    }

    pub fn set_label(&mut self, id: i32, label: impl Into<String>) -> Option<Change> {
        let entry = self.entries.get_mut(&id)?;
        entry.label = label.into();
        Some(self.property_changed(id, "label"))
    }

    pub fn set_enabled(&mut self, id: i32, enabled: bool) -> Option<Change> {
        self.entries.get_mut(&id)?.enabled = enabled;
        Some(self.property_changed(id, "enabled"))
    }

    pub fn set_visible(&mut self, id: i32, visible: bool) -> Option<Change> {
        self.entries.get_mut(&id)?.visible = visible;
        Some(self.property_changed(id, "visible"))
    }

    /// Ignored unless the entry exists and is checkable.
    pub fn set_checked(&mut self, id: i32, checked: bool) -> Option<Change> {
        let entry = self.entries.get_mut(&id).filter(|e| e.checkable)?;
        entry.checked = checked;
        Some(self.property_changed(id, "toggle-state"))
    }

    /// Drop every entry except a fresh root and restart ids at 1. The revision keeps counting.
    pub fn reset(&mut self) -> Change {
        self.entries.clear();
        self.entries.insert(ROOT_ID, MenuEntry::root());
        self.next_id = 1;
        self.bump();
        Change::Layout { revision: self.revision }
    }

    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert(&mut self, entry: MenuEntry) -> (i32, Change) {
        let id = entry.id;
        match self.entries.get_mut(&entry.parent) {
            Some(parent) => parent.children.push(id),
            None => log::debug!("menu entry {} added under unknown parent {}", id, entry.parent),
        }
        self.entries.insert(id, entry);
        self.bump();
        (id, Change::Layout { revision: self.revision })
    }

    fn property_changed(&mut self, id: i32, name: &'static str) -> Change {
        self.bump();
        Change::Property { revision: self.revision, id, name }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}
