//! The menu tree and the `com.canonical.dbusmenu` object exposing it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{MenuCompat, Signal, SignalQueue};

pub(crate) mod dbus;
pub use dbus::MenuInterface;

mod entry;
pub use entry::*;

mod layout;
pub use layout::*;

mod props;
pub use props::*;

mod tree;
pub use tree::*;

/// Shared handle to the menu tree.
///
/// All reads take the lock in shared mode and all mutations in exclusive mode. Signals are queued
/// before the write lock is released, so they reach the queue in revision order; queueing never
/// blocks, the bus sends happen in the pump. The lock is never held while handlers run, so a
/// click handler may freely call back into the menu (e.g. to rebuild it).
#[derive(Debug, Clone)]
pub struct Menu {
    // std RwLock rather than tokio's, it's never held across an await
    tree: Arc<RwLock<MenuTree>>,
    signals: SignalQueue,
    compat: MenuCompat,
}

impl Menu {
    pub fn new(signals: SignalQueue, compat: MenuCompat) -> Self {
        Self { tree: Arc::new(RwLock::new(MenuTree::new())), signals, compat }
    }

    pub fn compat(&self) -> MenuCompat {
        self.compat
    }

    pub fn revision(&self) -> u32 {
        self.read().revision()
    }

    /// Run `f` with shared access to the tree.
    pub fn with_tree<R>(&self, f: impl FnOnce(&MenuTree) -> R) -> R {
        f(&self.read())
    }

    /// Add a clickable item at the top level.
    pub fn add_item(&self, label: impl Into<String>, on_click: Option<ClickHandler>) -> i32 {
        self.add_item_to(ROOT_ID, label, on_click)
    }

    pub fn add_item_to(&self, parent: i32, label: impl Into<String>, on_click: Option<ClickHandler>) -> i32 {
        self.insert(|tree| tree.add_item(label, false, false, parent), |entry| entry.on_click = on_click)
    }

    /// Add a checkbox item at the top level. `on_toggle` gets the new state after each click.
    pub fn add_checkable_item(&self, label: impl Into<String>, checked: bool, on_toggle: Option<ToggleHandler>) -> i32 {
        self.add_checkable_item_to(ROOT_ID, label, checked, on_toggle)
    }

    pub fn add_checkable_item_to(
        &self,
        parent: i32,
        label: impl Into<String>,
        checked: bool,
        on_toggle: Option<ToggleHandler>,
    ) -> i32 {
        self.insert(|tree| tree.add_item(label, true, checked, parent), |entry| entry.on_toggle = on_toggle)
    }

    pub fn add_separator(&self) -> i32 {
        self.add_separator_to(ROOT_ID)
    }

    pub fn add_separator_to(&self, parent: i32) -> i32 {
        self.insert(|tree| tree.add_separator(parent), |_| {})
    }

    pub fn set_label(&self, id: i32, label: impl Into<String>) {
        self.mutate(|tree| tree.set_label(id, label));
    }

    pub fn set_enabled(&self, id: i32, enabled: bool) {
        self.mutate(|tree| tree.set_enabled(id, enabled));
    }

    pub fn set_visible(&self, id: i32, visible: bool) {
        self.mutate(|tree| tree.set_visible(id, visible));
    }

    pub fn set_checked(&self, id: i32, checked: bool) {
        self.mutate(|tree| tree.set_checked(id, checked));
    }

    /// Remove every entry. Ids start over at 1 afterwards.
    pub fn reset(&self) {
        self.mutate(|tree| Some(tree.reset()));
    }

    /// The current revision together with the subtree at `id`. See [`build_layout`].
    pub fn layout<S: AsRef<str>>(&self, id: i32, depth: i32, filter: &[S]) -> (u32, LayoutNode) {
        let tree = self.read();
        (tree.revision(), build_layout(&tree, id, depth, filter))
    }

    /// Properties of each known id in `ids`; unknown ids are left out.
    pub fn group_properties<S: AsRef<str>>(&self, ids: &[i32], filter: &[S]) -> Vec<(i32, Properties)> {
        let tree = self.read();
        ids.iter().filter_map(|id| tree.lookup(*id)).map(|entry| (entry.id, properties(entry, filter))).collect()
    }

    /// A single property, or `None` if the entry or the property doesn't exist.
    pub fn property(&self, id: i32, name: &str) -> Option<PropValue> {
        let tree = self.read();
        let entry = tree.lookup(id)?;
        properties(entry, &[name]).get(name).cloned()
    }

    /// Handle an event sent by the shell. Only `clicked` does anything.
    pub fn handle_event(&self, id: i32, event_id: &str) {
        match event_id {
            "clicked" => self.click(id),
            _ => log::debug!("ignoring menu event {:?} for {}", event_id, id),
        }
    }

    fn click(&self, id: i32) {
        let (on_click, toggle) = {
            let mut tree = self.write();
            let Some(entry) = tree.lookup(id) else {
                log::debug!("click on unknown menu entry {}", id);
                return;
            };
            if entry.is_separator {
                return;
            }
            let on_click = entry.on_click.clone();
            if entry.checkable {
                let checked = !entry.checked;
                let on_toggle = entry.on_toggle.clone();
                if let Some(change) = tree.set_checked(id, checked) {
                    self.announce(&tree, change);
                }
                (on_click, Some((checked, on_toggle)))
            } else {
                (on_click, None)
            }
        };

        if let Some(on_click) = on_click {
            on_click();
        }
        if let Some((checked, Some(on_toggle))) = toggle {
            on_toggle(checked);
        }
    }

    fn insert(&self, op: impl FnOnce(&mut MenuTree) -> (i32, Change), attach: impl FnOnce(&mut MenuEntry)) -> i32 {
        let mut tree = self.write();
        let (id, change) = op(&mut tree);
        if let Some(entry) = tree.entry_mut(id) {
            attach(entry);
        }
        self.announce(&tree, change);
        id
    }

    fn mutate(&self, op: impl FnOnce(&mut MenuTree) -> Option<Change>) {
        let mut tree = self.write();
        if let Some(change) = op(&mut tree) {
            self.announce(&tree, change);
        }
    }

    /// The projected value of whatever property `change` touched, if it is visible at all.
    fn updated_properties(tree: &MenuTree, change: &Change) -> Option<(i32, Properties)> {
        match change {
            Change::Property { id, name, .. } => {
                let props = properties(tree.lookup(*id)?, &[*name]);
                (!props.is_empty()).then_some((*id, props))
            }
            Change::Layout { .. } => None,
        }
    }

    /// Queue the signals for `change`. Called with the write lock held.
    fn announce(&self, tree: &MenuTree, change: Change) {
        let updated = Self::updated_properties(tree, &change);
        let revision = change.revision();
        self.signals.emit(Signal::LayoutUpdated { revision, parent: ROOT_ID });
        if let Some(updated) = updated {
            if self.compat.items_properties_updated {
                self.signals.emit(Signal::ItemsPropertiesUpdated { updated: vec![updated], removed: Vec::new() });
            }
        }
        self.signals.emit(Signal::MenuVersionChanged(revision));
        if let Change::Layout { .. } = change {
            self.signals.emit(Signal::NewMenu);
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MenuTree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MenuTree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }
}
