use std::{fmt, sync::Arc};

/// Id of the root entry. It always exists and is never handed out by the allocator.
pub const ROOT_ID: i32 = 0;

/// Called when a menu entry is clicked.
pub type ClickHandler = Arc<dyn Fn() + Send + Sync>;

/// Called with the new checked state after a checkable entry was toggled by a click.
pub type ToggleHandler = Arc<dyn Fn(bool) + Send + Sync>;

/// A node in the menu tree.
///
/// Entries are owned by the [`MenuTree`][super::MenuTree]; `parent` and `children` only refer to
/// other entries by id.
#[derive(Clone)]
pub struct MenuEntry {
    pub id: i32,
    pub label: String,
    pub enabled: bool,
    pub visible: bool,
    pub checkable: bool,
    pub checked: bool,
    pub is_separator: bool,
    pub parent: i32,
    /// Child ids in display order.
    pub children: Vec<i32>,
    pub on_click: Option<ClickHandler>,
    pub on_toggle: Option<ToggleHandler>,
}

impl MenuEntry {
    pub(super) fn root() -> Self {
        Self::item(ROOT_ID, String::new(), ROOT_ID)
    }

    pub(super) fn item(id: i32, label: String, parent: i32) -> Self {
        Self {
            id,
            label,
            enabled: true,
            visible: true,
            checkable: false,
            checked: false,
            is_separator: false,
            parent,
            children: Vec::new(),
            on_click: None,
            on_toggle: None,
        }
    }

    pub(super) fn separator(id: i32, parent: i32) -> Self {
        Self { is_separator: true, enabled: false, ..Self::item(id, String::new(), parent) }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

impl fmt::Debug for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuEntry")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("enabled", &self.enabled)
            .field("visible", &self.visible)
            .field("checkable", &self.checkable)
            .field("checked", &self.checked)
            .field("is_separator", &self.is_separator)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("on_click", &self.on_click.is_some())
            .field("on_toggle", &self.on_toggle.is_some())
            .finish()
    }
}
