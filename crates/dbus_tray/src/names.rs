//! Well-known object paths, interface and bus names.

pub const ITEM_OBJECT: &str = "/StatusNotifierItem";
pub const ITEM_INTERFACE: &str = "org.kde.StatusNotifierItem";

pub const MENU_OBJECT: &str = "/StatusNotifierMenu";
pub const MENU_INTERFACE: &str = "com.canonical.dbusmenu";

pub const WATCHER_BUS: &str = "org.kde.StatusNotifierWatcher";
pub const WATCHER_OBJECT: &str = "/StatusNotifierWatcher";

/// Bus name this process owns while the tray is running.
pub fn item_bus_name() -> String {
    format!("{}-{}-1", ITEM_INTERFACE, std::process::id())
}
