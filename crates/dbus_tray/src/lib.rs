//! Server side of the tray icon protocols: an [`org.kde.StatusNotifierItem`] object for the icon
//! itself, and a [`com.canonical.dbusmenu`] object describing its context menu.
//!
//! Most users only need [`Tray`], which owns both objects and the bus connection.
//!
//! [`org.kde.StatusNotifierItem`]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierItem/
//! [`com.canonical.dbusmenu`]: https://github.com/AyatanaIndicators/libdbusmenu/blob/master/libdbusmenu-glib/dbus-menu.xml

pub mod names;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod icon;
pub use icon::*;

mod item;
pub use item::*;

pub mod menu;
pub use menu::Menu;

mod signal;
pub use signal::*;

mod tray;
pub use tray::*;

mod watcher;
pub use watcher::*;
