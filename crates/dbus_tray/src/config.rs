use serde::Deserialize;
use smart_default::SmartDefault;

/// Settings for a [`Tray`][crate::Tray].
///
/// Every field has a default, so a partial document deserializes fine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct TrayConfig {
    /// Value of the item's `Id` property.
    #[default = "1"]
    pub id: String,
    pub title: String,
    pub tooltip: String,

    /// Two activations closer together than this count as a double click.
    #[default = 400]
    pub double_click_ms: u64,

    /// Whether to call `RegisterStatusNotifierItem` on the watcher at startup.
    #[default = true]
    pub register_with_watcher: bool,

    /// How long in-flight calls get to finish between un-exporting the objects and closing the
    /// connection.
    #[default = 200]
    pub shutdown_grace_ms: u64,

    pub menu: MenuCompat,
}

/// Toggles for the places where shells disagree about what a dbusmenu server should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(default)]
pub struct MenuCompat {
    /// Report no properties at all for the root entry (id 0), as libdbusmenu-qt based shells
    /// prefer.
    pub suppress_root_properties: bool,

    /// Emit `ItemsPropertiesUpdated` for property-only changes. `LayoutUpdated` is sent either
    /// way.
    #[default = true]
    pub items_properties_updated: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TrayConfig::default();
        assert_eq!(config.id, "1");
        assert_eq!(config.double_click_ms, 400);
        assert_eq!(config.shutdown_grace_ms, 200);
        assert!(config.register_with_watcher);
        assert_eq!(config.menu, MenuCompat { suppress_root_properties: false, items_properties_updated: true });
    }

    #[test]
    fn test_partial_document() {
        let config: TrayConfig = serde_json::from_str(
            r#"{ "title": "Downloads", "double_click_ms": 250, "menu": { "suppress_root_properties": true } }"#,
        )
        .unwrap();
        assert_eq!(config.title, "Downloads");
        assert_eq!(config.double_click_ms, 250);
        assert_eq!(config.id, "1");
        assert!(config.menu.suppress_root_properties);
        assert!(config.menu.items_properties_updated);
    }
}
