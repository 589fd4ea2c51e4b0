use std::collections::HashMap;

use zbus::{
    interface,
    zvariant::{OwnedValue, Value},
    SignalContext,
};

use super::{Menu, Properties, WireLayout, ROOT_ID};

/// The `com.canonical.dbusmenu` object.
///
/// Everything here is a thin translation between the wire types and [`Menu`]; the tree itself is
/// shared with the [`Tray`][crate::Tray] that mutates it.
pub struct MenuInterface {
    menu: Menu,
}

impl MenuInterface {
    pub fn new(menu: Menu) -> Self {
        Self { menu }
    }

    /// Apply the root suppression toggle to the properties reported for `id`.
    fn reported(&self, id: i32, props: Properties) -> HashMap<String, Value<'static>> {
        if id == ROOT_ID && self.menu.compat().suppress_root_properties {
            HashMap::new()
        } else {
            props.into_wire()
        }
    }
}

#[interface(name = "com.canonical.dbusmenu")]
impl MenuInterface {
    /// GetLayout method
    async fn get_layout(&self, parent_id: i32, recursion_depth: i32, property_names: Vec<String>) -> (u32, WireLayout) {
        log::debug!("GetLayout parent_id={} depth={} props={:?}", parent_id, recursion_depth, property_names);
        let (revision, mut node) = self.menu.layout(parent_id, recursion_depth, property_names.as_slice());
        let properties = std::mem::take(&mut node.properties);
        let mut layout = node.into_wire();
        layout.properties = self.reported(layout.id, properties);
        (revision, layout)
    }

    /// GetGroupProperties method
    async fn get_group_properties(
        &self,
        ids: Vec<i32>,
        property_names: Vec<String>,
    ) -> Vec<(i32, HashMap<String, Value<'static>>)> {
        log::debug!("GetGroupProperties ids={:?} props={:?}", ids, property_names);
        self.menu
            .group_properties(&ids, property_names.as_slice())
            .into_iter()
            .map(|(id, props)| (id, self.reported(id, props)))
            .collect()
    }

    /// GetProperty method
    ///
    /// Unknown ids and properties are answered with an empty string instead of an error.
    async fn get_property(&self, id: i32, name: String) -> Value<'static> {
        log::debug!("GetProperty id={} name={}", id, name);
        let suppressed = id == ROOT_ID && self.menu.compat().suppress_root_properties;
        match self.menu.property(id, &name) {
            Some(value) if !suppressed => value.into(),
            _ => Value::from(""),
        }
    }

    /// Event method
    async fn event(&self, id: i32, event_id: String, _data: OwnedValue, _timestamp: u32) {
        log::debug!("Event id={} event_id={}", id, event_id);
        self.menu.handle_event(id, &event_id);
    }

    /// EventGroup method
    ///
    /// Events are dispatched in order; no id is ever reported back as an error.
    async fn event_group(&self, events: Vec<(i32, String, OwnedValue, u32)>) -> Vec<i32> {
        log::debug!("EventGroup with {} events", events.len());
        for (id, event_id, _, _) in events {
            self.menu.handle_event(id, &event_id);
        }
        Vec::new()
    }

    /// AboutToShow method
    ///
    /// The layout is always kept current through signals, so nothing ever needs a refresh.
    async fn about_to_show(&self, id: i32) -> bool {
        log::debug!("AboutToShow id={}", id);
        false
    }

    /// AboutToShowGroup method
    async fn about_to_show_group(&self, ids: Vec<i32>) -> (Vec<i32>, Vec<i32>) {
        log::debug!("AboutToShowGroup ids={:?}", ids);
        (Vec::new(), Vec::new())
    }

    /// LayoutUpdated signal
    #[zbus(signal)]
    pub(crate) async fn layout_updated(ctxt: &SignalContext<'_>, revision: u32, parent: i32) -> zbus::Result<()>;

    /// ItemsPropertiesUpdated signal
    #[zbus(signal)]
    pub(crate) async fn items_properties_updated(
        ctxt: &SignalContext<'_>,
        updated_props: Vec<(i32, HashMap<String, Value<'static>>)>,
        removed_props: Vec<(i32, Vec<String>)>,
    ) -> zbus::Result<()>;

    // The setters below make these properties show up as readwrite in introspection. A remote
    // `Set` is accepted and ignored, and no `PropertiesChanged` follows it since nothing changed.

    /// Version property
    #[zbus(property)]
    fn version(&self) -> u32 {
        self.menu.revision()
    }

    #[zbus(property)]
    fn set_version(&mut self, _version: u32) {
        log::debug!("ignoring Set for read-only property Version");
    }

    /// Status property
    #[zbus(property)]
    fn status(&self) -> String {
        "normal".to_owned()
    }

    #[zbus(property)]
    fn set_status(&mut self, _status: String) {
        log::debug!("ignoring Set for read-only property Status");
    }

    /// TextDirection property
    #[zbus(property)]
    fn text_direction(&self) -> String {
        "ltr".to_owned()
    }

    #[zbus(property)]
    fn set_text_direction(&mut self, _direction: String) {
        log::debug!("ignoring Set for read-only property TextDirection");
    }

    /// IconThemePath property
    #[zbus(property)]
    fn icon_theme_path(&self) -> Vec<String> {
        Vec::new()
    }

    #[zbus(property)]
    fn set_icon_theme_path(&mut self, _path: Vec<String>) {
        log::debug!("ignoring Set for read-only property IconThemePath");
    }
}
