use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use zbus::{
    interface,
    zvariant::{ObjectPath, OwnedObjectPath, Value},
    SignalContext,
};

use crate::{icon::pixmaps_from_bytes, names, Error, Pixmap, Signal, SignalQueue, TrayConfig};

/// Called with the pointer coordinates the shell reported.
pub type ActivationHandler = Arc<dyn Fn(i32, i32) + Send + Sync>;

/// What to do when the icon itself is clicked.
///
/// A double click with no `on_double_click` set runs `on_click` instead, so an item with only a
/// click handler reacts to every click.
#[derive(Clone, Default)]
pub struct ActivationHandlers {
    pub on_click: Option<ActivationHandler>,
    pub on_double_click: Option<ActivationHandler>,
    pub on_right_click: Option<ActivationHandler>,
}

impl fmt::Debug for ActivationHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationHandlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_double_click", &self.on_double_click.is_some())
            .field("on_right_click", &self.on_right_click.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct ItemState {
    id: String,
    title: String,
    tooltip: String,
    icon: Vec<u8>,
    // always derived from `icon`, and only ever replaced together with it
    pixmaps: Vec<Pixmap>,
    last_activation: Option<Instant>,
}

/// State of the tray icon, shared between the [`Tray`][crate::Tray] and the exported
/// [`ItemInterface`].
#[derive(Debug, Clone)]
pub struct NotifierItem {
    state: Arc<Mutex<ItemState>>,
    handlers: Arc<ActivationHandlers>,
    double_click: Duration,
    signals: SignalQueue,
}

impl NotifierItem {
    pub fn new(config: &TrayConfig, icon: Vec<u8>, handlers: ActivationHandlers, signals: SignalQueue) -> Self {
        let pixmaps = pixmaps_from_bytes(&icon);
        let state = ItemState {
            id: config.id.clone(),
            title: config.title.clone(),
            tooltip: config.tooltip.clone(),
            icon,
            pixmaps,
            last_activation: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            handlers: Arc::new(handlers),
            double_click: Duration::from_millis(config.double_click_ms),
            signals,
        }
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn tooltip(&self) -> String {
        self.lock().tooltip.clone()
    }

    /// The encoded icon as it was last set.
    pub fn icon(&self) -> Vec<u8> {
        self.lock().icon.clone()
    }

    pub fn pixmaps(&self) -> Vec<Pixmap> {
        self.lock().pixmaps.clone()
    }

    /// Replace the icon. Undecodable bytes are accepted, the item then has no pixmaps.
    pub fn set_icon(&self, icon: Vec<u8>) {
        let pixmaps = pixmaps_from_bytes(&icon);
        {
            let mut state = self.lock();
            state.icon = icon;
            state.pixmaps = pixmaps;
        }
        self.signals.emit(Signal::NewIcon);
        self.signals.emit(Signal::ItemPropertiesChanged(vec!["IconPixmap", "ToolTip"]));
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = title.into();
        self.signals.emit(Signal::NewTitle);
        self.signals.emit(Signal::ItemPropertiesChanged(vec!["Title"]));
    }

    pub fn set_tooltip(&self, tooltip: impl Into<String>) {
        self.lock().tooltip = tooltip.into();
        self.signals.emit(Signal::ItemPropertiesChanged(vec!["ToolTip"]));
    }

    /// Queue the signals a shell needs to pick up the current icon, tooltip and title.
    pub(crate) fn announce(&self) {
        self.signals.emit(Signal::NewIcon);
        self.signals.emit(Signal::ItemPropertiesChanged(vec!["IconPixmap", "ToolTip", "Title"]));
    }

    /// Primary click on the icon, see [`NotifierItem::activate_at`].
    pub fn activate(&self, x: i32, y: i32) -> crate::Result<()> {
        self.activate_at(Instant::now(), x, y)
    }

    /// Primary click on the icon at `now`.
    ///
    /// A click that follows the previous one within the double click interval runs the double
    /// click handler. Fails with [`Error::Unsupported`] if there is no handler to run.
    pub fn activate_at(&self, now: Instant, x: i32, y: i32) -> crate::Result<()> {
        let is_double = {
            let mut state = self.lock();
            let is_double =
                state.last_activation.is_some_and(|prev| now.saturating_duration_since(prev) < self.double_click);
            state.last_activation = Some(now);
            is_double
        };

        let handler = if is_double {
            self.handlers.on_double_click.as_ref().or(self.handlers.on_click.as_ref())
        } else {
            self.handlers.on_click.as_ref()
        };
        match handler {
            Some(handler) => {
                handler(x, y);
                Ok(())
            }
            None => Err(Error::Unsupported("Activate")),
        }
    }

    pub fn secondary_activate(&self, x: i32, y: i32) -> crate::Result<()> {
        match &self.handlers.on_right_click {
            Some(handler) => {
                handler(x, y);
                Ok(())
            }
            None => Err(Error::Unsupported("SecondaryActivate")),
        }
    }

    /// Unlike [`NotifierItem::secondary_activate`] this never fails: a fault here stops some
    /// shells from showing the menu themselves.
    pub fn context_menu(&self, x: i32, y: i32) {
        if let Some(handler) = &self.handlers.on_right_click {
            handler(x, y);
        }
    }

    pub fn scroll(&self, _delta: i32, _orientation: &str) -> crate::Result<()> {
        Err(Error::Unsupported("Scroll"))
    }

    /// Current value of an item property that can change at runtime.
    pub(crate) fn property_value(&self, name: &str) -> Option<Value<'static>> {
        let state = self.lock();
        match name {
            "Id" => Some(Value::from(state.id.clone())),
            "Title" => Some(Value::from(state.title.clone())),
            "IconPixmap" => Some(Value::from(wire_pixmaps(&state.pixmaps))),
            "ToolTip" => Some(Value::from(tooltip(&state))),
            _ => None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ItemState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn wire_pixmaps(pixmaps: &[Pixmap]) -> Vec<(i32, i32, Vec<u8>)> {
    pixmaps.iter().map(Pixmap::to_wire).collect()
}

/// `(icon name, icon pixmaps, title, description)`
fn tooltip(state: &ItemState) -> (String, Vec<(i32, i32, Vec<u8>)>, String, String) {
    (String::new(), wire_pixmaps(&state.pixmaps), state.tooltip.clone(), String::new())
}

/// The `org.kde.StatusNotifierItem` object.
pub struct ItemInterface {
    item: NotifierItem,
}

impl ItemInterface {
    pub fn new(item: NotifierItem) -> Self {
        Self { item }
    }
}

#[interface(name = "org.kde.StatusNotifierItem")]
impl ItemInterface {
    /// Activate method
    async fn activate(&self, x: i32, y: i32) -> zbus::fdo::Result<()> {
        log::debug!("Activate at {},{}", x, y);
        Ok(self.item.activate(x, y)?)
    }

    /// SecondaryActivate method
    async fn secondary_activate(&self, x: i32, y: i32) -> zbus::fdo::Result<()> {
        log::debug!("SecondaryActivate at {},{}", x, y);
        Ok(self.item.secondary_activate(x, y)?)
    }

    /// ContextMenu method
    async fn context_menu(&self, x: i32, y: i32) {
        log::debug!("ContextMenu at {},{}", x, y);
        self.item.context_menu(x, y);
    }

    /// Scroll method
    async fn scroll(&self, delta: i32, orientation: String) -> zbus::fdo::Result<()> {
        log::debug!("Scroll {} {}", delta, orientation);
        Ok(self.item.scroll(delta, &orientation)?)
    }

    /// NewIcon signal
    #[zbus(signal)]
    pub(crate) async fn new_icon(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewTitle signal
    #[zbus(signal)]
    pub(crate) async fn new_title(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// NewMenu signal
    #[zbus(signal)]
    pub(crate) async fn new_menu(ctxt: &SignalContext<'_>) -> zbus::Result<()>;

    /// Category property
    #[zbus(property)]
    fn category(&self) -> String {
        "ApplicationStatus".to_owned()
    }

    /// Id property
    #[zbus(property)]
    fn id(&self) -> String {
        self.item.id()
    }

    /// Title property
    #[zbus(property)]
    fn title(&self) -> String {
        self.item.title()
    }

    #[zbus(property)]
    fn set_title(&mut self, title: String) {
        log::debug!("Set Title to {:?}", title);
        self.item.set_title(title);
    }

    /// Status property
    #[zbus(property)]
    fn status(&self) -> String {
        "Active".to_owned()
    }

    /// IconName property
    ///
    /// Always empty, so shells use the pixmaps.
    #[zbus(property)]
    fn icon_name(&self) -> String {
        String::new()
    }

    /// IconPixmap property
    #[zbus(property)]
    fn icon_pixmap(&self) -> Vec<(i32, i32, Vec<u8>)> {
        wire_pixmaps(&self.item.pixmaps())
    }

    /// ItemIsMenu property
    #[zbus(property)]
    fn item_is_menu(&self) -> bool {
        true
    }

    /// Menu property
    #[zbus(property)]
    fn menu(&self) -> OwnedObjectPath {
        ObjectPath::from_static_str_unchecked(names::MENU_OBJECT).into()
    }

    /// ToolTip property
    #[zbus(property)]
    fn tool_tip(&self) -> (String, Vec<(i32, i32, Vec<u8>)>, String, String) {
        tooltip(&self.item.lock())
    }

    /// Only the tooltip text is taken; the title and icon fields are ignored.
    #[zbus(property)]
    fn set_tool_tip(&mut self, tool_tip: (String, Vec<(i32, i32, Vec<u8>)>, String, String)) {
        log::debug!("Set ToolTip to {:?}", tool_tip.2);
        self.item.set_tooltip(tool_tip.2);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Click {
        Single,
        Double,
        Right,
    }

    fn recorder(log: &Arc<Mutex<Vec<Click>>>, click: Click) -> Option<ActivationHandler> {
        let log = log.clone();
        Some(Arc::new(move |_: i32, _: i32| log.lock().unwrap().push(click.clone())))
    }

    fn item(handlers: ActivationHandlers) -> (NotifierItem, UnboundedReceiver<Signal>) {
        let (signals, rx) = SignalQueue::new();
        signals.set_running(true);
        let config = TrayConfig { title: "Title".into(), tooltip: "Tip".into(), ..Default::default() };
        (NotifierItem::new(&config, Vec::new(), handlers, signals), rx)
    }

    fn drain(rx: &mut UnboundedReceiver<Signal>) -> Vec<Signal> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_double_click() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (item, _rx) = item(ActivationHandlers {
            on_click: recorder(&log, Click::Single),
            on_double_click: recorder(&log, Click::Double),
            on_right_click: None,
        });

        let start = Instant::now();
        item.activate_at(start, 0, 0).unwrap();
        item.activate_at(start + Duration::from_millis(150), 0, 0).unwrap();
        item.activate_at(start + Duration::from_millis(2000), 0, 0).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![Click::Single, Click::Double, Click::Single]);
    }

    #[test]
    fn test_double_click_falls_back_to_click() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (item, _rx) = item(ActivationHandlers { on_click: recorder(&log, Click::Single), ..Default::default() });

        let start = Instant::now();
        item.activate_at(start, 0, 0).unwrap();
        item.activate_at(start + Duration::from_millis(10), 0, 0).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![Click::Single, Click::Single]);
    }

    #[test]
    fn test_activate_without_handler_is_unsupported() {
        let (item, _rx) = item(ActivationHandlers::default());
        assert!(matches!(item.activate(1, 2), Err(Error::Unsupported("Activate"))));
        assert!(matches!(item.secondary_activate(1, 2), Err(Error::Unsupported("SecondaryActivate"))));
        assert!(matches!(item.scroll(3, "vertical"), Err(Error::Unsupported("Scroll"))));
        item.context_menu(1, 2);
    }

    #[test]
    fn test_right_click() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (item, _rx) = item(ActivationHandlers { on_right_click: recorder(&log, Click::Right), ..Default::default() });
        item.secondary_activate(0, 0).unwrap();
        item.context_menu(0, 0);
        assert_eq!(*log.lock().unwrap(), vec![Click::Right, Click::Right]);
        assert!(item.activate(0, 0).is_err());
    }

    #[tokio::test]
    async fn test_remote_faults() {
        let (item, _rx) = item(ActivationHandlers::default());
        let iface = ItemInterface::new(item);
        assert!(matches!(iface.activate(0, 0).await, Err(zbus::fdo::Error::UnknownMethod(_))));
        assert!(matches!(iface.secondary_activate(0, 0).await, Err(zbus::fdo::Error::UnknownMethod(_))));
        assert!(matches!(iface.scroll(1, "horizontal".into()).await, Err(zbus::fdo::Error::UnknownMethod(_))));
        iface.context_menu(0, 0).await;
    }

    #[test]
    fn test_setters_signal() {
        let (item, mut rx) = item(ActivationHandlers::default());

        item.set_title("New");
        assert_eq!(item.title(), "New");
        assert_eq!(drain(&mut rx), vec![Signal::NewTitle, Signal::ItemPropertiesChanged(vec!["Title"])]);

        item.set_tooltip("More");
        assert_eq!(item.tooltip(), "More");
        assert_eq!(drain(&mut rx), vec![Signal::ItemPropertiesChanged(vec!["ToolTip"])]);

        item.set_icon(b"garbage".to_vec());
        assert_eq!(item.icon(), b"garbage".to_vec());
        assert!(item.pixmaps().is_empty());
        assert_eq!(drain(&mut rx), vec![
            Signal::NewIcon,
            Signal::ItemPropertiesChanged(vec!["IconPixmap", "ToolTip"])
        ]);
    }

    #[test]
    fn test_properties() {
        let (item, _rx) = item(ActivationHandlers::default());
        let iface = ItemInterface::new(item.clone());
        assert_eq!(iface.category(), "ApplicationStatus");
        assert_eq!(iface.id(), "1");
        assert_eq!(iface.status(), "Active");
        assert_eq!(iface.icon_name(), "");
        assert!(iface.item_is_menu());
        assert_eq!(iface.menu().as_str(), names::MENU_OBJECT);
        assert_eq!(iface.tool_tip(), (String::new(), vec![], "Tip".to_owned(), String::new()));

        assert_eq!(item.property_value("Title"), Some(Value::from("Title")));
        assert_eq!(item.property_value("Status"), None);
    }

    #[test]
    fn test_remote_title_set() {
        let (item, mut rx) = item(ActivationHandlers::default());
        let mut iface = ItemInterface::new(item.clone());
        iface.set_title("Remote".into());
        assert_eq!(item.title(), "Remote");
        assert_eq!(drain(&mut rx)[0], Signal::NewTitle);
    }

    #[test]
    fn test_remote_tooltip_set() {
        let (item, mut rx) = item(ActivationHandlers::default());
        let mut iface = ItemInterface::new(item.clone());
        iface.set_tool_tip(("ignored".into(), vec![(1, 1, vec![0, 0, 0, 0])], "Remote tip".into(), "body".into()));
        assert_eq!(item.tooltip(), "Remote tip");
        assert_eq!(iface.tool_tip().2, "Remote tip");
        assert_eq!(drain(&mut rx), vec![Signal::ItemPropertiesChanged(vec!["ToolTip"])]);
    }
}
