use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    menu::{ClickHandler, MenuInterface, ToggleHandler},
    names, register_with_watcher,
    signal::pump_signals,
    ActivationHandlers, Error, ItemInterface, Menu, NotifierItem, Result, Signal, SignalQueue, TrayConfig,
};

/// Everything that only exists while the tray is exported.
#[derive(Debug)]
struct Session {
    con: zbus::Connection,
    bus_name: String,
    token: CancellationToken,
    pump: JoinHandle<()>,
}

/// A tray icon with its context menu.
///
/// The item and menu can be changed at any time. Changes made while the tray is stopped are kept,
/// but not announced; shells read the current state when [`Tray::start`] exports it.
#[derive(Debug)]
pub struct Tray {
    config: TrayConfig,
    item: NotifierItem,
    menu: Menu,
    signals: SignalQueue,
    rx: Arc<Mutex<mpsc::UnboundedReceiver<Signal>>>,
    session: Option<Session>,
}

impl Tray {
    pub fn new(config: TrayConfig, icon: Vec<u8>, handlers: ActivationHandlers) -> Self {
        let (signals, rx) = SignalQueue::new();
        let item = NotifierItem::new(&config, icon, handlers, signals.clone());
        let menu = Menu::new(signals.clone(), config.menu);
        Self { config, item, menu, signals, rx: Arc::new(Mutex::new(rx)), session: None }
    }

    pub fn config(&self) -> &TrayConfig {
        &self.config
    }

    pub fn item(&self) -> &NotifierItem {
        &self.item
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Connect to the session bus, export the item and its menu, and announce them.
    ///
    /// Does nothing if the tray is already running.
    pub async fn start(&mut self) -> Result<()> {
        if self.session.is_some() {
            log::info!("tray already running");
            return Ok(());
        }

        let con = zbus::Connection::session().await?;

        if !con.object_server().at(names::ITEM_OBJECT, ItemInterface::new(self.item.clone())).await? {
            return Err(Error::ObjectExists(names::ITEM_OBJECT));
        }
        // without a menu the icon is still useful
        match con.object_server().at(names::MENU_OBJECT, MenuInterface::new(self.menu.clone())).await {
            Ok(true) => {}
            Ok(false) => log::error!("failed to export menu: object already exists at {}", names::MENU_OBJECT),
            Err(e) => log::error!("failed to export menu: {}", e),
        }

        let bus_name = names::item_bus_name();
        con.request_name(bus_name.as_str()).await?;
        log::info!("tray exported as {}", bus_name);

        let token = CancellationToken::new();
        let pump = tokio::spawn(pump_signals(con.clone(), self.item.clone(), self.rx.clone(), token.clone()));
        self.signals.set_running(true);

        if self.config.register_with_watcher {
            register_with_watcher(&con).await;
        }
        self.item.announce();

        self.session = Some(Session { con, bus_name, token, pump });
        Ok(())
    }

    /// Un-export both objects and close the connection.
    ///
    /// Calls already being handled get [`TrayConfig::shutdown_grace_ms`] to finish. Does nothing if
    /// the tray isn't running.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.signals.set_running(false);

        {
            let server = session.con.object_server();
            if let Err(e) = server.remove::<ItemInterface, _>(names::ITEM_OBJECT).await {
                log::warn!("failed to remove {}: {}", names::ITEM_OBJECT, e);
            }
            if let Err(e) = server.remove::<MenuInterface, _>(names::MENU_OBJECT).await {
                log::warn!("failed to remove {}: {}", names::MENU_OBJECT, e);
            }
        }

        tokio::time::sleep(Duration::from_millis(self.config.shutdown_grace_ms)).await;

        session.token.cancel();
        if let Err(e) = session.pump.await {
            log::error!("signal pump failed: {}", e);
        }
        let stale = self.discard_queued().await;
        if stale > 0 {
            log::debug!("discarded {} unsent signals", stale);
        }

        if let Err(e) = session.con.release_name(session.bus_name.as_str()).await {
            log::warn!("failed to release {}: {}", session.bus_name, e);
        }
        log::info!("tray stopped");
    }

    /// Add a clickable entry at the end of the top level menu.
    pub fn add_menu_item(&self, label: impl Into<String>, on_click: Option<ClickHandler>) -> i32 {
        self.menu.add_item(label, on_click)
    }

    /// Add a checkbox entry at the end of the top level menu.
    pub fn add_menu_item_checkbox(
        &self,
        label: impl Into<String>,
        checked: bool,
        on_toggle: Option<ToggleHandler>,
    ) -> i32 {
        self.menu.add_checkable_item(label, checked, on_toggle)
    }

    pub fn add_separator(&self) -> i32 {
        self.menu.add_separator()
    }

    pub fn set_menu_item_label(&self, id: i32, label: impl Into<String>) {
        self.menu.set_label(id, label);
    }

    pub fn set_menu_item_enabled(&self, id: i32, enabled: bool) {
        self.menu.set_enabled(id, enabled);
    }

    pub fn set_menu_item_visible(&self, id: i32, visible: bool) {
        self.menu.set_visible(id, visible);
    }

    pub fn set_menu_item_checked(&self, id: i32, checked: bool) {
        self.menu.set_checked(id, checked);
    }

    /// Remove every menu entry, keeping the root.
    pub fn reset_menu(&self) {
        self.menu.reset();
    }

    pub fn set_icon(&self, icon: Vec<u8>) {
        self.item.set_icon(icon);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.item.set_title(title);
    }

    pub fn set_tooltip(&self, tooltip: impl Into<String>) {
        self.item.set_tooltip(tooltip);
    }

    async fn discard_queued(&self) -> usize {
        let mut rx = self.rx.lock().await;
        std::iter::from_fn(|| rx.try_recv().ok()).count()
    }
}

impl Drop for Tray {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.signals.set_running(false);
            session.token.cancel();
        }
    }
}
