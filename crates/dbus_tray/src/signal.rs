//! Outbound signals.
//!
//! Mutators never talk to the bus themselves. They queue a [`Signal`] once their locks are
//! released, and a pump task owned by the [`Tray`][crate::Tray] drains the queue and does the
//! actual (possibly blocking) sends. A failed send is logged and dropped: the next `LayoutUpdated`
//! carries the current revision, which is enough for clients to resynchronize.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use zbus::{zvariant::Value, Interface, SignalContext};

use crate::{
    menu::{dbus::MenuInterface, Properties},
    names, ItemInterface, NotifierItem,
};

/// A signal waiting to be sent. Menu signals carry the values they announce, item property
/// changes are resolved against the item state when the signal is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// `com.canonical.dbusmenu.LayoutUpdated`
    LayoutUpdated { revision: u32, parent: i32 },
    /// `com.canonical.dbusmenu.ItemsPropertiesUpdated`
    ItemsPropertiesUpdated { updated: Vec<(i32, Properties)>, removed: Vec<(i32, Vec<String>)> },
    /// `PropertiesChanged` for the menu object's `Version` property.
    MenuVersionChanged(u32),
    /// `org.kde.StatusNotifierItem.NewIcon`
    NewIcon,
    /// `org.kde.StatusNotifierItem.NewTitle`
    NewTitle,
    /// `org.kde.StatusNotifierItem.NewMenu`
    NewMenu,
    /// `PropertiesChanged` for the named properties of the item object.
    ItemPropertiesChanged(Vec<&'static str>),
}

impl Signal {
    fn name(&self) -> &'static str {
        match self {
            Signal::LayoutUpdated { .. } => "LayoutUpdated",
            Signal::ItemsPropertiesUpdated { .. } => "ItemsPropertiesUpdated",
            Signal::MenuVersionChanged(_) => "PropertiesChanged(Version)",
            Signal::NewIcon => "NewIcon",
            Signal::NewTitle => "NewTitle",
            Signal::NewMenu => "NewMenu",
            Signal::ItemPropertiesChanged(_) => "PropertiesChanged",
        }
    }
}

/// Sending half of the signal queue, shared by the menu and the item.
///
/// While the queue is not running (before [`Tray::start`][crate::Tray::start] and after
/// [`Tray::stop`][crate::Tray::stop]) signals are silently discarded.
#[derive(Debug, Clone)]
pub struct SignalQueue {
    tx: mpsc::UnboundedSender<Signal>,
    running: Arc<AtomicBool>,
}

impl SignalQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, running: Arc::new(AtomicBool::new(false)) }, rx)
    }

    pub fn emit(&self, signal: Signal) {
        if !self.is_running() {
            log::trace!("not running, dropping {}", signal.name());
            return;
        }
        if let Err(e) = self.tx.send(signal) {
            log::debug!("signal queue closed, dropping {}", e.0.name());
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Drain `rx` and send every signal on `con` until `token` is cancelled.
///
/// The receiver stays locked while the pump runs; it is shared so the queue survives a restart.
pub(crate) async fn pump_signals(
    con: zbus::Connection,
    item: NotifierItem,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Signal>>>,
    token: CancellationToken,
) {
    let mut rx = rx.lock().await;
    loop {
        let signal = tokio::select! {
            _ = token.cancelled() => break,
            signal = rx.recv() => match signal {
                Some(signal) => signal,
                None => break,
            },
        };
        let name = signal.name();
        if let Err(e) = send_signal(&con, &item, signal).await {
            log::warn!("failed to send {}: {}", name, e);
        }
    }
    log::debug!("signal pump stopped");
}

async fn send_signal(con: &zbus::Connection, item: &NotifierItem, signal: Signal) -> zbus::Result<()> {
    match signal {
        Signal::LayoutUpdated { revision, parent } => {
            let ctxt = SignalContext::new(con, names::MENU_OBJECT)?;
            MenuInterface::layout_updated(&ctxt, revision, parent).await
        }
        Signal::ItemsPropertiesUpdated { updated, removed } => {
            let ctxt = SignalContext::new(con, names::MENU_OBJECT)?;
            let updated: Vec<(i32, HashMap<String, Value<'static>>)> =
                updated.into_iter().map(|(id, props)| (id, props.into_wire())).collect();
            MenuInterface::items_properties_updated(&ctxt, updated, removed).await
        }
        Signal::MenuVersionChanged(version) => {
            let ctxt = SignalContext::new(con, names::MENU_OBJECT)?;
            let version = Value::from(version);
            let changed = HashMap::from([("Version", &version)]);
            zbus::fdo::Properties::properties_changed(&ctxt, MenuInterface::name(), &changed, &[]).await
        }
        Signal::NewIcon => {
            let ctxt = SignalContext::new(con, names::ITEM_OBJECT)?;
            ItemInterface::new_icon(&ctxt).await
        }
        Signal::NewTitle => {
            let ctxt = SignalContext::new(con, names::ITEM_OBJECT)?;
            ItemInterface::new_title(&ctxt).await
        }
        Signal::NewMenu => {
            let ctxt = SignalContext::new(con, names::ITEM_OBJECT)?;
            ItemInterface::new_menu(&ctxt).await
        }
        Signal::ItemPropertiesChanged(property_names) => {
            let ctxt = SignalContext::new(con, names::ITEM_OBJECT)?;
            let values: Vec<_> =
                property_names.iter().filter_map(|name| item.property_value(name).map(|v| (*name, v))).collect();
            let changed: HashMap<&str, &Value<'_>> = values.iter().map(|(k, v)| (*k, v)).collect();
            zbus::fdo::Properties::properties_changed(&ctxt, ItemInterface::name(), &changed, &[]).await
        }
    }
}
