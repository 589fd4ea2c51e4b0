use zbus::proxy;

use crate::names;

/// The part of [`org.kde.StatusNotifierWatcher`] an item needs.
///
/// [`org.kde.StatusNotifierWatcher`]: https://freedesktop.org/wiki/Specifications/StatusNotifierItem/StatusNotifierWatcher/
#[proxy(
    interface = "org.kde.StatusNotifierWatcher",
    default_service = "org.kde.StatusNotifierWatcher",
    default_path = "/StatusNotifierWatcher"
)]
trait StatusNotifierWatcher {
    /// RegisterStatusNotifierItem method
    fn register_status_notifier_item(&self, service: &str) -> zbus::Result<()>;
}

/// Tell the watcher about our item, so trays pick it up.
///
/// The item is registered by object path; the watcher resolves the sender's unique name itself.
/// Having no watcher around isn't fatal (a tray started later will still find the well-known
/// name), so failures are only logged.
pub async fn register_with_watcher(con: &zbus::Connection) {
    let result = async {
        let snw = StatusNotifierWatcherProxy::new(con).await?;
        snw.register_status_notifier_item(names::ITEM_OBJECT).await
    }
    .await;

    match result {
        Ok(()) => log::info!("registered {} with {}", names::ITEM_OBJECT, names::WATCHER_BUS),
        Err(e) => log::warn!("failed to register with {}: {}", names::WATCHER_BUS, e),
    }
}
