//! Property change notifications raised by translators.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

/// Callback invoked with the new value of a property.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// A property notification as seen by stream subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub property: String,
    pub value: Value,
}

/// Listener registry plus a broadcast stream of every emitted notification.
///
/// Callbacks are identified by their `Arc`, so removing a listener requires
/// the same handle that was added.
#[derive(Clone)]
pub struct NotificationHub {
    listeners: Arc<Mutex<HashMap<String, Vec<Listener>>>>,
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            sender,
        }
    }

    pub fn add_listener(&self, property: &str, listener: Listener) {
        self.listeners
            .lock()
            .entry(property.to_owned())
            .or_default()
            .push(listener);
    }

    /// Returns whether the listener was registered for `property`.
    pub fn remove_listener(&self, property: &str, listener: &Listener) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(registered) = listeners.get_mut(property) else {
            return false;
        };
        let Some(index) = registered
            .iter()
            .position(|candidate| Arc::ptr_eq(candidate, listener))
        else {
            return false;
        };
        registered.remove(index);
        if registered.is_empty() {
            listeners.remove(property);
        }
        true
    }

    pub fn listener_count(&self, property: &str) -> usize {
        self.listeners.lock().get(property).map_or(0, Vec::len)
    }

    /// Calls the listeners registered for `property` and publishes the value
    /// to stream subscribers. Returns how many listeners were called.
    pub fn emit(&self, property: &str, value: Value) -> usize {
        // Snapshot so callbacks may add or remove listeners.
        let listeners = self
            .listeners
            .lock()
            .get(property)
            .cloned()
            .unwrap_or_default();
        for listener in &listeners {
            listener(&value);
        }

        let _ = self.sender.send(Notification {
            property: property.to_owned(),
            value,
        });
        debug!(property, listeners = listeners.len(), "notification emitted");
        listeners.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscribe_stream(&self) -> BroadcastStream<Notification> {
        BroadcastStream::new(self.sender.subscribe())
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("NotificationHub")
            .field("properties", &listeners.keys().collect::<Vec<_>>())
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio_stream::StreamExt;

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>) -> Listener {
        let counter = counter.clone();
        Arc::new(move |_: &Value| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn emits_to_listeners_of_the_property_only() {
        let hub = NotificationHub::default();
        let power = Arc::new(AtomicUsize::new(0));
        let level = Arc::new(AtomicUsize::new(0));
        hub.add_listener("power", counting(&power));
        hub.add_listener("level", counting(&level));

        assert_eq!(hub.emit("power", json!(true)), 1);
        assert_eq!(power.load(Ordering::SeqCst), 1);
        assert_eq!(level.load(Ordering::SeqCst), 0);
        assert_eq!(hub.emit("unknown", json!(1)), 0);
    }

    #[test]
    fn removes_listener_by_identity() {
        let hub = NotificationHub::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let first = counting(&calls);
        let second = counting(&calls);
        hub.add_listener("power", first.clone());
        hub.add_listener("power", second.clone());

        assert!(hub.remove_listener("power", &first));
        assert!(!hub.remove_listener("power", &first));
        assert_eq!(hub.listener_count("power"), 1);

        hub.emit("power", json!(false));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(hub.remove_listener("power", &second));
        assert_eq!(hub.listener_count("power"), 0);
    }

    #[tokio::test]
    async fn stream_subscribers_see_every_notification() {
        let hub = NotificationHub::new(8);
        let mut stream = hub.subscribe_stream();

        hub.emit("power", json!(true));
        hub.emit("level", json!(40));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.property, "power");
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(
            second,
            Notification {
                property: "level".to_owned(),
                value: json!(40)
            }
        );
    }
}
