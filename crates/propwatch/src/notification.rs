//! In-process named notifications.
//!
//! A [`NotificationCenter`] broadcasts [`Notification`]s to callbacks
//! registered for a name and optionally a sender. Observers post to it with
//! [`PropertyObserver::post_notification`](crate::PropertyObserver::post_notification).
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use propwatch::{Notification, NotificationCenter};
//!
//! let center = NotificationCenter::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&seen);
//! let token = center.add_observer(Some("saved"), move |_| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! center.post(&Notification::new("saved"));
//! center.post(&Notification::new("ignored"));
//! center.remove_observer(token);
//! center.post(&Notification::new("saved"));
//!
//! assert_eq!(seen.load(Ordering::SeqCst), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;

use crate::source::Observable;
use crate::value::Value;

/// A named message with an optional sender and payload.
#[derive(Clone)]
pub struct Notification {
    /// Notification name.
    pub name: String,

    /// The object the notification is about.
    pub sender: Option<Arc<dyn Observable>>,

    /// Payload.
    pub user_info: BTreeMap<String, Value>,
}

impl Notification {
    /// Creates a notification with no sender and an empty payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sender: None,
            user_info: BTreeMap::new(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: Arc<dyn Observable>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Adds a payload entry.
    #[must_use]
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.user_info.insert(key.into(), value.into());
        self
    }

    /// Looks up a payload entry.
    #[must_use]
    pub fn info(&self, key: &str) -> Option<&Value> {
        self.user_info.get(key)
    }

    /// Returns `true` if `sender` is the sender of this notification.
    pub fn is_from<T: Observable + ?Sized>(&self, sender: &Arc<T>) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|own| std::ptr::addr_eq(Arc::as_ptr(own), Arc::as_ptr(sender)))
    }
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("name", &self.name)
            .field("has_sender", &self.sender.is_some())
            .field("user_info", &self.user_info)
            .finish()
    }
}

/// Handle returned by [`NotificationCenter::add_observer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NotificationToken(u64);

type Callback = Arc<dyn Fn(&Notification) + Send + Sync + 'static>;

struct Registration {
    token: NotificationToken,
    name: Option<String>,
    sender: Option<Weak<dyn Observable>>,
    callback: Callback,
}

impl Registration {
    fn sender_dropped(&self) -> bool {
        self.sender.as_ref().is_some_and(|sender| sender.strong_count() == 0)
    }

    fn matches(&self, notification: &Notification) -> bool {
        if self
            .name
            .as_deref()
            .is_some_and(|name| name != notification.name)
        {
            return false;
        }

        match (&self.sender, &notification.sender) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(wanted), Some(sender)) => {
                wanted.strong_count() > 0 && std::ptr::addr_eq(wanted.as_ptr(), Arc::as_ptr(sender))
            }
        }
    }
}

/// Broadcasts notifications to registered callbacks.
///
/// Callbacks run synchronously on the posting thread, outside any lock, in
/// registration order. A callback may post or (un)register from within.
#[derive(Default)]
pub struct NotificationCenter {
    next_token: AtomicU64,
    registrations: RwLock<Vec<Registration>>,
}

impl NotificationCenter {
    /// Creates a standalone center.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide center.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<NotificationCenter>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Registers `callback` for notifications named `name` (any name when
    /// `None`), from any sender.
    pub fn add_observer<F>(&self, name: Option<&str>, callback: F) -> NotificationToken
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.register(name, None, Arc::new(callback))
    }

    /// Registers `callback` for notifications named `name` posted by
    /// `sender`. The sender is held weakly.
    pub fn add_observer_for<T, F>(
        &self,
        name: Option<&str>,
        sender: &Arc<T>,
        callback: F,
    ) -> NotificationToken
    where
        T: Observable,
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let sender: Weak<dyn Observable> = Arc::downgrade(sender) as Weak<dyn Observable>;
        self.register(name, Some(sender), Arc::new(callback))
    }

    /// Unregisters a callback. Returns `false` if the token was unknown.
    pub fn remove_observer(&self, token: NotificationToken) -> bool {
        let mut registrations = self.registrations.write();
        let before = registrations.len();
        registrations.retain(|r| r.token != token);
        registrations.len() != before
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.registrations.read().len()
    }

    /// Delivers `notification` to every matching callback and returns how
    /// many were called.
    ///
    /// Registrations whose sender has been dropped are removed first.
    pub fn post(&self, notification: &Notification) -> usize {
        let callbacks: Vec<Callback> = {
            let mut registrations = self.registrations.write();
            let before = registrations.len();
            registrations.retain(|r| !r.sender_dropped());
            if registrations.len() != before {
                tracing::debug!(
                    pruned = before - registrations.len(),
                    "dropped registrations for released senders"
                );
            }
            registrations
                .iter()
                .filter(|r| r.matches(notification))
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };

        tracing::trace!(
            name = %notification.name,
            receivers = callbacks.len(),
            "posting notification"
        );

        for callback in &callbacks {
            callback(notification);
        }
        callbacks.len()
    }

    /// Builds and posts a notification.
    pub fn post_named(
        &self,
        name: impl Into<String>,
        sender: Option<Arc<dyn Observable>>,
        user_info: BTreeMap<String, Value>,
    ) -> usize {
        self.post(&Notification {
            name: name.into(),
            sender,
            user_info,
        })
    }

    fn register(
        &self,
        name: Option<&str>,
        sender: Option<Weak<dyn Observable>>,
        callback: Callback,
    ) -> NotificationToken {
        let token = NotificationToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.registrations.write().push(Registration {
            token,
            name: name.map(str::to_string),
            sender,
            callback,
        });
        token
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("observers", &self.observer_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ObservableObject;
    use parking_lot::Mutex;

    #[test]
    fn test_name_filter() {
        let center = NotificationCenter::new();
        let names = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&names);
        center.add_observer(None, move |n| seen.lock().push(n.name.clone()));

        let seen = Arc::clone(&names);
        center.add_observer(Some("b"), move |n| seen.lock().push(format!("only-{}", n.name)));

        assert_eq!(center.post(&Notification::new("a")), 1);
        assert_eq!(center.post(&Notification::new("b")), 2);
        assert_eq!(*names.lock(), vec!["a", "b", "only-b"]);
    }

    #[test]
    fn test_sender_filter_by_identity() {
        let center = NotificationCenter::new();
        let watched = Arc::new(ObservableObject::new());
        let other = Arc::new(ObservableObject::new());
        let hits = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&hits);
        center.add_observer_for(Some("changed"), &watched, move |n| {
            assert!(n.info("value").is_some());
            *counter.lock() += 1;
        });

        let from_watched: Arc<dyn Observable> = watched.clone();
        let from_other: Arc<dyn Observable> = other;
        center.post(&Notification::new("changed").with_sender(from_other).with_info("value", 1));
        center.post(&Notification::new("changed").with_info("value", 1));
        center.post(
            &Notification::new("changed")
                .with_sender(from_watched)
                .with_info("value", 2),
        );

        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_callback_may_unregister_itself() {
        let center = Arc::new(NotificationCenter::new());
        let token_slot = Arc::new(Mutex::new(None));

        let inner_center = Arc::clone(&center);
        let slot = Arc::clone(&token_slot);
        let token = center.add_observer(Some("once"), move |_| {
            if let Some(token) = slot.lock().take() {
                inner_center.remove_observer(token);
            }
        });
        *token_slot.lock() = Some(token);

        assert_eq!(center.post(&Notification::new("once")), 1);
        assert_eq!(center.post(&Notification::new("once")), 0);
        assert_eq!(center.observer_count(), 0);
    }

    #[test]
    fn test_post_prunes_released_senders() {
        let center = NotificationCenter::new();
        let sender = Arc::new(ObservableObject::new());
        center.add_observer_for(Some("changed"), &sender, |_| {});
        center.add_observer(Some("changed"), |_| {});
        assert_eq!(center.observer_count(), 2);

        drop(sender);
        assert_eq!(center.post(&Notification::new("changed")), 1);
        assert_eq!(center.observer_count(), 1);
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&NotificationCenter::global(), &NotificationCenter::global()));
    }
}
