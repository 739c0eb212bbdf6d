//! Subscription bookkeeping shared by change sources.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{ChangeSink, SubscriptionId};
use crate::change::{ChangeEvent, Mutation};
use crate::key_path::KeyPath;
use crate::value::Value;

/// A change about to be applied to one key path.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingChange {
    /// The key path being written.
    pub key_path: KeyPath,

    /// The value the key path will hold afterwards.
    pub new_value: Option<Value>,

    /// What kind of change this is.
    pub mutation: Mutation,
}

impl PendingChange {
    /// A wholesale setting of the value at `key_path`.
    #[must_use]
    pub const fn setting(key_path: KeyPath, new_value: Option<Value>) -> Self {
        Self {
            key_path,
            new_value,
            mutation: Mutation::Setting,
        }
    }

    /// A relationship mutation leaving `new_value` at `key_path`.
    #[must_use]
    pub const fn mutation(key_path: KeyPath, new_value: Option<Value>, mutation: Mutation) -> Self {
        Self {
            key_path,
            new_value,
            mutation,
        }
    }
}

struct Subscriber {
    id: SubscriptionId,
    key_path: KeyPath,
    wants_prior: bool,
    sink: Weak<dyn ChangeSink>,
}

/// One event to deliver, resolved while the registry lock was held.
struct Delivery {
    sink: Arc<dyn ChangeSink>,
    key_path: KeyPath,
    wants_prior: bool,
    mutation: Mutation,
    pending: Option<Value>,
    before: Option<Value>,
}

/// Subscription table for implementors of [`Observable`](super::Observable).
///
/// The registry matches each change against its subscribers:
/// - a subscriber on the changed key path receives the change itself
/// - a subscriber beneath it (`"address.city"` when `"address"` is set)
///   receives a [`Mutation::Setting`] with values resolved at its own path
///
/// Sinks are held weakly; dead ones are pruned whenever changes are matched.
/// No lock is held while sinks run, so a sink may mutate the source again.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscription.
    pub fn subscribe(
        &self,
        key_path: &KeyPath,
        wants_prior: bool,
        sink: Weak<dyn ChangeSink>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        self.subscribers.lock().push(Subscriber {
            id,
            key_path: key_path.clone(),
            wants_prior,
            sink,
        });

        tracing::debug!(%key_path, %id, wants_prior, "subscribed");
        id
    }

    /// Removes a subscription. Returns `false` if the id was unknown.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;

        if removed {
            tracing::debug!(%id, "unsubscribed");
        }
        removed
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|s| s.sink.strong_count() > 0)
            .count()
    }

    /// Returns `true` if there are no live subscriptions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `apply` and notifies subscribers around it.
    ///
    /// 1. Subscribers affected by `changes` are collected and their current
    ///    values are read through `read`
    /// 2. Subscribers that asked for prior events receive them
    /// 3. `apply` runs; on error nothing further is delivered
    /// 4. Every affected subscriber receives the post-change event with the
    ///    value read after `apply`
    ///
    /// # Errors
    ///
    /// Returns whatever `apply` returns.
    pub fn perform<R, E, F, A>(&self, changes: &[PendingChange], read: F, apply: A) -> Result<R, E>
    where
        F: Fn(&KeyPath) -> Option<Value>,
        A: FnOnce() -> Result<R, E>,
    {
        let deliveries = self.collect(changes, &read);

        if !deliveries.is_empty() {
            tracing::trace!(
                changes = changes.len(),
                deliveries = deliveries.len(),
                "delivering change"
            );
        }

        for delivery in deliveries.iter().filter(|d| d.wants_prior) {
            delivery.sink.receive(&ChangeEvent {
                key_path: delivery.key_path.clone(),
                is_prior: true,
                current: delivery.pending.clone(),
                previous: delivery.before.clone(),
                mutation: delivery.mutation.clone(),
            });
        }

        let result = apply()?;

        for delivery in deliveries {
            let after = read(&delivery.key_path);
            delivery.sink.receive(&ChangeEvent {
                key_path: delivery.key_path,
                is_prior: false,
                current: after,
                previous: delivery.before,
                mutation: delivery.mutation,
            });
        }

        Ok(result)
    }

    fn collect<F>(&self, changes: &[PendingChange], read: &F) -> Vec<Delivery>
    where
        F: Fn(&KeyPath) -> Option<Value>,
    {
        let mut matched = Vec::new();

        {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|s| s.sink.strong_count() > 0);

            for subscriber in subscribers.iter() {
                let Some(delivery) = changes.iter().find_map(|change| match_change(subscriber, change))
                else {
                    continue;
                };

                if let Some(sink) = subscriber.sink.upgrade() {
                    matched.push((sink, delivery));
                }
            }
        }

        // Values are read after the lock is released; `read` may take the
        // source's own locks.
        matched
            .into_iter()
            .map(|(sink, (key_path, wants_prior, mutation, pending))| {
                let before = read(&key_path);
                Delivery {
                    sink,
                    key_path,
                    wants_prior,
                    mutation,
                    pending,
                    before,
                }
            })
            .collect()
    }
}

type Matched = (KeyPath, bool, Mutation, Option<Value>);

fn match_change(subscriber: &Subscriber, change: &PendingChange) -> Option<Matched> {
    if subscriber.key_path == change.key_path {
        return Some((
            subscriber.key_path.clone(),
            subscriber.wants_prior,
            change.mutation.clone(),
            change.new_value.clone(),
        ));
    }

    let rest = subscriber.key_path.relative_to(&change.key_path)?;
    let pending = change
        .new_value
        .as_ref()
        .and_then(|value| value.get_path(rest.segments()))
        .cloned();

    Some((
        subscriber.key_path.clone(),
        subscriber.wants_prior,
        Mutation::Setting,
        pending,
    ))
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscriptions", &self.len())
            .finish_non_exhaustive()
    }
}
