use std::any::{type_name, Any};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use super::error::ChannelError;

type Callback<T> = Box<dyn FnMut(&T) -> anyhow::Result<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Entry<T> {
    id: SubscriberId,
    live: Cell<bool>,
    callback: RefCell<Callback<T>>,
}

struct Inner<T> {
    name: String,
    next_id: Cell<u64>,
    entries: RefCell<Vec<Rc<Entry<T>>>>,
    constant: RefCell<Option<T>>,
}

impl<T> Inner<T> {
    fn remove(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.iter().position(|e| e.id == id) {
            Some(index) => {
                // An in-flight publish holds its own snapshot; the flag stops delivery there too.
                entries.remove(index).live.set(false);
                true
            }
            None => false,
        }
    }
}

trait Detach {
    fn detach(&self, id: SubscriberId) -> bool;
}

impl<T> Detach for Inner<T> {
    fn detach(&self, id: SubscriberId) -> bool {
        self.remove(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFailure {
    pub subscriber: SubscriberId,
    pub reason: String,
}

/// Outcome of one publish. Failures never stop delivery to the remaining subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failures: Vec<SubscriberFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Typed, synchronous publish/subscribe bus.
///
/// Single-threaded: the handle is `Clone` and shares one subscriber list.
/// Delivery follows registration order. A publish iterates a snapshot, so
/// subscribers added from inside a callback first see the *next* publish, while
/// subscribers removed from inside a callback are skipped immediately.
pub struct Channel<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.inner.name)
            .field("subscribers", &self.inner.entries.borrow().len())
            .finish()
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::named("anonymous")
    }
}

impl<T: 'static> Channel<T> {
    pub fn named(name: &str) -> Self {
        Self {
            inner: Rc::new(Inner {
                name: name.to_string(),
                next_id: Cell::new(0),
                entries: RefCell::new(Vec::new()),
                constant: RefCell::new(None),
            }),
        }
    }

    /// Channel carrying a design-time constant for [`Channel::inject_constant`].
    pub fn with_constant(name: &str, constant: T) -> Self {
        let channel = Self::named(name);
        channel.set_constant(Some(constant));
        channel
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn set_constant(&self, constant: Option<T>) {
        *self.inner.constant.borrow_mut() = constant;
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    /// Registers `callback`. No duplicate detection: the same closure logic may be
    /// registered many times and each registration is delivered separately.
    ///
    /// The returned guard unsubscribes when dropped.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) -> anyhow::Result<()> + 'static,
    {
        let id = SubscriberId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        self.inner.entries.borrow_mut().push(Rc::new(Entry {
            id,
            live: Cell::new(true),
            callback: RefCell::new(Box::new(callback)),
        }));
        trace!(channel = %self.inner.name, ?id, "subscribed");

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        let owner: Weak<dyn Detach> = weak;
        Subscription { id, owner: Some(owner) }
    }

    /// Removes one registration. Unknown ids are a no-op and return `false`.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        trace!(channel = %self.inner.name, ?id, removed, "unsubscribe");
        removed
    }

    pub fn publish(&self, value: T) -> PublishReport {
        self.publish_ref(&value)
    }

    pub fn publish_ref(&self, value: &T) -> PublishReport {
        let snapshot: Vec<Rc<Entry<T>>> = self.inner.entries.borrow().clone();
        let mut report = PublishReport::default();

        for entry in snapshot {
            if !entry.live.get() {
                continue;
            }

            let outcome = match entry.callback.try_borrow_mut() {
                Ok(mut callback) => (*callback)(value).map_err(|e| format!("{e:#}")),
                Err(_) => Err("subscriber is already running (re-entrant publish)".to_string()),
            };

            match outcome {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    warn!(channel = %self.inner.name, subscriber = ?entry.id, %reason, "subscriber failed, continuing");
                    report.failures.push(SubscriberFailure { subscriber: entry.id, reason });
                }
            }
        }

        trace!(channel = %self.inner.name, delivered = report.delivered, "published");
        report
    }
}

impl<T: Clone + 'static> Channel<T> {
    /// Publishes the configured constant (design-time trigger).
    pub fn inject_constant(&self) -> Result<PublishReport, ChannelError> {
        let constant = self.inner.constant.borrow().clone();
        match constant {
            Some(value) => Ok(self.publish(value)),
            None => Err(ChannelError::NoConstant(self.inner.name.clone())),
        }
    }
}

/// Scoped registration on a [`Channel`]. Dropping it unsubscribes.
pub struct Subscription {
    id: SubscriberId,
    owner: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Keeps the registration alive for as long as the channel lives.
    pub fn detach(mut self) -> SubscriberId {
        self.owner = None;
        self.id
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(owner) = self.owner.take().and_then(|w| w.upgrade()) {
            owner.detach(self.id);
        }
    }
}

struct RegistryEntry {
    channel: Box<dyn Any>,
    payload: &'static str,
}

/// Name → channel lookup, resolved once while a scene is composed.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: HashMap<String, RegistryEntry>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the channel registered under `name`, creating it on first use.
    pub fn channel<T: 'static>(&mut self, name: &str) -> Result<Channel<T>, ChannelError> {
        if let Some(existing) = self.get::<T>(name)? {
            return Ok(existing);
        }

        let channel = Channel::<T>::named(name);
        self.channels.insert(
            name.to_string(),
            RegistryEntry { channel: Box::new(channel.clone()), payload: type_name::<T>() },
        );
        Ok(channel)
    }

    /// Like [`ChannelRegistry::channel`] but never creates.
    pub fn get<T: 'static>(&self, name: &str) -> Result<Option<Channel<T>>, ChannelError> {
        match self.channels.get(name) {
            None => Ok(None),
            Some(entry) => entry
                .channel
                .downcast_ref::<Channel<T>>()
                .map(|c| Some(c.clone()))
                .ok_or_else(|| ChannelError::TypeMismatch { name: name.to_string(), existing: entry.payload }),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
