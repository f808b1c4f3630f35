use std::fmt;

use super::channel::{Channel, PublishReport, Subscription};

/// Observable value with an initial state it can be reset to.
///
/// Every change is published on [`InitVariable::on_change`] with the new value.
pub struct InitVariable<T> {
    initial: T,
    current: T,
    changed: Channel<T>,
}

impl<T: Clone + PartialEq + 'static> InitVariable<T> {
    pub fn new(name: &str, initial: T) -> Self {
        Self { current: initial.clone(), initial, changed: Channel::named(name) }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    pub fn initial(&self) -> &T {
        &self.initial
    }

    /// Stores `value`; notifies only if it differs from the current value.
    pub fn set(&mut self, value: T) -> Option<PublishReport> {
        if self.current == value {
            return None;
        }
        Some(self.set_and_notify(value))
    }

    /// Stores `value` and always notifies.
    pub fn set_and_notify(&mut self, value: T) -> PublishReport {
        self.current = value;
        self.changed.publish_ref(&self.current)
    }

    pub fn reset(&mut self) -> Option<PublishReport> {
        let initial = self.initial.clone();
        self.set(initial)
    }

    pub fn on_change(&self) -> &Channel<T> {
        &self.changed
    }

    pub fn observe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) -> anyhow::Result<()> + 'static,
    {
        self.changed.subscribe(callback)
    }
}

impl<T: fmt::Debug> fmt::Debug for InitVariable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitVariable")
            .field("initial", &self.initial)
            .field("current", &self.current)
            .finish()
    }
}
