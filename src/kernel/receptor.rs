use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use anyhow::anyhow;
use tracing::debug;

use super::channel::{Channel, Subscription};
use super::error::ReceptorError;
use super::event::{EntityId, Interaction};

/// Reacts to interactions aimed at its own entity.
pub trait InteractionReceptor {
    fn entity(&self) -> EntityId;

    /// Generic hook, runs before [`InteractionReceptor::do_interaction`].
    fn notify(&mut self, interaction: &Interaction) {
        debug!(receptor = %self.entity(), instigator = %interaction.instigator, "interaction received");
    }

    fn do_interaction(&mut self, interaction: &Interaction) -> anyhow::Result<()>;
}

/// Owns a receptor and its subscription. `activate` acquires the subscription,
/// `deactivate` (or drop) releases exactly that registration.
pub struct ReceptorBinding<R> {
    receptor: Rc<RefCell<R>>,
    subscription: Option<Subscription>,
}

impl<R: InteractionReceptor + 'static> ReceptorBinding<R> {
    pub fn new(receptor: R) -> Self {
        Self { receptor: Rc::new(RefCell::new(receptor)), subscription: None }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn activate(&mut self, channel: &Channel<Interaction>) -> Result<(), ReceptorError> {
        let entity = self.receptor.borrow().entity();
        if self.subscription.is_some() {
            return Err(ReceptorError::AlreadyActive(entity));
        }

        let receptor = Rc::clone(&self.receptor);
        let subscription = channel.subscribe(move |interaction: &Interaction| {
            if interaction.target != entity {
                return Ok(());
            }
            let mut receptor = receptor
                .try_borrow_mut()
                .map_err(|_| anyhow!("receptor of {entity} is busy"))?;
            receptor.notify(interaction);
            receptor.do_interaction(interaction)
        });

        debug!(receptor = %entity, channel = channel.name(), "receptor activated");
        self.subscription = Some(subscription);
        Ok(())
    }

    /// Returns `false` if the binding was not active.
    pub fn deactivate(&mut self) -> bool {
        match self.subscription.take() {
            Some(subscription) => {
                debug!(receptor = %self.receptor.borrow().entity(), "receptor deactivated");
                drop(subscription);
                true
            }
            None => false,
        }
    }

    pub fn receptor(&self) -> Ref<'_, R> {
        self.receptor.borrow()
    }

    pub fn receptor_mut(&self) -> RefMut<'_, R> {
        self.receptor.borrow_mut()
    }
}

/// Type-erased binding so a runtime can hold receptors of different kinds.
pub trait Binding {
    fn entity(&self) -> EntityId;
    fn is_active(&self) -> bool;
    fn activate(&mut self, channel: &Channel<Interaction>) -> Result<(), ReceptorError>;
    fn deactivate(&mut self) -> bool;
}

impl<R: InteractionReceptor + 'static> Binding for ReceptorBinding<R> {
    fn entity(&self) -> EntityId {
        self.receptor.borrow().entity()
    }
    fn is_active(&self) -> bool {
        ReceptorBinding::is_active(self)
    }
    fn activate(&mut self, channel: &Channel<Interaction>) -> Result<(), ReceptorError> {
        ReceptorBinding::activate(self, channel)
    }
    fn deactivate(&mut self) -> bool {
        ReceptorBinding::deactivate(self)
    }
}
