use crate::kernel::event::{EntityId, Interaction};
use crate::kernel::receptor::InteractionReceptor;

/// Records who interacted with it. Useful for triggers and tests.
#[derive(Debug, Clone)]
pub struct ProbeReceptor {
    entity: EntityId,
    notified: u32,
    instigators: Vec<EntityId>,
}

impl ProbeReceptor {
    pub fn new(entity: EntityId) -> Self {
        Self { entity, notified: 0, instigators: Vec::new() }
    }

    pub fn notified(&self) -> u32 {
        self.notified
    }

    pub fn instigators(&self) -> &[EntityId] {
        &self.instigators
    }
}

impl InteractionReceptor for ProbeReceptor {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn notify(&mut self, _interaction: &Interaction) {
        self.notified += 1;
    }

    fn do_interaction(&mut self, interaction: &Interaction) -> anyhow::Result<()> {
        self.instigators.push(interaction.instigator);
        Ok(())
    }
}
