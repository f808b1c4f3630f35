use tracing::{info, warn};

use crate::kernel::channel::Channel;
use crate::kernel::event::{EntityId, Interaction, ItemGrant};
use crate::kernel::receptor::InteractionReceptor;

/// Grants an item to whoever interacts with it. Single-use unless `reusable`.
pub struct PickupReceptor {
    entity: EntityId,
    item: String,
    count: u32,
    reusable: bool,
    collected: bool,
    grants: Channel<ItemGrant>,
}

impl PickupReceptor {
    pub fn new(entity: EntityId, item: &str, count: u32, grants: Channel<ItemGrant>) -> Self {
        Self { entity, item: item.to_string(), count, reusable: false, collected: false, grants }
    }

    pub fn reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }
}

impl InteractionReceptor for PickupReceptor {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn do_interaction(&mut self, interaction: &Interaction) -> anyhow::Result<()> {
        if self.collected && !self.reusable {
            return Ok(());
        }

        let report = self.grants.publish(ItemGrant {
            recipient: interaction.instigator,
            item: self.item.clone(),
            count: self.count,
        });
        if report.delivered == 0 {
            warn!(pickup = %self.entity, item = %self.item, "nobody received the grant");
        }

        self.collected = true;
        info!(pickup = %self.entity, by = %interaction.instigator, item = %self.item, "picked up");
        Ok(())
    }
}
