use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kernel::channel::{Channel, Subscription};
use crate::kernel::event::ItemGrant;
use crate::kernel::host::Host;
use crate::kernel::module::{FrameContext, Module, ModuleState};
use crate::kernel::variable::InitVariable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

/// Item stacks for one entity. Grants arrive over a channel and are applied on Update.
pub struct InventoryModule {
    state: ModuleState,
    capacity: usize,
    items: Vec<ItemStack>,
    grants: Channel<ItemGrant>,
    pending: Rc<RefCell<Vec<ItemGrant>>>,
    subscription: Option<Subscription>,
    total: InitVariable<u32>,
}

impl InventoryModule {
    /// `capacity` is the number of distinct stacks.
    pub fn new(name: &str, capacity: usize, grants: Channel<ItemGrant>) -> Self {
        Self {
            state: ModuleState::new(name),
            capacity,
            items: Vec::new(),
            grants,
            pending: Rc::new(RefCell::new(Vec::new())),
            subscription: None,
            total: InitVariable::new(&format!("{name}.total"), 0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn items(&self) -> &[ItemStack] {
        &self.items
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.iter().find(|s| s.item == item).map_or(0, |s| s.count)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.count(item) > 0
    }

    /// Total item count, observable.
    pub fn total(&self) -> &InitVariable<u32> {
        &self.total
    }

    /// Returns `false` when the item would need a new stack and the inventory is full.
    pub fn add_item(&mut self, item: &str, count: u32) -> bool {
        match self.items.iter().position(|s| s.item == item) {
            Some(index) => {
                let stack = &mut self.items[index];
                stack.count = stack.count.saturating_add(count);
            }
            None if self.items.len() < self.capacity => {
                self.items.push(ItemStack { item: item.to_string(), count });
            }
            None => return false,
        }
        self.refresh_total();
        true
    }

    /// Removes `count` of `item`; fails without change if fewer are held.
    pub fn remove_item(&mut self, item: &str, count: u32) -> bool {
        let Some(index) = self.items.iter().position(|s| s.item == item) else {
            return false;
        };
        let stack = &mut self.items[index];
        if stack.count < count {
            return false;
        }
        stack.count -= count;
        if stack.count == 0 {
            self.items.remove(index);
        }
        self.refresh_total();
        true
    }

    pub fn pending_grants(&self) -> usize {
        self.pending.borrow().len()
    }

    fn refresh_total(&mut self) {
        let total = self.items.iter().map(|s| s.count).fold(0u32, u32::saturating_add);
        self.total.set(total);
    }
}

impl Module for InventoryModule {
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ModuleState {
        &mut self.state
    }

    fn on_initialize(&mut self, host: &mut dyn Host) -> anyhow::Result<()> {
        let owner = host.entity();
        let pending = Rc::clone(&self.pending);
        self.subscription = Some(self.grants.subscribe(move |grant: &ItemGrant| {
            if grant.recipient == owner {
                pending.borrow_mut().push(grant.clone());
            }
            Ok(())
        }));
        debug!(%owner, channel = self.grants.name(), "inventory listening for grants");
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut FrameContext<'_>) -> anyhow::Result<()> {
        let grants: Vec<ItemGrant> = self.pending.borrow_mut().drain(..).collect();
        for grant in grants {
            if !self.add_item(&grant.item, grant.count) {
                warn!(entity = %ctx.host.entity(), item = %grant.item, "inventory full, grant dropped");
            }
        }
        Ok(())
    }
}
