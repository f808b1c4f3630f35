use std::cell::RefCell;
use std::rc::Rc;

use crafter::kernel::channel::Channel;
use crafter::kernel::error::ReceptorError;
use crafter::kernel::event::{EntityId, Interaction, ItemGrant};
use crafter::kernel::receptor::{InteractionReceptor, ReceptorBinding};
use crafter::receptors::{PickupReceptor, ProbeReceptor};

const PLAYER: EntityId = EntityId(1);
const CHEST: EntityId = EntityId(2);
const DOOR: EntityId = EntityId(3);

/// Receptor that records the order of its two hooks.
struct Ordered {
    entity: EntityId,
    calls: Rc<RefCell<Vec<&'static str>>>,
}

impl InteractionReceptor for Ordered {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn notify(&mut self, _interaction: &Interaction) {
        self.calls.borrow_mut().push("notify");
    }

    fn do_interaction(&mut self, _interaction: &Interaction) -> anyhow::Result<()> {
        self.calls.borrow_mut().push("do_interaction");
        Ok(())
    }
}

#[test]
fn test_receptor_reacts_only_to_own_entity() {
    let channel = Channel::<Interaction>::named("interactions");
    let mut binding = ReceptorBinding::new(ProbeReceptor::new(CHEST));
    binding.activate(&channel).unwrap();

    channel.publish(Interaction { instigator: PLAYER, target: DOOR });
    assert_eq!(binding.receptor().notified(), 0);

    channel.publish(Interaction { instigator: PLAYER, target: CHEST });
    assert_eq!(binding.receptor().notified(), 1);
    assert_eq!(binding.receptor().instigators(), &[PLAYER]);
}

#[test]
fn test_notify_runs_before_do_interaction() {
    let channel = Channel::<Interaction>::named("interactions");
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut binding = ReceptorBinding::new(Ordered { entity: DOOR, calls: Rc::clone(&calls) });
    binding.activate(&channel).unwrap();

    channel.publish(Interaction { instigator: PLAYER, target: DOOR });

    assert_eq!(*calls.borrow(), vec!["notify", "do_interaction"]);
}

#[test]
fn test_deactivate_releases_exactly_its_subscription() {
    let channel = Channel::<Interaction>::named("interactions");
    let mut chest = ReceptorBinding::new(ProbeReceptor::new(CHEST));
    let mut door = ReceptorBinding::new(ProbeReceptor::new(DOOR));
    chest.activate(&channel).unwrap();
    door.activate(&channel).unwrap();
    assert_eq!(channel.subscriber_count(), 2);

    assert!(chest.deactivate());
    assert!(!chest.deactivate(), "second deactivate is a no-op");
    assert_eq!(channel.subscriber_count(), 1);

    channel.publish(Interaction { instigator: PLAYER, target: CHEST });
    channel.publish(Interaction { instigator: PLAYER, target: DOOR });
    assert_eq!(chest.receptor().notified(), 0);
    assert_eq!(door.receptor().notified(), 1);
}

#[test]
fn test_double_activation_fails() {
    let channel = Channel::<Interaction>::named("interactions");
    let mut binding = ReceptorBinding::new(ProbeReceptor::new(CHEST));
    binding.activate(&channel).unwrap();

    assert!(matches!(binding.activate(&channel), Err(ReceptorError::AlreadyActive(id)) if id == CHEST));
    assert_eq!(channel.subscriber_count(), 1);
}

#[test]
fn test_dropping_binding_unsubscribes() {
    let channel = Channel::<Interaction>::named("interactions");
    {
        let mut binding = ReceptorBinding::new(ProbeReceptor::new(CHEST));
        binding.activate(&channel).unwrap();
        assert_eq!(channel.subscriber_count(), 1);
    }
    assert_eq!(channel.subscriber_count(), 0);
}

#[test]
fn test_pickup_grants_once_to_instigator() {
    let interactions = Channel::<Interaction>::named("interactions");
    let grants = Channel::<ItemGrant>::named("item_grants");
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let _inventory = grants.subscribe(move |grant: &ItemGrant| {
        sink.borrow_mut().push(grant.clone());
        Ok(())
    });

    let mut coin = ReceptorBinding::new(PickupReceptor::new(CHEST, "coin", 3, grants.clone()));
    coin.activate(&interactions).unwrap();

    interactions.publish(Interaction { instigator: PLAYER, target: CHEST });
    interactions.publish(Interaction { instigator: PLAYER, target: CHEST });

    assert!(coin.receptor().is_collected());
    assert_eq!(
        *received.borrow(),
        vec![ItemGrant { recipient: PLAYER, item: "coin".to_string(), count: 3 }],
        "single-use pickup grants once"
    );
}

#[test]
fn test_reusable_pickup_grants_every_time() {
    let interactions = Channel::<Interaction>::named("interactions");
    let grants = Channel::<ItemGrant>::named("item_grants");
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    let _inventory = grants.subscribe(move |_| {
        *sink.borrow_mut() += 1;
        Ok(())
    });

    let mut well = ReceptorBinding::new(PickupReceptor::new(CHEST, "water", 1, grants).reusable(true));
    well.activate(&interactions).unwrap();

    for _ in 0..3 {
        interactions.publish(Interaction { instigator: PLAYER, target: CHEST });
    }
    assert_eq!(*count.borrow(), 3);
}
