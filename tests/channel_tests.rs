use std::cell::RefCell;
use std::rc::Rc;

use anyhow::bail;
use crafter::kernel::channel::{Channel, ChannelRegistry};
use crafter::kernel::error::ChannelError;
use crafter::kernel::variable::InitVariable;

fn recorder() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_publish_follows_registration_order() {
    let channel = Channel::<u32>::named("numbers");
    let log = recorder();

    let mut subs = Vec::new();
    for label in ["a", "b", "c"] {
        let log = Rc::clone(&log);
        subs.push(channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("{label}{v}"));
            Ok(())
        }));
    }

    let report = channel.publish(7);

    assert_eq!(report.delivered, 3);
    assert!(report.is_clean());
    assert_eq!(*log.borrow(), vec!["a7", "b7", "c7"]);
}

#[test]
fn test_publish_without_subscribers_is_noop() {
    let channel = Channel::<String>::named("empty");
    let report = channel.publish("hello".to_string());

    assert_eq!(report.delivered, 0);
    assert!(report.failures.is_empty());
    assert_eq!(channel.subscriber_count(), 0);
}

#[test]
fn test_unsubscribed_before_publish_never_receives() {
    let channel = Channel::<u32>::named("numbers");
    let log = recorder();

    let keep = {
        let log = Rc::clone(&log);
        channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("keep{v}"));
            Ok(())
        })
    };
    let gone = {
        let log = Rc::clone(&log);
        channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("gone{v}"));
            Ok(())
        })
    };

    channel.publish(1);
    assert!(channel.unsubscribe(gone.id()));
    channel.publish(2);

    assert_eq!(*log.borrow(), vec!["keep1", "gone1", "keep2"]);
    drop(keep);
    drop(gone);
}

#[test]
fn test_unsubscribe_unknown_is_noop() {
    let channel = Channel::<u32>::named("numbers");
    let sub = channel.subscribe(|_| Ok(()));
    let id = sub.id();
    drop(sub);

    assert_eq!(channel.subscriber_count(), 0);
    assert!(!channel.unsubscribe(id), "second removal must be a no-op");
}

#[test]
fn test_dropping_subscription_unsubscribes() {
    let channel = Channel::<u32>::named("numbers");
    let hits = Rc::new(RefCell::new(0));

    {
        let hits = Rc::clone(&hits);
        let _sub = channel.subscribe(move |_| {
            *hits.borrow_mut() += 1;
            Ok(())
        });
        channel.publish(1);
    }
    channel.publish(2);

    assert_eq!(*hits.borrow(), 1);
}

#[test]
fn test_detached_subscription_outlives_guard() {
    let channel = Channel::<u32>::named("numbers");
    let hits = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hits);
    let id = channel
        .subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        })
        .detach();

    channel.publish(1);
    channel.publish(2);
    assert_eq!(*hits.borrow(), 2);

    assert!(channel.unsubscribe(id));
    channel.publish(3);
    assert_eq!(*hits.borrow(), 2);
}

#[test]
fn test_failing_subscriber_does_not_stop_others() {
    let channel = Channel::<u32>::named("numbers");
    let log = recorder();

    let first = {
        let log = Rc::clone(&log);
        channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("first{v}"));
            Ok(())
        })
    };
    let broken = channel.subscribe(|_| bail!("boom"));
    let last = {
        let log = Rc::clone(&log);
        channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("last{v}"));
            Ok(())
        })
    };

    let report = channel.publish(9);

    assert_eq!(report.delivered, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].subscriber, broken.id());
    assert!(report.failures[0].reason.contains("boom"));
    assert_eq!(*log.borrow(), vec!["first9", "last9"]);
    drop((first, last));
}

#[test]
fn test_subscribe_during_publish_takes_effect_next_publish() {
    let channel = Channel::<u32>::named("numbers");
    let log = recorder();
    let late: Rc<RefCell<Vec<_>>> = Rc::new(RefCell::new(Vec::new()));

    let _adder = {
        let inner = channel.clone();
        let log = Rc::clone(&log);
        let late = Rc::clone(&late);
        channel.subscribe(move |v: &u32| {
            if *v == 1 {
                let log = Rc::clone(&log);
                late.borrow_mut().push(inner.subscribe(move |v: &u32| {
                    log.borrow_mut().push(format!("late{v}"));
                    Ok(())
                }));
            }
            Ok(())
        })
    };

    let first = channel.publish(1);
    assert_eq!(first.delivered, 1, "new subscriber must not see the publish that added it");
    assert!(log.borrow().is_empty());

    channel.publish(2);
    assert_eq!(*log.borrow(), vec!["late2"]);
}

#[test]
fn test_unsubscribe_during_publish_skips_removed() {
    let channel = Channel::<u32>::named("numbers");
    let log = recorder();
    let victim_slot: Rc<RefCell<Option<crafter::Subscription>>> = Rc::new(RefCell::new(None));

    let _killer = {
        let slot = Rc::clone(&victim_slot);
        channel.subscribe(move |_| {
            slot.borrow_mut().take();
            Ok(())
        })
    };
    let victim = {
        let log = Rc::clone(&log);
        channel.subscribe(move |v: &u32| {
            log.borrow_mut().push(format!("victim{v}"));
            Ok(())
        })
    };
    *victim_slot.borrow_mut() = Some(victim);

    let report = channel.publish(1);

    assert_eq!(report.delivered, 1);
    assert!(log.borrow().is_empty());
    assert_eq!(channel.subscriber_count(), 1);
}

#[test]
fn test_reentrant_publish_reports_busy_subscriber() {
    let channel = Channel::<u32>::named("echo");
    let inner = channel.clone();
    let _echo = channel.subscribe(move |v: &u32| {
        if *v == 0 {
            let nested = inner.publish(1);
            assert_eq!(nested.failures.len(), 1, "running subscriber is skipped in nested publish");
        }
        Ok(())
    });

    let report = channel.publish(0);
    assert!(report.is_clean());
}

#[test]
fn test_inject_constant() {
    let channel = Channel::with_constant("debug", 42u32);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = channel.subscribe(move |v: &u32| {
        sink.borrow_mut().push(*v);
        Ok(())
    });

    channel.inject_constant().unwrap();
    assert_eq!(*seen.borrow(), vec![42]);

    channel.set_constant(None);
    assert!(matches!(channel.inject_constant(), Err(ChannelError::NoConstant(name)) if name == "debug"));
}

#[test]
fn test_registry_resolves_same_channel_by_name() {
    let mut registry = ChannelRegistry::new();
    let a = registry.channel::<u32>("score").unwrap();
    let b = registry.channel::<u32>("score").unwrap();

    let _sub = b.subscribe(|_| Ok(()));
    assert_eq!(a.subscriber_count(), 1, "both handles share one subscriber list");
    assert_eq!(registry.len(), 1);

    assert!(matches!(registry.channel::<String>("score"), Err(ChannelError::TypeMismatch { .. })));
    assert!(registry.get::<u32>("missing").unwrap().is_none());
}

#[test]
fn test_init_variable_notifies_on_change_only() {
    let mut health = InitVariable::new("health", 10u32);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let _sub = health.observe(move |v: &u32| {
        sink.borrow_mut().push(*v);
        Ok(())
    });

    assert!(health.set(10).is_none(), "same value must not notify");
    health.set(7);
    health.set_and_notify(7);
    health.reset();

    assert_eq!(*health.get(), 10);
    assert_eq!(*health.initial(), 10);
    assert_eq!(*seen.borrow(), vec![7, 7, 10]);
}

/// Payload without a `Debug` impl.
struct Opaque;

#[test]
fn test_debug_shows_name_and_subscriber_count() {
    let channel = Channel::<Opaque>::named("opaque");
    let _first = channel.subscribe(|_: &Opaque| Ok(()));
    let second = channel.subscribe(|_: &Opaque| Ok(()));

    assert_eq!(format!("{channel:?}"), r#"Channel { name: "opaque", subscribers: 2 }"#);
    drop(second);
    assert_eq!(format!("{channel:?}"), r#"Channel { name: "opaque", subscribers: 1 }"#);
}
