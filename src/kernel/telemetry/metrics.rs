use std::collections::VecDeque;

use super::event::{LifecycleEvent, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub frame_stats: FrameStats,
    pub failure_stats: FailureStats,
    pub interaction_stats: InteractionStats,
    pub entities_spawned: u64,
    pub entities_despawned: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    pub total_fixed_steps: u64,
    pub avg_fixed_steps: f64,
    pub max_fixed_steps: u32,
    pub effects_expired: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FailureStats {
    pub aborted_phases: u64,
    pub subscriber_failures: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionStats {
    pub routed: u64,
    pub deliveries: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::FrameCompleted { fixed_steps, effects_expired, .. } => {
                snap.frame_stats.frames += 1;
                snap.frame_stats.total_fixed_steps += u64::from(*fixed_steps);
                snap.frame_stats.max_fixed_steps = snap.frame_stats.max_fixed_steps.max(*fixed_steps);
                snap.frame_stats.effects_expired += *effects_expired as u64;
            }
            TelemetryEvent::PhaseAborted { .. } => snap.failure_stats.aborted_phases += 1,
            TelemetryEvent::SubscriberFailed { .. } => snap.failure_stats.subscriber_failures += 1,
            TelemetryEvent::InteractionRouted { delivered, .. } => {
                snap.interaction_stats.routed += 1;
                snap.interaction_stats.deliveries += *delivered as u64;
            }
            TelemetryEvent::Lifecycle(LifecycleEvent::EntitySpawned(_)) => snap.entities_spawned += 1,
            TelemetryEvent::Lifecycle(LifecycleEvent::EntityDespawned(_)) => snap.entities_despawned += 1,
            TelemetryEvent::Lifecycle(LifecycleEvent::Shutdown) => {}
        }
    }

    if snap.frame_stats.frames > 0 {
        snap.frame_stats.avg_fixed_steps =
            snap.frame_stats.total_fixed_steps as f64 / snap.frame_stats.frames as f64;
    }

    snap
}
