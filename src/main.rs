use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crafter::config::{ModuleKind, SceneConfig};
use crafter::kernel::event::{EntityId, Interaction, RuntimeEvent};
use crafter::kernel::host::InputState;
use crafter::modules::InventoryModule;
use crafter::scene::SceneBuilder;

const DEFAULT_SCENE: &str = "demos/platformer.json";
const DEFAULT_FRAMES: u64 = 300;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| DEFAULT_SCENE.to_string());
    let frames = match args.next() {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("frame count '{raw}' is not a number"))?,
        None => DEFAULT_FRAMES,
    };

    // 2. Compose Scene
    let config = SceneConfig::load(&path).with_context(|| format!("loading scene {path}"))?;
    let scene = SceneBuilder::new().build(&config)?;
    let mut runtime = scene.runtime;
    tracing::info!(scene = %path, frames, "Crafter booting...");

    // 3. Scripted Driver (stands in for device input and trigger volumes)
    let player = config
        .entities
        .iter()
        .find(|e| e.modules.iter().any(|m| matches!(m.kind, ModuleKind::Movement { .. })))
        .map(|e| EntityId(e.id));
    let targets: Vec<EntityId> = config.receptors.iter().map(|r| EntityId(r.entity)).collect();

    if let Some(player) = player {
        let tx = runtime.sender();
        tokio::spawn(async move {
            let script = [
                InputState::new().with_axis("horizontal", 1.0),
                InputState::new().with_axis("horizontal", 1.0).with_button("fire"),
                InputState::new().with_axis("horizontal", 1.0).with_button("jump"),
                InputState::new().with_axis("horizontal", -1.0),
                InputState::new(),
            ];
            for input in script {
                if tx.send(RuntimeEvent::Input { entity: player, input }).await.is_err() {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(400)).await;
            }
            for target in targets {
                let interaction = Interaction { instigator: player, target };
                if tx.send(RuntimeEvent::Interaction(interaction)).await.is_err() {
                    return;
                }
            }
        });
    }

    // 4. Drive
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });
    tracing::info!("Crafter Runtime Active. Press Ctrl+C to stop.");
    runtime.run(cancel, Some(frames)).await;

    // 5. Report
    let snap = runtime.telemetry.snapshot();
    println!(
        "[SUMMARY] frames={} fixed_steps={} (avg {:.2}) interactions={} aborted_phases={} subscriber_failures={}",
        snap.frame_stats.frames,
        snap.frame_stats.total_fixed_steps,
        snap.frame_stats.avg_fixed_steps,
        snap.interaction_stats.routed,
        snap.failure_stats.aborted_phases,
        snap.failure_stats.subscriber_failures,
    );
    for id in runtime.entity_ids().collect::<Vec<_>>() {
        let Some(host) = runtime.host(id) else { continue };
        println!("[ENTITY {}] position={:?}", id.0, host.transform().position());
        if let Some(inventory) = runtime.brain(id).and_then(|b| b.find_module::<InventoryModule>()) {
            println!("[ENTITY {}] inventory={:?}", id.0, inventory.items());
        }
    }

    Ok(())
}
