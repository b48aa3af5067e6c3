//! Kill Player Example
//!
//! A dialog with two buttons, run against the in-memory loopback network:
//!
//! - **Hurt me** takes five health points from the player who clicks it and,
//!   for the next 20 ticks, tells them if they die.
//! - **Set amount** submits a number slider; the reader echoes the value.
//!
//! ```text
//! click ──▶ sniffer ──▶ router ──▶ main thread ──▶ KillPlayerAction::task
//!                                                   ├─ listener.start()
//!                                                   ├─ listener.stop_after(20)
//!                                                   └─ damage(5.0)
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package kill-player
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dialogkit::core::{
    CustomClickAction, EventBus, LoopbackNetwork, LoopbackPlayer, downcast_player,
    encode_compound,
};
use dialogkit::model::NativeDialog;
use dialogkit::prelude::*;
use tracing::{info, warn};

const DAMAGE: f64 = 5.0;
const WATCH_TICKS: u64 = 20;

// ============================================================================
// Actions
// ============================================================================

/// Hurts the clicking player and watches for their death for a short while.
///
/// A real host raises the death event itself; the loopback host has no game
/// loop, so the action publishes it when the hit is fatal.
struct KillPlayerAction {
    events: Arc<EventBus>,
    watch_ticks: u64,
}

impl CustomAction for KillPlayerAction {
    fn task(&self, player: &BoxedPlayer, ctx: &ActionContext) -> anyhow::Result<()> {
        ctx.listener().start()?;
        ctx.listener().stop_after(self.watch_ticks);

        let target = downcast_player::<LoopbackPlayer>(player.clone())
            .context("kill_player only runs against loopback players")?;
        let died = target.damage(DAMAGE);
        info!(player = %player.name(), health = target.health(), "Player hurt by dialog");

        if died {
            self.events.publish(&HostEvent::PlayerDeath {
                player: player.clone(),
                message: Some(format!("{} clicked the wrong button", player.name())),
            });
        }
        Ok(())
    }

    fn listener(&self, dialog_player: &BoxedPlayer) -> Option<BoxedListener> {
        let watched = dialog_player.clone();
        Some(listener_fn([EventKind::PlayerDeath], move |event| {
            if event.player().is_some_and(|dead| dead.id() == watched.id()) {
                watched.send_message("you died during your dialog");
            }
        }))
    }

    fn name(&self) -> &str {
        "kill_player"
    }
}

fn set_amount(player: &BoxedPlayer, values: &NamedValues) -> anyhow::Result<()> {
    match values.get("amount").and_then(TaggedValue::as_f64) {
        Some(amount) => player.send_message(&format!("amount set to {amount}")),
        None => warn!(player = %player.name(), "Submission carried no amount"),
    }
    Ok(())
}

// ============================================================================
// Dialog
// ============================================================================

fn build_dialog(hurt: &KeyedAction, amount: &KeyedAction) -> Result<Dialog> {
    let data = DialogData::builder()
        .title(Text::plain("Danger zone").color("red").bold())
        .body(PlainMessageBody::new("Every click costs five health points."))
        .input(
            NumberRangeInput::builder()
                .key("amount")
                .label("Amount")
                .range(
                    RangeInfo::builder()
                        .start(1.0)
                        .end(20.0)
                        .initial(5.0)
                        .step(1.0)
                        .build()?,
                )
                .build()?,
        )
        .build()?;

    let hurt_button = Button::new(
        ButtonData::builder()
            .label("Hurt me")
            .tooltip("Costs five health points")
            .build()?,
    )
    .with_action(hurt.clone());
    let amount_button =
        Button::new(ButtonData::builder().label("Set amount").build()?).with_action(amount.clone());

    Ok(MultiActionDialog::builder()
        .data(data)
        .buttons([hurt_button, amount_button])
        .columns(2)
        .build()?
        .into())
}

/// Stands in for the host's "show dialog" call.
fn log_opener(player: &BoxedPlayer, dialog: &NativeDialog) -> anyhow::Result<()> {
    info!(
        player = %player.name(),
        dialog = %serde_json::to_string(dialog)?,
        "Showing dialog"
    );
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let network = Arc::new(LoopbackNetwork::new());

    let runtime = DialogRuntime::builder()
        .set("plugin.name", "KillPlayerDemo")
        .set("listeners.default_timeout_ticks", WATCH_TICKS)
        .network(network.clone())
        .build()?;

    let hurt = KeyedAction::parse("dialogkit:kill_player")?;
    let amount = KeyedAction::parse("dialogkit:set_amount")?;
    let dialog = build_dialog(&hurt, &amount)?;

    runtime.register_binding(
        hurt.identifier(),
        Binding::new().with_action(KillPlayerAction {
            events: runtime.events().clone(),
            watch_ticks: runtime.default_timeout_ticks(),
        }),
    );
    runtime.register_binding(amount.identifier(), Binding::new().with_reader(set_amount));
    runtime.initialize()?;

    // ========================================================================
    // Simulated session
    // ========================================================================

    let (steve, _connection) = network.connect("Steve");
    steve.set_health(DAMAGE);
    let player: BoxedPlayer = steve.clone();
    runtime.events().publish(&HostEvent::PlayerJoin(player.clone()));

    open_dialog(&player, &dialog, &JsonTextTranslator, &log_opener)?;

    let submission = NamedValues::new().with("amount", 12.0f32);
    network.send_packet(
        player.id(),
        CustomClickAction::new(amount.identifier()).with_payload(encode_compound(&submission)),
    );
    network.send_packet(player.id(), CustomClickAction::new(hurt.identifier()));

    // One second of ticks covers the watch window at the default tick rate.
    runtime
        .run_until(tokio::time::sleep(Duration::from_secs(2)))
        .await?;

    for message in steve.messages() {
        info!(player = %steve.name(), "{message}");
    }
    info!(stats = ?runtime.stats(), "Demo finished");

    Ok(())
}
