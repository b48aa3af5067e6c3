//! Showing dialogs to players.

use std::sync::Arc;

use dialogkit_core::BoxedPlayer;
use tracing::{debug, warn};

use crate::convert::ToNative;
use crate::dialog::Dialog;
use crate::native::NativeDialog;
use crate::text::TextTranslator;

/// Host hook that puts a translated dialog on a player's screen.
pub trait DialogOpener: Send + Sync {
    fn open(&self, player: &BoxedPlayer, dialog: &NativeDialog) -> anyhow::Result<()>;
}

pub type BoxedOpener = Arc<dyn DialogOpener>;

impl<F> DialogOpener for F
where
    F: Fn(&BoxedPlayer, &NativeDialog) -> anyhow::Result<()> + Send + Sync,
{
    fn open(&self, player: &BoxedPlayer, dialog: &NativeDialog) -> anyhow::Result<()> {
        self(player, dialog)
    }
}

/// Translates `dialog` and asks the host to show it to `player`.
pub fn open_dialog(
    player: &BoxedPlayer,
    dialog: &Dialog,
    translator: &dyn TextTranslator,
    opener: &dyn DialogOpener,
) -> anyhow::Result<()> {
    let native = dialog.to_native(translator);
    debug!(
        player = %player.id(),
        title = %dialog.data().title().to_plain_string(),
        "Opening dialog"
    );
    opener.open(player, &native).inspect_err(|e| {
        warn!(player = %player.id(), error = %e, "Host failed to open dialog");
    })
}
