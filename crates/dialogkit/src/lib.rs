//! # dialogkit
//!
//! Server-driven dialogs for Minecraft-style plugin hosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  to_native   ┌──────────────┐  open   ┌────────┐
//! │ model::Dialog│─────────────▶│ NativeDialog │────────▶│ client │
//! └──────────────┘              └──────────────┘         └────────┘
//!                                                             │ click
//!                                                             ▼
//! ┌──────────────┐   route   ┌────────────────┐   ┌──────────────────┐
//! │ main thread  │◀──────────│ DispatchRouter │◀──│ sniffer (I/O)    │
//! │ action/reader│           └────────────────┘   └──────────────────┘
//! └──────────────┘
//! ```
//!
//! - **Model**: dialog, button, input and body records with validating builders
//! - **Core**: payload decoding, bindings, dispatch, per-connection sniffers
//! - **Runtime**: configuration, logging, lifecycle listeners, tick loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dialogkit::prelude::*;
//!
//! let confirm = KeyedAction::parse("dialogkit:confirm")?;
//! let dialog: Dialog = NoticeDialog::builder()
//!     .data(DialogData::builder().title("Are you sure?").build()?)
//!     .button(Button::new(ButtonData::builder().label("Confirm").build()?).with_action(confirm.clone()))
//!     .build()?
//!     .into();
//!
//! let runtime = DialogRuntime::builder().build()?;
//! runtime.register_binding(confirm.identifier(), Binding::new().with_action(ConfirmAction));
//! open_dialog(&player, &dialog, &JsonTextTranslator, &opener)?;
//! runtime.run().await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `dialogkit.toml` files (default)
//! - `json-log`: JSON log output

pub use dialogkit_core as core;
pub use dialogkit_model as model;
pub use dialogkit_runtime as runtime;

/// Commonly used types for plugin code.
pub mod prelude {
    pub use dialogkit_core::prelude::*;
    pub use dialogkit_core::{ExpiringListener, HostContext, ResourceLocation, Scheduler};

    pub use dialogkit_model::{
        AfterAction, BooleanInput, Button, ButtonData, Dialog, DialogBody, DialogData,
        DialogOpener, Entry, Input, ItemBody, ItemStack, JsonTextTranslator, KeyedAction,
        LinksDialog, ListDialog, MultiActionDialog, MultilineOptions, NoticeDialog,
        NumberRangeInput, PlainMessageBody, RangeInfo, SingleOptionInput, Text, TextInput,
        ToNative, open_dialog,
    };

    pub use dialogkit_runtime::{DialogRuntime, DialogkitConfig};
}
