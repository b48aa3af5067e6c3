//! # dialogkit Model
//!
//! Immutable dialog records and their host-side form.
//!
//! Records are assembled with builders whose `build()` validates required
//! fields and client limits, so a built record always converts. Conversion
//! goes through [`ToNative`], which asks a [`TextTranslator`] for the host's
//! text representation and yields the serde-serializable [`native`] records.
//!
//! | Record | Module |
//! |---|---|
//! | [`Dialog`] and its layouts, [`DialogData`], [`AfterAction`] | [`dialog`] |
//! | [`Button`], [`ButtonData`], [`KeyedAction`] | [`button`] |
//! | [`Input`] and its controls | [`input`] |
//! | [`DialogBody`], [`ItemStack`] | [`body`] |
//! | [`Text`] | [`text`] |
//!
//! A button's [`KeyedAction::identifier`] is the key to register a
//! [`Binding`](dialogkit_core::Binding) under; [`Dialog::action_identifiers`]
//! lists every key a dialog can send.

pub mod body;
pub mod button;
pub mod convert;
pub mod dialog;
pub mod error;
pub mod input;
pub mod native;
pub mod opener;
pub mod text;

pub use body::{DialogBody, ItemBody, ItemBodyBuilder, ItemStack, PlainMessageBody};
pub use button::{Button, ButtonData, ButtonDataBuilder, KeyedAction};
pub use convert::ToNative;
pub use dialog::{
    AfterAction, Dialog, DialogData, DialogDataBuilder, LinksDialog, ListDialog,
    MultiActionDialog, NoticeDialog,
};
pub use error::{BuildError, BuildResult};
pub use input::{
    BooleanInput, Entry, Input, MultilineOptions, NumberRangeInput, RangeInfo, SingleOptionInput,
    TextInput,
};
pub use native::NativeDialog;
pub use opener::{BoxedOpener, DialogOpener, open_dialog};
pub use text::{JsonTextTranslator, NativeText, Text, TextTranslator};
