//! The host-side shape of a dialog.
//!
//! These records are what [`ToNative`](crate::ToNative) produces: every text is
//! already translated and every default is filled in. They serialize to the
//! vanilla dialog JSON layout, which is what most hosts accept directly.

use dialogkit_core::{NamedValues, ResourceLocation};
use serde::Serialize;

use crate::dialog::AfterAction;
use crate::text::NativeText;

/// A translated dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NativeDialog {
    #[serde(rename = "minecraft:notice")]
    Notice {
        #[serde(flatten)]
        common: NativeCommon,
        action: NativeButton,
    },
    #[serde(rename = "minecraft:multi_action")]
    MultiAction {
        #[serde(flatten)]
        common: NativeCommon,
        actions: Vec<NativeButton>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_action: Option<NativeButton>,
        columns: u32,
    },
    #[serde(rename = "minecraft:server_links")]
    ServerLinks {
        #[serde(flatten)]
        common: NativeCommon,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_action: Option<NativeButton>,
        columns: u32,
        button_width: u32,
    },
    #[serde(rename = "minecraft:dialog_list")]
    DialogList {
        #[serde(flatten)]
        common: NativeCommon,
        dialogs: Vec<NativeDialog>,
        #[serde(skip_serializing_if = "Option::is_none")]
        exit_action: Option<NativeButton>,
        columns: u32,
        button_width: u32,
    },
}

impl NativeDialog {
    pub fn common(&self) -> &NativeCommon {
        match self {
            Self::Notice { common, .. }
            | Self::MultiAction { common, .. }
            | Self::ServerLinks { common, .. }
            | Self::DialogList { common, .. } => common,
        }
    }
}

/// Fields shared by every dialog type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeCommon {
    pub title: NativeText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_title: Option<NativeText>,
    pub can_close_with_escape: bool,
    pub pause: bool,
    pub after_action: AfterAction,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<NativeBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<NativeInput>,
}

/// A translated button.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeButton {
    pub label: NativeText,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<NativeText>,
    pub width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<NativeAction>,
}

/// What a button does when clicked.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NativeAction {
    /// Sends a click packet with `id` and the dialog's input values merged
    /// into `additions`.
    #[serde(rename = "dynamic/custom")]
    DynamicCustom {
        id: ResourceLocation,
        #[serde(skip_serializing_if = "Option::is_none")]
        additions: Option<NamedValues>,
    },
}

/// A translated body element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NativeBody {
    #[serde(rename = "minecraft:plain_message")]
    PlainMessage(NativePlainMessage),
    #[serde(rename = "minecraft:item")]
    Item {
        item: NativeItem,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<NativePlainMessage>,
        show_decorations: bool,
        show_tooltip: bool,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativePlainMessage {
    pub contents: NativeText,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeItem {
    pub id: ResourceLocation,
    pub count: u32,
}

/// A translated input control with its payload key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeInput {
    pub key: String,
    #[serde(flatten)]
    pub control: NativeInputControl,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NativeInputControl {
    #[serde(rename = "minecraft:boolean")]
    Boolean {
        label: NativeText,
        initial: bool,
        on_true: String,
        on_false: String,
    },
    #[serde(rename = "minecraft:number_range")]
    NumberRange {
        width: u32,
        label: NativeText,
        label_format: String,
        start: f32,
        end: f32,
        #[serde(skip_serializing_if = "Option::is_none")]
        initial: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        step: Option<f32>,
    },
    #[serde(rename = "minecraft:single_option")]
    SingleOption {
        width: u32,
        label: NativeText,
        label_visible: bool,
        options: Vec<NativeEntry>,
    },
    #[serde(rename = "minecraft:text")]
    Text {
        width: u32,
        label: NativeText,
        label_visible: bool,
        initial: String,
        max_length: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        multiline: Option<NativeMultiline>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<NativeText>,
    pub initial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeMultiline {
    pub max_lines: u32,
    pub height: u32,
}
