//! Dialogs: shared [`DialogData`] plus one of four layouts.
//!
//! ```rust,ignore
//! let dialog: Dialog = NoticeDialog::builder()
//!     .data(DialogData::builder().title("Are you sure?").build()?)
//!     .button(Button::new(ButtonData::builder().label("Confirm").build()?)
//!         .with_action(KeyedAction::parse("dialogkit:confirm")?))
//!     .build()?
//!     .into();
//! ```

use serde::Serialize;

use crate::body::DialogBody;
use crate::button::{Button, check_width};
use crate::convert::ToNative;
use crate::error::{BuildError, BuildResult};
use crate::input::Input;
use crate::native::{NativeCommon, NativeDialog};
use crate::text::{Text, TextTranslator};

/// Default columns of link and list layouts.
pub const DEFAULT_GRID_COLUMNS: u32 = 2;

/// Default button width of link and list layouts.
pub const DEFAULT_GRID_BUTTON_WIDTH: u32 = 150;

/// What the client does after a button action runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterAction {
    /// Close the dialog.
    #[default]
    Close,
    /// Keep the dialog open.
    None,
    /// Replace the dialog with a waiting screen until the server answers.
    WaitForResponse,
}

fn check_columns(record: &'static str, columns: u32) -> BuildResult<()> {
    if columns == 0 {
        return Err(BuildError::invalid(record, "columns", "must be positive"));
    }
    Ok(())
}

// =============================================================================
// DialogData
// =============================================================================

/// Title, behavior flags, bodies and inputs shared by every layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogData {
    title: Text,
    external_title: Option<Text>,
    can_close_with_escape: bool,
    pause: bool,
    after_action: AfterAction,
    bodies: Vec<DialogBody>,
    inputs: Vec<Input>,
}

impl DialogData {
    pub fn builder() -> DialogDataBuilder {
        DialogDataBuilder::default()
    }

    pub fn title(&self) -> &Text {
        &self.title
    }

    pub fn after_action(&self) -> AfterAction {
        self.after_action
    }

    pub fn bodies(&self) -> &[DialogBody] {
        &self.bodies
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }
}

/// Builder for [`DialogData`]. The title is required.
#[derive(Debug, Clone)]
pub struct DialogDataBuilder {
    title: Option<Text>,
    external_title: Option<Text>,
    can_close_with_escape: bool,
    pause: bool,
    after_action: AfterAction,
    bodies: Vec<DialogBody>,
    inputs: Vec<Input>,
}

impl Default for DialogDataBuilder {
    fn default() -> Self {
        Self {
            title: None,
            external_title: None,
            can_close_with_escape: true,
            pause: true,
            after_action: AfterAction::Close,
            bodies: Vec::new(),
            inputs: Vec::new(),
        }
    }
}

impl DialogDataBuilder {
    pub fn title(mut self, title: impl Into<Text>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title shown on buttons that open this dialog from another one.
    pub fn external_title(mut self, title: impl Into<Text>) -> Self {
        self.external_title = Some(title.into());
        self
    }

    pub fn can_close_with_escape(mut self, can_close: bool) -> Self {
        self.can_close_with_escape = can_close;
        self
    }

    /// Pauses a single-player game while the dialog is open.
    pub fn pause(mut self, pause: bool) -> Self {
        self.pause = pause;
        self
    }

    pub fn after_action(mut self, after_action: AfterAction) -> Self {
        self.after_action = after_action;
        self
    }

    pub fn body(mut self, body: impl Into<DialogBody>) -> Self {
        self.bodies.push(body.into());
        self
    }

    pub fn input(mut self, input: impl Into<Input>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn build(self) -> BuildResult<DialogData> {
        const RECORD: &str = "DialogData";
        let title = self.title.ok_or(BuildError::missing(RECORD, "title"))?;
        let mut seen = std::collections::HashSet::new();
        for input in &self.inputs {
            if !seen.insert(input.key()) {
                return Err(BuildError::invalid(
                    RECORD,
                    "inputs",
                    format!("duplicate input key '{}'", input.key()),
                ));
            }
        }
        Ok(DialogData {
            title,
            external_title: self.external_title,
            can_close_with_escape: self.can_close_with_escape,
            pause: self.pause,
            after_action: self.after_action,
            bodies: self.bodies,
            inputs: self.inputs,
        })
    }
}

impl ToNative for DialogData {
    type Native = NativeCommon;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativeCommon {
        NativeCommon {
            title: translator.translate(&self.title),
            external_title: self.external_title.as_ref().map(|t| translator.translate(t)),
            can_close_with_escape: self.can_close_with_escape,
            pause: self.pause,
            after_action: self.after_action,
            body: self.bodies.to_native(translator),
            inputs: self.inputs.to_native(translator),
        }
    }
}

// =============================================================================
// Layouts
// =============================================================================

/// A message with a single button.
#[derive(Debug, Clone, PartialEq)]
pub struct NoticeDialog {
    data: DialogData,
    button: Button,
}

impl NoticeDialog {
    pub fn builder() -> NoticeDialogBuilder {
        NoticeDialogBuilder::default()
    }

    pub fn button(&self) -> &Button {
        &self.button
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoticeDialogBuilder {
    data: Option<DialogData>,
    button: Option<Button>,
}

impl NoticeDialogBuilder {
    pub fn data(mut self, data: DialogData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn button(mut self, button: Button) -> Self {
        self.button = Some(button);
        self
    }

    pub fn build(self) -> BuildResult<NoticeDialog> {
        const RECORD: &str = "NoticeDialog";
        Ok(NoticeDialog {
            data: self.data.ok_or(BuildError::missing(RECORD, "data"))?,
            button: self.button.ok_or(BuildError::missing(RECORD, "button"))?,
        })
    }
}

/// A grid of action buttons.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiActionDialog {
    data: DialogData,
    buttons: Vec<Button>,
    exit_button: Option<Button>,
    columns: u32,
}

impl MultiActionDialog {
    pub fn builder() -> MultiActionDialogBuilder {
        MultiActionDialogBuilder::default()
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }
}

#[derive(Debug, Clone)]
pub struct MultiActionDialogBuilder {
    data: Option<DialogData>,
    buttons: Vec<Button>,
    exit_button: Option<Button>,
    columns: u32,
}

impl Default for MultiActionDialogBuilder {
    fn default() -> Self {
        Self {
            data: None,
            buttons: Vec::new(),
            exit_button: None,
            columns: 1,
        }
    }
}

impl MultiActionDialogBuilder {
    pub fn data(mut self, data: DialogData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.buttons = buttons.into_iter().collect();
        self
    }

    pub fn exit_button(mut self, button: Button) -> Self {
        self.exit_button = Some(button);
        self
    }

    pub fn columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn build(self) -> BuildResult<MultiActionDialog> {
        const RECORD: &str = "MultiActionDialog";
        let data = self.data.ok_or(BuildError::missing(RECORD, "data"))?;
        if self.buttons.is_empty() {
            return Err(BuildError::invalid(RECORD, "buttons", "at least one button is required"));
        }
        check_columns(RECORD, self.columns)?;
        Ok(MultiActionDialog {
            data,
            buttons: self.buttons,
            exit_button: self.exit_button,
            columns: self.columns,
        })
    }
}

/// The server's configured links.
#[derive(Debug, Clone, PartialEq)]
pub struct LinksDialog {
    data: DialogData,
    exit_button: Option<Button>,
    columns: u32,
    button_width: u32,
}

impl LinksDialog {
    pub fn builder() -> LinksDialogBuilder {
        LinksDialogBuilder::default()
    }
}

#[derive(Debug, Clone)]
pub struct LinksDialogBuilder {
    data: Option<DialogData>,
    exit_button: Option<Button>,
    columns: u32,
    button_width: u32,
}

impl Default for LinksDialogBuilder {
    fn default() -> Self {
        Self {
            data: None,
            exit_button: None,
            columns: DEFAULT_GRID_COLUMNS,
            button_width: DEFAULT_GRID_BUTTON_WIDTH,
        }
    }
}

impl LinksDialogBuilder {
    pub fn data(mut self, data: DialogData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn exit_button(mut self, button: Button) -> Self {
        self.exit_button = Some(button);
        self
    }

    pub fn columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn button_width(mut self, width: u32) -> Self {
        self.button_width = width;
        self
    }

    pub fn build(self) -> BuildResult<LinksDialog> {
        const RECORD: &str = "LinksDialog";
        let data = self.data.ok_or(BuildError::missing(RECORD, "data"))?;
        check_columns(RECORD, self.columns)?;
        check_width(RECORD, self.button_width)?;
        Ok(LinksDialog {
            data,
            exit_button: self.exit_button,
            columns: self.columns,
            button_width: self.button_width,
        })
    }
}

/// Buttons that each open a nested dialog.
#[derive(Debug, Clone, PartialEq)]
pub struct ListDialog {
    data: DialogData,
    dialogs: Vec<Dialog>,
    exit_button: Option<Button>,
    columns: u32,
    button_width: u32,
}

impl ListDialog {
    pub fn builder() -> ListDialogBuilder {
        ListDialogBuilder::default()
    }

    pub fn dialogs(&self) -> &[Dialog] {
        &self.dialogs
    }
}

#[derive(Debug, Clone)]
pub struct ListDialogBuilder {
    data: Option<DialogData>,
    dialogs: Vec<Dialog>,
    exit_button: Option<Button>,
    columns: u32,
    button_width: u32,
}

impl Default for ListDialogBuilder {
    fn default() -> Self {
        Self {
            data: None,
            dialogs: Vec::new(),
            exit_button: None,
            columns: DEFAULT_GRID_COLUMNS,
            button_width: DEFAULT_GRID_BUTTON_WIDTH,
        }
    }
}

impl ListDialogBuilder {
    pub fn data(mut self, data: DialogData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn dialog(mut self, dialog: impl Into<Dialog>) -> Self {
        self.dialogs.push(dialog.into());
        self
    }

    pub fn dialogs(mut self, dialogs: impl IntoIterator<Item = Dialog>) -> Self {
        self.dialogs = dialogs.into_iter().collect();
        self
    }

    pub fn exit_button(mut self, button: Button) -> Self {
        self.exit_button = Some(button);
        self
    }

    pub fn columns(mut self, columns: u32) -> Self {
        self.columns = columns;
        self
    }

    pub fn button_width(mut self, width: u32) -> Self {
        self.button_width = width;
        self
    }

    pub fn build(self) -> BuildResult<ListDialog> {
        const RECORD: &str = "ListDialog";
        let data = self.data.ok_or(BuildError::missing(RECORD, "data"))?;
        check_columns(RECORD, self.columns)?;
        check_width(RECORD, self.button_width)?;
        Ok(ListDialog {
            data,
            dialogs: self.dialogs,
            exit_button: self.exit_button,
            columns: self.columns,
            button_width: self.button_width,
        })
    }
}

// =============================================================================
// Dialog
// =============================================================================

/// Any dialog layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Notice(NoticeDialog),
    MultiAction(MultiActionDialog),
    Links(LinksDialog),
    List(ListDialog),
}

impl Dialog {
    pub fn data(&self) -> &DialogData {
        match self {
            Self::Notice(d) => &d.data,
            Self::MultiAction(d) => &d.data,
            Self::Links(d) => &d.data,
            Self::List(d) => &d.data,
        }
    }

    /// Every binding key reachable from this dialog's buttons, nested
    /// dialogs included, in declaration order.
    pub fn action_identifiers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<String>) {
        let mut push = |button: &Button| {
            if let Some(action) = button.action() {
                out.push(action.identifier());
            }
        };
        match self {
            Self::Notice(d) => push(&d.button),
            Self::MultiAction(d) => {
                d.buttons.iter().for_each(&mut push);
                d.exit_button.iter().for_each(&mut push);
            }
            Self::Links(d) => d.exit_button.iter().for_each(&mut push),
            Self::List(d) => {
                d.exit_button.iter().for_each(&mut push);
                for nested in &d.dialogs {
                    nested.collect_identifiers(out);
                }
            }
        }
    }
}

impl From<NoticeDialog> for Dialog {
    fn from(dialog: NoticeDialog) -> Self {
        Self::Notice(dialog)
    }
}

impl From<MultiActionDialog> for Dialog {
    fn from(dialog: MultiActionDialog) -> Self {
        Self::MultiAction(dialog)
    }
}

impl From<LinksDialog> for Dialog {
    fn from(dialog: LinksDialog) -> Self {
        Self::Links(dialog)
    }
}

impl From<ListDialog> for Dialog {
    fn from(dialog: ListDialog) -> Self {
        Self::List(dialog)
    }
}

impl ToNative for Dialog {
    type Native = NativeDialog;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativeDialog {
        let common = self.data().to_native(translator);
        match self {
            Self::Notice(d) => NativeDialog::Notice {
                common,
                action: d.button.to_native(translator),
            },
            Self::MultiAction(d) => NativeDialog::MultiAction {
                common,
                actions: d.buttons.to_native(translator),
                exit_action: d.exit_button.to_native(translator),
                columns: d.columns,
            },
            Self::Links(d) => NativeDialog::ServerLinks {
                common,
                exit_action: d.exit_button.to_native(translator),
                columns: d.columns,
                button_width: d.button_width,
            },
            Self::List(d) => NativeDialog::DialogList {
                common,
                dialogs: d.dialogs.to_native(translator),
                exit_action: d.exit_button.to_native(translator),
                columns: d.columns,
                button_width: d.button_width,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PlainMessageBody;
    use crate::button::{ButtonData, KeyedAction};
    use crate::input::BooleanInput;
    use crate::text::JsonTextTranslator;
    use serde_json::json;

    fn data(title: &str) -> DialogData {
        DialogData::builder().title(title).build().unwrap()
    }

    fn button(label: &str, id: Option<&str>) -> Button {
        let button = Button::new(ButtonData::builder().label(label).build().unwrap());
        match id {
            Some(id) => button.with_action(KeyedAction::parse(id).unwrap()),
            None => button,
        }
    }

    #[test]
    fn test_dialog_data_requires_title() {
        assert_eq!(
            DialogData::builder().build().unwrap_err(),
            BuildError::missing("DialogData", "title")
        );
    }

    #[test]
    fn test_duplicate_input_keys_rejected() {
        let toggle = || BooleanInput::builder().key("agree").build().unwrap();
        let err = DialogData::builder()
            .title("t")
            .input(toggle())
            .input(toggle())
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::Invalid { field: "inputs", .. }));
    }

    #[test]
    fn test_notice_requires_button() {
        let err = NoticeDialog::builder().data(data("t")).build().unwrap_err();
        assert_eq!(err, BuildError::missing("NoticeDialog", "button"));
    }

    #[test]
    fn test_multi_action_requires_button() {
        let err = MultiActionDialog::builder().data(data("t")).build().unwrap_err();
        assert!(matches!(err, BuildError::Invalid { field: "buttons", .. }));

        let dialog = MultiActionDialog::builder()
            .data(data("t"))
            .button(button("a", None))
            .build()
            .unwrap();
        assert_eq!(dialog.columns(), 1);
    }

    #[test]
    fn test_grid_defaults() {
        let links: Dialog = LinksDialog::builder().data(data("links")).build().unwrap().into();
        let native = links.to_native(&JsonTextTranslator);
        assert!(matches!(
            native,
            NativeDialog::ServerLinks {
                columns: 2,
                button_width: 150,
                ..
            }
        ));
    }

    #[test]
    fn test_action_identifiers_include_nested() {
        let inner: Dialog = NoticeDialog::builder()
            .data(data("inner"))
            .button(button("ok", Some("dialogkit:inner")))
            .build()
            .unwrap()
            .into();
        let outer: Dialog = ListDialog::builder()
            .data(data("outer"))
            .dialog(inner)
            .exit_button(button("back", Some("dialogkit:back")))
            .build()
            .unwrap()
            .into();

        assert_eq!(outer.action_identifiers(), vec!["dialogkit:back", "dialogkit:inner"]);
    }

    #[test]
    fn test_notice_to_native() {
        let dialog: Dialog = NoticeDialog::builder()
            .data(
                DialogData::builder()
                    .title("Are you sure?")
                    .body(PlainMessageBody::new("This cannot be undone."))
                    .after_action(AfterAction::WaitForResponse)
                    .build()
                    .unwrap(),
            )
            .button(button("Confirm", Some("dialogkit:confirm")))
            .build()
            .unwrap()
            .into();

        assert_eq!(
            serde_json::to_value(dialog.to_native(&JsonTextTranslator)).unwrap(),
            json!({
                "type": "minecraft:notice",
                "title": {"text": "Are you sure?"},
                "can_close_with_escape": true,
                "pause": true,
                "after_action": "wait_for_response",
                "body": [{
                    "type": "minecraft:plain_message",
                    "contents": {"text": "This cannot be undone."},
                    "width": 200
                }],
                "action": {
                    "label": {"text": "Confirm"},
                    "width": 100,
                    "action": {"type": "dynamic/custom", "id": "dialogkit:confirm"}
                }
            })
        );
    }
}
