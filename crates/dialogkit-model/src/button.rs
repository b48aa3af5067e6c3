//! Buttons and the actions they carry.

use dialogkit_core::{NamedValues, ResourceLocation};

use crate::convert::ToNative;
use crate::error::{BuildError, BuildResult};
use crate::native::{NativeAction, NativeButton};
use crate::text::{Text, TextTranslator};

/// Label used when none is given.
pub const DEFAULT_BUTTON_LABEL: &str = "N/D";

/// Width used when none is given.
pub const DEFAULT_BUTTON_WIDTH: u32 = 100;

/// Widths accepted by the client for buttons and inputs.
pub const WIDTH_RANGE: std::ops::RangeInclusive<u32> = 1..=1024;

pub(crate) fn check_width(record: &'static str, width: u32) -> BuildResult<()> {
    if WIDTH_RANGE.contains(&width) {
        Ok(())
    } else {
        Err(BuildError::invalid(
            record,
            "width",
            format!("{width} is outside {}..={}", WIDTH_RANGE.start(), WIDTH_RANGE.end()),
        ))
    }
}

// =============================================================================
// ButtonData
// =============================================================================

/// Label, width and tooltip of a button.
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonData {
    label: Text,
    width: u32,
    tooltip: Option<Text>,
}

impl ButtonData {
    pub fn builder() -> ButtonDataBuilder {
        ButtonDataBuilder::default()
    }

    pub fn label(&self) -> &Text {
        &self.label
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn tooltip(&self) -> Option<&Text> {
        self.tooltip.as_ref()
    }
}

/// Builder for [`ButtonData`].
#[derive(Debug, Clone)]
pub struct ButtonDataBuilder {
    label: Text,
    width: u32,
    tooltip: Option<Text>,
}

impl Default for ButtonDataBuilder {
    fn default() -> Self {
        Self {
            label: Text::plain(DEFAULT_BUTTON_LABEL),
            width: DEFAULT_BUTTON_WIDTH,
            tooltip: None,
        }
    }
}

impl ButtonDataBuilder {
    pub fn label(mut self, label: impl Into<Text>) -> Self {
        self.label = label.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<Text>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    pub fn build(self) -> BuildResult<ButtonData> {
        check_width("ButtonData", self.width)?;
        Ok(ButtonData {
            label: self.label,
            width: self.width,
            tooltip: self.tooltip,
        })
    }
}

// =============================================================================
// KeyedAction
// =============================================================================

/// A custom click action identified by a resource location.
///
/// When clicked, the client sends a click packet whose id is the location's
/// string form; that string is the key to register a binding under.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedAction {
    id: ResourceLocation,
    additions: Option<NamedValues>,
}

impl KeyedAction {
    pub fn new(id: ResourceLocation) -> Self {
        Self {
            id,
            additions: None,
        }
    }

    /// Parses `namespace:path` into an action.
    pub fn parse(id: &str) -> BuildResult<Self> {
        Ok(Self::new(ResourceLocation::parse(id)?))
    }

    /// Attaches static values sent back with every click.
    pub fn with_additions(mut self, additions: NamedValues) -> Self {
        self.additions = Some(additions);
        self
    }

    pub fn id(&self) -> &ResourceLocation {
        &self.id
    }

    /// The binding key the click packet will carry.
    pub fn identifier(&self) -> String {
        self.id.to_string()
    }

    pub fn additions(&self) -> Option<&NamedValues> {
        self.additions.as_ref()
    }
}

impl ToNative for KeyedAction {
    type Native = NativeAction;

    fn to_native(&self, _translator: &dyn TextTranslator) -> NativeAction {
        NativeAction::DynamicCustom {
            id: self.id.clone(),
            additions: self.additions.clone(),
        }
    }
}

// =============================================================================
// Button
// =============================================================================

/// A clickable button, optionally carrying a [`KeyedAction`].
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    data: ButtonData,
    action: Option<KeyedAction>,
}

impl Button {
    pub fn new(data: ButtonData) -> Self {
        Self { data, action: None }
    }

    pub fn with_action(mut self, action: KeyedAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn data(&self) -> &ButtonData {
        &self.data
    }

    pub fn action(&self) -> Option<&KeyedAction> {
        self.action.as_ref()
    }
}

impl ToNative for Button {
    type Native = NativeButton;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativeButton {
        NativeButton {
            label: translator.translate(&self.data.label),
            tooltip: self.data.tooltip.as_ref().map(|t| translator.translate(t)),
            width: self.data.width,
            action: self.action.as_ref().map(|a| a.to_native(translator)),
        }
    }
}
