//! Dialog input controls.
//!
//! Every input has a `key`. When the dialog is submitted, the client sends
//! each input's value under its key in the click payload, which is what an
//! [`InputReader`](dialogkit_core::InputReader) receives.
//!
//! | Control | Payload value |
//! |---|---|
//! | [`BooleanInput`] | byte `0` / `1` |
//! | [`NumberRangeInput`] | float |
//! | [`SingleOptionInput`] | string (entry id) |
//! | [`TextInput`] | string |

use crate::button::check_width;
use crate::convert::ToNative;
use crate::error::{BuildError, BuildResult};
use crate::native::{NativeEntry, NativeInput, NativeInputControl, NativeMultiline};
use crate::text::{Text, TextTranslator};

/// Label used when none is given.
pub const DEFAULT_INPUT_LABEL: &str = "N/D";

/// Width used when none is given.
pub const DEFAULT_INPUT_WIDTH: u32 = 100;

/// Default maximum length of a text input.
pub const DEFAULT_MAX_LENGTH: u32 = 255;

fn check_key(record: &'static str, key: Option<String>) -> BuildResult<String> {
    let key = key.ok_or(BuildError::missing(record, "key"))?;
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(BuildError::invalid(
            record,
            "key",
            format!("'{key}' must be non-empty and contain only [A-Za-z0-9_]"),
        ));
    }
    Ok(key)
}

// =============================================================================
// Options
// =============================================================================

/// Bounds of a number range slider.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeInfo {
    start: f32,
    end: f32,
    initial: Option<f32>,
    step: Option<f32>,
}

impl RangeInfo {
    pub fn builder() -> RangeInfoBuilder {
        RangeInfoBuilder::default()
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn end(&self) -> f32 {
        self.end
    }

    pub fn initial(&self) -> Option<f32> {
        self.initial
    }

    pub fn step(&self) -> Option<f32> {
        self.step
    }
}

/// Builder for [`RangeInfo`].
#[derive(Debug, Clone)]
pub struct RangeInfoBuilder {
    start: f32,
    end: f32,
    initial: Option<f32>,
    step: Option<f32>,
}

impl Default for RangeInfoBuilder {
    fn default() -> Self {
        Self {
            start: 1.0,
            end: 1.0,
            initial: None,
            step: None,
        }
    }
}

impl RangeInfoBuilder {
    pub fn start(mut self, start: f32) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: f32) -> Self {
        self.end = end;
        self
    }

    pub fn initial(mut self, initial: f32) -> Self {
        self.initial = Some(initial);
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = Some(step);
        self
    }

    pub fn build(self) -> BuildResult<RangeInfo> {
        const RECORD: &str = "RangeInfo";
        if !self.start.is_finite() || !self.end.is_finite() || self.start > self.end {
            return Err(BuildError::invalid(
                RECORD,
                "end",
                format!("range {}..{} is empty or not finite", self.start, self.end),
            ));
        }
        if let Some(initial) = self.initial
            && !(self.start..=self.end).contains(&initial)
        {
            return Err(BuildError::invalid(
                RECORD,
                "initial",
                format!("{initial} is outside {}..={}", self.start, self.end),
            ));
        }
        if let Some(step) = self.step
            && !(step > 0.0 && step.is_finite())
        {
            return Err(BuildError::invalid(RECORD, "step", "must be positive"));
        }
        Ok(RangeInfo {
            start: self.start,
            end: self.end,
            initial: self.initial,
            step: self.step,
        })
    }
}

/// One selectable option of a [`SingleOptionInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    id: String,
    initial: bool,
    display: Option<Text>,
}

impl Entry {
    pub fn builder() -> EntryBuilder {
        EntryBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    pub fn display(&self) -> Option<&Text> {
        self.display.as_ref()
    }
}

/// Builder for [`Entry`].
#[derive(Debug, Clone, Default)]
pub struct EntryBuilder {
    id: Option<String>,
    initial: bool,
    display: Option<Text>,
}

impl EntryBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    pub fn display(mut self, display: impl Into<Text>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn build(self) -> BuildResult<Entry> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or(BuildError::missing("Entry", "id"))?;
        Ok(Entry {
            id,
            initial: self.initial,
            display: self.display,
        })
    }
}

/// Multi-line layout of a [`TextInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultilineOptions {
    max_lines: u32,
    height: u32,
}

impl MultilineOptions {
    /// Creates options; `height` must be within `1..=512` and `max_lines`
    /// positive.
    pub fn new(max_lines: u32, height: u32) -> BuildResult<Self> {
        if max_lines == 0 {
            return Err(BuildError::invalid("MultilineOptions", "max_lines", "must be positive"));
        }
        if !(1..=512).contains(&height) {
            return Err(BuildError::invalid(
                "MultilineOptions",
                "height",
                format!("{height} is outside 1..=512"),
            ));
        }
        Ok(Self { max_lines, height })
    }

    pub fn max_lines(&self) -> u32 {
        self.max_lines
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

// =============================================================================
// Controls
// =============================================================================

/// An on/off toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanInput {
    key: String,
    label: Text,
    initial: bool,
    on_true: String,
    on_false: String,
}

/// Builder for [`BooleanInput`].
#[derive(Debug, Clone)]
pub struct BooleanInputBuilder {
    key: Option<String>,
    label: Text,
    initial: bool,
    on_true: String,
    on_false: String,
}

impl Default for BooleanInputBuilder {
    fn default() -> Self {
        Self {
            key: None,
            label: Text::plain(DEFAULT_INPUT_LABEL),
            initial: false,
            on_true: "true".into(),
            on_false: "false".into(),
        }
    }
}

impl BooleanInput {
    pub fn builder() -> BooleanInputBuilder {
        BooleanInputBuilder::default()
    }

    pub fn initial(&self) -> bool {
        self.initial
    }
}

impl BooleanInputBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn label(mut self, label: impl Into<Text>) -> Self {
        self.label = label.into();
        self
    }

    pub fn initial(mut self, initial: bool) -> Self {
        self.initial = initial;
        self
    }

    /// Template value substituted when the toggle is on.
    pub fn on_true(mut self, value: impl Into<String>) -> Self {
        self.on_true = value.into();
        self
    }

    /// Template value substituted when the toggle is off.
    pub fn on_false(mut self, value: impl Into<String>) -> Self {
        self.on_false = value.into();
        self
    }

    pub fn build(self) -> BuildResult<BooleanInput> {
        Ok(BooleanInput {
            key: check_key("BooleanInput", self.key)?,
            label: self.label,
            initial: self.initial,
            on_true: self.on_true,
            on_false: self.on_false,
        })
    }
}

/// A numeric slider.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberRangeInput {
    key: String,
    label: Text,
    width: u32,
    label_format: String,
    range: RangeInfo,
}

impl NumberRangeInput {
    pub fn builder() -> NumberRangeInputBuilder {
        NumberRangeInputBuilder::default()
    }

    pub fn range(&self) -> &RangeInfo {
        &self.range
    }
}

/// Builder for [`NumberRangeInput`]. A [`RangeInfo`] is required.
#[derive(Debug, Clone)]
pub struct NumberRangeInputBuilder {
    key: Option<String>,
    label: Text,
    width: u32,
    label_format: String,
    range: Option<RangeInfo>,
}

impl Default for NumberRangeInputBuilder {
    fn default() -> Self {
        Self {
            key: None,
            label: Text::plain(DEFAULT_INPUT_LABEL),
            width: DEFAULT_INPUT_WIDTH,
            label_format: "options.generic_value".into(),
            range: None,
        }
    }
}

impl NumberRangeInputBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn label(mut self, label: impl Into<Text>) -> Self {
        self.label = label.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    /// Translation key used to format the label and value.
    pub fn label_format(mut self, format: impl Into<String>) -> Self {
        self.label_format = format.into();
        self
    }

    pub fn range(mut self, range: RangeInfo) -> Self {
        self.range = Some(range);
        self
    }

    pub fn build(self) -> BuildResult<NumberRangeInput> {
        const RECORD: &str = "NumberRangeInput";
        let key = check_key(RECORD, self.key)?;
        let range = self.range.ok_or(BuildError::missing(RECORD, "range"))?;
        check_width(RECORD, self.width)?;
        Ok(NumberRangeInput {
            key,
            label: self.label,
            width: self.width,
            label_format: self.label_format,
            range,
        })
    }
}

/// A choice among [`Entry`] options.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleOptionInput {
    key: String,
    label: Text,
    width: u32,
    entries: Vec<Entry>,
    label_visible: bool,
}

impl SingleOptionInput {
    pub fn builder() -> SingleOptionInputBuilder {
        SingleOptionInputBuilder::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

/// Builder for [`SingleOptionInput`]. At least one entry is required.
#[derive(Debug, Clone)]
pub struct SingleOptionInputBuilder {
    key: Option<String>,
    label: Text,
    width: u32,
    entries: Vec<Entry>,
    label_visible: bool,
}

impl Default for SingleOptionInputBuilder {
    fn default() -> Self {
        Self {
            key: None,
            label: Text::plain(DEFAULT_INPUT_LABEL),
            width: DEFAULT_INPUT_WIDTH,
            entries: Vec::new(),
            label_visible: true,
        }
    }
}

impl SingleOptionInputBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn label(mut self, label: impl Into<Text>) -> Self {
        self.label = label.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(mut self, entries: impl IntoIterator<Item = Entry>) -> Self {
        self.entries = entries.into_iter().collect();
        self
    }

    pub fn label_visible(mut self, visible: bool) -> Self {
        self.label_visible = visible;
        self
    }

    pub fn build(self) -> BuildResult<SingleOptionInput> {
        const RECORD: &str = "SingleOptionInput";
        let key = check_key(RECORD, self.key)?;
        check_width(RECORD, self.width)?;
        if self.entries.is_empty() {
            return Err(BuildError::missing(RECORD, "entries"));
        }
        if self.entries.iter().filter(|e| e.initial).count() > 1 {
            return Err(BuildError::invalid(RECORD, "entries", "more than one initial entry"));
        }
        Ok(SingleOptionInput {
            key,
            label: self.label,
            width: self.width,
            entries: self.entries,
            label_visible: self.label_visible,
        })
    }
}

/// A free-text field.
#[derive(Debug, Clone, PartialEq)]
pub struct TextInput {
    key: String,
    label: Text,
    width: u32,
    label_visible: bool,
    initial: String,
    max_length: u32,
    multiline: MultilineOptions,
}

impl TextInput {
    pub fn builder() -> TextInputBuilder {
        TextInputBuilder::default()
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    pub fn multiline(&self) -> MultilineOptions {
        self.multiline
    }
}

/// Builder for [`TextInput`]. [`MultilineOptions`] are required.
#[derive(Debug, Clone)]
pub struct TextInputBuilder {
    key: Option<String>,
    label: Text,
    width: u32,
    label_visible: bool,
    initial: String,
    max_length: u32,
    multiline: Option<MultilineOptions>,
}

impl Default for TextInputBuilder {
    fn default() -> Self {
        Self {
            key: None,
            label: Text::plain(DEFAULT_INPUT_LABEL),
            width: DEFAULT_INPUT_WIDTH,
            label_visible: true,
            initial: String::new(),
            max_length: DEFAULT_MAX_LENGTH,
            multiline: None,
        }
    }
}

impl TextInputBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn label(mut self, label: impl Into<Text>) -> Self {
        self.label = label.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn label_visible(mut self, visible: bool) -> Self {
        self.label_visible = visible;
        self
    }

    pub fn initial(mut self, text: impl Into<String>) -> Self {
        self.initial = text.into();
        self
    }

    pub fn max_length(mut self, length: u32) -> Self {
        self.max_length = length;
        self
    }

    pub fn multiline(mut self, multiline: MultilineOptions) -> Self {
        self.multiline = Some(multiline);
        self
    }

    pub fn build(self) -> BuildResult<TextInput> {
        const RECORD: &str = "TextInput";
        let key = check_key(RECORD, self.key)?;
        let multiline = self.multiline.ok_or(BuildError::missing(RECORD, "multiline"))?;
        check_width(RECORD, self.width)?;
        if self.max_length == 0 {
            return Err(BuildError::invalid(RECORD, "max_length", "must be positive"));
        }
        if self.initial.chars().count() > self.max_length as usize {
            return Err(BuildError::invalid(
                RECORD,
                "initial",
                format!("longer than max_length {}", self.max_length),
            ));
        }
        Ok(TextInput {
            key,
            label: self.label,
            width: self.width,
            label_visible: self.label_visible,
            initial: self.initial,
            max_length: self.max_length,
            multiline,
        })
    }
}

// =============================================================================
// Input
// =============================================================================

/// Any input control.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Boolean(BooleanInput),
    NumberRange(NumberRangeInput),
    SingleOption(SingleOptionInput),
    Text(TextInput),
}

impl Input {
    /// The payload key of this input.
    pub fn key(&self) -> &str {
        match self {
            Self::Boolean(i) => &i.key,
            Self::NumberRange(i) => &i.key,
            Self::SingleOption(i) => &i.key,
            Self::Text(i) => &i.key,
        }
    }

    pub fn label(&self) -> &Text {
        match self {
            Self::Boolean(i) => &i.label,
            Self::NumberRange(i) => &i.label,
            Self::SingleOption(i) => &i.label,
            Self::Text(i) => &i.label,
        }
    }
}

impl From<BooleanInput> for Input {
    fn from(input: BooleanInput) -> Self {
        Self::Boolean(input)
    }
}

impl From<NumberRangeInput> for Input {
    fn from(input: NumberRangeInput) -> Self {
        Self::NumberRange(input)
    }
}

impl From<SingleOptionInput> for Input {
    fn from(input: SingleOptionInput) -> Self {
        Self::SingleOption(input)
    }
}

impl From<TextInput> for Input {
    fn from(input: TextInput) -> Self {
        Self::Text(input)
    }
}

impl ToNative for Input {
    type Native = NativeInput;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativeInput {
        let label = translator.translate(self.label());
        let control = match self {
            Self::Boolean(i) => NativeInputControl::Boolean {
                label,
                initial: i.initial,
                on_true: i.on_true.clone(),
                on_false: i.on_false.clone(),
            },
            Self::NumberRange(i) => NativeInputControl::NumberRange {
                width: i.width,
                label,
                label_format: i.label_format.clone(),
                start: i.range.start,
                end: i.range.end,
                initial: i.range.initial,
                step: i.range.step,
            },
            Self::SingleOption(i) => NativeInputControl::SingleOption {
                width: i.width,
                label,
                label_visible: i.label_visible,
                options: i
                    .entries
                    .iter()
                    .map(|e| NativeEntry {
                        id: e.id.clone(),
                        display: e.display.as_ref().map(|d| translator.translate(d)),
                        initial: e.initial,
                    })
                    .collect(),
            },
            Self::Text(i) => NativeInputControl::Text {
                width: i.width,
                label,
                label_visible: i.label_visible,
                initial: i.initial.clone(),
                max_length: i.max_length,
                multiline: Some(NativeMultiline {
                    max_lines: i.multiline.max_lines,
                    height: i.multiline.height,
                }),
            },
        };
        NativeInput {
            key: self.key().to_string(),
            control,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::JsonTextTranslator;
    use serde_json::json;

    #[test]
    fn test_number_range_requires_range() {
        let err = NumberRangeInput::builder().key("amount").build().unwrap_err();
        assert_eq!(err, BuildError::missing("NumberRangeInput", "range"));
    }

    #[test]
    fn test_text_input_requires_multiline() {
        let err = TextInput::builder().key("name").build().unwrap_err();
        assert_eq!(err, BuildError::missing("TextInput", "multiline"));

        let input = TextInput::builder()
            .key("name")
            .multiline(MultilineOptions::new(4, 64).unwrap())
            .build()
            .unwrap();
        assert_eq!(input.max_length(), DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn test_key_is_required_and_validated() {
        assert_eq!(
            BooleanInput::builder().build().unwrap_err(),
            BuildError::missing("BooleanInput", "key")
        );
        assert!(matches!(
            BooleanInput::builder().key("has space").build(),
            Err(BuildError::Invalid { field: "key", .. })
        ));
    }

    #[test]
    fn test_range_validation() {
        assert!(RangeInfo::builder().start(5.0).end(1.0).build().is_err());
        assert!(RangeInfo::builder().start(0.0).end(10.0).initial(11.0).build().is_err());
        assert!(RangeInfo::builder().start(0.0).end(10.0).step(0.0).build().is_err());
        let range = RangeInfo::builder()
            .start(0.0)
            .end(10.0)
            .initial(5.0)
            .step(1.0)
            .build()
            .unwrap();
        assert_eq!(range.initial(), Some(5.0));
    }

    #[test]
    fn test_single_option_validation() {
        let entry = |id: &str, initial: bool| Entry::builder().id(id).initial(initial).build().unwrap();
        assert!(SingleOptionInput::builder().key("pick").build().is_err());
        assert!(
            SingleOptionInput::builder()
                .key("pick")
                .entry(entry("a", true))
                .entry(entry("b", true))
                .build()
                .is_err()
        );
        assert!(Entry::builder().build().is_err());
    }

    #[test]
    fn test_number_range_to_native() {
        let input: Input = NumberRangeInput::builder()
            .key("amount")
            .label("Amount")
            .range(RangeInfo::builder().start(0.0).end(10.0).step(1.0).build().unwrap())
            .build()
            .unwrap()
            .into();

        let native = input.to_native(&JsonTextTranslator);
        assert_eq!(
            serde_json::to_value(&native).unwrap(),
            json!({
                "key": "amount",
                "type": "minecraft:number_range",
                "width": 100,
                "label": {"text": "Amount"},
                "label_format": "options.generic_value",
                "start": 0.0,
                "end": 10.0,
                "step": 1.0
            })
        );
    }
}
