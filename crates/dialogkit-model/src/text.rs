//! Rich text and its translation into the host's text representation.
//!
//! Records hold [`Text`]; conversion asks a [`TextTranslator`] for the host's
//! [`NativeText`]. [`JsonTextTranslator`] produces vanilla JSON text
//! components and is the default when the host has nothing better.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A styled text fragment with optional children.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underlined: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Text>,
}

impl Text {
    /// Unstyled text.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets a named (`red`) or hex (`#ff0000`) color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn underlined(mut self) -> Self {
        self.underlined = true;
        self
    }

    /// Appends a child fragment.
    pub fn append(mut self, child: impl Into<Text>) -> Self {
        self.extra.push(child.into());
        self
    }

    /// Returns `true` if neither this fragment nor its children hold text.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.extra.iter().all(Text::is_empty)
    }

    /// The concatenated content without styling.
    pub fn to_plain_string(&self) -> String {
        let mut out = self.content.clone();
        for child in &self.extra {
            out.push_str(&child.to_plain_string());
        }
        out
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::plain(s)
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self::plain(s)
    }
}

/// Text in the host's native representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NativeText(pub Value);

/// Converts [`Text`] into the host's representation.
pub trait TextTranslator: Send + Sync {
    fn translate(&self, text: &Text) -> NativeText;
}

/// Emits vanilla JSON text components.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTextTranslator;

impl JsonTextTranslator {
    fn component(text: &Text) -> Value {
        let mut obj = Map::new();
        obj.insert("text".into(), Value::String(text.content.clone()));
        if let Some(color) = &text.color {
            obj.insert("color".into(), Value::String(color.clone()));
        }
        if text.bold {
            obj.insert("bold".into(), Value::Bool(true));
        }
        if text.italic {
            obj.insert("italic".into(), Value::Bool(true));
        }
        if text.underlined {
            obj.insert("underlined".into(), Value::Bool(true));
        }
        if !text.extra.is_empty() {
            obj.insert(
                "extra".into(),
                Value::Array(text.extra.iter().map(Self::component).collect()),
            );
        }
        Value::Object(obj)
    }
}

impl TextTranslator for JsonTextTranslator {
    fn translate(&self, text: &Text) -> NativeText {
        NativeText(Self::component(text))
    }
}
