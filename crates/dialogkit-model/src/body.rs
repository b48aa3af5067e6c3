//! Dialog body elements.

use dialogkit_core::ResourceLocation;

use crate::button::check_width;
use crate::convert::ToNative;
use crate::error::{BuildError, BuildResult};
use crate::native::{NativeBody, NativeItem, NativePlainMessage};
use crate::text::{Text, TextTranslator};

/// Default width of a plain message.
pub const DEFAULT_MESSAGE_WIDTH: u32 = 200;

/// Default width and height of an item element.
pub const DEFAULT_ITEM_SIZE: u32 = 100;

/// A block of text.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainMessageBody {
    contents: Text,
    width: u32,
}

impl PlainMessageBody {
    pub fn new(contents: impl Into<Text>) -> Self {
        Self {
            contents: contents.into(),
            width: DEFAULT_MESSAGE_WIDTH,
        }
    }

    pub fn with_width(mut self, width: u32) -> BuildResult<Self> {
        check_width("PlainMessageBody", width)?;
        self.width = width;
        Ok(self)
    }

    pub fn contents(&self) -> &Text {
        &self.contents
    }

    pub fn width(&self) -> u32 {
        self.width
    }
}

impl ToNative for PlainMessageBody {
    type Native = NativePlainMessage;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativePlainMessage {
        NativePlainMessage {
            contents: translator.translate(&self.contents),
            width: self.width,
        }
    }
}

/// An item reference shown in a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    id: ResourceLocation,
    count: u32,
}

impl ItemStack {
    pub fn new(id: ResourceLocation, count: u32) -> Self {
        Self { id, count }
    }

    /// Parses `namespace:path`, defaulting to `minecraft`.
    pub fn parse(id: &str, count: u32) -> BuildResult<Self> {
        Ok(Self::new(ResourceLocation::parse(id)?, count))
    }

    pub fn id(&self) -> &ResourceLocation {
        &self.id
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

/// An item with optional description.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemBody {
    item: ItemStack,
    description: Option<PlainMessageBody>,
    show_decorations: bool,
    show_tooltip: bool,
    width: u32,
    height: u32,
}

impl ItemBody {
    pub fn builder() -> ItemBodyBuilder {
        ItemBodyBuilder::default()
    }

    pub fn item(&self) -> &ItemStack {
        &self.item
    }

    pub fn description(&self) -> Option<&PlainMessageBody> {
        self.description.as_ref()
    }
}

/// Builder for [`ItemBody`]. The item is required.
#[derive(Debug, Clone)]
pub struct ItemBodyBuilder {
    item: Option<ItemStack>,
    description: Option<PlainMessageBody>,
    show_decorations: bool,
    show_tooltip: bool,
    width: u32,
    height: u32,
}

impl Default for ItemBodyBuilder {
    fn default() -> Self {
        Self {
            item: None,
            description: None,
            show_decorations: true,
            show_tooltip: true,
            width: DEFAULT_ITEM_SIZE,
            height: DEFAULT_ITEM_SIZE,
        }
    }
}

impl ItemBodyBuilder {
    pub fn item(mut self, item: ItemStack) -> Self {
        self.item = Some(item);
        self
    }

    pub fn description(mut self, description: PlainMessageBody) -> Self {
        self.description = Some(description);
        self
    }

    pub fn show_decorations(mut self, show: bool) -> Self {
        self.show_decorations = show;
        self
    }

    pub fn show_tooltip(mut self, show: bool) -> Self {
        self.show_tooltip = show;
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn build(self) -> BuildResult<ItemBody> {
        const RECORD: &str = "ItemBody";
        let item = self.item.ok_or(BuildError::missing(RECORD, "item"))?;
        check_width(RECORD, self.width)?;
        if !(1..=256).contains(&self.height) {
            return Err(BuildError::invalid(
                RECORD,
                "height",
                format!("{} is outside 1..=256", self.height),
            ));
        }
        Ok(ItemBody {
            item,
            description: self.description,
            show_decorations: self.show_decorations,
            show_tooltip: self.show_tooltip,
            width: self.width,
            height: self.height,
        })
    }
}

/// Any body element.
#[derive(Debug, Clone, PartialEq)]
pub enum DialogBody {
    PlainMessage(PlainMessageBody),
    Item(ItemBody),
}

impl From<PlainMessageBody> for DialogBody {
    fn from(body: PlainMessageBody) -> Self {
        Self::PlainMessage(body)
    }
}

impl From<ItemBody> for DialogBody {
    fn from(body: ItemBody) -> Self {
        Self::Item(body)
    }
}

impl ToNative for DialogBody {
    type Native = NativeBody;

    fn to_native(&self, translator: &dyn TextTranslator) -> NativeBody {
        match self {
            Self::PlainMessage(message) => NativeBody::PlainMessage(message.to_native(translator)),
            Self::Item(body) => NativeBody::Item {
                item: NativeItem {
                    id: body.item.id.clone(),
                    count: body.item.count,
                },
                description: body.description.to_native(translator),
                show_decorations: body.show_decorations,
                show_tooltip: body.show_tooltip,
                width: body.width,
                height: body.height,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::JsonTextTranslator;
    use serde_json::json;

    #[test]
    fn test_item_body_requires_item() {
        let err = ItemBody::builder().build().unwrap_err();
        assert_eq!(err, BuildError::missing("ItemBody", "item"));
    }

    #[test]
    fn test_item_body_to_native() {
        let body: DialogBody = ItemBody::builder()
            .item(ItemStack::parse("diamond_sword", 1).unwrap())
            .description(PlainMessageBody::new("A sharp blade"))
            .show_tooltip(false)
            .build()
            .unwrap()
            .into();

        assert_eq!(
            serde_json::to_value(body.to_native(&JsonTextTranslator)).unwrap(),
            json!({
                "type": "minecraft:item",
                "item": {"id": "minecraft:diamond_sword", "count": 1},
                "description": {"contents": {"text": "A sharp blade"}, "width": 200},
                "show_decorations": true,
                "show_tooltip": false,
                "width": 100,
                "height": 100
            })
        );
    }

    #[test]
    fn test_plain_message_width() {
        assert!(PlainMessageBody::new("hi").with_width(0).is_err());
        assert_eq!(PlainMessageBody::new("hi").with_width(300).unwrap().width(), 300);
    }
}
