//! Conversion of model records into [`native`](crate::native) records.

use crate::text::TextTranslator;

/// Converts a model record into its host representation.
///
/// Conversion cannot fail: every record was validated when it was built.
/// Text is translated through the given translator.
pub trait ToNative {
    type Native;

    fn to_native(&self, translator: &dyn TextTranslator) -> Self::Native;
}

impl<T: ToNative> ToNative for Vec<T> {
    type Native = Vec<T::Native>;

    fn to_native(&self, translator: &dyn TextTranslator) -> Self::Native {
        self.iter().map(|item| item.to_native(translator)).collect()
    }
}

impl<T: ToNative> ToNative for Option<T> {
    type Native = Option<T::Native>;

    fn to_native(&self, translator: &dyn TextTranslator) -> Self::Native {
        self.as_ref().map(|item| item.to_native(translator))
    }
}
