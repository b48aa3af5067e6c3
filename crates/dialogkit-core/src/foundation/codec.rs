//! Binary codec for click payloads.
//!
//! Payloads use the network flavour of the tagged binary format: big-endian,
//! with a nameless root. The root is a single type byte (`10` for a compound)
//! followed directly by the compound body. Each compound entry is
//! `type:u8, name:u16-prefixed string, payload` and the body ends with a `0`
//! type byte. Strings are Java's modified UTF-8: NUL is `C0 80` and characters
//! outside the BMP are written as surrogate pairs.
//!
//! Two decoders are offered:
//!
//! - [`decode_payload`] never fails. Absent, empty or non-compound input gives
//!   an empty set, and a bad field is logged and dropped together with the
//!   unread remainder of the payload.
//! - [`decode_compound`] is strict and reports the first error.
//!
//! # Example
//!
//! ```rust,ignore
//! use dialogkit_core::{NamedValues, decode_payload, encode_compound};
//!
//! let bytes = encode_compound(&NamedValues::new().with("amount", 5i32));
//! let values = decode_payload(Some(&bytes));
//! assert_eq!(values.get("amount").and_then(|v| v.as_i32()), Some(5));
//! ```

use tracing::{trace, warn};

use crate::foundation::error::{DecodeError, DecodeResult};
use crate::foundation::tag::{NamedValues, TaggedValue, type_id};

/// Maximum nesting depth accepted by the decoder.
pub const MAX_DEPTH: usize = 512;

// =============================================================================
// Reader
// =============================================================================

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, context: &'static str) -> DecodeResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(DecodeError::Truncated { context })?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self, context: &'static str) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, context)?);
        Ok(out)
    }

    fn u8(&mut self, context: &'static str) -> DecodeResult<u8> {
        Ok(self.array::<1>(context)?[0])
    }

    fn i8(&mut self) -> DecodeResult<i8> {
        Ok(i8::from_be_bytes(self.array("byte")?))
    }

    fn i16(&mut self) -> DecodeResult<i16> {
        Ok(i16::from_be_bytes(self.array("short")?))
    }

    fn i32(&mut self, context: &'static str) -> DecodeResult<i32> {
        Ok(i32::from_be_bytes(self.array(context)?))
    }

    fn i64(&mut self) -> DecodeResult<i64> {
        Ok(i64::from_be_bytes(self.array("long")?))
    }

    fn f32(&mut self) -> DecodeResult<f32> {
        Ok(f32::from_be_bytes(self.array("float")?))
    }

    fn f64(&mut self) -> DecodeResult<f64> {
        Ok(f64::from_be_bytes(self.array("double")?))
    }

    fn string(&mut self, context: &'static str) -> DecodeResult<String> {
        let len = u16::from_be_bytes(self.array(context)?) as usize;
        let bytes = self.take(len, context)?;
        cesu8::from_java_cesu8(bytes)
            .map(|s| s.into_owned())
            .map_err(|_| DecodeError::InvalidString)
    }

    fn length(&mut self, context: &'static str) -> DecodeResult<usize> {
        let length = self.i32(context)?;
        usize::try_from(length).map_err(|_| DecodeError::NegativeLength { length, context })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

// =============================================================================
// Decoding
// =============================================================================

fn check_depth(depth: usize) -> DecodeResult<()> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::TooDeep { max: MAX_DEPTH });
    }
    Ok(())
}

/// Guards against length prefixes that cannot possibly fit in the input.
fn bounded(reader: &Reader<'_>, len: usize, elem_size: usize, context: &'static str) -> DecodeResult<()> {
    match len.checked_mul(elem_size) {
        Some(total) if total <= reader.remaining() => Ok(()),
        _ => Err(DecodeError::Truncated { context }),
    }
}

fn read_value(reader: &mut Reader<'_>, tag: u8, depth: usize) -> DecodeResult<TaggedValue> {
    check_depth(depth)?;
    let value = match tag {
        type_id::BYTE => TaggedValue::Byte(reader.i8()?),
        type_id::SHORT => TaggedValue::Short(reader.i16()?),
        type_id::INT => TaggedValue::Int(reader.i32("int")?),
        type_id::LONG => TaggedValue::Long(reader.i64()?),
        type_id::FLOAT => TaggedValue::Float(reader.f32()?),
        type_id::DOUBLE => TaggedValue::Double(reader.f64()?),
        type_id::BYTE_ARRAY => {
            let len = reader.length("byte array length")?;
            let bytes = reader.take(len, "byte array")?;
            TaggedValue::ByteArray(bytes.iter().map(|b| *b as i8).collect())
        }
        type_id::STRING => TaggedValue::String(reader.string("string")?),
        type_id::LIST => {
            let elem = reader.u8("list element type")?;
            let len = reader.length("list length")?;
            if elem == type_id::END {
                // Empty lists are written with an END element type.
                TaggedValue::List(Vec::new())
            } else {
                bounded(reader, len, 1, "list")?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(read_value(reader, elem, depth + 1)?);
                }
                TaggedValue::List(items)
            }
        }
        type_id::COMPOUND => TaggedValue::Compound(read_compound_body(reader, depth + 1)?),
        type_id::INT_ARRAY => {
            let len = reader.length("int array length")?;
            bounded(reader, len, 4, "int array")?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(reader.i32("int array")?);
            }
            TaggedValue::IntArray(items)
        }
        type_id::LONG_ARRAY => {
            let len = reader.length("long array length")?;
            bounded(reader, len, 8, "long array")?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(reader.i64()?);
            }
            TaggedValue::LongArray(items)
        }
        other => return Err(DecodeError::UnknownTag { type_id: other }),
    };
    Ok(value)
}

fn read_compound_body(reader: &mut Reader<'_>, depth: usize) -> DecodeResult<NamedValues> {
    check_depth(depth)?;
    let mut values = NamedValues::new();
    loop {
        let tag = reader.u8("entry type")?;
        if tag == type_id::END {
            return Ok(values);
        }
        let name = reader.string("entry name")?;
        let value = read_value(reader, tag, depth)?;
        values.insert(name, value);
    }
}

/// Strictly decodes a nameless-root compound.
///
/// Fails on the first malformed byte. An `END` root is treated as an empty
/// compound.
pub fn decode_compound(bytes: &[u8]) -> DecodeResult<NamedValues> {
    let mut reader = Reader::new(bytes);
    match reader.u8("root type")? {
        type_id::COMPOUND => read_compound_body(&mut reader, 1),
        type_id::END => Ok(NamedValues::new()),
        other => Err(DecodeError::NotACompound { type_id: other }),
    }
}

/// Leniently decodes a click payload, also returning how many fields were
/// dropped with a warning.
pub fn decode_payload_counted(payload: Option<&[u8]>) -> (NamedValues, u32) {
    let mut values = NamedValues::new();
    let Some(bytes) = payload.filter(|b| !b.is_empty()) else {
        return (values, 0);
    };

    let mut reader = Reader::new(bytes);
    match reader.u8("root type") {
        Ok(type_id::COMPOUND) => {}
        Ok(other) => {
            trace!(type_id = other, "Payload root is not a compound");
            return (values, 0);
        }
        Err(_) => return (values, 0),
    }

    let mut warnings = 0;
    loop {
        let tag = match reader.u8("entry type") {
            Ok(type_id::END) => break,
            Ok(tag) => tag,
            Err(e) => {
                warn!(error = %e, decoded = values.len(), "Payload ended before compound terminator");
                warnings += 1;
                break;
            }
        };
        let name = match reader.string("entry name") {
            Ok(name) => name,
            Err(e) => {
                warn!(error = %e, decoded = values.len(), "Unreadable field name in payload");
                warnings += 1;
                break;
            }
        };
        match read_value(&mut reader, tag, 1) {
            Ok(value) => {
                values.insert(name, value);
            }
            Err(DecodeError::UnknownTag { type_id }) => {
                warn!(field = %name, type_id, "Skipping field with unknown tag type");
                warnings += 1;
                break;
            }
            Err(e) => {
                warn!(field = %name, error = %e, "Skipping malformed field");
                warnings += 1;
                break;
            }
        }
    }
    (values, warnings)
}

/// Leniently decodes a click payload. Never fails.
pub fn decode_payload(payload: Option<&[u8]>) -> NamedValues {
    decode_payload_counted(payload).0
}

// =============================================================================
// Encoding
// =============================================================================

/// Encoded width of `c` in Java's modified UTF-8.
fn java_width(c: char) -> usize {
    match c as u32 {
        0x01..=0x7F => 1,
        0x00 | 0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 6,
    }
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    // Cut at the last whole character that fits the u16 length prefix.
    let mut width = 0;
    let mut end = s.len();
    for (idx, c) in s.char_indices() {
        if width + java_width(c) > u16::MAX as usize {
            end = idx;
            break;
        }
        width += java_width(c);
    }
    let bytes = cesu8::to_java_cesu8(&s[..end]);
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(&bytes);
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    let len = i32::try_from(len).unwrap_or(i32::MAX);
    out.extend_from_slice(&len.to_be_bytes());
}

fn write_value(out: &mut Vec<u8>, value: &TaggedValue) {
    match value {
        TaggedValue::Byte(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        TaggedValue::ByteArray(items) => {
            write_len(out, items.len());
            out.extend(items.iter().map(|b| *b as u8));
        }
        TaggedValue::String(s) => write_string(out, s),
        TaggedValue::List(items) => {
            let elem = items.first().map_or(type_id::END, TaggedValue::type_id);
            let same: Vec<&TaggedValue> = items.iter().filter(|v| v.type_id() == elem).collect();
            if same.len() != items.len() {
                warn!(
                    dropped = items.len() - same.len(),
                    "List elements must share one tag type, dropping mismatched"
                );
            }
            out.push(elem);
            write_len(out, same.len());
            for item in same {
                write_value(out, item);
            }
        }
        TaggedValue::Compound(values) => write_compound_body(out, values),
        TaggedValue::IntArray(items) => {
            write_len(out, items.len());
            for v in items {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        TaggedValue::LongArray(items) => {
            write_len(out, items.len());
            for v in items {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
}

fn write_compound_body(out: &mut Vec<u8>, values: &NamedValues) {
    for (name, value) in values.iter() {
        out.push(value.type_id());
        write_string(out, name);
        write_value(out, value);
    }
    out.push(type_id::END);
}

/// Encodes a compound in the nameless-root network format.
pub fn encode_compound(values: &NamedValues) -> Vec<u8> {
    let mut out = vec![type_id::COMPOUND];
    write_compound_body(&mut out, values);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(tag: u8, name: &str, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn compound(fields: &[Vec<u8>]) -> Vec<u8> {
        let mut out = vec![type_id::COMPOUND];
        for f in fields {
            out.extend_from_slice(f);
        }
        out.push(type_id::END);
        out
    }

    #[test]
    fn test_every_type_code_decodes() {
        let samples = vec![
            TaggedValue::Byte(-3),
            TaggedValue::Short(1234),
            TaggedValue::Int(5),
            TaggedValue::Long(-9_000_000_000),
            TaggedValue::Float(2.5),
            TaggedValue::Double(-0.125),
            TaggedValue::ByteArray(vec![1, -1, 0]),
            TaggedValue::String("héllo".to_string()),
            TaggedValue::List(vec![TaggedValue::Int(1), TaggedValue::Int(2)]),
            TaggedValue::Compound(NamedValues::new().with("inner", "x")),
            TaggedValue::IntArray(vec![7, -7]),
            TaggedValue::LongArray(vec![i64::MAX, i64::MIN]),
        ];

        for (code, sample) in (1u8..=12).zip(samples) {
            assert_eq!(sample.type_id(), code);
            let bytes = encode_compound(&NamedValues::new().with("v", sample.clone()));
            let (values, warnings) = decode_payload_counted(Some(&bytes));
            assert_eq!(warnings, 0, "type {code}");
            assert_eq!(values.len(), 1, "type {code}");
            assert_eq!(values.get("v"), Some(&sample), "type {code}");
        }
    }

    #[test]
    fn test_hand_written_int_field() {
        let bytes = compound(&[field(type_id::INT, "amount", &5i32.to_be_bytes())]);
        let values = decode_payload(Some(&bytes));
        assert_eq!(values.get("amount"), Some(&TaggedValue::Int(5)));
    }

    #[test]
    fn test_absent_and_empty_payload() {
        assert!(decode_payload(None).is_empty());
        assert!(decode_payload(Some(&[])).is_empty());
        assert_eq!(decode_payload_counted(Some(&[])).1, 0);
    }

    #[test]
    fn test_non_compound_root_is_empty() {
        let bytes = [type_id::STRING, 0, 1, b'a'];
        assert!(decode_payload(Some(&bytes)).is_empty());
        assert_eq!(
            decode_compound(&bytes),
            Err(DecodeError::NotACompound {
                type_id: type_id::STRING
            })
        );
    }

    #[test]
    fn test_unknown_type_is_skipped() {
        let bytes = compound(&[
            field(type_id::INT, "known", &1i32.to_be_bytes()),
            field(42, "mystery", &[0xde, 0xad]),
        ]);
        let (values, warnings) = decode_payload_counted(Some(&bytes));
        assert_eq!(values.len(), 1);
        assert!(values.contains_key("known"));
        assert!(!values.contains_key("mystery"));
        assert_eq!(warnings, 1);

        assert_eq!(
            decode_compound(&bytes),
            Err(DecodeError::UnknownTag { type_id: 42 })
        );
    }

    #[test]
    fn test_unknown_type_drops_later_fields() {
        let bytes = compound(&[
            field(42, "mystery", &[0xde, 0xad]),
            field(type_id::INT, "known", &1i32.to_be_bytes()),
        ]);
        let (values, warnings) = decode_payload_counted(Some(&bytes));
        assert!(values.is_empty());
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_supplementary_char_uses_surrogate_pairs() {
        // "hi😀" as Java writes it: U+1F600 becomes two 3-byte surrogates.
        let java = [b'h', b'i', 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80];
        let mut payload = (java.len() as u16).to_be_bytes().to_vec();
        payload.extend_from_slice(&java);
        let bytes = compound(&[
            field(type_id::STRING, "name", &payload),
            field(type_id::INT, "amount", &5i32.to_be_bytes()),
        ]);

        let (values, warnings) = decode_payload_counted(Some(&bytes));
        assert_eq!(warnings, 0);
        assert_eq!(values.get("name").and_then(TaggedValue::as_str), Some("hi😀"));
        assert_eq!(values.get("amount"), Some(&TaggedValue::Int(5)));

        let encoded = encode_compound(&NamedValues::new().with("name", "hi😀"));
        assert_eq!(encoded, compound(&[field(type_id::STRING, "name", &payload)]));
    }

    #[test]
    fn test_embedded_nul_is_two_bytes() {
        let payload = [0, 3, b'a', 0xC0, 0x80];
        let bytes = compound(&[field(type_id::STRING, "text", &payload)]);
        let values = decode_compound(&bytes).unwrap();
        assert_eq!(values.get("text").and_then(TaggedValue::as_str), Some("a\0"));

        let encoded = encode_compound(&NamedValues::new().with("text", "a\0"));
        assert_eq!(encoded, bytes);
    }

    #[test]
    fn test_truncated_field_keeps_earlier_fields() {
        let mut bytes = compound(&[
            field(type_id::STRING, "name", &[0, 2, b'o', b'k']),
            field(type_id::LONG, "big", &[0, 0, 0, 1]),
        ]);
        bytes.pop();
        let (values, warnings) = decode_payload_counted(Some(&bytes));
        assert_eq!(values.get("name").and_then(TaggedValue::as_str), Some("ok"));
        assert!(!values.contains_key("big"));
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let bytes = compound(&[
            field(type_id::INT, "k", &1i32.to_be_bytes()),
            field(type_id::INT, "k", &2i32.to_be_bytes()),
        ]);
        let values = decode_payload(Some(&bytes));
        assert_eq!(values.len(), 1);
        assert_eq!(values.get("k"), Some(&TaggedValue::Int(2)));
    }

    #[test]
    fn test_negative_array_length() {
        let bytes = compound(&[field(type_id::INT_ARRAY, "a", &(-1i32).to_be_bytes())]);
        assert!(matches!(
            decode_compound(&bytes),
            Err(DecodeError::NegativeLength { length: -1, .. })
        ));
        assert!(decode_payload(Some(&bytes)).is_empty());
    }

    #[test]
    fn test_huge_length_prefix_does_not_allocate() {
        let bytes = compound(&[field(type_id::LONG_ARRAY, "a", &i32::MAX.to_be_bytes())]);
        assert!(matches!(
            decode_compound(&bytes),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut nested = TaggedValue::Int(0);
        for _ in 0..(MAX_DEPTH + 4) {
            nested = TaggedValue::List(vec![nested]);
        }
        let bytes = encode_compound(&NamedValues::new().with("deep", nested));
        assert_eq!(
            decode_compound(&bytes),
            Err(DecodeError::TooDeep { max: MAX_DEPTH })
        );
        let (values, warnings) = decode_payload_counted(Some(&bytes));
        assert!(values.is_empty());
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_mixed_list_drops_mismatched_elements() {
        let list = TaggedValue::List(vec![TaggedValue::Int(1), TaggedValue::from("no")]);
        let bytes = encode_compound(&NamedValues::new().with("l", list));
        let values = decode_compound(&bytes).unwrap();
        assert_eq!(
            values.get("l"),
            Some(&TaggedValue::List(vec![TaggedValue::Int(1)]))
        );
    }
}
