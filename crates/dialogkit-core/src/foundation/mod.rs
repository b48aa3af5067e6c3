//! Foundation layer - value types shared by every other layer.
//!
//! - Tagged payload values and their binary codec
//! - Namespaced identifiers
//! - Player identity
//! - Error types

pub mod codec;
pub mod error;
pub mod location;
pub mod player;
pub mod tag;

pub use codec::{MAX_DEPTH, decode_compound, decode_payload, decode_payload_counted, encode_compound};
pub use error::{
    DecodeError, DecodeResult, InterceptError, InterceptResult, ListenerError, ListenerResult,
    LocationError, PipelineError,
};
pub use location::{DEFAULT_NAMESPACE, ResourceLocation};
pub use player::{BoxedPlayer, Player, PlayerId, downcast_player};
pub use tag::{NamedValues, TaggedValue};
