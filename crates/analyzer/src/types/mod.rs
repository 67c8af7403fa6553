//! Data model shared by the parser, the assembler and the correlator

pub mod frame;
pub mod header;
pub mod header_kind;
pub mod header_value;
pub mod method;
pub mod uri;

pub use frame::{FrameId, FrameInfo, MessageRef, Transport};
pub use header::{HeaderField, HeaderName, HeaderValue};
pub use header_kind::HeaderKind;
pub use header_value::*;
pub use method::Method;
pub use uri::UriOffsets;
