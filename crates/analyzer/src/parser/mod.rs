//! Byte-level SIP parsing: lines, URIs and header values

pub mod headers;
pub mod line;
pub mod uri;
pub mod utils;

pub use headers::{parse_header_line, parse_header_value};
pub use line::{classify_line, find_line, find_logical_line, Line, LineKind};
pub use uri::{parse_name_addr_or_addr_spec, parse_uri};
pub use utils::ParseResult;
