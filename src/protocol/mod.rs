//! Wire-level concerns shared by the client: header formats, diagnostic
//! dumps, and API error decoding.
//!
//! Nothing in this module performs network I/O. Everything operates on
//! [`Request`](crate::Request) / [`Response`](crate::Response) values or raw
//! bytes, so each piece can be exercised without a server.
//!
//! # Module Organization
//!
//! ```text
//! protocol/
//! ├── constants - Media types, header parameters, dump markers
//! ├── headers   - Accept / Authorization / Content-Type helpers
//! ├── dump      - HTTP/1.1 dumps with body tee
//! └── api_error - ApiError and parse_api_error
//! ```

pub mod api_error;
pub mod constants;
pub mod dump;
pub mod headers;

pub use api_error::{
    parse_api_error, status_phrase, translate_error_code, ApiError, ErrorDetail,
};
pub use dump::{drain_body, dump_request, dump_response, write_indented, write_indented_n};
pub use headers::{
    bearer_header_value, canonical_header_name, format_accept_header, is_binary_media_type,
    is_json_media_type, media_type, parse_version_param,
};
