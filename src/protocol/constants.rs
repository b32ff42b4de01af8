//! Protocol constants: media types, header parameters, and dump markers.

/// Media types recognized by the core.
pub mod media_types {
    /// JSON payloads (requests and responses).
    pub const JSON: &str = "application/json";

    /// Opaque binary uploads, as the storage gateway labels them.
    pub const BINARY_OCTET_STREAM: &str = "binary/octet-stream";

    /// Standard opaque binary type.
    pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

    /// Media types whose bodies are never dumped verbatim.
    pub const BINARY: [&str; 2] = [BINARY_OCTET_STREAM, APPLICATION_OCTET_STREAM];
}

/// Media type parameter carrying the API version (`application/json;version=4.0`).
pub const VERSION_PARAM: &str = "version";

/// Authorization scheme for the session token.
pub const BEARER_SCHEME: &str = "Bearer";

/// HTTP version written on dumped request lines.
pub const DUMP_PROTOCOL: &str = "HTTP/1.1";

/// Substitute for bodies that are not dumped verbatim.
pub const BODY_PLACEHOLDER: &str = "[body omitted]";

/// Substitute for sensitive header values in dumps.
pub const REDACTED: &str = "[redacted]";

/// Default indentation of dumped messages in log output.
pub const DUMP_INDENT: usize = 4;
