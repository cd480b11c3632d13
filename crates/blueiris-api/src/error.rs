use thiserror::Error;

/// Top-level error type for the `blueiris-api` crate.
///
/// Covers every failure mode across the command protocol and the
/// byte-oriented endpoints: authentication, transport, envelope decoding,
/// and multipart stream framing. Nothing is retried or downgraded
/// internally -- retry policy belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The login handshake did not follow the expected challenge
    /// sequence, or the final login was rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-success HTTP status from the command endpoint, with the raw
    /// response body for diagnostics.
    #[error("Command endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    // ── Command protocol ────────────────────────────────────────────
    /// The server answered a command envelope with `result: "fail"`.
    #[error("Command rejected by server: {message}")]
    Command { message: String },

    /// A still-image or stream request for a camera was refused.
    #[error("Media request for camera '{camera}' failed with HTTP {status}")]
    Media { camera: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Streaming ───────────────────────────────────────────────────
    /// The multipart stream was malformed: missing or invalid
    /// `multipart/x-mixed-replace` content type, or unreadable section
    /// headers.
    #[error("Multipart framing error: {message}")]
    Framing { message: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is no longer
    /// accepted and re-authenticating might resolve it.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::Status { status: 401, .. }
        )
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` for multipart framing failures.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Framing { .. })
    }
}
