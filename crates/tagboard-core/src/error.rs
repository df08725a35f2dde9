use std::fmt;

/// Machine-readable error codes surfaced to the CLI and the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    TitleTooShort,
    SubmissionInFlight,
    NetworkUnreachable,
    HttpStatus,
    ResponseDecodeFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::TitleTooShort => "E2001",
            Self::SubmissionInFlight => "E2002",
            Self::NetworkUnreachable => "E3001",
            Self::HttpStatus => "E3002",
            Self::ResponseDecodeFailed => "E3003",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::TitleTooShort => "Title is too short",
            Self::SubmissionInFlight => "A submission is already in progress",
            Self::NetworkUnreachable => "Tag service unreachable",
            Self::HttpStatus => "Tag service returned an error status",
            Self::ResponseDecodeFailed => "Tag service response could not be decoded",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to the user.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .tagboard/config.toml and retry."),
            Self::TitleTooShort => Some("Use a longer tag name."),
            Self::SubmissionInFlight => Some("Wait for the current save to finish."),
            Self::NetworkUnreachable => {
                Some("Check that the tag service is running, or set TAGBOARD_URL.")
            }
            Self::HttpStatus => Some("Retry once. If persistent, check the service logs."),
            Self::ResponseDecodeFailed => {
                Some("Verify that --url points at a tag collection endpoint.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure talking to the remote tag collection.
///
/// `Clone` so a failed fetch can be stored against its query key and shown to
/// every observer of that key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ApiError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Transport { .. } => ErrorCode::NetworkUnreachable,
            Self::Status { .. } => ErrorCode::HttpStatus,
            Self::Decode { .. } => ErrorCode::ResponseDecodeFailed,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

/// Local input constraint violated before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Minimum {min} characters")]
    TitleTooShort { min: usize },
}

impl ValidationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TitleTooShort { .. } => ErrorCode::TitleTooShort,
        }
    }

    /// Name of the form field the message belongs to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::TitleTooShort { .. } => "title",
        }
    }
}

/// Everything that can stop a tag from being created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Network(#[from] ApiError),

    #[error("a submission is already in progress")]
    Busy,
}

impl CreateError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(err) => err.code(),
            Self::Network(err) => err.code(),
            Self::Busy => ErrorCode::SubmissionInFlight,
        }
    }
}
