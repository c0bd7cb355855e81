//! Result and error types for hrprobe.

use thiserror::Error;

/// Result type for hrprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Coarse classification of a failure.
///
/// Every [`ProbeError`] maps onto exactly one kind so that callers (and the
/// CLI report) can group failures without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Locate or assertion target absent
    NotFound,
    /// Locate found more than one candidate
    Ambiguous,
    /// A bounded wait elapsed
    Timeout,
    /// An assertion comparison failed
    Mismatch,
    /// A transport failure (forced or real)
    NetworkError,
    /// An uncaught in-page error that was not allow-listed
    PageError,
    /// Operation called in the wrong state
    InvalidState,
    /// Configuration, fixture or input data problem
    Setup,
    /// The underlying automation driver failed
    Driver,
}

impl FailureKind {
    /// Short lowercase label used in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Ambiguous => "ambiguous",
            Self::Timeout => "timeout",
            Self::Mismatch => "mismatch",
            Self::NetworkError => "network-error",
            Self::PageError => "page-error",
            Self::InvalidState => "invalid-state",
            Self::Setup => "setup",
            Self::Driver => "driver",
        }
    }

    /// Whether the condition can still change while the page keeps rendering
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound | Self::Ambiguous | Self::Mismatch)
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in hrprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No element matched
    #[error("Element not found: {what}")]
    NotFound {
        /// Description of what was looked up
        what: String,
    },

    /// More than one element matched where exactly one was required
    #[error("Ambiguous match for {what}: {count} candidates")]
    Ambiguous {
        /// Description of what was looked up
        what: String,
        /// Number of candidates found
        count: usize,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Expected and actual values differ
    #[error("Mismatch in {what}: expected {expected:?}, got {actual:?}")]
    Mismatch {
        /// Description of the compared value
        what: String,
        /// Expected value
        expected: String,
        /// Actual value
        actual: String,
    },

    /// Transport failure observed on an exchange
    #[error("Network error on {url}: {message}")]
    NetworkError {
        /// Request URL
        url: String,
        /// Error message
        message: String,
    },

    /// Uncaught in-page error outside the allow-list
    #[error("Uncaught page error: {message}")]
    UncaughtPageError {
        /// Error message reported by the page
        message: String,
    },

    /// Invalid state error (operation called in wrong state)
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Timestamp could not be parsed
    #[error("Invalid timestamp {input:?}: {message}")]
    InvalidTimestamp {
        /// Raw input
        input: String,
        /// Parser message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Fixture error (missing or unparseable)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProbeError {
    /// Create a not-found error
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a mismatch error
    #[must_use]
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::Ambiguous { .. } => FailureKind::Ambiguous,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Mismatch { .. } => FailureKind::Mismatch,
            Self::NetworkError { .. } => FailureKind::NetworkError,
            Self::UncaughtPageError { .. } => FailureKind::PageError,
            Self::InvalidState { .. } => FailureKind::InvalidState,
            Self::InvalidTimestamp { .. }
            | Self::Config { .. }
            | Self::Fixture { .. }
            | Self::Io(_)
            | Self::Json(_) => FailureKind::Setup,
            Self::Driver { .. } => FailureKind::Driver,
        }
    }
}
