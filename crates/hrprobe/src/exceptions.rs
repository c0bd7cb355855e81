//! Uncaught page error classification.
//!
//! Page errors are matched against an explicit allow-list of message
//! signatures. Anything not listed fails the test case.

use crate::result::{ProbeError, ProbeResult};

/// Classification of one page error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageErrorClass {
    /// Matches an allow-listed signature
    Expected(String),
    /// Not covered by the allow-list
    Unexpected(String),
}

/// Allow-list of expected page error signatures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedErrors {
    signatures: Vec<String>,
}

impl ExpectedErrors {
    /// Create an empty allow-list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow errors whose message contains `signature`
    pub fn allow(&mut self, signature: impl Into<String>) {
        let signature = signature.into();
        if !self.signatures.contains(&signature) {
            self.signatures.push(signature);
        }
    }

    /// Builder form of [`allow`](Self::allow)
    #[must_use]
    pub fn allowing(mut self, signature: impl Into<String>) -> Self {
        self.allow(signature);
        self
    }

    /// Allowed signatures
    #[must_use]
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    /// Forget every signature
    pub fn clear(&mut self) {
        self.signatures.clear();
    }

    /// Classify a single page error message
    #[must_use]
    pub fn classify(&self, message: &str) -> PageErrorClass {
        if self.signatures.iter().any(|s| message.contains(s.as_str())) {
            PageErrorClass::Expected(message.to_string())
        } else {
            PageErrorClass::Unexpected(message.to_string())
        }
    }

    /// Check a batch of page errors.
    ///
    /// Returns the number of ignored errors, or the first unexpected one.
    pub fn check(&self, errors: &[String]) -> ProbeResult<usize> {
        let mut ignored = 0;
        for message in errors {
            match self.classify(message) {
                PageErrorClass::Expected(m) => {
                    tracing::warn!(message = %m, "ignoring expected page error");
                    ignored += 1;
                }
                PageErrorClass::Unexpected(m) => {
                    return Err(ProbeError::UncaughtPageError { message: m });
                }
            }
        }
        Ok(ignored)
    }
}
