//! Fixture payloads.
//!
//! Static data substituted for live responses or fed into forms. Files live
//! under one root directory and are addressed by file name.

use crate::network::MockResponse;
use crate::result::{ProbeError, ProbeResult};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory-backed fixture store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    /// Create a store rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a fixture
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Read a fixture as text
    pub fn text(&self, name: &str) -> ProbeResult<String> {
        let path = self.path(name);
        std::fs::read_to_string(&path).map_err(|e| ProbeError::Fixture {
            message: format!("cannot read {}: {e}", path.display()),
        })
    }

    /// Read and deserialize a JSON fixture
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> ProbeResult<T> {
        let text = self.text(name)?;
        serde_json::from_str(&text).map_err(|e| ProbeError::Fixture {
            message: format!("invalid JSON in {}: {e}", self.path(name).display()),
        })
    }

    /// Read a JSON fixture as an untyped value
    pub fn value(&self, name: &str) -> ProbeResult<serde_json::Value> {
        self.json(name)
    }

    /// Stub response serving a JSON fixture
    pub fn json_response(&self, name: &str) -> ProbeResult<MockResponse> {
        MockResponse::json(&self.value(name)?)
    }

    /// Stub response serving an HTML fixture
    pub fn html_response(&self, name: &str) -> ProbeResult<MockResponse> {
        Ok(MockResponse::html(&self.text(name)?))
    }
}
