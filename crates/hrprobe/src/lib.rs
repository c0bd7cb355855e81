//! hrprobe: end-to-end interaction helpers for the OrangeHRM web application
//!
//! Helpers locate form controls by label, pick custom dropdown options,
//! type into fields, find Buzz posts by their rendered timestamp, run the
//! login flow and assert toast notifications. Scenario suites built on them
//! cover login, the Buzz feed and the My Info form.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    HRPROBE Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenarios  │    │ Helpers    │    │ Driver     │            │
//! │   │ (suites)   │───►│ label/...  │───►│ mock or    │            │
//! │   │            │    │ login/toast│    │ chromium   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │          │                 │                 ▲                  │
//! │          ▼                 ▼                 │                  │
//! │   ┌────────────────────────────┐    ┌────────────────┐          │
//! │   │ TestContext                │───►│ Intercepts and │          │
//! │   │ alias cursors, allow-list  │    │ exchanges      │          │
//! │   └────────────────────────────┘    └────────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every locate, wait and assertion is a bounded poll (see [`wait`]); a
//! failure aborts the calling scenario through [`ProbeResult`].

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

pub mod api;
pub mod assertion;
pub mod config;
pub mod context;
pub mod driver;
pub mod dropdown;
pub mod exceptions;
pub mod fixture;
pub mod input;
pub mod label;
pub mod locator;
pub mod login;
pub mod mock;
pub mod network;
pub mod post_time;
mod result;
pub mod scenarios;
pub mod selectors;
pub mod toast;
pub mod wait;

/// Chromium driver over the DevTools protocol
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod chromium;

pub use assertion::{Assertion, AssertionResult};
pub use config::{SuiteConfig, Viewport};
pub use context::TestContext;
pub use driver::{Driver, DriverConfig, ElementHandle, Key};
pub use exceptions::{ExpectedErrors, PageErrorClass};
pub use fixture::FixtureStore;
pub use label::{ControlRole, FieldGroupResolver, LabelResolver};
pub use locator::Selector;
pub use login::{Credentials, LoginFlow, LoginState};
pub use network::{Exchange, HttpMethod, Intercept, MockResponse, RouteAction, UrlPattern};
pub use post_time::PostTimestamp;
pub use result::{FailureKind, ProbeError, ProbeResult};
pub use scenarios::{catalogue, ScenarioId, ScenarioOutcome, Suite};
pub use toast::ToastKind;
pub use wait::WaitOptions;

#[cfg(feature = "browser")]
pub use chromium::ChromiumDriver;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    pub use super::context::*;
    pub use super::driver::*;
    pub use super::dropdown::*;
    pub use super::input::*;
    pub use super::label::*;
    pub use super::locator::*;
    pub use super::login::*;
    pub use super::network::*;
    pub use super::post_time::*;
    pub use super::result::*;
    pub use super::toast::*;
    pub use super::wait::*;
    pub use super::SuiteConfig;
}

#[cfg(test)]
mod tests {
    mod prelude_tests {
        use crate::mock::MockDriver;
        use crate::prelude::*;

        #[test]
        fn test_prelude_names_context_and_config() {
            let ctx: TestContext<MockDriver> =
                TestContext::new("prelude", MockDriver::new(), SuiteConfig::default());
            assert_eq!(ctx.config().base_url, SuiteConfig::default().base_url);
        }
    }
}
