//! Per-test-case scope.
//!
//! A [`TestContext`] owns the driver for one test case together with the
//! state that must not leak into the next one: alias cursors and the
//! expected-error allow-list. Create one per case, call
//! [`begin`](TestContext::begin) first and [`finish`](TestContext::finish)
//! last.

use crate::config::SuiteConfig;
use crate::driver::Driver;
use crate::exceptions::ExpectedErrors;
use crate::fixture::FixtureStore;
use crate::network::{Exchange, Intercept};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{retry, Exhausted, WaitOptions};
use std::collections::HashMap;
use uuid::Uuid;

/// Explicit session state for one test case
#[derive(Debug)]
pub struct TestContext<D: Driver> {
    id: Uuid,
    name: String,
    driver: D,
    config: SuiteConfig,
    fixtures: FixtureStore,
    expected_errors: ExpectedErrors,
    cursors: HashMap<String, usize>,
}

impl<D: Driver> TestContext<D> {
    /// Create a context for the named test case
    pub fn new(name: impl Into<String>, driver: D, config: SuiteConfig) -> Self {
        let fixtures = FixtureStore::new(config.fixtures_dir.clone());
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            driver,
            config,
            fixtures,
            expected_errors: ExpectedErrors::new(),
            cursors: HashMap::new(),
        }
    }

    /// Unique run id of this case
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Test case name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Suite configuration
    pub const fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Fixture store rooted at the configured directory
    pub const fn fixtures(&self) -> &FixtureStore {
        &self.fixtures
    }

    /// Wait options for element lookups and assertions
    pub const fn command_wait(&self) -> WaitOptions {
        self.config.command_wait()
    }

    /// Consume the context, returning the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Start the case on a fresh page at the base URL
    #[tracing::instrument(skip(self), fields(case = %self.name, id = %self.id))]
    pub async fn begin(&mut self) -> ProbeResult<()> {
        self.cursors.clear();
        self.expected_errors.clear();
        self.driver.navigate(&self.config.base_url).await
    }

    /// Navigate to a path below the base URL
    pub async fn visit(&self, path: &str) -> ProbeResult<()> {
        let url = self.config.url(path);
        tracing::debug!(%url, "visit");
        self.driver.navigate(&url).await
    }

    /// Register an intercept; returns its alias
    pub async fn intercept(&mut self, intercept: Intercept) -> ProbeResult<String> {
        let alias = intercept.alias.clone();
        self.driver.intercept(intercept).await?;
        let _ = self.cursors.entry(alias.clone()).or_insert(0);
        Ok(alias)
    }

    /// Wait for the next exchange on `alias` using the configured timeouts.
    ///
    /// The n-th call for an alias yields the n-th exchange recorded for it.
    pub async fn wait(&mut self, alias: &str) -> ProbeResult<Exchange> {
        let request = self.config.request_wait();
        let response = self.config.response_wait();
        self.wait_for_exchange(alias, request, response).await
    }

    /// Wait for the next exchange on `alias` with a single timeout for both phases
    pub async fn wait_with_timeout(&mut self, alias: &str, timeout_ms: u64) -> ProbeResult<Exchange> {
        let options = self.config.command_wait().with_timeout(timeout_ms);
        self.wait_for_exchange(alias, options, options).await
    }

    async fn wait_for_exchange(
        &mut self,
        alias: &str,
        request: WaitOptions,
        response: WaitOptions,
    ) -> ProbeResult<Exchange> {
        let index = self.cursors.get(alias).copied().unwrap_or(0);
        let driver = &self.driver;

        let sent = format!("request @{alias}");
        let _ = retry(&request, &sent, Exhausted::Timeout, || async move {
            let exchanges = driver.exchanges(alias).await?;
            exchanges
                .get(index)
                .cloned()
                .ok_or_else(|| ProbeError::not_found(format!("exchange #{index} on @{alias}")))
        })
        .await?;

        let settled = format!("response @{alias}");
        let exchange = retry(&response, &settled, Exhausted::Timeout, || async move {
            driver
                .exchanges(alias)
                .await?
                .get(index)
                .filter(|e| e.is_settled())
                .cloned()
                .ok_or_else(|| ProbeError::not_found(format!("response #{index} on @{alias}")))
        })
        .await?;

        let _ = self.cursors.insert(alias.to_string(), index + 1);
        tracing::debug!(
            alias,
            index,
            status = exchange.response.as_ref().map(|r| r.status),
            network_error = exchange.network_error,
            "alias resolved"
        );
        Ok(exchange)
    }

    /// Add a signature to the expected page error allow-list
    pub fn allow_page_error(&mut self, signature: impl Into<String>) {
        self.expected_errors.allow(signature);
    }

    /// Expected page error allow-list
    pub const fn expected_errors(&self) -> &ExpectedErrors {
        &self.expected_errors
    }

    /// Drain page errors and fail on any outside the allow-list
    pub async fn check_page_errors(&self) -> ProbeResult<usize> {
        let errors = self.driver.take_page_errors().await?;
        self.expected_errors.check(&errors)
    }

    /// End the case: drop intercepts and alias state, then check page errors
    #[tracing::instrument(skip(self), fields(case = %self.name, id = %self.id))]
    pub async fn finish(&mut self) -> ProbeResult<()> {
        self.driver.clear_intercepts().await?;
        self.cursors.clear();
        let outcome = self.check_page_errors().await;
        self.expected_errors.clear();
        outcome.map(|_| ())
    }
}
