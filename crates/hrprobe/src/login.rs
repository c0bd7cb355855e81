//! Login flow.
//!
//! ```text
//! Idle ──enter_credentials──► CredentialsEntered ──submit──► Submitted
//!                                                              │
//!                                                   await_response
//!                                                              ▼
//!                                                      ResponseReceived
//! ```
//!
//! The validation request is intercepted when credentials are entered, so
//! the POST issued by `submit` is always observed.

use crate::api;
use crate::context::TestContext;
use crate::driver::{query_first, Driver};
use crate::input::fill_selector;
use crate::locator::Selector;
use crate::network::{Exchange, Intercept};
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::wait::{retry, Exhausted};

/// Alias of the credential validation request
pub const LOGIN_ALIAS: &str = "loginValidationRequest";

/// Login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Demo administrator account
    #[must_use]
    pub fn admin() -> Self {
        Self::new("Admin", "admin123")
    }
}

/// Progress of a [`LoginFlow`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginState {
    /// Nothing done yet
    Idle,
    /// Fields filled, intercept registered
    CredentialsEntered,
    /// Submit clicked
    Submitted,
    /// Validation response observed
    ResponseReceived,
}

impl std::fmt::Display for LoginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CredentialsEntered => "credentials-entered",
            Self::Submitted => "submitted",
            Self::ResponseReceived => "response-received",
        };
        f.write_str(name)
    }
}

/// Login state machine
#[derive(Debug)]
pub struct LoginFlow {
    credentials: Credentials,
    state: LoginState,
}

impl LoginFlow {
    /// Create a flow for `credentials`
    #[must_use]
    pub const fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: LoginState::Idle,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> LoginState {
        self.state
    }

    fn require(&self, expected: LoginState, step: &str) -> ProbeResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProbeError::invalid_state(format!(
                "login step '{step}' requires state {expected}, flow is {}",
                self.state
            )))
        }
    }

    fn advance(&mut self, next: LoginState) {
        tracing::info!(from = %self.state, to = %next, user = %self.credentials.username, "login transition");
        self.state = next;
    }

    /// Register the validation intercept and fill both fields
    pub async fn enter_credentials<D: Driver>(&mut self, ctx: &mut TestContext<D>) -> ProbeResult<()> {
        self.require(LoginState::Idle, "enter credentials")?;
        let _ = ctx
            .intercept(Intercept::post(api::AUTH_VALIDATE).alias(LOGIN_ALIAS))
            .await?;

        let wait = ctx.command_wait();
        let driver = ctx.driver();
        let _ = fill_selector(driver, selectors::USERNAME_INPUT, &self.credentials.username, &wait).await?;
        let _ = fill_selector(driver, selectors::PASSWORD_INPUT, &self.credentials.password, &wait).await?;
        self.advance(LoginState::CredentialsEntered);
        Ok(())
    }

    /// Click the submit button
    pub async fn submit<D: Driver>(&mut self, ctx: &TestContext<D>) -> ProbeResult<()> {
        self.require(LoginState::CredentialsEntered, "submit")?;
        let driver = ctx.driver();
        let selector = Selector::css(selectors::SUBMIT_BUTTON);
        let button = retry(&ctx.command_wait(), "login submit button", Exhausted::LastError, || {
            query_first(driver, &selector, None)
        })
        .await?;
        driver.click(&button).await?;
        self.advance(LoginState::Submitted);
        Ok(())
    }

    /// Wait for the intercepted validation exchange
    pub async fn await_response<D: Driver>(&mut self, ctx: &mut TestContext<D>) -> ProbeResult<Exchange> {
        self.require(LoginState::Submitted, "await response")?;
        let exchange = ctx.wait(LOGIN_ALIAS).await?;
        self.advance(LoginState::ResponseReceived);
        Ok(exchange)
    }
}

/// Log in from the login page and return the validation exchange
#[tracing::instrument(skip(ctx), fields(case = %ctx.name()))]
pub async fn login<D: Driver>(ctx: &mut TestContext<D>, credentials: &Credentials) -> ProbeResult<Exchange> {
    let mut flow = LoginFlow::new(credentials.clone());
    flow.enter_credentials(ctx).await?;
    flow.submit(ctx).await?;
    flow.await_response(ctx).await
}
