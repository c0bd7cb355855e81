//! Scenario suites
//!
//! Each scenario drives one end-to-end case against a fresh
//! [`TestContext`]. [`ScenarioId::run`] wraps a scenario in
//! [`TestContext::begin`] and [`TestContext::finish`]; the scenario functions
//! themselves assume a freshly begun context.
//!
//! ```text
//! Suite::Login  ─┬─ valid_login_reaches_dashboard
//!                ├─ invalid_login_shows_error
//!                └─ mocked_login_page_shows_custom_error
//! Suite::Buzz   ─┬─ counts_match_feed, like_toggles_count, ...
//! Suite::MyInfo ─┬─ update_persists, missing_required_fields, ...
//! ```

pub mod buzz;
pub mod login;
pub mod my_info;

use crate::context::TestContext;
use crate::driver::Driver;
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{retry, Exhausted, WaitOptions};
use serde::{Deserialize, Serialize};

/// Fixture served in place of the login page
pub const LOGIN_ERROR_FIXTURE: &str = "login-error.html";

/// Fixture with a single feed item
pub const MOCKED_POST_FIXTURE: &str = "mocked_first_post.json";

/// Fixture with a personal details record
pub const USER_DETAILS_FIXTURE: &str = "user_details.json";

/// Checks a scenario verified, in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Descriptions of the passed checks
    pub checks: Vec<String>,
}

impl ScenarioOutcome {
    /// Empty outcome
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passed check
    pub fn check(&mut self, description: impl Into<String>) {
        let description = description.into();
        tracing::debug!(check = %description, "check passed");
        self.checks.push(description);
    }

    /// Number of passed checks
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether nothing was checked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Scenario suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suite {
    /// Authentication
    Login,
    /// Buzz feed
    Buzz,
    /// My Info personal details
    MyInfo,
}

impl Suite {
    /// All suites
    pub const ALL: [Self; 3] = [Self::Login, Self::Buzz, Self::MyInfo];

    /// Name used on the command line
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Buzz => "buzz",
            Self::MyInfo => "my-info",
        }
    }

    /// Parse a command-line name
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "login" => Some(Self::Login),
            "buzz" => Some(Self::Buzz),
            "my-info" | "my_info" | "myinfo" => Some(Self::MyInfo),
            _ => None,
        }
    }
}

impl std::fmt::Display for Suite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every scenario in the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Valid credentials land on the dashboard
    ValidLoginReachesDashboard,
    /// Invalid credentials show an inline alert
    InvalidLoginShowsError,
    /// A stubbed login page shows the stubbed alert
    MockedLoginPageShowsCustomError,
    /// First post counters match the feed response
    CountsMatchFeed,
    /// Like button moves the count by one
    LikeTogglesCount,
    /// Posting a comment increments the count
    CommentIncrementsCount,
    /// A stubbed feed renders its counters
    MockedFeedRenders,
    /// A failed like shows an error toast
    LikeNetworkErrorShowsToast,
    /// The first post's timestamp is rendered in the local zone
    PostTimestampIsRendered,
    /// Saved personal details survive a reload
    UpdatePersists,
    /// Blank required fields block the save
    MissingRequiredFields,
    /// A stubbed record fills the form
    MockedDetailsRender,
    /// A failed save shows an error toast
    UpdateNetworkErrorShowsToast,
}

impl ScenarioId {
    /// All scenarios in catalogue order
    pub const ALL: [Self; 13] = [
        Self::ValidLoginReachesDashboard,
        Self::InvalidLoginShowsError,
        Self::MockedLoginPageShowsCustomError,
        Self::CountsMatchFeed,
        Self::LikeTogglesCount,
        Self::CommentIncrementsCount,
        Self::MockedFeedRenders,
        Self::LikeNetworkErrorShowsToast,
        Self::PostTimestampIsRendered,
        Self::UpdatePersists,
        Self::MissingRequiredFields,
        Self::MockedDetailsRender,
        Self::UpdateNetworkErrorShowsToast,
    ];

    /// Owning suite
    #[must_use]
    pub const fn suite(&self) -> Suite {
        match self {
            Self::ValidLoginReachesDashboard
            | Self::InvalidLoginShowsError
            | Self::MockedLoginPageShowsCustomError => Suite::Login,
            Self::CountsMatchFeed
            | Self::LikeTogglesCount
            | Self::CommentIncrementsCount
            | Self::MockedFeedRenders
            | Self::LikeNetworkErrorShowsToast
            | Self::PostTimestampIsRendered => Suite::Buzz,
            Self::UpdatePersists
            | Self::MissingRequiredFields
            | Self::MockedDetailsRender
            | Self::UpdateNetworkErrorShowsToast => Suite::MyInfo,
        }
    }

    /// Scenario name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ValidLoginReachesDashboard => "valid_login_reaches_dashboard",
            Self::InvalidLoginShowsError => "invalid_login_shows_error",
            Self::MockedLoginPageShowsCustomError => "mocked_login_page_shows_custom_error",
            Self::CountsMatchFeed => "counts_match_feed",
            Self::LikeTogglesCount => "like_toggles_count",
            Self::CommentIncrementsCount => "comment_increments_count",
            Self::MockedFeedRenders => "mocked_feed_renders",
            Self::LikeNetworkErrorShowsToast => "like_network_error_shows_toast",
            Self::PostTimestampIsRendered => "post_timestamp_is_rendered",
            Self::UpdatePersists => "update_persists",
            Self::MissingRequiredFields => "missing_required_fields",
            Self::MockedDetailsRender => "mocked_details_render",
            Self::UpdateNetworkErrorShowsToast => "update_network_error_shows_toast",
        }
    }

    /// `suite::name`
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.suite(), self.name())
    }

    /// Look a scenario up by plain or qualified name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == name || id.qualified_name() == name)
    }

    /// Begin the context, run the scenario, then finish the context.
    ///
    /// `finish` runs even when the scenario fails; the scenario's own error
    /// takes precedence over a page error reported by `finish`.
    pub async fn run<D: Driver>(self, ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
        tracing::info!(scenario = %self.qualified_name(), case = %ctx.id(), "scenario started");
        ctx.begin().await?;
        let result = self.dispatch(ctx).await;
        let finished = ctx.finish().await;
        let outcome = result.and_then(|outcome| finished.map(|()| outcome));
        match &outcome {
            Ok(o) => tracing::info!(scenario = %self.qualified_name(), checks = o.len(), "scenario passed"),
            Err(e) => tracing::info!(scenario = %self.qualified_name(), kind = %e.kind(), error = %e, "scenario failed"),
        }
        outcome
    }

    async fn dispatch<D: Driver>(self, ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
        match self {
            Self::ValidLoginReachesDashboard => login::valid_login_reaches_dashboard(ctx).await,
            Self::InvalidLoginShowsError => login::invalid_login_shows_error(ctx).await,
            Self::MockedLoginPageShowsCustomError => {
                login::mocked_login_page_shows_custom_error(ctx).await
            }
            Self::CountsMatchFeed => buzz::counts_match_feed(ctx).await,
            Self::LikeTogglesCount => buzz::like_toggles_count(ctx).await,
            Self::CommentIncrementsCount => buzz::comment_increments_count(ctx).await,
            Self::MockedFeedRenders => buzz::mocked_feed_renders(ctx).await,
            Self::LikeNetworkErrorShowsToast => buzz::like_network_error_shows_toast(ctx).await,
            Self::PostTimestampIsRendered => buzz::post_timestamp_is_rendered(ctx).await,
            Self::UpdatePersists => my_info::update_persists(ctx).await,
            Self::MissingRequiredFields => my_info::missing_required_fields(ctx).await,
            Self::MockedDetailsRender => my_info::mocked_details_render(ctx).await,
            Self::UpdateNetworkErrorShowsToast => {
                my_info::update_network_error_shows_toast(ctx).await
            }
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.suite(), self.name())
    }
}

/// `(suite, name)` for every scenario
#[must_use]
pub fn catalogue() -> Vec<(Suite, &'static str)> {
    ScenarioId::ALL.iter().map(|id| (id.suite(), id.name())).collect()
}

/// Scenarios in `suite` (all when `None`) whose qualified name contains `filter`
#[must_use]
pub fn select(suite: Option<Suite>, filter: Option<&str>) -> Vec<ScenarioId> {
    ScenarioId::ALL
        .into_iter()
        .filter(|id| suite.map_or(true, |s| id.suite() == s))
        .filter(|id| filter.map_or(true, |f| id.qualified_name().contains(f)))
        .collect()
}

/// Click the main menu entry labelled `item`
pub(crate) async fn open_menu(driver: &dyn Driver, item: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let selector = Selector::text(item);
    let entry = retry(wait, &format!("menu entry {item:?}"), Exhausted::LastError, || async {
        driver
            .query_all(&selector, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::not_found(format!("menu entry {item:?}")))
    })
    .await?;
    driver.click(&entry).await
}
