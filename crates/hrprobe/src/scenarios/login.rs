//! Login suite.

use super::{ScenarioOutcome, LOGIN_ERROR_FIXTURE};
use crate::api;
use crate::assertion::{expect_text_contains, expect_url_contains, expect_visible, Assertion};
use crate::context::TestContext;
use crate::driver::Driver;
use crate::login::{login, Credentials};
use crate::network::{Exchange, Intercept};
use crate::result::ProbeResult;
use crate::selectors;

fn location_header(exchange: &Exchange) -> ProbeResult<String> {
    Ok(exchange.header("location")?.unwrap_or_default().to_string())
}

/// Valid credentials redirect to the dashboard and render its widgets
pub async fn valid_login_reaches_dashboard<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let exchange = login(ctx, &Credentials::admin()).await?;
    Assertion::contains(&location_header(&exchange)?, api::DASHBOARD)
        .into_result("location header of login validation")?;
    outcome.check("validation redirects to the dashboard");

    let wait = ctx.command_wait();
    let driver = ctx.driver();
    let _ = expect_text_contains(driver, selectors::BREADCRUMB_MODULE, "Dashboard", &wait).await?;
    outcome.check("breadcrumb shows Dashboard");
    let _ = expect_visible(driver, selectors::DASHBOARD_WIDGET, &wait).await?;
    outcome.check("dashboard widgets are visible");
    let _ = expect_url_contains(driver, api::DASHBOARD, &wait).await?;
    outcome.check("url is the dashboard");
    Ok(outcome)
}

/// Invalid credentials bounce back to the login page with an alert
pub async fn invalid_login_shows_error<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let exchange = login(ctx, &Credentials::new("InvalidUser", "wrongPassword")).await?;
    Assertion::contains(&location_header(&exchange)?, api::AUTH_LOGIN)
        .into_result("location header of login validation")?;
    outcome.check("validation redirects to the login page");

    let wait = ctx.command_wait();
    let _ = expect_text_contains(
        ctx.driver(),
        selectors::ALERT_CONTENT_TEXT,
        "Invalid credentials",
        &wait,
    )
    .await?;
    outcome.check("alert shows Invalid credentials");
    Ok(outcome)
}

/// The login page is served from a fixture carrying a different alert
pub async fn mocked_login_page_shows_custom_error<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let page = ctx.fixtures().html_response(LOGIN_ERROR_FIXTURE)?;
    let alias = ctx
        .intercept(Intercept::get(api::AUTH_LOGIN).alias("loginRequest").respond(page))
        .await?;

    let _ = login(ctx, &Credentials::new("InvalidUser", "InvalidPassword")).await?;
    let _ = ctx.wait(&alias).await?;
    outcome.check("login page was served from the fixture");

    let wait = ctx.command_wait();
    let _ = expect_text_contains(
        ctx.driver(),
        selectors::ALERT_CONTENT_TEXT,
        "API error handling response",
        &wait,
    )
    .await?;
    outcome.check("alert shows the fixture text");
    Ok(outcome)
}
