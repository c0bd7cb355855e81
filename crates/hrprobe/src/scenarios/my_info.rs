//! My Info suite.

use super::{open_menu, ScenarioOutcome, USER_DETAILS_FIXTURE};
use crate::api::{self, PersonalDetails, PersonalDetailsEnvelope, PersonalDetailsFixture};
use crate::assertion::{contains_text, expect_checked, expect_value, Assertion};
use crate::context::TestContext;
use crate::driver::{query_first, Driver, ElementHandle};
use crate::dropdown::{choose_by_label, selected_text_by_label};
use crate::input::{clear_and_type, fill_selector};
use crate::label::find_input_by_label;
use crate::locator::Selector;
use crate::login::{login, Credentials};
use crate::network::{Intercept, NETWORK_ERROR_MESSAGE};
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::toast::{assert_no_toast, assert_toast, ToastKind};
use crate::wait::{retry, Exhausted, WaitOptions};

/// Menu entry of the personal details page
pub const MENU_ITEM: &str = "My Info";

/// Timeout for the failing save request
pub const FAILED_SAVE_TIMEOUT_MS: u64 = 10_000;

async fn first_match(driver: &dyn Driver, css: &str, wait: &WaitOptions) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(css);
    retry(wait, css, Exhausted::LastError, || query_first(driver, &selector, None)).await
}

/// Close the open date picker
async fn close_calendar(driver: &dyn Driver, wait: &WaitOptions) -> ProbeResult<()> {
    let calendar = first_match(driver, selectors::CALENDAR_CONTAINER, wait).await?;
    let close = contains_text(driver, Some(&calendar), None, "Close", wait).await?;
    driver.click(&close).await
}

/// Element inside a radio wrapper whose text contains `label`
async fn radio_label(driver: &dyn Driver, label: &str, wait: &WaitOptions) -> ProbeResult<ElementHandle> {
    let wrappers = Selector::css(selectors::RADIO_WRAPPER);
    let text = Selector::text(label);
    let waited_for = format!("radio {label:?}");
    retry(wait, &waited_for, Exhausted::LastError, || async {
        for wrapper in driver.query_all(&wrappers, None).await? {
            if let Some(hit) = driver.query_all(&text, Some(&wrapper)).await?.into_iter().next() {
                return Ok(hit);
            }
        }
        Err(ProbeError::not_found(format!("radio {label:?}")))
    })
    .await
}

async fn fill_by_label(driver: &dyn Driver, label: &str, value: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let input = find_input_by_label(driver, label, wait).await?;
    clear_and_type(driver, &input, value).await
}

/// Enter `details` into the personal details form
#[tracing::instrument(skip_all, fields(employee = %details.employee_id))]
async fn fill_form(driver: &dyn Driver, details: &PersonalDetails, wait: &WaitOptions) -> ProbeResult<()> {
    let _ = fill_selector(driver, selectors::FIRST_NAME_INPUT, &details.first_name, wait).await?;
    let _ = fill_selector(driver, selectors::MIDDLE_NAME_INPUT, &details.middle_name, wait).await?;
    let _ = fill_selector(driver, selectors::LAST_NAME_INPUT, &details.last_name, wait).await?;
    fill_by_label(driver, "Employee Id", &details.employee_id, wait).await?;
    fill_by_label(driver, "Other Id", &details.other_id, wait).await?;
    fill_by_label(driver, "Driver's License Number", &details.driving_license_no, wait).await?;

    let expiry = details.driving_license_expired_date.as_deref().unwrap_or_default();
    fill_by_label(driver, "License Expiry Date", expiry, wait).await?;
    close_calendar(driver, wait).await?;

    if details.nationality.is_some() {
        let _ = choose_by_label(driver, "Nationality", details.nationality_name(), wait).await?;
    }
    if let Some(status) = details.marital_status.as_deref() {
        let _ = choose_by_label(driver, "Marital Status", status, wait).await?;
    }

    let birthday = details.birthday.as_deref().unwrap_or_default();
    fill_by_label(driver, "Date of Birth", birthday, wait).await?;
    close_calendar(driver, wait).await?;

    // The radio input is covered by its wrapper; click the wrapper instead.
    if let Some(gender) = details.gender() {
        let label = radio_label(driver, gender.label(), wait).await?;
        let target = driver.parent(&label).await?.unwrap_or(label);
        driver.click(&target).await?;
    }
    Ok(())
}

/// Click the first submit control of the page
async fn submit_form(driver: &dyn Driver, wait: &WaitOptions) -> ProbeResult<()> {
    let submit = first_match(driver, selectors::SUBMIT_ANY, wait).await?;
    driver.click(&submit).await
}

async fn expect_css_value(driver: &dyn Driver, css: &str, expected: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let input = first_match(driver, css, wait).await?;
    expect_value(driver, &input, expected, wait).await
}

async fn expect_label_value(driver: &dyn Driver, label: &str, expected: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let input = find_input_by_label(driver, label, wait).await?;
    expect_value(driver, &input, expected, wait).await
}

async fn expect_selected(driver: &dyn Driver, label: &str, expected: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let waited_for = format!("{label} selection");
    retry(wait, &waited_for, Exhausted::LastError, || async {
        let actual = selected_text_by_label(driver, label, wait).await?;
        if actual == expected {
            Ok(())
        } else {
            Err(ProbeError::mismatch(format!("{label} selection"), expected, actual))
        }
    })
    .await
}

/// Check that the form shows `details`
async fn verify_form(
    driver: &dyn Driver,
    details: &PersonalDetails,
    include_license_expiry: bool,
    wait: &WaitOptions,
) -> ProbeResult<()> {
    expect_css_value(driver, selectors::FIRST_NAME_INPUT, &details.first_name, wait).await?;
    expect_css_value(driver, selectors::MIDDLE_NAME_INPUT, &details.middle_name, wait).await?;
    expect_css_value(driver, selectors::LAST_NAME_INPUT, &details.last_name, wait).await?;
    expect_label_value(driver, "Employee Id", &details.employee_id, wait).await?;
    expect_label_value(driver, "Other Id", &details.other_id, wait).await?;
    expect_label_value(driver, "Driver's License Number", &details.driving_license_no, wait).await?;
    if include_license_expiry {
        let expiry = details.driving_license_expired_date.as_deref().unwrap_or_default();
        expect_label_value(driver, "License Expiry Date", expiry, wait).await?;
    }
    if details.nationality.is_some() {
        expect_selected(driver, "Nationality", details.nationality_name(), wait).await?;
    }
    if let Some(status) = details.marital_status.as_deref() {
        expect_selected(driver, "Marital Status", status, wait).await?;
    }
    let birthday = details.birthday.as_deref().unwrap_or_default();
    expect_label_value(driver, "Date of Birth", birthday, wait).await?;

    if let Some(gender) = details.gender() {
        let label = radio_label(driver, gender.label(), wait).await?;
        let radio_selector = Selector::css(selectors::RADIO_INPUT);
        let radio = retry(wait, "gender radio", Exhausted::LastError, || {
            query_first(driver, &radio_selector, Some(&label))
        })
        .await?;
        expect_checked(driver, &radio, wait).await?;
    }
    Ok(())
}

/// Log in, register the personal details `get` intercept, open My Info and
/// wait for the record to load
async fn open_my_info<D: Driver>(ctx: &mut TestContext<D>, get: Intercept) -> ProbeResult<serde_json::Value> {
    let _ = login(ctx, &Credentials::admin()).await?;
    let alias = ctx.intercept(get).await?;
    open_menu(ctx.driver(), MENU_ITEM, &ctx.command_wait()).await?;
    ctx.wait(&alias).await?.body_json()
}

fn details_endpoint<D: Driver>(ctx: &TestContext<D>) -> String {
    api::personal_details(ctx.config().employee_number)
}

/// Validation messages beside the field matched by `css`
async fn field_messages(driver: &dyn Driver, css: &str, wait: &WaitOptions) -> ProbeResult<ElementHandle> {
    let input = first_match(driver, css, wait).await?;
    driver
        .parent(&input)
        .await?
        .ok_or_else(|| ProbeError::not_found(format!("wrapper of {css}")))
}

async fn expect_required(driver: &dyn Driver, css: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let wrapper = field_messages(driver, css, wait).await?;
    let waited_for = format!("Required beside {css}");
    retry(wait, &waited_for, Exhausted::LastError, || async {
        let messages = driver.siblings(&wrapper, selectors::INPUT_GROUP_MESSAGE).await?;
        if messages.is_empty() {
            return Err(ProbeError::not_found(waited_for.clone()));
        }
        for message in &messages {
            let text = driver.text(message).await?;
            if text.contains("Required") && driver.is_visible(message).await? {
                return Ok(());
            }
        }
        Err(ProbeError::mismatch(format!("message beside {css}"), "Required", "hidden or other text"))
    })
    .await
}

async fn expect_no_message(driver: &dyn Driver, css: &str, wait: &WaitOptions) -> ProbeResult<()> {
    let wrapper = field_messages(driver, css, wait).await?;
    let waited_for = format!("no message beside {css}");
    retry(wait, &waited_for, Exhausted::LastError, || async {
        let count = driver.siblings(&wrapper, selectors::INPUT_GROUP_MESSAGE).await?.len();
        if count == 0 {
            Ok(())
        } else {
            Err(ProbeError::mismatch(format!("messages beside {css}"), "0", count.to_string()))
        }
    })
    .await
}

/// Filling and saving the form persists every field
pub async fn update_persists<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let fixture = PersonalDetailsFixture::from_envelope(&ctx.fixtures().value(USER_DETAILS_FIXTURE)?)?;
    let details = &fixture.details;
    let endpoint = details_endpoint(ctx);

    let put_alias = ctx
        .intercept(Intercept::put(endpoint.as_str()).alias("putPersonalDetails"))
        .await?;
    let _ = open_my_info(ctx, Intercept::get(endpoint.as_str()).alias("getPersonalDetails")).await?;
    outcome.check("personal details loaded");

    let wait = ctx.command_wait();
    fill_form(ctx.driver(), details, &wait).await?;
    submit_form(ctx.driver(), &wait).await?;
    let _ = assert_toast(ctx.driver(), ToastKind::Success, "Success", "Successfully Updated", &wait).await?;
    outcome.check("success toast shown");

    let exchange = ctx.wait(&put_alias).await?;
    Assertion::equals(&200, &exchange.status()?).into_result("personal details PUT status")?;
    let body: serde_json::Value = exchange.body_json()?;
    fixture
        .matches_subset(&body["data"])
        .into_result("personal details PUT response")?;
    outcome.check("PUT response includes every saved field");

    ctx.driver().reload().await?;
    verify_form(ctx.driver(), details, false, &wait).await?;
    outcome.check("fields persist after reload");
    Ok(outcome)
}

/// Clearing required names shows inline errors and blocks the save
pub async fn missing_required_fields<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let endpoint = details_endpoint(ctx);
    let _ = open_my_info(ctx, Intercept::get(endpoint).alias("getPersonalDetails")).await?;

    let wait = ctx.command_wait();
    let driver = ctx.driver();
    for css in [
        selectors::FIRST_NAME_INPUT,
        selectors::MIDDLE_NAME_INPUT,
        selectors::LAST_NAME_INPUT,
    ] {
        let input = first_match(driver, css, &wait).await?;
        driver.clear(&input).await?;
    }
    submit_form(driver, &wait).await?;

    expect_required(driver, selectors::FIRST_NAME_INPUT, &wait).await?;
    outcome.check("first name is required");
    expect_no_message(driver, selectors::MIDDLE_NAME_INPUT, &wait).await?;
    outcome.check("middle name is optional");
    expect_required(driver, selectors::LAST_NAME_INPUT, &wait).await?;
    outcome.check("last name is required");
    assert_no_toast(driver, ToastKind::Success).await?;
    outcome.check("no success toast");
    Ok(outcome)
}

/// A stubbed record is rendered into the form
pub async fn mocked_details_render<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let fixture: PersonalDetailsEnvelope = ctx.fixtures().json(USER_DETAILS_FIXTURE)?;
    let stub = ctx.fixtures().json_response(USER_DETAILS_FIXTURE)?;
    let endpoint = details_endpoint(ctx);

    let _ = open_my_info(
        ctx,
        Intercept::get(endpoint)
            .alias("getMockedPersonalDetails")
            .respond(stub),
    )
    .await?;
    outcome.check("personal details served from the fixture");

    let wait = ctx.command_wait();
    verify_form(ctx.driver(), &fixture.data, true, &wait).await?;
    outcome.check("form shows the fixture record");
    Ok(outcome)
}

/// A save that fails at the transport level shows an error toast
pub async fn update_network_error_shows_toast<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    ctx.allow_page_error(NETWORK_ERROR_MESSAGE);
    let endpoint = details_endpoint(ctx);
    let loaded = open_my_info(ctx, Intercept::get(endpoint.as_str()).alias("getPersonalDetails")).await?;
    let _: PersonalDetailsEnvelope = serde_json::from_value(loaded)?;
    outcome.check("personal details loaded");

    let alias = ctx
        .intercept(
            Intercept::put(endpoint)
                .alias("putPersonalDetails")
                .force_network_error(),
        )
        .await?;
    let wait = ctx.command_wait();
    submit_form(ctx.driver(), &wait).await?;
    let exchange = ctx.wait_with_timeout(&alias, FAILED_SAVE_TIMEOUT_MS).await?;
    Assertion::is_true(exchange.network_error, "save should fail without a response")
        .into_result("personal details PUT")?;
    outcome.check("save failed at the transport level");

    let _ = assert_toast(ctx.driver(), ToastKind::Error, "Error", "Unexpected Error!", &wait).await?;
    outcome.check("error toast shown");
    assert_no_toast(ctx.driver(), ToastKind::Success).await?;
    Ok(outcome)
}
