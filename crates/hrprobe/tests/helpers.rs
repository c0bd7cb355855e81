//! Interaction helpers exercised against the scripted HR application.

#![allow(clippy::unwrap_used)]

mod support;

use hrprobe::dropdown::{choose_by_label, selected_text_by_label};
use hrprobe::input::fill_selector;
use hrprobe::label::{find_input_by_label, find_select_by_label};
use hrprobe::login::{login, Credentials, LoginFlow, LoginState};
use hrprobe::mock::MockDriver;
use hrprobe::post_time::find_post_by_timestamp;
use hrprobe::toast::{assert_no_toast, assert_toast, ToastKind};
use hrprobe::{api, selectors, Driver, FailureKind, Intercept, MockResponse, TestContext};
use support::{FakeHrm, HrState};

async fn logged_in_at(path: &str) -> TestContext<MockDriver> {
    logged_in_with(HrState::default(), path).await
}

async fn logged_in_with(state: HrState, path: &str) -> TestContext<MockDriver> {
    let (mut ctx, _) = FakeHrm::with_state(state).context("helpers");
    ctx.begin().await.unwrap();
    let _ = login(&mut ctx, &Credentials::admin()).await.unwrap();
    ctx.visit(path).await.unwrap();
    ctx
}

// ============================================================================
// Labels and dropdowns
// ============================================================================

#[tokio::test(start_paused = true)]
async fn label_lookup_resolves_form_controls() {
    let ctx = logged_in_at(&support::my_info_page()).await;
    let wait = ctx.command_wait();

    let input = find_input_by_label(ctx.driver(), "Employee Id", &wait).await.unwrap();
    assert_eq!(ctx.driver().value(&input).await.unwrap(), "0295");

    let select = find_select_by_label(ctx.driver(), "Nationality", &wait).await.unwrap();
    assert_eq!(ctx.driver().text(&select).await.unwrap(), "-- Select --");
}

#[tokio::test(start_paused = true)]
async fn label_fragment_shared_by_two_fields_is_ambiguous() {
    let ctx = logged_in_at(&support::my_info_page()).await;
    let wait = ctx.command_wait();
    let err = find_input_by_label(ctx.driver(), " Id", &wait).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Ambiguous);
}

#[tokio::test(start_paused = true)]
async fn dropdown_choice_shows_in_trigger() {
    let ctx = logged_in_at(&support::my_info_page()).await;
    let wait = ctx.command_wait();
    let driver = ctx.driver();

    let _ = choose_by_label(driver, "Marital Status", "Other", &wait).await.unwrap();
    assert_eq!(selected_text_by_label(driver, "Marital Status", &wait).await.unwrap(), "Other");
    // choosing closes the panel
    let panels = driver
        .with_page(|page| page.dom.first(selectors::SELECT_DROPDOWN))
        .unwrap();
    assert!(panels.is_none());
    // the other dropdown is untouched
    assert_eq!(
        selected_text_by_label(driver, "Nationality", &wait).await.unwrap(),
        "-- Select --"
    );
}

// ============================================================================
// Toasts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn save_shows_success_toast_only() {
    let ctx = logged_in_at(&support::my_info_page()).await;
    let wait = ctx.command_wait();
    let driver = ctx.driver();

    let _ = fill_selector(driver, selectors::MIDDLE_NAME_INPUT, "Lee", &wait).await.unwrap();
    let submit = hrprobe::driver::query_first(driver, &hrprobe::Selector::css(selectors::SUBMIT_ANY), None)
        .await
        .unwrap();
    driver.click(&submit).await.unwrap();

    let _ = assert_toast(driver, ToastKind::Success, "Success", "Successfully Updated", &wait)
        .await
        .unwrap();
    assert_no_toast(driver, ToastKind::Error).await.unwrap();

    let err = assert_toast(driver, ToastKind::Success, "Success", "Deleted", &wait)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Mismatch);
}

// ============================================================================
// Post timestamps
// ============================================================================

#[tokio::test(start_paused = true)]
async fn every_feed_post_is_found_by_timestamp() {
    let state = HrState::default();
    let posts = state.posts.clone();
    let ctx = logged_in_with(state, support::BUZZ_PAGE).await;
    let wait = ctx.command_wait();

    for post in &posts {
        let stamp = find_post_by_timestamp(ctx.driver(), &post.timestamp(), &chrono::Local, &wait)
            .await
            .unwrap();
        assert_eq!(ctx.driver().text(&stamp).await.unwrap(), support::rendered_time(post));
    }
}

#[tokio::test(start_paused = true)]
async fn timestamp_in_wrong_zone_is_not_found() {
    let state = HrState::default();
    let post = state.posts[0].clone();
    let ctx = logged_in_with(state, support::BUZZ_PAGE).await;
    let wait = ctx.command_wait().with_timeout(200);

    // 14 hours ahead of every zone except the Line Islands
    let far = chrono::FixedOffset::east_opt(14 * 3600).unwrap();
    let local_offset = chrono::Local::now().offset().local_minus_utc();
    if local_offset == far.local_minus_utc() {
        return;
    }
    let err = find_post_by_timestamp(ctx.driver(), &post.timestamp(), &far, &wait)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::NotFound);
}

// ============================================================================
// Login flow and intercepts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn login_steps_out_of_order_are_rejected() {
    let (mut ctx, _) = FakeHrm::new().context("login order");
    ctx.begin().await.unwrap();

    let mut flow = LoginFlow::new(Credentials::admin());
    let err = flow.submit(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidState);
    assert_eq!(flow.state(), LoginState::Idle);

    flow.enter_credentials(&mut ctx).await.unwrap();
    let err = flow.await_response(&mut ctx).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidState);
    assert_eq!(flow.state(), LoginState::CredentialsEntered);
}

#[tokio::test(start_paused = true)]
async fn stub_serves_request_while_both_aliases_record() {
    let mut ctx = logged_in_at(support::BUZZ_PAGE).await;

    let observed = ctx.intercept(Intercept::get(api::BUZZ_FEED).alias("observed")).await.unwrap();
    let stubbed = ctx
        .intercept(
            Intercept::get(api::BUZZ_FEED)
                .alias("stubbed")
                .respond(MockResponse::json(&serde_json::json!({ "data": [], "meta": {}, "rels": [] })).unwrap()),
        )
        .await
        .unwrap();
    ctx.driver().reload().await.unwrap();

    let first = ctx.wait(&observed).await.unwrap();
    let second = ctx.wait(&stubbed).await.unwrap();
    assert_eq!(first, second);
    let feed: api::FeedResponse = first.body_json().unwrap();
    assert!(feed.data.is_empty());

    // nothing rendered from the stubbed empty feed
    let cards = ctx
        .driver()
        .with_page(|page| page.dom.first(selectors::BUZZ_POST))
        .unwrap();
    assert!(cards.is_none());
}

#[tokio::test(start_paused = true)]
async fn wait_on_unused_alias_times_out() {
    let mut ctx = logged_in_at(support::DASHBOARD_INDEX).await;
    let alias = ctx
        .intercept(Intercept::get(api::BUZZ_FEED).alias("neverSent"))
        .await
        .unwrap();
    let err = ctx.wait_with_timeout(&alias, 500).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Timeout);
    assert!(err.to_string().contains("@neverSent"));
}
