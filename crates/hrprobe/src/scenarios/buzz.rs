//! Buzz suite.
//!
//! Every scenario logs in, opens Buzz and reads the first feed item from
//! the intercepted feed response. Post cards are located by body text and
//! located again after each action, since the feed re-renders.

use super::{open_menu, ScenarioOutcome, MOCKED_POST_FIXTURE};
use crate::api::{self, BuzzPost, FeedResponse};
use crate::assertion::{expect_visible_in, Assertion};
use crate::context::TestContext;
use crate::driver::{query_first, Driver, ElementHandle, Key};
use crate::input::clear_and_type;
use crate::locator::Selector;
use crate::login::{login, Credentials};
use crate::network::{Intercept, MockResponse, NETWORK_ERROR_MESSAGE};
use crate::post_time::find_post_by_timestamp;
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::toast::{assert_toast, ToastKind};
use crate::wait::{retry, Exhausted, WaitOptions};
use chrono::Local;

/// Comment posted by [`comment_increments_count`]
pub const NEW_COMMENT: &str = "This is a new comment!";

const FEED_ALIAS: &str = "getFeed";

/// Log in, open Buzz and return the first post of the feed response
async fn open_buzz<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<BuzzPost> {
    let _ = login(ctx, &Credentials::admin()).await?;
    let alias = ctx
        .intercept(Intercept::get(api::BUZZ_FEED).alias(FEED_ALIAS))
        .await?;
    open_menu(ctx.driver(), "Buzz", &ctx.command_wait()).await?;

    let feed: FeedResponse = ctx.wait(&alias).await?.body_json()?;
    let first = feed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ProbeError::not_found("first post in feed response"))?;
    tracing::debug!(post = first.id, liked = first.liked, "first post");
    Ok(first)
}

/// Card of the post whose visible body text contains `text`
async fn post_card(driver: &dyn Driver, text: &str, wait: &WaitOptions) -> ProbeResult<ElementHandle> {
    let body_selector = Selector::css_with_text(selectors::BUZZ_POST_BODY_TEXT, text);
    let body = expect_visible_in(driver, None, &body_selector, wait).await?;
    driver
        .ancestor(&body, selectors::BUZZ_POST)
        .await?
        .ok_or_else(|| ProbeError::not_found(format!("post card for {text:?}")))
}

/// Wait until a visible stats row of `card` contains `text`.
///
/// With `row`, only that stats row is considered.
async fn expect_stat(
    driver: &dyn Driver,
    card: &ElementHandle,
    row: Option<usize>,
    text: &str,
    wait: &WaitOptions,
) -> ProbeResult<()> {
    let rows_selector = Selector::css(selectors::BUZZ_STATS_ROW);
    let waited_for = format!("stats row with {text:?}");
    retry(wait, &waited_for, Exhausted::LastError, || async {
        let rows = driver.query_all(&rows_selector, Some(card)).await?;
        let candidates: Vec<&ElementHandle> = match row {
            Some(index) => rows.get(index).into_iter().collect(),
            None => rows.iter().collect(),
        };
        if candidates.is_empty() {
            return Err(ProbeError::not_found(format!("stats row {row:?}")));
        }
        let mut seen = Vec::new();
        for candidate in candidates {
            let actual = driver.text(candidate).await?;
            if actual.contains(text) && driver.is_visible(candidate).await? {
                return Ok(());
            }
            seen.push(actual);
        }
        Err(ProbeError::mismatch("post stats", text, seen.join(" | ")))
    })
    .await
}

async fn click_in_card(
    driver: &dyn Driver,
    card: &ElementHandle,
    css: &str,
    wait: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(css);
    let target = retry(wait, css, Exhausted::LastError, || {
        query_first(driver, &selector, Some(card))
    })
    .await?;
    driver.click(&target).await?;
    Ok(target)
}

/// The first post's like and comment counts match the feed response
pub async fn counts_match_feed<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let post = open_buzz(ctx).await?;
    outcome.check("feed response carries a first post");

    let wait = ctx.command_wait();
    let driver = ctx.driver();
    let card = post_card(driver, post.text(), &wait).await?;
    expect_stat(driver, &card, Some(0), &format!("{} Like", post.stats.num_of_likes), &wait).await?;
    outcome.check("like count matches the API");
    expect_stat(
        driver,
        &card,
        Some(1),
        &format!("{} Comment", post.stats.num_of_comments),
        &wait,
    )
    .await?;
    outcome.check("comment count matches the API");
    Ok(outcome)
}

/// Clicking the heart issues the like call and moves the count by one
pub async fn like_toggles_count<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let post = open_buzz(ctx).await?;
    let wait = ctx.command_wait();

    let card = post_card(ctx.driver(), post.text(), &wait).await?;
    let initial = post.stats.num_of_likes;
    expect_stat(ctx.driver(), &card, Some(0), &format!("{initial} Like"), &wait).await?;
    outcome.check("initial like count matches the API");

    let alias = ctx
        .intercept(Intercept::new(post.like_method(), api::share_likes(post.id)).alias("likeAction"))
        .await?;
    let _ = click_in_card(ctx.driver(), &card, selectors::LIKE_BUTTON, &wait).await?;
    let exchange = ctx.wait(&alias).await?;
    Assertion::equals(&post.like_method(), &exchange.request.method).into_result("like request method")?;
    outcome.check(format!("{} issued for the like toggle", post.like_method()));

    let expected = post.expected_likes_after_toggle();
    let card = post_card(ctx.driver(), post.text(), &wait).await?;
    expect_stat(ctx.driver(), &card, Some(0), &format!("{expected} Like"), &wait).await?;
    outcome.check(format!("like count moved from {initial} to {expected}"));
    Ok(outcome)
}

/// Posting a comment succeeds and increments the comment count
pub async fn comment_increments_count<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let post = open_buzz(ctx).await?;
    let wait = ctx.command_wait();
    let comments = post.stats.num_of_comments;

    let card = post_card(ctx.driver(), post.text(), &wait).await?;
    expect_stat(ctx.driver(), &card, None, &format!("{comments} Comment"), &wait).await?;
    let _ = click_in_card(ctx.driver(), &card, selectors::COMMENT_ICON, &wait).await?;

    let alias = ctx
        .intercept(Intercept::post(api::share_comments(post.id)).alias("addComment"))
        .await?;
    let driver = ctx.driver();
    let input_selector = Selector::css(selectors::COMMENT_INPUT);
    let input = retry(&wait, "comment box", Exhausted::LastError, || {
        query_first(driver, &input_selector, Some(&card))
    })
    .await?;
    clear_and_type(driver, &input, NEW_COMMENT).await?;
    driver.press_key(&input, Key::Enter).await?;

    let exchange = ctx.wait(&alias).await?;
    Assertion::equals(&200, &exchange.status()?).into_result("addComment status")?;
    outcome.check("comment POST returned 200");

    let card = post_card(ctx.driver(), post.text(), &wait).await?;
    expect_stat(ctx.driver(), &card, None, &format!("{} Comment", comments + 1), &wait).await?;
    outcome.check("comment count incremented");
    Ok(outcome)
}

/// A stubbed one-item feed renders the stubbed counters
pub async fn mocked_feed_renders<D: Driver>(ctx: &mut TestContext<D>) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let raw = ctx.fixtures().value(MOCKED_POST_FIXTURE)?;
    let post: BuzzPost = serde_json::from_value(raw.clone())?;
    let body = serde_json::json!({
        "data": [raw],
        "meta": { "total": 1 },
        "rels": [],
    });

    let _ = login(ctx, &Credentials::admin()).await?;
    let alias = ctx
        .intercept(
            Intercept::get(api::BUZZ_FEED)
                .alias("mockedFeed")
                .respond(MockResponse::json(&body)?),
        )
        .await?;
    open_menu(ctx.driver(), "Buzz", &ctx.command_wait()).await?;
    let _ = ctx.wait(&alias).await?;
    outcome.check("feed was served from the fixture");

    let wait = ctx.command_wait();
    let driver = ctx.driver();
    let card = post_card(driver, post.text(), &wait).await?;
    let stats = post.stats;
    expect_stat(driver, &card, Some(0), &format!("{} Like", stats.num_of_likes), &wait).await?;
    expect_stat(driver, &card, Some(1), &format!("{} Comment", stats.num_of_comments), &wait).await?;
    expect_stat(driver, &card, None, &format!("{} Share", stats.num_of_shares), &wait).await?;
    outcome.check("likes, comments and shares match the fixture");
    Ok(outcome)
}

/// A like that fails at the transport level shows an error toast
pub async fn like_network_error_shows_toast<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    ctx.allow_page_error(NETWORK_ERROR_MESSAGE);
    let post = open_buzz(ctx).await?;
    let wait = ctx.command_wait();

    let alias = ctx
        .intercept(
            Intercept::new(post.like_method(), api::share_likes(post.id))
                .alias("likeNoResponse")
                .force_network_error(),
        )
        .await?;
    let card = post_card(ctx.driver(), post.text(), &wait).await?;
    let _ = click_in_card(ctx.driver(), &card, selectors::LIKE_BUTTON, &wait).await?;
    let exchange = ctx.wait(&alias).await?;
    Assertion::is_true(exchange.network_error, "like request should fail without a response")
        .into_result("like exchange")?;
    outcome.check("like request failed at the transport level");

    let _ = assert_toast(ctx.driver(), ToastKind::Error, "Error", "Unexpected Error!", &wait).await?;
    outcome.check("error toast shown");
    Ok(outcome)
}

/// The first post's creation time is rendered in the local zone
pub async fn post_timestamp_is_rendered<D: Driver>(
    ctx: &mut TestContext<D>,
) -> ProbeResult<ScenarioOutcome> {
    let mut outcome = ScenarioOutcome::new();
    let post = open_buzz(ctx).await?;
    let wait = ctx.command_wait();
    let driver = ctx.driver();

    let timestamp = post.timestamp();
    let stamp = find_post_by_timestamp(driver, &timestamp, &Local, &wait).await?;
    outcome.check(format!("timestamp {} rendered", timestamp.display_text_local()?));

    let card = driver
        .ancestor(&stamp, selectors::BUZZ_POST)
        .await?
        .ok_or_else(|| ProbeError::not_found("post card around the timestamp"))?;
    let card_text = driver.text(&card).await?;
    Assertion::contains(&card_text, post.text()).into_result("post card of the timestamp")?;
    outcome.check("timestamp belongs to the first post");
    Ok(outcome)
}
