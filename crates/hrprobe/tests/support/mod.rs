//! Scripted stand-in for the HR application.
//!
//! One [`MockDriver`] with a backend answering the application's HTTP API
//! from shared state, and a router rendering the login page, dashboard,
//! Buzz feed and personal details form the way the real pages are laid out.

#![allow(dead_code, clippy::unwrap_used)]

use chrono::{Local, NaiveDateTime};
use hrprobe::api::{self, BuzzPost, Employee, FeedResponse, PostStats};
use hrprobe::mock::{MockDom, MockDriver, MockNode, MockPage, NodeId, SelectorList};
use hrprobe::network::{CapturedRequest, CapturedResponse, HttpMethod, MockResponse, NETWORK_ERROR_MESSAGE};
use hrprobe::{selectors, Key, SuiteConfig, TestContext};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "https://hr.test";
pub const BUZZ_PAGE: &str = "/web/index.php/buzz/viewBuzz";
pub const EMP_NUMBER: u32 = 7;
pub const DASHBOARD_INDEX: &str = "/web/index.php/dashboard/index";

const MY_INFO_PREFIX: &str = "/web/index.php/pim/viewPersonalDetails";
const SHARES_PREFIX: &str = "/web/index.php/api/v2/buzz/shares/";
const PLACEHOLDER: &str = "-- Select --";
const UNEXPECTED: &str = "Unexpected Error!";

pub const NATIONALITIES: &[(u64, &str)] = &[
    (3, "American"),
    (38, "Brazilian"),
    (82, "Canadian"),
    (45, "Cuban"),
    (193, "Vietnamese"),
];
pub const MARITAL_STATUSES: &[&str] = &["Single", "Married", "Other"];
const BLOOD_TYPES: &[&str] = &["A+", "A-", "B+", "O+"];

/// Server-side state of the fake application
#[derive(Debug)]
pub struct HrState {
    pub logged_in: bool,
    pub login_alert: Option<String>,
    pub posts: Vec<BuzzPost>,
    pub details: Value,
    pub comments: Vec<(u64, String)>,
}

pub type Shared = Arc<Mutex<HrState>>;

pub fn post(id: u64, text: &str, liked: bool, stats: (u32, u32, u32), created: (&str, &str)) -> BuzzPost {
    BuzzPost {
        id,
        text: Some(text.to_string()),
        liked,
        stats: PostStats {
            num_of_likes: stats.0,
            num_of_comments: stats.1,
            num_of_shares: stats.2,
        },
        created_date: created.0.to_string(),
        created_time: created.1.to_string(),
        employee: Employee {
            first_name: "Linda".to_string(),
            middle_name: "Jane".to_string(),
            last_name: "Anderson".to_string(),
        },
    }
}

impl Default for HrState {
    fn default() -> Self {
        Self {
            logged_in: false,
            login_alert: None,
            posts: vec![
                post(12, "Team offsite photos are up in the shared drive", false, (4, 2, 1), ("2024-06-03", "07:15 PM")),
                post(11, "Welcome to our new starters!", true, (9, 3, 0), ("2024-05-28", "08:02 AM")),
            ],
            details: json!({
                "empNumber": EMP_NUMBER,
                "firstName": "Paul",
                "middleName": "",
                "lastName": "Collings",
                "employeeId": "0295",
                "otherId": "",
                "drivingLicenseNo": "",
                "drivingLicenseExpiredDate": null,
                "birthday": null,
                "gender": null,
                "maritalStatus": null,
                "nationality": null
            }),
            comments: Vec::new(),
        }
    }
}

/// Fake application with its shared state
pub struct FakeHrm {
    pub driver: MockDriver,
    pub state: Shared,
}

impl FakeHrm {
    pub fn new() -> Self {
        Self::with_state(HrState::default())
    }

    pub fn with_state(state: HrState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let driver = MockDriver::new();
        let backend_state = state.clone();
        driver
            .set_backend(move |request| backend(&backend_state, request))
            .unwrap();
        driver.set_router(route).unwrap();
        Self { driver, state }
    }

    pub fn context(self, name: &str) -> (TestContext<MockDriver>, Shared) {
        let ctx = TestContext::new(name, self.driver, config());
        (ctx, self.state)
    }
}

pub fn fixtures_dir() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

pub fn config() -> SuiteConfig {
    SuiteConfig::default()
        .with_base_url(BASE_URL)
        .with_fixtures_dir(fixtures_dir())
        .with_command_timeout(2_000)
        .with_network_timeouts(3_000, 3_000)
}

pub fn my_info_page() -> String {
    format!("{MY_INFO_PREFIX}/empNumber/{EMP_NUMBER}")
}

/// Path of an absolute or relative URL, query stripped
pub fn route_of(url: &str) -> &str {
    let path = url.find("://").map_or(url, |i| {
        let rest = &url[i + 3..];
        rest.find('/').map_or("/", |j| &rest[j..])
    });
    path.split('?').next().unwrap_or(path)
}

/// Timestamp text the feed renders for `post` in the local zone
pub fn rendered_time(post: &BuzzPost) -> String {
    let raw = format!("{} {}", post.created_date, post.created_time);
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %I:%M %p")
        .map(|naive| {
            naive
                .and_utc()
                .with_timezone(&Local)
                .format("%Y-%d-%m %I:%M %p")
                .to_string()
        })
        .unwrap_or(raw)
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

fn json_ok(value: &Value) -> MockResponse {
    MockResponse::json(value).unwrap()
}

fn not_found() -> MockResponse {
    MockResponse::new().with_status(404)
}

fn form_field<'a>(body: &'a str, name: &str) -> &'a str {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map_or("", |(_, value)| value)
}

fn login_html(alert: Option<&str>) -> String {
    let alert = alert.map_or_else(String::new, |text| {
        format!(r#"<div class="oxd-alert"><p class="oxd-text oxd-text--p oxd-alert-content-text">{text}</p></div>"#)
    });
    format!(r#"<html><body><div class="orangehrm-login-container">{alert}<form class="oxd-form"></form></div></body></html>"#)
}

fn backend(state: &Shared, request: &CapturedRequest) -> MockResponse {
    let mut st = state.lock().unwrap();
    let path = route_of(&request.url);
    let body = request.body_string().unwrap_or_default();

    match (request.method, path) {
        (HttpMethod::Get, "/") => MockResponse::redirect(api::AUTH_LOGIN),
        (HttpMethod::Get, p) if p == api::AUTH_LOGIN => MockResponse::html(&login_html(st.login_alert.as_deref())),
        (HttpMethod::Post, p) if p == api::AUTH_VALIDATE => {
            if form_field(&body, "username") == "Admin" && form_field(&body, "password") == "admin123" {
                st.logged_in = true;
                st.login_alert = None;
                MockResponse::redirect(DASHBOARD_INDEX)
            } else {
                st.login_alert = Some("Invalid credentials".to_string());
                MockResponse::redirect(api::AUTH_LOGIN)
            }
        }
        (HttpMethod::Get, p) if p.starts_with(api::DASHBOARD) || p == BUZZ_PAGE || p.starts_with(MY_INFO_PREFIX) => {
            if st.logged_in {
                MockResponse::html("<html><body></body></html>")
            } else {
                MockResponse::redirect(api::AUTH_LOGIN)
            }
        }
        (HttpMethod::Get, "/web/index.php/api/v2/buzz/feed") => {
            let feed = FeedResponse {
                data: st.posts.clone(),
                meta: json!({ "total": st.posts.len() }),
                rels: json!([]),
            };
            json_ok(&serde_json::to_value(&feed).unwrap())
        }
        (method, p) if p.starts_with(SHARES_PREFIX) => {
            let rest = &p[SHARES_PREFIX.len()..];
            let Some((id, action)) = rest.split_once('/') else {
                return not_found();
            };
            let Ok(id) = id.parse::<u64>() else {
                return not_found();
            };
            share_action(&mut st, method, id, action, &body)
        }
        (HttpMethod::Get, p) if p == api::personal_details(EMP_NUMBER) => {
            json_ok(&json!({ "data": st.details, "meta": [], "rels": [] }))
        }
        (HttpMethod::Put, p) if p == api::personal_details(EMP_NUMBER) => {
            let Ok(Value::Object(mut record)) = serde_json::from_str::<Value>(&body) else {
                return MockResponse::new().with_status(422);
            };
            let nationality = record
                .remove("nationalityId")
                .and_then(|id| id.as_u64())
                .and_then(|id| NATIONALITIES.iter().find(|(n, _)| *n == id))
                .map_or(Value::Null, |(id, name)| json!({ "id": id, "name": name }));
            let _ = record.insert("nationality".to_string(), nationality);
            let _ = record.insert("empNumber".to_string(), json!(EMP_NUMBER));
            st.details = Value::Object(record);
            json_ok(&json!({ "data": st.details, "meta": [], "rels": [] }))
        }
        _ => not_found(),
    }
}

fn share_action(st: &mut HrState, method: HttpMethod, id: u64, action: &str, body: &str) -> MockResponse {
    let post = st.posts.iter_mut().find(|p| p.id == id);
    match (method, action) {
        (HttpMethod::Post, "likes") => {
            if let Some(post) = post {
                post.liked = true;
                post.stats.num_of_likes += 1;
            }
            json_ok(&json!({ "data": { "shareId": id } }))
        }
        (HttpMethod::Delete, "likes") => {
            if let Some(post) = post {
                post.liked = false;
                post.stats.num_of_likes = post.stats.num_of_likes.saturating_sub(1);
            }
            json_ok(&json!({ "data": { "shareId": id } }))
        }
        (HttpMethod::Post, "comments") => {
            if let Some(post) = post {
                post.stats.num_of_comments += 1;
            }
            let text = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| v["text"].as_str().map(str::to_string))
                .unwrap_or_default();
            st.comments.push((id, text.clone()));
            json_ok(&json!({ "data": { "id": st.comments.len(), "comment": text } }))
        }
        _ => not_found(),
    }
}

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

fn route(page: &mut MockPage, url: &str, response: Option<&CapturedResponse>) {
    let Some(response) = response.filter(|r| r.status == 200) else {
        return;
    };
    let path = route_of(url).to_string();
    if path == api::AUTH_LOGIN {
        render_login(page, alert_text(&response.body_string()));
    } else if path.starts_with(api::DASHBOARD) {
        let _ = page.dom.set_body(shell("Dashboard", dashboard()));
    } else if path == BUZZ_PAGE {
        render_buzz(page);
    } else if path.starts_with(MY_INFO_PREFIX) {
        render_my_info(page);
    }
}

fn alert_text(html: &str) -> Option<String> {
    let marker = "oxd-alert-content-text\">";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('<')? + start;
    Some(html[start..end].trim().to_string())
}

/// `node` or its closest ancestor matching `css`
pub fn closest(dom: &MockDom, node: NodeId, css: &str) -> Option<NodeId> {
    let list = SelectorList::parse(css).ok()?;
    std::iter::once(node)
        .chain(dom.ancestors(node))
        .find(|&n| list.matches(dom, n))
}

fn first_in(dom: &MockDom, css: &str, scope: NodeId) -> Option<NodeId> {
    dom.find(css, Some(scope)).ok()?.into_iter().next()
}

fn parent_of(dom: &MockDom, node: NodeId) -> Option<NodeId> {
    dom.node(node).and_then(|n| n.parent)
}

fn show_toast(page: &mut MockPage, kind: &str, title: &str, message: &str) {
    let body = page.dom.body();
    let container = match page.dom.first(".oxd-toast-container") {
        Some(c) => c,
        None => page.dom.append(body, MockNode::el("div.oxd-toast-container")),
    };
    let _ = page.dom.append(
        container,
        MockNode::el(&format!("div.oxd-toast.oxd-toast--{kind}")).child(
            MockNode::el("div.oxd-toast-content")
                .child(MockNode::el("p.oxd-text.oxd-text--toast-title").text(title))
                .child(MockNode::el("p.oxd-text.oxd-text--toast-message").text(message)),
        ),
    );
}

/// Transport failure: the page logs an uncaught error and shows a toast
fn network_failure(page: &mut MockPage) {
    page.push_page_error(format!("AxiosError: {NETWORK_ERROR_MESSAGE}"));
    show_toast(page, "error", "Error", UNEXPECTED);
}

fn menu_item(label: &'static str, path: String) -> MockNode {
    MockNode::el("li.oxd-main-menu-item-wrapper").child(
        MockNode::el("a.oxd-main-menu-item")
            .attr("href", &path)
            .on_click(move |page, _| page.navigate(&path))
            .child(MockNode::el("span.oxd-text.oxd-main-menu-item--name").text(label)),
    )
}

fn shell(module: &str, content: MockNode) -> MockNode {
    let menu = [
        ("Admin", "/web/index.php/admin/viewSystemUsers".to_string()),
        ("PIM", "/web/index.php/pim/viewEmployeeList".to_string()),
        ("My Info", my_info_page()),
        ("Dashboard", DASHBOARD_INDEX.to_string()),
        ("Buzz", BUZZ_PAGE.to_string()),
    ];
    MockNode::el("div.oxd-layout")
        .child(
            MockNode::el("aside.oxd-sidepanel").child(
                MockNode::el("nav")
                    .child(MockNode::el("ul.oxd-main-menu").children(menu.into_iter().map(|(l, p)| menu_item(l, p)))),
            ),
        )
        .child(
            MockNode::el("div.oxd-layout-navigation").child(
                MockNode::el("header.oxd-topbar").child(
                    MockNode::el("div.oxd-topbar-header")
                        .child(MockNode::el("h6.oxd-text.oxd-topbar-header-breadcrumb-module").text(module)),
                ),
            ),
        )
        .child(MockNode::el("div.oxd-layout-container").child(content))
}

fn render_login(page: &mut MockPage, alert: Option<String>) {
    let mut container = MockNode::el("div.orangehrm-login-container");
    if let Some(text) = alert {
        container = container.child(
            MockNode::el("div.oxd-alert.oxd-alert--error")
                .child(MockNode::el("p.oxd-text.oxd-text--p.oxd-alert-content-text").text(text)),
        );
    }
    let form = MockNode::el("form.oxd-form")
        .child(MockNode::el("input.oxd-input").attr("name", "username"))
        .child(MockNode::el("input.oxd-input").attr("name", "password").attr("type", "password"))
        .child(
            MockNode::el("button.oxd-button.orangehrm-login-button")
                .attr("type", "submit")
                .text("Login")
                .on_click(|page, _| submit_login(page)),
        );
    let _ = page.dom.set_body(container.child(form));
}

fn submit_login(page: &mut MockPage) {
    let value = |page: &MockPage, css: &str| page.dom.first(css).map(|n| page.dom.value_of(n)).unwrap_or_default();
    let body = format!(
        "username={}&password={}",
        value(page, selectors::USERNAME_INPUT),
        value(page, selectors::PASSWORD_INPUT)
    );
    let response = page.fetch(HttpMethod::Post, api::AUTH_VALIDATE, Some(body.into_bytes()));
    if let Some(location) = response.as_ref().and_then(|r| r.header("location")) {
        let location = location.to_string();
        page.navigate(&location);
    }
}

fn dashboard() -> MockNode {
    let widget = |title: &str| {
        MockNode::el("div.oxd-sheet.orangehrm-dashboard-widget")
            .child(MockNode::el("p.oxd-text.oxd-text--p").text(title))
    };
    MockNode::el("div.orangehrm-dashboard-grid").children([
        widget("Time at Work"),
        widget("My Actions"),
        widget("Quick Launch"),
    ])
}

// Buzz

fn render_buzz(page: &mut MockPage) {
    let posts = page
        .fetch(HttpMethod::Get, api::BUZZ_FEED, None)
        .filter(|r| r.status == 200)
        .and_then(|r| r.body_json::<FeedResponse>().ok())
        .map(|feed| feed.data)
        .unwrap_or_default();
    let feed = MockNode::el("div.orangehrm-buzz-newsfeed-posts").children(posts.iter().map(post_card));
    let _ = page.dom.set_body(shell("Buzz", feed));
}

fn post_card(post: &BuzzPost) -> MockNode {
    let id = post.id;
    let stats = post.stats;
    MockNode::el("div.oxd-sheet.orangehrm-buzz")
        .child(
            MockNode::el("div.orangehrm-buzz-post-header").child(
                MockNode::el("div.orangehrm-buzz-post-header-text")
                    .child(MockNode::el("p.oxd-text.orangehrm-buzz-post-emp-name").text(post.employee.display_name()))
                    .child(MockNode::el("p.oxd-text.orangehrm-buzz-post-time").text(rendered_time(post))),
            ),
        )
        .child(
            MockNode::el("div.orangehrm-buzz-post-body")
                .child(MockNode::el("p.oxd-text.orangehrm-buzz-post-body-text").text(post.text())),
        )
        .child(
            MockNode::el("div.orangehrm-buzz-post-footer")
                .child(
                    MockNode::el("div.orangehrm-buzz-post-actions")
                        .child(
                            MockNode::el("div.orangehrm-like-animation").child(
                                // liked state lives on the heart's checked flag
                                MockNode::el("svg#heart-svg")
                                    .checked(post.liked)
                                    .on_click(move |page, target| toggle_like(page, target, id)),
                            ),
                        )
                        .child(
                            MockNode::el("button.oxd-icon-button").child(
                                MockNode::el("i.oxd-icon.bi-chat-text-fill")
                                    .on_click(move |page, target| open_comment_box(page, target, id)),
                            ),
                        )
                        .child(MockNode::el("button.oxd-icon-button").child(MockNode::el("i.oxd-icon.bi-share-fill"))),
                )
                .child(
                    MockNode::el("div.orangehrm-buzz-stats")
                        .child(
                            MockNode::el("div.orangehrm-buzz-stats-row")
                                .child(MockNode::el("p.oxd-text").text(format!("{} Likes", stats.num_of_likes))),
                        )
                        .child(
                            MockNode::el("div.orangehrm-buzz-stats-row")
                                .child(MockNode::el("p.oxd-text").text(format!("{} Comments", stats.num_of_comments)))
                                .child(MockNode::el("p.oxd-text").text(format!("{} Shares", stats.num_of_shares))),
                        ),
                ),
        )
}

/// Add `delta` to the `index`-th counter of `card`
fn bump_counter(page: &mut MockPage, card: NodeId, index: usize, delta: i64, unit: &str) {
    let Some(counter) = page
        .dom
        .find(".orangehrm-buzz-stats-row p", Some(card))
        .ok()
        .and_then(|found| found.get(index).copied())
    else {
        return;
    };
    let text = page.dom.text_content(counter);
    let current: i64 = text.split_whitespace().next().and_then(|n| n.parse().ok()).unwrap_or(0);
    page.dom.set_text(counter, format!("{} {unit}", (current + delta).max(0)));
}

fn toggle_like(page: &mut MockPage, target: NodeId, id: u64) {
    let Some(heart) = closest(&page.dom, target, selectors::LIKE_BUTTON) else {
        return;
    };
    let liked = page.dom.node(heart).is_some_and(|n| n.checked);
    let method = if liked { HttpMethod::Delete } else { HttpMethod::Post };
    match page.fetch(method, &api::share_likes(id), None) {
        Some(response) if response.status == 200 => {
            page.dom.set_checked(heart, !liked);
            if let Some(card) = closest(&page.dom, heart, selectors::BUZZ_POST) {
                bump_counter(page, card, 0, if liked { -1 } else { 1 }, "Likes");
            }
        }
        Some(_) => show_toast(page, "error", "Error", UNEXPECTED),
        None => network_failure(page),
    }
}

fn open_comment_box(page: &mut MockPage, target: NodeId, id: u64) {
    let Some(card) = closest(&page.dom, target, selectors::BUZZ_POST) else {
        return;
    };
    if first_in(&page.dom, selectors::COMMENT_INPUT, card).is_some() {
        return;
    }
    let _ = page.dom.append(
        card,
        MockNode::el("div.orangehrm-buzz-comment-add").child(
            MockNode::el("input.oxd-input")
                .attr("placeholder", "Write your comment...")
                .on_key(move |page, input, key| post_comment(page, input, key, id)),
        ),
    );
}

fn post_comment(page: &mut MockPage, input: NodeId, key: Key, id: u64) {
    let text = page.dom.value_of(input);
    if key != Key::Enter || text.trim().is_empty() {
        return;
    }
    let body = json!({ "text": text }).to_string().into_bytes();
    match page.fetch(HttpMethod::Post, &api::share_comments(id), Some(body)) {
        Some(response) if response.status == 200 => {
            page.dom.set_value(input, "");
            if let Some(card) = closest(&page.dom, input, selectors::BUZZ_POST) {
                bump_counter(page, card, 1, 1, "Comments");
            }
        }
        Some(_) => show_toast(page, "error", "Error", UNEXPECTED),
        None => network_failure(page),
    }
}

// My Info

fn text_of(details: &Value, key: &str) -> String {
    details[key].as_str().unwrap_or_default().to_string()
}

fn label_wrapper(label: &str) -> MockNode {
    MockNode::el("div.oxd-input-group__label-wrapper").child(MockNode::el("label.oxd-label").text(label))
}

fn name_group(name: &str, value: String) -> MockNode {
    MockNode::el("div.oxd-input-group").child(
        MockNode::el("div.oxd-input-group__main")
            .child(MockNode::el("input.oxd-input").attr("name", name).value(value)),
    )
}

fn text_group(label: &str, value: String) -> MockNode {
    MockNode::el("div.oxd-input-group")
        .child(label_wrapper(label))
        .child(MockNode::el("div").child(MockNode::el("input.oxd-input").value(value)))
}

fn date_group(label: &str, value: String) -> MockNode {
    MockNode::el("div.oxd-input-group").child(label_wrapper(label)).child(
        MockNode::el("div").child(
            MockNode::el("div.oxd-date-wrapper").child(
                MockNode::el("div.oxd-date-input")
                    .child(
                        MockNode::el("input.oxd-input")
                            .attr("placeholder", "yyyy-mm-dd")
                            .value(value)
                            .on_input(open_calendar),
                    )
                    .child(MockNode::el("i.oxd-icon.bi-calendar.oxd-date-input-icon")),
            ),
        ),
    )
}

fn open_calendar(page: &mut MockPage, input: NodeId) {
    if page.dom.first(selectors::CALENDAR_CONTAINER).is_some() {
        return;
    }
    let Some(wrapper) = closest(&page.dom, input, ".oxd-date-wrapper") else {
        return;
    };
    let link = |text: &str| MockNode::el("div.oxd-date-input-link").text(text);
    let _ = page.dom.append(
        wrapper,
        MockNode::el("div.oxd-date-input-calendar")
            .child(MockNode::el("div.oxd-calendar-wrapper").child(MockNode::el("ul.oxd-calendar-dates-grid")))
            .child(
                MockNode::el("div.oxd-date-input-links")
                    .child(link("Today"))
                    .child(link("Clear"))
                    .child(link("Close").on_click(|page, target| {
                        if let Some(calendar) = closest(&page.dom, target, selectors::CALENDAR_CONTAINER) {
                            page.dom.remove(calendar);
                        }
                    })),
            ),
    );
}

fn select_group(label: &str, selected: &str, choices: &'static [&'static str]) -> MockNode {
    MockNode::el("div.oxd-input-group").child(label_wrapper(label)).child(
        MockNode::el("div").child(
            MockNode::el("div.oxd-select-wrapper").child(
                MockNode::el("div.oxd-select-text")
                    .attr("tabindex", "0")
                    .on_click(move |page, target| open_options(page, target, choices))
                    .child(MockNode::el("div.oxd-select-text-input").text(selected))
                    .child(MockNode::el("div.oxd-select-text--after").child(MockNode::el("i.oxd-icon.bi-caret-down-fill"))),
            ),
        ),
    )
}

fn open_options(page: &mut MockPage, target: NodeId, choices: &'static [&'static str]) {
    let Some(trigger) = closest(&page.dom, target, selectors::GROUP_SELECT) else {
        return;
    };
    if let Some(open) = page.dom.first(selectors::SELECT_DROPDOWN) {
        page.dom.remove(open);
    }
    let options = std::iter::once(PLACEHOLDER).chain(choices.iter().copied()).map(|choice| {
        MockNode::el("div.oxd-select-option")
            .attr("role", "option")
            .child(MockNode::el("span").text(choice))
            .on_click(move |page, _| {
                if let Some(text) = first_in(&page.dom, ".oxd-select-text-input", trigger) {
                    page.dom.set_text(text, choice);
                }
                if let Some(panel) = page.dom.first(selectors::SELECT_DROPDOWN) {
                    page.dom.remove(panel);
                }
            })
    });
    let body = page.dom.body();
    let _ = page
        .dom
        .append(body, MockNode::el("div.oxd-select-dropdown").attr("role", "listbox").children(options));
}

fn radio(label: &str, code: u64, checked: bool) -> MockNode {
    MockNode::el("div.oxd-radio-wrapper")
        .on_click(|page, target| {
            let Some(wrapper) = closest(&page.dom, target, selectors::RADIO_WRAPPER) else {
                return;
            };
            let Some(input) = first_in(&page.dom, selectors::RADIO_INPUT, wrapper) else {
                return;
            };
            for other in page.dom.find(selectors::RADIO_INPUT, None).unwrap_or_default() {
                page.dom.set_checked(other, false);
            }
            page.dom.set_checked(input, true);
        })
        .child(
            MockNode::el("label").text(label).child(
                MockNode::el("input")
                    .attr("type", "radio")
                    .attr("name", "gender")
                    .attr("value", &code.to_string())
                    .checked(checked),
            )
            .child(MockNode::el("span.oxd-radio-input")),
        )
}

fn render_my_info(page: &mut MockPage) {
    let details = page
        .fetch(HttpMethod::Get, &api::personal_details(EMP_NUMBER), None)
        .filter(|r| r.status == 200)
        .and_then(|r| r.body_json::<Value>().ok())
        .map(|v| v["data"].clone())
        .unwrap_or(Value::Null);
    let _ = page.dom.set_body(shell("PIM", my_info_content(&details)));
}

fn my_info_content(d: &Value) -> MockNode {
    let nationality_names: &'static [&'static str] = &["American", "Brazilian", "Canadian", "Cuban", "Vietnamese"];
    let gender = d["gender"].as_u64();
    let personal = MockNode::el("form.oxd-form")
        .child(MockNode::el("div.orangehrm-employee-name").children([
            name_group("firstName", text_of(d, "firstName")),
            name_group("middleName", text_of(d, "middleName")),
            name_group("lastName", text_of(d, "lastName")),
        ]))
        .children([
            text_group("Employee Id", text_of(d, "employeeId")),
            text_group("Other Id", text_of(d, "otherId")),
            text_group("Driver's License Number", text_of(d, "drivingLicenseNo")),
            date_group("License Expiry Date", text_of(d, "drivingLicenseExpiredDate")),
            select_group(
                "Nationality",
                d["nationality"]["name"].as_str().unwrap_or(PLACEHOLDER),
                nationality_names,
            ),
            select_group(
                "Marital Status",
                d["maritalStatus"].as_str().unwrap_or(PLACEHOLDER),
                MARITAL_STATUSES,
            ),
            date_group("Date of Birth", text_of(d, "birthday")),
            MockNode::el("div.oxd-input-group")
                .child(label_wrapper("Gender"))
                .child(MockNode::el("div").children([
                    radio("Male", 1, gender == Some(1)),
                    radio("Female", 2, gender == Some(2)),
                ])),
        ])
        .child(
            MockNode::el("button.oxd-button")
                .attr("type", "submit")
                .text("Save")
                .on_click(|page, _| save_details(page)),
        );
    let custom = MockNode::el("form.oxd-form")
        .child(select_group("Blood Type", PLACEHOLDER, BLOOD_TYPES))
        .child(MockNode::el("button.oxd-button").attr("type", "submit").text("Save"));
    MockNode::el("div.orangehrm-edit-employee-content").child(personal).child(custom)
}

/// Control matching `css` in the field group labelled `label`
fn labelled(dom: &MockDom, label: &str, css: &str) -> Option<NodeId> {
    let label_node = dom
        .find(selectors::LABEL, None)
        .ok()?
        .into_iter()
        .find(|&n| dom.text_content(n).contains(label))?;
    let group = closest(dom, label_node, selectors::INPUT_GROUP)?;
    first_in(dom, css, group)
}

fn optional(value: String) -> Value {
    if value.trim().is_empty() || value == PLACEHOLDER {
        Value::Null
    } else {
        Value::String(value)
    }
}

fn mark_required(page: &mut MockPage, css: &str, missing: bool) {
    let Some(group) = page
        .dom
        .first(css)
        .and_then(|input| closest(&page.dom, input, selectors::INPUT_GROUP))
    else {
        return;
    };
    let existing = page.dom.find(selectors::INPUT_GROUP_MESSAGE, Some(group)).unwrap_or_default();
    match (missing, existing.is_empty()) {
        (true, true) => {
            let _ = page.dom.append(
                group,
                MockNode::el("span.oxd-text.oxd-input-field-error-message.oxd-input-group__message").text("Required"),
            );
        }
        (false, false) => existing.into_iter().for_each(|m| page.dom.remove(m)),
        _ => {}
    }
}

fn save_details(page: &mut MockPage) {
    let dom = &page.dom;
    let value = |css: &str| dom.first(css).map(|n| dom.value_of(n)).unwrap_or_default();
    let labelled_value = |label: &str| labelled(dom, label, "input").map(|n| dom.value_of(n)).unwrap_or_default();
    let selected = |label: &str| {
        labelled(dom, label, ".oxd-select-text-input")
            .map(|n| dom.text_content(n))
            .unwrap_or_default()
    };

    let first = value(selectors::FIRST_NAME_INPUT);
    let last = value(selectors::LAST_NAME_INPUT);
    let nationality = selected("Nationality");
    let gender = dom
        .find(selectors::RADIO_INPUT, None)
        .unwrap_or_default()
        .into_iter()
        .find(|&n| dom.node(n).is_some_and(|node| node.checked))
        .and_then(|n| dom.node(n).and_then(|node| node.attrs.get("value").cloned()))
        .and_then(|v| v.parse::<u64>().ok());
    let body = json!({
        "firstName": first,
        "middleName": value(selectors::MIDDLE_NAME_INPUT),
        "lastName": last,
        "employeeId": labelled_value("Employee Id"),
        "otherId": labelled_value("Other Id"),
        "drivingLicenseNo": labelled_value("Driver's License Number"),
        "drivingLicenseExpiredDate": optional(labelled_value("License Expiry Date")),
        "birthday": optional(labelled_value("Date of Birth")),
        "gender": gender,
        "maritalStatus": optional(selected("Marital Status")),
        "nationalityId": NATIONALITIES.iter().find(|(_, name)| *name == nationality).map(|(id, _)| *id),
    });

    let first_missing = first.trim().is_empty();
    let last_missing = last.trim().is_empty();
    mark_required(page, selectors::FIRST_NAME_INPUT, first_missing);
    mark_required(page, selectors::LAST_NAME_INPUT, last_missing);
    if first_missing || last_missing {
        return;
    }

    let url = api::personal_details(EMP_NUMBER);
    match page.fetch(HttpMethod::Put, &url, Some(body.to_string().into_bytes())) {
        Some(response) if response.status == 200 => show_toast(page, "success", "Success", "Successfully Updated"),
        Some(_) => show_toast(page, "error", "Error", UNEXPECTED),
        None => network_failure(page),
    }
}
