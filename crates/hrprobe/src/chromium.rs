//! Real browser driver over the Chrome DevTools Protocol.
//!
//! DOM access goes through page-side JavaScript: every element handed out is
//! registered in `window.__hrprobe` under a generated id, so a navigation
//! invalidates all handles at once. Requests are paused in the Fetch domain
//! and resolved against the intercept table; responses of observed requests
//! (redirects included) are filled in from Network domain events.

use crate::driver::{Driver, DriverConfig, ElementHandle, Key};
use crate::locator::Selector;
use crate::network::{
    CapturedRequest, CapturedResponse, Exchange, ExchangeLog, HttpMethod, Intercept,
    InterceptTable, RouteAction,
};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, ContinueRequestParams, EventRequestPaused, FailRequestParams, FulfillRequestParams,
    HeaderEntry, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, InsertTextParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self as cdp_network, ErrorReason, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent, EventResponseReceived, GetResponseBodyParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventExceptionThrown;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

const REGISTRY: &str =
    "(window.__hrprobe || (window.__hrprobe = { next: 0, els: new Map() }))";

/// Exchanges and page errors collected by the event tasks
#[derive(Debug, Default)]
struct PageState {
    intercepts: InterceptTable,
    log: ExchangeLog,
    /// Network request id to log index of the exchange awaiting a response
    pending: HashMap<String, usize>,
    page_errors: Vec<String>,
}

type SharedState = Arc<Mutex<PageState>>;

fn lock(state: &SharedState) -> ProbeResult<std::sync::MutexGuard<'_, PageState>> {
    state
        .lock()
        .map_err(|_| ProbeError::driver("page state lock poisoned"))
}

fn cdp_error(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::driver(e.to_string())
}

fn headers_of(headers: &cdp_network::Headers) -> HashMap<String, String> {
    headers
        .inner()
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(k, v)| {
                    let value = v.as_str().map_or_else(|| v.to_string(), str::to_string);
                    (k.to_lowercase(), value)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn captured_response(response: &cdp_network::Response) -> CapturedResponse {
    CapturedResponse {
        status: u16::try_from(response.status).unwrap_or_default(),
        headers: headers_of(&response.headers),
        body: Vec::new(),
    }
}

/// Chromium-backed [`Driver`]
pub struct ChromiumDriver {
    browser: Arc<tokio::sync::Mutex<Browser>>,
    page: Page,
    state: SharedState,
    tasks: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    /// Launch a browser and open one page with request interception enabled
    pub async fn launch(config: &DriverConfig) -> ProbeResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .request_timeout(config.navigation_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable_path {
            builder = builder.chrome_executable(path);
        }
        if let Some(ua) = &config.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }
        let cdp_config = builder.build().map_err(cdp_error)?;

        let (browser, mut handler) = Browser::launch(cdp_config).await.map_err(cdp_error)?;
        let mut tasks = vec![tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        })];

        let page = browser.new_page("about:blank").await.map_err(cdp_error)?;
        let state = SharedState::default();
        tasks.extend(Self::listen(&page, &state).await?);

        page.execute(cdp_network::EnableParams::default())
            .await
            .map_err(cdp_error)?;
        let pattern = RequestPattern::builder()
            .url_pattern("*")
            .request_stage(RequestStage::Request)
            .build();
        page.execute(fetch::EnableParams::builder().pattern(pattern).build())
            .await
            .map_err(cdp_error)?;

        tracing::info!(headless = config.headless, "chromium launched");
        Ok(Self {
            browser: Arc::new(tokio::sync::Mutex::new(browser)),
            page,
            state,
            tasks,
        })
    }

    /// Close the browser
    pub async fn close(self) -> ProbeResult<()> {
        for task in &self.tasks {
            task.abort();
        }
        let mut browser = self.browser.lock().await;
        let _ = browser.close().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn listen(page: &Page, state: &SharedState) -> ProbeResult<Vec<JoinHandle<()>>> {
        let mut paused = page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(cdp_error)?;
        let mut redirected = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(cdp_error)?;
        let mut responded = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(cdp_error)?;
        let mut finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(cdp_error)?;
        let mut failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(cdp_error)?;
        let mut exceptions = page
            .event_listener::<EventExceptionThrown>()
            .await
            .map_err(cdp_error)?;

        let mut tasks = Vec::new();

        let (p, s) = (page.clone(), state.clone());
        tasks.push(tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                if let Err(e) = on_request_paused(&p, &s, &event).await {
                    tracing::warn!(error = %e, "request interception failed");
                }
            }
        }));

        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = redirected.next().await {
                if let Some(redirect) = &event.redirect_response {
                    settle(&s, event.request_id.as_ref(), |exchange| {
                        exchange.response = Some(captured_response(redirect));
                    });
                }
            }
        }));

        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = responded.next().await {
                update(&s, event.request_id.as_ref(), |exchange| {
                    exchange.response = Some(captured_response(&event.response));
                });
            }
        }));

        let (p, s) = (page.clone(), state.clone());
        tasks.push(tokio::spawn(async move {
            while let Some(event) = finished.next().await {
                let id = event.request_id.as_ref().to_string();
                let waiting = lock(&s).is_ok_and(|st| st.pending.contains_key(&id));
                if !waiting {
                    continue;
                }
                let body = p
                    .execute(GetResponseBodyParams::new(event.request_id.clone()))
                    .await
                    .ok()
                    .map(|r| {
                        if r.result.base64_encoded {
                            base64::engine::general_purpose::STANDARD
                                .decode(&r.result.body)
                                .unwrap_or_default()
                        } else {
                            r.result.body.clone().into_bytes()
                        }
                    })
                    .unwrap_or_default();
                settle(&s, &id, |exchange| {
                    if let Some(response) = exchange.response.as_mut() {
                        response.body = body;
                    }
                });
            }
        }));

        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = failed.next().await {
                tracing::debug!(error = %event.error_text, "loading failed");
                settle(&s, event.request_id.as_ref(), |exchange| {
                    exchange.response = None;
                    exchange.network_error = true;
                });
            }
        }));

        let s = state.clone();
        tasks.push(tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                if let Ok(mut st) = lock(&s) {
                    st.page_errors.push(message);
                }
            }
        }));

        Ok(tasks)
    }

    async fn eval(&self, expression: String) -> ProbeResult<serde_json::Value> {
        self.page
            .evaluate(expression)
            .await
            .map_err(cdp_error)?
            .into_value::<serde_json::Value>()
            .map_err(cdp_error)
    }

    /// Evaluate `body` with `el` bound to the registered element
    async fn on_element(&self, element: &ElementHandle, body: &str) -> ProbeResult<serde_json::Value> {
        let expression = format!(
            "(() => {{ const el = {REGISTRY}.els.get({id:?}); \
             if (!el || !el.isConnected) return {{ missing: true }}; \
             return {{ value: (() => {{ {body} }})() }}; }})()",
            id = element.id
        );
        let result = self.eval(expression).await?;
        if result.get("missing").and_then(serde_json::Value::as_bool) == Some(true) {
            return Err(ProbeError::not_found(format!("attached element {element}")));
        }
        Ok(result.get("value").cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate `query` (an array expression) and register its elements
    async fn register(&self, scope: Option<&ElementHandle>, query: &str) -> ProbeResult<Vec<ElementHandle>> {
        let root = match scope {
            Some(el) => format!("{REGISTRY}.els.get({:?})", el.id),
            None => "document".to_string(),
        };
        let expression = format!(
            "(() => {{ const reg = {REGISTRY}; const root = {root}; \
             if (!root || (root !== document && !root.isConnected)) return null; \
             const found = (root => {query})(root); \
             return found.filter(Boolean).map(el => {{ \
               let id = el.__hrprobeId; \
               if (!id || !reg.els.has(id)) {{ id = 'e' + (reg.next++); el.__hrprobeId = id; reg.els.set(id, el); }} \
               return {{ id, tag: el.tagName.toLowerCase() }}; }}); }})()"
        );
        let result = self.eval(expression).await?;
        let Some(items) = result.as_array() else {
            let what = scope.map_or_else(|| "document".to_string(), ToString::to_string);
            return Err(ProbeError::not_found(format!("attached element {what}")));
        };
        Ok(items
            .iter()
            .filter_map(|item| {
                Some(ElementHandle::new(
                    item.get("id")?.as_str()?,
                    item.get("tag")?.as_str()?,
                ))
            })
            .collect())
    }

    async fn require_visible(&self, element: &ElementHandle) -> ProbeResult<()> {
        if self.is_visible(element).await? {
            Ok(())
        } else {
            Err(ProbeError::invalid_state(format!("{element} is not visible")))
        }
    }

    async fn set_value(&self, element: &ElementHandle, value: &str) -> ProbeResult<()> {
        let body = format!(
            "el.focus(); \
             const proto = Object.getPrototypeOf(el); \
             const setter = Object.getOwnPropertyDescriptor(proto, 'value'); \
             if (setter && setter.set) {{ setter.set.call(el, {value:?}); }} else {{ el.value = {value:?}; }} \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             return true;"
        );
        let _ = self.on_element(element, &body).await?;
        Ok(())
    }

    async fn key_event(&self, down: bool, key: Key) -> ProbeResult<()> {
        let kind = if down {
            DispatchKeyEventType::KeyDown
        } else {
            DispatchKeyEventType::KeyUp
        };
        let mut builder = DispatchKeyEventParams::builder()
            .r#type(kind)
            .key(key.as_str())
            .code(key.as_str())
            .windows_virtual_key_code(key.key_code());
        // keypress, and with it form submission, needs text on key down
        if down && key == Key::Enter {
            builder = builder.text("\r");
        }
        let params = builder.build().map_err(cdp_error)?;
        let _ = self.page.execute(params).await.map_err(cdp_error)?;
        Ok(())
    }
}

fn method_of(raw: &str) -> HttpMethod {
    HttpMethod::parse(raw)
}

async fn on_request_paused(page: &Page, state: &SharedState, event: &EventRequestPaused) -> ProbeResult<()> {
    let request = &event.request;
    let method = method_of(&request.method);
    let mut captured = CapturedRequest::new(method, &request.url);
    captured.headers = headers_of(&request.headers);
    captured.body = request.post_data.clone().map(String::into_bytes);

    let resolution = lock(state)?.intercepts.resolve(method, &request.url);
    tracing::trace!(%method, url = %request.url, intercepted = resolution.is_intercepted(), "request paused");

    let exchange = match &resolution.action {
        RouteAction::ForceNetworkError => {
            page.execute(FailRequestParams::new(event.request_id.clone(), ErrorReason::Failed))
                .await
                .map_err(cdp_error)?;
            Exchange::failed(captured)
        }
        RouteAction::Respond(stub) => {
            let headers = stub
                .headers
                .iter()
                .map(|(k, v)| HeaderEntry::new(k.clone(), v.clone()))
                .collect::<Vec<_>>();
            let params = FulfillRequestParams::builder()
                .request_id(event.request_id.clone())
                .response_code(i64::from(stub.status))
                .response_headers(headers)
                .body(base64::engine::general_purpose::STANDARD.encode(&stub.body))
                .build()
                .map_err(cdp_error)?;
            page.execute(params).await.map_err(cdp_error)?;
            Exchange::completed(captured, stub.clone().into_captured())
        }
        RouteAction::Observe => {
            page.execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
                .map_err(cdp_error)?;
            Exchange::pending(captured)
        }
    };

    if resolution.is_intercepted() {
        let settled = exchange.is_settled();
        let mut st = lock(state)?;
        let index = st.log.record(&resolution.aliases, exchange);
        if let (false, Some(network_id)) = (settled, &event.network_id) {
            let _ = st.pending.insert(network_id.as_ref().to_string(), index);
        }
    }
    Ok(())
}

/// Apply `f` to the pending exchange of `request_id`
fn update(state: &SharedState, request_id: &str, f: impl FnOnce(&mut Exchange)) {
    let Ok(mut st) = lock(state) else {
        return;
    };
    let Some(&index) = st.pending.get(request_id) else {
        return;
    };
    if let Some(mut exchange) = st.log.get(index).cloned() {
        f(&mut exchange);
        st.log.update(index, exchange);
    }
}

/// Apply `f`, then stop tracking `request_id`
fn settle(state: &SharedState, request_id: &str, f: impl FnOnce(&mut Exchange)) {
    update(state, request_id, |exchange| {
        f(exchange);
        if exchange.response.is_none() {
            exchange.network_error = true;
        }
    });
    if let Ok(mut st) = lock(state) {
        let _ = st.pending.remove(request_id);
    }
}

const VISIBLE_JS: &str = "const style = getComputedStyle(el); \
    return !!(el.offsetWidth || el.offsetHeight || el.getClientRects().length) \
      && style.visibility !== 'hidden' && style.display !== 'none';";

const CLICK_JS: &str = "el.scrollIntoView({ block: 'center' }); \
    for (const type of ['mousedown', 'mouseup', 'click']) { \
      el.dispatchEvent(new MouseEvent(type, { bubbles: true, cancelable: true, view: window })); \
    } \
    return true;";

#[async_trait]
impl Driver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        tracing::debug!(url, "navigate");
        let _ = self.page.goto(url).await.map_err(|e| ProbeError::NetworkError {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    async fn reload(&self) -> ProbeResult<()> {
        let _ = self.page.reload().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn query_all(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ProbeResult<Vec<ElementHandle>> {
        self.register(scope, &selector.to_query("root")).await
    }

    async fn ancestor(&self, element: &ElementHandle, css: &str) -> ProbeResult<Option<ElementHandle>> {
        // Fails with NotFound on a stale handle before querying.
        let _ = self.on_element(element, "return true;").await?;
        let query = format!(
            "[root.parentElement && root.parentElement.closest({css:?})]"
        );
        Ok(self.register(Some(element), &query).await?.into_iter().next())
    }

    async fn parent(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>> {
        Ok(self
            .register(Some(element), "[root.parentElement]")
            .await?
            .into_iter()
            .next())
    }

    async fn siblings(&self, element: &ElementHandle, css: &str) -> ProbeResult<Vec<ElementHandle>> {
        let query = format!(
            "(root.parentElement ? Array.from(root.parentElement.children) : []) \
             .filter(c => c !== root && c.matches({css:?}))"
        );
        self.register(Some(element), &query).await
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        let value = self.on_element(element, "return el.textContent || '';").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
        let value = self
            .on_element(element, "return el.value == null ? '' : String(el.value);")
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let value = self.on_element(element, VISIBLE_JS).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn is_checked(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let value = self.on_element(element, "return !!el.checked;").await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.require_visible(element).await?;
        let _ = self.on_element(element, CLICK_JS).await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.require_visible(element).await?;
        self.set_value(element, "").await
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.require_visible(element).await?;
        let _ = self.on_element(element, "el.focus(); return true;").await?;
        let _ = self
            .page
            .execute(InsertTextParams::new(text))
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn press_key(&self, element: &ElementHandle, key: Key) -> ProbeResult<()> {
        let _ = self.on_element(element, "el.focus(); return true;").await?;
        self.key_event(true, key).await?;
        self.key_event(false, key).await
    }

    async fn intercept(&self, intercept: Intercept) -> ProbeResult<()> {
        lock(&self.state)?.intercepts.register(intercept);
        Ok(())
    }

    async fn clear_intercepts(&self) -> ProbeResult<()> {
        let mut st = lock(&self.state)?;
        st.intercepts.clear();
        st.log.clear();
        st.pending.clear();
        Ok(())
    }

    async fn exchanges(&self, alias: &str) -> ProbeResult<Vec<Exchange>> {
        Ok(lock(&self.state)?.log.for_alias(alias))
    }

    async fn take_page_errors(&self) -> ProbeResult<Vec<String>> {
        Ok(std::mem::take(&mut lock(&self.state)?.page_errors))
    }
}
