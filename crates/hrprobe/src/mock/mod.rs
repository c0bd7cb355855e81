//! In-memory driver for tests.
//!
//! A [`MockDriver`] holds one [`MockPage`]: a DOM arena, the current URL, a
//! network layer with intercepts and a fallback backend, and the page error
//! buffer. Pages are scripted: click, input and key behaviours mutate the
//! DOM and issue requests through [`MockPage::fetch`]. Navigations are
//! loaded as documents through the same network layer and rendered by a
//! router closure, so intercepts apply to document requests as well.

pub mod css;
pub mod dom;

pub use css::SelectorList;
pub use dom::{Behaviour, KeyBehaviour, MockDom, MockNode, Node, NodeId};

use crate::driver::{Driver, ElementHandle, Key};
use crate::locator::Selector;
use crate::network::{
    CapturedRequest, CapturedResponse, Exchange, ExchangeLog, HttpMethod, Intercept,
    InterceptTable, MockResponse, RouteAction,
};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Maximum navigations processed per action (redirect chains included)
const MAX_NAVIGATIONS: usize = 16;

/// Renders a loaded document into the page
pub type Router = Arc<dyn Fn(&mut MockPage, &str, Option<&CapturedResponse>) + Send + Sync>;

/// Answers requests no intercept stubbed
pub type Backend = Arc<dyn Fn(&CapturedRequest) -> MockResponse + Send + Sync>;

/// Network layer of a mock page
#[derive(Default)]
pub struct MockNetwork {
    /// Registered intercepts
    pub intercepts: InterceptTable,
    /// Exchanges recorded per alias
    pub log: ExchangeLog,
    /// Every request the page made, intercepted or not
    pub history: Vec<CapturedRequest>,
    backend: Option<Backend>,
}

impl std::fmt::Debug for MockNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockNetwork")
            .field("intercepts", &self.intercepts)
            .field("log", &self.log)
            .field("history", &self.history.len())
            .finish()
    }
}

/// Page state behind a [`MockDriver`]
#[derive(Default)]
pub struct MockPage {
    /// The document
    pub dom: MockDom,
    /// Current URL
    pub url: String,
    /// Network layer
    pub network: MockNetwork,
    /// Uncaught errors not yet drained
    pub page_errors: Vec<String>,
    /// Focused element
    pub focused: Option<NodeId>,
    pending_navigation: Option<String>,
    router: Option<Router>,
}

impl std::fmt::Debug for MockPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPage")
            .field("url", &self.url)
            .field("network", &self.network)
            .field("page_errors", &self.page_errors)
            .finish()
    }
}

impl MockPage {
    /// `scheme://host` of the current URL
    #[must_use]
    pub fn origin(&self) -> &str {
        let Some(scheme_end) = self.url.find("://") else {
            return "";
        };
        let host_start = scheme_end + 3;
        match self.url[host_start..].find('/') {
            Some(i) => &self.url[..host_start + i],
            None => &self.url,
        }
    }

    /// Resolve a path against the current origin
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}/{}", self.origin(), url.trim_start_matches('/'))
        }
    }

    /// Path and query of the current URL
    #[must_use]
    pub fn path(&self) -> &str {
        let origin_len = self.origin().len();
        &self.url[origin_len..]
    }

    /// Schedule a navigation, processed once the current action returns
    pub fn navigate(&mut self, url: &str) {
        self.pending_navigation = Some(self.resolve_url(url));
    }

    /// Record an uncaught page error
    pub fn push_page_error(&mut self, message: impl Into<String>) {
        self.page_errors.push(message.into());
    }

    /// Issue a request from the page.
    ///
    /// Returns `None` when the request failed at the transport level.
    pub fn fetch(
        &mut self,
        method: HttpMethod,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Option<CapturedResponse> {
        let url = self.resolve_url(url);
        let mut request = CapturedRequest::new(method, &url);
        request.body = body;
        self.network.history.push(request.clone());

        let resolution = self.network.intercepts.resolve(method, &url);
        let intercepted = resolution.is_intercepted();
        let response = match resolution.action {
            RouteAction::ForceNetworkError => None,
            RouteAction::Respond(stub) => Some(stub.into_captured()),
            RouteAction::Observe => Some(self.backend_response(&request)),
        };
        tracing::trace!(%method, %url, intercepted, "mock fetch");

        if intercepted {
            let exchange = match &response {
                Some(r) => Exchange::completed(request, r.clone()),
                None => Exchange::failed(request),
            };
            let _ = self.network.log.record(&resolution.aliases, exchange);
        }
        response
    }

    fn backend_response(&self, request: &CapturedRequest) -> CapturedResponse {
        match &self.network.backend {
            Some(backend) => backend(request).into_captured(),
            None => MockResponse::new().with_status(404).into_captured(),
        }
    }

    /// Load pending navigations, following document redirects
    pub fn settle(&mut self) {
        for _ in 0..MAX_NAVIGATIONS {
            let Some(url) = self.pending_navigation.take() else {
                return;
            };
            self.url = url.clone();
            self.focused = None;
            self.dom = MockDom::new();
            let response = self.fetch(HttpMethod::Get, &url, None);

            let redirect = response.as_ref().and_then(|r| {
                (300..400)
                    .contains(&r.status)
                    .then(|| r.header("location").map(str::to_string))
                    .flatten()
            });
            if let Some(location) = redirect {
                self.navigate(&location);
                continue;
            }
            if let Some(router) = self.router.clone() {
                router(self, &url, response.as_ref());
            }
        }
        if self.pending_navigation.take().is_some() {
            self.push_page_error("navigation loop aborted");
        }
    }

    fn node_of(&self, handle: &ElementHandle) -> ProbeResult<NodeId> {
        handle
            .id
            .strip_prefix('n')
            .and_then(|raw| raw.parse::<NodeId>().ok())
            .filter(|&id| self.dom.node(id).is_some())
            .ok_or_else(|| ProbeError::not_found(format!("attached element {handle}")))
    }

    fn handle(&self, id: NodeId) -> ElementHandle {
        let tag = self.dom.node(id).map(|n| n.tag.clone()).unwrap_or_default();
        ElementHandle::new(format!("n{id}"), tag)
    }

    fn dispatch_click(&mut self, target: NodeId) {
        let mut chain = vec![target];
        chain.extend(self.dom.ancestors(target));
        for node in chain {
            if let Some(behaviour) = self.dom.node(node).and_then(|n| n.on_click.clone()) {
                behaviour.call(self, target);
            }
        }
    }

    fn dispatch_key(&mut self, target: NodeId, key: Key) {
        let mut chain = vec![target];
        chain.extend(self.dom.ancestors(target));
        for node in chain {
            if let Some(behaviour) = self.dom.node(node).and_then(|n| n.on_key.clone()) {
                behaviour.call(self, target, key);
            }
        }
    }

    fn dispatch_input(&mut self, target: NodeId) {
        if let Some(behaviour) = self.dom.node(target).and_then(|n| n.on_input.clone()) {
            behaviour.call(self, target);
        }
    }

    fn query(&self, selector: &Selector, scope: Option<NodeId>) -> ProbeResult<Vec<NodeId>> {
        Ok(match selector {
            Selector::Css(css) => self.dom.find(css, scope)?,
            Selector::Text(text) => self.dom.deepest_containing(text, scope),
            Selector::ExactText(text) => self.dom.deepest_with_exact_text(text, scope),
            Selector::CssWithText { css, text } => self
                .dom
                .find(css, scope)?
                .into_iter()
                .filter(|&n| self.dom.text_content(n).contains(text.as_str()))
                .collect(),
        })
    }

    fn require_visible(&self, id: NodeId, handle: &ElementHandle) -> ProbeResult<()> {
        if self.dom.is_visible(id) {
            Ok(())
        } else {
            Err(ProbeError::invalid_state(format!("{handle} is not visible")))
        }
    }
}

/// In-memory driver
#[derive(Clone, Default)]
pub struct MockDriver {
    page: Arc<Mutex<MockPage>>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver").finish_non_exhaustive()
    }
}

impl MockDriver {
    /// Blank page with no router or backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Static page with the given body content
    #[must_use]
    pub fn with_body(content: MockNode) -> Self {
        let driver = Self::new();
        if let Ok(mut page) = driver.page.lock() {
            let _ = page.dom.set_body(content);
        }
        driver
    }

    /// Install the document router
    pub fn set_router<F>(&self, router: F) -> ProbeResult<()>
    where
        F: Fn(&mut MockPage, &str, Option<&CapturedResponse>) + Send + Sync + 'static,
    {
        self.with_page(|page| page.router = Some(Arc::new(router)))
    }

    /// Install the fallback backend
    pub fn set_backend<F>(&self, backend: F) -> ProbeResult<()>
    where
        F: Fn(&CapturedRequest) -> MockResponse + Send + Sync + 'static,
    {
        self.with_page(|page| page.network.backend = Some(Arc::new(backend)))
    }

    /// Run `f` with exclusive access to the page
    pub fn with_page<R>(&self, f: impl FnOnce(&mut MockPage) -> R) -> ProbeResult<R> {
        let mut page = self
            .page
            .lock()
            .map_err(|_| ProbeError::driver("mock page lock poisoned"))?;
        Ok(f(&mut page))
    }

    /// Run `f` on the page, then process navigations it scheduled
    pub fn act<R>(&self, f: impl FnOnce(&mut MockPage) -> ProbeResult<R>) -> ProbeResult<R> {
        self.with_page(|page| {
            let out = f(page);
            page.settle();
            out
        })?
    }

    /// Every request the page made so far
    pub fn requests(&self) -> ProbeResult<Vec<CapturedRequest>> {
        self.with_page(|page| page.network.history.clone())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.act(|page| {
            page.navigate(url);
            Ok(())
        })
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.act(|page| {
            let url = page.url.clone();
            page.navigate(&url);
            Ok(())
        })
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.with_page(|page| page.url.clone())
    }

    async fn query_all(
        &self,
        selector: &Selector,
        scope: Option<&ElementHandle>,
    ) -> ProbeResult<Vec<ElementHandle>> {
        self.with_page(|page| {
            let scope = scope.map(|s| page.node_of(s)).transpose()?;
            let found = page.query(selector, scope)?;
            Ok(found.into_iter().map(|n| page.handle(n)).collect())
        })?
    }

    async fn ancestor(
        &self,
        element: &ElementHandle,
        css: &str,
    ) -> ProbeResult<Option<ElementHandle>> {
        self.with_page(|page| {
            let id = page.node_of(element)?;
            let list = SelectorList::parse(css)?;
            Ok(page
                .dom
                .ancestors(id)
                .into_iter()
                .find(|&a| list.matches(&page.dom, a))
                .map(|a| page.handle(a)))
        })?
    }

    async fn parent(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>> {
        self.with_page(|page| {
            let id = page.node_of(element)?;
            Ok(page
                .dom
                .node(id)
                .and_then(|n| n.parent)
                .map(|p| page.handle(p)))
        })?
    }

    async fn siblings(
        &self,
        element: &ElementHandle,
        css: &str,
    ) -> ProbeResult<Vec<ElementHandle>> {
        self.with_page(|page| {
            let id = page.node_of(element)?;
            let list = SelectorList::parse(css)?;
            let Some(parent) = page.dom.node(id).and_then(|n| n.parent) else {
                return Ok(Vec::new());
            };
            let children = page
                .dom
                .node(parent)
                .map(|n| n.children.clone())
                .unwrap_or_default();
            Ok(children
                .into_iter()
                .filter(|&c| c != id && list.matches(&page.dom, c))
                .map(|c| page.handle(c))
                .collect())
        })?
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.with_page(|page| Ok(page.dom.text_content(page.node_of(element)?)))?
    }

    async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
        self.with_page(|page| Ok(page.dom.value_of(page.node_of(element)?)))?
    }

    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        self.with_page(|page| Ok(page.dom.is_visible(page.node_of(element)?)))?
    }

    async fn is_checked(&self, element: &ElementHandle) -> ProbeResult<bool> {
        self.with_page(|page| {
            let id = page.node_of(element)?;
            Ok(page.dom.node(id).is_some_and(|n| n.checked))
        })?
    }

    async fn click(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.act(|page| {
            let id = page.node_of(element)?;
            page.require_visible(id, element)?;
            page.focused = Some(id);
            page.dispatch_click(id);
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        self.act(|page| {
            let id = page.node_of(element)?;
            page.require_visible(id, element)?;
            page.focused = Some(id);
            page.dom.set_value(id, "");
            page.dispatch_input(id);
            Ok(())
        })
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.act(|page| {
            let id = page.node_of(element)?;
            page.require_visible(id, element)?;
            page.focused = Some(id);
            let value = format!("{}{text}", page.dom.value_of(id));
            page.dom.set_value(id, value);
            page.dispatch_input(id);
            Ok(())
        })
    }

    async fn press_key(&self, element: &ElementHandle, key: Key) -> ProbeResult<()> {
        self.act(|page| {
            let id = page.node_of(element)?;
            page.focused = Some(id);
            page.dispatch_key(id, key);
            Ok(())
        })
    }

    async fn intercept(&self, intercept: Intercept) -> ProbeResult<()> {
        self.with_page(|page| page.network.intercepts.register(intercept))
    }

    async fn clear_intercepts(&self) -> ProbeResult<()> {
        self.with_page(|page| {
            page.network.intercepts.clear();
            page.network.log.clear();
        })
    }

    async fn exchanges(&self, alias: &str) -> ProbeResult<Vec<Exchange>> {
        self.with_page(|page| page.network.log.for_alias(alias))
    }

    async fn take_page_errors(&self) -> ProbeResult<Vec<String>> {
        self.with_page(|page| std::mem::take(&mut page.page_errors))
    }
}
