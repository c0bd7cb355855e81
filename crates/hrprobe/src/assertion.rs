//! Assertions for test validation.
//!
//! [`Assertion`] produces pass/fail [`AssertionResult`]s for plain values.
//! The `expect_*` functions poll the page until the expectation holds or
//! the wait elapses.

use crate::driver::{Driver, ElementHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{retry, Exhausted, WaitOptions};
use std::fmt::Debug;

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Convert into a result; failures become Mismatch on `what`
    pub fn into_result(self, what: &str) -> ProbeResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(ProbeError::mismatch(what, "assertion to pass", self.message))
        }
    }
}

/// Assertion helpers for testing
#[derive(Debug, Clone, Copy)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{haystack}' to contain '{needle}'"))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert every top-level key of `expected` is present in `actual` with
    /// a deeply equal value
    #[must_use]
    pub fn deep_includes(actual: &serde_json::Value, expected: &serde_json::Value) -> AssertionResult {
        let (Some(actual), Some(expected)) = (actual.as_object(), expected.as_object()) else {
            return Self::equals(expected, actual);
        };
        let differing: Vec<String> = expected
            .iter()
            .filter(|(key, value)| actual.get(key.as_str()) != Some(*value))
            .map(|(key, value)| {
                let got = actual
                    .get(key.as_str())
                    .map_or_else(|| "<missing>".to_string(), ToString::to_string);
                format!("{key}: expected {value}, got {got}")
            })
            .collect();
        if differing.is_empty() {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(differing.join("; "))
        }
    }
}

/// Poll until some element matching `css` contains `text`
pub async fn expect_text_contains(
    driver: &dyn Driver,
    css: &str,
    text: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(css);
    let waited_for = format!("{css} to contain {text:?}");
    retry(options, &waited_for, Exhausted::LastError, || async {
        let found = driver.query_all(&selector, None).await?;
        let mut seen = Vec::new();
        for el in found {
            let actual = driver.text(&el).await?;
            if actual.contains(text) {
                return Ok(el);
            }
            seen.push(actual);
        }
        if seen.is_empty() {
            Err(ProbeError::not_found(css))
        } else {
            Err(ProbeError::mismatch(format!("text of {css}"), text, seen.join(" | ")))
        }
    })
    .await
}

/// Poll until an element matching `css` is visible
pub async fn expect_visible(
    driver: &dyn Driver,
    css: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    expect_visible_in(driver, None, &Selector::css(css), options).await
}

/// Poll until an element matching `selector` below `scope` is visible
pub async fn expect_visible_in(
    driver: &dyn Driver,
    scope: Option<&ElementHandle>,
    selector: &Selector,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let waited_for = format!("{selector} to be visible");
    retry(options, &waited_for, Exhausted::LastError, || async {
        let found = driver.query_all(selector, scope).await?;
        if found.is_empty() {
            return Err(ProbeError::not_found(selector.to_string()));
        }
        for el in found {
            if driver.is_visible(&el).await? {
                return Ok(el);
            }
        }
        Err(ProbeError::mismatch(
            format!("visibility of {selector}"),
            "visible",
            "hidden",
        ))
    })
    .await
}

/// Poll until nothing matches `css`
pub async fn expect_not_exists(
    driver: &dyn Driver,
    css: &str,
    options: &WaitOptions,
) -> ProbeResult<()> {
    expect_not_exists_in(driver, None, css, options).await
}

/// Poll until nothing below `scope` matches `css`
pub async fn expect_not_exists_in(
    driver: &dyn Driver,
    scope: Option<&ElementHandle>,
    css: &str,
    options: &WaitOptions,
) -> ProbeResult<()> {
    let selector = Selector::css(css);
    let waited_for = format!("{css} to not exist");
    retry(options, &waited_for, Exhausted::LastError, || async {
        let count = driver.query_all(&selector, scope).await?.len();
        if count == 0 {
            Ok(())
        } else {
            Err(ProbeError::mismatch(
                format!("count of {css}"),
                "0",
                count.to_string(),
            ))
        }
    })
    .await
}

/// Poll until `element` holds `expected` as its value
pub async fn expect_value(
    driver: &dyn Driver,
    element: &ElementHandle,
    expected: &str,
    options: &WaitOptions,
) -> ProbeResult<()> {
    let waited_for = format!("value of {element}");
    retry(options, &waited_for, Exhausted::LastError, || async {
        let actual = driver.value(element).await?;
        if actual == expected {
            Ok(())
        } else {
            Err(ProbeError::mismatch(format!("value of {element}"), expected, actual))
        }
    })
    .await
}

/// Poll until a checkbox or radio is checked
pub async fn expect_checked(
    driver: &dyn Driver,
    element: &ElementHandle,
    options: &WaitOptions,
) -> ProbeResult<()> {
    let waited_for = format!("{element} to be checked");
    retry(options, &waited_for, Exhausted::LastError, || async {
        if driver.is_checked(element).await? {
            Ok(())
        } else {
            Err(ProbeError::mismatch(
                format!("checked state of {element}"),
                "checked",
                "unchecked",
            ))
        }
    })
    .await
}

/// Poll until the current URL contains `fragment`
pub async fn expect_url_contains(
    driver: &dyn Driver,
    fragment: &str,
    options: &WaitOptions,
) -> ProbeResult<String> {
    let waited_for = format!("url to contain {fragment:?}");
    retry(options, &waited_for, Exhausted::LastError, || async {
        let url = driver.current_url().await?;
        if url.contains(fragment) {
            Ok(url)
        } else {
            Err(ProbeError::mismatch("url", fragment, url))
        }
    })
    .await
}

/// First element below `scope` containing `text`.
///
/// With `css`, the element itself must match `css`; without it, the deepest
/// element containing the text is taken.
pub async fn contains_text(
    driver: &dyn Driver,
    scope: Option<&ElementHandle>,
    css: Option<&str>,
    text: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = match css {
        Some(css) => Selector::css_with_text(css, text),
        None => Selector::text(text),
    };
    let waited_for = selector.to_string();
    retry(options, &waited_for, Exhausted::LastError, || async {
        driver
            .query_all(&selector, scope)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::not_found(selector.to_string()))
    })
    .await
}

/// The `index`-th element below `scope` matching `css`
pub async fn nth(
    driver: &dyn Driver,
    scope: Option<&ElementHandle>,
    css: &str,
    index: usize,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(css);
    let waited_for = format!("{css} #{index}");
    retry(options, &waited_for, Exhausted::LastError, || async {
        driver
            .query_all(&selector, scope)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| ProbeError::not_found(format!("{css} #{index}")))
    })
    .await
}
