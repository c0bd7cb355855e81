//! Conditional text input.
//!
//! Fields are always cleared; the value is typed only when it has visible
//! content, so a blank fixture value leaves the field empty.

use crate::driver::{query_first, Driver, ElementHandle};
use crate::locator::Selector;
use crate::result::ProbeResult;
use crate::wait::{retry, Exhausted, WaitOptions};

/// Whether `value` would be typed
#[must_use]
pub fn should_type(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Clear `element`, then type `value` unless it is blank
#[tracing::instrument(skip_all, fields(element = %element, blank = !should_type(value)))]
pub async fn clear_and_type(
    driver: &dyn Driver,
    element: &ElementHandle,
    value: &str,
) -> ProbeResult<()> {
    driver.clear(element).await?;
    if should_type(value) {
        driver.type_text(element, value).await?;
    } else {
        tracing::debug!("blank value, field left empty");
    }
    Ok(())
}

/// Resolve `css` (first match, polling) and apply [`clear_and_type`]
pub async fn fill_selector(
    driver: &dyn Driver,
    css: &str,
    value: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(css);
    let element = retry(options, css, Exhausted::LastError, || {
        query_first(driver, &selector, None)
    })
    .await?;
    clear_and_type(driver, &element, value).await?;
    Ok(element)
}
