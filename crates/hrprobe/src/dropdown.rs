//! Custom dropdown selection.
//!
//! The trigger is a focusable `div` inside the field group; clicking it
//! renders an options panel elsewhere in the document.

use crate::driver::{query_first, Driver, ElementHandle};
use crate::label::find_select_by_label;
use crate::locator::Selector;
use crate::result::ProbeResult;
use crate::selectors;
use crate::wait::{retry, Exhausted, WaitOptions};

/// Open the dropdown labelled `label` and pick the option containing `option_text`
#[tracing::instrument(skip(driver, options))]
pub async fn choose_by_label(
    driver: &dyn Driver,
    label: &str,
    option_text: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let trigger = find_select_by_label(driver, label, options).await?;
    driver.click(&trigger).await?;

    let panel_selector = Selector::css(selectors::SELECT_DROPDOWN);
    let _ = retry(options, "options panel", Exhausted::Timeout, || {
        query_first(driver, &panel_selector, None)
    })
    .await?;

    let waited_for = format!("option {option_text:?}");
    let option_selector = Selector::text(option_text);
    let option = retry(options, &waited_for, Exhausted::Timeout, || async {
        let panel = query_first(driver, &panel_selector, None).await?;
        query_first(driver, &option_selector, Some(&panel)).await
    })
    .await?;

    driver.click(&option).await?;
    tracing::debug!(label, option_text, "option chosen");
    Ok(trigger)
}

/// Visible text of the dropdown trigger labelled `label`
pub async fn selected_text_by_label(
    driver: &dyn Driver,
    label: &str,
    options: &WaitOptions,
) -> ProbeResult<String> {
    let trigger = find_select_by_label(driver, label, options).await?;
    driver.text(&trigger).await
}
