//! Toast notification assertions.

use crate::driver::{Driver, ElementHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::wait::{retry, Exhausted, WaitOptions};

/// Toast variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastKind {
    /// Green confirmation toast
    Success,
    /// Red failure toast
    Error,
}

impl ToastKind {
    /// CSS selector of toasts of this kind
    #[must_use]
    pub const fn selector(&self) -> &'static str {
        match self {
            Self::Success => selectors::TOAST_SUCCESS,
            Self::Error => selectors::TOAST_ERROR,
        }
    }
}

impl std::fmt::Display for ToastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

async fn part_text(
    driver: &dyn Driver,
    toast: &ElementHandle,
    css: &str,
) -> ProbeResult<String> {
    let found = driver.query_all(&Selector::css(css), Some(toast)).await?;
    let mut text = String::new();
    for el in found {
        text.push_str(driver.text(&el).await?.trim());
    }
    Ok(text)
}

/// Wait for a visible `kind` toast whose title contains `title` and whose
/// message contains `message`.
///
/// No toast at all within the wait fails with Timeout; a toast with other
/// text fails with Mismatch.
#[tracing::instrument(skip(driver, options))]
pub async fn assert_toast(
    driver: &dyn Driver,
    kind: ToastKind,
    title: &str,
    message: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    let selector = Selector::css(kind.selector());
    let waited_for = format!("{kind} toast");
    let expected = format!("{title} / {message}");

    let outcome = retry(options, &waited_for, Exhausted::LastError, || async {
        let mut seen = Vec::new();
        for toast in driver.query_all(&selector, None).await? {
            if !driver.is_visible(&toast).await? {
                continue;
            }
            let actual_title = part_text(driver, &toast, selectors::TOAST_TITLE).await?;
            let actual_message = part_text(driver, &toast, selectors::TOAST_MESSAGE).await?;
            if actual_title.contains(title) && actual_message.contains(message) {
                return Ok(toast);
            }
            seen.push(format!("{actual_title} / {actual_message}"));
        }
        if seen.is_empty() {
            Err(ProbeError::not_found(waited_for.clone()))
        } else {
            Err(ProbeError::mismatch(
                format!("{kind} toast text"),
                expected.as_str(),
                seen.join(" | "),
            ))
        }
    })
    .await;

    match outcome {
        Ok(toast) => {
            tracing::debug!(%kind, title, message, "toast matched");
            Ok(toast)
        }
        Err(ProbeError::NotFound { .. }) => Err(ProbeError::Timeout {
            ms: options.timeout_ms,
            waited_for: format!("{waited_for} {expected:?}"),
        }),
        Err(e) => Err(e),
    }
}

/// Assert that no `kind` toast exists right now
pub async fn assert_no_toast(driver: &dyn Driver, kind: ToastKind) -> ProbeResult<()> {
    let count = driver
        .query_all(&Selector::css(kind.selector()), None)
        .await?
        .len();
    if count == 0 {
        Ok(())
    } else {
        Err(ProbeError::mismatch(
            format!("{kind} toast count"),
            "0",
            count.to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockNode};
    use crate::result::FailureKind;

    fn toast(kind: &str, title: &str, message: &str) -> MockNode {
        MockNode::el(&format!("div.oxd-toast.oxd-toast--{kind}"))
            .child(MockNode::el("p.oxd-text.oxd-text--toast-title").text(title))
            .child(MockNode::el("p.oxd-text.oxd-text--toast-message").text(message))
    }

    fn quick() -> WaitOptions {
        WaitOptions::new().with_timeout(100).with_poll_interval(10)
    }

    mod assert_toast_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_matching_toast() {
            let driver = MockDriver::with_body(toast("success", "Success", "Successfully Updated"));
            let _ = assert_toast(&driver, ToastKind::Success, "Success", "Successfully Updated", &quick())
                .await
                .unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_absent_toast_times_out() {
            let driver = MockDriver::with_body(MockNode::el("div.oxd-form"));
            let err = assert_toast(&driver, ToastKind::Error, "Error", "Unexpected Error!", &quick())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Timeout);
        }

        #[tokio::test(start_paused = true)]
        async fn test_other_text_is_mismatch() {
            let driver = MockDriver::with_body(toast("error", "Error", "Something else"));
            let err = assert_toast(&driver, ToastKind::Error, "Error", "Unexpected Error!", &quick())
                .await
                .unwrap_err();
            match err {
                ProbeError::Mismatch { expected, actual, .. } => {
                    assert_eq!(expected, "Error / Unexpected Error!");
                    assert_eq!(actual, "Error / Something else");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_kind_is_respected() {
            let driver = MockDriver::with_body(toast("error", "Error", "Unexpected Error!"));
            let err = assert_toast(&driver, ToastKind::Success, "Error", "Unexpected Error!", &quick())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), FailureKind::Timeout);
        }

        #[tokio::test(start_paused = true)]
        async fn test_toast_appearing_late() {
            let driver = MockDriver::with_body(MockNode::el("div.oxd-form"));
            let later = driver.clone();
            let show = tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(40)).await;
                later
                    .with_page(|page| {
                        let body = page.dom.body();
                        let _ = page.dom.append(body, toast("success", "Success", "Successfully Saved"));
                    })
                    .unwrap();
            });
            let _ = assert_toast(&driver, ToastKind::Success, "Success", "Saved", &quick())
                .await
                .unwrap();
            show.await.unwrap();
        }
    }

    mod assert_no_toast_tests {
        use super::*;

        #[tokio::test]
        async fn test_no_toast() {
            let driver = MockDriver::with_body(toast("error", "Error", "Oops"));
            assert_no_toast(&driver, ToastKind::Success).await.unwrap();
            let err = assert_no_toast(&driver, ToastKind::Error).await.unwrap_err();
            assert_eq!(err.kind(), FailureKind::Mismatch);
        }
    }
}
