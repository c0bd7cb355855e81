//! Timezone-aware post lookup.
//!
//! The feed API reports a post's creation time in UTC as separate date and
//! time strings. The UI renders it in the browser's zone with day and month
//! swapped. [`PostTimestamp::display_text`] performs that conversion so a
//! post can be found by the exact text the UI shows.

use crate::driver::{Driver, ElementHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{retry, Exhausted, WaitOptions};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// API timestamp format (`YYYY-MM-DD hh:mm A`)
pub const SOURCE_FORMAT: &str = "%Y-%m-%d %I:%M %p";

/// 24-hour variant accepted as a fallback (`YYYY-MM-DD HH:mm`)
pub const SOURCE_FORMAT_24H: &str = "%Y-%m-%d %H:%M";

/// UI timestamp format (`YYYY-DD-MM hh:mm A`)
pub const DISPLAY_FORMAT: &str = "%Y-%d-%m %I:%M %p";

/// Creation time of a post as reported by the API (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTimestamp {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `hh:mm A`
    pub time: String,
}

impl PostTimestamp {
    /// Create from API strings
    #[must_use]
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    /// Parse into a UTC instant
    pub fn to_utc(&self) -> ProbeResult<DateTime<Utc>> {
        let joined = format!("{} {}", self.date.trim(), self.time.trim());
        let naive = NaiveDateTime::parse_from_str(&joined, SOURCE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&joined, SOURCE_FORMAT_24H))
            .map_err(|e| ProbeError::InvalidTimestamp {
                input: joined.clone(),
                message: e.to_string(),
            })?;
        Ok(Utc.from_utc_datetime(&naive))
    }

    /// Text the UI renders for this timestamp in `tz`
    pub fn display_text<Tz>(&self, tz: &Tz) -> ProbeResult<String>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        Ok(self
            .to_utc()?
            .with_timezone(tz)
            .format(DISPLAY_FORMAT)
            .to_string())
    }

    /// Text the UI renders in the local zone of the automation host
    pub fn display_text_local(&self) -> ProbeResult<String> {
        self.display_text(&Local)
    }
}

impl std::fmt::Display for PostTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} UTC", self.date, self.time)
    }
}

/// Find the element rendering `timestamp` in `tz` and require it visible.
///
/// Absent text fails with NotFound; text present only in hidden elements
/// fails with Mismatch.
pub async fn find_post_by_timestamp<Tz>(
    driver: &dyn Driver,
    timestamp: &PostTimestamp,
    tz: &Tz,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let text = timestamp.display_text(tz)?;
    let selector = Selector::exact_text(text.as_str());
    let waited_for = format!("post timestamp {text:?}");

    let found = retry(options, &waited_for, Exhausted::LastError, || async {
        let candidates = driver.query_all(&selector, None).await?;
        if candidates.is_empty() {
            return Err(ProbeError::not_found(format!("post timestamp {text:?}")));
        }
        for candidate in candidates {
            if driver.is_visible(&candidate).await? {
                return Ok(candidate);
            }
        }
        Err(ProbeError::mismatch(
            format!("visibility of post timestamp {text:?}"),
            "visible",
            "hidden",
        ))
    })
    .await?;

    tracing::debug!(%timestamp, %text, element = %found, "post located");
    Ok(found)
}
