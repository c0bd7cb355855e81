//! Selector abstraction for element lookup.
//!
//! Selectors describe *what* to find; a [`Driver`](crate::driver::Driver)
//! decides *how*. Text selectors follow the usual "contains" rule: the
//! deepest element whose text includes the needle wins, so a lookup for
//! `"Buzz"` yields the menu label rather than the whole `<body>`.

use serde::{Deserialize, Serialize};

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Deepest elements whose text content contains the string
    Text(String),
    /// Deepest elements whose trimmed text content equals the string exactly
    ExactText(String),
    /// Elements matching the CSS selector whose text contains the string
    CssWithText {
        /// Base CSS selector
        css: String,
        /// Text content to match
        text: String,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a text ("contains") selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Create an exact-text selector
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::ExactText(text.into())
    }

    /// Create a CSS selector filtered by contained text
    #[must_use]
    pub fn css_with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// Filter this selector by contained text
    ///
    /// Only CSS selectors can be combined; other variants become a plain
    /// text lookup for the new needle.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        match self {
            Self::Css(css) => Self::CssWithText {
                css,
                text: text.into(),
            },
            Self::CssWithText { css, .. } => Self::CssWithText {
                css,
                text: text.into(),
            },
            Self::Text(_) | Self::ExactText(_) => Self::Text(text.into()),
        }
    }

    /// Check whether an element's text satisfies the text part of this selector
    #[must_use]
    pub fn text_matches(&self, text_content: &str) -> bool {
        match self {
            Self::Css(_) => true,
            Self::Text(t) | Self::CssWithText { text: t, .. } => text_content.contains(t.as_str()),
            Self::ExactText(t) => text_content.trim() == t,
        }
    }

    /// The CSS part of this selector, if any
    #[must_use]
    pub fn css_part(&self) -> Option<&str> {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => Some(css),
            Self::Text(_) | Self::ExactText(_) => None,
        }
    }

    /// Convert to a JavaScript expression yielding an array of matches
    /// below `root` (an element or `document`)
    #[must_use]
    pub fn to_query(&self, root: &str) -> String {
        match self {
            Self::Css(s) => format!("Array.from({root}.querySelectorAll({s:?}))"),
            Self::Text(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.includes({t:?}) \
                 && !Array.from(el.children).some(c => c.textContent.includes({t:?})))"
            ),
            Self::ExactText(t) => format!(
                "Array.from({root}.querySelectorAll('*')).filter(el => el.textContent.trim() === {t:?} \
                 && !Array.from(el.children).some(c => c.textContent.trim() === {t:?}))"
            ),
            Self::CssWithText { css, text } => format!(
                "Array.from({root}.querySelectorAll({css:?})).filter(el => el.textContent.includes({text:?}))"
            ),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::Text(t) => write!(f, "text*={t:?}"),
            Self::ExactText(t) => write!(f, "text={t:?}"),
            Self::CssWithText { css, text } => write!(f, "{css} >> text*={text:?}"),
        }
    }
}
