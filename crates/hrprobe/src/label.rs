//! Label-based element lookup.
//!
//! A form control is addressed by the text of its visible label. The label
//! and its control share a field-group wrapper; resolution walks up from the
//! label to the nearest wrapper and then down to the control.
//!
//! ```text
//!   <div class="oxd-input-group">          <- nearest field group
//!     <label>Other Id</label>              <- matched by text
//!     <input/>                             <- resolved control
//!   </div>
//! ```

use crate::driver::{Driver, ElementHandle};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use crate::selectors;
use crate::wait::{retry, Exhausted, WaitOptions};
use async_trait::async_trait;

/// Kind of control a label refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRole {
    /// Text or date input
    Input,
    /// Custom dropdown trigger
    Select,
}

impl std::fmt::Display for ControlRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Select => f.write_str("select"),
        }
    }
}

/// Capability for turning label text into a control handle
#[async_trait]
pub trait LabelResolver: Send + Sync {
    /// Resolve the control labelled `label` with the given role
    async fn resolve(
        &self,
        driver: &dyn Driver,
        label: &str,
        role: ControlRole,
    ) -> ProbeResult<ElementHandle>;
}

/// Nearest-field-group resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldGroupResolver {
    /// Selector for label elements
    pub label_css: String,
    /// Selector for the field-group wrapper
    pub group_css: String,
    /// Selector for text-like inputs inside a group
    pub input_css: String,
    /// Selector for dropdown triggers inside a group
    pub select_css: String,
    /// Polling bound for the lookup
    pub wait: WaitOptions,
}

impl Default for FieldGroupResolver {
    fn default() -> Self {
        Self {
            label_css: selectors::LABEL.to_string(),
            group_css: selectors::INPUT_GROUP.to_string(),
            input_css: selectors::GROUP_INPUT.to_string(),
            select_css: selectors::GROUP_SELECT.to_string(),
            wait: WaitOptions::default(),
        }
    }
}

impl FieldGroupResolver {
    /// Resolver with default selectors and the given polling bound
    #[must_use]
    pub fn new(wait: WaitOptions) -> Self {
        Self {
            wait,
            ..Self::default()
        }
    }

    /// Override the field-group selector
    #[must_use]
    pub fn with_group_css(mut self, css: impl Into<String>) -> Self {
        self.group_css = css.into();
        self
    }

    fn control_css(&self, role: ControlRole) -> &str {
        match role {
            ControlRole::Input => &self.input_css,
            ControlRole::Select => &self.select_css,
        }
    }

    /// Single resolution attempt without polling
    pub async fn resolve_once(
        &self,
        driver: &dyn Driver,
        label: &str,
        role: ControlRole,
    ) -> ProbeResult<ElementHandle> {
        let what = format!("label {label:?}");
        let mut labels = driver
            .query_all(&Selector::css_with_text(&self.label_css, label), None)
            .await?;
        let label_el = match labels.len() {
            0 => return Err(ProbeError::not_found(what)),
            1 => labels.remove(0),
            count => return Err(ProbeError::Ambiguous { what, count }),
        };

        let group = driver
            .ancestor(&label_el, &self.group_css)
            .await?
            .ok_or_else(|| ProbeError::not_found(format!("field group of label {label:?}")))?;

        let what = format!("{role} for label {label:?}");
        let mut controls = driver
            .query_all(&Selector::css(self.control_css(role)), Some(&group))
            .await?;
        match controls.len() {
            0 => Err(ProbeError::not_found(what)),
            1 => Ok(controls.remove(0)),
            count => Err(ProbeError::Ambiguous { what, count }),
        }
    }
}

#[async_trait]
impl LabelResolver for FieldGroupResolver {
    async fn resolve(
        &self,
        driver: &dyn Driver,
        label: &str,
        role: ControlRole,
    ) -> ProbeResult<ElementHandle> {
        let waited_for = format!("{role} labelled {label:?}");
        let found = retry(&self.wait, &waited_for, Exhausted::LastError, || {
            self.resolve_once(driver, label, role)
        })
        .await?;
        tracing::debug!(label, %role, element = %found, "label resolved");
        Ok(found)
    }
}

/// Resolve the text input labelled `label`
pub async fn find_input_by_label(
    driver: &dyn Driver,
    label: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    FieldGroupResolver::new(*options)
        .resolve(driver, label, ControlRole::Input)
        .await
}

/// Resolve the dropdown trigger labelled `label`
pub async fn find_select_by_label(
    driver: &dyn Driver,
    label: &str,
    options: &WaitOptions,
) -> ProbeResult<ElementHandle> {
    FieldGroupResolver::new(*options)
        .resolve(driver, label, ControlRole::Select)
        .await
}
