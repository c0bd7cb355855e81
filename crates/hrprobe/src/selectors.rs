//! UI selector catalogue for the OrangeHRM demo.

/// Login username input
pub const USERNAME_INPUT: &str = r#"input[name="username"]"#;
/// Login password input
pub const PASSWORD_INPUT: &str = r#"input[name="password"]"#;
/// Login submit button
pub const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;
/// Any submit control (the profile form has two)
pub const SUBMIT_ANY: &str = r#"[type="submit"]"#;

/// Breadcrumb module title in the top bar
pub const BREADCRUMB_MODULE: &str = "header h6.oxd-topbar-header-breadcrumb-module";
/// Dashboard widget
pub const DASHBOARD_WIDGET: &str = ".orangehrm-dashboard-widget";
/// Inline alert text on the login page
pub const ALERT_CONTENT_TEXT: &str = ".oxd-alert-content-text";

/// First name input
pub const FIRST_NAME_INPUT: &str = r#"[name="firstName"]"#;
/// Middle name input
pub const MIDDLE_NAME_INPUT: &str = r#"[name="middleName"]"#;
/// Last name input
pub const LAST_NAME_INPUT: &str = r#"[name="lastName"]"#;
/// Date picker popup
pub const CALENDAR_CONTAINER: &str = ".oxd-date-input-calendar";

/// Success toast
pub const TOAST_SUCCESS: &str = ".oxd-toast.oxd-toast--success";
/// Error toast
pub const TOAST_ERROR: &str = ".oxd-toast--error";
/// Toast title
pub const TOAST_TITLE: &str = ".oxd-text--toast-title";
/// Toast message
pub const TOAST_MESSAGE: &str = ".oxd-text--toast-message";

/// Field label
pub const LABEL: &str = "label";
/// Field-group wrapper tying a label to its control
pub const INPUT_GROUP: &str = ".oxd-input-group";
/// Text-like control inside a field group
pub const GROUP_INPUT: &str = "input";
/// Dropdown trigger inside a field group
pub const GROUP_SELECT: &str = r#"div[tabindex="0"]"#;
/// Validation message inside a field group
pub const INPUT_GROUP_MESSAGE: &str = ".oxd-input-group__message";
/// Options panel of an open dropdown
pub const SELECT_DROPDOWN: &str = ".oxd-select-dropdown";
/// Radio button wrapper
pub const RADIO_WRAPPER: &str = ".oxd-radio-wrapper";
/// Radio input
pub const RADIO_INPUT: &str = r#"input[type="radio"]"#;

/// One Buzz post card
pub const BUZZ_POST: &str = ".orangehrm-buzz";
/// Post body text
pub const BUZZ_POST_BODY_TEXT: &str = ".orangehrm-buzz-post-body-text";
/// Likes row (first) and comments/shares row (second)
pub const BUZZ_STATS_ROW: &str = ".orangehrm-buzz-stats-row";
/// Like button
pub const LIKE_BUTTON: &str = "#heart-svg";
/// Comment icon opening the comment box
pub const COMMENT_ICON: &str = ".oxd-icon.bi-chat-text-fill";
/// Comment textbox
pub const COMMENT_INPUT: &str = r#"[placeholder="Write your comment..."]"#;
