//! Endpoints and payload models of the HR application's HTTP API.
//!
//! Only the fields the suites read are modelled; everything else in a
//! payload is ignored on deserialization.

use crate::assertion::{Assertion, AssertionResult};
use crate::network::HttpMethod;
use crate::post_time::PostTimestamp;
use crate::result::ProbeResult;
use serde::{Deserialize, Serialize};

/// Credential check posted by the login form
pub const AUTH_VALIDATE: &str = "/web/index.php/auth/validate";

/// Login page
pub const AUTH_LOGIN: &str = "/web/index.php/auth/login";

/// Dashboard page (target of a successful login)
pub const DASHBOARD: &str = "/web/index.php/dashboard";

/// First page of the Buzz feed, newest first
pub const BUZZ_FEED: &str =
    "/web/index.php/api/v2/buzz/feed?limit=10&offset=0&sortOrder=DESC&sortField=share.createdAtUtc";

/// Like / unlike a shared post
#[must_use]
pub fn share_likes(share_id: u64) -> String {
    format!("/web/index.php/api/v2/buzz/shares/{share_id}/likes")
}

/// Comments on a shared post
#[must_use]
pub fn share_comments(share_id: u64) -> String {
    format!("/web/index.php/api/v2/buzz/shares/{share_id}/comments")
}

/// Personal details of an employee
#[must_use]
pub fn personal_details(emp_number: u32) -> String {
    format!("/web/index.php/api/v2/pim/employees/{emp_number}/personal-details")
}

/// Feed page envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    /// Posts, newest first
    pub data: Vec<BuzzPost>,
    /// Paging metadata
    #[serde(default)]
    pub meta: serde_json::Value,
    /// Related resources
    #[serde(default)]
    pub rels: serde_json::Value,
}

/// Interaction counters of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostStats {
    /// Like count
    pub num_of_likes: u32,
    /// Comment count
    pub num_of_comments: u32,
    /// Share count
    pub num_of_shares: u32,
}

/// Author of a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Given name
    pub first_name: String,
    /// Middle name
    #[serde(default)]
    pub middle_name: String,
    /// Family name
    pub last_name: String,
}

impl Employee {
    /// Name as rendered in a post header
    #[must_use]
    pub fn display_name(&self) -> String {
        [&self.first_name, &self.middle_name, &self.last_name]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One feed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuzzPost {
    /// Share id
    pub id: u64,
    /// Body text (absent for photo-only posts)
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the current user liked it
    #[serde(default)]
    pub liked: bool,
    /// Counters
    #[serde(default)]
    pub stats: PostStats,
    /// UTC creation date, `YYYY-MM-DD`
    pub created_date: String,
    /// UTC creation time, `hh:mm A`
    pub created_time: String,
    /// Author
    #[serde(default)]
    pub employee: Employee,
}

impl BuzzPost {
    /// Body text, empty when absent
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Method the like button issues: DELETE to unlike, POST to like
    #[must_use]
    pub const fn like_method(&self) -> HttpMethod {
        if self.liked {
            HttpMethod::Delete
        } else {
            HttpMethod::Post
        }
    }

    /// Like count after toggling the like button
    #[must_use]
    pub const fn expected_likes_after_toggle(&self) -> u32 {
        if self.liked {
            self.stats.num_of_likes.saturating_sub(1)
        } else {
            self.stats.num_of_likes + 1
        }
    }

    /// Creation timestamp
    #[must_use]
    pub fn timestamp(&self) -> PostTimestamp {
        PostTimestamp::new(&self.created_date, &self.created_time)
    }
}

/// Gender codes used by the personal-details API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// Code 1
    Male,
    /// Code 2
    Female,
}

impl Gender {
    /// Map an API code
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Male),
            2 => Some(Self::Female),
            _ => None,
        }
    }

    /// API code
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 2,
        }
    }

    /// Radio label shown in the UI
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

/// Nationality reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nationality {
    /// Id in the nationality list
    pub id: u32,
    /// Display name
    pub name: String,
}

/// Personal details record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    /// Employee number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emp_number: Option<u32>,
    /// Given name
    pub first_name: String,
    /// Middle name
    #[serde(default)]
    pub middle_name: String,
    /// Family name
    pub last_name: String,
    /// Employee id
    #[serde(default)]
    pub employee_id: String,
    /// Other id
    #[serde(default)]
    pub other_id: String,
    /// Driver's license number
    #[serde(default)]
    pub driving_license_no: String,
    /// License expiry, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_license_expired_date: Option<String>,
    /// Date of birth, `YYYY-MM-DD`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
    /// Gender code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<u8>,
    /// Marital status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<String>,
    /// Nationality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<Nationality>,
}

impl PersonalDetails {
    /// Mapped gender, if the code is known
    #[must_use]
    pub fn gender(&self) -> Option<Gender> {
        self.gender.and_then(Gender::from_code)
    }

    /// Nationality display name, empty when unset
    #[must_use]
    pub fn nationality_name(&self) -> &str {
        self.nationality.as_ref().map_or("", |n| n.name.as_str())
    }
}

/// `{ data, meta, rels }` envelope around a personal details record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetailsEnvelope {
    /// The record
    pub data: PersonalDetails,
    /// Metadata
    #[serde(default)]
    pub meta: serde_json::Value,
    /// Related resources
    #[serde(default)]
    pub rels: serde_json::Value,
}

/// Personal details fixture, typed for filling the form and raw for
/// comparing against API responses
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalDetailsFixture {
    /// The record
    pub details: PersonalDetails,
    /// The `data` object exactly as written in the fixture file
    pub raw: serde_json::Value,
}

impl PersonalDetailsFixture {
    /// Split a `{ data, meta, rels }` document
    pub fn from_envelope(document: &serde_json::Value) -> ProbeResult<Self> {
        let raw = document.get("data").cloned().unwrap_or_default();
        let details = serde_json::from_value(raw.clone())?;
        Ok(Self { details, raw })
    }

    /// Check that every field written in the fixture appears with an equal
    /// value in `actual` (a `data` object from the API)
    ///
    /// Fields the fixture leaves out are not checked, even where the typed
    /// record fills in a default.
    #[must_use]
    pub fn matches_subset(&self, actual: &serde_json::Value) -> AssertionResult {
        Assertion::deep_includes(actual, &self.raw)
    }
}
