//! Lab detail model and the external URL value object.

use serde::Serialize;
use std::fmt;
use url::Url;

/// An absolute `http`/`https` URL pointing outside the application.
///
/// Values are untrusted. They are carried as data for display and are only
/// ever opened by an explicit user action in the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExternalUrl(Box<str>);

impl ExternalUrl {
    /// Accepts a trimmed absolute `http`/`https` URL with a host.
    ///
    /// Anything else (relative paths, `javascript:`, `file:`, blank) yields `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).ok()?;
        let scheme_ok = matches!(url.scheme(), "http" | "https");
        let has_host = url.host_str().is_some_and(|host| !host.is_empty());
        (scheme_ok && has_host).then(|| Self(trimmed.into()))
    }

    /// Borrow the URL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalUrl {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// University a lab belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct University {
    /// Backend identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// National, public or private.
    #[serde(rename = "type")]
    pub university_type: String,
    /// Prefecture the campus is in.
    pub prefecture: String,
    /// Region grouping used by filters.
    pub region: String,
}

/// Full lab record served by the lab-detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchLab {
    /// Backend identifier.
    pub id: i64,
    /// Lab name.
    pub name: String,
    /// Head of the lab, when registered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professor_name: Option<String>,
    /// Department or graduate school.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    /// One-line research theme.
    pub research_theme: String,
    /// Longer description of the research.
    pub research_content: String,
    /// Research field used by filters.
    pub research_field: String,
    /// Specialities within the field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speciality: Option<String>,
    /// Comma-separated keywords as stored by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    /// Lab homepage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lab_url: Option<ExternalUrl>,
    /// Owning university.
    pub university: University,
    /// Creation timestamp as sent by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp as sent by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl ResearchLab {
    /// Keywords split on ASCII and ideographic commas, blanks dropped.
    #[must_use]
    pub fn keyword_list(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|keywords| {
                keywords
                    .split([',', '、', '，'])
                    .map(str::trim)
                    .filter(|keyword| !keyword.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
