//! Secret detection and redaction utilities.
//!
//! Log fields and error metadata pass through these helpers so that tokens and
//! URL credentials never reach a log sink or a CLI error message.

use url::Url;

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a key/variable name likely refers to a secret.
///
/// # Examples
///
/// ```
/// use lab_finder_shared::is_secret_key;
///
/// assert!(is_secret_key("API_KEY"));
/// assert!(is_secret_key("authorization"));
/// assert!(!is_secret_key("LAB_FINDER_LOG_LEVEL"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    ["KEY", "TOKEN", "SECRET", "PASSWORD", "CREDENTIAL", "AUTH", "COOKIE"]
        .iter()
        .any(|needle| key.contains(needle))
}

/// Redacts a value if the key is likely a secret.
///
/// ```
/// use lab_finder_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("API_KEY", "sk-123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("region", "Kanto"), "Kanto");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// Removes userinfo, query and fragment from a URL before it is shown.
///
/// Unparseable input is replaced wholesale, since it may embed credentials
/// in a form the parser cannot isolate.
///
/// ```
/// use lab_finder_shared::strip_url_credentials;
///
/// assert_eq!(
///     strip_url_credentials("https://user:pw@api.example.com/base?token=x"),
///     "https://api.example.com/base"
/// );
/// ```
pub fn strip_url_credentials(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return "<invalid url>".to_string();
    };
    // Both setters only fail for cannot-be-a-base URLs, which carry no userinfo.
    let _ = url.set_username("");
    let _ = url.set_password(None);
    url.set_query(None);
    url.set_fragment(None);
    url.to_string().trim_end_matches('/').to_string()
}
