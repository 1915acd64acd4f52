//! # lab-finder-api
//!
//! Wire formats spoken by the Lab Finder backend, and the mappers that turn
//! them into domain types. Result payloads are decoded leniently: every shape
//! the backend has shipped is reconciled into a `RawSearchResult` and then
//! normalized. This crate depends only on `domain` and `shared`.

/// API v1 DTOs and mappers.
pub mod v1;

/// Returns the api crate version.
#[must_use]
pub const fn api_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lab_finder_domain::domain_crate_version;
    use lab_finder_shared::shared_crate_version;

    #[test]
    fn api_can_use_domain_and_shared() {
        assert!(!api_crate_version().is_empty());
        assert!(!domain_crate_version().is_empty());
        assert!(!shared_crate_version().is_empty());
    }
}
