//! CLI command handlers.

pub mod catalog;
pub mod config;
pub mod lab;
pub mod search;
pub mod similar;

pub use catalog::{run_fields, run_health, run_popular, run_regions, run_suggest};
pub use config::{config_check, config_show};
pub use lab::run_lab;
pub use search::{SearchCommandInput, run_search};
pub use similar::run_similar;

use lab_finder_domain::{SearchResultRecord, match_percent, match_tier};
use std::fmt::Write;

/// One ranked line: `N. name [P% tier] university`.
pub(crate) fn push_ranked_line(out: &mut String, rank: usize, record: &SearchResultRecord) {
    let _ = writeln!(
        out,
        "{rank}. {} [{}% {}] {}",
        record.name,
        match_percent(record.similarity_score),
        match_tier(record.similarity_score),
        record.university_name,
    );
}
