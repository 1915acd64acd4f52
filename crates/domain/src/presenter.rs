//! Result ordering and match-quality tiers.

use crate::record::SearchResultRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// How results are ordered for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Keep the service's rank order.
    #[default]
    Relevance,
    /// Stable sort by lab name.
    Name,
}

impl SortMode {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort mode: {other}")),
        }
    }
}

/// Order results for display.
///
/// `Relevance` returns the input untouched. `Name` is a stable sort on a
/// collation key tuned for Japanese result sets: full-width ASCII folds to
/// half-width, case is ignored, and katakana sorts with the matching
/// hiragana. Kanji fall back to code-point order, which approximates but
/// does not equal reading order.
#[must_use]
pub fn order(mut results: Vec<SearchResultRecord>, mode: SortMode) -> Vec<SearchResultRecord> {
    if mode == SortMode::Name {
        results.sort_by(|a, b| compare_names(&a.name, &b.name));
    }
    results
}

fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(collation_key(b)).then_with(|| a.cmp(b))
}

fn collation_key(value: &str) -> impl Iterator<Item = char> + '_ {
    value.trim().chars().flat_map(|ch| fold_char(ch).to_lowercase())
}

fn fold_char(ch: char) -> char {
    let code = u32::from(ch);
    let folded = match code {
        // Full-width ASCII variants.
        0xFF01..=0xFF5E => code - 0xFEE0,
        // Ideographic space.
        0x3000 => 0x20,
        // Katakana ァ..ヶ onto hiragana ぁ..ゖ.
        0x30A1..=0x30F6 => code - 0x60,
        _ => code,
    };
    char::from_u32(folded).unwrap_or(ch)
}

/// Discrete match-quality bucket for a normalized score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Below 0.4.
    Minimal,
    /// 0.4 up to 0.6.
    Low,
    /// 0.6 up to 0.8.
    Medium,
    /// 0.8 and above.
    High,
}

impl MatchTier {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Bucket a score. NaN lands in `Minimal`.
#[must_use]
pub fn match_tier(score: f64) -> MatchTier {
    if score >= 0.8 {
        MatchTier::High
    } else if score >= 0.6 {
        MatchTier::Medium
    } else if score >= 0.4 {
        MatchTier::Low
    } else {
        MatchTier::Minimal
    }
}

/// Score as a whole percentage in `0..=100`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 0..=100 before the cast"
)]
pub fn match_percent(score: f64) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}
