//! Catalog filter keys and their ranks.
//!
//! Filters are a closed set. A string that names no known filter, or a
//! technique without a rank for the requested filter, sorts at
//! [`FALLBACK_RANK`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Rank for unknown filter keys and unranked techniques.
pub const FALLBACK_RANK: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKey {
    Sleep,
    Focus,
    Calm,
    Energy,
    Anxiety,
}

impl FilterKey {
    pub const ALL: [FilterKey; 5] = [
        FilterKey::Sleep,
        FilterKey::Focus,
        FilterKey::Calm,
        FilterKey::Energy,
        FilterKey::Anxiety,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Sleep => "sleep",
            FilterKey::Focus => "focus",
            FilterKey::Calm => "calm",
            FilterKey::Energy => "energy",
            FilterKey::Anxiety => "anxiety",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown filter: {s}"))
    }
}
