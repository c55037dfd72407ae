use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Complexity tier
// ---------------------------------------------------------------------------

/// Complexity tier requested for a drafted plan.
///
/// Selects the feature fragment appended to the base feature list. Callers
/// holding a free-text label should parse it and fall back to the default
/// (`Medium`) on failure; plan generation itself is total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Easy,
    #[default]
    Medium,
    Advanced,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

impl FromStr for Complexity {
    type Err = ComplexityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "advanced" => Ok(Self::Advanced),
            other => Err(ComplexityParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Complexity`] label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid complexity tier: {0:?} (expected easy, medium, or advanced)")]
pub struct ComplexityParseError(pub String);

// ---------------------------------------------------------------------------
// Plan record
// ---------------------------------------------------------------------------

/// A drafted application plan.
///
/// Output of [`generate()`](crate::plan::generate::generate). `name`,
/// `pitch`, and the tail of `features` depend on the inputs; `pages` and
/// `stack` are the same for every plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub pitch: String,
    pub pages: Vec<String>,
    pub features: Vec<String>,
    pub stack: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
