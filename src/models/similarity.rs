use serde::{Deserialize, Serialize};

/// Why two raters could not be correlated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// The raters share no rated items
    NoOverlap,
    /// One side of the shared sample has zero variance
    DegenerateVariance,
}

/// Outcome of comparing two raters
///
/// Keeps "no signal" apart from a genuinely computed correlation. Callers that
/// need the plain score get the 0.0 sentinel for the undefined cases through
/// [`Similarity::value`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Pearson correlation in [-1, 1]
    Correlation(f64),
    Undefined(UndefinedReason),
}

impl Similarity {
    /// Score in [-1, 1], with 0.0 standing in for undefined correlation
    pub fn value(&self) -> f64 {
        match self {
            Similarity::Correlation(value) => *value,
            Similarity::Undefined(_) => 0.0,
        }
    }

    /// The correlation, if it is strictly positive
    pub fn positive(&self) -> Option<f64> {
        match self {
            Similarity::Correlation(value) if *value > 0.0 => Some(*value),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Similarity::Correlation(_))
    }
}
