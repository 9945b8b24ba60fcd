use std::fmt;

use chrono::{DateTime, Utc};

use crate::surface::VolSurface;

/// The checks a surface can fail, in pipeline order, followed by the
/// failures recorded while answering queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValidationCheck {
    Age,
    Structure,
    SmileConsistency,
    IdenticalSurface,
    VolatilityJump,
    Calendar,
    Admissibility,
    /// A forward smile derived for a query left the volatility range.
    ForwardSmile,
    /// A query asked for a window starting before the surface was recorded,
    /// or an empty window.
    PricingWindow,
}

impl fmt::Display for ValidationCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationCheck::Age => "age",
            ValidationCheck::Structure => "structure",
            ValidationCheck::SmileConsistency => "smile consistency",
            ValidationCheck::IdenticalSurface => "identical surface",
            ValidationCheck::VolatilityJump => "volatility jump",
            ValidationCheck::Calendar => "calendar",
            ValidationCheck::Admissibility => "admissibility",
            ValidationCheck::ForwardSmile => "forward smile",
            ValidationCheck::PricingWindow => "pricing window",
        };
        f.write_str(name)
    }
}

/// What a validation run is measured against: the current time and the
/// previously published surface of the same underlying, if any.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub now: DateTime<Utc>,
    pub previous: Option<&'a VolSurface>,
}

impl<'a> ValidationContext<'a> {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            previous: None,
        }
    }

    pub fn with_previous<'b>(self, previous: &'b VolSurface) -> ValidationContext<'b> {
        ValidationContext {
            now: self.now,
            previous: Some(previous),
        }
    }
}
